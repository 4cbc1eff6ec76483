use anyhow::Result;
use reqwest::header::AUTHORIZATION;
use std::time::Duration;
use tracing::{debug, info};

use crate::auth::AuthManager;
use crate::config::Config;
use crate::data::{Activity, ClubActivity};

const API_BASE: &str = "https://www.strava.com/api/v3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PER_PAGE: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("API request failed: {endpoint} returned {status} - {message}")]
    RequestFailed {
        endpoint: String,
        status: u16,
        message: String,
    },
    #[error("Failed to parse response from {endpoint}: {source}")]
    ParseError {
        endpoint: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Result of one kudos call against an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KudosOutcome {
    Given,
    AlreadyGiven,
    Failed(u16),
}

pub struct StravaApi {
    client: reqwest::Client,
    auth: AuthManager,
}

impl StravaApi {
    pub fn new(config: Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            auth: AuthManager::new(config),
        }
    }

    pub async fn access_token(&self) -> Result<String> {
        self.auth.access_token().await
    }

    /// Fetch the athlete's complete activity history, newest first.
    /// Pages until the API returns an empty page; no page-size guesswork.
    pub async fn athlete_activities(&self, token: &str) -> Result<Vec<Activity>> {
        let endpoint = "/athlete/activities";
        let mut activities = Vec::new();
        let mut page = 1usize;

        loop {
            let url = format!(
                "{}{}?per_page={}&page={}",
                API_BASE, endpoint, PER_PAGE, page
            );

            let response = self
                .client
                .get(&url)
                .header(AUTHORIZATION, format!("Bearer {}", token))
                .send()
                .await?;

            let body = self.check_response(response, endpoint).await?;
            let batch: Vec<Activity> =
                serde_json::from_str(&body).map_err(|e| ApiError::ParseError {
                    endpoint: endpoint.to_string(),
                    source: anyhow::anyhow!(
                        "{} (body excerpt: {})",
                        e,
                        &body[..body.len().min(200)]
                    ),
                })?;

            if batch.is_empty() {
                break;
            }

            debug!(page, fetched = batch.len(), "fetched activity page");
            activities.extend(batch);
            page += 1;
        }

        info!(total = activities.len(), "fetched athlete activities");
        Ok(activities)
    }

    /// Fetch one page of a club's recent activity feed.
    pub async fn club_activities(
        &self,
        token: &str,
        club_id: &str,
        page: usize,
    ) -> Result<Vec<ClubActivity>> {
        let endpoint = format!("/clubs/{}/activities", club_id);
        let url = format!(
            "{}{}?per_page={}&page={}",
            API_BASE, endpoint, PER_PAGE, page
        );

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;

        let body = self.check_response(response, &endpoint).await?;
        let activities: Vec<ClubActivity> =
            serde_json::from_str(&body).map_err(|e| ApiError::ParseError {
                endpoint: endpoint.clone(),
                source: anyhow::anyhow!(
                    "{} (body excerpt: {})",
                    e,
                    &body[..body.len().min(200)]
                ),
            })?;

        Ok(activities)
    }

    /// Acknowledge one activity. Strava answers 409 when kudos was
    /// already given, which callers treat as a no-op rather than a fault.
    pub async fn give_kudos(&self, token: &str, activity_id: u64) -> Result<KudosOutcome> {
        let url = format!("{}/activities/{}/kudos", API_BASE, activity_id);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;

        Ok(kudos_outcome(response.status().as_u16()))
    }

    async fn check_response(
        &self,
        response: reqwest::Response,
        endpoint: &str,
    ) -> Result<String, ApiError> {
        let status = response.status();
        let endpoint_str = endpoint.to_string();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.is_empty() {
                "Empty response".to_string()
            } else {
                body.chars().take(500).collect::<String>()
            };
            return Err(ApiError::RequestFailed {
                endpoint: endpoint_str,
                status: status.as_u16(),
                message,
            });
        }

        response.text().await.map_err(|e| ApiError::RequestFailed {
            endpoint: endpoint_str,
            status: status.as_u16(),
            message: format!("Failed to read response body: {}", e),
        })
    }
}

fn kudos_outcome(status: u16) -> KudosOutcome {
    match status {
        200 | 201 => KudosOutcome::Given,
        409 => KudosOutcome::AlreadyGiven,
        _ => KudosOutcome::Failed(status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_failed_display_names_endpoint_and_status() {
        let err = ApiError::RequestFailed {
            endpoint: "/athlete/activities".to_string(),
            status: 401,
            message: "Unauthorized".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/athlete/activities"));
        assert!(msg.contains("401"));
    }

    #[test]
    fn kudos_outcome_maps_status_codes() {
        assert_eq!(kudos_outcome(200), KudosOutcome::Given);
        assert_eq!(kudos_outcome(201), KudosOutcome::Given);
        assert_eq!(kudos_outcome(409), KudosOutcome::AlreadyGiven);
        assert_eq!(kudos_outcome(429), KudosOutcome::Failed(429));
    }
}
