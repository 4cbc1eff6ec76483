use anyhow::{Context, Result};

/// Strava API credentials, read from the environment. All three values
/// are required for anything that talks to the API; the dashboard
/// command works offline and never touches them.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
}

impl Config {
    pub fn load() -> Self {
        Config {
            client_id: std::env::var("STRAVA_CLIENT_ID").ok(),
            client_secret: std::env::var("STRAVA_CLIENT_SECRET").ok(),
            refresh_token: std::env::var("STRAVA_REFRESH_TOKEN").ok(),
        }
    }

    pub fn client_id(&self) -> Result<&str> {
        self.client_id
            .as_deref()
            .context("STRAVA_CLIENT_ID not set")
    }

    pub fn client_secret(&self) -> Result<&str> {
        self.client_secret
            .as_deref()
            .context("STRAVA_CLIENT_SECRET not set")
    }

    pub fn refresh_token(&self) -> Result<&str> {
        self.refresh_token
            .as_deref()
            .context("STRAVA_REFRESH_TOKEN not set")
    }
}
