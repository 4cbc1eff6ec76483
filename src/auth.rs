use anyhow::{Context, Result};
use oauth2::basic::BasicClient;
use oauth2::{AuthUrl, ClientId, ClientSecret, RefreshToken, TokenResponse, TokenUrl};

use crate::config::Config;

const AUTH_URL: &str = "https://www.strava.com/oauth/authorize";
const TOKEN_URL: &str = "https://www.strava.com/oauth/token";

pub struct AuthManager {
    config: Config,
}

impl AuthManager {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Exchange the long-lived refresh token for a bearer access token.
    /// Strava access tokens last six hours, far longer than any single
    /// run of this toolkit, so one exchange per invocation is enough.
    pub async fn access_token(&self) -> Result<String> {
        let client_id = self.config.client_id()?;
        let client_secret = self.config.client_secret()?;
        let refresh_token = self.config.refresh_token()?;

        let client = BasicClient::new(
            ClientId::new(client_id.to_string()),
            Some(ClientSecret::new(client_secret.to_string())),
            AuthUrl::new(AUTH_URL.to_string())?,
            Some(TokenUrl::new(TOKEN_URL.to_string())?),
        );

        let token = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .context("Failed to refresh Strava access token")?;

        Ok(token.access_token().secret().clone())
    }
}
