//! Service-account authentication for the Google Calendar API.

use anyhow::{Context, Result};

/// The only OAuth scope this service needs.
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Mint an access token from the service-account key JSON in the
/// `GCP_SA_KEY` environment variable.
///
/// Nothing useful can happen without calendar access, so any failure
/// here is terminal for the run.
pub async fn access_token_from_env() -> Result<String> {
    let raw_key = std::env::var("GCP_SA_KEY").context("GCP_SA_KEY must be set")?;
    access_token_for_key(&raw_key).await
}

/// Mint an access token for the calendar scope from a service-account
/// key JSON document.
pub async fn access_token_for_key(raw_key: &str) -> Result<String> {
    let key = yup_oauth2::parse_service_account_key(raw_key)
        .context("Failed to parse service account key")?;

    let auth = yup_oauth2::ServiceAccountAuthenticator::builder(key)
        .build()
        .await
        .context("Failed to build service account authenticator")?;

    let token = auth
        .token(&[CALENDAR_SCOPE])
        .await
        .context("Failed to obtain access token")?;

    let token = token
        .token()
        .context("Token response did not contain an access token")?;

    Ok(token.to_string())
}
