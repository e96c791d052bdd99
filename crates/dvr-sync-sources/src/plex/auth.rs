use anyhow::Result;
use reqwest::Client;

pub const PLEX_TV_BASE_URL: &str = "https://plex.tv";

/// Verify that a token is valid by making an API call
pub async fn verify_token(token: &str) -> Result<bool> {
    verify_token_at(PLEX_TV_BASE_URL, token).await
}

pub async fn verify_token_at(base_url: &str, token: &str) -> Result<bool> {
    let client = Client::new();
    let url = format!("{}/api/v2/user", base_url.trim_end_matches('/'));

    let response = client
        .get(&url)
        .header("X-Plex-Token", token)
        .header("Accept", "application/json")
        .send()
        .await?;

    Ok(response.status().is_success())
}
