// src/traccar/http.rs
//! GET request handling shared by the OsmAnd and OpenGTS adapters

use crate::error::Result;
use reqwest::StatusCode;
use std::time::Duration;

/// HTTP client used by the tracking adapters
pub fn build_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("gnss-tracker/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    Ok(client)
}

/// Issue the GET and log the response. Only transport failures are errors;
/// a non-2xx status is logged and returned.
pub async fn send_get(client: &reqwest::Client, url: &str) -> Result<StatusCode> {
    let response = client.get(url).send().await?;
    let status = response.status();

    match response.text().await {
        Ok(body) if body.is_empty() => log::warn!("Empty request response body"),
        Ok(body) => log::debug!("Traccar web server response: {}", body.trim()),
        Err(e) => log::error!("Error reading Traccar server response: {}", e),
    }

    log::debug!("HTTP response status from Traccar: {}", status);
    if status.is_success() {
        log::info!("HTTP status code from Traccar is in the 2xx range ({})", status.as_u16());
    } else {
        log::warn!("Traccar server answered {}", status);
    }

    Ok(status)
}
