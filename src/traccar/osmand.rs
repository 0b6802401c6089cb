// src/traccar/osmand.rs
//! OsmAnd protocol: one HTTP GET per fix with the position in the query string

use super::{http, RetryPolicy};
use crate::config::HttpEndpoint;
use crate::distributor::FixReceiver;
use crate::error::Result;
use crate::gps::Fix;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;

pub struct OsmAndClient {
    endpoint: HttpEndpoint,
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl OsmAndClient {
    pub const NAME: &'static str = "osmand";

    pub fn new(endpoint: HttpEndpoint, retry: RetryPolicy) -> Result<Self> {
        Ok(Self::with_http_client(endpoint, retry, http::build_client()?))
    }

    pub fn with_http_client(endpoint: HttpEndpoint, retry: RetryPolicy, http: reqwest::Client) -> Self {
        Self { endpoint, http, retry }
    }

    pub fn request_url(&self, fix: &Fix) -> String {
        build_url(&self.endpoint, fix)
    }

    /// Send one fix, retrying connection failures per the retry policy
    pub async fn send(&self, fix: &Fix) -> Result<StatusCode> {
        let url = self.request_url(fix);
        log::debug!("OsmAnd request: {}", url);

        let (client, url) = (&self.http, url.as_str());
        self.retry
            .run("OsmAnd request", move || http::send_get(client, url))
            .await
    }

    /// Forward fixes until the distributor goes away or the server is unreachable
    pub async fn run(self, mut receiver: FixReceiver) {
        while let Some(fix) = receiver.recv().await {
            if let Err(e) = self.send(&fix).await {
                log::error!("Cannot establish connection with Traccar server (OsmAnd): {}", e);
                return;
            }
        }
    }
}

/// `MM-DD-YYYY%20HH:MM:SS`, space already escaped for the query string
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    format!("{}%20{}", at.format("%m-%d-%Y"), at.format("%H:%M:%S"))
}

pub fn build_url(endpoint: &HttpEndpoint, fix: &Fix) -> String {
    format!(
        "{}:{}/?id={}&timestamp={}&lat={:.6}&lon={:.6}&speed={:.6}&course={:.6}&variation={:.6}",
        endpoint.base_url,
        endpoint.port,
        endpoint.client_id,
        format_timestamp(&fix.acquired_at),
        fix.latitude,
        fix.longitude,
        fix.speed,
        fix.course,
        fix.variation
    )
}
