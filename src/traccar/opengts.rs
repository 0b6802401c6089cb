// src/traccar/opengts.rs
//! OpenGTS protocol: the raw RMC sentence is passed through in the query

use super::{http, RetryPolicy};
use crate::config::HttpEndpoint;
use crate::distributor::FixReceiver;
use crate::error::Result;
use crate::gps::Fix;
use reqwest::StatusCode;

pub struct OpenGtsClient {
    endpoint: HttpEndpoint,
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl OpenGtsClient {
    pub const NAME: &'static str = "opengts";

    pub fn new(endpoint: HttpEndpoint, retry: RetryPolicy) -> Result<Self> {
        Ok(Self::with_http_client(endpoint, retry, http::build_client()?))
    }

    pub fn with_http_client(endpoint: HttpEndpoint, retry: RetryPolicy, http: reqwest::Client) -> Self {
        Self { endpoint, http, retry }
    }

    pub fn request_url(&self, fix: &Fix) -> String {
        build_url(&self.endpoint, fix)
    }

    pub async fn send(&self, fix: &Fix) -> Result<StatusCode> {
        let url = self.request_url(fix);
        log::info!("OpenGTS request: {}", url);

        let (client, url) = (&self.http, url.as_str());
        self.retry
            .run("OpenGTS request", move || http::send_get(client, url))
            .await
    }

    pub async fn run(self, mut receiver: FixReceiver) {
        while let Some(fix) = receiver.recv().await {
            if let Err(e) = self.send(&fix).await {
                log::error!("Cannot establish connection with Traccar server (OpenGTS): {}", e);
                return;
            }
        }
    }
}

pub fn build_url(endpoint: &HttpEndpoint, fix: &Fix) -> String {
    format!(
        "{}:{}/?id={}&grmpc={}",
        endpoint.base_url, endpoint.port, endpoint.client_id, fix.raw_position
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traccar::testing::{closed_port, direct_client, spawn_http_stub};

    const RMC: &str = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";

    fn endpoint(port: u16) -> HttpEndpoint {
        HttpEndpoint {
            base_url: "http://127.0.0.1".to_string(),
            port,
            client_id: "ABC123".to_string(),
        }
    }

    fn sample_fix() -> Fix {
        Fix {
            raw_position: RMC.to_string(),
            ..Fix::default()
        }
    }

    #[test]
    fn test_query_construction() {
        let url = build_url(&endpoint(5159), &sample_fix());
        assert_eq!(url, format!("http://127.0.0.1:5159/?id=ABC123&grmpc={}", RMC));
    }

    #[tokio::test]
    async fn test_raw_sentence_reaches_server() {
        let (port, mut requests) = spawn_http_stub("200 OK", "OK").await;
        let client = OpenGtsClient::with_http_client(endpoint(port), RetryPolicy::none(), direct_client());

        assert!(client.send(&sample_fix()).await.unwrap().is_success());

        let request_line = requests.recv().await.unwrap();
        assert!(request_line.contains("id=ABC123"));
        assert!(request_line.contains("grmpc=$GPRMC,123519,A,4807.038,N"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        let port = closed_port().await;
        let client = OpenGtsClient::with_http_client(endpoint(port), RetryPolicy::none(), direct_client());
        assert!(client.send(&sample_fix()).await.is_err());
    }
}
