//! reqwest-backed transport for the live score service.

use async_trait::async_trait;

use super::{FetchError, Request, Result, ScoreTransport, TransportResponse};
use crate::config::EndpointConfig;

/// HTTPS client for `https://{host}{path}/{endpoint}`.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    app_id: u32,
}

impl HttpTransport {
    pub fn new(endpoint: &EndpointConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(endpoint.request_timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: format!("https://{}{}", endpoint.host, endpoint.path),
            app_id: endpoint.app_id,
        })
    }

    pub fn url(&self, request: &Request) -> String {
        format!("{}/{}", self.base_url, request.endpoint())
    }

    fn params(&self, request: &Request, ticket: &str) -> Vec<(&'static str, String)> {
        let mut params = request.query();
        params.push(("app_id", self.app_id.to_string()));
        params.push(("steam_auth", String::new()));
        params.push(("steam_id", ticket.to_string()));
        params
    }
}

#[async_trait]
impl ScoreTransport for HttpTransport {
    async fn send(&self, request: &Request, ticket: &str) -> Result<TransportResponse> {
        let response = self
            .client
            .get(self.url(request))
            .query(&self.params(request, ticket))
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(format!("failed to read body: {}", e)))?;

        tracing::debug!("{} -> {} ({} bytes)", request, status, body.len());

        Ok(TransportResponse::new(status, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use board_core::HighscoreableId;

    use super::*;

    #[test]
    fn test_url_and_params() {
        let transport = HttpTransport::new(&EndpointConfig::default()).unwrap();
        let request = Request::Scores(HighscoreableId::level(5));

        assert_eq!(
            transport.url(&request),
            "https://dojo.nplusplus.ninja/prod/steam/get_scores"
        );
        let params = transport.params(&request, "7656");
        assert!(params.contains(&("level_id", "5".to_string())));
        assert!(params.contains(&("app_id", "230270".to_string())));
        assert!(params.contains(&("steam_id", "7656".to_string())));
    }
}
