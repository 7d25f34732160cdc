use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use super::{PositionFeed, RawPosition};
use crate::config::MonitorConfig;
use crate::fetch::{HttpClient, fetch_bytes};
use crate::parser::parse_position_response;

/// Client for the Seoul Open API `realtimePosition` endpoint.
pub struct SeoulOpenApi<C> {
    client: C,
    base_url: String,
    api_key: String,
    page_size: u32,
}

impl<C: HttpClient> SeoulOpenApi<C> {
    pub fn new(client: C, base_url: &str, api_key: &str, page_size: u32) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            page_size,
        }
    }

    pub fn from_config(client: C, config: &MonitorConfig) -> Self {
        Self::new(client, &config.base_url, &config.api_key, config.page_size)
    }

    /// `{base}/{key}/json/realtimePosition/0/{page_size}/{line}`, with every
    /// segment percent-encoded.
    pub fn position_url(&self, line: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid API base URL '{}'", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("API base URL '{}' cannot hold a path", self.base_url))?
            .pop_if_empty()
            .extend([
                self.api_key.as_str(),
                "json",
                "realtimePosition",
                "0",
                &self.page_size.to_string(),
                line,
            ]);
        Ok(url)
    }
}

#[async_trait]
impl<C: HttpClient> PositionFeed for SeoulOpenApi<C> {
    async fn fetch_positions(&self, line: &str) -> Result<Vec<RawPosition>> {
        let url = self.position_url(line)?;
        let bytes = fetch_bytes(&self.client, url)
            .await
            .with_context(|| format!("position request failed for line {line}"))?;
        debug!(line, bytes = bytes.len(), "Position response received");
        parse_position_response(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;

    fn api(base: &str) -> SeoulOpenApi<BasicClient> {
        SeoulOpenApi::new(BasicClient::new().unwrap(), base, "sample", 100)
    }

    #[test]
    fn test_position_url_layout() {
        let url = api("http://swopenAPI.seoul.go.kr/api/subway/")
            .position_url("2호선")
            .unwrap();

        assert_eq!(url.host_str(), Some("swopenapi.seoul.go.kr"));
        let segments: Vec<_> = url.path_segments().unwrap().collect();
        assert_eq!(
            segments[..7],
            ["api", "subway", "sample", "json", "realtimePosition", "0", "100"]
        );
        // Line names are sent percent-encoded.
        assert_eq!(segments[7], "2%ED%98%B8%EC%84%A0");
    }

    #[test]
    fn test_position_url_rejects_bad_base() {
        assert!(api("not a url").position_url("1호선").is_err());
    }
}
