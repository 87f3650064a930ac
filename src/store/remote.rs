use crate::core::state::PortfolioState;
use crate::core::store::{StateBackend, UnreadableState};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

/// Mirrors the state to an HTTP endpoint that answers `GET` with the stored
/// document (`{}` when empty) and accepts the same document on `POST`.
pub struct HttpBackend {
    url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("assetbook/0.1")
            .timeout(timeout)
            .build()?;
        Ok(HttpBackend {
            url: url.to_string(),
            client,
        })
    }
}

#[async_trait]
impl StateBackend for HttpBackend {
    fn name(&self) -> &str {
        "remote"
    }

    #[instrument(name = "RemoteLoad", skip(self), fields(url = %self.url))]
    async fn load(&self) -> Result<Option<PortfolioState>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} URL: {}", e, self.url))?;

        if !response.status().is_success() {
            bail!("HTTP error: {} for {}", response.status(), self.url);
        }

        let body: Value = response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", self.url))?;
        debug!("Received remote state");

        match body {
            Value::Object(ref map) if map.is_empty() => Ok(None),
            Value::Object(_) => match serde_json::from_value(body) {
                Ok(state) => Ok(Some(state)),
                Err(e) => Err(UnreadableState {
                    backend: self.url.clone(),
                    reason: e.to_string(),
                }
                .into()),
            },
            other => bail!("Unexpected response from {}: {}", self.url, other),
        }
    }

    #[instrument(name = "RemoteSave", skip(self, state), fields(url = %self.url))]
    async fn save(&self, state: &PortfolioState) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(state)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} URL: {}", e, self.url))?;

        if !response.status().is_success() {
            bail!("HTTP error: {} for {}", response.status(), self.url);
        }
        debug!("Saved state to remote");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> HttpBackend {
        HttpBackend::new(
            &format!("{}/api/data", server.uri()),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_load_state() {
        let mock_server = MockServer::start().await;
        let mock_response = r#"{
            "assets": [{"id": "a1", "symbol": "VOO", "name": "Vanguard", "type": "ETF",
                        "currency": "USD", "currentPrice": 480.0,
                        "createdAt": "2024-01-01T00:00:00Z"}],
            "transactions": [],
            "cash": 150.0,
            "usdRate": 5.1,
            "displayCurrency": "USD"
        }"#;
        Mock::given(method("GET"))
            .and(path("/api/data"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        let state = backend(&mock_server).load().await.unwrap().unwrap();
        assert_eq!(state.assets.len(), 1);
        assert_eq!(state.cash, 150.0);
        assert_eq!(state.usd_rate, 5.1);
    }

    #[tokio::test]
    async fn test_empty_object_means_nothing_stored() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/data"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&mock_server)
            .await;

        assert!(backend(&mock_server).load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_legacy_document_shape() {
        let mock_server = MockServer::start().await;
        // Day-first dates, `null` for non-finite numbers and no stored rate
        let mock_response = r#"{
            "assets": [{"id": "a1", "symbol": "ITSA4", "name": "Itausa", "type": "Stock",
                        "currency": "BRL", "currentPrice": null}],
            "transactions": [{"id": "t1", "assetId": "a1", "type": "buy", "quantity": 10,
                              "price": 9.5, "date": "15/02/2024", "total": 95}],
            "cash": null,
            "displayCurrency": "BRL"
        }"#;
        Mock::given(method("GET"))
            .and(path("/api/data"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        let state = backend(&mock_server)
            .load()
            .await
            .unwrap()
            .unwrap()
            .normalized(4.0);
        assert_eq!(state.assets[0].current_price, 0.0);
        assert_eq!(
            state.transactions[0].date,
            chrono::NaiveDate::from_ymd_opt(2024, 2, 15).unwrap()
        );
        assert_eq!(state.cash, 0.0);
        assert_eq!(state.usd_rate, 4.0);
        assert_eq!(state.holding("a1").quantity, 10.0);
    }

    #[tokio::test]
    async fn test_unparsable_document_is_unreadable_state() {
        let mock_server = MockServer::start().await;
        let mock_response = r#"{"assets": [{"id": "a1"}], "transactions": []}"#;
        Mock::given(method("GET"))
            .and(path("/api/data"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        let err = backend(&mock_server).load().await.unwrap_err();
        assert!(err.is::<UnreadableState>());
    }

    #[tokio::test]
    async fn test_load_error_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/data"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let result = backend(&mock_server).load().await;
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .starts_with("HTTP error: 500 Internal Server Error")
        );
    }

    #[tokio::test]
    async fn test_save_posts_state() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/data"))
            .and(body_partial_json(serde_json::json!({"cash": 99.5, "usdRate": 5.0})))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success": true}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut state = PortfolioState::default();
        state.cash = 99.5;
        backend(&mock_server).save(&state).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_non_success_is_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/data"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let result = backend(&mock_server).save(&PortfolioState::default()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_error() {
        let backend = HttpBackend::new("http://127.0.0.1:9/api/data", Duration::from_millis(500))
            .unwrap();
        assert!(backend.load().await.is_err());
    }
}
