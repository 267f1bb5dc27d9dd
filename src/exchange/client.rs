//! Bitfinex v1 REST API client.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use sha2::Sha384;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, instrument};

use crate::config::BitfinexConfig;
use crate::exchange::error::ExchangeError;
use crate::exchange::types::*;

const BASE_URL: &str = "https://api.bitfinex.com";

/// Error payload the exchange returns on failed requests.
#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

/// Bitfinex REST client for public market data and funding-offer management.
pub struct BitfinexClient {
    http: Client,
    api_key: String,
    secret_key: String,
    base_url: String,
}

impl BitfinexClient {
    /// Create a new client from configuration.
    pub fn new(config: &BitfinexConfig) -> Result<Self, ExchangeError> {
        Self::with_base_url(config, BASE_URL)
    }

    /// Create a client against a specific API host (tests point this at a
    /// local mock server).
    pub fn with_base_url(config: &BitfinexConfig, base_url: &str) -> Result<Self, ExchangeError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            secret_key: config.secret_key.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Generate the HMAC-SHA384 signature over the base64 payload.
    fn sign(&self, payload_b64: &str) -> String {
        let mut mac = Hmac::<Sha384>::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload_b64.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Strictly increasing nonce in microseconds.
    fn nonce() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_micros() as u64
    }

    // ==================== Market Data (Public) ====================

    /// Get the funding book for a currency.
    #[instrument(skip(self))]
    pub async fn lendbook(&self, currency: &str) -> Result<Lendbook, ExchangeError> {
        let url = format!(
            "{}/v1/lendbook/{}?limit_bids=0&limit_asks=10000",
            self.base_url,
            currency.to_lowercase()
        );
        let response = self.http.get(&url).send().await?;
        Self::parse(response).await
    }

    /// Get the public ticker for a trading pair (e.g. "btcusd").
    #[instrument(skip(self))]
    pub async fn ticker(&self, pair: &str) -> Result<Ticker, ExchangeError> {
        let url = format!("{}/v1/pubticker/{}", self.base_url, pair.to_lowercase());
        let response = self.http.get(&url).send().await?;
        Self::parse(response).await
    }

    // ==================== Account (Authenticated) ====================

    /// Get all wallet balances.
    #[instrument(skip(self))]
    pub async fn balances(&self) -> Result<Vec<WalletBalance>, ExchangeError> {
        self.authed_post("/v1/balances", json!({})).await
    }

    /// Get all of our active offers.
    #[instrument(skip(self))]
    pub async fn active_offers(&self) -> Result<Vec<ActiveOffer>, ExchangeError> {
        self.authed_post("/v1/offers", json!({})).await
    }

    /// Place a new funding offer. Rate is annualized percent.
    #[instrument(skip(self))]
    pub async fn new_offer(
        &self,
        currency: &str,
        amount: Decimal,
        annual_rate: Decimal,
        period_days: u32,
    ) -> Result<ActiveOffer, ExchangeError> {
        let request = NewOfferRequest {
            currency: currency.to_uppercase(),
            amount: amount.to_string(),
            rate: annual_rate.to_string(),
            period: period_days,
            direction: "lend".to_string(),
        };

        self.authed_post(
            "/v1/offer/new",
            serde_json::to_value(&request).unwrap_or_default(),
        )
        .await
    }

    /// Cancel one of our offers.
    #[instrument(skip(self))]
    pub async fn cancel_offer(&self, offer_id: u64) -> Result<(), ExchangeError> {
        // The response echoes the cancelled offer; only success matters here.
        let _: serde_json::Value = self
            .authed_post("/v1/offer/cancel", json!({ "offer_id": offer_id }))
            .await?;
        Ok(())
    }

    // ==================== Plumbing ====================

    /// POST an authenticated v1 request. The parameters travel in the signed
    /// base64 payload header, not the query string.
    async fn authed_post<T: DeserializeOwned>(
        &self,
        path: &str,
        mut params: serde_json::Value,
    ) -> Result<T, ExchangeError> {
        if let Some(object) = params.as_object_mut() {
            object.insert("request".to_string(), json!(path));
            object.insert("nonce".to_string(), json!(Self::nonce().to_string()));
        }

        let payload_b64 = BASE64.encode(params.to_string());
        let signature = self.sign(&payload_b64);

        debug!(%path, "authenticated request");

        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header("X-BFX-APIKEY", &self.api_key)
            .header("X-BFX-PAYLOAD", &payload_b64)
            .header("X-BFX-SIGNATURE", &signature)
            .send()
            .await?;

        Self::parse(response).await
    }

    /// Decode a successful response or surface the exchange's error message.
    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ExchangeError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiMessage>()
                .await
                .map(|m| m.message)
                .unwrap_or_else(|_| "unreadable error body".to_string());
            return Err(ExchangeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str) -> BitfinexClient {
        let config = BitfinexConfig {
            api_key: "key".to_string(),
            secret_key: "secret".to_string(),
            ..Default::default()
        };
        BitfinexClient::with_base_url(&config, base_url).unwrap()
    }

    #[tokio::test]
    async fn test_lendbook_fetch_and_parse() {
        let server = MockServer::start().await;
        let body = r#"{
            "bids": [],
            "asks": [
                {"rate":"8.3965","amount":"407.7","period":2,"timestamp":"1444260343.0","frr":"No"},
                {"rate":"9.2406","amount":"150.0","period":30,"timestamp":"1444260704.0","frr":"Yes"}
            ]
        }"#;

        Mock::given(method("GET"))
            .and(path("/v1/lendbook/usd"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
            .mount(&server)
            .await;

        let book = client(&server.uri()).lendbook("USD").await.unwrap();

        assert_eq!(book.asks.len(), 2);
        assert_eq!(book.asks[0].rate, dec!(8.3965));
        assert!(book.asks[1].frr);
    }

    #[tokio::test]
    async fn test_new_offer_sends_signed_headers() {
        let server = MockServer::start().await;
        let body = r#"{
            "id":13800585,
            "currency":"USD",
            "rate":"20.0",
            "period":2,
            "direction":"lend",
            "timestamp":"1444279698.21",
            "is_live":true,
            "is_cancelled":false,
            "original_amount":"50.0",
            "remaining_amount":"50.0",
            "executed_amount":"0.0"
        }"#;

        Mock::given(method("POST"))
            .and(path("/v1/offer/new"))
            .and(header_exists("X-BFX-APIKEY"))
            .and(header_exists("X-BFX-PAYLOAD"))
            .and(header_exists("X-BFX-SIGNATURE"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
            .mount(&server)
            .await;

        let offer = client(&server.uri())
            .new_offer("usd", dec!(50.0), dec!(20.0), 2)
            .await
            .unwrap();

        assert_eq!(offer.id, 13800585);
        assert!(offer.is_live);
    }

    #[tokio::test]
    async fn test_api_error_surfaces_exchange_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/offer/cancel"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_raw(r#"{"message":"Offer could not be cancelled."}"#, "application/json"),
            )
            .mount(&server)
            .await;

        let err = client(&server.uri()).cancel_offer(1).await.unwrap_err();

        match err {
            ExchangeError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Offer could not be cancelled.");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
