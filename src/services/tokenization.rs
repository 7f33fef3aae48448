//! # Card Tokenization Client
//!
//! Exchanges raw card fields for a single-use token on the Pagar.me
//! `core/v5/tokens` endpoint. The caller's public key goes in the `appId`
//! query parameter, the environment selects the staging or production URL.
//!
//! Documentation: <https://docs.pagar.me/reference/criar-token-cart%C3%A3o-1>

use crate::{
    config::GatewayEndpoints,
    consts,
    errors::TokenizationError,
    metric,
    models::{
        card::{CardTokenRequest, CardTokenResponse, GatewayErrorBody},
        checkout::GatewayEnv,
    },
    utils,
};
use async_trait::async_trait;

#[derive(Clone)]
pub struct PagarmeTokenClient {
    client: reqwest::Client,
    endpoints: GatewayEndpoints,
}

impl PagarmeTokenClient {
    pub fn new(endpoints: GatewayEndpoints) -> anyhow::Result<Self> {
        Ok(Self {
            client: utils::build_http_client(endpoints.timeout)?,
            endpoints,
        })
    }
}

/// Picks the most useful message out of a rejected tokenization body.
///
/// Prefers `message`, then the serialized `errors` collection, then a generic
/// message.
pub fn extract_error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<GatewayErrorBody>(body).unwrap_or_default();

    if let Some(message) = parsed.message.filter(|msg| !msg.is_empty()) {
        return message;
    }

    parsed
        .errors
        .filter(|errors| !errors.is_null())
        .and_then(|errors| serde_json::to_string(&errors).ok())
        .unwrap_or_else(|| consts::MSG_TOKENIZATION_FAILED.to_string())
}

/// The only part of a card number that may reach the logs.
fn card_bin(number: &str) -> &str {
    number.get(..consts::BIN_LENGTH).unwrap_or_default()
}

#[async_trait]
impl crate::services::TokenizationService for PagarmeTokenClient {
    async fn create_card_token(
        &self,
        request: &CardTokenRequest,
        public_key: &str,
        env: GatewayEnv,
    ) -> Result<String, TokenizationError> {
        log::info!("tokenizing card with BIN {} on {env}", card_bin(&request.card.number));

        let response = self
            .client
            .post(self.endpoints.tokens_url(env))
            .query(&[("appId", public_key)])
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                metric::incr_tokenization_statds("transport_error");
                TokenizationError::Transport(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(TokenizationError::Transport)?;

        if !status.is_success() {
            log::error!("tokenization rejected with status {status}: {body}");
            metric::incr_tokenization_statds("rejected");
            return Err(TokenizationError::Gateway(extract_error_message(&body)));
        }

        let token = serde_json::from_str::<CardTokenResponse>(&body)
            .map_err(|e| TokenizationError::InvalidResponse(e.to_string()))?
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| TokenizationError::InvalidResponse("missing token id".into()))?;

        log::info!("card token created on {env}");
        metric::incr_tokenization_statds("created");

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::card::{CardTokenRequest, TokenCard},
        services::TokenizationService,
    };
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_card_bin_never_exposes_more_than_six_digits() {
        assert_eq!(card_bin("6035123456789011"), "603512");
        assert_eq!(card_bin("6035"), "");
    }

    fn sample_request() -> CardTokenRequest {
        CardTokenRequest::new(TokenCard {
            number: "6035123456789012".into(),
            holder_name: "MARIA SILVA".into(),
            exp_month: 7,
            exp_year: 29,
            cvv: "123".into(),
        })
    }

    fn client_for(server: &mockito::ServerGuard) -> PagarmeTokenClient {
        PagarmeTokenClient::new(GatewayEndpoints::with_base_url(&server.url())).unwrap()
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(r#"{"message":"The request is invalid."}"#),
            "The request is invalid."
        );
        assert_eq!(
            extract_error_message(r#"{"errors":{"card.number":["invalid"]}}"#),
            r#"{"card.number":["invalid"]}"#
        );
        assert_eq!(extract_error_message("{}"), consts::MSG_TOKENIZATION_FAILED);
        assert_eq!(
            extract_error_message("Bad Gateway"),
            consts::MSG_TOKENIZATION_FAILED
        );
    }

    #[tokio::test]
    async fn test_create_card_token_production() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/core/v5/tokens")
            .match_query(Matcher::UrlEncoded("appId".into(), "pk_test_123".into()))
            .match_body(Matcher::Json(json!({
                "type": "card",
                "card": {
                    "number": "6035123456789012",
                    "holder_name": "MARIA SILVA",
                    "exp_month": 7,
                    "exp_year": 29,
                    "cvv": "123"
                }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"token_abc123","type":"card"}"#)
            .expect(1)
            .create_async()
            .await;

        let token = client_for(&server)
            .create_card_token(&sample_request(), "pk_test_123", GatewayEnv::Production)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(token, "token_abc123");
    }

    #[tokio::test]
    async fn test_create_card_token_uses_staging_url() {
        let mut server = mockito::Server::new_async().await;
        let staging = server
            .mock("POST", "/staging/core/v5/tokens")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"id":"token_stg"}"#)
            .expect(1)
            .create_async()
            .await;

        let token = client_for(&server)
            .create_card_token(&sample_request(), "pk_test_123", GatewayEnv::Staging)
            .await
            .unwrap();

        staging.assert_async().await;
        assert_eq!(token, "token_stg");
    }

    #[tokio::test]
    async fn test_create_card_token_gateway_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/core/v5/tokens")
            .match_query(Matcher::Any)
            .with_status(422)
            .with_body(r#"{"message":"The request is invalid.","errors":{"card.number":["invalid"]}}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .create_card_token(&sample_request(), "pk_test_123", GatewayEnv::Production)
            .await
            .unwrap_err();

        assert!(matches!(&err, TokenizationError::Gateway(msg) if msg == "The request is invalid."));
    }

    #[tokio::test]
    async fn test_create_card_token_missing_id() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/core/v5/tokens")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"type":"card"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .create_card_token(&sample_request(), "pk_test_123", GatewayEnv::Production)
            .await
            .unwrap_err();

        assert!(matches!(err, TokenizationError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_create_card_token_transport_error() {
        let client =
            PagarmeTokenClient::new(GatewayEndpoints::with_base_url("http://127.0.0.1:9")).unwrap();

        let err = client
            .create_card_token(&sample_request(), "pk_test_123", GatewayEnv::Production)
            .await
            .unwrap_err();

        assert!(matches!(err, TokenizationError::Transport(_)));
    }
}
