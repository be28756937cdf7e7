use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{
    config::GatewayConfig,
    error::{GatewayError, Result},
    gateway::ActionGateway,
    ndr::types::{ActionRequest, ActionTarget, NdrAction},
};

const SINGLE_ACTION_PATH: &str = "/ndr/action";
const BULK_ACTION_PATH: &str = "/ndr/bulk-action";

#[derive(Serialize)]
#[serde(untagged)]
enum ActionBody<'a> {
    Single { action: NdrAction, waybill: &'a str },
    Bulk { action: NdrAction, order_ids: &'a [String] },
}

/// HTTP client for the courier's NDR action API
pub struct HttpActionGateway {
    client: Client,
    base_url: String,
    api_token: String,
}

impl HttpActionGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(GatewayError::from)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn body<'a>(request: &'a ActionRequest) -> (&'static str, ActionBody<'a>) {
        match request.target() {
            ActionTarget::Single(waybill) => (
                SINGLE_ACTION_PATH,
                ActionBody::Single { action: request.action(), waybill },
            ),
            ActionTarget::Bulk(order_ids) => (
                BULK_ACTION_PATH,
                ActionBody::Bulk { action: request.action(), order_ids },
            ),
        }
    }
}

#[async_trait]
impl ActionGateway for HttpActionGateway {
    async fn submit(&self, request: &ActionRequest) -> std::result::Result<String, GatewayError> {
        let (path, body) = Self::body(request);
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {} ({} for {} shipments)", url, request.action(), request.len());

        let mut builder = self.client.post(&url).json(&body);
        if !self.api_token.is_empty() {
            builder = builder.header("Authorization", format!("Token {}", self.api_token));
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!("Action gateway returned {} for {}", status, request.action());
            return Err(GatewayError::Status { status: status.as_u16(), body: text });
        }

        parse_correlation_id(&text)
    }
}

/// Pull the correlation id out of a successful gateway response
fn parse_correlation_id(body: &str) -> std::result::Result<String, GatewayError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| GatewayError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    if value.get("success").and_then(Value::as_bool) == Some(false) {
        let message = value
            .get("error")
            .or_else(|| value.get("message"))
            .map(|m| match m {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "no reason given".to_string());
        return Err(GatewayError::Rejected(message));
    }

    ["correlation_id", "upl_id", "request_id"]
        .iter()
        .find_map(|key| match value.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .ok_or_else(|| GatewayError::MalformedResponse("response carries no correlation id".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn gateway(url: &str) -> HttpActionGateway {
        HttpActionGateway::new(&GatewayConfig {
            base_url: url.to_string(),
            api_token: "secret".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_bulk_request_shape() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/ndr/bulk-action")
            .match_header("authorization", "Token secret")
            .match_body(Matcher::Json(json!({
                "action": "RE-ATTEMPT",
                "order_ids": ["AWB1", "AWB2"]
            })))
            .with_status(200)
            .with_body(r#"{"correlation_id": "UPL-42"}"#)
            .create_async()
            .await;

        let request =
            ActionRequest::bulk(NdrAction::ReAttempt, vec!["AWB1".into(), "AWB2".into()]).unwrap();
        let id = gateway(&server.url()).submit(&request).await.unwrap();

        assert_eq!(id, "UPL-42");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_single_request_shape() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/ndr/action")
            .match_body(Matcher::Json(json!({
                "action": "PICKUP_RESCHEDULE",
                "waybill": "AWB9"
            })))
            .with_status(201)
            .with_body(r#"{"upl_id": 1234}"#)
            .create_async()
            .await;

        let request = ActionRequest::single(NdrAction::PickupReschedule, "AWB9").unwrap();
        let id = gateway(&server.url()).submit(&request).await.unwrap();

        assert_eq!(id, "1234");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/ndr/bulk-action")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let request = ActionRequest::bulk(NdrAction::ReAttempt, vec!["AWB1".into()]).unwrap();
        let err = gateway(&server.url()).submit(&request).await.unwrap_err();

        assert!(matches!(err, GatewayError::Status { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold the connection without ever answering
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(socket);
        });

        let gateway = HttpActionGateway::new(&GatewayConfig {
            base_url: format!("http://{}", addr),
            api_token: String::new(),
            timeout_secs: 1,
        })
        .unwrap();
        let request = ActionRequest::bulk(NdrAction::ReAttempt, vec!["AWB1".into()]).unwrap();
        let err = gateway.submit(&request).await.unwrap_err();

        assert!(matches!(err, GatewayError::Transport(_)));
        assert!(crate::error::NdrError::from(err).is_retryable());
        server.abort();
    }

    #[test]
    fn test_parse_rejection() {
        let err = parse_correlation_id(r#"{"success": false, "error": "AWB not in NDR"}"#).unwrap_err();
        assert!(matches!(err, GatewayError::Rejected(ref m) if m == "AWB not in NDR"));
    }

    #[test]
    fn test_parse_missing_id() {
        assert!(matches!(
            parse_correlation_id(r#"{"success": true}"#),
            Err(GatewayError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_correlation_id("<html>"),
            Err(GatewayError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_request_id_alias() {
        assert_eq!(parse_correlation_id(r#"{"request_id": "R-1"}"#).unwrap(), "R-1");
    }
}
