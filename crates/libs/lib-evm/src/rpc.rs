//! # JSON-RPC Transport
//!
//! [`RpcTransport`] is the seam between the client and the outside world. Every
//! read goes through it, which lets tests replace the node with a scripted stub.
//! [`HttpTransport`] is the production implementation: JSON-RPC 2.0 over HTTP(S)
//! with a pooled `reqwest` client.

use crate::error::RpcError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// A JSON-RPC endpoint.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Send one request and return its `result`.
    ///
    /// A `null` result (for example a receipt that is not mined yet) is
    /// returned as `Value::Null`, not as an error.
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// JSON-RPC over HTTP(S).
pub struct HttpTransport {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpTransport {
    /// Create a transport for `url`.
    ///
    /// The connection is lazy; nothing is sent until the first request.
    pub fn new(url: &str) -> Result<Self, RpcError> {
        let client = Client::builder()
            .use_rustls_tls()
            .pool_max_idle_per_host(10)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RpcError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        debug!(id, method, url = %self.url, "JSON-RPC request");

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| RpcError::Transport(format!("Request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RpcError::Transport(format!("Failed to read response: {}", e)))?;

        decode_response(status, &text).map_err(|err| {
            if let RpcError::Rpc { code, message, .. } = &err {
                debug!(id, method, code = *code, message = %message, "JSON-RPC error");
            }
            err
        })
    }
}

/// Turn an HTTP reply into a JSON-RPC result.
///
/// Some nodes answer errors with a non-2xx status and a regular JSON-RPC error
/// body; that body wins over the bare status.
fn decode_response(status: StatusCode, text: &str) -> Result<Value, RpcError> {
    let parsed = serde_json::from_str::<JsonRpcResponse>(text);

    if !status.is_success() {
        return match parsed {
            Ok(JsonRpcResponse { error: Some(err), .. }) => Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
                data: err.data,
            }),
            _ => Err(RpcError::Transport(format!("HTTP {}", status))),
        };
    }

    let body = parsed.map_err(|e| RpcError::Decode(format!("Invalid JSON-RPC response: {}", e)))?;
    if let Some(err) = body.error {
        return Err(RpcError::Rpc {
            code: err.code,
            message: err.message,
            data: err.data,
        });
    }

    Ok(body.result.unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_object_parsing() {
        let raw = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"execution reverted"}}"#;
        let parsed: JsonRpcResponse = serde_json::from_str(raw).unwrap();
        let err = parsed.error.unwrap();
        assert_eq!(err.code, -32000);
        assert_eq!(err.message, "execution reverted");
        assert!(parsed.result.is_none());
    }

    #[test]
    fn test_null_result() {
        let raw = r#"{"jsonrpc":"2.0","id":1,"result":null}"#;
        let parsed: JsonRpcResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.error.is_none());
        assert_eq!(parsed.result.unwrap_or(Value::Null), Value::Null);
    }

    #[test]
    fn test_error_body_on_http_failure_is_kept() {
        let raw = r#"{"jsonrpc":"2.0","id":1,"error":{"code":4001,"message":"User rejected the request."}}"#;
        let err = decode_response(StatusCode::BAD_REQUEST, raw).unwrap_err();
        assert!(matches!(err, RpcError::Rpc { code: 4001, .. }));
    }

    #[test]
    fn test_http_failure_without_body_is_transport() {
        let err = decode_response(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, RpcError::Transport(_)));

        let ok_without_error = r#"{"jsonrpc":"2.0","id":1,"result":"0x1"}"#;
        let err = decode_response(StatusCode::SERVICE_UNAVAILABLE, ok_without_error).unwrap_err();
        assert!(matches!(err, RpcError::Transport(_)));
    }

    #[test]
    fn test_success_decodes_result() {
        let raw = r#"{"jsonrpc":"2.0","id":1,"result":"0x2a"}"#;
        assert_eq!(decode_response(StatusCode::OK, raw).unwrap(), Value::from("0x2a"));
        assert!(matches!(
            decode_response(StatusCode::OK, "not json"),
            Err(RpcError::Decode(_))
        ));
    }

    #[test]
    fn test_transport_url() {
        let transport = HttpTransport::new("http://localhost:8545").unwrap();
        assert_eq!(transport.url(), "http://localhost:8545");
    }
}
