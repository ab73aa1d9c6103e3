//! JSON-RPC over HTTP with basic auth, as spoken by bitcoind.

use crate::domain::{FeedConfig, FeedError};
use crate::ports::RpcTransport;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a [Value],
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// HTTP transport to bitcoind.
pub struct HttpTransport {
    http_client: reqwest::Client,
    rpc_url: String,
    credentials: Option<(String, String)>,
    request_id: AtomicU64,
}

impl HttpTransport {
    /// Build the client. Reads the cookie file when one is configured.
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(FeedError::transport)?;

        let credentials = match &config.rpc_cookie {
            Some(path) => Some(read_cookie(path)?),
            None if config.rpc_user.is_empty() => None,
            None => Some((config.rpc_user.clone(), config.rpc_password.clone())),
        };

        Ok(Self {
            http_client,
            rpc_url: config.rpc_url.clone(),
            credentials,
            request_id: AtomicU64::new(1),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.rpc_url
    }
}

/// Parse a `user:password` cookie file.
fn read_cookie(path: &Path) -> Result<(String, String), FeedError> {
    let contents = std::fs::read_to_string(path).map_err(|e| FeedError::InvalidConfig {
        reason: format!("cannot read rpc cookie {}: {e}", path.display()),
    })?;
    contents
        .trim()
        .split_once(':')
        .map(|(user, password)| (user.to_string(), password.to_string()))
        .ok_or_else(|| FeedError::InvalidConfig {
            reason: format!("rpc cookie {} is not user:password", path.display()),
        })
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, FeedError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest {
            jsonrpc: "1.0",
            id,
            method,
            params: &params,
        };

        let mut builder = self.http_client.post(&self.rpc_url).json(&request);
        if let Some((user, password)) = &self.credentials {
            builder = builder.basic_auth(user, Some(password));
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                FeedError::Timeout {
                    method: method.to_string(),
                }
            } else {
                FeedError::transport(e)
            }
        })?;

        // bitcoind reports RPC errors with a 4xx/5xx status and a JSON body,
        // except for authentication failures which have no body.
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(FeedError::Transport {
                    message: format!("node rejected rpc credentials ({})", response.status()),
                })
            }
            _ => {}
        }

        let body: JsonRpcResponse = response.json().await.map_err(|e| FeedError::Decode {
            message: format!("{method}: {e}"),
        })?;

        if let Some(error) = body.error {
            return Err(FeedError::from_rpc(error.code, error.message));
        }
        Ok(body.result.unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_cookie_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".cookie");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "__cookie__:s3cr3t").unwrap();

        assert_eq!(
            read_cookie(&path).unwrap(),
            ("__cookie__".to_string(), "s3cr3t".to_string())
        );
    }

    #[test]
    fn test_missing_cookie_is_config_error() {
        let config = FeedConfig {
            rpc_cookie: Some("/nonexistent/.cookie".into()),
            ..FeedConfig::default()
        };
        assert!(matches!(
            HttpTransport::new(&config),
            Err(FeedError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_request_shape() {
        let params = vec![serde_json::json!(5)];
        let request = JsonRpcRequest {
            jsonrpc: "1.0",
            id: 7,
            method: "getblockhash",
            params: &params,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"jsonrpc": "1.0", "id": 7, "method": "getblockhash", "params": [5]})
        );
    }
}
