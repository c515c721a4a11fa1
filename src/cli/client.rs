use reqwest::{Method, StatusCode};
use serde_json::Value;

use super::Remote;

/// Thin JSON client for the organiser HTTP API.
pub struct ApiClient {
    http: reqwest::Client,
    server: String,
    token: String,
}

impl ApiClient {
    pub fn new(remote: &Remote) -> anyhow::Result<Self> {
        let token = remote
            .token
            .clone()
            .ok_or_else(|| anyhow::anyhow!("An access token is required (--token or ORGANISER_TOKEN)"))?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            server: remote.server.clone(),
            token,
        })
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> anyhow::Result<Value> {
        self.send(Method::POST, path, Some(body)).await
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> anyhow::Result<Value> {
        let url = format!("{}{}", self.server, path);
        let mut request = self.http.request(method, &url).bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(anyhow::anyhow!(error_message(status, &body)));
        }
        Ok(body)
    }
}

/// Error text for a failed call, preferring the server's `error` field.
fn error_message(status: StatusCode, body: &Value) -> String {
    match body.get("error").and_then(Value::as_str) {
        Some(message) => format!("{} ({})", message, status.as_u16()),
        None => format!("Request failed with status {}", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefers_server_error_message() {
        let body = json!({"error": "Access denied", "code": "FORBIDDEN"});
        assert_eq!(error_message(StatusCode::FORBIDDEN, &body), "Access denied (403)");
        assert!(error_message(StatusCode::BAD_GATEWAY, &Value::Null).contains("502"));
    }

    #[test]
    fn requires_token() {
        let remote = Remote {
            server: "http://localhost:3000".to_string(),
            token: None,
        };
        assert!(ApiClient::new(&remote).is_err());
    }
}
