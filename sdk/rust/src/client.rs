use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub type ClientError = Box<dyn std::error::Error + Send + Sync>;

/// How the backend should run a `process` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessMode {
    /// Reply once the file is produced.
    Sync,
    /// Reply `out: "wait"` while the job runs; poll again with the same request.
    Async,
    /// Reply with the request's content hash only.
    Hash,
}

/// A `process` request: run `stack` over `file`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub file: String,
    pub stack: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ProcessMode>,
}

impl ProcessRequest {
    pub fn to_value(&self) -> Value {
        let mut value = json!({
            "action": "process",
            "file": self.file,
            "stack": self.stack,
        });
        if let Some(mode) = self.mode {
            value["mode"] = json!(mode);
        }
        value
    }
}

/// A decoded relay reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayReply {
    pub out: String,
    #[serde(default)]
    pub details: Value,
}

impl RelayReply {
    pub fn is_ok(&self) -> bool {
        self.out == "ok"
    }
}

pub struct RelayClient {
    client: Client,
    relay_url: String,
}

impl RelayClient {
    pub fn new(relay_url: &str) -> Self {
        // The relay normally sits on the same host or network; skip system proxies.
        let client = Client::builder()
            .no_proxy()
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            relay_url: relay_url.trim_end_matches('/').to_string(),
        }
    }

    /// Post `body` as-is and return the reply text, whatever it contains.
    pub async fn send_raw(&self, body: impl Into<String>) -> Result<String, ClientError> {
        let resp = self
            .client
            .post(format!("{}/vt", self.relay_url))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(format!("Relay returned error status {}: {}", status, text).into());
        }
        Ok(text)
    }

    /// Send any request object and decode the reply.
    pub async fn send(&self, request: &Value) -> Result<RelayReply, ClientError> {
        let text = self.send_raw(request.to_string()).await?;
        Ok(serde_json::from_str::<RelayReply>(&text)?)
    }

    /// Ask the backend for its status line.
    pub async fn status(&self) -> Result<RelayReply, ClientError> {
        self.send(&json!({"action": "status"})).await
    }

    /// Submit a processing request.
    pub async fn process(&self, request: &ProcessRequest) -> Result<RelayReply, ClientError> {
        self.send(&request.to_value()).await
    }

    /// Query the relay's own health endpoint.
    pub async fn health(&self) -> Result<Value, ClientError> {
        let resp = self
            .client
            .get(format!("{}/health", self.relay_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }
}
