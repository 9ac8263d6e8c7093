use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use progress_logging::progress_trace;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::{FailureKind, ProgressRecord, TransportError, ViewId};

/// Model holding the progress rows on the backend.
pub const PROGRESS_MODEL: &str = "web.progress";

#[derive(Debug, Clone)]
pub struct RpcSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Session cookie value, sent as `session_id`.
    pub session_id: Option<String>,
    /// Passed as `kwargs.context` so the backend can localise rows.
    pub user_context: Map<String, Value>,
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8069".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            session_id: None,
            user_context: Map::new(),
        }
    }
}

/// Backend operations the indicator needs. All calls are idempotent reads
/// except `cancel_progress`.
#[async_trait::async_trait]
pub trait ProgressBackend: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<Vec<ProgressRecord>, TransportError>;

    async fn resolve_view(&self, model: &str) -> Result<ViewId, TransportError>;

    async fn cancel_progress(&self, code: &str) -> Result<(), TransportError>;
}

#[derive(Serialize)]
struct RpcRequest<P> {
    jsonrpc: &'static str,
    method: &'static str,
    params: P,
    id: u64,
}

#[derive(Serialize)]
struct CallKw<'a> {
    model: &'a str,
    method: &'a str,
    args: Vec<Value>,
    kwargs: Map<String, Value>,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<RpcErrorData>,
}

#[derive(Deserialize)]
struct RpcErrorData {
    #[serde(default)]
    message: Option<String>,
}

/// JSON-RPC 2.0 envelope over one shared HTTP client.
#[derive(Debug)]
pub(crate) struct JsonRpcTransport {
    client: reqwest::Client,
    base_url: reqwest::Url,
    next_id: AtomicU64,
}

impl JsonRpcTransport {
    pub(crate) fn new(
        base_url: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
        session_id: Option<&str>,
    ) -> Result<Self, TransportError> {
        let base_url = reqwest::Url::parse(base_url)
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))?;

        let mut headers = HeaderMap::new();
        if let Some(session_id) = session_id {
            let cookie = HeaderValue::from_str(&format!("session_id={session_id}"))
                .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))?;
            headers.insert(COOKIE, cookie);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|err| TransportError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            client,
            base_url,
            next_id: AtomicU64::new(1),
        })
    }

    pub(crate) async fn call<P, T>(&self, path: &str, params: P) -> Result<T, TransportError>
    where
        P: Serialize + Send,
        T: DeserializeOwned,
    {
        let url = self
            .base_url
            .join(path)
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            method: "call",
            params,
            id,
        };

        progress_trace!("rpc #{} -> {}", id, url);
        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let envelope: RpcResponse = serde_json::from_slice(&body)
            .map_err(|err| TransportError::new(FailureKind::Decode, err.to_string()))?;

        if let Some(error) = envelope.error {
            let detail = error
                .data
                .and_then(|data| data.message)
                .unwrap_or(error.message);
            return Err(TransportError::new(
                FailureKind::Rpc { code: error.code },
                detail,
            ));
        }

        serde_json::from_value(envelope.result)
            .map_err(|err| TransportError::new(FailureKind::Decode, err.to_string()))
    }
}

/// Talks to the backend's `call_kw` JSON-RPC endpoint.
#[derive(Debug)]
pub struct JsonRpcBackend {
    transport: JsonRpcTransport,
    user_context: Map<String, Value>,
}

impl JsonRpcBackend {
    pub fn new(settings: RpcSettings) -> Result<Self, TransportError> {
        let transport = JsonRpcTransport::new(
            &settings.base_url,
            settings.connect_timeout,
            settings.request_timeout,
            settings.session_id.as_deref(),
        )?;
        Ok(Self {
            transport,
            user_context: settings.user_context,
        })
    }

    async fn call_kw<T: DeserializeOwned>(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<T, TransportError> {
        let mut kwargs = Map::new();
        kwargs.insert(
            "context".to_string(),
            Value::Object(self.user_context.clone()),
        );
        let path = format!("/web/dataset/call_kw/{model}/{method}");
        let params = CallKw {
            model,
            method,
            args,
            kwargs,
        };
        self.transport.call(&path, params).await
    }
}

#[async_trait::async_trait]
impl ProgressBackend for JsonRpcBackend {
    async fn fetch_snapshot(&self) -> Result<Vec<ProgressRecord>, TransportError> {
        self.call_kw(PROGRESS_MODEL, "get_all_progress", Vec::new())
            .await
    }

    async fn resolve_view(&self, model: &str) -> Result<ViewId, TransportError> {
        let value: Value = self
            .call_kw(model, "get_progress_view_id", Vec::new())
            .await?;
        view_id_from(&value).ok_or_else(|| {
            TransportError::new(
                FailureKind::Decode,
                format!("no view id in {value}"),
            )
        })
    }

    async fn cancel_progress(&self, code: &str) -> Result<(), TransportError> {
        let _: Value = self
            .call_kw(PROGRESS_MODEL, "cancel_progress", vec![json!(code)])
            .await?;
        Ok(())
    }
}

/// Accepts a bare id or a `[id, display_name]` pair.
fn view_id_from(value: &Value) -> Option<ViewId> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::Array(pair) => pair.first().and_then(Value::as_i64),
        _ => None,
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::new(FailureKind::Timeout, err.to_string());
    }
    TransportError::new(FailureKind::Network, err.to_string())
}
