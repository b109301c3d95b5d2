use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{ConnectorConfig, OperationKind, OperationRequest, OperationResponse},
};
use tracing::debug;
use url::Url;

use crate::error::ConnectorError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Carries a named operation to the backend and hands back the raw `data`
/// object.
#[async_trait]
pub trait OperationTransport: Send + Sync {
    async fn execute(
        &self,
        kind: OperationKind,
        request: OperationRequest,
    ) -> Result<Value, ConnectorError>;
}

pub struct HttpTransport {
    http: Client,
    server_url: String,
    config: ConnectorConfig,
}

impl HttpTransport {
    pub fn new(server_url: &str, config: ConnectorConfig) -> Result<Self, ConnectorError> {
        let parsed = Url::parse(server_url)?;
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("partz-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            server_url: parsed.as_str().trim_end_matches('/').to_string(),
            config,
        })
    }
}

#[async_trait]
impl OperationTransport for HttpTransport {
    async fn execute(
        &self,
        kind: OperationKind,
        request: OperationRequest,
    ) -> Result<Value, ConnectorError> {
        let url = format!("{}{}", self.server_url, self.config.execute_path(kind));
        let operation = request.operation_name.clone();
        debug!(%operation, %url, "executing operation");

        let response = self.http.post(url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = serde_json::from_str::<ApiError>(&body)
                .unwrap_or_else(|_| ApiError::new(ErrorCode::Internal, body));
            return Err(ConnectorError::Backend {
                operation,
                status: status.as_u16(),
                error,
            });
        }

        let body: OperationResponse<Value> =
            response
                .json()
                .await
                .map_err(|e| ConnectorError::Decode {
                    operation,
                    message: e.to_string(),
                })?;
        Ok(body.data)
    }
}
