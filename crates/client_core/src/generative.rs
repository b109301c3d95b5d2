//! Client for a hosted generative-text endpoint, used by the request
//! assistant to turn a mechanic's free-form description into a reply.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use shared::domain::{ChatMessage, ChatSender};
use tracing::debug;

use crate::error::GenerativeError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerativeConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub tools: Vec<Tool>,
    pub system_instruction: Option<String>,
    pub response_modalities: Vec<String>,
}

impl GenerativeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            tools: vec![Tool::GoogleSearch {}],
            system_instruction: None,
            response_modalities: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tool {
    GoogleSearch {},
    CodeExecution {},
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedReply {
    pub text: Option<String>,
    pub audio: Option<Audio>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Audio {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Anything that can produce the next assistant turn for a conversation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, history: &[ChatMessage]) -> Result<GeneratedReply, GenerativeError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "<[Tool]>::is_empty")]
    tools: &'a [Tool],
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_modalities: &'a [String],
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

fn role_for(sender: ChatSender) -> &'static str {
    match sender {
        ChatSender::User => "user",
        ChatSender::Assistant => "model",
    }
}

fn text_content(role: Option<&str>, text: &str) -> Content {
    Content {
        role: role.map(str::to_string),
        parts: vec![Part {
            text: Some(text.to_string()),
            inline_data: None,
        }],
    }
}

impl GenerateResponse {
    fn into_reply(self) -> Result<GeneratedReply, GenerativeError> {
        let mut text = String::new();
        let mut audio = None;
        let parts = self
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .unwrap_or_default();

        for part in parts {
            if let Some(chunk) = part.text {
                text.push_str(&chunk);
            }
            if let (None, Some(inline)) = (&audio, part.inline_data) {
                let bytes = STANDARD
                    .decode(inline.data.as_bytes())
                    .map_err(|e| GenerativeError::Serde(e.to_string()))?;
                audio = Some(Audio {
                    mime_type: inline.mime_type,
                    bytes,
                });
            }
        }

        let text = (!text.trim().is_empty()).then_some(text);
        if text.is_none() && audio.is_none() {
            return Err(GenerativeError::EmptyResponse);
        }
        Ok(GeneratedReply { text, audio })
    }
}

#[derive(Debug, Clone)]
pub struct GenerativeClient {
    http: Client,
    config: GenerativeConfig,
}

impl GenerativeClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(config: GenerativeConfig) -> Result<Self, GenerativeError> {
        if config.api_key.trim().is_empty() {
            return Err(GenerativeError::MissingApiKey);
        }
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("partz-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GenerativeError::Transport(e.to_string()))?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl TextGenerator for GenerativeClient {
    async fn generate(&self, history: &[ChatMessage]) -> Result<GeneratedReply, GenerativeError> {
        let request = GenerateRequest {
            contents: history
                .iter()
                .map(|message| text_content(Some(role_for(message.sender)), &message.text))
                .collect(),
            tools: &self.config.tools,
            system_instruction: self
                .config
                .system_instruction
                .as_deref()
                .map(|instruction| text_content(None, instruction)),
            generation_config: (!self.config.response_modalities.is_empty()).then(|| {
                GenerationConfig {
                    response_modalities: &self.config.response_modalities,
                }
            }),
        };

        debug!(model = %self.config.model, turns = history.len(), "requesting generation");
        let res = self
            .http
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => res
                .json::<GenerateResponse>()
                .await
                .map_err(|e| GenerativeError::Serde(e.to_string()))?
                .into_reply(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GenerativeError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => Err(GenerativeError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(GenerativeError::Http { status, body })
            }
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> GenerativeError {
    if e.is_timeout() {
        GenerativeError::Timeout
    } else {
        GenerativeError::Transport(e.to_string())
    }
}
