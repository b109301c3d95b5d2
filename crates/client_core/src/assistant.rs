use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::domain::{ChatMessage, ChatMessageId, ChatSender, ConversationId};
use storage::Storage;
use tracing::{error, info};

use crate::generative::{Audio, TextGenerator};

pub const WELCOME_MESSAGE: &str = "Welcome to Partz Finda! What part do you need? Describe it in your own words - include the vehicle make, model, year, and any specific details.";
pub const FALLBACK_MESSAGE: &str = "I'm having trouble with that request right now. Please try again.";
const AUDIO_ONLY_PLACEHOLDER: &str = "(audio reply)";

/// Where a session's turns are kept between runs.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn append(&self, message: &ChatMessage) -> Result<()>;
    async fn load(&self, conversation_id: ConversationId) -> Result<Vec<ChatMessage>>;
}

#[derive(Default)]
pub struct InMemoryTranscript {
    messages: Mutex<Vec<ChatMessage>>,
}

#[async_trait]
impl TranscriptStore for InMemoryTranscript {
    async fn append(&self, message: &ChatMessage) -> Result<()> {
        self.messages
            .lock()
            .map_err(|_| anyhow!("transcript lock poisoned"))?
            .push(message.clone());
        Ok(())
    }

    async fn load(&self, conversation_id: ConversationId) -> Result<Vec<ChatMessage>> {
        Ok(self
            .messages
            .lock()
            .map_err(|_| anyhow!("transcript lock poisoned"))?
            .iter()
            .filter(|message| message.conversation_id == conversation_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TranscriptStore for Storage {
    async fn append(&self, message: &ChatMessage) -> Result<()> {
        self.append_chat_message(message).await
    }

    async fn load(&self, conversation_id: ConversationId) -> Result<Vec<ChatMessage>> {
        self.list_chat_messages(conversation_id).await
    }
}

/// One mechanic's conversation with the request assistant.
///
/// The greeting is always the first entry in [`AssistantSession::messages`]
/// but is never persisted or sent to the generator. A failed turn leaves a
/// single fallback reply behind and the session stays usable. Messages that
/// were never persisted are display only, so the generator sees the same
/// history a resumed session would load.
pub struct AssistantSession {
    conversation_id: ConversationId,
    messages: Vec<ChatMessage>,
    local_only: HashSet<ChatMessageId>,
    last_audio: Option<Audio>,
    generator: Arc<dyn TextGenerator>,
    transcript: Arc<dyn TranscriptStore>,
}

impl AssistantSession {
    pub fn new(generator: Arc<dyn TextGenerator>, transcript: Arc<dyn TranscriptStore>) -> Self {
        let conversation_id = ConversationId::new();
        Self {
            conversation_id,
            messages: vec![greeting(conversation_id)],
            local_only: HashSet::new(),
            last_audio: None,
            generator,
            transcript,
        }
    }

    pub async fn resume(
        conversation_id: ConversationId,
        generator: Arc<dyn TextGenerator>,
        transcript: Arc<dyn TranscriptStore>,
    ) -> Result<Self> {
        let mut messages = vec![greeting(conversation_id)];
        messages.extend(transcript.load(conversation_id).await?);
        Ok(Self {
            conversation_id,
            messages,
            local_only: HashSet::new(),
            last_audio: None,
            generator,
            transcript,
        })
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last_audio(&self) -> Option<&Audio> {
        self.last_audio.as_ref()
    }

    /// Sends one user turn. Returns the assistant's reply, or `None` when
    /// the input is blank and nothing was sent.
    pub async fn send(&mut self, text: &str) -> Option<&ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let user = ChatMessage::new(self.conversation_id, ChatSender::User, text);
        self.messages.push(user.clone());
        self.last_audio = None;

        let reply = match self.respond(&user).await {
            Ok(reply) => reply,
            Err(err) => {
                error!(conversation_id = %self.conversation_id, error = %err, "assistant turn failed");
                let fallback =
                    ChatMessage::new(self.conversation_id, ChatSender::Assistant, FALLBACK_MESSAGE);
                self.local_only.insert(fallback.id);
                fallback
            }
        };
        self.messages.push(reply);
        self.messages.last()
    }

    async fn respond(&mut self, user: &ChatMessage) -> Result<ChatMessage> {
        if let Err(err) = self.transcript.append(user).await {
            self.local_only.insert(user.id);
            return Err(err);
        }

        let history: Vec<ChatMessage> = self.messages[1..]
            .iter()
            .filter(|message| !self.local_only.contains(&message.id))
            .cloned()
            .collect();
        let generated = self.generator.generate(&history).await?;
        let text = match generated.text {
            Some(text) => text,
            None if generated.audio.is_some() => AUDIO_ONLY_PLACEHOLDER.to_string(),
            None => return Err(anyhow!("generator returned nothing")),
        };
        self.last_audio = generated.audio;

        let reply = ChatMessage::new(self.conversation_id, ChatSender::Assistant, text);
        self.transcript.append(&reply).await?;
        info!(conversation_id = %self.conversation_id, "assistant replied");
        Ok(reply)
    }
}

fn greeting(conversation_id: ConversationId) -> ChatMessage {
    ChatMessage::new(conversation_id, ChatSender::Assistant, WELCOME_MESSAGE)
}

#[cfg(test)]
#[path = "tests/assistant_tests.rs"]
mod tests;
