use crate::domain::model::{MessageLevel, Request, UserMessage};
use crate::domain::ports::UserMessenger;
use std::sync::Mutex;

/// Writes user messages to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMessenger;

impl UserMessenger for TracingMessenger {
    fn message_user(&self, request: &Request, message: UserMessage) {
        match message.level {
            MessageLevel::Success => tracing::info!("✅ [{}] {}", request.path, message.text),
            MessageLevel::Error => tracing::warn!("❌ [{}] {}", request.path, message.text),
        }
    }
}

/// Keeps messages so they can be shown once the request is over.
#[derive(Debug, Default)]
pub struct CollectingMessenger {
    messages: Mutex<Vec<UserMessage>>,
}

impl CollectingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<UserMessage> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl UserMessenger for CollectingMessenger {
    fn message_user(&self, _request: &Request, message: UserMessage) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message);
        }
    }
}
