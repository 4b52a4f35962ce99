//! A `Backend` that never leaves the process.
//!
//! Note: this is compiled into the release binary too, so the whole program can be run end to end
//! without an API key by setting `DAILY_TOOLS_IN_TEST_MODE`.

use crate::api::Backend;
use crate::Result;
use anyhow::bail;
use async_trait::async_trait;
use std::sync::Mutex;

/// Replies with a canned text, or echoes the prompt back when none is set. Every prompt it
/// receives is recorded.
#[derive(Debug, Default)]
pub struct EchoBackend {
    reply: Option<String>,
    fail: bool,
    prompts: Mutex<Vec<String>>,
}

impl EchoBackend {
    /// A backend that answers every prompt with `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            ..Self::default()
        }
    }

    /// A backend whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// The prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        match self.prompts.lock() {
            Ok(prompts) => prompts.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Backend for EchoBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        match self.prompts.lock() {
            Ok(mut prompts) => prompts.push(prompt.to_string()),
            Err(poisoned) => poisoned.into_inner().push(prompt.to_string()),
        }
        if self.fail {
            bail!("The test backend is set to fail");
        }
        Ok(match &self.reply {
            Some(reply) => reply.clone(),
            None => format!("[echo] {prompt}"),
        })
    }
}
