#[cfg(any(test, feature = "test-util"))]
use std::sync::Mutex;

use async_trait::async_trait;

use appointly_core::SummaryJob;

use crate::prompt::summary_prompt;
use crate::result::AiError;

/// A text-generation backend.
///
/// Implementations wrap a concrete model client. They must not mutate
/// appointment data; they only turn a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync + 'static {
    /// Model identifier used in logs.
    fn model(&self) -> &str;

    /// Generate text for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, AiError>;
}

/// Summarise the appointments carried by `job`.
pub async fn summarize<G>(generator: &G, job: &SummaryJob) -> Result<String, AiError>
where
    G: TextGenerator + ?Sized,
{
    let prompt = summary_prompt(&job.appointments)?;
    generator.generate(&prompt).await
}

/// Generator returning a fixed reply, recording every prompt it sees (tests).
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct FixedTextGenerator {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

#[cfg(any(test, feature = "test-util"))]
impl FixedTextGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts().pop()
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl TextGenerator for FixedTextGenerator {
    fn model(&self) -> &str {
        "fixed"
    }

    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        self.prompts
            .lock()
            .map_err(|_| AiError::Internal("prompt log poisoned".to_string()))?
            .push(prompt.to_string());
        Ok(self.reply.clone())
    }
}
