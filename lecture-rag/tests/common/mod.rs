//! Deterministic in-process backends shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use lecture_rag::{EmbeddingProvider, RagError, Result, TextGenerator};

/// Embeds text without a network service.
///
/// Texts registered with [`FakeEmbedder::with_vector`] get that vector;
/// everything else gets a 3-dimensional vector derived from the text.
#[derive(Default)]
pub struct FakeEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn derived_vector(text: &str) -> Vec<f32> {
        let words = text.split_whitespace().count() as f32;
        let chars = text.chars().count() as f32;
        let first = text.bytes().next().map_or(0.0, f32::from);
        vec![words, chars, first]
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    fn name(&self) -> &str {
        "fake"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(text) {
            return Err(RagError::EmbeddingError {
                provider: "fake".into(),
                message: format!("refused to embed '{text}'"),
            });
        }
        Ok(self.vectors.get(text).cloned().unwrap_or_else(|| Self::derived_vector(text)))
    }
}

/// How a [`FakeGenerator`] answers.
pub enum Reply {
    Text(String),
    Fail,
}

/// Text generator with a canned reply that records the prompts it receives.
pub struct FakeGenerator {
    reply: Reply,
    prompts: Mutex<Vec<(String, String)>>,
}

impl FakeGenerator {
    pub fn replying(text: &str) -> Self {
        Self { reply: Reply::Text(text.to_string()), prompts: Mutex::new(Vec::new()) }
    }

    pub fn failing() -> Self {
        Self { reply: Reply::Fail, prompts: Mutex::new(Vec::new()) }
    }

    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    fn name(&self) -> &str {
        "fake-llm"
    }

    async fn generate(&self, system_instruction: &str, user_message: &str) -> Result<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((system_instruction.to_string(), user_message.to_string()));
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail => Err(RagError::GenerationError {
                provider: "fake-llm".into(),
                message: "service unavailable".into(),
            }),
        }
    }
}
