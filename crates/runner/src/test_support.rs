//! Deterministic scripted generator for runner tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use pipeline::{GenResult, GenerationRequest, ProviderError, TextGenerator, Usage};
use tokio::time::Instant;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Step {
    Text(&'static str, Usage),
    Fail(&'static str),
}

/// Replays scripted steps in order and records when each call happened.
///
/// When the script runs out, `fallback` is replayed forever.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    calls: Mutex<Vec<(Instant, String)>>,
}

impl ScriptedGenerator {
    pub fn new(steps: Vec<Step>, fallback: Step) -> Self {
        Self {
            script: Mutex::new(VecDeque::from(steps)),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always(step: Step) -> Self {
        Self::new(Vec::new(), step)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_instants(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    pub fn user_prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, u)| u.clone())
            .collect()
    }
}

pub fn transient(message: &str) -> ProviderError {
    ProviderError::Transport {
        provider: "scripted".to_string(),
        message: message.to_string(),
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn provider(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenResult, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((Instant::now(), request.user.clone()));
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match step {
            Step::Text(text, usage) => Ok(GenResult::new(text, usage)),
            Step::Fail(message) => Err(transient(message)),
        }
    }
}
