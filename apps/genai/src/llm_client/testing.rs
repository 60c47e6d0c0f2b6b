//! Scripted in-memory provider for exercising the client without a network.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::llm_client::provider::{
    short_id, ModelCandidate, ModelHandle, ModelProvider, ProviderError, SamplingParams,
};
use crate::llm_client::{ClientSettings, GenerativeClient};

type Reply = Result<String, ProviderError>;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub prompt: String,
    pub params: SamplingParams,
}

/// Replies are consumed per model from a queue; when a model's queue is empty
/// its `always` reply is used, else `"reply from <model>"`.
#[derive(Default)]
pub struct ScriptedProvider {
    models: Vec<ModelCandidate>,
    list_error: Option<ProviderError>,
    unresolvable: HashSet<String>,
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    always: HashMap<String, Reply>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn with_models(ids: &[&str]) -> Self {
        Self {
            models: ids.iter().map(|id| ModelCandidate::new(id, true)).collect(),
            ..Self::default()
        }
    }

    pub fn failing_discovery(mut self, message: &str) -> Self {
        self.list_error = Some(ProviderError::new(message));
        self
    }

    pub fn unresolvable(mut self, id: &str) -> Self {
        self.unresolvable.insert(id.to_string());
        self
    }

    pub fn then_ok(self, model: &str, text: &str) -> Self {
        self.push(model, Ok(text.to_string()))
    }

    pub fn then_err(self, model: &str, message: &str) -> Self {
        self.push(model, Err(ProviderError::new(message)))
    }

    pub fn always_err(mut self, model: &str, message: &str) -> Self {
        self.always
            .insert(model.to_string(), Err(ProviderError::new(message)));
        self
    }

    pub fn always_ok(mut self, model: &str, text: &str) -> Self {
        self.always.insert(model.to_string(), Ok(text.to_string()));
        self
    }

    /// Queues more replies after construction (the provider is shared by then).
    pub fn enqueue_err(&self, model: &str, message: &str) {
        self.queued
            .lock()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .push_back(Err(ProviderError::new(message)));
    }

    fn push(self, model: &str, reply: Reply) -> Self {
        self.queued
            .lock()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called_models(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.model).collect()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn list_models(&self) -> Result<Vec<ModelCandidate>, ProviderError> {
        match &self.list_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.models.clone()),
        }
    }

    fn resolve_model(&self, model: &str) -> Result<ModelHandle, ProviderError> {
        if self.unresolvable.contains(model) || self.unresolvable.contains(short_id(model)) {
            return Err(ProviderError::new(format!("cannot instantiate {model}")));
        }
        Ok(ModelHandle::new(model))
    }

    async fn generate(
        &self,
        model: &ModelHandle,
        prompt: &str,
        params: SamplingParams,
    ) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: model.id.clone(),
            prompt: prompt.to_string(),
            params,
        });

        let queued = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&model.id)
            .and_then(VecDeque::pop_front);
        match queued {
            Some(reply) => reply,
            None => self
                .always
                .get(&model.id)
                .cloned()
                .unwrap_or_else(|| Ok(format!("reply from {}", model.id))),
        }
    }
}

/// Client over `provider` preferring its first scripted model.
pub fn client_on(provider: ScriptedProvider) -> GenerativeClient {
    let preferred = provider.models.iter().map(|m| m.id.clone()).collect();
    GenerativeClient::new(
        Arc::new(provider),
        ClientSettings {
            preferred_models: preferred,
            well_known_models: Vec::new(),
            ..ClientSettings::default()
        },
    )
}
