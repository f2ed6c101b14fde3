//! Offline workbench for tutorial tests

use std::sync::{Arc, Mutex};

use super::{ModelProvider, Workbench};
use crate::config::Config;
use crate::console::ScriptedConsole;
use crate::llm::{ChatModel, ScriptedModel};
use crate::rag::{Embedder, HashEmbedder};

/// Hands out the same scripted model for every request and records what was asked for
pub struct StaticProvider {
    pub model: Arc<ScriptedModel>,
    pub requested: Mutex<Vec<(String, Option<f64>)>>,
}

impl ModelProvider for StaticProvider {
    fn chat_model(&self, model: &str, temperature: Option<f64>) -> Arc<dyn ChatModel> {
        self.requested.lock().unwrap().push((model.to_string(), temperature));
        self.model.clone()
    }

    fn embedder(&self) -> Arc<dyn Embedder> {
        Arc::new(HashEmbedder::new(64))
    }
}

pub struct Harness {
    pub bench: Workbench,
    pub console: Arc<ScriptedConsole>,
    pub provider: Arc<StaticProvider>,
}

impl Harness {
    pub fn model(&self) -> &ScriptedModel {
        &self.provider.model
    }

    pub fn transcript(&self) -> String {
        self.console.transcript()
    }
}

pub fn harness<I, S>(config: Config, inputs: I, model: ScriptedModel) -> Harness
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let console = Arc::new(ScriptedConsole::new(inputs));
    let provider = Arc::new(StaticProvider {
        model: Arc::new(model),
        requested: Mutex::new(Vec::new()),
    });
    Harness {
        bench: Workbench::new(config, console.clone(), provider.clone()),
        console,
        provider,
    }
}
