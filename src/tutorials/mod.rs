//! The tutorial programs, each a function over a [`Workbench`]
//!
//! A workbench bundles what every tutorial needs: configuration, the console
//! it talks through and a provider for chat models and embedders. Real runs
//! use [`GenaiProvider`]; tests swap in scripted models and consoles.

pub mod adk;
pub mod basics;
pub mod chat;
pub mod drafter;
pub mod rag;
pub mod react;
pub mod reviews;
pub mod text;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::{AgentRuntimeConfig, Config};
use crate::console::Console;
use crate::llm::{ChatModel, GenaiModel};
use crate::rag::{Embedder, OllamaEmbedder};

/// Source of chat models and embedders
pub trait ModelProvider: Send + Sync {
    /// Chat model by identifier; `temperature` overrides the configured one
    fn chat_model(&self, model: &str, temperature: Option<f64>) -> Arc<dyn ChatModel>;

    fn embedder(&self) -> Arc<dyn Embedder>;
}

/// Hosted models through genai, embeddings from Ollama
pub struct GenaiProvider {
    config: Config,
}

impl GenaiProvider {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ModelProvider for GenaiProvider {
    fn chat_model(&self, model: &str, temperature: Option<f64>) -> Arc<dyn ChatModel> {
        let mut runtime = AgentRuntimeConfig::for_model(&self.config, model);
        if let Some(temperature) = temperature {
            runtime = runtime.with_temperature(temperature);
        }
        Arc::new(GenaiModel::new(runtime))
    }

    fn embedder(&self) -> Arc<dyn Embedder> {
        Arc::new(OllamaEmbedder::new(
            &self.config.models.ollama_url,
            &self.config.models.embedding,
        ))
    }
}

pub struct Workbench {
    pub config: Config,
    pub console: Arc<dyn Console>,
    pub models: Arc<dyn ModelProvider>,
}

impl Workbench {
    pub fn new(config: Config, console: Arc<dyn Console>, models: Arc<dyn ModelProvider>) -> Self {
        Self {
            config,
            console,
            models,
        }
    }

    pub fn chat_model(&self, model: &str) -> Arc<dyn ChatModel> {
        self.models.chat_model(model, None)
    }

    pub fn say(&self, text: &str) {
        self.console.say(text);
    }

    /// One line of input; `None` once input is exhausted
    pub async fn read_line(&self, prompt: &str) -> Result<Option<String>> {
        self.console
            .read_line(prompt)
            .await
            .context("Failed to read from console")
    }

    /// Next line that is not an exit word; `None` ends the loop
    pub async fn prompt_until(&self, prompt: &str, exit_words: &[&str]) -> Result<Option<String>> {
        Ok(self
            .read_line(prompt)
            .await?
            .filter(|line| !crate::console::is_exit(line, exit_words)))
    }
}
