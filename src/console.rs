//! Line-oriented console the tutorials talk through

use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

#[async_trait]
pub trait Console: Send + Sync {
    /// Show `prompt` and read one line; `None` at end of input
    async fn read_line(&self, prompt: &str) -> std::io::Result<Option<String>>;

    fn say(&self, text: &str);
}

/// Whether `input` is one of the exit words, ignoring case and surrounding space
pub fn is_exit(input: &str, words: &[&str]) -> bool {
    let input = input.trim();
    words.iter().any(|w| w.eq_ignore_ascii_case(input))
}

/// Terminal console over tokio stdin and stdout
pub struct StdConsole {
    lines: tokio::sync::Mutex<Lines<BufReader<Stdin>>>,
}

impl StdConsole {
    pub fn new() -> Self {
        Self {
            lines: tokio::sync::Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Console for StdConsole {
    async fn read_line(&self, prompt: &str) -> std::io::Result<Option<String>> {
        {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(prompt.as_bytes())?;
            stdout.flush()?;
        }
        self.lines.lock().await.next_line().await
    }

    fn say(&self, text: &str) {
        println!("{}", text);
    }
}

/// Console fed from queued input lines that records everything shown.
///
/// Prompts are recorded too, so a transcript reads like the terminal would.
#[derive(Default)]
pub struct ScriptedConsole {
    inputs: Mutex<VecDeque<String>>,
    output: Mutex<Vec<String>>,
}

impl ScriptedConsole {
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: Mutex::new(inputs.into_iter().map(Into::into).collect()),
            output: Mutex::new(Vec::new()),
        }
    }

    pub fn output(&self) -> Vec<String> {
        self.output.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Everything shown, one entry per line
    pub fn transcript(&self) -> String {
        self.output().join("\n")
    }

    fn record(&self, text: &str) {
        self.output
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string());
    }
}

#[async_trait]
impl Console for ScriptedConsole {
    async fn read_line(&self, prompt: &str) -> std::io::Result<Option<String>> {
        self.record(prompt);
        Ok(self
            .inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front())
    }

    fn say(&self, text: &str) {
        self.record(text);
    }
}
