//! Document drafting tools sharing one in-memory buffer

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::tools::{object_schema, parse_params, string_prop, Result, Tool};

/// The document being drafted, shared by `update`, `save` and the agent prompt
#[derive(Debug, Clone, Default)]
pub struct DocumentBuffer {
    content: Arc<Mutex<String>>,
}

impl DocumentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> String {
        self.content
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, content: impl Into<String>) {
        *self.content.lock().unwrap_or_else(PoisonError::into_inner) = content.into();
    }
}

pub struct UpdateTool {
    buffer: DocumentBuffer,
}

impl UpdateTool {
    pub fn new(buffer: DocumentBuffer) -> Self {
        Self { buffer }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateParams {
    content: String,
}

#[async_trait]
impl Tool for UpdateTool {
    fn name(&self) -> &str {
        "update"
    }

    fn description(&self) -> &str {
        "Updates the document by replacing it with the user-given content."
    }

    fn schema(&self) -> Value {
        object_schema()
            .property("content", string_prop("The complete updated document"), true)
            .build()
    }

    async fn call(&self, args: Value) -> Result<String> {
        let params: UpdateParams = parse_params(args)?;
        self.buffer.set(params.content.clone());
        Ok(format!(
            "Document has been updated. The current content is: \n{}",
            params.content
        ))
    }
}

pub struct SaveTool {
    buffer: DocumentBuffer,
    output_dir: PathBuf,
}

impl SaveTool {
    pub fn new(buffer: DocumentBuffer, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            buffer,
            output_dir: output_dir.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SaveParams {
    filename: String,
}

#[async_trait]
impl Tool for SaveTool {
    fn name(&self) -> &str {
        "save"
    }

    fn description(&self) -> &str {
        "Saves the current document to a text file and then ends the task."
    }

    fn schema(&self) -> Value {
        object_schema()
            .property(
                "filename",
                string_prop("Name of the text file where the content will be saved"),
                true,
            )
            .build()
    }

    async fn call(&self, args: Value) -> Result<String> {
        let params: SaveParams = parse_params(args)?;
        let mut filename = params.filename;
        if !filename.ends_with(".txt") {
            filename.push_str(".txt");
        }

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(&filename);
        tokio::fs::write(&path, self.buffer.get()).await?;
        info!("Saved document to {}", path.display());

        Ok(format!(
            "Document has been saved to the file: {}. Task is now complete.",
            filename
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_update_replaces_buffer() {
        let buffer = DocumentBuffer::new();
        buffer.set("old");
        let out = UpdateTool::new(buffer.clone())
            .call(json!({"content": "Dear team,"}))
            .await
            .unwrap();
        assert_eq!(out, "Document has been updated. The current content is: \nDear team,");
        assert_eq!(buffer.get(), "Dear team,");
    }

    #[tokio::test]
    async fn test_save_appends_extension() {
        let dir = tempfile::tempdir().unwrap();
        let buffer = DocumentBuffer::new();
        buffer.set("hello world");
        let save = SaveTool::new(buffer, dir.path());

        let out = save.call(json!({"filename": "notes"})).await.unwrap();
        assert_eq!(
            out,
            "Document has been saved to the file: notes.txt. Task is now complete."
        );
        let written = std::fs::read_to_string(dir.path().join("notes.txt")).unwrap();
        assert_eq!(written, "hello world");

        save.call(json!({"filename": "kept.txt"})).await.unwrap();
        assert!(dir.path().join("kept.txt").exists());
    }
}
