//! Current local time tool

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tools::{object_schema, Result, Tool};

pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Get the current time and return it in the form of a dictionary."
    }

    fn schema(&self) -> Value {
        object_schema().build()
    }

    async fn call(&self, _args: Value) -> Result<String> {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        Ok(json!({ "current time": now }).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_time_shape() {
        let out = CurrentTimeTool.call(json!({})).await.unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        let stamp = value["current time"].as_str().unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").is_ok());
    }
}
