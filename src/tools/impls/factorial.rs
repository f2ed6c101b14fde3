//! Factorial tool

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::tools::{integer_prop, object_schema, parse_params, Result, Tool, ToolError};

pub struct FactorialTool;

#[derive(Debug, Deserialize)]
struct FactorialParams {
    a: i64,
}

/// n! for 0 <= n <= 20; anything larger overflows u64
pub fn factorial(n: i64) -> Result<u64> {
    if n < 0 {
        return Err(ToolError::Failed(format!(
            "factorial is undefined for negative numbers (got {})",
            n
        )));
    }
    (1..=n as u64)
        .try_fold(1u64, |acc, i| acc.checked_mul(i))
        .ok_or_else(|| ToolError::Failed(format!("{}! is too large to compute", n)))
}

#[async_trait]
impl Tool for FactorialTool {
    fn name(&self) -> &str {
        "factorial"
    }

    fn description(&self) -> &str {
        "Given a number, return its factorial."
    }

    fn schema(&self) -> Value {
        object_schema()
            .property("a", integer_prop("Non-negative integer"), true)
            .build()
    }

    async fn call(&self, args: Value) -> Result<String> {
        let params: FactorialParams = parse_params(args)?;
        Ok(factorial(params.a)?.to_string())
    }
}
