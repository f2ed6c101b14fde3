//! Two-operand arithmetic tools for the ReAct agent

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::tools::{number_prop, object_schema, parse_params, Result, Tool, ToolError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Exponentiate,
}

impl ArithmeticOp {
    pub const ALL: [ArithmeticOp; 4] = [
        ArithmeticOp::Add,
        ArithmeticOp::Subtract,
        ArithmeticOp::Multiply,
        ArithmeticOp::Exponentiate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Subtract => "subtract",
            ArithmeticOp::Multiply => "multiply",
            ArithmeticOp::Exponentiate => "exponentiate",
        }
    }

    fn description(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "Adds 2 numbers together.",
            ArithmeticOp::Subtract => "Subtracts b from a.",
            ArithmeticOp::Multiply => "Multiplies 2 numbers together.",
            ArithmeticOp::Exponentiate => "Raises a to the power b.",
        }
    }

    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            ArithmeticOp::Add => a + b,
            ArithmeticOp::Subtract => a - b,
            ArithmeticOp::Multiply => a * b,
            ArithmeticOp::Exponentiate => a.powf(b),
        }
    }
}

/// Render without a trailing `.0` for integral values
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[derive(Debug, Deserialize)]
struct OperandParams {
    a: f64,
    b: f64,
}

pub struct ArithmeticTool {
    op: ArithmeticOp,
}

impl ArithmeticTool {
    pub fn new(op: ArithmeticOp) -> Self {
        Self { op }
    }
}

/// add, subtract, multiply and exponentiate
pub fn arithmetic_tools() -> Vec<ArithmeticTool> {
    ArithmeticOp::ALL.into_iter().map(ArithmeticTool::new).collect()
}

#[async_trait]
impl Tool for ArithmeticTool {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn description(&self) -> &str {
        self.op.description()
    }

    fn schema(&self) -> Value {
        object_schema()
            .property("a", number_prop("First operand"), true)
            .property("b", number_prop("Second operand"), true)
            .build()
    }

    async fn call(&self, args: Value) -> Result<String> {
        let params: OperandParams = parse_params(args)?;
        let result = self.op.apply(params.a, params.b);
        if !result.is_finite() {
            return Err(ToolError::Failed(format!(
                "{} of {} and {} is not a finite number",
                self.op.name(),
                params.a,
                params.b
            )));
        }
        Ok(format_number(result))
    }
}
