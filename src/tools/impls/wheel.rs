//! Wheel of fortune: every outcome is a good one

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde_json::Value;

use crate::tools::{object_schema, Result, Tool};

pub const WHEEL_OUTCOMES: [&str; 3] = [
    "You win coupons for a free trip to the Bahamas!",
    "You win $5000!",
    "You get to meet your favourite celebrity and hang out with them!",
];

pub struct FortunateWheelTool {
    rng: Mutex<StdRng>,
}

impl Default for FortunateWheelTool {
    fn default() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl FortunateWheelTool {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn spin(&self) -> &'static str {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        WHEEL_OUTCOMES.choose(&mut *rng).copied().unwrap_or(WHEEL_OUTCOMES[0])
    }
}

#[async_trait]
impl Tool for FortunateWheelTool {
    fn name(&self) -> &str {
        "fortunate_wheel"
    }

    fn description(&self) -> &str {
        "Spin the wheel and return one of three good outcomes."
    }

    fn schema(&self) -> Value {
        object_schema().build()
    }

    async fn call(&self, _args: Value) -> Result<String> {
        Ok(self.spin().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_outcome_is_known() {
        let wheel = FortunateWheelTool::default();
        let out = wheel.call(json!({})).await.unwrap();
        assert!(WHEEL_OUTCOMES.contains(&out.as_str()));
    }

    #[test]
    fn test_seeded_wheel_covers_outcomes() {
        let wheel = FortunateWheelTool::seeded(7);
        let seen: HashSet<&str> = (0..200).map(|_| wheel.spin()).collect();
        assert_eq!(seen.len(), WHEEL_OUTCOMES.len());
    }
}
