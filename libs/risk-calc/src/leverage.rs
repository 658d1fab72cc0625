//! Leverage validation against the per-asset cap

use serde::{Deserialize, Serialize};
use types::asset::DEFAULT_MAX_LEVERAGE;

/// Result of a leverage check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageValidation {
    pub is_valid: bool,
    pub error: Option<String>,
    pub max_leverage: u32,
    pub current_leverage: u32,
}

/// Validate requested leverage; `max_leverage: None` falls back to 50x.
///
/// Rejects iff `leverage == 0` or `leverage > max`.
pub fn validate_leverage(leverage: u32, max_leverage: Option<u32>) -> LeverageValidation {
    let max = max_leverage.unwrap_or(DEFAULT_MAX_LEVERAGE);

    let error = if leverage == 0 {
        Some("Leverage must be greater than 0".to_string())
    } else if leverage > max {
        Some(format!("Leverage exceeds maximum allowed ({max}x)"))
    } else {
        None
    };

    LeverageValidation {
        is_valid: error.is_none(),
        error,
        max_leverage: max,
        current_leverage: leverage,
    }
}
