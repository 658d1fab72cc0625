//! Risk Calc: order validation and liquidation-risk calculators
//!
//! Pure functions over the dashboard's current state:
//! - decimal precision truncation and counting
//! - leverage, size, margin and price-precision validators
//! - reduce-only / post-only flag checks
//! - the order-form aggregator that collects the first error per check
//! - liquidation-distance classification and one-shot alerts
//! - mark-price PnL views and account utilisation
//!
//! # Determinism
//! No system time, no I/O. Arithmetic is fixed-point `Decimal` and keyed
//! collections are `BTreeMap`, so identical inputs give identical outputs.

pub mod precision;
pub mod validation;
pub mod leverage;
pub mod size;
pub mod margin;
pub mod constraints;
pub mod order_form;
pub mod liquidation;
pub mod alerts;
pub mod portfolio;

pub use alerts::{RiskAlert, RiskAlertTracker};
pub use liquidation::RiskThresholds;
pub use order_form::{all_validation_errors, FormError, OrderFormState, ValidationContext};
pub use validation::ValidationResult;

/// Crate version constant
pub const RISK_CALC_VERSION: &str = "1.0.0";
