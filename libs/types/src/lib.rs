//! Types library for the perpetuals trading dashboard
//!
//! Wire and domain types shared by the risk calculators and the account
//! sync service. Field names follow the backend's JSON so snapshots
//! deserialize without adapters.
//!
//! # Modules
//! - `ids`: Identifiers (Coin, Address, OrderId, ClientOrderId)
//! - `numeric`: Decimal parsing and money formatting
//! - `order`: Order enums and open/historical order rows
//! - `request`: Trading request bodies and their structural validation
//! - `trade`: Executed fill records
//! - `account`: Account state and history snapshots
//! - `position`: Position tracking types
//! - `asset`: Per-instrument constraints and exchange metadata
//! - `book`: Order book snapshots
//! - `risk`: Risk classification types
//! - `errors`: Error taxonomy

// Public modules
pub mod ids;
pub mod numeric;
pub mod order;
pub mod request;
pub mod trade;
pub mod account;
pub mod position;
pub mod asset;
pub mod book;
pub mod risk;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::request::*;
    pub use crate::trade::*;
    pub use crate::account::*;
    pub use crate::position::*;
    pub use crate::asset::*;
    pub use crate::book::*;
    pub use crate::risk::*;
    pub use crate::errors::*;
}
