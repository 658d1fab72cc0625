//! Request authentication
//!
//! Trade bodies carry a hex signature and a unix-seconds timestamp. Real
//! wallet signing is out of scope; [`MockSigner`] produces a signature of
//! the right shape so the backend's format check passes.

use types::request::RequestAuth;
use uuid::Uuid;

/// Hex digits in an r||s||v signature without the `0x` prefix
const SIGNATURE_HEX_LEN: usize = 130;

#[derive(Debug, Clone, Copy, Default)]
pub struct MockSigner;

impl MockSigner {
    pub fn new() -> Self {
        Self
    }

    /// Fresh auth block stamped with the current time
    pub fn sign(&self) -> RequestAuth {
        let seed = Uuid::now_v7().as_u128();
        let r = format!("{:032x}{:032x}", seed, seed.rotate_left(64));
        let s = format!("{:032x}{:032x}", seed.reverse_bits(), !seed);
        RequestAuth {
            signature: format!("0x{r}{s}1b"),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Accepts 130 or 132 hex digits after an optional `0x`
pub fn is_valid_signature(signature: &str) -> bool {
    let hex = signature
        .strip_prefix("0x")
        .or_else(|| signature.strip_prefix("0X"))
        .unwrap_or(signature);
    (hex.len() == SIGNATURE_HEX_LEN || hex.len() == SIGNATURE_HEX_LEN + 2)
        && hex.chars().all(|c| c.is_ascii_hexdigit())
}
