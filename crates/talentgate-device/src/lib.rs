//! Device fingerprinting.
//!
//! A fingerprint is a short, stable token derived from attributes a browser
//! reports about itself. It is a *risk signal*: a changed token marks a
//! sign-in from a device not seen before, which the gateway records in the
//! audit trail. It is never an authentication factor and never blocks a
//! sign-in.
//!
//! ```
//! use talentgate_device::{DeviceAttributes, is_new_device};
//!
//! let laptop = DeviceAttributes::new("Mozilla/5.0", "en-US", -60, 1920, 1080, 24);
//! let token = laptop.fingerprint();
//!
//! assert_eq!(token.as_str().len(), 16);
//! assert!(is_new_device(None, &token));
//! assert!(!is_new_device(Some(&token), &laptop.fingerprint()));
//! ```

use thiserror::Error;

mod fingerprint;

pub use fingerprint::{DeviceAttributes, DeviceFingerprint, FINGERPRINT_LEN, fingerprint, is_new_device};

/// Errors from parsing stored fingerprint tokens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FingerprintError {
    #[error("fingerprint must be {expected} characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("fingerprint must be lowercase hex: {0}")]
    InvalidCharacter(String),
}

pub type Result<T> = std::result::Result<T, FingerprintError>;
