//! BSP Crypto - canonical serialization and RSA-PSS record signatures.
//!
//! A record is signed over its canonical JSON rendering: the `signature`
//! field removed, keys sorted lexicographically at every object level, no
//! insignificant whitespace. The signature is RSA-PSS with SHA-256 (MGF1
//! SHA-256, hash-length salt), transported as base64.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod canonical;
mod error;
mod keys;
mod sign;

pub use canonical::*;
pub use error::*;
pub use keys::*;
pub use sign::*;

// Re-export the key types callers hold.
pub use rsa::{RsaPrivateKey, RsaPublicKey};
