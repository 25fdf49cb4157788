//! Confidentiality and authenticity primitives for rt-metrics: HMAC-SHA256
//! record signing (`sign`) and RSA-OAEP chunked envelope encryption
//! (`envelope`).

pub mod envelope;
pub mod error;
pub mod keys;
pub mod sign;

pub use error::CryptoError;
pub use rsa::{RsaPrivateKey, RsaPublicKey};
