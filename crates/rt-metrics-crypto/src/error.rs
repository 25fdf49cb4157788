use thiserror::Error;

/// Crypto-boundary errors. Each variant carries a stable `code()` the same
/// way the teacher's `ioi_types::error::ErrorCode` trait does, so the server
/// can log a machine-matchable tag without leaking the underlying library
/// error text to a client.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("failed to read key material from {path}: {source}")]
    KeyIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse SSH authorized-key public key: {0}")]
    PublicKeyParse(String),
    #[error("failed to parse PKCS#8 PEM private key: {0}")]
    PrivateKeyParse(String),
    #[error("the loaded key is not an RSA key")]
    NotRsaKey,
    #[error("OAEP encryption failed on chunk {chunk}: {reason}")]
    EncryptChunk { chunk: usize, reason: String },
    #[error("OAEP decryption failed on chunk {chunk}: {reason}")]
    DecryptChunk { chunk: usize, reason: String },
    #[error("ciphertext length {len} is not a multiple of the RSA modulus size {modulus}")]
    MisalignedCiphertext { len: usize, modulus: usize },
    #[error("RSA modulus of {modulus} bytes is too small for OAEP with SHA-256 (needs at least {minimum} bytes)")]
    ModulusTooSmall { modulus: usize, minimum: usize },
}

impl CryptoError {
    pub fn code(&self) -> &'static str {
        match self {
            CryptoError::KeyIo { .. } => "CRYPTO_KEY_IO",
            CryptoError::PublicKeyParse(_) => "CRYPTO_PUBLIC_KEY_PARSE",
            CryptoError::PrivateKeyParse(_) => "CRYPTO_PRIVATE_KEY_PARSE",
            CryptoError::NotRsaKey => "CRYPTO_NOT_RSA_KEY",
            CryptoError::EncryptChunk { .. } => "CRYPTO_ENCRYPT_CHUNK_FAILED",
            CryptoError::DecryptChunk { .. } => "CRYPTO_DECRYPT_CHUNK_FAILED",
            CryptoError::MisalignedCiphertext { .. } => "CRYPTO_MISALIGNED_CIPHERTEXT",
            CryptoError::ModulusTooSmall { .. } => "CRYPTO_MODULUS_TOO_SMALL",
        }
    }
}
