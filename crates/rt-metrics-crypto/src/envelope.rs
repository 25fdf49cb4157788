//! Chunked RSA-OAEP/SHA-256 envelope encryption, matching spec §4.2 and
//! `original_source/internal/cryptokey/cryptokey.go::EncryptMessage` /
//! `DecryptMessage` exactly: the plaintext is sliced into
//! `k - 2*hashLen - 2` byte chunks (the OAEP capacity for a `k`-byte
//! modulus), each chunk OAEP-encrypted independently, and the ciphertexts
//! concatenated in order. Decryption reverses this by splitting the
//! ciphertext into fixed `k`-byte chunks.

use crate::error::CryptoError;
use rand::rngs::OsRng;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

const HASH_LEN: usize = 32; // SHA-256 output size, used as OAEP hLen.

/// Returns the maximum plaintext size per OAEP chunk for a `k`-byte RSA
/// modulus: `k - 2*hashLen - 2`. An operator-supplied key smaller than that
/// floor is a configuration error, not a panic — mirrors
/// `rsa.EncryptOAEP`/`rsa.DecryptOAEP` in the Go original, which return an
/// ordinary `error` rather than aborting the process.
pub fn chunk_plaintext_len(modulus_len: usize) -> Result<usize, CryptoError> {
    modulus_len
        .checked_sub(2 * HASH_LEN + 2)
        .ok_or(CryptoError::ModulusTooSmall {
            modulus: modulus_len,
            minimum: 2 * HASH_LEN + 2,
        })
}

/// Encrypt `plaintext` for `public_key`, chunking as described above. Any
/// chunk failure aborts the whole message (no partial ciphertext is
/// returned).
pub fn encrypt(plaintext: &[u8], public_key: &RsaPublicKey) -> Result<Vec<u8>, CryptoError> {
    let modulus_len = public_key.size();
    let step = chunk_plaintext_len(modulus_len)?;
    let mut out = Vec::with_capacity(
        (plaintext.len().max(1)).div_ceil(step.max(1)) * modulus_len,
    );

    let mut rng = OsRng;
    for (i, chunk) in plaintext.chunks(step.max(1)).enumerate() {
        let encrypted = public_key
            .encrypt(&mut rng, Oaep::new::<Sha256>(), chunk)
            .map_err(|e| CryptoError::EncryptChunk {
                chunk: i,
                reason: e.to_string(),
            })?;
        out.extend_from_slice(&encrypted);
    }
    // An empty message still produces one chunk, matching the Go loop's
    // `for start := 0; start < msgLen; ...` which degenerates to zero
    // iterations for an empty slice — mirrored here by special-casing.
    if plaintext.is_empty() {
        out.clear();
    }
    Ok(out)
}

/// Decrypt a ciphertext produced by [`encrypt`]. The ciphertext is divided
/// into fixed `private_key.size()`-byte chunks; any chunk that fails OAEP
/// decryption aborts the whole message.
pub fn decrypt(ciphertext: &[u8], private_key: &RsaPrivateKey) -> Result<Vec<u8>, CryptoError> {
    let modulus_len = private_key.size();
    if !ciphertext.is_empty() && ciphertext.len() % modulus_len != 0 {
        return Err(CryptoError::MisalignedCiphertext {
            len: ciphertext.len(),
            modulus: modulus_len,
        });
    }

    let mut out = Vec::with_capacity(ciphertext.len());
    for (i, chunk) in ciphertext.chunks(modulus_len).enumerate() {
        let decrypted = private_key
            .decrypt(Oaep::new::<Sha256>(), chunk)
            .map_err(|e| CryptoError::DecryptChunk {
                chunk: i,
                reason: e.to_string(),
            })?;
        out.extend_from_slice(&decrypted);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1024-bit test key: enough margin for multi-chunk round trips while
    // keeping test runtime reasonable.
    fn test_keypair() -> (RsaPrivateKey, RsaPublicKey) {
        let mut rng = OsRng;
        let priv_key =
            RsaPrivateKey::new(&mut rng, 1024).expect("failed to generate test RSA key");
        let pub_key = RsaPublicKey::from(&priv_key);
        (priv_key, pub_key)
    }

    #[test]
    fn round_trip_short_message() {
        let (priv_key, pub_key) = test_keypair();
        let plaintext = b"Alloc:gauge:3.140000";
        let ciphertext = encrypt(plaintext, &pub_key).unwrap();
        let decrypted = decrypt(&ciphertext, &priv_key).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn round_trip_empty_message() {
        let (priv_key, pub_key) = test_keypair();
        let ciphertext = encrypt(b"", &pub_key).unwrap();
        assert!(ciphertext.is_empty());
        let decrypted = decrypt(&ciphertext, &priv_key).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn round_trip_multi_chunk_message() {
        let (priv_key, pub_key) = test_keypair();
        // 1024-bit modulus -> 128 byte modulus -> chunk size 128-66=62 bytes.
        // 300 bytes forces 5 chunks.
        let plaintext: Vec<u8> = (0u8..=255).cycle().take(300).collect();
        let ciphertext = encrypt(&plaintext, &pub_key).unwrap();
        assert_eq!(ciphertext.len() % pub_key.size(), 0);
        let decrypted = decrypt(&ciphertext, &priv_key).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn decrypt_rejects_misaligned_ciphertext() {
        let (priv_key, _pub_key) = test_keypair();
        let bogus = vec![0u8; 17];
        assert!(decrypt(&bogus, &priv_key).is_err());
    }

    #[test]
    fn chunk_plaintext_len_matches_formula() {
        assert_eq!(chunk_plaintext_len(128).unwrap(), 128 - 66);
        assert_eq!(chunk_plaintext_len(256).unwrap(), 256 - 66);
    }

    #[test]
    fn chunk_plaintext_len_rejects_modulus_too_small_for_oaep() {
        assert!(chunk_plaintext_len(65).is_err());
    }

    #[test]
    fn encrypt_returns_error_instead_of_panicking_on_tiny_modulus() {
        // A key this small never decodes to a valid RSA public key in
        // practice, but `encrypt` must not panic regardless of what
        // `load_public_key` lets through.
        let mut rng = OsRng;
        let priv_key = RsaPrivateKey::new(&mut rng, 512).expect("failed to generate test RSA key");
        let pub_key = RsaPublicKey::from(&priv_key);
        // 512 bits -> 64 byte modulus, below the 66-byte OAEP/SHA-256 floor.
        assert!(encrypt(b"hello", &pub_key).is_err());
    }
}
