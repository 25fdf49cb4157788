//! Key material loading: the public half as an SSH authorized-key line, the
//! private half as a PKCS#8 PEM file — exactly the formats
//! `original_source/internal/cryptokey/cryptokey.go` parses
//! (`ssh.ParseAuthorizedKey` / `x509.ParsePKCS8PrivateKey`).

use crate::error::CryptoError;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use ssh_key::public::KeyData;
use std::path::Path;

fn read_file(path: &Path) -> Result<String, CryptoError> {
    std::fs::read_to_string(path).map_err(|source| CryptoError::KeyIo {
        path: path.display().to_string(),
        source,
    })
}

/// Load an RSA public key from an SSH authorized-key line
/// (`ssh-rsa AAAA... comment`).
pub fn load_public_key(path: &Path) -> Result<RsaPublicKey, CryptoError> {
    let raw = read_file(path)?;
    let parsed = ssh_key::PublicKey::from_openssh(raw.trim())
        .map_err(|e| CryptoError::PublicKeyParse(e.to_string()))?;
    match parsed.key_data() {
        KeyData::Rsa(rsa_key) => {
            let n = BigUint::from_bytes_be(rsa_key.n.as_bytes());
            let e = BigUint::from_bytes_be(rsa_key.e.as_bytes());
            RsaPublicKey::new(n, e).map_err(|_| CryptoError::NotRsaKey)
        }
        _ => Err(CryptoError::NotRsaKey),
    }
}

/// Load an RSA private key from a PKCS#8 PEM file.
pub fn load_private_key(path: &Path) -> Result<RsaPrivateKey, CryptoError> {
    let raw = read_file(path)?;
    RsaPrivateKey::from_pkcs8_pem(&raw).map_err(|e| CryptoError::PrivateKeyParse(e.to_string()))
}

/// The public modulus size in bytes, `k`, that the server derives from the
/// loaded public half at startup (spec §4.2).
pub fn modulus_len(public_key: &RsaPublicKey) -> usize {
    public_key.n().bits().div_ceil(8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;
    use rsa::pkcs8::{EncodePrivateKey, LineEnding};
    use ssh_key::{private::RsaKeypair, PrivateKey};

    #[test]
    fn load_private_key_from_pkcs8_pem_round_trips_modulus() {
        let mut rng = OsRng;
        let priv_key = RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let pem = priv_key
            .to_pkcs8_pem(LineEnding::LF)
            .unwrap()
            .to_string();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("private.pem");
        std::fs::write(&path, pem).unwrap();

        let loaded = load_private_key(&path).unwrap();
        assert_eq!(loaded.n(), priv_key.n());
    }

    #[test]
    fn load_public_key_from_authorized_key_line() {
        let mut rng = OsRng;
        let keypair = RsaKeypair::random(&mut rng, 1024).unwrap();
        let ssh_private =
            PrivateKey::new(ssh_key::private::KeypairData::Rsa(keypair), "").unwrap();
        let ssh_public = ssh_private.public_key();
        let authorized_line = ssh_public.to_openssh().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("public.pub");
        std::fs::write(&path, authorized_line).unwrap();

        let loaded = load_public_key(&path).unwrap();
        assert_eq!(loaded.n().bits(), 1024);
    }
}
