use std::path::Path;

use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::config::LicenseConfig;
use crate::crypto;
use crate::error::LicenseError;

/// Key material access for both sides: the issuer's private key and the
/// client's verification key.
///
/// Owned by the caller and passed where needed; there is no process-global
/// key cache. Callers must serialize key generation against verification.
pub struct KeyStore {
    config: LicenseConfig,
}

impl KeyStore {
    pub fn new(config: LicenseConfig) -> Self {
        Self { config }
    }

    /// Generate an RSA keypair and write `private.pem` (PKCS8, unencrypted)
    /// and `public.pem` (SubjectPublicKeyInfo).
    ///
    /// Refuses to overwrite existing key files unless `overwrite` is set:
    /// regenerating keys invalidates every license issued with the old pair,
    /// so the caller must confirm explicitly.
    pub fn generate_key_pair(&self, bits: usize, overwrite: bool) -> Result<(), LicenseError> {
        if !overwrite {
            for path in [&self.config.private_key_file, &self.config.public_key_file] {
                if path.exists() {
                    return Err(LicenseError::KeyFileExists(path.display().to_string()));
                }
            }
        }

        let (private_key, public_key) = crypto::generate_keypair(bits)?;
        let private_pem = crypto::private_key_to_pem(&private_key)?;
        let public_pem = crypto::public_key_to_pem(&public_key)?;

        write_key_file(&self.config.private_key_file, &private_pem)?;
        write_key_file(&self.config.public_key_file, &public_pem)?;

        log::info!(
            "Generated {}-bit keypair: {} / {}",
            bits,
            self.config.private_key_file.display(),
            self.config.public_key_file.display()
        );
        Ok(())
    }

    /// Load the issuer's private key.
    pub fn load_private_key(&self) -> Result<RsaPrivateKey, LicenseError> {
        let pem = read_key_file(&self.config.private_key_file)?;
        crypto::private_key_from_pem(&pem).map_err(|e| {
            LicenseError::KeyLoad(format!(
                "{}: {}",
                self.config.private_key_file.display(),
                e
            ))
        })
    }

    /// Load the bundled public key.
    pub fn load_public_key(&self) -> Result<RsaPublicKey, LicenseError> {
        load_public_key_file(&self.config.public_key_file)
    }

    /// Load the key used for license verification.
    ///
    /// An operator-supplied `CustomPublicKey.pem` beside the executable
    /// takes precedence over the bundled key, allowing key rotation
    /// without rebuilding the client. A present-but-corrupt override is
    /// an error, not a silent fallback.
    pub fn load_verification_key(&self) -> Result<RsaPublicKey, LicenseError> {
        if self.config.custom_public_key_file.exists() {
            log::info!(
                "Using custom public key {}",
                self.config.custom_public_key_file.display()
            );
            return load_public_key_file(&self.config.custom_public_key_file);
        }
        self.load_public_key()
    }
}

fn read_key_file(path: &Path) -> Result<String, LicenseError> {
    std::fs::read_to_string(path)
        .map_err(|e| LicenseError::KeyLoad(format!("{}: {}", path.display(), e)))
}

fn load_public_key_file(path: &Path) -> Result<RsaPublicKey, LicenseError> {
    let pem = read_key_file(path)?;
    crypto::public_key_from_pem(&pem)
        .map_err(|e| LicenseError::KeyLoad(format!("{}: {}", path.display(), e)))
}

fn write_key_file(path: &Path, pem: &str) -> Result<(), LicenseError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, pem)?;
    Ok(())
}
