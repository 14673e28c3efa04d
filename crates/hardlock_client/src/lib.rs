//! Entry points for external collaborators (GUI, tray manager, issuer
//! dialogs). Everything here is a thin wrapper over `hardlock_core` that
//! never panics: failures are logged and reported as `false` or as
//! display strings, leaving user-visible behavior to the caller.

use hardlock_core::{
    fingerprint, issue_license_file, KeyStore, LicensePayload, LicenseVerifier,
};

pub use hardlock_core::{LicenseConfig, LicenseInfo, VerificationOutcome};

/// License operations bound to one configuration.
///
/// The default configuration resolves all files beside the executable;
/// embedders with their own layout construct one with [`LicenseClient::with_config`].
pub struct LicenseClient {
    config: LicenseConfig,
}

impl Default for LicenseClient {
    fn default() -> Self {
        Self::with_config(LicenseConfig::resolved())
    }
}

impl LicenseClient {
    pub fn with_config(config: LicenseConfig) -> Self {
        Self { config }
    }

    /// Full verification outcome for callers that distinguish failure modes.
    pub fn verify(&self) -> VerificationOutcome {
        LicenseVerifier::new(self.config.clone()).verify()
    }

    /// Verify the license file; `true` only when signature, expiration and
    /// hardware fingerprint all check out.
    pub fn verify_license(&self) -> bool {
        let outcome = self.verify();
        if !outcome.is_valid() {
            log::warn!("License verification failed: {:?}", outcome);
        }
        outcome.is_valid()
    }

    /// Display view of the license file. Never fails.
    pub fn get_license_info(&self) -> LicenseInfo {
        LicenseVerifier::new(self.config.clone()).license_info()
    }

    /// Generate the RSA keypair used for signing (issuer side).
    ///
    /// `overwrite` is the caller's explicit confirmation to replace
    /// existing key files.
    pub fn generate_key_pair(&self, overwrite: bool) -> bool {
        let store = KeyStore::new(self.config.clone());
        match store.generate_key_pair(4096, overwrite) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Key generation failed: {}", e);
                false
            }
        }
    }

    /// Issue a license for the given fingerprint and write it to the
    /// configured license file (issuer side).
    pub fn generate_license(
        &self,
        licensee: &str,
        hardware_fingerprint: &str,
        expiration_days: i64,
    ) -> bool {
        let store = KeyStore::new(self.config.clone());
        let private_key = match store.load_private_key() {
            Ok(key) => key,
            Err(e) => {
                log::error!("Cannot load private key: {}", e);
                return false;
            }
        };

        let payload = LicensePayload::new(
            licensee.to_string(),
            hardware_fingerprint.to_string(),
            expiration_days,
        );
        let file = match issue_license_file(&payload, &private_key) {
            Ok(file) => file,
            Err(e) => {
                log::error!("License issuance failed: {}", e);
                return false;
            }
        };

        if let Err(e) = std::fs::write(&self.config.license_file, file) {
            log::error!(
                "Cannot write {}: {}",
                self.config.license_file.display(),
                e
            );
            return false;
        }
        true
    }

    /// The fingerprint of this machine, for out-of-band communication to
    /// the issuer.
    pub fn machine_fingerprint(&self) -> String {
        fingerprint::machine_fingerprint()
    }
}

/// Verify the license file beside the executable.
pub fn verify_license() -> bool {
    LicenseClient::default().verify_license()
}

/// Display view of the license file beside the executable.
pub fn get_license_info() -> LicenseInfo {
    LicenseClient::default().get_license_info()
}

/// Generate the signing keypair beside the executable (issuer side).
pub fn generate_key_pair() -> bool {
    LicenseClient::default().generate_key_pair(false)
}

/// Issue a license beside the executable (issuer side).
pub fn generate_license(licensee: &str, hardware_fingerprint: &str, expiration_days: i64) -> bool {
    LicenseClient::default().generate_license(licensee, hardware_fingerprint, expiration_days)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_in_tempdir() -> (tempfile::TempDir, LicenseClient) {
        let tmp = tempfile::tempdir().unwrap();
        let client = LicenseClient::with_config(LicenseConfig::in_dir(tmp.path()));
        (tmp, client)
    }

    #[test]
    fn test_end_to_end_issue_and_verify() {
        let (_tmp, client) = client_in_tempdir();

        assert!(client.generate_key_pair(false));
        let fingerprint = client.machine_fingerprint();
        assert!(client.generate_license("Alice", &fingerprint, 30));
        assert!(client.verify_license());

        let info = client.get_license_info();
        assert_eq!(info.licensee, "Alice");
        assert_eq!(info.status, "valid");
        assert_eq!(info.hardware_fingerprint, fingerprint);
    }

    #[test]
    fn test_keygen_refuses_overwrite_by_default() {
        let (_tmp, client) = client_in_tempdir();
        assert!(client.generate_key_pair(false));
        assert!(!client.generate_key_pair(false));
        assert!(client.generate_key_pair(true));
    }

    #[test]
    fn test_verify_without_any_files_is_false() {
        let (_tmp, client) = client_in_tempdir();
        assert!(!client.verify_license());
        assert_eq!(client.verify(), VerificationOutcome::FileMissing);
        assert_eq!(client.get_license_info().status, "invalid");
    }

    #[test]
    fn test_license_for_other_machine_is_false() {
        let (_tmp, client) = client_in_tempdir();
        assert!(client.generate_key_pair(false));
        assert!(client.generate_license("Alice", "not-this-machine", 30));

        assert!(!client.verify_license());
        assert_eq!(client.verify(), VerificationOutcome::HardwareMismatch);
    }

    #[test]
    fn test_generate_license_without_keys_is_false() {
        let (_tmp, client) = client_in_tempdir();
        assert!(!client.generate_license("Alice", "fp", 30));
    }
}
