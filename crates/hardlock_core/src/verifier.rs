use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::LicenseConfig;
use crate::crypto;
use crate::fingerprint;
use crate::keystore::KeyStore;
use crate::license::{LicensePayload, SignedLicense};

/// Signature length assumed when no public key is available to measure,
/// the modulus size of the 4096-bit keys the issuer generates.
pub const DEFAULT_SIGNATURE_LEN: usize = 512;

/// Result of a license verification. One terminal outcome per pass;
/// verification never retries and is re-run from scratch on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Valid(LicensePayload),
    FileMissing,
    FormatInvalid,
    SignatureInvalid,
    Expired,
    HardwareMismatch,
}

impl VerificationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationOutcome::Valid(_))
    }
}

/// Display-oriented view of the license file. Never fails; every parse
/// problem degrades to a display string.
#[derive(Debug, Clone, Serialize)]
pub struct LicenseInfo {
    pub licensee: String,
    /// `"valid"`, `"expired"` or `"invalid"`.
    pub status: String,
    pub expiration: String,
    pub hardware_fingerprint: String,
}

impl LicenseInfo {
    fn invalid(reason: &str) -> Self {
        Self {
            licensee: reason.to_string(),
            status: "invalid".to_string(),
            expiration: "unknown".to_string(),
            hardware_fingerprint: "unknown".to_string(),
        }
    }
}

/// Client-side license verification.
pub struct LicenseVerifier {
    config: LicenseConfig,
    keystore: KeyStore,
}

impl LicenseVerifier {
    pub fn new(config: LicenseConfig) -> Self {
        let keystore = KeyStore::new(config.clone());
        Self { config, keystore }
    }

    /// Verify the configured license file against the current clock and
    /// this machine's fingerprint.
    pub fn verify(&self) -> VerificationOutcome {
        self.verify_at(Utc::now())
    }

    /// Verify against an explicit clock. The fingerprint check still uses
    /// the local machine.
    pub fn verify_at(&self, now: DateTime<Utc>) -> VerificationOutcome {
        let data = match std::fs::read(&self.config.license_file) {
            Ok(data) => data,
            Err(e) => {
                log::warn!(
                    "Cannot read license file {}: {}",
                    self.config.license_file.display(),
                    e
                );
                return VerificationOutcome::FileMissing;
            }
        };
        self.verify_bytes_at(&data, now)
    }

    /// Verify raw license file content, short-circuiting on the first
    /// failed check.
    pub fn verify_bytes_at(&self, data: &[u8], now: DateTime<Utc>) -> VerificationOutcome {
        // An unverifiable license is operationally equivalent to a missing
        // key, so key resolution failures surface as SignatureInvalid.
        let public_key = match self.keystore.load_verification_key() {
            Ok(key) => key,
            Err(e) => {
                log::error!("Cannot load verification key: {}", e);
                return VerificationOutcome::SignatureInvalid;
            }
        };

        let signed = match SignedLicense::split(data, crypto::signature_len(&public_key)) {
            Ok(signed) => signed,
            Err(e) => {
                log::error!("License file too short: {}", e);
                return VerificationOutcome::FormatInvalid;
            }
        };

        let payload = match signed.decode_payload() {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("License payload invalid: {}", e);
                return VerificationOutcome::FormatInvalid;
            }
        };

        // Signature covers the exact content bytes read from the file
        if crypto::verify_bytes(&public_key, &signed.payload_bytes, &signed.signature).is_err() {
            log::error!("License signature verification failed");
            return VerificationOutcome::SignatureInvalid;
        }

        if payload.is_expired_at(now) {
            log::error!(
                "License expired at {}",
                payload
                    .expiration_date()
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_else(|| "unknown".to_string())
            );
            return VerificationOutcome::Expired;
        }

        let local_fingerprint = fingerprint::machine_fingerprint();
        if payload.hardware_fingerprint != local_fingerprint {
            log::error!("Hardware fingerprint mismatch");
            log::error!("  license: {}", payload.hardware_fingerprint);
            log::error!("  machine: {}", local_fingerprint);
            return VerificationOutcome::HardwareMismatch;
        }

        log::info!("License for {} verified", payload.licensee);
        VerificationOutcome::Valid(payload)
    }

    /// Non-failing info view for display surfaces. Parses the file and
    /// classifies expiry only; it is not an authorization check.
    pub fn license_info(&self) -> LicenseInfo {
        self.license_info_at(Utc::now())
    }

    pub fn license_info_at(&self, now: DateTime<Utc>) -> LicenseInfo {
        let data = match std::fs::read(&self.config.license_file) {
            Ok(data) => data,
            Err(_) => return LicenseInfo::invalid("License file not found"),
        };

        let signature_len = self
            .keystore
            .load_verification_key()
            .map(|key| crypto::signature_len(&key))
            .unwrap_or(DEFAULT_SIGNATURE_LEN);

        let payload = match SignedLicense::split(&data, signature_len)
            .and_then(|signed| signed.decode_payload())
        {
            Ok(payload) => payload,
            Err(_) => return LicenseInfo::invalid("Invalid license format"),
        };

        let status = if payload.is_expired_at(now) {
            "expired"
        } else {
            "valid"
        };

        let expiration = payload
            .expiration_date()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string());

        LicenseInfo {
            licensee: payload.licensee,
            status: status.to_string(),
            expiration,
            hardware_fingerprint: payload.hardware_fingerprint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::KeyStore;
    use crate::license::{issue_license_file, LicensePayload};
    use chrono::Duration;

    struct Fixture {
        _tmp: tempfile::TempDir,
        config: LicenseConfig,
    }

    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let config = LicenseConfig::in_dir(tmp.path());
        KeyStore::new(config.clone())
            .generate_key_pair(2048, false)
            .unwrap();
        Fixture { _tmp: tmp, config }
    }

    fn write_license(fixture: &Fixture, payload: &LicensePayload) {
        let store = KeyStore::new(fixture.config.clone());
        let private = store.load_private_key().unwrap();
        let file = issue_license_file(payload, &private).unwrap();
        std::fs::write(&fixture.config.license_file, file).unwrap();
    }

    fn local_payload(days: i64) -> LicensePayload {
        LicensePayload::new(
            "Alice".to_string(),
            fingerprint::machine_fingerprint(),
            days,
        )
    }

    #[test]
    fn test_end_to_end_valid_then_expired_by_clock() {
        let fixture = fixture();
        write_license(&fixture, &local_payload(30));

        let verifier = LicenseVerifier::new(fixture.config.clone());
        assert!(verifier.verify().is_valid());

        // The same unmodified file, 31 simulated days later
        let later = Utc::now() + Duration::days(31);
        assert_eq!(verifier.verify_at(later), VerificationOutcome::Expired);
    }

    #[test]
    fn test_expired_license_rejected() {
        let fixture = fixture();
        let mut payload = local_payload(30);
        payload.expires_at = (Utc::now().timestamp() - 1) as u64;
        write_license(&fixture, &payload);

        let verifier = LicenseVerifier::new(fixture.config);
        assert_eq!(verifier.verify(), VerificationOutcome::Expired);
    }

    #[test]
    fn test_hardware_mismatch_rejected() {
        let fixture = fixture();
        let payload = LicensePayload::new(
            "Alice".to_string(),
            crate::hash::multi_layer_hash("some|other|machine"),
            30,
        );
        write_license(&fixture, &payload);

        let verifier = LicenseVerifier::new(fixture.config);
        assert_eq!(verifier.verify(), VerificationOutcome::HardwareMismatch);
    }

    #[test]
    fn test_tampered_content_rejected() {
        let fixture = fixture();
        write_license(&fixture, &local_payload(30));

        let mut data = std::fs::read(&fixture.config.license_file).unwrap();
        data[4] ^= 0x01; // first licensee byte
        std::fs::write(&fixture.config.license_file, data).unwrap();

        let verifier = LicenseVerifier::new(fixture.config);
        assert_eq!(verifier.verify(), VerificationOutcome::SignatureInvalid);
    }

    #[test]
    fn test_missing_file() {
        let fixture = fixture();
        let verifier = LicenseVerifier::new(fixture.config);
        assert_eq!(verifier.verify(), VerificationOutcome::FileMissing);
    }

    #[test]
    fn test_truncated_file_is_format_invalid() {
        let fixture = fixture();
        std::fs::write(&fixture.config.license_file, [0u8; 64]).unwrap();

        let verifier = LicenseVerifier::new(fixture.config);
        assert_eq!(verifier.verify(), VerificationOutcome::FormatInvalid);
    }

    #[test]
    fn test_undecodable_content_is_format_invalid() {
        let fixture = fixture();
        // 2048-bit test keys: 256-byte signature; 300 bytes leaves a
        // 44-byte content whose length prefix overruns the buffer.
        let mut data = vec![0u8; 300];
        data[..4].copy_from_slice(&u32::MAX.to_le_bytes());
        std::fs::write(&fixture.config.license_file, data).unwrap();

        let verifier = LicenseVerifier::new(fixture.config);
        assert_eq!(verifier.verify(), VerificationOutcome::FormatInvalid);
    }

    #[test]
    fn test_missing_public_key_is_signature_invalid() {
        let fixture = fixture();
        write_license(&fixture, &local_payload(30));
        std::fs::remove_file(&fixture.config.public_key_file).unwrap();

        let verifier = LicenseVerifier::new(fixture.config);
        assert_eq!(verifier.verify(), VerificationOutcome::SignatureInvalid);
    }

    #[test]
    fn test_wrong_public_key_is_signature_invalid() {
        let fixture = fixture();
        write_license(&fixture, &local_payload(30));

        // Rotate the bundled key after issuance
        let (_, other_public) = crate::crypto::generate_keypair(2048).unwrap();
        let other_pem = crate::crypto::public_key_to_pem(&other_public).unwrap();
        std::fs::write(&fixture.config.public_key_file, other_pem).unwrap();

        let verifier = LicenseVerifier::new(fixture.config);
        assert_eq!(verifier.verify(), VerificationOutcome::SignatureInvalid);
    }

    #[test]
    fn test_custom_public_key_override_verifies() {
        let fixture = fixture();
        write_license(&fixture, &local_payload(30));

        // Swap the bundled key for a wrong one, but supply the real key
        // as the operator override: verification must still pass.
        let real_pem = std::fs::read_to_string(&fixture.config.public_key_file).unwrap();
        std::fs::write(&fixture.config.custom_public_key_file, real_pem).unwrap();
        let (_, other_public) = crate::crypto::generate_keypair(2048).unwrap();
        let other_pem = crate::crypto::public_key_to_pem(&other_public).unwrap();
        std::fs::write(&fixture.config.public_key_file, other_pem).unwrap();

        let verifier = LicenseVerifier::new(fixture.config);
        assert!(verifier.verify().is_valid());
    }

    #[test]
    fn test_license_info_valid_and_expired() {
        let fixture = fixture();
        write_license(&fixture, &local_payload(30));

        let verifier = LicenseVerifier::new(fixture.config.clone());
        let info = verifier.license_info();
        assert_eq!(info.licensee, "Alice");
        assert_eq!(info.status, "valid");
        assert_eq!(info.hardware_fingerprint, fingerprint::machine_fingerprint());
        assert_ne!(info.expiration, "unknown");

        let later = Utc::now() + Duration::days(31);
        assert_eq!(verifier.license_info_at(later).status, "expired");
    }

    #[test]
    fn test_license_info_never_fails() {
        let fixture = fixture();

        let verifier = LicenseVerifier::new(fixture.config.clone());
        assert_eq!(verifier.license_info().status, "invalid");

        std::fs::write(&fixture.config.license_file, b"garbage").unwrap();
        assert_eq!(verifier.license_info().status, "invalid");
    }
}
