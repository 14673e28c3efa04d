//! Machine-locked license issuance and verification.
//!
//! An offline issuer binds a licensee name, an expiration date and a
//! hardware fingerprint into a signed binary blob (`License.key`); the
//! client verifies the blob's signature, expiration and hardware match
//! before the host application runs.
//!
//! # License file format
//!
//! `License.key` is `encode(payload) || signature`: a little-endian
//! length-prefixed payload (licensee, unix expiration, fingerprint)
//! followed by an RSA-PSS/SHA-512 signature whose length equals the RSA
//! modulus size. There is no text wrapping and no version prefix.

pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod fingerprint;
pub mod hash;
pub mod keystore;
pub mod license;
pub mod verifier;

pub use config::LicenseConfig;
pub use error::LicenseError;
pub use fingerprint::{collect_hardware_info, machine_fingerprint, HardwareInfo};
pub use keystore::KeyStore;
pub use license::{issue_license, issue_license_file, LicensePayload, SignedLicense};
pub use verifier::{LicenseInfo, LicenseVerifier, VerificationOutcome};
