use chrono::{DateTime, Duration, Utc};
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::crypto;
use crate::error::LicenseError;

/// The data bound into a license: who it is for, until when, and on
/// which machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicensePayload {
    pub licensee: String,
    /// Expiration as unix seconds. The wire format carries exactly this
    /// value, so expirations are always whole seconds.
    pub expires_at: u64,
    pub hardware_fingerprint: String,
}

impl LicensePayload {
    /// Build a payload expiring `expiration_days` from now, truncated to
    /// whole seconds.
    pub fn new(licensee: String, hardware_fingerprint: String, expiration_days: i64) -> Self {
        let expires = Utc::now() + Duration::days(expiration_days);
        Self {
            licensee,
            expires_at: expires.timestamp().max(0) as u64,
            hardware_fingerprint,
        }
    }

    /// Expiration as a UTC datetime. `None` only for timestamps outside
    /// the representable range.
    pub fn expiration_date(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.expires_at)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match i64::try_from(self.expires_at) {
            Ok(expires) => now.timestamp() > expires,
            Err(_) => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Encode to the binary wire form.
    pub fn encode(&self) -> Vec<u8> {
        codec::encode(self)
    }

    /// Decode from the binary wire form.
    pub fn decode(data: &[u8]) -> Result<Self, LicenseError> {
        codec::decode(data)
    }
}

/// An encoded payload together with its signature.
///
/// The signature covers exactly `payload_bytes`; verification never
/// re-encodes the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedLicense {
    pub payload_bytes: Vec<u8>,
    pub signature: Vec<u8>,
}

impl SignedLicense {
    /// The on-disk `License.key` content: `payload_bytes || signature`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.payload_bytes.len() + self.signature.len());
        out.extend_from_slice(&self.payload_bytes);
        out.extend_from_slice(&self.signature);
        out
    }

    /// Split file content into payload bytes and a trailing signature of
    /// `signature_len` bytes.
    pub fn split(data: &[u8], signature_len: usize) -> Result<Self, LicenseError> {
        if data.len() < signature_len {
            return Err(LicenseError::InvalidFormat(
                "file shorter than signature".to_string(),
            ));
        }
        let (payload_bytes, signature) = data.split_at(data.len() - signature_len);
        Ok(Self {
            payload_bytes: payload_bytes.to_vec(),
            signature: signature.to_vec(),
        })
    }

    pub fn decode_payload(&self) -> Result<LicensePayload, LicenseError> {
        LicensePayload::decode(&self.payload_bytes)
    }
}

/// Issuer side: encode and sign a payload.
pub fn issue_license(
    payload: &LicensePayload,
    private_key: &RsaPrivateKey,
) -> Result<SignedLicense, LicenseError> {
    let payload_bytes = payload.encode();
    let signature = crypto::sign_bytes(private_key, &payload_bytes)?;
    log::info!(
        "Issued license for {} (expires {}, signature {} bytes)",
        payload.licensee,
        payload
            .expiration_date()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        signature.len()
    );
    Ok(SignedLicense {
        payload_bytes,
        signature,
    })
}

/// Issuer side: produce the full `License.key` file content.
pub fn issue_license_file(
    payload: &LicensePayload,
    private_key: &RsaPrivateKey,
) -> Result<Vec<u8>, LicenseError> {
    Ok(issue_license(payload, private_key)?.to_bytes())
}
