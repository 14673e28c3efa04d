use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{Pss, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha512};

use crate::error::LicenseError;

/// Generate an RSA keypair with the given bit size (2048 or 4096).
pub fn generate_keypair(bits: usize) -> Result<(RsaPrivateKey, RsaPublicKey), LicenseError> {
    let mut rng = rand::thread_rng();
    let private_key = RsaPrivateKey::new(&mut rng, bits)?;
    let public_key = RsaPublicKey::from(&private_key);
    Ok((private_key, public_key))
}

/// Export a private key as unencrypted PKCS8 PEM.
pub fn private_key_to_pem(key: &RsaPrivateKey) -> Result<String, LicenseError> {
    key.to_pkcs8_pem(LineEnding::LF)
        .map(|s| s.to_string())
        .map_err(|e| LicenseError::Pem(e.to_string()))
}

/// Export a public key as SubjectPublicKeyInfo PEM.
pub fn public_key_to_pem(key: &RsaPublicKey) -> Result<String, LicenseError> {
    key.to_public_key_pem(LineEnding::LF)
        .map_err(|e| LicenseError::Pem(e.to_string()))
}

/// Import a private key from PEM string.
pub fn private_key_from_pem(pem: &str) -> Result<RsaPrivateKey, LicenseError> {
    RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| LicenseError::Pem(e.to_string()))
}

/// Import a public key from PEM string.
pub fn public_key_from_pem(pem: &str) -> Result<RsaPublicKey, LicenseError> {
    RsaPublicKey::from_public_key_pem(pem).map_err(|e| LicenseError::Pem(e.to_string()))
}

/// Signature length in bytes for a key: the RSA modulus size.
///
/// The license file has no signature length prefix; the verifier relies on
/// this fixed size to split content from signature (512 for 4096-bit keys).
pub fn signature_len(public_key: &RsaPublicKey) -> usize {
    public_key.size()
}

// PSS with maximum-length salt: emLen - hLen - 2, matching the issuer and
// verifier exactly. Both sides derive it from the key in use.
fn max_salt_len(modulus_bytes: usize) -> usize {
    modulus_bytes.saturating_sub(Sha512::output_size() + 2)
}

/// Sign raw bytes with RSA-PSS, SHA-512 digest and MGF1-SHA-512.
pub fn sign_bytes(private_key: &RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>, LicenseError> {
    let digest = Sha512::digest(data);
    let padding = Pss::new_with_salt::<Sha512>(max_salt_len(private_key.size()));
    let signature = private_key.sign_with_rng(&mut rand::thread_rng(), padding, &digest)?;
    Ok(signature)
}

/// Verify an RSA-PSS signature over raw bytes with the same parameters
/// used at signing.
pub fn verify_bytes(
    public_key: &RsaPublicKey,
    data: &[u8],
    signature: &[u8],
) -> Result<(), LicenseError> {
    let digest = Sha512::digest(data);
    let padding = Pss::new_with_salt::<Sha512>(max_salt_len(public_key.size()));
    public_key
        .verify(padding, &digest, signature)
        .map_err(|_| LicenseError::InvalidSignature)
}
