//! Binary encoding of the license payload.
//!
//! Layout, little-endian, no padding, no magic or version prefix:
//!
//! ```text
//! u32  licensee length
//! ...  licensee (UTF-8)
//! u64  expiration (unix seconds)
//! u32  fingerprint length
//! ...  fingerprint (UTF-8)
//! ```
//!
//! Decoding never trusts a length prefix before bounds-checking it against
//! the remaining buffer.

use crate::error::LicenseError;
use crate::license::LicensePayload;

pub fn encode(payload: &LicensePayload) -> Vec<u8> {
    let licensee = payload.licensee.as_bytes();
    let fingerprint = payload.hardware_fingerprint.as_bytes();

    let mut buf = Vec::with_capacity(4 + licensee.len() + 8 + 4 + fingerprint.len());
    buf.extend_from_slice(&(licensee.len() as u32).to_le_bytes());
    buf.extend_from_slice(licensee);
    buf.extend_from_slice(&payload.expires_at.to_le_bytes());
    buf.extend_from_slice(&(fingerprint.len() as u32).to_le_bytes());
    buf.extend_from_slice(fingerprint);
    buf
}

pub fn decode(data: &[u8]) -> Result<LicensePayload, LicenseError> {
    let mut offset = 0usize;

    let licensee_len = read_u32(data, &mut offset, "licensee length")? as usize;
    let licensee = read_str(data, &mut offset, licensee_len, "licensee")?;
    let expires_at = read_u64(data, &mut offset, "expiration")?;
    let fingerprint_len = read_u32(data, &mut offset, "fingerprint length")? as usize;
    let hardware_fingerprint = read_str(data, &mut offset, fingerprint_len, "fingerprint")?;

    Ok(LicensePayload {
        licensee,
        expires_at,
        hardware_fingerprint,
    })
}

fn take<'a>(
    data: &'a [u8],
    offset: &mut usize,
    len: usize,
    field: &str,
) -> Result<&'a [u8], LicenseError> {
    let end = offset
        .checked_add(len)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| {
            LicenseError::InvalidFormat(format!("{} extends past end of buffer", field))
        })?;
    let slice = &data[*offset..end];
    *offset = end;
    Ok(slice)
}

fn read_u32(data: &[u8], offset: &mut usize, field: &str) -> Result<u32, LicenseError> {
    let bytes = take(data, offset, 4, field)?;
    Ok(u32::from_le_bytes(bytes.try_into().expect("4-byte slice")))
}

fn read_u64(data: &[u8], offset: &mut usize, field: &str) -> Result<u64, LicenseError> {
    let bytes = take(data, offset, 8, field)?;
    Ok(u64::from_le_bytes(bytes.try_into().expect("8-byte slice")))
}

fn read_str(
    data: &[u8],
    offset: &mut usize,
    len: usize,
    field: &str,
) -> Result<String, LicenseError> {
    let bytes = take(data, offset, len, field)?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| LicenseError::InvalidFormat(format!("{} is not valid UTF-8", field)))
}
