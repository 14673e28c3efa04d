use sha2::{Digest, Sha384, Sha512};
use sha3::{Sha3_384, Sha3_512};

/// Multi-layer digest chain used to derive hardware fingerprints.
///
/// Each stage hashes the lowercase hex string of the previous stage's
/// digest, not its raw bytes. The chain must be identical on the issuer
/// and the verifier; any mismatch makes issued licenses unverifiable.
///
/// SHA-512 -> SHA-384 -> SHA3-512 -> SHA3-384, 96 hex characters out.
pub fn multi_layer_hash(input: &str) -> String {
    let h1 = hex::encode(Sha512::digest(input.as_bytes()));
    let h2 = hex::encode(Sha384::digest(h1.as_bytes()));
    let h3 = hex::encode(Sha3_512::digest(h2.as_bytes()));
    hex::encode(Sha3_384::digest(h3.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_is_96_hex_chars() {
        let out = multi_layer_hash("abc");
        assert_eq!(out.len(), 96);
        assert!(out.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(multi_layer_hash("same input"), multi_layer_hash("same input"));
    }

    #[test]
    fn test_distinct_inputs_differ() {
        assert_ne!(multi_layer_hash("machine-a"), multi_layer_hash("machine-b"));
    }

    #[test]
    fn test_known_vectors() {
        // Pinned so an accidental change to the chain order or to the
        // hex-string intermediate encoding fails loudly.
        assert_eq!(
            multi_layer_hash("abc"),
            "0cce04ae30189982c24de4deca96f45a0f2c8e68792137826a0e2e123e1260b15c6c10a068ca045cc7777a18a7666d37"
        );
        assert_eq!(
            multi_layer_hash("unknown|unknown|unknown"),
            "0d95c0f90b810c5022bd92f052c01957c0a58aedf41f481f7b3086b03eb4a215127ad9cbedb889f7a7f0c6d2a5cb3ce1"
        );
    }
}
