//! Factory-token derivation and device credential generation.
//!
//! The device computes `factory_token` from its id plus the shared
//! manufacturing secret, hashes it, and embeds **only the hash** (`fth`) in
//! the QR setup URL. The server re-derives both values from its own copy of
//! the secret and compares constant-time, so the raw token is never
//! transmitted or stored.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::defaults::{API_TOKEN_BYTES, FACTORY_TOKEN_HEX_LEN};

fn sha256_hex_truncated(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    let digest = hex::encode(hasher.finalize());
    digest[..FACTORY_TOKEN_HEX_LEN].to_string()
}

/// Derive the secret `factory_token` for a device.
///
/// Deterministic: the device-side provisioning tool and the server run the
/// same computation. The result stays inside the process that derived it.
pub fn derive_factory_token(device_id: &str, secret: &str) -> String {
    sha256_hex_truncated(format!("{}:{}", device_id, secret).as_bytes())
}

/// Derive the public commitment (`fth`) for a factory token.
pub fn derive_factory_token_hash(factory_token: &str) -> String {
    sha256_hex_truncated(factory_token.as_bytes())
}

/// Verify the `fth` query parameter from a QR setup URL.
///
/// Re-derives the expected hash and compares constant-time to resist timing
/// side-channels. Length mismatch fails without leaking where.
pub fn verify_factory_token_hash(device_id: &str, secret: &str, fth: &str) -> bool {
    let expected = derive_factory_token_hash(&derive_factory_token(device_id, secret));
    expected.as_bytes().ct_eq(fth.as_bytes()).into()
}

/// Generate a device api_token: 32 bytes of CSPRNG output, URL-safe base64.
pub fn generate_api_token() -> String {
    let mut bytes = [0u8; API_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Build the QR provisioning payload: a setup URL carrying the device id and
/// the token hash. The raw factory token must never appear here (it would
/// land in browser history, referrers, and server logs).
pub fn setup_url(base_url: &str, device_id: &str, secret: &str) -> String {
    let fth = derive_factory_token_hash(&derive_factory_token(device_id, secret));
    format!(
        "{}?device_id={}&fth={}",
        base_url.trim_end_matches('/'),
        device_id,
        fth
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn test_derivation_is_deterministic() {
        let a = derive_factory_token("BX-00000001-0001", SECRET);
        let b = derive_factory_token("BX-00000001-0001", SECRET);
        assert_eq!(a, b);
        assert_eq!(
            derive_factory_token_hash(&a),
            derive_factory_token_hash(&b)
        );
    }

    #[test]
    fn test_distinct_devices_get_distinct_tokens() {
        let a = derive_factory_token("BX-00000001-0001", SECRET);
        let b = derive_factory_token("BX-00000001-0002", SECRET);
        assert_ne!(a, b);
    }

    #[test]
    fn test_token_lengths() {
        let token = derive_factory_token("BX-00000001-0001", SECRET);
        assert_eq!(token.len(), 16);
        assert_eq!(derive_factory_token_hash(&token).len(), 16);
    }

    #[test]
    fn test_hash_differs_from_token() {
        let token = derive_factory_token("BX-00000001-0001", SECRET);
        assert_ne!(token, derive_factory_token_hash(&token));
    }

    #[test]
    fn test_verify_accepts_correct_hash() {
        let token = derive_factory_token("BX-00000001-0001", SECRET);
        let fth = derive_factory_token_hash(&token);
        assert!(verify_factory_token_hash("BX-00000001-0001", SECRET, &fth));
    }

    #[test]
    fn test_verify_rejects_wrong_hash() {
        assert!(!verify_factory_token_hash(
            "BX-00000001-0001",
            SECRET,
            "0000000000000000"
        ));
    }

    #[test]
    fn test_verify_rejects_wrong_length() {
        assert!(!verify_factory_token_hash("BX-00000001-0001", SECRET, "abc"));
        assert!(!verify_factory_token_hash("BX-00000001-0001", SECRET, ""));
    }

    #[test]
    fn test_setup_url_never_contains_raw_token() {
        let token = derive_factory_token("BX-00000001-0001", SECRET);
        let url = setup_url("https://api.example/setup", "BX-00000001-0001", SECRET);
        assert!(!url.contains(&token));
        assert!(url.contains("device_id=BX-00000001-0001"));
        assert!(url.contains(&format!("fth={}", derive_factory_token_hash(&token))));
    }

    #[test]
    fn test_setup_url_trims_trailing_slash() {
        let url = setup_url("https://api.example/setup/", "BX-1", SECRET);
        assert!(url.starts_with("https://api.example/setup?device_id=BX-1&fth="));
    }

    #[test]
    fn test_api_tokens_are_unique_and_url_safe() {
        let a = generate_api_token();
        let b = generate_api_token();
        assert_ne!(a, b);
        // 32 bytes → 43 chars of unpadded base64
        assert_eq!(a.len(), 43);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
