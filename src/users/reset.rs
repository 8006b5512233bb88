use rand::RngCore;
use sha2::{Digest, Sha256};

/// Random bytes per reset token; 40 hex chars on the wire.
const TOKEN_BYTES: usize = 20;

/// Generate a fresh reset token. The plaintext goes into the emailed link,
/// only the digest is ever persisted.
pub fn generate_token() -> (String, String) {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let plain = hex::encode(bytes);
    let digest = hash_token(&plain);
    (plain, digest)
}

/// SHA-256 hex digest of a plaintext token, matching the stored form.
pub fn hash_token(plain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plain.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn reset_url(public_url: &str, plain_token: &str) -> String {
    format!("{}/api/v1/password/reset/{}", public_url, plain_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic_sha256_hex() {
        assert_eq!(
            hash_token("hello_world!"),
            "b7a98bdbdb3294473ff2c204e3658b051487b24f99bcaa0666dc340373141df0"
        );
        assert_eq!(hash_token("hello_world!"), hash_token("hello_world!"));
    }

    #[test]
    fn generated_tokens_are_hex_and_distinct_from_digest() {
        let (plain, digest) = generate_token();
        assert_eq!(plain.len(), TOKEN_BYTES * 2);
        assert!(plain.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(plain, digest);
        assert_eq!(hash_token(&plain), digest);
    }

    #[test]
    fn consecutive_tokens_differ() {
        let (a, _) = generate_token();
        let (b, _) = generate_token();
        assert_ne!(a, b);
    }

    #[test]
    fn reset_url_embeds_the_plaintext() {
        let url = reset_url("http://localhost:8080", "abc123");
        assert_eq!(url, "http://localhost:8080/api/v1/password/reset/abc123");
    }
}
