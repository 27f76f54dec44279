use sha2::{Digest, Sha256};

/// Short stable fingerprint of an email address for log lines. Addresses are
/// never logged in clear.
pub fn email_fingerprint(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    hex::encode(&digest[..6])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_and_case_insensitive() {
        let a = email_fingerprint("Jane@Example.com");
        assert_eq!(a.len(), 12);
        assert_eq!(a, email_fingerprint(" jane@example.com "));
        assert_ne!(a, email_fingerprint("john@example.com"));
        assert!(!a.contains('@'));
    }
}
