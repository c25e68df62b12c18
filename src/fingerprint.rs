//! Content fingerprinting for delta detection.
//!
//! An article's fingerprint is a SHA-256 hex digest over its normalized
//! title and body. Normalization collapses every run of whitespace to a
//! single space and trims the ends, so formatting noise from the source
//! (re-wrapped lines, trailing blanks, indentation shifts) never
//! produces a spurious "updated" classification. Two articles with the
//! same fingerprint are treated as content-identical regardless of
//! their source-reported timestamps.

use sha2::{Digest, Sha256};

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Deterministic digest over normalized title + body.
pub fn fingerprint(title: &str, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(title).as_bytes());
    hasher.update(b"\n");
    hasher.update(normalize(body).as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(
            normalize("  Reset\tyour\n\npassword  "),
            "Reset your password"
        );
    }

    #[test]
    fn test_whitespace_only_edit_same_fingerprint() {
        let a = fingerprint("Title", "First line.\nSecond line.");
        let b = fingerprint("Title", "  First   line.\n\n\tSecond line.  ");
        assert_eq!(a, b);
    }

    #[test]
    fn test_content_change_different_fingerprint() {
        let a = fingerprint("Title", "Old body text.");
        let b = fingerprint("Title", "New body text.");
        assert_ne!(a, b);
    }

    #[test]
    fn test_title_contributes() {
        let a = fingerprint("Old title", "Same body.");
        let b = fingerprint("New title", "Same body.");
        assert_ne!(a, b);
    }

    #[test]
    fn test_deterministic() {
        let a = fingerprint("Title", "Body.");
        let b = fingerprint("Title", "Body.");
        assert_eq!(a, b);
    }
}
