//! Hostname validation per RFC 1123 label rules.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LABEL: Regex = Regex::new(r"^[A-Za-z0-9](-[A-Za-z0-9]+)*$").unwrap();
    static ref ALL_DIGITS: Regex = Regex::new(r"^[0-9]+$").unwrap();
}

/// Validates `s` as a hostname, per spec: total length (after stripping a
/// single trailing dot) at most 253, each label 1-63 characters matching
/// `[A-Za-z0-9](-[A-Za-z0-9]+)*`, and the "last" label (or the only label)
/// must not be all-digits.
pub fn is_valid_hostname(s: &str) -> bool {
    if s.len() > 253 {
        return false;
    }
    let trimmed = s.strip_suffix('.').unwrap_or(s);
    if trimmed.is_empty() {
        return false;
    }

    let labels: Vec<&str> = trimmed.split('.').collect();
    for label in &labels {
        if label.is_empty() || label.len() > 63 || !LABEL.is_match(label) {
            return false;
        }
    }

    let last = labels.last().unwrap();
    !ALL_DIGITS.is_match(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_hostname() {
        assert!(is_valid_hostname("foo-bar.com"));
    }

    #[test]
    fn rejects_leading_hyphen_label() {
        assert!(!is_valid_hostname("-foo.bar"));
    }

    #[test]
    fn rejects_all_digit_single_label() {
        assert!(!is_valid_hostname("12345"));
    }

    #[test]
    fn rejects_all_digit_last_label() {
        assert!(!is_valid_hostname("foo.123"));
    }

    #[test]
    fn accepts_trailing_dot() {
        assert!(is_valid_hostname("example.com."));
    }

    #[test]
    fn length_boundaries() {
        let label63 = "a".repeat(63);
        let ok = format!("{label63}.com");
        assert!(is_valid_hostname(&ok));

        let label64 = "a".repeat(64);
        let bad = format!("{label64}.com");
        assert!(!is_valid_hostname(&bad));
    }

    #[test]
    fn total_length_boundary() {
        // 253 total: 4 labels of 62 'a's joined by dots = 62*4 + 3 = 251, pad to 253
        let long = format!("{}.com", "a".repeat(248));
        assert_eq!(long.len(), 253);
        assert!(is_valid_hostname(&long));

        let too_long = format!("{}.com", "a".repeat(249));
        assert_eq!(too_long.len(), 254);
        assert!(!is_valid_hostname(&too_long));
    }
}
