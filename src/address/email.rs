//! Email address validation: `local@domain` with WHATWG-style local-part
//! atoms and a hostname-valid domain.

use lazy_static::lazy_static;
use regex::Regex;

use super::hostname::is_valid_hostname;

lazy_static! {
    // The local-atom portion of the WHATWG HTML5 email input regex.
    static ref LOCAL_PART: Regex =
        Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+$").unwrap();
}

/// Validates `s` as `local@domain`, rejecting `<` anywhere, enforcing
/// local-part length `1..=64`, domain length `<=253`, and domain validity
/// as a hostname.
pub fn is_valid_email(s: &str) -> bool {
    if s.contains('<') {
        return false;
    }
    let Some(at) = s.rfind('@') else {
        return false;
    };
    let (local, domain) = (&s[..at], &s[at + 1..]);

    if local.is_empty() || local.len() > 64 {
        return false;
    }
    if domain.len() > 253 {
        return false;
    }
    if !LOCAL_PART.is_match(local) {
        return false;
    }
    is_valid_hostname(domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_simple_address() {
        assert!(is_valid_email("jane.doe@example.com"));
    }

    #[test]
    fn rejects_missing_at() {
        assert!(!is_valid_email("jane.doe.example.com"));
    }

    #[test]
    fn rejects_angle_bracket() {
        assert!(!is_valid_email("<jane@example.com>"));
    }

    #[test]
    fn rejects_overlong_local_part() {
        let local = "a".repeat(65);
        assert!(!is_valid_email(&format!("{local}@example.com")));
    }

    #[test]
    fn rejects_bad_domain() {
        assert!(!is_valid_email("jane@-example.com"));
    }

    #[test]
    fn accepts_local_part_symbols() {
        assert!(is_valid_email("jane+doe.smith!#$%&'*=^_`{|}~-@example.com"));
    }
}
