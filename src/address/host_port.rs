//! `host:port` / `[ipv6]:port` parsing for the `isHostAndPort` built-in.

/// A parsed host-and-port pair. `host` retains brackets stripped for the
/// IPv6 literal form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAndPort {
    pub host: String,
    pub port: Option<u16>,
}

fn parse_port(s: &str) -> Option<u16> {
    if s.is_empty() || s.len() > 5 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if s.len() > 1 && s.starts_with('0') {
        return None;
    }
    s.parse().ok()
}

/// Validates `s` as a host-and-port string. `port_required` controls
/// whether a bare host (no `:port` suffix) is accepted.
pub fn is_valid_host_and_port(s: &str, port_required: bool) -> bool {
    parse_host_and_port(s, port_required).is_some()
}

fn parse_host_and_port(s: &str, port_required: bool) -> Option<HostAndPort> {
    if s.is_empty() {
        return None;
    }

    if let Some(rest) = s.strip_prefix('[') {
        let close = rest.find(']')?;
        let host = &rest[..close];
        if host.is_empty() {
            return None;
        }
        let after = &rest[close + 1..];
        if after.is_empty() {
            if port_required {
                return None;
            }
            return Some(HostAndPort {
                host: host.to_string(),
                port: None,
            });
        }
        let port_str = after.strip_prefix(':')?;
        let port = parse_port(port_str)?;
        return Some(HostAndPort {
            host: host.to_string(),
            port: Some(port),
        });
    }

    match s.rfind(':') {
        Some(idx) => {
            let (host, port_str) = (&s[..idx], &s[idx + 1..]);
            if host.is_empty() {
                return None;
            }
            let port = parse_port(port_str)?;
            Some(HostAndPort {
                host: host.to_string(),
                port: Some(port),
            })
        }
        None => {
            if port_required {
                None
            } else {
                Some(HostAndPort {
                    host: s.to_string(),
                    port: None,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_host_and_port() {
        assert!(is_valid_host_and_port("example.com:8080", true));
    }

    #[test]
    fn accepts_bracketed_ipv6() {
        assert!(is_valid_host_and_port("[::1]:8080", true));
        assert!(is_valid_host_and_port("[::1]", false));
    }

    #[test]
    fn rejects_bare_host_when_required() {
        assert!(!is_valid_host_and_port("example.com", true));
        assert!(is_valid_host_and_port("example.com", false));
    }

    #[test]
    fn port_boundaries() {
        assert!(is_valid_host_and_port("h:0", true));
        assert!(is_valid_host_and_port("h:65535", true));
        assert!(!is_valid_host_and_port("h:65536", true));
        assert!(!is_valid_host_and_port("h:00", true));
    }
}
