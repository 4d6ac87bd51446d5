//! IPv6 address and prefix parsing.
//!
//! Ported in spirit (not byte-for-byte) from
//! `buf/validate/internal/lib/ipv6.cc`: splits on at most one `::`
//! elision, accepts a dotted IPv4 tail in the final two hextets, and
//! accepts a zone id after `%` for the address form only.

/// A parsed IPv6 address, stored as 128 bits plus an optional zone id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv6Address {
    pub bits: u128,
    pub zone_id: Option<String>,
}

/// A parsed IPv6 CIDR prefix. Prefixes never carry a zone id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv6Prefix {
    pub bits: u128,
    pub prefix_len: u8,
}

const HEXTETS: usize = 8;

fn parse_hextet(group: &str) -> Option<u16> {
    if group.is_empty() || group.len() > 4 {
        return None;
    }
    if !group.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(group, 16).ok()
}

/// Parses the address portion (no zone id), returning the 128-bit value.
fn parse_address_part(s: &str) -> Option<u128> {
    if s.is_empty() {
        return None;
    }

    let elision_count = s.matches("::").count();
    if elision_count > 1 {
        return None;
    }

    let (left_str, right_str, has_elision) = if elision_count == 1 {
        let idx = s.find("::").unwrap();
        (&s[..idx], &s[idx + 2..], true)
    } else {
        (s, "", false)
    };

    // Without elision there must be no bare "::" and the whole string is the
    // left side; with elision, both sides may be empty (e.g. "::" or "::1").
    if !has_elision && s.contains("::") {
        return None;
    }

    let left_groups: Vec<&str> = if left_str.is_empty() {
        Vec::new()
    } else {
        left_str.split(':').collect()
    };
    let right_groups: Vec<&str> = if right_str.is_empty() {
        Vec::new()
    } else {
        right_str.split(':').collect()
    };

    if !has_elision && (left_groups.is_empty() || left_groups.iter().any(|g| g.is_empty())) {
        return None;
    }
    if has_elision && (left_groups.iter().any(|g| g.is_empty()) || right_groups.iter().any(|g| g.is_empty()))
    {
        return None;
    }

    // The dotted (IPv4-mapped) tail, if present, must be the very last group
    // of whichever side is logically last.
    let last_side_groups = if has_elision && !right_groups.is_empty() {
        &right_groups
    } else if !has_elision {
        &left_groups
    } else {
        &left_groups
    };

    let mut dotted_bits: Option<u32> = None;
    let mut consume_from_last = 0usize;
    if let Some(last) = last_side_groups.last() {
        if last.contains('.') {
            let parsed = crate::address::ipv4::parse_ipv4_address(last)?;
            dotted_bits = Some(parsed.0);
            consume_from_last = 1;
        }
    }

    let parse_groups = |groups: &[&str], skip_last_dotted: bool| -> Option<Vec<u16>> {
        let n = groups.len();
        let bound = if skip_last_dotted && n > 0 { n - 1 } else { n };
        groups[..bound].iter().map(|g| parse_hextet(g)).collect()
    };

    let dotted_is_on_right = has_elision && !right_groups.is_empty();
    let dotted_is_on_left_no_elision = !has_elision;

    let left_hextets = parse_groups(
        &left_groups,
        consume_from_last == 1 && dotted_is_on_left_no_elision,
    )?;
    let right_hextets = parse_groups(
        &right_groups,
        consume_from_last == 1 && dotted_is_on_right,
    )?;

    let dotted_hextet_count = if dotted_bits.is_some() { 2 } else { 0 };
    let total = left_hextets.len() + right_hextets.len() + dotted_hextet_count;

    if has_elision {
        if total >= HEXTETS {
            return None;
        }
    } else if total != HEXTETS {
        return None;
    }

    let mut value: u128 = 0;
    for h in &left_hextets {
        value = (value << 16) | *h as u128;
    }
    if has_elision {
        let zero_hextets = HEXTETS - total;
        value <<= 16 * zero_hextets as u32;
    }
    for h in &right_hextets {
        value = (value << 16) | *h as u128;
    }
    if let Some(bits) = dotted_bits {
        value = (value << 32) | bits as u128;
    }

    Some(value)
}

/// Parses a full IPv6 address, optionally followed by `%zone-id`.
pub fn parse_ipv6_address(s: &str) -> Option<Ipv6Address> {
    if s.contains('\0') {
        return None;
    }
    if let Some(pct) = s.find('%') {
        let (addr_part, zone_part) = (&s[..pct], &s[pct + 1..]);
        if zone_part.is_empty() {
            return None;
        }
        let bits = parse_address_part(addr_part)?;
        Some(Ipv6Address {
            bits,
            zone_id: Some(zone_part.to_string()),
        })
    } else {
        let bits = parse_address_part(s)?;
        Some(Ipv6Address {
            bits,
            zone_id: None,
        })
    }
}

/// Parses an IPv6 prefix (`addr/len`), never accepting a zone id.
pub fn parse_ipv6_prefix(s: &str, strict: bool) -> Option<Ipv6Prefix> {
    if s.contains('\0') || s.contains('%') {
        return None;
    }
    let slash = s.rfind('/')?;
    let (addr_part, len_part) = (&s[..slash], &s[slash + 1..]);
    let bits = parse_address_part(addr_part)?;

    if len_part.is_empty() || len_part.len() > 3 || !len_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if len_part.len() > 1 && len_part.starts_with('0') {
        return None;
    }
    let prefix_len: u16 = len_part.parse().ok()?;
    if prefix_len > 128 {
        return None;
    }
    let prefix_len = prefix_len as u8;

    if strict && prefix_len < 128 {
        let host_mask: u128 = (1u128 << (128 - prefix_len)) - 1;
        if bits & host_mask != 0 {
            return None;
        }
    }

    Some(Ipv6Prefix { bits, prefix_len })
}

impl std::fmt::Display for Ipv6Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in 0..HEXTETS {
            let shift = 16 * (HEXTETS - 1 - i);
            let hextet = (self.bits >> shift) as u16;
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{hextet:x}")?;
        }
        if let Some(zone) = &self.zone_id {
            write!(f, "%{zone}")?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Ipv6Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in 0..HEXTETS {
            let shift = 16 * (HEXTETS - 1 - i);
            let hextet = (self.bits >> shift) as u16;
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{hextet:x}")?;
        }
        write!(f, "/{}", self.prefix_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn full_address() {
        let a = parse_ipv6_address("2001:db8:0:0:0:0:0:1").unwrap();
        assert_eq!(a.bits, 0x2001_0db8_0000_0000_0000_0000_0000_0001);
    }

    #[test]
    fn elided_address() {
        let a = parse_ipv6_address("2001:db8::1").unwrap();
        assert_eq!(a.bits, 0x2001_0db8_0000_0000_0000_0000_0000_0001);
    }

    #[test]
    fn all_zero() {
        let a = parse_ipv6_address("::").unwrap();
        assert_eq!(a.bits, 0);
    }

    #[test]
    fn rejects_double_elision() {
        assert!(parse_ipv6_address("2001::db8::1").is_none());
    }

    #[test]
    fn rejects_trailing_single_colon() {
        assert!(parse_ipv6_address("2001:db8:0:0:0:0:0:").is_none());
    }

    #[test]
    fn rejects_eight_hextets_with_elision() {
        assert!(parse_ipv6_address("1:2:3:4:5:6:7:8::").is_none());
        assert!(parse_ipv6_address("::1:2:3:4:5:6:7:8").is_none());
    }

    #[test]
    fn accepts_zone_id() {
        let a = parse_ipv6_address("fe80::1%eth0").unwrap();
        assert_eq!(a.zone_id.as_deref(), Some("eth0"));
    }

    #[test]
    fn ipv4_mapped_tail() {
        let a = parse_ipv6_address("::ffff:192.168.1.1").unwrap();
        assert_eq!(a.bits & 0xffff_ffff, 0xC0A80101);
    }

    #[test]
    fn prefix_rejects_zone_id() {
        assert!(parse_ipv6_prefix("fe80::1%eth0/64", false).is_none());
    }

    #[test]
    fn prefix_boundaries() {
        assert!(parse_ipv6_prefix("::/0", false).is_some());
        assert!(parse_ipv6_prefix("::/128", false).is_some());
        assert!(parse_ipv6_prefix("::/129", false).is_none());
    }

    #[test]
    fn strict_prefix_requires_zero_host_bits() {
        assert!(parse_ipv6_prefix("2001:db8::1/64", true).is_none());
        assert!(parse_ipv6_prefix("2001:db8::/64", true).is_some());
    }

    proptest! {
        #[test]
        fn round_trip_any_128_bits(bits: u128) {
            let addr = Ipv6Address { bits, zone_id: None };
            let formatted = addr.to_string();
            prop_assert_eq!(parse_ipv6_address(&formatted), Some(addr));
        }

        #[test]
        fn round_trip_any_prefix(bits: u128, prefix_len in 0u8..=128) {
            let prefix = Ipv6Prefix { bits, prefix_len };
            let formatted = prefix.to_string();
            prop_assert_eq!(parse_ipv6_prefix(&formatted, false), Some(prefix));
        }
    }
}
