/*!
 * IP Range Matching
 * Dotted-quad ranges with inclusive 32-bit comparison
 */

use std::net::Ipv4Addr;

/// A parsed inclusive IPv4 range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpRange {
    begin: u32,
    end: u32,
}

impl IpRange {
    /// Parse `"a.b.c.d"` (single address) or `"a.b.c.d-e.f.g.h"`.
    /// Returns `None` for malformed entries; callers skip those.
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        let (begin, end) = match entry.split_once('-') {
            Some((begin, end)) => (parse_addr(begin)?, parse_addr(end)?),
            None => {
                let addr = parse_addr(entry)?;
                (addr, addr)
            }
        };
        Some(Self { begin, end })
    }

    pub fn contains(&self, ip: u32) -> bool {
        self.begin <= ip && ip <= self.end
    }
}

/// Pack dotted-quad octets into a single comparable integer
pub fn pack(octets: [u8; 4]) -> u32 {
    (u32::from(octets[0]) << 24)
        + (u32::from(octets[1]) << 16)
        + (u32::from(octets[2]) << 8)
        + u32::from(octets[3])
}

fn parse_addr(addr: &str) -> Option<u32> {
    let mut octets = [0u8; 4];
    let mut count = 0;
    for part in addr.trim().split('.') {
        if count == 4 {
            return None;
        }
        octets[count] = part.parse().ok()?;
        count += 1;
    }
    // Not exactly four octet groups: skip the entry
    if count != 4 {
        return None;
    }
    Some(pack(octets))
}

/// True when the address falls inside any well-formed range entry.
/// Malformed entries are skipped individually; an empty list never
/// matches.
pub fn ip_matches(ip: Ipv4Addr, ranges: &[String]) -> bool {
    let packed = pack(ip.octets());
    ranges
        .iter()
        .filter_map(|entry| IpRange::parse(entry))
        .any(|range| range.contains(packed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_boundary_inclusive() {
        let range = IpRange::parse("10.0.0.1-10.0.0.10").unwrap();
        assert!(range.contains(pack([10, 0, 0, 1])));
        assert!(range.contains(pack([10, 0, 0, 10])));
        assert!(!range.contains(pack([10, 0, 0, 0])));
        assert!(!range.contains(pack([10, 0, 0, 11])));
    }

    #[test]
    fn test_single_address_range() {
        let range = IpRange::parse("192.168.1.7").unwrap();
        assert!(range.contains(pack([192, 168, 1, 7])));
        assert!(!range.contains(pack([192, 168, 1, 8])));
    }

    #[test]
    fn test_malformed_entries_skipped() {
        assert!(IpRange::parse("10.0.0").is_none());
        assert!(IpRange::parse("10.0.0.0.1").is_none());
        assert!(IpRange::parse("10.0.0.x").is_none());
        assert!(IpRange::parse("10.0.0.256").is_none());
        assert!(IpRange::parse("").is_none());

        // One bad entry must not poison the rest of the list
        let ranges = vec!["10.0.0".to_string(), "10.0.0.5".to_string()];
        assert!(ip_matches(Ipv4Addr::new(10, 0, 0, 5), &ranges));
    }

    #[test]
    fn test_no_ranges_never_match() {
        assert!(!ip_matches(Ipv4Addr::new(10, 0, 0, 5), &[]));
    }

    proptest! {
        #[test]
        fn prop_pack_orders_like_octets(a: [u8; 4], b: [u8; 4]) {
            prop_assert_eq!(a.cmp(&b), pack(a).cmp(&pack(b)));
        }

        #[test]
        fn prop_parse_roundtrip(octets: [u8; 4]) {
            let entry = format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3]);
            let range = IpRange::parse(&entry).unwrap();
            prop_assert!(range.contains(pack(octets)));
        }

        #[test]
        fn prop_range_bounds(lo: [u8; 4], hi: [u8; 4]) {
            let (lo, hi) = if pack(lo) <= pack(hi) { (lo, hi) } else { (hi, lo) };
            let entry = format!(
                "{}.{}.{}.{}-{}.{}.{}.{}",
                lo[0], lo[1], lo[2], lo[3], hi[0], hi[1], hi[2], hi[3]
            );
            let range = IpRange::parse(&entry).unwrap();
            prop_assert!(range.contains(pack(lo)));
            prop_assert!(range.contains(pack(hi)));
        }
    }
}
