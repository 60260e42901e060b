//! Classification of the user-supplied lookup key.
//!
//! The lookup argument is a single free-form string that may be a private IP
//! address, an EC2 instance identifier, or a `Name` tag value. Classification
//! decides which query dimension the inventory lookup uses and never fails:
//! anything that is neither an IP literal nor an instance identifier is
//! treated as a name.

use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;

/// Instance identifiers are `i-` followed by 8 to 17 hex digits. The pattern
/// is anchored at the end of the key only, matching the suffix the way the
/// EC2 console renders truncated identifiers.
static INSTANCE_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[expect(clippy::expect_used, reason = "literal pattern, compilation covered by tests")]
    let pattern = Regex::new("i-[0-9a-fA-F]{8,17}$").expect("instance id pattern should compile");
    pattern
});

/// Query dimension derived from the raw lookup key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeyKind {
    /// The key parses as an IP literal; match on the private IP address.
    PrivateIp,
    /// The key looks like an EC2 instance identifier; match on instance ID.
    InstanceId,
    /// Fallthrough; match on the `Name` tag value.
    Name,
}

/// Classifies `raw` into the query dimension used for the inventory lookup.
///
/// Pure and total: unmatched input always falls through to [`KeyKind::Name`].
#[must_use]
pub fn classify(raw: &str) -> KeyKind {
    if raw.parse::<IpAddr>().is_ok() {
        KeyKind::PrivateIp
    } else if INSTANCE_ID_PATTERN.is_match(raw) {
        KeyKind::InstanceId
    } else {
        KeyKind::Name
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{KeyKind, classify};

    #[rstest]
    #[case("10.0.0.5", KeyKind::PrivateIp)]
    #[case("172.31.255.1", KeyKind::PrivateIp)]
    #[case("fd00::1", KeyKind::PrivateIp)]
    #[case("i-0017c8b3", KeyKind::InstanceId)]
    #[case("i-0a1b2c3d4e5f67890", KeyKind::InstanceId)]
    #[case("i-0017c8b", KeyKind::Name)] // 7 hex digits, below the minimum
    #[case("i-0017c8b3f00dd00d11", KeyKind::Name)] // 18 hex digits, above the maximum
    #[case("i-00g7c8b3", KeyKind::Name)] // non-hex digit
    #[case("api-server", KeyKind::Name)]
    #[case("10.0.0.", KeyKind::Name)]
    #[case("", KeyKind::Name)]
    fn classifies_lookup_keys(#[case] raw: &str, #[case] expected: KeyKind) {
        assert_eq!(classify(raw), expected, "key {raw:?}");
    }

    #[test]
    fn instance_id_pattern_is_end_anchored_only() {
        // The identifier may appear as a suffix of a longer key.
        assert_eq!(classify("prod i-0017c8b3"), KeyKind::InstanceId);
        // But not in the middle.
        assert_eq!(classify("i-0017c8b3 prod"), KeyKind::Name);
    }
}
