//! Transfer input validation.

use std::sync::LazyLock;

use regex::Regex;

static RECIPIENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("valid built-in recipient pattern")
});

/// `0x` followed by exactly 40 hex digits, any case. Checksums are not enforced.
pub fn is_valid_recipient(recipient: &str) -> bool {
    RECIPIENT_PATTERN.is_match(recipient)
}
