//! # Shared Utility Functions
//!
//! Address formatting for display.
//!
//! ```rust
//! use shared::utils::truncate_address;
//!
//! let address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
//! assert_eq!(truncate_address(address), "0xf39F...2266");
//! ```

/// Keep the first `prefix_len` and last `suffix_len` characters, joined by `...`.
///
/// Addresses too short to shorten, or containing non-ASCII characters, are
/// returned unchanged.
///
/// ```rust
/// use shared::utils::format_address;
///
/// let addr = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
/// assert_eq!(format_address(addr, 6, 4), "0x7099...79C8");
/// assert_eq!(format_address("0x1234", 6, 4), "0x1234");
/// ```
pub fn format_address(address: &str, prefix_len: usize, suffix_len: usize) -> String {
    let len = address.len();
    if !address.is_ascii() || len <= prefix_len + suffix_len {
        return address.to_string();
    }

    format!("{}...{}", &address[..prefix_len], &address[len - suffix_len..])
}

/// `0x` plus four hex digits, then the last four.
pub fn truncate_address(address: &str) -> String {
    format_address(address, 6, 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn test_format_address() {
        assert_eq!(format_address(ADDR, 6, 4), "0xf39F...2266");
        assert_eq!(format_address(ADDR, 10, 8), "0xf39Fd6e5...fFb92266");
    }

    #[test]
    fn test_format_address_short() {
        assert_eq!(format_address("0xabc", 6, 4), "0xabc");
        assert_eq!(format_address("", 6, 4), "");
    }

    #[test]
    fn test_truncate_address() {
        assert_eq!(truncate_address(ADDR), "0xf39F...2266");
    }
}
