use crate::error::{InspectorError, InspectorResult};

/// True iff `s` is `0x` followed by exactly 40 hex digits (either case).
pub fn is_valid_address(s: &str) -> bool {
    s.len() == 42
        && s.starts_with("0x")
        && s.as_bytes()[2..].iter().all(|b| b.is_ascii_hexdigit())
}

/// Lowercases `s`. Does not validate.
pub fn normalize_address(s: &str) -> String {
    s.to_ascii_lowercase()
}

/// Validate then normalize; used wherever an address is about to be templated into SQL.
pub fn checked_address(s: &str) -> InspectorResult<String> {
    let trimmed = s.trim();
    if !is_valid_address(trimmed) {
        return Err(InspectorError::Validation(
            "Invalid Ethereum address format".to_string(),
        ));
    }
    Ok(normalize_address(trimmed))
}

/// `0x1234...abcd` style shortening for display.
pub fn truncate_address(address: &str, start: usize, end: usize) -> String {
    if address.len() < start + end || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..start], &address[address.len() - end..])
}
