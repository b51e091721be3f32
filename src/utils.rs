//! Utility functions for gateway operations.
//!
//! This module provides helpers for timestamps, amount rendering and the
//! encodings used when fields travel inside URLs.

use crate::errors::{CsobError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{Local, NaiveDateTime};

/// `strftime` pattern of the `dttm` field.
pub const DTTM_FORMAT: &str = "%Y%m%d%H%M%S";

/// Returns the current local time as a 14-digit `YYYYMMDDHHMMSS` string.
///
/// # Examples
///
/// ```
/// use csob_rs::utils::timestamp;
///
/// let dttm = timestamp();
/// assert_eq!(dttm.len(), 14);
/// assert!(dttm.chars().all(|c| c.is_ascii_digit()));
/// ```
pub fn timestamp() -> String {
    Local::now().format(DTTM_FORMAT).to_string()
}

/// Checks that `dttm` is a well-formed 14-digit timestamp naming a real date.
pub fn validate_dttm(dttm: &str) -> Result<()> {
    if dttm.len() != 14 || !dttm.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CsobError::ValidationError(format!(
            "dttm must be 14 digits, got '{}'",
            dttm
        )));
    }
    NaiveDateTime::parse_from_str(dttm, DTTM_FORMAT)
        .map(|_| ())
        .map_err(|e| CsobError::ValidationError(format!("invalid dttm '{}': {}", dttm, e)))
}

/// Renders an amount in minor units with exactly two decimals.
///
/// # Examples
///
/// ```
/// use csob_rs::utils::format_price;
///
/// assert_eq!(format_price(200000), "2000.00");
/// assert_eq!(format_price(5), "0.05");
/// ```
pub fn format_price(minor_units: u64) -> String {
    format!("{}.{:02}", minor_units / 100, minor_units % 100)
}

/// Percent-encodes a value so it can be used as a single URL path segment.
///
/// Base64 signatures contain `+`, `/` and `=`, all of which are escaped.
pub fn encode_path_segment(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Encodes opaque merchant data the way the gateway expects it (Base64).
pub fn encode_merchant_data(data: &[u8]) -> String {
    BASE64.encode(data)
}

/// Decodes merchant data echoed back by the gateway.
pub fn decode_merchant_data(encoded: &str) -> Result<Vec<u8>> {
    Ok(BASE64.decode(encoded.as_bytes())?)
}
