//! Mask token parsing -- the `_mask|algorithm|nonce|encrypt|mac|mask` format.
//!
//! A mask token carries an opaque encrypted payload next to a human-readable
//! display segment. Only the display segment is ever rendered; the other four
//! segments are store-and-forward data and are never decoded here.
//!
//! ```text
//! _mask|<algorithm-flag>|<nonce>|<encrypt>|<mac>|<display-mask>
//! ```
//!
//! Segments 2-5 use the URL-safe base64 alphabet `[A-Za-z0-9-_=]`. The display
//! segment is unconstrained apart from line breaks, and may itself contain `|`.
//! Anything that does not have this exact shape is not a token and passes
//! through unchanged.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{MaskError, Result};
use crate::value::to_display_string;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^_mask\|([A-Za-z0-9\-_=]+)\|([A-Za-z0-9\-_=]+)\|([A-Za-z0-9\-_=]+)\|([A-Za-z0-9\-_=]+)\|(.*)$",
    )
    .expect("token pattern is valid")
});

static SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\-_=]+$").expect("segment pattern is valid"));

/// Literal first field of every token.
pub const TOKEN_PREFIX: &str = "_mask";

/// Extract the display segment from any context value.
///
/// Strings go through [`extract_str`]; every other value is converted with
/// [`to_display_string`] and returned as-is. Never fails.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use mask_core::extract_display_segment;
///
/// assert_eq!(extract_display_segment(&json!("_mask|GM|bm9uY2U|ZW5j|bWFj|138****5678")), "138****5678");
/// assert_eq!(extract_display_segment(&json!("plain")), "plain");
/// assert_eq!(extract_display_segment(&json!(7)), "7");
/// ```
pub fn extract_display_segment(value: &Value) -> String {
    match value {
        Value::String(s) => extract_str(s).to_string(),
        other => to_display_string(other),
    }
}

/// Extract the display segment from a string, or return the input unchanged
/// when it is not a token.
pub fn extract_str(input: &str) -> &str {
    match MaskToken::parse(input) {
        Some(token) => token.display(),
        None => input,
    }
}

/// Known values of the algorithm flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmMode {
    /// SM4 encryption with HMAC-SM3, flag `GM`.
    Gm,
    /// ChaCha20-Poly1305 / AES-GCM, flag `MODERN`.
    Modern,
}

impl AlgorithmMode {
    /// The flag written into the token.
    pub fn code(self) -> &'static str {
        match self {
            AlgorithmMode::Gm => "GM",
            AlgorithmMode::Modern => "MODERN",
        }
    }
}

impl FromStr for AlgorithmMode {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "GM" => Ok(AlgorithmMode::Gm),
            "MODERN" => Ok(AlgorithmMode::Modern),
            _ => Err(()),
        }
    }
}

impl fmt::Display for AlgorithmMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A borrowed view over a parsed mask token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskToken<'a> {
    algorithm: &'a str,
    nonce: &'a str,
    encrypt: &'a str,
    mac: &'a str,
    display: &'a str,
}

impl<'a> MaskToken<'a> {
    /// Parse a token. Returns `None` for anything that is not exactly the
    /// six-field shape, including strings with fewer fields that still start
    /// with `_mask|`.
    pub fn parse(input: &'a str) -> Option<Self> {
        let caps = TOKEN_RE.captures(input)?;
        Some(Self {
            algorithm: caps.get(1)?.as_str(),
            nonce: caps.get(2)?.as_str(),
            encrypt: caps.get(3)?.as_str(),
            mac: caps.get(4)?.as_str(),
            display: caps.get(5)?.as_str(),
        })
    }

    /// Build the wire form of a token from already-encoded segments.
    ///
    /// # Errors
    ///
    /// Returns [`MaskError::InvalidSegment`] if one of the four opaque segments
    /// is empty or leaves the URL-safe alphabet, or if the display segment
    /// contains a line break (the result would no longer parse).
    pub fn compose(
        algorithm: &str,
        nonce: &str,
        encrypt: &str,
        mac: &str,
        display: &str,
    ) -> Result<String> {
        for (field, value) in [
            ("algorithm", algorithm),
            ("nonce", nonce),
            ("encrypt", encrypt),
            ("mac", mac),
        ] {
            if !SEGMENT_RE.is_match(value) {
                return Err(MaskError::InvalidSegment {
                    field,
                    value: value.to_string(),
                    reason: "expected [A-Za-z0-9-_=]+",
                });
            }
        }
        if display.contains('\n') {
            return Err(MaskError::InvalidSegment {
                field: "display",
                value: display.to_string(),
                reason: "line breaks are not allowed",
            });
        }
        Ok(format!(
            "{TOKEN_PREFIX}|{algorithm}|{nonce}|{encrypt}|{mac}|{display}"
        ))
    }

    pub fn algorithm(&self) -> &'a str {
        self.algorithm
    }

    /// The algorithm flag as a known mode, if it is one.
    pub fn algorithm_mode(&self) -> Option<AlgorithmMode> {
        self.algorithm.parse().ok()
    }

    pub fn nonce(&self) -> &'a str {
        self.nonce
    }

    pub fn encrypt(&self) -> &'a str {
        self.encrypt
    }

    pub fn mac(&self) -> &'a str {
        self.mac
    }

    /// The display segment, verbatim.
    pub fn display(&self) -> &'a str {
        self.display
    }
}

impl fmt::Display for MaskToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{TOKEN_PREFIX}|{}|{}|{}|{}|{}",
            self.algorithm, self.nonce, self.encrypt, self.mac, self.display
        )
    }
}
