//! Desensitize rules -- producers of the display segment.
//!
//! A token's display segment is a partially starred copy of the original
//! value (`138****5678`, `ab*****@example.com`). Each [`SensitiveKind`] pairs
//! a validation pattern with a masking rule. The generic rule keeps `prefix`
//! leading and `suffix` trailing characters and stars the rest; names and
//! e-mail addresses have their own rules.
//!
//! Lengths are counted in Unicode scalar values, so `张三丰` is three
//! characters long.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{MaskError, Result};

/// The supported kinds of sensitive values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensitiveKind {
    BankCard,
    EMail,
    ChineseCitizenIdCard,
    ChineseMobilePhone,
    ChineseTellPhone,
    ChineseName,
    EnglishName,
    /// Any value; masked with the generic rule and never validated.
    Custom,
}

static BANK_CARD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9][0-9]{12,18}$").expect("bank card pattern is valid"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$",
    )
    .expect("e-mail pattern is valid")
});

static ID_CARD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(^[1-9][0-9]{5}[0-9]{2}((0[1-9])|(10|11|12))(([0-2][1-9])|10|20|30|31)[0-9]{2}[0-9Xx]$)|(^[1-9][0-9]{5}(18|19|20)[0-9]{2}((0[1-9])|(1[0-2]))(([0-2][1-9])|10|20|30|31)[0-9]{3}[0-9Xx]$)",
    )
    .expect("id card pattern is valid")
});

static MOBILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^1[3-9][0-9]{9}$").expect("mobile pattern is valid"));

static TELEPHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(0[0-9]{2,3}[-\s]?)?[0-9]{7,8}([-\s]?[0-9]{1,6})?$")
        .expect("telephone pattern is valid")
});

static CHINESE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\x{4e00}-\x{9fa5}]+(·[\x{4e00}-\x{9fa5}]+)*$")
        .expect("chinese name pattern is valid")
});

static ENGLISH_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z'\-.]{1,19}(?:\s+[A-Za-z][A-Za-z'\-.]{1,19})*$")
        .expect("english name pattern is valid")
});

impl SensitiveKind {
    /// Every kind, in declaration order.
    pub const ALL: [SensitiveKind; 8] = [
        SensitiveKind::BankCard,
        SensitiveKind::EMail,
        SensitiveKind::ChineseCitizenIdCard,
        SensitiveKind::ChineseMobilePhone,
        SensitiveKind::ChineseTellPhone,
        SensitiveKind::ChineseName,
        SensitiveKind::EnglishName,
        SensitiveKind::Custom,
    ];

    /// Filter name used when the kind is registered with a template engine.
    pub fn name(self) -> &'static str {
        match self {
            SensitiveKind::BankCard => "bank_card",
            SensitiveKind::EMail => "email",
            SensitiveKind::ChineseCitizenIdCard => "id_card",
            SensitiveKind::ChineseMobilePhone => "mobile",
            SensitiveKind::ChineseTellPhone => "telephone",
            SensitiveKind::ChineseName => "chinese_name",
            SensitiveKind::EnglishName => "english_name",
            SensitiveKind::Custom => "custom",
        }
    }

    /// `(prefix, suffix)` characters kept visible by the generic rule.
    pub fn visible(self) -> (usize, usize) {
        match self {
            SensitiveKind::BankCard | SensitiveKind::ChineseCitizenIdCard => (6, 4),
            SensitiveKind::EMail
            | SensitiveKind::ChineseMobilePhone
            | SensitiveKind::ChineseTellPhone => (3, 4),
            SensitiveKind::ChineseName | SensitiveKind::EnglishName | SensitiveKind::Custom => {
                (1, 1)
            }
        }
    }

    fn pattern(self) -> Option<&'static Regex> {
        match self {
            SensitiveKind::BankCard => Some(&*BANK_CARD_RE),
            SensitiveKind::EMail => Some(&*EMAIL_RE),
            SensitiveKind::ChineseCitizenIdCard => Some(&*ID_CARD_RE),
            SensitiveKind::ChineseMobilePhone => Some(&*MOBILE_RE),
            SensitiveKind::ChineseTellPhone => Some(&*TELEPHONE_RE),
            SensitiveKind::ChineseName => Some(&*CHINESE_NAME_RE),
            SensitiveKind::EnglishName => Some(&*ENGLISH_NAME_RE),
            SensitiveKind::Custom => None,
        }
    }
}

impl FromStr for SensitiveKind {
    type Err = MaskError;

    fn from_str(s: &str) -> Result<Self> {
        SensitiveKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| MaskError::UnknownKind(s.to_string()))
    }
}

impl fmt::Display for SensitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mask `source` according to `kind`.
///
/// Blank input (empty or whitespace only) is returned unchanged. Otherwise the
/// source is validated against the kind's pattern before masking.
///
/// # Errors
///
/// - [`MaskError::PatternMismatch`] if validation fails
/// - [`MaskError::TooShort`] if nothing would be left to star
/// - [`MaskError::InvalidEmail`] for e-mail sources without a local part or domain
///
/// # Examples
///
/// ```
/// use mask_core::{desensitize, SensitiveKind};
///
/// assert_eq!(desensitize(SensitiveKind::ChineseMobilePhone, "13812345678").unwrap(), "138****5678");
/// assert_eq!(desensitize(SensitiveKind::EMail, "alice@example.com").unwrap(), "alic*****@example.com");
/// ```
pub fn desensitize(kind: SensitiveKind, source: &str) -> Result<String> {
    if source.trim().is_empty() {
        return Ok(source.to_string());
    }

    if let Some(pattern) = kind.pattern() {
        if !pattern.is_match(source) {
            return Err(MaskError::PatternMismatch { kind: kind.name() });
        }
    }

    match kind {
        SensitiveKind::ChineseName => mask_chinese_name(source),
        SensitiveKind::EMail => mask_email(source),
        other => {
            let (prefix, suffix) = other.visible();
            mask_with_index(source, prefix, suffix)
        }
    }
}

/// Keep `prefix` leading and `suffix` trailing characters, star the rest.
///
/// Blank input is returned unchanged.
///
/// # Errors
///
/// Returns [`MaskError::TooShort`] when `prefix + suffix` covers the whole value.
pub fn mask_with_index(source: &str, prefix: usize, suffix: usize) -> Result<String> {
    if source.trim().is_empty() {
        return Ok(source.to_string());
    }

    let chars: Vec<char> = source.chars().collect();
    let len = chars.len();
    let keep = prefix.checked_add(suffix).unwrap_or(usize::MAX);
    if keep >= len {
        return Err(MaskError::TooShort { len, keep });
    }

    let mut out = String::with_capacity(source.len());
    out.extend(&chars[..prefix]);
    out.extend(std::iter::repeat_n('*', len - prefix - suffix));
    out.extend(&chars[len - suffix..]);
    Ok(out)
}

/// Two characters keep the surname, three keep both ends, longer names keep
/// a two-character compound surname and the last character.
fn mask_chinese_name(source: &str) -> Result<String> {
    match source.chars().count() {
        0 | 1 => Err(MaskError::TooShort {
            len: source.chars().count(),
            keep: 2,
        }),
        2 => mask_with_index(source, 1, 0),
        3 => mask_with_index(source, 1, 1),
        _ => mask_with_index(source, 2, 1),
    }
}

fn mask_email(source: &str) -> Result<String> {
    let (local, domain) = source.split_once('@').ok_or(MaskError::InvalidEmail)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(MaskError::InvalidEmail);
    }

    let keep = match local.chars().count() {
        1 => return Ok(format!("*@{domain}")),
        2..=4 => 2,
        _ => 4,
    };
    let head: String = local.chars().take(keep).collect();
    Ok(format!("{head}*****@{domain}"))
}
