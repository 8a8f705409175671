use crate::{Result, constants::MAX_CODE_LENGTH, error::Error};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use subtle::ConstantTimeEq;

/// Access code (PIN) presented to the lock.
///
/// Codes are trimmed on construction and must be 1-32 printable ASCII
/// characters without whitespace.
///
/// # Security
/// Equality is constant-time to avoid leaking how much of a code matched.
/// `Display` and `Debug` print the code in full; use [`AccessCode::masked`]
/// for anything that ends up in logs.
#[derive(Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessCode(String);

impl AccessCode {
    /// Create a new access code with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidAccessCode` if the code is empty, longer than
    /// 32 characters, or contains whitespace or non-ASCII characters.
    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim();

        if code.is_empty() {
            return Err(Error::InvalidAccessCode("code is empty".to_string()));
        }

        let len = code.len();
        if len > MAX_CODE_LENGTH {
            return Err(Error::InvalidAccessCode(format!(
                "code must be at most {MAX_CODE_LENGTH} chars, got {len}"
            )));
        }

        if !code.chars().all(|c| c.is_ascii_graphic()) {
            return Err(Error::InvalidAccessCode(
                "code must be printable ASCII without spaces".to_string(),
            ));
        }

        Ok(AccessCode(code.to_string()))
    }

    /// Get the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Masked form suitable for logs and notifications.
    #[must_use]
    pub fn masked(&self) -> String {
        mask_code(&self.0)
    }
}

/// Mask an arbitrary (possibly invalid) code string.
///
/// Keeps the length visible, hides every character.
#[must_use]
pub fn mask_code(code: &str) -> String {
    "*".repeat(code.chars().count())
}

impl fmt::Display for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("AccessCode").field(&self.0).finish()
    }
}

impl std::str::FromStr for AccessCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AccessCode::new(s)
    }
}

impl TryFrom<String> for AccessCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        AccessCode::new(&value)
    }
}

impl From<AccessCode> for String {
    fn from(code: AccessCode) -> Self {
        code.0
    }
}

/// Constant-time comparison implementation for AccessCode
impl PartialEq for AccessCode {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

/// Hashes exactly like the underlying `str`, so maps keyed by `AccessCode`
/// can be queried with a plain `&str`.
impl std::hash::Hash for AccessCode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialOrd for AccessCode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AccessCode {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl Borrow<str> for AccessCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Credential class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// Never expires, removable only by explicit deletion.
    Permanent,
    /// Valid until an absolute expiry instant.
    Temporary,
    /// Valid for a fixed number of uses, deleted at zero.
    OneTime,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CredentialKind::Permanent => write!(f, "permanent"),
            CredentialKind::Temporary => write!(f, "temporary"),
            CredentialKind::OneTime => write!(f, "one-time"),
        }
    }
}

/// Physical lock state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    Open,
    Closed,
}

impl LockState {
    /// Returns `true` if the lock is open.
    #[inline]
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, LockState::Open)
    }

    /// Returns `true` if the lock is closed.
    #[inline]
    #[must_use]
    pub fn is_closed(self) -> bool {
        matches!(self, LockState::Closed)
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LockState::Open => write!(f, "OPEN"),
            LockState::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Why the lock changed state.
///
/// Purely informational: carried into events so notifications can say how
/// the transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockReason {
    /// A valid code was entered on the keypad.
    PinEntered,
    /// Manual open/close key on the keypad.
    ManualOverride,
    /// Command from the remote operator.
    RemoteCommand,
    /// The master override sequence (`0000#`).
    MasterOverridePin,
}

impl fmt::Display for LockReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LockReason::PinEntered => write!(f, "PIN entered"),
            LockReason::ManualOverride => write!(f, "manual override"),
            LockReason::RemoteCommand => write!(f, "remote command"),
            LockReason::MasterOverridePin => write!(f, "master override PIN"),
        }
    }
}

/// Identity of a remote caller (chat user id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        UserId(id)
    }

    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .map(UserId)
            .map_err(|_| Error::InvalidUserId(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case("1234", "1234")]
    #[case("  9876 ", "9876")]
    #[case("12AB", "12AB")]
    #[case("12345678901234567890123456789012", "12345678901234567890123456789012")]
    fn test_access_code_valid(#[case] input: &str, #[case] expected: &str) {
        let code = AccessCode::new(input).unwrap();
        assert_eq!(code.as_str(), expected);
    }

    #[rstest]
    #[case("")] // empty
    #[case("   ")] // blank
    #[case("12 34")] // inner space
    #[case("123456789012345678901234567890123")] // too long
    #[case("12é4")] // non-ASCII
    fn test_access_code_invalid(#[case] input: &str) {
        assert!(AccessCode::new(input).is_err());
    }

    #[test]
    fn test_access_code_masked() {
        let code = AccessCode::new("4821").unwrap();
        assert_eq!(code.masked(), "****");
        assert_eq!(mask_code(""), "");
    }

    #[test]
    fn test_access_code_lookup_by_str() {
        let mut set = HashSet::new();
        set.insert(AccessCode::new("4821").unwrap());

        assert!(set.contains("4821"));
        assert!(!set.contains("4822"));
    }

    #[test]
    fn test_access_code_serde_validates() {
        let code: AccessCode = serde_json::from_str("\"1234\"").unwrap();
        assert_eq!(code.as_str(), "1234");

        let bad: std::result::Result<AccessCode, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_lock_state_display() {
        assert_eq!(LockState::Open.to_string(), "OPEN");
        assert_eq!(LockState::Closed.to_string(), "CLOSED");
        assert!(LockState::Open.is_open());
        assert!(LockState::Closed.is_closed());
    }

    #[rstest]
    #[case("1593693874", 1_593_693_874)]
    #[case(" -42 ", -42)]
    fn test_user_id_parse(#[case] input: &str, #[case] expected: i64) {
        let id: UserId = input.parse().unwrap();
        assert_eq!(id.as_i64(), expected);
    }

    #[test]
    fn test_user_id_invalid() {
        assert!("abc".parse::<UserId>().is_err());
    }
}
