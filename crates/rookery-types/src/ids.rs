//! Typed identifiers for statuses, accounts, and notifications.
//!
//! All ID types wrap a server-issued snowflake: a decimal string whose
//! numeric magnitude encodes creation order. They're opaque on the wire and
//! display as-is for logging. Ordering is [`compare_id`] — length first, then
//! lexicographic — which equals big-integer order for canonical decimals
//! (no leading zeros). The server issues canonical ids; [`compare_id`] does
//! not attempt to repair non-canonical input.
//!
//! Ids are stored inline via `SmartString` (snowflakes are ~18 digits, well
//! under the 23-byte inline bound).

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use smartstring::alias::String as IdStr;

/// A status (post) identifier.
#[derive(Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusId(IdStr);

/// An account identifier.
#[derive(Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(IdStr);

/// A notification identifier.
#[derive(Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(IdStr);

/// Compare two snowflake id strings by numeric magnitude.
///
/// Same ordering the whole engine uses: longer string is the bigger number,
/// equal lengths fall back to byte order. Exposed as a free function so
/// consumers outside the typed-id layer (e.g. anything holding raw cursor
/// strings) get identical semantics.
pub fn compare_id(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    if a.len() == b.len() {
        a.cmp(b)
    } else {
        a.len().cmp(&b.len())
    }
}

/// Error from validated identifier parsing.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("empty identifier")]
    Empty,
    #[error("non-digit character in identifier '{0}'")]
    NonDigit(String),
    #[error("non-canonical leading zero in identifier '{0}'")]
    LeadingZero(String),
}

// ── Shared behavior ─────────────────────────────────────────────────────────

macro_rules! impl_snowflake_id {
    ($T:ident, $name:literal) => {
        impl $T {
            /// Wrap a server-issued id without validation.
            ///
            /// Server payloads are trusted to carry canonical decimals; use
            /// [`Self::parse`] for anything user- or cursor-supplied.
            pub fn new(id: impl Into<IdStr>) -> Self {
                Self(id.into())
            }

            /// Parse and validate a canonical decimal snowflake.
            ///
            /// Rejects empty strings, non-digits, and leading zeros (which
            /// would break length-first comparison).
            pub fn parse(s: &str) -> Result<Self, IdError> {
                if s.is_empty() {
                    return Err(IdError::Empty);
                }
                if !s.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(IdError::NonDigit(s.to_string()));
                }
                if s.len() > 1 && s.starts_with('0') {
                    return Err(IdError::LeadingZero(s.to_string()));
                }
                Ok(Self(s.into()))
            }

            /// The raw id string.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// The `"0"` id — smaller than every real snowflake.
            ///
            /// Used as the unset floor for read markers.
            pub fn zero() -> Self {
                Self("0".into())
            }

            /// Check if this is the `"0"` floor id.
            pub fn is_zero(&self) -> bool {
                self.0 == "0"
            }
        }

        impl Ord for $T {
            fn cmp(&self, other: &Self) -> Ordering {
                compare_id(&self.0, &other.0)
            }
        }

        impl PartialOrd for $T {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl From<&str> for $T {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $T {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl fmt::Display for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $name, self.0)
            }
        }
    };
}

impl_snowflake_id!(StatusId, "StatusId");
impl_snowflake_id!(AccountId, "AccountId");
impl_snowflake_id!(NotificationId, "NotificationId");

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ── compare_id semantics ────────────────────────────────────────────

    #[test]
    fn test_equal_ids_compare_equal() {
        assert_eq!(compare_id("105", "105"), Ordering::Equal);
    }

    #[test]
    fn test_longer_id_is_greater() {
        // "99" < "100" numerically despite lexicographic order saying otherwise
        assert_eq!(compare_id("99", "100"), Ordering::Less);
        assert_eq!(compare_id("100", "99"), Ordering::Greater);
    }

    #[test]
    fn test_equal_length_compares_lexically() {
        assert_eq!(compare_id("105", "109"), Ordering::Less);
        assert_eq!(compare_id("210", "109"), Ordering::Greater);
    }

    #[test]
    fn test_ord_matches_compare_id() {
        let a = StatusId::new("99");
        let b = StatusId::new("100");
        assert!(a < b);
        assert!(b > a);
        assert_eq!(a.cmp(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn test_zero_is_floor() {
        let zero = NotificationId::zero();
        assert!(zero.is_zero());
        assert!(zero < NotificationId::new("1"));
        assert!(zero < NotificationId::new("110284719068848967"));
    }

    // ── Validated parsing ───────────────────────────────────────────────

    #[test]
    fn test_parse_accepts_canonical() {
        assert_eq!(
            StatusId::parse("110284719068848967"),
            Ok(StatusId::new("110284719068848967"))
        );
        assert_eq!(StatusId::parse("0"), Ok(StatusId::zero()));
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(StatusId::parse(""), Err(IdError::Empty));
    }

    #[test]
    fn test_parse_rejects_non_digits() {
        assert!(matches!(
            AccountId::parse("12a4"),
            Err(IdError::NonDigit(_))
        ));
        assert!(matches!(AccountId::parse("-1"), Err(IdError::NonDigit(_))));
    }

    #[test]
    fn test_parse_rejects_leading_zero() {
        assert!(matches!(
            NotificationId::parse("0123"),
            Err(IdError::LeadingZero(_))
        ));
    }

    // ── Display / Debug formatting ──────────────────────────────────────

    #[test]
    fn test_display_is_raw_id() {
        assert_eq!(StatusId::new("42").to_string(), "42");
    }

    #[test]
    fn test_debug_shows_type_name() {
        assert_eq!(format!("{:?}", AccountId::new("42")), "AccountId(42)");
    }

    // ── Serde roundtrips ────────────────────────────────────────────────

    #[test]
    fn test_serde_is_transparent() {
        let id = StatusId::new("110284719068848967");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"110284719068848967\"");
        let parsed: StatusId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_postcard_roundtrip() {
        let id = NotificationId::new("99887766");
        let bytes = postcard::to_stdvec(&id).unwrap();
        let parsed: NotificationId = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(id, parsed);
    }
}
