//! Feed keys and timeline window slots.
//!
//! A [`FeedKey`] names one cached window ("home", "account:42", ...). A
//! window is an ordered sequence of [`TimelineSlot`]s — status ids
//! interleaved with gap sentinels. Gaps are opaque to ordering: merge code
//! only ever looks at their position, never compares them by value.

use std::fmt;

use serde::{Deserialize, Serialize};
use smartstring::alias::String as KeyStr;

use crate::ids::{AccountId, StatusId};

/// Key of one cached feed window.
///
/// Well-known keys (`home`, `public`, ...) have constructors; arbitrary keys
/// are accepted because the reconciliation engine treats them opaquely — the
/// only structure it relies on is the `account:{id}` prefix scheme used by
/// [`FeedKey::belongs_to`].
#[derive(Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedKey(KeyStr);

impl FeedKey {
    /// An arbitrary feed key.
    pub fn new(key: impl Into<KeyStr>) -> Self {
        Self(key.into())
    }

    /// The home timeline.
    pub fn home() -> Self {
        Self::new("home")
    }

    /// The federated (public) timeline.
    pub fn public() -> Self {
        Self::new("public")
    }

    /// The local-instance timeline.
    pub fn community() -> Self {
        Self::new("community")
    }

    /// An account's main feed.
    pub fn account(id: &AccountId) -> Self {
        Self::new(format!("account:{id}"))
    }

    /// A sub-window of an account's feed (e.g. `with_replies`, `media`).
    pub fn account_facet(id: &AccountId, facet: &str) -> Self {
        Self::new(format!("account:{id}:{facet}"))
    }

    /// A hashtag timeline.
    pub fn hashtag(name: &str) -> Self {
        Self::new(format!("hashtag:{name}"))
    }

    /// A list timeline.
    pub fn list(id: &str) -> Self {
        Self::new(format!("list:{id}"))
    }

    /// The raw key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this window belongs to the given account.
    ///
    /// Matches the account's main feed and every `account:{id}:*` facet.
    /// Used by the deletion cascade to leave an account's own windows intact
    /// when a relationship is severed rather than content deleted.
    pub fn belongs_to(&self, account: &AccountId) -> bool {
        let Some(rest) = self.0.strip_prefix("account:") else {
            return false;
        };
        rest == account.as_str()
            || rest
                .strip_prefix(account.as_str())
                .is_some_and(|tail| tail.starts_with(':'))
    }
}

impl fmt::Display for FeedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for FeedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeedKey({})", self.0)
    }
}

impl From<&str> for FeedKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Which kind of unknown region a timeline gap marks.
///
/// `Missing` is the generic sentinel (disconnect gaps, partial-fetch gaps
/// between known items); `Seed` is the initial placeholder left by a partial
/// fetch landing in an empty window. Both behave identically to merge code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimelineGap {
    #[default]
    Missing,
    Seed,
}

/// One element of a timeline window: a status id or a gap sentinel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TimelineSlot {
    /// A known status.
    Status(StatusId),
    /// The client does not know what, if anything, exists here.
    Gap(TimelineGap),
}

impl TimelineSlot {
    /// A status slot.
    pub fn status(id: impl Into<StatusId>) -> Self {
        Self::Status(id.into())
    }

    /// A generic gap sentinel.
    pub fn gap() -> Self {
        Self::Gap(TimelineGap::Missing)
    }

    /// An initial-placeholder gap sentinel.
    pub fn seed_gap() -> Self {
        Self::Gap(TimelineGap::Seed)
    }

    /// Check if this slot is a gap of either kind.
    pub fn is_gap(&self) -> bool {
        matches!(self, Self::Gap(_))
    }

    /// The status id, if this slot holds one.
    pub fn status_id(&self) -> Option<&StatusId> {
        match self {
            Self::Status(id) => Some(id),
            Self::Gap(_) => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
