//! Payload shapes handed to the reconciliation engine.
//!
//! These mirror the already-resolved results the fetch and streaming layers
//! produce — the engine performs no I/O and only ever sees these structs.

use serde::{Deserialize, Serialize};

use crate::ids::{AccountId, StatusId};
use crate::notification::{NotificationGap, NotificationGroup, NotificationSlot};

/// A fetched page of a timeline, newest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TimelinePage {
    /// Status ids, newest → oldest. May re-deliver ids already cached.
    pub statuses: Vec<StatusId>,
    /// Opaque pagination cursor; absence means the server has nothing older.
    pub next: Option<String>,
    /// The server marked this page as not reaching back to known content.
    pub partial: bool,
    /// This fetch was catching up on recent items (as opposed to paging
    /// into history or filling a gap).
    pub loading_recent: bool,
    /// Caller preference for routing recent items through the pending
    /// buffer ("slow mode").
    pub use_pending_items: bool,
}

impl TimelinePage {
    /// A plain full page with a continuation cursor.
    pub fn new(statuses: Vec<StatusId>) -> Self {
        Self {
            statuses,
            next: Some("next".to_string()),
            ..Self::default()
        }
    }
}

/// A status as referenced by cascade events: just enough to resolve
/// authorship and reblog references.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRef {
    pub id: StatusId,
    pub account_id: AccountId,
    /// Set when this status is a reblog wrapper around another status.
    pub reblog_of: Option<StatusId>,
}

/// A status deletion, with the reference ids the submitting layer already
/// knows about (reblog wrappers of the deleted status).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDeletion {
    pub id: StatusId,
    /// Cached statuses referencing `id`; cascaded before `id` itself.
    pub references: Vec<StatusId>,
    /// Informational: what `id` itself was a reblog of. The cascade derives
    /// nothing from it; carried for downstream listeners.
    pub reblog_of: Option<StatusId>,
}

impl StatusDeletion {
    /// A deletion with no known references.
    pub fn of(id: impl Into<StatusId>) -> Self {
        Self {
            id: id.into(),
            references: Vec::new(),
            reblog_of: None,
        }
    }
}

/// A severed relationship (block, mute with notifications, domain block)
/// plus the currently cached statuses to resolve it against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEvent {
    pub relationship_id: AccountId,
    pub statuses: Vec<StatusRef>,
}

/// A status with its reply parent, as delivered by a context fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusThread {
    pub id: StatusId,
    pub in_reply_to_id: Option<StatusId>,
}

impl StatusThread {
    /// A root status (no parent).
    pub fn root(id: impl Into<StatusId>) -> Self {
        Self {
            id: id.into(),
            in_reply_to_id: None,
        }
    }

    /// A reply to `parent`.
    pub fn reply(id: impl Into<StatusId>, parent: impl Into<StatusId>) -> Self {
        Self {
            id: id.into(),
            in_reply_to_id: Some(parent.into()),
        }
    }
}

/// A fetched thread context around one focal status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextPage {
    /// The status the context was fetched for.
    pub status_id: StatusId,
    /// Ancestors ordered oldest → nearest; the last one is the focal
    /// status's immediate parent.
    pub ancestors: Vec<StatusThread>,
    pub descendants: Vec<StatusThread>,
}

/// A full notification page replacing the current group sequence.
///
/// May already contain trailing gap slots appended by the fetch layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NotificationPage {
    pub slots: Vec<NotificationSlot>,
}

/// The result of fetching into one identified notification gap.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapFill {
    /// The gap this fetch was issued for, as it existed at fetch time.
    pub gap: NotificationGap,
    /// Server-aggregated groups covering (part of) the gap, newest first.
    pub groups: Vec<NotificationGroup>,
}

/// A poll for notifications newer than what is cached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentNotifications {
    pub groups: Vec<NotificationGroup>,
    pub use_pending_items: bool,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_page_defaults() {
        let page = TimelinePage::new(vec![StatusId::new("9")]);
        assert!(page.next.is_some());
        assert!(!page.partial);
        assert!(!page.loading_recent);
    }

    #[test]
    fn test_deletion_of_has_no_references() {
        let deletion = StatusDeletion::of("42");
        assert!(deletion.references.is_empty());
        assert!(deletion.reblog_of.is_none());
    }

    #[test]
    fn test_thread_constructors() {
        assert!(StatusThread::root("1").in_reply_to_id.is_none());
        assert_eq!(
            StatusThread::reply("2", "1").in_reply_to_id,
            Some(StatusId::new("1"))
        );
    }

    #[test]
    fn test_gap_fill_serde_roundtrip() {
        let fill = GapFill {
            gap: NotificationGap::bounded("90", "10"),
            groups: Vec::new(),
        };
        let json = serde_json::to_string(&fill).unwrap();
        let parsed: GapFill = serde_json::from_str(&json).unwrap();
        assert_eq!(fill, parsed);
    }
}
