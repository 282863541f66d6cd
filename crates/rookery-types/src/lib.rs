//! Shared identifier and feed-model types for Rookery.
//!
//! This crate is the relational foundation: snowflake-ordered ids, feed
//! keys, window slots, the notification group model, and the event payload
//! shapes the reconciliation engine consumes. It has **no internal rookery
//! dependencies** — a pure leaf crate that other crates build on.
//!
//! # Entity-Relationship Overview
//!
//! ```text
//! FeedKey ("home", "account:{id}", ...) ← one cached window per key
//!     └── Window = ordered TimelineSlot sequence (StatusId | gap sentinel)
//!
//! Status (StatusId, snowflake-ordered)
//!     └── authored by Account (AccountId)
//!     └── may reblog another Status (reference — cascaded on delete)
//!     └── may reply to another Status (reply graph edge)
//!
//! Notification (NotificationId)
//!     └── acted by Account
//!     └── folds into NotificationGroup (GroupKey)
//!           └── shares a sequence with NotificationGap sentinels
//! ```
//!
//! Ordering everywhere is [`compare_id`]: snowflake ids compared as big
//! integers (length first, then bytes), never by wall-clock time.

pub mod event;
pub mod feed;
pub mod ids;
pub mod notification;

// Re-export primary types at crate root for convenience.
pub use event::{
    ContextPage, GapFill, NotificationPage, RecentNotifications, RelationshipEvent,
    StatusDeletion, StatusRef, StatusThread, TimelinePage,
};
pub use feed::{FeedKey, TimelineGap, TimelineSlot};
pub use ids::{AccountId, IdError, NotificationId, StatusId, compare_id};
pub use notification::{
    GroupKey, Notification, NotificationGap, NotificationGroup, NotificationSlot,
    NotificationType,
};
