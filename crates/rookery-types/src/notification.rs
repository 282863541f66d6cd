//! Notification model: types, groups, and gap-as-group sentinels.
//!
//! Notifications are folded into [`NotificationGroup`]s keyed by a
//! server-supplied [`GroupKey`]. A group carries a bounded most-recent-first
//! sample of contributing accounts plus a superset counter
//! (`notifications_count` ≥ sample length — the sample is a truncated view).
//! Groups and [`NotificationGap`]s share one ordered sequence via
//! [`NotificationSlot`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smartstring::alias::String as KeyStr;
use strum::EnumString;

use crate::ids::{AccountId, NotificationId, StatusId};

/// What kind of event a notification reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum NotificationType {
    Mention,
    /// Someone the user follows posted.
    Status,
    Reblog,
    Follow,
    FollowRequest,
    Favourite,
    /// A poll the user voted in or authored has ended.
    Poll,
    /// A status the user interacted with was edited.
    Update,
    #[serde(rename = "admin.sign_up")]
    #[strum(serialize = "admin.sign_up")]
    AdminSignUp,
    #[serde(rename = "admin.report")]
    #[strum(serialize = "admin.report")]
    AdminReport,
    SeveredRelationships,
    ModerationWarning,
}

impl NotificationType {
    /// Parse from the wire string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to the wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mention => "mention",
            Self::Status => "status",
            Self::Reblog => "reblog",
            Self::Follow => "follow",
            Self::FollowRequest => "follow_request",
            Self::Favourite => "favourite",
            Self::Poll => "poll",
            Self::Update => "update",
            Self::AdminSignUp => "admin.sign_up",
            Self::AdminReport => "admin.report",
            Self::SeveredRelationships => "severed_relationships",
            Self::ModerationWarning => "moderation_warning",
        }
    }

    /// The types servers group by default (everything else folds into a
    /// single-notification `ungrouped-*` group).
    pub fn default_grouped() -> &'static [Self] {
        &[Self::Favourite, Self::Reblog, Self::Follow]
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Server-supplied key folding multiple notifications into one group.
#[derive(Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(KeyStr);

impl GroupKey {
    /// Wrap a server-supplied group key.
    pub fn new(key: impl Into<KeyStr>) -> Self {
        Self(key.into())
    }

    /// The synthetic key for a notification of a type the client does not
    /// group: one group per notification.
    pub fn ungrouped(id: &NotificationId) -> Self {
        Self::new(format!("ungrouped-{id}"))
    }

    /// The raw key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupKey({})", self.0)
    }
}

impl From<&str> for GroupKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A single notification as pushed over the streaming connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    /// The acting account (who favourited, followed, ...).
    pub account_id: AccountId,
    /// Server timestamp, carried opaquely (ISO 8601).
    pub created_at: String,
    pub group_key: GroupKey,
    /// The status this notification is about, when there is one.
    pub status_id: Option<StatusId>,
}

/// An aggregated notification group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationGroup {
    pub group_key: GroupKey,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    /// Bounded, most-recent-first, duplicate-free sample of acting accounts.
    pub sample_account_ids: Vec<AccountId>,
    /// Total contributors — always ≥ `sample_account_ids.len()`.
    pub notifications_count: u64,
    pub most_recent_notification_id: NotificationId,
    /// Oldest notification id the current page covered for this group.
    pub page_min_id: Option<NotificationId>,
    /// Newest notification id the current page covered for this group.
    pub page_max_id: Option<NotificationId>,
    pub latest_page_notification_at: Option<String>,
    pub status_id: Option<StatusId>,
    /// True when built client-side from a single live notification — the
    /// counts only cover what this client saw, and a later merge with a
    /// server-aggregated copy must add rather than replace them.
    #[serde(default)]
    pub partial: bool,
}

impl NotificationGroup {
    /// Build a fresh single-member group from one live notification.
    pub fn from_notification(notification: &Notification) -> Self {
        Self {
            group_key: notification.group_key.clone(),
            kind: notification.kind,
            sample_account_ids: vec![notification.account_id.clone()],
            notifications_count: 1,
            most_recent_notification_id: notification.id.clone(),
            page_min_id: Some(notification.id.clone()),
            page_max_id: Some(notification.id.clone()),
            latest_page_notification_at: Some(notification.created_at.clone()),
            status_id: notification.status_id.clone(),
            partial: true,
        }
    }
}

/// A gap occupying a slot in the group sequence.
///
/// `max_id` / `since_id` are the *exclusive* boundary ids of the unknown
/// region; either end may be open.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NotificationGap {
    pub max_id: Option<NotificationId>,
    pub since_id: Option<NotificationId>,
}

impl NotificationGap {
    /// A gap bounded on both ends.
    pub fn bounded(max_id: impl Into<NotificationId>, since_id: impl Into<NotificationId>) -> Self {
        Self {
            max_id: Some(max_id.into()),
            since_id: Some(since_id.into()),
        }
    }
}

/// One element of the group sequence: an aggregated group or a gap.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NotificationSlot {
    Group(NotificationGroup),
    Gap(NotificationGap),
}

impl NotificationSlot {
    /// Check if this slot is a gap.
    pub fn is_gap(&self) -> bool {
        matches!(self, Self::Gap(_))
    }

    /// The group, if this slot holds one.
    pub fn as_group(&self) -> Option<&NotificationGroup> {
        match self {
            Self::Group(group) => Some(group),
            Self::Gap(_) => None,
        }
    }

    /// Mutable access to the group, if this slot holds one.
    pub fn as_group_mut(&mut self) -> Option<&mut NotificationGroup> {
        match self {
            Self::Group(group) => Some(group),
            Self::Gap(_) => None,
        }
    }

    /// The gap, if this slot holds one.
    pub fn as_gap(&self) -> Option<&NotificationGap> {
        match self {
            Self::Group(_) => None,
            Self::Gap(gap) => Some(gap),
        }
    }

    /// The group key, if this slot holds a group.
    pub fn group_key(&self) -> Option<&GroupKey> {
        self.as_group().map(|group| &group.group_key)
    }
}

impl From<NotificationGroup> for NotificationSlot {
    fn from(group: NotificationGroup) -> Self {
        Self::Group(group)
    }
}

impl From<NotificationGap> for NotificationSlot {
    fn from(gap: NotificationGap) -> Self {
        Self::Gap(gap)
    }
}

// ============================================================================
// Tests
// ============================================================================
