//! Notification group store: folding, gap fill, read markers.
//!
//! Notifications arrive either live (one at a time, folded into groups by
//! their server-supplied group key) or as server-aggregated pages (full
//! fetches, gap fills, recent polls). Both paths maintain one ordered
//! most-recent-first sequence of groups and gap sentinels, with a parallel
//! pending buffer for slow mode.
//!
//! Read tracking is deliberately conservative: the last-read id only
//! advances while the tab is visible, a list is mounted, the view is at the
//! top, and no *older* unread items can still be hiding below an unfetched
//! gap.

use serde::{Deserialize, Serialize};

use rookery_types::{
    AccountId, GapFill, GroupKey, Notification, NotificationGap, NotificationGroup,
    NotificationId, NotificationPage, NotificationSlot, NotificationType, RecentNotifications,
    StatusId,
};

use crate::constants::{GROUP_SAMPLE_MAX, NOTIFICATION_TRIM_LIMIT};
use crate::gap::{ensure_leading_gap, ensure_trailing_gap, merge_gaps, merge_gaps_around};

/// Staleness of the merged notification view after server-side changes
/// (e.g. accepted follow requests regroup history).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MergedState {
    #[default]
    Ok,
    Pending,
    NeedsReload,
}

/// The notification group store.
#[derive(Clone, Debug)]
pub struct NotificationFeed {
    groups: Vec<NotificationSlot>,
    /// Slow-mode buffer for groups not yet folded into the visible list.
    pending_groups: Vec<NotificationSlot>,
    scrolled_to_top: bool,
    is_loading: bool,
    /// Internal unread watermark; advances before the user-facing marker.
    last_read_id: NotificationId,
    /// User-facing marker, committed when focus/mount conditions allow.
    read_marker_id: NotificationId,
    /// Number of mounted notification list components, usually 0 or 1.
    mounted: usize,
    is_tab_visible: bool,
    merged: MergedState,
    version: u64,
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            pending_groups: Vec::new(),
            scrolled_to_top: false,
            is_loading: false,
            last_read_id: NotificationId::zero(),
            read_marker_id: NotificationId::zero(),
            mounted: 0,
            is_tab_visible: true,
            merged: MergedState::Ok,
            version: 0,
        }
    }
}

/// Owned copy of the store's externally visible state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationFeedSnapshot {
    pub groups: Vec<NotificationSlot>,
    pub pending_groups: Vec<NotificationSlot>,
    pub scrolled_to_top: bool,
    pub is_loading: bool,
    pub last_read_id: NotificationId,
    pub read_marker_id: NotificationId,
    pub merged: MergedState,
}

impl NotificationFeed {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn touch(&mut self) {
        self.version += 1;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The visible group sequence, newest first.
    pub fn groups(&self) -> &[NotificationSlot] {
        &self.groups
    }

    /// The slow-mode pending buffer.
    pub fn pending_groups(&self) -> &[NotificationSlot] {
        &self.pending_groups
    }

    /// The internal unread watermark.
    pub fn last_read_id(&self) -> &NotificationId {
        &self.last_read_id
    }

    /// The user-facing read marker.
    pub fn read_marker_id(&self) -> &NotificationId {
        &self.read_marker_id
    }

    /// Whether a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Staleness of the merged view.
    pub fn merged(&self) -> MergedState {
        self.merged
    }

    /// Current store version (bumped on any mutation).
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Take an owned copy of the externally visible state.
    pub fn snapshot(&self) -> NotificationFeedSnapshot {
        NotificationFeedSnapshot {
            groups: self.groups.clone(),
            pending_groups: self.pending_groups.clone(),
            scrolled_to_top: self.scrolled_to_top,
            is_loading: self.is_loading,
            last_read_id: self.last_read_id.clone(),
            read_marker_id: self.read_marker_id.clone(),
            merged: self.merged,
        }
    }

    // =========================================================================
    // Page ingestion
    // =========================================================================

    /// Mark a fetch as in flight.
    pub fn start_loading(&mut self) {
        self.is_loading = true;
        self.touch();
    }

    /// A fetch was rejected: reset the loading flag, keep cached content.
    pub fn fetch_failed(&mut self) {
        self.is_loading = false;
        self.touch();
    }

    /// Replace the whole sequence with a freshly fetched page.
    pub fn replace(&mut self, page: &NotificationPage) {
        self.groups = page.slots.clone();
        self.is_loading = false;
        self.merged = MergedState::Ok;
        self.update_last_read();
        self.touch();
    }

    /// Fill one identified gap with a fetched page of groups.
    pub fn fill_gap(&mut self, fill: &GapFill) {
        fill_gap_into(&mut self.groups, &fill.gap, &fill.groups);
        self.is_loading = false;
        self.update_last_read();
        self.touch();
    }

    /// Reconcile a poll for notifications newer than the cached head.
    ///
    /// The head of the chosen sequence is (re)opened as a gap and the poll
    /// result is filled into it, so anything the poll did not reach stays
    /// marked unknown.
    pub fn poll_recent(&mut self, poll: &RecentNotifications) {
        let destination = if poll.use_pending_items {
            &mut self.pending_groups
        } else {
            &mut self.groups
        };
        let gap = ensure_leading_gap(destination);
        fill_gap_into(destination, &gap, &poll.groups);
        self.is_loading = false;
        self.update_last_read();
        self.trim();
        self.touch();
    }

    /// Fold a single live notification into the chosen sequence.
    pub fn push_notification(
        &mut self,
        notification: &Notification,
        grouped_types: &[NotificationType],
        use_pending: bool,
    ) {
        let destination = if use_pending {
            &mut self.pending_groups
        } else {
            &mut self.groups
        };
        process_new_notification(destination, notification, grouped_types);
        self.update_last_read();
        self.trim();
        self.touch();
    }

    /// The home streaming connection dropped: unknown notifications may
    /// accumulate above the current head.
    pub fn disconnect(&mut self, use_pending: bool) {
        let destination = if use_pending {
            &mut self.pending_groups
        } else {
            &mut self.groups
        };
        let head_is_group = destination
            .first()
            .is_some_and(|slot| !slot.is_gap());
        if head_is_group {
            let since_id = destination
                .first()
                .and_then(NotificationSlot::as_group)
                .and_then(|group| group.page_min_id.clone());
            destination.insert(
                0,
                NotificationSlot::Gap(NotificationGap {
                    max_id: None,
                    since_id,
                }),
            );
            self.touch();
        }
    }

    /// Splice the pending buffer in front of the visible list, merging
    /// groups both sides know about.
    pub fn load_pending(&mut self) {
        for pending in &mut self.pending_groups {
            let Some(pending_group) = pending.as_group_mut() else {
                continue;
            };
            let Some(existing_index) = self
                .groups
                .iter()
                .position(|slot| slot.group_key() == Some(&pending_group.group_key))
            else {
                continue;
            };
            if let Some(existing) = self.groups[existing_index].as_group() {
                if pending_group.partial {
                    // The pending copy only counted what this client saw
                    // live; absorb the older aggregate it supersedes.
                    pending_group.notifications_count += existing.notifications_count;
                    for account in &existing.sample_account_ids {
                        if !pending_group.sample_account_ids.contains(account) {
                            pending_group.sample_account_ids.push(account.clone());
                        }
                    }
                    pending_group.sample_account_ids.truncate(GROUP_SAMPLE_MAX);
                }
                self.groups.remove(existing_index);
            }
        }

        let mut merged = std::mem::take(&mut self.pending_groups);
        merged.append(&mut self.groups);
        self.groups = merged;
        merge_gaps(&mut self.groups);
        self.trim();
        self.touch();
    }

    /// Drop everything from both lists.
    pub fn clear(&mut self) {
        self.groups.clear();
        self.pending_groups.clear();
        self.touch();
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Remove every group about the given status, from both lists.
    pub fn remove_for_status(&mut self, status: &StatusId) {
        filter_for_status(&mut self.groups, status);
        filter_for_status(&mut self.pending_groups, status);
        self.touch();
    }

    /// Remove the given accounts from every group's sample (optionally only
    /// for one notification type), dropping groups whose sample empties.
    pub fn remove_for_accounts(
        &mut self,
        accounts: &[AccountId],
        only_for_type: Option<NotificationType>,
    ) {
        filter_for_accounts(&mut self.groups, accounts, only_for_type);
        filter_for_accounts(&mut self.pending_groups, accounts, only_for_type);
        self.touch();
    }

    // =========================================================================
    // Read tracking & view state
    // =========================================================================

    /// Record the view's scroll position.
    pub fn set_scrolled_to_top(&mut self, top: bool) {
        self.scrolled_to_top = top;
        self.update_last_read();
        self.trim();
        self.touch();
    }

    /// A notification list component mounted.
    pub fn mount(&mut self) {
        self.mounted += 1;
        self.commit_last_read();
        self.update_last_read();
        self.touch();
    }

    /// A notification list component unmounted.
    pub fn unmount(&mut self) {
        self.mounted = self.mounted.saturating_sub(1);
        self.touch();
    }

    /// The tab gained or lost visibility.
    pub fn set_tab_visible(&mut self, visible: bool) {
        self.is_tab_visible = visible;
        if visible {
            self.commit_last_read();
            self.update_last_read();
        }
        self.touch();
    }

    /// The user explicitly marked everything as read: advance and publish
    /// the marker unconditionally.
    pub fn mark_all_read(&mut self) {
        if let Some(max) = self
            .groups
            .iter()
            .find_map(NotificationSlot::as_group)
            .and_then(|group| group.page_max_id.clone())
            && self.last_read_id < max
        {
            self.last_read_id = max;
        }
        self.read_marker_id = self.last_read_id.clone();
        self.touch();
    }

    /// A server-side read marker arrived; adopt it when newer than ours.
    pub fn merge_marker(&mut self, marker: &NotificationId) {
        if self.last_read_id < *marker {
            self.last_read_id = marker.clone();
            self.read_marker_id = marker.clone();
            self.touch();
        }
    }

    /// Server-side regrouping happened while we hold merged history; a full
    /// reload is needed to see it.
    pub fn defer_refresh(&mut self) {
        self.merged = MergedState::NeedsReload;
        self.touch();
    }

    /// Whether the unread watermark may advance right now.
    ///
    /// Requires a visible tab, a mounted list, the view at the top, and
    /// that no older unread items can still be hiding below an unfetched
    /// trailing gap.
    fn should_mark_as_read(&self) -> bool {
        let is_mounted = self.mounted > 0;
        let has_more = self.groups.last().is_some_and(NotificationSlot::is_gap);
        let oldest_group = self.groups.iter().rev().find_map(NotificationSlot::as_group);
        let oldest_reached = !has_more
            || self.last_read_id.is_zero()
            || oldest_group
                .and_then(|group| group.page_min_id.as_ref())
                .is_some_and(|min| *min <= self.last_read_id);

        self.is_tab_visible && self.scrolled_to_top && is_mounted && oldest_reached
    }

    fn update_last_read(&mut self) {
        if !self.should_mark_as_read() {
            return;
        }
        if let Some(max) = self
            .groups
            .iter()
            .find_map(NotificationSlot::as_group)
            .and_then(|group| group.page_max_id.clone())
            && self.last_read_id < max
        {
            self.last_read_id = max;
        }
    }

    fn commit_last_read(&mut self) {
        if self.should_mark_as_read() {
            self.read_marker_id = self.last_read_id.clone();
        }
    }

    fn trim(&mut self) {
        if self.scrolled_to_top && self.groups.len() > NOTIFICATION_TRIM_LIMIT {
            self.groups.truncate(NOTIFICATION_TRIM_LIMIT);
            ensure_trailing_gap(&mut self.groups);
        }
    }
}

/// Fold one live notification into a group sequence.
fn process_new_notification(
    slots: &mut Vec<NotificationSlot>,
    notification: &Notification,
    grouped_types: &[NotificationType],
) {
    let group_key = if grouped_types.contains(&notification.kind) {
        notification.group_key.clone()
    } else {
        // Ungrouped types get one group per notification.
        GroupKey::ungrouped(&notification.id)
    };

    // In any case a group is about to land at the top; if a gap is
    // currently there, the new item defines its upper bound.
    if let Some(NotificationSlot::Gap(gap)) = slots.first_mut() {
        gap.max_id = Some(notification.id.clone());
    }

    let existing_index = slots
        .iter()
        .position(|slot| slot.group_key() == Some(&group_key));

    let Some(existing_index) = existing_index else {
        let mut group = NotificationGroup::from_notification(notification);
        group.group_key = group_key;
        slots.insert(0, NotificationSlot::Group(group));
        return;
    };

    let Some(group) = slots[existing_index].as_group_mut() else {
        return;
    };
    // Can happen when e.g. the same account likes, unlikes, and likes the
    // same post again.
    if group.sample_account_ids.contains(&notification.account_id) {
        return;
    }

    group
        .sample_account_ids
        .insert(0, notification.account_id.clone());
    if group.sample_account_ids.len() > GROUP_SAMPLE_MAX {
        group.sample_account_ids.pop();
    }
    group.most_recent_notification_id = notification.id.clone();
    group.page_max_id = Some(notification.id.clone());
    group.latest_page_notification_at = Some(notification.created_at.clone());
    group.notifications_count += 1;

    let updated = slots.remove(existing_index);
    merge_gaps_around(slots, existing_index);
    slots.insert(0, updated);
}

/// Replace one identified gap with a fetched page (plus a narrower gap for
/// whatever the page did not reach).
fn fill_gap_into(
    slots: &mut Vec<NotificationSlot>,
    gap: &NotificationGap,
    page: &[NotificationGroup],
) {
    let Some(gap_index) = slots.iter().position(|slot| slot.as_gap() == Some(gap)) else {
        tracing::debug!(?gap, "gap-fill target no longer present, ignoring");
        return;
    };

    // The sequence is split in two by the gap. Filling it must not disturb
    // or duplicate anything *before* (newer than) the gap; group information
    // at or below it can be updated and re-ordered.
    let newer_keys: Vec<GroupKey> = slots[..gap_index]
        .iter()
        .filter_map(|slot| slot.group_key().cloned())
        .collect();

    let mut to_insert: Vec<NotificationSlot> = page
        .iter()
        .filter(|group| !newer_keys.contains(&group.group_key))
        .cloned()
        .map(NotificationSlot::Group)
        .collect();

    let api_keys: Vec<GroupKey> = to_insert
        .iter()
        .filter_map(|slot| slot.group_key().cloned())
        .collect();

    // An empty page means we reached the bottom; a page reaching the gap's
    // since_id means it was filled completely. Anything else leaves a
    // narrower gap for the remaining unknown region.
    let oldest_page_id = page.last().and_then(|group| group.page_min_id.as_ref());
    let filled_completely = match (oldest_page_id, gap.since_id.as_ref()) {
        (Some(oldest), Some(since)) => oldest <= since,
        _ => false,
    };
    if !page.is_empty() && !filled_completely {
        to_insert.push(NotificationSlot::Gap(NotificationGap {
            max_id: page.last().and_then(|group| group.page_max_id.clone()),
            since_id: gap.since_id.clone(),
        }));
    }

    // Older copies of freshly delivered groups are superseded. Those can
    // only sit at-or-after the gap (keys before it were excluded above), so
    // the gap's own position is unaffected.
    slots.retain(|slot| {
        slot.group_key()
            .is_none_or(|key| !api_keys.contains(key))
    });
    let Some(gap_index) = slots.iter().position(|slot| slot.as_gap() == Some(gap)) else {
        return;
    };

    slots.splice(gap_index..=gap_index, to_insert);
    merge_gaps(slots);
}

/// Remove accounts from group samples, dropping groups that empty out.
fn filter_for_accounts(
    slots: &mut Vec<NotificationSlot>,
    accounts: &[AccountId],
    only_for_type: Option<NotificationType>,
) {
    for slot in slots.iter_mut() {
        let Some(group) = slot.as_group_mut() else {
            continue;
        };
        if only_for_type.is_some_and(|kind| kind != group.kind) {
            continue;
        }
        let before = group.sample_account_ids.len();
        group.sample_account_ids.retain(|id| !accounts.contains(id));
        let removed = (before - group.sample_account_ids.len()) as u64;
        group.notifications_count = group.notifications_count.saturating_sub(removed);
    }
    slots.retain(|slot| {
        slot.as_group()
            .is_none_or(|group| !group.sample_account_ids.is_empty())
    });
    merge_gaps(slots);
}

/// Remove every group about the given status.
fn filter_for_status(slots: &mut Vec<NotificationSlot>, status: &StatusId) {
    slots.retain(|slot| {
        slot.as_group()
            .and_then(|group| group.status_id.as_ref())
            != Some(status)
    });
    merge_gaps(slots);
}

// ============================================================================
// Tests
// ============================================================================
