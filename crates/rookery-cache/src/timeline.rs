//! Timeline window store and the ordered window merge.
//!
//! A [`Timeline`] holds one feed's cached window: an ordered sequence of
//! status ids interleaved with gap sentinels, a parallel pending buffer for
//! slow mode, an unread counter, and loading/partial/online flags. The
//! store is mutable with a version bumped on every change; callers that
//! need a stable view take an owned [`TimelineSnapshot`].
//!
//! # Merge model
//!
//! The cache cannot assume it is perfectly sorted — live pushes land at the
//! front without knowledge of everything between — so a fetched page only
//! rewrites the bracket it has authority over: the sub-range between the
//! newest and oldest fetched id. Everything outside the bracket is left
//! untouched, and ids inside it that the fetch did not re-deliver are
//! carried over rather than lost.

use serde::{Deserialize, Serialize};

use rookery_types::{StatusId, TimelineGap, TimelinePage, TimelineSlot};

use crate::constants::{LOAD_PENDING_KEEP, TIMELINE_TRUNCATE_KEEP, TIMELINE_TRUNCATE_THRESHOLD};
use crate::gap::collapse_gaps;

/// One feed's cached window.
#[derive(Clone, Debug)]
pub struct Timeline {
    /// The visible ordered sequence, newest first.
    items: Vec<TimelineSlot>,
    /// Slow-mode buffer: live items held aside while the view is away from
    /// the top.
    pending_items: Vec<TimelineSlot>,
    unread: usize,
    /// Whether the view is scrolled to the top.
    top: bool,
    /// Whether the streaming connection for this feed is up.
    online: bool,
    is_loading: bool,
    has_more: bool,
    is_partial: bool,
    /// Bumped on every mutation.
    version: u64,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pending_items: Vec::new(),
            unread: 0,
            top: true,
            online: false,
            is_loading: false,
            has_more: true,
            is_partial: false,
            version: 0,
        }
    }
}

/// Owned copy of a timeline's externally visible state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineSnapshot {
    pub items: Vec<TimelineSlot>,
    pub pending_items: Vec<TimelineSlot>,
    pub unread: usize,
    pub top: bool,
    pub online: bool,
    pub is_loading: bool,
    pub has_more: bool,
    pub is_partial: bool,
}

impl Timeline {
    /// Create a new empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    fn touch(&mut self) {
        self.version += 1;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The visible ordered sequence, newest first.
    pub fn items(&self) -> &[TimelineSlot] {
        &self.items
    }

    /// The slow-mode pending buffer.
    pub fn pending_items(&self) -> &[TimelineSlot] {
        &self.pending_items
    }

    /// Count of items received but not yet seen.
    pub fn unread(&self) -> usize {
        self.unread
    }

    /// Whether the view is scrolled to the top.
    pub fn is_top(&self) -> bool {
        self.top
    }

    /// Whether the streaming connection for this feed is up.
    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Whether a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Whether the server may still have older items.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Whether the last page was marked partial.
    pub fn is_partial(&self) -> bool {
        self.is_partial
    }

    /// Current store version (bumped on any mutation).
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Check if either sequence holds the given status.
    pub fn contains(&self, id: &StatusId) -> bool {
        let held = |slot: &TimelineSlot| slot.status_id() == Some(id);
        self.items.iter().any(held) || self.pending_items.iter().any(held)
    }

    /// Take an owned copy of the externally visible state.
    pub fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot {
            items: self.items.clone(),
            pending_items: self.pending_items.clone(),
            unread: self.unread,
            top: self.top,
            online: self.online,
            is_loading: self.is_loading,
            has_more: self.has_more,
            is_partial: self.is_partial,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Mark a fetch as in flight.
    pub fn start_loading(&mut self) {
        self.is_loading = true;
        self.touch();
    }

    /// A fetch was rejected: reset the loading flag, keep all cached content.
    pub fn fetch_failed(&mut self) {
        self.is_loading = false;
        self.touch();
    }

    /// Merge a fetched page into the window (the ordered window merge).
    pub fn expand(&mut self, page: &TimelinePage) {
        self.is_loading = false;
        self.is_partial = page.partial;

        if page.next.is_none() && !page.loading_recent {
            self.has_more = false;
        }

        if page.statuses.is_empty() {
            self.touch();
            return;
        }

        let use_pending =
            page.loading_recent && (page.use_pending_items || !self.pending_items.is_empty());
        let destination = if use_pending {
            &mut self.pending_items
        } else {
            &mut self.items
        };
        merge_page(destination, &page.statuses, page.partial);
        self.touch();
    }

    /// Prepend a live-pushed status.
    ///
    /// In pending mode (requested, or a pending buffer already exists) the
    /// id goes to the pending buffer and always counts as unread. Otherwise
    /// it goes to `items`, counting as unread only when scrolled away from
    /// the top; a window at the top is truncated to the newest
    /// [`TIMELINE_TRUNCATE_KEEP`] entries once it exceeds
    /// [`TIMELINE_TRUNCATE_THRESHOLD`].
    pub fn push_status(&mut self, id: &StatusId, use_pending: bool) {
        if use_pending || !self.pending_items.is_empty() {
            if self.contains(id) {
                return;
            }
            self.pending_items.insert(0, TimelineSlot::status(id.clone()));
            self.unread += 1;
            self.touch();
            return;
        }

        if self.items.iter().any(|slot| slot.status_id() == Some(id)) {
            return;
        }
        if !self.top {
            self.unread += 1;
        }
        if self.top && self.items.len() > TIMELINE_TRUNCATE_THRESHOLD {
            self.items.truncate(TIMELINE_TRUNCATE_KEEP);
        }
        self.items.insert(0, TimelineSlot::status(id.clone()));
        self.touch();
    }

    /// Splice the pending buffer in front of the window.
    ///
    /// Keeps at most [`LOAD_PENDING_KEEP`] of the current entries below the
    /// spliced-in buffer and zeroes the unread counter.
    pub fn load_pending(&mut self) {
        let mut merged = std::mem::take(&mut self.pending_items);
        self.items.truncate(LOAD_PENDING_KEEP);
        merged.append(&mut self.items);
        self.items = merged;
        collapse_gaps(&mut self.items);
        self.unread = 0;
        self.touch();
    }

    /// The streaming connection dropped.
    pub fn disconnect(&mut self) {
        if self.online {
            self.online = false;
            self.touch();
        }
    }

    /// The streaming connection came (back) up.
    ///
    /// If the feed was offline, unknown content may exist between now and
    /// the newest cached item: a gap is prepended to the active sequence
    /// unless it is empty or already gap-headed.
    pub fn reconnect(&mut self, use_pending: bool) {
        if self.online {
            return;
        }
        self.online = true;
        let sequence = if use_pending {
            &mut self.pending_items
        } else {
            &mut self.items
        };
        if sequence.first().is_some_and(|slot| !slot.is_gap()) {
            sequence.insert(0, TimelineSlot::gap());
        }
        self.touch();
    }

    /// Record the view's scroll position.
    ///
    /// Reaching the top makes everything currently visible "read": unread
    /// collapses to the size of the still-hidden pending buffer.
    pub fn set_top(&mut self, top: bool) {
        if top {
            self.unread = self.pending_items.len();
        }
        self.top = top;
        self.touch();
    }

    /// Drop all cached content, keeping only the connection state.
    pub fn clear(&mut self) {
        let online = self.online;
        let version = self.version;
        *self = Self {
            online,
            version,
            ..Self::default()
        };
        self.touch();
    }

    /// Remove a status from both sequences. Returns whether anything was
    /// removed.
    pub fn delete_status(&mut self, id: &StatusId) -> bool {
        let before = self.items.len() + self.pending_items.len();
        self.items.retain(|slot| slot.status_id() != Some(id));
        self.pending_items.retain(|slot| slot.status_id() != Some(id));
        if self.items.len() + self.pending_items.len() == before {
            return false;
        }
        collapse_gaps(&mut self.items);
        collapse_gaps(&mut self.pending_items);
        self.touch();
        true
    }
}

/// Rewrite the slice of `old_slots` that `batch` (newest → oldest) has
/// authority over.
fn merge_page(old_slots: &mut Vec<TimelineSlot>, batch: &[StatusId], partial: bool) {
    let (Some(newest), Some(oldest)) = (batch.first(), batch.last()) else {
        return;
    };

    // Right edge of the bracket: one past the newest cached status at least
    // as old as the batch's oldest id. `>=` (not `>`) so a cached item equal
    // to the oldest fetched id stays inside the bracket instead of being
    // duplicated below it.
    let last_index = old_slots
        .iter()
        .rposition(|slot| slot.status_id().is_some_and(|id| id >= oldest))
        .map_or(0, |i| i + 1);

    // Left edge, searched only up to the right edge: one past the newest
    // cached status strictly newer than the batch's newest id.
    let first_index = old_slots[..last_index]
        .iter()
        .rposition(|slot| slot.status_id().is_some_and(|id| id > newest))
        .map_or(0, |i| i + 1);

    // The fetched ids, deduplicated, order preserved.
    let mut inserted: Vec<StatusId> = Vec::with_capacity(batch.len());
    for id in batch {
        if !inserted.contains(id) {
            inserted.push(id.clone());
        }
    }

    // Bracketed stragglers the fetch did not re-deliver: anything strictly
    // older than the batch's oldest id sits below the fetched page and must
    // not be lost.
    for slot in &old_slots[first_index..last_index] {
        if let Some(id) = slot.status_id()
            && id < oldest
            && !inserted.contains(id)
        {
            inserted.push(id.clone());
        }
    }

    // Drop anything already cached outside the bracket.
    let outside = |id: &StatusId| {
        old_slots[..first_index]
            .iter()
            .chain(&old_slots[last_index..])
            .any(|slot| slot.status_id() == Some(id))
    };
    inserted.retain(|id| !outside(id));

    let mut replacement: Vec<TimelineSlot> =
        inserted.into_iter().map(TimelineSlot::Status).collect();

    if partial {
        let left_is_gap = first_index
            .checked_sub(1)
            .is_some_and(|i| old_slots[i].is_gap());
        if !left_is_gap {
            // An empty window gets the initial placeholder; otherwise this
            // is a generic unknown region below known content.
            let kind = if old_slots.is_empty() {
                TimelineGap::Seed
            } else {
                TimelineGap::Missing
            };
            replacement.insert(0, TimelineSlot::Gap(kind));
        }
    }

    old_slots.splice(first_index..last_index, replacement);
    collapse_gaps(old_slots);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(s: &str) -> StatusId {
        StatusId::new(s)
    }

    fn ids(batch: &[&str]) -> Vec<StatusId> {
        batch.iter().map(|s| sid(s)).collect()
    }

    fn slots(spec: &[&str]) -> Vec<TimelineSlot> {
        spec.iter()
            .map(|s| match *s {
                "_" => TimelineSlot::gap(),
                "~" => TimelineSlot::seed_gap(),
                id => TimelineSlot::status(id),
            })
            .collect()
    }

    fn seeded(items: &[&str]) -> Timeline {
        Timeline {
            items: slots(items),
            ..Timeline::default()
        }
    }

    fn page(batch: &[&str]) -> TimelinePage {
        TimelinePage::new(ids(batch))
    }

    fn partial_page(batch: &[&str]) -> TimelinePage {
        TimelinePage {
            partial: true,
            ..page(batch)
        }
    }

    // ── Ordered window merge ────────────────────────────────────────────

    #[test]
    fn test_partial_merge_brackets_between_known_items() {
        // Bracket: 10 > 9 puts the left edge after 10; 8 is the last cached
        // item >= 7, so the right edge lands after 8. The partial flag adds
        // one sentinel at the bracket's left edge.
        let mut tl = seeded(&["10", "8", "5", "_", "2"]);
        tl.expand(&partial_page(&["9", "8", "7"]));
        assert_eq!(tl.items(), slots(&["10", "_", "9", "8", "7", "5", "_", "2"]));
        assert!(tl.is_partial());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut tl = seeded(&["10", "8", "5", "_", "2"]);
        tl.expand(&partial_page(&["9", "8", "7"]));
        let once = tl.items().to_vec();
        tl.expand(&partial_page(&["9", "8", "7"]));
        assert_eq!(tl.items(), once);
    }

    #[test]
    fn test_merge_preserves_ids_outside_bracket() {
        let mut tl = seeded(&["100", "90", "50", "40", "2"]);
        tl.expand(&page(&["80", "70", "60"]));
        // 100 and 90 are newer than 80, 50/40/2 older than 60: all kept,
        // same relative positions.
        assert_eq!(
            tl.items(),
            slots(&["100", "90", "80", "70", "60", "50", "40", "2"])
        );
    }

    #[test]
    fn test_bracket_keeps_item_equal_to_oldest_fetched() {
        // The >= boundary: a cached item equal to the batch's oldest id must
        // land inside the bracket, not be duplicated below it.
        let mut tl = seeded(&["10", "7", "3"]);
        tl.expand(&page(&["9", "7"]));
        assert_eq!(tl.items(), slots(&["10", "9", "7", "3"]));
    }

    #[test]
    fn test_bracketed_stragglers_survive() {
        // The cache is out of order (4 before 8, from an old live push).
        // The bracket spans [4, 8]; 8 is covered by the fetch's authority
        // and not re-delivered (deleted server-side), but 4 is older than
        // the page's reach and must be carried over, not lost.
        let mut tl = seeded(&["10", "4", "8"]);
        tl.expand(&page(&["9", "5"]));
        assert_eq!(tl.items(), slots(&["10", "9", "5", "4"]));
    }

    #[test]
    fn test_batch_duplicates_are_dropped() {
        let mut tl = seeded(&[]);
        tl.expand(&page(&["9", "8", "9", "8"]));
        assert_eq!(tl.items(), slots(&["9", "8"]));
    }

    #[test]
    fn test_empty_batch_only_touches_flags() {
        let mut tl = seeded(&["10", "5"]);
        tl.start_loading();
        tl.expand(&TimelinePage {
            next: None,
            ..TimelinePage::default()
        });
        assert_eq!(tl.items(), slots(&["10", "5"]));
        assert!(!tl.is_loading());
        assert!(!tl.has_more());
    }

    #[test]
    fn test_has_more_survives_loading_recent_without_cursor() {
        let mut tl = seeded(&[]);
        tl.expand(&TimelinePage {
            statuses: ids(&["9"]),
            next: None,
            loading_recent: true,
            ..TimelinePage::default()
        });
        assert!(tl.has_more());
    }

    #[test]
    fn test_partial_fetch_into_empty_window_seeds_placeholder() {
        let mut tl = Timeline::new();
        tl.expand(&partial_page(&["9", "8"]));
        assert_eq!(tl.items(), slots(&["~", "9", "8"]));
    }

    #[test]
    fn test_partial_fetch_keeps_existing_gap_below() {
        // The page lands inside a known gap; the old sentinel stays below
        // the inserted items and a new one marks the region above them.
        let mut tl = seeded(&["10", "_", "2"]);
        tl.expand(&TimelinePage {
            partial: true,
            ..page(&["8", "5"])
        });
        assert_eq!(tl.items(), slots(&["10", "_", "8", "5", "_", "2"]));
    }

    #[test]
    fn test_loading_recent_routes_to_pending_when_requested() {
        let mut tl = seeded(&["5"]);
        tl.expand(&TimelinePage {
            statuses: ids(&["9", "8"]),
            loading_recent: true,
            use_pending_items: true,
            ..TimelinePage::default()
        });
        assert_eq!(tl.items(), slots(&["5"]));
        assert_eq!(tl.pending_items(), slots(&["9", "8"]));
    }

    #[test]
    fn test_loading_recent_keeps_using_nonempty_pending() {
        let mut tl = Timeline {
            pending_items: slots(&["20"]),
            ..Timeline::default()
        };
        tl.expand(&TimelinePage {
            statuses: ids(&["25"]),
            loading_recent: true,
            use_pending_items: false,
            ..TimelinePage::default()
        });
        assert_eq!(tl.pending_items(), slots(&["25", "20"]));
    }

    // ── Live push ───────────────────────────────────────────────────────

    #[test]
    fn test_push_prepends_and_counts_unread_away_from_top() {
        let mut tl = seeded(&["5"]);
        tl.set_top(false);
        tl.push_status(&sid("9"), false);
        assert_eq!(tl.items(), slots(&["9", "5"]));
        assert_eq!(tl.unread(), 1);
    }

    #[test]
    fn test_push_at_top_does_not_count_unread() {
        let mut tl = seeded(&["5"]);
        tl.push_status(&sid("9"), false);
        assert_eq!(tl.unread(), 0);
    }

    #[test]
    fn test_push_duplicate_is_ignored() {
        let mut tl = seeded(&["9", "5"]);
        let version = tl.version();
        tl.push_status(&sid("9"), false);
        assert_eq!(tl.items(), slots(&["9", "5"]));
        assert_eq!(tl.version(), version);
    }

    #[test]
    fn test_push_truncates_full_window_at_top() {
        let many: Vec<String> = (0..41).map(|i| (1000 - i).to_string()).collect();
        let many_refs: Vec<&str> = many.iter().map(String::as_str).collect();
        let mut tl = seeded(&many_refs);
        tl.push_status(&sid("1001"), false);
        assert_eq!(tl.items().len(), TIMELINE_TRUNCATE_KEEP + 1);
        assert_eq!(tl.items()[0], TimelineSlot::status("1001"));
    }

    #[test]
    fn test_push_pending_counts_unread_and_dedups_against_items() {
        let mut tl = seeded(&["5"]);
        tl.push_status(&sid("9"), true);
        assert_eq!(tl.pending_items(), slots(&["9"]));
        assert_eq!(tl.unread(), 1);

        // Already in items: dropped even in pending mode.
        tl.push_status(&sid("5"), true);
        assert_eq!(tl.pending_items(), slots(&["9"]));
        assert_eq!(tl.unread(), 1);
    }

    #[test]
    fn test_push_lands_in_pending_once_buffer_exists() {
        let mut tl = seeded(&["5"]);
        tl.push_status(&sid("9"), true);
        // use_pending false, but a buffer exists: keep routing there.
        tl.push_status(&sid("10"), false);
        assert_eq!(tl.items(), slots(&["5"]));
        assert_eq!(tl.pending_items(), slots(&["10", "9"]));
    }

    // ── Load pending ────────────────────────────────────────────────────

    #[test]
    fn test_load_pending_splices_in_front() {
        let mut tl = seeded(&["5", "4"]);
        tl.push_status(&sid("9"), true);
        tl.push_status(&sid("8"), true);
        tl.load_pending();
        assert_eq!(tl.items(), slots(&["8", "9", "5", "4"]));
        assert_eq!(tl.unread(), 0);
        assert!(tl.pending_items().is_empty());
    }

    #[test]
    fn test_load_pending_keeps_at_most_forty_current_items() {
        let many: Vec<String> = (0..60).map(|i| (1000 - i).to_string()).collect();
        let many_refs: Vec<&str> = many.iter().map(String::as_str).collect();
        let mut tl = seeded(&many_refs);
        tl.push_status(&sid("2000"), true);
        tl.load_pending();
        assert_eq!(tl.items().len(), 1 + LOAD_PENDING_KEEP);
        assert_eq!(tl.items()[0], TimelineSlot::status("2000"));
    }

    #[test]
    fn test_load_pending_collapses_seam_gaps() {
        let mut tl = Timeline {
            items: slots(&["_", "5"]),
            pending_items: slots(&["9", "_"]),
            ..Timeline::default()
        };
        tl.load_pending();
        assert_eq!(tl.items(), slots(&["9", "_", "5"]));
    }

    // ── Connection state ────────────────────────────────────────────────

    #[test]
    fn test_reconnect_inserts_gap_when_previously_offline() {
        let mut tl = seeded(&["100", "99"]);
        tl.reconnect(false);
        assert_eq!(tl.items(), slots(&["_", "100", "99"]));
        assert!(tl.is_online());
    }

    #[test]
    fn test_reconnect_skips_gap_on_empty_window() {
        let mut tl = Timeline::new();
        tl.reconnect(false);
        assert!(tl.items().is_empty());
        assert!(tl.is_online());
    }

    #[test]
    fn test_reconnect_never_doubles_a_gap() {
        let mut tl = seeded(&["_", "99"]);
        tl.reconnect(false);
        assert_eq!(tl.items(), slots(&["_", "99"]));
    }

    #[test]
    fn test_reconnect_while_online_is_noop() {
        let mut tl = seeded(&["99"]);
        tl.reconnect(false);
        tl.reconnect(false);
        assert_eq!(tl.items(), slots(&["_", "99"]));
    }

    #[test]
    fn test_reconnect_targets_pending_buffer_when_asked() {
        let mut tl = Timeline {
            items: slots(&["5"]),
            pending_items: slots(&["9"]),
            ..Timeline::default()
        };
        tl.reconnect(true);
        assert_eq!(tl.items(), slots(&["5"]));
        assert_eq!(tl.pending_items(), slots(&["_", "9"]));
    }

    // ── Scroll, clear, delete, failure ──────────────────────────────────

    #[test]
    fn test_scroll_to_top_collapses_unread_to_pending_size() {
        let mut tl = seeded(&["5"]);
        tl.set_top(false);
        tl.push_status(&sid("9"), false);
        tl.push_status(&sid("10"), true);
        assert_eq!(tl.unread(), 2);
        tl.set_top(true);
        assert_eq!(tl.unread(), 1);
    }

    #[test]
    fn test_clear_keeps_connection_state() {
        let mut tl = seeded(&["9", "5"]);
        tl.reconnect(false);
        tl.clear();
        assert!(tl.items().is_empty());
        assert!(tl.has_more());
        assert!(tl.is_online());
    }

    #[test]
    fn test_delete_removes_from_both_sequences_and_merges_gaps() {
        let mut tl = Timeline {
            items: slots(&["9", "_", "5", "_", "2"]),
            pending_items: slots(&["5"]),
            ..Timeline::default()
        };
        assert!(tl.delete_status(&sid("5")));
        assert_eq!(tl.items(), slots(&["9", "_", "2"]));
        assert!(tl.pending_items().is_empty());
        assert!(!tl.delete_status(&sid("5")));
    }

    #[test]
    fn test_fetch_failure_only_resets_loading() {
        let mut tl = seeded(&["9"]);
        tl.start_loading();
        tl.fetch_failed();
        assert!(!tl.is_loading());
        assert_eq!(tl.items(), slots(&["9"]));
    }

    // ── Snapshots ───────────────────────────────────────────────────────

    #[test]
    fn test_snapshot_is_detached_from_later_mutations() {
        let mut tl = seeded(&["9"]);
        let snap = tl.snapshot();
        tl.push_status(&sid("10"), false);
        assert_eq!(snap.items, slots(&["9"]));
        assert_eq!(tl.items(), slots(&["10", "9"]));
    }
}
