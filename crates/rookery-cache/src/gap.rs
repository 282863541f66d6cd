//! Gap Merge — collapsing adjacent gap sentinels and recomputing boundaries.
//!
//! Both window kinds share the same invariant: no two gap sentinels are ever
//! adjacent. Timeline gaps carry no boundaries, so collapsing keeps the
//! outermost (first) sentinel of a run. Notification gaps carry exclusive
//! `max_id`/`since_id` bounds, so a collapsed run takes the first gap's
//! `max_id` and the last gap's `since_id`.

use rookery_types::{NotificationGap, NotificationSlot, TimelineSlot};

/// Collapse adjacent timeline gaps, keeping the first sentinel of each run.
pub fn collapse_gaps(slots: &mut Vec<TimelineSlot>) {
    let mut previous_was_gap = false;
    slots.retain(|slot| {
        let keep = !(slot.is_gap() && previous_was_gap);
        previous_was_gap = slot.is_gap();
        keep
    });
}

/// Collapse every run of adjacent notification gaps into one, taking the
/// outer pair's boundaries.
pub fn merge_gaps(slots: &mut Vec<NotificationSlot>) {
    let mut merged: Vec<NotificationSlot> = Vec::with_capacity(slots.len());
    for slot in slots.drain(..) {
        // Extend a gap run: keep the first gap's max_id, adopt each further
        // gap's since_id as the new lower bound.
        if let (Some(NotificationSlot::Gap(last)), NotificationSlot::Gap(gap)) =
            (merged.last_mut(), &slot)
        {
            last.since_id = gap.since_id.clone();
            continue;
        }
        merged.push(slot);
    }
    *slots = merged;
}

/// If `slots[index - 1]` and `slots[index]` are both gaps, merge them into
/// one in place. Used after removing a single element from between them.
pub fn merge_gaps_around(slots: &mut Vec<NotificationSlot>, index: usize) {
    if index == 0 || index >= slots.len() {
        return;
    }
    let (Some(first), Some(second)) = (slots[index - 1].as_gap(), slots[index].as_gap()) else {
        return;
    };
    let merged = NotificationGap {
        max_id: first.max_id.clone(),
        since_id: second.since_id.clone(),
    };
    slots.splice(index - 1..=index, [NotificationSlot::Gap(merged)]);
}

/// Ensure the group sequence starts with a gap suitable for loading newer
/// items, returning a copy of that gap.
///
/// An existing head gap has its `max_id` discarded (we are expecting new
/// notifications above it); otherwise a fresh gap bounded below by the first
/// group's `page_min_id` is prepended.
pub fn ensure_leading_gap(slots: &mut Vec<NotificationSlot>) -> NotificationGap {
    if let Some(NotificationSlot::Gap(gap)) = slots.first_mut() {
        gap.max_id = None;
        return gap.clone();
    }
    let gap = NotificationGap {
        max_id: None,
        since_id: slots
            .first()
            .and_then(NotificationSlot::as_group)
            .and_then(|group| group.page_min_id.clone()),
    };
    slots.insert(0, NotificationSlot::Gap(gap.clone()));
    gap
}

/// Ensure the group sequence ends with a gap suitable for loading older
/// items, returning a copy of that gap.
pub fn ensure_trailing_gap(slots: &mut Vec<NotificationSlot>) -> NotificationGap {
    if let Some(NotificationSlot::Gap(gap)) = slots.last_mut() {
        // We're expecting older notifications below, so the lower bound
        // is open now.
        gap.since_id = None;
        return gap.clone();
    }
    let gap = NotificationGap {
        max_id: slots
            .last()
            .and_then(NotificationSlot::as_group)
            .and_then(|group| group.page_min_id.clone()),
        since_id: None,
    };
    slots.push(NotificationSlot::Gap(gap.clone()));
    gap
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rookery_types::{
        AccountId, GroupKey, NotificationGroup, NotificationId, NotificationType, StatusId,
        TimelineSlot,
    };

    fn group(key: &str, min: &str, max: &str) -> NotificationSlot {
        NotificationSlot::Group(NotificationGroup {
            group_key: GroupKey::new(key),
            kind: NotificationType::Favourite,
            sample_account_ids: vec![AccountId::new("1")],
            notifications_count: 1,
            most_recent_notification_id: NotificationId::new(max),
            page_min_id: Some(NotificationId::new(min)),
            page_max_id: Some(NotificationId::new(max)),
            latest_page_notification_at: None,
            status_id: Some(StatusId::new("900")),
            partial: false,
        })
    }

    fn gap(max: Option<&str>, since: Option<&str>) -> NotificationSlot {
        NotificationSlot::Gap(NotificationGap {
            max_id: max.map(NotificationId::new),
            since_id: since.map(NotificationId::new),
        })
    }

    // ── Timeline gap collapse ───────────────────────────────────────────

    #[test]
    fn test_collapse_gaps_keeps_first_of_run() {
        let mut slots = vec![
            TimelineSlot::status("10"),
            TimelineSlot::gap(),
            TimelineSlot::seed_gap(),
            TimelineSlot::gap(),
            TimelineSlot::status("5"),
            TimelineSlot::gap(),
        ];
        collapse_gaps(&mut slots);
        assert_eq!(
            slots,
            vec![
                TimelineSlot::status("10"),
                TimelineSlot::gap(),
                TimelineSlot::status("5"),
                TimelineSlot::gap(),
            ]
        );
    }

    #[test]
    fn test_collapse_gaps_noop_when_clean() {
        let mut slots = vec![TimelineSlot::gap(), TimelineSlot::status("3")];
        let before = slots.clone();
        collapse_gaps(&mut slots);
        assert_eq!(slots, before);
    }

    // ── Notification gap merge ──────────────────────────────────────────

    #[test]
    fn test_merge_gaps_takes_outer_bounds() {
        let mut slots = vec![
            group("a", "90", "95"),
            gap(Some("90"), Some("70")),
            gap(Some("69"), Some("40")),
            gap(None, Some("10")),
            group("b", "5", "9"),
        ];
        merge_gaps(&mut slots);
        assert_eq!(
            slots,
            vec![
                group("a", "90", "95"),
                gap(Some("90"), Some("10")),
                group("b", "5", "9"),
            ]
        );
    }

    #[test]
    fn test_merge_gaps_around_only_touches_neighbors() {
        let mut slots = vec![
            gap(Some("99"), Some("80")),
            gap(Some("79"), Some("60")),
            group("a", "10", "20"),
        ];
        merge_gaps_around(&mut slots, 1);
        assert_eq!(
            slots,
            vec![gap(Some("99"), Some("60")), group("a", "10", "20")]
        );

        // Out-of-range indexes are ignored
        merge_gaps_around(&mut slots, 0);
        merge_gaps_around(&mut slots, 5);
        assert_eq!(slots.len(), 2);
    }

    // ── Leading/trailing gap maintenance ────────────────────────────────

    #[test]
    fn test_ensure_leading_gap_prepends_below_first_group() {
        let mut slots = vec![group("a", "50", "60")];
        let lead = ensure_leading_gap(&mut slots);
        assert_eq!(lead.max_id, None);
        assert_eq!(lead.since_id, Some(NotificationId::new("50")));
        assert!(slots[0].is_gap());
    }

    #[test]
    fn test_ensure_leading_gap_reuses_and_opens_existing() {
        let mut slots = vec![gap(Some("99"), Some("40")), group("a", "10", "20")];
        let lead = ensure_leading_gap(&mut slots);
        assert_eq!(lead.max_id, None);
        assert_eq!(lead.since_id, Some(NotificationId::new("40")));
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn test_ensure_trailing_gap_appends_below_last_group() {
        let mut slots = vec![group("a", "50", "60")];
        let tail = ensure_trailing_gap(&mut slots);
        assert_eq!(tail.max_id, Some(NotificationId::new("50")));
        assert_eq!(tail.since_id, None);
        assert!(slots.last().unwrap().is_gap());
    }

    #[test]
    fn test_ensure_trailing_gap_opens_existing() {
        let mut slots = vec![group("a", "50", "60"), gap(Some("49"), Some("10"))];
        let tail = ensure_trailing_gap(&mut slots);
        assert_eq!(tail.since_id, None);
        assert_eq!(tail.max_id, Some(NotificationId::new("49")));
        assert_eq!(slots.len(), 2);
    }
}
