//! The top-level feed cache: every timeline window, the notification group
//! store, and the reply graph behind one event-dispatch surface.
//!
//! All mutation flows through [`FeedCache::apply`] with a [`CacheEvent`], so
//! cross-store consequences (deletion cascades, severed relationships, the
//! home stream dropping) happen in one place and cannot be half-applied.

use std::collections::HashMap;

use rookery_types::{
    AccountId, ContextPage, FeedKey, GapFill, Notification, NotificationId, NotificationPage,
    NotificationType, RecentNotifications, RelationshipEvent, StatusDeletion, StatusId,
    StatusThread, TimelinePage,
};

use crate::context::{ThreadIndex, ThreadIndexSnapshot};
use crate::notifications::{NotificationFeed, NotificationFeedSnapshot};
use crate::timeline::{Timeline, TimelineSnapshot};

/// Everything that can happen to the cache.
#[derive(Clone, Debug)]
pub enum CacheEvent {
    /// A timeline fetch started.
    TimelineLoading { key: FeedKey },
    /// A timeline fetch was rejected.
    TimelineFetchFailed { key: FeedKey },
    /// A fetched timeline page to merge into its window.
    TimelineExpanded { key: FeedKey, page: TimelinePage },
    /// One status streamed into a timeline.
    StatusStreamed {
        key: FeedKey,
        status: StatusId,
        use_pending: bool,
    },
    /// Flush a timeline's pending buffer into its visible window.
    TimelinePendingLoaded { key: FeedKey },
    /// The timeline view scrolled to or away from the top.
    TimelineScrolled { key: FeedKey, top: bool },
    /// Drop a timeline's cached content.
    TimelineCleared { key: FeedKey },
    /// The streaming connection behind a timeline dropped.
    StreamDisconnected { key: FeedKey, use_pending: bool },
    /// The streaming connection behind a timeline came back.
    StreamReconnected { key: FeedKey, use_pending: bool },

    /// A status was deleted; cascades through every store.
    StatusDeleted(StatusDeletion),
    /// A block, notification-mute, or domain block severed a relationship.
    RelationshipSevered(RelationshipEvent),

    /// A thread context was fetched around one status.
    ContextFetched(ContextPage),
    /// A new status arrived with its reply parent.
    StatusAdded(StatusThread),
    /// A status was edited; its reply parent is authoritative.
    StatusUpdated(StatusThread),

    /// Notification fetch started.
    NotificationsLoading,
    /// Notification fetch was rejected.
    NotificationsFetchFailed,
    /// A full notification page replacing the group sequence.
    NotificationsFetched(NotificationPage),
    /// The result of fetching into one notification gap.
    NotificationGapFilled(GapFill),
    /// A poll for notifications newer than the cached head.
    NotificationsPolled(RecentNotifications),
    /// One notification streamed in live.
    NotificationStreamed {
        notification: Notification,
        grouped_types: Vec<NotificationType>,
        use_pending: bool,
    },
    /// Flush the pending notification buffer.
    NotificationsPendingLoaded,
    /// The notification view scrolled to or away from the top.
    NotificationsScrolled { top: bool },
    /// Drop all cached notifications.
    NotificationsCleared,
    /// A notification list mounted or unmounted.
    NotificationsMounted,
    NotificationsUnmounted,
    /// The browser tab gained or lost visibility.
    TabVisibilityChanged { visible: bool },
    /// The user explicitly marked all notifications read.
    NotificationsMarkedRead,
    /// A server-side read marker was fetched.
    MarkerFetched(NotificationId),
    /// Server-side regrouping invalidated the merged notification history.
    NotificationsStale,
}

/// The whole client-side feed cache.
#[derive(Clone, Debug, Default)]
pub struct FeedCache {
    timelines: HashMap<FeedKey, Timeline>,
    notifications: NotificationFeed,
    threads: ThreadIndex,
}

impl FeedCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event, with all of its cross-store consequences.
    pub fn apply(&mut self, event: CacheEvent) {
        match event {
            CacheEvent::TimelineLoading { key } => self.timeline_mut(&key).start_loading(),
            CacheEvent::TimelineFetchFailed { key } => self.timeline_mut(&key).fetch_failed(),
            CacheEvent::TimelineExpanded { key, page } => self.timeline_mut(&key).expand(&page),
            CacheEvent::StatusStreamed {
                key,
                status,
                use_pending,
            } => self.timeline_mut(&key).push_status(&status, use_pending),
            CacheEvent::TimelinePendingLoaded { key } => self.timeline_mut(&key).load_pending(),
            CacheEvent::TimelineScrolled { key, top } => self.timeline_mut(&key).set_top(top),
            CacheEvent::TimelineCleared { key } => self.timeline_mut(&key).clear(),
            CacheEvent::StreamDisconnected { key, use_pending } => {
                self.timeline_mut(&key).disconnect();
                // Notifications ride the home stream.
                if key == FeedKey::home() {
                    self.notifications.disconnect(use_pending);
                }
            }
            CacheEvent::StreamReconnected { key, use_pending } => {
                self.timeline_mut(&key).reconnect(use_pending);
            }

            CacheEvent::StatusDeleted(deletion) => {
                self.cascade_delete(&deletion.id, &deletion.references, None);
            }
            CacheEvent::RelationshipSevered(event) => self.sever_relationship(&event),

            CacheEvent::ContextFetched(page) => self.threads.ingest(&page),
            CacheEvent::StatusAdded(thread) => self.threads.add_status(&thread),
            CacheEvent::StatusUpdated(thread) => self.threads.update_status(&thread),

            CacheEvent::NotificationsLoading => self.notifications.start_loading(),
            CacheEvent::NotificationsFetchFailed => self.notifications.fetch_failed(),
            CacheEvent::NotificationsFetched(page) => self.notifications.replace(&page),
            CacheEvent::NotificationGapFilled(fill) => self.notifications.fill_gap(&fill),
            CacheEvent::NotificationsPolled(poll) => self.notifications.poll_recent(&poll),
            CacheEvent::NotificationStreamed {
                notification,
                grouped_types,
                use_pending,
            } => self
                .notifications
                .push_notification(&notification, &grouped_types, use_pending),
            CacheEvent::NotificationsPendingLoaded => self.notifications.load_pending(),
            CacheEvent::NotificationsScrolled { top } => {
                self.notifications.set_scrolled_to_top(top);
            }
            CacheEvent::NotificationsCleared => self.notifications.clear(),
            CacheEvent::NotificationsMounted => self.notifications.mount(),
            CacheEvent::NotificationsUnmounted => self.notifications.unmount(),
            CacheEvent::TabVisibilityChanged { visible } => {
                self.notifications.set_tab_visible(visible);
            }
            CacheEvent::NotificationsMarkedRead => self.notifications.mark_all_read(),
            CacheEvent::MarkerFetched(marker) => self.notifications.merge_marker(&marker),
            CacheEvent::NotificationsStale => self.notifications.defer_refresh(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The timeline cached under `key`, if any fetch or stream touched it.
    pub fn timeline(&self, key: &FeedKey) -> Option<&Timeline> {
        self.timelines.get(key)
    }

    /// The timeline under `key`, created empty on first touch.
    pub fn timeline_mut(&mut self, key: &FeedKey) -> &mut Timeline {
        self.timelines.entry(key.clone()).or_default()
    }

    /// Keys of every cached timeline.
    pub fn timeline_keys(&self) -> impl Iterator<Item = &FeedKey> {
        self.timelines.keys()
    }

    /// The notification group store.
    pub fn notifications(&self) -> &NotificationFeed {
        &self.notifications
    }

    /// Mutable access to the notification group store.
    pub fn notifications_mut(&mut self) -> &mut NotificationFeed {
        &mut self.notifications
    }

    /// The reply graph.
    pub fn threads(&self) -> &ThreadIndex {
        &self.threads
    }

    /// Owned snapshot of one timeline window.
    pub fn timeline_snapshot(&self, key: &FeedKey) -> Option<TimelineSnapshot> {
        self.timelines.get(key).map(Timeline::snapshot)
    }

    /// Owned snapshot of the notification store.
    pub fn notification_snapshot(&self) -> NotificationFeedSnapshot {
        self.notifications.snapshot()
    }

    /// Owned snapshot of the reply graph.
    pub fn thread_snapshot(&self) -> ThreadIndexSnapshot {
        self.threads.snapshot()
    }

    // =========================================================================
    // Cascades
    // =========================================================================

    /// Delete one status everywhere: referencing statuses first (depth
    /// first), then the status itself from the reply graph, every timeline
    /// window, and the notification store.
    ///
    /// `exclude_account` skips that account's own feeds, which are about to
    /// disappear wholesale anyway when a relationship is severed.
    fn cascade_delete(
        &mut self,
        id: &StatusId,
        references: &[StatusId],
        exclude_account: Option<&AccountId>,
    ) {
        for reference in references {
            // References of references are not tracked; recursion bottoms
            // out one level down.
            self.cascade_delete(reference, &[], exclude_account);
        }

        tracing::debug!(status = %id, "cascading status deletion");
        self.threads.remove(std::slice::from_ref(id));

        for (key, timeline) in &mut self.timelines {
            if let Some(account) = exclude_account
                && key.belongs_to(account)
            {
                continue;
            }
            timeline.delete_status(id);
        }

        self.notifications.remove_for_status(id);
    }

    /// A relationship was severed: delete everything the other account
    /// authored (and every cached reblog of it), then scrub the account out
    /// of notification groups.
    fn sever_relationship(&mut self, event: &RelationshipEvent) {
        for status in &event.statuses {
            if status.account_id != event.relationship_id {
                continue;
            }
            let references: Vec<StatusId> = event
                .statuses
                .iter()
                .filter(|other| other.reblog_of.as_ref() == Some(&status.id))
                .map(|other| other.id.clone())
                .collect();
            self.cascade_delete(&status.id, &references, Some(&event.relationship_id));
        }

        self.notifications
            .remove_for_accounts(&[event.relationship_id.clone()], None);
    }
}

// ============================================================================
// Tests
// ============================================================================
