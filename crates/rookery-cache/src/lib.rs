//! Client-side feed cache reconciliation.
//!
//! This crate keeps a client's cached view of server-paginated feeds
//! consistent as pages, live streamed items, deletions, and connection
//! drops interleave. It performs no I/O: callers resolve fetches and
//! streams elsewhere and feed the results in as [`CacheEvent`]s.
//!
//! Three stores cooperate behind [`FeedCache`]:
//!
//! * [`Timeline`] — one ordered window of status ids per feed key, merged
//!   by snowflake order with explicit gap sentinels where coverage is
//!   unknown.
//! * [`NotificationFeed`] — server-aggregated notification groups with
//!   bounded gaps, live folding, and conservative read-marker tracking.
//! * [`ThreadIndex`] — the reply graph: parent links and ordered sibling
//!   lists, scrubbed by the deletion cascade.
//!
//! The unifying invariant: a gap sentinel appears wherever the cache
//! cannot prove contiguity, and never twice in a row.

pub mod cache;
pub mod constants;
pub mod context;
pub mod gap;
pub mod notifications;
pub mod timeline;

pub use cache::{CacheEvent, FeedCache};
pub use context::{ThreadIndex, ThreadIndexSnapshot};
pub use notifications::{MergedState, NotificationFeed, NotificationFeedSnapshot};
pub use timeline::{Timeline, TimelineSnapshot};

// ============================================================================
// End-to-end tests
// ============================================================================
