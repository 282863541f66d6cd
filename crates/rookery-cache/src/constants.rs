//! Engine bounds.
//!
//! Centralizes hardcoded values for easier configuration and documentation.
//! All of these cap client memory — nothing here is ever sent to a server.

/// When a live push lands on a timeline scrolled to top with more than this
/// many cached entries, the window is truncated before the push.
pub const TIMELINE_TRUNCATE_THRESHOLD: usize = 40;

/// How many entries a truncated timeline keeps (the newest ones).
pub const TIMELINE_TRUNCATE_KEEP: usize = 20;

/// How many current entries survive when the pending buffer is spliced in
/// front of a timeline.
pub const LOAD_PENDING_KEEP: usize = 40;

/// Hard cap on the notification group list while scrolled to top. Older
/// groups are dropped from memory, not from the server.
pub const NOTIFICATION_TRIM_LIMIT: usize = 50;

/// Bound on a group's sample of contributing accounts (most-recent-first;
/// `notifications_count` keeps counting past it).
pub const GROUP_SAMPLE_MAX: usize = 8;
