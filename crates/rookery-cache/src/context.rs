//! Reply graph: parent links and ordered sibling lists.
//!
//! Two maps are kept in lockstep. `in_reply_to` records each status's
//! parent; `replies` records each status's known children, ascending by id
//! (snowflake order, so oldest first). Only ids live here; the statuses
//! themselves are someone else's problem.

use std::collections::HashMap;

use rookery_types::{ContextPage, StatusId, StatusThread, compare_id};

/// The reply graph store.
#[derive(Clone, Debug, Default)]
pub struct ThreadIndex {
    in_reply_to: HashMap<StatusId, StatusId>,
    replies: HashMap<StatusId, Vec<StatusId>>,
    version: u64,
}

/// Owned copy of the reply graph.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ThreadIndexSnapshot {
    pub in_reply_to: HashMap<StatusId, StatusId>,
    pub replies: HashMap<StatusId, Vec<StatusId>>,
}

impl ThreadIndex {
    /// Create a new empty reply graph.
    pub fn new() -> Self {
        Self::default()
    }

    fn touch(&mut self) {
        self.version += 1;
    }

    /// The known children of `id`, ascending by id.
    pub fn replies_of(&self, id: &StatusId) -> &[StatusId] {
        self.replies.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// The recorded parent of `id`, if any.
    pub fn parent_of(&self, id: &StatusId) -> Option<&StatusId> {
        self.in_reply_to.get(id)
    }

    /// Current store version (bumped on any mutation).
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Take an owned copy of both maps.
    pub fn snapshot(&self) -> ThreadIndexSnapshot {
        ThreadIndexSnapshot {
            in_reply_to: self.in_reply_to.clone(),
            replies: self.replies.clone(),
        }
    }

    /// Ingest a fetched context page: ancestor chain, the focal status, and
    /// every descendant edge.
    pub fn ingest(&mut self, page: &ContextPage) {
        // Ancestors are ordered oldest → nearest, so consecutive entries
        // form parent/child pairs; the last one parents the focal status.
        for pair in page.ancestors.windows(2) {
            self.link(&pair[1].id, &pair[0].id);
        }
        if let Some(nearest) = page.ancestors.last() {
            self.link(&page.status_id, &nearest.id);
        }
        for descendant in &page.descendants {
            if let Some(parent) = &descendant.in_reply_to_id {
                self.link(&descendant.id, parent);
            }
        }
        self.touch();
    }

    /// Record one new status and its reply parent, keeping an existing
    /// parent link if the status was already known.
    pub fn add_status(&mut self, thread: &StatusThread) {
        if let Some(parent) = &thread.in_reply_to_id {
            self.link(&thread.id, parent);
        }
        self.touch();
    }

    /// Record or overwrite a status's reply parent (edit/update path).
    pub fn update_status(&mut self, thread: &StatusThread) {
        if let Some(parent) = &thread.in_reply_to_id {
            self.in_reply_to
                .insert(thread.id.clone(), parent.clone());
            let siblings = self.replies.entry(parent.clone()).or_default();
            if !siblings.contains(&thread.id) {
                insert_sorted(siblings, &thread.id);
            }
        }
        self.touch();
    }

    /// Remove the given statuses from the graph.
    ///
    /// Each removed status is unlinked from its parent's sibling list, and
    /// its own children become orphans (their parent link is dropped, but
    /// the children themselves survive).
    pub fn remove(&mut self, ids: &[StatusId]) {
        for id in ids {
            if let Some(parent) = self.in_reply_to.remove(id)
                && let Some(siblings) = self.replies.get_mut(&parent)
            {
                siblings.retain(|sibling| sibling != id);
                if siblings.is_empty() {
                    self.replies.remove(&parent);
                }
            }
            if let Some(children) = self.replies.remove(id) {
                for child in children {
                    self.in_reply_to.remove(&child);
                }
            }
        }
        self.touch();
    }

    fn link(&mut self, child: &StatusId, parent: &StatusId) {
        // Context fetches may race each other or a streamed insert; the
        // first recorded parent wins, or removal could miss the sibling
        // entry under a parent the link no longer points at.
        if self.in_reply_to.contains_key(child) {
            return;
        }
        self.in_reply_to.insert(child.clone(), parent.clone());
        let siblings = self.replies.entry(parent.clone()).or_default();
        if !siblings.contains(child) {
            insert_sorted(siblings, child);
        }
    }
}

/// Insert `id` after the last sibling smaller than it, keeping the list
/// ascending. Scanned from the back since fresh ids are usually newest.
fn insert_sorted(siblings: &mut Vec<StatusId>, id: &StatusId) {
    let at = siblings
        .iter()
        .rposition(|sibling| compare_id(sibling.as_str(), id.as_str()).is_lt())
        .map(|index| index + 1)
        .unwrap_or(0);
    siblings.insert(at, id.clone());
}

// ============================================================================
// Tests
// ============================================================================
