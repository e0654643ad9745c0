//! Per-key version history for MVCC reads.
//!
//! Snapshot reads and read-tracking validation both need "the value as of
//! commit point V", and scanning a short newest-first list is cheap
//! compared to copying the whole collection per snapshot.

use std::collections::VecDeque;
use ukv_core::CommitPoint;

/// One committed version of a key: `None` marks a tombstone (the key was
/// deleted at that commit point).
#[derive(Debug, Clone)]
struct Version {
    commit_point: CommitPoint,
    value: Option<Vec<u8>>,
}

/// Newest-first history of every committed value a key has had.
#[derive(Debug, Clone, Default)]
pub struct VersionChain {
    versions: VecDeque<Version>,
}

impl VersionChain {
    /// An empty chain.
    pub fn new() -> Self {
        VersionChain {
            versions: VecDeque::new(),
        }
    }

    /// Record a new version, becoming the chain's latest.
    ///
    /// Callers must only push strictly increasing commit points; the
    /// backend's single global commit-point counter guarantees this.
    pub fn push(&mut self, commit_point: CommitPoint, value: Option<Vec<u8>>) {
        self.versions.push_front(Version { commit_point, value });
    }

    /// The latest value, or `None` if the chain is empty or its newest
    /// entry is a tombstone.
    pub fn latest(&self) -> Option<&[u8]> {
        self.versions.front().and_then(|v| v.value.as_deref())
    }

    /// The commit point of the latest entry, if any.
    pub fn latest_commit_point(&self) -> Option<CommitPoint> {
        self.versions.front().map(|v| v.commit_point)
    }

    /// The value as of `at` (the newest entry with `commit_point <= at`)
    /// together with that entry's own commit point, or `None` if the key
    /// didn't exist yet or was a tombstone at that point.
    ///
    /// The returned commit point is the version's real commit point, not
    /// `at` itself: a snapshot pinned at `at` but reading a key last
    /// written before `at` must report the key's actual last-write point,
    /// since that's what read-tracking validation compares against.
    pub fn at(&self, at: CommitPoint) -> Option<(CommitPoint, &[u8])> {
        self.versions
            .iter()
            .find(|v| v.commit_point <= at)
            .and_then(|v| v.value.as_deref().map(|value| (v.commit_point, value)))
    }

    /// Whether every version in this chain is a tombstone (used to decide
    /// whether a key entry can be pruned from its collection's map).
    pub fn is_all_tombstones(&self) -> bool {
        self.versions.iter().all(|v| v.value.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_reflects_most_recent_push() {
        let mut chain = VersionChain::new();
        chain.push(1, Some(b"a".to_vec()));
        chain.push(2, Some(b"b".to_vec()));
        assert_eq!(chain.latest(), Some(&b"b"[..]));
    }

    #[test]
    fn tombstone_hides_value_at_and_after_its_point() {
        let mut chain = VersionChain::new();
        chain.push(1, Some(b"a".to_vec()));
        chain.push(2, None);
        assert_eq!(chain.at(1), Some((1, &b"a"[..])));
        assert_eq!(chain.at(2), None);
        assert_eq!(chain.latest(), None);
    }

    #[test]
    fn at_returns_value_visible_at_given_commit_point() {
        let mut chain = VersionChain::new();
        chain.push(5, Some(b"old".to_vec()));
        chain.push(10, Some(b"new".to_vec()));
        assert_eq!(chain.at(7), Some((5, &b"old"[..])));
        assert_eq!(chain.at(10), Some((10, &b"new"[..])));
        assert_eq!(chain.at(4), None);
    }

    #[test]
    fn at_reports_the_versions_own_commit_point_not_the_query_point() {
        let mut chain = VersionChain::new();
        chain.push(3, Some(b"only".to_vec()));
        let (commit_point, value) = chain.at(99).unwrap();
        assert_eq!(commit_point, 3);
        assert_eq!(value, b"only");
    }
}
