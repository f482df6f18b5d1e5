use dashmap::DashSet;

use crate::catalog::{RefKey, ReferenceKind};

/// Kinds worth remembering across imports of one batch: people recur across
/// shows and episodes, networks across shows.
const MEMOIZED: [ReferenceKind; 3] = [
    ReferenceKind::Creator,
    ReferenceKind::Credit,
    ReferenceKind::Network,
];

/// Advisory record of reference rows known to be committed, shared by the
/// imports of one batch job.
///
/// A hit lets the reconciler skip the existence lookup for that key. Keys are
/// recorded only after the import that produced or saw them has committed, so
/// a rolled back import never leaves entries behind. Dropping the memo, or not
/// passing one, changes nothing but the number of lookups.
#[derive(Debug, Default)]
pub struct ImportMemo {
    known: DashSet<(ReferenceKind, RefKey)>,
    capacity: Option<usize>,
}

impl ImportMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memo that clears itself once it holds more than `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            known: DashSet::new(),
            capacity: Some(capacity),
        }
    }

    pub fn tracks(kind: ReferenceKind) -> bool {
        MEMOIZED.contains(&kind)
    }

    pub fn contains(&self, kind: ReferenceKind, key: &RefKey) -> bool {
        Self::tracks(kind) && self.known.contains(&(kind, key.clone()))
    }

    pub fn record<I>(&self, kind: ReferenceKind, keys: I)
    where
        I: IntoIterator<Item = RefKey>,
    {
        if !Self::tracks(kind) {
            return;
        }
        for key in keys {
            self.known.insert((kind, key));
        }
        if let Some(capacity) = self.capacity
            && self.known.len() > capacity
        {
            self.known.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_tracked_kinds_are_recorded() {
        let memo = ImportMemo::new();
        memo.record(ReferenceKind::Genre, [RefKey::Id(18)]);
        memo.record(ReferenceKind::Credit, [RefKey::Id(7)]);

        assert!(!memo.contains(ReferenceKind::Genre, &RefKey::Id(18)));
        assert!(memo.contains(ReferenceKind::Credit, &RefKey::Id(7)));
        assert!(!memo.contains(ReferenceKind::Creator, &RefKey::Id(7)));
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn clears_past_capacity() {
        let memo = ImportMemo::with_capacity(2);
        memo.record(ReferenceKind::Network, [RefKey::Id(1), RefKey::Id(2)]);
        assert_eq!(memo.len(), 2);
        memo.record(ReferenceKind::Network, [RefKey::Id(3)]);
        assert!(memo.is_empty());
    }
}
