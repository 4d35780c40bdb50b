//! Change entries produced by diff cursors.

/// A single observed change in the trie's history.
///
/// Each entry carries the state of a key immediately before and after one
/// committed write. Which sides are present determines the kind of change:
///
/// - only `after`: the key was inserted
/// - both sides: the key was updated
/// - only `before`: the key was deleted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    /// The trie key that changed.
    pub key: String,
    /// The version at which this change was committed.
    pub version: u64,
    /// The value immediately before this change, if the key existed.
    pub before: Option<Vec<u8>>,
    /// The value immediately after this change. `None` for deletions.
    pub after: Option<Vec<u8>>,
}

impl ChangeEntry {
    /// Creates an insertion entry (no previous value existed).
    pub fn insert(key: impl Into<String>, version: u64, after: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            version,
            before: None,
            after: Some(after),
        }
    }

    /// Creates an update entry (a previous value existed).
    pub fn update(key: impl Into<String>, version: u64, before: Vec<u8>, after: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            version,
            before: Some(before),
            after: Some(after),
        }
    }

    /// Creates a deletion entry.
    pub fn delete(key: impl Into<String>, version: u64, before: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            version,
            before: Some(before),
            after: None,
        }
    }

    /// Returns true if this entry removes the key.
    pub fn is_delete(&self) -> bool {
        self.after.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_kinds() {
        assert!(!ChangeEntry::insert("a", 1, vec![1]).is_delete());
        assert!(!ChangeEntry::update("a", 2, vec![1], vec![2]).is_delete());
        assert!(ChangeEntry::delete("a", 3, vec![2]).is_delete());
    }
}
