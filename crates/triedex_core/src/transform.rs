//! Normalization of raw change entries into messages.

use crate::error::{IndexError, IndexResult};
use triedex_codec::ValueCodec;
use triedex_trie::ChangeEntry;

/// The unit delivered to the mapping function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<V> {
    /// The trie key that changed.
    pub key: String,
    /// The version at which the change was committed.
    pub version: u64,
    /// The decoded value. For deletions, the value that was removed.
    pub value: V,
    /// True if the key was removed.
    pub delete: bool,
    /// The value immediately prior to this change, when one existed and
    /// previous-value attachment is enabled.
    pub previous_value: Option<V>,
}

/// Converts a raw change entry into a normalized [`Message`].
///
/// Pure and non-suspending; invoked once per entry before it enters a batch.
///
/// - `after` present: the message carries the decoded `after` value with
///   `delete = false`.
/// - only `before` present: the message carries the decoded `before` value
///   with `delete = true`.
///
/// When `attach_previous` is set, `previous_value` is attached whenever the
/// entry has a `before` side, for updates and deletions alike. When unset,
/// the `before` side is never decoded and `previous_value` stays `None`.
///
/// # Errors
///
/// Returns an error if the codec rejects a payload, or if the entry carries
/// neither side.
pub fn transform_entry<V: Clone>(
    entry: ChangeEntry,
    codec: &dyn ValueCodec<Value = V>,
    attach_previous: bool,
) -> IndexResult<Message<V>> {
    let ChangeEntry {
        key,
        version,
        before,
        after,
    } = entry;

    match (after, before) {
        (Some(after), before) => {
            let previous_value = match before.filter(|_| attach_previous) {
                Some(bytes) => Some(codec.decode(&bytes)?),
                None => None,
            };
            Ok(Message {
                key,
                version,
                value: codec.decode(&after)?,
                delete: false,
                previous_value,
            })
        }
        (None, Some(before)) => {
            let value = codec.decode(&before)?;
            let previous_value = attach_previous.then(|| value.clone());
            Ok(Message {
                key,
                version,
                value,
                delete: true,
                previous_value,
            })
        }
        (None, None) => Err(IndexError::EmptyChange { key }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triedex_codec::BytesCodec;

    #[test]
    fn insertion_has_no_previous_value() {
        let entry = ChangeEntry::insert("a", 1, vec![1]);
        let msg = transform_entry(entry, &BytesCodec::new(), true).unwrap();
        assert_eq!(msg.value, vec![1]);
        assert!(!msg.delete);
        assert_eq!(msg.previous_value, None);
    }

    #[test]
    fn update_attaches_previous_value() {
        let entry = ChangeEntry::update("a", 2, vec![1], vec![2]);
        let msg = transform_entry(entry, &BytesCodec::new(), true).unwrap();
        assert_eq!(msg.value, vec![2]);
        assert!(!msg.delete);
        assert_eq!(msg.previous_value, Some(vec![1]));
    }

    #[test]
    fn deletion_carries_removed_value() {
        let entry = ChangeEntry::delete("a", 3, vec![2]);
        let msg = transform_entry(entry, &BytesCodec::new(), true).unwrap();
        assert_eq!(msg.value, vec![2]);
        assert!(msg.delete);
        assert_eq!(msg.previous_value, Some(vec![2]));
    }

    #[test]
    fn attachment_can_be_disabled() {
        let entry = ChangeEntry::update("a", 2, vec![1], vec![2]);
        let msg = transform_entry(entry, &BytesCodec::new(), false).unwrap();
        assert_eq!(msg.previous_value, None);

        let entry = ChangeEntry::delete("a", 3, vec![2]);
        let msg = transform_entry(entry, &BytesCodec::new(), false).unwrap();
        assert!(msg.delete);
        assert_eq!(msg.previous_value, None);
    }

    #[test]
    fn entry_without_sides_is_rejected() {
        let entry = ChangeEntry {
            key: "a".into(),
            version: 1,
            before: None,
            after: None,
        };
        let err = transform_entry(entry, &BytesCodec::new(), true).unwrap_err();
        assert!(matches!(err, IndexError::EmptyChange { .. }));
    }
}
