//! Step-wise consumption of a diff cursor.

use crate::error::IndexResult;
use triedex_trie::{ChangeEntry, DiffCursor};

/// Wraps a diff cursor in a strictly sequential, sticky-terminating pull.
///
/// Once the cursor signals end-of-range, `next` keeps returning `None`
/// without touching the cursor again, so the scheduler can probe for
/// exhaustion at batch boundaries.
pub(crate) struct DiffConsumer {
    cursor: Box<dyn DiffCursor>,
    done: bool,
}

impl DiffConsumer {
    pub(crate) fn new(cursor: Box<dyn DiffCursor>) -> Self {
        Self {
            cursor,
            done: false,
        }
    }

    /// Pulls the next change entry, or `None` once the range is exhausted.
    pub(crate) fn next(&mut self) -> IndexResult<Option<ChangeEntry>> {
        if self.done {
            return Ok(None);
        }
        let entry = self.cursor.next()?;
        if entry.is_none() {
            self.done = true;
        }
        Ok(entry)
    }

    /// Returns true once the range is exhausted.
    pub(crate) fn is_done(&self) -> bool {
        self.done
    }

    /// Returns the cursor's resumable position. Only called mid-range.
    pub(crate) fn checkpoint(&self) -> IndexResult<Vec<u8>> {
        Ok(self.cursor.checkpoint()?)
    }
}
