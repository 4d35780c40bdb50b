//! Indexer configuration.

/// Default number of messages per batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Configuration for an [`crate::Indexer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerOptions {
    /// Key prefix scoping the indexer to a sub-tree. Empty indexes
    /// everything.
    pub prefix: String,
    /// Maximum number of messages per batch delivered to the mapping
    /// function.
    pub batch_size: usize,
    /// Re-run automatically on trie change notifications.
    pub live: bool,
    /// Include entries the trie marks hidden.
    pub hidden: bool,
    /// Attach `previous_value` to messages whose entry has a before side.
    /// When disabled the before side is never decoded.
    pub transform_node: bool,
}

impl Default for IndexerOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            live: true,
            hidden: false,
            transform_node: true,
        }
    }
}

impl IndexerOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scopes the indexer to keys under `prefix`.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the maximum batch size. Values below 1 are clamped to 1.
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Enables or disables live re-runs on change notifications.
    #[must_use]
    pub fn live(mut self, live: bool) -> Self {
        self.live = live;
        self
    }

    /// Includes hidden entries in diffs.
    #[must_use]
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Enables or disables previous-value attachment.
    #[must_use]
    pub fn transform_node(mut self, transform_node: bool) -> Self {
        self.transform_node = transform_node;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = IndexerOptions::default();
        assert_eq!(options.prefix, "");
        assert_eq!(options.batch_size, DEFAULT_BATCH_SIZE);
        assert!(options.live);
        assert!(!options.hidden);
        assert!(options.transform_node);
    }

    #[test]
    fn builder_chain() {
        let options = IndexerOptions::new()
            .prefix("take")
            .batch_size(0)
            .live(false)
            .hidden(true)
            .transform_node(false);
        assert_eq!(options.prefix, "take");
        assert_eq!(options.batch_size, 1);
        assert!(!options.live);
        assert!(options.hidden);
        assert!(!options.transform_node);
    }
}
