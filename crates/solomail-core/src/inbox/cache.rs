//! Inbox cache state.

use solomail_graph::{Message, MessagePage};

/// Ordered in-memory message list with a hard capacity bound.
///
/// Messages keep server order (newest first) and are never reordered.
/// Invariants:
/// - `len() <= capacity()` always
/// - once the cache is full, `has_more()` is false regardless of what the
///   server reported
#[derive(Debug)]
pub struct InboxCache {
    messages: Vec<Message>,
    cursor: Option<String>,
    has_more: bool,
    capacity: usize,
}

impl InboxCache {
    /// Creates an empty cache with the given capacity bound.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            messages: Vec::new(),
            cursor: None,
            has_more: false,
            capacity,
        }
    }

    /// Clears messages, cursor and the has-more flag.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.cursor = None;
        self.has_more = false;
    }

    /// Appends a fetched page, preserving server order.
    ///
    /// Messages beyond the capacity bound are discarded. The cursor is
    /// replaced and has-more recomputed: the server must have reported more
    /// *and* the bound must not be reached.
    pub fn apply_page(&mut self, page: MessagePage) {
        let room = self.capacity.saturating_sub(self.messages.len());
        let mut incoming = page.messages;
        incoming.truncate(room);
        self.messages.extend(incoming);

        self.cursor = page.next_link;
        self.has_more = page.has_more && self.messages.len() < self.capacity;
    }

    /// Forces the has-more flag off.
    pub fn force_no_more(&mut self) {
        self.has_more = false;
    }

    /// Cached messages in server order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of cached messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether the capacity bound is reached.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.messages.len() >= self.capacity
    }

    /// The continuation cursor for the next page, if any.
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Whether another page should be fetched.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    /// The capacity bound.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn message(id: usize) -> Message {
        Message {
            id: format!("msg-{id}"),
            subject: None,
            from: None,
            received_date_time: None,
            body_preview: None,
            body: None,
        }
    }

    fn page(count: usize, next: Option<&str>) -> MessagePage {
        MessagePage {
            messages: (0..count).map(message).collect(),
            next_link: next.map(str::to_string),
            has_more: next.is_some(),
        }
    }

    #[test]
    fn apply_page_appends_in_order() {
        let mut cache = InboxCache::new(100);
        cache.apply_page(page(3, Some("cursor-1")));
        cache.apply_page(page(2, None));

        assert_eq!(cache.len(), 5);
        assert_eq!(cache.messages()[0].id, "msg-0");
        assert_eq!(cache.messages()[3].id, "msg-0");
        assert!(!cache.has_more());
        assert!(cache.cursor().is_none());
    }

    #[test]
    fn cursor_is_replaced_each_page() {
        let mut cache = InboxCache::new(100);
        cache.apply_page(page(5, Some("cursor-1")));
        assert_eq!(cache.cursor(), Some("cursor-1"));
        assert!(cache.has_more());

        cache.apply_page(page(5, Some("cursor-2")));
        assert_eq!(cache.cursor(), Some("cursor-2"));
    }

    #[test]
    fn overflow_is_discarded() {
        let mut cache = InboxCache::new(4);
        cache.apply_page(page(10, Some("cursor-1")));
        assert_eq!(cache.len(), 4);
        assert!(cache.is_full());
    }

    #[test]
    fn has_more_forced_false_at_capacity() {
        let mut cache = InboxCache::new(5);
        // Server says there is more, but the bound is reached.
        cache.apply_page(page(5, Some("cursor-1")));
        assert!(!cache.has_more());
        // The cursor is still recorded; only the flag is forced.
        assert_eq!(cache.cursor(), Some("cursor-1"));
    }

    #[test]
    fn reset_clears_everything() {
        let mut cache = InboxCache::new(10);
        cache.apply_page(page(5, Some("cursor-1")));
        cache.reset();

        assert!(cache.is_empty());
        assert!(cache.cursor().is_none());
        assert!(!cache.has_more());
        assert_eq!(cache.capacity(), 10);
    }

    proptest! {
        /// For any sequence of pages, size is monotonically non-decreasing
        /// and never exceeds capacity; a full cache never reports more.
        #[test]
        fn cache_never_exceeds_capacity(
            capacity in 1_usize..64,
            pages in prop::collection::vec((0_usize..40, any::<bool>()), 0..12),
        ) {
            let mut cache = InboxCache::new(capacity);
            let mut previous_len = 0;

            for (count, server_more) in pages {
                let page = MessagePage {
                    messages: (0..count).map(message).collect(),
                    next_link: server_more.then(|| "cursor".to_string()),
                    has_more: server_more,
                };
                cache.apply_page(page);

                prop_assert!(cache.len() >= previous_len);
                prop_assert!(cache.len() <= capacity);
                if cache.is_full() {
                    prop_assert!(!cache.has_more());
                }
                previous_len = cache.len();
            }
        }
    }
}
