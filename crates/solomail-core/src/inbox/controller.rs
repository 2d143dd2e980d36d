//! Inbox fetch orchestration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use solomail_graph::{MailGateway, Message, MessagePage};
use tracing::debug;

use super::cache::InboxCache;

/// The gateway seam the controller fetches through.
///
/// [`MailGateway`] implements it; tests substitute a scripted fake.
#[allow(async_fn_in_trait)]
pub trait MailApi {
    /// Fetches one inbox page; `page_url` is the continuation cursor, or
    /// `None` for the first page.
    async fn list_inbox(
        &self,
        token: &str,
        page_url: Option<&str>,
    ) -> solomail_graph::Result<MessagePage>;
}

impl MailApi for MailGateway {
    async fn list_inbox(
        &self,
        token: &str,
        page_url: Option<&str>,
    ) -> solomail_graph::Result<MessagePage> {
        Self::list_inbox(self, token, page_url).await
    }
}

/// Outcome of a fetch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Load {
    /// A page was fetched and applied.
    Loaded {
        /// Messages appended by this fetch.
        fetched: usize,
        /// Cache size afterwards.
        total: usize,
    },
    /// The request was dropped without a network call.
    Skipped(SkipReason),
}

/// Why a fetch request was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another fetch is already outstanding.
    InFlight,
    /// The server reported no further pages.
    NoMore,
    /// No continuation cursor is available.
    NoCursor,
    /// The cache reached its capacity bound.
    Full,
}

/// Drives a bounded [`InboxCache`] against a [`MailApi`].
///
/// One instance per screen; methods take `&self` so the owning task and
/// short-lived helpers can share it. The internal lock is only held for
/// synchronous state transitions, never across a network await, and a
/// single in-flight slot drops concurrent triggers instead of queueing
/// them.
#[derive(Debug)]
pub struct InboxController<G> {
    gateway: G,
    cache: Mutex<InboxCache>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the fetch completes or its future is
/// dropped, so the controller re-arms either way.
struct InFlightSlot<'a>(&'a AtomicBool);

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<G: MailApi> InboxController<G> {
    /// Creates a controller with an empty cache.
    pub const fn new(gateway: G, capacity: usize) -> Self {
        Self {
            gateway,
            cache: Mutex::new(InboxCache::new(capacity)),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Clears the cache, cursor and has-more flag, then fetches page one.
    ///
    /// The reset happens before the network call is issued, so the stale
    /// list is gone even if the fetch never completes. A refresh arriving
    /// while another fetch is outstanding is dropped.
    ///
    /// # Errors
    ///
    /// Propagates the gateway error; the (already reset) cache is left as
    /// is and a later retry is possible.
    pub async fn refresh(&self, token: &str) -> solomail_graph::Result<Load> {
        let Some(_slot) = self.try_claim_slot() else {
            return Ok(Load::Skipped(SkipReason::InFlight));
        };

        self.lock_cache().reset();
        debug!("Refreshing inbox");

        let page = self.gateway.list_inbox(token, None).await?;
        Ok(self.apply(page))
    }

    /// Fetches the next page with the current cursor.
    ///
    /// Dropped without a network call when a fetch is already outstanding,
    /// when the server reported no more, or when no cursor is available.
    /// A cache that already reached its bound forces has-more off and
    /// skips.
    ///
    /// # Errors
    ///
    /// Propagates the gateway error; the cache is untouched and a later
    /// retry is possible.
    pub async fn load_more(&self, token: &str) -> solomail_graph::Result<Load> {
        let Some(_slot) = self.try_claim_slot() else {
            return Ok(Load::Skipped(SkipReason::InFlight));
        };

        let cursor = {
            let mut cache = self.lock_cache();
            if cache.is_full() {
                cache.force_no_more();
                return Ok(Load::Skipped(SkipReason::Full));
            }
            if !cache.has_more() {
                return Ok(Load::Skipped(SkipReason::NoMore));
            }
            match cache.cursor() {
                Some(cursor) => cursor.to_string(),
                None => return Ok(Load::Skipped(SkipReason::NoCursor)),
            }
        };

        debug!("Loading more inbox messages");
        let page = self.gateway.list_inbox(token, Some(&cursor)).await?;
        Ok(self.apply(page))
    }

    fn apply(&self, page: MessagePage) -> Load {
        let mut cache = self.lock_cache();
        let before = cache.len();
        cache.apply_page(page);
        let total = cache.len();
        debug!(fetched = total - before, total, "Applied inbox page");
        Load::Loaded {
            fetched: total - before,
            total,
        }
    }

    /// Snapshot of the cached messages in server order.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.lock_cache().messages().to_vec()
    }

    /// Number of cached messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_cache().len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_cache().is_empty()
    }

    /// Whether another page should be fetched.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.lock_cache().has_more()
    }

    /// The current continuation cursor, if any.
    #[must_use]
    pub fn cursor(&self) -> Option<String> {
        self.lock_cache().cursor().map(str::to_string)
    }

    fn try_claim_slot(&self) -> Option<InFlightSlot<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
            .then(|| InFlightSlot(&self.in_flight))
    }

    fn lock_cache(&self) -> MutexGuard<'_, InboxCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use solomail_graph::Error;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

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

    enum Step {
        Page(MessagePage),
        Fail(Error),
        /// Signals `started`, then waits for `release` before returning.
        Block(MessagePage),
    }

    #[derive(Clone, Default)]
    struct FakeApi(Arc<FakeInner>);

    #[derive(Default)]
    struct FakeInner {
        calls: AtomicUsize,
        last_page_url: Mutex<Option<Option<String>>>,
        script: Mutex<VecDeque<Step>>,
        started: Notify,
        release: Notify,
    }

    impl FakeApi {
        fn script(&self, step: Step) -> &Self {
            self.0.script.lock().unwrap().push_back(step);
            self
        }

        fn calls(&self) -> usize {
            self.0.calls.load(Ordering::Relaxed)
        }

        fn last_page_url(&self) -> Option<Option<String>> {
            self.0.last_page_url.lock().unwrap().clone()
        }
    }

    impl MailApi for FakeApi {
        async fn list_inbox(
            &self,
            _token: &str,
            page_url: Option<&str>,
        ) -> solomail_graph::Result<MessagePage> {
            self.0.calls.fetch_add(1, Ordering::Relaxed);
            *self.0.last_page_url.lock().unwrap() = Some(page_url.map(str::to_string));
            let step = self
                .0
                .script
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted gateway call");
            match step {
                Step::Page(page) => Ok(page),
                Step::Fail(error) => Err(error),
                Step::Block(page) => {
                    self.0.started.notify_one();
                    self.0.release.notified().await;
                    Ok(page)
                }
            }
        }
    }

    #[tokio::test]
    async fn refresh_loads_first_page() {
        let api = FakeApi::default();
        api.script(Step::Page(page(25, Some("cursor-1"))));
        let controller = InboxController::new(api.clone(), 200);

        let load = controller.refresh("token").await.unwrap();
        assert_eq!(
            load,
            Load::Loaded {
                fetched: 25,
                total: 25
            }
        );
        assert_eq!(controller.len(), 25);
        assert!(controller.has_more());
        // First page is requested without a cursor.
        assert_eq!(api.last_page_url(), Some(None));
    }

    #[tokio::test]
    async fn load_more_appends_next_page() {
        let api = FakeApi::default();
        api.script(Step::Page(page(25, Some("cursor-1"))))
            .script(Step::Page(page(10, None)));
        let controller = InboxController::new(api.clone(), 200);

        controller.refresh("token").await.unwrap();
        let load = controller.load_more("token").await.unwrap();

        assert_eq!(
            load,
            Load::Loaded {
                fetched: 10,
                total: 35
            }
        );
        assert!(!controller.has_more());
        // The continuation URL went out verbatim.
        assert_eq!(api.last_page_url(), Some(Some("cursor-1".to_string())));
    }

    #[tokio::test]
    async fn refresh_resets_state_before_fetch() {
        let api = FakeApi::default();
        api.script(Step::Page(page(25, Some("cursor-1"))))
            .script(Step::Fail(Error::Network("connection reset".into())));
        let controller = InboxController::new(api.clone(), 200);

        controller.refresh("token").await.unwrap();
        assert_eq!(controller.len(), 25);

        // The second refresh fails at the network, but the reset already
        // happened: stale contents are gone.
        let err = controller.refresh("token").await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
        assert_eq!(controller.len(), 0);
        assert!(controller.cursor().is_none());
        assert!(!controller.has_more());

        // And the slot was released, so a retry works.
        api.script(Step::Page(page(5, None)));
        controller.refresh("token").await.unwrap();
        assert_eq!(controller.len(), 5);
    }

    #[tokio::test]
    async fn load_more_error_leaves_cache_untouched() {
        let api = FakeApi::default();
        api.script(Step::Page(page(25, Some("cursor-1"))))
            .script(Step::Fail(Error::Api {
                status: 500,
                message: "oops".into(),
            }));
        let controller = InboxController::new(api.clone(), 200);

        controller.refresh("token").await.unwrap();
        let err = controller.load_more("token").await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 500, .. }));

        assert_eq!(controller.len(), 25);
        assert_eq!(controller.cursor().as_deref(), Some("cursor-1"));
        assert!(controller.has_more());

        // Retry after the error succeeds.
        api.script(Step::Page(page(10, None)));
        let load = controller.load_more("token").await.unwrap();
        assert_eq!(
            load,
            Load::Loaded {
                fetched: 10,
                total: 35
            }
        );
    }

    #[tokio::test]
    async fn load_more_skips_without_cursor_or_more() {
        let api = FakeApi::default();
        let controller = InboxController::new(api.clone(), 200);

        // Nothing fetched yet: no cursor, no has-more.
        let load = controller.load_more("token").await.unwrap();
        assert_eq!(load, Load::Skipped(SkipReason::NoMore));

        // Last page consumed: server reported no more.
        api.script(Step::Page(page(10, None)));
        controller.refresh("token").await.unwrap();
        let load = controller.load_more("token").await.unwrap();
        assert_eq!(load, Load::Skipped(SkipReason::NoMore));

        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn full_cache_forces_no_more_without_network_call() {
        let api = FakeApi::default();
        api.script(Step::Page(page(30, Some("cursor-1"))));
        let controller = InboxController::new(api.clone(), 30);

        controller.refresh("token").await.unwrap();
        assert_eq!(controller.len(), 30);

        let load = controller.load_more("token").await.unwrap();
        assert!(matches!(
            load,
            Load::Skipped(SkipReason::Full | SkipReason::NoMore)
        ));
        assert!(!controller.has_more());
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_load_more_is_dropped() {
        let api = FakeApi::default();
        api.script(Step::Page(page(25, Some("cursor-1"))))
            .script(Step::Block(page(10, None)));
        let controller = Arc::new(InboxController::new(api.clone(), 200));

        controller.refresh("token").await.unwrap();

        let first = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.load_more("token").await }
        });

        // Wait until the first load is parked inside the gateway.
        api.0.started.notified().await;

        // The second trigger is dropped, not queued.
        let second = controller.load_more("token").await.unwrap();
        assert_eq!(second, Load::Skipped(SkipReason::InFlight));

        api.0.release.notify_one();
        let load = first.await.unwrap().unwrap();
        assert_eq!(
            load,
            Load::Loaded {
                fetched: 10,
                total: 35
            }
        );

        // Exactly one network call for the two load-more triggers.
        assert_eq!(api.calls(), 2);
    }
}
