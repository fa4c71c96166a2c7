use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::card::Card;
use crate::normalize::normalize_card_row;
use crate::source::CardSource;

pub const PAGE_LIMIT: usize = 50;
pub const MAX_FETCH_RETRIES: u32 = 1;
pub const RETRY_DELAY: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    pub limit: usize,
    /// Extra attempts after the first failure.
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            limit: PAGE_LIMIT,
            max_retries: MAX_FETCH_RETRIES,
            retry_delay: RETRY_DELAY,
        }
    }
}

/// What the presentation layer gets to see.
#[derive(Debug, Clone, PartialEq)]
pub struct CardsState {
    pub cards: Vec<Card>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for CardsState {
    fn default() -> Self {
        Self {
            cards: Vec::new(),
            is_loading: true,
            error: None,
        }
    }
}

/// Loads the published deck and keeps [`CardsState`] current.
///
/// At most one fetch sequence is active. [`CardFeed::retry`] cancels the
/// running sequence before starting a new one, and dropping the feed cancels
/// whatever is still pending. A cancelled sequence never writes state.
pub struct CardFeed {
    source: Arc<dyn CardSource>,
    policy: FetchPolicy,
    state: Arc<watch::Sender<CardsState>>,
    active: CancellationToken,
}

impl CardFeed {
    /// Starts the first fetch. Must be called from within a tokio runtime.
    pub fn mount(source: Arc<dyn CardSource>, policy: FetchPolicy) -> Self {
        let (state, _) = watch::channel(CardsState::default());
        let mut feed = Self {
            source,
            policy,
            state: Arc::new(state),
            active: CancellationToken::new(),
        };
        feed.start();
        feed
    }

    /// Throws away the running sequence (pending timer included) and fetches again.
    pub fn retry(&mut self) {
        self.start();
    }

    pub fn state(&self) -> CardsState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CardsState> {
        self.state.subscribe()
    }

    /// Waits until the current sequence reaches a terminal state.
    pub async fn settled(&self) -> CardsState {
        let mut rx = self.state.subscribe();
        let result = rx.wait_for(|state| !state.is_loading).await;
        match result {
            Ok(state) => state.clone(),
            // the sender lives as long as `self`, so this is unreachable in practice
            Err(_) => self.state(),
        }
    }

    fn start(&mut self) {
        self.active.cancel();
        self.active = CancellationToken::new();
        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });

        let sequence = FetchSequence {
            source: Arc::clone(&self.source),
            policy: self.policy,
            state: Arc::clone(&self.state),
            token: self.active.clone(),
        };
        tokio::spawn(sequence.run());
    }
}

impl Drop for CardFeed {
    fn drop(&mut self) {
        self.active.cancel();
    }
}

struct FetchSequence {
    source: Arc<dyn CardSource>,
    policy: FetchPolicy,
    state: Arc<watch::Sender<CardsState>>,
    token: CancellationToken,
}

impl FetchSequence {
    async fn run(self) {
        let mut attempt = 0;
        loop {
            let result = tokio::select! {
                biased;
                _ = self.token.cancelled() => return,
                result = self.source.fetch_published(self.policy.limit) => result,
            };

            match result {
                Ok(rows) => {
                    let cards: Vec<Card> = rows.iter().map(normalize_card_row).collect();
                    let count = cards.len();
                    if self.publish(|state| {
                        state.cards = cards;
                        state.error = None;
                        state.is_loading = false;
                    }) {
                        log::info!("loaded {count} cards");
                    }
                    return;
                }
                Err(error) if attempt < self.policy.max_retries => {
                    attempt += 1;
                    log::warn!(
                        "card fetch failed, retrying in {:?} ({attempt}/{}): {error}",
                        self.policy.retry_delay,
                        self.policy.max_retries
                    );
                    tokio::select! {
                        biased;
                        _ = self.token.cancelled() => return,
                        _ = tokio::time::sleep(self.policy.retry_delay) => {}
                    }
                }
                Err(error) => {
                    let message = error.display_message();
                    log::info!("giving up on card fetch after {} attempts: {error}", attempt + 1);
                    self.publish(|state| {
                        state.cards.clear();
                        state.error = Some(message);
                        state.is_loading = false;
                    });
                    return;
                }
            }
        }
    }

    /// Applies `update` unless this sequence has been cancelled. The check runs
    /// under the channel lock so a restart can't interleave with the write.
    fn publish(&self, update: impl FnOnce(&mut CardsState)) -> bool {
        self.state.send_if_modified(|state| {
            if self.token.is_cancelled() {
                return false;
            }
            update(state);
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use futures::future::BoxFuture;
    use futures::FutureExt;
    use serde_json::{json, Value};

    use super::*;
    use crate::error::{SourceError, FALLBACK_FETCH_MESSAGE};

    type Reply = Result<Vec<Value>, SourceError>;

    /// Answers from a script, optionally after a delay. An empty script fails.
    struct ScriptedSource {
        replies: Mutex<VecDeque<(Duration, Reply)>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(replies: Vec<(Duration, Reply)>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CardSource for ScriptedSource {
        fn fetch_published(&self, limit: usize) -> BoxFuture<'_, Reply> {
            assert_eq!(limit, PAGE_LIMIT);
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.replies.lock().unwrap().pop_front();
            async move {
                match next {
                    Some((delay, reply)) => {
                        tokio::time::sleep(delay).await;
                        reply
                    }
                    None => Err(rejected("script exhausted")),
                }
            }
            .boxed()
        }
    }

    fn rejected(message: &str) -> SourceError {
        SourceError::Rejected {
            status: 503,
            message: message.to_owned(),
        }
    }

    fn now(reply: Reply) -> (Duration, Reply) {
        (Duration::ZERO, reply)
    }

    fn rows(terms: &[&str]) -> Vec<Value> {
        terms
            .iter()
            .map(|term| json!({ "id": term, "term_display": term }))
            .collect()
    }

    fn terms(state: &CardsState) -> Vec<&str> {
        state.cards.iter().map(|card| card.term_display.as_str()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_publishes_normalized_cards() {
        let source = ScriptedSource::new(vec![now(Ok(rows(&["Hund", "Katze"])))]);
        let feed = CardFeed::mount(source.clone(), FetchPolicy::default());
        assert!(feed.state().is_loading);

        let state = feed.settled().await;
        assert!(!state.is_loading);
        assert_eq!(state.error, None);
        assert_eq!(terms(&state), vec!["Hund", "Katze"]);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn second_attempt_success_clears_error() {
        let source = ScriptedSource::new(vec![
            now(Err(rejected("boom"))),
            now(Ok(rows(&["Baum"]))),
        ]);
        let started = tokio::time::Instant::now();
        let feed = CardFeed::mount(source.clone(), FetchPolicy::default());

        let state = feed.settled().await;
        assert_eq!(state.error, None);
        assert_eq!(terms(&state), vec!["Baum"]);
        assert_eq!(source.calls(), 2);
        assert!(started.elapsed() >= RETRY_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn two_failures_surface_the_message() {
        let source = ScriptedSource::new(vec![
            now(Err(rejected("first"))),
            now(Err(rejected("permission denied for table cards"))),
        ]);
        let feed = CardFeed::mount(source.clone(), FetchPolicy::default());

        let state = feed.settled().await;
        assert_eq!(
            state,
            CardsState {
                cards: Vec::new(),
                is_loading: false,
                error: Some("permission denied for table cards".to_owned()),
            }
        );
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_failure_uses_fallback_message() {
        let source = ScriptedSource::new(vec![now(Err(rejected(""))), now(Err(rejected(" ")))]);
        let feed = CardFeed::mount(source, FetchPolicy::default());
        let state = feed.settled().await;
        assert_eq!(state.error.as_deref(), Some(FALLBACK_FETCH_MESSAGE));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_retry_clears_previous_cards() {
        let source = ScriptedSource::new(vec![
            now(Ok(rows(&["Hund"]))),
            now(Err(rejected("offline"))),
            now(Err(rejected("still offline"))),
        ]);
        let mut feed = CardFeed::mount(source.clone(), FetchPolicy::default());
        assert_eq!(terms(&feed.settled().await), vec!["Hund"]);

        feed.retry();
        let loading = feed.state();
        assert!(loading.is_loading);
        assert_eq!(terms(&loading), vec!["Hund"]);

        let state = feed.settled().await;
        assert!(state.cards.is_empty());
        assert_eq!(state.error.as_deref(), Some("still offline"));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_cancels_pending_timer() {
        let source = ScriptedSource::new(vec![
            now(Err(rejected("first session"))),
            // would be the first session's second attempt if the timer survived
            now(Err(rejected("second session, attempt one"))),
            now(Ok(rows(&["frisch"]))),
        ]);
        let mut feed = CardFeed::mount(source.clone(), FetchPolicy::default());
        let mut rx = feed.subscribe();

        tokio::time::sleep(RETRY_DELAY / 2).await;
        assert_eq!(source.calls(), 1);
        assert!(feed.state().is_loading);

        feed.retry();
        let state = feed.settled().await;
        assert_eq!(terms(&state), vec!["frisch"]);
        assert_eq!(state.error, None);
        assert_eq!(source.calls(), 3);

        // nothing else shows up once the old timer would have fired
        let _ = rx.borrow_and_update();
        tokio::time::sleep(RETRY_DELAY * 4).await;
        assert!(!rx.has_changed().unwrap());
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_is_never_applied() {
        let source = ScriptedSource::new(vec![
            (Duration::from_secs(5), Ok(rows(&["alt"]))),
            now(Ok(rows(&["neu"]))),
        ]);
        let mut feed = CardFeed::mount(source.clone(), FetchPolicy::default());
        tokio::time::sleep(Duration::from_millis(100)).await;

        feed.retry();
        assert_eq!(terms(&feed.settled().await), vec!["neu"]);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(terms(&feed.state()), vec!["neu"]);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_pending_retry() {
        let source = ScriptedSource::new(vec![
            now(Err(rejected("down"))),
            now(Ok(rows(&["never"]))),
        ]);
        let feed = CardFeed::mount(source.clone(), FetchPolicy::default());
        let rx = feed.subscribe();
        tokio::time::sleep(RETRY_DELAY / 2).await;
        assert_eq!(source.calls(), 1);

        drop(feed);
        tokio::time::sleep(RETRY_DELAY * 2).await;
        assert_eq!(source.calls(), 1);
        assert!(rx.borrow().is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_policy_allows_more_retries() {
        let source = ScriptedSource::new(vec![
            now(Err(rejected("a"))),
            now(Err(rejected("b"))),
            now(Ok(rows(&["drei"]))),
        ]);
        let policy = FetchPolicy {
            max_retries: 2,
            retry_delay: Duration::from_millis(10),
            ..FetchPolicy::default()
        };
        let feed = CardFeed::mount(source.clone(), policy);
        assert_eq!(terms(&feed.settled().await), vec!["drei"]);
        assert_eq!(source.calls(), 3);
    }
}
