//! Per-cover load state machine with lazy start, backoff and fallback.
//!
//! A [`CoverLoader`] is owned by the screen that shows the cover and is only
//! mutated from the app loop. Fetches and backoff timers run as spawned tasks
//! that report back as [`CoverEvent`]s; every event carries the generation it
//! was issued under, so anything left over from a replaced request or a
//! dropped loader is ignored.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use ratatui::layout::Rect;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::domain::entities::{BookId, CoverOptions, ImageRequest, LoadState, Placeholder};
use crate::domain::errors::CoverResult;
use crate::domain::ports::CoverFetchPort;

use super::visibility::VisibilityGate;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Identifies which loader an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoverKey(pub u64);

impl From<BookId> for CoverKey {
    fn from(id: BookId) -> Self {
        Self(id.0)
    }
}

impl std::fmt::Display for CoverKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Completion reported by a loader's background task.
#[derive(Debug)]
pub struct CoverEvent {
    pub key: CoverKey,
    pub generation: u64,
    pub kind: CoverEventKind,
}

#[derive(Debug)]
pub enum CoverEventKind {
    /// A fetch of the loader's current URL finished.
    Fetched(CoverResult<Arc<image::DynamicImage>>),
    /// The backoff delay elapsed.
    RetryDue,
}

/// State changes worth reporting to the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverTransition {
    /// The primary image arrived, `elapsed` after the first attempt.
    Loaded { elapsed: Duration },
    /// Attempt `attempt` failed; the next one starts after `delay`.
    Retrying { attempt: u32, delay: Duration },
    /// Attempts are exhausted and the fallback is in use.
    FailedFallback,
}

type Callback = Box<dyn FnMut() + Send>;

/// Loads one cover.
///
/// Lifecycle: `Pending` until the container is seen, then `Loading`. A
/// failed attempt schedules a retry after `2^attempts` seconds while
/// `attempts < max_attempts`; the next failure after that switches to the
/// fallback URL. `Loaded` and `FailedFallback` are terminal for the current
/// request.
pub struct CoverLoader {
    key: CoverKey,
    request: ImageRequest,
    placeholder: Placeholder,
    gate: VisibilityGate,
    state: LoadState,
    attempts: u32,
    current_url: String,
    generation: u64,
    image: Option<Arc<image::DynamicImage>>,
    started_at: Option<Instant>,
    fetcher: Arc<dyn CoverFetchPort>,
    events_tx: mpsc::UnboundedSender<CoverEvent>,
    fetch_task: Option<JoinHandle<()>>,
    retry_task: Option<JoinHandle<()>>,
    on_load: Option<Callback>,
    on_error: Option<Callback>,
}

impl std::fmt::Debug for CoverLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverLoader")
            .field("key", &self.key)
            .field("state", &self.state)
            .field("attempts", &self.attempts)
            .field("current_url", &self.current_url)
            .finish_non_exhaustive()
    }
}

impl CoverLoader {
    /// Creates a loader. When `options.lazy` is false the first attempt is
    /// issued right away, so this must run inside a tokio runtime.
    #[must_use]
    pub fn new(
        key: CoverKey,
        request: ImageRequest,
        options: &CoverOptions,
        fetcher: Arc<dyn CoverFetchPort>,
        events_tx: mpsc::UnboundedSender<CoverEvent>,
    ) -> Self {
        let mut loader = Self {
            key,
            current_url: request.primary_url().to_string(),
            request,
            placeholder: options.placeholder.clone(),
            gate: VisibilityGate::new(options.lazy)
                .with_threshold(options.threshold)
                .with_margin(options.margin),
            state: LoadState::Pending,
            attempts: 0,
            generation: next_generation(),
            image: None,
            started_at: None,
            fetcher,
            events_tx,
            fetch_task: None,
            retry_task: None,
            on_load: None,
            on_error: None,
        };

        if loader.gate.is_visible() {
            loader.start();
        }
        loader
    }

    /// Called once when the primary image first loads.
    #[must_use]
    pub fn with_on_load(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_load = Some(Box::new(callback));
        self
    }

    /// Called once when attempts are exhausted.
    #[must_use]
    pub fn with_on_error(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub const fn key(&self) -> CoverKey {
        self.key
    }

    #[must_use]
    pub const fn state(&self) -> LoadState {
        self.state
    }

    /// Failed attempts retried so far for the current request.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub const fn request(&self) -> &ImageRequest {
        &self.request
    }

    /// The URL being requested: the primary until fallback, then the fallback.
    #[must_use]
    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    /// The decoded image for the current URL, once available.
    #[must_use]
    pub fn image(&self) -> Option<&Arc<image::DynamicImage>> {
        self.image.as_ref()
    }

    #[must_use]
    pub const fn placeholder(&self) -> &Placeholder {
        &self.placeholder
    }

    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.gate.is_visible()
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Reports the container's position; starts loading the first time it
    /// is close enough to the viewport.
    pub fn observe(&mut self, container: Rect, viewport: Rect) {
        if self.gate.observe(container, viewport) {
            trace!(key = %self.key, "Cover became visible");
            self.start();
        }
    }

    /// Marks the cover visible regardless of geometry.
    pub fn reveal(&mut self) {
        if self.gate.reveal() {
            self.start();
        }
    }

    /// Replaces the request when the primary URL changed.
    ///
    /// Pending timers and in-flight fetches of the old request are dropped,
    /// attempts restart from zero and loading resumes if the cover was
    /// already visible. Returns false if the primary URL is unchanged.
    pub fn replace_request(&mut self, request: ImageRequest) -> bool {
        if request.primary_url() == self.request.primary_url() {
            return false;
        }

        debug!(
            key = %self.key,
            from = %self.request.primary_url(),
            to = %request.primary_url(),
            "Cover URL changed"
        );

        self.abort_tasks();
        self.generation = next_generation();
        self.current_url = request.primary_url().to_string();
        self.request = request;
        self.attempts = 0;
        self.image = None;
        self.started_at = None;
        self.state = LoadState::Pending;

        if self.gate.is_visible() {
            self.start();
        }
        true
    }

    /// Applies a background completion.
    ///
    /// Events for another loader or an older generation are ignored, as is
    /// anything arriving after a terminal state except the one fallback fetch.
    pub fn handle_event(&mut self, event: CoverEvent) -> Option<CoverTransition> {
        if event.key != self.key || event.generation != self.generation {
            trace!(
                key = %event.key,
                generation = event.generation,
                current = self.generation,
                "Ignoring stale cover event"
            );
            return None;
        }

        match (self.state, event.kind) {
            (LoadState::Loading, CoverEventKind::Fetched(Ok(image))) => {
                self.fetch_task = None;
                Some(self.on_loaded(image))
            }
            (LoadState::Loading, CoverEventKind::Fetched(Err(e))) => {
                self.fetch_task = None;
                if self.attempts < self.request.max_attempts() {
                    let delay = backoff_delay(self.attempts);
                    self.attempts += 1;
                    self.state = LoadState::Retrying;
                    debug!(
                        key = %self.key,
                        attempt = self.attempts,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "Cover fetch failed, retrying"
                    );
                    self.schedule_retry(delay);
                    Some(CoverTransition::Retrying {
                        attempt: self.attempts,
                        delay,
                    })
                } else {
                    warn!(
                        key = %self.key,
                        url = %self.request.primary_url(),
                        attempts = self.attempts + 1,
                        error = %e,
                        "Cover failed, using fallback"
                    );
                    Some(self.on_exhausted())
                }
            }
            (LoadState::Retrying, CoverEventKind::RetryDue) => {
                self.retry_task = None;
                self.state = LoadState::Loading;
                self.spawn_fetch();
                None
            }
            (LoadState::FailedFallback, CoverEventKind::Fetched(result)) => {
                self.fetch_task = None;
                match result {
                    Ok(image) => self.image = Some(image),
                    Err(e) => debug!(key = %self.key, error = %e, "Fallback cover unavailable"),
                }
                None
            }
            (state, kind) => {
                trace!(key = %self.key, %state, ?kind, "Cover event has no effect");
                None
            }
        }
    }

    fn start(&mut self) {
        if self.state != LoadState::Pending {
            return;
        }
        self.state = LoadState::Loading;
        self.started_at = Some(Instant::now());
        self.spawn_fetch();
    }

    fn on_loaded(&mut self, image: Arc<image::DynamicImage>) -> CoverTransition {
        self.state = LoadState::Loaded;
        self.image = Some(image);
        let elapsed = self
            .started_at
            .map(|at| at.elapsed())
            .unwrap_or_default();
        debug!(key = %self.key, elapsed_ms = elapsed.as_millis(), "Cover loaded");

        if let Some(callback) = self.on_load.as_mut() {
            callback();
        }
        CoverTransition::Loaded { elapsed }
    }

    fn on_exhausted(&mut self) -> CoverTransition {
        self.state = LoadState::FailedFallback;
        self.current_url = self.request.fallback_url().to_string();

        // The placeholder itself just failed every attempt; asking again is pointless.
        if !self.request.is_placeholder_only() {
            self.spawn_fetch();
        }

        if let Some(callback) = self.on_error.as_mut() {
            callback();
        }
        CoverTransition::FailedFallback
    }

    fn spawn_fetch(&mut self) {
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.events_tx.clone();
        let url = self.current_url.clone();
        let (key, generation) = (self.key, self.generation);

        trace!(key = %key, url = %url, "Requesting cover");
        self.fetch_task = Some(tokio::spawn(async move {
            let result = fetcher.fetch(&url).await;
            let _ = tx.send(CoverEvent {
                key,
                generation,
                kind: CoverEventKind::Fetched(result),
            });
        }));
    }

    fn schedule_retry(&mut self, delay: Duration) {
        let tx = self.events_tx.clone();
        let (key, generation) = (self.key, self.generation);

        self.retry_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(CoverEvent {
                key,
                generation,
                kind: CoverEventKind::RetryDue,
            });
        }));
    }

    fn abort_tasks(&mut self) {
        if let Some(task) = self.fetch_task.take() {
            task.abort();
        }
        if let Some(task) = self.retry_task.take() {
            task.abort();
        }
    }
}

impl Drop for CoverLoader {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

/// Wait before the retry that follows `attempts` earlier retries.
#[must_use]
pub fn backoff_delay(attempts: u32) -> Duration {
    Duration::from_secs(2_u64.saturating_pow(attempts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::CoverError;
    use crate::domain::ports::mocks::ScriptedFetcher;
    use std::sync::atomic::AtomicUsize;
    use test_case::test_case;

    const PRIMARY: &str = "https://covers.openlibrary.org/b/isbn/9780441013593-L.jpg";
    const FALLBACK: &str = "https://via.placeholder.com/300x400/FFD23F/FFFFFF?text=Dune";
    const KEY: CoverKey = CoverKey(7);

    struct Harness {
        fetcher: Arc<ScriptedFetcher>,
        rx: mpsc::UnboundedReceiver<CoverEvent>,
        tx: mpsc::UnboundedSender<CoverEvent>,
    }

    impl Harness {
        fn new(fetcher: ScriptedFetcher) -> Self {
            let (tx, rx) = mpsc::unbounded_channel();
            Self {
                fetcher: Arc::new(fetcher),
                rx,
                tx,
            }
        }

        fn loader(&self, lazy: bool, retry_count: u32) -> CoverLoader {
            let options = CoverOptions::default()
                .with_lazy(lazy)
                .with_retry_count(retry_count);
            CoverLoader::new(
                KEY,
                ImageRequest::new(PRIMARY, FALLBACK, retry_count),
                &options,
                self.fetcher.clone(),
                self.tx.clone(),
            )
        }

        /// Feeds events into the loader until it reaches a terminal state.
        async fn settle(&mut self, loader: &mut CoverLoader) -> Vec<CoverTransition> {
            let mut transitions = Vec::new();
            while !loader.state().is_terminal() {
                let event = self.rx.recv().await.expect("event channel closed");
                transitions.extend(loader.handle_event(event));
            }
            transitions
        }

        /// Delivers the fallback fetch result.
        async fn deliver_next(&mut self, loader: &mut CoverLoader) -> Option<CoverTransition> {
            let event = self.rx.recv().await.expect("event channel closed");
            loader.handle_event(event)
        }

        fn offsets_ms(&self, url: &str, start: Instant) -> Vec<u128> {
            self.fetcher
                .calls_for(url)
                .iter()
                .map(|call| (call.at - start).as_millis())
                .collect()
        }
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_delay(0), Duration::from_secs(1));
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(4), Duration::from_secs(16));
        assert_eq!(backoff_delay(80), Duration::from_secs(u64::MAX));
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_cover_falls_back_on_schedule() {
        let mut h = Harness::new(ScriptedFetcher::new().fail_always(PRIMARY));
        let start = Instant::now();
        let errors = Arc::new(AtomicUsize::new(0));
        let counter = errors.clone();
        let mut loader = h.loader(false, 2).with_on_error(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let transitions = h.settle(&mut loader).await;

        assert_eq!(
            transitions,
            vec![
                CoverTransition::Retrying {
                    attempt: 1,
                    delay: Duration::from_secs(1)
                },
                CoverTransition::Retrying {
                    attempt: 2,
                    delay: Duration::from_secs(2)
                },
                CoverTransition::FailedFallback,
            ]
        );
        assert_eq!(h.offsets_ms(PRIMARY, start), vec![0, 1000, 3000]);
        assert_eq!(loader.state(), LoadState::FailedFallback);
        assert_eq!(loader.current_url(), FALLBACK);
        assert_eq!(errors.load(Ordering::SeqCst), 1);

        // The fallback is requested exactly once and shown.
        assert_eq!(h.deliver_next(&mut loader).await, None);
        assert_eq!(h.fetcher.calls_for(FALLBACK).len(), 1);
        assert!(loader.image().is_some());
    }

    #[test_case(0 ; "no retries")]
    #[test_case(1 ; "one retry")]
    #[test_case(3 ; "three retries")]
    #[tokio::test(start_paused = true)]
    async fn test_attempt_count_when_always_failing(retry_count: u32) {
        let mut h = Harness::new(ScriptedFetcher::new().fail_always(PRIMARY));
        let mut loader = h.loader(false, retry_count);

        h.settle(&mut loader).await;

        assert_eq!(
            h.fetcher.calls_for(PRIMARY).len(),
            retry_count as usize + 1
        );
        assert_eq!(loader.state(), LoadState::FailedFallback);
        assert_eq!(loader.attempts(), retry_count);
    }

    #[test_case(0 ; "first try")]
    #[test_case(1 ; "after one failure")]
    #[test_case(2 ; "on the last attempt")]
    #[tokio::test(start_paused = true)]
    async fn test_success_after_failures(failures: u32) {
        let mut h = Harness::new(ScriptedFetcher::new().fail_times(PRIMARY, failures));
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let mut loader = h.loader(false, 2).with_on_load(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let transitions = h.settle(&mut loader).await;

        assert_eq!(loader.state(), LoadState::Loaded);
        assert_eq!(h.fetcher.calls_for(PRIMARY).len(), failures as usize + 1);
        assert!(h.fetcher.calls_for(FALLBACK).is_empty());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(matches!(
            transitions.last(),
            Some(CoverTransition::Loaded { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_counts_from_first_attempt() {
        let mut h = Harness::new(ScriptedFetcher::new().fail_times(PRIMARY, 1));
        let mut loader = h.loader(false, 2);

        let transitions = h.settle(&mut loader).await;

        assert_eq!(
            transitions.last(),
            Some(&CoverTransition::Loaded {
                elapsed: Duration::from_secs(1)
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_loaded_is_final() {
        let mut h = Harness::new(ScriptedFetcher::new());
        let mut loader = h.loader(false, 2);
        h.settle(&mut loader).await;
        let generation = loader.generation();

        let late_failure = CoverEvent {
            key: KEY,
            generation,
            kind: CoverEventKind::Fetched(Err(CoverError::NetworkError("late".into()))),
        };
        assert_eq!(loader.handle_event(late_failure), None);
        let late_retry = CoverEvent {
            key: KEY,
            generation,
            kind: CoverEventKind::RetryDue,
        };
        assert_eq!(loader.handle_event(late_retry), None);
        loader.reveal();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(loader.state(), LoadState::Loaded);
        assert_eq!(h.fetcher.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lazy_cover_waits_for_visibility() {
        let mut h = Harness::new(ScriptedFetcher::new());
        let mut loader = h.loader(true, 2);
        let viewport = Rect::new(0, 0, 40, 10);

        tokio::time::sleep(Duration::from_secs(5)).await;
        loader.observe(Rect::new(0, 30, 40, 1), viewport);
        tokio::task::yield_now().await;

        assert_eq!(loader.state(), LoadState::Pending);
        assert!(h.fetcher.calls().is_empty());

        loader.observe(Rect::new(0, 4, 40, 1), viewport);
        assert_eq!(loader.state(), LoadState::Loading);
        h.settle(&mut loader).await;

        assert_eq!(loader.state(), LoadState::Loaded);
        assert_eq!(h.fetcher.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_options_tune_visibility() {
        let h = Harness::new(ScriptedFetcher::new());
        let options = CoverOptions::default().with_margin(0).with_threshold(0.5);
        let mut loader = CoverLoader::new(
            KEY,
            ImageRequest::new(PRIMARY, FALLBACK, 2),
            &options,
            h.fetcher.clone(),
            h.tx.clone(),
        );
        let viewport = Rect::new(0, 0, 40, 10);

        // Just below the viewport: inside the default margin only.
        loader.observe(Rect::new(0, 10, 40, 2), viewport);
        // A quarter of it on screen.
        loader.observe(Rect::new(0, 9, 40, 4), viewport);
        assert_eq!(loader.state(), LoadState::Pending);

        loader.observe(Rect::new(0, 8, 40, 4), viewport);
        assert_eq!(loader.state(), LoadState::Loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eager_cover_starts_on_construction() {
        let h = Harness::new(ScriptedFetcher::new());
        let loader = h.loader(false, 2);
        assert!(loader.is_visible());
        assert_eq!(loader.state(), LoadState::Loading);

        tokio::task::yield_now().await;
        assert_eq!(h.fetcher.calls_for(PRIMARY).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_url_change_mid_retry_resets() {
        const NEW_URL: &str = "https://covers.openlibrary.org/b/isbn/9780441172719-L.jpg";
        let mut h = Harness::new(ScriptedFetcher::new().fail_always(PRIMARY));
        let mut loader = h.loader(false, 2);

        let event = h.rx.recv().await.unwrap();
        assert!(matches!(
            loader.handle_event(event),
            Some(CoverTransition::Retrying { attempt: 1, .. })
        ));
        let stale_generation = loader.generation();

        assert!(loader.replace_request(ImageRequest::new(NEW_URL, FALLBACK, 2)));
        assert_eq!(loader.attempts(), 0);
        assert_eq!(loader.state(), LoadState::Loading);
        assert_ne!(loader.generation(), stale_generation);

        h.settle(&mut loader).await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(loader.state(), LoadState::Loaded);
        assert_eq!(loader.current_url(), NEW_URL);
        // The cancelled retry timer never re-requested the old URL.
        assert_eq!(h.fetcher.calls_for(PRIMARY).len(), 1);
        assert_eq!(h.fetcher.calls_for(NEW_URL).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_url_does_not_reset() {
        let mut h = Harness::new(ScriptedFetcher::new());
        let mut loader = h.loader(false, 2);
        h.settle(&mut loader).await;

        assert!(!loader.replace_request(ImageRequest::new(PRIMARY, FALLBACK, 5)));
        assert_eq!(loader.state(), LoadState::Loaded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_and_foreign_events_ignored() {
        let mut h = Harness::new(
            ScriptedFetcher::new()
                .fail_always(PRIMARY)
                .with_latency(Duration::from_millis(500)),
        );
        let mut loader = h.loader(false, 2);

        let foreign = CoverEvent {
            key: CoverKey(99),
            generation: loader.generation(),
            kind: CoverEventKind::Fetched(Ok(Arc::new(image::DynamicImage::new_rgb8(1, 1)))),
        };
        assert_eq!(loader.handle_event(foreign), None);

        let stale = CoverEvent {
            key: KEY,
            generation: loader.generation() - 1,
            kind: CoverEventKind::Fetched(Ok(Arc::new(image::DynamicImage::new_rgb8(1, 1)))),
        };
        assert_eq!(loader.handle_event(stale), None);
        assert_eq!(loader.state(), LoadState::Loading);

        let transitions = h.settle(&mut loader).await;
        assert_eq!(transitions.last(), Some(&CoverTransition::FailedFallback));
    }

    #[tokio::test(start_paused = true)]
    async fn test_placeholder_only_request_is_not_refetched() {
        let mut h = Harness::new(ScriptedFetcher::new().fail_always(FALLBACK));
        let options = CoverOptions::default().with_lazy(false).with_retry_count(1);
        let mut loader = CoverLoader::new(
            KEY,
            ImageRequest::new(FALLBACK, FALLBACK, 1),
            &options,
            h.fetcher.clone(),
            h.tx.clone(),
        );

        h.settle(&mut loader).await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(loader.state(), LoadState::FailedFallback);
        assert_eq!(h.fetcher.calls_for(FALLBACK).len(), 2);
        assert!(loader.image().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_retry() {
        let mut h = Harness::new(ScriptedFetcher::new().fail_always(PRIMARY));
        let mut loader = h.loader(false, 2);
        let event = h.rx.recv().await.unwrap();
        loader.handle_event(event);
        assert_eq!(loader.state(), LoadState::Retrying);

        drop(loader);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(h.rx.try_recv().is_err());
        assert_eq!(h.fetcher.calls().len(), 1);
    }
}
