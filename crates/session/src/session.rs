use std::sync::Arc;
use std::time::Duration;

use skyrealm_common::{Location, WhisperEntry};
use skyrealm_kernel::{
    HISTORY_CAPACITY, LocationSource, Overlay, OverlayEvent, OverlayState, Wanderer,
};
use skyrealm_oracle::{TextGenerator, hear_whisper};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::Instrument;

/// Most events the overlay log holds before it is folded into its checkpoint.
pub const EVENT_LOG_LIMIT: usize = 64;

/// Session timing and seeding.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Wall-clock interval between location changes.
    pub location_interval: Duration,
    /// Seed for the default wanderer. `None` seeds from the clock.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            location_interval: Duration::from_secs(15),
            seed: None,
        }
    }
}

/// Errors from session setup.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no tokio runtime is available on this thread")]
    RuntimeUnavailable,
}

/// The whisper overlay's live session.
///
/// Owns the overlay state. Deferred work (the location ticker and whisper
/// requests) runs on a tokio runtime and reports back through a queue;
/// [`OverlaySession::pump`] applies queued events on the host thread, so
/// every state change happens there.
pub struct OverlaySession {
    overlay: Overlay,
    generator: Arc<dyn TextGenerator>,
    runtime: Handle,
    events_tx: mpsc::UnboundedSender<OverlayEvent>,
    events_rx: mpsc::UnboundedReceiver<OverlayEvent>,
    ticker: Option<JoinHandle<()>>,
}

impl OverlaySession {
    /// Start a session whose location is driven by `source`.
    pub fn start(
        config: &SessionConfig,
        generator: Arc<dyn TextGenerator>,
        source: Box<dyn LocationSource>,
        runtime: Handle,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let ticker = runtime.spawn(run_ticker(
            config.location_interval,
            source,
            events_tx.clone(),
        ));
        tracing::info!(
            interval_secs = config.location_interval.as_secs_f32(),
            "overlay session started"
        );
        Self {
            overlay: Overlay::new(),
            generator,
            runtime,
            events_tx,
            events_rx,
            ticker: Some(ticker),
        }
    }

    /// Start a session with the default seeded wanderer on the current runtime.
    pub fn wandering(
        config: &SessionConfig,
        generator: Arc<dyn TextGenerator>,
    ) -> Result<Self, SessionError> {
        let runtime = Handle::try_current().map_err(|_| SessionError::RuntimeUnavailable)?;
        let wanderer = match config.seed {
            Some(seed) => Wanderer::with_seed(seed),
            None => Wanderer::from_entropy(),
        };
        Ok(Self::start(config, generator, Box::new(wanderer), runtime))
    }

    pub fn state(&self) -> &OverlayState {
        self.overlay.state()
    }

    /// The overlay container, checkpoint included.
    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// Events applied since the last compaction, oldest first.
    pub fn events(&self) -> &[OverlayEvent] {
        self.overlay.events()
    }

    /// Trigger a whisper request.
    ///
    /// Returns `false` (and does nothing) when one is already in flight.
    /// The location is captured now; the entry keeps it even if the ticker
    /// moves the overlay before the request settles.
    pub fn listen(&mut self) -> bool {
        let Some(location) = self.overlay.begin_whisper() else {
            tracing::debug!("already listening; trigger dropped");
            return false;
        };
        self.bound_log(false);

        let generator = Arc::clone(&self.generator);
        let tx = self.events_tx.clone();
        let span = tracing::info_span!("whisper", %location);
        self.runtime.spawn(
            async move {
                let heard = hear_whisper(generator.as_ref(), location).await;
                let entry = WhisperEntry::new(heard.text, location);
                tracing::debug!(id = %entry.id.short(), outcome = ?heard.outcome, "whisper settled");
                // The session may be gone; the result is simply dropped then.
                if tx
                    .send(OverlayEvent::WhisperSettled {
                        entry,
                        outcome: heard.outcome,
                    })
                    .is_err()
                {
                    tracing::debug!("whisper settled after session teardown; dropped");
                }
            }
            .instrument(span),
        );
        true
    }

    /// Flip the inert mute flag.
    pub fn toggle_mute(&mut self) {
        self.absorb(OverlayEvent::MuteToggled);
    }

    /// Move the overlay to `location` now, outside the ticker.
    ///
    /// Goes through the event log, so replay still matches.
    pub fn move_to(&mut self, location: Location) {
        self.absorb(OverlayEvent::LocationChanged { location });
    }

    /// Apply every queued event. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            if self.absorb(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the next queued event and apply it.
    pub async fn next_event(&mut self) -> Option<OverlayEvent> {
        let event = self.events_rx.recv().await?;
        self.absorb(event.clone());
        Some(event)
    }

    /// Apply one queued event, then compact the log when a settle evicted a
    /// history entry or the log reached [`EVENT_LOG_LIMIT`].
    fn absorb(&mut self, event: OverlayEvent) -> bool {
        let evicts = matches!(event, OverlayEvent::WhisperSettled { .. })
            && self.overlay.state().history().len() == HISTORY_CAPACITY;
        if !self.overlay.apply(event) {
            return false;
        }
        self.bound_log(evicts);
        true
    }

    fn bound_log(&mut self, evicted: bool) {
        if evicted || self.overlay.events().len() >= EVENT_LOG_LIMIT {
            let folded = self.overlay.compact();
            tracing::debug!(folded, "overlay event log compacted");
        }
    }

    /// Wait until no whisper is in flight, applying events as they arrive.
    pub async fn wait_for_settle(&mut self) {
        while self.overlay.state().in_flight() {
            if self.next_event().await.is_none() {
                break;
            }
        }
    }

    /// Stop the location ticker. An in-flight whisper is left to settle.
    pub fn shutdown(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
            tracing::info!("overlay session stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }
}

impl Drop for OverlaySession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_ticker(
    interval: Duration,
    mut source: Box<dyn LocationSource>,
    tx: mpsc::UnboundedSender<OverlayEvent>,
) {
    let mut ticks = tokio::time::interval_at(Instant::now() + interval, interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticks.tick().await;
        let location = source.next_location();
        tracing::debug!(%location, "location changed");
        if tx.send(OverlayEvent::LocationChanged { location }).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyrealm_kernel::FixedLocation;
    use std::collections::HashSet;
    use skyrealm_oracle::{LOST_WORDS, OracleError, OracleResult, SILENT_WIND};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    const LONG: Duration = Duration::from_secs(3600);

    fn config(interval: Duration) -> SessionConfig {
        SessionConfig {
            location_interval: interval,
            seed: Some(42),
        }
    }

    /// Answers "whisper N" for the Nth call.
    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl TextGenerator for Counting {
        async fn generate(&self, _prompt: &str) -> OracleResult<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("whisper {n}"))
        }
    }

    /// Always fails.
    struct Broken;

    #[async_trait::async_trait]
    impl TextGenerator for Broken {
        async fn generate(&self, _prompt: &str) -> OracleResult<String> {
            Err(OracleError::MissingApiKey)
        }
    }

    /// Always answers with nothing.
    struct Mute;

    #[async_trait::async_trait]
    impl TextGenerator for Mute {
        async fn generate(&self, _prompt: &str) -> OracleResult<String> {
            Ok(String::new())
        }
    }

    /// Holds each request open until the test releases it.
    struct Gated {
        gate: Mutex<Option<oneshot::Receiver<String>>>,
        calls: AtomicUsize,
    }

    impl Gated {
        fn new() -> (Arc<Self>, oneshot::Sender<String>) {
            let (tx, rx) = oneshot::channel();
            let gated = Arc::new(Self {
                gate: Mutex::new(Some(rx)),
                calls: AtomicUsize::new(0),
            });
            (gated, tx)
        }
    }

    #[async_trait::async_trait]
    impl TextGenerator for Gated {
        async fn generate(&self, _prompt: &str) -> OracleResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let rx = self.gate.lock().unwrap().take();
            match rx {
                Some(rx) => Ok(rx.await.unwrap_or_default()),
                None => Ok(String::new()),
            }
        }
    }

    /// Walks a fixed script of locations.
    struct Scripted(Vec<Location>, usize);

    impl LocationSource for Scripted {
        fn next_location(&mut self) -> Location {
            let location = self.0[self.1 % self.0.len()];
            self.1 += 1;
            location
        }
    }

    fn session(generator: Arc<dyn TextGenerator>, interval: Duration) -> OverlaySession {
        OverlaySession::start(
            &config(interval),
            generator,
            Box::new(FixedLocation(Location::MirrorVoid)),
            Handle::current(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_changes_location_on_interval() {
        let mut s = OverlaySession::start(
            &config(Duration::from_secs(15)),
            Arc::new(Counting::default()),
            Box::new(Scripted(
                vec![Location::ErodedRuins, Location::WhisperingGrass],
                0,
            )),
            Handle::current(),
        );
        let started = Instant::now();

        s.next_event().await;
        assert_eq!(s.state().location(), Location::ErodedRuins);
        assert!(started.elapsed() >= Duration::from_secs(15));
        assert!(started.elapsed() < Duration::from_secs(16));

        s.next_event().await;
        assert_eq!(s.state().location(), Location::WhisperingGrass);
        assert!(started.elapsed() >= Duration::from_secs(30));
        assert!(started.elapsed() < Duration::from_secs(31));
    }

    #[tokio::test(start_paused = true)]
    async fn wandering_ticks_stay_in_the_closed_set() {
        let mut s = OverlaySession::wandering(
            &config(Duration::from_secs(15)),
            Arc::new(Counting::default()),
        )
        .unwrap();
        for _ in 0..50 {
            s.next_event().await;
            assert!(Location::ALL.contains(&s.state().location()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_the_ticker() {
        let mut s = session(Arc::new(Counting::default()), Duration::from_secs(15));
        s.shutdown();
        assert!(!s.is_running());

        tokio::time::advance(Duration::from_secs(120)).await;
        tokio::task::yield_now().await;
        assert_eq!(s.pump(), 0);
        assert!(s.events().is_empty());
    }

    #[tokio::test]
    async fn second_trigger_while_in_flight_is_dropped() {
        let (gated, release) = Gated::new();
        let mut s = session(gated.clone(), LONG);

        assert!(s.listen());
        assert!(!s.listen());
        assert!(!s.listen());
        assert!(s.state().in_flight());

        release.send("glass dunes hum".into()).unwrap();
        s.wait_for_settle().await;

        assert_eq!(gated.calls.load(Ordering::SeqCst), 1);
        assert_eq!(s.state().history().len(), 1);
        assert_eq!(s.state().history()[0].text, "glass dunes hum");
        assert!(!s.state().in_flight());
    }

    #[tokio::test]
    async fn move_to_is_logged_and_captured() {
        let mut s = session(Arc::new(Counting::default()), LONG);
        s.move_to(Location::WhisperingGrass);
        assert_eq!(s.state().location(), Location::WhisperingGrass);

        s.listen();
        s.wait_for_settle().await;
        assert_eq!(s.state().history()[0].location, Location::WhisperingGrass);
        assert!(s.overlay().replay_matches());
    }

    /// Entry ids still reachable from the overlay: checkpoint history plus
    /// settled events in the log.
    fn retained_ids(s: &OverlaySession) -> HashSet<skyrealm_common::WhisperId> {
        let mut ids: HashSet<_> = s
            .overlay()
            .checkpoint()
            .history()
            .iter()
            .map(|e| e.id)
            .collect();
        for event in s.events() {
            if let OverlayEvent::WhisperSettled { entry, .. } = event {
                ids.insert(entry.id);
            }
        }
        ids
    }

    #[tokio::test]
    async fn long_session_keeps_log_bounded_and_drops_evicted_entries() {
        let mut s = session(Arc::new(Counting::default()), LONG);
        for _ in 0..500 {
            assert!(s.listen());
            s.wait_for_settle().await;
            assert!(s.events().len() <= EVENT_LOG_LIMIT);

            let shown: HashSet<_> = s.state().history().iter().map(|e| e.id).collect();
            assert!(retained_ids(&s).is_subset(&shown));
        }
        assert_eq!(s.state().history().len(), HISTORY_CAPACITY);
        assert_eq!(s.state().history()[0].text, "whisper 499");
        assert_eq!(s.state().tally().spoken, 500);
        assert!(s.overlay().replay_matches());
    }

    #[tokio::test]
    async fn mute_toggles_keep_log_bounded() {
        let mut s = session(Arc::new(Counting::default()), LONG);
        for _ in 0..(EVENT_LOG_LIMIT * 2 + 1) {
            s.toggle_mute();
            assert!(s.events().len() < EVENT_LOG_LIMIT);
        }
        assert!(!s.state().muted());
        assert!(s.overlay().replay_matches());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_alone_keep_log_bounded() {
        let mut s = session(Arc::new(Counting::default()), Duration::from_secs(1));
        for _ in 0..(EVENT_LOG_LIMIT * 3) {
            s.next_event().await;
            assert!(s.events().len() < EVENT_LOG_LIMIT);
        }
        assert!(s.overlay().replay_matches());
    }

    #[tokio::test]
    async fn whisper_settling_after_teardown_is_dropped() {
        let (gated, release) = Gated::new();
        let mut s = session(gated.clone(), LONG);
        assert!(s.listen());
        drop(s);

        release.send("too late".into()).unwrap();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(gated.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transport_failure_is_absorbed() {
        let mut s = session(Arc::new(Broken), LONG);
        assert!(s.listen());
        s.wait_for_settle().await;

        let history = s.state().history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].text, LOST_WORDS);
        assert_eq!(s.state().tally().lost, 1);
    }

    #[tokio::test]
    async fn empty_response_uses_silent_placeholder() {
        let mut s = session(Arc::new(Mute), LONG);
        s.listen();
        s.wait_for_settle().await;

        assert_eq!(s.state().history()[0].text, SILENT_WIND);
        assert_eq!(s.state().tally().silent, 1);
    }

    #[tokio::test]
    async fn five_serial_whispers_keep_the_three_newest() {
        let mut s = session(Arc::new(Counting::default()), LONG);
        for _ in 0..5 {
            assert!(s.listen());
            s.wait_for_settle().await;
            assert!(s.state().history().len() <= HISTORY_CAPACITY);
        }

        let history = s.state().history();
        let texts: Vec<&str> = history.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["whisper 4", "whisper 3", "whisper 2"]);
        assert!(history[0].created_at >= history[1].created_at);
        assert!(history[1].created_at >= history[2].created_at);
        assert!(history[0].id > history[1].id);
        assert_eq!(s.state().tally().spoken, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn entry_keeps_location_captured_at_start() {
        let (gated, release) = Gated::new();
        let mut s = OverlaySession::start(
            &config(Duration::from_secs(15)),
            gated,
            Box::new(FixedLocation(Location::ErodedRuins)),
            Handle::current(),
        );

        assert!(s.listen());
        let event = s.next_event().await;
        assert!(matches!(event, Some(OverlayEvent::LocationChanged { .. })));
        assert_eq!(s.state().location(), Location::ErodedRuins);

        release.send("the ring was once a road".into()).unwrap();
        s.wait_for_settle().await;

        let entry = &s.state().history()[0];
        assert_eq!(entry.location, Location::MirrorVoid);
        assert_eq!(s.state().location(), Location::ErodedRuins);
    }

    #[tokio::test]
    async fn in_flight_whisper_settles_after_shutdown() {
        let (gated, release) = Gated::new();
        let mut s = session(gated, LONG);
        s.listen();
        s.shutdown();

        release.send("still heard".into()).unwrap();
        s.wait_for_settle().await;
        assert_eq!(s.state().history()[0].text, "still heard");
    }

    #[tokio::test]
    async fn mute_toggles_while_listening() {
        let (gated, release) = Gated::new();
        let mut s = session(gated, LONG);
        s.listen();
        s.toggle_mute();
        assert!(!s.state().muted());
        assert!(s.state().in_flight());

        release.send("x".into()).unwrap();
        s.wait_for_settle().await;
        assert_eq!(
            s.state().tally(),
            skyrealm_kernel::OutcomeTally {
                spoken: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn wandering_needs_a_runtime() {
        let result = OverlaySession::wandering(&SessionConfig::default(), Arc::new(Mute));
        assert!(matches!(result, Err(SessionError::RuntimeUnavailable)));
    }
}
