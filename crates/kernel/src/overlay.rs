use serde::{Deserialize, Serialize};
use skyrealm_common::{Location, WhisperEntry, WhisperOutcome};

/// Maximum number of whisper entries the overlay keeps.
pub const HISTORY_CAPACITY: usize = 3;

/// An event record for every accepted change to the overlay.
///
/// Events are the only way state moves; the log they form can be replayed
/// into an identical overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OverlayEvent {
    /// The location provider produced a new current location.
    LocationChanged { location: Location },
    /// A whisper request began for the location current at that moment.
    WhisperStarted { location: Location },
    /// The in-flight whisper request settled with an entry.
    WhisperSettled {
        entry: WhisperEntry,
        outcome: WhisperOutcome,
    },
    /// The (inert) mute flag was flipped.
    MuteToggled,
}

/// How many settled whispers came from each branch of the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeTally {
    pub spoken: u32,
    pub silent: u32,
    pub lost: u32,
}

impl OutcomeTally {
    fn record(mut self, outcome: WhisperOutcome) -> Self {
        match outcome {
            WhisperOutcome::Spoken => self.spoken += 1,
            WhisperOutcome::Silent => self.silent += 1,
            WhisperOutcome::Lost => self.lost += 1,
        }
        self
    }

    pub fn total(&self) -> u32 {
        self.spoken + self.silent + self.lost
    }
}

/// Snapshot of everything the overlay shows.
///
/// `next` is a pure transition: it never mutates `self`, and returns `None`
/// when the event is not valid in the current state (e.g. a second
/// `WhisperStarted` while one is already in flight).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayState {
    location: Location,
    /// Location captured when the in-flight request started.
    pending: Option<Location>,
    /// Newest first, never longer than [`HISTORY_CAPACITY`].
    history: Vec<WhisperEntry>,
    muted: bool,
    tally: OutcomeTally,
}

impl Default for OverlayState {
    fn default() -> Self {
        Self {
            location: Location::default(),
            pending: None,
            history: Vec::new(),
            muted: true,
            tally: OutcomeTally::default(),
        }
    }
}

impl OverlayState {
    pub fn location(&self) -> Location {
        self.location
    }

    pub fn in_flight(&self) -> bool {
        self.pending.is_some()
    }

    /// Location the in-flight request was started with, if any.
    pub fn pending_location(&self) -> Option<Location> {
        self.pending
    }

    pub fn history(&self) -> &[WhisperEntry] {
        &self.history
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn tally(&self) -> OutcomeTally {
        self.tally
    }

    /// Compute the state that follows `event`, or `None` if it is rejected.
    pub fn next(&self, event: &OverlayEvent) -> Option<Self> {
        match event {
            OverlayEvent::LocationChanged { location } => Some(Self {
                location: *location,
                ..self.clone()
            }),
            OverlayEvent::WhisperStarted { location } => {
                if self.in_flight() {
                    return None;
                }
                Some(Self {
                    pending: Some(*location),
                    ..self.clone()
                })
            }
            OverlayEvent::WhisperSettled { entry, outcome } => {
                self.pending?;
                let mut history = Vec::with_capacity(HISTORY_CAPACITY);
                history.push(entry.clone());
                history.extend(
                    self.history
                        .iter()
                        .take(HISTORY_CAPACITY - 1)
                        .cloned(),
                );
                Some(Self {
                    pending: None,
                    history,
                    tally: self.tally.record(*outcome),
                    ..self.clone()
                })
            }
            OverlayEvent::MuteToggled => Some(Self {
                muted: !self.muted,
                ..self.clone()
            }),
        }
    }

    /// Deterministic hash of the visible state, for replay comparison.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, self.location.slug().as_bytes());
        mix(&mut h, &[self.pending.is_some() as u8, self.muted as u8]);
        if let Some(pending) = self.pending {
            mix(&mut h, pending.slug().as_bytes());
        }
        for entry in &self.history {
            mix(&mut h, entry.id.0.as_bytes());
            mix(&mut h, entry.text.as_bytes());
            mix(&mut h, entry.location.slug().as_bytes());
            mix(&mut h, &entry.created_at.timestamp_millis().to_le_bytes());
        }
        h
    }
}

/// The overlay's state container.
///
/// Owns the current [`OverlayState`], the checkpoint the event log starts
/// from, and the log of accepted events since that checkpoint. Rejected
/// events are not logged. Replaying the log onto the checkpoint always
/// reproduces the current state.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    checkpoint: OverlayState,
    state: OverlayState,
    event_log: Vec<OverlayEvent>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    /// State the event log starts from.
    pub fn checkpoint(&self) -> &OverlayState {
        &self.checkpoint
    }

    /// Apply an event. Returns `true` if it was accepted.
    pub fn apply(&mut self, event: OverlayEvent) -> bool {
        match self.state.next(&event) {
            Some(next) => {
                tracing::trace!(?event, "overlay event applied");
                self.state = next;
                self.event_log.push(event);
                true
            }
            None => {
                tracing::debug!(?event, "overlay event rejected");
                false
            }
        }
    }

    /// Begin a whisper at the current location.
    ///
    /// Returns the captured location, or `None` when a request is already in
    /// flight (the trigger is dropped, not queued).
    pub fn begin_whisper(&mut self) -> Option<Location> {
        let location = self.state.location;
        self.apply(OverlayEvent::WhisperStarted { location })
            .then_some(location)
    }

    /// Events accepted since the checkpoint, oldest first.
    pub fn events(&self) -> &[OverlayEvent] {
        &self.event_log
    }

    /// Drain and return the event log. The current state becomes the new
    /// checkpoint.
    pub fn drain_events(&mut self) -> Vec<OverlayEvent> {
        self.checkpoint = self.state.clone();
        std::mem::take(&mut self.event_log)
    }

    /// Fold the event log into the checkpoint. Returns how many events were
    /// folded.
    ///
    /// Entries evicted from history live on only in `WhisperSettled` events;
    /// compacting drops them for good.
    pub fn compact(&mut self) -> usize {
        self.drain_events().len()
    }

    /// Reconstruct an overlay from a sequence of events, starting at the
    /// default state.
    pub fn replay(events: &[OverlayEvent]) -> Self {
        Self::replay_from(OverlayState::default(), events)
    }

    /// Reconstruct an overlay from `checkpoint` plus the events after it.
    pub fn replay_from(checkpoint: OverlayState, events: &[OverlayEvent]) -> Self {
        let mut overlay = Self {
            checkpoint: checkpoint.clone(),
            state: checkpoint,
            event_log: Vec::with_capacity(events.len()),
        };
        for event in events {
            overlay.apply(event.clone());
        }
        overlay
    }

    /// Whether replaying the log onto the checkpoint reproduces the state.
    pub fn replay_matches(&self) -> bool {
        Self::replay_from(self.checkpoint.clone(), &self.event_log)
            .state
            .state_hash()
            == self.state.state_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(overlay: &mut Overlay, text: &str, outcome: WhisperOutcome) -> bool {
        let location = overlay.state().pending_location().unwrap_or_default();
        overlay.apply(OverlayEvent::WhisperSettled {
            entry: WhisperEntry::new(text, location),
            outcome,
        })
    }

    #[test]
    fn overlay_starts_idle_and_muted() {
        let o = Overlay::new();
        assert_eq!(o.state().location(), Location::MirrorVoid);
        assert!(!o.state().in_flight());
        assert!(o.state().muted());
        assert!(o.state().history().is_empty());
    }

    #[test]
    fn next_does_not_touch_previous_state() {
        let before = OverlayState::default();
        let after = before
            .next(&OverlayEvent::LocationChanged {
                location: Location::ErodedRuins,
            })
            .unwrap();
        assert_eq!(before.location(), Location::MirrorVoid);
        assert_eq!(after.location(), Location::ErodedRuins);
    }

    #[test]
    fn second_start_while_in_flight_is_rejected() {
        let mut o = Overlay::new();
        assert_eq!(o.begin_whisper(), Some(Location::MirrorVoid));
        assert_eq!(o.begin_whisper(), None);
        assert_eq!(o.events().len(), 1);
        assert!(o.state().in_flight());
    }

    #[test]
    fn settle_without_start_is_rejected() {
        let mut o = Overlay::new();
        assert!(!settle(&mut o, "stray", WhisperOutcome::Spoken));
        assert!(o.state().history().is_empty());
    }

    #[test]
    fn settle_clears_in_flight_and_prepends() {
        let mut o = Overlay::new();
        o.begin_whisper();
        assert!(settle(&mut o, "first", WhisperOutcome::Spoken));
        o.begin_whisper();
        assert!(settle(&mut o, "second", WhisperOutcome::Silent));

        assert!(!o.state().in_flight());
        let texts: Vec<&str> = o.state().history().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["second", "first"]);
    }

    #[test]
    fn history_is_capped_newest_first() {
        let mut o = Overlay::new();
        for i in 0..5 {
            o.begin_whisper();
            settle(&mut o, &format!("whisper {i}"), WhisperOutcome::Spoken);
            assert!(o.state().history().len() <= HISTORY_CAPACITY);
        }
        let texts: Vec<&str> = o.state().history().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["whisper 4", "whisper 3", "whisper 2"]);
    }

    #[test]
    fn pending_location_survives_location_change() {
        let mut o = Overlay::new();
        let captured = o.begin_whisper().unwrap();
        o.apply(OverlayEvent::LocationChanged {
            location: Location::WhisperingGrass,
        });
        assert_eq!(o.state().pending_location(), Some(captured));
        assert_eq!(o.state().location(), Location::WhisperingGrass);
    }

    #[test]
    fn mute_toggles() {
        let mut o = Overlay::new();
        o.apply(OverlayEvent::MuteToggled);
        assert!(!o.state().muted());
        o.apply(OverlayEvent::MuteToggled);
        assert!(o.state().muted());
    }

    #[test]
    fn tally_counts_outcomes() {
        let mut o = Overlay::new();
        for outcome in [
            WhisperOutcome::Spoken,
            WhisperOutcome::Lost,
            WhisperOutcome::Lost,
            WhisperOutcome::Silent,
        ] {
            o.begin_whisper();
            settle(&mut o, "x", outcome);
        }
        let tally = o.state().tally();
        assert_eq!((tally.spoken, tally.silent, tally.lost), (1, 1, 2));
        assert_eq!(tally.total(), 4);
    }

    #[test]
    fn drain_events_clears_log() {
        let mut o = Overlay::new();
        o.apply(OverlayEvent::MuteToggled);
        assert_eq!(o.drain_events().len(), 1);
        assert!(o.events().is_empty());
        assert_eq!(o.checkpoint(), o.state());
    }

    #[test]
    fn compact_keeps_replay_from_checkpoint() {
        let mut o = Overlay::new();
        for i in 0..5 {
            o.begin_whisper();
            settle(&mut o, &format!("w{i}"), WhisperOutcome::Spoken);
        }
        assert_eq!(o.compact(), 10);
        assert!(o.events().is_empty());

        o.apply(OverlayEvent::LocationChanged {
            location: Location::ErodedRuins,
        });
        o.apply(OverlayEvent::MuteToggled);
        assert!(o.replay_matches());

        let rebuilt = Overlay::replay_from(o.checkpoint().clone(), o.events());
        assert_eq!(rebuilt.state(), o.state());
        // The checkpoint only holds what history still shows.
        let texts: Vec<&str> = o.checkpoint().history().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["w4", "w3", "w2"]);
    }

    #[test]
    fn truncated_log_does_not_match() {
        let mut o = Overlay::new();
        o.apply(OverlayEvent::MuteToggled);
        o.apply(OverlayEvent::LocationChanged {
            location: Location::WhisperingGrass,
        });
        assert!(o.replay_matches());
        let partial = Overlay::replay_from(o.checkpoint().clone(), &o.events()[..1]);
        assert_ne!(partial.state(), o.state());
    }

    #[test]
    fn every_overlay_replays_from_the_default_state() {
        let mut o = Overlay::new();
        o.apply(OverlayEvent::LocationChanged {
            location: Location::ErodedRuins,
        });
        o.apply(OverlayEvent::MuteToggled);
        assert_eq!(Overlay::replay(o.events()).state(), o.state());
    }

    #[test]
    fn replay_equivalence() {
        let mut o = Overlay::new();
        o.apply(OverlayEvent::LocationChanged {
            location: Location::ErodedRuins,
        });
        for i in 0..4 {
            o.begin_whisper();
            if i == 2 {
                o.apply(OverlayEvent::LocationChanged {
                    location: Location::WhisperingGrass,
                });
            }
            settle(&mut o, &format!("w{i}"), WhisperOutcome::Spoken);
        }
        o.apply(OverlayEvent::MuteToggled);

        let replayed = Overlay::replay(o.events());
        assert_eq!(replayed.state(), o.state());
        assert_eq!(replayed.state().state_hash(), o.state().state_hash());
    }
}
