use skyrealm_common::{Location, WhisperId};
use skyrealm_kernel::{OutcomeTally, Overlay, OverlayEvent, OverlayState};

/// Overlay inspector for developer tooling.
///
/// Read-only queries against overlay state, for the desktop debug panel
/// and the CLI.
pub struct OverlayInspector;

impl OverlayInspector {
    /// Produce a summary of the overlay state and its event log.
    pub fn summary(state: &OverlayState, events: &[OverlayEvent]) -> OverlaySummary {
        OverlaySummary {
            location: state.location(),
            pending: state.pending_location(),
            muted: state.muted(),
            history_len: state.history().len(),
            tally: state.tally(),
            event_count: events.len(),
            state_hash: state.state_hash(),
        }
    }

    /// Detail for the history entry at `index` (0 = newest).
    pub fn inspect_entry(state: &OverlayState, index: usize) -> Option<EntryInfo> {
        state.history().get(index).map(|entry| EntryInfo {
            id: entry.id,
            location: entry.location,
            words: entry.text.split_whitespace().count(),
            created_at: entry.created_at.to_rfc3339(),
        })
    }

    /// Ids in history order, newest first.
    pub fn list_entries(state: &OverlayState) -> Vec<WhisperId> {
        state.history().iter().map(|e| e.id).collect()
    }

    /// Whether the overlay's log, replayed onto its checkpoint, reproduces
    /// its current state.
    pub fn replay_matches(overlay: &Overlay) -> bool {
        overlay.replay_matches()
    }
}

/// Summary of overlay state for the inspector.
#[derive(Debug, Clone)]
pub struct OverlaySummary {
    pub location: Location,
    pub pending: Option<Location>,
    pub muted: bool,
    pub history_len: usize,
    pub tally: OutcomeTally,
    pub event_count: usize,
    pub state_hash: u64,
}

impl std::fmt::Display for OverlaySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Overlay: location={} listening={} muted={} history={} spoken={} silent={} lost={} events={} hash={:016x}",
            self.location.slug(),
            self.pending.is_some(),
            self.muted,
            self.history_len,
            self.tally.spoken,
            self.tally.silent,
            self.tally.lost,
            self.event_count,
            self.state_hash,
        )
    }
}

/// Detailed info about a single whisper entry.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub id: WhisperId,
    pub location: Location,
    pub words: usize,
    pub created_at: String,
}

impl std::fmt::Display for EntryInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Whisper [{}] at {} words={} created={}",
            self.id.short(),
            self.location.slug(),
            self.words,
            self.created_at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyrealm_common::{WhisperEntry, WhisperOutcome};

    fn overlay_with_two_whispers() -> Overlay {
        let mut overlay = Overlay::new();
        for (text, outcome) in [
            ("salt holds the sky", WhisperOutcome::Spoken),
            ("...the wind is silent...", WhisperOutcome::Silent),
        ] {
            let at = overlay.begin_whisper().unwrap();
            overlay.apply(OverlayEvent::WhisperSettled {
                entry: WhisperEntry::new(text, at),
                outcome,
            });
        }
        overlay.apply(OverlayEvent::LocationChanged {
            location: Location::ErodedRuins,
        });
        overlay
    }

    #[test]
    fn summary_fresh_overlay() {
        let overlay = Overlay::new();
        let summary = OverlayInspector::summary(overlay.state(), overlay.events());
        assert_eq!(summary.location, Location::MirrorVoid);
        assert!(summary.pending.is_none());
        assert!(summary.muted);
        assert_eq!(summary.history_len, 0);
        assert_eq!(summary.event_count, 0);
    }

    #[test]
    fn summary_counts_outcomes_and_events() {
        let overlay = overlay_with_two_whispers();
        let summary = OverlayInspector::summary(overlay.state(), overlay.events());
        assert_eq!(summary.history_len, 2);
        assert_eq!(summary.tally.spoken, 1);
        assert_eq!(summary.tally.silent, 1);
        assert_eq!(summary.event_count, 5);
        assert_eq!(summary.location, Location::ErodedRuins);
    }

    #[test]
    fn inspect_entry_newest_first() {
        let overlay = overlay_with_two_whispers();
        let newest = OverlayInspector::inspect_entry(overlay.state(), 0).unwrap();
        assert_eq!(newest.words, 4);
        assert_eq!(newest.location, Location::MirrorVoid);
        assert!(OverlayInspector::inspect_entry(overlay.state(), 2).is_none());
    }

    #[test]
    fn list_entries_in_history_order() {
        let overlay = overlay_with_two_whispers();
        let ids = OverlayInspector::list_entries(overlay.state());
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], overlay.state().history()[0].id);
    }

    #[test]
    fn replay_reproduces_state() {
        let overlay = overlay_with_two_whispers();
        assert!(OverlayInspector::replay_matches(&overlay));
    }

    #[test]
    fn replay_survives_compaction() {
        let mut overlay = overlay_with_two_whispers();
        overlay.compact();
        overlay.apply(OverlayEvent::MuteToggled);
        assert!(OverlayInspector::replay_matches(&overlay));
        assert_eq!(
            OverlayInspector::summary(overlay.state(), overlay.events()).event_count,
            1
        );
    }

    #[test]
    fn summary_display() {
        let overlay = Overlay::new();
        let s = format!("{}", OverlayInspector::summary(overlay.state(), overlay.events()));
        assert!(s.contains("location=mirror-void"));
        assert!(s.contains("muted=true"));
    }

    #[test]
    fn entry_display() {
        let overlay = overlay_with_two_whispers();
        let info = OverlayInspector::inspect_entry(overlay.state(), 1).unwrap();
        let s = format!("{info}");
        assert!(s.contains(&info.id.short()));
        assert!(s.contains("mirror-void"));
    }
}
