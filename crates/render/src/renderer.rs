use crate::clock::SceneClock;
use crate::scene::SceneDescription;
use skyrealm_kernel::OverlayState;
use std::fmt::Write;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads the scene, the overlay state and the clock, then
/// produces output. It never mutates overlay state; that belongs to the
/// session on the host thread.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame.
    fn render(
        &self,
        scene: &SceneDescription,
        overlay: &OverlayState,
        clock: &SceneClock,
    ) -> Self::Output;
}

/// Plain-text renderer for the CLI, logs and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(
        &self,
        scene: &SceneDescription,
        overlay: &OverlayState,
        clock: &SceneClock,
    ) -> String {
        let mut out = String::new();
        let cam = &scene.camera;
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "=== Sky Realm (t={:.2}s, frames={}, seed={}) ===",
            clock.elapsed(),
            clock.frames(),
            scene.seed
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) fov={:.0} orbit={:.0}..{:.0} auto_rotate={}",
            cam.position.x,
            cam.position.y,
            cam.position.z,
            cam.fov_degrees,
            cam.min_distance,
            cam.max_distance,
            cam.auto_rotate
        );
        let _ = writeln!(
            out,
            "Scene: {} grass blades, {} ruins, {} clouds, {} stars, fog {:.0}..{:.0}",
            scene.grass.instance_count,
            scene.ruins.len(),
            scene.clouds.len(),
            scene.stars.count,
            scene.fog.near,
            scene.fog.far
        );
        let _ = writeln!(out, "Region: {}", overlay.location());
        let status = match overlay.pending_location() {
            Some(at) => format!("listening at {at}"),
            None => "idle".to_string(),
        };
        let _ = writeln!(
            out,
            "Wind: {status}, {}",
            if overlay.muted() { "muted" } else { "sound on" }
        );
        let _ = writeln!(out, "Whispers: {}", overlay.history().len());
        for entry in overlay.history() {
            let _ = writeln!(
                out,
                "  [{}] \"{}\" ({})",
                entry.id.short(),
                entry.text,
                entry.location
            );
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyrealm_common::{Location, WhisperEntry, WhisperOutcome};
    use skyrealm_kernel::{Overlay, OverlayEvent};
    use std::time::Duration;

    #[test]
    fn debug_renderer_fresh_overlay() {
        let scene = SceneDescription::sky_realm(5);
        let overlay = Overlay::new();
        let output = DebugTextRenderer::new().render(&scene, overlay.state(), &SceneClock::new());

        assert!(output.contains("seed=5"));
        assert!(output.contains("Region: Mirror Void (Salt Lake)"));
        assert!(output.contains("idle, muted"));
        assert!(output.contains("Whispers: 0"));
        assert!(output.contains("60000 grass blades"));
    }

    #[test]
    fn debug_renderer_lists_history_and_listening() {
        let scene = SceneDescription::sky_realm(0);
        let mut overlay = Overlay::new();
        overlay.apply(OverlayEvent::WhisperStarted {
            location: Location::ErodedRuins,
        });
        overlay.apply(OverlayEvent::WhisperSettled {
            entry: WhisperEntry::new("white bones of towers", Location::ErodedRuins),
            outcome: WhisperOutcome::Spoken,
        });
        overlay.apply(OverlayEvent::WhisperStarted {
            location: Location::WhisperingGrass,
        });
        let mut clock = SceneClock::new();
        clock.advance(Duration::from_millis(500));

        let output = DebugTextRenderer::new().render(&scene, overlay.state(), &clock);
        assert!(output.contains("t=0.50s"));
        assert!(output.contains("listening at Whispering Grass"));
        assert!(output.contains("\"white bones of towers\" (Eroded Tech"));
        assert!(output.contains("Whispers: 1"));
    }
}
