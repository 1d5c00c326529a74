//! Rendering Adapter: the sky realm as data, plus a renderer-agnostic
//! interface.
//!
//! # Invariants
//! - Renderers read overlay state; they never mutate it.
//! - The scene is static apart from the clock driving the grass wind.
//! - Grass scatter is deterministic per seed.

mod clock;
mod grass;
mod renderer;
mod scene;

pub use clock::SceneClock;
pub use grass::{GrassBlade, blade_color, scatter, wind_offset};
pub use renderer::{DebugTextRenderer, Renderer};
pub use scene::{
    AmbientLight, Bloom, CameraRig, Cloud, DirectionalLight, Fog, GrassField, Lights, MirrorLake,
    Placement, PostFx, Ruin, RuinMaterial, RuinShape, SceneDescription, Sky, SpotLight, Stars,
    Vignette, hex,
};

pub fn crate_info() -> &'static str {
    "skyrealm-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
