//! wgpu render backend for the sky realm.
//!
//! Draws the gradient sky, star shell, mirrored ruins under a tinted lake,
//! the ruins themselves, wind-bent instanced grass, drifting cloud puffs and
//! a vignette. The camera orbits the origin.
//!
//! # Invariants
//! - The renderer never touches overlay state.
//! - Camera motion is not part of the overlay session.
//! - Geometry is built once; per frame only camera and time change.

mod camera;
mod gpu;
mod mesh;
mod points;
mod shaders;

pub use camera::OrbitCamera;
pub use gpu::{WgpuRenderer, mirror_matrix, vignette_alpha};
pub use mesh::{MeshData, Vertex, ruin_mesh};
