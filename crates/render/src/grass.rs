use crate::scene::GrassField;
use glam::{Mat4, Quat, Vec2, Vec3};
use skyrealm_kernel::splitmix64;
use tracing::debug;

/// One scattered grass blade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrassBlade {
    pub position: Vec3,
    pub yaw: f32,
    pub height_scale: f32,
}

impl GrassBlade {
    /// Instance matrix: translate, yaw, then stretch vertically.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::new(1.0, self.height_scale, 1.0),
            Quat::from_rotation_y(self.yaw),
            self.position,
        )
    }
}

/// Deterministic stream of unit floats in `[0, 1)`.
struct UnitStream(u64);

impl UnitStream {
    fn next(&mut self) -> f32 {
        self.0 = splitmix64(self.0);
        (self.0 >> 40) as f32 / (1u64 << 24) as f32
    }
}

/// Scatter the grass field over its annulus.
///
/// Same seed, same field. Radius is biased toward the inner edge by
/// `radial_exponent` so the near field stays dense.
pub fn scatter(field: &GrassField, seed: u64) -> Vec<GrassBlade> {
    let mut rng = UnitStream(seed);
    let span = field.outer_radius - field.inner_radius;
    let scale_span = field.max_height_scale - field.min_height_scale;

    debug!(count = field.instance_count, seed, "scattering grass");
    (0..field.instance_count)
        .map(|_| {
            let angle = rng.next() * std::f32::consts::TAU;
            let radius = field.inner_radius + rng.next().powf(field.radial_exponent) * span;
            let height_scale = field.min_height_scale + rng.next() * scale_span;
            let yaw = rng.next() * std::f32::consts::PI;
            GrassBlade {
                position: Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius),
                yaw,
                height_scale,
            }
        })
        .collect()
}

/// Horizontal wind displacement of a blade vertex.
///
/// `world_xz` is the vertex's resting position in world space, `v` its
/// height along the blade in `[0, 1]`. The result is added to the vertex in
/// blade space. The WGSL vertex shader carries the same formula.
pub fn wind_offset(time: f32, world_xz: Vec2, v: f32) -> Vec2 {
    if v <= 0.1 {
        return Vec2::ZERO;
    }
    let wave_big = (time * 0.5 + world_xz.x * 0.05 + world_xz.y * 0.05).sin();
    let wave_small = (time * 2.0 + world_xz.x * 0.5 + world_xz.y * 0.2).sin();
    let lean = v * v;
    Vec2::new(
        (wave_big * 1.5 + wave_small * 0.5) * lean,
        (wave_big * 0.5 + wave_small * 0.2) * lean,
    )
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Blade colour at height `v`: root to mid linearly, then toward the tip
/// over the top 30%.
pub fn blade_color(field: &GrassField, v: f32) -> Vec3 {
    let base = field.root_color.lerp(field.mid_color, v);
    base.lerp(field.tip_color, smoothstep(0.7, 1.0, v))
}
