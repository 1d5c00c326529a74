use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use skyrealm_kernel::splitmix64;
use skyrealm_render::{Cloud, Stars};
use std::f32::consts::TAU;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct StarPoint {
    pub position: [f32; 3],
    pub brightness: f32,
}

/// One soft billboard making up part of a cloud bank.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CloudPuff {
    /// xyz = center, w = half size.
    pub center: [f32; 4],
    /// rgb = colour, a = opacity.
    pub color: [f32; 4],
    /// x = drift speed, y = phase.
    pub drift: [f32; 4],
}

struct Unit(u64);

impl Unit {
    fn next(&mut self) -> f32 {
        self.0 = splitmix64(self.0);
        (self.0 >> 40) as f32 / (1u64 << 24) as f32
    }
}

/// Star field in a spherical shell `[radius, radius + depth]`.
///
/// Outer stars are dimmer so the shell fades with distance.
pub fn star_field(stars: &Stars, seed: u64) -> Vec<StarPoint> {
    let mut rng = Unit(seed ^ 0x57a2_5eed);
    let mut r = stars.radius + stars.depth;
    let step = stars.depth / stars.count.max(1) as f32;
    (0..stars.count)
        .map(|_| {
            r -= step * rng.next();
            let polar = (1.0 - 2.0 * rng.next()).clamp(-1.0, 1.0).acos();
            let azimuth = rng.next() * TAU;
            let p = Vec3::new(
                r * polar.sin() * azimuth.sin(),
                r * polar.cos(),
                r * polar.sin() * azimuth.cos(),
            );
            let brightness = if stars.fade {
                1.0 - (r - stars.radius) / stars.depth.max(f32::EPSILON)
            } else {
                1.0
            };
            StarPoint {
                position: p.to_array(),
                brightness: brightness.clamp(0.0, 1.0),
            }
        })
        .collect()
}

/// Scatter a cloud's puffs inside its `width x depth` footprint.
pub fn cloud_puffs(cloud: &Cloud, seed: u64) -> Vec<CloudPuff> {
    let salt = (cloud.position.x.to_bits() as u64) ^ ((cloud.position.z.to_bits() as u64) << 32);
    let mut rng = Unit(seed ^ salt);
    let base_size = cloud.width / cloud.segments.max(1) as f32 * 4.0;
    (0..cloud.segments)
        .map(|_| {
            let offset = Vec3::new(
                (rng.next() - 0.5) * cloud.width,
                (rng.next() - 0.5) * cloud.depth * 0.5,
                (rng.next() - 0.5) * cloud.depth,
            );
            let size = base_size * (0.5 + rng.next());
            let c = cloud.position + offset;
            CloudPuff {
                center: [c.x, c.y, c.z, size],
                color: [cloud.color.x, cloud.color.y, cloud.color.z, cloud.opacity],
                drift: [cloud.speed, rng.next() * TAU, 0.0, 0.0],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyrealm_render::SceneDescription;

    #[test]
    fn stars_sit_in_shell() {
        let stars = SceneDescription::sky_realm(0).stars;
        let field = star_field(&stars, 11);
        assert_eq!(field.len(), 5000);
        for star in &field {
            let r = Vec3::from_array(star.position).length();
            assert!(r >= stars.radius - 1e-2 && r <= stars.radius + stars.depth + 1e-2);
            assert!((0.0..=1.0).contains(&star.brightness));
        }
    }

    #[test]
    fn stars_are_seeded() {
        let stars = SceneDescription::sky_realm(0).stars;
        assert_eq!(star_field(&stars, 1), star_field(&stars, 1));
        assert_ne!(star_field(&stars, 1), star_field(&stars, 2));
    }

    #[test]
    fn puffs_stay_in_footprint() {
        let scene = SceneDescription::sky_realm(0);
        for cloud in &scene.clouds {
            let puffs = cloud_puffs(cloud, 0);
            assert_eq!(puffs.len(), cloud.segments as usize);
            for puff in puffs {
                let c = Vec3::new(puff.center[0], puff.center[1], puff.center[2]);
                let d = c - cloud.position;
                assert!(d.x.abs() <= cloud.width / 2.0 + 1e-3);
                assert!(d.z.abs() <= cloud.depth / 2.0 + 1e-3);
                assert_eq!(puff.color[3], cloud.opacity);
            }
        }
    }
}
