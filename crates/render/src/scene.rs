use glam::{EulerRot, Mat4, Quat, Vec3};

/// Convert a `0xRRGGBB` literal into linear-ish RGB floats in `[0, 1]`.
pub fn hex(rgb: u32) -> Vec3 {
    Vec3::new(
        ((rgb >> 16) & 0xff) as f32 / 255.0,
        ((rgb >> 8) & 0xff) as f32 / 255.0,
        (rgb & 0xff) as f32 / 255.0,
    )
}

/// Position plus XYZ Euler rotation (radians).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Placement {
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            rotation: Vec3::ZERO,
        }
    }

    pub fn rotated(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Vec3::new(x, y, z);
        self
    }

    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_rotation_translation(rotation, self.position)
    }
}

/// Perspective camera with orbit-control limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Largest angle from straight up the camera may reach (keeps it above ground).
    pub max_polar_angle: f32,
    pub auto_rotate: bool,
    /// Orbit speed in the scene framework's units (2π per 60 s at 1.0).
    pub auto_rotate_speed: f32,
    pub enable_pan: bool,
    pub enable_zoom: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub cast_shadow: bool,
    pub shadow_map_size: u32,
    pub shadow_extent: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub angle: f32,
    pub penumbra: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lights {
    pub ambient: AmbientLight,
    pub sun: DirectionalLight,
    pub rim: SpotLight,
}

/// Atmospheric sky dome parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sky {
    pub sun_position: Vec3,
    pub turbidity: f32,
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
    pub horizon: Vec3,
    pub zenith: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stars {
    pub radius: f32,
    pub depth: f32,
    pub count: u32,
    pub factor: f32,
    pub fade: bool,
    pub speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cloud {
    pub position: Vec3,
    pub opacity: f32,
    pub speed: f32,
    pub width: f32,
    pub depth: f32,
    pub segments: u32,
    pub color: Vec3,
}

/// The reflective salt-crust ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorLake {
    pub size: f32,
    pub height: f32,
    pub color: Vec3,
    pub roughness: f32,
    pub metalness: f32,
    pub mirror: f32,
    pub mix_strength: f32,
    pub blur: [f32; 2],
    pub resolution: u32,
}

/// Instanced, wind-animated grass field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrassField {
    pub instance_count: u32,
    pub blade_width: f32,
    pub blade_height: f32,
    pub height_segments: u32,
    pub inner_radius: f32,
    pub outer_radius: f32,
    /// Exponent applied to the uniform radial draw.
    pub radial_exponent: f32,
    pub min_height_scale: f32,
    pub max_height_scale: f32,
    pub root_color: Vec3,
    pub mid_color: Vec3,
    pub tip_color: Vec3,
}

/// Procedural ruin primitives. Dimensions follow the usual scene-graph
/// geometry conventions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuinShape {
    Torus {
        radius: f32,
        tube: f32,
        radial_segments: u32,
        tubular_segments: u32,
        arc: f32,
    },
    Capsule {
        radius: f32,
        length: f32,
        cap_segments: u32,
        radial_segments: u32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Cone {
        radius: f32,
        height: f32,
        radial_segments: u32,
    },
    Dodecahedron {
        radius: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ruin {
    pub name: &'static str,
    pub shape: RuinShape,
    pub placement: Placement,
    pub cast_shadow: bool,
}

/// Chalky bone-white material shared by every ruin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuinMaterial {
    pub color: Vec3,
    pub roughness: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub reflectivity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Vec3,
    pub near: f32,
    pub far: f32,
}

impl Fog {
    /// Linear fog factor at `distance`: 0 = clear, 1 = fully fogged.
    pub fn factor(&self, distance: f32) -> f32 {
        ((distance - self.near) / (self.far - self.near)).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bloom {
    pub luminance_threshold: f32,
    pub intensity: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vignette {
    pub offset: f32,
    pub darkness: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostFx {
    pub bloom: Bloom,
    pub vignette: Vignette,
}

/// Declarative description of the whole sky realm.
///
/// Backends read it; nothing here changes at runtime except the clock that
/// drives the grass.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDescription {
    pub camera: CameraRig,
    pub lights: Lights,
    pub sky: Sky,
    pub stars: Stars,
    pub clouds: Vec<Cloud>,
    pub lake: MirrorLake,
    pub grass: GrassField,
    pub ruins: Vec<Ruin>,
    pub ruin_material: RuinMaterial,
    pub fog: Fog,
    pub post: PostFx,
    /// Seed for everything scattered at random (grass, debris tumble).
    pub seed: u64,
}

impl SceneDescription {
    /// The sky realm as designed.
    pub fn sky_realm(seed: u64) -> Self {
        // Tumble for the small debris piece; fixed per seed.
        let tumble = {
            let a = skyrealm_kernel::splitmix64(seed ^ 0xdeb2_15);
            let b = skyrealm_kernel::splitmix64(a);
            let c = skyrealm_kernel::splitmix64(b);
            let unit = |v: u64| (v >> 40) as f32 / (1u64 << 24) as f32;
            Vec3::new(unit(a), unit(b), unit(c))
        };

        Self {
            camera: CameraRig {
                position: Vec3::new(0.0, 10.0, 60.0),
                target: Vec3::ZERO,
                fov_degrees: 55.0,
                min_distance: 5.0,
                max_distance: 500.0,
                max_polar_angle: std::f32::consts::FRAC_PI_2 - 0.05,
                auto_rotate: true,
                auto_rotate_speed: 0.2,
                enable_pan: true,
                enable_zoom: true,
            },
            lights: Lights {
                ambient: AmbientLight {
                    color: hex(0xb8dbe6),
                    intensity: 0.6,
                },
                sun: DirectionalLight {
                    position: Vec3::new(100.0, 50.0, 50.0),
                    color: hex(0xfff8e7),
                    intensity: 2.0,
                    cast_shadow: true,
                    shadow_map_size: 2048,
                    shadow_extent: 200.0,
                },
                rim: SpotLight {
                    position: Vec3::new(-50.0, 50.0, -50.0),
                    color: hex(0xc9b8e6),
                    intensity: 1.5,
                    angle: 1.0,
                    penumbra: 1.0,
                },
            },
            sky: Sky {
                sun_position: Vec3::new(100.0, 20.0, 50.0),
                turbidity: 0.5,
                rayleigh: 0.5,
                mie_coefficient: 0.005,
                mie_directional_g: 0.7,
                horizon: hex(0xd4e9ed),
                zenith: hex(0xa8c0cc),
            },
            stars: Stars {
                radius: 300.0,
                depth: 50.0,
                count: 5000,
                factor: 4.0,
                fade: true,
                speed: 1.0,
            },
            clouds: vec![
                // Low lying heavy clouds
                Cloud {
                    position: Vec3::new(-100.0, 20.0, -100.0),
                    opacity: 0.6,
                    speed: 0.2,
                    width: 100.0,
                    depth: 20.0,
                    segments: 40,
                    color: hex(0xe6f5f8),
                },
                Cloud {
                    position: Vec3::new(100.0, 30.0, 100.0),
                    opacity: 0.6,
                    speed: 0.2,
                    width: 100.0,
                    depth: 20.0,
                    segments: 40,
                    color: hex(0xe6f5f8),
                },
                // Mid level
                Cloud {
                    position: Vec3::new(0.0, 60.0, -200.0),
                    opacity: 0.4,
                    speed: 0.1,
                    width: 200.0,
                    depth: 50.0,
                    segments: 50,
                    color: hex(0xffffff),
                },
                Cloud {
                    position: Vec3::new(150.0, 50.0, 0.0),
                    opacity: 0.4,
                    speed: 0.15,
                    width: 200.0,
                    depth: 50.0,
                    segments: 50,
                    color: hex(0xd4e9ed),
                },
                // High altitude wisps
                Cloud {
                    position: Vec3::new(0.0, 120.0, 0.0),
                    opacity: 0.2,
                    speed: 0.3,
                    width: 300.0,
                    depth: 10.0,
                    segments: 30,
                    color: hex(0xffffff),
                },
            ],
            lake: MirrorLake {
                size: 5000.0,
                height: -0.1,
                color: hex(0xd0e6f0),
                roughness: 0.05,
                metalness: 0.6,
                mirror: 1.0,
                mix_strength: 40.0,
                blur: [300.0, 100.0],
                resolution: 1024,
            },
            grass: GrassField {
                instance_count: 60_000,
                blade_width: 0.3,
                blade_height: 2.0,
                height_segments: 4,
                inner_radius: 60.0,
                outer_radius: 600.0,
                radial_exponent: 1.5,
                min_height_scale: 1.5,
                max_height_scale: 3.0,
                root_color: Vec3::new(0.0, 0.2, 0.25),
                mid_color: Vec3::new(0.2, 0.6, 0.3),
                tip_color: Vec3::new(0.8, 0.9, 0.6),
            },
            ruins: vec![
                Ruin {
                    name: "broken ring",
                    shape: RuinShape::Torus {
                        radius: 80.0,
                        tube: 12.0,
                        radial_segments: 32,
                        tubular_segments: 100,
                        arc: 4.0,
                    },
                    placement: Placement::at(-120.0, 40.0, -150.0).rotated(0.5, 0.5, 0.0),
                    cast_shadow: true,
                },
                Ruin {
                    name: "fallen monolith",
                    shape: RuinShape::Capsule {
                        radius: 15.0,
                        length: 120.0,
                        cap_segments: 8,
                        radial_segments: 32,
                    },
                    placement: Placement::at(120.0, 10.0, 80.0).rotated(0.0, 0.0, 1.4),
                    cast_shadow: true,
                },
                Ruin {
                    name: "floating sphere",
                    shape: RuinShape::Sphere {
                        radius: 60.0,
                        width_segments: 64,
                        height_segments: 64,
                    },
                    placement: Placement::at(0.0, 150.0, -400.0),
                    cast_shadow: false,
                },
                Ruin {
                    name: "buried arch",
                    shape: RuinShape::Torus {
                        radius: 30.0,
                        tube: 4.0,
                        radial_segments: 16,
                        tubular_segments: 100,
                        arc: 3.5,
                    },
                    placement: Placement::at(-40.0, -10.0, 40.0).rotated(0.0, -0.5, 0.0),
                    cast_shadow: true,
                },
                Ruin {
                    name: "distant needle",
                    shape: RuinShape::Cone {
                        radius: 10.0,
                        height: 200.0,
                        radial_segments: 32,
                    },
                    placement: Placement::at(200.0, 0.0, -200.0),
                    cast_shadow: true,
                },
                Ruin {
                    name: "debris",
                    shape: RuinShape::Dodecahedron { radius: 4.0 },
                    placement: Placement::at(25.0, 2.0, 25.0).rotated(tumble.x, tumble.y, tumble.z),
                    cast_shadow: true,
                },
            ],
            ruin_material: RuinMaterial {
                color: hex(0xf0f4f5),
                roughness: 0.4,
                clearcoat: 0.1,
                clearcoat_roughness: 0.2,
                reflectivity: 0.5,
            },
            fog: Fog {
                color: hex(0xd4e9ed),
                near: 80.0,
                far: 800.0,
            },
            post: PostFx {
                bloom: Bloom {
                    luminance_threshold: 0.85,
                    intensity: 1.2,
                    radius: 0.7,
                },
                vignette: Vignette {
                    offset: 0.1,
                    darkness: 0.4,
                },
            },
            seed,
        }
    }
}
