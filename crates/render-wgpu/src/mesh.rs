use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use skyrealm_render::RuinShape;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
        }
    }
}

/// Indexed triangle list.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Stitch a `rows x cols` vertex grid into quads.
    fn stitch_grid(&mut self, base: u32, rows: u32, cols: u32) {
        let stride = cols + 1;
        for row in 0..rows {
            for col in 0..cols {
                let a = base + row * stride + col;
                let b = base + (row + 1) * stride + col;
                let c = base + (row + 1) * stride + col + 1;
                let d = base + row * stride + col + 1;
                self.indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
    }
}

/// Vertical plane in XY, centered on the origin, facing +Z.
///
/// `uv.y` runs 0 at the bottom edge to 1 at the top.
pub fn plane_xy(width: f32, height: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let y = height / 2.0 - v * height;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let x = u * width - width / 2.0;
            mesh.vertices.push(Vertex::new(
                Vec3::new(x, y, 0.0),
                Vec3::Z,
                Vec2::new(u, 1.0 - v),
            ));
        }
    }
    mesh.stitch_grid(0, height_segments, width_segments);
    mesh
}

/// A single grass blade.
pub fn grass_blade(width: f32, height: f32, height_segments: u32) -> MeshData {
    plane_xy(width, height, 1, height_segments)
}

/// Flat square in XZ at `y`, facing up.
pub fn ground(size: f32, y: f32) -> MeshData {
    let h = size / 2.0;
    let corners = [
        (Vec3::new(-h, y, -h), Vec2::new(0.0, 0.0)),
        (Vec3::new(-h, y, h), Vec2::new(0.0, 1.0)),
        (Vec3::new(h, y, h), Vec2::new(1.0, 1.0)),
        (Vec3::new(h, y, -h), Vec2::new(1.0, 0.0)),
    ];
    MeshData {
        vertices: corners
            .iter()
            .map(|&(p, uv)| Vertex::new(p, Vec3::Y, uv))
            .collect(),
        indices: vec![0, 1, 2, 2, 3, 0],
    }
}

/// Torus around Z in the XY plane, swept through `arc` radians.
pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32, arc: f32) -> MeshData {
    let mut mesh = MeshData::default();
    for j in 0..=radial_segments {
        let v = j as f32 / radial_segments as f32 * TAU;
        for i in 0..=tubular_segments {
            let u = i as f32 / tubular_segments as f32 * arc;
            let ring = radius + tube * v.cos();
            let position = Vec3::new(ring * u.cos(), ring * u.sin(), tube * v.sin());
            let center = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
            mesh.vertices.push(Vertex::new(
                position,
                (position - center).normalize(),
                Vec2::new(
                    i as f32 / tubular_segments as f32,
                    j as f32 / radial_segments as f32,
                ),
            ));
        }
    }
    mesh.stitch_grid(0, radial_segments, tubular_segments);
    mesh
}

/// UV sphere.
pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let normal = Vec3::new(
                -(u * TAU).cos() * (v * PI).sin(),
                (v * PI).cos(),
                (u * TAU).sin() * (v * PI).sin(),
            );
            mesh.vertices
                .push(Vertex::new(normal * radius, normal, Vec2::new(u, 1.0 - v)));
        }
    }
    mesh.stitch_grid(0, height_segments, width_segments);
    mesh
}

/// Lathe a `(ring radius, y, normal_r, normal_y)` profile around Y.
fn lathe(profile: &[(f32, f32, f32, f32)], radial_segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let rows = profile.len().saturating_sub(1) as u32;
    for (p, &(r, y, nr, ny)) in profile.iter().enumerate() {
        for i in 0..=radial_segments {
            let phi = i as f32 / radial_segments as f32 * TAU;
            let (s, c) = phi.sin_cos();
            mesh.vertices.push(Vertex::new(
                Vec3::new(r * s, y, r * c),
                Vec3::new(nr * s, ny, nr * c).normalize_or_zero(),
                Vec2::new(i as f32 / radial_segments as f32, p as f32 / rows.max(1) as f32),
            ));
        }
    }
    mesh.stitch_grid(0, rows, radial_segments);
    mesh
}

/// Capsule along Y: a cylinder of `length` capped by two hemispheres.
pub fn capsule(radius: f32, length: f32, cap_segments: u32, radial_segments: u32) -> MeshData {
    let half = length / 2.0;
    let mut profile = Vec::with_capacity(2 * (cap_segments as usize + 1));
    for s in 0..=cap_segments {
        let theta = -FRAC_PI_2 + s as f32 / cap_segments as f32 * FRAC_PI_2;
        let (sin, cos) = theta.sin_cos();
        profile.push((radius * cos, -half + radius * sin, cos, sin));
    }
    for s in 0..=cap_segments {
        let theta = s as f32 / cap_segments as f32 * FRAC_PI_2;
        let (sin, cos) = theta.sin_cos();
        profile.push((radius * cos, half + radius * sin, cos, sin));
    }
    // Lathe rows run top to bottom.
    profile.reverse();
    lathe(&profile, radial_segments)
}

/// Cone along Y with its apex up, centered on the origin, with a base cap.
pub fn cone(radius: f32, height: f32, radial_segments: u32) -> MeshData {
    let half = height / 2.0;
    let slope = radius / height;
    let mut mesh = lathe(
        &[(0.0, half, 1.0, slope), (radius, -half, 1.0, slope)],
        radial_segments,
    );

    let center = mesh.vertices.len() as u32;
    mesh.vertices
        .push(Vertex::new(Vec3::new(0.0, -half, 0.0), -Vec3::Y, Vec2::splat(0.5)));
    for i in 0..=radial_segments {
        let phi = i as f32 / radial_segments as f32 * TAU;
        let (s, c) = phi.sin_cos();
        mesh.vertices.push(Vertex::new(
            Vec3::new(radius * s, -half, radius * c),
            -Vec3::Y,
            Vec2::new(0.5 + 0.5 * s, 0.5 + 0.5 * c),
        ));
    }
    for i in 0..radial_segments {
        mesh.indices
            .extend_from_slice(&[center, center + 2 + i, center + 1 + i]);
    }
    mesh
}

/// Regular dodecahedron with flat-shaded pentagonal faces.
pub fn dodecahedron(radius: f32) -> MeshData {
    let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let inv = 1.0 / phi;

    let mut corners = Vec::with_capacity(20);
    for x in [-1.0, 1.0] {
        for y in [-1.0, 1.0] {
            for z in [-1.0, 1.0] {
                corners.push(Vec3::new(x, y, z));
            }
        }
    }
    for a in [-1.0, 1.0] {
        for b in [-1.0, 1.0] {
            corners.push(Vec3::new(0.0, a * inv, b * phi));
            corners.push(Vec3::new(a * inv, b * phi, 0.0));
            corners.push(Vec3::new(a * phi, 0.0, b * inv));
        }
    }
    let corners: Vec<Vec3> = corners.iter().map(|c| c.normalize() * radius).collect();

    // Face normals of a dodecahedron are the icosahedron's vertices.
    let mut normals = Vec::with_capacity(12);
    for a in [-1.0, 1.0] {
        for b in [-1.0, 1.0] {
            normals.push(Vec3::new(a, 0.0, b * phi).normalize());
            normals.push(Vec3::new(a * phi, b, 0.0).normalize());
            normals.push(Vec3::new(0.0, a * phi, b).normalize());
        }
    }

    let mut mesh = MeshData::default();
    for normal in normals {
        let best = corners
            .iter()
            .map(|c| c.dot(normal))
            .fold(f32::MIN, f32::max);
        let mut face: Vec<Vec3> = corners
            .iter()
            .copied()
            .filter(|c| c.dot(normal) > best - radius * 1e-3)
            .collect();
        let centroid = face.iter().copied().sum::<Vec3>() / face.len() as f32;
        let tangent = (face[0] - centroid).normalize();
        let bitangent = normal.cross(tangent);
        face.sort_by(|a, b| {
            let angle = |p: &Vec3| {
                let d = *p - centroid;
                d.dot(bitangent).atan2(d.dot(tangent))
            };
            angle(a).total_cmp(&angle(b))
        });

        let base = mesh.vertices.len() as u32;
        for (k, corner) in face.iter().enumerate() {
            let t = k as f32 / face.len() as f32 * TAU;
            mesh.vertices.push(Vertex::new(
                *corner,
                normal,
                Vec2::new(0.5 + 0.5 * t.cos(), 0.5 + 0.5 * t.sin()),
            ));
        }
        for k in 1..face.len() as u32 - 1 {
            mesh.indices.extend_from_slice(&[base, base + k, base + k + 1]);
        }
    }
    mesh
}

/// Build the mesh for a ruin primitive.
pub fn ruin_mesh(shape: &RuinShape) -> MeshData {
    match *shape {
        RuinShape::Torus {
            radius,
            tube,
            radial_segments,
            tubular_segments,
            arc,
        } => torus(radius, tube, radial_segments, tubular_segments, arc),
        RuinShape::Capsule {
            radius,
            length,
            cap_segments,
            radial_segments,
        } => capsule(radius, length, cap_segments, radial_segments),
        RuinShape::Sphere {
            radius,
            width_segments,
            height_segments,
        } => sphere(radius, width_segments, height_segments),
        RuinShape::Cone {
            radius,
            height,
            radial_segments,
        } => cone(radius, height, radial_segments),
        RuinShape::Dodecahedron { radius } => dodecahedron(radius),
    }
}
