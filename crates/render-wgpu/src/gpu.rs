use crate::camera::OrbitCamera;
use crate::mesh::{self, MeshData, Vertex};
use crate::points::{self, CloudPuff, StarPoint};
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};
use skyrealm_render::{SceneClock, SceneDescription, Vignette, scatter};
use tracing::{debug, info};
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// Opacity of the lake tint over the mirrored ruins, seen from straight above.
const LAKE_TINT: f32 = 0.55;
const REFLECTION_DIM: f32 = 0.8;

const MESH_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    3 => Float32x4,
    4 => Float32x4,
    5 => Float32x4,
    6 => Float32x4,
    7 => Float32x4,
];
const STAR_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32];
const PUFF_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x4, 1 => Float32x4, 2 => Float32x4];

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    inv_view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    camera_right: [f32; 4],
    camera_up: [f32; 4],
    fog_color: [f32; 4],
    fog_range: [f32; 4],
    sun_dir: [f32; 4],
    sun_color: [f32; 4],
    ambient: [f32; 4],
    rim_pos: [f32; 4],
    rim_color: [f32; 4],
    rim_cone: [f32; 4],
    sky_horizon: [f32; 4],
    sky_zenith: [f32; 4],
    sky_sun: [f32; 4],
    material: [f32; 4],
    lake: [f32; 4],
    grass_root: [f32; 4],
    grass_mid: [f32; 4],
    grass_tip: [f32; 4],
    vignette: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
}

impl InstanceData {
    fn new(model: Mat4, color: [f32; 4]) -> Self {
        let cols = model.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color,
        }
    }
}

/// Scene colours are authored in sRGB; the surface expects linear values.
fn linear(c: Vec3) -> Vec3 {
    c.powf(2.2)
}

fn rgba(c: Vec3, a: f32) -> [f32; 4] {
    [c.x, c.y, c.z, a]
}

/// Reflection across the horizontal plane `y = height`.
pub fn mirror_matrix(height: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, height, 0.0))
        * Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0))
        * Mat4::from_translation(Vec3::new(0.0, -height, 0.0))
}

/// Edge darkening at screen `uv`; the vignette fragment shader does the same.
pub fn vignette_alpha(uv: Vec2, vignette: &Vignette) -> f32 {
    let d = (uv - Vec2::splat(0.5)).length() * std::f32::consts::SQRT_2;
    let t = ((d - vignette.offset) / (1.0 - vignette.offset)).clamp(0.0, 1.0);
    vignette.darkness * t * t * (3.0 - 2.0 * t)
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_index_buffer")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }
}

struct PipelineSpec<'a> {
    label: &'a str,
    body: &'a str,
    vs: &'a str,
    fs: &'a str,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    topology: wgpu::PrimitiveTopology,
    blend: wgpu::BlendState,
    depth_write: bool,
    depth_compare: wgpu::CompareFunction,
}

fn build_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    surface_format: wgpu::TextureFormat,
    spec: PipelineSpec<'_>,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(spec.label),
        source: wgpu::ShaderSource::Wgsl(shaders::with_globals(spec.body).into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some(spec.vs),
            compilation_options: Default::default(),
            buffers: spec.buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some(spec.fs),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(spec.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: spec.topology,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: spec.depth_write,
            depth_compare: spec.depth_compare,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

fn mesh_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &MESH_ATTRIBUTES,
    }
}

fn instance_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<InstanceData>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &INSTANCE_ATTRIBUTES,
    }
}

/// wgpu renderer for the sky realm.
///
/// All geometry is built once from the [`SceneDescription`]; per frame only
/// the globals uniform (camera, time) changes.
pub struct WgpuRenderer {
    scene: SceneDescription,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    sky_pipeline: wgpu::RenderPipeline,
    star_pipeline: wgpu::RenderPipeline,
    ruin_pipeline: wgpu::RenderPipeline,
    lake_pipeline: wgpu::RenderPipeline,
    grass_pipeline: wgpu::RenderPipeline,
    cloud_pipeline: wgpu::RenderPipeline,
    vignette_pipeline: wgpu::RenderPipeline,
    ruins: Vec<GpuMesh>,
    ruin_instances: wgpu::Buffer,
    lake: GpuMesh,
    blade: GpuMesh,
    grass_instances: wgpu::Buffer,
    grass_count: u32,
    stars: wgpu::Buffer,
    star_count: u32,
    puffs: wgpu::Buffer,
    puff_count: u32,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        scene: &SceneDescription,
    ) -> Self {
        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("globals_buffer"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let opaque = wgpu::BlendState::REPLACE;
        let blended = wgpu::BlendState::ALPHA_BLENDING;
        let overlay = |label: &'static str,
                       body: &'static str,
                       vs: &'static str,
                       fs: &'static str|
         -> PipelineSpec<'static> {
            PipelineSpec {
            label,
            body,
            vs,
            fs,
            buffers: &[],
            topology: wgpu::PrimitiveTopology::TriangleList,
            blend: blended,
            depth_write: false,
            depth_compare: wgpu::CompareFunction::Always,
            }
        };

        let sky_pipeline = build_pipeline(
            device,
            &layout,
            surface_format,
            PipelineSpec {
                blend: opaque,
                ..overlay("sky_pipeline", shaders::SKY_SHADER, "vs_sky", "fs_sky")
            },
        );
        let vignette_pipeline = build_pipeline(
            device,
            &layout,
            surface_format,
            overlay(
                "vignette_pipeline",
                shaders::VIGNETTE_SHADER,
                "vs_vignette",
                "fs_vignette",
            ),
        );

        let star_pipeline = build_pipeline(
            device,
            &layout,
            surface_format,
            PipelineSpec {
                label: "star_pipeline",
                body: shaders::STAR_SHADER,
                vs: "vs_star",
                fs: "fs_star",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<StarPoint>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &STAR_ATTRIBUTES,
                }],
                topology: wgpu::PrimitiveTopology::PointList,
                blend: blended,
                depth_write: false,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );

        let ruin_pipeline = build_pipeline(
            device,
            &layout,
            surface_format,
            PipelineSpec {
                label: "ruin_pipeline",
                body: shaders::RUIN_SHADER,
                vs: "vs_ruin",
                fs: "fs_ruin",
                buffers: &[mesh_layout(), instance_layout()],
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: opaque,
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );

        let lake_pipeline = build_pipeline(
            device,
            &layout,
            surface_format,
            PipelineSpec {
                label: "lake_pipeline",
                body: shaders::LAKE_SHADER,
                vs: "vs_lake",
                fs: "fs_lake",
                buffers: &[mesh_layout()],
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: blended,
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );

        let grass_pipeline = build_pipeline(
            device,
            &layout,
            surface_format,
            PipelineSpec {
                label: "grass_pipeline",
                body: shaders::GRASS_SHADER,
                vs: "vs_grass",
                fs: "fs_grass",
                buffers: &[mesh_layout(), instance_layout()],
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: opaque,
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );

        let cloud_pipeline = build_pipeline(
            device,
            &layout,
            surface_format,
            PipelineSpec {
                label: "cloud_pipeline",
                body: shaders::CLOUD_SHADER,
                vs: "vs_cloud",
                fs: "fs_cloud",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<CloudPuff>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &PUFF_ATTRIBUTES,
                }],
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: blended,
                depth_write: false,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );

        // Ruins: one mesh each, instance i upright, instance n + i mirrored.
        let ruins: Vec<GpuMesh> = scene
            .ruins
            .iter()
            .map(|ruin| GpuMesh::upload(device, ruin.name, &mesh::ruin_mesh(&ruin.shape)))
            .collect();
        let albedo = linear(scene.ruin_material.color);
        let mirror = mirror_matrix(scene.lake.height);
        let mut instances: Vec<InstanceData> = scene
            .ruins
            .iter()
            .map(|ruin| InstanceData::new(ruin.placement.matrix(), rgba(albedo, 1.0)))
            .collect();
        instances.extend(scene.ruins.iter().map(|ruin| {
            InstanceData::new(
                mirror * ruin.placement.matrix(),
                rgba(albedo * REFLECTION_DIM, 1.0),
            )
        }));
        let ruin_instances = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ruin_instance_buffer"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let lake = GpuMesh::upload(device, "lake", &mesh::ground(scene.lake.size, scene.lake.height));

        let grass = &scene.grass;
        let blade = GpuMesh::upload(
            device,
            "grass_blade",
            &mesh::grass_blade(grass.blade_width, grass.blade_height, grass.height_segments),
        );
        let blades: Vec<InstanceData> = scatter(grass, scene.seed)
            .iter()
            .map(|b| InstanceData::new(b.matrix(), [1.0; 4]))
            .collect();
        let grass_instances = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grass_instance_buffer"),
            contents: bytemuck::cast_slice(&blades),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let star_points = points::star_field(&scene.stars, scene.seed);
        let stars = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("star_buffer"),
            contents: bytemuck::cast_slice(&star_points),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let cloud_puffs: Vec<CloudPuff> = scene
            .clouds
            .iter()
            .flat_map(|cloud| {
                points::cloud_puffs(cloud, scene.seed).into_iter().map(|mut puff| {
                    let c = linear(Vec3::new(puff.color[0], puff.color[1], puff.color[2]));
                    puff.color = rgba(c, puff.color[3]);
                    puff
                })
            })
            .collect();
        let puffs = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cloud_buffer"),
            contents: bytemuck::cast_slice(&cloud_puffs),
            usage: wgpu::BufferUsages::VERTEX,
        });

        info!(
            ruins = ruins.len(),
            grass = blades.len(),
            stars = star_points.len(),
            puffs = cloud_puffs.len(),
            "scene uploaded"
        );

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            scene: scene.clone(),
            globals_buffer,
            globals_bind_group,
            sky_pipeline,
            star_pipeline,
            ruin_pipeline,
            lake_pipeline,
            grass_pipeline,
            cloud_pipeline,
            vignette_pipeline,
            ruins,
            ruin_instances,
            lake,
            blade,
            grass_instances,
            grass_count: blades.len() as u32,
            stars,
            star_count: star_points.len() as u32,
            puffs,
            puff_count: cloud_puffs.len() as u32,
            depth_texture,
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        debug!(width, height, "resizing depth target");
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn scene(&self) -> &SceneDescription {
        &self.scene
    }

    fn globals(&self, camera: &OrbitCamera, time: f32) -> Globals {
        let scene = &self.scene;
        let lights = &scene.lights;
        let view_proj = camera.view_projection();
        let cos_outer = lights.rim.angle.cos();
        let cos_inner = (lights.rim.angle * (1.0 - lights.rim.penumbra))
            .cos()
            .max(cos_outer + 1e-3);

        Globals {
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            camera_pos: rgba(camera.position(), time),
            camera_right: rgba(camera.right(), 0.0),
            camera_up: rgba(camera.up(), 0.0),
            fog_color: rgba(linear(scene.fog.color), 1.0),
            fog_range: [scene.fog.near, scene.fog.far, 0.0, 0.0],
            sun_dir: rgba(lights.sun.position.normalize(), 0.0),
            sun_color: rgba(linear(lights.sun.color) * lights.sun.intensity, 1.0),
            ambient: rgba(linear(lights.ambient.color) * lights.ambient.intensity, 1.0),
            rim_pos: rgba(lights.rim.position, 1.0),
            rim_color: rgba(linear(lights.rim.color) * lights.rim.intensity, 1.0),
            rim_cone: [cos_outer, cos_inner, 0.0, 0.0],
            sky_horizon: rgba(linear(scene.sky.horizon), 1.0),
            sky_zenith: rgba(linear(scene.sky.zenith), 1.0),
            sky_sun: rgba(scene.sky.sun_position.normalize(), 0.0),
            material: rgba(linear(scene.ruin_material.color), scene.ruin_material.roughness),
            lake: rgba(linear(scene.lake.color), LAKE_TINT),
            grass_root: rgba(linear(scene.grass.root_color), 1.0),
            grass_mid: rgba(linear(scene.grass.mid_color), 1.0),
            grass_tip: rgba(linear(scene.grass.tip_color), 1.0),
            vignette: [scene.post.vignette.offset, scene.post.vignette.darkness, 0.0, 0.0],
        }
    }

    /// Render one frame: sky, stars, mirrored ruins, lake, ruins, grass,
    /// clouds, then the vignette.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        camera: &OrbitCamera,
        clock: &SceneClock,
    ) {
        queue.write_buffer(
            &self.globals_buffer,
            0,
            bytemuck::bytes_of(&self.globals(camera, clock.elapsed())),
        );

        let fog = linear(self.scene.fog.color);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: fog.x as f64,
                            g: fog.y as f64,
                            b: fog.z as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_bind_group(0, &self.globals_bind_group, &[]);

            pass.set_pipeline(&self.sky_pipeline);
            pass.draw(0..3, 0..1);

            pass.set_pipeline(&self.star_pipeline);
            pass.set_vertex_buffer(0, self.stars.slice(..));
            pass.draw(0..self.star_count, 0..1);

            // Reflections first so the lake tint lands on top of them.
            let n = self.ruins.len() as u32;
            pass.set_pipeline(&self.ruin_pipeline);
            pass.set_vertex_buffer(1, self.ruin_instances.slice(..));
            for (i, ruin) in self.ruins.iter().enumerate() {
                let i = i as u32;
                pass.set_vertex_buffer(0, ruin.vertex_buffer.slice(..));
                pass.set_index_buffer(ruin.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..ruin.index_count, 0, n + i..n + i + 1);
            }

            pass.set_pipeline(&self.lake_pipeline);
            pass.set_vertex_buffer(0, self.lake.vertex_buffer.slice(..));
            pass.set_index_buffer(self.lake.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..self.lake.index_count, 0, 0..1);

            pass.set_pipeline(&self.ruin_pipeline);
            pass.set_vertex_buffer(1, self.ruin_instances.slice(..));
            for (i, ruin) in self.ruins.iter().enumerate() {
                let i = i as u32;
                pass.set_vertex_buffer(0, ruin.vertex_buffer.slice(..));
                pass.set_index_buffer(ruin.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..ruin.index_count, 0, i..i + 1);
            }

            pass.set_pipeline(&self.grass_pipeline);
            pass.set_vertex_buffer(0, self.blade.vertex_buffer.slice(..));
            pass.set_vertex_buffer(1, self.grass_instances.slice(..));
            pass.set_index_buffer(self.blade.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..self.blade.index_count, 0, 0..self.grass_count);

            pass.set_pipeline(&self.cloud_pipeline);
            pass.set_vertex_buffer(0, self.puffs.slice(..));
            pass.draw(0..6, 0..self.puff_count);

            pass.set_pipeline(&self.vignette_pipeline);
            pass.draw(0..3, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn globals_layout_is_uniform_friendly() {
        // Two matrices plus twenty vec4s, no padding.
        assert_eq!(std::mem::size_of::<Globals>(), 2 * 64 + 20 * 16);
        assert_eq!(std::mem::size_of::<Globals>() % 16, 0);
    }

    #[test]
    fn instance_layout_matches_attributes() {
        assert_eq!(std::mem::size_of::<InstanceData>(), 80);
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        assert_eq!(std::mem::size_of::<StarPoint>(), 16);
        assert_eq!(std::mem::size_of::<CloudPuff>(), 48);
    }

    #[test]
    fn mirror_flips_height_about_the_lake() {
        let m = mirror_matrix(-0.1);
        let p = m.transform_point3(Vec3::new(3.0, 10.0, -2.0));
        assert!((p - Vec3::new(3.0, -10.2, -2.0)).length() < 1e-5);
        let on_plane = m.transform_point3(Vec3::new(0.0, -0.1, 0.0));
        assert!((on_plane.y + 0.1).abs() < 1e-6);
    }

    #[test]
    fn vignette_clear_in_centre_dark_in_corners() {
        let v = SceneDescription::sky_realm(0).post.vignette;
        assert_eq!(vignette_alpha(Vec2::splat(0.5), &v), 0.0);
        assert!((vignette_alpha(Vec2::ZERO, &v) - v.darkness).abs() < 1e-5);
        let mid = vignette_alpha(Vec2::new(0.5, 0.0), &v);
        assert!(mid > 0.0 && mid < v.darkness);
    }

    #[test]
    fn linear_conversion_endpoints() {
        assert_eq!(linear(Vec3::ZERO), Vec3::ZERO);
        assert_eq!(linear(Vec3::ONE), Vec3::ONE);
        assert!(linear(Vec3::splat(0.5)).x < 0.5);
    }
}
