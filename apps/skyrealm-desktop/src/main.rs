use anyhow::{Context, Result, anyhow};
use clap::Parser;
use egui::{Align2, Color32, Context as EguiContext, RichText};
use glam::Vec3;
use skyrealm_oracle::{GeminiClient, OracleConfig, TextGenerator};
use skyrealm_render::{SceneClock, SceneDescription};
use skyrealm_render_wgpu::{OrbitCamera, WgpuRenderer};
use skyrealm_session::{OverlaySession, SessionConfig};
use skyrealm_tools::OverlayInspector;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Scene seed used when `--seed` is not given.
const DEFAULT_SCENE_SEED: u64 = 42;

const INK: Color32 = Color32::from_rgb(36, 58, 66);
const INK_SOFT: Color32 = Color32::from_rgb(72, 104, 114);

#[derive(Parser)]
#[command(name = "skyrealm-desktop", about = "Sky Realm: wander the void and listen to the wind")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Seed for the grass scatter and the wanderer
    #[arg(long)]
    seed: Option<u64>,

    /// Start with camera auto-rotation off
    #[arg(long)]
    no_auto_rotate: bool,

    /// Seconds between location changes
    #[arg(long, default_value = "15")]
    location_interval_secs: u64,
}

/// Called when the orbit camera moves; only traces.
fn on_camera_moved(position: Vec3) {
    tracing::trace!(x = position.x, y = position.y, z = position.z, "camera moved");
}

/// Application state.
struct AppState {
    session: OverlaySession,
    scene: SceneDescription,
    camera: OrbitCamera,
    clock: SceneClock,
    show_inspector: bool,
    dragging: Option<MouseButton>,
    cursor: Option<(f64, f64)>,
    last_camera: Vec3,
    last_frame: Instant,
}

impl AppState {
    fn new(session: OverlaySession, scene: SceneDescription, auto_rotate: bool) -> Self {
        let mut camera = OrbitCamera::from_rig(&scene.camera);
        camera.auto_rotate = auto_rotate;
        let last_camera = camera.position();
        Self {
            session,
            scene,
            camera,
            clock: SceneClock::new(),
            show_inspector: false,
            dragging: None,
            cursor: None,
            last_camera,
            last_frame: Instant::now(),
        }
    }

    fn update(&mut self, dt: Duration) {
        let applied = self.session.pump();
        if applied > 0 {
            tracing::debug!(applied, "overlay events applied");
        }

        self.clock.advance(dt);
        self.camera.update(dt.as_secs_f32());

        let position = self.camera.position();
        if position.distance_squared(self.last_camera) > 1e-8 {
            on_camera_moved(position);
            self.last_camera = position;
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Space | KeyCode::Enter | KeyCode::NumpadEnter => {
                self.session.listen();
            }
            KeyCode::KeyM => {
                self.session.toggle_mute();
            }
            KeyCode::KeyR => {
                self.camera.auto_rotate = !self.camera.auto_rotate;
                tracing::info!(auto_rotate = self.camera.auto_rotate, "camera auto-rotate toggled");
            }
            KeyCode::F1 => {
                self.show_inspector = !self.show_inspector;
            }
            _ => {}
        }
    }

    fn handle_cursor(&mut self, x: f64, y: f64) {
        if let (Some(button), Some((px, py))) = (self.dragging, self.cursor) {
            let (dx, dy) = ((x - px) as f32, (y - py) as f32);
            match button {
                MouseButton::Left => self.camera.orbit(dx, dy),
                MouseButton::Right | MouseButton::Middle => self.camera.pan(dx, dy),
                _ => {}
            }
        }
        self.cursor = Some((x, y));
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        let state = self.session.state();
        let location = state.location();
        let listening = state.in_flight();
        let muted = state.muted();
        let history = state.history().to_vec();

        let mut listen_clicked = false;
        let mut mute_clicked = false;

        egui::Area::new(egui::Id::new("header"))
            .anchor(Align2::LEFT_TOP, [32.0, 28.0])
            .show(ctx, |ui| {
                ui.label(RichText::new("SKY REALM").size(30.0).strong().color(INK));
                ui.label(RichText::new("WIND SHEPHERD").size(12.0).color(INK_SOFT));
            });

        egui::Area::new(egui::Id::new("mute"))
            .anchor(Align2::RIGHT_TOP, [-32.0, 28.0])
            .show(ctx, |ui| {
                let label = if muted { "MUTED" } else { "SOUND ON" };
                if ui.button(RichText::new(label).color(INK)).clicked() {
                    mute_clicked = true;
                }
            });

        egui::Area::new(egui::Id::new("history"))
            .anchor(Align2::RIGHT_CENTER, [-32.0, 0.0])
            .show(ctx, |ui| {
                ui.set_max_width(340.0);
                for (i, entry) in history.iter().enumerate() {
                    let (alpha, size) = if i == 0 { (1.0, 18.0) } else { (0.5, 15.0) };
                    ui.label(
                        RichText::new(format!("\"{}\"", entry.text))
                            .italics()
                            .size(size)
                            .color(INK.gamma_multiply(alpha)),
                    );
                    ui.label(
                        RichText::new(entry.location.name())
                            .size(11.0)
                            .color(INK_SOFT.gamma_multiply(alpha)),
                    );
                    ui.add_space(14.0);
                }
            });

        egui::Area::new(egui::Id::new("region"))
            .anchor(Align2::LEFT_BOTTOM, [32.0, -32.0])
            .show(ctx, |ui| {
                ui.label(RichText::new("CURRENT REGION").size(11.0).color(INK_SOFT));
                ui.label(RichText::new(location.name()).size(20.0).color(INK));
            });

        egui::Area::new(egui::Id::new("trigger"))
            .anchor(Align2::RIGHT_BOTTOM, [-32.0, -32.0])
            .show(ctx, |ui| {
                let label = if listening {
                    "Listening..."
                } else {
                    "Commune with Wind"
                };
                let button = egui::Button::new(RichText::new(label).size(16.0).color(INK));
                if ui.add_enabled(!listening, button).clicked() {
                    listen_clicked = true;
                }
            });

        egui::Area::new(egui::Id::new("caption"))
            .anchor(Align2::CENTER_BOTTOM, [0.0, -12.0])
            .show(ctx, |ui| {
                ui.label(
                    RichText::new("THE VOID REFLECTS ALL")
                        .size(10.0)
                        .color(INK_SOFT.gamma_multiply(0.6)),
                );
            });

        if self.show_inspector {
            self.draw_inspector(ctx);
        }

        if listen_clicked {
            self.session.listen();
        }
        if mute_clicked {
            self.session.toggle_mute();
        }
    }

    fn draw_inspector(&self, ctx: &EguiContext) {
        let state = self.session.state();
        let events = self.session.events();
        let summary = OverlayInspector::summary(state, events);
        let replay_ok = OverlayInspector::replay_matches(self.session.overlay());
        let eye = self.camera.position();

        egui::SidePanel::left("inspector")
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.heading("Overlay");
                ui.separator();
                ui.label(format!("Region: {}", summary.location.slug()));
                ui.label(format!(
                    "Listening: {}",
                    summary
                        .pending
                        .map_or_else(|| "no".to_string(), |at| at.slug().to_string())
                ));
                ui.label(format!("Muted: {}", summary.muted));
                ui.label(format!(
                    "Spoken {} / Silent {} / Lost {}",
                    summary.tally.spoken, summary.tally.silent, summary.tally.lost
                ));
                ui.label(format!("Events: {}", summary.event_count));
                ui.label(format!("State hash: {:016x}", summary.state_hash));
                ui.label(format!("Replay: {}", if replay_ok { "OK" } else { "MISMATCH" }));
                ui.label(format!("Ticker: {}", if self.session.is_running() { "running" } else { "stopped" }));

                ui.separator();
                ui.heading("History");
                for i in 0..summary.history_len {
                    if let Some(info) = OverlayInspector::inspect_entry(state, i) {
                        ui.small(info.to_string());
                    }
                }

                ui.separator();
                ui.heading("Scene");
                ui.label(format!("Seed: {}", self.scene.seed));
                ui.label(format!("Time: {:.1}s  Frames: {}", self.clock.elapsed(), self.clock.frames()));
                ui.label(format!("Grass: {}", self.scene.grass.instance_count));
                ui.label(format!("Ruins: {}  Clouds: {}", self.scene.ruins.len(), self.scene.clouds.len()));
                ui.label(format!("Camera: ({:.1}, {:.1}, {:.1})", eye.x, eye.y, eye.z));
                ui.label(format!("Auto-rotate: {}", self.camera.auto_rotate));

                ui.separator();
                ui.small("F1: Inspector | Space: Listen | M: Mute | R: Rotate");
                ui.small("LMB: Orbit | RMB: Pan | Wheel: Zoom");
            });
    }
}

struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<Gpu> {
        let attrs = Window::default_attributes()
            .with_title("Sky Realm")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no compatible GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("skyrealm_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        self.state.camera.aspect = config.width as f32 / config.height as f32;

        let renderer = WgpuRenderer::new(
            &device,
            surface_format,
            config.width,
            config.height,
            &self.state.scene,
        );

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Gpu {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.state.last_frame).min(Duration::from_millis(100));
        self.state.last_frame = now;
        self.state.update(dt);

        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.renderer.render(
            &gpu.device,
            &gpu.queue,
            &view,
            &self.state.camera,
            &self.state.clock,
        );

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let state = &mut self.state;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });

        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match self.init_gpu(event_loop) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("failed to initialise graphics: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.state.session.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.config.width = new_size.width.max(1);
                    gpu.config.height = new_size.height.max(1);
                    gpu.surface.configure(&gpu.device, &gpu.config);
                    self.state.camera.aspect = gpu.config.width as f32 / gpu.config.height as f32;
                    gpu.renderer
                        .resize(&gpu.device, gpu.config.width, gpu.config.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.state.handle_key(key);
            }
            WindowEvent::MouseInput {
                button,
                state: btn_state,
                ..
            } => {
                self.state.dragging = (btn_state == ElementState::Pressed).then_some(button);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.state.handle_cursor(position.x, position.y);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 50.0,
                };
                self.state.camera.zoom(steps);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("skyrealm-desktop starting");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;

    let oracle_config = OracleConfig::from_env();
    if !oracle_config.has_api_key() {
        tracing::warn!("no API key in API_KEY or GEMINI_API_KEY; the wind will howl");
    }
    let generator: Arc<dyn TextGenerator> = Arc::new(GeminiClient::new(oracle_config)?);

    let session_config = SessionConfig {
        location_interval: Duration::from_secs(cli.location_interval_secs.max(1)),
        seed: cli.seed,
    };
    let session = {
        let _guard = runtime.enter();
        OverlaySession::wandering(&session_config, generator)?
    };

    let scene = SceneDescription::sky_realm(cli.seed.unwrap_or(DEFAULT_SCENE_SEED));

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(AppState::new(session, scene, !cli.no_auto_rotate));
    event_loop.run_app(&mut app)?;

    Ok(())
}
