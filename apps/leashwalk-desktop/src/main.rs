use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use leashwalk_assets::AssetLoader;
use leashwalk_common::WalkConfig;
use leashwalk_input::{Action, InputState, MoveKey};
use leashwalk_kernel::{Walk, WalkEvent, session_seed};
use leashwalk_render::{CameraView, SceneOptions, build_scene};
use leashwalk_render_wgpu::{Fog, GpuCamera, RenderOptions, WgpuRenderer};
use leashwalk_tools::{EventTally, WalkInspector};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

/// Longest frame the simulation will step in one go.
const MAX_FRAME_SECS: f32 = 0.1;

#[derive(Parser)]
#[command(name = "leashwalk-desktop", about = "Walk a dog through an endless city")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// World seed; random when neither this nor the config sets one
    #[arg(long)]
    seed: Option<u64>,

    /// Directory the companion model path is resolved against
    #[arg(long)]
    asset_root: Option<PathBuf>,

    /// Draw at a fixed low resolution and upscale without filtering
    #[arg(long)]
    pixelated: bool,
}

/// Application state.
struct AppState {
    walk: Walk,
    input: InputState,
    camera: GpuCamera,
    tally: EventTally,
    show_inspector: bool,
    chunk_borders: bool,
    pointer_locked: bool,
    last_frame: Instant,
}

impl AppState {
    fn new(config: WalkConfig, seed: u64, loader: &AssetLoader) -> Result<Self> {
        let model_path = config.companion.model_path.clone();
        let mut walk = Walk::new(config, seed)?;
        walk.attach_proxy_load(loader.load(&model_path));

        let mut camera = GpuCamera::new(1280, 720);
        camera.fog = Fog::for_chunk_size(walk.config().world.chunk_size);

        let mut tally = EventTally::new();
        tally.record(&walk.drain_events());

        Ok(Self {
            walk,
            input: InputState::new(),
            camera,
            tally,
            show_inspector: false,
            chunk_borders: false,
            pointer_locked: false,
            last_frame: Instant::now(),
        })
    }

    fn update(&mut self, dt: f32) {
        let frame = self.input.take_frame();
        self.walk.tick(&frame, dt);

        let events = self.walk.drain_events();
        for event in &events {
            match event {
                WalkEvent::ProxyAttached { id, name } => {
                    tracing::info!(%id, name = %name, "companion model attached");
                }
                WalkEvent::ProxyFailed { reason } => {
                    tracing::warn!(reason = %reason, "companion stays a placeholder");
                }
                WalkEvent::PauseToggled { paused: true } => self.input.release_all(),
                WalkEvent::CompanionModeChanged { from, to } => {
                    tracing::trace!(%from, %to, "companion mode");
                }
                _ => {}
            }
        }
        self.tally.record(&events);
        self.camera.view = CameraView::from_walk(&self.walk);
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool, repeat: bool) {
        if let Some(mv) = move_key(key) {
            let action = if pressed {
                Action::Press(mv)
            } else {
                Action::Release(mv)
            };
            self.input.apply(action);
            return;
        }

        if !pressed || repeat {
            return;
        }

        match key {
            KeyCode::Tab => self.input.apply(Action::TogglePause),
            KeyCode::Escape if !self.walk.is_paused() => self.input.apply(Action::TogglePause),
            KeyCode::F1 => self.show_inspector = !self.show_inspector,
            KeyCode::F2 => self.chunk_borders = !self.chunk_borders,
            _ => {}
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        egui::Area::new(egui::Id::new("hud"))
            .anchor(egui::Align2::RIGHT_TOP, [-12.0, 12.0])
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(
                        egui::RichText::new(format!(
                            "Distance walked: {:.1} m",
                            self.walk.player().distance_walked
                        ))
                        .strong(),
                    );
                    ui.label(format!("Dog: {}", self.walk.companion().mode));
                });
            });

        if self.walk.is_paused() {
            self.draw_pause_overlay(ctx);
        }

        if self.show_inspector {
            self.draw_inspector(ctx);
        }
    }

    fn draw_pause_overlay(&mut self, ctx: &EguiContext) {
        ctx.layer_painter(egui::LayerId::new(
            egui::Order::Background,
            egui::Id::new("pause_dim"),
        ))
        .rect_filled(ctx.screen_rect(), 0.0, egui::Color32::from_black_alpha(150));

        egui::Area::new(egui::Id::new("pause"))
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.label(egui::RichText::new("Paused").size(28.0));
                        ui.add_space(8.0);
                        if ui.button("Resume (Tab)").clicked() {
                            self.input.apply(Action::TogglePause);
                        }
                        ui.add_space(4.0);
                        ui.small("WASD: Walk | Mouse: Look | F1: Inspector | F2: Chunk borders");
                    });
                });
            });
    }

    fn draw_inspector(&mut self, ctx: &EguiContext) {
        let summary = WalkInspector::summary(&self.walk);

        egui::SidePanel::left("inspector")
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.heading("Leash Walk");
                ui.separator();
                ui.label(format!("Tick: {}  Seed: {}", summary.tick, summary.seed));
                ui.label(format!(
                    "Chunks: {} visible / {} loaded",
                    summary.visible_chunks, summary.loaded_chunks
                ));
                ui.label(format!(
                    "Last reconcile: +{} -{} in {}us",
                    summary.created_last, summary.removed_last, summary.reconcile_micros
                ));
                let [x, y, z] = summary.player_position;
                ui.label(format!("Player: ({x:.1}, {y:.1}, {z:.1}) in {}", summary.player_chunk));
                ui.label(format!(
                    "Companion: {}  leash {:.2}",
                    summary.companion_mode, summary.leash_length
                ));
                ui.label(format!(
                    "Model: {}",
                    summary.proxy.as_deref().unwrap_or(if self.walk.is_proxy_pending() {
                        "loading"
                    } else {
                        "placeholder"
                    })
                ));
                ui.checkbox(&mut self.chunk_borders, "Chunk borders (F2)");

                ui.separator();
                ui.heading("Events");
                ui.monospace(self.tally.to_string());

                ui.separator();
                ui.heading("Chunks");
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for coord in WalkInspector::list_chunks(&self.walk) {
                        if let Some(info) = WalkInspector::inspect_chunk(&self.walk, coord) {
                            ui.monospace(info.to_string());
                        }
                    }
                });
            });
    }
}

fn move_key(key: KeyCode) -> Option<MoveKey> {
    match key {
        KeyCode::KeyW => Some(MoveKey::Forward),
        KeyCode::KeyS => Some(MoveKey::Back),
        KeyCode::KeyA => Some(MoveKey::Left),
        KeyCode::KeyD => Some(MoveKey::Right),
        _ => None,
    }
}

/// Window, surface and everything drawn into it.
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

impl Gpu {
    fn new(
        event_loop: &ActiveEventLoop,
        egui_ctx: &EguiContext,
        options: RenderOptions,
    ) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Leash Walk")
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
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("leashwalk_device"),
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
            .context("surface reports no formats")?;
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

        let renderer = WgpuRenderer::new(
            &device,
            surface_format,
            config.width,
            config.height,
            options,
        );

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            pixelated = options.pixelated,
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
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

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    /// Grab and hide the cursor, or give it back.
    fn set_pointer_lock(&self, locked: bool) -> bool {
        if locked {
            let grabbed = self
                .window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(e) = grabbed {
                tracing::warn!("pointer lock unavailable: {e}");
                return false;
            }
            self.window.set_cursor_visible(false);
            true
        } else {
            if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::None) {
                tracing::warn!("failed to release pointer: {e}");
            }
            self.window.set_cursor_visible(true);
            false
        }
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    render_options: RenderOptions,
}

impl GpuApp {
    fn new(state: AppState, render_options: RenderOptions) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
            render_options,
        }
    }

    /// Keep the pointer grabbed exactly while the walk is running.
    fn sync_pointer_lock(&mut self) {
        let Some(gpu) = &self.gpu else {
            return;
        };
        if self.state.walk.is_paused() && self.state.pointer_locked {
            self.state.pointer_locked = gpu.set_pointer_lock(false);
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.state.last_frame).as_secs_f32().min(MAX_FRAME_SECS);
        self.state.last_frame = now;
        let was_paused = self.state.walk.is_paused();
        self.state.update(dt);
        if was_paused && !self.state.walk.is_paused() {
            if let Some(gpu) = &self.gpu {
                self.state.pointer_locked = gpu.set_pointer_lock(true);
            }
        }
        self.sync_pointer_lock();

        let Some(gpu) = self.gpu.as_mut() else {
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

        let scene = build_scene(
            &self.state.walk,
            SceneOptions {
                chunk_borders: self.state.chunk_borders,
                show_player: false,
            },
        );
        gpu.renderer
            .render(&gpu.device, &gpu.queue, &view, &self.state.camera, &scene);

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx);
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

        match Gpu::new(event_loop, &self.egui_ctx, self.render_options) {
            Ok(gpu) => {
                self.state
                    .camera
                    .resize(gpu.config.width, gpu.config.height);
                self.state.pointer_locked = gpu.set_pointer_lock(true);
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("failed to initialize graphics: {e:#}");
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
                tracing::info!(
                    walked = self.state.walk.player().distance_walked,
                    "leashwalk-desktop exiting"
                );
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                    self.state
                        .camera
                        .resize(gpu.config.width, gpu.config.height);
                }
            }
            WindowEvent::Focused(false) => {
                self.state.input.release_all();
                if !self.state.walk.is_paused() {
                    self.state.input.apply(Action::TogglePause);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        repeat,
                        ..
                    },
                ..
            } => {
                self.state
                    .handle_key(key, key_state == ElementState::Pressed, repeat);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: ElementState::Pressed,
                ..
            } => {
                // Clicking back into a running walk re-grabs a pointer the
                // platform took away.
                if !self.state.walk.is_paused() && !self.state.pointer_locked {
                    if let Some(gpu) = &self.gpu {
                        self.state.pointer_locked = gpu.set_pointer_lock(true);
                    }
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.state.pointer_locked {
                self.state.input.apply(Action::Look {
                    dx: delta.0 as f32,
                    dy: delta.1 as f32,
                });
            }
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

    tracing::info!("leashwalk-desktop starting");

    let config = match &cli.config {
        Some(path) => WalkConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => WalkConfig::default(),
    };
    let seed = session_seed(cli.seed, &config);
    let loader = match cli.asset_root {
        Some(root) => AssetLoader::with_root(root),
        None => AssetLoader::new(),
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let options = RenderOptions {
        pixelated: cli.pixelated,
    };
    let mut app = GpuApp::new(AppState::new(config, seed, &loader)?, options);
    event_loop.run_app(&mut app)?;

    Ok(())
}
