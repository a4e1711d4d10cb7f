use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec3;
use mazeview_assets::{
    CubicmapAtlas, SceneConfig, cubicmap_mesh, load_collision_map, load_obj_or_empty,
    load_texture_or_white,
};
use mazeview_common::Color;
use mazeview_input::{Action, FirstPersonController, InputState};
use mazeview_kernel::{CollisionMap, FrameLoop};
use mazeview_render::{
    DrawCommand, Frame, MinimapView, Renderer, SceneLayout, SceneModel, compose_frame,
};
use mazeview_render_wgpu::WgpuRenderer;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

/// Minimap pixels per map cell.
const MINIMAP_CELL: u32 = 4;
const MINIMAP_MARGIN: i32 = 20;

#[derive(Parser)]
#[command(name = "mazeview-desktop", about = "First-person maze viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene file (YAML). Built-in defaults are used when omitted.
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Directory that relative asset paths are resolved against
    #[arg(long)]
    base_dir: Option<PathBuf>,
}

fn action_for(key: KeyCode) -> Option<Action> {
    match key {
        KeyCode::KeyW => Some(Action::MoveForward),
        KeyCode::KeyS => Some(Action::MoveBackward),
        KeyCode::KeyA => Some(Action::StrafeLeft),
        KeyCode::KeyD => Some(Action::StrafeRight),
        KeyCode::KeyM => Some(Action::ToggleMinimap),
        KeyCode::Escape => Some(Action::Quit),
        _ => None,
    }
}

/// Application state.
struct AppState {
    config: SceneConfig,
    frame_loop: FrameLoop,
    controller: FirstPersonController,
    input: InputState,
    /// Set once the scene models are on the GPU.
    layout: Option<SceneLayout>,
    show_minimap: bool,
    last_frame: Instant,
    frame_interval: Duration,
}

impl AppState {
    fn new(config: SceneConfig, map: CollisionMap) -> Result<Self> {
        let frame_loop = FrameLoop::new(
            config.camera,
            map,
            config.maze.placement.position,
            config.player.radius,
        )?;
        let controller =
            FirstPersonController::from_camera(&config.camera, config.player.controller);
        let frame_interval = Duration::from_secs_f64(1.0 / config.window.target_fps.max(1) as f64);
        Ok(Self {
            config,
            frame_loop,
            controller,
            input: InputState::new(),
            layout: None,
            show_minimap: true,
            last_frame: Instant::now(),
            frame_interval,
        })
    }

    /// Returns `true` when the viewer should close.
    fn handle_key(&mut self, key: KeyCode, pressed: bool) -> bool {
        let Some(action) = action_for(key) else {
            return false;
        };
        if !pressed {
            self.input.release(action);
            return false;
        }
        if !self.input.press(action) {
            return false;
        }
        match action {
            Action::ToggleMinimap => {
                self.show_minimap = !self.show_minimap;
                tracing::debug!("minimap {}", if self.show_minimap { "on" } else { "off" });
                false
            }
            Action::Quit => true,
            _ => false,
        }
    }

    fn update(&mut self, dt: f32) {
        let input = self.input.take_frame();
        let controller = &mut self.controller;
        self.frame_loop
            .tick(|camera| controller.update(camera, &input, dt));
    }

    fn compose(&self, viewport_width: u32) -> Option<Frame> {
        let layout = self.layout.as_ref()?;
        let map = self.frame_loop.map();
        let minimap = self.show_minimap.then(|| MinimapView {
            map,
            player: self.frame_loop.player_cell(),
            x: viewport_width as i32 - (map.width() as u32 * MINIMAP_CELL) as i32 - MINIMAP_MARGIN,
            y: MINIMAP_MARGIN,
            cell_size: MINIMAP_CELL,
        });
        Some(compose_frame(layout, self.frame_loop.camera(), minimap))
    }
}

fn color32(c: Color) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
}

/// Draw the frame's text and rectangles on top of the 3D scene. Overlay
/// coordinates are physical pixels; egui works in points.
fn paint_overlay(ctx: &EguiContext, frame: &Frame) {
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Foreground,
        egui::Id::new("overlay"),
    ));
    let ppp = ctx.pixels_per_point();
    let point = |x: i32, y: i32| egui::pos2(x as f32 / ppp, y as f32 / ppp);
    for cmd in frame.overlay() {
        match cmd {
            DrawCommand::Text {
                text,
                x,
                y,
                size,
                color,
            } => {
                painter.text(
                    point(*x, *y),
                    egui::Align2::LEFT_TOP,
                    text,
                    egui::FontId::proportional(*size as f32 / ppp),
                    color32(*color),
                );
            }
            DrawCommand::Rect {
                x,
                y,
                width,
                height,
                color,
            } => {
                let size = egui::vec2(*width as f32 / ppp, *height as f32 / ppp);
                painter.rect_filled(
                    egui::Rect::from_min_size(point(*x, *y), size),
                    0.0,
                    color32(*color),
                );
            }
            _ => {}
        }
    }
}

/// Window, surface and GPU resources. Created on the first `resumed`.
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
        scene: &SceneConfig,
    ) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(scene.window.title.clone())
            .with_inner_size(PhysicalSize::new(scene.window.width, scene.window.height));
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
        .context("no suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("mazeview_device"),
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

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(&device, surface_format, config.width, config.height);

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

    /// Upload the maze and the props. Missing textures and models degrade to
    /// white and empty; the collision map has already been loaded.
    fn upload_scene(&mut self, state: &AppState) -> SceneLayout {
        let scene = &state.config;
        let maze_mesh = cubicmap_mesh(state.frame_loop.map(), Vec3::ONE, &CubicmapAtlas::default());
        let atlas = load_texture_or_white(&scene.maze.atlas);
        let maze = SceneModel {
            name: "maze".into(),
            model: self
                .renderer
                .upload_model(&self.device, &self.queue, "maze", &maze_mesh, &atlas),
            placement: scene.maze.placement,
            tint: Color::WHITE,
        };

        let props = scene
            .props
            .iter()
            .map(|prop| {
                let mesh = load_obj_or_empty(&prop.model);
                let texture = load_texture_or_white(&prop.texture);
                SceneModel {
                    name: prop.name.clone(),
                    model: self.renderer.upload_model(
                        &self.device,
                        &self.queue,
                        &prop.name,
                        &mesh,
                        &texture,
                    ),
                    placement: prop.placement,
                    tint: Color::WHITE,
                }
            })
            .collect();

        tracing::info!("scene uploaded: {} models", self.renderer.model_count());
        SceneLayout {
            clear_color: Color::BLACK,
            maze,
            props,
        }
    }

    fn grab_cursor(&self) {
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(e) = grabbed {
            tracing::warn!("cursor grab unavailable: {e}");
        }
        self.window.set_cursor_visible(false);
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.config.width = new_size.width.max(1);
        self.config.height = new_size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn render(&mut self, egui_ctx: &EguiContext, frame: &Frame) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
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

        self.renderer
            .target(&self.device, &self.queue, &view)
            .render(frame);

        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| paint_overlay(ctx, frame));
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("overlay_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("overlay_pass"),
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
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        output.present();
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    next_frame: Instant,
    /// Startup failure inside the event loop, reported by `main`.
    error: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
            next_frame: Instant::now(),
            error: None,
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let mut gpu = match Gpu::new(event_loop, &self.egui_ctx, &self.state.config) {
            Ok(gpu) => gpu,
            Err(e) => {
                self.error = Some(e);
                event_loop.exit();
                return;
            }
        };
        self.state.layout = Some(gpu.upload_scene(&self.state));
        gpu.grab_cursor();
        self.gpu = Some(gpu);
        self.state.last_frame = Instant::now();
        self.next_frame = self.state.last_frame;
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };
        if gpu.egui_winit.on_window_event(&gpu.window, &event).consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                gpu.resize(new_size);
            }
            WindowEvent::Focused(focused) => {
                if focused {
                    gpu.grab_cursor();
                } else {
                    self.state.input.release_all();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                if self
                    .state
                    .handle_key(key, key_state == ElementState::Pressed)
                {
                    tracing::info!("quit requested");
                    event_loop.exit();
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
                self.state.last_frame = now;
                self.state.update(dt);

                if let Some(frame) = self.state.compose(gpu.config.width) {
                    gpu.render(&self.egui_ctx, &frame);
                }
            }
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
            self.state.input.add_look(delta.0 as f32, delta.1 as f32);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = &self.gpu else {
            return;
        };
        let now = Instant::now();
        if now >= self.next_frame {
            gpu.window.request_redraw();
            self.next_frame = now + self.state.frame_interval;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    tracing::info!("mazeview-desktop starting");

    let config = SceneConfig::resolve(cli.scene.as_deref(), cli.base_dir.as_deref())?;
    let map = load_collision_map(&config.maze.map)
        .with_context(|| format!("maze map {} is required", config.maze.map.display()))?;
    let state = AppState::new(config, map)?;

    let event_loop = EventLoop::new()?;
    let mut app = GpuApp::new(state);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mazeview_common::CameraState;

    fn state() -> AppState {
        let config = SceneConfig {
            camera: CameraState {
                position: Vec3::new(1.0, 0.5, 1.0),
                target: Vec3::new(1.0, 0.5, 0.0),
                ..CameraState::default()
            },
            ..SceneConfig::default()
        };
        let map = CollisionMap::from_ascii("###\n#.#\n###").unwrap();
        AppState::new(config, map).unwrap()
    }

    #[test]
    fn wasd_escape_and_m_are_bound() {
        assert_eq!(action_for(KeyCode::KeyW), Some(Action::MoveForward));
        assert_eq!(action_for(KeyCode::KeyD), Some(Action::StrafeRight));
        assert_eq!(action_for(KeyCode::KeyM), Some(Action::ToggleMinimap));
        assert_eq!(action_for(KeyCode::Escape), Some(Action::Quit));
        assert_eq!(action_for(KeyCode::Space), None);
    }

    #[test]
    fn escape_quits_and_m_toggles_once_per_press() {
        let mut state = state();
        assert!(state.handle_key(KeyCode::Escape, true));

        assert!(state.show_minimap);
        assert!(!state.handle_key(KeyCode::KeyM, true));
        // Key repeat does not toggle again.
        assert!(!state.handle_key(KeyCode::KeyM, true));
        assert!(!state.show_minimap);
        state.handle_key(KeyCode::KeyM, false);
        state.handle_key(KeyCode::KeyM, true);
        assert!(state.show_minimap);
    }

    #[test]
    fn walking_into_a_wall_rolls_back() {
        let mut state = state();
        state.handle_key(KeyCode::KeyW, true);
        for _ in 0..30 {
            state.update(1.0 / 60.0);
        }
        let pos = state.frame_loop.camera().position;
        // Wall face at z = 0.5, radius 0.1.
        assert!(pos.z > 0.6 - 1e-4, "camera entered the wall: {pos}");
        assert!(state.frame_loop.stats().rollbacks > 0);
    }

    #[test]
    fn nothing_is_composed_before_upload() {
        let state = state();
        assert!(state.compose(1020).is_none());
    }
}
