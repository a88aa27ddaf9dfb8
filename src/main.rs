use std::sync::Arc;
use std::time::Instant;

use tracing::error;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

use shader_gallery::controller::InputState;
use shader_gallery::loader::{FsShaderLoader, ShaderSourceLoader};
use shader_gallery::logging;
use shader_gallery::model::{gallery, Camera, MaterialRegistry, Scene};
use shader_gallery::view::render::{self, GpuMaterial, RenderState};
use shader_gallery::view::GpuContext;

struct State {
    window: Arc<Window>,
    gpu: GpuContext,
    size: winit::dpi::PhysicalSize<u32>,
    camera: Camera,
    scene: Scene,
    registry: MaterialRegistry<GpuMaterial>,
    input: InputState,
    render_state: RenderState,
    started: Instant,
}

impl State {
    async fn new(window: Arc<Window>) -> Self {
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));

        let gpu = GpuContext::new(window.clone(), width, height).await;
        let layouts = render::create_shared_layouts(&gpu.device);
        let loader = FsShaderLoader::from_env();

        let camera = Camera::new(width, height);
        let mut scene = Scene::new(&gpu.device);

        // Startup loads are strictly sequential: material N+1 does not start
        // loading until material N's entry is fully constructed
        let sky_vs = loader.load("shaders/skybox.vertex.wgsl").await;
        let sky_fs = loader.load("shaders/skybox.fragment.wgsl").await;

        let styles = gallery::styles();
        let mut registry = MaterialRegistry::populate(&loader, &styles, |desc, vs, fs| {
            GpuMaterial::new(&gpu.device, gpu.format, &layouts, desc, vs, fs)
        })
        .await;

        let resolution = [width as f32, height as f32];
        for entry in registry.entries_mut() {
            entry.uniforms.resolution = resolution;
        }
        registry.select_initial(&mut scene.cube_material);

        let render_state = RenderState::new(&gpu, &layouts, &sky_vs, &sky_fs, width, height);

        Self {
            window,
            gpu,
            size,
            camera,
            scene,
            registry,
            input: InputState::new(),
            render_state,
            started: Instant::now(),
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.gpu.config.width = new_size.width;
        self.gpu.config.height = new_size.height;
        self.gpu.surface.configure(&self.gpu.device, &self.gpu.config);

        self.camera.set_aspect(new_size.width, new_size.height);
        self.render_state.resize(&self.gpu.device, new_size.width, new_size.height);

        let resolution = [new_size.width as f32, new_size.height as f32];
        for entry in self.registry.entries_mut() {
            entry.uniforms.resolution = resolution;
        }
    }

    fn update(&mut self) {
        let elapsed = self.started.elapsed().as_secs_f32();
        let aux_input = self.input.aux_input();

        self.scene.spin(aux_input);
        self.registry.tick(elapsed, aux_input);
        self.render_state.upload_frame_uniforms(
            &self.gpu.queue,
            &self.camera,
            &self.scene,
            &self.registry,
            elapsed,
        );
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.render_state.draw_frame(
            &self.gpu.device,
            &self.gpu.queue,
            &self.gpu.surface,
            &self.scene,
            &self.registry,
        )
    }
}

#[derive(Default)]
struct App {
    state: Option<State>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_none() {
            let window = event_loop
                .create_window(
                    Window::default_attributes()
                        .with_title("shader gallery")
                        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720)),
                )
                .expect("Failed to create window");
            self.state = Some(pollster::block_on(State::new(Arc::new(window))));
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(new_size) => state.resize(new_size),
            WindowEvent::CursorMoved { position, .. } => {
                state.input.set_cursor_y(position.y as f32, state.size.height as f32);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                // Each click advances exactly once, before the next frame
                state.registry.advance(&mut state.scene.cube_material);
            }
            WindowEvent::RedrawRequested => {
                state.update();
                match state.render() {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                        state.resize(state.size)
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                    Err(e) => error!("surface error: {:?}", e),
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }
}

fn main() {
    logging::init();

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    let mut app = App::default();
    event_loop.run_app(&mut app).expect("Event loop error");
}
