//! The frame loop.
//!
//! Drives a winit event loop around the rendering core. Each redraw:
//!
//! 1. advance the scene clock (deterministic animation)
//! 2. pull the camera from the provider, write the frame uniform
//! 3. snapshot the light at the sun's position
//! 4. plan the frame (sky → opaque → transparent)
//! 5. execute the plan and present
//!
//! Surface loss and outdated swap chains trigger a reconfigure; any other
//! per-frame error is logged and the loop keeps running. Initialization
//! errors are fatal — no scene can render without its materials.

use std::{iter, sync::Arc};

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    camera::Camera,
    context::Context,
    data_structures::{mesh::GeometryStore, scene_graph::Scene, texture::TextureStore},
    pipelines::PipelineSet,
    registry::ShaderRegistry,
    render::{TransformPool, execute_plan, plan_frame},
};

/// The asset stores the provider fills during init.
pub struct AssetStores {
    pub geometry: GeometryStore,
    pub textures: TextureStore,
}

/// The host's hooks into the frame loop.
///
/// The provider is the boundary to the external collaborators: it registers
/// provider-loaded assets and assembles the scene once, and supplies the
/// camera every frame.
pub trait SceneProvider {
    /// Called once after GPU init. Register geometry/textures, compile
    /// shader programs, create materials, and return the assembled scene.
    /// Errors abort startup.
    fn on_init(
        &mut self,
        ctx: &mut Context,
        assets: &mut AssetStores,
        registry: &mut ShaderRegistry,
    ) -> anyhow::Result<Scene>;

    /// Per-frame camera: view + projection + eye, from the host's
    /// controller.
    fn on_camera(&mut self, ctx: &Context, dt: Duration) -> Camera;

    /// Optional per-frame hook, called before the scene clock advances.
    fn on_update(&mut self, _scene: &mut Scene, _dt: Duration) {}
}

/// Application state bundle; field order is reverse creation order so GPU
/// resources tear down before the context that made them.
struct AppState {
    pool: TransformPool,
    pipelines: PipelineSet,
    scene: Scene,
    assets: AssetStores,
    #[allow(dead_code)]
    registry: ShaderRegistry,
    ctx: Context,
    is_surface_configured: bool,
}

impl AppState {
    fn render<P: SceneProvider>(
        &mut self,
        provider: &mut P,
        dt: Duration,
    ) -> Result<(), wgpu::SurfaceError> {
        self.ctx.window.request_redraw();

        if !self.is_surface_configured {
            return Ok(());
        }

        provider.on_update(&mut self.scene, dt);
        self.scene.advance(dt.as_secs_f32());

        let camera = provider.on_camera(&self.ctx, dt);
        self.ctx
            .frame
            .uniform
            .update(&camera, self.scene.elapsed());
        self.ctx.frame.write(&self.ctx.queue);

        let mut light = self.ctx.light.uniform;
        if let Some(sun) = self.scene.light_anchor() {
            light.position = sun.transform().position.into();
        }

        let plan = plan_frame(&self.scene, camera.eye, light);

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        execute_plan(
            &self.ctx,
            &self.pipelines,
            &self.assets.geometry,
            &plan,
            &mut self.pool,
            &view,
            &mut encoder,
        );
        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub struct App<P: SceneProvider> {
    async_runtime: tokio::runtime::Runtime,
    provider: P,
    state: Option<AppState>,
    last_time: Instant,
}

impl<P: SceneProvider> ApplicationHandler for App<P> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window = Arc::new(
            event_loop
                .create_window(Window::default_attributes())
                .expect("Failed to create a window"),
        );

        let mut ctx = match self.async_runtime.block_on(Context::new(window)) {
            Ok(ctx) => ctx,
            Err(e) => panic!(
                "App initialization failed. Cannot create the main context: {}",
                e
            ),
        };

        let mut registry = ShaderRegistry::new();
        let mut assets = AssetStores {
            geometry: GeometryStore::new(),
            textures: TextureStore::new(),
        };
        let scene = match self.provider.on_init(&mut ctx, &mut assets, &mut registry) {
            Ok(scene) => scene,
            Err(e) => panic!("Scene initialization failed: {}", e),
        };

        let pipelines = PipelineSet::build(
            &ctx.device,
            ctx.config.format,
            &registry,
            &assets.textures,
            &ctx.frame.bind_group_layout,
            &ctx.light.bind_group_layout,
        );
        log::info!(
            "scene initialized: {} bodies, {} pipelines",
            scene.len(),
            pipelines.pipeline_count()
        );

        self.state = Some(AppState {
            pool: TransformPool::new(),
            pipelines,
            scene,
            assets,
            registry,
            ctx,
            is_surface_configured: false,
        });
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                state.ctx.resize(size.width, size.height);
                state.is_surface_configured = true;
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                match state.render(&mut self.provider, dt) {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.ctx.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Run the frame loop with the given provider until the window closes.
pub fn run<P: SceneProvider>(provider: P) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    }

    let event_loop = EventLoop::new()?;
    let mut app = App {
        async_runtime: tokio::runtime::Runtime::new()?,
        provider,
        state: None,
        last_time: Instant::now(),
    };
    event_loop.run_app(&mut app)?;

    Ok(())
}
