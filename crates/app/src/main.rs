//! lumen demo: untextured and textured cubes under one directional light.
//!
//! Press `T` to add or remove a textured cube; the texture render system
//! regenerates its shader and descriptors on the next frame.

use std::sync::Arc;

use anyhow::{Context, Result};
use glam::Vec3;
use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::event_loop::ControlFlow;
use winit::window::WindowId;

use lumen_core::{EngineConfig, FrameClock, init_logging};
use lumen_platform::{
    ActiveEventLoop, ElementState, EventLoop, KeyCode, PhysicalKey, Surface, Window, WindowEvent,
};
use lumen_renderer::{
    FrameContext, FrameRenderer, GlobalResources, GlobalUbo, SimpleRenderSystem, TextureRenderSystem,
    TextureShaderPaths,
};
use lumen_resources::primitives::{CUBE_FACES, cube, cube_face, quad};
use lumen_resources::{Model, ModelBuilder, checkerboard_texture};
use lumen_rhi::command::CommandPool;
use lumen_rhi::device::Device;
use lumen_rhi::instance::Instance;
use lumen_rhi::physical_device::select_physical_device;
use lumen_rhi::shader_compiler::GlslcCompiler;
use lumen_scene::{Camera, DEFAULT_UP, SceneObjectId, SceneObjectMap, Transform};

const CONFIG_PATH: &str = "lumen.toml";

/// Shaders compiled ahead of time. The textured fragment shader is
/// generated at runtime instead.
const STATIC_SHADERS: [&str; 3] = ["simple_shader.vert", "simple_shader.frag", "texture_shader.vert"];

const SPIN_SPEED: f32 = 0.6;

struct DemoScene {
    objects: SceneObjectMap<Model>,
    spinning: Vec<SceneObjectId>,
    extra_model: Arc<Model>,
    extra_object: Option<SceneObjectId>,
}

impl DemoScene {
    fn build(device: &Arc<Device>, pool: &CommandPool) -> Result<Self> {
        let mut objects = SceneObjectMap::new();

        let plain_cube = Arc::new(Model::from_mesh(
            device.clone(),
            cube(Vec3::new(0.9, 0.4, 0.2)),
            Vec3::ONE,
        )?);
        let spinning = vec![
            objects.spawn(
                Transform::new().with_translation(Vec3::new(-1.5, 0.0, 0.0)),
                Vec3::ONE,
                Some(plain_cube.clone()),
            ),
            objects.spawn(
                Transform::new()
                    .with_translation(Vec3::new(1.5, 0.0, 0.0))
                    .with_scale(Vec3::splat(0.6)),
                Vec3::ONE,
                Some(plain_cube),
            ),
        ];

        let floor_texture = checkerboard_texture(
            device.clone(),
            pool,
            256,
            32,
            [[200, 200, 200, 255], [60, 60, 60, 255]],
            "floor checkerboard",
        )?;
        let mut floor = ModelBuilder::new();
        let floor_index = floor.add_texture(floor_texture);
        floor.add_sub_mesh(quad(8.0, Vec3::ONE), Vec3::ONE, Some(floor_index));
        objects.spawn(
            Transform::new().with_translation(Vec3::new(0.0, 0.5, 0.0)),
            Vec3::ONE,
            Some(Arc::new(floor.build(device.clone())?)),
        );

        let crate_model = textured_cube(device, pool, [[180, 120, 40, 255], [90, 50, 20, 255]])?;
        let center = objects.spawn(
            Transform::new().with_translation(Vec3::new(0.0, -0.2, 1.5)),
            Vec3::ONE,
            Some(crate_model),
        );

        let extra_model = textured_cube(device, pool, [[40, 120, 200, 255], [240, 240, 240, 255]])?;

        Ok(Self {
            objects,
            spinning: [spinning, vec![center]].concat(),
            extra_model,
            extra_object: None,
        })
    }

    fn toggle_extra_object(&mut self) {
        match self.extra_object.take() {
            Some(id) => {
                self.objects.remove(id);
                info!("Removed textured cube {:?}", id);
            }
            None => {
                let id = self.objects.spawn(
                    Transform::new()
                        .with_translation(Vec3::new(0.0, -1.2, -1.5))
                        .with_scale(Vec3::splat(0.8)),
                    Vec3::ONE,
                    Some(self.extra_model.clone()),
                );
                self.extra_object = Some(id);
                info!("Spawned textured cube {:?}", id);
            }
        }
    }

    fn animate(&mut self, dt: f32) {
        for id in &self.spinning {
            if let Some(object) = self.objects.get_mut(*id) {
                object.transform.rotation.y += SPIN_SPEED * dt;
                object.transform.rotation.x += 0.5 * SPIN_SPEED * dt;
            }
        }
    }
}

/// A cube with two textures alternating across its faces. The top face is
/// left untextured and drawn with its diffuse color.
fn textured_cube(device: &Arc<Device>, pool: &CommandPool, colors: [[u8; 4]; 2]) -> Result<Arc<Model>> {
    let light = checkerboard_texture(device.clone(), pool, 64, 8, colors, "cube checkerboard")?;
    let dark = checkerboard_texture(
        device.clone(),
        pool,
        64,
        16,
        [colors[1], colors[0]],
        "cube checkerboard (inverted)",
    )?;

    let mut builder = ModelBuilder::new();
    let textures = [builder.add_texture(light), builder.add_texture(dark)];
    for (face, normal) in CUBE_FACES.into_iter().enumerate() {
        let texture = (normal != Vec3::NEG_Y).then_some(textures[face % 2]);
        builder.add_sub_mesh(cube_face(normal, Vec3::ONE), Vec3::new(0.9, 0.9, 0.3), texture);
    }
    Ok(Arc::new(builder.build(device.clone())?))
}

/// Everything that exists once the window does. Fields drop in order, so
/// GPU objects go before the renderer, device, surface and instance.
struct Engine {
    texture_system: TextureRenderSystem,
    simple_system: SimpleRenderSystem,
    scene: DemoScene,
    global: GlobalResources,
    camera: Camera,
    renderer: FrameRenderer,
    device: Arc<Device>,
    _surface: Surface,
    _instance: Arc<Instance>,
    window: Window,
}

impl Engine {
    fn new(event_loop: &ActiveEventLoop, config: &EngineConfig) -> Result<Self> {
        let window = Window::new(event_loop, &config.window)?;

        let extensions = window.required_extensions()?;
        let instance = Arc::new(Instance::new(
            &config.window.title,
            config.renderer.enable_validation,
            &extensions,
        )?);
        let surface = window.create_surface(instance.entry(), instance.handle())?;
        let physical = select_physical_device(instance.handle(), surface.handle(), surface.loader())?;
        let device = Device::new(&instance, &physical)?;

        let renderer = FrameRenderer::new(
            instance.clone(),
            device.clone(),
            surface.handle(),
            &window,
            config.renderer.vsync,
        )?;
        let global = GlobalResources::new(device.clone())?;

        let shaders = &config.shaders;
        let compiler = GlslcCompiler::locate(shaders.compiler.as_deref());
        for name in STATIC_SHADERS {
            let source = shaders.resolve(name);
            let output = shaders.resolve(format!("{}.spv", name));
            compiler
                .compile_if_stale(&source, &output)
                .with_context(|| format!("compiling {}", source.display()))?;
        }

        let scene = DemoScene::build(&device, renderer.command_pool())?;

        let simple_system = SimpleRenderSystem::new(
            device.clone(),
            renderer.render_pass(),
            global.layout().handle(),
            &shaders.resolve("simple_shader.vert.spv"),
            &shaders.resolve("simple_shader.frag.spv"),
        )?;
        let texture_system = TextureRenderSystem::new(
            device.clone(),
            renderer.render_pass(),
            global.layout().handle(),
            TextureShaderPaths::from_settings(shaders),
            Box::new(compiler),
            &scene.objects,
        )?;

        let mut camera = Camera::new();
        camera.set_view_target(Vec3::new(0.0, -2.5, -6.0), Vec3::ZERO, DEFAULT_UP);

        Ok(Self {
            texture_system,
            simple_system,
            scene,
            global,
            camera,
            renderer,
            device,
            _surface: surface,
            _instance: instance,
            window,
        })
    }

    fn draw_frame(&mut self, dt: f32, clear_color: [f32; 4]) -> Result<()> {
        self.scene.animate(dt);
        self.camera
            .set_perspective_projection(50f32.to_radians(), self.renderer.aspect_ratio(), 0.1, 100.0);

        let Some(cmd) = self.renderer.begin_frame(&self.window)? else {
            return Ok(());
        };
        let frame_index = self.renderer.frame_index();

        let ubo = GlobalUbo {
            projection: self.camera.projection(),
            view: self.camera.view(),
            inverse_view: self.camera.inverse_view(),
            ..GlobalUbo::default()
        };
        self.global.update(frame_index, &ubo)?;

        let ctx = FrameContext {
            frame_index,
            frame_time: dt,
            command_buffer: &cmd,
            camera: &self.camera,
            global_descriptor_set: self.global.descriptor_set(frame_index),
            scene_objects: &self.scene.objects,
            render_pass: self.renderer.render_pass(),
        };

        self.renderer.begin_render_pass(&cmd, clear_color);
        self.simple_system.render_objects(&ctx);
        self.texture_system.render_objects(&ctx)?;
        self.renderer.end_render_pass(&cmd);
        self.renderer.end_frame(&mut self.window)?;

        Ok(())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            error!("Failed to wait for device idle on shutdown: {}", e);
        }
    }
}

struct App {
    config: EngineConfig,
    engine: Option<Engine>,
    clock: FrameClock,
}

impl App {
    fn new(config: EngineConfig) -> Self {
        Self {
            config,
            engine: None,
            clock: FrameClock::new(),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.engine.is_some() {
            return;
        }
        match Engine::new(event_loop, &self.config) {
            Ok(engine) => {
                info!("Initialization complete, entering main loop");
                self.engine = Some(engine);
                self.clock = FrameClock::new();
            }
            Err(e) => {
                error!("Failed to initialize: {:#}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                self.engine = None;
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                engine.window.handle_resize(size.width, size.height);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && !event.repeat
                    && event.physical_key == PhysicalKey::Code(KeyCode::KeyT)
                {
                    engine.scene.toggle_extra_object();
                }
            }
            WindowEvent::RedrawRequested => {
                let dt = self.clock.tick();
                if let Err(e) = engine.draw_frame(dt, self.config.renderer.clear_color) {
                    error!("Render error: {:#}", e);
                    self.engine = None;
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(engine) = &self.engine {
            engine.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let config = EngineConfig::load(CONFIG_PATH)?;
    init_logging(&config.logging.filter);
    info!("Starting lumen");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
