use crate::{
    common::{driver::SharedDriver, gl_driver::GlDriver},
    errors::EngineError,
    options::Options,
    scene::{Flow, Scene, SceneHost},
};
use glutin::{
    config::{Config, ConfigTemplateBuilder, GlConfig},
    context::{
        ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext,
        PossiblyCurrentContext, Version,
    },
    display::{GetGlDisplay, GlDisplay},
    surface::{GlSurface, Surface, SwapInterval, WindowSurface},
};
use glutin_winit::{DisplayBuilder, GlWindow};
use raw_window_handle::HasWindowHandle;
use std::{fmt::Display, num::NonZeroU32, rc::Rc, time::Instant};
use tracing::{error, info};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow},
    keyboard::Key,
    window::{Window, WindowAttributes, WindowId},
};

pub(crate) struct InnerApplication<S> {
    template: ConfigTemplateBuilder,
    display_builder: DisplayBuilder,
    window_attributes: WindowAttributes,
    options: Options,
    scene: Option<S>,
    // Declared before `state` so scene resources are released while the
    // context still exists.
    host: Option<SceneHost<S>>,
    state: Option<AppState>,
    pub(crate) exit_state: Result<(), EngineError>,
}

impl<S> InnerApplication<S>
where
    S: Scene,
{
    pub(crate) fn new(
        template: ConfigTemplateBuilder,
        display_builder: DisplayBuilder,
        scene: S,
        window_attributes: WindowAttributes,
        options: Options,
    ) -> Self {
        Self {
            template,
            display_builder,
            window_attributes,
            options,
            scene: Some(scene),
            host: None,
            state: None,
            exit_state: Ok(()),
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), EngineError> {
        let (window, gl_config) = self
            .display_builder
            .clone()
            .build(event_loop, self.template.clone(), gl_config_picker)
            .map_err(init_error)?;
        info!("Picked a config with {} samples", gl_config.num_samples());
        let raw_window_handle = window
            .as_ref()
            .and_then(|window| window.window_handle().ok())
            .map(|handle| handle.as_raw());
        let gl_display = gl_config.display();
        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_profile(GlProfile::Core)
            .build(raw_window_handle);
        let not_current_gl_context =
            unsafe { gl_display.create_context(&gl_config, &context_attributes) }
                .map_err(init_error)?;
        let window = match window {
            Some(window) => window,
            None => glutin_winit::finalize_window(
                event_loop,
                self.window_attributes.clone(),
                &gl_config,
            )
            .map_err(init_error)?,
        };
        let attrs = window
            .build_surface_attributes(Default::default())
            .map_err(init_error)?;
        let gl_surface = unsafe { gl_display.create_window_surface(&gl_config, &attrs) }
            .map_err(init_error)?;
        let gl_context = not_current_gl_context
            .make_current(&gl_surface)
            .map_err(init_error)?;
        let swap_interval = if self.options.vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(res) = gl_surface.set_swap_interval(&gl_context, swap_interval) {
            error!("Error setting vsync: {res:?}");
        }

        // SAFETY: the context was just made current on this thread and lives
        // in `self.state`, which outlives `self.host`.
        let driver: SharedDriver = Rc::new(unsafe { GlDriver::load(&gl_display) });
        let scene = self
            .scene
            .take()
            .ok_or_else(|| EngineError::Init("scene was already started".to_string()))?;
        let mut host = SceneHost::new(scene, driver);
        let size = window.inner_size();
        host.context().resize(size.width as i32, size.height as i32);
        let clear_color = self.options.clear_color;
        host.context_mut()
            .set_clear_color(clear_color.x, clear_color.y, clear_color.z);
        self.state = Some(AppState {
            gl_context,
            gl_surface,
            window,
        });

        host.enter(Instant::now())?;
        if let Some(state) = &self.state {
            state.window.set_visible(true);
            state.window.request_redraw();
        }
        self.host = Some(host);
        Ok(())
    }

    fn exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut host) = self.host.take() {
            host.exit();
        }
        event_loop.exit();
    }

    fn exit_with_error(&mut self, event_loop: &ActiveEventLoop, error: EngineError) {
        error!("{error}");
        if self.exit_state.is_ok() {
            self.exit_state = Err(error);
        }
        self.exit(event_loop);
    }
}

impl<S> ApplicationHandler for InnerApplication<S>
where
    S: Scene,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        event_loop.set_control_flow(ControlFlow::Poll);
        if let Err(e) = self.create_window(event_loop) {
            self.exit_with_error(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::Resized(size) => {
                let (Some(width), Some(height)) =
                    (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
                else {
                    return;
                };
                if let (Some(state), Some(host)) = (self.state.as_ref(), self.host.as_ref()) {
                    state.gl_surface.resize(&state.gl_context, width, height);
                    host.context().resize(size.width as i32, size.height as i32);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(key),
                        state,
                        ..
                    },
                ..
            } => {
                if let Some(host) = self.host.as_mut() {
                    match state {
                        ElementState::Pressed => host.context_mut().press_key(key),
                        ElementState::Released => host.context_mut().release_key(key),
                    }
                }
            }
            WindowEvent::CloseRequested => {
                self.exit(event_loop);
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(state), Some(host)) = (self.state.as_ref(), self.host.as_mut()) else {
            return;
        };
        let flow = host.frame(Instant::now());
        if let Err(e) = state.gl_surface.swap_buffers(&state.gl_context) {
            self.exit_with_error(event_loop, EngineError::Surface(e.to_string()));
            return;
        }
        state.window.request_redraw();
        if flow == Flow::Exit {
            self.exit(event_loop);
        }
    }
}

struct AppState {
    gl_context: PossiblyCurrentContext,
    gl_surface: Surface<WindowSurface>,
    window: Window,
}

pub(crate) fn display_builder(display_builder: DisplayBuilder) -> DisplayBuilder {
    #[cfg(free_unix)]
    let display_builder =
        display_builder.with_preference(glutin_winit::ApiPreference::PreferEgl);
    display_builder
}

fn gl_config_picker(configs: Box<dyn Iterator<Item = Config> + '_>) -> Config {
    configs
        .reduce(|picked, config| {
            if config.num_samples() > picked.num_samples() {
                config
            } else {
                picked
            }
        })
        .expect("display offered no gl configs")
}

fn init_error<E>(error: E) -> EngineError
where
    E: Display,
{
    EngineError::Init(error.to_string())
}
