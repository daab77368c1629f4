pub mod application_context;
pub mod common;
pub mod demos;
pub mod options;
pub mod scene;

mod internal;
mod utils;

pub use application_context::SceneContext;
pub use common::errors;
pub use options::Options;
pub use scene::{Scene, SceneHost};
pub use winit::keyboard::NamedKey;

use errors::EngineError;
use glutin::config::ConfigTemplateBuilder;
use glutin_winit::DisplayBuilder;
use internal::internal_game_loop::InnerApplication;
use winit::{
    dpi::{PhysicalSize, Size},
    event_loop::EventLoop,
    window::{Fullscreen, Window},
};

pub struct Application {
    options: Options,
}

impl Application {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Opens the window, enters `scene` and runs until the scene asks to exit
    /// or the window is closed. Returns the first fatal error.
    pub fn run<S>(self, scene: S) -> Result<(), EngineError>
    where
        S: Scene,
    {
        let event_loop = EventLoop::new().map_err(|e| EngineError::Init(e.to_string()))?;
        let mut window_attributes = Window::default_attributes()
            .with_title(self.options.title.clone())
            .with_inner_size(Size::Physical(PhysicalSize::new(
                self.options.width,
                self.options.height,
            )))
            .with_resizable(self.options.resizable)
            .with_decorations(self.options.show_title_bar)
            .with_visible(false);
        if self.options.fullscreen {
            window_attributes =
                window_attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        let template = ConfigTemplateBuilder::new();
        let display_builder = internal::internal_game_loop::display_builder(
            DisplayBuilder::new().with_window_attributes(Some(window_attributes.clone())),
        );
        let mut app = InnerApplication::new(
            template,
            display_builder,
            scene,
            window_attributes,
            self.options,
        );
        event_loop
            .run_app(&mut app)
            .map_err(|e| EngineError::Init(e.to_string()))?;
        app.exit_state
    }
}
