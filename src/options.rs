use nalgebra::Vector3;

/// Window and display settings for an [`Application`](crate::Application).
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// Linear RGB, each channel in `[0, 1]`.
    pub clear_color: Vector3<f32>,
    pub fullscreen: bool,
    pub resizable: bool,
    pub vsync: bool,
    pub show_title_bar: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            title: String::from("glscene"),
            clear_color: Vector3::new(0.2, 0.3, 0.3),
            fullscreen: false,
            resizable: true,
            vsync: true,
            show_title_bar: true,
        }
    }
}

impl Options {
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }
}

#[derive(Default)]
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title<T>(mut self, title: T) -> Self
    where
        T: Into<String>,
    {
        self.options.title = title.into();
        self
    }

    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.options.width = width;
        self.options.height = height;
        self
    }

    pub fn clear_color(mut self, red: f32, green: f32, blue: f32) -> Self {
        self.options.clear_color = Vector3::new(red, green, blue);
        self
    }

    pub fn fullscreen(mut self, fullscreen: bool) -> Self {
        self.options.fullscreen = fullscreen;
        self
    }

    pub fn resizable(mut self, resizable: bool) -> Self {
        self.options.resizable = resizable;
        self
    }

    pub fn vsync(mut self, vsync: bool) -> Self {
        self.options.vsync = vsync;
        self
    }

    pub fn show_title_bar(mut self, show_title_bar: bool) -> Self {
        self.options.show_title_bar = show_title_bar;
        self
    }

    pub fn build(self) -> Options {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_only_what_it_is_told() {
        let options = Options::builder()
            .title("LearnTexture")
            .vsync(false)
            .build();
        assert_eq!(options.title, "LearnTexture");
        assert!(!options.vsync);
        assert_eq!((options.width, options.height), (640, 480));
        assert!(options.resizable);
        assert!(options.show_title_bar);
        assert!(!options.fullscreen);
    }
}
