use std::time::Duration;

use fnv::FnvHashSet;
use nalgebra::Vector4;
use winit::keyboard::NamedKey;

use crate::{common::driver::SharedDriver, utils::change_cell::ChangeCell};

/// Everything a scene may touch while it runs: the driver, input state, the
/// clock and the exit switch. Passed explicitly into every scene callback.
pub struct SceneContext {
    driver: SharedDriver,
    pressed_keys: FnvHashSet<NamedKey>,
    background_color: ChangeCell<Vector4<f32>>,
    time: Duration,
    exit_requested: bool,
}

impl SceneContext {
    pub fn new(driver: SharedDriver) -> Self {
        Self {
            driver,
            pressed_keys: FnvHashSet::default(),
            background_color: ChangeCell::new(Vector4::new(0.0, 0.0, 0.0, 1.0)),
            time: Duration::ZERO,
            exit_requested: false,
        }
    }

    pub fn driver(&self) -> &SharedDriver {
        &self.driver
    }

    pub fn is_key_pressed(&self, key: NamedKey) -> bool {
        self.pressed_keys.contains(&key)
    }

    pub fn press_key(&mut self, key: NamedKey) {
        self.pressed_keys.insert(key);
    }

    pub fn release_key(&mut self, key: NamedKey) {
        self.pressed_keys.remove(&key);
    }

    /// Time since the scene was entered.
    pub fn time(&self) -> Duration {
        self.time
    }

    pub(crate) fn set_time(&mut self, time: Duration) {
        self.time = time;
    }

    /// Asks the host to stop the loop before the next frame.
    pub fn exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn set_clear_color(&mut self, red: f32, green: f32, blue: f32) {
        self.background_color.set(Vector4::new(red, green, blue, 1.0));
    }

    pub fn clear_color(&self) -> Vector4<f32> {
        *self.background_color.get()
    }

    pub fn resize(&self, width: i32, height: i32) {
        self.driver.viewport(width, height);
    }

    /// Clears the framebuffer, pushing the clear color to the driver first
    /// if it changed.
    pub(crate) fn clear(&mut self) {
        let driver = &self.driver;
        self.background_color.apply_on_change(|color| {
            driver.clear_color(color.x, color.y, color.z, color.w);
        });
        self.driver.clear();
    }
}
