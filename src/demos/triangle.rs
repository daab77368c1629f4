use std::time::Duration;

use nalgebra::Vector4;
use tracing::warn;

use crate::{
    common::{
        mesh::{Mesh, VertexLayout},
        shader::{ShaderProgram, Uniform},
    },
    errors::EngineError,
    NamedKey, Scene, SceneContext,
};

const VERTEX_SHADER: &str = include_str!("shaders/triangle.vert");
const FRAGMENT_SHADER: &str = include_str!("shaders/triangle.frag");

/// Position followed by color.
pub const LAYOUT: VertexLayout<'static> = VertexLayout::new(&[3, 3]);

#[rustfmt::skip]
pub const VERTICES: [f32; 18] = [
    // position       // color
    0.5, -0.5, 0.0,   1.0, 0.0, 0.0, // bottom right
    -0.5, -0.5, 0.0,  0.0, 1.0, 0.0, // bottom left
    0.0, 0.5, 0.0,    0.0, 0.0, 1.0, // top
];

/// Three vertices make a single triangle. Quad-style indices such as
/// `[0, 1, 3, 1, 2, 3]` address a fourth vertex and are refused by
/// [`Mesh::upload`].
pub const INDICES: [u32; 3] = [0, 1, 2];

/// Green channel of the pulsing tint at `time`, always within `[0, 1]`.
pub fn pulse(time: Duration) -> f32 {
    (time.as_secs_f64().sin() / 2.0 + 0.5) as f32
}

/// A colored triangle tinted by a green value that pulses over time.
#[derive(Default)]
pub struct TriangleScene {
    program: Option<ShaderProgram>,
    mesh: Option<Mesh>,
}

impl TriangleScene {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scene for TriangleScene {
    fn on_enter(&mut self, context: &mut SceneContext) -> Result<(), EngineError> {
        let driver = context.driver();
        let program = ShaderProgram::build(driver, VERTEX_SHADER, FRAGMENT_SHADER)?;
        let mesh = Mesh::upload(driver, &VERTICES, &INDICES, LAYOUT)?;
        self.program = Some(program);
        self.mesh = Some(mesh);
        Ok(())
    }

    fn on_update(&mut self, context: &mut SceneContext, _elapsed: Duration) {
        if context.is_key_pressed(NamedKey::Escape) {
            context.exit();
        }
        let (Some(program), Some(mesh)) = (&self.program, &self.mesh) else {
            return;
        };
        let tint = Vector4::new(0.0, pulse(context.time()), 0.0, 1.0);
        if let Err(e) = program.set_uniform("ourColor", Uniform::Vec4(tint)) {
            warn!("{e}");
        }
        program.use_program();
        mesh.draw();
    }

    fn on_exit(&mut self, _context: &mut SceneContext) {
        self.mesh = None;
        self.program = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_starts_mid_range_and_stays_in_bounds() {
        assert!((pulse(Duration::ZERO) - 0.5).abs() < f32::EPSILON);
        assert!((pulse(Duration::from_secs_f64(std::f64::consts::FRAC_PI_2)) - 1.0).abs() < 1e-6);
        for millis in (0..20_000).step_by(37) {
            let green = pulse(Duration::from_millis(millis));
            assert!((0.0..=1.0).contains(&green), "{green} at {millis}ms");
        }
    }
}
