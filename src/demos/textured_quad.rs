use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    common::{
        mesh::{Mesh, VertexLayout},
        shader::{ShaderProgram, Uniform},
        texture::Texture,
    },
    errors::EngineError,
    NamedKey, Scene, SceneContext,
};

const VERTEX_SHADER: &str = include_str!("shaders/textured_quad.vert");
const FRAGMENT_SHADER: &str = include_str!("shaders/textured_quad.frag");

/// Position, color, texture coordinate.
pub const LAYOUT: VertexLayout<'static> = VertexLayout::new(&[3, 3, 2]);

#[rustfmt::skip]
pub const VERTICES: [f32; 32] = [
    // position       // color         // uv
    0.5, 0.5, 0.0,    1.0, 0.0, 0.0,   1.0, 1.0, // top right
    0.5, -0.5, 0.0,   0.0, 1.0, 0.0,   1.0, 0.0, // bottom right
    -0.5, -0.5, 0.0,  0.0, 0.0, 1.0,   0.0, 0.0, // bottom left
    -0.5, 0.5, 0.0,   1.0, 1.0, 0.0,   0.0, 1.0, // top left
];

pub const INDICES: [u32; 6] = [
    0, 1, 3, // first triangle
    1, 2, 3, // second triangle
];

/// The brick texture shipped with the crate.
pub fn default_texture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join("wall.png")
}

/// A quad sampling a texture loaded from disk when the scene is entered.
pub struct TexturedQuadScene {
    texture_path: PathBuf,
    program: Option<ShaderProgram>,
    mesh: Option<Mesh>,
    texture: Option<Texture>,
}

impl TexturedQuadScene {
    pub fn new<P>(texture_path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            texture_path: texture_path.into(),
            program: None,
            mesh: None,
            texture: None,
        }
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }
}

impl Scene for TexturedQuadScene {
    fn on_enter(&mut self, context: &mut SceneContext) -> Result<(), EngineError> {
        let driver = context.driver();
        let program = ShaderProgram::build(driver, VERTEX_SHADER, FRAGMENT_SHADER)?;
        let mesh = Mesh::upload(driver, &VERTICES, &INDICES, LAYOUT)?;
        let texture = Texture::load(driver, &self.texture_path)?;
        program.set_uniform("ourTexture", Uniform::Int(0))?;
        self.program = Some(program);
        self.mesh = Some(mesh);
        self.texture = Some(texture);
        Ok(())
    }

    fn on_update(&mut self, context: &mut SceneContext, _elapsed: Duration) {
        if context.is_key_pressed(NamedKey::Escape) {
            context.exit();
        }
        let (Some(program), Some(mesh), Some(texture)) = (&self.program, &self.mesh, &self.texture)
        else {
            return;
        };
        texture.bind();
        program.use_program();
        mesh.draw();
    }

    fn on_exit(&mut self, _context: &mut SceneContext) {
        self.texture = None;
        self.mesh = None;
        self.program = None;
    }
}
