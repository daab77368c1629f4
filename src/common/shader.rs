use std::{ffi::CString, fmt, rc::Rc};

use nalgebra::Vector4;
use tracing::debug;

use super::{
    driver::{GraphicsDriver, ProgramId, ShaderId, SharedDriver},
    errors::GlError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Vertex => f.write_str("vertex"),
            Stage::Fragment => f.write_str("fragment"),
        }
    }
}

/// A value written into a named uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    Float(f32),
    Int(i32),
    Vec4(Vector4<f32>),
}

/// A linked vertex + fragment program. Deleted from the driver when dropped.
pub struct ShaderProgram {
    driver: SharedDriver,
    program_id: ProgramId,
}

impl ShaderProgram {
    /// Compiles both stages and links them.
    ///
    /// Every driver object created along the way is released before this
    /// returns, whether it succeeds or not; only the linked program survives.
    pub fn build(
        driver: &SharedDriver,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, GlError> {
        let vertex_shader =
            CompiledStage::compile(driver.as_ref(), Stage::Vertex, vertex_source)?;
        let fragment_shader =
            CompiledStage::compile(driver.as_ref(), Stage::Fragment, fragment_source)?;
        let program = Self {
            driver: Rc::clone(driver),
            program_id: driver.create_program(),
        };
        driver.attach_shader(program.program_id, vertex_shader.shader_id);
        driver.attach_shader(program.program_id, fragment_shader.shader_id);
        if !driver.link_program(program.program_id) {
            return Err(GlError::ProgramLink(
                driver.program_info_log(program.program_id),
            ));
        }
        debug!(program = program.program_id.0, "linked shader program");
        Ok(program)
    }

    pub fn id(&self) -> ProgramId {
        self.program_id
    }

    /// Makes this the program used by subsequent draw calls.
    pub fn use_program(&self) {
        self.driver.use_program(self.program_id);
    }

    /// Looks `name` up and writes `value` into it. Uniform writes target the
    /// active program, so this activates the program first.
    pub fn set_uniform(&self, name: &str, value: Uniform) -> Result<(), GlError> {
        let c_name = CString::new(name).map_err(|_| GlError::UnknownUniform(name.to_string()))?;
        let location = self
            .driver
            .uniform_location(self.program_id, &c_name)
            .ok_or_else(|| GlError::UnknownUniform(name.to_string()))?;
        self.use_program();
        self.driver.set_uniform(location, value);
        Ok(())
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        self.driver.delete_program(self.program_id);
    }
}

impl fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("program_id", &self.program_id)
            .finish()
    }
}

/// A stage object that only lives until the program is linked.
struct CompiledStage<'a> {
    driver: &'a dyn GraphicsDriver,
    shader_id: ShaderId,
}

impl<'a> CompiledStage<'a> {
    fn compile(
        driver: &'a dyn GraphicsDriver,
        stage: Stage,
        source: &str,
    ) -> Result<Self, GlError> {
        let c_str = CString::new(source).map_err(|_| GlError::ShaderCompile {
            stage,
            log: "shader must not contain a null byte".to_string(),
        })?;
        let compiled = Self {
            driver,
            shader_id: driver.create_shader(stage),
        };
        if !driver.compile_shader(compiled.shader_id, &c_str) {
            return Err(GlError::ShaderCompile {
                stage,
                log: driver.shader_info_log(compiled.shader_id),
            });
        }
        Ok(compiled)
    }
}

impl Drop for CompiledStage<'_> {
    fn drop(&mut self) {
        self.driver.delete_shader(self.shader_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::headless::HeadlessDriver;

    const VERTEX: &str = r#"
#version 330 core
layout (location = 0) in vec3 aPos;
layout (location = 1) in vec3 aColor;

out vec3 vertexColor;

void main()
{
    gl_Position = vec4(aPos, 1.0);
    vertexColor = aColor;
}
"#;

    const FRAGMENT: &str = r#"
#version 330 core
in vec3 vertexColor;
out vec4 FragColor;

uniform vec4 tint;

void main()
{
    FragColor = vec4(vertexColor, 1.0) * tint;
}
"#;

    fn headless() -> (Rc<HeadlessDriver>, SharedDriver) {
        let headless = Rc::new(HeadlessDriver::new());
        let driver: SharedDriver = headless.clone();
        (headless, driver)
    }

    #[test]
    fn valid_sources_link_and_only_the_program_survives() {
        let (headless, driver) = headless();
        let program = ShaderProgram::build(&driver, VERTEX, FRAGMENT).unwrap();
        let live = headless.live_objects();
        assert_eq!(live.programs, 1);
        assert_eq!(live.shaders, 0);

        program.use_program();
        assert_eq!(headless.active_program(), Some(program.id()));

        drop(program);
        assert!(headless.live_objects().is_empty());
        assert!(headless.errors().is_empty(), "{:?}", headless.errors());
    }

    #[test]
    fn vertex_syntax_error_is_tagged_and_leaks_nothing() {
        let (headless, driver) = headless();
        let broken = VERTEX.replace("vertexColor = aColor;\n}", "vertexColor = aColor;\n");
        let err = ShaderProgram::build(&driver, &broken, FRAGMENT).unwrap_err();
        assert!(matches!(
            err,
            GlError::ShaderCompile {
                stage: Stage::Vertex,
                ..
            }
        ));
        assert!(headless.live_objects().is_empty());
        assert!(headless.errors().is_empty(), "{:?}", headless.errors());
    }

    #[test]
    fn fragment_syntax_error_releases_the_compiled_vertex_stage() {
        let (headless, driver) = headless();
        let broken = FRAGMENT.replace("void main()", "void main(");
        let err = ShaderProgram::build(&driver, VERTEX, &broken).unwrap_err();
        match err {
            GlError::ShaderCompile { stage, log } => {
                assert_eq!(stage, Stage::Fragment);
                assert!(log.contains("error"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(headless.live_objects().is_empty());
    }

    #[test]
    fn mismatched_interface_fails_to_link_and_leaks_nothing() {
        let (headless, driver) = headless();
        let fragment = FRAGMENT.replace("vertexColor", "ourColor");
        let err = ShaderProgram::build(&driver, VERTEX, &fragment).unwrap_err();
        match err {
            GlError::ProgramLink(log) => assert!(log.contains("ourColor")),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(headless.live_objects().is_empty());
        assert!(headless.errors().is_empty(), "{:?}", headless.errors());
    }

    #[test]
    fn interior_null_byte_is_a_compile_error() {
        let (headless, driver) = headless();
        let err = ShaderProgram::build(&driver, VERTEX, "void main() {}\0").unwrap_err();
        assert!(matches!(
            err,
            GlError::ShaderCompile {
                stage: Stage::Fragment,
                ..
            }
        ));
        assert!(headless.live_objects().is_empty());
    }

    #[test]
    fn uniforms_are_written_into_the_active_program() {
        let (headless, driver) = headless();
        let program = ShaderProgram::build(&driver, VERTEX, FRAGMENT).unwrap();
        let tint = Uniform::Vec4(Vector4::new(0.0, 0.5, 0.0, 1.0));
        program.set_uniform("tint", tint).unwrap();

        let writes = headless.uniform_writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].program, program.id());
        assert_eq!(writes[0].name, "tint");
        assert_eq!(writes[0].value, tint);
    }

    #[test]
    fn unknown_uniform_is_reported() {
        let (headless, driver) = headless();
        let program = ShaderProgram::build(&driver, VERTEX, FRAGMENT).unwrap();
        assert_eq!(
            program.set_uniform("missing", Uniform::Float(1.0)),
            Err(GlError::UnknownUniform("missing".to_string()))
        );
        assert!(headless.uniform_writes().is_empty());
    }
}
