//! The boundary between scene code and the graphics driver.
//!
//! Scenes never touch `gl::*` directly. Every call goes through a
//! [`GraphicsDriver`], so the same scene runs on a real OpenGL context
//! ([`GlDriver`](super::gl_driver::GlDriver)) or fully in memory
//! ([`HeadlessDriver`](super::headless::HeadlessDriver)).

use std::{ffi::CStr, rc::Rc};

use super::shader::{Stage, Uniform};

/// Shared by every resource created from the driver. GL objects are only
/// valid on the thread that owns the context.
pub type SharedDriver = Rc<dyn GraphicsDriver>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    /// Per-vertex attribute data.
    Array,
    /// Triangle indices, recorded in the bound vertex array.
    ElementArray,
}

pub trait GraphicsDriver {
    fn create_shader(&self, stage: Stage) -> ShaderId;
    /// Uploads `source` and compiles it. Returns the compile status.
    fn compile_shader(&self, shader: ShaderId, source: &CStr) -> bool;
    fn shader_info_log(&self, shader: ShaderId) -> String;
    fn delete_shader(&self, shader: ShaderId);

    fn create_program(&self) -> ProgramId;
    fn attach_shader(&self, program: ProgramId, shader: ShaderId);
    /// Returns the link status.
    fn link_program(&self, program: ProgramId) -> bool;
    fn program_info_log(&self, program: ProgramId) -> String;
    fn delete_program(&self, program: ProgramId);
    fn use_program(&self, program: ProgramId);
    fn uniform_location(&self, program: ProgramId, name: &CStr) -> Option<i32>;
    /// Writes into the uniform at `location` of the active program.
    fn set_uniform(&self, location: i32, value: Uniform);

    fn create_vertex_array(&self) -> VertexArrayId;
    fn bind_vertex_array(&self, vertex_array: VertexArrayId);
    fn delete_vertex_array(&self, vertex_array: VertexArrayId);

    fn create_buffer(&self) -> BufferId;
    /// Binds `buffer` to `target` and uploads `data` as static draw data.
    fn buffer_data(&self, target: BufferTarget, buffer: BufferId, data: &[u8]);
    fn delete_buffer(&self, buffer: BufferId);
    /// Describes a float attribute of the bound array buffer and enables it.
    /// `stride` and `offset` are in bytes.
    fn vertex_attrib_pointer(&self, location: u32, components: i32, stride: i32, offset: usize);

    fn create_texture(&self) -> TextureId;
    fn bind_texture(&self, unit: u32, texture: TextureId);
    /// Uploads tightly packed RGBA8 pixels into the texture bound on unit 0,
    /// with linear filtering, edge clamping and a full mip chain.
    fn upload_texture_2d(&self, width: u32, height: u32, pixels: &[u8]);
    fn delete_texture(&self, texture: TextureId);

    /// Draws `count` unsigned-int indices of the bound vertex array as triangles.
    fn draw_elements(&self, count: i32);
    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32);
    fn clear(&self);
    fn viewport(&self, width: i32, height: i32);
}
