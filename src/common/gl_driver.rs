use std::{
    ffi::{CStr, CString},
    marker::PhantomData,
};

use glutin::prelude::GlDisplay;
use tracing::info;

use super::{
    driver::{
        BufferId, BufferTarget, GraphicsDriver, ProgramId, ShaderId, TextureId, VertexArrayId,
    },
    gl::{
        self,
        types::{GLchar, GLenum, GLint, GLsizei, GLsizeiptr},
    },
    shader::{Stage, Uniform},
};

/// Issues every call against the OpenGL context current on this thread.
pub struct GlDriver {
    // GL calls are only valid on the thread that owns the context.
    _not_send: PhantomData<*const ()>,
}

impl GlDriver {
    /// Loads the GL function pointers through `gl_display`.
    ///
    /// # Safety
    ///
    /// A context created from `gl_display` must be current on this thread and
    /// stay current for as long as the driver (or anything created from it)
    /// is alive.
    pub unsafe fn load<D>(gl_display: &D) -> Self
    where
        D: GlDisplay,
    {
        gl::load_with(|symbol| match CString::new(symbol) {
            Ok(symbol) => gl_display.get_proc_address(symbol.as_c_str()).cast(),
            Err(_) => std::ptr::null(),
        });
        if let Some(renderer) = get_gl_string(gl::RENDERER) {
            info!("Running on {}", renderer.to_string_lossy());
        }
        if let Some(version) = get_gl_string(gl::VERSION) {
            info!("OpenGL Version {}", version.to_string_lossy());
        }
        if let Some(shaders_version) = get_gl_string(gl::SHADING_LANGUAGE_VERSION) {
            info!("Shaders version on {}", shaders_version.to_string_lossy());
        }
        Self {
            _not_send: PhantomData,
        }
    }
}

impl GraphicsDriver for GlDriver {
    fn create_shader(&self, stage: Stage) -> ShaderId {
        let kind = match stage {
            Stage::Vertex => gl::VERTEX_SHADER,
            Stage::Fragment => gl::FRAGMENT_SHADER,
        };
        ShaderId(unsafe { gl::CreateShader(kind) })
    }

    fn compile_shader(&self, shader: ShaderId, source: &CStr) -> bool {
        unsafe {
            gl::ShaderSource(shader.0, 1, &source.as_ptr(), std::ptr::null());
            gl::CompileShader(shader.0);
            let mut compile_status = gl::FALSE as GLint;
            gl::GetShaderiv(shader.0, gl::COMPILE_STATUS, &mut compile_status);
            compile_status == gl::TRUE as GLint
        }
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        unsafe {
            let mut log_length = 0;
            gl::GetShaderiv(shader.0, gl::INFO_LOG_LENGTH, &mut log_length);
            read_info_log(log_length, |capacity, written, log| {
                gl::GetShaderInfoLog(shader.0, capacity, written, log)
            })
        }
    }

    fn delete_shader(&self, shader: ShaderId) {
        unsafe { gl::DeleteShader(shader.0) }
    }

    fn create_program(&self) -> ProgramId {
        ProgramId(unsafe { gl::CreateProgram() })
    }

    fn attach_shader(&self, program: ProgramId, shader: ShaderId) {
        unsafe { gl::AttachShader(program.0, shader.0) }
    }

    fn link_program(&self, program: ProgramId) -> bool {
        unsafe {
            gl::LinkProgram(program.0);
            let mut link_status = gl::FALSE as GLint;
            gl::GetProgramiv(program.0, gl::LINK_STATUS, &mut link_status);
            link_status == gl::TRUE as GLint
        }
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        unsafe {
            let mut log_length = 0;
            gl::GetProgramiv(program.0, gl::INFO_LOG_LENGTH, &mut log_length);
            read_info_log(log_length, |capacity, written, log| {
                gl::GetProgramInfoLog(program.0, capacity, written, log)
            })
        }
    }

    fn delete_program(&self, program: ProgramId) {
        unsafe { gl::DeleteProgram(program.0) }
    }

    fn use_program(&self, program: ProgramId) {
        unsafe { gl::UseProgram(program.0) }
    }

    fn uniform_location(&self, program: ProgramId, name: &CStr) -> Option<i32> {
        let location = unsafe { gl::GetUniformLocation(program.0, name.as_ptr()) };
        (location != -1).then_some(location)
    }

    fn set_uniform(&self, location: i32, value: Uniform) {
        unsafe {
            match value {
                Uniform::Float(x) => gl::Uniform1f(location, x),
                Uniform::Int(x) => gl::Uniform1i(location, x),
                Uniform::Vec4(v) => gl::Uniform4f(location, v.x, v.y, v.z, v.w),
            }
        }
    }

    fn create_vertex_array(&self) -> VertexArrayId {
        let mut vao_ref = 0;
        unsafe { gl::GenVertexArrays(1, &mut vao_ref) };
        VertexArrayId(vao_ref)
    }

    fn bind_vertex_array(&self, vertex_array: VertexArrayId) {
        unsafe { gl::BindVertexArray(vertex_array.0) }
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayId) {
        unsafe { gl::DeleteVertexArrays(1, &vertex_array.0) }
    }

    fn create_buffer(&self) -> BufferId {
        let mut vbo_ref = 0;
        unsafe { gl::GenBuffers(1, &mut vbo_ref) };
        BufferId(vbo_ref)
    }

    fn buffer_data(&self, target: BufferTarget, buffer: BufferId, data: &[u8]) {
        let target = match target {
            BufferTarget::Array => gl::ARRAY_BUFFER,
            BufferTarget::ElementArray => gl::ELEMENT_ARRAY_BUFFER,
        };
        unsafe {
            gl::BindBuffer(target, buffer.0);
            gl::BufferData(
                target,
                data.len() as GLsizeiptr,
                data.as_ptr().cast(),
                gl::STATIC_DRAW,
            );
        }
    }

    fn delete_buffer(&self, buffer: BufferId) {
        unsafe { gl::DeleteBuffers(1, &buffer.0) }
    }

    fn vertex_attrib_pointer(&self, location: u32, components: i32, stride: i32, offset: usize) {
        unsafe {
            gl::VertexAttribPointer(
                location,
                components,
                gl::FLOAT,
                gl::FALSE,
                stride,
                offset as *const std::ffi::c_void,
            );
            gl::EnableVertexAttribArray(location);
        }
    }

    fn create_texture(&self) -> TextureId {
        let mut texture = 0;
        unsafe { gl::GenTextures(1, &mut texture) };
        TextureId(texture)
    }

    fn bind_texture(&self, unit: u32, texture: TextureId) {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + unit);
            gl::BindTexture(gl::TEXTURE_2D, texture.0);
        }
    }

    fn upload_texture_2d(&self, width: u32, height: u32, pixels: &[u8]) {
        unsafe {
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as GLint);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::RGBA as GLint,
                width as GLsizei,
                height as GLsizei,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                pixels.as_ptr().cast(),
            );
            gl::GenerateMipmap(gl::TEXTURE_2D);
        }
    }

    fn delete_texture(&self, texture: TextureId) {
        unsafe { gl::DeleteTextures(1, &texture.0) }
    }

    fn draw_elements(&self, count: i32) {
        unsafe { gl::DrawElements(gl::TRIANGLES, count, gl::UNSIGNED_INT, std::ptr::null()) }
    }

    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        unsafe { gl::ClearColor(red, green, blue, alpha) }
    }

    fn clear(&self) {
        unsafe { gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT) }
    }

    fn viewport(&self, width: i32, height: i32) {
        unsafe { gl::Viewport(0, 0, width, height) }
    }
}

unsafe fn read_info_log<F>(log_length: GLint, read: F) -> String
where
    F: FnOnce(GLsizei, *mut GLsizei, *mut GLchar),
{
    if log_length <= 0 {
        return String::new();
    }
    let mut log = vec![0u8; log_length as usize];
    let mut written: GLsizei = 0;
    read(log_length, &mut written, log.as_mut_ptr() as *mut GLchar);
    log.truncate(written.max(0) as usize);
    String::from_utf8_lossy(&log).into_owned()
}

fn get_gl_string(variant: GLenum) -> Option<&'static CStr> {
    unsafe {
        let s = gl::GetString(variant);
        (!s.is_null()).then(|| CStr::from_ptr(s.cast()))
    }
}
