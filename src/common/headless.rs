//! An in-memory [`GraphicsDriver`] for running scenes without a GPU.
//!
//! Shader stages are checked with a tiny structural validator (an entry
//! point and balanced brackets), linking matches fragment inputs against
//! vertex outputs, and uniforms are resolved from their `uniform`
//! declarations. Every object the driver hands out is tracked until it is
//! deleted, so leaks and double deletes are observable through
//! [`HeadlessDriver::live_objects`] and [`HeadlessDriver::errors`].

use std::{cell::RefCell, ffi::CStr};

use fnv::{FnvHashMap, FnvHashSet};

use super::{
    driver::{
        BufferId, BufferTarget, GraphicsDriver, ProgramId, ShaderId, TextureId, VertexArrayId,
    },
    shader::{Stage, Uniform},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LiveObjects {
    pub shaders: usize,
    pub programs: usize,
    pub buffers: usize,
    pub vertex_arrays: usize,
    pub textures: usize,
}

impl LiveObjects {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniformWrite {
    pub program: ProgramId,
    pub name: String,
    pub value: Uniform,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub program: Option<ProgramId>,
    pub vertex_array: VertexArrayId,
    pub texture: Option<TextureId>,
    pub count: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferUpload {
    pub target: BufferTarget,
    pub buffer: BufferId,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeLayout {
    pub location: u32,
    pub components: i32,
    pub stride: i32,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureUpload {
    pub texture: TextureId,
    pub width: u32,
    pub height: u32,
    pub len: usize,
}

struct ShaderObject {
    stage: Stage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Default)]
struct ProgramObject {
    attached: Vec<u32>,
    linked: bool,
    log: String,
    uniforms: Vec<String>,
}

#[derive(Default)]
struct State {
    next_id: u32,
    shaders: FnvHashMap<u32, ShaderObject>,
    programs: FnvHashMap<u32, ProgramObject>,
    buffers: FnvHashMap<u32, usize>,
    vertex_arrays: FnvHashSet<u32>,
    textures: FnvHashSet<u32>,
    element_buffers: FnvHashMap<u32, u32>,
    active_program: Option<u32>,
    bound_vertex_array: Option<u32>,
    bound_texture: Option<u32>,
    uniform_writes: Vec<UniformWrite>,
    draws: Vec<DrawCall>,
    buffer_uploads: Vec<BufferUpload>,
    attributes: Vec<AttributeLayout>,
    texture_uploads: Vec<TextureUpload>,
    clear_color: Option<[f32; 4]>,
    clears: usize,
    viewport: Option<(i32, i32)>,
    errors: Vec<String>,
}

impl State {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct HeadlessDriver {
    state: RefCell<State>,
}

impl HeadlessDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_objects(&self) -> LiveObjects {
        let state = self.state.borrow();
        LiveObjects {
            shaders: state.shaders.len(),
            programs: state.programs.len(),
            buffers: state.buffers.len(),
            vertex_arrays: state.vertex_arrays.len(),
            textures: state.textures.len(),
        }
    }

    /// Misuse the driver noticed: deleting unknown objects, drawing without a
    /// vertex array, writing uniforms with no program active and similar.
    pub fn errors(&self) -> Vec<String> {
        self.state.borrow().errors.clone()
    }

    pub fn uniform_writes(&self) -> Vec<UniformWrite> {
        self.state.borrow().uniform_writes.clone()
    }

    pub fn draws(&self) -> Vec<DrawCall> {
        self.state.borrow().draws.clone()
    }

    pub fn buffer_uploads(&self) -> Vec<BufferUpload> {
        self.state.borrow().buffer_uploads.clone()
    }

    pub fn attributes(&self) -> Vec<AttributeLayout> {
        self.state.borrow().attributes.clone()
    }

    pub fn texture_uploads(&self) -> Vec<TextureUpload> {
        self.state.borrow().texture_uploads.clone()
    }

    pub fn clear_color(&self) -> Option<[f32; 4]> {
        self.state.borrow().clear_color
    }

    pub fn clear_count(&self) -> usize {
        self.state.borrow().clears
    }

    pub fn viewport(&self) -> Option<(i32, i32)> {
        self.state.borrow().viewport
    }

    pub fn active_program(&self) -> Option<ProgramId> {
        self.state.borrow().active_program.map(ProgramId)
    }
}

impl GraphicsDriver for HeadlessDriver {
    fn create_shader(&self, stage: Stage) -> ShaderId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.shaders.insert(
            id,
            ShaderObject {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        ShaderId(id)
    }

    fn compile_shader(&self, shader: ShaderId, source: &CStr) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(object) = state.shaders.get_mut(&shader.0) else {
            state.errors.push(format!("compile of unknown shader {}", shader.0));
            return false;
        };
        object.source = source.to_string_lossy().into_owned();
        match validate_source(&object.source) {
            Ok(()) => {
                object.compiled = true;
                object.log.clear();
            }
            Err(log) => {
                object.compiled = false;
                object.log = log;
            }
        }
        object.compiled
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        let state = self.state.borrow();
        state
            .shaders
            .get(&shader.0)
            .map(|object| object.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: ShaderId) {
        let mut state = self.state.borrow_mut();
        if state.shaders.remove(&shader.0).is_none() {
            state.errors.push(format!("delete of unknown shader {}", shader.0));
        }
    }

    fn create_program(&self) -> ProgramId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.programs.insert(id, ProgramObject::default());
        ProgramId(id)
    }

    fn attach_shader(&self, program: ProgramId, shader: ShaderId) {
        let mut state = self.state.borrow_mut();
        if !state.shaders.contains_key(&shader.0) {
            state.errors.push(format!("attach of unknown shader {}", shader.0));
            return;
        }
        match state.programs.get_mut(&program.0) {
            Some(object) => object.attached.push(shader.0),
            None => state.errors.push(format!("attach to unknown program {}", program.0)),
        }
    }

    fn link_program(&self, program: ProgramId) -> bool {
        let mut state = self.state.borrow_mut();
        let State {
            shaders,
            programs,
            errors,
            ..
        } = &mut *state;
        let Some(object) = programs.get_mut(&program.0) else {
            errors.push(format!("link of unknown program {}", program.0));
            return false;
        };
        let stages: Vec<&ShaderObject> = object
            .attached
            .iter()
            .filter_map(|id| shaders.get(id))
            .collect();
        match link(&stages) {
            Ok(uniforms) => {
                object.linked = true;
                object.uniforms = uniforms;
                object.log.clear();
            }
            Err(log) => {
                object.linked = false;
                object.uniforms.clear();
                object.log = log;
            }
        }
        object.linked
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        let state = self.state.borrow();
        state
            .programs
            .get(&program.0)
            .map(|object| object.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&self, program: ProgramId) {
        let mut state = self.state.borrow_mut();
        if state.programs.remove(&program.0).is_none() {
            state.errors.push(format!("delete of unknown program {}", program.0));
        }
        if state.active_program == Some(program.0) {
            state.active_program = None;
        }
    }

    fn use_program(&self, program: ProgramId) {
        let mut state = self.state.borrow_mut();
        match state.programs.get(&program.0).map(|object| object.linked) {
            Some(true) => state.active_program = Some(program.0),
            Some(false) => state.errors.push(format!("use of unlinked program {}", program.0)),
            None => state.errors.push(format!("use of unknown program {}", program.0)),
        }
    }

    fn uniform_location(&self, program: ProgramId, name: &CStr) -> Option<i32> {
        let state = self.state.borrow();
        let object = state.programs.get(&program.0)?;
        let name = name.to_str().ok()?;
        object
            .uniforms
            .iter()
            .position(|uniform| uniform == name)
            .map(|location| location as i32)
    }

    fn set_uniform(&self, location: i32, value: Uniform) {
        let mut state = self.state.borrow_mut();
        let Some(program) = state.active_program else {
            state.errors.push("uniform write with no active program".to_string());
            return;
        };
        let name = state
            .programs
            .get(&program)
            .and_then(|object| object.uniforms.get(location as usize))
            .cloned();
        match name {
            Some(name) => state.uniform_writes.push(UniformWrite {
                program: ProgramId(program),
                name,
                value,
            }),
            None => state.errors.push(format!(
                "uniform location {location} does not exist in program {program}"
            )),
        }
    }

    fn create_vertex_array(&self) -> VertexArrayId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.vertex_arrays.insert(id);
        VertexArrayId(id)
    }

    fn bind_vertex_array(&self, vertex_array: VertexArrayId) {
        let mut state = self.state.borrow_mut();
        if state.vertex_arrays.contains(&vertex_array.0) {
            state.bound_vertex_array = Some(vertex_array.0);
        } else {
            state
                .errors
                .push(format!("bind of unknown vertex array {}", vertex_array.0));
        }
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayId) {
        let mut state = self.state.borrow_mut();
        if !state.vertex_arrays.remove(&vertex_array.0) {
            state
                .errors
                .push(format!("delete of unknown vertex array {}", vertex_array.0));
        }
        state.element_buffers.remove(&vertex_array.0);
        if state.bound_vertex_array == Some(vertex_array.0) {
            state.bound_vertex_array = None;
        }
    }

    fn create_buffer(&self) -> BufferId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.buffers.insert(id, 0);
        BufferId(id)
    }

    fn buffer_data(&self, target: BufferTarget, buffer: BufferId, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let Some(size) = state.buffers.get_mut(&buffer.0) else {
            state.errors.push(format!("upload to unknown buffer {}", buffer.0));
            return;
        };
        *size = data.len();
        if target == BufferTarget::ElementArray {
            match state.bound_vertex_array {
                Some(vertex_array) => {
                    state.element_buffers.insert(vertex_array, buffer.0);
                }
                None => state
                    .errors
                    .push("element buffer bound with no vertex array".to_string()),
            }
        }
        state.buffer_uploads.push(BufferUpload {
            target,
            buffer,
            bytes: data.to_vec(),
        });
    }

    fn delete_buffer(&self, buffer: BufferId) {
        let mut state = self.state.borrow_mut();
        if state.buffers.remove(&buffer.0).is_none() {
            state.errors.push(format!("delete of unknown buffer {}", buffer.0));
        }
    }

    fn vertex_attrib_pointer(&self, location: u32, components: i32, stride: i32, offset: usize) {
        let mut state = self.state.borrow_mut();
        if state.bound_vertex_array.is_none() {
            state
                .errors
                .push(format!("attribute {location} described with no vertex array"));
        }
        state.attributes.push(AttributeLayout {
            location,
            components,
            stride,
            offset,
        });
    }

    fn create_texture(&self) -> TextureId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.textures.insert(id);
        TextureId(id)
    }

    fn bind_texture(&self, unit: u32, texture: TextureId) {
        let mut state = self.state.borrow_mut();
        if unit != 0 {
            state.errors.push(format!("texture unit {unit} is not simulated"));
        }
        if state.textures.contains(&texture.0) {
            state.bound_texture = Some(texture.0);
        } else {
            state.errors.push(format!("bind of unknown texture {}", texture.0));
        }
    }

    fn upload_texture_2d(&self, width: u32, height: u32, pixels: &[u8]) {
        let mut state = self.state.borrow_mut();
        let Some(texture) = state.bound_texture else {
            state.errors.push("texture upload with no bound texture".to_string());
            return;
        };
        if pixels.len() != width as usize * height as usize * 4 {
            state.errors.push(format!(
                "{} bytes do not describe a {width}x{height} rgba image",
                pixels.len()
            ));
        }
        state.texture_uploads.push(TextureUpload {
            texture: TextureId(texture),
            width,
            height,
            len: pixels.len(),
        });
    }

    fn delete_texture(&self, texture: TextureId) {
        let mut state = self.state.borrow_mut();
        if !state.textures.remove(&texture.0) {
            state.errors.push(format!("delete of unknown texture {}", texture.0));
        }
        if state.bound_texture == Some(texture.0) {
            state.bound_texture = None;
        }
    }

    fn draw_elements(&self, count: i32) {
        let mut state = self.state.borrow_mut();
        let Some(vertex_array) = state.bound_vertex_array else {
            state.errors.push("draw with no vertex array bound".to_string());
            return;
        };
        let indices = state
            .element_buffers
            .get(&vertex_array)
            .and_then(|buffer| state.buffers.get(buffer))
            .map(|bytes| bytes / std::mem::size_of::<u32>());
        match indices {
            Some(indices) if count as usize <= indices => {}
            Some(indices) => state.errors.push(format!(
                "draw of {count} indices from a buffer holding {indices}"
            )),
            None => state.errors.push("draw with no element buffer".to_string()),
        }
        let draw = DrawCall {
            program: state.active_program.map(ProgramId),
            vertex_array: VertexArrayId(vertex_array),
            texture: state.bound_texture.map(TextureId),
            count,
        };
        state.draws.push(draw);
    }

    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.state.borrow_mut().clear_color = Some([red, green, blue, alpha]);
    }

    fn clear(&self) {
        self.state.borrow_mut().clears += 1;
    }

    fn viewport(&self, width: i32, height: i32) {
        self.state.borrow_mut().viewport = Some((width, height));
    }
}

fn validate_source(source: &str) -> Result<(), String> {
    let mut depth = [0i32; 2];
    for (number, line) in source.lines().enumerate() {
        for c in line.chars() {
            let (slot, step) = match c {
                '{' => (0, 1),
                '}' => (0, -1),
                '(' => (1, 1),
                ')' => (1, -1),
                _ => continue,
            };
            depth[slot] += step;
            if depth[slot] < 0 {
                return Err(format!("0:{}: error: syntax error, unexpected '{c}'", number + 1));
            }
        }
    }
    if depth != [0, 0] {
        return Err("0:0: error: syntax error, unexpected end of file".to_string());
    }
    if !source.contains("void main") {
        return Err("0:0: error: no function definition for `main`".to_string());
    }
    Ok(())
}

/// Resolves the uniforms of a program, or explains why it cannot link.
fn link(stages: &[&ShaderObject]) -> Result<Vec<String>, String> {
    let compiled = |stage: Stage| {
        stages
            .iter()
            .find(|object| object.stage == stage && object.compiled)
    };
    let (Some(vertex), Some(fragment)) = (compiled(Stage::Vertex), compiled(Stage::Fragment))
    else {
        return Err("error: a compiled vertex and fragment shader must be attached".to_string());
    };
    let outputs: Vec<&str> = declarations(&vertex.source, "out").collect();
    if let Some(input) =
        declarations(&fragment.source, "in").find(|input| !outputs.contains(input))
    {
        return Err(format!(
            "error: fragment shader input `{input}` has no matching vertex shader output"
        ));
    }
    let mut uniforms: Vec<String> = Vec::new();
    let declared = declarations(&vertex.source, "uniform")
        .chain(declarations(&fragment.source, "uniform"));
    for name in declared {
        if !uniforms.iter().any(|uniform| uniform == name) {
            uniforms.push(name.to_string());
        }
    }
    Ok(uniforms)
}

fn declarations<'s>(source: &'s str, qualifier: &'s str) -> impl Iterator<Item = &'s str> {
    source.lines().filter_map(move |line| {
        let mut line = line.trim();
        if line.starts_with("layout") {
            line = line.split_once(')')?.1.trim();
        }
        let mut tokens = line.split_whitespace();
        if tokens.next()? != qualifier {
            return None;
        }
        let _ty = tokens.next()?;
        let name = tokens.next()?.trim_end_matches(';');
        name.split('[').next()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations_skip_layout_qualifiers() {
        let source = "layout (location = 0) in vec3 aPos;\nin vec2 uv;\nout vec4 color;";
        assert_eq!(declarations(source, "in").collect::<Vec<_>>(), ["aPos", "uv"]);
        assert_eq!(declarations(source, "out").collect::<Vec<_>>(), ["color"]);
    }

    #[test]
    fn unbalanced_braces_fail_validation() {
        assert!(validate_source("void main() { }").is_ok());
        assert!(validate_source("void main() { ").is_err());
        assert!(validate_source("void main() } {").is_err());
        assert!(validate_source("void other() { }").is_err());
    }

    #[test]
    fn deleting_twice_is_reported() {
        let driver = HeadlessDriver::new();
        let buffer = driver.create_buffer();
        driver.delete_buffer(buffer);
        driver.delete_buffer(buffer);
        assert_eq!(driver.errors().len(), 1);
        assert!(driver.live_objects().is_empty());
    }
}
