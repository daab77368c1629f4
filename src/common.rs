pub mod driver;
pub mod errors;
pub mod gl_driver;
pub mod headless;
pub mod mesh;
pub mod shader;
pub mod texture;

#[allow(dead_code, non_upper_case_globals, non_snake_case, clippy::all)]
pub(crate) mod gl {
    include!(concat!(env!("OUT_DIR"), "/gl_bindings.rs"));
}
