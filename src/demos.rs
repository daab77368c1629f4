pub mod textured_quad;
pub mod triangle;
