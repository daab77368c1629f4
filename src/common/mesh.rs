use std::rc::Rc;

use tracing::debug;

use super::{
    driver::{BufferId, BufferTarget, SharedDriver, VertexArrayId},
    errors::GlError,
};

const FLOAT_SIZE: usize = std::mem::size_of::<f32>();

/// Interleaved float attributes. Attribute `i` is bound to location `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout<'a> {
    components: &'a [usize],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    pub location: u32,
    pub components: usize,
    /// Bytes from the start of a vertex.
    pub offset: usize,
}

impl<'a> VertexLayout<'a> {
    pub const fn new(components: &'a [usize]) -> Self {
        Self { components }
    }

    pub fn floats_per_vertex(&self) -> usize {
        self.components.iter().sum()
    }

    /// Size of one vertex in bytes.
    pub fn stride(&self) -> usize {
        self.floats_per_vertex() * FLOAT_SIZE
    }

    pub fn attributes(&self) -> impl Iterator<Item = Attribute> + 'a {
        self.components
            .iter()
            .enumerate()
            .scan(0, |offset, (location, &components)| {
                let attribute = Attribute {
                    location: location as u32,
                    components,
                    offset: *offset,
                };
                *offset += components * FLOAT_SIZE;
                Some(attribute)
            })
    }
}

/// A vertex array with its vertex and index buffers.
pub struct Mesh {
    driver: SharedDriver,
    vertex_array: VertexArrayId,
    vertex_buffer: BufferId,
    index_buffer: BufferId,
    vertex_count: usize,
    index_count: usize,
}

impl Mesh {
    /// Uploads `vertices` laid out as `layout` together with triangle
    /// `indices`. Every index must address one of the uploaded vertices;
    /// nothing is created on the driver when validation fails.
    pub fn upload(
        driver: &SharedDriver,
        vertices: &[f32],
        indices: &[u32],
        layout: VertexLayout<'_>,
    ) -> Result<Self, GlError> {
        let components = layout.floats_per_vertex();
        if components == 0 || vertices.len() % components != 0 {
            return Err(GlError::MalformedVertices {
                len: vertices.len(),
                components,
            });
        }
        let vertex_count = vertices.len() / components;
        if let Some(&index) = indices.iter().find(|&&index| index as usize >= vertex_count) {
            return Err(GlError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }

        let mesh = Self {
            driver: Rc::clone(driver),
            vertex_array: driver.create_vertex_array(),
            vertex_buffer: driver.create_buffer(),
            index_buffer: driver.create_buffer(),
            vertex_count,
            index_count: indices.len(),
        };
        driver.bind_vertex_array(mesh.vertex_array);
        driver.buffer_data(
            BufferTarget::Array,
            mesh.vertex_buffer,
            bytemuck::cast_slice(vertices),
        );
        driver.buffer_data(
            BufferTarget::ElementArray,
            mesh.index_buffer,
            bytemuck::cast_slice(indices),
        );
        let stride = layout.stride() as i32;
        for attribute in layout.attributes() {
            driver.vertex_attrib_pointer(
                attribute.location,
                attribute.components as i32,
                stride,
                attribute.offset,
            );
        }
        debug!(
            vertex_array = mesh.vertex_array.0,
            vertex_count, "uploaded mesh"
        );
        Ok(mesh)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }

    /// Draws every index as triangles with whatever program is active.
    pub fn draw(&self) {
        self.driver.bind_vertex_array(self.vertex_array);
        self.driver.draw_elements(self.index_count as i32);
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        self.driver.delete_vertex_array(self.vertex_array);
        self.driver.delete_buffer(self.vertex_buffer);
        self.driver.delete_buffer(self.index_buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::headless::HeadlessDriver;

    const POSITION_COLOR: VertexLayout<'static> = VertexLayout::new(&[3, 3]);
    const POSITION_COLOR_UV: VertexLayout<'static> = VertexLayout::new(&[3, 3, 2]);

    #[rustfmt::skip]
    const TRIANGLE: [f32; 18] = [
        0.5, -0.5, 0.0, 1.0, 0.0, 0.0,
        -0.5, -0.5, 0.0, 0.0, 1.0, 0.0,
        0.0, 0.5, 0.0, 0.0, 0.0, 1.0,
    ];

    fn headless() -> (Rc<HeadlessDriver>, SharedDriver) {
        let headless = Rc::new(HeadlessDriver::new());
        let driver: SharedDriver = headless.clone();
        (headless, driver)
    }

    #[test]
    fn layouts_have_bit_exact_strides_and_offsets() {
        assert_eq!(POSITION_COLOR.stride(), 24);
        assert_eq!(POSITION_COLOR_UV.stride(), 32);
        let offsets: Vec<_> = POSITION_COLOR_UV
            .attributes()
            .map(|attribute| (attribute.location, attribute.components, attribute.offset))
            .collect();
        assert_eq!(offsets, [(0, 3, 0), (1, 3, 12), (2, 2, 24)]);
    }

    #[test]
    fn index_past_the_last_vertex_is_rejected() {
        let (headless, driver) = headless();
        let result = Mesh::upload(&driver, &TRIANGLE, &[0, 1, 3, 1, 2, 3], POSITION_COLOR);
        assert_eq!(
            result.err(),
            Some(GlError::IndexOutOfRange {
                index: 3,
                vertex_count: 3
            })
        );
        assert!(headless.live_objects().is_empty());
        assert!(headless.buffer_uploads().is_empty());
    }

    #[test]
    fn vertices_must_fill_whole_vertices() {
        let (headless, driver) = headless();
        let result = Mesh::upload(&driver, &TRIANGLE[..17], &[0, 1, 2], POSITION_COLOR);
        assert_eq!(
            result.err(),
            Some(GlError::MalformedVertices {
                len: 17,
                components: 6
            })
        );
        assert!(headless.live_objects().is_empty());
    }

    #[test]
    fn upload_describes_layout_and_releases_on_drop() {
        let (headless, driver) = headless();
        let mesh = Mesh::upload(&driver, &TRIANGLE, &[0, 1, 2], POSITION_COLOR).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.index_count(), 3);

        let uploads = headless.buffer_uploads();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].target, BufferTarget::Array);
        assert_eq!(uploads[0].bytes, bytemuck::cast_slice::<f32, u8>(&TRIANGLE));
        assert_eq!(uploads[1].target, BufferTarget::ElementArray);
        assert_eq!(uploads[1].bytes.len(), 12);

        let strides: Vec<_> = headless
            .attributes()
            .iter()
            .map(|attribute| (attribute.location, attribute.stride, attribute.offset))
            .collect();
        assert_eq!(strides, [(0, 24, 0), (1, 24, 12)]);

        mesh.draw();
        let draws = headless.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].count, 3);

        drop(mesh);
        assert!(headless.live_objects().is_empty());
        assert!(headless.errors().is_empty(), "{:?}", headless.errors());
    }

    #[test]
    fn empty_layout_is_malformed() {
        let (_, driver) = headless();
        assert!(matches!(
            Mesh::upload(&driver, &[], &[], VertexLayout::new(&[])),
            Err(GlError::MalformedVertices { .. })
        ));
    }
}
