//! GPU-resident models: one vertex buffer, one index buffer, sub-mesh ranges
//! and the textures those ranges sample.
//!
//! # Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use glam::Vec3;
//! # use lumen_rhi::{device::Device, texture::Texture};
//! # use lumen_resources::{ModelBuilder, primitives};
//! # use lumen_scene::Renderable;
//! # fn example(device: Arc<Device>, checker: Arc<Texture>) -> lumen_resources::ResourceResult<()> {
//! let mut builder = ModelBuilder::new();
//! let checker = builder.add_texture(checker);
//! builder.add_sub_mesh(primitives::cube_face(Vec3::Z, Vec3::ONE), Vec3::ONE, Some(checker));
//! builder.add_sub_mesh(primitives::cube_face(Vec3::NEG_Z, Vec3::ONE), Vec3::X, None);
//! let model = builder.build(device)?;
//! assert_eq!(model.sub_meshes().len(), 2);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use glam::Vec3;
use lumen_rhi::buffer::{Buffer, BufferUsage};
use lumen_rhi::command::CommandBuffer;
use lumen_rhi::device::Device;
use lumen_rhi::texture::Texture;
use lumen_rhi::vertex::Vertex;
use lumen_rhi::vk;
use lumen_scene::{Renderable, SubMeshInfo};
use tracing::debug;

use crate::error::{ResourceError, ResourceResult};
use crate::primitives::MeshData;

pub struct Model {
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    vertex_count: u32,
    index_count: u32,
    sub_meshes: Vec<SubMeshInfo>,
    textures: Vec<Arc<Texture>>,
}

impl Model {
    /// Single sub-mesh model without textures.
    pub fn from_mesh(device: Arc<Device>, mesh: MeshData, color: Vec3) -> ResourceResult<Self> {
        let mut builder = ModelBuilder::new();
        builder.add_sub_mesh(mesh, color, None);
        builder.build(device)
    }

    /// Binds the vertex and index buffers.
    pub fn bind(&self, cmd: &CommandBuffer) {
        cmd.bind_vertex_buffers(0, &[self.vertex_buffer.handle()]);
        cmd.bind_index_buffer(self.index_buffer.handle(), vk::IndexType::UINT32);
    }

    /// Draws every index of the model.
    pub fn draw(&self, cmd: &CommandBuffer) {
        cmd.draw_indexed(self.index_count, 0);
    }

    /// Draws `index_count` indices starting at `first_index`.
    pub fn draw_indexed(&self, cmd: &CommandBuffer, index_count: u32, first_index: u32) {
        debug_assert!(first_index + index_count <= self.index_count);
        cmd.draw_indexed(index_count, first_index);
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    #[inline]
    pub fn textures(&self) -> &[Arc<Texture>] {
        &self.textures
    }
}

impl Renderable for Model {
    fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn sub_meshes(&self) -> &[SubMeshInfo] {
        &self.sub_meshes
    }
}

/// Accumulates sub-meshes into shared vertex/index streams.
#[derive(Default)]
pub struct ModelBuilder {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    sub_meshes: Vec<SubMeshInfo>,
    textures: Vec<Arc<Texture>>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a texture and returns its model-local index.
    pub fn add_texture(&mut self, texture: Arc<Texture>) -> u32 {
        self.textures.push(texture);
        (self.textures.len() - 1) as u32
    }

    /// Appends `mesh` as a new sub-mesh. Its indices are rebased onto the
    /// shared vertex stream.
    pub fn add_sub_mesh(
        &mut self,
        mesh: MeshData,
        diffuse_color: Vec3,
        diffuse_texture_index: Option<u32>,
    ) -> &mut Self {
        let base = self.vertices.len() as u32;
        let index_start = self.indices.len() as u32;

        self.vertices.extend(mesh.vertices);
        self.indices.extend(mesh.indices.iter().map(|i| i + base));
        self.sub_meshes.push(SubMeshInfo {
            index_start,
            index_count: mesh.indices.len() as u32,
            diffuse_color,
            diffuse_texture_index,
        });
        self
    }

    pub fn sub_meshes(&self) -> &[SubMeshInfo] {
        &self.sub_meshes
    }

    fn validate(&self) -> ResourceResult<()> {
        validate_geometry(
            self.vertices.len(),
            &self.indices,
            &self.sub_meshes,
            self.textures.len(),
        )
    }

    /// Uploads the geometry. Fails if the model is empty or a sub-mesh names
    /// a texture that was never added.
    pub fn build(self, device: Arc<Device>) -> ResourceResult<Model> {
        self.validate()?;

        let vertex_buffer = Buffer::with_data(device.clone(), BufferUsage::Vertex, &self.vertices)?;
        let index_buffer = Buffer::with_data(device, BufferUsage::Index, &self.indices)?;

        debug!(
            "Built model: {} vertices, {} indices, {} sub-meshes, {} textures",
            self.vertices.len(),
            self.indices.len(),
            self.sub_meshes.len(),
            self.textures.len()
        );

        Ok(Model {
            vertex_buffer,
            index_buffer,
            vertex_count: self.vertices.len() as u32,
            index_count: self.indices.len() as u32,
            sub_meshes: self.sub_meshes,
            textures: self.textures,
        })
    }
}

fn validate_geometry(
    vertex_count: usize,
    indices: &[u32],
    sub_meshes: &[SubMeshInfo],
    texture_count: usize,
) -> ResourceResult<()> {
    if vertex_count == 0 || indices.is_empty() {
        return Err(ResourceError::InvalidGeometry(
            "model has no vertices or indices".to_string(),
        ));
    }
    if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(ResourceError::InvalidGeometry(format!(
            "index {} out of range for {} vertices",
            index, vertex_count
        )));
    }
    for (i, sub_mesh) in sub_meshes.iter().enumerate() {
        if let Some(texture) = sub_mesh.diffuse_texture_index
            && texture as usize >= texture_count
        {
            return Err(ResourceError::InvalidGeometry(format!(
                "sub-mesh {} uses texture {} but the model has {}",
                i, texture, texture_count
            )));
        }
    }
    Ok(())
}
