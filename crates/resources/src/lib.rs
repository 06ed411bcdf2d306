//! GPU models and textures built on top of `lumen_rhi`.

mod error;

pub mod model;
pub mod primitives;
pub mod texture;

pub use error::{ResourceError, ResourceResult};
pub use model::{Model, ModelBuilder};
pub use primitives::MeshData;
pub use texture::{checkerboard_texture, load_texture};
