//! Scene description: object placement, cameras and the scene-object map
//! the render systems walk each frame.

pub mod camera;
pub mod scene_object;
pub mod transform;

pub use camera::{Camera, DEFAULT_UP};
pub use scene_object::{Renderable, SceneObject, SceneObjectId, SceneObjectMap, SubMeshInfo};
pub use transform::Transform;
