/// cell3d Core Library - CPU geometry pipeline for character-cell output
///
/// This library turns triangle meshes into screen-space triangles ready for a
/// character-cell rasterizer: mesh loading, the world/view/projection chain,
/// back-face culling, lighting, near-plane and viewport clipping, and painter's
/// ordering. Matrices use the column-vector convention (`m * v`).

pub mod clip;
pub mod error;
pub mod geometry;
pub mod obj;
pub mod pipeline;
pub mod projection;
pub mod scene;
pub mod shading;
pub mod sort;
pub mod transform;

// Re-export commonly used types
pub use error::{Error, GeometryError, LoadError, Result};
pub use geometry::{Mesh, Plane, Triangle};
pub use pipeline::{FrameOutput, FrameStats, FrameTransforms, Pipeline, PipelineConfig, Rasterizer};
pub use projection::{Camera, ProjectionConfig, Viewport};
pub use scene::{Key, KeyState, Scene, SceneConfig, SceneSetup, SpinningMeshScene};
pub use shading::{Appearance, CellColor, Glyph, Shade};
pub use transform::{Orientation, Transform};
