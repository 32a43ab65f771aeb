//! Garden scene viewer: a free-fly camera and a Phong lighting model.
//!
//! The camera, projection and lighting modules are plain math with no GPU
//! or window dependencies, so they can be exercised from tests and headless
//! tools. `render` and the binary wire them to wgpu and winit.

pub mod camera;
pub mod config;
pub mod context;
pub mod input;
pub mod lighting;
pub mod projection;
pub mod render;
pub mod scene;
pub mod shapes;

pub use camera::{Camera, CameraMovement, CameraSettings};
pub use config::{AppConfig, ConfigError, WindowSettings};
pub use context::{FrameParams, RenderContext};
pub use input::{Action, InputState, KeyBindings, KeyCode, MouseButton, MouseTracker, NamedKey};
pub use lighting::{LightDescriptor, LightRig, ShadingParams, SurfaceSample};
pub use projection::{aspect_ratio, ProjectionMode};
pub use render::Renderer;
pub use scene::{Material, Placement, Scene, Transform};
pub use shapes::{MeshData, MeshKind};
