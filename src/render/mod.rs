mod native;
mod shared;

pub use native::Renderer;
pub use shared::{GlobalUniform, ObjectConstants, MAX_LAMPS};
