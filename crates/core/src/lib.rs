//! Core shared types and errors (renderer-agnostic).

pub use glam::{Vec3, vec3};

pub mod bounds;
pub mod error;

pub use bounds::BoundingBox;
pub use error::{AssetError, AssetResult};
