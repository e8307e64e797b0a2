//! raster-api-core: dynamic values and backend-facing payload types shared by the
//! animation and node-graph crates.

pub mod blend;
pub mod json;
pub mod resource;
pub mod sampler;
pub mod shape;
pub mod transform;
pub mod upload;
pub mod value;

pub use resource::{
    HeadlessBackend, ResourceBackend, ResourceError, ResourceHandle, ResourceKind, ResourceParams,
};
pub use sampler::{SamplerSettings, TextureFiltering, TextureWrapping};
pub use shape::{SdfShape, ShapeUniform};
pub use transform::{Mat3, Transform2D};
pub use upload::{AsyncUploader, UploadTicket};
pub use value::{FromValue, TypeMismatch, Value, ValueKind};
