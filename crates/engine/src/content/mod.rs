mod files;
mod images;
mod registry;

pub use images::{ImageError, ImageStore};
pub use registry::{MapRegistry, RegistryError};
