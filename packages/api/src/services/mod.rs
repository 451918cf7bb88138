pub mod error;
pub mod resource;

pub use error::ResourceError;
pub use resource::ResourceService;
