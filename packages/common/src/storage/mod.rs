mod error;
mod exact;
mod key;
mod traits;

pub mod filesystem;
pub mod memory;
#[cfg(feature = "object-storage")]
pub mod object;

pub use error::StorageError;
pub use exact::{ExactSizeReader, SizeMismatch, copy_exact};
pub use key::{BlobKey, BlobPart};
pub use traits::{BlobStore, BoxReader};
