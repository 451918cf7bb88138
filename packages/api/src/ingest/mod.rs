//! Streaming ingestion of `multipart/form-data` resource uploads.
//!
//! A [`FormDecoder`] walks the form one field at a time under a
//! [`ResourceSchema`]. Scalar fields are buffered with a hard size cap and
//! parsed into [`FormFields`]; the blob field is handed back unread so the
//! caller can stream it straight into a blob store.

mod decoder;
mod schema;

pub use decoder::{FormDecoder, blob_reader, drain_field};
pub use schema::{
    FieldRule, FormField, FormFields, IngestLimits, NewResource, PatchFields, Presence,
    ResourceSchema,
};
