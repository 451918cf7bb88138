use common::storage::StorageError;
use thiserror::Error;
use uuid::Uuid;

use crate::models::resource::ResourceKind;

/// Every way a resource operation can fail.
///
/// The HTTP layer maps each variant to a status code in
/// [`crate::error::AppError`]; [`ResourceError::code`] gives the stable
/// machine-readable name sent to clients.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Error parsing header: {0}")]
    HeaderParse(String),

    #[error("Invalid media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Malformed multipart body: {0}")]
    MalformedBody(String),

    #[error("Unknown field {0}")]
    UnknownField(String),

    #[error("Duplicate field {0}")]
    DuplicateField(String),

    #[error("Misplaced field {0}: the blob must be the last field of the form")]
    MisplacedBlobField(String),

    #[error("Buffer overflow reading {0}")]
    BufferOverflow(&'static str),

    #[error("Field {0} is not valid UTF-8")]
    InvalidEncoding(&'static str),

    #[error("Error parsing UUID {field}: {source}")]
    UuidParse {
        field: &'static str,
        #[source]
        source: uuid::Error,
    },

    #[error("Error parsing size: {0}")]
    SizeParse(String),

    #[error("'{0}' unset")]
    RequiredFieldMissing(&'static str),

    #[error("description should be a '.md' file")]
    InvalidDescriptionType,

    #[error("Impossible to parse UUID {0}")]
    MalformedIdentifier(String),

    #[error("{kind} {id} already exists")]
    IdentifierConflict { kind: ResourceKind, id: Uuid },

    #[error("{kind} {id} not found")]
    NotFound { kind: ResourceKind, id: Uuid },

    #[error("Referenced {kind} {id} not found")]
    ReferenceNotFound { kind: ResourceKind, id: Uuid },

    #[error("Error writing blob: {0}")]
    BlobWrite(StorageError),

    #[error("Storage backend error: {0}")]
    StorageBackend(String),
}

impl ResourceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::HeaderParse(_) => "HEADER_PARSE_ERROR",
            Self::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            Self::MalformedBody(_) => "MALFORMED_BODY",
            Self::UnknownField(_) => "UNKNOWN_FIELD",
            Self::DuplicateField(_) => "DUPLICATE_FIELD",
            Self::MisplacedBlobField(_) => "MISPLACED_BLOB_FIELD",
            Self::BufferOverflow(_) => "BUFFER_OVERFLOW",
            Self::InvalidEncoding(_) => "INVALID_ENCODING",
            Self::UuidParse { .. } => "UUID_PARSE_ERROR",
            Self::SizeParse(_) => "SIZE_PARSE_ERROR",
            Self::RequiredFieldMissing(_) => "REQUIRED_FIELD_MISSING",
            Self::InvalidDescriptionType => "INVALID_DESCRIPTION_TYPE",
            Self::MalformedIdentifier(_) => "MALFORMED_IDENTIFIER",
            Self::IdentifierConflict { .. } => "IDENTIFIER_CONFLICT",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::ReferenceNotFound { .. } => "REFERENCE_NOT_FOUND",
            Self::BlobWrite(_) => "BLOB_WRITE_ERROR",
            Self::StorageBackend(_) => "STORAGE_BACKEND_ERROR",
        }
    }
}
