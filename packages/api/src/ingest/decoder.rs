use std::collections::HashSet;
use std::io;

use axum::body::Body;
use axum::http::HeaderValue;
use bytes::BytesMut;
use common::storage::BoxReader;
use futures::TryStreamExt;
use multer::{Field, Multipart};
use tokio_util::io::StreamReader;
use uuid::Uuid;

use super::schema::{FormField, FormFields, ResourceSchema};
use crate::services::error::ResourceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// Scalar fields are still being read.
    ReadingFields,
    /// The blob field was handed out; only the end of the body may follow.
    AfterBlob,
    Done,
}

/// Field-by-field reader of one multipart form.
pub struct FormDecoder {
    multipart: Multipart<'static>,
    schema: ResourceSchema,
    state: DecoderState,
    seen: HashSet<FormField>,
}

fn malformed(err: multer::Error) -> ResourceError {
    ResourceError::MalformedBody(err.to_string())
}

impl FormDecoder {
    pub fn new(
        content_type: Option<&HeaderValue>,
        body: Body,
        schema: ResourceSchema,
    ) -> Result<Self, ResourceError> {
        let content_type = content_type
            .ok_or_else(|| ResourceError::HeaderParse("missing Content-Type header".into()))?
            .to_str()
            .map_err(|e| ResourceError::HeaderParse(e.to_string()))?;
        let boundary = multer::parse_boundary(content_type)
            .map_err(|e| ResourceError::UnsupportedMediaType(e.to_string()))?;

        Ok(Self {
            multipart: Multipart::new(body.into_data_stream(), boundary),
            schema,
            state: DecoderState::ReadingFields,
            seen: HashSet::new(),
        })
    }

    /// Read scalar fields up to the blob field or the end of the body.
    ///
    /// The blob field, when present, is returned unread. It must be fully
    /// consumed or dropped before [`FormDecoder::expect_end`] is called.
    pub async fn read_fields(
        &mut self,
    ) -> Result<(FormFields, Option<Field<'static>>), ResourceError> {
        let mut fields = FormFields::default();
        if self.state != DecoderState::ReadingFields {
            return Ok((fields, None));
        }

        loop {
            let next = match self.multipart.next_field().await {
                Ok(next) => next,
                // A form with no parts at all is only a closing delimiter.
                Err(multer::Error::IncompleteStream) if self.seen.is_empty() => None,
                Err(err) => return Err(malformed(err)),
            };
            let Some(mut field) = next else {
                self.state = DecoderState::Done;
                return Ok((fields, None));
            };

            let name = field.name().unwrap_or_default().to_owned();
            let form_field = FormField::from_name(&name)
                .filter(|f| self.schema.allows(*f))
                .ok_or_else(|| ResourceError::UnknownField(name.clone()))?;
            if !self.seen.insert(form_field) {
                return Err(ResourceError::DuplicateField(name));
            }

            let max_len = self.schema.limits.max_field_length;
            match form_field {
                FormField::Blob => {
                    self.state = DecoderState::AfterBlob;
                    return Ok((fields, Some(field)));
                }
                FormField::Uuid => {
                    let raw = read_limited(&mut field, form_field, max_len).await?;
                    fields.uuid = Some(parse_uuid(&raw, form_field)?);
                }
                FormField::Owner => {
                    let raw = read_limited(&mut field, form_field, max_len).await?;
                    fields.owner = Some(parse_uuid(&raw, form_field)?);
                }
                FormField::Name => {
                    let raw = read_limited(&mut field, form_field, max_len).await?;
                    let name = String::from_utf8(raw.to_vec())
                        .map_err(|_| ResourceError::InvalidEncoding(form_field.as_str()))?;
                    fields.name = Some(name);
                }
                FormField::Size => {
                    let raw = read_limited(&mut field, form_field, max_len).await?;
                    fields.size = Some(parse_size(&raw)?);
                }
                FormField::Description => {
                    let is_markdown = field.file_name().is_some_and(|n| n.ends_with(".md"));
                    if !is_markdown {
                        return Err(ResourceError::InvalidDescriptionType);
                    }
                    let max = self.schema.limits.max_description_size;
                    let raw = read_limited(&mut field, form_field, max).await?;
                    fields.description = Some(raw.freeze());
                }
            }
        }
    }

    /// Confirm nothing follows the blob field.
    pub async fn expect_end(&mut self) -> Result<(), ResourceError> {
        if self.state == DecoderState::Done {
            return Ok(());
        }
        self.state = DecoderState::Done;
        match self.multipart.next_field().await.map_err(malformed)? {
            Some(field) => Err(ResourceError::MisplacedBlobField(
                field.name().unwrap_or_default().to_owned(),
            )),
            None => Ok(()),
        }
    }
}

async fn read_limited(
    field: &mut Field<'static>,
    form_field: FormField,
    limit: usize,
) -> Result<BytesMut, ResourceError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(malformed)? {
        if buf.len() + chunk.len() > limit {
            return Err(ResourceError::BufferOverflow(form_field.as_str()));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

fn parse_uuid(raw: &[u8], form_field: FormField) -> Result<Uuid, ResourceError> {
    Uuid::try_parse_ascii(raw.trim_ascii()).map_err(|source| ResourceError::UuidParse {
        field: form_field.as_str(),
        source,
    })
}

fn parse_size(raw: &[u8]) -> Result<u64, ResourceError> {
    std::str::from_utf8(raw.trim_ascii())
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| ResourceError::SizeParse(String::from_utf8_lossy(raw).into_owned()))
}

/// Read and discard the rest of a field.
pub async fn drain_field(field: &mut Field<'static>) -> Result<(), ResourceError> {
    while field.chunk().await.map_err(malformed)?.is_some() {}
    Ok(())
}

/// Adapt the blob field into a reader for a blob store.
pub fn blob_reader(field: Field<'static>) -> BoxReader<'static> {
    Box::new(StreamReader::new(field.map_err(io::Error::other)))
}
