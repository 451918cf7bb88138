use bytes::Bytes;
use uuid::Uuid;

use crate::models::resource::ResourceKind;
use crate::services::error::ResourceError;

/// Form fields understood by the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Uuid,
    Owner,
    Name,
    Size,
    Description,
    Blob,
}

impl FormField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "uuid" => Some(Self::Uuid),
            "owner" => Some(Self::Owner),
            "name" => Some(Self::Name),
            "size" => Some(Self::Size),
            "description" => Some(Self::Description),
            "blob" => Some(Self::Blob),
            _ => None,
        }
    }

    /// Wire name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uuid => "uuid",
            Self::Owner => "owner",
            Self::Name => "name",
            Self::Size => "size",
            Self::Description => "description",
            Self::Blob => "blob",
        }
    }

    /// Name used in "'X' unset" messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Uuid => "Uuid",
            Self::Owner => "Owner",
            Self::Name => "Name",
            Self::Size => "Size",
            Self::Description => "Description",
            Self::Blob => "Blob",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub field: FormField,
    pub presence: Presence,
}

const fn required(field: FormField) -> FieldRule {
    FieldRule {
        field,
        presence: Presence::Required,
    }
}

const fn optional(field: FormField) -> FieldRule {
    FieldRule {
        field,
        presence: Presence::Optional,
    }
}

// Required rules are listed in the order missing fields are reported.
const PROBLEM_CREATE: &[FieldRule] = &[
    optional(FormField::Uuid),
    required(FormField::Owner),
    required(FormField::Name),
    required(FormField::Size),
    required(FormField::Description),
    required(FormField::Blob),
];

const ALGO_CREATE: &[FieldRule] = &[
    optional(FormField::Uuid),
    required(FormField::Owner),
    required(FormField::Name),
    required(FormField::Size),
    required(FormField::Blob),
];

const DATA_CREATE: &[FieldRule] = &[
    optional(FormField::Uuid),
    required(FormField::Owner),
    required(FormField::Size),
    required(FormField::Blob),
];

const PROBLEM_PATCH: &[FieldRule] = &[
    optional(FormField::Uuid),
    optional(FormField::Owner),
    optional(FormField::Name),
    optional(FormField::Description),
];

const ALGO_PATCH: &[FieldRule] = &[
    optional(FormField::Uuid),
    optional(FormField::Owner),
    optional(FormField::Name),
];

const OWNER_PATCH: &[FieldRule] = &[optional(FormField::Uuid), optional(FormField::Owner)];

/// Byte caps applied while buffering scalar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestLimits {
    pub max_field_length: usize,
    pub max_description_size: usize,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_field_length: 255,
            max_description_size: 1024 * 1024,
        }
    }
}

/// Which fields a form may carry for one kind and operation.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSchema {
    pub kind: ResourceKind,
    rules: &'static [FieldRule],
    pub limits: IngestLimits,
}

impl ResourceSchema {
    /// Schema of a multipart create. Models are uploaded as a raw body and
    /// have none.
    pub fn create(kind: ResourceKind, limits: IngestLimits) -> Option<Self> {
        let rules = match kind {
            ResourceKind::Problem => PROBLEM_CREATE,
            ResourceKind::Algo => ALGO_CREATE,
            ResourceKind::Data => DATA_CREATE,
            ResourceKind::Model => return None,
        };
        Some(Self {
            kind,
            rules,
            limits,
        })
    }

    pub fn patch(kind: ResourceKind, limits: IngestLimits) -> Self {
        let rules = match kind {
            ResourceKind::Problem => PROBLEM_PATCH,
            ResourceKind::Algo => ALGO_PATCH,
            ResourceKind::Data | ResourceKind::Model => OWNER_PATCH,
        };
        Self {
            kind,
            rules,
            limits,
        }
    }

    pub fn rules(&self) -> &'static [FieldRule] {
        self.rules
    }

    pub fn allows(&self, field: FormField) -> bool {
        self.rules.iter().any(|rule| rule.field == field)
    }

    /// A client-chosen identifier is accepted on every multipart schema.
    pub fn accepts_client_id(&self) -> bool {
        self.allows(FormField::Uuid)
    }

    /// Check required scalar fields of a create form, in rule order.
    pub fn validate_create(&self, fields: &FormFields) -> Result<NewResource, ResourceError> {
        for rule in self.rules {
            if rule.presence == Presence::Optional || rule.field == FormField::Blob {
                continue;
            }
            if !fields.is_set(rule.field) {
                return Err(ResourceError::RequiredFieldMissing(rule.field.label()));
            }
        }

        let owner = fields
            .owner
            .ok_or(ResourceError::RequiredFieldMissing(FormField::Owner.label()))?;
        let size = fields
            .size
            .ok_or(ResourceError::RequiredFieldMissing(FormField::Size.label()))?;

        Ok(NewResource {
            id: fields.uuid,
            owner,
            name: fields.name.clone(),
            size,
            description: fields.description.clone(),
        })
    }

    pub fn validate_patch(&self, fields: FormFields) -> Result<PatchFields, ResourceError> {
        if fields.name.as_deref() == Some("") {
            return Err(ResourceError::RequiredFieldMissing(FormField::Name.label()));
        }
        Ok(PatchFields {
            id: fields.uuid,
            owner: fields.owner,
            name: fields.name,
            description: fields.description,
        })
    }
}

/// Scalar values read from a form, before validation.
#[derive(Debug, Default, Clone)]
pub struct FormFields {
    pub uuid: Option<Uuid>,
    pub owner: Option<Uuid>,
    pub name: Option<String>,
    pub size: Option<u64>,
    pub description: Option<Bytes>,
}

impl FormFields {
    /// Whether `field` holds a usable value. An empty name counts as unset.
    pub fn is_set(&self, field: FormField) -> bool {
        match field {
            FormField::Uuid => self.uuid.is_some(),
            FormField::Owner => self.owner.is_some(),
            FormField::Name => self.name.as_deref().is_some_and(|n| !n.is_empty()),
            FormField::Size => self.size.is_some(),
            FormField::Description => self.description.is_some(),
            FormField::Blob => false,
        }
    }
}

/// A validated create form.
#[derive(Debug, Clone)]
pub struct NewResource {
    pub id: Option<Uuid>,
    pub owner: Uuid,
    pub name: Option<String>,
    pub size: u64,
    pub description: Option<Bytes>,
}

/// A validated patch form.
#[derive(Debug, Clone, Default)]
pub struct PatchFields {
    pub id: Option<Uuid>,
    pub owner: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<Bytes>,
}
