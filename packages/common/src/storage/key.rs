use std::fmt;

use uuid::Uuid;

/// Which blob of a record a key addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlobPart {
    /// The record's payload (dataset, algorithm package, model artifact, problem bundle).
    Primary,
    /// The Markdown description attached to a problem.
    Description,
}

/// Address of a blob: the owning record's namespace and identifier.
///
/// Renders as `{namespace}/{id}` for the primary blob and
/// `{namespace}/{id}description` for the description blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlobKey {
    namespace: &'static str,
    id: Uuid,
    part: BlobPart,
}

impl BlobKey {
    pub fn primary(namespace: &'static str, id: Uuid) -> Self {
        Self {
            namespace,
            id,
            part: BlobPart::Primary,
        }
    }

    pub fn description(namespace: &'static str, id: Uuid) -> Self {
        Self {
            namespace,
            id,
            part: BlobPart::Description,
        }
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn part(&self) -> BlobPart {
        self.part
    }

    /// File name of the blob within its namespace.
    pub fn file_name(&self) -> String {
        match self.part {
            BlobPart::Primary => self.id.to_string(),
            BlobPart::Description => format!("{}description", self.id),
        }
    }

    pub fn as_path(&self) -> String {
        format!("{}/{}", self.namespace, self.file_name())
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_path())
    }
}
