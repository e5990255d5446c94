use anyhow::{Context, Result};
use bytes::Bytes;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::path::{Component, Path};

/// The image the user selected. Immutable once a session holds it.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Serialized as a summary; the bytes never leave the process.
impl Serialize for SourceFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SourceFile", 3)?;
        state.serialize_field("file_name", &self.file_name)?;
        state.serialize_field("content_type", &self.content_type)?;
        state.serialize_field("size", &self.bytes.len())?;
        state.end()
    }
}

impl SourceFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).map(str::to_string);
        Self {
            file_name,
            content_type,
            bytes: bytes.into(),
        }
    }

    /// Read an image from a local path.
    pub fn from_path(path: &Path) -> Result<Self> {
        if path.components().any(|c| c == Component::ParentDir) {
            return Err(anyhow::anyhow!("Invalid input: {}", path.display()));
        }
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image.jpg");

        Ok(Self::new(file_name, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn content_type_for(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "tif" | "tiff" => Some("image/tiff"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}
