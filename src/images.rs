// Image attachments for prompts

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::Part;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub name: String,
    pub mime_type: &'static str,
    pub data: Vec<u8>,
}

/// MIME type for the image formats the model accepts, by file extension
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

impl ImageAttachment {
    pub fn from_path(path: &Path) -> Result<Self> {
        let mime_type = mime_type_for(path)
            .ok_or_else(|| anyhow::anyhow!("Unsupported image type: {}", path.display()))?;
        let data = fs::read(path)
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

        Ok(Self {
            name,
            mime_type,
            data,
        })
    }

    pub fn to_part(&self) -> Part {
        Part::inline_data(self.mime_type, &self.data)
    }
}

/// Supported images in `dir`, sorted by file name
pub fn discover_images(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut images = Vec::new();
    for entry in fs::read_dir(dir).context("Failed to read image directory")? {
        let path = entry?.path();
        if path.is_file() && mime_type_for(&path).is_some() {
            images.push(path);
        }
    }
    images.sort();

    Ok(images)
}
