use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use log::warn;
use rocket::tokio::{fs::File, io::AsyncReadExt};

const JPEG_MAGIC: &[u8] = &[0xff, 0xd8, 0xff];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Can we use a voter's registered face image?
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TemplateStatus {
    Missing,
    Invalid,
    Readable,
}

/// Storage for the face images captured at registration.
#[rocket::async_trait]
pub trait FaceTemplates: Send + Sync {
    async fn status(&self, template_ref: Option<&str>) -> TemplateStatus;
}

/// Templates stored as image files under one directory.
pub struct DirectoryTemplates {
    root: PathBuf,
}

impl DirectoryTemplates {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a reference to a path inside the root, refusing anything that could escape it.
    fn resolve(&self, template_ref: &str) -> Option<PathBuf> {
        let relative = Path::new(template_ref);
        let plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        (plain && !template_ref.is_empty()).then(|| self.root.join(relative))
    }
}

#[rocket::async_trait]
impl FaceTemplates for DirectoryTemplates {
    async fn status(&self, template_ref: Option<&str>) -> TemplateStatus {
        let Some(template_ref) = template_ref.filter(|r| !r.trim().is_empty()) else {
            return TemplateStatus::Missing;
        };
        let Some(path) = self.resolve(template_ref) else {
            warn!("Refusing face template reference {template_ref:?}");
            return TemplateStatus::Invalid;
        };

        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return TemplateStatus::Missing,
            Err(e) => {
                warn!("Could not open face template {}: {e}", path.display());
                return TemplateStatus::Invalid;
            }
        };

        let mut header = Vec::with_capacity(PNG_MAGIC.len());
        if let Err(e) = file
            .take(PNG_MAGIC.len() as u64)
            .read_to_end(&mut header)
            .await
        {
            warn!("Could not read face template {}: {e}", path.display());
            return TemplateStatus::Invalid;
        }

        if header.starts_with(JPEG_MAGIC) || header.starts_with(PNG_MAGIC) {
            TemplateStatus::Readable
        } else {
            TemplateStatus::Invalid
        }
    }
}
