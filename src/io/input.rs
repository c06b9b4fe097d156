//! Input resolution: turns an [`ImageSource`] into raw bytes.
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::processing::guard::check_upload_size;
use crate::error::{Error, Result};
use crate::types::ImageSource;

/// Raw bytes for `source`. Uploads are size-checked; default paths must exist.
pub fn resolve_bytes(source: &ImageSource, max_file_size: usize) -> Result<Vec<u8>> {
    match source {
        ImageSource::Upload { name, bytes } => {
            check_upload_size(bytes.len(), max_file_size)?;
            debug!("Using upload {:?} ({} bytes)", name, bytes.len());
            Ok(bytes.clone())
        }
        ImageSource::DefaultPath(path) => read_default_image(path),
    }
}

pub fn read_default_image(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        warn!("Default image missing: {:?}", path);
        return Err(Error::MissingDefaultImage {
            path: path.to_path_buf(),
        });
    }
    let bytes = fs::read(path)?;
    debug!("Read default image {:?} ({} bytes)", path, bytes.len());
    Ok(bytes)
}

/// First default image that exists, in the configured order.
pub fn first_default_source(candidates: &[PathBuf]) -> Option<ImageSource> {
    let found = candidates.iter().find(|p| p.is_file())?;
    info!("Using default image {:?}", found);
    Some(ImageSource::DefaultPath(found.clone()))
}

/// Read a user-picked file as an upload. The size is checked against the
/// file metadata first so oversized files are never read into memory.
pub fn upload_from_path(path: &Path, max_file_size: usize) -> Result<ImageSource> {
    let len = fs::metadata(path)?.len();
    check_upload_size(usize::try_from(len).unwrap_or(usize::MAX), max_file_size)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(ImageSource::upload(name, fs::read(path)?))
}
