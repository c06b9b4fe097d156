use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat};
use tracing::info;

use crate::error::{Error, Result};
use crate::types::{DownloadArtifact, PNG_MIME};

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(Error::processing)?;
    Ok(bytes)
}

/// PNG download for `image` under `file_name`.
pub fn png_artifact(image: &DynamicImage, file_name: &str) -> Result<DownloadArtifact> {
    Ok(DownloadArtifact {
        file_name: file_name.to_string(),
        mime_type: PNG_MIME,
        bytes: encode_png(image)?,
    })
}

/// Write the artifact to `output`, creating missing parent directories.
pub fn write_artifact(artifact: &DownloadArtifact, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, &artifact.bytes)?;
    info!(
        "Saved {} ({} bytes) to {:?}",
        artifact.file_name,
        artifact.bytes.len(),
        output
    );
    Ok(())
}
