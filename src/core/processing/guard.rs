use tracing::warn;

use crate::error::{Error, Result};

/// Rejects an upload larger than `max_bytes`. Runs before any decoding.
pub fn check_upload_size(len: usize, max_bytes: usize) -> Result<()> {
    if len > max_bytes {
        warn!("Rejecting upload of {} bytes (limit {})", len, max_bytes);
        return Err(Error::OversizedInput {
            size: len,
            max: max_bytes,
        });
    }
    Ok(())
}
