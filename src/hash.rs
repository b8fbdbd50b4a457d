//! Change-detection digests of command sources.

use std::{io, path::Path};

use sha2::{Digest, Sha256};

/// Lowercase hex digest of `bytes`.
pub fn digest(bytes: impl AsRef<[u8]>) -> String {
    format!("{:x}", Sha256::digest(bytes.as_ref()))
}

/// Digest of the current contents of the file at `path`.
pub async fn digest_file(path: &Path) -> io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(digest(bytes))
}
