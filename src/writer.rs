//! Output artifact writing
//!
//! Each set is written twice: newline-joined text and a 2-space indented JSON array,
//! both in the order given (sorted by the reconciler). Writes are independent and
//! not transactional: a failure stops at that file and leaves earlier files written.

use crate::config::OutputPaths;
use crate::error::WriteError;
use crate::reconcile::DomainSets;
use std::path::Path;
use tracing::debug;

/// Write the deny and allow sets to their four artifact paths
pub async fn write_outputs(sets: &DomainSets, paths: &OutputPaths) -> Result<(), WriteError> {
    write_text(&paths.deny_text, &sets.deny).await?;
    write_json(&paths.deny_json, &sets.deny).await?;
    write_text(&paths.allow_text, &sets.allow).await?;
    write_json(&paths.allow_json, &sets.allow).await?;
    Ok(())
}

/// Write `domains` joined by `\n` (no trailing newline)
pub async fn write_text(path: &Path, domains: &[String]) -> Result<(), WriteError> {
    ensure_parent_dir(path).await?;
    write_file(path, domains.join("\n").into_bytes()).await
}

/// Write `domains` as a pretty-printed JSON array
pub async fn write_json(path: &Path, domains: &[String]) -> Result<(), WriteError> {
    ensure_parent_dir(path).await?;
    let body = serde_json::to_vec_pretty(domains).map_err(|source| WriteError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    write_file(path, body).await
}

async fn write_file(path: &Path, body: Vec<u8>) -> Result<(), WriteError> {
    let len = body.len();
    tokio::fs::write(path, body)
        .await
        .map_err(|source| WriteError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), bytes = len, "Wrote artifact");
    Ok(())
}

async fn ensure_parent_dir(path: &Path) -> Result<(), WriteError> {
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    if dir.as_os_str().is_empty() || dir == Path::new(".") {
        return Ok(());
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| WriteError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })
}
