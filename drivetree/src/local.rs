use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::upload::{StructureDescriptor, StructureEntry, UploadError, UploadFile};

/// Reads every regular file under `dir` into an upload batch.
///
/// Relative paths start at `dir`'s own name, so the directory itself becomes
/// the top folder of the mirrored tree. Files come back in path order.
pub async fn collect_batch(
    dir: &Path,
) -> Result<(Vec<UploadFile>, StructureDescriptor), UploadError> {
    let meta = tokio::fs::metadata(dir).await?;
    if !meta.is_dir() {
        return Err(UploadError::Validation(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    // `.` and `..` have no usable name of their own.
    let dir = tokio::fs::canonicalize(dir).await?;
    let base = dir.parent().unwrap_or(&dir).to_path_buf();

    let mut paths = Vec::new();
    for entry in WalkDir::new(&dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() {
            paths.push(entry.into_path());
        }
    }

    let mut files = Vec::with_capacity(paths.len());
    let mut entries = Vec::with_capacity(paths.len());
    let mut seen = HashSet::new();
    for path in paths {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if !seen.insert(name.clone()) {
            warn!(
                path = %path.display(),
                "duplicate file name in batch; it will share the first match's folder"
            );
        }
        let content = tokio::fs::read(&path).await?;
        let content_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        entries.push(StructureEntry {
            original_name: name.clone(),
            relative_path: Some(relative_path(&base, &path)),
        });
        files.push(UploadFile::new(name, content, content_type));
    }

    Ok((files, StructureDescriptor::new(entries)))
}

fn relative_path(base: &Path, path: &Path) -> String {
    let relative: PathBuf = path.strip_prefix(base).unwrap_or(path).to_path_buf();
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
