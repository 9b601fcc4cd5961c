//! Locates the instance document inside a filing directory.
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Filename suffixes, highest priority first.
const INSTANCE_SUFFIXES: &[&str] = &[".htm", ".html", ".xhtml", "_htm.xml"];

/// Linkbase and schema files that share the suffixes above.
const EXCLUDED_MARKERS: &[&str] = &["_cal.", "_pre.", "_def.", "_lab.", "schema"];

/// Resolves a file path as-is, or searches a directory for the instance.
pub fn resolve_instance(location: &Path) -> Option<PathBuf> {
    if location.is_file() {
        return Some(location.to_path_buf());
    }
    if location.is_dir() {
        return find_instance_document(location);
    }
    debug!(path = %location.display(), "Instance location does not exist");
    None
}

/// Picks the largest candidate of the highest-priority suffix present.
pub fn find_instance_document(dir: &Path) -> Option<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "Cannot scan filing directory");
            return None;
        }
    };

    let files: Vec<(String, u64, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let meta = entry.metadata().ok()?;
            if !meta.is_file() {
                return None;
            }
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if EXCLUDED_MARKERS.iter().any(|m| name.contains(m)) {
                return None;
            }
            Some((name, meta.len(), entry.path()))
        })
        .collect();

    for suffix in INSTANCE_SUFFIXES {
        let best = files
            .iter()
            .filter(|(name, _, _)| name.ends_with(suffix))
            // Largest first; name breaks ties so the pick is stable.
            .min_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        if let Some((name, size, path)) = best {
            debug!(file = %name, size, "Selected instance document");
            return Some(path.clone());
        }
    }
    None
}
