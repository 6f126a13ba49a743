//! Fetching of model files
//!
//! Remote models are downloaded once into `<cache dir>/<model id>/` and reused
//! afterwards. A download is streamed to a private temporary file and renamed
//! when complete, so an interrupted transfer never passes for a finished one.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::catalog::{ModelSource, ModelSpec};
use crate::error::ModelLoadError;

/// Path of a ready-to-read file for `spec`, downloading it if needed.
pub fn ensure_downloaded(spec: &ModelSpec, cache_dir: &Path) -> Result<PathBuf, ModelLoadError> {
    match &spec.source {
        ModelSource::Local(path) => {
            if path.is_file() {
                Ok(path.clone())
            } else {
                Err(ModelLoadError::MissingFile(path.clone()))
            }
        }
        ModelSource::Remote(url) => {
            let dest = cached_path(spec, url, cache_dir);
            if dest.is_file() {
                tracing::debug!("{} already available at {}", spec.id, dest.display());
                return Ok(dest);
            }
            download(url, &dest)?;
            Ok(dest)
        }
    }
}

/// `<cache dir>/<id>/<last url segment>`
pub fn cached_path(spec: &ModelSpec, url: &str, cache_dir: &Path) -> PathBuf {
    let file_name = url
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(spec.id.as_str());
    cache_dir.join(&spec.id).join(file_name)
}

fn download(url: &str, dest: &Path) -> Result<(), ModelLoadError> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| ModelLoadError::io(dir, e))?;

    tracing::info!("Downloading {url} to {}", dest.display());
    let started = Instant::now();

    let response = ureq::get(url).call().map_err(|e| ModelLoadError::Download {
        url: url.to_string(),
        source: Box::new(e),
    })?;

    // Each download gets its own temporary file, removed on drop if anything
    // fails, so concurrent loads of the same model never share a partial file.
    let part = tempfile::Builder::new()
        .prefix(".download-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|e| ModelLoadError::io(dir, e))?;

    let mut writer = BufWriter::new(part.as_file());
    let bytes = io::copy(&mut response.into_reader(), &mut writer)
        .and_then(|n| writer.flush().map(|_| n))
        .map_err(|e| ModelLoadError::io(part.path(), e))?;
    drop(writer);

    // A racing download may have put its complete copy in place first.
    if let Err(e) = part.persist(dest) {
        if !dest.is_file() {
            return Err(ModelLoadError::io(dest, e.error));
        }
    }

    let size_mb = bytes as f64 / (1024.0 * 1024.0);
    tracing::info!(
        "Downloaded {size_mb:.1} MB in {:.1}s",
        started.elapsed().as_secs_f64()
    );
    Ok(())
}
