//! Model loading and the per-process model cache.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use crate::catalog::Catalog;
use crate::download::ensure_downloaded;
use crate::error::ModelLoadError;
use crate::word_vectors::WordVectors;

/// Turns a model id into a loaded vector table.
pub trait ModelProvider: Send + Sync {
    fn load(&self, id: &str) -> Result<WordVectors, ModelLoadError>;
}

/// Resolves ids through a [`Catalog`], fetching remote files into `cache_dir`.
pub struct CatalogProvider {
    catalog: Catalog,
    cache_dir: PathBuf,
}

impl CatalogProvider {
    pub fn new(catalog: Catalog, cache_dir: impl Into<PathBuf>) -> Self {
        CatalogProvider {
            catalog,
            cache_dir: cache_dir.into(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

impl ModelProvider for CatalogProvider {
    fn load(&self, id: &str) -> Result<WordVectors, ModelLoadError> {
        let spec = self
            .catalog
            .get(id)
            .ok_or_else(|| ModelLoadError::UnknownModel(id.to_string()))?;

        let path = ensure_downloaded(spec, &self.cache_dir)?;

        tracing::info!("Loading {} from {}", spec.id, path.display());
        let started = Instant::now();
        let vectors = WordVectors::from_path(&path, spec.format, spec.limit).map_err(|source| {
            ModelLoadError::Format {
                path: path.clone(),
                source,
            }
        })?;
        tracing::info!(
            "Loaded {} vectors of dimension {} in {:.1}s",
            vectors.len(),
            vectors.dims(),
            started.elapsed().as_secs_f64()
        );

        Ok(vectors)
    }
}

/// Memoizes loaded models by id for the life of the process.
///
/// The lock is never held while loading. Two callers racing on the same id
/// may both load it; the first one to finish is kept and the other copy is
/// dropped. Failed loads are not remembered.
pub struct ModelCache<P> {
    provider: P,
    models: RwLock<HashMap<String, Arc<WordVectors>>>,
}

impl<P: ModelProvider> ModelCache<P> {
    pub fn new(provider: P) -> Self {
        ModelCache {
            provider,
            models: RwLock::new(HashMap::new()),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn get_or_load(&self, id: &str) -> Result<Arc<WordVectors>, ModelLoadError> {
        if let Some(model) = self.get(id) {
            tracing::debug!("Model {id} served from cache");
            return Ok(model);
        }

        let loaded = Arc::new(self.provider.load(id)?);

        let mut models = self.models.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(models.entry(id.to_string()).or_insert(loaded)))
    }

    pub fn get(&self, id: &str) -> Option<Arc<WordVectors>> {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn loaded_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ModelSource, ModelSpec};
    use crate::word_vectors::VectorFormat;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        loads: AtomicUsize,
    }

    impl ModelProvider for CountingProvider {
        fn load(&self, id: &str) -> Result<WordVectors, ModelLoadError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            match id {
                "tiny" => Ok(WordVectors::read_text(Cursor::new("a 1 0\nb 0 1\n"), None).unwrap()),
                other => Err(ModelLoadError::UnknownModel(other.to_string())),
            }
        }
    }

    fn counting_cache() -> ModelCache<CountingProvider> {
        ModelCache::new(CountingProvider {
            loads: AtomicUsize::new(0),
        })
    }

    #[test]
    fn loads_once_per_id() {
        let cache = counting_cache();
        let first = cache.get_or_load("tiny").unwrap();
        let second = cache.get_or_load("tiny").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.provider().loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.loaded_ids(), ["tiny"]);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = counting_cache();
        assert!(matches!(
            cache.get_or_load("huge"),
            Err(ModelLoadError::UnknownModel(ref id)) if id == "huge"
        ));
        assert!(cache.get_or_load("huge").is_err());
        assert_eq!(cache.provider().loads.load(Ordering::SeqCst), 2);
        assert!(!cache.is_loaded("huge"));
    }

    #[test]
    fn concurrent_requests_share_one_instance() {
        let cache = counting_cache();
        let models: Vec<Arc<WordVectors>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4).map(|_| s.spawn(|| cache.get_or_load("tiny").unwrap())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let kept = cache.get("tiny").unwrap();
        assert!(models.iter().all(|m| Arc::ptr_eq(m, &kept)));
        assert!(cache.provider().loads.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn catalog_provider_reads_local_models() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.txt");
        std::fs::write(&path, "2 2\nx 1 0\ny 0 1\n").unwrap();

        let mut catalog = Catalog::default();
        catalog.insert(ModelSpec {
            id: "tiny".to_string(),
            source: ModelSource::Local(path),
            format: VectorFormat::Text,
            compound_joiner: None,
            limit: None,
        });
        let provider = CatalogProvider::new(catalog, dir.path().join("cache"));

        let model = provider.load("tiny").unwrap();
        assert_eq!(model.len(), 2);
        assert!(matches!(
            provider.load("missing"),
            Err(ModelLoadError::UnknownModel(_))
        ));
    }

    #[test]
    fn catalog_provider_reports_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.txt");
        std::fs::write(&path, "a 1 2\nb 1\n").unwrap();

        let provider = CatalogProvider::new(
            Catalog::new(vec![ModelSpec {
                id: "broken".to_string(),
                source: ModelSource::Local(path),
                format: VectorFormat::Text,
                compound_joiner: None,
                limit: None,
            }]),
            dir.path(),
        );
        assert!(matches!(
            provider.load("broken"),
            Err(ModelLoadError::Format { .. })
        ));
    }
}
