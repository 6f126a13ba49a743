//! The set of models a user can pick from.

use std::path::PathBuf;

use crate::similarity::{DEFAULT_COMPOUND_JOINER, ResultFilter};
use crate::word_vectors::VectorFormat;

const GENSIM_DATA_URL: &str = "https://github.com/RaRe-Technologies/gensim-data/releases/download";

/// Where the vectors of a model come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    Remote(String),
    Local(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub id: String,
    pub source: ModelSource,
    pub format: VectorFormat,
    /// Character marking phrase/tagged tokens in this vocabulary. The `_`
    /// convention belongs to the gensim-data models, not to embeddings in general.
    pub compound_joiner: Option<char>,
    /// Read only the first `limit` vectors.
    pub limit: Option<usize>,
}

impl ModelSpec {
    /// A model published in the gensim-data release repository.
    pub fn gensim_data(id: &str, format: VectorFormat) -> Self {
        ModelSpec {
            id: id.to_string(),
            source: ModelSource::Remote(format!("{GENSIM_DATA_URL}/{id}/{id}.gz")),
            format,
            compound_joiner: Some(DEFAULT_COMPOUND_JOINER),
            limit: None,
        }
    }

    pub fn result_filter(&self) -> ResultFilter {
        ResultFilter::new(self.compound_joiner)
    }
}

/// Ordered list of models; the first entry is the default choice.
#[derive(Debug, Clone)]
pub struct Catalog {
    models: Vec<ModelSpec>,
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog {
            models: vec![
                ModelSpec::gensim_data("word2vec-google-news-300", VectorFormat::Binary),
                ModelSpec::gensim_data("glove-wiki-gigaword-50", VectorFormat::Text),
            ],
        }
    }
}

impl Catalog {
    pub fn new(models: Vec<ModelSpec>) -> Self {
        Catalog { models }
    }

    pub fn get(&self, id: &str) -> Option<&ModelSpec> {
        self.models.iter().find(|m| m.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|m| m.id.as_str())
    }

    pub fn default_model(&self) -> Option<&ModelSpec> {
        self.models.first()
    }

    /// Replaces the entry with the same id, or appends a new one.
    pub fn insert(&mut self, spec: ModelSpec) {
        match self.models.iter_mut().find(|m| m.id == spec.id) {
            Some(existing) => *existing = spec,
            None => self.models.push(spec),
        }
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_models_in_order() {
        let catalog = Catalog::default();
        let ids: Vec<&str> = catalog.ids().collect();
        assert_eq!(ids, ["word2vec-google-news-300", "glove-wiki-gigaword-50"]);
        assert_eq!(
            catalog.default_model().map(|m| m.id.as_str()),
            Some("word2vec-google-news-300")
        );
    }

    #[test]
    fn gensim_urls_and_formats() {
        let catalog = Catalog::default();
        let glove = catalog.get("glove-wiki-gigaword-50").unwrap();
        assert_eq!(glove.format, VectorFormat::Text);
        assert_eq!(
            glove.source,
            ModelSource::Remote(
                "https://github.com/RaRe-Technologies/gensim-data/releases/download/glove-wiki-gigaword-50/glove-wiki-gigaword-50.gz"
                    .to_string()
            )
        );
        let w2v = catalog.get("word2vec-google-news-300").unwrap();
        assert_eq!(w2v.format, VectorFormat::Binary);
        assert_eq!(w2v.compound_joiner, Some('_'));
        assert!(catalog.get("fasttext-wiki-news-subwords-300").is_none());
    }

    #[test]
    fn insert_replaces_or_appends() {
        let mut catalog = Catalog::default();
        let local = ModelSpec {
            id: "glove-wiki-gigaword-50".to_string(),
            source: ModelSource::Local(PathBuf::from("/data/glove.txt")),
            format: VectorFormat::Text,
            compound_joiner: None,
            limit: Some(1000),
        };
        catalog.insert(local.clone());
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("glove-wiki-gigaword-50"), Some(&local));

        catalog.insert(ModelSpec {
            id: "mine".to_string(),
            ..local
        });
        assert_eq!(catalog.ids().last(), Some("mine"));
    }
}
