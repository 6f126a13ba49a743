//! One user interaction: load (or reuse) a model, query it, filter, and
//! describe the result as a [`Notice`].

use std::fmt;

use crate::catalog::Catalog;
use crate::error::WordNotFound;
use crate::provider::{ModelCache, ModelProvider};
use crate::similarity::{Neighbor, query};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub model: String,
    pub word: String,
    /// At least 1; checked by the caller.
    pub top_n: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

/// What the user gets to see.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    EmptyWord,
    ModelLoadFailed { model: String, message: String },
    WordNotFound { word: String },
    NoFilteredResults { word: String },
    Found {
        word: String,
        top_n: usize,
        neighbors: Vec<Neighbor>,
    },
}

impl Notice {
    pub fn severity(&self) -> Severity {
        match self {
            Notice::Found { .. } => Severity::Success,
            Notice::EmptyWord | Notice::NoFilteredResults { .. } => Severity::Warning,
            Notice::ModelLoadFailed { .. } | Notice::WordNotFound { .. } => Severity::Error,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        match self {
            Notice::EmptyWord => vec!["Please enter a word to search.".to_string()],
            Notice::ModelLoadFailed { model, message } => {
                vec![format!("Failed to load model '{model}': {message}")]
            }
            Notice::WordNotFound { word } => {
                vec![format!("The word '{word}' is not in the vocabulary.")]
            }
            Notice::NoFilteredResults { word } => {
                vec![format!("No filtered similar words found for '{word}'.")]
            }
            Notice::Found {
                word,
                top_n,
                neighbors,
            } => {
                let mut lines = Vec::with_capacity(neighbors.len() + 1);
                lines.push(format!("Top {top_n} filtered words similar to '{word}':"));
                lines.extend(
                    neighbors
                        .iter()
                        .map(|n| format!("{}: {:.4}", n.word, n.score)),
                );
                lines
            }
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

impl From<WordNotFound> for Notice {
    fn from(err: WordNotFound) -> Self {
        Notice::WordNotFound { word: err.0 }
    }
}

/// Runs the whole pipeline for one request. Every failure becomes a notice.
pub fn run_search<P: ModelProvider>(
    cache: &ModelCache<P>,
    catalog: &Catalog,
    request: &SearchRequest,
) -> Notice {
    if request.word.is_empty() {
        return Notice::EmptyWord;
    }

    let model = match cache.get_or_load(&request.model) {
        Ok(model) => model,
        Err(e) => {
            tracing::error!("Loading {} failed: {e}", request.model);
            return Notice::ModelLoadFailed {
                model: request.model.clone(),
                message: e.to_string(),
            };
        }
    };

    let raw = match query(&model, &request.word, request.top_n) {
        Ok(raw) => raw,
        Err(e) => return e.into(),
    };
    let raw_len = raw.len();

    let filter = catalog
        .get(&request.model)
        .map(|spec| spec.result_filter())
        .unwrap_or_default();
    let neighbors = filter.apply(raw, &request.word);
    tracing::debug!(
        "{} raw neighbors for '{}', {} after filtering",
        raw_len,
        request.word,
        neighbors.len()
    );

    if neighbors.is_empty() {
        return Notice::NoFilteredResults {
            word: request.word.clone(),
        };
    }

    Notice::Found {
        word: request.word.clone(),
        top_n: request.top_n,
        neighbors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ModelSource, ModelSpec};
    use crate::error::ModelLoadError;
    use crate::word_vectors::{VectorFormat, WordVectors};
    use std::io::Cursor;
    use std::path::PathBuf;

    const VECTORS: &str = "\
dog 1.0 0.0
Dog 0.99 0.01
puppy 0.9 0.2
hot_dog 0.8 0.3
kitten 0.1 1.0
";

    struct FixedProvider;

    impl ModelProvider for FixedProvider {
        fn load(&self, id: &str) -> Result<WordVectors, ModelLoadError> {
            match id {
                "pets" | "raw" => Ok(WordVectors::read_text(Cursor::new(VECTORS), None).unwrap()),
                other => Err(ModelLoadError::UnknownModel(other.to_string())),
            }
        }
    }

    fn catalog() -> Catalog {
        let spec = |id: &str, joiner| ModelSpec {
            id: id.to_string(),
            source: ModelSource::Local(PathBuf::from("unused")),
            format: VectorFormat::Text,
            compound_joiner: joiner,
            limit: None,
        };
        Catalog::new(vec![spec("pets", Some('_')), spec("raw", None)])
    }

    fn request(model: &str, word: &str, top_n: usize) -> SearchRequest {
        SearchRequest {
            model: model.to_string(),
            word: word.to_string(),
            top_n,
        }
    }

    #[test]
    fn empty_word_never_touches_the_model() {
        let cache = ModelCache::new(FixedProvider);
        let notice = run_search(&cache, &catalog(), &request("pets", "", 10));
        assert_eq!(notice, Notice::EmptyWord);
        assert_eq!(notice.severity(), Severity::Warning);
        assert_eq!(notice.to_string(), "Please enter a word to search.");
        assert!(!cache.is_loaded("pets"));
    }

    #[test]
    fn found_words_are_filtered_and_rendered() {
        let cache = ModelCache::new(FixedProvider);
        let notice = run_search(&cache, &catalog(), &request("pets", "dog", 10));

        assert_eq!(notice.severity(), Severity::Success);
        let lines = notice.lines();
        assert_eq!(lines[0], "Top 10 filtered words similar to 'dog':");
        assert!(lines[1].starts_with("puppy: 0.9"));
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("kitten: 0.0"));
        assert!(lines[1..].iter().all(|l| l.rsplit_once('.').unwrap().1.len() == 4));
    }

    #[test]
    fn joiner_follows_the_model() {
        let cache = ModelCache::new(FixedProvider);
        let Notice::Found { neighbors, .. } = run_search(&cache, &catalog(), &request("raw", "dog", 10))
        else {
            panic!("expected results");
        };
        let words: Vec<&str> = neighbors.iter().map(|n| n.word.as_str()).collect();
        assert_eq!(words, ["puppy", "hot_dog", "kitten"]);
    }

    #[test]
    fn missing_word_is_an_error_notice() {
        let cache = ModelCache::new(FixedProvider);
        let notice = run_search(&cache, &catalog(), &request("pets", "unicorn", 5));
        assert_eq!(
            notice,
            Notice::WordNotFound {
                word: "unicorn".to_string()
            }
        );
        assert_eq!(notice.severity(), Severity::Error);
        assert_eq!(notice.to_string(), "The word 'unicorn' is not in the vocabulary.");
    }

    #[test]
    fn everything_filtered_is_a_warning() {
        let cache = ModelCache::new(FixedProvider);
        // The single nearest neighbor of "dog" is "Dog".
        let notice = run_search(&cache, &catalog(), &request("pets", "dog", 1));
        assert_eq!(
            notice.to_string(),
            "No filtered similar words found for 'dog'."
        );
        assert_eq!(notice.severity(), Severity::Warning);
    }

    #[test]
    fn load_failures_do_not_panic() {
        let cache = ModelCache::new(FixedProvider);
        let notice = run_search(&cache, &catalog(), &request("nope", "dog", 3));
        assert_eq!(notice.severity(), Severity::Error);
        assert_eq!(notice.to_string(), "Failed to load model 'nope': unknown model 'nope'");
    }
}
