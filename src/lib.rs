//! Nearest-word lookup over pre-trained word embeddings.
//!
//! A [`ModelCache`] loads each model once (downloading it into a local cache
//! if needed), [`similarity::query`] finds the nearest words by cosine
//! similarity and [`ResultFilter`] removes the query word and compound tokens.

pub mod catalog;
pub mod config;
pub mod download;
pub mod error;
pub mod provider;
pub mod search;
pub mod similarity;
pub mod word_vectors;

pub use catalog::{Catalog, ModelSource, ModelSpec};
pub use config::Config;
pub use error::{FormatError, ModelLoadError, WordNotFound};
pub use provider::{CatalogProvider, ModelCache, ModelProvider};
pub use search::{Notice, SearchRequest, Severity, run_search};
pub use similarity::{Neighbor, ResultFilter, filter_neighbors, query};
pub use word_vectors::{VectorFormat, WordVectors};
