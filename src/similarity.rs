//! Nearest-word lookup and the post-filter applied before showing results.

use crate::error::WordNotFound;
use crate::word_vectors::WordVectors;

/// Joiner used by the gensim-data vocabularies for phrases and tagged tokens.
pub const DEFAULT_COMPOUND_JOINER: char = '_';

/// One entry of a neighbor list.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub word: String,
    pub score: f32,
}

impl Neighbor {
    pub fn new(word: impl Into<String>, score: f32) -> Self {
        Neighbor {
            word: word.into(),
            score,
        }
    }
}

/// The `top_n` nearest words to `word`, best first.
pub fn query(model: &WordVectors, word: &str, top_n: usize) -> Result<Vec<Neighbor>, WordNotFound> {
    let scores = model
        .most_similar(word, top_n)
        .ok_or_else(|| WordNotFound(word.to_string()))?;

    Ok(scores
        .into_iter()
        .map(|(idx, score)| Neighbor::new(model.get_word(idx), score))
        .collect())
}

/// Drops the query word itself (ignoring case) and compound tokens, keeping order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultFilter {
    /// `None` keeps compound tokens.
    pub compound_joiner: Option<char>,
}

impl Default for ResultFilter {
    fn default() -> Self {
        ResultFilter {
            compound_joiner: Some(DEFAULT_COMPOUND_JOINER),
        }
    }
}

impl ResultFilter {
    pub fn new(compound_joiner: Option<char>) -> Self {
        ResultFilter { compound_joiner }
    }

    pub fn apply(&self, results: Vec<Neighbor>, input_word: &str) -> Vec<Neighbor> {
        let input_lower = input_word.to_lowercase();
        results
            .into_iter()
            .filter(|n| !self.is_compound(&n.word) && n.word.to_lowercase() != input_lower)
            .collect()
    }

    fn is_compound(&self, word: &str) -> bool {
        self.compound_joiner.is_some_and(|j| word.contains(j))
    }
}

/// [`ResultFilter::apply`] with the default `_` joiner.
pub fn filter_neighbors(results: Vec<Neighbor>, input_word: &str) -> Vec<Neighbor> {
    ResultFilter::default().apply(results, input_word)
}
