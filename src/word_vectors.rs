use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::GzDecoder;
use rayon::prelude::*;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::error::FormatError;

/// Upper bound on the vector dimension accepted from a file header.
pub const MAX_DIMS: usize = 10_000;

/// On-disk layout of a vector file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorFormat {
    /// One `word v1 v2 ...` line per entry, optionally preceded by a
    /// `count dims` header (word2vec text and GloVe files).
    #[default]
    Text,
    /// word2vec binary: text header, then `word ` followed by little-endian f32s.
    Binary,
}

// A struct to hold word vectors in a contiguous array for performance.
pub struct WordVectors {
    words: Vec<String>,               // vocabulary - index to word map
    word_map: HashMap<String, usize>, // word to index map
    vectors: Vec<f32>,                // A single, flattened Vec of all unit-length vectors
    dims: usize,                      // The dimension of each vector
}

// The table itself is far too large to print.
impl fmt::Debug for WordVectors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordVectors")
            .field("len", &self.len())
            .field("dims", &self.dims)
            .finish()
    }
}

impl WordVectors {
    fn empty(dims: usize) -> Self {
        WordVectors {
            words: Vec::new(),
            word_map: HashMap::new(),
            vectors: Vec::new(),
            dims,
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn get_word(&self, idx: usize) -> &str {
        &self.words[idx]
    }

    pub fn get_index(&self, word: &str) -> Option<&usize> {
        self.word_map.get(word)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.word_map.contains_key(word)
    }

    fn get_vector(&self, idx: usize) -> &[f32] {
        &self.vectors[idx * self.dims..(idx + 1) * self.dims]
    }

    // Normalises `values` in place and appends the entry. The first occurrence
    // of a word keeps its index; later duplicates are dropped.
    fn push(&mut self, word: String, values: &mut [f32]) -> Result<(), FormatError> {
        const EPS: f32 = 1e-8;

        if self.dims == 0 {
            if values.is_empty() {
                return Err(FormatError::ZeroDimensions);
            }
            self.dims = values.len();
        } else if values.len() != self.dims {
            return Err(FormatError::DimensionMismatch {
                word,
                found: values.len(),
                expected: self.dims,
            });
        }

        if self.word_map.contains_key(&word) {
            return Ok(());
        }

        let norm: f32 = values.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > EPS {
            values.iter_mut().for_each(|e| *e /= norm);
        }

        self.word_map.insert(word.clone(), self.words.len());
        self.words.push(word);
        self.vectors.extend_from_slice(values);
        Ok(())
    }

    fn finish(self) -> Result<Self, FormatError> {
        if self.words.is_empty() {
            return Err(FormatError::Empty);
        }
        Ok(self)
    }

    /// Reads the text format. A first non-blank line made of exactly two
    /// unsigned integers is taken as a word2vec `count dims` header.
    pub fn read_text<R: BufRead>(reader: R, limit: Option<usize>) -> Result<Self, FormatError> {
        let mut wv = WordVectors::empty(0);
        let mut first_line = true;

        for (index, line_result) in reader.lines().enumerate() {
            if limit.is_some_and(|n| wv.len() >= n) {
                break;
            }
            let line = line_result?;
            let mut parts = line.split_whitespace();
            let Some(key) = parts.next() else {
                continue;
            };
            let fields: Vec<&str> = parts.collect();

            if std::mem::take(&mut first_line) {
                if let Some((_, dims)) = parse_header(&line) {
                    wv.dims = check_dims(dims, &line)?;
                    continue;
                }
            }

            let mut values = fields
                .iter()
                .map(|s| {
                    s.parse::<f32>().map_err(|_| FormatError::InvalidNumber {
                        line: index + 1,
                        value: s.to_string(),
                    })
                })
                .collect::<Result<Vec<f32>, _>>()?;

            wv.push(key.to_string(), &mut values)?;
        }

        wv.finish()
    }

    /// Reads the word2vec binary format.
    pub fn read_binary<R: BufRead>(mut reader: R, limit: Option<usize>) -> Result<Self, FormatError> {
        let mut header = String::new();
        reader.read_line(&mut header)?;
        let (count, dims) = parse_header(&header)
            .ok_or_else(|| FormatError::InvalidHeader(header.trim().to_string()))?;
        let dims = check_dims(dims, &header)?;
        let count = limit.map_or(count, |n| n.min(count));

        let mut wv = WordVectors::empty(dims);
        let mut word_bytes = Vec::new();
        let mut values = vec![0.0f32; dims];

        for _ in 0..count {
            word_bytes.clear();
            reader.read_until(b' ', &mut word_bytes)?;
            if word_bytes.pop() != Some(b' ') {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }
            // some writers terminate each vector with a newline
            let start = word_bytes
                .iter()
                .position(|&b| b != b'\n')
                .unwrap_or(word_bytes.len());
            let word = String::from_utf8_lossy(&word_bytes[start..]).into_owned();

            reader.read_f32_into::<LittleEndian>(&mut values)?;
            wv.push(word, &mut values)?;
        }

        wv.finish()
    }

    /// Opens `path` in the given format, gunzipping `.gz` files on the fly.
    pub fn from_path(
        path: &Path,
        format: VectorFormat,
        limit: Option<usize>,
    ) -> Result<Self, FormatError> {
        let file = File::open(path)?;
        let reader: Box<dyn BufRead> = if path.extension().is_some_and(|ext| ext == "gz") {
            Box::new(BufReader::new(GzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };

        match format {
            VectorFormat::Text => Self::read_text(reader, limit),
            VectorFormat::Binary => Self::read_binary(reader, limit),
        }
    }

    /// Top `n` entries by cosine similarity to `word`, best first. The word
    /// itself is never part of the answer. `None` if `word` is out of vocabulary.
    pub fn most_similar(&self, word: &str, n: usize) -> Option<Vec<(usize, f32)>> {
        let &word_idx = self.get_index(word)?;
        if n == 0 {
            return Some(Vec::new());
        }
        let target = self.get_vector(word_idx);

        // Collect all scores in parallel
        let mut scores: Vec<(usize, f32)> = self
            .vectors
            .par_chunks_exact(self.dims)
            .enumerate()
            .filter(|(i, _)| *i != word_idx)
            .map(|(i, v_slice)| {
                let score = v_slice.iter().zip(target).map(|(v, t)| v * t).sum::<f32>();
                (i, score)
            })
            .collect();

        // Partial sort first; n is usually tiny compared to the vocabulary.
        if n < scores.len() {
            scores.select_nth_unstable_by(n, by_score_desc);
            scores.truncate(n);
        }
        scores.sort_by(by_score_desc);

        Some(scores)
    }
}

fn by_score_desc(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

fn check_dims(dims: usize, header: &str) -> Result<usize, FormatError> {
    match dims {
        0 => Err(FormatError::ZeroDimensions),
        d if d > MAX_DIMS => Err(FormatError::InvalidHeader(format!(
            "{} (dimension above {MAX_DIMS})",
            header.trim()
        ))),
        d => Ok(d),
    }
}

fn parse_header(line: &str) -> Option<(usize, usize)> {
    let mut parts = line.split_whitespace();
    let count = parts.next()?.parse().ok()?;
    let dims = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((count, dims))
}
