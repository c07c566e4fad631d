/// Diversity ranking
///
/// Turns a bag of same-category comments into a small representative,
/// non-redundant subset:
/// 1. TF-IDF vectors over the comment texts (English stop words removed)
/// 2. score each comment by cosine similarity to the centroid
/// 3. stable sort descending, most mainstream first
/// 4. split the sorted sequence into k contiguous chunks and take the top
///    of each chunk
///
/// Chunk 0 yields the most archetypal comment; later chunks sit further
/// from the centroid, so later picks diverge from the mainstream instead
/// of repeating near-duplicates of the top result.
use crate::types::Comment;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Common English stop words removed before vectorization
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "all", "also", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him",
    "his", "how", "i", "if", "in", "into", "is", "it", "its", "just", "me", "more", "most",
    "my", "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other", "our",
    "ours", "out", "over", "own", "same", "she", "should", "so", "some", "such", "than",
    "that", "the", "their", "theirs", "them", "then", "there", "these", "they", "this",
    "those", "through", "to", "too", "under", "until", "up", "very", "was", "we", "were",
    "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would",
    "you", "your", "yours",
];

/// Pick up to `k` representative comments, one per similarity chunk.
///
/// Deterministic for a given input: the similarity sort is stable, so
/// equal-score comments keep their input order. Falls back to the first
/// `k` comments in original order when no text survives vectorization.
pub fn select_diverse(comments: &[Comment], k: usize) -> Vec<Comment> {
    let n = comments.len();
    if n == 0 || k == 0 {
        return Vec::new();
    }

    let vectors = match vectorize(comments) {
        Some(vectors) => vectors,
        None => {
            debug!("Vectorization produced no terms, falling back to fetch order");
            return comments.iter().take(k).cloned().collect();
        }
    };

    let scores = centroid_similarities(&vectors);

    // Stable descending sort: ties keep input order.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let chunk_size = (n / k).max(1);
    let mut picks = Vec::new();
    for i in 0..k {
        let start = i * chunk_size;
        if start >= n {
            break;
        }
        picks.push(comments[order[start]].clone());
    }

    debug!("Selected {} of {} comments (k = {})", picks.len(), n, k);
    picks
}

/// L2-normalized sparse TF-IDF vectors, term index -> weight.
/// BTreeMap keeps iteration (and thus float summation) in ascending
/// term-index order, so scores are identical across calls.
/// Returns None when every document is empty after stop-word removal.
fn vectorize(comments: &[Comment]) -> Option<Vec<BTreeMap<usize, f64>>> {
    let n = comments.len();
    let token_lists: Vec<Vec<String>> = comments.iter().map(|c| tokenize(&c.text)).collect();

    // Deterministic term indices via the sorted vocabulary.
    let mut vocabulary: BTreeMap<String, usize> = BTreeMap::new();
    let mut document_frequency: HashMap<String, usize> = HashMap::new();
    for tokens in &token_lists {
        let mut seen: Vec<&String> = tokens.iter().collect();
        seen.sort();
        seen.dedup();
        for term in seen {
            *document_frequency.entry(term.clone()).or_insert(0) += 1;
            vocabulary.entry(term.clone()).or_insert(0);
        }
    }
    if vocabulary.is_empty() {
        return None;
    }
    // Indices follow sorted term order.
    for (index, slot) in vocabulary.values_mut().enumerate() {
        *slot = index;
    }

    // Smoothed IDF, as if one extra document contained every term.
    let idf: HashMap<&String, f64> = document_frequency
        .iter()
        .map(|(term, df)| {
            let value = ((1.0 + n as f64) / (1.0 + *df as f64)).ln() + 1.0;
            (term, value)
        })
        .collect();

    let vectors = token_lists
        .iter()
        .map(|tokens| {
            let mut counts: HashMap<usize, f64> = HashMap::new();
            for term in tokens {
                let index = vocabulary[term];
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
            let mut vector: BTreeMap<usize, f64> = BTreeMap::new();
            for (term, slot) in &vocabulary {
                if let Some(tf) = counts.get(slot) {
                    vector.insert(*slot, tf * idf[term]);
                }
            }
            l2_normalize(&mut vector);
            vector
        })
        .collect();

    Some(vectors)
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= 2)
        .filter(|token| !STOP_WORDS.contains(token))
        .map(|token| token.to_string())
        .collect()
}

fn l2_normalize(vector: &mut BTreeMap<usize, f64>) {
    let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for weight in vector.values_mut() {
            *weight /= norm;
        }
    }
}

/// Cosine similarity of each vector to the mean vector of the set
fn centroid_similarities(vectors: &[BTreeMap<usize, f64>]) -> Vec<f64> {
    let n = vectors.len() as f64;
    let mut centroid: BTreeMap<usize, f64> = BTreeMap::new();
    for vector in vectors {
        for (index, weight) in vector {
            *centroid.entry(*index).or_insert(0.0) += weight / n;
        }
    }

    let centroid_norm = centroid.values().map(|w| w * w).sum::<f64>().sqrt();

    vectors
        .iter()
        .map(|vector| {
            if centroid_norm == 0.0 {
                return 0.0;
            }
            // Vectors are unit length, so the cosine is the dot product
            // scaled by the centroid norm.
            let dot: f64 = vector
                .iter()
                .map(|(index, weight)| weight * centroid.get(index).copied().unwrap_or(0.0))
                .sum();
            let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
            if norm == 0.0 {
                0.0
            } else {
                dot / (norm * centroid_norm)
            }
        })
        .collect()
}
