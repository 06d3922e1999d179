//! Title based duplicate handling.
//!
//! [`deduplicate`] collapses exact token-bag matches during ingestion.
//! [`find_similar`] is a looser Jaccard search for on-demand lookups and is
//! never applied to the ingestion pipeline.

use std::collections::{HashMap, HashSet};

use nt_core::Article;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.6;

/// Lowercase title words longer than two characters, punctuation removed.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    cleaned
        .split_whitespace()
        .filter(|word| word.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

/// Sorted tokens joined by a single space.
pub fn cluster_key(title: &str) -> String {
    let mut tokens = tokenize(title);
    tokens.sort();
    tokens.join(" ")
}

/// One article per cluster key. The newest member wins and takes the slot of
/// the first member seen.
pub fn deduplicate(articles: Vec<Article>) -> Vec<Article> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<Article> = Vec::with_capacity(articles.len());

    for article in articles {
        let key = cluster_key(&article.title);
        match slots.get(&key) {
            Some(&slot) => {
                if article.published_at > unique[slot].published_at {
                    unique[slot] = article;
                }
            }
            None => {
                slots.insert(key, unique.len());
                unique.push(article);
            }
        }
    }
    unique
}

/// |A ∩ B| / |A ∪ B| over token sets; two empty sets give 0.0.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

pub fn title_similarity(a: &str, b: &str) -> f64 {
    let a: HashSet<String> = tokenize(a).into_iter().collect();
    let b: HashSet<String> = tokenize(b).into_iter().collect();
    jaccard(&a, &b)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarArticle {
    pub article: Article,
    pub similarity: f64,
}

/// Candidates at or above `threshold`, most similar first. Candidates sharing
/// the target's id are skipped.
pub fn find_similar(target: &Article, candidates: &[Article], threshold: f64) -> Vec<SimilarArticle> {
    let target_tokens: HashSet<String> = tokenize(&target.title).into_iter().collect();

    let mut similar: Vec<SimilarArticle> = candidates
        .iter()
        .filter(|candidate| candidate.id != target.id)
        .filter_map(|candidate| {
            let tokens: HashSet<String> = tokenize(&candidate.title).into_iter().collect();
            let similarity = jaccard(&target_tokens, &tokens);
            (similarity >= threshold).then(|| SimilarArticle {
                article: candidate.clone(),
                similarity,
            })
        })
        .collect();

    similar.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    similar
}
