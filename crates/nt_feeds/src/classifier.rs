//! Keyword based topic assignment and topic level views over articles.

use std::collections::HashMap;
use std::sync::Arc;

use nt_core::config::TopicConfig;
use nt_core::{Article, ALL_TOPICS, OTHER_TOPIC};
use serde::Serialize;

use crate::dedup::tokenize;

#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub icon: String,
    /// Name used when asking for a digest.
    pub label: String,
    /// Lowercase keywords, matched as substrings.
    pub keywords: Vec<String>,
}

impl Topic {
    pub fn new(id: &str, name: &str, icon: &str, label: &str, keywords: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

/// Ordered, immutable topic table. Order decides ties.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicTable {
    topics: Vec<Topic>,
    other: Topic,
    all: Topic,
}

impl Default for TopicTable {
    fn default() -> Self {
        Self::new(vec![
            Topic::new(
                "technology",
                "Технологии",
                "💻",
                "Технологии",
                &[
                    "tech", "software", "hardware", "programming", "developer", "api", "app",
                    "код", "разработ", "программ", "веб", "web", "framework", "javascript",
                    "python", "rust",
                ],
            ),
            Topic::new(
                "ai",
                "AI / ML",
                "🤖",
                "Искусственный интеллект",
                &[
                    "ai", "artificial intelligence", "machine learning", "ml", "neural", "gpt",
                    "llm", "ии", "нейро", "искусственн", "chatgpt", "openai", "anthropic",
                    "gemini", "claude", "llama",
                ],
            ),
            Topic::new(
                "security",
                "Безопасность",
                "🔒",
                "Кибербезопасность",
                &[
                    "security", "hack", "cyber", "vulnerability", "breach", "безопасност",
                    "взлом", "уязвим", "malware", "ransomware", "phishing", "privacy",
                ],
            ),
            Topic::new(
                "business",
                "Бизнес",
                "💼",
                "Бизнес",
                &[
                    "business", "startup", "funding", "investment", "acquisition", "бизнес",
                    "стартап", "инвест", "ipo", "revenue", "market", "layoff",
                ],
            ),
            Topic::new(
                "science",
                "Наука",
                "🔬",
                "Наука",
                &[
                    "science", "research", "study", "discovery", "наук", "исследован",
                    "открыт", "physics", "biology", "space", "nasa", "spacex",
                ],
            ),
            Topic::new(
                "gadgets",
                "Гаджеты",
                "📱",
                "Гаджеты",
                &[
                    "gadget", "phone", "laptop", "device", "apple", "google", "samsung",
                    "гаджет", "смартфон", "телефон", "iphone", "android", "pixel", "macbook",
                ],
            ),
        ])
    }
}

impl TopicTable {
    pub fn new(topics: Vec<Topic>) -> Self {
        Self {
            topics,
            other: Topic::new(OTHER_TOPIC, "Другое", "📄", "Другое", &[]),
            all: Topic::new(ALL_TOPICS, "Все", "📰", "Все", &[]),
        }
    }

    pub fn from_config(topics: &[TopicConfig]) -> Self {
        Self::new(
            topics
                .iter()
                .map(|t| Topic {
                    id: t.id.clone(),
                    name: t.name.clone(),
                    icon: t.icon.clone(),
                    label: t.label.clone().unwrap_or_else(|| t.name.clone()),
                    keywords: t.keywords.iter().map(|k| k.to_lowercase()).collect(),
                })
                .collect(),
        )
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// Looks up table topics as well as `other` and `all`.
    pub fn get(&self, id: &str) -> Option<&Topic> {
        if id == OTHER_TOPIC {
            return Some(&self.other);
        }
        if id == ALL_TOPICS {
            return Some(&self.all);
        }
        self.topics.iter().find(|t| t.id == id)
    }

    /// Label for digest prompts, the id itself for unknown topics.
    pub fn label<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map_or(id, |t| t.label.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicCount {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordCount {
    pub word: String,
    pub count: usize,
}

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
    "did", "will", "would", "could", "should", "may", "might", "must", "shall", "can", "need",
    "что", "как", "это", "для", "при", "или", "его", "она", "они", "был", "быть", "все", "так",
    "уже", "этот", "также", "после",
];

#[derive(Debug, Clone)]
pub struct TopicClassifier {
    table: Arc<TopicTable>,
}

impl Default for TopicClassifier {
    fn default() -> Self {
        Self::new(Arc::new(TopicTable::default()))
    }
}

impl TopicClassifier {
    pub fn new(table: Arc<TopicTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &TopicTable {
        &self.table
    }

    /// Score of every table topic, in table order.
    pub fn scores(&self, article: &Article) -> Vec<(&str, u32)> {
        let title = article.title.to_lowercase();
        let haystack = format!(
            "{} {} {}",
            article.title,
            article.description,
            article.categories.join(" ")
        )
        .to_lowercase();

        self.table
            .topics
            .iter()
            .map(|topic| {
                let score: u32 = topic
                    .keywords
                    .iter()
                    .filter(|keyword| haystack.contains(keyword.as_str()))
                    .map(|keyword| if title.contains(keyword.as_str()) { 3 } else { 1 })
                    .sum();
                (topic.id.as_str(), score)
            })
            .collect()
    }

    pub fn classify(&self, article: &Article) -> String {
        let mut best = OTHER_TOPIC;
        let mut best_score = 0;
        for (id, score) in self.scores(article) {
            if score > best_score {
                best = id;
                best_score = score;
            }
        }
        best.to_string()
    }

    /// Classify articles that have no topic yet.
    pub fn assign_topics(&self, articles: Vec<Article>) -> Vec<Article> {
        articles
            .into_iter()
            .map(|mut article| {
                if article.topic.is_none() {
                    article.topic = Some(self.classify(&article));
                }
                article
            })
            .collect()
    }

    /// `all`, then one bucket per table topic, then `other`.
    pub fn group_by_topic(&self, articles: &[Article]) -> Vec<(String, Vec<Article>)> {
        let mut groups: Vec<(String, Vec<Article>)> = Vec::with_capacity(self.table.topics.len() + 2);
        groups.push((ALL_TOPICS.to_string(), articles.to_vec()));
        for topic in &self.table.topics {
            groups.push((topic.id.clone(), Vec::new()));
        }
        groups.push((OTHER_TOPIC.to_string(), Vec::new()));

        let other_idx = groups.len() - 1;
        for article in articles {
            let topic = match &article.topic {
                Some(topic) => topic.clone(),
                None => self.classify(article),
            };
            let idx = groups[1..other_idx]
                .iter()
                .position(|(id, _)| *id == topic)
                .map_or(other_idx, |i| i + 1);
            groups[idx].1.push(article.clone());
        }
        groups
    }

    /// `all` with the total, then each non-empty topic in table order.
    pub fn topics_with_counts(&self, articles: &[Article]) -> Vec<TopicCount> {
        self.group_by_topic(articles)
            .into_iter()
            .filter(|(id, group)| id == ALL_TOPICS || !group.is_empty())
            .filter_map(|(id, group)| {
                let topic = self.table.get(&id)?;
                Some(TopicCount {
                    id,
                    name: topic.name.clone(),
                    icon: topic.icon.clone(),
                    count: group.len(),
                })
            })
            .collect()
    }
}

/// Most frequent title words across `articles`.
pub fn trending_keywords(articles: &[Article], limit: usize) -> Vec<KeywordCount> {
    let mut counts: Vec<KeywordCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for article in articles {
        for word in tokenize(&article.title) {
            if word.chars().count() <= 3 || STOP_WORDS.contains(&word.as_str()) {
                continue;
            }
            match index.get(&word) {
                Some(&i) => counts[i].count += 1,
                None => {
                    index.insert(word.clone(), counts.len());
                    counts.push(KeywordCount { word, count: 1 });
                }
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}
