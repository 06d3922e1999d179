//! Chat prompts. Output is requested in Russian.

use nt_core::types::clip;
use nt_core::Article;

use crate::models::chat::ChatMessage;

pub const ARTICLE_CONTENT_LIMIT: usize = 2000;
pub const DIGEST_ARTICLE_LIMIT: usize = 10;
pub const DIGEST_DESCRIPTION_LIMIT: usize = 200;

pub const ARTICLE_MAX_TOKENS: u32 = 300;
pub const DIGEST_MAX_TOKENS: u32 = 800;

pub fn article_summary(article: &Article) -> Vec<ChatMessage> {
    let body = if article.content.is_empty() {
        &article.description
    } else {
        &article.content
    };
    vec![
        ChatMessage::system(
            "Ты кратко пересказываешь новости на русском языке. Отвечай сразу по делу, \
             без вводных фраз.",
        ),
        ChatMessage::user(format!(
            "Перескажи новость в 2-3 предложениях.\n\nЗаголовок: {}\nТекст: {}",
            article.title,
            clip(body, ARTICLE_CONTENT_LIMIT)
        )),
    ]
}

/// Numbered list of the first articles of a topic.
pub fn digest_items(articles: &[Article]) -> String {
    articles
        .iter()
        .take(DIGEST_ARTICLE_LIMIT)
        .enumerate()
        .map(|(i, article)| {
            format!(
                "{}. {}\n   {}",
                i + 1,
                article.title,
                clip(&article.description, DIGEST_DESCRIPTION_LIMIT)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn topic_digest(label: &str, articles: &[Article]) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(
            "Ты новостной аналитик. Пиши на русском языке, объективно, кратко и по структуре.",
        ),
        ChatMessage::user(format!(
            "Сделай обзор новостей по теме \"{}\".\n\n{}\n\n\
             Структура ответа:\n\
             📌 ГЛАВНОЕ: два-три предложения о ключевых событиях\n\
             🔹 КЛЮЧЕВЫЕ МОМЕНТЫ: несколько коротких пунктов\n\
             💡 ВЫВОД: одно-два предложения",
            label,
            digest_items(articles)
        )),
    ]
}

pub fn connection_check() -> Vec<ChatMessage> {
    vec![ChatMessage::user("Ответь одним словом: работает?")]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(i: usize) -> Article {
        Article {
            id: format!("news_{}", i),
            title: format!("Title {}", i),
            link: None,
            description: "д".repeat(300),
            content: String::new(),
            published_at: Utc::now(),
            author: String::new(),
            categories: vec![],
            image: None,
            feed_url: "https://feed".to_string(),
            feed_title: "Feed".to_string(),
            fetched_at: Utc::now(),
            topic: Some("ai".to_string()),
            summary: None,
        }
    }

    #[test]
    fn test_digest_items_limits() {
        let articles: Vec<Article> = (0..12).map(article).collect();
        let items = digest_items(&articles);
        assert!(items.starts_with("1. Title 0\n   "));
        assert!(items.contains("10. Title 9"));
        assert!(!items.contains("Title 10"));
        let first_line_desc = items.lines().nth(1).unwrap().trim();
        assert_eq!(first_line_desc.chars().count(), DIGEST_DESCRIPTION_LIMIT);
    }

    #[test]
    fn test_article_prompt_falls_back_to_description() {
        let messages = article_summary(&article(1));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[1].content.contains("Title 1"));
        assert!(messages[1].content.contains(&"д".repeat(300)));
    }
}
