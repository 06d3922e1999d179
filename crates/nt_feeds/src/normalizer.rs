//! RSS and Atom payloads to [`Article`] records.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use nt_core::types::clip;
use nt_core::{Article, Result};
use sha2::{Digest, Sha256};

use crate::html::{first_image, sanitize};
use crate::xml::{parse_document, Element};

pub const UNTITLED: &str = "Без заголовка";
pub const DESCRIPTION_LIMIT: usize = 500;

/// Parse a raw feed payload fetched from `source_url`.
pub fn parse_feed(payload: &str, source_url: &str) -> Result<Vec<Article>> {
    parse_feed_at(payload, source_url, Utc::now())
}

/// Same as [`parse_feed`] with an explicit ingestion time, used both for
/// `fetched_at` and for entries without a usable date.
pub fn parse_feed_at(payload: &str, source_url: &str, now: DateTime<Utc>) -> Result<Vec<Article>> {
    let root = parse_document(payload)?;
    let articles = if root.local_name() == "feed" {
        parse_atom(&root, source_url, now)
    } else {
        parse_rss(&root, source_url, now)
    };
    tracing::debug!("Parsed {} entries from {}", articles.len(), source_url);
    Ok(articles)
}

fn parse_rss(root: &Element, source_url: &str, now: DateTime<Utc>) -> Vec<Article> {
    let channel = if root.name == "channel" {
        Some(root)
    } else {
        root.find("channel")
    };
    let feed_title = channel
        .and_then(|channel| channel.child_text("title"))
        .unwrap_or_else(|| source_url.to_string());

    root.find_all("item")
        .into_iter()
        .map(|item| {
            let title = item.find_text("title");
            let link = item.find_text("link");
            let raw_description = item.find_text("description").unwrap_or_default();
            let raw_content = item
                .find_text("content:encoded")
                .or_else(|| item.find_text("content"))
                .unwrap_or_else(|| raw_description.clone());
            let published = item
                .find_text("pubDate")
                .or_else(|| item.find_text("dc:date"));
            let author = item
                .find_text("author")
                .or_else(|| item.find_text("dc:creator"))
                .unwrap_or_else(|| feed_title.clone());
            let categories = item
                .find_all("category")
                .into_iter()
                .filter_map(|c| {
                    let text = c.text();
                    let text = text.trim();
                    (!text.is_empty()).then(|| text.to_string())
                })
                .collect();

            build_article(
                Entry {
                    title,
                    link,
                    raw_description,
                    raw_content,
                    published,
                    author,
                    categories,
                    image: element_image(item),
                },
                source_url,
                &feed_title,
                now,
            )
        })
        .collect()
}

fn parse_atom(root: &Element, source_url: &str, now: DateTime<Utc>) -> Vec<Article> {
    let feed_title = root
        .child_text("title")
        .unwrap_or_else(|| source_url.to_string());

    root.find_all("entry")
        .into_iter()
        .map(|entry| {
            let link = entry
                .find_where(|el| el.name == "link" && el.attr("rel") == Some("alternate"))
                .or_else(|| entry.find("link"))
                .and_then(|el| el.attr("href"))
                .filter(|href| !href.trim().is_empty())
                .map(|href| href.trim().to_string());
            let raw_description = entry.find_text("summary").unwrap_or_default();
            let raw_content = entry
                .find_text("content")
                .unwrap_or_else(|| raw_description.clone());
            let published = entry
                .find_text("published")
                .or_else(|| entry.find_text("updated"));
            let author = entry
                .find("author")
                .and_then(|author| author.find_text("name"))
                .unwrap_or_else(|| feed_title.clone());
            let categories = entry
                .find_all("category")
                .into_iter()
                .filter_map(|c| c.attr("term"))
                .filter(|term| !term.trim().is_empty())
                .map(|term| term.trim().to_string())
                .collect();

            build_article(
                Entry {
                    title: entry.find_text("title"),
                    link,
                    raw_description,
                    raw_content,
                    published,
                    author,
                    categories,
                    image: element_image(entry),
                },
                source_url,
                &feed_title,
                now,
            )
        })
        .collect()
}

struct Entry {
    title: Option<String>,
    link: Option<String>,
    raw_description: String,
    raw_content: String,
    published: Option<String>,
    author: String,
    categories: Vec<String>,
    image: Option<String>,
}

fn build_article(entry: Entry, feed_url: &str, feed_title: &str, now: DateTime<Utc>) -> Article {
    let title = entry.title.unwrap_or_else(|| UNTITLED.to_string());
    let id = article_id(entry.link.as_deref().unwrap_or(&title));
    let image = entry.image.or_else(|| first_image(&entry.raw_content));

    Article {
        id,
        title,
        link: entry.link,
        description: clip(&sanitize(&entry.raw_description), DESCRIPTION_LIMIT).to_string(),
        content: sanitize(&entry.raw_content),
        published_at: entry
            .published
            .as_deref()
            .and_then(parse_date)
            .unwrap_or(now),
        author: entry.author,
        categories: entry.categories,
        image,
        feed_url: feed_url.to_string(),
        feed_title: feed_title.to_string(),
        fetched_at: now,
        topic: None,
        summary: None,
    }
}

/// `media:content@url`, then an image `enclosure@url`.
fn element_image(item: &Element) -> Option<String> {
    let media = item
        .find("media:content")
        .and_then(|el| el.attr("url"))
        .filter(|url| !url.is_empty());
    let enclosure = || {
        item.find_where(|el| {
            el.name == "enclosure"
                && el.attr("type").map_or(false, |t| t.starts_with("image"))
                && el.attr("url").map_or(false, |u| !u.is_empty())
        })
        .and_then(|el| el.attr("url"))
    };
    media.or_else(enclosure).map(str::to_string)
}

/// `news_` followed by the hex of the first 8 bytes of SHA-256(`key`).
pub fn article_id(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    let hex: String = digest[..8].iter().map(|b| format!("{:02x}", b)).collect();
    format!("news_{}", hex)
}

/// Lenient date parsing. `None` means the caller substitutes the ingestion
/// time.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(date) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(date.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}
