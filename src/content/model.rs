use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only lookup row, seeded outside the application.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Read-only lookup row, linked to articles through `article_tags`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Admin editor submission for a new article.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewArticle {
    pub title: String,
    pub slug: String,
    /// Rich-text HTML from the editor.
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub tags: Vec<i64>,
    /// Controls `published_at`: drafts get null.
    pub published: bool,
}

/// Article as read back from the content API, with the category name and
/// tag names already flattened.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    pub read_time_minutes: u32,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub tag_names: Vec<String>,
}

/// Sitemap row: slug plus publish timestamp.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArticleSlug {
    pub slug: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Contact form payload. `status` and `created_at` are assigned by the
/// storage layer and never supplied by the caller.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContactMessage {
    pub name: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(rename = "projectType")]
    pub project_type: String,
    pub email: String,
    pub message: String,
}

/// Word count at 200 words per minute, rounded up.
pub fn read_time_minutes(content: &str) -> u32 {
    let words = content.split_whitespace().count() as u32;
    words.div_ceil(200)
}
