use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::content::model::{Article, ArticleSlug};

const SAFE_QUERY_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Errors surfaced by the content API and auth provider.
///
/// Every variant is caught at the action boundary and converted into a
/// `{success, error}`-shaped result; none of them propagate as panics.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request never completed (DNS, TLS, connection reset).
    #[error("content api transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("content api rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The service answered 2xx but the body was not the expected shape.
    #[error("content api returned an unexpected body: {0}")]
    BadResponse(String),
}

/// Thin client over the PostgREST-style content API and its auth endpoint.
/// The relational database itself, its constraints (slug uniqueness lives
/// there) and the session protocol are external collaborators.
#[derive(Debug, Clone)]
pub struct ContentStore {
    http: reqwest::Client,
    rest_url: String,
    auth_url: String,
    api_key: String,
}

/// Row shape for the `articles` insert. `published_at` is null for drafts.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleInsert {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub category_id: Option<i64>,
    pub published_at: Option<DateTime<Utc>>,
    pub read_time_minutes: u32,
}

/// Row shape for `contact_submissions`. `created_at` and `status` are
/// intentionally absent; the database assigns both.
#[derive(Debug, Clone, Serialize)]
pub struct ContactInsert {
    pub name: String,
    pub company: Option<String>,
    pub project_type: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct TagLink {
    article_id: i64,
    tag_id: i64,
}

#[derive(Debug, Deserialize)]
struct InsertedId {
    id: i64,
}

// Embedded-select row before flattening: categories(name), article_tags(tags(name)).
#[derive(Debug, Deserialize)]
struct ArticleRow {
    id: i64,
    title: String,
    slug: String,
    content: String,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    cover_image: Option<String>,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
    read_time_minutes: u32,
    #[serde(default)]
    categories: Option<NamedRow>,
    #[serde(default)]
    article_tags: Vec<TagRow>,
}

#[derive(Debug, Deserialize)]
struct NamedRow {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TagRow {
    tags: NamedRow,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            title: row.title,
            slug: row.slug,
            content: row.content,
            excerpt: row.excerpt,
            cover_image: row.cover_image,
            published_at: row.published_at,
            read_time_minutes: row.read_time_minutes,
            category_name: row.categories.map(|c| c.name),
            tag_names: row.article_tags.into_iter().map(|t| t.tags.name).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    access_token: String,
}

impl ContentStore {
    pub fn new(rest_url: &str, auth_url: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            rest_url: rest_url.trim_end_matches('/').to_string(),
            auth_url: auth_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn post(&self, table: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}/{table}", self.rest_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn get(&self, path_and_query: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}/{path_and_query}", self.rest_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn rejection(resp: reqwest::Response) -> StoreError {
        let status = resp.status().as_u16();
        let message = resp.text().await.unwrap_or_default();
        StoreError::Rejected { status, message }
    }

    /// Insert one article row and return its new id.
    pub async fn insert_article(&self, row: &ArticleInsert) -> Result<i64, StoreError> {
        let resp = self
            .post("articles")
            .query(&[("select", "id")])
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::rejection(resp).await);
        }
        let rows: Vec<InsertedId> = resp.json().await?;
        let first = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::BadResponse("insert returned no rows".into()))?;
        debug!(article_id = first.id, "article row inserted");
        Ok(first.id)
    }

    /// Bulk-insert the join rows linking an article to its tags.
    pub async fn link_tags(&self, article_id: i64, tag_ids: &[i64]) -> Result<(), StoreError> {
        let links: Vec<TagLink> = tag_ids
            .iter()
            .map(|&tag_id| TagLink { article_id, tag_id })
            .collect();
        let resp = self.post("article_tags").json(&links).send().await?;
        if !resp.status().is_success() {
            return Err(Self::rejection(resp).await);
        }
        Ok(())
    }

    /// Fetch one article by slug with its category name and tag names
    /// flattened. `None` when no row matches.
    pub async fn article_by_slug(&self, slug: &str) -> Result<Option<Article>, StoreError> {
        let encoded = utf8_percent_encode(slug, SAFE_QUERY_SEGMENT);
        let query = format!(
            "articles?slug=eq.{encoded}&select=*,categories(name),article_tags(tags(name))"
        );
        let resp = self.get(&query).send().await?;
        if !resp.status().is_success() {
            return Err(Self::rejection(resp).await);
        }
        let rows: Vec<ArticleRow> = resp.json().await?;
        Ok(rows.into_iter().next().map(Article::from))
    }

    /// Slug + publish timestamp for every article, for the sitemap.
    pub async fn article_slugs(&self) -> Result<Vec<ArticleSlug>, StoreError> {
        let resp = self.get("articles?select=slug,published_at").send().await?;
        if !resp.status().is_success() {
            return Err(Self::rejection(resp).await);
        }
        Ok(resp.json().await?)
    }

    /// Persist a contact submission. The database assigns `created_at` and
    /// defaults `status`.
    pub async fn insert_contact(&self, row: &ContactInsert) -> Result<(), StoreError> {
        let resp = self.post("contact_submissions").json(row).send().await?;
        if !resp.status().is_success() {
            return Err(Self::rejection(resp).await);
        }
        Ok(())
    }

    /// Exchange an authorization code for a session token at the auth
    /// provider.
    pub async fn exchange_code(&self, code: &str) -> Result<String, StoreError> {
        let resp = self
            .http
            .post(format!(
                "{}/token?grant_type=authorization_code",
                self.auth_url
            ))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "auth_code": code }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::rejection(resp).await);
        }
        let session: SessionResponse = resp.json().await?;
        Ok(session.access_token)
    }
}
