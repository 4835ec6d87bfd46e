use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::content::model::{ContactMessage, NewArticle, read_time_minutes};
use crate::content::store::{ArticleInsert, ContactInsert, ContentStore, StoreError};
use crate::content::validate::{CONTACT_SCHEMA, check};

/// User-facing strings. The contact-form copy is shown verbatim in the UI
/// and matched by the client, so it stays byte-for-byte stable.
pub const CONTACT_INVALID: &str = "数据格式验证失败";
pub const CONTACT_REJECTED: &str = "提交失败，数据库拒绝写入";
pub const CONTACT_SERVER_ERROR: &str = "服务器内部错误";
pub const TAGS_FAILED: &str = "Article created but tags failed to link.";

/// `{success, error}`-shaped result every form action resolves to.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ActionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum CreateArticleError {
    /// The article row itself was rejected; nothing was written.
    #[error("{0}")]
    Insert(String),

    /// The article row exists but the tag links failed. There is no
    /// rollback; the row stays queryable by slug.
    #[error("{TAGS_FAILED}")]
    TagsFailed { article_id: i64 },
}

#[derive(Debug, Clone)]
pub struct CreatedArticle {
    pub id: i64,
    pub published_at: Option<DateTime<Utc>>,
    /// Public path to redirect to, set only for published articles.
    pub redirect: Option<String>,
}

/// Create an article plus its tag links.
///
/// Two dependent writes with no transaction around them: the content API is
/// consumed row-by-row, so a tag-link failure leaves the article row in
/// place and returns the partial-failure error instead of compensating.
pub async fn create_article(
    store: &ContentStore,
    new: &NewArticle,
    now: DateTime<Utc>,
) -> Result<CreatedArticle, CreateArticleError> {
    let published_at = new.published.then_some(now);
    let row = ArticleInsert {
        title: new.title.clone(),
        slug: new.slug.clone(),
        content: new.content.clone(),
        excerpt: new.excerpt.clone(),
        cover_image: new.cover_image.clone(),
        category_id: new.category_id,
        published_at,
        read_time_minutes: read_time_minutes(&new.content),
    };

    let article_id = match store.insert_article(&row).await {
        Ok(id) => id,
        Err(err) => {
            error!(slug = %new.slug, %err, "article insert rejected");
            return Err(CreateArticleError::Insert(err.to_string()));
        }
    };

    if !new.tags.is_empty() {
        if let Err(err) = store.link_tags(article_id, &new.tags).await {
            error!(article_id, %err, "tag linking failed after article insert");
            return Err(CreateArticleError::TagsFailed { article_id });
        }
    }

    info!(article_id, slug = %new.slug, published = new.published, "article created");
    Ok(CreatedArticle {
        id: article_id,
        published_at,
        redirect: new.published.then(|| format!("/blog/{}", new.slug)),
    })
}

/// Validate and persist a contact submission.
///
/// Validation failures never reach the store; storage failures are folded
/// into the fixed user-facing strings. No retry in either case.
pub async fn submit_contact(store: &ContentStore, payload: &serde_json::Value) -> ActionResult {
    let failed = check(CONTACT_SCHEMA, payload);
    if !failed.is_empty() {
        info!(fields = ?failed, "contact submission failed validation");
        return ActionResult::err(CONTACT_INVALID);
    }

    let form: ContactMessage = match serde_json::from_value(payload.clone()) {
        Ok(form) => form,
        Err(err) => {
            error!(%err, "contact payload failed to deserialize after validation");
            return ActionResult::err(CONTACT_INVALID);
        }
    };

    let row = ContactInsert {
        name: form.name,
        company: form.company.filter(|c| !c.is_empty()),
        project_type: form.project_type,
        email: form.email,
        message: form.message,
    };

    match store.insert_contact(&row).await {
        Ok(()) => ActionResult::ok(),
        Err(StoreError::Rejected { status, message }) => {
            error!(status, %message, "contact submission rejected by store");
            ActionResult::err(CONTACT_REJECTED)
        }
        Err(err) => {
            error!(%err, "contact submission failed");
            ActionResult::err(CONTACT_SERVER_ERROR)
        }
    }
}
