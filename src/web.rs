use std::collections::HashMap;
use std::fmt::Write as _;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::SiteConfig;
use crate::content::actions::{self, ActionResult};
use crate::content::model::NewArticle;
use crate::content::store::ContentStore;

const SESSION_COOKIE: &str = "dada_session";

/// Rendered pages considered fresh for a bounded window, then revalidated.
/// Article creation invalidates the blog list eagerly.
#[derive(Clone)]
pub struct PageCache {
    ttl: Duration,
    pages: Arc<Mutex<HashMap<String, (String, Instant)>>>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pages: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn fresh(&self, path: &str) -> Option<String> {
        let pages = self.pages.lock().await;
        let (body, rendered_at) = pages.get(path)?;
        (rendered_at.elapsed() < self.ttl).then(|| body.clone())
    }

    pub async fn store(&self, path: &str, body: String) {
        self.pages
            .lock()
            .await
            .insert(path.to_string(), (body, Instant::now()));
    }

    pub async fn invalidate(&self, path: &str) {
        self.pages.lock().await.remove(path);
    }
}

#[derive(Clone)]
pub struct AppState {
    store: ContentStore,
    base_url: String,
    ttl_secs: u64,
    cache: PageCache,
}

impl AppState {
    pub fn new(store: ContentStore, site: &SiteConfig) -> Self {
        Self {
            store,
            base_url: site.base_url.clone(),
            ttl_secs: site.page_ttl_secs,
            cache: PageCache::new(Duration::from_secs(site.page_ttl_secs)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home_page))
        .route("/blog", get(blog_index))
        .route("/blog/:slug", get(blog_article))
        .route("/contact", post(submit_contact))
        .route("/admin/articles", post(create_article))
        .route("/auth/callback", get(auth_callback))
        .route("/login", get(login_page))
        .route("/sitemap.xml", get(sitemap))
        .route("/robots.txt", get(robots))
        .with_state(state)
}

/// Bind and serve until the cancel token fires.
pub fn spawn(state: AppState, cancel: CancellationToken, bind_addr: SocketAddr) -> JoinHandle<()> {
    let app = router(state);
    tokio::spawn(async move {
        tracing::info!(%bind_addr, "starting site web server");
        match TcpListener::bind(bind_addr).await {
            Ok(listener) => {
                let shutdown = cancel.clone();
                if let Err(err) = axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        shutdown.cancelled().await;
                    })
                    .await
                {
                    tracing::error!(error = %err, "site web server failed");
                }
            }
            Err(err) => {
                tracing::error!(error = %err, %bind_addr, "failed to bind site web server");
            }
        }
    })
}

fn layout(body: &str) -> String {
    format!(
        "<!doctype html><html lang=\"zh-CN\"><head><meta charset=\"utf-8\">\
         <title>哒哒工作室</title></head>\
         <body>{body}</body></html>"
    )
}

async fn home_page() -> Html<String> {
    Html(layout(
        "<h1>哒哒工作室</h1>\
         <p>高端商业网站建设 · Next-level web experiences.</p>\
         <nav><a href=\"/blog\">Blog</a> <a href=\"/sitemap.xml\">Sitemap</a></nav>",
    ))
}

async fn login_page(Query(params): Query<HashMap<String, String>>) -> Html<String> {
    let body = match params.get("error").map(String::as_str) {
        Some("auth-code-error") => {
            "<h1>登录失败</h1><p>授权码无效，请重新登录。</p>".to_string()
        }
        _ => "<h1>登录</h1><p>请通过管理入口登录。</p>".to_string(),
    };
    Html(layout(&body))
}

fn page_response(ttl_secs: u64, body: String) -> Response {
    (
        [(
            header::CACHE_CONTROL,
            format!("s-maxage={ttl_secs}, stale-while-revalidate"),
        )],
        Html(body),
    )
        .into_response()
}

async fn blog_index(State(state): State<AppState>) -> Response {
    if let Some(body) = state.cache.fresh("/blog").await {
        return page_response(state.ttl_secs, body);
    }
    let slugs = match state.store.article_slugs().await {
        Ok(slugs) => slugs,
        Err(err) => {
            tracing::error!(%err, "blog index fetch failed");
            return (
                StatusCode::BAD_GATEWAY,
                Html(layout("<p>文章列表暂时不可用</p>")),
            )
                .into_response();
        }
    };
    let mut list = String::new();
    for entry in slugs.iter().filter(|s| s.published_at.is_some()) {
        let _ = write!(
            list,
            "<li><a href=\"/blog/{slug}\">{slug}</a></li>",
            slug = entry.slug
        );
    }
    let body = layout(&format!(
        "<h1>Insights &amp; Engineering</h1><ul>{list}</ul>"
    ));
    state.cache.store("/blog", body.clone()).await;
    page_response(state.ttl_secs, body)
}

async fn blog_article(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let cache_key = format!("/blog/{slug}");
    if let Some(body) = state.cache.fresh(&cache_key).await {
        return page_response(state.ttl_secs, body);
    }
    match state.store.article_by_slug(&slug).await {
        Ok(Some(article)) => {
            let tags = article
                .tag_names
                .iter()
                .map(|t| format!("<span>#{t}</span>"))
                .collect::<String>();
            let published = article
                .published_at
                .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_else(|| "草稿".to_string());
            let body = layout(&format!(
                "<article><h1>{title}</h1>\
                 <p>{category} · {published} · {read_time} min read</p>\
                 <div>{content}</div><footer>{tags}</footer></article>",
                title = article.title,
                category = article.category_name.as_deref().unwrap_or("未分类"),
                read_time = article.read_time_minutes,
                content = article.content,
            ));
            state.cache.store(&cache_key, body.clone()).await;
            page_response(state.ttl_secs, body)
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Html(layout("<h1>404</h1><p>文章不存在</p>")),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(%err, slug, "article fetch failed");
            (
                StatusCode::BAD_GATEWAY,
                Html(layout("<p>文章暂时不可用</p>")),
            )
                .into_response()
        }
    }
}

async fn submit_contact(
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> Json<ActionResult> {
    Json(actions::submit_contact(&state.store, &payload).await)
}

fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|cookies| {
            cookies
                .split(';')
                .any(|c| c.trim_start().starts_with(&format!("{SESSION_COOKIE}=")))
        })
}

async fn create_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(new): Json<NewArticle>,
) -> Response {
    if !has_session(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(ActionResult::err("未登录"))).into_response();
    }

    match actions::create_article(&state.store, &new, Utc::now()).await {
        Ok(created) => {
            // The list page is stale the moment a new article exists.
            state.cache.invalidate("/blog").await;
            match created.redirect {
                Some(path) => Redirect::to(&path).into_response(),
                None => Json(ActionResult::ok()).into_response(),
            }
        }
        // Both failure modes surface as `{success, error}` with their fixed
        // message; the partial-failure case intentionally leaves the
        // article row behind (see DESIGN.md).
        Err(err) => Json(ActionResult::err(err.to_string())).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    next: Option<String>,
}

async fn auth_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let Some(code) = params.code else {
        return Redirect::to("/login?error=auth-code-error").into_response();
    };
    match state.store.exchange_code(&code).await {
        Ok(token) => {
            let next = params.next.as_deref().unwrap_or("/admin/create");
            let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
            (
                [(header::SET_COOKIE, cookie)],
                Redirect::to(next),
            )
                .into_response()
        }
        Err(err) => {
            tracing::warn!(%err, "auth code exchange failed");
            Redirect::to("/login?error=auth-code-error").into_response()
        }
    }
}

struct SitemapEntry<'a> {
    path: String,
    lastmod: String,
    changefreq: &'a str,
    priority: &'a str,
}

async fn sitemap(State(state): State<AppState>) -> Response {
    let today = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut entries = vec![
        SitemapEntry {
            path: String::new(),
            lastmod: today.clone(),
            changefreq: "daily",
            priority: "1.0",
        },
        SitemapEntry {
            path: "/about".into(),
            lastmod: today.clone(),
            changefreq: "monthly",
            priority: "0.8",
        },
        SitemapEntry {
            path: "/blog".into(),
            lastmod: today.clone(),
            changefreq: "daily",
            priority: "0.7",
        },
        SitemapEntry {
            path: "/contact".into(),
            lastmod: today.clone(),
            changefreq: "yearly",
            priority: "0.5",
        },
    ];

    match state.store.article_slugs().await {
        Ok(slugs) => {
            for entry in slugs {
                // Drafts have no public URL yet.
                let Some(published_at) = entry.published_at else {
                    continue;
                };
                entries.push(SitemapEntry {
                    path: format!("/blog/{}", entry.slug),
                    lastmod: published_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                    changefreq: "weekly",
                    priority: "0.6",
                });
            }
        }
        Err(err) => {
            tracing::error!(%err, "sitemap article fetch failed");
            return StatusCode::BAD_GATEWAY.into_response();
        }
    }

    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">",
    );
    for e in &entries {
        let _ = write!(
            xml,
            "<url><loc>{base}{path}</loc><lastmod>{lastmod}</lastmod>\
             <changefreq>{freq}</changefreq><priority>{prio}</priority></url>",
            base = state.base_url,
            path = e.path,
            lastmod = e.lastmod,
            freq = e.changefreq,
            prio = e.priority,
        );
    }
    xml.push_str("</urlset>");

    ([(header::CONTENT_TYPE, "application/xml")], xml).into_response()
}

async fn robots(State(state): State<AppState>) -> Response {
    let mut body = String::new();
    let _ = writeln!(body, "User-agent: *");
    let _ = writeln!(body, "Allow: /");
    for path in ["/api/", "/admin/", "/_next/", "/static/", "/private/"] {
        let _ = writeln!(body, "Disallow: {path}");
    }
    for agent in ["Googlebot", "Baiduspider", "bingbot"] {
        let _ = writeln!(body);
        let _ = writeln!(body, "User-agent: {agent}");
        let _ = writeln!(body, "Allow: /");
        for path in ["/api/", "/admin/", "/private/"] {
            let _ = writeln!(body, "Disallow: {path}");
        }
    }
    let _ = writeln!(body);
    let _ = writeln!(body, "Sitemap: {}/sitemap.xml", state.base_url);
    let _ = writeln!(body, "Host: {}", state.base_url);
    ([(header::CONTENT_TYPE, "text/plain")], body).into_response()
}
