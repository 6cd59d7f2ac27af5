use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, get_service, post},
    Form, Json, Router,
};
use serde::Deserialize;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{error, info, warn};

use crate::blog_index::{BlogIndex, BlogQuery, PostFilter};
use crate::content_loader::load_content_item;
use crate::content_store::Slug;
use crate::error::ContentError;
use crate::hot_reload::ws_handler;
use crate::markdown::render_markdown_to_html;
use crate::models::{ContentItem, PostSummary};
use crate::notifier::NotifyKind;
use crate::render::{
    render_blog_index, render_contact_result, render_not_found, render_post_body, render_with_layout,
};
use crate::state::{AppState, RouterState};

pub fn router(router_state: RouterState) -> Router {
    let static_dir = router_state.app_state.config.static_dir();
    let favicon_ico = get_service(ServeFile::new(static_dir.join("favicon.ico")));
    let favicon_png = get_service(ServeFile::new(static_dir.join("favicon.png")));

    let mut app = Router::new()
        .route("/", get(homepage))
        .route("/blog", get(blog_index))
        .route("/blog/{slug}", get(render_post))
        .route("/posts/{slug}", get(render_post))
        .route("/api/posts", get(api_posts))
        .route("/api/posts/{slug}", get(api_post))
        .route("/contact", post(contact))
        .nest_service("/static", get_service(ServeDir::new(static_dir)))
        .route_service("/favicon.ico", favicon_ico)
        .route_service("/favicon.png", favicon_png);

    if router_state.app_state.config.is_development {
        app = app.route("/ws", get(ws_handler));
    }

    app.with_state(router_state)
}

async fn homepage(State(state): State<Arc<AppState>>) -> Html<String> {
    let site = state.site.read().await;
    Html(render_with_layout(
        &site,
        &state.config.title,
        &site.home_html,
        state.config.is_development,
    ))
}

async fn blog_index(
    Query(query): Query<BlogQuery>,
    State(state): State<Arc<AppState>>,
) -> Html<String> {
    let filter = PostFilter::from(query);
    let site = state.site.read().await;
    let body = render_blog_index(&BlogIndex::new(&site.posts), &filter);
    Html(render_with_layout(&site, "Blog", &body, state.config.is_development))
}

async fn not_found_page(state: &AppState, slug: &str, status: StatusCode) -> Response {
    let site = state.site.read().await;
    let body = render_not_found(&site, slug);
    let page = render_with_layout(&site, "Not found", &body, state.config.is_development);
    (status, Html(page)).into_response()
}

async fn render_post(
    Path(slug): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let item = match Slug::parse(&slug) {
        Ok(slug) => load_content_item(&state.store, &slug).await,
        Err(e) => Err(e),
    };

    match item {
        Ok(item) => {
            let body_html = render_markdown_to_html(&item.body, &state.style_rules);
            let body = render_post_body(&item, &body_html);
            let site = state.site.read().await;
            Html(render_with_layout(&site, &item.title, &body, state.config.is_development)).into_response()
        }
        Err(e) if e.is_not_found() => {
            info!("Post not found: {}", slug);
            not_found_page(&state, &slug, StatusCode::NOT_FOUND).await
        }
        Err(e) => {
            error!("Failed to load post {}: {}", slug, e);
            not_found_page(&state, &slug, StatusCode::INTERNAL_SERVER_ERROR).await
        }
    }
}

impl IntoResponse for ContentError {
    fn into_response(self) -> Response {
        let status = if self.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            error!("Content error: {}", self);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

async fn api_posts(State(state): State<Arc<AppState>>) -> Json<Vec<PostSummary>> {
    Json(state.site.read().await.posts.clone())
}

async fn api_post(
    Path(slug): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ContentItem>, ContentError> {
    let slug = Slug::parse(&slug)?;
    let item = load_content_item(&state.store, &slug).await?;
    Ok(Json(item))
}

/// Missing fields deserialize as empty so `validate` reports them.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("Please tell me your name.");
        }
        if !self.email.trim().contains('@') {
            return Err("Please provide a valid email address.");
        }
        if self.message.trim().is_empty() {
            return Err("Please write a message.");
        }
        Ok(())
    }
}

async fn contact(State(state): State<Arc<AppState>>, Form(form): Form<ContactForm>) -> Response {
    let is_development = state.config.is_development;

    if let Err(reason) = form.validate() {
        let site = state.site.read().await;
        let page = render_with_layout(&site, "Contact", &render_contact_result(reason, false), is_development);
        return (StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response();
    }

    let message = format!(
        "Contact message from {} <{}>:\n{}",
        form.name.trim(),
        form.email.trim(),
        form.message.trim()
    );
    if let Err(e) = state.notifier.notify(NotifyKind::Success, &message).await {
        warn!("Contact notification failed: {}", e);
    }

    let site = state.site.read().await;
    let body = render_contact_result(
        "Message Sent! Thank you for your message. I will get back to you soon.",
        true,
    );
    Html(render_with_layout(&site, "Contact", &body, is_development)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::markdown::StyleRules;
    use crate::notifier::Notifier;
    use crate::state::tests::test_site;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use tempfile::TempDir;
    use tokio::sync::broadcast;
    use tower::ServiceExt;

    async fn app_with_posts(posts: &[(&str, &str)]) -> (Router, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let posts_dir = dir.path().join("posts");
        tokio::fs::create_dir_all(&posts_dir).await.unwrap();
        for (slug, text) in posts {
            tokio::fs::write(posts_dir.join(format!("{slug}.md")), text).await.unwrap();
        }

        let config = SiteConfig {
            content_dir: dir.path().to_path_buf(),
            ..SiteConfig::default()
        };
        let state = AppState::new(config, StyleRules::portfolio(), Notifier::Log, test_site(Vec::new()));
        let (tx, _rx) = broadcast::channel(1);
        let app = router(RouterState {
            app_state: Arc::new(state),
            broadcaster: tx,
        });
        (app, dir)
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn renders_post_page() {
        let (app, _dir) = app_with_posts(&[(
            "hello",
            "---\ntitle: Hello\ntags: [A, B]\ndate: 2025-7-13\n---\n# Hi there\n",
        )])
        .await;

        let response = app.oneshot(get_request("/blog/hello")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("<title>Hello</title>"));
        assert!(body.contains("July 13, 2025"));
        assert!(body.contains("<h1 class=\"text-3xl font-bold mt-8 mb-4\">Hi there</h1>"));
    }

    #[tokio::test]
    async fn missing_post_is_404_with_not_found_view() {
        let (app, _dir) = app_with_posts(&[]).await;

        let response = app.clone().oneshot(get_request("/blog/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_string(response).await.contains("No post called nope"));

        let response = app.oneshot(get_request("/blog/..%2Fsecret")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn api_returns_parsed_item_as_json() {
        let (app, _dir) = app_with_posts(&[("p", "---\nread_time: 8\n---\nBody")]).await;

        let response = app.clone().oneshot(get_request("/api/posts/p")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["title"], "Untitled");
        assert_eq!(json["readTime"], "8 min read");
        assert_eq!(json["body"], "Body");

        let response = app.oneshot(get_request("/api/posts/q")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn contact_form_validates_input() {
        let (app, _dir) = app_with_posts(&[]).await;
        let form = |body: &str| {
            Request::builder()
                .method("POST")
                .uri("/contact")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap()
        };

        let response = app
            .clone()
            .oneshot(form("name=Ada&email=ada%40example.com&message=Hello"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("Message Sent!"));

        let response = app
            .oneshot(form("name=Ada&email=nope&message=Hello"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn contact_form_missing_field_gets_validation_page() {
        let (app, _dir) = app_with_posts(&[]).await;
        let request = Request::builder()
            .method("POST")
            .uri("/contact")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("name=Ada&email=ada%40example.com"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_string(response).await;
        assert!(body.contains("Please write a message."));
        assert!(body.contains("<title>Contact</title>"));
    }

    #[test]
    fn contact_form_rejects_blank_fields() {
        let form = ContactForm {
            name: "  ".to_string(),
            email: "a@b.c".to_string(),
            message: "hi".to_string(),
        };
        assert!(form.validate().is_err());
    }
}
