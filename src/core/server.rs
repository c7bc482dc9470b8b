use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tera::Context as TeraContext;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

use crate::core::error::QueryError;
use crate::core::repository::{ContentRepository, PageRepository};
use crate::core::resolver::{resolve, PostQuery, ResolvedPosts};
use crate::models::config::Config;
use crate::models::{ListingPage, Post, PostKind};
use crate::theme::renderer::ThemeRenderer;

/// 服务器共享状态
#[derive(Clone)]
pub struct AppState {
    /// 站点配置
    pub config: Config,
    /// 页面仓库
    pub repository: Arc<RwLock<ContentRepository>>,
    /// 主题渲染器
    pub renderer: Arc<ThemeRenderer>,
}

/// HTTP 服务器
pub struct Server {
    /// 共享状态
    state: AppState,
    /// 主题静态资源目录
    assets_dir: PathBuf,
    /// 端口
    port: u16,
}

impl Server {
    /// 创建新的服务器
    pub fn new(state: AppState, assets_dir: PathBuf, port: u16) -> Self {
        Self {
            state,
            assets_dir,
            port,
        }
    }

    /// 启动服务器
    pub async fn start(self) -> Result<()> {
        // 创建路由
        let app = Router::new()
            .route("/", get(index_handler))
            .route("/:listing", get(listing_handler))
            .route("/:listing/:post", get(post_handler))
            .nest_service("/assets", ServeDir::new(self.assets_dir.clone()))
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
            .with_state(self.state);

        // 启动HTTP服务器
        let addr: SocketAddr = format!("0.0.0.0:{}", self.port).parse()?;
        info!("Server started at http://localhost:{}", self.port);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// 列表页请求识别的查询参数，只有 tag 和 author
#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
    pub tag: Option<String>,
    pub author: Option<String>,
}

/// HTTP 层的错误包装
enum AppError {
    /// 页面不存在
    NotFound,
    /// 查询失败，按服务器错误暴露
    Query(QueryError),
    /// 其他内部错误
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found").into_response(),
            AppError::Query(e) => {
                error!("查询失败: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
            AppError::Internal(e) => {
                error!("内部错误: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

impl From<QueryError> for AppError {
    fn from(e: QueryError) -> Self {
        AppError::Query(e)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(e)
    }
}

/// 站点首页：列出所有列表页
async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let repo = state.repository.read().unwrap();

    let mut context = base_context(&state.config);
    context.insert("listings", &repo.listings());

    let html = state.renderer.render_template("index.html", &context)?;
    Ok(Html(html))
}

/// 列表页：已发布子文章按请求过滤后交给模板
async fn listing_handler(
    State(state): State<AppState>,
    Path(listing_slug): Path<String>,
    Query(params): Query<ListingParams>,
) -> Result<Html<String>, AppError> {
    let repo = state.repository.read().unwrap();
    let listing = repo.find_listing(&listing_slug).ok_or(AppError::NotFound)?;

    let query = PostQuery::new(params.tag, params.author);
    let resolved = resolve(&*repo, &listing, &query)?;

    let context = listing_context(&state.config, &*repo, &listing, &query, &resolved);
    let html = state.renderer.render_template("listing.html", &context)?;
    Ok(Html(html))
}

/// 文章详情页
async fn post_handler(
    State(state): State<AppState>,
    Path((listing_slug, post_slug)): Path<(String, String)>,
) -> Result<Html<String>, AppError> {
    let repo = state.repository.read().unwrap();
    let listing = repo.find_listing(&listing_slug).ok_or(AppError::NotFound)?;
    let post = repo
        .find_post(&listing_slug, &post_slug)
        .ok_or(AppError::NotFound)?;

    // 草稿不对外提供
    if !post.published {
        return Err(AppError::NotFound);
    }

    let context = post_context(&state.config, &*repo, &listing, &post);
    let template = match post.kind {
        PostKind::Standard => "post.html",
        PostKind::Advanced => "advanced_post.html",
    };

    let html = state.renderer.render_template(template, &context)?;
    Ok(Html(html))
}

/// 所有页面共享的基础上下文
fn base_context(config: &Config) -> TeraContext {
    let mut context = TeraContext::new();
    context.insert("site", config);
    context
}

/// 列表页的模板上下文
fn listing_context(
    config: &Config,
    repo: &dyn PageRepository,
    listing: &ListingPage,
    query: &PostQuery,
    resolved: &ResolvedPosts,
) -> TeraContext {
    let mut context = base_context(config);
    context.insert("listing", listing);
    context.insert("posts", &resolved.posts);
    context.insert("advanced_posts", &resolved.advanced_posts);
    context.insert("tags", &repo.tags());
    context.insert("categories", &repo.categories());
    context.insert("active_tag", &query.tag);
    context.insert("active_author", &query.author);
    context
}

/// 文章详情页的模板上下文
fn post_context(
    config: &Config,
    repo: &dyn PageRepository,
    listing: &ListingPage,
    post: &Post,
) -> TeraContext {
    let mut context = base_context(config);
    context.insert("listing", listing);
    context.insert("post", post);
    context.insert("main_image", &post.main_image());

    // 作者显示名称，详情页上未知作者按缺省处理
    let author = post.author.as_deref().and_then(|name| repo.find_author(name));
    context.insert("author", &author);

    // 文章引用的分类换成注册表里的完整条目
    let categories: Vec<_> = repo
        .categories()
        .into_iter()
        .filter(|c| post.categories.iter().any(|slug| slug == &c.slug))
        .collect();
    context.insert("categories", &categories);

    context
}
