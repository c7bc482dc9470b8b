use std::collections::HashSet;

use crate::core::error::QueryError;
use crate::core::repository::PageRepository;
use crate::models::{Author, ListingPage, Post, PostKind};

/// 文章查询条件，来自请求的查询参数
/// 除 tag 和 author 之外的参数不被识别
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    /// 标签过滤（精确匹配，区分大小写）
    pub tag: Option<String>,
    /// 作者过滤（用户名）
    pub author: Option<String>,
}

impl PostQuery {
    /// 构造查询条件，空字符串视为未提供该过滤维度
    pub fn new(tag: Option<String>, author: Option<String>) -> Self {
        Self {
            tag: tag.filter(|t| !t.is_empty()),
            author: author.filter(|a| !a.is_empty()),
        }
    }
}

/// 查询结果：普通文章和高级文章两个独立的序列
#[derive(Debug, Clone, Default)]
pub struct ResolvedPosts {
    /// 已发布的普通文章，最新的在前
    pub posts: Vec<Post>,
    /// 已发布的高级文章，最新的在前
    pub advanced_posts: Vec<Post>,
}

/// 解析一个列表页下的文章列表
///
/// 从列表页的已发布直接子文章出发，依次按标签和作者收窄，
/// 按发布时间倒序返回。普通文章和高级文章用同样的过滤条件
/// 各自独立解析。作者用户名不存在时返回 UnknownAuthor，
/// 这里不捕获，由调用方决定如何暴露。
pub fn resolve(
    repo: &dyn PageRepository,
    listing: &ListingPage,
    query: &PostQuery,
) -> Result<ResolvedPosts, QueryError> {
    // 作者过滤先把用户名解析成作者身份
    let author = match &query.author {
        Some(username) => Some(repo.find_author(username).ok_or_else(|| {
            QueryError::UnknownAuthor {
                username: username.clone(),
            }
        })?),
        None => None,
    };

    let posts = resolve_kind(repo, listing, query, author.as_ref(), PostKind::Standard);
    let advanced_posts = resolve_kind(repo, listing, query, author.as_ref(), PostKind::Advanced);

    Ok(ResolvedPosts {
        posts,
        advanced_posts,
    })
}

/// 对单个文章种类执行过滤和排序
fn resolve_kind(
    repo: &dyn PageRepository,
    listing: &ListingPage,
    query: &PostQuery,
    author: Option<&Author>,
    kind: PostKind,
) -> Vec<Post> {
    let mut posts: Vec<Post> = repo
        .find_published_children(&listing.slug)
        .into_iter()
        .filter(|p| p.kind == kind)
        .collect();

    // 标签过滤：与带该标签的文章集合求交集
    if let Some(label) = &query.tag {
        let tagged: HashSet<String> = repo.find_by_tag(label).iter().map(|p| p.path()).collect();
        posts.retain(|p| tagged.contains(&p.path()));
    }

    // 作者过滤：与该作者的文章集合求交集
    if let Some(author) = author {
        let authored: HashSet<String> = repo
            .find_by_author(&author.username)
            .iter()
            .map(|p| p.path())
            .collect();
        posts.retain(|p| authored.contains(&p.path()));
    }

    // 按发布时间倒序，稳定排序保证时间相同时保持载入顺序
    posts.sort_by(|a, b| b.date.cmp(&a.date));
    posts
}
