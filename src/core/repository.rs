use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use gray_matter::engine::YAML;
use gray_matter::Matter;
use rayon::prelude::*;
use serde::Deserialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::models::blocks::StreamBlock;
use crate::models::{Author, Category, GalleryImage, ListingPage, Post, PostKind, Tag};
use crate::utils::markdown;

/// 页面仓库接口
/// 查询解析器只依赖这个接口，不关心页面实际存放在哪里
pub trait PageRepository: Send + Sync {
    /// 按 slug 查找列表页
    fn find_listing(&self, slug: &str) -> Option<ListingPage>;

    /// 所有列表页
    fn listings(&self) -> Vec<ListingPage>;

    /// 查找某列表页下的某篇文章（包含草稿）
    fn find_post(&self, parent: &str, slug: &str) -> Option<Post>;

    /// 某列表页下所有已发布的直接子文章，保持载入顺序
    fn find_published_children(&self, parent: &str) -> Vec<Post>;

    /// 带有某标签的所有已发布文章（标签精确匹配，区分大小写）
    fn find_by_tag(&self, label: &str) -> Vec<Post>;

    /// 某作者的所有已发布文章
    fn find_by_author(&self, username: &str) -> Vec<Post>;

    /// 按用户名查找作者
    fn find_author(&self, username: &str) -> Option<Author>;

    /// 标签列表（按名称排序）
    fn tags(&self) -> Vec<Tag>;

    /// 分类列表
    fn categories(&self) -> Vec<Category>;
}

/// 文章的 Front Matter 结构
#[derive(Debug, Deserialize)]
struct PostFrontMatter {
    title: Option<String>,
    date: Option<String>,
    #[serde(default = "default_published")]
    published: bool,
    intro: Option<String>,
    layout: Option<String>,
    author: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    gallery: Vec<GalleryImage>,
    #[serde(default)]
    blocks: Vec<StreamBlock>,
}

fn default_published() -> bool {
    true
}

/// 列表页的 Front Matter 结构
#[derive(Debug, Deserialize)]
struct ListingFrontMatter {
    title: Option<String>,
}

/// 基于内容目录的仓库实现
///
/// 内容目录的每个子目录是一个列表页（由 _index.md 描述），
/// 目录下的 Markdown 文件是它的直接子文章。作者和分类注册表
/// 从站点根目录的 authors.yml / categories.yml 加载。
#[derive(Debug, Clone, Default)]
pub struct ContentRepository {
    /// 所有列表页
    listings: Vec<ListingPage>,
    /// 所有文章（含草稿）
    posts: Vec<Post>,
    /// 作者注册表
    authors: Vec<Author>,
    /// 分类注册表
    categories: Vec<Category>,
    /// 标签列表，载入时从已发布文章推导
    tags: Vec<Tag>,
}

impl ContentRepository {
    /// 创建一个空仓库
    pub fn empty() -> Self {
        Self::default()
    }

    /// 从站点目录加载内容
    pub fn load(base_dir: &Path, source_dir: &Path) -> Result<Self> {
        info!("从 {} 加载内容", source_dir.display());

        let authors = load_registry::<Author>(&base_dir.join("authors.yml"))?;
        let mut categories = load_registry::<Category>(&base_dir.join("categories.yml"))?;

        let mut listings = Vec::new();
        let mut post_files: Vec<(String, PathBuf)> = Vec::new();

        if source_dir.exists() {
            // 每个含 _index.md 的子目录是一个列表页
            let mut entries: Vec<PathBuf> = fs::read_dir(source_dir)?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_dir())
                .collect();
            entries.sort();

            for dir in entries {
                let index_path = dir.join("_index.md");
                if !index_path.exists() {
                    debug!("目录 {} 没有 _index.md，跳过", dir.display());
                    continue;
                }

                let listing = load_listing(&dir, &index_path)?;
                collect_post_files(&listing.slug, &dir, &mut post_files);
                listings.push(listing);
            }
        } else {
            warn!("内容目录不存在: {}", source_dir.display());
        }

        // 解析所有文章文件
        let parsed: Vec<Result<Post>> = post_files
            .par_iter()
            .map(|(parent, path)| {
                load_post(parent, path)
                    .with_context(|| format!("解析文章失败: {}", path.display()))
            })
            .collect();

        let mut posts = Vec::new();
        for result in parsed {
            match result {
                Ok(post) => posts.push(post),
                Err(e) => warn!("{:#}", e),
            }
        }

        info!("加载了 {} 个列表页、{} 篇文章", listings.len(), posts.len());

        let tags = collect_tags(&posts);
        count_category_posts(&mut categories, &posts);

        Ok(Self {
            listings,
            posts,
            authors,
            categories,
            tags,
        })
    }
}

impl PageRepository for ContentRepository {
    fn find_listing(&self, slug: &str) -> Option<ListingPage> {
        self.listings.iter().find(|l| l.slug == slug).cloned()
    }

    fn listings(&self) -> Vec<ListingPage> {
        self.listings.clone()
    }

    fn find_post(&self, parent: &str, slug: &str) -> Option<Post> {
        self.posts
            .iter()
            .find(|p| p.parent == parent && p.slug == slug)
            .cloned()
    }

    fn find_published_children(&self, parent: &str) -> Vec<Post> {
        self.posts
            .iter()
            .filter(|p| p.parent == parent && p.published)
            .cloned()
            .collect()
    }

    fn find_by_tag(&self, label: &str) -> Vec<Post> {
        self.posts
            .iter()
            .filter(|p| p.published && p.tags.iter().any(|t| t == label))
            .cloned()
            .collect()
    }

    fn find_by_author(&self, username: &str) -> Vec<Post> {
        self.posts
            .iter()
            .filter(|p| p.published && p.author.as_deref() == Some(username))
            .cloned()
            .collect()
    }

    fn find_author(&self, username: &str) -> Option<Author> {
        self.authors.iter().find(|a| a.username == username).cloned()
    }

    fn tags(&self) -> Vec<Tag> {
        self.tags.clone()
    }

    fn categories(&self) -> Vec<Category> {
        self.categories.clone()
    }
}

/// 从 YAML 文件加载注册表，文件不存在时返回空表
fn load_registry<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        debug!("注册表文件不存在: {}", path.display());
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("读取注册表失败: {}", path.display()))?;
    let entries: Vec<T> = serde_yaml::from_str(&content)
        .with_context(|| format!("解析注册表失败: {}", path.display()))?;
    Ok(entries)
}

/// 加载一个列表页
fn load_listing(dir: &Path, index_path: &Path) -> Result<ListingPage> {
    let slug = dir
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string();

    let content = fs::read_to_string(index_path)
        .with_context(|| format!("读取列表页失败: {}", index_path.display()))?;

    let matter = Matter::<YAML>::new();
    let (title, intro) = match matter.parse_with_struct::<ListingFrontMatter>(&content) {
        Some(parsed) => (parsed.data.title, parsed.content),
        None => (None, content),
    };

    let title = title.unwrap_or_else(|| slug.clone());
    let rendered_intro = markdown::render(&intro)?;

    Ok(ListingPage {
        slug,
        title,
        intro,
        rendered_intro,
        source: index_path.to_path_buf(),
    })
}

/// 收集列表页目录下的文章文件，按文件名排序保证载入顺序稳定
fn collect_post_files(parent: &str, dir: &Path, out: &mut Vec<(String, PathBuf)>) {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.is_file()
                && path.extension().and_then(|s| s.to_str()) == Some("md")
                && path.file_name().and_then(|s| s.to_str()) != Some("_index.md")
        })
        .collect();
    files.sort();

    for file in files {
        out.push((parent.to_string(), file));
    }
}

/// 加载一篇文章
fn load_post(parent: &str, path: &Path) -> Result<Post> {
    let content = fs::read_to_string(path)?;

    let matter = Matter::<YAML>::new();
    let parsed = matter
        .parse_with_struct::<PostFrontMatter>(&content)
        .ok_or_else(|| anyhow!("Front Matter 缺失或无法解析"))?;
    let front = parsed.data;

    let slug = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string();

    // 如果没有标题，使用文件名
    let title = front.title.unwrap_or_else(|| slug.clone());

    // 解析日期，没有日期时使用文件的修改时间
    let date = match front.date.as_deref() {
        Some(date_str) => parse_date(date_str).unwrap_or_else(|| {
            warn!("无法解析日期 {:?}，使用文件修改时间: {}", date_str, path.display());
            file_mtime(path)
        }),
        None => file_mtime(path),
    };

    let kind = match front.layout.as_deref() {
        Some("advanced") => PostKind::Advanced,
        _ => PostKind::Standard,
    };

    // 图库按显示顺序排好
    let mut gallery = front.gallery;
    gallery.sort_by_key(|item| item.order);

    let rendered_body = markdown::render(&parsed.content)?;

    Ok(Post {
        title,
        parent: parent.to_string(),
        slug,
        date,
        published: front.published,
        intro: front.intro.unwrap_or_default(),
        body: parsed.content,
        rendered_body,
        author: front.author,
        tags: front.tags,
        categories: front.categories,
        gallery,
        kind,
        blocks: front.blocks,
        source: path.to_path_buf(),
    })
}

/// 解析 Front Matter 中的日期
fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_str(date_str, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(date_str, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    if let Ok(d) = chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
    }
    None
}

/// 文件的修改时间
fn file_mtime(path: &Path) -> DateTime<Utc> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

/// 从已发布文章推导标签列表
fn collect_tags(posts: &[Post]) -> Vec<Tag> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for post in posts.iter().filter(|p| p.published) {
        for tag in &post.tags {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }

    let mut tags: Vec<Tag> = counts
        .into_iter()
        .map(|(name, post_count)| Tag {
            slug: slug::slugify(&name),
            name,
            post_count,
        })
        .collect();
    tags.sort_by(|a, b| a.name.cmp(&b.name));
    tags
}

/// 统计每个分类下的已发布文章数量
fn count_category_posts(categories: &mut [Category], posts: &[Post]) {
    for category in categories.iter_mut() {
        category.post_count = posts
            .iter()
            .filter(|p| p.published && p.categories.iter().any(|c| c == &category.slug))
            .count();
    }
}
