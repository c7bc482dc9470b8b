// 查询解析器的行为测试，使用内存中的测试仓库
// 验证解析器只依赖仓库接口，不关心具体存储

use chrono::{DateTime, NaiveDate, Utc};
use std::path::PathBuf;

use rust_wagtail::core::repository::PageRepository;
use rust_wagtail::core::resolver::{resolve, PostQuery};
use rust_wagtail::core::QueryError;
use rust_wagtail::models::{Author, Category, GalleryImage, ListingPage, Post, PostKind, Tag};

/// 内存中的测试仓库
struct FixtureRepository {
    listing: ListingPage,
    posts: Vec<Post>,
    authors: Vec<Author>,
}

impl PageRepository for FixtureRepository {
    fn find_listing(&self, slug: &str) -> Option<ListingPage> {
        (self.listing.slug == slug).then(|| self.listing.clone())
    }

    fn listings(&self) -> Vec<ListingPage> {
        vec![self.listing.clone()]
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
        Vec::new()
    }

    fn categories(&self) -> Vec<Category> {
        Vec::new()
    }
}

fn listing(slug: &str) -> ListingPage {
    ListingPage {
        slug: slug.to_string(),
        title: slug.to_string(),
        intro: String::new(),
        rendered_intro: String::new(),
        source: PathBuf::new(),
    }
}

fn author(username: &str) -> Author {
    Author {
        username: username.to_string(),
        name: username.to_string(),
        email: None,
    }
}

fn date(s: &str) -> DateTime<Utc> {
    let d = NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
    DateTime::from_naive_utc_and_offset(d.and_hms_opt(0, 0, 0).unwrap(), Utc)
}

fn post(
    slug: &str,
    day: &str,
    published: bool,
    tags: &[&str],
    author: Option<&str>,
    kind: PostKind,
) -> Post {
    Post {
        title: slug.to_string(),
        parent: "blog".to_string(),
        slug: slug.to_string(),
        date: date(day),
        published,
        intro: String::new(),
        body: String::new(),
        rendered_body: String::new(),
        author: author.map(String::from),
        tags: tags.iter().map(|s| s.to_string()).collect(),
        categories: Vec::new(),
        gallery: Vec::new(),
        kind,
        blocks: Vec::new(),
        source: PathBuf::new(),
    }
}

/// 对应规格说明里的示例场景：P1/P2 已发布，P3 是草稿
fn scenario_repo() -> FixtureRepository {
    FixtureRepository {
        listing: listing("blog"),
        posts: vec![
            post("p1", "2023-01-01", true, &["go"], Some("alice"), PostKind::Standard),
            post("p2", "2023-02-01", true, &["go", "rust"], Some("bob"), PostKind::Standard),
            post("p3", "2023-03-01", false, &["go"], Some("alice"), PostKind::Standard),
        ],
        authors: vec![author("alice"), author("bob")],
    }
}

fn slugs(posts: &[Post]) -> Vec<&str> {
    posts.iter().map(|p| p.slug.as_str()).collect()
}

#[test]
fn test_resolve_returns_published_children_newest_first() {
    let repo = scenario_repo();
    let resolved = resolve(&repo, &repo.listing.clone(), &PostQuery::default()).unwrap();

    // 草稿 p3 不出现，其余按发布时间倒序
    assert_eq!(slugs(&resolved.posts), vec!["p2", "p1"]);
    assert!(resolved.advanced_posts.is_empty());
}

#[test]
fn test_resolve_tag_filter_narrows() {
    let repo = scenario_repo();
    let l = repo.listing.clone();

    let all = resolve(&repo, &l, &PostQuery::default()).unwrap();
    let go = resolve(&repo, &l, &PostQuery::new(Some("go".into()), None)).unwrap();
    let rust = resolve(&repo, &l, &PostQuery::new(Some("rust".into()), None)).unwrap();

    assert_eq!(slugs(&go.posts), vec!["p2", "p1"]);
    assert_eq!(slugs(&rust.posts), vec!["p2"]);

    // 每篇结果都带有该标签，且结果是未过滤集合的子集
    for p in &rust.posts {
        assert!(p.tags.iter().any(|t| t == "rust"));
        assert!(all.posts.iter().any(|q| q.slug == p.slug));
    }
}

#[test]
fn test_resolve_unknown_tag_yields_empty() {
    let repo = scenario_repo();
    let resolved = resolve(
        &repo,
        &repo.listing.clone(),
        &PostQuery::new(Some("没有这个标签".into()), None),
    )
    .unwrap();

    assert!(resolved.posts.is_empty());
}

#[test]
fn test_resolve_author_filter() {
    let repo = scenario_repo();
    let resolved = resolve(
        &repo,
        &repo.listing.clone(),
        &PostQuery::new(None, Some("alice".into())),
    )
    .unwrap();

    assert_eq!(slugs(&resolved.posts), vec!["p1"]);
    for p in &resolved.posts {
        assert_eq!(p.author.as_deref(), Some("alice"));
    }
}

#[test]
fn test_resolve_unknown_author_is_error() {
    let repo = scenario_repo();
    let result = resolve(
        &repo,
        &repo.listing.clone(),
        &PostQuery::new(None, Some("nobody".into())),
    );

    match result {
        Err(QueryError::UnknownAuthor { username }) => assert_eq!(username, "nobody"),
        Ok(_) => panic!("未知作者应当返回错误"),
    }
}

#[test]
fn test_resolve_empty_filter_values_pass_through() {
    let repo = scenario_repo();
    let l = repo.listing.clone();

    // 空字符串等价于没有提供过滤条件
    let resolved = resolve(&repo, &l, &PostQuery::new(Some(String::new()), Some(String::new()))).unwrap();
    assert_eq!(slugs(&resolved.posts), vec!["p2", "p1"]);
}

#[test]
fn test_resolve_combined_tag_and_author() {
    let repo = scenario_repo();
    let resolved = resolve(
        &repo,
        &repo.listing.clone(),
        &PostQuery::new(Some("go".into()), Some("bob".into())),
    )
    .unwrap();

    assert_eq!(slugs(&resolved.posts), vec!["p2"]);
}

#[test]
fn test_resolve_is_idempotent() {
    let repo = scenario_repo();
    let l = repo.listing.clone();
    let query = PostQuery::new(Some("go".into()), None);

    let first = resolve(&repo, &l, &query).unwrap();
    let second = resolve(&repo, &l, &query).unwrap();

    assert_eq!(slugs(&first.posts), slugs(&second.posts));
    assert_eq!(slugs(&first.advanced_posts), slugs(&second.advanced_posts));
}

#[test]
fn test_advanced_posts_resolved_independently() {
    let mut repo = scenario_repo();
    repo.posts.push(post(
        "a1",
        "2023-01-15",
        true,
        &["go"],
        Some("alice"),
        PostKind::Advanced,
    ));
    repo.posts.push(post(
        "a2",
        "2023-02-15",
        true,
        &["rust"],
        Some("bob"),
        PostKind::Advanced,
    ));

    let l = repo.listing.clone();
    let all = resolve(&repo, &l, &PostQuery::default()).unwrap();

    // 两个序列互不混入，各自按时间倒序
    assert_eq!(slugs(&all.posts), vec!["p2", "p1"]);
    assert_eq!(slugs(&all.advanced_posts), vec!["a2", "a1"]);

    // 同样的过滤条件独立作用于两个序列
    let go = resolve(&repo, &l, &PostQuery::new(Some("go".into()), None)).unwrap();
    assert_eq!(slugs(&go.posts), vec!["p2", "p1"]);
    assert_eq!(slugs(&go.advanced_posts), vec!["a1"]);
}

#[test]
fn test_equal_dates_keep_load_order() {
    let repo = FixtureRepository {
        listing: listing("blog"),
        posts: vec![
            post("first", "2023-05-01", true, &[], None, PostKind::Standard),
            post("second", "2023-05-01", true, &[], None, PostKind::Standard),
        ],
        authors: Vec::new(),
    };

    // 时间相同，稳定排序保持载入顺序
    let resolved = resolve(&repo, &repo.listing.clone(), &PostQuery::default()).unwrap();
    assert_eq!(slugs(&resolved.posts), vec!["first", "second"]);
}

#[test]
fn test_main_image_absent_without_gallery() {
    let p = post("p", "2023-01-01", true, &[], None, PostKind::Standard);
    assert!(p.main_image().is_none());
}

#[test]
fn test_main_image_uses_display_order() {
    let mut p = post("p", "2023-01-01", true, &[], None, PostKind::Standard);
    p.gallery = vec![
        GalleryImage {
            image: "images/b.png".to_string(),
            caption: "第二张".to_string(),
            order: 2,
        },
        GalleryImage {
            image: "images/a.png".to_string(),
            caption: "第一张".to_string(),
            order: 1,
        },
    ];

    // 顺序靠前的图片是主图，与载入顺序无关
    let main = p.main_image().unwrap();
    assert_eq!(main.image, "images/a.png");
}
