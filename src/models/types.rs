use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::blocks::StreamBlock;

/// 文章种类：普通文章或带流式内容块的高级文章
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    /// 普通文章（intro + body）
    Standard,
    /// 高级文章（由内容块组成）
    Advanced,
}

/// 博客文章的基本结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// 文章标题
    pub title: String,
    /// 所属列表页的 slug
    pub parent: String,
    /// 文章 slug（用于URL）
    pub slug: String,
    /// 发布时间
    pub date: DateTime<Utc>,
    /// 是否已发布，草稿不会进入任何列表
    pub published: bool,
    /// 文章简介
    pub intro: String,
    /// 文章内容（原始Markdown）
    pub body: String,
    /// 渲染后的HTML内容
    pub rendered_body: String,
    /// 作者用户名，一篇文章最多一个作者
    pub author: Option<String>,
    /// 文章标签
    pub tags: Vec<String>,
    /// 文章分类（分类 slug）
    pub categories: Vec<String>,
    /// 图库图片
    pub gallery: Vec<GalleryImage>,
    /// 文章种类
    pub kind: PostKind,
    /// 流式内容块（仅高级文章使用）
    pub blocks: Vec<StreamBlock>,
    /// 源文件路径
    pub source: PathBuf,
}

impl Post {
    /// 文章的URL路径（列表页 slug + 文章 slug）
    pub fn path(&self) -> String {
        format!("{}/{}", self.parent, self.slug)
    }

    /// 取显示顺序最靠前的图库图片作为主图
    /// 没有图库图片时返回 None，不是错误
    pub fn main_image(&self) -> Option<&GalleryImage> {
        self.gallery.iter().min_by_key(|item| item.order)
    }
}

/// 图库图片
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryImage {
    /// 图片路径
    pub image: String,
    /// 图片说明
    #[serde(default)]
    pub caption: String,
    /// 显示顺序
    #[serde(default)]
    pub order: i32,
}

/// 列表页：其直接子文章构成列表的候选集合
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingPage {
    /// 列表页 slug（目录名）
    pub slug: String,
    /// 列表页标题
    pub title: String,
    /// 简介（原始Markdown）
    pub intro: String,
    /// 渲染后的简介
    pub rendered_intro: String,
    /// 源文件路径
    pub source: PathBuf,
}

/// 标签结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    /// 标签名称
    pub name: String,
    /// 标签别名（用于URL）
    pub slug: String,
    /// 该标签下的已发布文章数量
    pub post_count: usize,
}

/// 分类结构，由站点的 categories.yml 维护
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// 分类名称
    pub name: String,
    /// 分类别名（用于URL）
    pub slug: String,
    /// 分类图标图片
    pub icon: Option<String>,
    /// 该分类下的已发布文章数量
    #[serde(default)]
    pub post_count: usize,
}

/// 作者结构，由站点的 authors.yml 维护
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    /// 用户名，文章通过用户名引用作者
    pub username: String,
    /// 显示名称
    pub name: String,
    /// 邮箱
    pub email: Option<String>,
}
