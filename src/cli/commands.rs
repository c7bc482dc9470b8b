use crate::core::Engine;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// 指定站点目录
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 初始化新的博客站点
    Init(InitArgs),

    /// 创建新的文章
    New(NewArgs),

    /// 启动本地服务器
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// 站点目录名称
    #[arg(value_name = "NAME")]
    pub name: String,

    /// 站点标题
    #[arg(short, long)]
    pub title: Option<String>,
}

#[derive(Args)]
pub struct NewArgs {
    /// 文章标题
    pub title: String,

    /// 所属列表页
    #[arg(short, long, default_value = "blog")]
    pub listing: String,

    /// 创建高级文章（流式内容块）
    #[arg(short, long)]
    pub advanced: bool,
}

#[derive(Args)]
pub struct ServeArgs {
    /// 服务器端口
    #[arg(short, long, default_value = "4000")]
    pub port: u16,

    /// 监视内容变化并自动重新加载
    #[arg(short, long)]
    pub watch: bool,
}

// 嵌入的默认配置模板
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# 站点信息
title: {title}
subtitle: '一个 Rust-Wagtail 博客'
description: '由 Rust-Wagtail 驱动的博客站点'
language: zh-CN

# URL配置
url: http://example.com
root: /

# 目录配置
source_dir: source

# 主题配置
theme: default

# 日期格式
date_format: '%Y-%m-%d'
"#;

// 嵌入的作者注册表示例
const DEFAULT_AUTHORS: &str = r#"- username: admin
  name: 站点管理员
  email: admin@example.com
"#;

// 嵌入的分类注册表示例
const DEFAULT_CATEGORIES: &str = r#"- name: 入门指南
  slug: guides
  icon: images/guides.png
"#;

// 嵌入的默认主题文件
mod default_theme {
    // 主题CSS文件
    pub const STYLE_CSS: &str = include_str!("../../embed/theme/default/source/css/style.css");

    // 主题布局文件
    pub const LAYOUT_HTML: &str = include_str!("../../embed/theme/default/layout/layout.html");
    pub const INDEX_HTML: &str = include_str!("../../embed/theme/default/layout/index.html");
    pub const LISTING_HTML: &str = include_str!("../../embed/theme/default/layout/listing.html");
    pub const POST_HTML: &str = include_str!("../../embed/theme/default/layout/post.html");
    pub const ADVANCED_POST_HTML: &str =
        include_str!("../../embed/theme/default/layout/advanced_post.html");
}

// 初始化网站文件结构，包括创建默认主题和示例内容
fn initialize_site_structure(site_path: &PathBuf, site_title: &str) -> Result<()> {
    // 创建目录结构
    let source_dir = site_path.join("source");
    let blog_dir = source_dir.join("blog");
    let theme_dir = site_path.join("themes").join("default");
    let theme_layout_dir = theme_dir.join("layout");
    let theme_source_dir = theme_dir.join("source");
    let theme_css_dir = theme_source_dir.join("css");
    let theme_images_dir = theme_source_dir.join("images");

    // 创建所有必要的目录
    for dir in &[
        &source_dir,
        &blog_dir,
        &theme_dir,
        &theme_layout_dir,
        &theme_source_dir,
        &theme_css_dir,
        &theme_images_dir,
    ] {
        fs::create_dir_all(dir)?;
    }

    // 创建默认配置文件
    let config_content = DEFAULT_CONFIG_TEMPLATE.replace("{title}", site_title);
    fs::write(site_path.join("_config.yml"), config_content)?;

    // 创建注册表文件
    fs::write(site_path.join("authors.yml"), DEFAULT_AUTHORS)?;
    fs::write(site_path.join("categories.yml"), DEFAULT_CATEGORIES)?;

    // 创建默认主题文件
    fs::write(theme_css_dir.join("style.css"), default_theme::STYLE_CSS)?;
    fs::write(theme_layout_dir.join("layout.html"), default_theme::LAYOUT_HTML)?;
    fs::write(theme_layout_dir.join("index.html"), default_theme::INDEX_HTML)?;
    fs::write(theme_layout_dir.join("listing.html"), default_theme::LISTING_HTML)?;
    fs::write(theme_layout_dir.join("post.html"), default_theme::POST_HTML)?;
    fs::write(
        theme_layout_dir.join("advanced_post.html"),
        default_theme::ADVANCED_POST_HTML,
    )?;

    // 创建示例列表页
    let listing_index = blog_dir.join("_index.md");
    let listing_content = r#"---
title: 博客
---

欢迎来到这个站点的博客。文章列表支持通过 `?tag=` 和 `?author=` 查询参数过滤。
"#;
    fs::write(listing_index, listing_content)?;

    // 创建示例博文
    let hello_post = blog_dir.join("hello-world.md");
    let hello_content = r#"---
title: Hello World
date: 2023-01-01 12:00:00
intro: 您的第一篇示例文章
author: admin
tags:
  - rust-wagtail
  - 指南
categories:
  - guides
gallery:
  - image: images/hello.png
    caption: 示例图片
    order: 1
---

# 欢迎使用 Rust-Wagtail

这是您使用 Rust-Wagtail 创建的第一篇博客文章。您可以编辑此文件来开始您的博客之旅！

## 快速开始

### 创建新文章

``` bash
rust-wagtail new "我的新文章"
```

### 启动本地服务器

``` bash
rust-wagtail serve
```
"#;
    fs::write(hello_post, hello_content)?;

    // 创建示例高级文章
    let advanced_post = blog_dir.join("stream-blocks-demo.md");
    let advanced_content = r#"---
title: 内容块示例
date: 2023-01-02 12:00:00
intro: 高级文章的正文由带类型的内容块组成
author: admin
layout: advanced
tags:
  - rust-wagtail
blocks:
  - type: title_and_text
    title: 标题加正文
    text: 这是最简单的内容块，一个标题加一段正文，没有别的。
  - type: rich_text
    text: |
      富文本块支持 **Markdown** 语法，渲染交给模板层处理。
  - type: cta
    title: 开始写作
    text: 用 new 命令创建属于你自己的文章。
    button_url: /
    button_text: 回到首页
---
"#;
    fs::write(advanced_post, advanced_content)?;

    Ok(())
}

/// 执行命令
pub async fn execute(cli: Cli) -> Result<()> {
    let site_path = cli.path.clone();

    match cli.command {
        Commands::Init(args) => {
            // 使用提供的目录名称
            let site_path = site_path.join(&args.name);

            // 如果目录不为空，询问用户是否继续
            if site_path.exists() && site_path.read_dir()?.next().is_some() {
                println!("Directory is not empty. Do you want to continue? (y/N)");
                let mut input = String::new();
                std::io::stdin().read_line(&mut input)?;
                if !input.trim().eq_ignore_ascii_case("y") {
                    println!("Operation cancelled.");
                    return Ok(());
                }
            }

            // 创建站点目录
            fs::create_dir_all(&site_path)?;

            // 获取站点标题
            let site_title = args.title.unwrap_or_else(|| args.name.clone());

            // 初始化网站文件结构
            initialize_site_structure(&site_path, &site_title)?;

            info!("Initialized new site at: {}", site_path.display());
        }
        Commands::New(args) => {
            let engine = Engine::new(site_path)?;
            let path = engine.new_post(&args.title, &args.listing, args.advanced)?;
            println!("Created: {}", path.display());
        }
        Commands::Serve(args) => {
            let engine = Engine::new(site_path)?;

            // 加载页面仓库
            engine.load()?;

            if args.watch {
                engine.watch()?;
            }

            // 启动服务器
            engine.serve(args.port).await?;
        }
    }

    Ok(())
}
