use std::fs;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, RwLock};
use std::time::Duration;

use anyhow::{anyhow, Context as AnyhowContext, Result};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info, warn};

use crate::core::repository::ContentRepository;
use crate::core::server::{AppState, Server};
use crate::models::config::Config;
use crate::theme::renderer::ThemeRenderer;

/// 内容引擎的核心实现
/// 持有站点配置和页面仓库，负责加载内容、监视变化和启动服务器
#[derive(Clone)]
pub struct Engine {
    /// 站点根目录
    pub base_dir: PathBuf,
    /// 内容目录
    pub source_dir: PathBuf,
    /// 主题目录
    pub theme_dir: PathBuf,
    /// 站点配置
    pub config: Config,
    /// 页面仓库
    /// 请求只读，写锁只在重新加载时使用
    pub repository: Arc<RwLock<ContentRepository>>,
    /// 是否处于监听状态
    is_watching: Arc<RwLock<bool>>,
}

impl Engine {
    /// 创建一个新的引擎实例
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        info!("工作目录: {}", base_dir.display());

        // 配置文件
        let config_path = base_dir.join("_config.yml");
        let config = if config_path.exists() {
            Config::load(&config_path)?
        } else {
            Config::default()
        };

        let source_dir = base_dir.join(config.source_dir.as_deref().unwrap_or("source"));
        let theme = config.theme.as_deref().unwrap_or("default");
        let theme_dir = base_dir.join("themes").join(theme);

        Ok(Self {
            base_dir,
            source_dir,
            theme_dir,
            config,
            repository: Arc::new(RwLock::new(ContentRepository::empty())),
            is_watching: Arc::new(RwLock::new(false)),
        })
    }

    /// 加载（或重新加载）页面仓库
    pub fn load(&self) -> Result<()> {
        let repository = ContentRepository::load(&self.base_dir, &self.source_dir)?;
        *self.repository.write().unwrap() = repository;
        Ok(())
    }

    /// 创建新文章
    pub fn new_post(&self, title: &str, listing: &str, advanced: bool) -> Result<PathBuf> {
        info!("创建新文章: {}", title);

        let slug = slug::slugify(title);
        let filename = format!("{}.md", slug);
        let target_path = self.source_dir.join(listing).join(filename);

        // 创建父目录（如果不存在）
        if let Some(parent) = target_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("创建目录失败: {}", parent.display()))?;
            }
        }

        // 检查文件是否已存在
        if target_path.exists() {
            return Err(anyhow!("文件已存在: {}", target_path.display()));
        }

        // 生成 Front Matter，新文章默认是草稿
        let layout_line = if advanced { "layout: advanced\n" } else { "" };
        let front_matter = format!(
            "---\n\
            title: {}\n\
            date: {}\n\
            published: false\n\
            {}\
            tags: []\n\
            categories: []\n\
            ---\n\n\
            在这里开始你的创作...\n",
            title,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            layout_line,
        );

        fs::write(&target_path, front_matter)
            .with_context(|| format!("写入文件失败: {}", target_path.display()))?;

        info!("成功创建文章: {}", target_path.display());
        Ok(target_path)
    }

    /// 启动本地服务器
    pub async fn serve(&self, port: u16) -> Result<()> {
        info!("启动本地服务器在端口 {}", port);

        let renderer = ThemeRenderer::new(&self.base_dir, self.config.clone())?;
        let assets_dir = renderer.source_dir();

        let state = AppState {
            config: self.config.clone(),
            repository: self.repository.clone(),
            renderer: Arc::new(renderer),
        };

        let server = Server::new(state, assets_dir, port);
        server.start().await
    }

    /// 开始监视内容变化，变化后重新加载仓库
    pub fn watch(&self) -> Result<()> {
        info!("开始监视内容变化: {}", self.source_dir.display());

        {
            let mut is_watching = self.is_watching.write().unwrap();
            *is_watching = true;
        }

        // 创建通道以接收文件系统事件
        let (tx, rx) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    let _ = tx.send(event);
                }
                Err(e) => {
                    warn!("监视错误: {:?}", e);
                }
            },
            NotifyConfig::default(),
        )
        .map_err(|e| anyhow!("创建文件监视器失败: {}", e))?;

        watcher
            .watch(&self.source_dir, RecursiveMode::Recursive)
            .with_context(|| format!("监控内容目录失败: {}", self.source_dir.display()))?;

        // 注册表文件在站点根目录，单独监视一层
        watcher
            .watch(&self.base_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("监控站点目录失败: {}", self.base_dir.display()))?;

        let engine = self.clone();

        // 在阻塞任务中持有 watcher，保证它在整个监控过程中存活
        tokio::task::spawn_blocking(move || {
            let _watcher = watcher;

            // 防抖动计时器，避免频繁重新加载
            let debounce_time = Duration::from_millis(1000);
            let mut last_event: Option<std::time::Instant> = None;

            loop {
                match rx.recv_timeout(Duration::from_secs(1)) {
                    Ok(event) => {
                        if is_relevant_event(&event) {
                            debug!("检测到内容变化: {:?}", event.paths);
                            last_event = Some(std::time::Instant::now());
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        if let Some(instant) = last_event {
                            if instant.elapsed() >= debounce_time {
                                info!("内容已变化，重新加载...");
                                if let Err(e) = engine.load() {
                                    error!("重新加载失败: {:#}", e);
                                } else {
                                    info!("重新加载完成");
                                }
                                last_event = None;
                            }
                        }

                        // 检查是否仍在监视
                        if !*engine.is_watching.read().unwrap() {
                            info!("监视已停止，退出监控循环");
                            break;
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        error!("监控通道已断开，退出监控循环");
                        break;
                    }
                }
            }
        });

        Ok(())
    }

    /// 停止监视内容变化
    pub fn unwatch(&self) {
        info!("停止监视内容变化");
        *self.is_watching.write().unwrap() = false;
    }
}

/// 判断事件是否值得触发重新加载
fn is_relevant_event(event: &Event) -> bool {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return false;
    }

    event.paths.iter().any(|path| {
        if path.is_dir() {
            return true;
        }
        matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("md") | Some("markdown") | Some("yml") | Some("yaml")
        )
    })
}
