use anyhow::{anyhow, Result};
use chrono::DateTime;
use pulldown_cmark::{html, Options, Parser};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tera::Tera;
use tracing::error;

use crate::models::config::Config;

/// 主题渲染器
#[derive(Clone)]
pub struct ThemeRenderer {
    /// 主题目录
    pub theme_dir: PathBuf,
    /// 模板引擎
    pub tera: Tera,
    /// 站点配置
    pub config: Config,
}

impl ThemeRenderer {
    /// 创建新的主题渲染器
    pub fn new(base_dir: &Path, config: Config) -> Result<Self> {
        let theme = config.theme.as_deref().unwrap_or("default").to_string();
        let theme_dir = base_dir.join("themes").join(&theme);

        if !theme_dir.exists() {
            return Err(anyhow!("主题目录不存在: {}", theme_dir.display()));
        }

        let mut tera = Tera::new(&format!("{}/**/*.html", theme_dir.join("layout").display()))?;

        // 注册过滤器和函数
        Self::register_filters(&mut tera);
        Self::register_functions(&mut tera, &config);

        Ok(ThemeRenderer {
            theme_dir,
            tera,
            config,
        })
    }

    /// 注册模板过滤器
    fn register_filters(tera: &mut Tera) {
        // 注册日期格式化过滤器
        tera.register_filter("date_format", Self::date_format_filter);
        // 注册Markdown过滤器
        tera.register_filter("markdown", Self::markdown_filter);
    }

    /// 注册模板函数
    fn register_functions(tera: &mut Tera, config: &Config) {
        // URL生成函数，把站点路径拼到配置的根路径下
        let root = config.root.clone().unwrap_or_else(|| "/".to_string());
        tera.register_function(
            "url_for",
            move |args: &HashMap<String, tera::Value>| -> tera::Result<tera::Value> {
                let path = args
                    .get("path")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| tera::Error::msg("缺少必要的参数: path"))?;

                let url = format!(
                    "{}/{}",
                    root.trim_end_matches('/'),
                    path.trim_start_matches('/')
                );
                Ok(tera::Value::String(url))
            },
        );
    }

    /// 渲染模板
    pub fn render_template(&self, template_name: &str, context: &tera::Context) -> Result<String> {
        match self.tera.render(template_name, context) {
            Ok(result) => Ok(result),
            Err(e) => {
                error!("模板渲染失败: {}", e);
                Err(anyhow!(e))
            }
        }
    }

    /// 获取主题资源目录
    pub fn source_dir(&self) -> PathBuf {
        self.theme_dir.join("source")
    }

    fn date_format_filter(
        value: &tera::Value,
        args: &std::collections::HashMap<String, tera::Value>,
    ) -> tera::Result<tera::Value> {
        if let Some(date) = value.as_str().and_then(|s| DateTime::parse_from_rfc3339(s).ok()) {
            let format = args
                .get("format")
                .and_then(|f| f.as_str())
                .unwrap_or("%Y-%m-%d");
            Ok(tera::Value::String(date.format(format).to_string()))
        } else {
            Ok(value.clone())
        }
    }

    fn markdown_filter(
        value: &tera::Value,
        _args: &std::collections::HashMap<String, tera::Value>,
    ) -> tera::Result<tera::Value> {
        if let Some(text) = value.as_str() {
            let mut options = Options::empty();
            options.insert(Options::ENABLE_TABLES);
            options.insert(Options::ENABLE_FOOTNOTES);
            options.insert(Options::ENABLE_STRIKETHROUGH);
            options.insert(Options::ENABLE_TASKLISTS);
            options.insert(Options::ENABLE_SMART_PUNCTUATION);

            let parser = Parser::new_ext(text, options);
            let mut html_output = String::new();
            html::push_html(&mut html_output, parser);

            Ok(tera::Value::String(html_output))
        } else {
            Ok(value.clone())
        }
    }
}
