use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 站点配置，从站点根目录的 _config.yml 加载
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub url: Option<String>,
    pub root: Option<String>,
    pub source_dir: Option<String>,
    pub theme: Option<String>,
    pub date_format: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            subtitle: None,
            description: None,
            language: Some("en".to_string()),
            url: None,
            root: Some("/".to_string()),
            source_dir: None,
            theme: Some("default".to_string()),
            date_format: None,
        }
    }
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置的别名
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_file(path)
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// 保存配置的别名
    pub fn save(&self, path: &Path) -> Result<()> {
        self.save_to_file(path)
    }
}
