//! # Config 模块
//!
//! 发现策略配置：启动重试节奏、宿主约定的元素名与视图类型名。
//!
//! 这些值依赖宿主的内部命名，宿主升级后可能需要调整，因此做成配置而不是常量。
//! 缺失字段使用默认值，文件不存在或解析失败时整体回退到默认配置。

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{FxError, FxResult};

/// 发现配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// 启动重试间隔（毫秒）
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// 启动重试次数上限
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// 过渡元素的约定名
    #[serde(default = "default_transition_part_name")]
    pub transition_part_name: String,

    /// 背景切换器的约定名
    #[serde(default = "default_background_changer_name")]
    pub background_changer_name: String,

    /// 过渡元素绑定到切换器内容时的属性路径
    #[serde(default = "default_changer_binding_path")]
    pub changer_binding_path: String,

    /// 已知不含可挂载部件的包装元素类型名
    #[serde(default = "default_opaque_wrapper_type")]
    pub opaque_wrapper_type: String,

    /// 需要监听的结构视图完整类型名
    #[serde(default = "default_view_type_names")]
    pub view_type_names: Vec<String>,

    /// 遮暗装饰淡出时长（秒）
    #[serde(default = "default_decoration_fade_out_secs")]
    pub decoration_fade_out_secs: f32,
}

// 默认值函数
fn default_retry_interval_ms() -> u64 {
    350
}

fn default_max_attempts() -> u32 {
    10
}

fn default_transition_part_name() -> String {
    "PART_ImageBackground".to_string()
}

fn default_background_changer_name() -> String {
    "BackgroundChanger_PluginBackgroundImage".to_string()
}

fn default_changer_binding_path() -> String {
    "Content.Source".to_string()
}

fn default_opaque_wrapper_type() -> String {
    "PluginBackgroundImage".to_string()
}

fn default_view_type_names() -> Vec<String> {
    [
        "Playnite.DesktopApp.Controls.Views.DetailsViewGameOverview",
        "Playnite.DesktopApp.Controls.Views.GridViewGameOverview",
        "Playnite.DesktopApp.Controls.Views.Library",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_decoration_fade_out_secs() -> f32 {
    0.5
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: default_retry_interval_ms(),
            max_attempts: default_max_attempts(),
            transition_part_name: default_transition_part_name(),
            background_changer_name: default_background_changer_name(),
            changer_binding_path: default_changer_binding_path(),
            opaque_wrapper_type: default_opaque_wrapper_type(),
            view_type_names: default_view_type_names(),
            decoration_fade_out_secs: default_decoration_fade_out_secs(),
        }
    }
}

impl DiscoveryConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "discovery config not found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    info!(path = %path.display(), "discovery config loaded");
                    config
                }
                Err(e) => {
                    warn!(error = %e, "failed to parse discovery config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "failed to read discovery config, using defaults");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> FxResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| FxError::SettingsFormat {
            message: e.to_string(),
        })?;

        fs::write(path, json).map_err(|e| FxError::SettingsIo {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// 验证配置有效性
    pub fn validate(&self) -> FxResult<()> {
        let invalid = |message: &str| {
            Err(FxError::InvalidConfig {
                message: message.to_string(),
            })
        };

        if self.retry_interval_ms == 0 {
            return invalid("retry_interval_ms 必须大于 0");
        }
        if self.max_attempts == 0 {
            return invalid("max_attempts 必须大于 0");
        }
        if self.transition_part_name.trim().is_empty() {
            return invalid("transition_part_name 不能为空");
        }
        if self.background_changer_name.trim().is_empty() {
            return invalid("background_changer_name 不能为空");
        }
        if !(self.decoration_fade_out_secs.is_finite() && self.decoration_fade_out_secs >= 0.0) {
            return invalid("decoration_fade_out_secs 必须是非负数");
        }

        Ok(())
    }

    /// 启动重试间隔
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// 类型名是否是需要监听的结构视图
    pub fn is_watched_view(&self, type_name: &str) -> bool {
        self.view_type_names.iter().any(|name| name == type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.retry_interval(), Duration::from_millis(350));
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.view_type_names.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let json = r#"{ "max_attempts": 3, "transition_part_name": "PART_Custom" }"#;
        let config: DiscoveryConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.transition_part_name, "PART_Custom");
        assert_eq!(config.retry_interval_ms, 350);
        assert_eq!(config.changer_binding_path, "Content.Source");
    }

    #[test]
    fn test_load_missing_or_broken_file() {
        let dir = tempfile::tempdir().unwrap();

        let missing = DiscoveryConfig::load(dir.path().join("nope.json"));
        assert_eq!(missing, DiscoveryConfig::default());

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert_eq!(DiscoveryConfig::load(&broken), DiscoveryConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("discovery.json");

        let config = DiscoveryConfig {
            retry_interval_ms: 500,
            ..DiscoveryConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(DiscoveryConfig::load(&path), config);
    }

    #[test]
    fn test_config_validation() {
        let mut config = DiscoveryConfig::default();

        // 零次重试
        config.max_attempts = 0;
        assert!(matches!(
            config.validate(),
            Err(FxError::InvalidConfig { .. })
        ));

        config.max_attempts = 1;
        config.decoration_fade_out_secs = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_watched_view() {
        let config = DiscoveryConfig::default();
        assert!(config.is_watched_view("Playnite.DesktopApp.Controls.Views.Library"));
        assert!(!config.is_watched_view("Library"));
    }
}
