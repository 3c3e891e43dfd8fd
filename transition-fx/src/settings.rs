//! # Settings 模块
//!
//! 用户设置模型与持久化边界。
//!
//! ## 设计说明
//!
//! - [`EffectSettings`] 是唯一被持久化的状态
//! - [`SettingsStore`] 是持久化边界：宿主可以提供自己的实现，
//!   本库自带 JSON 文件实现 [`JsonFileStore`] 与内存实现 [`MemoryStore`]
//! - [`SettingsModel`] 负责默认值修复、重置、编辑快照与提交时的范围饱和
//! - 读取旧设置时容忍未知效果名：选中效果回退到 `Default`，未知参数条目丢弃

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{FxError, FxResult};
use crate::params::{AnimationParams, EffectName, ParamFlags};

/// 默认源切换延迟（毫秒）
pub const DEFAULT_SOURCE_UPDATE_DELAY_MS: f64 = 300.0;

/// 持久化的用户设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSettings")]
pub struct EffectSettings {
    /// 当前选中的效果
    pub selected_effect: EffectName,
    /// 源切换延迟（毫秒）
    pub source_update_delay_ms: f64,
    /// 各效果参数
    pub anim_params: BTreeMap<EffectName, AnimationParams>,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            selected_effect: EffectName::Default,
            source_update_delay_ms: DEFAULT_SOURCE_UPDATE_DELAY_MS,
            anim_params: BTreeMap::new(),
        }
    }
}

/// 反序列化中间形式：效果名先按字符串读入
#[derive(Deserialize)]
struct RawSettings {
    #[serde(default)]
    selected_effect: Option<String>,
    #[serde(default = "default_delay")]
    source_update_delay_ms: f64,
    #[serde(default)]
    anim_params: BTreeMap<String, AnimationParams>,
}

fn default_delay() -> f64 {
    DEFAULT_SOURCE_UPDATE_DELAY_MS
}

impl From<RawSettings> for EffectSettings {
    fn from(raw: RawSettings) -> Self {
        let selected_effect = match raw.selected_effect.as_deref() {
            None | Some("") => EffectName::Default,
            Some(name) => EffectName::parse(name).unwrap_or_else(|| {
                warn!(name, "unknown selected effect in settings, using Default");
                EffectName::Default
            }),
        };

        let mut anim_params = BTreeMap::new();
        for (name, params) in raw.anim_params {
            match EffectName::parse(&name) {
                Some(effect) => {
                    anim_params.insert(effect, params);
                }
                None => warn!(name = %name, "dropping parameters for unknown effect"),
            }
        }

        Self {
            selected_effect,
            source_update_delay_ms: raw.source_update_delay_ms,
            anim_params,
        }
    }
}

/// 持久化边界
pub trait SettingsStore {
    /// 读取已保存的设置（从未保存过时为 `None`）
    fn load(&self) -> FxResult<Option<EffectSettings>>;

    /// 保存设置
    fn save(&mut self, settings: &EffectSettings) -> FxResult<()>;
}

/// JSON 文件存储
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, e: std::io::Error) -> FxError {
        FxError::SettingsIo {
            path: self.path.display().to_string(),
            message: e.to_string(),
        }
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> FxResult<Option<EffectSettings>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let settings = serde_json::from_str(&content).map_err(|e| FxError::SettingsFormat {
            message: e.to_string(),
        })?;
        Ok(Some(settings))
    }

    fn save(&mut self, settings: &EffectSettings) -> FxResult<()> {
        let json = serde_json::to_string_pretty(settings).map_err(|e| FxError::SettingsFormat {
            message: e.to_string(),
        })?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        fs::write(&self.path, json).map_err(|e| self.io_error(e))?;
        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    stored: Option<EffectSettings>,
    saves: usize,
}

/// 内存存储
///
/// 克隆共享同一份内容，便于在交给 [`SettingsModel`] 之后继续观察。
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置已保存的设置
    pub fn with_settings(settings: EffectSettings) -> Self {
        let store = Self::new();
        store.inner.borrow_mut().stored = Some(settings);
        store
    }

    /// 当前保存的内容
    pub fn stored(&self) -> Option<EffectSettings> {
        self.inner.borrow().stored.clone()
    }

    /// 保存次数
    pub fn save_count(&self) -> usize {
        self.inner.borrow().saves
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> FxResult<Option<EffectSettings>> {
        Ok(self.inner.borrow().stored.clone())
    }

    fn save(&mut self, settings: &EffectSettings) -> FxResult<()> {
        let mut inner = self.inner.borrow_mut();
        inner.stored = Some(settings.clone());
        inner.saves += 1;
        Ok(())
    }
}

/// 设置模型
pub struct SettingsModel {
    settings: EffectSettings,
    store: Box<dyn SettingsStore>,
    /// 编辑开始时的快照
    snapshot: Option<EffectSettings>,
}

impl std::fmt::Debug for SettingsModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsModel")
            .field("settings", &self.settings)
            .field("editing", &self.snapshot.is_some())
            .finish()
    }
}

impl SettingsModel {
    /// 从存储加载；无存档或加载失败时使用默认设置
    pub fn new(store: Box<dyn SettingsStore>) -> Self {
        let settings = match store.load() {
            Ok(Some(settings)) => {
                info!(selected = %settings.selected_effect, "settings loaded");
                settings
            }
            Ok(None) => EffectSettings::default(),
            Err(e) => {
                warn!(error = %e, "failed to load settings, using defaults");
                EffectSettings::default()
            }
        };
        Self {
            settings,
            store,
            snapshot: None,
        }
    }

    /// 内存存储上的默认模型
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    pub fn settings(&self) -> &EffectSettings {
        &self.settings
    }

    pub fn selected_effect(&self) -> EffectName {
        self.settings.selected_effect
    }

    pub fn set_selected_effect(&mut self, effect: EffectName) {
        self.settings.selected_effect = effect;
    }

    pub fn source_update_delay_ms(&self) -> f64 {
        self.settings.source_update_delay_ms
    }

    pub fn set_source_update_delay_ms(&mut self, delay_ms: f64) {
        self.settings.source_update_delay_ms = delay_ms;
    }

    /// 已存储的参数
    pub fn params(&self, effect: EffectName) -> Option<&AnimationParams> {
        self.settings.anim_params.get(&effect)
    }

    /// 修改某效果的参数（不存在时先写入默认值）
    pub fn update_params(&mut self, effect: EffectName, f: impl FnOnce(&mut AnimationParams)) {
        f(self.params_entry(effect));
    }

    /// 读取参数，缺失时合成默认值并写回
    pub fn params_or_insert_default(&mut self, effect: EffectName) -> AnimationParams {
        self.params_entry(effect).clone()
    }

    fn params_entry(&mut self, effect: EffectName) -> &mut AnimationParams {
        self.settings.anim_params.entry(effect).or_insert_with(|| {
            debug!(effect = %effect, "parameters missing, inserting defaults");
            AnimationParams::defaults_for(effect)
        })
    }

    /// 补齐并修复参数表
    ///
    /// - 缺失的效果写入默认参数
    /// - 已存在的效果只修复 `used_params`，数值保持不变
    /// - 选中效果不在参数表中时回退到第一个名字（或 `Default`）
    pub fn ensure_defaults(&mut self, names: &[EffectName]) {
        for &name in names {
            let defaults = AnimationParams::defaults_for(name);
            match self.settings.anim_params.get_mut(&name) {
                None => {
                    self.settings.anim_params.insert(name, defaults);
                }
                Some(params) if params.used_params != defaults.used_params => {
                    debug!(effect = %name, "repairing stale parameter mask");
                    params.used_params = defaults.used_params;
                }
                Some(_) => {}
            }
        }

        if !self
            .settings
            .anim_params
            .contains_key(&self.settings.selected_effect)
        {
            let fallback = names.first().copied().unwrap_or(EffectName::Default);
            warn!(
                selected = %self.settings.selected_effect,
                fallback = %fallback,
                "selected effect has no parameters"
            );
            self.settings.selected_effect = fallback;
        }
    }

    /// 把某个效果的数值字段与掩码重置为默认值，其他效果不受影响
    pub fn reset_to_defaults(&mut self, effect: EffectName) {
        let defaults = AnimationParams::defaults_for(effect);
        match self.settings.anim_params.get_mut(&effect) {
            Some(params) => params.reset_to(&defaults),
            None => {
                self.settings.anim_params.insert(effect, defaults);
            }
        }
    }

    /// 选中效果的可见参数
    pub fn visible_params(&self) -> ParamFlags {
        let effect = self.settings.selected_effect;
        self.params(effect)
            .map(|p| p.used_params)
            .unwrap_or_else(|| AnimationParams::defaults_for(effect).used_params)
    }

    /// 饱和所有参数后保存
    pub fn commit(&mut self) -> FxResult<()> {
        for params in self.settings.anim_params.values_mut() {
            params.clamp();
        }
        let delay = self.settings.source_update_delay_ms;
        if !delay.is_finite() || delay < 0.0 {
            self.settings.source_update_delay_ms = 0.0;
        }
        self.store.save(&self.settings)
    }

    // ── 编辑生命周期 ──

    /// 开始编辑：保存快照
    pub fn begin_edit(&mut self) {
        self.snapshot = Some(self.settings.clone());
    }

    /// 取消编辑：恢复快照
    pub fn cancel_edit(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.settings = snapshot;
        }
    }

    /// 结束编辑：丢弃快照并提交
    pub fn end_edit(&mut self) -> FxResult<()> {
        self.snapshot = None;
        self.commit()
    }

    /// 是否处于编辑中
    pub fn is_editing(&self) -> bool {
        self.snapshot.is_some()
    }
}
