//! # Extension 模块
//!
//! 对外门面：把挂载引擎、发现监听与设置编辑串在一起，
//! 宿主只需要转发生命周期调用、计时器与事件。
//!
//! ```text
//! on_started ──► ensure_defaults ──► DiscoveryWatcher::start
//! on_retry_tick ─────────────────► DiscoveryWatcher::on_retry_tick
//! handle_event ──────────────────► DiscoveryWatcher::handle_event
//! select_effect / update_params ─► AttachmentEngine::reapply_last
//! set_source_update_delay ───────► AttachmentEngine::apply_delay_to_last
//! ```

use tracing::{info, warn};

use crate::attach::{AttachOutcome, AttachmentEngine};
use crate::config::DiscoveryConfig;
use crate::discovery::{BootstrapStatus, DiscoveryWatcher};
use crate::effects::EffectRegistry;
use crate::error::FxResult;
use crate::host::{HostEvent, VisualHost};
use crate::params::{AnimationParams, EffectName, ParamFlags};
use crate::settings::{SettingsModel, SettingsStore};

/// 过渡动画扩展
#[derive(Debug)]
pub struct TransitionExtension {
    engine: AttachmentEngine,
    watcher: DiscoveryWatcher,
}

impl TransitionExtension {
    /// 使用内置效果表创建
    pub fn new(store: Box<dyn SettingsStore>, config: DiscoveryConfig) -> Self {
        Self::with_registry(store, config, EffectRegistry::builtin())
    }

    pub fn with_registry(
        store: Box<dyn SettingsStore>,
        config: DiscoveryConfig,
        registry: EffectRegistry,
    ) -> Self {
        if let Err(e) = config.validate() {
            warn!(error = %e, "discovery config invalid, continuing with it anyway");
        }
        let settings = SettingsModel::new(store);
        let engine = AttachmentEngine::new(settings, registry, &config);
        Self {
            engine,
            watcher: DiscoveryWatcher::new(config),
        }
    }

    pub fn engine(&self) -> &AttachmentEngine {
        &self.engine
    }

    pub fn watcher(&self) -> &DiscoveryWatcher {
        &self.watcher
    }

    pub fn settings(&self) -> &SettingsModel {
        self.engine.settings()
    }

    // ── 宿主生命周期 ──

    /// 宿主启动完成
    pub fn on_started(&mut self, host: &mut dyn VisualHost) {
        let names = self.engine.registry().names();
        self.engine.settings_mut().ensure_defaults(&names);
        self.watcher.start(host, &mut self.engine);
    }

    /// 启动重试计时器触发
    pub fn on_retry_tick(&mut self, host: &mut dyn VisualHost) -> BootstrapStatus {
        self.watcher.on_retry_tick(host, &mut self.engine)
    }

    /// 宿主事件
    pub fn handle_event(&mut self, host: &mut dyn VisualHost, event: HostEvent) {
        self.watcher.handle_event(host, &mut self.engine, event);
    }

    /// 宿主即将退出
    pub fn on_stopped(&mut self, host: &mut dyn VisualHost) {
        self.watcher.stop(host);
    }

    // ── 设置 ──

    /// 切换效果并立即重新挂载最近的元素
    pub fn select_effect(
        &mut self,
        host: &mut dyn VisualHost,
        effect: EffectName,
    ) -> Option<AttachOutcome> {
        if self.engine.settings().selected_effect() == effect {
            return None;
        }
        info!(effect = %effect, "effect selected");
        self.engine.settings_mut().set_selected_effect(effect);
        self.engine.reapply_last(host)
    }

    /// 修改源切换延迟并转发给最近的元素
    pub fn set_source_update_delay(&mut self, host: &mut dyn VisualHost, delay_ms: f64) {
        self.engine.settings_mut().set_source_update_delay_ms(delay_ms);
        self.engine.apply_delay_to_last(host);
    }

    /// 修改参数；修改的是当前效果时重新挂载
    pub fn update_params(
        &mut self,
        host: &mut dyn VisualHost,
        effect: EffectName,
        f: impl FnOnce(&mut AnimationParams),
    ) -> Option<AttachOutcome> {
        self.engine.settings_mut().update_params(effect, f);
        if effect == self.engine.settings().selected_effect() {
            self.engine.reapply_last(host)
        } else {
            None
        }
    }

    /// 当前效果的参数恢复默认值
    pub fn reset_selected_to_defaults(&mut self, host: &mut dyn VisualHost) -> Option<AttachOutcome> {
        let effect = self.engine.settings().selected_effect();
        self.engine.settings_mut().reset_to_defaults(effect);
        self.engine.reapply_last(host)
    }

    /// 设置界面应显示的参数
    pub fn visible_params(&self) -> ParamFlags {
        self.engine.settings().visible_params()
    }

    pub fn begin_edit(&mut self) {
        self.engine.settings_mut().begin_edit();
    }

    /// 取消编辑，恢复后重新挂载，撤销编辑期间的预览
    pub fn cancel_edit(&mut self, host: &mut dyn VisualHost) -> Option<AttachOutcome> {
        self.engine.settings_mut().cancel_edit();
        self.engine.apply_delay_to_last(host);
        self.engine.reapply_last(host)
    }

    pub fn end_edit(&mut self) -> FxResult<()> {
        self.engine.settings_mut().end_edit()
    }
}
