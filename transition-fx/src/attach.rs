//! # Attach 模块
//!
//! 挂载引擎：为一个过渡元素构建并安装全部五条时间轴。
//!
//! ## 挂载流程
//!
//! 1. 记录为最近挂载的元素
//! 2. 写入源切换延迟
//! 3. 解析两个图片表面与遮暗装饰，失败则放弃（不改动任何槽位）
//! 4. 规范化两个表面的变换栈
//! 5. Smart Slide：锁定导航方向
//! 6. 平移类效果按需做滑动缩放补偿（尺寸未知时等待一次尺寸事件）
//! 7. 平移通道归零
//! 8. 解析效果名与参数（缺失时合成默认值并写回）
//! 9. 构建四条进入/退出时间轴与装饰淡出时间轴
//! 10. 安装到元素的槽位，覆盖旧值
//!
//! 第 2 步之后的每一步都是尽力而为：失败只记录日志，宿主元素保持默认行为。

use std::collections::HashMap;

use tracing::{debug, info, trace, warn};

use crate::animation::{Timeline, normalize, reset_translate, set_uniform_scale};
use crate::config::DiscoveryConfig;
use crate::effects::builders::decoration_fade_out;
use crate::effects::{BuildContext, EffectRegistry};
use crate::host::{ElementId, Signal, SurfaceHandle, TimelineSlot, VisualHost};
use crate::navigation::{DirectionalTracker, NavigationKey};
use crate::params::{EffectName, SlideDirection};
use crate::settings::SettingsModel;

/// 单次挂载的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    /// 时间轴已构建并安装
    Attached {
        /// 实际使用的效果
        effect: EffectName,
        /// 成功写入的槽位数
        installed: usize,
    },
    /// 图片表面无法解析，本次放弃
    Unresolved,
}

impl AttachOutcome {
    pub fn is_attached(&self) -> bool {
        matches!(self, AttachOutcome::Attached { .. })
    }
}

/// 等待尺寸的滑动缩放补偿
#[derive(Debug, Clone)]
struct PendingZoom {
    element: ElementId,
    surface: SurfaceHandle,
    distance: f32,
}

/// 滑动缩放系数：`(width + 2 * distance) / width`
pub fn slide_zoom_factor(width: f32, distance: f32) -> f32 {
    (width + 2.0 * distance) / width
}

/// 挂载引擎
#[derive(Debug)]
pub struct AttachmentEngine {
    settings: SettingsModel,
    tracker: DirectionalTracker,
    registry: EffectRegistry,
    decoration_fade_out_secs: f32,
    /// 最近挂载（或记住）的元素
    last_attached: Option<ElementId>,
    /// 按表面 ID 索引
    pending_zoom: HashMap<ElementId, PendingZoom>,
}

impl AttachmentEngine {
    pub fn new(settings: SettingsModel, registry: EffectRegistry, config: &DiscoveryConfig) -> Self {
        Self {
            settings,
            tracker: DirectionalTracker::new(),
            registry,
            decoration_fade_out_secs: config.decoration_fade_out_secs,
            last_attached: None,
            pending_zoom: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &SettingsModel {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SettingsModel {
        &mut self.settings
    }

    pub fn tracker(&self) -> &DirectionalTracker {
        &self.tracker
    }

    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    pub fn last_attached(&self) -> Option<ElementId> {
        self.last_attached
    }

    /// 方向导航输入
    pub fn on_navigate(&mut self, key: NavigationKey) {
        self.tracker.on_key(key);
    }

    /// 记住元素但不挂载（延迟设置仍可转发给它）
    pub fn remember(&mut self, id: ElementId) {
        self.last_attached = Some(id);
    }

    /// 元素卸载：清除引用并取消其等待中的缩放补偿
    pub fn forget(&mut self, host: &mut dyn VisualHost, id: ElementId) {
        if self.last_attached == Some(id) {
            self.last_attached = None;
        }

        let surfaces: Vec<ElementId> = self
            .pending_zoom
            .iter()
            .filter(|(_, pending)| pending.element == id)
            .map(|(surface, _)| *surface)
            .collect();
        for surface in surfaces {
            self.pending_zoom.remove(&surface);
            host.unsubscribe(surface, Signal::SizeChanged);
        }
    }

    /// 是否有等待尺寸的缩放补偿
    pub fn has_pending_zoom(&self, surface: ElementId) -> bool {
        self.pending_zoom.contains_key(&surface)
    }

    /// 挂载过渡元素
    pub fn attach(&mut self, host: &mut dyn VisualHost, id: ElementId) -> AttachOutcome {
        self.last_attached = Some(id);

        let delay = self.settings.source_update_delay_ms();
        if let Err(e) = host.set_source_update_delay(id, delay) {
            warn!(element = %id, error = %e, "failed to set source update delay");
        }

        let parts = match host.transition_parts(id) {
            Ok(parts) => parts,
            Err(e) => {
                debug!(element = %id, error = %e, "transition parts unresolved, skipping");
                return AttachOutcome::Unresolved;
            }
        };
        let surfaces = [&parts.primary, &parts.secondary];

        for surface in surfaces {
            normalize(&mut surface.borrow_mut());
        }

        let selected = self.settings.selected_effect();
        if selected == EffectName::SmartSlide {
            let direction = self.tracker.lock_for_smart_slide();
            trace!(?direction, "smart slide direction locked");
        }

        let zoom_distance = self
            .settings
            .params(selected)
            .filter(|p| selected.is_slide() && p.slide_zoom)
            .map(|p| p.slide_distance);
        if let Some(distance) = zoom_distance {
            for surface in surfaces {
                self.apply_slide_zoom(host, id, surface, distance);
            }
        }

        for surface in surfaces {
            reset_translate(&surface.borrow());
        }

        let effect = if self.registry.contains(selected) {
            selected
        } else {
            warn!(effect = %selected, "selected effect not registered, using Default");
            EffectName::Default
        };
        let params = self.settings.params_or_insert_default(effect);

        let ctx = BuildContext {
            locked_direction: self.locked_direction(),
        };
        let decoration = parts.decoration.as_ref();
        let mut timelines: Vec<(TimelineSlot, Timeline)> = vec![
            (
                TimelineSlot::EnterPrimary,
                self.registry
                    .build_enter(effect, &ctx, &parts.primary, decoration, &params),
            ),
            (
                TimelineSlot::EnterSecondary,
                self.registry
                    .build_enter(effect, &ctx, &parts.secondary, decoration, &params),
            ),
            (
                TimelineSlot::ExitPrimary,
                self.registry.build_exit(effect, &ctx, &parts.primary, &params),
            ),
            (
                TimelineSlot::ExitSecondary,
                self.registry
                    .build_exit(effect, &ctx, &parts.secondary, &params),
            ),
        ];
        if let Some(decoration) = decoration {
            timelines.push((
                TimelineSlot::DecorationExit,
                decoration_fade_out(decoration, self.decoration_fade_out_secs),
            ));
        }

        let mut installed = 0;
        for (slot, timeline) in timelines {
            match host.install_timeline(id, slot, timeline) {
                Ok(()) => installed += 1,
                Err(e) => warn!(element = %id, ?slot, error = %e, "failed to install timeline"),
            }
        }

        info!(element = %id, effect = %effect, installed, "transition attached");
        AttachOutcome::Attached { effect, installed }
    }

    /// 重新挂载最近的元素，使新的效果或参数立即生效
    pub fn reapply_last(&mut self, host: &mut dyn VisualHost) -> Option<AttachOutcome> {
        let id = self.last_attached?;
        Some(self.attach(host, id))
    }

    /// 把当前延迟设置转发给最近的元素
    pub fn apply_delay_to_last(&mut self, host: &mut dyn VisualHost) {
        let Some(id) = self.last_attached else {
            return;
        };
        let delay = self.settings.source_update_delay_ms();
        if let Err(e) = host.set_source_update_delay(id, delay) {
            warn!(element = %id, error = %e, "failed to forward source update delay");
        }
    }

    /// 表面尺寸可用：执行一次等待中的缩放补偿并退订
    ///
    /// # 返回
    /// - `true`: 存在等待中的补偿（已处理）
    /// - `false`: 该表面没有等待中的补偿
    pub fn on_size_changed(&mut self, host: &mut dyn VisualHost, surface: ElementId) -> bool {
        let Some(pending) = self.pending_zoom.remove(&surface) else {
            return false;
        };
        host.unsubscribe(surface, Signal::SizeChanged);

        match host.actual_size(surface).filter(|size| size.is_measured()) {
            Some(size) => {
                let scale = slide_zoom_factor(size.width, pending.distance);
                set_uniform_scale(&pending.surface.borrow(), scale);
                debug!(surface = %surface, scale, "deferred slide zoom applied");
            }
            None => debug!(surface = %surface, "surface still unmeasured, slide zoom skipped"),
        }
        true
    }

    fn locked_direction(&self) -> SlideDirection {
        self.tracker.locked()
    }

    fn apply_slide_zoom(
        &mut self,
        host: &mut dyn VisualHost,
        element: ElementId,
        surface: &SurfaceHandle,
        distance: f32,
    ) {
        let surface_id = surface.borrow().id();

        if let Some(size) = host.actual_size(surface_id).filter(|size| size.is_measured()) {
            set_uniform_scale(&surface.borrow(), slide_zoom_factor(size.width, distance));
            return;
        }

        // 已在等待：只更新距离，避免重复订阅
        if let Some(pending) = self.pending_zoom.get_mut(&surface_id) {
            pending.distance = distance;
            return;
        }

        match host.subscribe(surface_id, Signal::SizeChanged) {
            Ok(()) => {
                self.pending_zoom.insert(
                    surface_id,
                    PendingZoom {
                        element,
                        surface: surface.clone(),
                        distance,
                    },
                );
            }
            Err(e) => warn!(surface = %surface_id, error = %e, "cannot wait for surface size"),
        }
    }
}
