//! # Effect Registry
//!
//! 效果名到进入/退出构建函数的映射。

use std::collections::BTreeMap;

use tracing::warn;

use super::builders;
use crate::animation::Timeline;
use crate::host::{DecorationHandle, SurfaceHandle};
use crate::params::{AnimationParams, EffectName, SlideDirection};

/// 构建上下文
///
/// 携带构建函数需要、但不属于参数集的状态。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildContext {
    /// 挂载时锁定的滑动方向（仅 Smart Slide 读取）
    pub locked_direction: SlideDirection,
}

/// 进入构建函数
pub type EnterBuilder =
    fn(&BuildContext, &SurfaceHandle, Option<&DecorationHandle>, &AnimationParams) -> Timeline;

/// 退出构建函数
pub type ExitBuilder = fn(&BuildContext, &SurfaceHandle, &AnimationParams) -> Timeline;

/// 注册表条目
#[derive(Debug, Clone, Copy)]
pub struct EffectEntry {
    pub name: EffectName,
    pub enter: EnterBuilder,
    pub exit: ExitBuilder,
}

const DEFAULT_ENTRY: EffectEntry = EffectEntry {
    name: EffectName::Default,
    enter: builders::fade_in,
    exit: builders::fade_out,
};

/// 效果注册表
#[derive(Debug, Clone)]
pub struct EffectRegistry {
    entries: BTreeMap<EffectName, EffectEntry>,
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl EffectRegistry {
    /// 空注册表（查询全部回退到默认淡化）
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// 内置效果表
    pub fn builtin() -> Self {
        use EffectName as E;

        let mut registry = Self::empty();
        registry.register(E::Default, builders::fade_in, builders::fade_out);
        registry.register(E::CustomFade, builders::fade_in, builders::fade_out);
        registry.register(E::FadeZoom, builders::fade_zoom_in, builders::fade_zoom_out);
        registry.register(E::PS5Slide, builders::ps5_slide_in, builders::ps5_slide_out);
        registry.register(
            E::CustomSlide,
            builders::custom_slide_in,
            builders::custom_slide_out,
        );
        registry.register(
            E::SmartSlide,
            builders::smart_slide_in,
            builders::smart_slide_out,
        );
        registry.register(
            E::ZoomRotate,
            builders::zoom_rotate_in,
            builders::zoom_rotate_out,
        );
        registry.register(E::PageCurl, builders::page_curl_in, builders::page_curl_out);
        registry.register(E::BlurFade, builders::blur_fade_in, builders::blur_fade_out);
        registry
    }

    /// 注册或替换一个效果
    pub fn register(&mut self, name: EffectName, enter: EnterBuilder, exit: ExitBuilder) {
        self.entries.insert(name, EffectEntry { name, enter, exit });
    }

    /// 是否已注册
    pub fn contains(&self, name: EffectName) -> bool {
        self.entries.contains_key(&name)
    }

    /// 查询条目，未注册时回退到 `Default`
    pub fn get(&self, name: EffectName) -> EffectEntry {
        if let Some(entry) = self.entries.get(&name) {
            return *entry;
        }
        warn!(effect = %name, "effect not registered, falling back to Default");
        self.entries
            .get(&EffectName::Default)
            .copied()
            .unwrap_or(DEFAULT_ENTRY)
    }

    /// 从字符串解析效果名，无法识别或未注册时返回 `Default`
    pub fn resolve(&self, name: &str) -> EffectName {
        match EffectName::parse(name) {
            Some(effect) if self.contains(effect) => effect,
            _ => {
                warn!(name, "unknown effect name, using Default");
                EffectName::Default
            }
        }
    }

    /// 已注册效果，按 [`EffectName::ALL`] 顺序
    pub fn names(&self) -> Vec<EffectName> {
        EffectName::ALL
            .into_iter()
            .filter(|name| self.contains(*name))
            .collect()
    }

    /// 构建进入时间轴
    pub fn build_enter(
        &self,
        name: EffectName,
        ctx: &BuildContext,
        surface: &SurfaceHandle,
        decoration: Option<&DecorationHandle>,
        params: &AnimationParams,
    ) -> Timeline {
        (self.get(name).enter)(ctx, surface, decoration, params)
    }

    /// 构建退出时间轴
    pub fn build_exit(
        &self,
        name: EffectName,
        ctx: &BuildContext,
        surface: &SurfaceHandle,
        params: &AnimationParams,
    ) -> Timeline {
        (self.get(name).exit)(ctx, surface, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimatedProperty, normalize};
    use crate::host::{ElementId, Surface};

    fn surface() -> SurfaceHandle {
        let mut s = Surface::new(ElementId(1));
        normalize(&mut s);
        s.into_handle()
    }

    #[test]
    fn test_builtin_covers_all_names() {
        let registry = EffectRegistry::builtin();
        assert_eq!(registry.names(), EffectName::ALL.to_vec());
    }

    #[test]
    fn test_catalogue_display_names() {
        let names: Vec<&str> = EffectRegistry::builtin()
            .names()
            .iter()
            .map(|n| n.display_name())
            .collect();
        insta::assert_debug_snapshot!(names, @r###"
        [
            "Default",
            "Custom Fade",
            "Fade + Zoom",
            "PS5 Simple Slide",
            "Custom Slide",
            "Smart Slide",
            "Zoom + Rotate",
            "Wave Curl",
            "Blur Fade",
        ]
        "###);
    }

    #[test]
    fn test_resolve_unknown_falls_back() {
        let registry = EffectRegistry::builtin();
        assert_eq!(registry.resolve("Fade + Zoom"), EffectName::FadeZoom);
        assert_eq!(registry.resolve("Spiral"), EffectName::Default);
        assert_eq!(registry.resolve(""), EffectName::Default);
    }

    #[test]
    fn test_missing_entry_falls_back_to_default() {
        let mut registry = EffectRegistry::empty();
        registry.register(EffectName::Default, builders::fade_in, builders::fade_out);
        let s = surface();
        let p = AnimationParams::defaults_for(EffectName::FadeZoom);

        // FadeZoom 未注册：只有基础淡化，没有缩放
        let tl = registry.build_enter(EffectName::FadeZoom, &BuildContext::default(), &s, None, &p);
        assert!(tl.animates(AnimatedProperty::Opacity));
        assert!(!tl.animates(AnimatedProperty::ScaleX));
        assert_eq!(registry.resolve("FadeZoom"), EffectName::Default);
    }

    #[test]
    fn test_empty_registry_still_builds() {
        let registry = EffectRegistry::empty();
        let s = surface();
        let p = AnimationParams::defaults_for(EffectName::Default);
        let tl = registry.build_exit(EffectName::PageCurl, &BuildContext::default(), &s, &p);
        assert_eq!(tl.animations.len(), 1);
    }

    #[test]
    fn test_dispatch_by_name() {
        let registry = EffectRegistry::builtin();
        let s = surface();
        let ctx = BuildContext::default();

        let p = AnimationParams::defaults_for(EffectName::ZoomRotate);
        let tl = registry.build_enter(EffectName::ZoomRotate, &ctx, &s, None, &p);
        assert!(tl.animates(AnimatedProperty::Angle));

        let p = AnimationParams::defaults_for(EffectName::CustomFade);
        let tl = registry.build_exit(EffectName::CustomFade, &ctx, &s, &p);
        assert_eq!(tl.animations.len(), 1);
    }
}
