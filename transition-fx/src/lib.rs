//! # Transition FX
//!
//! 为宿主 UI 的"过渡图片"元素提供可配置的切换动画（淡入淡出、滑动、缩放、旋转、
//! 斜切、模糊）。
//!
//! ## 架构概述
//!
//! `transition-fx` 是纯逻辑核心，不负责渲染像素，也不拥有宿主 UI 树。
//! 它通过 [`VisualHost`] trait 与宿主通信：
//!
//! ```text
//! Host                                   transition-fx
//!   │                                          │
//!   │──── HostEvent / on_retry_tick ─────────►│ DiscoveryWatcher
//!   │                                          │   → AttachmentEngine
//!   │                                          │     → EffectRegistry → Timeline
//!   │◄─── install_timeline / subscribe ───────│
//!   │                                          │
//! ```
//!
//! ## 核心类型
//!
//! - [`TransitionExtension`]：对外门面，串起发现、挂载与设置编辑
//! - [`AttachmentEngine`]：为单个过渡元素构建并安装时间轴
//! - [`DiscoveryWatcher`]：在宿主树中发现过渡元素并监听其变化
//! - [`EffectRegistry`]：效果名 → 进入/退出时间轴构建函数
//! - [`SettingsModel`]：效果参数、默认值表与持久化
//! - [`DirectionalTracker`]：Smart Slide 使用的导航方向锁存
//!
//! ## 模块结构
//!
//! - [`animation`]：缓动、变换栈、声明式时间轴
//! - [`effects`]：效果注册表与各效果构建函数
//! - [`params`]：效果名、参数与默认值表
//! - [`settings`]：设置模型与持久化边界
//! - [`navigation`]：方向追踪
//! - [`attach`]：挂载引擎
//! - [`discovery`]：树遍历与监听状态机
//! - [`host`]：宿主契约与内存实现
//! - [`config`]：发现策略配置
//! - [`error`]：错误类型

pub mod animation;
pub mod attach;
pub mod config;
pub mod discovery;
pub mod effects;
pub mod error;
pub mod extension;
pub mod host;
pub mod navigation;
pub mod params;
pub mod settings;

// 重导出核心类型
pub use animation::{
    AnimatedProperty, EasingFunction, FillBehavior, PostCondition, PropertyAnimation,
    PropertySetter, Timeline, Transform, TransformGroup, TransformKind, Vec2,
};
pub use attach::{AttachOutcome, AttachmentEngine};
pub use config::DiscoveryConfig;
pub use discovery::{BootstrapStatus, DiscoveryWatcher, ElementState};
pub use effects::{BuildContext, EffectEntry, EffectRegistry};
pub use error::{FxError, FxResult, HostError};
pub use extension::TransitionExtension;
pub use host::{
    Decoration, ElementId, ElementKind, HostEvent, Signal, Size, SourceBinding, Surface,
    TimelineSlot, TransitionParts, VisualHost,
};
pub use navigation::{DirectionalTracker, NavigationKey};
pub use params::{AnimationParams, EffectName, ParamFlags, SlideDirection};
pub use settings::{EffectSettings, JsonFileStore, MemoryStore, SettingsModel, SettingsStore};
