//! # Animation 模块
//!
//! 声明式动画的数据模型，不负责播放。
//!
//! ## 核心设计理念
//!
//! 本模块只负责**描述**动画：
//! - 某个元素的某个属性从 A 到 B，在 duration 内按缓动变化
//! - 结束后保持终值还是恢复原值（[`FillBehavior`]）
//! - 播放完成后需要宿主执行的后置条件（[`PostCondition`]）
//!
//! 实际插值与合成由宿主已有的渲染层完成。
//!
//! ## 核心概念
//!
//! - `Timeline`: 一组并行的属性动画
//! - `TransformGroup`: 固定 4 槽位的变换栈（缩放、平移、旋转、斜切）
//! - `EasingFunction`: 缓动函数

mod easing;
mod timeline;
mod transform;

pub use easing::EasingFunction;
pub use timeline::{
    AnimatedProperty, FillBehavior, PostCondition, PropertyAnimation, PropertySetter, Timeline,
};
pub use transform::{
    Transform, TransformGroup, TransformKind, TransformRef, Vec2, ensure_blur, normalize,
    reset_translate, set_uniform_scale,
};
