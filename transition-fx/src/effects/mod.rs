//! # Effects 模块
//!
//! 效果注册表：效果名 → 进入/退出时间轴构建函数。
//!
//! ## 核心组件
//!
//! - [`EffectRegistry`]：固定映射，未知效果降级为 `Default`
//! - [`BuildContext`]：构建时需要的外部状态（Smart Slide 的锁定方向）
//! - [`builders`]：各效果的构建函数
//!
//! ## 设计原则
//!
//! - **纯构建**：构建函数只返回 [`Timeline`](crate::Timeline)，唯一的副作用是
//!   Smart Slide 构建前的平移归零，以及 BlurFade 按需挂载模糊效果
//! - **通道独立**：每个效果只写变换栈中自己的槽位

pub mod builders;
mod registry;

pub use registry::{BuildContext, EffectEntry, EffectRegistry, EnterBuilder, ExitBuilder};
