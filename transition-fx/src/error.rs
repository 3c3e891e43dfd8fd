//! # Error 模块
//!
//! 定义 transition-fx 中使用的错误类型。
//!
//! 这些错误只在单个操作内部传递；发现/挂载的边界会记录日志后吞掉，
//! 不会传播到宿主。

use thiserror::Error;

use crate::host::{ElementId, Signal, TimelineSlot};

/// 宿主契约错误
///
/// 宿主元素的内部结构与预期不符（部件缺失、槽位不可写等）。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    /// 元素不存在（已被宿主销毁或 ID 无效）
    #[error("元素 {id} 不存在")]
    ElementNotFound { id: ElementId },

    /// 过渡元素缺少内部部件
    #[error("元素 {id} 缺少部件 '{part}'")]
    PartMissing { id: ElementId, part: &'static str },

    /// 时间轴槽位不可写
    #[error("元素 {id} 的时间轴槽位 {slot:?} 不可写")]
    SlotUnavailable { id: ElementId, slot: TimelineSlot },

    /// 属性不存在或不可写
    #[error("元素 {id} 的属性 '{property}' 不可用")]
    PropertyUnavailable {
        id: ElementId,
        property: &'static str,
    },

    /// 宿主拒绝订阅
    #[error("元素 {id} 不支持订阅 {signal:?}")]
    SubscriptionRefused { id: ElementId, signal: Signal },
}

/// transition-fx 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FxError {
    /// 宿主契约错误
    #[error("宿主错误: {0}")]
    Host(#[from] HostError),

    /// 设置读写失败
    #[error("设置 IO 错误: {path} - {message}")]
    SettingsIo { path: String, message: String },

    /// 设置格式错误
    #[error("设置格式错误: {message}")]
    SettingsFormat { message: String },

    /// 配置校验失败
    #[error("配置验证失败: {message}")]
    InvalidConfig { message: String },
}

/// Result 类型别名
pub type FxResult<T> = Result<T, FxError>;
