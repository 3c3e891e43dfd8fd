//! # Host 模块
//!
//! 宿主契约：transition-fx 对宿主 UI 的全部要求都在这里声明。
//!
//! ## 设计说明
//!
//! - 宿主拥有 UI 树与所有元素，本库只通过 [`ElementId`] 引用它们
//! - 过渡元素的内部部件（两个图片表面、遮暗装饰）通过 [`VisualHost::transition_parts`]
//!   以类型化接口暴露，不做运行时反射
//! - 回调被建模为"订阅 + 事件"：本库调用 [`VisualHost::subscribe`] 声明兴趣，
//!   宿主在对应时机把 [`HostEvent`] 送回
//! - 所有调用都发生在宿主的 UI 线程上，因此共享句柄使用 `Rc<RefCell<_>>`

pub mod memory;
mod surface;

use serde::{Deserialize, Serialize};

use crate::animation::Timeline;
use crate::error::HostError;
use crate::navigation::NavigationKey;

pub use surface::{BlurEffect, Decoration, DecorationHandle, Size, Surface, SurfaceHandle};

/// 元素唯一标识符
///
/// 由宿主分配，每个元素实例唯一。发现/监听集合以它作为身份键，
/// 结构相同的两个元素拥有不同的 ID。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl ElementId {
    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 元素在发现逻辑中的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElementKind {
    /// 双缓冲的过渡图片元素
    TransitionCapable,
    /// 内容可替换的通用容器（背景切换器）
    ContentHost,
    /// 已知无可挂载部件的包装元素
    OpaqueWrapper,
    /// 其他元素
    #[default]
    Plain,
}

/// 可订阅的宿主信号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// 元素加载完成（一次性）
    Loaded,
    /// 元素卸载
    Unloaded,
    /// 图片源变化
    SourceChanged,
    /// 容器内容变化
    ContentChanged,
    /// 尺寸可用（一次性）
    SizeChanged,
    /// 顶层布局更新
    LayoutUpdated,
    /// 方向导航输入
    NavigationInput,
}

/// 宿主送回的事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Loaded(ElementId),
    Unloaded(ElementId),
    SourceChanged(ElementId),
    ContentChanged(ElementId),
    SizeChanged(ElementId),
    LayoutUpdated,
    Navigate(NavigationKey),
}

/// 图片源属性上的数据绑定描述
///
/// 优先级绑定展开为多条。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBinding {
    /// 绑定的源元素名
    pub element_name: String,
    /// 属性路径
    pub path: String,
}

impl SourceBinding {
    pub fn new(element_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            element_name: element_name.into(),
            path: path.into(),
        }
    }
}

/// 过渡元素的时间轴槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimelineSlot {
    /// 表面 1 进入
    EnterPrimary,
    /// 表面 2 进入
    EnterSecondary,
    /// 表面 1 退出
    ExitPrimary,
    /// 表面 2 退出
    ExitSecondary,
    /// 遮暗装饰淡出
    DecorationExit,
}

impl TimelineSlot {
    pub const ALL: [TimelineSlot; 5] = [
        TimelineSlot::EnterPrimary,
        TimelineSlot::EnterSecondary,
        TimelineSlot::ExitPrimary,
        TimelineSlot::ExitSecondary,
        TimelineSlot::DecorationExit,
    ];
}

/// 过渡元素的内部部件
#[derive(Debug, Clone)]
pub struct TransitionParts {
    /// 第一个图片表面
    pub primary: SurfaceHandle,
    /// 第二个图片表面
    pub secondary: SurfaceHandle,
    /// 遮暗装饰（可选）
    pub decoration: Option<DecorationHandle>,
}

/// 宿主 UI 接口
///
/// 所有树查询都返回快照；宿主树可能在两次调用之间变化，调用方不能假设稳定。
pub trait VisualHost {
    // ── 树遍历 ──

    /// 所有顶层窗口
    fn top_level_windows(&self) -> Vec<ElementId>;

    /// 主窗口
    fn main_window(&self) -> Option<ElementId>;

    /// 子元素快照
    fn children(&self, id: ElementId) -> Vec<ElementId>;

    /// 元素名
    fn element_name(&self, id: ElementId) -> Option<String>;

    /// 完整类型名
    fn type_name(&self, id: ElementId) -> Option<String>;

    /// 元素角色
    fn element_kind(&self, id: ElementId) -> ElementKind;

    /// 是否已加载
    fn is_loaded(&self, id: ElementId) -> bool;

    /// 是否可见
    fn is_visible(&self, id: ElementId) -> bool;

    /// 实际布局尺寸（未测量时为 `None`）
    fn actual_size(&self, id: ElementId) -> Option<Size>;

    /// 容器当前内容
    fn content_of(&self, id: ElementId) -> Option<ElementId>;

    /// 图片源属性上的绑定
    fn source_bindings(&self, id: ElementId) -> Vec<SourceBinding>;

    // ── 过渡元素契约 ──

    /// 解析过渡元素的内部部件
    fn transition_parts(&self, id: ElementId) -> Result<TransitionParts, HostError>;

    /// 写入源切换延迟（毫秒）
    fn set_source_update_delay(&mut self, id: ElementId, delay_ms: f64) -> Result<(), HostError>;

    /// 写入时间轴槽位，覆盖旧值
    fn install_timeline(
        &mut self,
        id: ElementId,
        slot: TimelineSlot,
        timeline: Timeline,
    ) -> Result<(), HostError>;

    // ── 订阅 ──

    /// 声明对某信号的兴趣
    fn subscribe(&mut self, id: ElementId, signal: Signal) -> Result<(), HostError>;

    /// 取消订阅
    fn unsubscribe(&mut self, id: ElementId, signal: Signal);
}
