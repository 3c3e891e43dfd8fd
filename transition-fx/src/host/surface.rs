//! 过渡元素内部部件的共享状态。

use std::cell::RefCell;
use std::rc::Rc;

use crate::animation::{TransformGroup, Vec2};

use super::ElementId;

/// 布局尺寸
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// 宽高都大于 0
    pub fn is_measured(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// 模糊效果
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlurEffect {
    pub radius: f32,
}

/// 图片表面
#[derive(Debug, Clone)]
pub struct Surface {
    id: ElementId,
    /// 不透明度
    pub opacity: f32,
    /// 变换栈
    pub render_transform: Option<TransformGroup>,
    /// 变换原点（相对尺寸）
    pub transform_origin: Vec2,
    /// 模糊效果
    pub blur: Option<BlurEffect>,
    /// 实际尺寸
    pub actual_size: Size,
}

impl Surface {
    pub fn new(id: ElementId) -> Self {
        Self {
            id,
            opacity: 1.0,
            render_transform: None,
            transform_origin: Vec2::zero(),
            blur: None,
            actual_size: Size::default(),
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    /// 包装为共享句柄
    pub fn into_handle(self) -> SurfaceHandle {
        Rc::new(RefCell::new(self))
    }
}

/// 遮暗装饰
#[derive(Debug, Clone)]
pub struct Decoration {
    id: ElementId,
    pub opacity: f32,
}

impl Decoration {
    pub fn new(id: ElementId) -> Self {
        Self { id, opacity: 1.0 }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn into_handle(self) -> DecorationHandle {
        Rc::new(RefCell::new(self))
    }
}

/// 表面共享句柄
pub type SurfaceHandle = Rc<RefCell<Surface>>;

/// 装饰共享句柄
pub type DecorationHandle = Rc<RefCell<Decoration>>;
