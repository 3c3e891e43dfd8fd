//! # Transform 模块
//!
//! 表面的变换栈与规范化。
//!
//! 每个被动画的表面都持有一个固定顺序的 4 槽位变换栈：
//!
//! | 索引 | 通道 |
//! |------|------|
//! | 0 | 缩放 |
//! | 1 | 平移 |
//! | 2 | 旋转 |
//! | 3 | 斜切 |
//!
//! 不同效果只写自己的通道，互不覆盖。通道实例以 `Rc<RefCell<_>>` 共享给宿主，
//! 规范化只补齐缺失槽位，不替换已有实例。

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::host::{BlurEffect, Surface};

/// 二维向量
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    /// 创建新的向量
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// 零向量
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// 中心点 (0.5, 0.5)
    pub const fn center() -> Self {
        Self { x: 0.5, y: 0.5 }
    }
}

/// 变换通道类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransformKind {
    Scale,
    Translate,
    Rotate,
    Skew,
}

impl TransformKind {
    /// 固定槽位顺序
    pub const ORDER: [TransformKind; 4] = [
        TransformKind::Scale,
        TransformKind::Translate,
        TransformKind::Rotate,
        TransformKind::Skew,
    ];

    /// 在变换栈中的固定索引
    pub fn slot(&self) -> usize {
        match self {
            TransformKind::Scale => 0,
            TransformKind::Translate => 1,
            TransformKind::Rotate => 2,
            TransformKind::Skew => 3,
        }
    }

    /// 该通道的单位变换
    pub fn identity(&self) -> Transform {
        match self {
            TransformKind::Scale => Transform::Scale { x: 1.0, y: 1.0 },
            TransformKind::Translate => Transform::Translate { x: 0.0, y: 0.0 },
            TransformKind::Rotate => Transform::Rotate { angle: 0.0 },
            TransformKind::Skew => Transform::Skew { x: 0.0, y: 0.0 },
        }
    }
}

/// 单个变换通道
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Transform {
    /// 二维缩放
    Scale { x: f32, y: f32 },
    /// 二维平移（像素）
    Translate { x: f32, y: f32 },
    /// 旋转（度）
    Rotate { angle: f32 },
    /// 斜切（度）
    Skew { x: f32, y: f32 },
}

impl Transform {
    /// 通道类型
    pub fn kind(&self) -> TransformKind {
        match self {
            Transform::Scale { .. } => TransformKind::Scale,
            Transform::Translate { .. } => TransformKind::Translate,
            Transform::Rotate { .. } => TransformKind::Rotate,
            Transform::Skew { .. } => TransformKind::Skew,
        }
    }
}

/// 共享的变换通道实例
pub type TransformRef = Rc<RefCell<Transform>>;

/// 变换栈
#[derive(Debug, Clone, Default)]
pub struct TransformGroup {
    children: Vec<TransformRef>,
}

impl TransformGroup {
    /// 空变换栈
    pub fn new() -> Self {
        Self::default()
    }

    /// 完整的 4 槽位单位变换栈
    pub fn identity() -> Self {
        Self {
            children: TransformKind::ORDER
                .iter()
                .map(|kind| Rc::new(RefCell::new(kind.identity())))
                .collect(),
        }
    }

    /// 当前所有通道（按顺序）
    pub fn children(&self) -> &[TransformRef] {
        &self.children
    }

    /// 追加通道（宿主或测试构造部分栈时使用）
    pub fn push(&mut self, transform: Transform) -> TransformRef {
        let handle = Rc::new(RefCell::new(transform));
        self.children.push(handle.clone());
        handle
    }

    /// 查找第一个指定类型的通道
    pub fn find(&self, kind: TransformKind) -> Option<TransformRef> {
        self.children
            .iter()
            .find(|t| t.borrow().kind() == kind)
            .cloned()
    }

    /// 通道数量
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// 各槽位通道类型（用于校验顺序）
    pub fn kinds(&self) -> Vec<TransformKind> {
        self.children.iter().map(|t| t.borrow().kind()).collect()
    }

    /// 补齐缺失的通道，已有实例保持不变
    fn fill_missing(&mut self) {
        for kind in TransformKind::ORDER {
            if self.find(kind).is_none() {
                let index = kind.slot().min(self.children.len());
                self.children
                    .insert(index, Rc::new(RefCell::new(kind.identity())));
            }
        }
    }
}

/// 规范化表面的变换栈
///
/// - 无变换栈时创建完整的单位栈
/// - 已有变换栈时只补齐缺失槽位
/// - 每次调用都把变换原点设为中心
///
/// 可重复调用。
pub fn normalize(surface: &mut Surface) {
    match surface.render_transform.as_mut() {
        None => surface.render_transform = Some(TransformGroup::identity()),
        Some(group) => group.fill_missing(),
    }
    surface.transform_origin = Vec2::center();
}

/// 将所有平移通道归零
pub fn reset_translate(surface: &Surface) {
    let Some(group) = surface.render_transform.as_ref() else {
        return;
    };
    for transform in group.children() {
        if let Transform::Translate { x, y } = &mut *transform.borrow_mut() {
            *x = 0.0;
            *y = 0.0;
        }
    }
}

/// 设置缩放通道为均匀缩放
///
/// # 返回
/// - `true`: 找到缩放通道并已写入
/// - `false`: 表面尚未规范化
pub fn set_uniform_scale(surface: &Surface, scale: f32) -> bool {
    let Some(channel) = surface
        .render_transform
        .as_ref()
        .and_then(|g| g.find(TransformKind::Scale))
    else {
        return false;
    };
    *channel.borrow_mut() = Transform::Scale { x: scale, y: scale };
    true
}

/// 按需挂载模糊效果（半径 0）
pub fn ensure_blur(surface: &mut Surface) {
    if surface.blur.is_none() {
        surface.blur = Some(BlurEffect::default());
    }
}
