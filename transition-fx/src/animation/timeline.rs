//! # Timeline 模块
//!
//! 声明式时间轴：一组并行的属性动画，外加起始设值与完成后的后置条件。
//!
//! 构建时间轴是纯操作，只返回值；播放由宿主完成。

use serde::{Deserialize, Serialize};

use super::EasingFunction;
use super::TransformKind;
use crate::host::ElementId;

/// 可动画属性
///
/// 变换类属性指向变换栈中的固定槽位，见 [`TransformKind::slot`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimatedProperty {
    /// 不透明度
    Opacity,
    /// 缩放 X（槽位 0）
    ScaleX,
    /// 缩放 Y（槽位 0）
    ScaleY,
    /// 平移 X（槽位 1）
    TranslateX,
    /// 平移 Y（槽位 1）
    TranslateY,
    /// 旋转角度（槽位 2）
    Angle,
    /// 斜切 X（槽位 3）
    SkewX,
    /// 模糊半径
    BlurRadius,
}

impl AnimatedProperty {
    /// 属性所在的变换通道
    pub fn transform_kind(&self) -> Option<TransformKind> {
        match self {
            AnimatedProperty::ScaleX | AnimatedProperty::ScaleY => Some(TransformKind::Scale),
            AnimatedProperty::TranslateX | AnimatedProperty::TranslateY => {
                Some(TransformKind::Translate)
            }
            AnimatedProperty::Angle => Some(TransformKind::Rotate),
            AnimatedProperty::SkewX => Some(TransformKind::Skew),
            AnimatedProperty::Opacity | AnimatedProperty::BlurRadius => None,
        }
    }

    /// 宿主侧的属性路径
    pub fn path(&self) -> &'static str {
        match self {
            AnimatedProperty::Opacity => "Opacity",
            AnimatedProperty::ScaleX => "RenderTransform.Children[0].ScaleX",
            AnimatedProperty::ScaleY => "RenderTransform.Children[0].ScaleY",
            AnimatedProperty::TranslateX => "RenderTransform.Children[1].X",
            AnimatedProperty::TranslateY => "RenderTransform.Children[1].Y",
            AnimatedProperty::Angle => "RenderTransform.Children[2].Angle",
            AnimatedProperty::SkewX => "RenderTransform.Children[3].AngleX",
            AnimatedProperty::BlurRadius => "Effect.Radius",
        }
    }
}

/// 动画结束后的取值行为
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillBehavior {
    /// 保持终值
    #[default]
    HoldEnd,
    /// 恢复为动画前的值
    Stop,
}

/// 单个属性动画
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyAnimation {
    /// 目标元素
    pub target: ElementId,
    /// 目标属性
    pub property: AnimatedProperty,
    /// 起始值
    pub from: f32,
    /// 目标值
    pub to: f32,
    /// 动画时长（秒）
    pub duration: f32,
    /// 缓动函数
    pub easing: EasingFunction,
    /// 结束后的取值行为
    pub fill: FillBehavior,
}

impl PropertyAnimation {
    /// 创建线性、保持终值的动画
    pub fn new(
        target: ElementId,
        property: AnimatedProperty,
        from: f32,
        to: f32,
        duration: f32,
    ) -> Self {
        Self {
            target,
            property,
            from,
            to,
            duration: duration.max(0.0),
            easing: EasingFunction::Linear,
            fill: FillBehavior::HoldEnd,
        }
    }

    /// 设置缓动函数
    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    /// 设置结束行为
    pub fn with_fill(mut self, fill: FillBehavior) -> Self {
        self.fill = fill;
        self
    }

    /// 指定时刻的值
    ///
    /// 超过时长后返回终值；是否保持由宿主按 `fill` 处理。
    pub fn value_at(&self, elapsed: f32) -> f32 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let progress = self.easing.apply(elapsed / self.duration);
        self.from + (self.to - self.from) * progress
    }
}

/// 时间轴开始时立即生效的设值（无过渡）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySetter {
    pub target: ElementId,
    pub property: AnimatedProperty,
    pub value: f32,
}

/// 时间轴完成后宿主必须满足的后置条件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostCondition {
    /// 目标表面的平移通道归零
    ResetTranslate { target: ElementId },
}

/// 声明式时间轴
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// 并行的属性动画
    pub animations: Vec<PropertyAnimation>,
    /// 开始时的立即设值
    pub setters: Vec<PropertySetter>,
    /// 完成后的后置条件
    pub post_conditions: Vec<PostCondition>,
}

impl Timeline {
    /// 空时间轴
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加属性动画
    pub fn push(&mut self, animation: PropertyAnimation) -> &mut Self {
        self.animations.push(animation);
        self
    }

    /// 添加立即设值
    pub fn set(&mut self, target: ElementId, property: AnimatedProperty, value: f32) -> &mut Self {
        self.setters.push(PropertySetter {
            target,
            property,
            value,
        });
        self
    }

    /// 添加后置条件
    pub fn on_complete(&mut self, condition: PostCondition) -> &mut Self {
        self.post_conditions.push(condition);
        self
    }

    /// 时间轴总时长（最长的动画）
    pub fn total_duration(&self) -> f32 {
        self.animations
            .iter()
            .map(|a| a.duration)
            .fold(0.0, f32::max)
    }

    /// 查找第一个作用于指定属性的动画
    pub fn animation_for(&self, property: AnimatedProperty) -> Option<&PropertyAnimation> {
        self.animations.iter().find(|a| a.property == property)
    }

    /// 是否包含指定属性的动画
    pub fn animates(&self, property: AnimatedProperty) -> bool {
        self.animation_for(property).is_some()
    }
}
