//! # Params 模块
//!
//! 效果名、效果参数与内置默认值表。
//! 这是所有效果名称、默认参数、取值范围的**唯一来源**。

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// 效果名
///
/// 固定的封闭集合，同时作为 [`EffectRegistry`](crate::EffectRegistry) 与参数表的键。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffectName {
    /// 宿主默认的交叉淡化
    Default,
    /// 可调时长的淡化
    CustomFade,
    /// 模糊 + 淡化
    BlurFade,
    /// 淡化 + 缩放
    FadeZoom,
    /// 水平滑入（PS5 风格）
    PS5Slide,
    /// 按配置方向滑入
    CustomSlide,
    /// 缩放 + 旋转
    ZoomRotate,
    /// 斜切卷页
    PageCurl,
    /// 按最近一次导航方向滑入
    SmartSlide,
}

impl EffectName {
    /// 注册表顺序
    pub const ALL: [EffectName; 9] = [
        EffectName::Default,
        EffectName::CustomFade,
        EffectName::FadeZoom,
        EffectName::PS5Slide,
        EffectName::CustomSlide,
        EffectName::SmartSlide,
        EffectName::ZoomRotate,
        EffectName::PageCurl,
        EffectName::BlurFade,
    ];

    /// 面向用户的显示名
    pub fn display_name(&self) -> &'static str {
        match self {
            EffectName::Default => "Default",
            EffectName::CustomFade => "Custom Fade",
            EffectName::BlurFade => "Blur Fade",
            EffectName::FadeZoom => "Fade + Zoom",
            EffectName::PS5Slide => "PS5 Simple Slide",
            EffectName::CustomSlide => "Custom Slide",
            EffectName::ZoomRotate => "Zoom + Rotate",
            EffectName::PageCurl => "Wave Curl",
            EffectName::SmartSlide => "Smart Slide",
        }
    }

    /// 标识符名（与序列化形式一致）
    pub fn ident(&self) -> &'static str {
        match self {
            EffectName::Default => "Default",
            EffectName::CustomFade => "CustomFade",
            EffectName::BlurFade => "BlurFade",
            EffectName::FadeZoom => "FadeZoom",
            EffectName::PS5Slide => "PS5Slide",
            EffectName::CustomSlide => "CustomSlide",
            EffectName::ZoomRotate => "ZoomRotate",
            EffectName::PageCurl => "PageCurl",
            EffectName::SmartSlide => "SmartSlide",
        }
    }

    /// 从标识符名或显示名解析（大小写不敏感）
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|effect| {
            effect.ident().eq_ignore_ascii_case(name)
                || effect.display_name().eq_ignore_ascii_case(name)
        })
    }

    /// 是否是平移类效果（可能需要滑动缩放补偿）
    pub fn is_slide(&self) -> bool {
        matches!(
            self,
            EffectName::PS5Slide | EffectName::CustomSlide | EffectName::SmartSlide
        )
    }
}

impl std::fmt::Display for EffectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// 滑动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SlideDirection {
    /// 从右侧进入
    #[default]
    FromRight,
    /// 从左侧进入
    FromLeft,
    /// 从下方进入
    FromBottom,
    /// 从上方进入
    FromTop,
}

impl SlideDirection {
    /// 是否沿水平轴
    pub fn is_horizontal(&self) -> bool {
        matches!(self, SlideDirection::FromLeft | SlideDirection::FromRight)
    }

    /// 进入起点的符号
    ///
    /// 从左/上进入时起点在负方向，向中心移动。
    pub fn entry_sign(&self) -> f32 {
        match self {
            SlideDirection::FromLeft | SlideDirection::FromTop => -1.0,
            SlideDirection::FromRight | SlideDirection::FromBottom => 1.0,
        }
    }
}

bitflags! {
    /// 参数位掩码
    ///
    /// 声明某个效果实际使用哪些参数，设置界面据此决定显示哪些控件。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ParamFlags: u32 {
        const DURATION = 1;
        const ZOOM_START = 2;
        const SLIDE_DISTANCE = 4;
        const SLIDE_DURATION = 8;
        const ROTATE_ANGLE = 16;
        const SKEW_ANGLE = 32;
        const BLUR_RADIUS = 64;
        const SLIDE_DIRECTION = 128;
        const SLIDE_ZOOM = 256;
    }
}

impl Default for ParamFlags {
    fn default() -> Self {
        ParamFlags::DURATION
    }
}

/// 闭区间取值范围
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
}

impl ParamRange {
    const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// 饱和到区间内，NaN 落到下界
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }
}

/// 各参数提交时的取值范围
pub mod ranges {
    use super::ParamRange;

    pub const DURATION: ParamRange = ParamRange::new(0.05, 1.0);
    pub const ZOOM_START: ParamRange = ParamRange::new(0.5, 2.0);
    pub const SLIDE_DISTANCE: ParamRange = ParamRange::new(-200.0, 200.0);
    pub const SLIDE_DURATION: ParamRange = ParamRange::new(0.05, 1.0);
    pub const ROTATE_ANGLE: ParamRange = ParamRange::new(-180.0, 180.0);
    pub const SKEW_ANGLE: ParamRange = ParamRange::new(-89.0, 89.0);
    pub const BLUR_RADIUS: ParamRange = ParamRange::new(0.0, 100.0);
}

/// 单个效果的参数集
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationParams {
    /// 实际生效的参数
    pub used_params: ParamFlags,
    /// 淡化时长（秒）
    pub duration: f32,
    /// 起始缩放
    pub zoom_start: f32,
    /// 滑动距离（像素）
    pub slide_distance: f32,
    /// 滑动时长（秒）
    pub slide_duration: f32,
    /// 旋转角度（度）
    pub rotate_angle: f32,
    /// 斜切角度（度）
    pub skew_angle: f32,
    /// 模糊半径
    pub blur_radius: f32,
    /// 滑动方向（CustomSlide）
    pub slide_direction: SlideDirection,
    /// 是否放大图片以免滑动时露出空白边缘
    pub slide_zoom: bool,
}

impl Default for AnimationParams {
    fn default() -> Self {
        Self {
            used_params: ParamFlags::DURATION,
            duration: 0.0,
            zoom_start: 0.0,
            slide_distance: 0.0,
            slide_duration: 0.0,
            rotate_angle: 0.0,
            skew_angle: 0.0,
            blur_radius: 0.0,
            slide_direction: SlideDirection::FromRight,
            slide_zoom: false,
        }
    }
}

impl AnimationParams {
    /// 内置默认值
    pub fn defaults_for(effect: EffectName) -> Self {
        use ParamFlags as F;

        let slide = |extra: ParamFlags| Self {
            duration: 0.4,
            slide_distance: 40.0,
            slide_duration: 0.4,
            used_params: F::DURATION | F::SLIDE_DISTANCE | F::SLIDE_DURATION | F::SLIDE_ZOOM | extra,
            ..Self::default()
        };

        match effect {
            EffectName::Default | EffectName::CustomFade => Self {
                duration: 0.5,
                used_params: F::DURATION,
                ..Self::default()
            },
            EffectName::FadeZoom => Self {
                duration: 0.5,
                zoom_start: 1.08,
                used_params: F::DURATION | F::ZOOM_START,
                ..Self::default()
            },
            EffectName::PS5Slide | EffectName::SmartSlide => slide(F::empty()),
            EffectName::CustomSlide => slide(F::SLIDE_DIRECTION),
            EffectName::ZoomRotate => Self {
                duration: 0.5,
                zoom_start: 1.08,
                rotate_angle: 8.0,
                used_params: F::DURATION | F::ZOOM_START | F::ROTATE_ANGLE,
                ..Self::default()
            },
            EffectName::PageCurl => Self {
                duration: 0.5,
                skew_angle: 18.0,
                used_params: F::DURATION | F::SKEW_ANGLE,
                ..Self::default()
            },
            EffectName::BlurFade => Self {
                duration: 0.5,
                blur_radius: 40.0,
                used_params: F::DURATION | F::BLUR_RADIUS,
                ..Self::default()
            },
        }
    }

    /// 用默认值覆盖全部数值字段与掩码
    ///
    /// 滑动方向与滑动缩放开关属于用户偏好，保持不变。
    pub fn reset_to(&mut self, defaults: &AnimationParams) {
        self.duration = defaults.duration;
        self.zoom_start = defaults.zoom_start;
        self.slide_distance = defaults.slide_distance;
        self.slide_duration = defaults.slide_duration;
        self.rotate_angle = defaults.rotate_angle;
        self.skew_angle = defaults.skew_angle;
        self.blur_radius = defaults.blur_radius;
        self.used_params = defaults.used_params;
    }

    /// 将所有数值字段饱和到取值范围
    pub fn clamp(&mut self) {
        self.duration = ranges::DURATION.clamp(self.duration);
        self.zoom_start = ranges::ZOOM_START.clamp(self.zoom_start);
        self.slide_distance = ranges::SLIDE_DISTANCE.clamp(self.slide_distance);
        self.slide_duration = ranges::SLIDE_DURATION.clamp(self.slide_duration);
        self.rotate_angle = ranges::ROTATE_ANGLE.clamp(self.rotate_angle);
        self.skew_angle = ranges::SKEW_ANGLE.clamp(self.skew_angle);
        self.blur_radius = ranges::BLUR_RADIUS.clamp(self.blur_radius);
    }

    /// 某参数是否生效
    pub fn uses(&self, flag: ParamFlags) -> bool {
        self.used_params.contains(flag)
    }
}
