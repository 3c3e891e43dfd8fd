//! # Easing 模块
//!
//! 属性动画的插值曲线。进入动画用缓出（先快后慢落到原位），
//! 退出动画用缓入（先慢后快离开）。

use serde::{Deserialize, Serialize};

/// 缓动曲线
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EasingFunction {
    #[default]
    Linear,
    /// t²
    EaseInQuad,
    /// 1 - (1-t)²
    EaseOutQuad,
    /// t³
    EaseInCubic,
    /// 1 - (1-t)³
    EaseOutCubic,
}

impl EasingFunction {
    /// 把时间进度映射为插值进度，输入先饱和到 [0, 1]
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            EasingFunction::Linear => t,
            EasingFunction::EaseInQuad => t.powi(2),
            EasingFunction::EaseInCubic => t.powi(3),
            EasingFunction::EaseOutQuad => mirror(t, 2),
            EasingFunction::EaseOutCubic => mirror(t, 3),
        }
    }
}

/// 缓出 = 反向时间上的缓入再取补
fn mirror(t: f32, power: i32) -> f32 {
    1.0 - (1.0 - t).powi(power)
}
