//! # Builders
//!
//! 各效果的进入/退出时间轴构建函数。
//!
//! 所有效果都以 0↔1 的不透明度淡化为基础；进入时若存在遮暗装饰，
//! 通过立即设值把它恢复为完全不透明。
//!
//! | 效果 | 进入附加 | 退出附加 |
//! |------|----------|----------|
//! | Default / CustomFade | 无 | 无 |
//! | FadeZoom | 缩放 zoom_start→1 | 缩放 1→收缩值 |
//! | PS5Slide | 平移 X distance→0 | 平移 X 0→-\|distance\|·0.5 |
//! | ZoomRotate | 缩放 + 旋转 angle→0 | 缩放 + 旋转 0→-angle·0.6 |
//! | PageCurl | 斜切 -skew→0 | 斜切 0→skew |
//! | BlurFade | 模糊 radius→0 | 模糊 0→radius |
//! | CustomSlide | 按配置方向平移 | 反向平移一半距离 |
//! | SmartSlide | 按锁定方向平移 | 反向平移一半距离 |

use super::BuildContext;
use crate::animation::{
    AnimatedProperty, EasingFunction, FillBehavior, PostCondition, PropertyAnimation, Timeline,
    ensure_blur, reset_translate,
};
use crate::host::{DecorationHandle, ElementId, SurfaceHandle};
use crate::params::{AnimationParams, SlideDirection};

/// 最短动画时长（秒）
pub const MIN_DURATION: f32 = 0.05;

/// 退出时长比进入短的量（秒）
const EXIT_SHORTEN: f32 = 0.1;

/// 退出平移相对进入距离的比例
const EXIT_SLIDE_RATIO: f32 = 0.5;

/// 退出旋转相对进入角度的比例
const EXIT_ROTATE_RATIO: f32 = 0.6;

/// 退出时长：`max(0.05, d - 0.1)`
pub fn exit_duration(duration: f32) -> f32 {
    (duration - EXIT_SHORTEN).max(MIN_DURATION)
}

/// 退出收缩缩放值
///
/// `zoom_start > 1` 时为 `max(1.0, zoom_start - 0.06)`，否则固定 1.02，
/// 退出终点始终不小于 1。
pub fn exit_zoom(zoom_start: f32) -> f32 {
    if zoom_start > 1.0 {
        (zoom_start - 0.06).max(1.0)
    } else {
        1.02
    }
}

fn surface_id(surface: &SurfaceHandle) -> ElementId {
    surface.borrow().id()
}

fn push_scale(
    tl: &mut Timeline,
    target: ElementId,
    from: f32,
    to: f32,
    duration: f32,
    easing: EasingFunction,
) {
    for property in [AnimatedProperty::ScaleX, AnimatedProperty::ScaleY] {
        tl.push(PropertyAnimation::new(target, property, from, to, duration).with_easing(easing));
    }
}

/// 平移轴与进入起点
fn slide_entry(direction: SlideDirection, distance: f32) -> (AnimatedProperty, f32) {
    let property = if direction.is_horizontal() {
        AnimatedProperty::TranslateX
    } else {
        AnimatedProperty::TranslateY
    };
    (property, direction.entry_sign() * distance.abs())
}

/// 平移轴与退出终点（与进入方向相反，一半距离）
fn slide_exit(direction: SlideDirection, distance: f32) -> (AnimatedProperty, f32) {
    let (property, entry) = slide_entry(direction, distance);
    (property, -entry * EXIT_SLIDE_RATIO)
}

// ── 基础淡化 ──

/// 淡入：不透明度 0→1
pub fn fade_in(
    _ctx: &BuildContext,
    surface: &SurfaceHandle,
    decoration: Option<&DecorationHandle>,
    p: &AnimationParams,
) -> Timeline {
    let mut tl = Timeline::new();
    tl.push(PropertyAnimation::new(
        surface_id(surface),
        AnimatedProperty::Opacity,
        0.0,
        1.0,
        p.duration,
    ));
    if let Some(decoration) = decoration {
        tl.set(decoration.borrow().id(), AnimatedProperty::Opacity, 1.0);
    }
    tl
}

/// 淡出：不透明度 1→0
pub fn fade_out(_ctx: &BuildContext, surface: &SurfaceHandle, p: &AnimationParams) -> Timeline {
    let mut tl = Timeline::new();
    tl.push(PropertyAnimation::new(
        surface_id(surface),
        AnimatedProperty::Opacity,
        1.0,
        0.0,
        p.duration,
    ));
    tl
}

// ── Fade + Zoom ──

pub fn fade_zoom_in(
    ctx: &BuildContext,
    surface: &SurfaceHandle,
    decoration: Option<&DecorationHandle>,
    p: &AnimationParams,
) -> Timeline {
    let mut tl = fade_in(ctx, surface, decoration, p);
    push_scale(
        &mut tl,
        surface_id(surface),
        p.zoom_start,
        1.0,
        p.duration,
        EasingFunction::EaseOutQuad,
    );
    tl
}

pub fn fade_zoom_out(ctx: &BuildContext, surface: &SurfaceHandle, p: &AnimationParams) -> Timeline {
    let mut tl = fade_out(ctx, surface, p);
    push_scale(
        &mut tl,
        surface_id(surface),
        1.0,
        exit_zoom(p.zoom_start),
        exit_duration(p.duration),
        EasingFunction::EaseInQuad,
    );
    tl
}

// ── PS5 Slide ──

pub fn ps5_slide_in(
    ctx: &BuildContext,
    surface: &SurfaceHandle,
    decoration: Option<&DecorationHandle>,
    p: &AnimationParams,
) -> Timeline {
    let mut tl = fade_in(ctx, surface, decoration, p);
    tl.push(
        PropertyAnimation::new(
            surface_id(surface),
            AnimatedProperty::TranslateX,
            p.slide_distance,
            0.0,
            p.slide_duration,
        )
        .with_easing(EasingFunction::EaseOutCubic),
    );
    tl
}

pub fn ps5_slide_out(ctx: &BuildContext, surface: &SurfaceHandle, p: &AnimationParams) -> Timeline {
    let mut tl = fade_out(ctx, surface, p);
    tl.push(
        PropertyAnimation::new(
            surface_id(surface),
            AnimatedProperty::TranslateX,
            0.0,
            -p.slide_distance.abs() * EXIT_SLIDE_RATIO,
            exit_duration(p.slide_duration),
        )
        .with_easing(EasingFunction::EaseInCubic),
    );
    tl
}

// ── Zoom + Rotate ──

pub fn zoom_rotate_in(
    ctx: &BuildContext,
    surface: &SurfaceHandle,
    decoration: Option<&DecorationHandle>,
    p: &AnimationParams,
) -> Timeline {
    let mut tl = fade_in(ctx, surface, decoration, p);
    let target = surface_id(surface);
    push_scale(
        &mut tl,
        target,
        p.zoom_start,
        1.0,
        p.duration,
        EasingFunction::EaseOutQuad,
    );
    tl.push(
        PropertyAnimation::new(target, AnimatedProperty::Angle, p.rotate_angle, 0.0, p.duration)
            .with_easing(EasingFunction::EaseOutQuad),
    );
    tl
}

pub fn zoom_rotate_out(
    ctx: &BuildContext,
    surface: &SurfaceHandle,
    p: &AnimationParams,
) -> Timeline {
    let mut tl = fade_out(ctx, surface, p);
    let target = surface_id(surface);
    push_scale(
        &mut tl,
        target,
        1.0,
        exit_zoom(p.zoom_start),
        exit_duration(p.duration),
        EasingFunction::EaseInQuad,
    );
    let end_angle = -p.rotate_angle.signum() * p.rotate_angle.abs() * EXIT_ROTATE_RATIO;
    tl.push(
        PropertyAnimation::new(target, AnimatedProperty::Angle, 0.0, end_angle, p.duration)
            .with_easing(EasingFunction::EaseInQuad),
    );
    tl
}

// ── Wave Curl ──

pub fn page_curl_in(
    ctx: &BuildContext,
    surface: &SurfaceHandle,
    decoration: Option<&DecorationHandle>,
    p: &AnimationParams,
) -> Timeline {
    let mut tl = fade_in(ctx, surface, decoration, p);
    tl.push(
        PropertyAnimation::new(
            surface_id(surface),
            AnimatedProperty::SkewX,
            -p.skew_angle,
            0.0,
            p.duration,
        )
        .with_easing(EasingFunction::EaseOutQuad),
    );
    tl
}

pub fn page_curl_out(ctx: &BuildContext, surface: &SurfaceHandle, p: &AnimationParams) -> Timeline {
    let mut tl = fade_out(ctx, surface, p);
    tl.push(
        PropertyAnimation::new(
            surface_id(surface),
            AnimatedProperty::SkewX,
            0.0,
            p.skew_angle,
            p.duration,
        )
        .with_easing(EasingFunction::EaseInQuad),
    );
    tl
}

// ── Blur Fade ──

pub fn blur_fade_in(
    ctx: &BuildContext,
    surface: &SurfaceHandle,
    decoration: Option<&DecorationHandle>,
    p: &AnimationParams,
) -> Timeline {
    let mut tl = fade_in(ctx, surface, decoration, p);
    ensure_blur(&mut surface.borrow_mut());
    tl.push(
        PropertyAnimation::new(
            surface_id(surface),
            AnimatedProperty::BlurRadius,
            p.blur_radius,
            0.0,
            p.duration,
        )
        .with_easing(EasingFunction::EaseOutQuad),
    );
    tl
}

pub fn blur_fade_out(ctx: &BuildContext, surface: &SurfaceHandle, p: &AnimationParams) -> Timeline {
    let mut tl = fade_out(ctx, surface, p);
    ensure_blur(&mut surface.borrow_mut());
    tl.push(
        PropertyAnimation::new(
            surface_id(surface),
            AnimatedProperty::BlurRadius,
            0.0,
            p.blur_radius,
            p.duration,
        )
        .with_easing(EasingFunction::EaseInQuad),
    );
    tl
}

// ── Custom Slide ──

pub fn custom_slide_in(
    ctx: &BuildContext,
    surface: &SurfaceHandle,
    decoration: Option<&DecorationHandle>,
    p: &AnimationParams,
) -> Timeline {
    let mut tl = fade_in(ctx, surface, decoration, p);
    let (property, from) = slide_entry(p.slide_direction, p.slide_distance);
    tl.push(
        PropertyAnimation::new(surface_id(surface), property, from, 0.0, p.slide_duration)
            .with_easing(EasingFunction::EaseOutCubic),
    );
    tl
}

pub fn custom_slide_out(
    ctx: &BuildContext,
    surface: &SurfaceHandle,
    p: &AnimationParams,
) -> Timeline {
    let mut tl = fade_out(ctx, surface, p);
    let (property, to) = slide_exit(p.slide_direction, p.slide_distance);
    tl.push(
        PropertyAnimation::new(
            surface_id(surface),
            property,
            0.0,
            to,
            exit_duration(p.slide_duration),
        )
        .with_easing(EasingFunction::EaseInCubic),
    );
    tl
}

// ── Smart Slide ──

/// Smart Slide 进入
///
/// 方向取自 `ctx.locked_direction`。平移动画结束后恢复原值，
/// 并要求宿主在完成后把平移归零。
pub fn smart_slide_in(
    ctx: &BuildContext,
    surface: &SurfaceHandle,
    decoration: Option<&DecorationHandle>,
    p: &AnimationParams,
) -> Timeline {
    reset_translate(&surface.borrow());
    let target = surface_id(surface);
    let mut tl = fade_in(ctx, surface, decoration, p);
    let (property, from) = slide_entry(ctx.locked_direction, p.slide_distance);
    tl.push(
        PropertyAnimation::new(target, property, from, 0.0, p.slide_duration)
            .with_easing(EasingFunction::EaseOutCubic)
            .with_fill(FillBehavior::Stop),
    );
    tl.on_complete(PostCondition::ResetTranslate { target });
    tl
}

/// Smart Slide 退出
pub fn smart_slide_out(
    ctx: &BuildContext,
    surface: &SurfaceHandle,
    p: &AnimationParams,
) -> Timeline {
    reset_translate(&surface.borrow());
    let target = surface_id(surface);
    let mut tl = fade_out(ctx, surface, p);
    let (property, to) = slide_exit(ctx.locked_direction, p.slide_distance);
    tl.push(
        PropertyAnimation::new(target, property, 0.0, to, exit_duration(p.slide_duration))
            .with_easing(EasingFunction::EaseInCubic)
            .with_fill(FillBehavior::Stop),
    );
    tl.on_complete(PostCondition::ResetTranslate { target });
    tl
}

// ── 遮暗装饰 ──

/// 遮暗装饰淡出：1→0，结束后恢复
pub fn decoration_fade_out(decoration: &DecorationHandle, duration: f32) -> Timeline {
    let mut tl = Timeline::new();
    tl.push(
        PropertyAnimation::new(
            decoration.borrow().id(),
            AnimatedProperty::Opacity,
            1.0,
            0.0,
            duration,
        )
        .with_fill(FillBehavior::Stop),
    );
    tl
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{Transform, TransformKind, normalize};
    use crate::host::{Decoration, Surface};
    use crate::params::EffectName;

    fn ctx() -> BuildContext {
        BuildContext::default()
    }

    fn surface() -> SurfaceHandle {
        let mut s = Surface::new(ElementId(10));
        normalize(&mut s);
        s.into_handle()
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_fade_baseline_and_decoration_snap() {
        let s = surface();
        let d = Decoration::new(ElementId(11)).into_handle();
        let p = AnimationParams::defaults_for(EffectName::CustomFade);

        let enter = fade_in(&ctx(), &s, Some(&d), &p);
        let fade = enter.animation_for(AnimatedProperty::Opacity).unwrap();
        assert_eq!((fade.from, fade.to, fade.duration), (0.0, 1.0, 0.5));
        assert_eq!(fade.fill, FillBehavior::HoldEnd);
        assert_eq!(enter.setters.len(), 1);
        assert_eq!(enter.setters[0].target, ElementId(11));
        assert_eq!(enter.setters[0].value, 1.0);

        let exit = fade_out(&ctx(), &s, &p);
        let fade = exit.animation_for(AnimatedProperty::Opacity).unwrap();
        assert_eq!((fade.from, fade.to), (1.0, 0.0));
        assert!(exit.setters.is_empty());
    }

    #[test]
    fn test_exit_zoom_formula() {
        assert!(approx(exit_zoom(1.08), 1.02));
        assert_eq!(exit_zoom(1.03), 1.0);
        assert_eq!(exit_zoom(1.0), 1.02);
        assert_eq!(exit_zoom(0.8), 1.02);
    }

    #[test]
    fn test_exit_duration_floor() {
        assert!(approx(exit_duration(0.4), 0.3));
        assert_eq!(exit_duration(0.1), MIN_DURATION);
        assert_eq!(exit_duration(0.05), MIN_DURATION);
    }

    #[test]
    fn test_ps5_slide() {
        let s = surface();
        let p = AnimationParams {
            slide_distance: 40.0,
            slide_duration: 0.4,
            ..AnimationParams::defaults_for(EffectName::PS5Slide)
        };

        let enter = ps5_slide_in(&ctx(), &s, None, &p);
        let tx = enter.animation_for(AnimatedProperty::TranslateX).unwrap();
        assert_eq!((tx.from, tx.to, tx.duration), (40.0, 0.0, 0.4));
        assert_eq!(tx.easing, EasingFunction::EaseOutCubic);

        let exit = ps5_slide_out(&ctx(), &s, &p);
        let tx = exit.animation_for(AnimatedProperty::TranslateX).unwrap();
        assert_eq!((tx.from, tx.to), (0.0, -20.0));
        assert!(approx(tx.duration, 0.3));
        assert_eq!(tx.easing, EasingFunction::EaseInCubic);
    }

    #[test]
    fn test_ps5_exit_uses_magnitude() {
        let s = surface();
        let p = AnimationParams {
            slide_distance: -60.0,
            slide_duration: 0.12,
            ..AnimationParams::defaults_for(EffectName::PS5Slide)
        };
        let exit = ps5_slide_out(&ctx(), &s, &p);
        let tx = exit.animation_for(AnimatedProperty::TranslateX).unwrap();
        assert_eq!(tx.to, -30.0);
        assert_eq!(tx.duration, MIN_DURATION);
    }

    #[test]
    fn test_fade_zoom() {
        let s = surface();
        let p = AnimationParams::defaults_for(EffectName::FadeZoom);

        let enter = fade_zoom_in(&ctx(), &s, None, &p);
        for prop in [AnimatedProperty::ScaleX, AnimatedProperty::ScaleY] {
            let a = enter.animation_for(prop).unwrap();
            assert_eq!((a.from, a.to, a.duration), (1.08, 1.0, 0.5));
            assert_eq!(a.easing, EasingFunction::EaseOutQuad);
        }

        let exit = fade_zoom_out(&ctx(), &s, &p);
        let sx = exit.animation_for(AnimatedProperty::ScaleX).unwrap();
        assert_eq!(sx.from, 1.0);
        assert!(approx(sx.to, 1.02));
        assert!(approx(sx.duration, 0.4));
        assert_eq!(sx.easing, EasingFunction::EaseInQuad);
    }

    #[test]
    fn test_zoom_rotate() {
        let s = surface();
        let p = AnimationParams::defaults_for(EffectName::ZoomRotate);

        let enter = zoom_rotate_in(&ctx(), &s, None, &p);
        let rot = enter.animation_for(AnimatedProperty::Angle).unwrap();
        assert_eq!((rot.from, rot.to), (8.0, 0.0));

        let exit = zoom_rotate_out(&ctx(), &s, &p);
        let rot = exit.animation_for(AnimatedProperty::Angle).unwrap();
        assert!(approx(rot.to, -4.8));
        assert_eq!(rot.duration, 0.5);

        let negative = AnimationParams {
            rotate_angle: -10.0,
            ..p
        };
        let exit = zoom_rotate_out(&ctx(), &s, &negative);
        let rot = exit.animation_for(AnimatedProperty::Angle).unwrap();
        assert!(approx(rot.to, 6.0));
    }

    #[test]
    fn test_page_curl() {
        let s = surface();
        let p = AnimationParams::defaults_for(EffectName::PageCurl);
        let enter = page_curl_in(&ctx(), &s, None, &p);
        let skew = enter.animation_for(AnimatedProperty::SkewX).unwrap();
        assert_eq!((skew.from, skew.to), (-18.0, 0.0));

        let exit = page_curl_out(&ctx(), &s, &p);
        let skew = exit.animation_for(AnimatedProperty::SkewX).unwrap();
        assert_eq!((skew.from, skew.to, skew.duration), (0.0, 18.0, 0.5));
    }

    #[test]
    fn test_blur_fade_attaches_blur() {
        let s = surface();
        assert!(s.borrow().blur.is_none());
        let p = AnimationParams::defaults_for(EffectName::BlurFade);

        let enter = blur_fade_in(&ctx(), &s, None, &p);
        assert!(s.borrow().blur.is_some());
        let blur = enter.animation_for(AnimatedProperty::BlurRadius).unwrap();
        assert_eq!((blur.from, blur.to), (40.0, 0.0));

        let exit = blur_fade_out(&ctx(), &s, &p);
        let blur = exit.animation_for(AnimatedProperty::BlurRadius).unwrap();
        assert_eq!((blur.from, blur.to), (0.0, 40.0));
    }

    #[test]
    fn test_custom_slide_directions() {
        let s = surface();
        let cases = [
            (SlideDirection::FromLeft, AnimatedProperty::TranslateX, -40.0, 20.0),
            (SlideDirection::FromRight, AnimatedProperty::TranslateX, 40.0, -20.0),
            (SlideDirection::FromTop, AnimatedProperty::TranslateY, -40.0, 20.0),
            (SlideDirection::FromBottom, AnimatedProperty::TranslateY, 40.0, -20.0),
        ];

        for (direction, property, entry, exit_to) in cases {
            let p = AnimationParams {
                slide_direction: direction,
                slide_distance: -40.0,
                ..AnimationParams::defaults_for(EffectName::CustomSlide)
            };
            let enter = custom_slide_in(&ctx(), &s, None, &p);
            let a = enter.animation_for(property).unwrap();
            assert_eq!((a.from, a.to), (entry, 0.0), "{direction:?}");

            let exit = custom_slide_out(&ctx(), &s, &p);
            let a = exit.animation_for(property).unwrap();
            assert_eq!((a.from, a.to), (0.0, exit_to), "{direction:?}");
        }
    }

    #[test]
    fn test_smart_slide_uses_locked_direction() {
        let s = surface();
        let p = AnimationParams::defaults_for(EffectName::SmartSlide);
        let ctx = BuildContext {
            locked_direction: SlideDirection::FromLeft,
        };

        let enter = smart_slide_in(&ctx, &s, None, &p);
        let tx = enter.animation_for(AnimatedProperty::TranslateX).unwrap();
        assert_eq!(tx.from, -40.0);
        assert_eq!(tx.fill, FillBehavior::Stop);
        assert_eq!(
            enter.post_conditions,
            vec![PostCondition::ResetTranslate {
                target: ElementId(10)
            }]
        );
        // 淡化部分仍保持终值
        let fade = enter.animation_for(AnimatedProperty::Opacity).unwrap();
        assert_eq!(fade.fill, FillBehavior::HoldEnd);

        let exit = smart_slide_out(&ctx, &s, &p);
        let tx = exit.animation_for(AnimatedProperty::TranslateX).unwrap();
        assert_eq!(tx.to, 20.0);
        assert_eq!(tx.fill, FillBehavior::Stop);
    }

    #[test]
    fn test_smart_slide_resets_translate_before_build() {
        let s = surface();
        let translate = s
            .borrow()
            .render_transform
            .as_ref()
            .unwrap()
            .find(TransformKind::Translate)
            .unwrap();
        *translate.borrow_mut() = Transform::Translate { x: 13.0, y: 7.0 };

        let p = AnimationParams::defaults_for(EffectName::SmartSlide);
        smart_slide_in(&ctx(), &s, None, &p);
        assert_eq!(*translate.borrow(), Transform::Translate { x: 0.0, y: 0.0 });
    }

    #[test]
    fn test_decoration_fade_out() {
        let d = Decoration::new(ElementId(3)).into_handle();
        let tl = decoration_fade_out(&d, 0.5);
        let a = tl.animation_for(AnimatedProperty::Opacity).unwrap();
        assert_eq!((a.target, a.from, a.to, a.duration), (ElementId(3), 1.0, 0.0, 0.5));
        assert_eq!(a.fill, FillBehavior::Stop);
    }
}
