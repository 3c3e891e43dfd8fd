//! # Navigation 模块
//!
//! 方向导航输入与 Smart Slide 的方向锁存。
//!
//! ## 设计说明
//!
//! - `last` 随每次方向输入无条件覆盖
//! - `locked` 只在 Smart Slide 挂载时从 `last` 复制，直到下一次挂载前保持不变，
//!   保证同一次过渡的进入/退出方向一致

use serde::{Deserialize, Serialize};

use crate::params::SlideDirection;

/// 宿主采集的原始方向键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationKey {
    Left,
    Right,
    Up,
    Down,
}

impl From<NavigationKey> for SlideDirection {
    fn from(key: NavigationKey) -> Self {
        match key {
            NavigationKey::Left => SlideDirection::FromLeft,
            NavigationKey::Right => SlideDirection::FromRight,
            NavigationKey::Up => SlideDirection::FromTop,
            NavigationKey::Down => SlideDirection::FromBottom,
        }
    }
}

/// 方向追踪器
#[derive(Debug, Clone, Default)]
pub struct DirectionalTracker {
    last: SlideDirection,
    locked: SlideDirection,
}

impl DirectionalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次方向导航
    pub fn on_navigate(&mut self, direction: SlideDirection) {
        self.last = direction;
    }

    /// 记录一次方向键输入
    pub fn on_key(&mut self, key: NavigationKey) {
        self.on_navigate(key.into());
    }

    /// 锁定当前方向，供即将构建的 Smart Slide 时间轴使用
    pub fn lock_for_smart_slide(&mut self) -> SlideDirection {
        self.locked = self.last;
        self.locked
    }

    /// 最近一次导航方向
    pub fn last(&self) -> SlideDirection {
        self.last
    }

    /// 已锁定的方向
    pub fn locked(&self) -> SlideDirection {
        self.locked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_from_right() {
        let tracker = DirectionalTracker::new();
        assert_eq!(tracker.last(), SlideDirection::FromRight);
        assert_eq!(tracker.locked(), SlideDirection::FromRight);
    }

    #[test]
    fn test_lock_holds_until_next_lock() {
        let mut tracker = DirectionalTracker::new();
        tracker.on_key(NavigationKey::Left);
        assert_eq!(tracker.lock_for_smart_slide(), SlideDirection::FromLeft);

        // 锁定后的导航不影响已锁定方向
        tracker.on_key(NavigationKey::Down);
        assert_eq!(tracker.last(), SlideDirection::FromBottom);
        assert_eq!(tracker.locked(), SlideDirection::FromLeft);

        tracker.lock_for_smart_slide();
        assert_eq!(tracker.locked(), SlideDirection::FromBottom);
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(SlideDirection::from(NavigationKey::Up), SlideDirection::FromTop);
        assert_eq!(SlideDirection::from(NavigationKey::Right), SlideDirection::FromRight);
    }
}
