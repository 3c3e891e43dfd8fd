//! # Memory Host
//!
//! [`VisualHost`] 的内存实现，用于测试与 `xtask simulate`。
//!
//! 元素树、订阅与已安装的时间轴全部保存在内存中。树变更方法只在对应信号
//! 已被订阅时才把 [`HostEvent`] 放入队列，调用方通过 [`MemoryHost::drain_events`]
//! 取出并转交给扩展，模拟宿主的事件分发。

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use super::{
    Decoration, ElementId, ElementKind, HostEvent, Signal, Size, SourceBinding, Surface,
    TimelineSlot, TransitionParts, VisualHost,
};
use crate::animation::{
    AnimatedProperty, FillBehavior, PostCondition, Timeline, Transform, reset_translate,
};
use crate::error::HostError;
use crate::navigation::NavigationKey;

/// 过渡元素的默认类型名
pub const TRANSITION_TYPE_NAME: &str = "Host.Controls.FadeImage";

#[derive(Debug, Clone, Default)]
struct Node {
    name: Option<String>,
    type_name: String,
    kind: ElementKind,
    children: Vec<ElementId>,
    loaded: bool,
    visible: bool,
    size: Option<Size>,
    content: Option<ElementId>,
    bindings: Vec<SourceBinding>,
    parts: Option<TransitionParts>,
    /// `break_parts` 暂存的部件
    stashed_parts: Option<TransitionParts>,
}

/// 内存宿主
#[derive(Debug, Default)]
pub struct MemoryHost {
    next_id: u64,
    nodes: HashMap<ElementId, Node>,
    windows: Vec<ElementId>,
    main_window: Option<ElementId>,
    subscriptions: HashSet<(ElementId, Signal)>,
    subscribe_calls: HashMap<(ElementId, Signal), usize>,
    installed: BTreeMap<(ElementId, TimelineSlot), Timeline>,
    install_log: Vec<(ElementId, TimelineSlot)>,
    delays: HashMap<ElementId, f64>,
    events: VecDeque<HostEvent>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, node: Node) -> ElementId {
        self.next_id += 1;
        let id = ElementId(self.next_id);
        self.nodes.insert(id, node);
        id
    }

    fn attach_child(&mut self, parent: ElementId, child: ElementId) {
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
    }

    fn queue(&mut self, id: ElementId, signal: Signal, event: HostEvent) {
        if self.subscriptions.contains(&(id, signal)) {
            self.events.push_back(event);
        }
    }

    // ── 构建树 ──

    /// 添加顶层窗口（已加载、可见）；第一个窗口成为主窗口
    pub fn add_window(&mut self, type_name: &str) -> ElementId {
        let id = self.alloc(Node {
            type_name: type_name.to_string(),
            loaded: true,
            visible: true,
            ..Node::default()
        });
        self.windows.push(id);
        self.main_window.get_or_insert(id);
        id
    }

    /// 添加普通元素（已加载、可见）
    pub fn add_element(&mut self, parent: ElementId, type_name: &str, kind: ElementKind) -> ElementId {
        let id = self.alloc(Node {
            type_name: type_name.to_string(),
            kind,
            loaded: true,
            visible: true,
            ..Node::default()
        });
        self.attach_child(parent, id);
        id
    }

    /// 添加过渡元素，连同两个图片表面与遮暗装饰
    pub fn add_transition_element(&mut self, parent: ElementId) -> ElementId {
        let id = self.add_element(parent, TRANSITION_TYPE_NAME, ElementKind::TransitionCapable);
        let primary = self.add_element(id, "Image", ElementKind::Plain);
        let secondary = self.add_element(id, "Image", ElementKind::Plain);
        let decoration = self.add_element(id, "Rectangle", ElementKind::Plain);

        if let Some(node) = self.nodes.get_mut(&id) {
            node.parts = Some(TransitionParts {
                primary: Surface::new(primary).into_handle(),
                secondary: Surface::new(secondary).into_handle(),
                decoration: Some(Decoration::new(decoration).into_handle()),
            });
        }
        id
    }

    /// 从游离状态创建元素（用作容器内容）
    pub fn create_detached(&mut self, type_name: &str, kind: ElementKind) -> ElementId {
        self.alloc(Node {
            type_name: type_name.to_string(),
            kind,
            loaded: true,
            visible: true,
            ..Node::default()
        })
    }

    /// 创建游离的过渡元素
    pub fn create_detached_transition(&mut self) -> ElementId {
        let holder = self.create_detached("Host", ElementKind::Plain);
        let id = self.add_transition_element(holder);
        if let Some(node) = self.nodes.get_mut(&holder) {
            node.children.clear();
        }
        self.nodes.remove(&holder);
        id
    }

    /// 在已有元素下挂一个游离元素
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) {
        self.attach_child(parent, child);
    }

    pub fn set_name(&mut self, id: ElementId, name: &str) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.name = Some(name.to_string());
        }
    }

    pub fn bind_source(&mut self, id: ElementId, binding: SourceBinding) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.bindings.push(binding);
        }
    }

    /// 移除过渡元素的内部部件，模拟宿主内部结构变化
    pub fn break_parts(&mut self, id: ElementId) {
        if let Some(node) = self.nodes.get_mut(&id)
            && let Some(parts) = node.parts.take()
        {
            node.stashed_parts = Some(parts);
        }
    }

    /// 恢复 `break_parts` 移除的部件
    pub fn repair_parts(&mut self, id: ElementId) {
        if let Some(node) = self.nodes.get_mut(&id)
            && let Some(parts) = node.stashed_parts.take()
        {
            node.parts = Some(parts);
        }
    }

    // ── 树变更（可能产生事件）──

    /// 修改加载状态
    pub fn set_loaded(&mut self, id: ElementId, loaded: bool) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        if node.loaded == loaded {
            return;
        }
        node.loaded = loaded;
        if loaded {
            self.queue(id, Signal::Loaded, HostEvent::Loaded(id));
        } else {
            self.queue(id, Signal::Unloaded, HostEvent::Unloaded(id));
        }
    }

    pub fn set_visible(&mut self, id: ElementId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.visible = visible;
        }
    }

    /// 替换容器内容
    pub fn set_content(&mut self, id: ElementId, content: Option<ElementId>) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        node.content = content;
        node.children = content.into_iter().collect();
        self.queue(id, Signal::ContentChanged, HostEvent::ContentChanged(id));
    }

    /// 图片源变化
    pub fn change_source(&mut self, id: ElementId) {
        self.queue(id, Signal::SourceChanged, HostEvent::SourceChanged(id));
    }

    /// 设置元素尺寸；过渡元素的两个表面同步更新
    pub fn set_size(&mut self, id: ElementId, size: Size) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        node.size = Some(size);

        let mut resized = vec![id];
        if let Some(parts) = node.parts.clone() {
            for surface in [&parts.primary, &parts.secondary] {
                surface.borrow_mut().actual_size = size;
                let surface_id = surface.borrow().id();
                if let Some(surface_node) = self.nodes.get_mut(&surface_id) {
                    surface_node.size = Some(size);
                }
                resized.push(surface_id);
            }
        }
        for target in resized {
            self.queue(target, Signal::SizeChanged, HostEvent::SizeChanged(target));
        }
    }

    /// 顶层布局更新
    pub fn layout_updated(&mut self) {
        let windows = self.windows.clone();
        if windows
            .iter()
            .any(|w| self.subscriptions.contains(&(*w, Signal::LayoutUpdated)))
        {
            self.events.push_back(HostEvent::LayoutUpdated);
        }
    }

    /// 方向键输入
    pub fn press(&mut self, key: NavigationKey) {
        if self
            .subscriptions
            .iter()
            .any(|(_, signal)| *signal == Signal::NavigationInput)
        {
            self.events.push_back(HostEvent::Navigate(key));
        }
    }

    /// 取出所有待分发事件
    pub fn drain_events(&mut self) -> Vec<HostEvent> {
        self.events.drain(..).collect()
    }

    // ── 观察 ──

    pub fn installed(&self, id: ElementId, slot: TimelineSlot) -> Option<&Timeline> {
        self.installed.get(&(id, slot))
    }

    /// 全部安装记录（按时间顺序）
    pub fn install_log(&self) -> &[(ElementId, TimelineSlot)] {
        &self.install_log
    }

    /// 某元素被安装时间轴的次数（五个槽位算一次完整挂载）
    pub fn attach_count(&self, id: ElementId) -> usize {
        self.install_log
            .iter()
            .filter(|(target, slot)| *target == id && *slot == TimelineSlot::EnterPrimary)
            .count()
    }

    pub fn is_subscribed(&self, id: ElementId, signal: Signal) -> bool {
        self.subscriptions.contains(&(id, signal))
    }

    /// 订阅调用次数（包括重复订阅）
    pub fn subscribe_calls(&self, id: ElementId, signal: Signal) -> usize {
        self.subscribe_calls.get(&(id, signal)).copied().unwrap_or(0)
    }

    pub fn source_update_delay(&self, id: ElementId) -> Option<f64> {
        self.delays.get(&id).copied()
    }

    /// 过渡元素的部件句柄（共享，非副本）
    pub fn parts(&self, id: ElementId) -> Option<TransitionParts> {
        self.nodes.get(&id).and_then(|n| n.parts.clone())
    }

    // ── 播放 ──

    /// 播放已安装的时间轴到结束状态
    ///
    /// 设值立即生效；`HoldEnd` 动画保持终值，`Stop` 动画恢复播放前的值；
    /// 最后执行后置条件。
    pub fn play(&mut self, id: ElementId, slot: TimelineSlot) {
        let Some(timeline) = self.installed.get(&(id, slot)).cloned() else {
            return;
        };
        let Some(parts) = self.parts(id) else {
            return;
        };

        for setter in &timeline.setters {
            write_property(&parts, setter.target, setter.property, setter.value);
        }
        for anim in &timeline.animations {
            if anim.fill == FillBehavior::HoldEnd {
                write_property(&parts, anim.target, anim.property, anim.to);
            }
        }
        for condition in &timeline.post_conditions {
            match condition {
                PostCondition::ResetTranslate { target } => {
                    for surface in [&parts.primary, &parts.secondary] {
                        if surface.borrow().id() == *target {
                            reset_translate(&surface.borrow());
                        }
                    }
                }
            }
        }
    }
}

fn write_property(parts: &TransitionParts, target: ElementId, property: AnimatedProperty, value: f32) {
    if let Some(decoration) = parts.decoration.as_ref()
        && decoration.borrow().id() == target
    {
        if property == AnimatedProperty::Opacity {
            decoration.borrow_mut().opacity = value;
        }
        return;
    }

    for surface in [&parts.primary, &parts.secondary] {
        if surface.borrow().id() != target {
            continue;
        }
        let mut surface = surface.borrow_mut();
        match property {
            AnimatedProperty::Opacity => surface.opacity = value,
            AnimatedProperty::BlurRadius => {
                if let Some(blur) = surface.blur.as_mut() {
                    blur.radius = value;
                }
            }
            _ => {
                let Some(channel) = property
                    .transform_kind()
                    .and_then(|kind| surface.render_transform.as_ref()?.find(kind))
                else {
                    return;
                };
                let mut channel = channel.borrow_mut();
                match (&mut *channel, property) {
                    (Transform::Scale { x, .. }, AnimatedProperty::ScaleX) => *x = value,
                    (Transform::Scale { y, .. }, AnimatedProperty::ScaleY) => *y = value,
                    (Transform::Translate { x, .. }, AnimatedProperty::TranslateX) => *x = value,
                    (Transform::Translate { y, .. }, AnimatedProperty::TranslateY) => *y = value,
                    (Transform::Rotate { angle }, AnimatedProperty::Angle) => *angle = value,
                    (Transform::Skew { x, .. }, AnimatedProperty::SkewX) => *x = value,
                    _ => {}
                }
            }
        }
    }
}

impl VisualHost for MemoryHost {
    fn top_level_windows(&self) -> Vec<ElementId> {
        self.windows.clone()
    }

    fn main_window(&self) -> Option<ElementId> {
        self.main_window
    }

    fn children(&self, id: ElementId) -> Vec<ElementId> {
        self.nodes
            .get(&id)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn element_name(&self, id: ElementId) -> Option<String> {
        self.nodes.get(&id).and_then(|n| n.name.clone())
    }

    fn type_name(&self, id: ElementId) -> Option<String> {
        self.nodes.get(&id).map(|n| n.type_name.clone())
    }

    fn element_kind(&self, id: ElementId) -> ElementKind {
        self.nodes.get(&id).map(|n| n.kind).unwrap_or_default()
    }

    fn is_loaded(&self, id: ElementId) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.loaded)
    }

    fn is_visible(&self, id: ElementId) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.visible)
    }

    fn actual_size(&self, id: ElementId) -> Option<Size> {
        self.nodes.get(&id).and_then(|n| n.size)
    }

    fn content_of(&self, id: ElementId) -> Option<ElementId> {
        self.nodes.get(&id).and_then(|n| n.content)
    }

    fn source_bindings(&self, id: ElementId) -> Vec<SourceBinding> {
        self.nodes
            .get(&id)
            .map(|n| n.bindings.clone())
            .unwrap_or_default()
    }

    fn transition_parts(&self, id: ElementId) -> Result<TransitionParts, HostError> {
        let node = self.nodes.get(&id).ok_or(HostError::ElementNotFound { id })?;
        node.parts.clone().ok_or(HostError::PartMissing {
            id,
            part: "image surfaces",
        })
    }

    fn set_source_update_delay(&mut self, id: ElementId, delay_ms: f64) -> Result<(), HostError> {
        let node = self.nodes.get(&id).ok_or(HostError::ElementNotFound { id })?;
        match node.kind {
            ElementKind::TransitionCapable | ElementKind::OpaqueWrapper => {
                self.delays.insert(id, delay_ms);
                Ok(())
            }
            _ => Err(HostError::PropertyUnavailable {
                id,
                property: "SourceUpdateDelay",
            }),
        }
    }

    fn install_timeline(
        &mut self,
        id: ElementId,
        slot: TimelineSlot,
        timeline: Timeline,
    ) -> Result<(), HostError> {
        let node = self.nodes.get(&id).ok_or(HostError::ElementNotFound { id })?;
        if node.parts.is_none() {
            return Err(HostError::SlotUnavailable { id, slot });
        }
        self.installed.insert((id, slot), timeline);
        self.install_log.push((id, slot));
        Ok(())
    }

    fn subscribe(&mut self, id: ElementId, signal: Signal) -> Result<(), HostError> {
        if !self.nodes.contains_key(&id) {
            return Err(HostError::ElementNotFound { id });
        }
        *self.subscribe_calls.entry((id, signal)).or_insert(0) += 1;
        self.subscriptions.insert((id, signal));
        Ok(())
    }

    fn unsubscribe(&mut self, id: ElementId, signal: Signal) {
        self.subscriptions.remove(&(id, signal));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{PropertyAnimation, TransformKind, normalize};

    #[test]
    fn test_events_only_when_subscribed() {
        let mut host = MemoryHost::new();
        let window = host.add_window("MainWindow");
        let image = host.add_transition_element(window);

        host.change_source(image);
        assert!(host.drain_events().is_empty());

        host.subscribe(image, Signal::SourceChanged).unwrap();
        host.change_source(image);
        assert_eq!(host.drain_events(), vec![HostEvent::SourceChanged(image)]);

        host.unsubscribe(image, Signal::SourceChanged);
        host.change_source(image);
        assert!(host.drain_events().is_empty());
        assert_eq!(host.subscribe_calls(image, Signal::SourceChanged), 1);
    }

    #[test]
    fn test_transition_parts() {
        let mut host = MemoryHost::new();
        let window = host.add_window("MainWindow");
        let image = host.add_transition_element(window);

        let parts = host.transition_parts(image).unwrap();
        assert!(parts.decoration.is_some());
        assert_eq!(host.children(image).len(), 3);

        host.break_parts(image);
        assert!(matches!(
            host.transition_parts(image),
            Err(HostError::PartMissing { .. })
        ));

        host.repair_parts(image);
        assert!(host.transition_parts(image).is_ok());
        assert!(matches!(
            host.transition_parts(ElementId(999)),
            Err(HostError::ElementNotFound { .. })
        ));
    }

    #[test]
    fn test_play_applies_fill_and_post_conditions() {
        let mut host = MemoryHost::new();
        let window = host.add_window("MainWindow");
        let image = host.add_transition_element(window);
        let parts = host.parts(image).unwrap();
        normalize(&mut parts.primary.borrow_mut());
        let target = parts.primary.borrow().id();

        let mut tl = Timeline::new();
        tl.push(PropertyAnimation::new(target, AnimatedProperty::Opacity, 1.0, 0.0, 0.5))
            .push(PropertyAnimation::new(target, AnimatedProperty::ScaleX, 1.0, 1.2, 0.5))
            .push(
                PropertyAnimation::new(target, AnimatedProperty::TranslateX, 0.0, -20.0, 0.3)
                    .with_fill(FillBehavior::Stop),
            );
        tl.on_complete(PostCondition::ResetTranslate { target });
        host.install_timeline(image, TimelineSlot::ExitPrimary, tl)
            .unwrap();

        host.play(image, TimelineSlot::ExitPrimary);

        let surface = parts.primary.borrow();
        assert_eq!(surface.opacity, 0.0);
        let group = surface.render_transform.as_ref().unwrap();
        assert_eq!(
            *group.find(TransformKind::Scale).unwrap().borrow(),
            Transform::Scale { x: 1.2, y: 1.0 }
        );
        assert_eq!(
            *group.find(TransformKind::Translate).unwrap().borrow(),
            Transform::Translate { x: 0.0, y: 0.0 }
        );
    }

    #[test]
    fn test_set_size_updates_surfaces() {
        let mut host = MemoryHost::new();
        let window = host.add_window("MainWindow");
        let image = host.add_transition_element(window);
        let parts = host.parts(image).unwrap();
        let primary = parts.primary.borrow().id();

        host.subscribe(primary, Signal::SizeChanged).unwrap();
        host.set_size(image, Size::new(800.0, 450.0));

        assert_eq!(parts.secondary.borrow().actual_size, Size::new(800.0, 450.0));
        assert_eq!(host.actual_size(primary), Some(Size::new(800.0, 450.0)));
        assert_eq!(host.drain_events(), vec![HostEvent::SizeChanged(primary)]);
    }

    #[test]
    fn test_delay_only_on_supported_elements() {
        let mut host = MemoryHost::new();
        let window = host.add_window("MainWindow");
        let image = host.add_transition_element(window);

        host.set_source_update_delay(image, 120.0).unwrap();
        assert_eq!(host.source_update_delay(image), Some(120.0));
        assert!(host.set_source_update_delay(window, 120.0).is_err());
    }
}
