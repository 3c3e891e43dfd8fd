//! # Discovery 模块
//!
//! 在宿主树中发现过渡元素，并在其生命周期内持续监听。
//!
//! ## 状态
//!
//! 每个过渡元素按 [`ElementId`] 跟踪：
//!
//! ```text
//! (未见) ──► PendingLoad ──► Attached ──► Unloaded
//!    └──────────────────────────┘
//! ```
//!
//! 所有监听集合都由 [`DiscoveryWatcher`] 持有，随 `start`/`stop` 创建与清空。
//!
//! ## 发现路径
//!
//! - **启动重试**：宿主按固定间隔调用 [`DiscoveryWatcher::on_retry_tick`]，
//!   首次成功或次数耗尽后停止
//! - **结构视图**：主窗口布局更新时查找约定的视图类型，每个视图只处理一次
//! - **背景切换器**：订阅内容变化，按内容类型挂载、记住或查找嵌套元素
//! - **绑定检查**：切换器之外的过渡元素只有图片源绑定到切换器内容时才挂载
//! - **源变化**：已监听元素每次源变化都重新挂载

pub mod walk;

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::attach::AttachmentEngine;
use crate::config::DiscoveryConfig;
use crate::host::{ElementId, ElementKind, HostEvent, Signal, VisualHost};

/// 过渡元素的跟踪状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    /// 已发现，等待加载完成
    PendingLoad,
    /// 时间轴已安装
    Attached,
    /// 已卸载
    Unloaded,
}

/// 启动重试状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BootstrapStatus {
    /// 仍在重试
    #[default]
    Pending,
    /// 已找到过渡元素
    Hooked,
    /// 次数耗尽，放弃
    GaveUp,
}

/// 发现与监听
#[derive(Debug)]
pub struct DiscoveryWatcher {
    config: DiscoveryConfig,
    running: bool,
    status: BootstrapStatus,
    attempts: u32,
    /// 订阅了布局更新的主窗口
    layout_window: Option<ElementId>,
    /// 已处理的结构视图
    hooked_views: HashSet<ElementId>,
    /// 等待加载的结构视图
    pending_views: HashSet<ElementId>,
    /// 已订阅导航输入的窗口
    hooked_windows: HashSet<ElementId>,
    /// 已订阅内容变化的背景切换器
    watched_changers: HashSet<ElementId>,
    /// 已订阅源变化的过渡元素
    watched_sources: HashSet<ElementId>,
    elements: HashMap<ElementId, ElementState>,
}

impl DiscoveryWatcher {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            config,
            running: false,
            status: BootstrapStatus::Pending,
            attempts: 0,
            layout_window: None,
            hooked_views: HashSet::new(),
            pending_views: HashSet::new(),
            hooked_windows: HashSet::new(),
            watched_changers: HashSet::new(),
            watched_sources: HashSet::new(),
            elements: HashMap::new(),
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn status(&self) -> BootstrapStatus {
        self.status
    }

    /// 已执行的重试次数
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn state(&self, id: ElementId) -> Option<ElementState> {
        self.elements.get(&id).copied()
    }

    pub fn is_view_hooked(&self, view: ElementId) -> bool {
        self.hooked_views.contains(&view)
    }

    pub fn is_changer_watched(&self, changer: ElementId) -> bool {
        self.watched_changers.contains(&changer)
    }

    pub fn is_source_watched(&self, id: ElementId) -> bool {
        self.watched_sources.contains(&id)
    }

    // ── 生命周期 ──

    /// 启动：挂上主窗口的布局监听与导航输入，立即检查一次结构视图
    ///
    /// 启动重试由宿主的计时器通过 [`Self::on_retry_tick`] 驱动。
    pub fn start(&mut self, host: &mut dyn VisualHost, engine: &mut AttachmentEngine) {
        if self.running {
            return;
        }
        self.running = true;
        self.status = BootstrapStatus::Pending;
        self.attempts = 0;
        info!(
            interval_ms = self.config.retry_interval_ms,
            max_attempts = self.config.max_attempts,
            "discovery started"
        );

        match host.main_window() {
            Some(main) => self.hook_main_window(host, engine, main),
            None => debug!("no main window yet, structural watcher deferred to retries"),
        }
    }

    /// 主窗口：导航输入、布局监听、结构视图与背景切换器
    fn hook_main_window(
        &mut self,
        host: &mut dyn VisualHost,
        engine: &mut AttachmentEngine,
        main: ElementId,
    ) {
        self.hook_navigation(host, main);
        self.watch_layout(host, main);
        self.hook_views(host, engine, main);
        self.try_hook_background_changer(host, engine, main);
    }

    /// 启动重试计时器触发
    pub fn on_retry_tick(
        &mut self,
        host: &mut dyn VisualHost,
        engine: &mut AttachmentEngine,
    ) -> BootstrapStatus {
        if !self.running || self.status != BootstrapStatus::Pending {
            return self.status;
        }

        self.attempts += 1;
        // 启动时主窗口尚不存在：出现后补装布局监听
        if self.layout_window.is_none()
            && let Some(main) = host.main_window()
        {
            debug!(window = %main, "main window appeared, installing structural watcher");
            self.hook_main_window(host, engine, main);
        }
        if self.try_hook_once(host, engine) {
            info!(attempt = self.attempts, "bootstrap hook succeeded");
            self.status = BootstrapStatus::Hooked;
        } else if self.attempts >= self.config.max_attempts {
            info!(attempts = self.attempts, "bootstrap gave up");
            self.status = BootstrapStatus::GaveUp;
        }
        self.status
    }

    /// 停止：取消所有订阅并清空监听集合
    pub fn stop(&mut self, host: &mut dyn VisualHost) {
        if let Some(window) = self.layout_window.take() {
            host.unsubscribe(window, Signal::LayoutUpdated);
        }
        for window in self.hooked_windows.drain() {
            host.unsubscribe(window, Signal::NavigationInput);
        }
        for changer in self.watched_changers.drain() {
            host.unsubscribe(changer, Signal::ContentChanged);
        }
        for id in self.watched_sources.drain() {
            host.unsubscribe(id, Signal::SourceChanged);
            host.unsubscribe(id, Signal::Unloaded);
        }
        for view in self.pending_views.drain() {
            host.unsubscribe(view, Signal::Loaded);
        }
        for (id, state) in self.elements.drain() {
            if state == ElementState::PendingLoad {
                host.unsubscribe(id, Signal::Loaded);
            }
        }
        self.hooked_views.clear();
        self.running = false;
        info!("discovery stopped");
    }

    // ── 事件分发 ──

    /// 处理宿主事件
    pub fn handle_event(
        &mut self,
        host: &mut dyn VisualHost,
        engine: &mut AttachmentEngine,
        event: HostEvent,
    ) {
        if !self.running {
            return;
        }

        match event {
            HostEvent::SourceChanged(id) => {
                if self.watched_sources.contains(&id) {
                    debug!(element = %id, "source changed, re-attaching");
                    self.attach(host, engine, id);
                }
            }
            HostEvent::Loaded(id) => self.on_loaded(host, engine, id),
            HostEvent::Unloaded(id) => self.on_unloaded(host, engine, id),
            HostEvent::ContentChanged(id) => {
                if self.watched_changers.contains(&id) {
                    self.hook_changer_content(host, engine, id);
                }
            }
            HostEvent::SizeChanged(id) => {
                engine.on_size_changed(host, id);
            }
            HostEvent::LayoutUpdated => self.on_layout_updated(host, engine),
            HostEvent::Navigate(key) => engine.on_navigate(key),
        }
    }

    fn on_loaded(&mut self, host: &mut dyn VisualHost, engine: &mut AttachmentEngine, id: ElementId) {
        // 一次性等待
        host.unsubscribe(id, Signal::Loaded);

        if self.pending_views.remove(&id) {
            self.hook_view_contents(host, engine, id);
        }
        // 失败时不保留 PendingLoad，之后的布局更新或源变化可以重试
        if self.elements.get(&id) == Some(&ElementState::PendingLoad) {
            self.elements.remove(&id);
            self.attach(host, engine, id);
        }
    }

    fn on_unloaded(
        &mut self,
        host: &mut dyn VisualHost,
        engine: &mut AttachmentEngine,
        id: ElementId,
    ) {
        if !self.watched_sources.remove(&id) {
            return;
        }
        host.unsubscribe(id, Signal::SourceChanged);
        host.unsubscribe(id, Signal::Unloaded);
        self.elements.insert(id, ElementState::Unloaded);
        engine.forget(host, id);
        debug!(element = %id, "transition element unloaded");
    }

    fn on_layout_updated(&mut self, host: &mut dyn VisualHost, engine: &mut AttachmentEngine) {
        let Some(main) = host.main_window() else {
            return;
        };
        self.hook_views(host, engine, main);
        self.try_hook_background_changer(host, engine, main);
    }

    // ── 启动重试 ──

    /// 单次启动尝试
    ///
    /// # 返回
    /// - `true`: 找到至少一个过渡元素
    /// - `false`: 没有可见窗口或没有过渡元素
    pub fn try_hook_once(&mut self, host: &mut dyn VisualHost, engine: &mut AttachmentEngine) -> bool {
        let window = host
            .top_level_windows()
            .into_iter()
            .find(|w| host.is_visible(*w));
        let Some(window) = window else {
            debug!(attempt = self.attempts, "no visible window");
            return false;
        };

        self.hook_navigation(host, window);
        self.try_hook_background_changer(host, engine, window);

        let candidates = self.candidates(host, window);
        if candidates.is_empty() {
            debug!(attempt = self.attempts, "no transition element found");
            return false;
        }

        info!(count = candidates.len(), "hooking transition elements");
        engine.remember(candidates[0]);
        for id in candidates {
            // 背景切换器的内容可能刚在上面挂载过
            if self.elements.get(&id) == Some(&ElementState::Attached) {
                continue;
            }
            self.hook_transition_element(host, engine, id);
        }
        true
    }

    /// 约定名优先，再按类型遍历，去重后保持顺序
    fn candidates(&self, host: &dyn VisualHost, root: ElementId) -> Vec<ElementId> {
        let mut found = Vec::new();
        if let Some(named) = walk::find_by_name(host, root, &self.config.transition_part_name) {
            found.push(named);
        }
        for id in walk::collect_transition_elements(host, root) {
            if !found.contains(&id) {
                found.push(id);
            }
        }
        found
    }

    // ── 过渡元素 ──

    /// 监听源变化并挂载（未加载时等待加载）
    pub fn hook_transition_element(
        &mut self,
        host: &mut dyn VisualHost,
        engine: &mut AttachmentEngine,
        id: ElementId,
    ) {
        engine.remember(id);
        self.watch_source(host, id);

        if host.is_loaded(id) {
            self.attach(host, engine, id);
            return;
        }
        if self.elements.get(&id) == Some(&ElementState::PendingLoad) {
            return;
        }
        match host.subscribe(id, Signal::Loaded) {
            Ok(()) => {
                self.elements.insert(id, ElementState::PendingLoad);
            }
            Err(e) => warn!(element = %id, error = %e, "cannot wait for element load"),
        }
    }

    /// 订阅源变化与卸载（每个元素一次）
    pub fn watch_source(&mut self, host: &mut dyn VisualHost, id: ElementId) {
        if self.watched_sources.contains(&id) {
            return;
        }
        if let Err(e) = host.subscribe(id, Signal::SourceChanged) {
            warn!(element = %id, error = %e, "cannot watch image source");
            return;
        }
        if let Err(e) = host.subscribe(id, Signal::Unloaded) {
            warn!(element = %id, error = %e, "cannot watch element unload");
        }
        self.watched_sources.insert(id);
    }

    fn attach(&mut self, host: &mut dyn VisualHost, engine: &mut AttachmentEngine, id: ElementId) {
        if engine.attach(host, id).is_attached() {
            self.elements.insert(id, ElementState::Attached);
        }
    }

    // ── 结构视图 ──

    fn watch_layout(&mut self, host: &mut dyn VisualHost, window: ElementId) {
        if self.layout_window == Some(window) {
            return;
        }
        match host.subscribe(window, Signal::LayoutUpdated) {
            Ok(()) => self.layout_window = Some(window),
            Err(e) => warn!(window = %window, error = %e, "cannot watch layout updates"),
        }
    }

    fn hook_navigation(&mut self, host: &mut dyn VisualHost, window: ElementId) {
        if self.hooked_windows.contains(&window) {
            return;
        }
        match host.subscribe(window, Signal::NavigationInput) {
            Ok(()) => {
                self.hooked_windows.insert(window);
            }
            Err(e) => warn!(window = %window, error = %e, "cannot hook navigation input"),
        }
    }

    fn hook_views(&mut self, host: &mut dyn VisualHost, engine: &mut AttachmentEngine, root: ElementId) {
        let type_names = self.config.view_type_names.clone();
        for type_name in &type_names {
            self.hook_view_if_new(host, engine, root, type_name);
        }
    }

    /// 查找结构视图，首次出现时处理（未加载时等待加载）
    pub fn hook_view_if_new(
        &mut self,
        host: &mut dyn VisualHost,
        engine: &mut AttachmentEngine,
        root: ElementId,
        type_name: &str,
    ) {
        let Some(view) = walk::find_by_type_name(host, root, type_name) else {
            return;
        };
        if !self.hooked_views.insert(view) {
            return;
        }
        debug!(view = %view, type_name, "structural view found");

        if host.is_loaded(view) {
            self.hook_view_contents(host, engine, view);
            return;
        }
        match host.subscribe(view, Signal::Loaded) {
            Ok(()) => {
                self.pending_views.insert(view);
            }
            Err(e) => warn!(view = %view, error = %e, "cannot wait for view load"),
        }
    }

    fn hook_view_contents(
        &mut self,
        host: &mut dyn VisualHost,
        engine: &mut AttachmentEngine,
        view: ElementId,
    ) {
        if let Some(part) = walk::find_by_name(host, view, &self.config.transition_part_name) {
            self.hook_transition_element(host, engine, part);
        }
        self.hook_all_from_view(host, engine, view);
        self.try_hook_background_changer(host, engine, view);
    }

    /// 监听视图内所有过渡元素，并挂载第一个可见的
    ///
    /// 没有可见元素时退回到视图内的背景切换器。
    pub fn hook_all_from_view(
        &mut self,
        host: &mut dyn VisualHost,
        engine: &mut AttachmentEngine,
        view: ElementId,
    ) {
        let candidates = self.candidates(host, view);
        for &id in &candidates {
            self.watch_source(host, id);
        }
        debug!(view = %view, count = candidates.len(), "transition elements in view");

        let visible = candidates
            .iter()
            .copied()
            .find(|id| walk::is_effectively_visible(host, *id));
        match visible {
            Some(id) => self.hook_transition_element(host, engine, id),
            None => {
                if let Some(changer) =
                    walk::find_by_name(host, view, &self.config.background_changer_name)
                {
                    self.watch_changer(host, engine, changer);
                }
            }
        }
    }

    // ── 背景切换器 ──

    /// 查找背景切换器，监听其内容并挂载绑定到它的过渡元素
    pub fn try_hook_background_changer(
        &mut self,
        host: &mut dyn VisualHost,
        engine: &mut AttachmentEngine,
        root: ElementId,
    ) {
        let Some(changer) = walk::find_by_name(host, root, &self.config.background_changer_name)
        else {
            return;
        };
        self.watch_changer(host, engine, changer);
        self.hook_bound_to_changer(host, engine, root, changer);
    }

    /// 挂载切换器之外、图片源绑定到切换器内容的过渡元素
    fn hook_bound_to_changer(
        &mut self,
        host: &mut dyn VisualHost,
        engine: &mut AttachmentEngine,
        root: ElementId,
        changer: ElementId,
    ) {
        let inside: HashSet<ElementId> = walk::collect_transition_elements(host, changer)
            .into_iter()
            .collect();

        for id in walk::collect_transition_elements(host, root) {
            if inside.contains(&id) {
                continue;
            }
            if matches!(
                self.elements.get(&id),
                Some(ElementState::Attached | ElementState::PendingLoad)
            ) {
                continue;
            }
            if walk::is_bound_to_changer(
                host,
                id,
                &self.config.background_changer_name,
                &self.config.changer_binding_path,
            ) {
                debug!(element = %id, "transition element bound to background changer");
                self.hook_transition_element(host, engine, id);
            }
        }
    }

    /// 订阅切换器内容变化（每个切换器一次），并立即处理当前内容
    pub fn watch_changer(
        &mut self,
        host: &mut dyn VisualHost,
        engine: &mut AttachmentEngine,
        changer: ElementId,
    ) {
        if self.watched_changers.contains(&changer) {
            return;
        }
        if let Err(e) = host.subscribe(changer, Signal::ContentChanged) {
            warn!(changer = %changer, error = %e, "cannot watch background changer");
            return;
        }
        self.watched_changers.insert(changer);
        self.hook_changer_content(host, engine, changer);
    }

    /// 按切换器当前内容的类型处理
    pub fn hook_changer_content(
        &mut self,
        host: &mut dyn VisualHost,
        engine: &mut AttachmentEngine,
        changer: ElementId,
    ) {
        let Some(content) = host.content_of(changer) else {
            return;
        };

        if host.element_kind(content) == ElementKind::TransitionCapable {
            info!(element = %content, "hooking transition element from background changer");
            self.hook_transition_element(host, engine, content);
            return;
        }

        if self.is_opaque_wrapper(host, content) {
            info!(
                element = %content,
                "background changer shows an opaque wrapper, no animation hook applied"
            );
            engine.remember(content);
            return;
        }

        if let Some(nested) = walk::find_nested_transition(host, content) {
            info!(element = %nested, "hooking nested transition element in background changer");
            self.hook_transition_element(host, engine, nested);
            return;
        }

        info!(changer = %changer, "no transition element in background changer content");
    }

    fn is_opaque_wrapper(&self, host: &dyn VisualHost, id: ElementId) -> bool {
        if host.element_kind(id) == ElementKind::OpaqueWrapper {
            return true;
        }
        host.type_name(id).is_some_and(|name| {
            name.rsplit('.').next() == Some(self.config.opaque_wrapper_type.as_str())
        })
    }
}
