//! # 发现流程集成测试
//!
//! 通过 MemoryHost 驱动 TransitionExtension，覆盖启动重试、结构视图、
//! 背景切换器与源变化监听。

use transition_fx::host::memory::MemoryHost;
use transition_fx::{
    BootstrapStatus, DiscoveryConfig, ElementId, ElementKind, ElementState, MemoryStore, Signal,
    Size, SourceBinding, TransitionExtension,
};

const CHANGER: &str = "BackgroundChanger_PluginBackgroundImage";
const LIBRARY_VIEW: &str = "Playnite.DesktopApp.Controls.Views.Library";
const DETAILS_VIEW: &str = "Playnite.DesktopApp.Controls.Views.DetailsViewGameOverview";

fn extension() -> TransitionExtension {
    TransitionExtension::new(Box::new(MemoryStore::new()), DiscoveryConfig::default())
}

/// 把宿主队列中的事件全部交给扩展
fn pump(ext: &mut TransitionExtension, host: &mut MemoryHost) {
    loop {
        let events = host.drain_events();
        if events.is_empty() {
            break;
        }
        for event in events {
            ext.handle_event(host, event);
        }
    }
}

/// 主窗口下放一个背景切换器，内容为不可挂载的包装元素
fn host_with_changer() -> (MemoryHost, ElementId, ElementId) {
    let mut host = MemoryHost::new();
    let window = host.add_window("Playnite.DesktopApp.Windows.MainWindow");
    let changer = host.add_element(window, "System.Windows.Controls.ContentControl", ElementKind::ContentHost);
    host.set_name(changer, CHANGER);
    let wrapper = host.create_detached("BackgroundChanger.PluginBackgroundImage", ElementKind::OpaqueWrapper);
    host.set_content(changer, Some(wrapper));
    (host, window, changer)
}

/// 测试窗口可见后启动重试成功
#[test]
fn test_bootstrap_waits_for_visible_window() {
    let mut host = MemoryHost::new();
    let window = host.add_window("Playnite.FullscreenApp.Windows.MainWindow");
    host.set_visible(window, false);
    let image = host.add_transition_element(window);

    let mut ext = extension();
    ext.on_started(&mut host);

    assert_eq!(ext.on_retry_tick(&mut host), BootstrapStatus::Pending);
    assert_eq!(ext.on_retry_tick(&mut host), BootstrapStatus::Pending);
    assert_eq!(host.attach_count(image), 0);

    host.set_visible(window, true);
    assert_eq!(ext.on_retry_tick(&mut host), BootstrapStatus::Hooked);
    assert_eq!(ext.watcher().attempts(), 3);
    assert_eq!(host.attach_count(image), 1);
    assert_eq!(ext.engine().last_attached(), Some(image));

    // 成功后停止重试
    assert_eq!(ext.on_retry_tick(&mut host), BootstrapStatus::Hooked);
    assert_eq!(host.attach_count(image), 1);
}

/// 测试次数耗尽后静默放弃
#[test]
fn test_bootstrap_gives_up_silently() {
    let mut host = MemoryHost::new();
    host.add_window("Playnite.FullscreenApp.Windows.MainWindow");

    let mut ext = extension();
    ext.on_started(&mut host);

    let mut status = BootstrapStatus::Pending;
    for _ in 0..20 {
        status = ext.on_retry_tick(&mut host);
    }
    assert_eq!(status, BootstrapStatus::GaveUp);
    assert_eq!(ext.watcher().attempts(), 10);
    assert!(host.install_log().is_empty());
}

/// 测试切换器内容从包装元素换成过渡元素
#[test]
fn test_changer_content_swap_attaches_once() {
    let (mut host, _window, changer) = host_with_changer();
    let mut ext = extension();
    ext.on_started(&mut host);

    // 包装元素只被记住，不挂载
    assert!(ext.watcher().is_changer_watched(changer));
    assert!(host.install_log().is_empty());
    assert!(ext.engine().last_attached().is_some());

    let image = host.create_detached_transition();
    host.set_content(changer, Some(image));
    pump(&mut ext, &mut host);

    assert_eq!(host.attach_count(image), 1);
    assert_eq!(host.subscribe_calls(changer, Signal::ContentChanged), 1);
    assert_eq!(ext.engine().last_attached(), Some(image));

    // 反复的布局更新不会重复订阅或重复挂载
    for _ in 0..3 {
        host.layout_updated();
        pump(&mut ext, &mut host);
    }
    assert_eq!(host.attach_count(image), 1);
    assert_eq!(host.subscribe_calls(changer, Signal::ContentChanged), 1);
    assert_eq!(host.subscribe_calls(image, Signal::SourceChanged), 1);
}

/// 测试切换器内容内嵌的过渡元素
#[test]
fn test_changer_nested_transition() {
    let (mut host, _window, changer) = host_with_changer();
    let mut ext = extension();
    ext.on_started(&mut host);

    let panel = host.create_detached("System.Windows.Controls.Grid", ElementKind::Plain);
    let image = host.add_transition_element(panel);
    host.set_content(changer, Some(panel));
    pump(&mut ext, &mut host);

    assert_eq!(host.attach_count(image), 1);
    assert_eq!(ext.watcher().state(image), Some(ElementState::Attached));
}

/// 测试只挂载绑定到切换器内容的过渡元素
#[test]
fn test_binding_aware_discovery() {
    let (mut host, window, _changer) = host_with_changer();
    let bound = host.add_transition_element(window);
    host.bind_source(bound, SourceBinding::new("Other", "Tag"));
    host.bind_source(bound, SourceBinding::new(CHANGER, "Content.Source"));
    let unbound = host.add_transition_element(window);

    let mut ext = extension();
    ext.on_started(&mut host);

    assert_eq!(host.attach_count(bound), 1);
    assert_eq!(host.attach_count(unbound), 0);
    assert!(!ext.watcher().is_source_watched(unbound));

    host.layout_updated();
    pump(&mut ext, &mut host);
    assert_eq!(host.attach_count(bound), 1);
}

/// 测试每个结构视图只处理一次
#[test]
fn test_views_hooked_once() {
    let mut host = MemoryHost::new();
    let window = host.add_window("Playnite.DesktopApp.Windows.MainWindow");
    let library = host.add_element(window, LIBRARY_VIEW, ElementKind::Plain);
    let image = host.add_transition_element(library);
    host.set_size(image, Size::new(1280.0, 720.0));

    let mut ext = extension();
    ext.on_started(&mut host);
    assert!(ext.watcher().is_view_hooked(library));
    assert_eq!(host.attach_count(image), 1);

    for _ in 0..5 {
        host.layout_updated();
        pump(&mut ext, &mut host);
    }
    assert_eq!(host.attach_count(image), 1);
    assert_eq!(host.subscribe_calls(image, Signal::SourceChanged), 1);
}

/// 测试后出现且未加载的视图等待加载
#[test]
fn test_late_view_waits_for_load() {
    let mut host = MemoryHost::new();
    let window = host.add_window("Playnite.DesktopApp.Windows.MainWindow");

    let mut ext = extension();
    ext.on_started(&mut host);

    let details = host.add_element(window, DETAILS_VIEW, ElementKind::Plain);
    host.set_loaded(details, false);
    let image = host.add_transition_element(details);
    host.set_name(image, "PART_ImageBackground");

    host.layout_updated();
    pump(&mut ext, &mut host);
    assert!(ext.watcher().is_view_hooked(details));
    assert_eq!(host.attach_count(image), 0);

    host.set_loaded(details, true);
    pump(&mut ext, &mut host);
    assert_eq!(host.attach_count(image), 1);
    assert!(!host.is_subscribed(details, Signal::Loaded));
}

/// 测试源变化重新挂载，卸载后停止
#[test]
fn test_source_change_and_unload() {
    let mut host = MemoryHost::new();
    let window = host.add_window("Playnite.FullscreenApp.Windows.MainWindow");
    let image = host.add_transition_element(window);

    let mut ext = extension();
    ext.on_started(&mut host);
    ext.on_retry_tick(&mut host);
    assert_eq!(host.attach_count(image), 1);

    host.change_source(image);
    host.change_source(image);
    pump(&mut ext, &mut host);
    assert_eq!(host.attach_count(image), 3);

    host.set_loaded(image, false);
    pump(&mut ext, &mut host);
    assert_eq!(ext.watcher().state(image), Some(ElementState::Unloaded));
    assert_eq!(ext.engine().last_attached(), None);
    assert!(!ext.watcher().is_source_watched(image));

    host.change_source(image);
    pump(&mut ext, &mut host);
    assert_eq!(host.attach_count(image), 3);
}

/// 测试停止后清除全部订阅
#[test]
fn test_stop_releases_everything() {
    let (mut host, window, changer) = host_with_changer();
    let image = host.add_transition_element(window);

    let mut ext = extension();
    ext.on_started(&mut host);
    ext.on_retry_tick(&mut host);
    assert!(host.is_subscribed(changer, Signal::ContentChanged));

    ext.on_stopped(&mut host);
    for (id, signal) in [
        (changer, Signal::ContentChanged),
        (window, Signal::LayoutUpdated),
        (window, Signal::NavigationInput),
        (image, Signal::SourceChanged),
        (image, Signal::Unloaded),
    ] {
        assert!(!host.is_subscribed(id, signal), "{id} {signal:?}");
    }
    assert!(!ext.watcher().is_running());
}

/// 测试启动后才出现的主窗口也会装上布局监听
#[test]
fn test_window_after_start_installs_structural_watcher() {
    let mut host = MemoryHost::new();
    let mut ext = extension();
    ext.on_started(&mut host);

    let window = host.add_window("Playnite.DesktopApp.Windows.MainWindow");
    let image = host.add_transition_element(window);
    assert_eq!(ext.on_retry_tick(&mut host), BootstrapStatus::Hooked);
    assert!(host.is_subscribed(window, Signal::LayoutUpdated));
    assert!(host.is_subscribed(window, Signal::NavigationInput));

    // 之后出现的结构视图通过布局更新被处理
    let library = host.add_element(window, LIBRARY_VIEW, ElementKind::Plain);
    let shown = host.add_transition_element(library);
    host.set_size(shown, Size::new(1280.0, 720.0));
    host.layout_updated();
    pump(&mut ext, &mut host);

    assert!(ext.watcher().is_view_hooked(library));
    assert_eq!(host.attach_count(shown), 1);
    assert_eq!(host.attach_count(image), 1);
}

/// 测试加载时挂载失败的元素在布局更新时重试
#[test]
fn test_failed_load_attach_retried_on_relayout() {
    let (mut host, window, _changer) = host_with_changer();
    let image = host.add_transition_element(window);
    host.bind_source(image, SourceBinding::new(CHANGER, "Content.Source"));
    host.set_loaded(image, false);
    host.break_parts(image);

    let mut ext = extension();
    ext.on_started(&mut host);
    assert_eq!(ext.watcher().state(image), Some(ElementState::PendingLoad));

    host.set_loaded(image, true);
    pump(&mut ext, &mut host);
    assert_ne!(ext.watcher().state(image), Some(ElementState::PendingLoad));
    assert!(!host.is_subscribed(image, Signal::Loaded));
    assert_eq!(host.attach_count(image), 0);

    host.repair_parts(image);
    host.layout_updated();
    pump(&mut ext, &mut host);
    assert_eq!(ext.watcher().state(image), Some(ElementState::Attached));
    assert_eq!(host.attach_count(image), 1);
}

/// 测试同一次重试中切换器内容只挂载一次
#[test]
fn test_bootstrap_attaches_changer_content_once() {
    let mut host = MemoryHost::new();
    let mut ext = extension();
    ext.on_started(&mut host);

    let window = host.add_window("Playnite.DesktopApp.Windows.MainWindow");
    let changer = host.add_element(window, "System.Windows.Controls.ContentControl", ElementKind::ContentHost);
    host.set_name(changer, CHANGER);
    let image = host.create_detached_transition();
    host.set_content(changer, Some(image));

    assert_eq!(ext.on_retry_tick(&mut host), BootstrapStatus::Hooked);
    assert_eq!(host.attach_count(image), 1);
    assert_eq!(host.subscribe_calls(changer, Signal::ContentChanged), 1);
    assert_eq!(ext.watcher().state(image), Some(ElementState::Attached));
}
