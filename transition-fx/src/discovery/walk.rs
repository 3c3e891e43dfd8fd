//! 宿主树遍历。
//!
//! 宿主树不归本库所有，可能在遍历期间变化。所有遍历都是深度优先、
//! 每层读取一次子元素快照，并用已访问集合防止宿主返回环。

use std::collections::HashSet;

use crate::host::{ElementId, ElementKind, VisualHost};

/// 深度优先遍历 `root` 的后代（不含 `root`），`visit` 返回 `true` 时停止
fn walk_descendants(
    host: &dyn VisualHost,
    root: ElementId,
    mut visit: impl FnMut(ElementId) -> bool,
) -> Option<ElementId> {
    let mut visited = HashSet::from([root]);
    let mut stack: Vec<ElementId> = host.children(root).into_iter().rev().collect();

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        if visit(id) {
            return Some(id);
        }
        stack.extend(host.children(id).into_iter().rev());
    }
    None
}

/// 按元素名查找第一个后代
pub fn find_by_name(host: &dyn VisualHost, root: ElementId, name: &str) -> Option<ElementId> {
    walk_descendants(host, root, |id| host.element_name(id).as_deref() == Some(name))
}

/// 按完整类型名查找第一个后代
pub fn find_by_type_name(
    host: &dyn VisualHost,
    root: ElementId,
    type_name: &str,
) -> Option<ElementId> {
    walk_descendants(host, root, |id| host.type_name(id).as_deref() == Some(type_name))
}

/// 收集所有过渡元素（文档顺序）
pub fn collect_transition_elements(host: &dyn VisualHost, root: ElementId) -> Vec<ElementId> {
    let mut found = Vec::new();
    walk_descendants(host, root, |id| {
        if host.element_kind(id) == ElementKind::TransitionCapable {
            found.push(id);
        }
        false
    });
    found
}

/// 第一个嵌套的过渡元素
pub fn find_nested_transition(host: &dyn VisualHost, root: ElementId) -> Option<ElementId> {
    walk_descendants(host, root, |id| {
        host.element_kind(id) == ElementKind::TransitionCapable
    })
}

/// 可见且已有非零尺寸
pub fn is_effectively_visible(host: &dyn VisualHost, id: ElementId) -> bool {
    host.is_visible(id) && host.actual_size(id).is_some_and(|size| size.is_measured())
}

/// 图片源是否绑定到指定切换器的内容
///
/// 任意一条绑定（包括优先级绑定展开的候选）匹配元素名与路径即可。
pub fn is_bound_to_changer(
    host: &dyn VisualHost,
    id: ElementId,
    changer_name: &str,
    path: &str,
) -> bool {
    host.source_bindings(id)
        .iter()
        .any(|binding| binding.element_name == changer_name && binding.path == path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;
    use crate::host::{Size, SourceBinding};

    #[test]
    fn test_find_by_name_depth_first() {
        let mut host = MemoryHost::new();
        let window = host.add_window("MainWindow");
        let panel = host.add_element(window, "Grid", ElementKind::Plain);
        let deep = host.add_element(panel, "Border", ElementKind::Plain);
        host.set_name(deep, "Target");
        let shallow = host.add_element(window, "Border", ElementKind::Plain);
        host.set_name(shallow, "Target");

        // 深度优先：先进入 panel 子树
        assert_eq!(find_by_name(&host, window, "Target"), Some(deep));
        assert_eq!(find_by_name(&host, window, "Missing"), None);
        // 根本身不参与匹配
        host.set_name(window, "Root");
        assert_eq!(find_by_name(&host, window, "Root"), None);
    }

    #[test]
    fn test_collect_transition_elements() {
        let mut host = MemoryHost::new();
        let window = host.add_window("MainWindow");
        let panel = host.add_element(window, "Grid", ElementKind::Plain);
        let a = host.add_transition_element(panel);
        let b = host.add_transition_element(window);

        assert_eq!(collect_transition_elements(&host, window), vec![a, b]);
        assert_eq!(find_nested_transition(&host, panel), Some(a));
        assert_eq!(
            find_by_type_name(&host, window, crate::host::memory::TRANSITION_TYPE_NAME),
            Some(a)
        );
    }

    #[test]
    fn test_effectively_visible() {
        let mut host = MemoryHost::new();
        let window = host.add_window("MainWindow");
        let image = host.add_transition_element(window);
        assert!(!is_effectively_visible(&host, image));

        host.set_size(image, Size::new(100.0, 50.0));
        assert!(is_effectively_visible(&host, image));

        host.set_visible(image, false);
        assert!(!is_effectively_visible(&host, image));
    }

    #[test]
    fn test_binding_check() {
        let mut host = MemoryHost::new();
        let window = host.add_window("MainWindow");
        let image = host.add_transition_element(window);
        host.bind_source(image, SourceBinding::new("Other", "Content.Source"));
        assert!(!is_bound_to_changer(&host, image, "Changer", "Content.Source"));

        // 优先级绑定的第二个候选匹配
        host.bind_source(image, SourceBinding::new("Changer", "Content.Source"));
        assert!(is_bound_to_changer(&host, image, "Changer", "Content.Source"));
        assert!(!is_bound_to_changer(&host, image, "Changer", "Content"));
    }
}
