//! Element searches over a scene tree.
//!
//! All searches walk the tree in depth-first order and therefore return
//! elements in a stable, deterministic order for a given tree shape. The
//! functions here take `&Scene` directly; [`crate::robot::Robot`] wraps them
//! in UI-thread dispatch.

use xoanon_core::{Error, Result, Role};
use xoanon_scene::{NodeId, Scene, WindowId};

/// All nodes with the given role in the subtree rooted at `root`,
/// in depth-first order.
pub fn find_all(scene: &Scene, role: Role, root: NodeId) -> Vec<NodeId> {
    let mut results = Vec::new();
    collect_by_role(scene, role, root, &mut results);
    results
}

fn collect_by_role(scene: &Scene, role: Role, node: NodeId, results: &mut Vec<NodeId>) {
    let Some(n) = scene.node(node) else { return };
    if n.role == role {
        results.push(node);
    }
    for &child in scene.children(node) {
        collect_by_role(scene, role, child, results);
    }
}

/// All nodes with the given role anywhere in the given window.
pub fn find_all_in_window(scene: &Scene, role: Role, window: WindowId) -> Vec<NodeId> {
    match scene.root_of(window) {
        Some(root) => find_all(scene, role, root),
        None => Vec::new(),
    }
}

/// The first node in the subtree whose application identifier equals `id`.
pub fn find_by_id(scene: &Scene, root: NodeId, id: &str) -> Result<NodeId> {
    search_id(scene, root, id).ok_or_else(|| Error::NotFound(format!("element with id `{id}`")))
}

fn search_id(scene: &Scene, node: NodeId, id: &str) -> Option<NodeId> {
    let n = scene.node(node)?;
    if n.id.as_deref() == Some(id) {
        return Some(node);
    }
    for &child in scene.children(node) {
        if let Some(found) = search_id(scene, child, id) {
            return Some(found);
        }
    }
    None
}

/// The first node in the given window whose identifier equals `id`.
pub fn find_by_id_in_window(scene: &Scene, window: WindowId, id: &str) -> Result<NodeId> {
    let root = scene
        .root_of(window)
        .ok_or_else(|| Error::NotFound(format!("element with id `{id}`")))?;
    find_by_id(scene, root, id)
}

/// Search every showing window, in creation order, for a node with the
/// given identifier.
pub fn find_by_id_anywhere(scene: &Scene, id: &str) -> Result<NodeId> {
    for window in scene.showing_windows() {
        if let Some(root) = scene.root_of(window) {
            if let Some(found) = search_id(scene, root, id) {
                return Ok(found);
            }
        }
    }
    Err(Error::NotFound(format!("element with id `{id}`")))
}

/// The first node in the subtree whose label text equals `text` exactly.
pub fn find_by_text(scene: &Scene, root: NodeId, text: &str) -> Result<NodeId> {
    search_text(scene, root, text)
        .ok_or_else(|| Error::NotFound(format!("element with text `{text}`")))
}

fn search_text(scene: &Scene, node: NodeId, text: &str) -> Option<NodeId> {
    let n = scene.node(node)?;
    if n.label.as_deref() == Some(text) {
        return Some(node);
    }
    for &child in scene.children(node) {
        if let Some(found) = search_text(scene, child, text) {
            return Some(found);
        }
    }
    None
}

/// The first node in the given window whose label equals `text`.
pub fn find_by_text_in_window(scene: &Scene, window: WindowId, text: &str) -> Result<NodeId> {
    let root = scene
        .root_of(window)
        .ok_or_else(|| Error::NotFound(format!("element with text `{text}`")))?;
    find_by_text(scene, root, text)
}

/// Search every showing window, in creation order, for a node whose label
/// equals `text`.
pub fn find_by_text_anywhere(scene: &Scene, text: &str) -> Result<NodeId> {
    for window in scene.showing_windows() {
        if let Some(root) = scene.root_of(window) {
            if let Some(found) = search_text(scene, root, text) {
                return Ok(found);
            }
        }
    }
    Err(Error::NotFound(format!("element with text `{text}`")))
}

/// All nodes in the subtree with the given role that carry the style tag.
pub fn find_all_with_tag(scene: &Scene, role: Role, root: NodeId, tag: &str) -> Vec<NodeId> {
    find_all(scene, role, root)
        .into_iter()
        .filter(|&n| scene.node(n).is_some_and(|node| node.has_tag(tag)))
        .collect()
}

/// All tagged nodes with the given role in the given window.
pub fn find_all_with_tag_in_window(
    scene: &Scene,
    role: Role,
    window: WindowId,
    tag: &str,
) -> Vec<NodeId> {
    match scene.root_of(window) {
        Some(root) => find_all_with_tag(scene, role, root, tag),
        None => Vec::new(),
    }
}

/// All tagged nodes with the given role across every showing window,
/// windows in creation order.
pub fn find_all_with_tag_anywhere(scene: &Scene, role: Role, tag: &str) -> Vec<NodeId> {
    let mut results = Vec::new();
    for window in scene.showing_windows() {
        results.extend(find_all_with_tag_in_window(scene, role, window, tag));
    }
    results
}

/// Check that a located node has the role the caller expects.
pub fn require_role(scene: &Scene, node: NodeId, expected: Role) -> Result<NodeId> {
    let n = scene
        .node(node)
        .ok_or_else(|| Error::NotFound("element no longer attached".to_string()))?;
    if n.role == expected {
        Ok(node)
    } else {
        Err(Error::RoleMismatch {
            expected,
            found: n.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xoanon_core::geometry::Rect;
    use xoanon_scene::{KeyboardLayout, Node};

    fn sample_scene() -> (Scene, WindowId) {
        let mut scene = Scene::new(KeyboardLayout::us_qwerty());
        let window = scene.new_window("test");
        scene.show_window(window);
        let root = scene.set_root(
            window,
            Node::new(Role::Container).with_bounds(Rect::new(0.0, 0.0, 320.0, 240.0)),
        );
        scene.add_child(
            root,
            Node::new(Role::Button)
                .with_id("ok")
                .with_label("OK")
                .with_bounds(Rect::new(8.0, 8.0, 64.0, 24.0)),
        );
        scene.add_child(
            root,
            Node::new(Role::Button)
                .with_id("cancel")
                .with_label("Cancel")
                .with_tag("dialog-action")
                .with_bounds(Rect::new(80.0, 8.0, 64.0, 24.0)),
        );
        scene.add_child(
            root,
            Node::new(Role::TextField)
                .with_id("name")
                .with_bounds(Rect::new(8.0, 40.0, 200.0, 24.0)),
        );
        (scene, window)
    }

    #[test]
    fn find_all_returns_depth_first_order() {
        let (scene, window) = sample_scene();
        let buttons = find_all_in_window(&scene, Role::Button, window);
        assert_eq!(buttons.len(), 2);
        let first = scene.node(buttons[0]).unwrap();
        assert_eq!(first.id.as_deref(), Some("ok"));
    }

    #[test]
    fn searches_descend_through_nested_containers() {
        let (mut scene, window) = sample_scene();
        let root = scene.root_of(window).unwrap();
        let inner = scene.add_child(root, Node::new(Role::Container)).unwrap();
        scene.add_child(
            inner,
            Node::new(Role::Button)
                .with_id("deep")
                .with_label("Deep")
                .with_bounds(Rect::new(8.0, 80.0, 64.0, 24.0)),
        );

        assert!(find_by_id_in_window(&scene, window, "deep").is_ok());
        assert!(find_by_text_in_window(&scene, window, "Deep").is_ok());
        assert_eq!(find_all_in_window(&scene, Role::Button, window).len(), 3);
    }

    #[test]
    fn find_by_id_matches_and_misses() {
        let (scene, window) = sample_scene();
        let name = find_by_id_in_window(&scene, window, "name").unwrap();
        assert_eq!(scene.node(name).unwrap().role, Role::TextField);
        assert!(matches!(
            find_by_id_in_window(&scene, window, "missing"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn find_by_text_requires_exact_match() {
        let (scene, window) = sample_scene();
        assert!(find_by_text_in_window(&scene, window, "Cancel").is_ok());
        assert!(find_by_text_in_window(&scene, window, "Cance").is_err());
    }

    #[test]
    fn anywhere_searches_skip_hidden_windows() {
        let (mut scene, window) = sample_scene();
        scene.close_window(window);
        assert!(matches!(
            find_by_id_anywhere(&scene, "ok"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn tagged_search_filters_by_tag() {
        let (scene, window) = sample_scene();
        let tagged = find_all_with_tag_in_window(&scene, Role::Button, window, "dialog-action");
        assert_eq!(tagged.len(), 1);
        assert_eq!(scene.node(tagged[0]).unwrap().id.as_deref(), Some("cancel"));
    }

    #[test]
    fn role_check_reports_mismatch() {
        let (scene, window) = sample_scene();
        let ok = find_by_id_in_window(&scene, window, "ok").unwrap();
        assert!(require_role(&scene, ok, Role::Button).is_ok());
        assert!(matches!(
            require_role(&scene, ok, Role::TextField),
            Err(Error::RoleMismatch {
                expected: Role::TextField,
                found: Role::Button,
            })
        ));
    }
}
