//! Navigable projection of the catalog.
//!
//! Reads flow one way, from the store into the tree on [`CatalogTree::load`].
//! Writes go through the store first and touch the tree only when the store
//! accepted them, so the two never disagree about names.

use serde_json::{Map, Value};

use crate::path::{Level, MethodPath, NodePath};
use crate::store::CatalogStore;

/// Per-level payload of a tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Project { services: Vec<TreeNode> },
    Service { modules: Vec<TreeNode> },
    Module { methods: Vec<TreeNode> },
    /// Method leaves hold no payload; params and results are read from the
    /// store when the node is selected.
    Method,
}

/// One node of the projection, addressed by its full path.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    path: NodePath,
    kind: NodeKind,
}

impl TreeNode {
    fn new(path: NodePath) -> TreeNode {
        let kind = match path.level() {
            Level::Project => NodeKind::Project {
                services: Vec::new(),
            },
            Level::Service => NodeKind::Service {
                modules: Vec::new(),
            },
            Level::Module => NodeKind::Module {
                methods: Vec::new(),
            },
            Level::Method => NodeKind::Method,
        };
        TreeNode { path, kind }
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn level(&self) -> Level {
        self.path.level()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn children(&self) -> &[TreeNode] {
        match &self.kind {
            NodeKind::Project { services } => services,
            NodeKind::Service { modules } => modules,
            NodeKind::Module { methods } => methods,
            NodeKind::Method => &[],
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<TreeNode>> {
        match &mut self.kind {
            NodeKind::Project { services } => Some(services),
            NodeKind::Service { modules } => Some(modules),
            NodeKind::Module { methods } => Some(methods),
            NodeKind::Method => None,
        }
    }

    /// Replace the `level` segment of this node's path and of every
    /// descendant's path.
    fn rename_segment(&mut self, level: Level, name: &str) {
        self.path = self.path.with_segment(level, name);
        if let Some(children) = self.children_mut() {
            for child in children {
                child.rename_segment(level, name);
            }
        }
    }
}

/// What a selection hands to the editor: the node identity plus the params
/// and result currently stored for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub path: NodePath,
    pub params: Value,
    pub result: Value,
}

impl Selection {
    pub fn method_path(&self) -> Option<MethodPath> {
        self.path.as_method()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogTree {
    roots: Vec<TreeNode>,
}

impl CatalogTree {
    /// Build one node per catalog entry, in the store's iteration order.
    pub fn load(store: &CatalogStore) -> CatalogTree {
        let mut roots = Vec::new();
        for (project_name, project) in store.catalog().projects.iter() {
            let project_path = NodePath::project(project_name);
            let mut services = Vec::new();
            for (service_name, service) in project.services.iter() {
                let Some(service_path) = project_path.child(service_name) else {
                    continue;
                };
                let mut modules = Vec::new();
                for (module_name, module) in service.modules.iter() {
                    let Some(module_path) = service_path.child(module_name) else {
                        continue;
                    };
                    let methods = module
                        .methods
                        .names()
                        .filter_map(|method| module_path.child(method))
                        .map(TreeNode::new)
                        .collect();
                    modules.push(TreeNode {
                        path: module_path,
                        kind: NodeKind::Module { methods },
                    });
                }
                services.push(TreeNode {
                    path: service_path,
                    kind: NodeKind::Service { modules },
                });
            }
            roots.push(TreeNode {
                path: project_path,
                kind: NodeKind::Project { services },
            });
        }
        CatalogTree { roots }
    }

    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    pub fn find(&self, path: &NodePath) -> Option<&TreeNode> {
        let mut nodes: &[TreeNode] = &self.roots;
        let mut found = None;
        for segment in path.segments() {
            let node = nodes.iter().find(|n| n.name() == segment.as_str())?;
            nodes = node.children();
            found = Some(node);
        }
        found
    }

    fn find_mut(&mut self, path: &NodePath) -> Option<&mut TreeNode> {
        let (first, rest) = path.segments().split_first()?;
        let mut node = self.roots.iter_mut().find(|n| n.name() == first.as_str())?;
        for segment in rest {
            node = node
                .children_mut()?
                .iter_mut()
                .find(|n| n.name() == segment.as_str())?;
        }
        Some(node)
    }

    fn siblings_mut(&mut self, parent: Option<&NodePath>) -> Option<&mut Vec<TreeNode>> {
        match parent {
            None => Some(&mut self.roots),
            Some(parent) => self.find_mut(parent)?.children_mut(),
        }
    }

    /// Add `name` under `parent` (a project when `parent` is `None`).
    ///
    /// The child level follows the parent: project → service → module → method.
    pub fn add_child(
        &mut self,
        store: &mut CatalogStore,
        parent: Option<&NodePath>,
        name: &str,
    ) -> bool {
        let path = match parent {
            None => NodePath::project(name),
            Some(parent) => match parent.child(name) {
                Some(path) => path,
                None => return false,
            },
        };
        if self.siblings_mut(parent).is_none() {
            return false;
        }
        if !store.add(parent, name) {
            return false;
        }
        if let Some(siblings) = self.siblings_mut(parent) {
            siblings.push(TreeNode::new(path));
        }
        true
    }

    /// Rename the node at `path` and rewrite the cached path of every
    /// descendant.
    pub fn rename(&mut self, store: &mut CatalogStore, path: &NodePath, new: &str) -> bool {
        if self.find(path).is_none() {
            return false;
        }
        if !store.rename(path, new) {
            return false;
        }
        let level = path.level();
        if let Some(node) = self.find_mut(path) {
            node.rename_segment(level, new);
        }
        true
    }

    /// Delete a method leaf. Other levels cannot be deleted.
    pub fn delete(&mut self, store: &mut CatalogStore, path: &NodePath) -> bool {
        let Some(method) = path.as_method() else {
            return false;
        };
        if self.find(path).is_none() {
            return false;
        }
        store.delete_method(&method);
        let parent = path.parent();
        if let Some(siblings) = self.siblings_mut(parent.as_ref()) {
            siblings.retain(|node| node.path() != path);
        }
        true
    }

    /// Select the node at `path`, reading its params and result from the
    /// store rather than from anything cached in the tree.
    pub fn select(&self, store: &CatalogStore, path: &NodePath) -> Option<Selection> {
        let node = self.find(path)?;
        let (params, result) = match node.path().as_method() {
            Some(method) => (store.get_param(&method), store.get_result(&method)),
            None => (Value::Object(Map::new()), Value::Object(Map::new())),
        };
        Some(Selection {
            path: node.path().clone(),
            params,
            result,
        })
    }

    /// Indented outline, two spaces per level.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for root in &self.roots {
            render_node(root, 0, &mut out);
        }
        out
    }
}

fn render_node(node: &TreeNode, depth: usize, out: &mut String) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(node.name());
    out.push('\n');
    for child in node.children() {
        render_node(child, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(segments: &[&str]) -> NodePath {
        NodePath::new(segments.iter().copied()).unwrap()
    }

    fn demo() -> (CatalogStore, CatalogTree) {
        let mut store = CatalogStore::in_memory();
        let mut tree = CatalogTree::default();
        assert!(tree.add_child(&mut store, None, "demo"));
        assert!(tree.add_child(&mut store, Some(&path(&["demo"])), "properties"));
        assert!(tree.add_child(&mut store, Some(&path(&["demo", "properties"])), "m1"));
        let module = path(&["demo", "properties", "m1"]);
        assert!(tree.add_child(&mut store, Some(&module), "page_bed_status"));
        assert!(tree.add_child(&mut store, Some(&module), "list_beds"));
        (store, tree)
    }

    #[test]
    fn load_mirrors_store() {
        let (store, tree) = demo();
        assert_eq!(CatalogTree::load(&store), tree);
        let module = tree.find(&path(&["demo", "properties", "m1"])).unwrap();
        let names: Vec<&str> = module.children().iter().map(TreeNode::name).collect();
        assert_eq!(names, vec!["page_bed_status", "list_beds"]);
    }

    #[test]
    fn add_child_infers_level_from_parent() {
        let (_, tree) = demo();
        let method = tree
            .find(&path(&["demo", "properties", "m1", "list_beds"]))
            .unwrap();
        assert_eq!(method.level(), Level::Method);
        assert_eq!(method.kind(), &NodeKind::Method);
    }

    #[test]
    fn add_child_below_method_is_rejected() {
        let (mut store, mut tree) = demo();
        let leaf = path(&["demo", "properties", "m1", "list_beds"]);
        assert!(!tree.add_child(&mut store, Some(&leaf), "x"));
    }

    #[test]
    fn add_child_duplicate_leaves_tree_unchanged() {
        let (mut store, mut tree) = demo();
        let before = tree.clone();
        assert!(!tree.add_child(&mut store, Some(&path(&["demo"])), "properties"));
        assert_eq!(tree, before);
    }

    #[test]
    fn rename_service_cascades_to_descendants() {
        let (mut store, mut tree) = demo();
        let old_leaf = MethodPath::new("demo", "properties", "m1", "page_bed_status");
        store.update_params(&old_leaf, json!({"page": 3}));

        assert!(tree.rename(&mut store, &path(&["demo", "properties"]), "props"));

        let leaf = path(&["demo", "props", "m1", "page_bed_status"]);
        let node = tree.find(&leaf).unwrap();
        assert_eq!(node.path(), &leaf);
        let module = tree.find(&path(&["demo", "props", "m1"])).unwrap();
        assert!(module
            .children()
            .iter()
            .all(|child| child.path().segments()[1] == "props"));

        let selection = tree.select(&store, &leaf).unwrap();
        assert_eq!(selection.params, json!({"page": 3}));
        assert_eq!(store.get_param(&old_leaf), json!({}));
        assert_eq!(CatalogTree::load(&store), tree);
    }

    #[test]
    fn rename_project_cascades_through_all_levels() {
        let (mut store, mut tree) = demo();
        assert!(tree.rename(&mut store, &path(&["demo"]), "prod"));
        let leaf = path(&["prod", "properties", "m1", "list_beds"]);
        assert!(tree.find(&leaf).is_some());
        assert!(store.contains(&leaf));
    }

    #[test]
    fn rename_conflict_leaves_tree_unchanged() {
        let (mut store, mut tree) = demo();
        let before = tree.clone();
        let leaf = path(&["demo", "properties", "m1", "list_beds"]);
        assert!(!tree.rename(&mut store, &leaf, "page_bed_status"));
        assert_eq!(tree, before);
    }

    #[test]
    fn delete_removes_method_only() {
        let (mut store, mut tree) = demo();
        let leaf = path(&["demo", "properties", "m1", "list_beds"]);
        assert!(tree.delete(&mut store, &leaf));
        assert!(tree.find(&leaf).is_none());
        assert!(!store.contains(&leaf));
        assert!(!tree.delete(&mut store, &path(&["demo", "properties"])));
        assert!(tree.find(&path(&["demo", "properties"])).is_some());
    }

    #[test]
    fn select_reads_fresh_values_from_store() {
        let (mut store, tree) = demo();
        let leaf = path(&["demo", "properties", "m1", "page_bed_status"]);
        let method = leaf.as_method().unwrap();
        store.update_params(&method, json!({"page": 9}));
        store.update_result(&method, json!({"total": 1}));

        let selection = tree.select(&store, &leaf).unwrap();
        assert_eq!(selection.method_path(), Some(method));
        assert_eq!(selection.params, json!({"page": 9}));
        assert_eq!(selection.result, json!({"total": 1}));

        let service = tree.select(&store, &path(&["demo", "properties"])).unwrap();
        assert_eq!(service.params, json!({}));
        assert!(service.method_path().is_none());
    }

    #[test]
    fn render_indents_by_level() {
        let (_, tree) = demo();
        assert_eq!(
            tree.render(),
            "demo\n  properties\n    m1\n      page_bed_status\n      list_beds\n"
        );
    }
}
