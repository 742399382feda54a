//! Typed catalog model and its conversion to and from the nested JSON
//! document stored on disk.

use serde_json::{Map, Value};

/// Key of a method's request params in the catalog document.
pub const PARAMS: &str = "params";
/// Key of a method's last good result in the catalog document.
pub const RESULT: &str = "result";

// ──────────────────────────────────────────────
// Entries
// ──────────────────────────────────────────────

/// Insertion-ordered children of one catalog level, keyed by name.
///
/// Sibling names are unique: [`Entries::insert`] and [`Entries::rename`]
/// refuse to create a duplicate and leave the collection untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Entries<T> {
    items: Vec<(String, T)>,
}

impl<T> Default for Entries<T> {
    fn default() -> Self {
        Entries { items: Vec::new() }
    }
}

impl<T> Entries<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.items.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.items
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.items.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|(n, _)| n.as_str())
    }

    /// Append `value` under `name`. Returns `false` if the name is taken.
    pub fn insert(&mut self, name: impl Into<String>, value: T) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.items.push((name, value));
        true
    }

    /// Move the entry at `old` to the key `new`, keeping its position and
    /// its whole subtree.
    ///
    /// Returns `false` without changes when `old` is absent or `new` is taken
    /// by a different sibling. Renaming to the same name succeeds.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        let Some(index) = self.position(old) else {
            return false;
        };
        if old == new {
            return true;
        }
        if self.contains(new) {
            return false;
        }
        self.items[index].0 = new.to_string();
        true
    }

    pub fn remove(&mut self, name: &str) -> Option<T> {
        let index = self.position(name)?;
        Some(self.items.remove(index).1)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|(n, _)| n == name)
    }
}

// ──────────────────────────────────────────────
// Levels
// ──────────────────────────────────────────────

/// Root of the catalog: every project by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub projects: Entries<Project>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Project {
    pub services: Entries<Service>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Service {
    pub modules: Entries<Module>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    pub methods: Entries<MethodEntry>,
}

/// A method leaf: the request template and the last good response.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodEntry {
    pub params: Map<String, Value>,
    pub result: Value,
}

impl Default for MethodEntry {
    fn default() -> Self {
        MethodEntry {
            params: Map::new(),
            result: Value::Object(Map::new()),
        }
    }
}

impl MethodEntry {
    pub fn with_params(params: Map<String, Value>) -> Self {
        MethodEntry {
            params,
            ..MethodEntry::default()
        }
    }
}

// ──────────────────────────────────────────────
// JSON conversion
// ──────────────────────────────────────────────

impl Catalog {
    /// Build a catalog from the nested document.
    ///
    /// Anything that is not an object where one is expected is dropped with a
    /// warning; a partially readable file still yields the readable part.
    pub fn from_value(value: &Value) -> Catalog {
        let mut catalog = Catalog::default();
        let Some(projects) = as_level(value, "catalog root") else {
            return catalog;
        };
        for (project_name, project_value) in projects {
            let Some(services) = as_level(project_value, project_name) else {
                continue;
            };
            let mut project = Project::default();
            for (service_name, service_value) in services {
                let Some(modules) = as_level(service_value, service_name) else {
                    continue;
                };
                let mut service = Service::default();
                for (module_name, module_value) in modules {
                    let Some(methods) = as_level(module_value, module_name) else {
                        continue;
                    };
                    let mut module = Module::default();
                    for (method_name, method_value) in methods {
                        if let Some(entry) = method_from_value(method_name, method_value) {
                            module.methods.insert(method_name.clone(), entry);
                        }
                    }
                    service.modules.insert(module_name.clone(), module);
                }
                project.services.insert(service_name.clone(), service);
            }
            catalog.projects.insert(project_name.clone(), project);
        }
        catalog
    }

    /// Render the catalog as the nested document written to disk.
    pub fn to_value(&self) -> Value {
        let mut projects = Map::new();
        for (project_name, project) in self.projects.iter() {
            let mut services = Map::new();
            for (service_name, service) in project.services.iter() {
                let mut modules = Map::new();
                for (module_name, module) in service.modules.iter() {
                    let mut methods = Map::new();
                    for (method_name, entry) in module.methods.iter() {
                        let mut leaf = Map::new();
                        leaf.insert(PARAMS.to_string(), Value::Object(entry.params.clone()));
                        leaf.insert(RESULT.to_string(), entry.result.clone());
                        methods.insert(method_name.to_string(), Value::Object(leaf));
                    }
                    modules.insert(module_name.to_string(), Value::Object(methods));
                }
                services.insert(service_name.to_string(), Value::Object(modules));
            }
            projects.insert(project_name.to_string(), Value::Object(services));
        }
        Value::Object(projects)
    }
}

fn as_level<'a>(value: &'a Value, name: &str) -> Option<&'a Map<String, Value>> {
    let map = value.as_object();
    if map.is_none() {
        tracing::warn!(entry = %name, "skipping catalog entry that is not a JSON object");
    }
    map
}

fn method_from_value(name: &str, value: &Value) -> Option<MethodEntry> {
    let leaf = as_level(value, name)?;
    let params = match leaf.get(PARAMS) {
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            tracing::warn!(method = %name, "method params are not an object, using {{}}");
            Map::new()
        }
        None => Map::new(),
    };
    let result = leaf
        .get(RESULT)
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));
    Some(MethodEntry { params, result })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entries_insert_rejects_duplicates() {
        let mut entries = Entries::new();
        assert!(entries.insert("a", 1));
        assert!(!entries.insert("a", 2));
        assert_eq!(entries.get("a"), Some(&1));
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn entries_rename_keeps_position() {
        let mut entries = Entries::new();
        entries.insert("a", 1);
        entries.insert("b", 2);
        entries.insert("c", 3);
        assert!(entries.rename("b", "z"));
        assert_eq!(entries.names().collect::<Vec<_>>(), vec!["a", "z", "c"]);
        assert_eq!(entries.get("z"), Some(&2));
    }

    #[test]
    fn entries_rename_conflict_is_noop() {
        let mut entries = Entries::new();
        entries.insert("a", 1);
        entries.insert("b", 2);
        let before = entries.clone();
        assert!(!entries.rename("a", "b"));
        assert!(!entries.rename("missing", "x"));
        assert_eq!(entries, before);
        assert!(entries.rename("a", "a"));
    }

    #[test]
    fn from_value_reads_nested_document() {
        let doc = json!({
            "demo": {"properties": {"m1": {"page_bed_status": {
                "params": {"page": 1},
                "result": [1, 2]
            }}}}
        });
        let catalog = Catalog::from_value(&doc);
        let entry = catalog
            .projects
            .get("demo")
            .and_then(|p| p.services.get("properties"))
            .and_then(|s| s.modules.get("m1"))
            .and_then(|m| m.methods.get("page_bed_status"))
            .unwrap();
        assert_eq!(entry.params.get("page"), Some(&json!(1)));
        assert_eq!(entry.result, json!([1, 2]));
    }

    #[test]
    fn from_value_fills_missing_leaf_fields() {
        let doc = json!({"p": {"s": {"m": {"x": {}}}}});
        let catalog = Catalog::from_value(&doc);
        let entry = catalog
            .projects
            .get("p")
            .and_then(|p| p.services.get("s"))
            .and_then(|s| s.modules.get("m"))
            .and_then(|m| m.methods.get("x"))
            .unwrap();
        assert!(entry.params.is_empty());
        assert_eq!(entry.result, json!({}));
    }

    #[test]
    fn from_value_skips_malformed_levels() {
        let doc = json!({"ok": {}, "bad": 3, "p": {"s": "oops"}});
        let catalog = Catalog::from_value(&doc);
        assert!(catalog.projects.contains("ok"));
        assert!(!catalog.projects.contains("bad"));
        assert!(catalog.projects.get("p").unwrap().services.is_empty());
    }

    #[test]
    fn from_value_of_non_object_is_empty() {
        assert_eq!(Catalog::from_value(&json!([1, 2])), Catalog::default());
    }

    #[test]
    fn to_value_round_trips() {
        let doc = json!({
            "demo": {"svc": {"mod": {
                "a": {"params": {}, "result": {}},
                "b": {"params": {"k": "v"}, "result": {"ok": true}}
            }}},
            "empty": {}
        });
        assert_eq!(Catalog::from_value(&doc).to_value(), doc);
    }
}
