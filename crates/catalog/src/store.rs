//! The catalog store: the in-memory catalog plus the file it mirrors.
//!
//! Every mutation that changes state rewrites the whole file. Catalogs are
//! small, hand-curated request templates, so a full rewrite through a temp
//! file and rename keeps the file either fully old or fully new.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::CatalogError;
use crate::model::{Catalog, MethodEntry, Module, Project, Service};
use crate::path::{Level, MethodPath, NodePath};

/// Sole owner and writer of the catalog file.
#[derive(Debug)]
pub struct CatalogStore {
    file: Option<PathBuf>,
    catalog: Catalog,
}

impl CatalogStore {
    /// Load the catalog at `file`, starting empty if it is missing or unreadable.
    pub fn open(file: impl Into<PathBuf>) -> CatalogStore {
        let file = file.into();
        let catalog = Self::load(&file);
        CatalogStore {
            file: Some(file),
            catalog,
        }
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> CatalogStore {
        CatalogStore {
            file: None,
            catalog: Catalog::default(),
        }
    }

    /// Read and parse `file`. Any failure is logged and yields an empty catalog.
    pub fn load(file: &Path) -> Catalog {
        match Self::try_load(file) {
            Ok(catalog) => {
                tracing::debug!(
                    file = %file.display(),
                    projects = catalog.projects.len(),
                    "loaded catalog"
                );
                catalog
            }
            Err(CatalogError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::info!(file = %file.display(), "no catalog file yet, starting empty");
                Catalog::default()
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load catalog, starting empty");
                Catalog::default()
            }
        }
    }

    fn try_load(file: &Path) -> Result<Catalog, CatalogError> {
        let text = std::fs::read_to_string(file).map_err(|source| CatalogError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&text).map_err(|source| CatalogError::Parse {
            path: file.to_path_buf(),
            source,
        })?;
        Ok(Catalog::from_value(&value))
    }

    /// Rewrite the whole catalog file.
    ///
    /// The document is written to a temp file in the same directory and then
    /// renamed over the target. In-memory stores are a no-op.
    pub fn save(&self) -> Result<(), CatalogError> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        let io_err = |source| CatalogError::Io {
            path: file.clone(),
            source,
        };
        let dir = match file.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut text = rpcman_format::pretty(&self.catalog.to_value());
        text.push('\n');

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(text.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(file).map_err(|e| CatalogError::Persist {
            path: file.clone(),
            message: e.error.to_string(),
        })?;
        Ok(())
    }

    /// Persist after a successful mutation. A failed write is logged; the
    /// in-memory change stands and the next successful save catches the file up.
    fn commit(&self) {
        if let Err(e) = self.save() {
            tracing::error!(error = %e, "failed to save catalog");
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    // ── Lookups ──────────────────────────────────────────────────────────────

    fn project_mut(&mut self, project: &str) -> Option<&mut Project> {
        self.catalog.projects.get_mut(project)
    }

    fn service_mut(&mut self, project: &str, service: &str) -> Option<&mut Service> {
        self.project_mut(project)?.services.get_mut(service)
    }

    fn module_mut(&mut self, project: &str, service: &str, module: &str) -> Option<&mut Module> {
        self.service_mut(project, service)?.modules.get_mut(module)
    }

    pub fn method_entry(&self, path: &MethodPath) -> Option<&MethodEntry> {
        self.catalog
            .projects
            .get(&path.project)?
            .services
            .get(&path.service)?
            .modules
            .get(&path.module)?
            .methods
            .get(&path.method)
    }

    fn method_entry_mut(&mut self, path: &MethodPath) -> Option<&mut MethodEntry> {
        self.module_mut(&path.project, &path.service, &path.module)?
            .methods
            .get_mut(&path.method)
    }

    /// Whether a node exists at `path`.
    pub fn contains(&self, path: &NodePath) -> bool {
        let projects = &self.catalog.projects;
        match path.segments() {
            [p] => projects.contains(p),
            [p, s] => projects.get(p).is_some_and(|p| p.services.contains(s)),
            [p, s, m] => projects
                .get(p)
                .and_then(|p| p.services.get(s))
                .is_some_and(|s| s.modules.contains(m)),
            _ => path
                .as_method()
                .is_some_and(|method| self.method_entry(&method).is_some()),
        }
    }

    /// Level of the node at `path`, if it exists.
    pub fn level_of(&self, path: &NodePath) -> Option<Level> {
        self.contains(path).then(|| path.level())
    }

    // ── Add ──────────────────────────────────────────────────────────────────

    pub fn add_project(&mut self, name: &str) -> bool {
        if !valid_name(name) {
            return false;
        }
        let added = self.catalog.projects.insert(name, Project::default());
        self.finish("add project", added, name)
    }

    pub fn add_service(&mut self, project: &str, name: &str) -> bool {
        if !valid_name(name) {
            return false;
        }
        let added = self
            .project_mut(project)
            .is_some_and(|p| p.services.insert(name, Service::default()));
        self.finish("add service", added, name)
    }

    pub fn add_module(&mut self, project: &str, service: &str, name: &str) -> bool {
        if !valid_name(name) {
            return false;
        }
        let added = self
            .service_mut(project, service)
            .is_some_and(|s| s.modules.insert(name, Module::default()));
        self.finish("add module", added, name)
    }

    /// Add a method leaf with `params` (empty when `None`) and an empty result.
    pub fn add_method(
        &mut self,
        project: &str,
        service: &str,
        module: &str,
        name: &str,
        params: Option<Map<String, Value>>,
    ) -> bool {
        if !valid_name(name) {
            return false;
        }
        let entry = MethodEntry::with_params(params.unwrap_or_default());
        let added = self
            .module_mut(project, service, module)
            .is_some_and(|m| m.methods.insert(name, entry));
        self.finish("add method", added, name)
    }

    /// Add `name` beneath `parent`, or as a project when `parent` is `None`.
    pub fn add(&mut self, parent: Option<&NodePath>, name: &str) -> bool {
        let Some(parent) = parent else {
            return self.add_project(name);
        };
        match parent.segments() {
            [p] => self.add_service(p, name),
            [p, s] => self.add_module(p, s, name),
            [p, s, m] => self.add_method(p, s, m, name, None),
            _ => false,
        }
    }

    // ── Rename ───────────────────────────────────────────────────────────────

    pub fn update_project_name(&mut self, old: &str, new: &str) -> bool {
        if old == new {
            return true;
        }
        if !valid_name(new) {
            return false;
        }
        let renamed = self.catalog.projects.rename(old, new);
        self.finish("rename project", renamed, new)
    }

    pub fn update_service_name(&mut self, project: &str, old: &str, new: &str) -> bool {
        if old == new {
            return true;
        }
        if !valid_name(new) {
            return false;
        }
        let renamed = self
            .project_mut(project)
            .is_some_and(|p| p.services.rename(old, new));
        self.finish("rename service", renamed, new)
    }

    pub fn update_module_name(
        &mut self,
        project: &str,
        service: &str,
        old: &str,
        new: &str,
    ) -> bool {
        if old == new {
            return true;
        }
        if !valid_name(new) {
            return false;
        }
        let renamed = self
            .service_mut(project, service)
            .is_some_and(|s| s.modules.rename(old, new));
        self.finish("rename module", renamed, new)
    }

    pub fn update_method_name(
        &mut self,
        project: &str,
        service: &str,
        module: &str,
        old: &str,
        new: &str,
    ) -> bool {
        if old == new {
            return true;
        }
        if !valid_name(new) {
            return false;
        }
        let renamed = self
            .module_mut(project, service, module)
            .is_some_and(|m| m.methods.rename(old, new));
        self.finish("rename method", renamed, new)
    }

    /// Rename the node at `path`, dispatching on its level.
    pub fn rename(&mut self, path: &NodePath, new: &str) -> bool {
        match path.segments() {
            [p] => self.update_project_name(p, new),
            [p, s] => self.update_service_name(p, s, new),
            [p, s, m] => self.update_module_name(p, s, m, new),
            [p, s, m, x] => self.update_method_name(p, s, m, x, new),
            _ => false,
        }
    }

    // ── Leaf operations ──────────────────────────────────────────────────────

    /// Remove a method leaf. Absent paths are a silent no-op.
    pub fn delete_method(&mut self, path: &MethodPath) -> bool {
        let removed = self
            .module_mut(&path.project, &path.service, &path.module)
            .and_then(|m| m.methods.remove(&path.method))
            .is_some();
        if removed {
            tracing::debug!(method = %path, "deleted method");
            self.commit();
        }
        removed
    }

    /// Overwrite a method's params. Non-object values are stored as `{}`.
    pub fn update_params(&mut self, path: &MethodPath, params: Value) -> bool {
        let params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let Some(entry) = self.method_entry_mut(path) else {
            return false;
        };
        entry.params = params;
        tracing::debug!(method = %path, "updated params");
        self.commit();
        true
    }

    /// Overwrite a method's result, but only with an object or an array.
    ///
    /// Scalars and strings are ignored so that error text never replaces the
    /// last structured result.
    pub fn update_result(&mut self, path: &MethodPath, result: Value) -> bool {
        if !(result.is_object() || result.is_array()) {
            tracing::debug!(method = %path, "ignoring non-structured result");
            return false;
        }
        let Some(entry) = self.method_entry_mut(path) else {
            return false;
        };
        entry.result = result;
        tracing::debug!(method = %path, "updated result");
        self.commit();
        true
    }

    /// Stored params, or `{}` when the path does not resolve.
    pub fn get_param(&self, path: &MethodPath) -> Value {
        self.method_entry(path)
            .map(|entry| Value::Object(entry.params.clone()))
            .unwrap_or_else(empty_object)
    }

    /// Stored result, or `{}` when the path does not resolve.
    pub fn get_result(&self, path: &MethodPath) -> Value {
        self.method_entry(path)
            .map(|entry| entry.result.clone())
            .unwrap_or_else(empty_object)
    }

    fn finish(&self, action: &str, changed: bool, name: &str) -> bool {
        if changed {
            tracing::debug!(name = %name, "{action}");
            self.commit();
        } else {
            tracing::debug!(name = %name, "{action} rejected: name taken or parent missing");
        }
        changed
    }
}

fn valid_name(name: &str) -> bool {
    !name.trim().is_empty()
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}
