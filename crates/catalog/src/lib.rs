//! The request catalog: a four-level tree of
//! project → service → module → method, where each method leaf holds the
//! last params sent and the last good result received.
//!
//! [`CatalogStore`] owns the persisted file and every naming invariant.
//! [`CatalogTree`] is a navigable projection of the store; it never mutates
//! itself unless the matching store operation succeeded first.

mod error;
mod model;
mod path;
mod store;
mod tree;

pub use error::CatalogError;
pub use model::{Catalog, Entries, MethodEntry, Module, Project, Service, PARAMS, RESULT};
pub use path::{Level, MethodPath, NodePath};
pub use store::CatalogStore;
pub use tree::{CatalogTree, NodeKind, Selection, TreeNode};
