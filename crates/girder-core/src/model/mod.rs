//! Data model: identifiers, items, dependency edges, and the tree view node.

pub mod edge;
pub mod ids;
pub mod item;
pub mod tree;

pub use edge::{DependencyEdge, DependencyType};
pub use ids::{ItemId, ProjectId};
pub use item::{ItemDraft, ItemFields, ItemPatch, ParseEnumError, Priority, Status};
pub use tree::TreeNode;
