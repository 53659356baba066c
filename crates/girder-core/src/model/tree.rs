use serde::{Deserialize, Serialize};

use super::item::ItemFields;

/// One node of the nested tree view returned by the read projections.
///
/// `wbs_code` is populated by the WBS assigner, not by tree construction —
/// a freshly built tree carries `None` until codes are assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub item: ItemFields,
    pub wbs_code: Option<String>,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    #[must_use]
    pub const fn leaf(item: ItemFields) -> Self {
        Self {
            item,
            wbs_code: None,
            children: Vec::new(),
        }
    }

    /// Total number of items in this subtree, root included.
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Self::subtree_len).sum::<usize>()
    }
}
