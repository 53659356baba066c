//! Work breakdown structure codes.
//!
//! Codes are 1-based dotted paths ("1", "1.2", "1.2.3") assigned over the
//! tree's sibling order, with no depth limit. The tree builder already
//! orders siblings by `(sort_index, created_at)`, so assignment is a single
//! recursive walk.

use girder_core::TreeNode;

/// Assign WBS codes to every node of a project tree, in place.
pub fn assign_codes(nodes: &mut [TreeNode]) {
    assign_level(nodes, None);
}

fn assign_level(nodes: &mut [TreeNode], prefix: Option<&str>) {
    for (position, node) in nodes.iter_mut().enumerate() {
        let ordinal = position + 1;
        let code = match prefix {
            Some(prefix) => format!("{prefix}.{ordinal}"),
            None => ordinal.to_string(),
        };
        assign_level(&mut node.children, Some(&code));
        node.wbs_code = Some(code);
    }
}
