//! Inclusion tree construction.
//!
//! Dotted include paths (`"a.b.c"`, `"a.b.d"`) are folded into a forest that
//! shares common prefixes, optionally rewritten by an [`IncludeOverrides`]
//! hook, and then pruned: every node left without children collapses back to
//! a bare name.
//!
//! ```text
//! ["test1.test2.test3", "test1.test2.test4"]
//!     => [{"test1": [{"test2": ["test3", "test4"]}]}]
//! ```

use super::extension::IncludeOverrides;
use super::types::IncludeNode;

/// Unpruned forest node: every path segment is a branch, leaves included.
///
/// This is the shape [`IncludeOverrides`] hooks receive and return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeBranch {
    pub name: String,
    pub children: Vec<IncludeBranch>,
}

impl IncludeBranch {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Find a direct child by name.
    pub fn child(&self, name: &str) -> Option<&IncludeBranch> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Build the pruned inclusion tree for a list of dotted paths.
pub fn build_include_tree<S: AsRef<str>>(paths: &[S]) -> Vec<IncludeNode> {
    build_include_tree_with(paths, None)
}

/// Build the pruned inclusion tree, letting `overrides` rewrite the folded
/// forest before pruning.
pub fn build_include_tree_with<S: AsRef<str>>(
    paths: &[S],
    overrides: Option<&dyn IncludeOverrides>,
) -> Vec<IncludeNode> {
    let mut forest = fold_paths(paths);
    if let Some(hook) = overrides {
        forest = hook.override_includes(forest);
    }
    prune(forest)
}

/// Fold dotted paths into a deduplicated forest.
///
/// Sibling order follows first insertion; a repeated name reuses the
/// existing branch.
pub fn fold_paths<S: AsRef<str>>(paths: &[S]) -> Vec<IncludeBranch> {
    let mut forest = Vec::new();
    for path in paths {
        let segments: Vec<&str> = path
            .as_ref()
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        insert_path(&mut forest, &segments);
    }
    forest
}

fn insert_path(level: &mut Vec<IncludeBranch>, segments: &[&str]) {
    let [first, rest @ ..] = segments else {
        return;
    };

    let index = match level.iter().position(|b| b.name == *first) {
        Some(index) => index,
        None => {
            level.push(IncludeBranch::new(*first));
            level.len() - 1
        }
    };

    insert_path(&mut level[index].children, rest);
}

/// Collapse childless branches into bare names, bottom-up.
pub fn prune(forest: Vec<IncludeBranch>) -> Vec<IncludeNode> {
    forest
        .into_iter()
        .map(|branch| {
            if branch.children.is_empty() {
                IncludeNode::Leaf(branch.name)
            } else {
                IncludeNode::Internal {
                    name: branch.name,
                    children: prune(branch.children),
                }
            }
        })
        .collect()
}

/// Dot-join every root-to-leaf path of a pruned tree.
pub fn flatten(tree: &[IncludeNode]) -> Vec<String> {
    let mut paths = Vec::new();
    for node in tree {
        collect_paths(node, "", &mut paths);
    }
    paths
}

fn collect_paths(node: &IncludeNode, prefix: &str, out: &mut Vec<String>) {
    let path = if prefix.is_empty() {
        node.name().to_string()
    } else {
        format!("{prefix}.{}", node.name())
    };

    match node {
        IncludeNode::Leaf(_) => out.push(path),
        IncludeNode::Internal { children, .. } => {
            for child in children {
                collect_paths(child, &path, out);
            }
        }
    }
}
