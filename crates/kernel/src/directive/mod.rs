//! Request directive shaping.
//!
//! This module provides:
//! - parse_sort: `sort` directive parsing
//! - build_include_tree: dotted include paths to a pruned inclusion tree
//! - authorize_includes: include whitelist and depth check
//! - DirectiveAssembler: runs include, filter, sort and page stages
//! - DirectiveHooks: optional filter / include-override hooks
//! - Types: DirectiveParams, SortKey, IncludeNode, RequestOptions, etc.

mod assembler;
mod authorize;
pub mod extension;
pub mod include_tree;
mod sort;
pub mod types;

pub use assembler::DirectiveAssembler;
pub use authorize::{MAX_INCLUDE_DOTS, authorize_includes};
pub use extension::{DirectiveHooks, FilterHandler, IncludeOverrides};
pub use include_tree::{IncludeBranch, build_include_tree, build_include_tree_with, flatten};
pub use sort::parse_sort;
pub use types::{
    DirectiveParams, IncludeNode, PageParams, RequestOptions, SortDirection, SortKey,
};
