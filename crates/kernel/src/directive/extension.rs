//! Optional directive hooks registered per resource type.
//!
//! Two seams are available:
//! - [`FilterHandler`]: receives the `filter` directive. Without one, a
//!   `filter` directive is rejected rather than ignored.
//! - [`IncludeOverrides`]: rewrites the folded include forest before pruning,
//!   e.g. to inject implied includes.
//!
//! Both traits are implemented for plain closures.

use std::sync::Arc;

use super::include_tree::IncludeBranch;
use crate::error::AppResult;

// ---------------------------------------------------------------------------
// Handler traits
// ---------------------------------------------------------------------------

/// Handler for the opaque `filter` directive.
pub trait FilterHandler<C>: Send + Sync {
    /// Narrow `collection` according to the raw filter value.
    fn filter_resources(&self, collection: C, filter: &str) -> AppResult<C>;
}

impl<C, F> FilterHandler<C> for F
where
    F: Fn(C, &str) -> AppResult<C> + Send + Sync,
{
    fn filter_resources(&self, collection: C, filter: &str) -> AppResult<C> {
        self(collection, filter)
    }
}

/// Rewrites the include forest before it is pruned.
pub trait IncludeOverrides: Send + Sync {
    fn override_includes(&self, forest: Vec<IncludeBranch>) -> Vec<IncludeBranch>;
}

impl<F> IncludeOverrides for F
where
    F: Fn(Vec<IncludeBranch>) -> Vec<IncludeBranch> + Send + Sync,
{
    fn override_includes(&self, forest: Vec<IncludeBranch>) -> Vec<IncludeBranch> {
        self(forest)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Hooks registered for one resource type, checked once per assembly.
pub struct DirectiveHooks<C> {
    filter: Option<Arc<dyn FilterHandler<C>>>,
    include_overrides: Option<Arc<dyn IncludeOverrides>>,
}

impl<C> Default for DirectiveHooks<C> {
    fn default() -> Self {
        Self {
            filter: None,
            include_overrides: None,
        }
    }
}

impl<C> Clone for DirectiveHooks<C> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            include_overrides: self.include_overrides.clone(),
        }
    }
}

impl<C> std::fmt::Debug for DirectiveHooks<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectiveHooks")
            .field("filter", &self.filter.is_some())
            .field("include_overrides", &self.include_overrides.is_some())
            .finish()
    }
}

impl<C> DirectiveHooks<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the filter handler.
    pub fn with_filter(mut self, handler: impl FilterHandler<C> + 'static) -> Self {
        self.filter = Some(Arc::new(handler));
        self
    }

    /// Register the include overrides hook.
    pub fn with_include_overrides(mut self, hook: impl IncludeOverrides + 'static) -> Self {
        self.include_overrides = Some(Arc::new(hook));
        self
    }

    pub fn filter(&self) -> Option<&dyn FilterHandler<C>> {
        self.filter.as_deref()
    }

    pub fn include_overrides(&self) -> Option<&dyn IncludeOverrides> {
        self.include_overrides.as_deref()
    }
}
