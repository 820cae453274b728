//! Data-access contracts.
//!
//! The kernel never executes queries itself. It shapes a collection handle
//! supplied by a store and asks that handle for records.

use crate::directive::{IncludeNode, SortKey};
use crate::error::ValidationErrors;

/// A lazily shaped collection of resources.
///
/// Shaping calls consume and return the handle, so a chain reads in the
/// order directives were applied.
pub trait CollectionHandle: Sized {
    /// Eager-load the relationships named by a pruned include tree.
    fn expand(self, tree: &[IncludeNode]) -> Self;

    /// Order by the given keys, in precedence order.
    fn order_by(self, keys: &[SortKey]) -> Self;

    fn limit(self, limit: u64) -> Self;

    fn offset(self, offset: u64) -> Self;
}

/// A collection handle that can also resolve members.
pub trait ResourceFinder: CollectionHandle {
    type Resource;

    /// Whether members can be resolved by slug as well as by id.
    fn supports_friendly_lookup(&self) -> bool {
        false
    }

    fn find_by_id(&self, id: &str) -> Option<Self::Resource>;

    /// Resolve by slug. Stores without friendly lookup fall back to the id.
    fn find_by_friendly_id(&self, id: &str) -> Option<Self::Resource> {
        self.find_by_id(id)
    }

    /// Execute the shaped collection.
    fn fetch(&self) -> Vec<Self::Resource>;
}

/// Backing store for one resource type.
pub trait ResourceStore: Send + Sync {
    type Collection: ResourceFinder;

    /// Base collection handle, before any policy scope or directive.
    fn collection(&self) -> Self::Collection;

    /// Validate and persist a new resource.
    fn insert(
        &self,
        resource: <Self::Collection as ResourceFinder>::Resource,
    ) -> Result<<Self::Collection as ResourceFinder>::Resource, ValidationErrors>;

    /// Validate and replace the stored resource with the same primary id.
    fn update(
        &self,
        resource: <Self::Collection as ResourceFinder>::Resource,
    ) -> Result<<Self::Collection as ResourceFinder>::Resource, ValidationErrors>;

    /// Remove a resource by primary id. Returns whether anything was removed.
    fn delete(&self, id: &str) -> bool;
}
