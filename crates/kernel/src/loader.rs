//! Single-resource resolution.

use tracing::debug;

use crate::collection::ResourceFinder;
use crate::error::{AppError, AppResult};

/// Resolve a member of `scope` by id, using friendly (slug) lookup when the
/// collection supports it.
pub fn load_resource<F: ResourceFinder>(scope: &F, id: &str) -> AppResult<F::Resource> {
    let found = if scope.supports_friendly_lookup() {
        scope.find_by_friendly_id(id)
    } else {
        scope.find_by_id(id)
    };

    found.ok_or_else(|| {
        debug!(id, "resource not found");
        AppError::NotFound
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::collection::CollectionHandle;
    use crate::directive::{IncludeNode, SortKey};
    use std::cell::RefCell;

    /// Finder double remembering which lookup was used.
    struct Finder {
        friendly: bool,
        calls: RefCell<Vec<String>>,
    }

    impl CollectionHandle for Finder {
        fn expand(self, _: &[IncludeNode]) -> Self {
            self
        }
        fn order_by(self, _: &[SortKey]) -> Self {
            self
        }
        fn limit(self, _: u64) -> Self {
            self
        }
        fn offset(self, _: u64) -> Self {
            self
        }
    }

    impl ResourceFinder for Finder {
        type Resource = String;

        fn supports_friendly_lookup(&self) -> bool {
            self.friendly
        }

        fn find_by_id(&self, id: &str) -> Option<String> {
            self.calls.borrow_mut().push(format!("id:{id}"));
            (id == "123").then(|| "by-id".to_string())
        }

        fn find_by_friendly_id(&self, id: &str) -> Option<String> {
            self.calls.borrow_mut().push(format!("friendly:{id}"));
            Some("by-slug".to_string())
        }

        fn fetch(&self) -> Vec<String> {
            Vec::new()
        }
    }

    fn finder(friendly: bool) -> Finder {
        Finder {
            friendly,
            calls: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn finds_by_id_without_friendly_lookup() {
        let scope = finder(false);
        assert_eq!(load_resource(&scope, "123").unwrap(), "by-id");
        assert_eq!(*scope.calls.borrow(), vec!["id:123"]);
    }

    #[test]
    fn finds_by_slug_with_friendly_lookup() {
        let scope = finder(true);
        assert_eq!(load_resource(&scope, "123").unwrap(), "by-slug");
        assert_eq!(*scope.calls.borrow(), vec!["friendly:123"]);
    }

    #[test]
    fn missing_resource_is_not_found() {
        let scope = finder(false);
        assert!(matches!(load_resource(&scope, "999"), Err(AppError::NotFound)));
    }
}
