//! Directive assembly.
//!
//! Runs the four optional stages against a collection handle, in order:
//! include, filter, sort, page. An include or filter failure aborts the
//! remaining stages; nothing is partially applied to the caller.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::authorize::authorize_includes;
use super::extension::DirectiveHooks;
use super::include_tree::build_include_tree_with;
use super::sort::parse_sort;
use super::types::{DirectiveParams, RequestOptions};
use crate::collection::CollectionHandle;
use crate::error::{AppError, AppResult};

/// Turns raw directives into [`RequestOptions`] and a shaped collection.
pub struct DirectiveAssembler<'a, C> {
    permitted_includes: &'a HashSet<String>,
    hooks: &'a DirectiveHooks<C>,
}

impl<'a, C: CollectionHandle> DirectiveAssembler<'a, C> {
    pub fn new(permitted_includes: &'a HashSet<String>, hooks: &'a DirectiveHooks<C>) -> Self {
        Self {
            permitted_includes,
            hooks,
        }
    }

    /// Assemble directives for a collection response.
    pub fn assemble(
        &self,
        collection: C,
        params: &DirectiveParams,
    ) -> AppResult<(RequestOptions, C)> {
        let mut options = RequestOptions::collection();

        let collection = self.apply_includes(collection, params, &mut options)?;
        let collection = self.apply_filters(collection, params)?;
        let collection = apply_sorting(collection, params, &mut options);
        let collection = apply_pagination(collection, params, &mut options)?;

        Ok((options, collection))
    }

    /// Assemble directives for a single-resource response.
    ///
    /// Only `include` applies. The tree is built for serialization but no
    /// collection is shaped.
    pub fn member_options(&self, params: &DirectiveParams) -> AppResult<RequestOptions> {
        let mut options = RequestOptions::member();
        if let Some(paths) = params.include_list() {
            authorize_includes(&paths, self.permitted_includes)?;
            options.include_tree =
                build_include_tree_with(&paths, self.hooks.include_overrides());
            options.include_paths = paths;
        }
        Ok(options)
    }

    fn apply_includes(
        &self,
        collection: C,
        params: &DirectiveParams,
        options: &mut RequestOptions,
    ) -> AppResult<C> {
        let Some(paths) = params.include_list() else {
            return Ok(collection);
        };

        authorize_includes(&paths, self.permitted_includes)?;

        let tree = build_include_tree_with(&paths, self.hooks.include_overrides());
        debug!(includes = ?paths, nodes = tree.len(), "expanding includes");

        let collection = collection.expand(&tree);
        options.include_paths = paths;
        options.include_tree = tree;
        Ok(collection)
    }

    fn apply_filters(&self, collection: C, params: &DirectiveParams) -> AppResult<C> {
        let Some(filter) = params.filter() else {
            return Ok(collection);
        };

        match self.hooks.filter() {
            Some(handler) => {
                debug!(filter, "delegating filter");
                handler.filter_resources(collection, filter)
            }
            None => {
                warn!(filter, "filter directive without a filter handler");
                Err(AppError::UnsupportedFilter(filter.to_string()))
            }
        }
    }
}

fn apply_sorting<C: CollectionHandle>(
    collection: C,
    params: &DirectiveParams,
    options: &mut RequestOptions,
) -> C {
    let keys = parse_sort(params.sort.as_deref());
    if keys.is_empty() {
        return collection;
    }

    debug!(sort = ?keys, "applying sort");
    let collection = collection.order_by(&keys);
    options.sort_keys = keys;
    collection
}

fn apply_pagination<C: CollectionHandle>(
    collection: C,
    params: &DirectiveParams,
    options: &mut RequestOptions,
) -> AppResult<C> {
    let Some(page) = params.page()? else {
        return Ok(collection);
    };

    let mut collection = collection;
    if let Some(limit) = page.limit {
        collection = collection.limit(limit);
        options.limit = Some(limit);
    }
    if let Some(offset) = page.offset {
        collection = collection.offset(offset);
        options.offset = Some(offset);
    }

    debug!(limit = ?options.limit, offset = ?options.offset, "applying pagination");
    Ok(collection)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::directive::{IncludeNode, SortKey};

    /// Collection double recording every shaping call.
    #[derive(Debug, Default, PartialEq)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl CollectionHandle for Recorder {
        fn expand(mut self, tree: &[IncludeNode]) -> Self {
            let rendered = serde_json::to_string(tree).unwrap_or_default();
            self.calls.push(format!("expand {rendered}"));
            self
        }

        fn order_by(mut self, keys: &[SortKey]) -> Self {
            let clauses: Vec<String> = keys.iter().map(SortKey::to_order_clause).collect();
            self.calls.push(format!("order {}", clauses.join(",")));
            self
        }

        fn limit(mut self, limit: u64) -> Self {
            self.calls.push(format!("limit {limit}"));
            self
        }

        fn offset(mut self, offset: u64) -> Self {
            self.calls.push(format!("offset {offset}"));
            self
        }
    }

    fn permitted(paths: &[&str]) -> HashSet<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    fn run(
        params: DirectiveParams,
        permitted: &HashSet<String>,
        hooks: &DirectiveHooks<Recorder>,
    ) -> AppResult<(RequestOptions, Recorder)> {
        DirectiveAssembler::new(permitted, hooks).assemble(Recorder::default(), &params)
    }

    #[test]
    fn no_directives_is_a_no_op() {
        let (options, recorder) =
            run(DirectiveParams::default(), &HashSet::new(), &DirectiveHooks::new()).unwrap();
        assert!(recorder.calls.is_empty());
        assert!(options.is_collection);
        assert!(options.include_paths.is_empty());
    }

    #[test]
    fn permitted_include_expands_tree() {
        let params = DirectiveParams {
            include: Some("author,comments.author".to_string()),
            ..Default::default()
        };
        let allowed = permitted(&["author", "comments.author"]);
        let (options, recorder) = run(params, &allowed, &DirectiveHooks::new()).unwrap();

        assert_eq!(
            recorder.calls,
            vec![r#"expand ["author",{"comments":["author"]}]"#]
        );
        assert_eq!(options.include_paths, vec!["author", "comments.author"]);
        assert_eq!(options.include_tree.len(), 2);
    }

    #[test]
    fn unpermitted_include_aborts() {
        let params = DirectiveParams {
            include: Some("assoc".to_string()),
            sort: Some("title".to_string()),
            ..Default::default()
        };
        let err = run(params, &HashSet::new(), &DirectiveHooks::new()).unwrap_err();
        assert_eq!(err.to_string(), "found unpermitted parameters: include=assoc");
    }

    #[test]
    fn filter_without_handler_fails() {
        let params = DirectiveParams {
            filter: Some("some-scope".to_string()),
            ..Default::default()
        };
        let err = run(params, &HashSet::new(), &DirectiveHooks::new()).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFilter(ref f) if f == "some-scope"));
    }

    #[test]
    fn filter_handler_is_called() {
        let hooks: DirectiveHooks<Recorder> = DirectiveHooks::new().with_filter(
            |mut recorder: Recorder, raw: &str| -> AppResult<Recorder> {
                recorder.calls.push(format!("filter {raw}"));
                Ok(recorder)
            },
        );
        let params = DirectiveParams {
            filter: Some("published".to_string()),
            ..Default::default()
        };
        let (_, recorder) = run(params, &HashSet::new(), &hooks).unwrap();
        assert_eq!(recorder.calls, vec!["filter published"]);
    }

    #[test]
    fn sort_is_applied_in_order() {
        let params = DirectiveParams {
            sort: Some("attr1,-attr2".to_string()),
            ..Default::default()
        };
        let (options, recorder) = run(params, &HashSet::new(), &DirectiveHooks::new()).unwrap();
        assert_eq!(recorder.calls, vec!["order attr1,attr2 DESC"]);
        assert_eq!(options.sort_keys.len(), 2);
    }

    #[test]
    fn limit_without_offset() {
        let params = DirectiveParams {
            page_limit: Some("10".to_string()),
            ..Default::default()
        };
        let (options, recorder) = run(params, &HashSet::new(), &DirectiveHooks::new()).unwrap();
        assert_eq!(recorder.calls, vec!["limit 10"]);
        assert_eq!(options.offset, None);
    }

    #[test]
    fn limit_then_offset() {
        let params = DirectiveParams {
            page_limit: Some("50".to_string()),
            page_offset: Some("150".to_string()),
            ..Default::default()
        };
        let (options, recorder) = run(params, &HashSet::new(), &DirectiveHooks::new()).unwrap();
        assert_eq!(recorder.calls, vec!["limit 50", "offset 150"]);
        assert_eq!((options.limit, options.offset), (Some(50), Some(150)));
    }

    #[test]
    fn include_without_page_does_not_limit() {
        let params = DirectiveParams {
            include: Some("some".to_string()),
            ..Default::default()
        };
        let allowed = permitted(&["some"]);
        let (_, recorder) = run(params, &allowed, &DirectiveHooks::new()).unwrap();
        assert!(!recorder.calls.iter().any(|c| c.starts_with("limit")));
    }

    #[test]
    fn stages_run_in_fixed_order() {
        let hooks: DirectiveHooks<Recorder> = DirectiveHooks::new().with_filter(
            |mut recorder: Recorder, _: &str| -> AppResult<Recorder> {
                recorder.calls.push("filter".to_string());
                Ok(recorder)
            },
        );
        let params = DirectiveParams {
            include: Some("author".to_string()),
            sort: Some("-created".to_string()),
            filter: Some("x".to_string()),
            page_limit: Some("5".to_string()),
            page_offset: Some("5".to_string()),
        };
        let allowed = permitted(&["author"]);
        let (_, recorder) = run(params, &allowed, &hooks).unwrap();
        assert_eq!(
            recorder.calls,
            vec![
                r#"expand ["author"]"#,
                "filter",
                "order created DESC",
                "limit 5",
                "offset 5",
            ]
        );
    }

    #[test]
    fn member_options_authorize_includes() {
        let hooks: DirectiveHooks<Recorder> = DirectiveHooks::new();
        let allowed = permitted(&["author"]);
        let assembler = DirectiveAssembler::new(&allowed, &hooks);

        let params = DirectiveParams {
            include: Some("author".to_string()),
            ..Default::default()
        };
        let options = assembler.member_options(&params).unwrap();
        assert!(!options.is_collection);
        assert!(options.includes("author"));

        let params = DirectiveParams {
            include: Some("author.profile.avatar".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            assembler.member_options(&params),
            Err(AppError::UnpermittedInclude(_))
        ));
    }
}
