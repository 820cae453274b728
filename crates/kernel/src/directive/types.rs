//! Directive types.
//!
//! Provides the shapes flowing between the directive stages:
//! - DirectiveParams: raw `include`/`sort`/`filter`/`page[...]` query parameters
//! - SortKey: one parsed sort column
//! - IncludeNode: a pruned inclusion tree node (bare name or nested)
//! - RequestOptions: the assembled bag handed to data access and serialization

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{AppError, AppResult};

/// Raw query-shaping parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectiveParams {
    /// Comma-separated dotted relationship paths.
    pub include: Option<String>,

    /// Comma-separated field names, `-` prefix for descending.
    pub sort: Option<String>,

    /// Opaque filter value, handed to the filter hook untouched.
    pub filter: Option<String>,

    #[serde(rename = "page[limit]")]
    pub page_limit: Option<String>,

    #[serde(rename = "page[offset]")]
    pub page_offset: Option<String>,
}

impl DirectiveParams {
    /// Flat include list: split on `,`, trimmed, blanks dropped, duplicates
    /// collapsed in order of first appearance.
    ///
    /// Returns `None` when the directive is absent or blank.
    pub fn include_list(&self) -> Option<Vec<String>> {
        let raw = self.include.as_deref()?;
        let mut paths: Vec<String> = Vec::new();
        for path in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if !paths.iter().any(|seen| seen == path) {
                paths.push(path.to_string());
            }
        }
        if paths.is_empty() { None } else { Some(paths) }
    }

    /// The filter value, or `None` when absent or blank.
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref().filter(|f| !f.trim().is_empty())
    }

    /// Parsed `page[limit]` / `page[offset]`.
    ///
    /// `None` when neither key was supplied.
    pub fn page(&self) -> AppResult<Option<PageParams>> {
        if self.page_limit.is_none() && self.page_offset.is_none() {
            return Ok(None);
        }
        Ok(Some(PageParams {
            limit: parse_page_value("limit", self.page_limit.as_deref())?,
            offset: parse_page_value("offset", self.page_offset.as_deref())?,
        }))
    }
}

fn parse_page_value(key: &str, raw: Option<&str>) -> AppResult<Option<u64>> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    raw.parse()
        .map(Some)
        .map_err(|_| AppError::BadRequest(format!("page[{key}] must be a non-negative integer")))
}

/// Limit/offset pagination bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageParams {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One sort column. Order within a list is precedence order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    pub fn is_descending(&self) -> bool {
        self.direction == SortDirection::Desc
    }

    /// Render as an order clause fragment: `field` or `field DESC`.
    pub fn to_order_clause(&self) -> String {
        match self.direction {
            SortDirection::Asc => self.field.clone(),
            SortDirection::Desc => format!("{} DESC", self.field),
        }
    }
}

/// A node of the pruned inclusion tree.
///
/// Serializes to the mixed shape consumers expect: a leaf is a bare string,
/// an internal node is a single-key object `{"name": [children...]}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncludeNode {
    Leaf(String),
    Internal {
        name: String,
        children: Vec<IncludeNode>,
    },
}

impl IncludeNode {
    pub fn name(&self) -> &str {
        match self {
            IncludeNode::Leaf(name) | IncludeNode::Internal { name, .. } => name,
        }
    }

    pub fn children(&self) -> &[IncludeNode] {
        match self {
            IncludeNode::Leaf(_) => &[],
            IncludeNode::Internal { children, .. } => children,
        }
    }
}

impl Serialize for IncludeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            IncludeNode::Leaf(name) => serializer.serialize_str(name),
            IncludeNode::Internal { name, children } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(name, children)?;
                map.end()
            }
        }
    }
}

/// Assembled directives for one request.
///
/// Built by the assembler, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Flat include paths, for authorization and serialization hints.
    pub include_paths: Vec<String>,

    /// Pruned inclusion tree, for data-access expansion.
    pub include_tree: Vec<IncludeNode>,

    /// Sort keys in precedence order.
    pub sort_keys: Vec<SortKey>,

    /// Whether the response renders a collection.
    pub is_collection: bool,

    pub limit: Option<u64>,

    pub offset: Option<u64>,
}

impl RequestOptions {
    /// Options for a collection response.
    pub fn collection() -> Self {
        Self {
            is_collection: true,
            ..Default::default()
        }
    }

    /// Options for a single-resource response.
    pub fn member() -> Self {
        Self::default()
    }

    pub fn includes(&self, path: &str) -> bool {
        self.include_paths.iter().any(|p| p == path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn params(include: Option<&str>) -> DirectiveParams {
        DirectiveParams {
            include: include.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn include_list_splits_and_dedupes() {
        let list = params(Some("test1, test2.test3,test1,")).include_list();
        assert_eq!(
            list,
            Some(vec!["test1".to_string(), "test2.test3".to_string()])
        );
    }

    #[test]
    fn blank_include_is_absent() {
        assert_eq!(params(Some(" , ")).include_list(), None);
        assert_eq!(params(None).include_list(), None);
    }

    #[test]
    fn page_parsing() {
        let p = DirectiveParams {
            page_limit: Some("50".to_string()),
            page_offset: Some("150".to_string()),
            ..Default::default()
        };
        assert_eq!(
            p.page().unwrap(),
            Some(PageParams {
                limit: Some(50),
                offset: Some(150),
            })
        );

        assert_eq!(DirectiveParams::default().page().unwrap(), None);
    }

    #[test]
    fn page_rejects_garbage() {
        let p = DirectiveParams {
            page_limit: Some("ten".to_string()),
            ..Default::default()
        };
        assert!(matches!(p.page(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn blank_filter_is_absent() {
        let p = DirectiveParams {
            filter: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(p.filter().is_none());
    }

    #[test]
    fn sort_key_order_clause() {
        assert_eq!(SortKey::asc("attr1").to_order_clause(), "attr1");
        assert_eq!(SortKey::desc("attr2").to_order_clause(), "attr2 DESC");
    }

    #[test]
    fn include_node_serializes_mixed_shape() {
        let tree = vec![
            IncludeNode::Leaf("author".to_string()),
            IncludeNode::Internal {
                name: "comments".to_string(),
                children: vec![IncludeNode::Leaf("author".to_string())],
            },
        ];
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            serde_json::json!(["author", {"comments": ["author"]}])
        );
    }

    #[test]
    fn directive_params_from_query_string() {
        let parsed: DirectiveParams =
            serde_json::from_value(serde_json::json!({
                "include": "author",
                "page[limit]": "10",
            }))
            .unwrap();
        assert_eq!(parsed.include.as_deref(), Some("author"));
        assert_eq!(parsed.page_limit.as_deref(), Some("10"));
        assert!(parsed.sort.is_none());
    }
}
