//! `sort` directive parsing.

use super::types::SortKey;

/// Parse a comma-separated sort string into ordered sort keys.
///
/// A leading `-` marks a descending key. Field names are not validated here;
/// unknown columns surface when the data-access layer executes.
pub fn parse_sort(raw: Option<&str>) -> Vec<SortKey> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    raw.split(',')
        .map(str::trim)
        .filter_map(|token| match token.strip_prefix('-') {
            Some(field) => Some(field.trim()).filter(|f| !f.is_empty()).map(SortKey::desc),
            None => Some(token).filter(|t| !t.is_empty()).map(SortKey::asc),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::directive::types::SortDirection;

    #[test]
    fn mixed_directions_keep_order() {
        let keys = parse_sort(Some("f1,-f2,f3"));
        assert_eq!(
            keys,
            vec![SortKey::asc("f1"), SortKey::desc("f2"), SortKey::asc("f3")]
        );
    }

    #[test]
    fn absent_or_empty_yields_nothing() {
        assert!(parse_sort(None).is_empty());
        assert!(parse_sort(Some("")).is_empty());
        assert!(parse_sort(Some(" , ")).is_empty());
        assert_eq!(parse_sort(Some("-,title")), vec![SortKey::asc("title")]);
    }

    #[test]
    fn whitespace_around_tokens_is_ignored() {
        let keys = parse_sort(Some(" title , -created "));
        assert_eq!(keys[0].field, "title");
        assert_eq!(keys[1].field, "created");
        assert_eq!(keys[1].direction, SortDirection::Desc);
    }

    #[test]
    fn renders_order_strings() {
        let clauses: Vec<String> = parse_sort(Some("attr1,-attr2"))
            .iter()
            .map(SortKey::to_order_clause)
            .collect();
        assert_eq!(clauses, vec!["attr1", "attr2 DESC"]);
    }
}
