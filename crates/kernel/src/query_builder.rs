//! SQL collection handle using SeaQuery.
//!
//! Generates PostgreSQL SELECT statements from applied directives:
//! - include trees become LEFT JOINs by belongs-to convention, each joined
//!   row projected as a JSON column
//! - sort keys become ORDER BY clauses in precedence order
//! - limit/offset become LIMIT/OFFSET

use sea_query::{
    Alias, Asterisk, Expr, Func, JoinType, Order, PostgresQueryBuilder, Query, SelectStatement,
};

use crate::collection::CollectionHandle;
use crate::directive::{IncludeNode, SortKey};

/// Separator used to build aliases for nested relationships.
const ALIAS_SEPARATOR: &str = "__";

/// Collection handle that accumulates a SELECT statement.
#[derive(Debug, Clone)]
pub struct SqlCollection {
    base_table: String,
    query: SelectStatement,
    joined: Vec<String>,
}

impl SqlCollection {
    /// Start a `SELECT "<table>".* FROM "<table>"` statement.
    pub fn new(base_table: impl Into<String>) -> Self {
        let base_table = base_table.into();
        let mut query = Query::select();
        query
            .column((Alias::new(&base_table), Asterisk))
            .from(Alias::new(&base_table));

        Self {
            base_table,
            query,
            joined: Vec::new(),
        }
    }

    /// Aliases joined so far, in join order.
    pub fn joined_aliases(&self) -> &[String] {
        &self.joined
    }

    /// Render the statement for PostgreSQL.
    pub fn to_sql(&self) -> String {
        self.query.to_string(PostgresQueryBuilder)
    }

    /// Join every node of `tree` under `parent`, the alias of an already
    /// joined relationship or `None` for the base table.
    ///
    /// A relationship `rel` joins table `rel` on `<parent>.rel_id = <alias>.id`.
    /// Nested aliases are prefixed with the parent alias; a top-level
    /// relationship named after the base table is prefixed with the base
    /// table name so it cannot shadow the FROM clause.
    fn join_tree(&mut self, parent: Option<&str>, tree: &[IncludeNode]) {
        for node in tree {
            let relationship = node.name();
            let source = parent.map_or_else(|| self.base_table.clone(), str::to_string);
            let alias = match parent {
                Some(parent) => format!("{parent}{ALIAS_SEPARATOR}{relationship}"),
                None if relationship == self.base_table => {
                    format!("{}{ALIAS_SEPARATOR}{relationship}", self.base_table)
                }
                None => relationship.to_string(),
            };

            if !self.joined.contains(&alias) {
                let on_condition = Expr::col((
                    Alias::new(&source),
                    Alias::new(format!("{relationship}_id")),
                ))
                .equals((Alias::new(&alias), Alias::new("id")));

                self.query.join_as(
                    JoinType::LeftJoin,
                    Alias::new(relationship),
                    Alias::new(&alias),
                    on_condition,
                );
                self.query.expr_as(
                    Func::cust(Alias::new("row_to_json")).arg(Expr::col(Alias::new(&alias))),
                    Alias::new(&alias),
                );
                self.joined.push(alias.clone());
            }

            self.join_tree(Some(&alias), node.children());
        }
    }
}

impl CollectionHandle for SqlCollection {
    fn expand(mut self, tree: &[IncludeNode]) -> Self {
        self.join_tree(None, tree);
        self
    }

    fn order_by(mut self, keys: &[SortKey]) -> Self {
        for key in keys {
            let order = if key.is_descending() {
                Order::Desc
            } else {
                Order::Asc
            };
            self.query.order_by(
                (Alias::new(&self.base_table), Alias::new(&key.field)),
                order,
            );
        }
        self
    }

    fn limit(mut self, limit: u64) -> Self {
        self.query.limit(limit);
        self
    }

    fn offset(mut self, offset: u64) -> Self {
        self.query.offset(offset);
        self
    }
}
