//! Declarative description of a single store request.
//!
//! A [`Query`] names a table, the columns to return, related tables to embed,
//! filters, grouping, ordering and a limit. Stores translate it into whatever
//! their backend speaks; the query layer never writes SQL text itself.

use serde_json::Value;

/// One record as returned by (or written to) a store. Embedded relations show
/// up as nested objects keyed by the related table name.
pub type Row = serde_json::Map<String, Value>;

/// Row predicate. Column names may be qualified with an embedded table
/// (`customers.name`).
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`.
    Eq { column: String, value: Value },
    /// Case-insensitive pattern match using `%` and `_` wildcards.
    ILike { column: String, pattern: String },
    /// Every term of `query` must start a word of the column, ignoring case.
    /// Words and terms are split on anything that is not a letter or digit.
    /// An empty query matches everything.
    TextSearch { column: String, query: String },
    /// The column, or the embedded table of that name, is present.
    NotNull { column: String },
    /// At least one of the nested filters holds.
    Or(Vec<Filter>),
}

impl Filter {
    /// `column = value`.
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Filter::Eq {
            column: column.to_string(),
            value: value.into(),
        }
    }

    /// Case-insensitive match of `column` against a `%`/`_` pattern.
    pub fn ilike(column: &str, pattern: impl Into<String>) -> Self {
        Filter::ILike {
            column: column.to_string(),
            pattern: pattern.into(),
        }
    }

    /// Word-prefix search of `column` for every term of `query`.
    pub fn text_search(column: &str, query: impl Into<String>) -> Self {
        Filter::TextSearch {
            column: column.to_string(),
            query: query.into(),
        }
    }

    /// Require `column`, or the embed of that name, to be present.
    pub fn not_null(column: &str) -> Self {
        Filter::NotNull {
            column: column.to_string(),
        }
    }
}

/// Aggregate expressions that can be selected alongside plain columns when a
/// query is grouped.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregate {
    /// Number of non-null values in `column`.
    Count { column: String },
    /// Sum of `column` over the rows where `when_column = equals`, zero when
    /// no row qualifies.
    SumWhere {
        column: String,
        when_column: String,
        equals: Value,
    },
}

/// An entry of the select list.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// A base column, or `table.column` of an embed.
    Column(String),
    Aggregate { aggregate: Aggregate, alias: String },
}

/// A related table joined onto the base table through
/// `base.local_column = table.foreign_column`.
///
/// When `columns` is empty the join only feeds filters and aggregates and no
/// nested object is returned.
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub table: String,
    pub local_column: String,
    pub foreign_column: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub selections: Vec<Selection>,
    pub embeds: Vec<Embed>,
    pub filters: Vec<Filter>,
    pub group_by: Vec<String>,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl Query {
    /// Start a query against `table`. Without any selection every column of
    /// the base table is returned.
    pub fn from(table: &str) -> Self {
        Self {
            table: table.to_string(),
            selections: Vec::new(),
            embeds: Vec::new(),
            filters: Vec::new(),
            group_by: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Add plain columns to the select list, qualified names included.
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.selections
            .extend(columns.iter().map(|column| Selection::Column(column.to_string())));
        self
    }

    /// Left-join `table` on `local_column = table.foreign_column` and nest
    /// `columns` under the table name.
    pub fn embed(
        mut self,
        table: &str,
        local_column: &str,
        foreign_column: &str,
        columns: &[&str],
    ) -> Self {
        self.embeds.push(Embed {
            table: table.to_string(),
            local_column: local_column.to_string(),
            foreign_column: foreign_column.to_string(),
            columns: columns.iter().map(|column| column.to_string()).collect(),
        });
        self
    }

    /// Select the number of non-null `column` values per group as `alias`.
    pub fn count_as(mut self, column: &str, alias: &str) -> Self {
        self.selections.push(Selection::Aggregate {
            aggregate: Aggregate::Count {
                column: column.to_string(),
            },
            alias: alias.to_string(),
        });
        self
    }

    /// Select the sum of `column` over rows where `when_column = equals` as
    /// `alias`.
    pub fn sum_where(
        mut self,
        column: &str,
        when_column: &str,
        equals: impl Into<Value>,
        alias: &str,
    ) -> Self {
        self.selections.push(Selection::Aggregate {
            aggregate: Aggregate::SumWhere {
                column: column.to_string(),
                when_column: when_column.to_string(),
                equals: equals.into(),
            },
            alias: alias.to_string(),
        });
        self
    }

    /// Add a filter; all filters of a query must hold.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Shorthand for [`Filter::eq`].
    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    /// Shorthand for [`Filter::ilike`].
    pub fn ilike(self, column: &str, pattern: impl Into<String>) -> Self {
        self.filter(Filter::ilike(column, pattern))
    }

    /// Shorthand for [`Filter::text_search`].
    pub fn text_search(self, column: &str, query: impl Into<String>) -> Self {
        self.filter(Filter::text_search(column, query))
    }

    /// Shorthand for [`Filter::not_null`].
    pub fn not_null(self, column: &str) -> Self {
        self.filter(Filter::not_null(column))
    }

    /// Require at least one of `filters` to hold.
    pub fn or(self, filters: Vec<Filter>) -> Self {
        self.filter(Filter::Or(filters))
    }

    /// Group by `columns`; needed whenever aggregates are selected.
    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.group_by
            .extend(columns.iter().map(|column| column.to_string()));
        self
    }

    /// Sort by `column`. Later calls break ties of earlier ones.
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    /// Return at most `limit` rows.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Look up an embed by table name.
    pub fn embedded(&self, table: &str) -> Option<&Embed> {
        self.embeds.iter().find(|embed| embed.table == table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_clauses_in_call_order() {
        let query = Query::from("invoices")
            .select(&["id", "amount"])
            .embed("customers", "customer_id", "id", &["name"])
            .ilike("customers.name", "%lee%")
            .not_null("customers")
            .order("date", false)
            .limit(5);

        assert_eq!(query.table, "invoices");
        assert_eq!(
            query.selections,
            vec![
                Selection::Column("id".into()),
                Selection::Column("amount".into())
            ]
        );
        assert_eq!(query.filters.len(), 2);
        assert_eq!(query.filters[1], Filter::not_null("customers"));
        assert_eq!(query.order[0].column, "date");
        assert!(!query.order[0].ascending);
        assert_eq!(query.limit, Some(5));
        assert_eq!(
            query.embedded("customers").map(|e| e.local_column.as_str()),
            Some("customer_id")
        );
        assert!(query.embedded("revenue").is_none());
    }
}
