//! Translation of [`Query`] values into SQLite statements. Identifiers are
//! checked and quoted before they reach the SQL text; every value is bound as
//! a parameter.

use rusqlite::types::Value as SqlValue;
use serde_json::Value;

use super::query::{Aggregate, Embed, Filter, Query, Row, Selection};
use super::store::StoreError;

/// Alias prefix for the hidden column that tells whether an embedded row was
/// found by the left join.
pub(crate) const EMBED_KEY_PREFIX: &str = "__embed__";

/// SQL function applying [`fold_case`]. Registered on every store connection.
pub(crate) const CASEFOLD_FN: &str = "casefold";

/// SQL function applying [`search_words`]. Registered on every store
/// connection.
pub(crate) const SEARCH_WORDS_FN: &str = "search_words";

#[derive(Debug)]
pub(crate) struct Statement {
    pub(crate) sql: String,
    pub(crate) params: Vec<SqlValue>,
}

pub(crate) fn select(query: &Query) -> Result<Statement, StoreError> {
    let mut compiler = Compiler::new(query);
    let mut columns = Vec::new();

    let plain_columns = query
        .selections
        .iter()
        .any(|selection| matches!(selection, Selection::Column(_)));
    if !plain_columns && query.group_by.is_empty() {
        columns.push(format!("{}.*", ident(&query.table)?));
    }

    for selection in &query.selections {
        match selection {
            Selection::Column(column) => {
                let reference = compiler.column(column)?;
                if column.contains('.') {
                    columns.push(format!("{reference} AS {}", quote(column)));
                } else {
                    columns.push(reference);
                }
            }
            Selection::Aggregate { aggregate, alias } => {
                let expression = compiler.aggregate(aggregate)?;
                columns.push(format!("{expression} AS {}", ident(alias)?));
            }
        }
    }

    for embed in query.embeds.iter().filter(|embed| !embed.columns.is_empty()) {
        let table = ident(&embed.table)?;
        columns.push(format!(
            "{table}.{} AS {}",
            ident(&embed.foreign_column)?,
            quote(&format!("{EMBED_KEY_PREFIX}{}", embed.table))
        ));
        for column in &embed.columns {
            columns.push(format!(
                "{table}.{} AS {}",
                ident(column)?,
                quote(&format!("{}.{column}", embed.table))
            ));
        }
    }

    if columns.is_empty() {
        return Err(StoreError::Unsupported("a select without columns"));
    }

    let mut sql = format!("SELECT {}", columns.join(", "));
    sql.push_str(&compiler.from_clause()?);
    sql.push_str(&compiler.where_clause()?);

    if !query.group_by.is_empty() {
        let groups = query
            .group_by
            .iter()
            .map(|column| compiler.column(column))
            .collect::<Result<Vec<_>, _>>()?;
        sql.push_str(&format!(" GROUP BY {}", groups.join(", ")));
    }

    if !query.order.is_empty() {
        let orders = query
            .order
            .iter()
            .map(|order| {
                let direction = if order.ascending { "ASC" } else { "DESC" };
                Ok(format!("{} {direction}", compiler.column(&order.column)?))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        sql.push_str(&format!(" ORDER BY {}", orders.join(", ")));
    }

    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    Ok(compiler.finish(sql))
}

pub(crate) fn count(query: &Query) -> Result<Statement, StoreError> {
    let mut compiler = Compiler::new(query);
    let mut sql = String::from("SELECT COUNT(*)");
    sql.push_str(&compiler.from_clause()?);
    sql.push_str(&compiler.where_clause()?);
    Ok(compiler.finish(sql))
}

pub(crate) fn insert(table: &str, values: &Row) -> Result<Statement, StoreError> {
    let table = ident(table)?;
    if values.is_empty() {
        return Ok(Statement {
            sql: format!("INSERT INTO {table} DEFAULT VALUES"),
            params: Vec::new(),
        });
    }

    let columns = values
        .keys()
        .map(|column| ident(column))
        .collect::<Result<Vec<_>, _>>()?;
    let placeholders = vec!["?"; columns.len()].join(", ");
    Ok(Statement {
        sql: format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders})",
            columns.join(", ")
        ),
        params: values.values().map(sql_value).collect(),
    })
}

pub(crate) fn update(query: &Query, values: &Row) -> Result<Statement, StoreError> {
    if !query.embeds.is_empty() {
        return Err(StoreError::Unsupported("embedded tables in an update"));
    }
    if values.is_empty() {
        return Err(StoreError::Unsupported("an update without values"));
    }

    let mut compiler = Compiler::new(query);
    let assignments = values
        .iter()
        .map(|(column, value)| {
            compiler.params.push(sql_value(value));
            Ok(format!("{} = ?", ident(column)?))
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    let mut sql = format!(
        "UPDATE {} SET {}",
        ident(&query.table)?,
        assignments.join(", ")
    );
    sql.push_str(&compiler.where_clause()?);
    Ok(compiler.finish(sql))
}

pub(crate) fn delete(query: &Query) -> Result<Statement, StoreError> {
    if !query.embeds.is_empty() {
        return Err(StoreError::Unsupported("embedded tables in a delete"));
    }

    let mut compiler = Compiler::new(query);
    let mut sql = format!("DELETE FROM {}", ident(&query.table)?);
    sql.push_str(&compiler.where_clause()?);
    Ok(compiler.finish(sql))
}

/// Bound values accumulate in the order their placeholders are emitted, so
/// clauses must be compiled in statement order.
struct Compiler<'q> {
    query: &'q Query,
    params: Vec<SqlValue>,
}

impl<'q> Compiler<'q> {
    fn new(query: &'q Query) -> Self {
        Self {
            query,
            params: Vec::new(),
        }
    }

    fn finish(self, sql: String) -> Statement {
        Statement {
            sql,
            params: self.params,
        }
    }

    fn embed(&self, table: &str) -> Option<&'q Embed> {
        self.query.embedded(table)
    }

    /// Resolve `column` or `embedded_table.column` to a quoted reference.
    fn column(&self, column: &str) -> Result<String, StoreError> {
        match column.split_once('.') {
            Some((table, name)) => {
                if self.embed(table).is_none() {
                    return Err(StoreError::UnknownEmbed(table.to_string()));
                }
                Ok(format!("{}.{}", ident(table)?, ident(name)?))
            }
            None => Ok(format!("{}.{}", ident(&self.query.table)?, ident(column)?)),
        }
    }

    fn aggregate(&mut self, aggregate: &Aggregate) -> Result<String, StoreError> {
        match aggregate {
            Aggregate::Count { column } => Ok(format!("COUNT({})", self.column(column)?)),
            Aggregate::SumWhere {
                column,
                when_column,
                equals,
            } => {
                let when = self.column(when_column)?;
                let summed = self.column(column)?;
                self.params.push(sql_value(equals));
                Ok(format!(
                    "COALESCE(SUM(CASE WHEN {when} = ? THEN {summed} ELSE 0 END), 0)"
                ))
            }
        }
    }

    fn from_clause(&self) -> Result<String, StoreError> {
        let base = ident(&self.query.table)?;
        let mut sql = format!(" FROM {base}");
        for embed in &self.query.embeds {
            let table = ident(&embed.table)?;
            sql.push_str(&format!(
                " LEFT JOIN {table} ON {table}.{} = {base}.{}",
                ident(&embed.foreign_column)?,
                ident(&embed.local_column)?
            ));
        }
        Ok(sql)
    }

    fn where_clause(&mut self) -> Result<String, StoreError> {
        let query = self.query;
        if query.filters.is_empty() {
            return Ok(String::new());
        }
        let clauses = query
            .filters
            .iter()
            .map(|filter| self.filter(filter))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!(" WHERE {}", clauses.join(" AND ")))
    }

    fn filter(&mut self, filter: &Filter) -> Result<String, StoreError> {
        match filter {
            Filter::Eq { column, value } => {
                let reference = self.column(column)?;
                self.params.push(sql_value(value));
                Ok(format!("{reference} = ?"))
            }
            Filter::ILike { column, pattern } => {
                // Both sides are folded; SQLite's own LIKE only ignores ASCII case.
                let reference = self.column(column)?;
                self.params.push(SqlValue::Text(pattern.clone()));
                Ok(format!(
                    "{CASEFOLD_FN}({reference}) LIKE {CASEFOLD_FN}(?) ESCAPE '\\'"
                ))
            }
            Filter::TextSearch { column, query } => {
                let reference = self.column(column)?;
                let terms = search_terms(query);
                if terms.is_empty() {
                    return Ok("1 = 1".to_string());
                }
                let clauses = terms
                    .into_iter()
                    .map(|term| {
                        self.params.push(SqlValue::Text(format!("% {term}%")));
                        format!("{SEARCH_WORDS_FN}({reference}) LIKE ?")
                    })
                    .collect::<Vec<_>>();
                Ok(format!("({})", clauses.join(" AND ")))
            }
            Filter::NotNull { column } => match self.embed(column) {
                Some(embed) => Ok(format!(
                    "{}.{} IS NOT NULL",
                    ident(&embed.table)?,
                    ident(&embed.foreign_column)?
                )),
                None => Ok(format!("{} IS NOT NULL", self.column(column)?)),
            },
            Filter::Or(filters) => {
                if filters.is_empty() {
                    return Ok("1 = 0".to_string());
                }
                let clauses = filters
                    .iter()
                    .map(|filter| self.filter(filter))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("({})", clauses.join(" OR ")))
            }
        }
    }
}

fn ident(name: &str) -> Result<String, StoreError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(first) if first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(quote(name))
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

/// Quote an alias. Only used on strings assembled from checked identifiers.
fn quote(alias: &str) -> String {
    format!("\"{alias}\"")
}

/// Unicode lowercase, the folding used for every case-insensitive match.
pub(crate) fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Folded words of `text`, each preceded by one space, so `% term%` matches a
/// word prefix. Any character that is not a letter or digit separates words,
/// which splits hyphenated and punctuated names.
pub(crate) fn search_words(text: &str) -> String {
    let mut words = String::with_capacity(text.len() + 1);
    for word in split_words(text) {
        words.push(' ');
        words.push_str(&fold_case(word));
    }
    words
}

/// Folded terms of a search query. Terms only hold letters and digits, so
/// they never carry LIKE wildcards.
fn search_terms(query: &str) -> Vec<String> {
    split_words(query).map(fold_case).collect()
}

fn split_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
}

fn sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => SqlValue::Integer(integer),
            None => SqlValue::Real(number.as_f64().unwrap_or_default()),
        },
        Value::String(text) => SqlValue::Text(text.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn select_embeds_with_hidden_key_and_bound_pattern() {
        let query = Query::from("invoices")
            .select(&["id", "amount"])
            .embed("customers", "customer_id", "id", &["name"])
            .ilike("customers.name", "%de%")
            .not_null("customers")
            .order("date", false)
            .limit(5);

        let statement = select(&query).unwrap();
        assert_eq!(
            statement.sql,
            "SELECT \"invoices\".\"id\", \"invoices\".\"amount\", \
             \"customers\".\"id\" AS \"__embed__customers\", \
             \"customers\".\"name\" AS \"customers.name\" \
             FROM \"invoices\" LEFT JOIN \"customers\" ON \"customers\".\"id\" = \"invoices\".\"customer_id\" \
             WHERE casefold(\"customers\".\"name\") LIKE casefold(?) ESCAPE '\\' AND \"customers\".\"id\" IS NOT NULL \
             ORDER BY \"invoices\".\"date\" DESC LIMIT 5"
        );
        assert_eq!(statement.params, vec![SqlValue::Text("%de%".into())]);
    }

    #[test]
    fn aggregate_params_precede_filter_params() {
        let query = Query::from("customers")
            .select(&["id"])
            .embed("invoices", "id", "customer_id", &[])
            .sum_where("invoices.amount", "invoices.status", "paid", "total_paid")
            .eq("id", "c1")
            .group_by(&["id"]);

        let statement = select(&query).unwrap();
        assert_eq!(
            statement.params,
            vec![SqlValue::Text("paid".into()), SqlValue::Text("c1".into())]
        );
        assert!(statement.sql.contains("GROUP BY \"customers\".\"id\""));
        assert!(!statement.sql.contains("__embed__"));
    }

    #[test]
    fn text_search_binds_one_folded_prefix_per_term() {
        let query = Query::from("customers").text_search("name", "  ÉMILE  50%_off ");
        let statement = count(&query).unwrap();
        assert_eq!(
            statement.params,
            vec![
                SqlValue::Text("% émile%".into()),
                SqlValue::Text("% 50%".into()),
                SqlValue::Text("% off%".into())
            ]
        );
        assert!(statement
            .sql
            .contains("search_words(\"customers\".\"name\") LIKE ?"));

        let everything = count(&Query::from("customers").text_search("name", "   ")).unwrap();
        assert!(everything.sql.ends_with("WHERE 1 = 1"));
        assert!(everything.params.is_empty());
    }

    #[test]
    fn search_words_split_on_punctuation_and_fold_case() {
        assert_eq!(search_words("Mary-Ann  O'Neil"), " mary ann o neil");
        assert_eq!(search_words("Émile Zoë"), " émile zoë");
        assert_eq!(search_words("--"), "");
    }

    #[test]
    fn rejects_unsafe_identifiers_and_unknown_embeds() {
        let injected = Query::from("invoices").eq("id; DROP TABLE invoices", 1);
        assert!(matches!(
            select(&injected),
            Err(StoreError::InvalidIdentifier(_))
        ));

        let unknown = Query::from("invoices").ilike("customers.name", "%a%");
        assert!(matches!(select(&unknown), Err(StoreError::UnknownEmbed(_))));
    }

    #[test]
    fn writes_bind_values_in_column_order() {
        let mut values = Row::new();
        values.insert("amount".into(), json!(1250));
        values.insert("status".into(), json!("paid"));

        let statement = insert("invoices", &values).unwrap();
        assert_eq!(
            statement.sql,
            "INSERT INTO \"invoices\" (\"amount\", \"status\") VALUES (?, ?)"
        );

        let query = Query::from("invoices").eq("id", "i1");
        let statement = update(&query, &values).unwrap();
        assert_eq!(
            statement.params,
            vec![
                SqlValue::Integer(1250),
                SqlValue::Text("paid".into()),
                SqlValue::Text("i1".into())
            ]
        );

        let statement = delete(&query).unwrap();
        assert_eq!(
            statement.sql,
            "DELETE FROM \"invoices\" WHERE \"invoices\".\"id\" = ?"
        );
    }
}
