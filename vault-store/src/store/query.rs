//! Structured List query builder
//!
//! A `ListQuery` becomes a list of typed predicate clauses. Each clause
//! renders a fixed SQL fragment with `?` placeholders and pushes its
//! values onto the parameter list; no caller-supplied text is ever
//! spliced into the SQL string. Table names come from the kind, never
//! from input.

use rusqlite::types::Value;

use crate::db::TableSet;
use crate::models::{FieldValue, ListQuery, SortOrder};
use crate::store::codec::RECORD_COLUMNS;
use crate::time::format_timestamp;

/// One conjunct of the WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Clause {
    UserIs(String),
    ProfileIs(String),
    CreatedFrom(String),
    CreatedTo(String),
    /// One EXISTS subquery per tag; several of these AND together
    HasTag(String),
    PayloadEq { path: String, value: FieldValue },
}

impl Clause {
    fn render(&self, tables: &TableSet, params: &mut Vec<Value>) -> String {
        match self {
            Self::UserIs(user_id) => {
                params.push(Value::Text(user_id.clone()));
                "r.user_id = ?".to_owned()
            }
            Self::ProfileIs(profile_id) => {
                params.push(Value::Text(profile_id.clone()));
                "r.profile_id = ?".to_owned()
            }
            Self::CreatedFrom(ts) => {
                params.push(Value::Text(ts.clone()));
                "r.create_timestamp >= ?".to_owned()
            }
            Self::CreatedTo(ts) => {
                params.push(Value::Text(ts.clone()));
                "r.create_timestamp <= ?".to_owned()
            }
            Self::HasTag(tag) => {
                params.push(Value::Text(tag.clone()));
                format!(
                    "EXISTS (SELECT 1 FROM {} t WHERE t.resource_id = r.id AND t.tag = ?)",
                    tables.tags
                )
            }
            Self::PayloadEq { path, value } => {
                params.push(Value::Text(path.clone()));
                // json_extract yields 0/1 for JSON booleans
                params.push(match value {
                    FieldValue::Text(s) => Value::Text(s.clone()),
                    FieldValue::Integer(i) => Value::Integer(*i),
                    FieldValue::Bool(b) => Value::Integer(i64::from(*b)),
                });
                "json_extract(r.payload, ?) = ?".to_owned()
            }
        }
    }
}

/// Rendered statement and its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone)]
pub(crate) struct QueryBuilder {
    tables: TableSet,
    clauses: Vec<Clause>,
    sort_order: SortOrder,
    limit: u32,
    offset: u32,
}

impl QueryBuilder {
    /// Translate an already validated query.
    pub(crate) fn new(tables: TableSet, query: &ListQuery) -> Self {
        let mut clauses = vec![Clause::UserIs(query.user_id.clone())];
        if let Some(profile_id) = &query.profile_id {
            clauses.push(Clause::ProfileIs(profile_id.clone()));
        }
        if let Some(from) = query.from_timestamp {
            clauses.push(Clause::CreatedFrom(format_timestamp(from)));
        }
        if let Some(to) = query.to_timestamp {
            clauses.push(Clause::CreatedTo(format_timestamp(to)));
        }
        let mut seen = Vec::new();
        for tag in &query.tags {
            if !seen.contains(&tag) {
                seen.push(tag);
                clauses.push(Clause::HasTag(tag.clone()));
            }
        }
        for filter in &query.payload_filters {
            clauses.push(Clause::PayloadEq {
                path: format!("$.{}", filter.field),
                value: filter.value.clone(),
            });
        }

        Self {
            tables,
            clauses,
            sort_order: query.sort_order,
            limit: query.limit,
            offset: query.offset,
        }
    }

    pub(crate) fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    fn where_sql(&self, params: &mut Vec<Value>) -> String {
        self.clauses
            .iter()
            .map(|c| c.render(&self.tables, params))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Page of matching rows. Ties on `create_timestamp` break on `id`
    /// ascending so offsets walk a stable order.
    pub(crate) fn select(&self) -> Statement {
        let mut params = Vec::new();
        let predicate = self.where_sql(&mut params);
        let sql = format!(
            "SELECT {} FROM {} r WHERE {} ORDER BY r.create_timestamp {}, r.id ASC LIMIT ? OFFSET ?",
            RECORD_COLUMNS,
            self.tables.records,
            predicate,
            self.sort_order.as_sql()
        );
        params.push(Value::Integer(i64::from(self.limit)));
        params.push(Value::Integer(i64::from(self.offset)));
        Statement { sql, params }
    }

    /// Total matches, ignoring pagination.
    pub(crate) fn count(&self) -> Statement {
        let mut params = Vec::new();
        let predicate = self.where_sql(&mut params);
        let sql = format!(
            "SELECT COUNT(*) FROM {} r WHERE {}",
            self.tables.records, predicate
        );
        Statement { sql, params }
    }
}
