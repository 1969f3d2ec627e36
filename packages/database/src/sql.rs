//! Renders [`Condition`] lists into parameterized `WHERE` fragments.

use std::fmt::Write as _;

use switchy_database::DatabaseValue;
use works_portal_database_models::{ColumnValue, Condition};

use crate::convert::timestamp_value;

/// Accumulates SQL text and its positional parameters.
#[derive(Debug, Default)]
pub struct QueryBuilder {
    pub sql: String,
    pub params: Vec<DatabaseValue>,
}

impl QueryBuilder {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Pushes a parameter and returns its `$n` placeholder.
    pub fn bind(&mut self, value: DatabaseValue) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    /// Appends ` AND <condition>` for every condition.
    pub fn and_all(&mut self, conditions: &[Condition], date_column: &str) {
        for condition in conditions {
            self.sql.push_str(" AND ");
            self.render(condition, date_column);
        }
    }

    fn render(&mut self, condition: &Condition, date_column: &str) {
        match condition {
            Condition::Eq(column, value) => {
                let value = match value {
                    ColumnValue::Text(s) => DatabaseValue::String(s.clone()),
                    ColumnValue::Bool(b) => DatabaseValue::Bool(*b),
                };
                let p = self.bind(value);
                write!(self.sql, "{column} = {p}").unwrap();
            }
            Condition::In(column, values) => {
                if values.is_empty() {
                    self.sql.push_str("FALSE");
                    return;
                }
                let placeholders = values
                    .iter()
                    .map(|v| self.bind(DatabaseValue::String(v.clone())))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(self.sql, "{column} IN ({placeholders})").unwrap();
            }
            Condition::IsNull(column) => write!(self.sql, "{column} IS NULL").unwrap(),
            Condition::NotNull(column) => write!(self.sql, "{column} IS NOT NULL").unwrap(),
            Condition::Since(at) => {
                let p = self.bind(timestamp_value(*at));
                write!(self.sql, "{date_column} >= {p}").unwrap();
            }
            Condition::Until(at) => {
                let p = self.bind(timestamp_value(*at));
                write!(self.sql, "{date_column} <= {p}").unwrap();
            }
            Condition::Within(bbox) => {
                let south = self.bind(DatabaseValue::Real64(bbox.south));
                let north = self.bind(DatabaseValue::Real64(bbox.north));
                let west = self.bind(DatabaseValue::Real64(bbox.west));
                let east = self.bind(DatabaseValue::Real64(bbox.east));
                write!(
                    self.sql,
                    "latitude BETWEEN {south} AND {north} AND longitude BETWEEN {west} AND {east}"
                )
                .unwrap();
            }
            Condition::Any(nested) => {
                if nested.is_empty() {
                    self.sql.push_str("FALSE");
                    return;
                }
                self.sql.push('(');
                for (i, c) in nested.iter().enumerate() {
                    if i > 0 {
                        self.sql.push_str(" OR ");
                    }
                    self.render(c, date_column);
                }
                self.sql.push(')');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_placeholders_in_order() {
        let mut q = QueryBuilder::new("SELECT * FROM road_reports WHERE 1=1");
        q.and_all(
            &[
                Condition::Eq("district", ColumnValue::Text("Cibinong".into())),
                Condition::Any(vec![
                    Condition::Eq("urgency_level", ColumnValue::Text("DARURAT".into())),
                    Condition::Eq("traffic_condition", ColumnValue::Text("TERPUTUS".into())),
                ]),
                Condition::In("status", vec!["PENDING".into(), "VERIFIED".into()]),
                Condition::NotNull("bridge_name"),
            ],
            "reported_at",
        );

        assert_eq!(
            q.sql,
            "SELECT * FROM road_reports WHERE 1=1 AND district = $1 \
             AND (urgency_level = $2 OR traffic_condition = $3) \
             AND status IN ($4, $5) AND bridge_name IS NOT NULL"
        );
        assert_eq!(q.params.len(), 5);
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let mut q = QueryBuilder::new("WHERE 1=1");
        q.and_all(&[Condition::In("status", vec![])], "reported_at");
        assert_eq!(q.sql, "WHERE 1=1 AND FALSE");
        assert!(q.params.is_empty());
    }
}
