/// Predicate and sort builder for the task listing operations
///
/// Builds one parameterized SQL statement from an open bag of optional
/// filter fields plus a whitelisted sort key. Filter *values* are never
/// interpolated into the SQL text; every one is bound as a positional
/// parameter. The sort *field name* is the single deliberate exception:
/// standard SQL cannot parameterize `ORDER BY` targets, so the field is
/// chosen by equality from a closed whitelist and anything else silently
/// falls back to the default. That exception must stay bounded to the
/// whitelist.
///
/// # Example
///
/// ```
/// use taskdeck_shared::db::filter::TaskFilter;
///
/// let filter = TaskFilter {
///     status: Some("active".to_string()),
///     search: Some("milk".to_string()),
///     ..Default::default()
/// };
///
/// let (sql, params) = filter.build("42").unwrap();
/// assert!(sql.starts_with("SELECT * FROM tasks WHERE user_id = ?"));
/// assert_eq!(params.len(), 4); // owner, status, search x2
/// ```

use serde::Deserialize;

use crate::db::error::DbError;
use crate::db::gateway::SqlParam;

/// Columns eligible for `ORDER BY` without parameterization
///
/// Closed set, checked by equality. Never extend this with anything derived
/// from request input.
pub const SORT_FIELDS: [&str; 4] = ["created_at", "due_date", "title", "updated_at"];

const DEFAULT_SORT_FIELD: &str = "created_at";

/// Sentinel filter value meaning "do not filter on this field"
const ALL: &str = "all";

/// Optional filters for the task listing and export operations
///
/// Deserialized verbatim from HTTP query parameters; unknown parameters are
/// ignored. Empty strings and the `"all"` sentinel disable the
/// corresponding exact-match filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    /// Exact status match ("active" / "completed")
    pub status: Option<String>,

    /// Exact category match (open string set)
    pub category: Option<String>,

    /// Exact priority match ("low" / "medium" / "high")
    pub priority: Option<String>,

    /// Case-insensitive substring match against title or description
    pub search: Option<String>,

    /// Requested sort key; whitelisted, falls back to created_at
    pub sort: Option<String>,
}

impl TaskFilter {
    /// Builds the parameterized listing statement for one owner
    ///
    /// The owner identifier is supplied by the upstream authentication
    /// collaborator as an opaque string and must be integer-coercible; a
    /// non-numeric value is a fatal caller error.
    ///
    /// Clauses are appended in declaration order (status, category,
    /// priority) with the search predicate last; the order only matters
    /// for parameter-index bookkeeping since all clauses are ANDed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidOwner`] when the owner identifier does not
    /// parse as an integer.
    pub fn build(&self, owner: &str) -> Result<(String, Vec<SqlParam>), DbError> {
        let owner_id = parse_owner(owner)?;

        let mut sql = String::from("SELECT * FROM tasks WHERE user_id = ?");
        let mut params = vec![SqlParam::Int(owner_id)];

        for (column, value) in [
            ("status", &self.status),
            ("category", &self.category),
            ("priority", &self.priority),
        ] {
            if let Some(value) = present(value) {
                sql.push_str(" AND ");
                sql.push_str(column);
                sql.push_str(" = ?");
                params.push(SqlParam::Text(value.to_string()));
            }
        }

        if let Some(term) = self.search.as_deref().filter(|t| !t.trim().is_empty()) {
            sql.push_str(" AND (LOWER(title) LIKE ? OR LOWER(description) LIKE ?)");
            let pattern = format!("%{}%", term.to_lowercase());
            params.push(SqlParam::Text(pattern.clone()));
            params.push(SqlParam::Text(pattern));
        }

        sql.push_str(" ORDER BY ");
        sql.push_str(self.sort_field());
        sql.push_str(" DESC");

        Ok((sql, params))
    }

    /// Resolves the sort key against the whitelist
    pub fn sort_field(&self) -> &'static str {
        self.sort
            .as_deref()
            .and_then(|requested| SORT_FIELDS.iter().copied().find(|f| *f == requested))
            .unwrap_or(DEFAULT_SORT_FIELD)
    }
}

/// Parses an opaque owner identifier into the integer key it must be
///
/// The upstream authentication collaborator hands owner identity over
/// verbatim; this is the one place it is checked for integer coercibility.
pub fn parse_owner(owner: &str) -> Result<i64, DbError> {
    owner
        .trim()
        .parse::<i64>()
        .map_err(|_| DbError::InvalidOwner(owner.to_string()))
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(ALL))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_only_filter() {
        let filter = TaskFilter::default();
        let (sql, params) = filter.build("42").unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM tasks WHERE user_id = ? ORDER BY created_at DESC"
        );
        assert_eq!(params, vec![SqlParam::Int(42)]);
    }

    #[test]
    fn test_invalid_owner_is_fatal() {
        let filter = TaskFilter::default();
        let err = filter.build("4; DROP TABLE tasks").unwrap_err();
        assert!(matches!(err, DbError::InvalidOwner(_)));

        let err = filter.build("abc").unwrap_err();
        assert!(matches!(err, DbError::InvalidOwner(_)));
    }

    #[test]
    fn test_clauses_append_in_declaration_order() {
        let filter = TaskFilter {
            status: Some("active".to_string()),
            category: Some("Work".to_string()),
            priority: Some("high".to_string()),
            ..Default::default()
        };

        let (sql, params) = filter.build("1").unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM tasks WHERE user_id = ? AND status = ? AND category = ? \
             AND priority = ? ORDER BY created_at DESC"
        );
        assert_eq!(
            params,
            vec![
                SqlParam::Int(1),
                SqlParam::Text("active".to_string()),
                SqlParam::Text("Work".to_string()),
                SqlParam::Text("high".to_string()),
            ]
        );
    }

    #[test]
    fn test_all_sentinel_and_empty_are_ignored() {
        let filter = TaskFilter {
            status: Some("all".to_string()),
            category: Some("".to_string()),
            priority: Some("  ".to_string()),
            ..Default::default()
        };

        let (sql, params) = filter.build("1").unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM tasks WHERE user_id = ? ORDER BY created_at DESC"
        );
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_search_binds_pattern_to_both_columns() {
        let filter = TaskFilter {
            search: Some("Milk".to_string()),
            ..Default::default()
        };

        let (sql, params) = filter.build("1").unwrap();
        assert!(sql.contains("(LOWER(title) LIKE ? OR LOWER(description) LIKE ?)"));
        assert_eq!(
            &params[1..],
            &[
                SqlParam::Text("%milk%".to_string()),
                SqlParam::Text("%milk%".to_string()),
            ]
        );
    }

    #[test]
    fn test_sort_whitelist_accepts_known_fields() {
        for field in SORT_FIELDS {
            let filter = TaskFilter {
                sort: Some(field.to_string()),
                ..Default::default()
            };
            assert_eq!(filter.sort_field(), field);
        }
    }

    #[test]
    fn test_sort_injection_falls_back_to_default() {
        let filter = TaskFilter {
            sort: Some("id; DROP TABLE tasks".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.sort_field(), "created_at");

        let (sql, _) = filter.build("1").unwrap();
        assert!(sql.ends_with("ORDER BY created_at DESC"));
        assert!(!sql.contains("DROP"));
    }

    #[test]
    fn test_filter_values_are_never_interpolated() {
        let filter = TaskFilter {
            status: Some("active'; DROP TABLE tasks; --".to_string()),
            ..Default::default()
        };

        let (sql, params) = filter.build("1").unwrap();
        assert!(!sql.contains("DROP"));
        assert_eq!(
            params[1],
            SqlParam::Text("active'; DROP TABLE tasks; --".to_string())
        );
    }
}
