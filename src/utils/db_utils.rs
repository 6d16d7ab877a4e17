use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::MySqlPool;

use crate::error::ApiError;

/// SQL bindable value enum
#[derive(Debug)]
pub enum SqlValue {
    String(String),
    I64(i64),
    Decimal(Decimal),
    Bool(bool),
    Null,
}

/// SQL update container
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Build a dynamic UPDATE from a partial JSON payload.
///
/// Only whitelisted columns may appear in the payload; unknown keys reject
/// the whole request. Monetary columns are bound as exact decimals, whether
/// the client sent a JSON number or a decimal-formatted string.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed_columns: &[&str],
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, ApiError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ApiError::Validation("Payload must be a JSON object".into()))?;

    if obj.is_empty() {
        return Err(ApiError::Validation("No fields provided for update".into()));
    }

    for key in obj.keys() {
        if !allowed_columns.contains(&key.as_str()) {
            return Err(ApiError::Validation(format!("Unknown column {key:?}")));
        }
    }

    let set_clause = obj
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values = Vec::with_capacity(obj.len() + 1);

    for (key, value) in obj {
        values.push(to_sql_value(key, value)?);
    }

    // WHERE id = ?
    values.push(SqlValue::I64(id_value as i64));

    Ok(SqlUpdate { sql, values })
}

fn to_sql_value(column: &str, value: &Value) -> Result<SqlValue, ApiError> {
    if column == "salary" {
        let decimal = match value {
            Value::String(s) => s.trim().parse::<Decimal>().ok(),
            Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
            _ => None,
        }
        .ok_or_else(|| ApiError::Validation(format!("salary must be a decimal, got {value}")))?;
        return Ok(SqlValue::Decimal(decimal));
    }

    match value {
        Value::String(s) => Ok(SqlValue::String(s.clone())),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::I64)
            .ok_or_else(|| ApiError::Validation(format!("{column} must be an integer"))),
        Value::Bool(b) => Ok(SqlValue::Bool(*b)),
        Value::Null => Ok(SqlValue::Null),
        _ => Err(ApiError::Validation(format!(
            "Unsupported JSON value for column {column:?}"
        ))),
    }
}

/// Execute the update
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::Decimal(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    const COLUMNS: &[&str] = &["name", "salary", "status"];

    #[test]
    fn builds_set_clause_from_payload_keys() {
        let update =
            build_update_sql("staff", &json!({"name": "A", "status": "Active"}), COLUMNS, "id", 7)
                .unwrap();

        assert_eq!(update.sql, "UPDATE staff SET name = ?, status = ? WHERE id = ?");
        assert_eq!(update.values.len(), 3);
    }

    #[test]
    fn salary_binds_as_decimal_from_string_or_number() {
        let update = build_update_sql("staff", &json!({"salary": "1200.50"}), COLUMNS, "id", 1)
            .unwrap();
        assert!(matches!(update.values[0], SqlValue::Decimal(d) if d == dec!(1200.50)));

        let update =
            build_update_sql("staff", &json!({"salary": 900}), COLUMNS, "id", 1).unwrap();
        assert!(matches!(update.values[0], SqlValue::Decimal(d) if d == dec!(900)));
    }

    #[test]
    fn unknown_columns_are_rejected() {
        let err = build_update_sql("staff", &json!({"photo": "x"}), COLUMNS, "id", 1);
        assert!(err.is_err());
    }

    #[test]
    fn empty_payload_is_rejected() {
        assert!(build_update_sql("staff", &json!({}), COLUMNS, "id", 1).is_err());
        assert!(build_update_sql("staff", &json!([1, 2]), COLUMNS, "id", 1).is_err());
    }

    #[test]
    fn garbage_salary_is_a_validation_error() {
        assert!(build_update_sql("staff", &json!({"salary": "abc"}), COLUMNS, "id", 1).is_err());
    }
}
