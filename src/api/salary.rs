use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::MySqlPool;
use sqlx::types::Json;
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::ledger::{
    StaffSnapshot, generate_ledger, ledger_total, merge_entries, refresh_aggregates, to_f64,
};
use crate::model::salary::{Ledger, SalaryPeriod};

#[derive(Deserialize, ToSchema)]
pub struct CreateSalaryPeriod {
    #[schema(example = 7, minimum = 1, maximum = 12)]
    pub month: u8,

    #[schema(example = "1403")]
    pub year: String,
}

/// Partial period update. `entries` is a map of staff id -> patch object;
/// per-field fallback inside the patches is handled by the merge, so a bad
/// monetary string for one staff member never rejects the request.
#[derive(Deserialize, ToSchema)]
pub struct UpdateSalaryPeriod {
    #[schema(example = 7, minimum = 1, maximum = 12)]
    pub month: Option<u8>,

    #[schema(example = "1403")]
    pub year: Option<String>,

    #[schema(value_type = Object, example = json!({"1": {"taken": "300.00", "description": "advance"}}))]
    pub entries: Option<Map<String, Value>>,
}

#[derive(Serialize, ToSchema)]
pub struct SalaryPeriodResponse {
    pub id: u64,
    pub month: u8,
    pub year: String,

    /// Cached sum of entry salaries, reassigned only by a changed merge.
    #[schema(example = 1500.0)]
    pub total: f64,

    pub entries: Ledger,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: chrono::DateTime<chrono::Utc>,

    #[schema(value_type = String, format = "date-time")]
    pub updated_at: chrono::DateTime<chrono::Utc>,

    /// Derived on every read, never stored.
    #[schema(example = 300.0)]
    pub total_taken: f64,

    /// Derived on every read, never stored.
    #[schema(example = 1200.0)]
    pub total_remainder: f64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct SalaryQuery {
    #[schema(example = 1)]
    pub page: Option<u32>,

    #[schema(example = 10)]
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedSalaryResponse {
    pub data: Vec<SalaryPeriodResponse>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

fn validate_month(month: u8) -> Result<(), ApiError> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "month must be between 1 and 12, got {month}"
        )))
    }
}

fn validate_year(year: &str) -> Result<(), ApiError> {
    if year.chars().count() == 4 {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "year must be a 4-character label, got {year:?}"
        )))
    }
}

/// Per-entry remainders are refreshed and period aggregates derived on
/// every serialization; the cached total is coerced to float as stored.
fn represent(period: SalaryPeriod) -> SalaryPeriodResponse {
    let mut entries = period.entries.0;
    let aggregates = refresh_aggregates(&mut entries);

    SalaryPeriodResponse {
        id: period.id,
        month: period.month,
        year: period.year,
        total: to_f64(period.total),
        entries,
        created_at: period.created_at,
        updated_at: period.updated_at,
        total_taken: to_f64(aggregates.total_taken),
        total_remainder: to_f64(aggregates.total_remainder),
    }
}

async fn fetch_period(pool: &MySqlPool, id: u64) -> Result<SalaryPeriod, ApiError> {
    sqlx::query_as::<_, SalaryPeriod>(
        r#"
        SELECT id, month, year, total, entries, created_at, updated_at
        FROM salary_periods
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::NotFound("Salary period not found".into()))
}

/// Create Salary Period
///
/// Snapshots the active staff roster into a fresh ledger: one entry per
/// active staff member with nothing taken yet. The snapshot is never
/// re-synced with later staff changes.
#[utoipa::path(
    post,
    path = "/api/v1/salaries",
    request_body = CreateSalaryPeriod,
    responses(
        (status = 201, description = "Salary period created", body = SalaryPeriodResponse),
        (status = 400, description = "Month outside 1-12 or malformed year"),
        (status = 409, description = "Period for this (month, year) already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn create_period(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateSalaryPeriod>,
) -> actix_web::Result<HttpResponse> {
    auth.require_finance_or_admin()?;

    validate_month(payload.month)?;
    validate_year(&payload.year)?;

    let staff = sqlx::query_as::<_, StaffSnapshot>(
        r#"
        SELECT id, name, salary
        FROM staff
        WHERE status = 'Active'
        ORDER BY name
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::from)?;

    let (ledger, total) = generate_ledger(&staff);
    debug!(
        month = payload.month,
        year = %payload.year,
        staff_count = ledger.len(),
        "generated salary ledger"
    );

    let result = sqlx::query(
        r#"
        INSERT INTO salary_periods (month, year, total, entries)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(payload.month)
    .bind(&payload.year)
    .bind(total)
    .bind(Json(&ledger))
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        ApiError::conflict_on_duplicate(e, "A salary period for this month and year already exists")
    })?;

    let period = fetch_period(pool.get_ref(), result.last_insert_id()).await?;
    info!(period_id = period.id, "salary period created");

    Ok(HttpResponse::Created().json(represent(period)))
}

/// Update Salary Period
///
/// Merges partial ledger edits in memory, then writes the whole period back
/// as one UPDATE (last writer wins; edits are expected to be serialized by
/// a single operator). The cached total is recomputed from the full entry
/// set only when at least one entry actually changed.
#[utoipa::path(
    put,
    path = "/api/v1/salaries/{period_id}",
    request_body = UpdateSalaryPeriod,
    params(
        ("period_id", description = "Salary period ID")
    ),
    responses(
        (status = 200, description = "Salary period updated", body = SalaryPeriodResponse),
        (status = 400, description = "Month outside 1-12 or malformed year"),
        (status = 404, description = "Salary period not found"),
        (status = 409, description = "Move collides with an existing (month, year)")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn update_period(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateSalaryPeriod>,
) -> actix_web::Result<HttpResponse> {
    auth.require_finance_or_admin()?;

    if let Some(month) = payload.month {
        validate_month(month)?;
    }
    if let Some(year) = &payload.year {
        validate_year(year)?;
    }

    let period_id = path.into_inner();
    let period = fetch_period(pool.get_ref(), period_id).await?;

    let mut ledger = period.entries.0;
    let changed = match &payload.entries {
        Some(incoming) => merge_entries(&mut ledger, incoming),
        None => false,
    };

    let total = if changed {
        ledger_total(&ledger)
    } else {
        period.total
    };
    let month = payload.month.unwrap_or(period.month);
    let year = payload.year.clone().unwrap_or(period.year);

    sqlx::query(
        r#"
        UPDATE salary_periods
        SET month = ?, year = ?, total = ?, entries = ?
        WHERE id = ?
        "#,
    )
    .bind(month)
    .bind(&year)
    .bind(total)
    .bind(Json(&ledger))
    .bind(period_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        ApiError::conflict_on_duplicate(e, "A salary period for this month and year already exists")
    })?;

    debug!(period_id, changed, "salary period merged");

    let period = fetch_period(pool.get_ref(), period_id).await?;
    Ok(HttpResponse::Ok().json(represent(period)))
}

/// Get Salary Period by ID
#[utoipa::path(
    get,
    path = "/api/v1/salaries/{period_id}",
    params(
        ("period_id", description = "Salary period ID")
    ),
    responses(
        (status = 200, body = SalaryPeriodResponse),
        (status = 404, description = "Salary period not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn get_period(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    auth.require_finance_or_admin()?;

    let period = fetch_period(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(represent(period)))
}

/// List Salary Periods
#[utoipa::path(
    get,
    path = "/api/v1/salaries",
    params(SalaryQuery),
    responses(
        (status = 200, body = PaginatedSalaryResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn list_periods(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SalaryQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_finance_or_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let offset = super::page_offset(page, per_page);

    let total = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM salary_periods"#)
        .fetch_one(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    let periods = sqlx::query_as::<_, SalaryPeriod>(
        r#"
        SELECT id, month, year, total, entries, created_at, updated_at
        FROM salary_periods
        ORDER BY year DESC, month DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(per_page as i64)
    .bind(offset)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(PaginatedSalaryResponse {
        data: periods.into_iter().map(represent).collect(),
        page,
        per_page,
        total,
    }))
}

/// Delete Salary Period
///
/// Unconditional: removes the whole period record, ledger included.
#[utoipa::path(
    delete,
    path = "/api/v1/salaries/{period_id}",
    params(
        ("period_id", description = "Salary period ID")
    ),
    responses(
        (status = 200, description = "Salary period deleted"),
        (status = 404, description = "Salary period not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn delete_period(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    auth.require_finance_or_admin()?;

    let period_id = path.into_inner();
    let result = sqlx::query(r#"DELETE FROM salary_periods WHERE id = ?"#)
        .bind(period_id)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Salary period not found".into()).into());
    }

    info!(period_id, "salary period deleted");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Successfully deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    use crate::model::salary::LedgerEntry;

    #[test]
    fn month_bounds_are_enforced() {
        assert!(validate_month(1).is_ok());
        assert!(validate_month(12).is_ok());
        assert!(validate_month(0).is_err());
        assert!(validate_month(13).is_err());
    }

    #[test]
    fn year_must_be_four_characters() {
        assert!(validate_year("1403").is_ok());
        assert!(validate_year("24").is_err());
        assert!(validate_year("14030").is_err());
    }

    #[test]
    fn representation_refreshes_remainders_and_totals() {
        let mut entries = BTreeMap::new();
        entries.insert(
            "1".to_string(),
            LedgerEntry {
                name: "A".into(),
                salary: dec!(1000.00),
                taken: dec!(300.00),
                // deliberately stale
                remainder: dec!(0.00),
                description: String::new(),
            },
        );

        let now = Utc::now();
        let response = represent(SalaryPeriod {
            id: 1,
            month: 7,
            year: "1403".into(),
            total: dec!(1000.00),
            entries: Json(entries),
            created_at: now,
            updated_at: now,
        });

        assert_eq!(response.total, 1000.0);
        assert_eq!(response.total_taken, 300.0);
        assert_eq!(response.total_remainder, 700.0);
        assert_eq!(
            response.entries["1"].remainder,
            dec!(700.00),
            "stored remainder must be overwritten on read"
        );
    }
}
