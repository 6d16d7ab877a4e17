use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::MySqlPool;
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::ledger::to_f64;
use crate::model::staff::{Staff, is_valid_status};
use crate::utils::db_utils::{build_update_sql, execute_update};

#[derive(Deserialize, ToSchema)]
pub struct CreateStaff {
    #[schema(example = "Ahmad Karimi")]
    pub name: String,

    #[schema(example = "Karim")]
    pub father_name: String,

    #[schema(example = "1399-0101-12345")]
    pub nic: Option<String>,

    #[schema(example = "District 4, Kabul")]
    pub address: Option<String>,

    #[schema(example = "Technician")]
    pub position: String,

    #[schema(value_type = String, example = "1000.00")]
    pub salary: Decimal,

    #[schema(example = "Active")]
    pub status: String,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct StaffQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
    pub search: Option<String>,
}

/// Staff representation: salary rendered as a float at the boundary, stored
/// as an exact decimal.
#[derive(Serialize, ToSchema)]
pub struct StaffResponse {
    pub id: u64,
    pub name: String,
    pub father_name: String,
    pub nic: Option<String>,
    pub address: Option<String>,
    pub position: String,

    #[schema(example = 1000.0)]
    pub salary: f64,

    pub status: String,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,

    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

impl From<Staff> for StaffResponse {
    fn from(staff: Staff) -> Self {
        Self {
            id: staff.id,
            name: staff.name,
            father_name: staff.father_name,
            nic: staff.nic,
            address: staff.address,
            position: staff.position,
            salary: to_f64(staff.salary),
            status: staff.status,
            created_at: staff.created_at,
            updated_at: staff.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct StaffListResponse {
    pub data: Vec<StaffResponse>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

/// Columns a partial staff update may touch.
const STAFF_UPDATE_COLUMNS: &[&str] = &[
    "name",
    "father_name",
    "nic",
    "address",
    "position",
    "salary",
    "status",
];

/// Create Staff Member
#[utoipa::path(
    post,
    path = "/api/v1/staff",
    request_body = CreateStaff,
    responses(
        (status = 201, description = "Staff member created", body = StaffResponse),
        (status = 400, description = "Invalid status or negative salary")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn create_staff(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateStaff>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;

    if !is_valid_status(&payload.status) {
        return Err(ApiError::Validation(format!(
            "status must be Active or Inactive, got {:?}",
            payload.status
        ))
        .into());
    }
    if payload.salary < Decimal::ZERO {
        return Err(ApiError::Validation("salary must not be negative".into()).into());
    }

    let result = sqlx::query(
        r#"
        INSERT INTO staff (name, father_name, nic, address, position, salary, status)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.father_name)
    .bind(&payload.nic)
    .bind(&payload.address)
    .bind(&payload.position)
    .bind(payload.salary)
    .bind(&payload.status)
    .execute(pool.get_ref())
    .await
    .map_err(ApiError::from)?;

    let staff = fetch_staff(pool.get_ref(), result.last_insert_id()).await?;
    info!(staff_id = staff.id, "staff member created");

    Ok(HttpResponse::Created().json(StaffResponse::from(staff)))
}

/// List Staff Members
#[utoipa::path(
    get,
    path = "/api/v1/staff",
    params(StaffQuery),
    responses(
        (status = 200, description = "Paginated staff list", body = StaffListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn list_staff(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<StaffQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_finance_or_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = super::page_offset(page, per_page);

    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(status) = &query.status {
        conditions.push("status = ?");
        bindings.push(status.clone());
    }

    if let Some(search) = &query.search {
        conditions.push("(name LIKE ? OR father_name LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(like.clone());
        bindings.push(like);
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM staff {}", where_clause);
    debug!(sql = %count_sql, "counting staff");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }
    let total = count_query
        .fetch_one(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    let data_sql = format!(
        "SELECT * FROM staff {} ORDER BY name LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, page, per_page, "fetching staff");

    let mut data_query = sqlx::query_as::<_, Staff>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    let staff = data_query
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(StaffListResponse {
        data: staff.into_iter().map(StaffResponse::from).collect(),
        page,
        per_page,
        total,
    }))
}

/// Get Staff Member by ID
#[utoipa::path(
    get,
    path = "/api/v1/staff/{staff_id}",
    params(
        ("staff_id", description = "Staff ID")
    ),
    responses(
        (status = 200, description = "Staff member found", body = StaffResponse),
        (status = 404, description = "Staff member not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn get_staff(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    auth.require_finance_or_admin()?;

    let staff = fetch_staff(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(StaffResponse::from(staff)))
}

/// Update Staff Member
///
/// Partial update: only the provided columns are rewritten. Does not touch
/// ledgers of already generated salary periods.
#[utoipa::path(
    put,
    path = "/api/v1/staff/{staff_id}",
    params(
        ("staff_id", description = "Staff ID")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Staff member updated", body = StaffResponse),
        (status = 400, description = "Unknown column or invalid value"),
        (status = 404, description = "Staff member not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn update_staff(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;

    let staff_id = path.into_inner();

    if let Some(status) = body.get("status").and_then(Value::as_str) {
        if !is_valid_status(status) {
            return Err(ApiError::Validation(format!(
                "status must be Active or Inactive, got {status:?}"
            ))
            .into());
        }
    }

    // 404 before attempting the write; a no-op update also affects 0 rows,
    // so rows_affected alone cannot distinguish "missing" from "unchanged".
    fetch_staff(pool.get_ref(), staff_id).await?;

    let update = build_update_sql("staff", &body, STAFF_UPDATE_COLUMNS, "id", staff_id)?;
    execute_update(pool.get_ref(), update)
        .await
        .map_err(ApiError::from)?;

    let staff = fetch_staff(pool.get_ref(), staff_id).await?;
    Ok(HttpResponse::Ok().json(StaffResponse::from(staff)))
}

/// Delete Staff Member
#[utoipa::path(
    delete,
    path = "/api/v1/staff/{staff_id}",
    params(
        ("staff_id", description = "Staff ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Staff member not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn delete_staff(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;

    let staff_id = path.into_inner();
    let result = sqlx::query(r#"DELETE FROM staff WHERE id = ?"#)
        .bind(staff_id)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Staff member not found".into()).into());
    }

    info!(staff_id, "staff member deleted");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Successfully deleted"
    })))
}

async fn fetch_staff(pool: &MySqlPool, id: u64) -> Result<Staff, ApiError> {
    sqlx::query_as::<_, Staff>(r#"SELECT * FROM staff WHERE id = ?"#)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Staff member not found".into()))
}
