use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Staff roster row. The salary ledger reads this table exactly once, at
/// period generation; later edits never touch already generated periods.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Ahmad Karimi",
        "father_name": "Karim",
        "nic": "1399-0101-12345",
        "address": "District 4, Kabul",
        "position": "Technician",
        "salary": "1000.00",
        "status": "Active",
        "created_at": "2025-01-01T08:00:00Z",
        "updated_at": "2025-01-01T08:00:00Z"
    })
)]
pub struct Staff {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Ahmad Karimi")]
    pub name: String,

    #[schema(example = "Karim")]
    pub father_name: String,

    #[schema(example = "1399-0101-12345", nullable = true)]
    pub nic: Option<String>,

    #[schema(example = "District 4, Kabul", nullable = true)]
    pub address: Option<String>,

    #[schema(example = "Technician")]
    pub position: String,

    #[schema(value_type = String, example = "1000.00")]
    pub salary: Decimal,

    #[schema(example = "Active")]
    pub status: String,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,

    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

pub const STATUS_ACTIVE: &str = "Active";
pub const STATUS_INACTIVE: &str = "Inactive";

pub fn is_valid_status(status: &str) -> bool {
    status == STATUS_ACTIVE || status == STATUS_INACTIVE
}
