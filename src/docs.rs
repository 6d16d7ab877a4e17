use crate::api::salary::{
    CreateSalaryPeriod, PaginatedSalaryResponse, SalaryPeriodResponse, SalaryQuery,
    UpdateSalaryPeriod,
};
use crate::api::staff::{CreateStaff, StaffListResponse, StaffQuery, StaffResponse};
use crate::model::salary::LedgerEntry;
use crate::model::staff::Staff;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "StaffPay API",
        version = "1.0.0",
        description = r#"
## Staff & Salary-Period Management

This API manages a staff roster and the monthly salary reconciliation
ledgers derived from it.

### Key Features
- **Staff Management**
  - Create, update, list, and view staff members with their base salary
- **Salary Periods**
  - Generate a per-staff disbursement ledger for a (month, year) period
  - Merge partial edits (amount taken, notes) into the ledger
  - Live-derived totals: amount taken and remainder per period

### Security
Endpoints are protected using **JWT Bearer authentication**. Salary
operations require the **Finance** or **Admin** role.

### Response Format
- JSON-based RESTful responses
- Monetary ledger fields are decimal-formatted strings; aggregate totals
  are floats
- Pagination supported for list endpoints
"#,
    ),
    paths(
        crate::api::staff::create_staff,
        crate::api::staff::list_staff,
        crate::api::staff::get_staff,
        crate::api::staff::update_staff,
        crate::api::staff::delete_staff,

        crate::api::salary::create_period,
        crate::api::salary::update_period,
        crate::api::salary::get_period,
        crate::api::salary::list_periods,
        crate::api::salary::delete_period
    ),
    components(
        schemas(
            Staff,
            CreateStaff,
            StaffResponse,
            StaffListResponse,
            StaffQuery,
            LedgerEntry,
            CreateSalaryPeriod,
            UpdateSalaryPeriod,
            SalaryPeriodResponse,
            PaginatedSalaryResponse,
            SalaryQuery
        )
    ),
    tags(
        (name = "Staff", description = "Staff roster APIs"),
        (name = "Salary", description = "Salary period ledger APIs"),
    )
)]
pub struct ApiDoc;
