use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Ledger map of one salary period: staff id (as a string key) -> entry.
/// BTreeMap keeps iteration order stable so totals are deterministic.
pub type Ledger = BTreeMap<String, LedgerEntry>;

/// One staff member's disbursement record inside a period's ledger.
///
/// Monetary fields are exact decimals and are serialized as decimal-formatted
/// strings in the stored/wire JSON to avoid binary-float drift. `remainder`
/// is derived (`salary - taken`); the stored value may be stale and is
/// recomputed on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LedgerEntry {
    #[schema(example = "Ahmad Karimi")]
    pub name: String,

    #[serde(with = "rust_decimal::serde::str")]
    #[schema(value_type = String, example = "1000.00")]
    pub salary: Decimal,

    #[serde(with = "rust_decimal::serde::str")]
    #[schema(value_type = String, example = "300.00")]
    pub taken: Decimal,

    #[serde(with = "rust_decimal::serde::str")]
    #[schema(value_type = String, example = "700.00")]
    pub remainder: Decimal,

    #[schema(example = "advance for Eid")]
    pub description: String,
}

impl Default for LedgerEntry {
    fn default() -> Self {
        Self {
            name: String::new(),
            salary: Decimal::ZERO,
            taken: Decimal::ZERO,
            remainder: Decimal::ZERO,
            description: String::new(),
        }
    }
}

/// One payroll cycle, unique per (month, year).
///
/// `total` is a cached sum of entry salaries: set at generation, reassigned
/// only when a merge actually changes the ledger. `entries` is persisted as
/// a JSON column keyed by staff id.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct SalaryPeriod {
    pub id: u64,
    pub month: u8,
    pub year: String,
    pub total: Decimal,
    pub entries: Json<Ledger>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn monetary_fields_serialize_as_strings() {
        let entry = LedgerEntry {
            name: "A".into(),
            salary: dec!(1000.00),
            taken: dec!(300.00),
            remainder: dec!(700.00),
            description: String::new(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["salary"], serde_json::json!("1000.00"));
        assert_eq!(json["taken"], serde_json::json!("300.00"));
        assert_eq!(json["remainder"], serde_json::json!("700.00"));
    }

    #[test]
    fn entry_round_trips_through_stored_json() {
        let entry = LedgerEntry {
            name: "B".into(),
            salary: dec!(500.50),
            taken: dec!(0.00),
            remainder: dec!(500.50),
            description: "half month".into(),
        };

        let text = serde_json::to_string(&entry).unwrap();
        let back: LedgerEntry = serde_json::from_str(&text).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn ledger_keys_iterate_in_stable_order() {
        let mut ledger = Ledger::new();
        ledger.insert("7".into(), LedgerEntry::default());
        ledger.insert("10".into(), LedgerEntry::default());
        ledger.insert("2".into(), LedgerEntry::default());

        let keys: Vec<_> = ledger.keys().cloned().collect();
        assert_eq!(keys, vec!["10", "2", "7"]);
    }
}
