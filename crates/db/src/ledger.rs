use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::Row;

use cotibot_core::{
    LedgerError, QuoteId, QuoteLedger, QuoteRecord, TRAVEL_DATE_FORMAT, TRAVEL_TIME_FORMAT,
};

use crate::DbPool;

/// SQLite realization of the quote ledger: one row per confirmed quote,
/// mirroring the operator's intake sheet.
pub struct SqlQuoteLedger {
    pool: DbPool,
}

impl SqlQuoteLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Most recent records first; used by the operator CLI.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<QuoteRecord>, LedgerError> {
        let rows = sqlx::query(
            "SELECT quote_id, received_at, name, email, passengers, travel_date, origin, \
             destination, departure_time, return_time, phone, total_km, total_hours, fleet, \
             total_price, quote_error \
             FROM quote_record ORDER BY received_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| LedgerError::Append(error.to_string()))?;

        rows.into_iter().map(decode_row).collect()
    }

    pub async fn count(&self) -> Result<i64, LedgerError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM quote_record")
            .fetch_one(&self.pool)
            .await
            .map_err(|error| LedgerError::Append(error.to_string()))
    }
}

#[async_trait]
impl QuoteLedger for SqlQuoteLedger {
    async fn append(&self, record: &QuoteRecord) -> Result<(), LedgerError> {
        sqlx::query(
            "INSERT INTO quote_record (quote_id, received_at, name, email, passengers, \
             travel_date, origin, destination, departure_time, return_time, phone, total_km, \
             total_hours, fleet, total_price, quote_error) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.quote_id.0)
        .bind(record.received_at.to_rfc3339())
        .bind(&record.name)
        .bind(&record.email)
        .bind(record.passengers as i64)
        .bind(record.travel_date.format(TRAVEL_DATE_FORMAT).to_string())
        .bind(&record.origin)
        .bind(&record.destination)
        .bind(record.departure_time.format(TRAVEL_TIME_FORMAT).to_string())
        .bind(record.return_time.format(TRAVEL_TIME_FORMAT).to_string())
        .bind(&record.phone)
        .bind(record.total_km)
        .bind(record.total_hours)
        .bind(&record.fleet)
        .bind(record.total_price.and_then(|price| price.to_i64()))
        .bind(&record.quote_error)
        .execute(&self.pool)
        .await
        .map_err(|error| LedgerError::Append(error.to_string()))?;

        Ok(())
    }
}

fn decode_row(row: sqlx::sqlite::SqliteRow) -> Result<QuoteRecord, LedgerError> {
    let decode = |message: String| LedgerError::Append(message);

    let received_at: String = row.get("received_at");
    let received_at = DateTime::parse_from_rfc3339(&received_at)
        .map_err(|error| decode(format!("bad received_at: {error}")))?
        .with_timezone(&Utc);

    let travel_date: String = row.get("travel_date");
    let travel_date = NaiveDate::parse_from_str(&travel_date, TRAVEL_DATE_FORMAT)
        .map_err(|error| decode(format!("bad travel_date: {error}")))?;

    let departure_time: String = row.get("departure_time");
    let departure_time = NaiveTime::parse_from_str(&departure_time, TRAVEL_TIME_FORMAT)
        .map_err(|error| decode(format!("bad departure_time: {error}")))?;

    let return_time: String = row.get("return_time");
    let return_time = NaiveTime::parse_from_str(&return_time, TRAVEL_TIME_FORMAT)
        .map_err(|error| decode(format!("bad return_time: {error}")))?;

    Ok(QuoteRecord {
        quote_id: QuoteId(row.get("quote_id")),
        received_at,
        name: row.get("name"),
        email: row.get("email"),
        passengers: row.get::<i64, _>("passengers") as u32,
        travel_date,
        origin: row.get("origin"),
        destination: row.get("destination"),
        departure_time,
        return_time,
        phone: row.get("phone"),
        total_km: row.get("total_km"),
        total_hours: row.get("total_hours"),
        fleet: row.get("fleet"),
        total_price: row.get::<Option<i64>, _>("total_price").map(Decimal::from),
        quote_error: row.get("quote_error"),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime, Utc};
    use rust_decimal::Decimal;

    use cotibot_core::{QuoteId, QuoteLedger, QuoteRecord};

    use super::SqlQuoteLedger;
    use crate::{connect_with_settings, migrations};

    async fn ledger() -> SqlQuoteLedger {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlQuoteLedger::new(pool)
    }

    fn record(quote_id: &str, priced: bool) -> QuoteRecord {
        QuoteRecord {
            quote_id: QuoteId(quote_id.to_string()),
            received_at: Utc::now(),
            name: "Carla Rojas".to_string(),
            email: "carla@empresa.cl".to_string(),
            passengers: 20,
            travel_date: NaiveDate::from_ymd_opt(2030, 12, 25).expect("valid date"),
            origin: "Estación Central".to_string(),
            destination: "Viña del Mar".to_string(),
            departure_time: NaiveTime::from_hms_opt(7, 45, 0).expect("valid time"),
            return_time: NaiveTime::from_hms_opt(18, 0, 0).expect("valid time"),
            phone: "+56 9 12345678".to_string(),
            total_km: priced.then_some(240.5),
            total_hours: priced.then_some(4.2),
            fleet: priced.then(|| "1 taxibus (30 pax c/u)".to_string()),
            total_price: priced.then(|| Decimal::from(511_000)),
            quote_error: (!priced).then(|| "no drivable route".to_string()),
        }
    }

    #[tokio::test]
    async fn appended_records_round_trip() {
        let ledger = ledger().await;
        ledger.append(&record("COT-AAAA0001", true)).await.expect("append");

        let records = ledger.list_recent(10).await.expect("list");
        assert_eq!(records.len(), 1);
        let loaded = &records[0];
        assert_eq!(loaded.quote_id, QuoteId("COT-AAAA0001".to_string()));
        assert_eq!(loaded.passengers, 20);
        assert_eq!(loaded.total_price, Some(Decimal::from(511_000)));
        assert_eq!(loaded.fleet.as_deref(), Some("1 taxibus (30 pax c/u)"));
        assert!(loaded.quote_error.is_none());
    }

    #[tokio::test]
    async fn pending_manual_records_keep_their_error() {
        let ledger = ledger().await;
        ledger.append(&record("COT-AAAA0002", false)).await.expect("append");

        let records = ledger.list_recent(10).await.expect("list");
        assert_eq!(records[0].quote_error.as_deref(), Some("no drivable route"));
        assert!(records[0].total_price.is_none());
        assert_eq!(ledger.count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn duplicate_quote_ids_are_rejected_by_the_schema() {
        let ledger = ledger().await;
        ledger.append(&record("COT-AAAA0003", true)).await.expect("first append");

        let error = ledger.append(&record("COT-AAAA0003", true)).await;
        assert!(error.is_err(), "primary key violation should surface");
    }
}
