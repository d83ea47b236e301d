//! Read-side reporting helpers: CSV flattening, the revenue series, and
//! date-range bounds.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::store::transactions::{RevenueRow, TransactionRow};

/// Quote a CSV string field, doubling embedded quotes.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Flatten transactions to CSV: header plus one row per transaction,
/// fields in the documented fixed order. String fields are quoted,
/// the amount is not.
pub fn transactions_csv(rows: &[TransactionRow]) -> String {
    let mut out = String::from("Reference,UserEmail,PhoneNumber,Method,Amount,Status,CreatedAt\n");
    for row in rows {
        out.push_str(&quote(&row.reference));
        out.push(',');
        out.push_str(&quote(&row.user_email));
        out.push(',');
        out.push_str(&quote(row.phone_number.as_deref().unwrap_or("")));
        out.push(',');
        out.push_str(&quote(&row.method));
        out.push(',');
        out.push_str(&row.amount.to_string());
        out.push(',');
        out.push_str(&quote(&row.status));
        out.push(',');
        out.push_str(&quote(&row.created_at.to_rfc3339()));
        out.push('\n');
    }
    out
}

#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue {
    pub day: NaiveDate,
    pub revenue: Decimal,
}

/// Per-day revenue of completed transactions, ascending by date. Days
/// without completed transactions are absent from the series.
pub fn daily_revenue(rows: &[RevenueRow]) -> Vec<DailyRevenue> {
    let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for row in rows {
        if row.status != "completed" {
            continue;
        }
        *by_day
            .entry(row.created_at.date_naive())
            .or_insert(Decimal::ZERO) += row.amount;
    }
    by_day
        .into_iter()
        .map(|(day, revenue)| DailyRevenue { day, revenue })
        .collect()
}

/// Inclusive lower bound: start of the given day.
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Exclusive upper bound: start of the day after. Paired with a `<`
/// comparison so sub-second timestamps on the last day stay included.
pub fn day_after(date: NaiveDate) -> DateTime<Utc> {
    day_start(date.succ_opt().unwrap_or(date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn row(reference: &str, email: &str) -> TransactionRow {
        TransactionRow {
            id: Uuid::new_v4(),
            user_email: email.into(),
            phone_number: Some("254712345678".into()),
            method: "mpesa".into(),
            amount: dec!(1500.00),
            currency: "KES".into(),
            status: "completed".into(),
            reference: reference.into(),
            correlation_id: None,
            provider_response: None,
            callback_data: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn csv_has_header_plus_one_line_per_row() {
        let rows = vec![row("MP1", "a@example.com"), row("MP2", "b@example.com")];
        let csv = transactions_csv(&rows);
        assert_eq!(csv.trim_end().lines().count(), 3);
        assert!(csv.starts_with(
            "Reference,UserEmail,PhoneNumber,Method,Amount,Status,CreatedAt\n"
        ));
    }

    #[test]
    fn string_fields_are_quoted_and_amount_is_not() {
        let csv = transactions_csv(&[row("MP1", "a@example.com")]);
        let line = csv.lines().nth(1).unwrap();
        assert!(line.starts_with("\"MP1\",\"a@example.com\",\"254712345678\",\"mpesa\",1500.00,"));
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let csv = transactions_csv(&[row("MP\"1", "a@example.com")]);
        assert!(csv.contains("\"MP\"\"1\""));
    }

    #[test]
    fn empty_export_is_header_only() {
        assert_eq!(transactions_csv(&[]).trim_end().lines().count(), 1);
    }

    #[test]
    fn day_bounds_cover_the_whole_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(day_start(date).to_rfc3339(), "2024-03-10T00:00:00+00:00");
        assert_eq!(day_after(date).to_rfc3339(), "2024-03-11T00:00:00+00:00");
        // A sub-second timestamp at the very end of the day falls inside
        // [day_start, day_after).
        let late = date.and_hms_milli_opt(23, 59, 59, 500).unwrap().and_utc();
        assert!(day_start(date) <= late);
        assert!(late < day_after(date));
    }

    fn revenue_row(status: &str, day: u32, amount: Decimal) -> RevenueRow {
        RevenueRow {
            status: status.into(),
            amount,
            created_at: NaiveDate::from_ymd_opt(2024, 3, day)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
                .and_utc(),
        }
    }

    #[test]
    fn revenue_series_sums_completed_per_day_ascending() {
        // Deliberately out of order and mixed with non-completed rows.
        let rows = vec![
            revenue_row("completed", 12, dec!(300)),
            revenue_row("failed", 12, dec!(999)),
            revenue_row("completed", 10, dec!(100)),
            revenue_row("pending", 11, dec!(999)),
            revenue_row("completed", 10, dec!(50)),
            revenue_row("cancelled", 10, dec!(999)),
        ];
        let series = daily_revenue(&rows);
        assert_eq!(
            series,
            vec![
                DailyRevenue {
                    day: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
                    revenue: dec!(150),
                },
                DailyRevenue {
                    day: NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
                    revenue: dec!(300),
                },
            ]
        );
    }

    #[test]
    fn revenue_series_is_empty_without_completed_rows() {
        let rows = vec![revenue_row("pending", 10, dec!(100))];
        assert!(daily_revenue(&rows).is_empty());
    }
}
