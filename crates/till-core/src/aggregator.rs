//! # Sales Aggregator
//!
//! Reduces ledger records into a single cash sales total for one calendar day.
//!
//! ## Reduction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ledger snapshot                                                        │
//! │  ┌──────────────┬─────────────────────────────┐                         │
//! │  │ 03-01 09:12  │ cash 100,000                │──► day? yes ──► 100,000 │
//! │  │ 03-01 11:40  │ cash 50,000 + card 200,000  │──► day? yes ──►  50,000 │
//! │  │ 03-01 13:05  │ e_wallet 80,000             │──► day? yes ──►       0 │
//! │  │ 02-29 23:55  │ cash 30,000                 │──► day? no              │
//! │  └──────────────┴─────────────────────────────┘                ───────  │
//! │                                                                150,000  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! "Day" is evaluated in the terminal's UTC offset, not in UTC, so a sale rung
//! up at 00:30 local time belongs to the new local day.
//!
//! The reduction is a pure function of its input: the same snapshot always
//! yields the same total, and the order of sales doesn't matter.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::LedgerSale;
use crate::validation::ValidationResult;

/// Largest accepted UTC offset, in minutes (±18h, same as chrono).
const MAX_OFFSET_MINUTES: i32 = 18 * 60;

/// Cash sales reducer bound to a terminal's UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalesAggregator {
    offset: FixedOffset,
}

impl SalesAggregator {
    pub fn new(offset: FixedOffset) -> Self {
        SalesAggregator { offset }
    }

    /// Aggregator evaluating days in UTC.
    pub fn utc() -> Self {
        SalesAggregator {
            offset: Utc.fix(),
        }
    }

    /// Builds an aggregator from an offset in minutes east of UTC.
    ///
    /// ## Errors
    /// `OutOfRange` outside ±18 hours.
    pub fn from_offset_minutes(minutes: i32) -> ValidationResult<Self> {
        let out_of_range = || ValidationError::OutOfRange {
            field: "utc_offset_minutes".to_string(),
            min: -(MAX_OFFSET_MINUTES as i64),
            max: MAX_OFFSET_MINUTES as i64,
        };

        if minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(out_of_range());
        }

        FixedOffset::east_opt(minutes * 60)
            .map(SalesAggregator::new)
            .ok_or_else(out_of_range)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Calendar day of `timestamp` in this aggregator's offset.
    pub fn local_date(&self, timestamp: DateTime<Utc>) -> NaiveDate {
        timestamp.with_timezone(&self.offset).date_naive()
    }

    /// UTC instants bounding `date`, as a half-open range `[start, end)`.
    ///
    /// Ledgers use this to narrow their read before the exact day filter.
    pub fn day_bounds(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let local_midnight = date.and_time(NaiveTime::MIN);
        let utc_midnight = local_midnight - Duration::seconds(self.offset.local_minus_utc() as i64);
        let start = Utc.from_utc_datetime(&utc_midnight);
        (start, start + Duration::days(1))
    }

    /// Sum of all cash-tagged payments on sales completed on `date`.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{NaiveDate, TimeZone, Utc};
    /// use till_core::aggregator::SalesAggregator;
    /// use till_core::money::Money;
    /// use till_core::types::{LedgerPayment, LedgerSale, PaymentMethod};
    ///
    /// let sale = LedgerSale {
    ///     id: "s1".into(),
    ///     receipt_number: "R-0001".into(),
    ///     timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    ///     total: Money::from_minor(100_000),
    ///     payments: vec![LedgerPayment::new(PaymentMethod::Cash, Money::from_minor(100_000))],
    /// };
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    /// let total = SalesAggregator::utc().cash_sales_total(&[sale], date);
    /// assert_eq!(total.minor(), 100_000);
    /// ```
    pub fn cash_sales_total(&self, sales: &[LedgerSale], date: NaiveDate) -> Money {
        sales
            .iter()
            .filter(|sale| self.local_date(sale.timestamp) == date)
            .map(LedgerSale::cash_amount)
            .sum()
    }
}

impl Default for SalesAggregator {
    fn default() -> Self {
        SalesAggregator::utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LedgerPayment, PaymentMethod};
    use proptest::prelude::*;

    fn sale(id: &str, at: DateTime<Utc>, payments: Vec<(PaymentMethod, i64)>) -> LedgerSale {
        let payments: Vec<LedgerPayment> = payments
            .into_iter()
            .map(|(method, amount)| LedgerPayment::new(method, Money::from_minor(amount)))
            .collect();
        LedgerSale {
            id: id.to_string(),
            receipt_number: format!("R-{id}"),
            timestamp: at,
            total: payments.iter().map(|p| p.amount).sum(),
            payments,
        }
    }

    fn march_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_sums_same_day_cash_sales() {
        let sales = vec![
            sale("1", Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(), vec![(PaymentMethod::Cash, 100_000)]),
            sale("2", Utc.with_ymd_and_hms(2024, 3, 1, 14, 0, 0).unwrap(), vec![(PaymentMethod::Cash, 150_000)]),
        ];
        let total = SalesAggregator::utc().cash_sales_total(&sales, march_first());
        assert_eq!(total.minor(), 250_000);
    }

    #[test]
    fn test_ignores_other_days_and_non_cash() {
        let sales = vec![
            sale("1", Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap(), vec![(PaymentMethod::Cash, 30_000)]),
            sale("2", Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(), vec![(PaymentMethod::Card, 200_000)]),
            sale(
                "3",
                Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap(),
                vec![(PaymentMethod::Cash, 50_000), (PaymentMethod::EWallet, 20_000)],
            ),
            sale("4", Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap(), vec![(PaymentMethod::Cash, 10_000)]),
        ];
        let total = SalesAggregator::utc().cash_sales_total(&sales, march_first());
        assert_eq!(total.minor(), 50_000);
    }

    #[test]
    fn test_counts_every_cash_line_of_a_sale() {
        let sales = vec![sale(
            "1",
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            vec![(PaymentMethod::Cash, 40_000), (PaymentMethod::Cash, 60_000)],
        )];
        let total = SalesAggregator::utc().cash_sales_total(&sales, march_first());
        assert_eq!(total.minor(), 100_000);
    }

    #[test]
    fn test_day_is_evaluated_in_local_offset() {
        // UTC+7: 2024-02-29 18:30Z is 01:30 on March 1st locally.
        let wib = SalesAggregator::from_offset_minutes(7 * 60).unwrap();
        let sales = vec![
            sale("1", Utc.with_ymd_and_hms(2024, 2, 29, 18, 30, 0).unwrap(), vec![(PaymentMethod::Cash, 10_000)]),
            sale("2", Utc.with_ymd_and_hms(2024, 3, 1, 17, 30, 0).unwrap(), vec![(PaymentMethod::Cash, 20_000)]),
        ];
        assert_eq!(wib.cash_sales_total(&sales, march_first()).minor(), 10_000);
        assert_eq!(SalesAggregator::utc().cash_sales_total(&sales, march_first()).minor(), 20_000);
    }

    #[test]
    fn test_day_bounds() {
        let (start, end) = SalesAggregator::utc().day_bounds(march_first());
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap());

        let wib = SalesAggregator::from_offset_minutes(420).unwrap();
        let (start, end) = wib.day_bounds(march_first());
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 29, 17, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 1, 17, 0, 0).unwrap());
    }

    #[test]
    fn test_rejects_out_of_range_offset() {
        assert!(SalesAggregator::from_offset_minutes(18 * 60).is_ok());
        assert!(SalesAggregator::from_offset_minutes(-18 * 60).is_ok());
        assert!(SalesAggregator::from_offset_minutes(18 * 60 + 1).is_err());
    }

    #[test]
    fn test_empty_ledger_is_zero() {
        assert!(SalesAggregator::utc().cash_sales_total(&[], march_first()).is_zero());
    }

    proptest! {
        #[test]
        fn total_is_idempotent_and_order_independent(
            amounts in prop::collection::vec((0u32..86_400, 1i64..1_000_000, any::<bool>()), 0..30),
        ) {
            let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
            let mut sales: Vec<LedgerSale> = amounts
                .iter()
                .enumerate()
                .map(|(i, (secs, amount, cash))| {
                    let method = if *cash { PaymentMethod::Cash } else { PaymentMethod::Card };
                    sale(&i.to_string(), base + Duration::seconds(*secs as i64), vec![(method, *amount)])
                })
                .collect();

            let aggregator = SalesAggregator::utc();
            let first = aggregator.cash_sales_total(&sales, march_first());
            let second = aggregator.cash_sales_total(&sales, march_first());
            prop_assert_eq!(first, second);

            sales.reverse();
            prop_assert_eq!(aggregator.cash_sales_total(&sales, march_first()), first);

            let expected: i64 = amounts.iter().filter(|(_, _, cash)| *cash).map(|(_, a, _)| *a).sum();
            prop_assert_eq!(first.minor(), expected);
        }
    }
}
