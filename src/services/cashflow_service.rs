use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ServiceError;
use crate::database::models::{BalanceRequest, RequestFilter, RequestKind, RequestStatus};
use crate::database::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Month,
}

impl Granularity {
    fn period_key(&self, date: NaiveDate) -> String {
        match self {
            Granularity::Day => date.format("%Y-%m-%d").to_string(),
            Granularity::Month => date.format("%Y-%m").to_string(),
        }
    }
}

/// Query string of the cashflow report. Exactly one of `date`, `from`+`to`
/// or `month` selects the window.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CashflowQuery {
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// `YYYY-MM`
    pub month: Option<String>,
    pub group_by: Option<Granularity>,
}

/// Half-open UTC date window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CashflowWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CashflowQuery {
    pub fn window(&self) -> Result<CashflowWindow, ServiceError> {
        let selectors = [
            self.date.is_some(),
            self.from.is_some() || self.to.is_some(),
            self.month.is_some(),
        ];
        match selectors.iter().filter(|s| **s).count() {
            0 => return Err(ServiceError::BadRequest("Specify a date, a from/to range or a month".to_string())),
            1 => {}
            _ => return Err(ServiceError::BadRequest("Specify only one of date, from/to or month".to_string())),
        }

        if let Some(date) = self.date {
            return Ok(CashflowWindow { start: date, end: next_day(date, "date")? });
        }

        if let Some(month) = &self.month {
            let start = NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d")
                .map_err(|_| ServiceError::invalid("month", "Month must look like YYYY-MM"))?;
            let end = start
                .checked_add_months(Months::new(1))
                .ok_or_else(|| ServiceError::invalid("month", "Date out of range"))?;
            return Ok(CashflowWindow { start, end });
        }

        match (self.from, self.to) {
            (Some(from), Some(to)) if from <= to => Ok(CashflowWindow { start: from, end: next_day(to, "to")? }),
            (Some(_), Some(_)) => Err(ServiceError::invalid("from", "from must not be after to")),
            _ => Err(ServiceError::BadRequest("Both from and to are required for a range".to_string())),
        }
    }
}

fn next_day(date: NaiveDate, field: &'static str) -> Result<NaiveDate, ServiceError> {
    date.checked_add_days(Days::new(1))
        .ok_or_else(|| ServiceError::invalid(field, "Date out of range"))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashflowBucket {
    pub period: String,
    pub sales: Decimal,
    pub payouts: Decimal,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashflowReport {
    pub from: NaiveDate,
    /// Inclusive
    pub to: NaiveDate,
    pub sales: Decimal,
    pub payouts: Decimal,
    pub revenue: Decimal,
    pub top_up_count: usize,
    pub withdrawal_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buckets: Option<Vec<CashflowBucket>>,
}

/// Sum approved top-ups (sales) and withdrawals (payouts) for the window
pub fn aggregate(
    window: CashflowWindow,
    top_ups: &[BalanceRequest],
    withdrawals: &[BalanceRequest],
    granularity: Option<Granularity>,
) -> CashflowReport {
    let sales: Decimal = top_ups.iter().map(|r| r.amount).sum();
    let payouts: Decimal = withdrawals.iter().map(|r| r.amount).sum();

    let buckets = granularity.map(|granularity| {
        let mut periods: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
        for r in top_ups {
            periods.entry(granularity.period_key(r.created_at.date_naive())).or_default().0 += r.amount;
        }
        for r in withdrawals {
            periods.entry(granularity.period_key(r.created_at.date_naive())).or_default().1 += r.amount;
        }
        periods
            .into_iter()
            .map(|(period, (sales, payouts))| CashflowBucket {
                period,
                sales,
                payouts,
                revenue: sales - payouts,
            })
            .collect()
    });

    CashflowReport {
        from: window.start,
        to: window.end.pred_opt().unwrap_or(window.start),
        sales,
        payouts,
        revenue: sales - payouts,
        top_up_count: top_ups.len(),
        withdrawal_count: withdrawals.len(),
        buckets,
    }
}

pub struct CashflowService<'a> {
    store: &'a dyn Store,
}

impl<'a> CashflowService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    pub async fn report(&self, query: &CashflowQuery) -> Result<CashflowReport, ServiceError> {
        let window = query.window()?;
        let filter = RequestFilter {
            status: Some(RequestStatus::Approved),
            created_from: Some(window.start.and_time(chrono::NaiveTime::MIN).and_utc()),
            created_before: Some(window.end.and_time(chrono::NaiveTime::MIN).and_utc()),
            ..Default::default()
        };

        let (top_ups, withdrawals) = tokio::try_join!(
            self.store.list_requests(RequestKind::TopUp, &filter),
            self.store.list_requests(RequestKind::Withdrawal, &filter)
        )?;

        tracing::debug!(
            "Cashflow {}..{}: {} top-ups, {} withdrawals",
            window.start,
            window.end,
            top_ups.len(),
            withdrawals.len()
        );

        Ok(aggregate(window, &top_ups, &withdrawals, query.group_by))
    }
}
