use crate::domain::billing::{BillingPeriod, BillingPoint, OnCancel, Order, PaymentStyle, Service};
use chrono::{Datelike, Months, NaiveDate};

#[derive(Debug, Clone, Copy)]
pub struct BillingPointOptions {
    /// Reference date of the billing run.
    pub billing_point: NaiveDate,
    /// Use `billing_point` as is instead of aligning it to the service period.
    pub fixed_point: bool,
    /// Month of the year annual fixed-date services are billed on.
    pub annual_billing_month: u32,
}

impl BillingPointOptions {
    pub fn new(billing_point: NaiveDate) -> Self {
        Self {
            billing_point,
            fixed_point: false,
            annual_billing_month: 1,
        }
    }

    pub fn fixed(mut self) -> Self {
        self.fixed_point = true;
        self
    }

    pub fn annual_billing_month(mut self, month: u32) -> Self {
        self.annual_billing_month = month;
        self
    }
}

/// Day `day` of the given month, clamped to the last day of the month.
fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .unwrap_or(first);
    NaiveDate::from_ymd_opt(year, month, day.min(last.day())).unwrap_or(last)
}

impl Service {
    /// Date up to which `order` gets billed in a run started at `options.billing_point`.
    pub fn billing_point(&self, order: &Order, options: &BillingPointOptions) -> NaiveDate {
        let reference = options.billing_point;
        let bp = if options.fixed_point {
            reference
        } else {
            match self.billing_period {
                BillingPeriod::Monthly => {
                    let date = match self.payment_style {
                        PaymentStyle::Prepay => reference
                            .checked_add_months(Months::new(1))
                            .unwrap_or(reference),
                        PaymentStyle::Postpay => reference,
                    };
                    let day = match self.billing_point {
                        BillingPoint::OnRegister => order.registered_on.day(),
                        BillingPoint::FixedDate => 1,
                    };
                    clamped_date(date.year(), date.month(), day)
                }
                BillingPeriod::Annual => {
                    let (month, day) = match self.billing_point {
                        BillingPoint::OnRegister => (order.registered_on.month(), order.registered_on.day()),
                        BillingPoint::FixedDate => (options.annual_billing_month, 1),
                    };
                    let mut year = reference.year();
                    if reference.month() >= month {
                        year += 1;
                    }
                    if self.payment_style == PaymentStyle::Postpay {
                        year -= 1;
                    }
                    clamped_date(year, month, day)
                }
                BillingPeriod::Never => order.registered_on,
            }
        };

        match order.cancelled_on {
            Some(cancelled) if self.on_cancel != OnCancel::Nothing && cancelled < bp => cancelled,
            _ => bp,
        }
    }
}
