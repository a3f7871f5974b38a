use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A billed (or billable) subscription of an account to a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    #[serde(default)]
    pub description: String,
    pub registered_on: NaiveDate,
    #[serde(default)]
    pub billed_until: Option<NaiveDate>,
    #[serde(default)]
    pub cancelled_on: Option<NaiveDate>,
}

impl Order {
    pub fn new(id: u64, registered_on: NaiveDate) -> Self {
        Self {
            id,
            description: String::new(),
            registered_on,
            billed_until: None,
            cancelled_on: None,
        }
    }

    pub fn billed_until(mut self, date: NaiveDate) -> Self {
        self.billed_until = Some(date);
        self
    }

    pub fn cancelled_on(mut self, date: NaiveDate) -> Self {
        self.cancelled_on = Some(date);
        self
    }

    /// Active on `date` when `registered_on <= date < billed_until`.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        match self.billed_until {
            Some(bu) => self.registered_on <= date && date < bu,
            None => false,
        }
    }

    /// Prepaid time after cancellation: `cancelled_on < billed_until`.
    pub fn is_compensable(&self) -> bool {
        matches!((self.cancelled_on, self.billed_until), (Some(c), Some(bu)) if c < bu)
    }
}

/// Billed orders first (latest `billed_until` first, then earliest
/// `registered_on`), unbilled orders after (earliest `registered_on` first).
/// Ties are broken by id so the ordering is total.
pub fn cmp_billed_until_or_registered_on(a: &Order, b: &Order) -> Ordering {
    match (a.billed_until, b.billed_until) {
        (Some(abu), Some(bbu)) => bbu
            .cmp(&abu)
            .then(a.registered_on.cmp(&b.registered_on))
            .then(a.id.cmp(&b.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.registered_on.cmp(&b.registered_on).then(a.id.cmp(&b.id)),
    }
}

pub fn sort_billed_until_or_registered_on(orders: &mut [Order]) {
    orders.sort_by(cmp_billed_until_or_registered_on);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingPeriod {
    Monthly,
    Annual,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingPoint {
    OnRegister,
    FixedDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStyle {
    Prepay,
    Postpay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnCancel {
    Nothing,
    Discount,
    Compensate,
    Refund,
}

/// Billing policy of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub billing_period: BillingPeriod,
    pub billing_point: BillingPoint,
    #[serde(default = "default_payment_style")]
    pub payment_style: PaymentStyle,
    #[serde(default = "default_on_cancel")]
    pub on_cancel: OnCancel,
}

fn default_payment_style() -> PaymentStyle {
    PaymentStyle::Prepay
}

fn default_on_cancel() -> OnCancel {
    OnCancel::Discount
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2014, 7, 1).unwrap() + Duration::days(n)
    }

    #[test]
    fn test_sort_billed_until_or_registered_on() {
        let order = Order::new(1, day(0)).billed_until(day(200));
        let order1 = Order::new(2, day(5)).billed_until(day(200));
        let order2 = Order::new(3, day(6)).billed_until(day(200));
        let order3 = Order::new(4, day(6)).billed_until(day(201));
        let order4 = Order::new(5, day(6));
        let order5 = Order::new(6, day(7));
        let order6 = Order::new(7, day(8));

        let expected = vec![
            order3.clone(),
            order.clone(),
            order1.clone(),
            order2.clone(),
            order4.clone(),
            order5.clone(),
            order6.clone(),
        ];
        let mut orders = vec![order6, order2, order, order4, order1, order5, order3];
        sort_billed_until_or_registered_on(&mut orders);

        assert_eq!(orders, expected);
    }

    #[test]
    fn test_is_compensable() {
        assert!(Order::new(1, day(0)).billed_until(day(200)).cancelled_on(day(100)).is_compensable());
        assert!(!Order::new(2, day(0)).billed_until(day(200)).cancelled_on(day(200)).is_compensable());
        assert!(!Order::new(3, day(0)).cancelled_on(day(10)).is_compensable());
    }
}
