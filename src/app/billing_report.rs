use crate::config::{OrchestraConfig, OrderBook};
use crate::core::billing_point::BillingPointOptions;
use crate::core::chunks::{get_chunks, Chunk};
use crate::core::interval::{compensate, compensations_for, Compensation, Interval};
use crate::domain::billing::sort_billed_until_or_registered_on;
use crate::utils::error::{OrchestraError, Result};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct OrderBilling {
    pub order: u64,
    pub interval: Interval,
    pub compensation: Compensation,
}

#[derive(Debug, Serialize)]
pub struct BillingReport {
    pub service: String,
    pub from: NaiveDate,
    pub until: NaiveDate,
    pub chunks: Vec<Chunk>,
    pub orders: Vec<OrderBilling>,
}

/// Billing window, chunks and compensations of a service's orders.
pub fn billing_report(
    config: &OrchestraConfig,
    book: &OrderBook,
    service_name: &str,
    from: NaiveDate,
) -> Result<BillingReport> {
    let service = config.service(service_name)?;
    let options = BillingPointOptions::new(from).annual_billing_month(config.billing.annual_billing_month);

    let mut orders = book.orders.clone();
    sort_billed_until_or_registered_on(&mut orders);

    let until = orders
        .iter()
        .map(|order| service.billing_point(order, &options))
        .max()
        .ok_or_else(|| OrchestraError::BillingError {
            message: format!("no orders to bill for service '{}'", service_name),
        })?;

    let mut available = compensations_for(&orders);
    let mut billed = Vec::with_capacity(orders.len());
    for order in &orders {
        let ini = order.billed_until.unwrap_or(order.registered_on);
        let interval = Interval::for_order(ini, service.billing_point(order, &options), order.id);
        let compensation = compensate(interval, available);
        available = compensation.remaining.clone();
        billed.push(OrderBilling {
            order: order.id,
            interval,
            compensation,
        });
    }

    Ok(BillingReport {
        service: service.name.clone(),
        from,
        until,
        chunks: get_chunks(&orders, from, until),
        orders: billed,
    })
}
