use crate::domain::billing::Order;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sub-interval of a billing window together with the orders active on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub ini: NaiveDate,
    pub end: NaiveDate,
    pub orders: Vec<u64>,
}

impl Chunk {
    pub fn new(ini: NaiveDate, end: NaiveDate, orders: Vec<u64>) -> Self {
        Self { ini, end, orders }
    }
}

/// Splits `[ini, end)` at every `registered_on` / `billed_until` that falls
/// inside it. Orders keep their input order within a chunk; orders without a
/// `billed_until` are not billed yet and never count as active.
pub fn get_chunks(orders: &[Order], ini: NaiveDate, end: NaiveDate) -> Vec<Chunk> {
    if ini >= end {
        return Vec::new();
    }

    let mut points = vec![ini, end];
    for order in orders {
        if let Some(bu) = order.billed_until {
            for point in [order.registered_on, bu] {
                if point > ini && point < end {
                    points.push(point);
                }
            }
        }
    }
    points.sort();
    points.dedup();

    points
        .windows(2)
        .map(|window| {
            let (start, stop) = (window[0], window[1]);
            let active = orders
                .iter()
                .filter(|order| order.is_active_on(start))
                .map(|order| order.id)
                .collect();
            Chunk::new(start, stop, active)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2014, 7, 1).unwrap() + Duration::days(n)
    }

    #[test]
    fn test_empty_window() {
        assert!(get_chunks(&[], day(5), day(5)).is_empty());
        assert_eq!(get_chunks(&[], day(0), day(5)), vec![Chunk::new(day(0), day(5), vec![])]);
    }

    #[test]
    fn test_orders_outside_window_are_ignored() {
        let before = Order::new(1, day(-780)).billed_until(day(-700));
        let after = Order::new(2, day(700)).billed_until(day(780));
        let chunks = get_chunks(&[before, after], day(0), day(365));
        assert_eq!(chunks, vec![Chunk::new(day(0), day(365), vec![])]);
    }
}
