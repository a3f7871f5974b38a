//! Day-granular intervals and compensation of cancelled, already billed time.

use crate::domain::billing::Order;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open `[ini, end)` interval, optionally owned by an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub ini: NaiveDate,
    pub end: NaiveDate,
    pub order: Option<u64>,
}

impl Interval {
    pub fn new(ini: NaiveDate, end: NaiveDate) -> Self {
        Self { ini, end, order: None }
    }

    pub fn for_order(ini: NaiveDate, end: NaiveDate, order: u64) -> Self {
        Self {
            ini,
            end,
            order: Some(order),
        }
    }

    /// Length in days, never negative.
    pub fn days(&self) -> i64 {
        (self.end - self.ini).num_days().max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.days() == 0
    }

    /// Parts of `self` not covered by `other`.
    pub fn subtract(&self, other: &Interval) -> Vec<Interval> {
        let mut remaining = Vec::new();
        if self.ini < other.ini {
            remaining.push(Interval {
                ini: self.ini,
                end: self.end.min(other.ini),
                order: self.order,
            });
        }
        if self.end > other.end {
            remaining.push(Interval {
                ini: self.ini.max(other.end),
                end: self.end,
                order: self.order,
            });
        }
        remaining.retain(|i| !i.is_empty());
        remaining
    }

    /// Overlap with `other`, keeping the owner of `self`.
    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        let result = Interval {
            ini: self.ini.max(other.ini),
            end: self.end.min(other.end),
            order: self.order,
        };
        if result.is_empty() {
            None
        } else {
            Some(result)
        }
    }

    fn overlap_days(&self, others: &[Interval]) -> i64 {
        others
            .iter()
            .filter_map(|other| self.intersect(other))
            .map(|i| i.days())
            .sum()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.ini, self.end)?;
        if let Some(order) = self.order {
            write!(f, " order {}", order)?;
        }
        Ok(())
    }
}

/// Outcome of compensating one billing interval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compensation {
    /// Parts of compensations consumed by the interval, owned by the cancelled order.
    pub applied: Vec<Interval>,
    /// Compensation time still available for other intervals.
    pub remaining: Vec<Interval>,
    /// Parts of the interval that still have to be billed.
    pub uncompensated: Vec<Interval>,
}

impl Compensation {
    pub fn applied_days(&self) -> i64 {
        self.applied.iter().map(Interval::days).sum()
    }
}

/// Prepaid time freed by cancellations: `[cancelled_on, billed_until)`.
pub fn compensations_for(orders: &[Order]) -> Vec<Interval> {
    orders
        .iter()
        .filter(|order| order.is_compensable())
        .filter_map(|order| match (order.cancelled_on, order.billed_until) {
            (Some(cancelled), Some(billed_until)) => {
                Some(Interval::for_order(cancelled, billed_until, order.id))
            }
            _ => None,
        })
        .collect()
}

/// Greedily covers `interval` with the compensations overlapping it the most.
pub fn compensate(interval: Interval, compensations: Vec<Interval>) -> Compensation {
    let mut pool = compensations;
    let mut result = Compensation {
        uncompensated: if interval.is_empty() { Vec::new() } else { vec![interval] },
        ..Compensation::default()
    };

    loop {
        let best = pool
            .iter()
            .enumerate()
            .map(|(ix, c)| (c.overlap_days(&result.uncompensated), ix))
            .filter(|(days, _)| *days > 0)
            // 重疊最多者優先, 相同時取最早加入者
            .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
        let Some((_, ix)) = best else {
            break;
        };
        let compensation = pool.remove(ix);

        let mut uncompensated = Vec::new();
        let mut unused = vec![compensation];
        for part in &result.uncompensated {
            if let Some(applied) = compensation.intersect(part) {
                result.applied.push(applied);
            }
            uncompensated.extend(part.subtract(&compensation));
            unused = unused.iter().flat_map(|u| u.subtract(part)).collect();
        }
        result.remaining.extend(unused);
        result.uncompensated = uncompensated;
    }

    result.remaining.extend(pool);
    result
}
