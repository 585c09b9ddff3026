use crate::error::{MonitorError, Result};
use crate::utils::constants::DISPLAY_SCALE;
use rust_decimal::{Decimal, RoundingStrategy};

/// Round half-up to two places and pin the scale, so `10` renders as `10.00`.
pub fn round_half_up(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(DISPLAY_SCALE);
    rounded
}

/// Running sum/count/min/max over decimal values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accumulator {
    sum: Decimal,
    count: usize,
    min: Option<Decimal>,
    max: Option<Decimal>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails when the running sum leaves the `Decimal` range; the
    /// accumulator is left unchanged in that case.
    pub fn push(&mut self, value: Decimal) -> Result<()> {
        self.sum = self.sum.checked_add(value).ok_or_else(|| {
            MonitorError::InvalidInput(format!(
                "Sum of {} values plus {} exceeds the decimal range",
                self.count, value
            ))
        })?;
        self.count += 1;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
        Ok(())
    }

    pub fn try_from_values<I: IntoIterator<Item = Decimal>>(values: I) -> Result<Self> {
        let mut acc = Accumulator::new();
        for value in values {
            acc.push(value)?;
        }
        Ok(acc)
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Exact arithmetic mean, `None` when nothing was pushed.
    pub fn mean(&self) -> Option<Decimal> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / Decimal::from(self.count as u64))
        }
    }

    pub fn min(&self) -> Option<Decimal> {
        self.min
    }

    pub fn max(&self) -> Option<Decimal> {
        self.max
    }
}
