//! Conversion of elapsed wall-clock time into a whole number of instructions.
//!
//! Ticks don't have to arrive at a fixed period: whatever fraction of an
//! instruction is left over after a tick is carried into the next one, so
//! the long-run rate converges to the requested one.

/// Instructions per second used when none is configured
pub const DEFAULT_RATE: f64 = 700.0;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Pacer {
    carry: f64,
}

impl Pacer {
    pub fn new() -> Self {
        Self { carry: 0.0 }
    }

    /// Number of instructions to run for a tick that lasted `elapsed_seconds`
    ///
    /// ```
    /// use ember8::pacer::Pacer;
    ///
    /// let mut pacer = Pacer::new();
    /// assert_eq!(pacer.instructions_for(0.0125, 100.0), 1);
    /// assert_eq!(pacer.instructions_for(0.0125, 100.0), 1);
    /// assert!((pacer.pending() - 0.5).abs() < 1e-9);
    /// ```
    pub fn instructions_for(&mut self, elapsed_seconds: f64, rate_per_second: f64) -> u32 {
        let budget = rate_per_second * elapsed_seconds;
        let budget = if budget.is_finite() && budget > 0.0 {
            budget + self.carry
        } else {
            self.carry
        };
        // budget is non-negative, truncation is floor
        let count = budget as u32;
        self.carry = budget - count as f64;
        if !(0.0..1.0).contains(&self.carry) {
            self.carry = 0.0;
        }
        count
    }

    /// Fraction of an instruction carried into the next tick
    pub fn pending(&self) -> f64 {
        self.carry
    }
}
