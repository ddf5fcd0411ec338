//! Update-rate limiting on simulation time.

/// Clock drift tolerated when comparing elapsed time against the period.
const TIME_EPSILON: f64 = 1e-9;

/// Decides whether enough simulation time has passed for another update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateThrottle {
    /// Seconds between updates; 0 means every call is due.
    period: f64,
    last_update: Option<f64>,
}

impl UpdateThrottle {
    /// Throttle to `frequency` updates per second. A non-positive frequency
    /// disables throttling.
    pub fn new(frequency: f64) -> Self {
        let period = if frequency > 0.0 && frequency.is_finite() {
            1.0 / frequency
        } else {
            0.0
        };
        Self {
            period,
            last_update: None,
        }
    }

    /// Seconds between updates.
    pub fn period(&self) -> f64 {
        self.period
    }

    /// Returns `true` and records `sim_time` when an update is due.
    ///
    /// The first call is always due. A clock that jumps backwards (simulation
    /// restart) resynchronises on the new time.
    pub fn is_due(&mut self, sim_time: f64) -> bool {
        let due = match self.last_update {
            None => true,
            Some(last) if sim_time < last => true,
            Some(last) => sim_time - last + TIME_EPSILON >= self.period,
        };
        if due {
            self.last_update = Some(sim_time);
        }
        due
    }

    /// Forget the last update time.
    pub fn clear(&mut self) {
        self.last_update = None;
    }
}
