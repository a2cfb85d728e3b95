/// A value that glides linearly from `from` to `to` between two context
/// times and holds its end points outside that window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    from: f64,
    to: f64,
    start: f64,
    end: f64,
}

impl Ramp {
    pub fn constant(value: f64) -> Self {
        Self {
            from: value,
            to: value,
            start: 0.0,
            end: 0.0,
        }
    }

    /// Glide from the value at `now` to `target` over `over` seconds
    pub fn ramp_to(&mut self, now: f64, target: f64, over: f64) {
        let current = self.value_at(now);
        *self = Self {
            from: current,
            to: target,
            start: now,
            end: now + over.max(0.0),
        };
    }

    pub fn set(&mut self, value: f64) {
        *self = Self::constant(value);
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    /// Context time at which the value reaches its target
    pub fn end_time(&self) -> f64 {
        self.end
    }

    pub fn value_at(&self, t: f64) -> f64 {
        if t <= self.start {
            self.from
        } else if t >= self.end {
            self.to
        } else {
            let frac = (t - self.start) / (self.end - self.start);
            self.from + (self.to - self.from) * frac
        }
    }

    /// Area under the curve between `t0` and `t1`.
    ///
    /// Piecewise linear, so the trapezoid rule over the break points is exact.
    pub fn integrate(&self, t0: f64, t1: f64) -> f64 {
        if t1 <= t0 {
            return 0.0;
        }
        let mut points = [t0, self.start.clamp(t0, t1), self.end.clamp(t0, t1), t1];
        points.sort_by(|a, b| a.total_cmp(b));
        points
            .windows(2)
            .map(|w| (w[1] - w[0]) * (self.value_at(w[0]) + self.value_at(w[1])) * 0.5)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant() {
        let ramp = Ramp::constant(480.0);
        assert_relative_eq!(ramp.value_at(12.0), 480.0);
        assert_relative_eq!(ramp.integrate(1.0, 3.0), 960.0);
    }

    #[test]
    fn test_ramp_values() {
        let mut ramp = Ramp::constant(100.0);
        ramp.ramp_to(1.0, 200.0, 2.0);
        assert_relative_eq!(ramp.value_at(0.5), 100.0);
        assert_relative_eq!(ramp.value_at(2.0), 150.0);
        assert_relative_eq!(ramp.value_at(5.0), 200.0);
        assert_relative_eq!(ramp.end_time(), 3.0);
    }

    #[test]
    fn test_retarget_mid_ramp_starts_from_current_value() {
        let mut ramp = Ramp::constant(0.0);
        ramp.ramp_to(0.0, 10.0, 1.0);
        ramp.ramp_to(0.5, 0.0, 1.0);
        assert_relative_eq!(ramp.value_at(0.5), 5.0);
        assert_relative_eq!(ramp.value_at(1.5), 0.0);
    }

    #[test]
    fn test_integral_across_ramp() {
        let mut ramp = Ramp::constant(100.0);
        ramp.ramp_to(1.0, 200.0, 2.0);
        // 1s at 100, 2s averaging 150, 1s at 200
        assert_relative_eq!(ramp.integrate(0.0, 4.0), 100.0 + 300.0 + 200.0);
        assert_relative_eq!(ramp.integrate(2.0, 3.0), 175.0);
    }
}
