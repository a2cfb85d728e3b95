/// Musical duration represented as a rational fraction of a whole note
/// (one 4/4 measure). Loop intervals are built from these so the two voices
/// never drift apart through floating point accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Duration {
    /// Numerator: how many parts
    pub numerator: u32,
    /// Denominator: of what size (4 = quarter, 8 = eighth, etc.)
    pub denominator: u32,
}

impl Duration {
    /// One full 4/4 measure ("1m")
    pub const MEASURE: Duration = Duration {
        numerator: 1,
        denominator: 1,
    };
    pub const QUARTER: Duration = Duration {
        numerator: 1,
        denominator: 4,
    };
    pub const SIXTEENTH: Duration = Duration {
        numerator: 1,
        denominator: 16,
    };

    /// Quarter-note beats in one measure
    pub const BEATS_PER_MEASURE: u32 = 4;

    /// A whole number of measures
    pub const fn measures(count: u32) -> Self {
        Duration {
            numerator: count,
            denominator: 1,
        }
    }

    /// Divide this duration by the ratio `num / den`.
    ///
    /// `Duration::MEASURE.div_ratio(3, 4)` is "1m / (3/4)" = 4/3 of a measure.
    pub const fn div_ratio(self, num: u32, den: u32) -> Self {
        Duration {
            numerator: self.numerator * den,
            denominator: self.denominator * num,
        }
        .reduce()
    }

    /// Reduce the fraction to lowest terms using GCD
    pub const fn reduce(self) -> Self {
        let gcd = const_gcd(self.numerator, self.denominator);
        if gcd == 0 {
            return self;
        }
        Duration {
            numerator: self.numerator / gcd,
            denominator: self.denominator / gcd,
        }
    }

    /// Length in quarter-note beats (the transport's BPM unit)
    pub fn to_beats(&self) -> f64 {
        (self.numerator as f64 * Self::BEATS_PER_MEASURE as f64) / self.denominator as f64
    }

    /// Length in seconds at the given transport rate
    pub fn to_seconds(&self, bpm: f64) -> f64 {
        self.to_beats() * 60.0 / bpm
    }
}

impl std::fmt::Display for Duration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}m", self.numerator)
        } else {
            write!(f, "{}/{}m", self.numerator, self.denominator)
        }
    }
}

/// Compute greatest common divisor (Euclidean algorithm)
const fn const_gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let temp = b;
        b = a % b;
        a = temp;
    }
    a
}
