use std::fmt;

/// Measurement units. One inch is 72 points or 1440 twips; percent and
/// generic values have no absolute scale.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Unit {
    Point,
    Inch,
    Twip,
    Percent,
    Generic,
}

impl Unit {
    /// Points per unit, for the absolute units.
    #[must_use]
    pub fn points_per_unit(self) -> Option<f64> {
        match self {
            Unit::Point => Some(1.0),
            Unit::Inch => Some(72.0),
            Unit::Twip => Some(1.0 / 20.0),
            Unit::Percent | Unit::Generic => None,
        }
    }
}

/// A value with its unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Length {
    pub value: f64,
    pub unit: Unit,
}

impl Length {
    #[must_use]
    pub const fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    #[must_use]
    pub const fn points(value: f64) -> Self {
        Self::new(value, Unit::Point)
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self::points(0.0)
    }

    /// The value in points, when the unit is absolute.
    #[must_use]
    pub fn in_points(self) -> Option<f64> {
        Some(self.value * self.unit.points_per_unit()?)
    }

    /// Converts between absolute units.
    #[must_use]
    pub fn convert_to(self, unit: Unit) -> Option<Self> {
        let points = self.in_points()?;
        let scale = unit.points_per_unit()?;
        Some(Self::new(points / scale, unit))
    }
}

impl Default for Length {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            Unit::Point => write!(f, "{}pt", self.value),
            Unit::Inch => write!(f, "{}in", self.value),
            Unit::Twip => write!(f, "{}tw", self.value),
            Unit::Percent => write!(f, "{}%", self.value),
            Unit::Generic => write!(f, "{}", self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inch_point_twip_scale() {
        let one_inch = Length::new(1.0, Unit::Inch);
        assert_eq!(one_inch.in_points(), Some(72.0));
        assert_eq!(one_inch.convert_to(Unit::Twip), Some(Length::new(1440.0, Unit::Twip)));
        assert_eq!(Length::new(720.0, Unit::Twip).convert_to(Unit::Inch), Some(Length::new(0.5, Unit::Inch)));
    }

    #[test]
    fn relative_units_have_no_absolute_value() {
        assert_eq!(Length::new(50.0, Unit::Percent).in_points(), None);
        assert_eq!(Length::new(50.0, Unit::Generic).convert_to(Unit::Point), None);
    }
}
