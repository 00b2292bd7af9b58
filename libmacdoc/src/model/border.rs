use smart_default::SmartDefault;
use super::Color;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BorderStyle {
    None,
    Single,
    Dot,
    LargeDot,
    Dash,
    Double,
}

/// A border line. Serialisation skips the border entirely when the style
/// is `None`, so an unset border and a missing one compare equal through
/// `is_empty`.
#[derive(Clone, Copy, Debug, PartialEq, SmartDefault)]
pub struct Border {
    #[default(BorderStyle::Single)]
    pub style: BorderStyle,
    /// Line width in points.
    #[default(1.0)]
    pub width: f64,
    #[default(Color::BLACK)]
    pub color: Color,
}

impl Border {
    #[must_use]
    pub fn none() -> Self {
        Self { style: BorderStyle::None, ..Self::default() }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.style == BorderStyle::None || self.width <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_a_plain_line() {
        let border = Border::default();
        assert_eq!(border.style, BorderStyle::Single);
        assert!(!border.is_empty());
        assert!(Border::none().is_empty());
    }
}
