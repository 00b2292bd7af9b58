use smart_default::SmartDefault;
use super::{Border, Color, Length, Unit};

/// One text column of a section.
#[derive(Clone, Debug, PartialEq, SmartDefault)]
pub struct Column {
    pub width: f64,
    #[default(Unit::Point)]
    pub width_unit: Unit,
    /// Gutter margins: left, right, top, bottom.
    pub margins: [f64; 4],
}

/// A section: the column layout of a page span.
#[derive(Clone, Debug, PartialEq, SmartDefault)]
pub struct Section {
    pub width: Option<Length>,
    pub columns: Vec<Column>,
    #[default(Border::none())]
    pub column_separator: Border,
    pub balance_text: bool,
    pub background: Option<Color>,
}

impl Section {
    /// Lays out `num` equal columns of `width`, separated by `separator`
    /// points of gutter. A single column with no gutter needs no column
    /// records at all.
    pub fn set_columns(&mut self, num: usize, width: f64, width_unit: Unit, separator: f64) {
        self.columns.clear();
        let num = if num > 1 && width <= 0.0 { 1 } else { num.max(1) };
        if num == 1 && (width <= 0.0 || separator <= 0.0) {
            return;
        }

        let mut column = Column { width, width_unit, ..Column::default() };
        column.margins[0] = separator / 2.0;
        column.margins[1] = separator / 2.0;
        self.columns = vec![column; num];
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len().max(1)
    }

    /// Checks the column invariant: the columns must fit inside the
    /// section width, comparing in the section's unit.
    #[must_use]
    pub fn columns_fit(&self) -> bool {
        let width = match self.width.and_then(Length::in_points) {
            Some(width) => width,
            None => return true,
        };
        let mut total = 0.0;
        for column in &self.columns {
            match Length::new(column.width, column.width_unit).in_points() {
                Some(points) => total += points,
                None => return true,
            }
        }
        total <= width + 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_columns_share_the_gutter() {
        let mut section = Section::default();
        section.set_columns(2, 216.0, Unit::Point, 18.0);
        assert_eq!(section.num_columns(), 2);
        assert_eq!(section.columns[0].margins[0], 9.0);
        assert_eq!(section.columns[1].margins[1], 9.0);
    }

    #[test]
    fn single_default_column_is_implicit() {
        let mut section = Section::default();
        section.set_columns(1, 0.0, Unit::Point, 0.0);
        assert!(section.columns.is_empty());
        assert_eq!(section.num_columns(), 1);
    }

    #[test]
    fn column_widths_must_fit() {
        let mut section = Section {
            width: Some(Length::new(6.0, Unit::Inch)),
            ..Section::default()
        };
        section.set_columns(2, 3.0 * 72.0, Unit::Point, 10.0);
        assert!(section.columns_fit());

        section.set_columns(2, 4.0 * 72.0, Unit::Point, 10.0);
        assert!(!section.columns_fit());
    }
}
