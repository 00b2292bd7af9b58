use smart_default::SmartDefault;
use super::{Border, Color, Length, ListId, Unit};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Justification {
    Left,
    Right,
    Center,
    Full,
    FullAllLines,
    Decimal,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TabAlignment {
    Left,
    Right,
    Center,
    Decimal,
    Bar,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TabStop {
    pub position: Length,
    pub alignment: TabAlignment,
    pub leader: Option<char>,
}

impl TabStop {
    #[must_use]
    pub fn new(position: Length, alignment: TabAlignment) -> Self {
        Self { position, alignment, leader: None }
    }
}

/// Border edge indices for [`Paragraph::borders`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Edge {
    Left = 0,
    Right = 1,
    Top = 2,
    Bottom = 3,
}

/// A paragraph style.
#[derive(Clone, Debug, PartialEq, SmartDefault)]
pub struct Paragraph {
    pub margin_left: Length,
    pub margin_right: Length,
    /// Indent of the first line, relative to the left margin.
    pub first_indent: Length,
    pub spacing_before: Length,
    pub spacing_after: Length,
    /// Interline value; a percentage of the font height or an absolute
    /// length.
    #[default(Length::new(100.0, Unit::Percent))]
    pub line_spacing: Length,
    #[default(Justification::Left)]
    pub justification: Justification,
    tabs: Vec<TabStop>,
    pub borders: [Option<Border>; 4],
    pub background: Option<Color>,
    /// 1-based list depth; zero means the paragraph is not in a list.
    pub list_level: u8,
    pub list_id: Option<ListId>,
    pub keep_with_next: bool,
    pub keep_together: bool,
    pub page_break_before: bool,
}

impl Paragraph {
    /// The tab stops, in strictly increasing position order.
    #[must_use]
    pub fn tabs(&self) -> &[TabStop] {
        &self.tabs
    }

    /// Inserts a tab stop, keeping positions sorted. A tab at an existing
    /// position replaces it: the last inserted alignment wins.
    pub fn add_tab(&mut self, tab: TabStop) {
        let position = tab.position.in_points().unwrap_or(tab.position.value);
        match self.tabs.binary_search_by(|probe| {
            let probe = probe.position.in_points().unwrap_or(probe.position.value);
            probe.partial_cmp(&position).expect("tab positions are finite")
        }) {
            Ok(index) => self.tabs[index] = tab,
            Err(index) => self.tabs.insert(index, tab),
        }
    }

    pub fn clear_tabs(&mut self) {
        self.tabs.clear();
    }

    pub fn set_border(&mut self, edge: Edge, border: Border) {
        self.borders[edge as usize] = if border.is_empty() { None } else { Some(border) };
    }

    #[must_use]
    pub fn border(&self, edge: Edge) -> Option<&Border> {
        self.borders[edge as usize].as_ref()
    }

    #[must_use]
    pub fn in_list(&self) -> bool {
        self.list_level > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_stay_sorted() {
        let mut para = Paragraph::default();
        para.add_tab(TabStop::new(Length::points(72.0), TabAlignment::Left));
        para.add_tab(TabStop::new(Length::points(36.0), TabAlignment::Right));
        para.add_tab(TabStop::new(Length::points(144.0), TabAlignment::Decimal));

        let positions: Vec<f64> = para.tabs().iter().map(|tab| tab.position.value).collect();
        assert_eq!(positions, [36.0, 72.0, 144.0]);
    }

    #[test]
    fn duplicate_tab_position_keeps_the_last_alignment() {
        let mut para = Paragraph::default();
        para.add_tab(TabStop::new(Length::points(72.0), TabAlignment::Left));
        para.add_tab(TabStop::new(Length::points(72.0), TabAlignment::Center));
        assert_eq!(para.tabs().len(), 1);
        assert_eq!(para.tabs()[0].alignment, TabAlignment::Center);
    }

    #[test]
    fn mixed_units_sort_by_absolute_position() {
        let mut para = Paragraph::default();
        para.add_tab(TabStop::new(Length::new(1.0, Unit::Inch), TabAlignment::Left));
        para.add_tab(TabStop::new(Length::points(36.0), TabAlignment::Left));
        assert_eq!(para.tabs()[0].position.value, 36.0);
    }

    #[test]
    fn empty_borders_are_elided() {
        let mut para = Paragraph::default();
        para.set_border(Edge::Top, Border::default());
        para.set_border(Edge::Bottom, Border::none());
        assert!(para.border(Edge::Top).is_some());
        assert!(para.border(Edge::Bottom).is_none());
    }
}
