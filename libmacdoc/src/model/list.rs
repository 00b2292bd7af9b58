use derive_more::Display;
use smart_default::SmartDefault;

/// Lists hold at most nine nested levels.
pub const MAX_LIST_LEVELS: usize = 9;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NumberingType {
    None,
    Bullet,
    Decimal,
    LowerAlpha,
    UpperAlpha,
    LowerRoman,
    UpperRoman,
}

/// One level of a list definition. Levels are 1-indexed; level zero means
/// "not in a list".
#[derive(Clone, Debug, PartialEq, SmartDefault)]
pub struct ListLevel {
    #[default(NumberingType::None)]
    pub numbering: NumberingType,
    pub bullet: String,
    pub prefix: String,
    pub suffix: String,
    #[default(1)]
    pub start_value: i32,
    /// Space before the label, in points.
    pub label_indent: f64,
    /// Minimum label width, in points.
    pub label_width: f64,
}

impl ListLevel {
    /// Formats the label for an item with the given ordinal value.
    #[must_use]
    pub fn label(&self, value: i32) -> String {
        let body = match self.numbering {
            NumberingType::None => String::new(),
            NumberingType::Bullet => {
                if self.bullet.is_empty() {
                    "*".to_string()
                } else {
                    self.bullet.clone()
                }
            },
            NumberingType::Decimal => value.to_string(),
            NumberingType::LowerAlpha => alpha_label(value, false),
            NumberingType::UpperAlpha => alpha_label(value, true),
            NumberingType::LowerRoman => roman_label(value).to_lowercase(),
            NumberingType::UpperRoman => roman_label(value),
        };
        format!("{}{}{}", self.prefix, body, self.suffix)
    }
}

fn alpha_label(value: i32, upper: bool) -> String {
    if value < 1 {
        return String::new();
    }
    let mut value = value as u32;
    let mut out = Vec::new();
    while value > 0 {
        value -= 1;
        let digit = (value % 26) as u8;
        out.push(if upper { b'A' + digit } else { b'a' + digit });
        value /= 26;
    }
    out.reverse();
    String::from_utf8(out).expect("ASCII labels")
}

fn roman_label(value: i32) -> String {
    if value < 1 {
        return String::new();
    }
    const NUMERALS: [(i32, &str); 13] = [
        (1000, "M"), (900, "CM"), (500, "D"), (400, "CD"),
        (100, "C"), (90, "XC"), (50, "L"), (40, "XL"),
        (10, "X"), (9, "IX"), (5, "V"), (4, "IV"), (1, "I"),
    ];
    let mut value = value;
    let mut out = String::new();
    for (weight, numeral) in &NUMERALS {
        while value >= *weight {
            out.push_str(numeral);
            value -= weight;
        }
    }
    out
}

/// A stable list identifier, unique within one parse.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[display(fmt = "list{}", _0)]
pub struct ListId(pub usize);

/// A list definition plus its per-level counters.
///
/// The level set is fixed once built; the counters mutate as the document
/// walks its items. A counter restarts at the level's start value when the
/// level is (re)opened, which also covers the containing level opening a
/// fresh sub-list.
#[derive(Clone, Debug)]
pub struct List {
    id: ListId,
    levels: Vec<ListLevel>,
    counters: Vec<i32>,
}

impl List {
    #[must_use]
    pub fn new(id: ListId) -> Self {
        Self {
            id,
            levels: vec![ListLevel::default(); MAX_LIST_LEVELS],
            counters: vec![0; MAX_LIST_LEVELS],
        }
    }

    #[must_use]
    pub fn id(&self) -> ListId {
        self.id
    }

    /// Defines a level. Levels are 1-indexed; out-of-range depths are
    /// rejected.
    pub fn set_level(&mut self, depth: usize, level: ListLevel) -> bool {
        if depth == 0 || depth > MAX_LIST_LEVELS {
            return false;
        }
        self.levels[depth - 1] = level;
        true
    }

    #[must_use]
    pub fn level(&self, depth: usize) -> Option<&ListLevel> {
        if depth == 0 {
            return None;
        }
        self.levels.get(depth - 1)
    }

    /// Restarts the counter of `depth` at its start value.
    pub fn open_level(&mut self, depth: usize) {
        if depth == 0 || depth > MAX_LIST_LEVELS {
            return;
        }
        let start = self.levels[depth - 1].start_value;
        self.counters[depth - 1] = start - 1;
    }

    /// Advances and returns the item counter of `depth`.
    pub fn next_value(&mut self, depth: usize) -> i32 {
        if depth == 0 || depth > MAX_LIST_LEVELS {
            return 0;
        }
        self.counters[depth - 1] += 1;
        self.counters[depth - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_restart_when_a_level_reopens() {
        let mut list = List::new(ListId(1));
        list.set_level(1, ListLevel { numbering: NumberingType::Decimal, ..ListLevel::default() });

        list.open_level(1);
        assert_eq!(list.next_value(1), 1);
        assert_eq!(list.next_value(1), 2);

        list.open_level(1);
        assert_eq!(list.next_value(1), 1);
    }

    #[test]
    fn start_value_offsets_the_counter() {
        let mut list = List::new(ListId(1));
        list.set_level(2, ListLevel {
            numbering: NumberingType::Decimal,
            start_value: 5,
            ..ListLevel::default()
        });
        list.open_level(2);
        assert_eq!(list.next_value(2), 5);
    }

    #[test]
    fn labels() {
        let decimal = ListLevel {
            numbering: NumberingType::Decimal,
            suffix: ".".to_string(),
            ..ListLevel::default()
        };
        assert_eq!(decimal.label(3), "3.");

        let alpha = ListLevel { numbering: NumberingType::LowerAlpha, ..ListLevel::default() };
        assert_eq!(alpha.label(1), "a");
        assert_eq!(alpha.label(27), "aa");

        let roman = ListLevel { numbering: NumberingType::UpperRoman, ..ListLevel::default() };
        assert_eq!(roman.label(14), "XIV");

        let bullet = ListLevel { numbering: NumberingType::Bullet, ..ListLevel::default() };
        assert_eq!(bullet.label(7), "*");
    }

    #[test]
    fn level_zero_is_not_a_list() {
        let mut list = List::new(ListId(1));
        assert!(list.level(0).is_none());
        assert!(!list.set_level(0, ListLevel::default()));
        assert!(!list.set_level(MAX_LIST_LEVELS + 1, ListLevel::default()));
    }
}
