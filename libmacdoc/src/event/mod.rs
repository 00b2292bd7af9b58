//! The event contract between format parsers and downstream document
//! builders.
//!
//! Parsers emit a depth-first stream of open/close pairs plus leaf
//! insertions; a [`Sink`] receives them. Styling values are sticky: each
//! `open_*` call carries the properties captured at that point and they
//! hold until the next explicit change.

mod sink;

pub use sink::{Recorder, Sink, SinkError, SinkResult};

use crate::model::{Font, ListLevel, Paragraph, Section};
use libmactoolbox::quickdraw::pict::Op;
use libmactoolbox::quickdraw::Rect;

/// Break kinds a parser can insert between blocks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Break {
    Page,
    SoftPage,
    Column,
}

/// Computed field kinds.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldKind {
    PageNumber,
    PageCount,
    Date,
    Time,
    Title,
    SectionName,
    Bookmark(String),
    LinkTarget(String),
    FootnoteMarker,
    TocEntry,
}

/// A computed field with an optional format string (`%H:%M` and friends).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Field {
    pub kind: FieldKind,
    pub format: Option<String>,
}

impl Field {
    #[must_use]
    pub fn new(kind: FieldKind) -> Self {
        Self { kind, format: None }
    }

    #[must_use]
    pub fn with_format(kind: FieldKind, format: impl Into<String>) -> Self {
        Self { kind, format: Some(format.into()) }
    }
}

/// A vector or bitmap drawing handed to the sink.
#[derive(Clone, Debug, PartialEq)]
pub enum Graphic {
    /// A decoded QuickDraw operation, in picture coordinates.
    Shape(Op),
    /// Raw picture data with its frame, for sinks that re-decode.
    Picture { frame: Rect, data: Vec<u8> },
}

/// One record of the event stream, used by tests and by the recorder sink.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    StartDocument,
    EndDocument,
    Metadata { key: String, value: String },
    StartPage,
    EndPage,
    OpenSection(Section),
    CloseSection,
    OpenParagraph(Paragraph),
    CloseParagraph,
    OpenSpan(Font),
    CloseSpan,
    OpenLink { target: String },
    CloseLink,
    OpenFootnote,
    CloseFootnote,
    OpenListLevel(ListLevel),
    CloseListLevel,
    OpenListElement,
    CloseListElement,
    OpenTable { column_widths: Vec<f64> },
    CloseTable,
    OpenTableRow,
    CloseTableRow,
    OpenTableCell,
    CloseTableCell,
    OpenTextBox,
    CloseTextBox,
    StartGroup,
    EndGroup,
    InsertChar(char),
    InsertTab,
    InsertBreak(Break),
    InsertField(Field),
    Draw(Graphic),
}

/// The nesting containers of the grammar.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Container {
    Document,
    Page,
    Section,
    Paragraph,
    Span,
    Link,
    Footnote,
    ListLevel,
    ListElement,
    Table,
    TableRow,
    TableCell,
    TextBox,
    Group,
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("{found:?} is not allowed inside {inside:?}")]
    Misplaced { found: &'static str, inside: Option<Container> },
    #[error("close of {closed:?} but {open:?} is open")]
    Mismatched { closed: Container, open: Option<Container> },
    #[error("{0:?} left open at end of stream")]
    LeftOpen(Container),
    #[error("event after EndDocument")]
    TrailingEvent,
    #[error("empty event stream")]
    Empty,
}

/// Containers that hold block content (paragraphs, tables, lists, …).
fn is_block_container(container: Container) -> bool {
    matches!(
        container,
        Container::Section
            | Container::ListElement
            | Container::TableCell
            | Container::Footnote
            | Container::TextBox
    )
}

/// Checks that an event stream is a well-formed derivation of the document
/// grammar: one document, every `Open*` matched by exactly one `Close*`,
/// and each event inside a container that may hold it.
#[allow(clippy::too_many_lines)]
pub fn well_formed(events: &[Event]) -> Result<(), GrammarError> {
    use Container as C;

    if events.is_empty() {
        return Err(GrammarError::Empty);
    }

    let mut stack: Vec<Container> = Vec::new();
    let mut ended = false;

    let misplaced = |name: &'static str, stack: &[Container]| GrammarError::Misplaced {
        found: name,
        inside: stack.last().copied(),
    };

    for event in events {
        if ended {
            return Err(GrammarError::TrailingEvent);
        }
        let top = stack.last().copied();
        match event {
            Event::StartDocument => {
                if top.is_some() {
                    return Err(misplaced("StartDocument", &stack));
                }
                stack.push(C::Document);
            },
            Event::EndDocument => {
                pop(&mut stack, C::Document)?;
                ended = true;
            },
            Event::Metadata { .. } => {
                if top != Some(C::Document) {
                    return Err(misplaced("Metadata", &stack));
                }
            },
            Event::StartPage => {
                if top != Some(C::Document) {
                    return Err(misplaced("StartPage", &stack));
                }
                stack.push(C::Page);
            },
            Event::EndPage => pop(&mut stack, C::Page)?,
            Event::OpenSection(_) => {
                if top != Some(C::Page) {
                    return Err(misplaced("OpenSection", &stack));
                }
                stack.push(C::Section);
            },
            Event::CloseSection => pop(&mut stack, C::Section)?,
            Event::OpenParagraph(_) => {
                if !top.map_or(false, is_block_container) {
                    return Err(misplaced("OpenParagraph", &stack));
                }
                stack.push(C::Paragraph);
            },
            Event::CloseParagraph => pop(&mut stack, C::Paragraph)?,
            Event::OpenSpan(_) => {
                if !matches!(top, Some(C::Paragraph) | Some(C::Link)) {
                    return Err(misplaced("OpenSpan", &stack));
                }
                stack.push(C::Span);
            },
            Event::CloseSpan => pop(&mut stack, C::Span)?,
            Event::OpenLink { .. } => {
                if top != Some(C::Paragraph) {
                    return Err(misplaced("OpenLink", &stack));
                }
                stack.push(C::Link);
            },
            Event::CloseLink => pop(&mut stack, C::Link)?,
            Event::OpenFootnote => {
                if top != Some(C::Paragraph) {
                    return Err(misplaced("OpenFootnote", &stack));
                }
                stack.push(C::Footnote);
            },
            Event::CloseFootnote => pop(&mut stack, C::Footnote)?,
            Event::OpenListLevel(_) => {
                if !top.map_or(false, is_block_container) {
                    return Err(misplaced("OpenListLevel", &stack));
                }
                stack.push(C::ListLevel);
            },
            Event::CloseListLevel => pop(&mut stack, C::ListLevel)?,
            Event::OpenListElement => {
                if top != Some(C::ListLevel) {
                    return Err(misplaced("OpenListElement", &stack));
                }
                stack.push(C::ListElement);
            },
            Event::CloseListElement => pop(&mut stack, C::ListElement)?,
            Event::OpenTable { .. } => {
                if !top.map_or(false, is_block_container) {
                    return Err(misplaced("OpenTable", &stack));
                }
                stack.push(C::Table);
            },
            Event::CloseTable => pop(&mut stack, C::Table)?,
            Event::OpenTableRow => {
                if top != Some(C::Table) {
                    return Err(misplaced("OpenTableRow", &stack));
                }
                stack.push(C::TableRow);
            },
            Event::CloseTableRow => pop(&mut stack, C::TableRow)?,
            Event::OpenTableCell => {
                if top != Some(C::TableRow) {
                    return Err(misplaced("OpenTableCell", &stack));
                }
                stack.push(C::TableCell);
            },
            Event::CloseTableCell => pop(&mut stack, C::TableCell)?,
            Event::OpenTextBox => {
                if !matches!(top, Some(C::Section) | Some(C::Paragraph)) {
                    return Err(misplaced("OpenTextBox", &stack));
                }
                stack.push(C::TextBox);
            },
            Event::CloseTextBox => pop(&mut stack, C::TextBox)?,
            Event::StartGroup => {
                if !matches!(top, Some(C::Section) | Some(C::Group)) {
                    return Err(misplaced("StartGroup", &stack));
                }
                stack.push(C::Group);
            },
            Event::EndGroup => pop(&mut stack, C::Group)?,
            Event::InsertChar(_) | Event::InsertTab => {
                if !matches!(top, Some(C::Span) | Some(C::Link)) {
                    return Err(misplaced("InsertChar", &stack));
                }
            },
            Event::InsertField(_) => {
                if !matches!(top, Some(C::Paragraph) | Some(C::Span) | Some(C::Link)) {
                    return Err(misplaced("InsertField", &stack));
                }
            },
            Event::InsertBreak(_) => {
                if !matches!(top, Some(C::Page) | Some(C::Section) | Some(C::Paragraph)) {
                    return Err(misplaced("InsertBreak", &stack));
                }
            },
            Event::Draw(_) => {
                if !matches!(top, Some(C::Section) | Some(C::Group) | Some(C::Paragraph)) {
                    return Err(misplaced("Draw", &stack));
                }
            },
        }
    }

    if let Some(&open) = stack.last() {
        return Err(GrammarError::LeftOpen(open));
    }
    if !ended {
        return Err(GrammarError::Empty);
    }
    Ok(())
}

fn pop(stack: &mut Vec<Container>, closed: Container) -> Result<(), GrammarError> {
    match stack.pop() {
        Some(open) if open == closed => Ok(()),
        Some(open) => Err(GrammarError::Mismatched { closed, open: Some(open) }),
        None => Err(GrammarError::Mismatched { closed, open: None }),
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Font, Paragraph, Section};
    use super::*;

    fn paragraph_events() -> Vec<Event> {
        vec![
            Event::StartDocument,
            Event::StartPage,
            Event::OpenSection(Section::default()),
            Event::OpenParagraph(Paragraph::default()),
            Event::OpenSpan(Font::default()),
            Event::InsertChar('a'),
            Event::CloseSpan,
            Event::CloseParagraph,
            Event::CloseSection,
            Event::EndPage,
            Event::EndDocument,
        ]
    }

    #[test]
    fn simple_paragraph_is_well_formed() {
        assert!(well_formed(&paragraph_events()).is_ok());
    }

    #[test]
    fn unclosed_section_fails() {
        let mut events = paragraph_events();
        // drop CloseSection; the later closes then mismatch
        events.remove(8);
        assert!(well_formed(&events).is_err());
    }

    #[test]
    fn char_outside_a_span_fails() {
        let events = vec![
            Event::StartDocument,
            Event::StartPage,
            Event::OpenSection(Section::default()),
            Event::OpenParagraph(Paragraph::default()),
            Event::InsertChar('a'),
        ];
        assert!(matches!(
            well_formed(&events),
            Err(GrammarError::Misplaced { found: "InsertChar", .. })
        ));
    }

    #[test]
    fn events_after_end_document_fail() {
        let mut events = paragraph_events();
        events.push(Event::StartPage);
        assert!(matches!(well_formed(&events), Err(GrammarError::TrailingEvent)));
    }

    #[test]
    fn tables_nest_rows_and_cells() {
        let events = vec![
            Event::StartDocument,
            Event::StartPage,
            Event::OpenSection(Section::default()),
            Event::OpenTable { column_widths: vec![72.0, 72.0] },
            Event::OpenTableRow,
            Event::OpenTableCell,
            Event::OpenParagraph(Paragraph::default()),
            Event::CloseParagraph,
            Event::CloseTableCell,
            Event::CloseTableRow,
            Event::CloseTable,
            Event::CloseSection,
            Event::EndPage,
            Event::EndDocument,
        ];
        assert!(well_formed(&events).is_ok());

        let bad = vec![
            Event::StartDocument,
            Event::StartPage,
            Event::OpenSection(Section::default()),
            Event::OpenTable { column_widths: Vec::new() },
            Event::OpenTableCell,
        ];
        assert!(well_formed(&bad).is_err());
    }
}
