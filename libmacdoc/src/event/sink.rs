use crate::model::{Font, ListLevel, Paragraph, Section};
use super::{Break, Event, Field, Graphic};

#[derive(Debug, thiserror::Error)]
#[error("sink rejected event: {0}")]
pub struct SinkError(pub String);

pub type SinkResult = Result<(), SinkError>;

/// The capability set the engine emits against.
///
/// Every method has a no-op default so a sink only implements what it
/// consumes. Each `open_*` is matched by exactly one `close_*`; a sink may
/// rely on well-nested calls even when a parser aborts on a corrupt zone.
#[allow(unused_variables)]
pub trait Sink {
    fn start_document(&mut self) -> SinkResult { Ok(()) }
    fn end_document(&mut self) -> SinkResult { Ok(()) }
    fn metadata(&mut self, key: &str, value: &str) -> SinkResult { Ok(()) }

    fn start_page(&mut self) -> SinkResult { Ok(()) }
    fn end_page(&mut self) -> SinkResult { Ok(()) }

    fn open_section(&mut self, section: &Section) -> SinkResult { Ok(()) }
    fn close_section(&mut self) -> SinkResult { Ok(()) }

    fn open_paragraph(&mut self, paragraph: &Paragraph) -> SinkResult { Ok(()) }
    fn close_paragraph(&mut self) -> SinkResult { Ok(()) }

    fn open_span(&mut self, font: &Font) -> SinkResult { Ok(()) }
    fn close_span(&mut self) -> SinkResult { Ok(()) }

    fn open_link(&mut self, target: &str) -> SinkResult { Ok(()) }
    fn close_link(&mut self) -> SinkResult { Ok(()) }

    fn open_footnote(&mut self) -> SinkResult { Ok(()) }
    fn close_footnote(&mut self) -> SinkResult { Ok(()) }

    fn open_list_level(&mut self, level: &ListLevel) -> SinkResult { Ok(()) }
    fn close_list_level(&mut self) -> SinkResult { Ok(()) }
    fn open_list_element(&mut self) -> SinkResult { Ok(()) }
    fn close_list_element(&mut self) -> SinkResult { Ok(()) }

    fn open_table(&mut self, column_widths: &[f64]) -> SinkResult { Ok(()) }
    fn close_table(&mut self) -> SinkResult { Ok(()) }
    fn open_table_row(&mut self) -> SinkResult { Ok(()) }
    fn close_table_row(&mut self) -> SinkResult { Ok(()) }
    fn open_table_cell(&mut self) -> SinkResult { Ok(()) }
    fn close_table_cell(&mut self) -> SinkResult { Ok(()) }

    fn open_text_box(&mut self) -> SinkResult { Ok(()) }
    fn close_text_box(&mut self) -> SinkResult { Ok(()) }

    fn start_group(&mut self) -> SinkResult { Ok(()) }
    fn end_group(&mut self) -> SinkResult { Ok(()) }

    fn insert_char(&mut self, ch: char) -> SinkResult { Ok(()) }
    fn insert_tab(&mut self) -> SinkResult { Ok(()) }
    fn insert_break(&mut self, kind: Break) -> SinkResult { Ok(()) }
    fn insert_field(&mut self, field: &Field) -> SinkResult { Ok(()) }

    fn draw(&mut self, graphic: &Graphic) -> SinkResult { Ok(()) }
}

/// A sink that records every event, for tests and for the grammar checker.
#[derive(Debug, Default)]
pub struct Recorder {
    events: Vec<Event>,
}

impl Recorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    #[must_use]
    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    /// The document text, reassembled from the character events.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for event in &self.events {
            match event {
                Event::InsertChar(ch) => out.push(*ch),
                Event::InsertTab => out.push('\t'),
                Event::CloseParagraph => out.push('\n'),
                _ => {},
            }
        }
        out
    }

    fn push(&mut self, event: Event) -> SinkResult {
        self.events.push(event);
        Ok(())
    }
}

impl Sink for Recorder {
    fn start_document(&mut self) -> SinkResult { self.push(Event::StartDocument) }
    fn end_document(&mut self) -> SinkResult { self.push(Event::EndDocument) }
    fn metadata(&mut self, key: &str, value: &str) -> SinkResult {
        self.push(Event::Metadata { key: key.to_string(), value: value.to_string() })
    }

    fn start_page(&mut self) -> SinkResult { self.push(Event::StartPage) }
    fn end_page(&mut self) -> SinkResult { self.push(Event::EndPage) }

    fn open_section(&mut self, section: &Section) -> SinkResult {
        self.push(Event::OpenSection(section.clone()))
    }
    fn close_section(&mut self) -> SinkResult { self.push(Event::CloseSection) }

    fn open_paragraph(&mut self, paragraph: &Paragraph) -> SinkResult {
        self.push(Event::OpenParagraph(paragraph.clone()))
    }
    fn close_paragraph(&mut self) -> SinkResult { self.push(Event::CloseParagraph) }

    fn open_span(&mut self, font: &Font) -> SinkResult {
        self.push(Event::OpenSpan(font.clone()))
    }
    fn close_span(&mut self) -> SinkResult { self.push(Event::CloseSpan) }

    fn open_link(&mut self, target: &str) -> SinkResult {
        self.push(Event::OpenLink { target: target.to_string() })
    }
    fn close_link(&mut self) -> SinkResult { self.push(Event::CloseLink) }

    fn open_footnote(&mut self) -> SinkResult { self.push(Event::OpenFootnote) }
    fn close_footnote(&mut self) -> SinkResult { self.push(Event::CloseFootnote) }

    fn open_list_level(&mut self, level: &ListLevel) -> SinkResult {
        self.push(Event::OpenListLevel(level.clone()))
    }
    fn close_list_level(&mut self) -> SinkResult { self.push(Event::CloseListLevel) }
    fn open_list_element(&mut self) -> SinkResult { self.push(Event::OpenListElement) }
    fn close_list_element(&mut self) -> SinkResult { self.push(Event::CloseListElement) }

    fn open_table(&mut self, column_widths: &[f64]) -> SinkResult {
        self.push(Event::OpenTable { column_widths: column_widths.to_vec() })
    }
    fn close_table(&mut self) -> SinkResult { self.push(Event::CloseTable) }
    fn open_table_row(&mut self) -> SinkResult { self.push(Event::OpenTableRow) }
    fn close_table_row(&mut self) -> SinkResult { self.push(Event::CloseTableRow) }
    fn open_table_cell(&mut self) -> SinkResult { self.push(Event::OpenTableCell) }
    fn close_table_cell(&mut self) -> SinkResult { self.push(Event::CloseTableCell) }

    fn open_text_box(&mut self) -> SinkResult { self.push(Event::OpenTextBox) }
    fn close_text_box(&mut self) -> SinkResult { self.push(Event::CloseTextBox) }

    fn start_group(&mut self) -> SinkResult { self.push(Event::StartGroup) }
    fn end_group(&mut self) -> SinkResult { self.push(Event::EndGroup) }

    fn insert_char(&mut self, ch: char) -> SinkResult { self.push(Event::InsertChar(ch)) }
    fn insert_tab(&mut self) -> SinkResult { self.push(Event::InsertTab) }
    fn insert_break(&mut self, kind: Break) -> SinkResult { self.push(Event::InsertBreak(kind)) }
    fn insert_field(&mut self, field: &Field) -> SinkResult {
        self.push(Event::InsertField(field.clone()))
    }

    fn draw(&mut self, graphic: &Graphic) -> SinkResult {
        self.push(Event::Draw(graphic.clone()))
    }
}
