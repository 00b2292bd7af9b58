//! The contract every format decoder satisfies, plus the shared plumbing:
//! zone entries, the balanced emitter, the sub-document queue and the
//! parser registry.

use crate::event::{Break, Container, Field, Graphic, Sink, SinkError};
use crate::input::{self, InputFile};
use crate::model::{Font, ListLevel, Paragraph, Section};
use crate::probe::FileKind;
use libcommon::StreamError;
use libmactoolbox::quickdraw;
use libmactoolbox::resources;
use libmactoolbox::OsType;
use slab::Slab;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The header sniff failed; the caller should try another parser.
    #[error("format mismatch")]
    FormatMismatch,
    #[error("truncated input: {0}")]
    Truncated(#[from] StreamError),
    #[error("invalid structure: {0}")]
    InvalidStructure(&'static str),
    #[error("unknown record {0:#x}")]
    UnknownRecord(u32),
    #[error("missing resource {0} {1}")]
    ResourceMissing(OsType, i16),
    #[error("resource error: {0}")]
    Resource(#[from] resources::Error),
    #[error("picture error: {0}")]
    Pict(#[from] quickdraw::Error),
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
    #[error("input error: {0}")]
    Input(#[from] input::Error),
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// A discovered zone: a half-open byte range of some stream, typed and
/// named by its discoverer and consumed exactly once.
#[derive(Clone, Debug)]
pub struct Entry {
    pub begin: u64,
    pub end: u64,
    pub kind: Option<OsType>,
    pub id: i32,
    pub name: String,
    pub parsed: bool,
}

impl Entry {
    #[must_use]
    pub fn new(name: impl Into<String>, begin: u64, end: u64) -> Self {
        Self {
            begin,
            end,
            kind: None,
            id: 0,
            name: name.into(),
            parsed: false,
        }
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.begin)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.begin
    }

    /// The zone invariant: `0 <= begin <= end <= stream length`.
    #[must_use]
    pub fn valid(&self, stream_len: u64) -> bool {
        self.begin <= self.end && self.end <= stream_len
    }
}

/// The two entry points every format decoder provides.
///
/// `check_header` inspects the header without side effects on the
/// document; `strict` pays for deeper validation when several parsers
/// compete for a file. `parse` runs zone discovery and then emits the
/// whole document, leaving the sink well nested even on failure.
pub trait Parser {
    /// The format-specific dialect number.
    fn version(&self) -> i32;

    fn check_header(&mut self, strict: bool) -> Result<bool>;

    fn parse(&mut self, sink: &mut dyn Sink) -> Result<()>;
}

/// Sub-document kinds a parser can queue for deferred emission.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubDocKind {
    Header,
    Footer,
    Footnote,
    TextBox,
}

/// An opaque sub-document handle, chosen by the parser.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SubDocId(usize);

#[derive(Clone, Debug)]
pub struct SubDoc {
    pub kind: SubDocKind,
    pub entry: Entry,
}

/// Queued sub-documents (headers, footers, footnote bodies, text boxes).
///
/// The parser enqueues a zone when it discovers it and pulls it by id when
/// an ordinary event references it, so bodies are emitted lazily and only
/// once.
#[derive(Debug, Default)]
pub struct SubDocQueue {
    slab: Slab<SubDoc>,
}

impl SubDocQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: SubDocKind, entry: Entry) -> SubDocId {
        SubDocId(self.slab.insert(SubDoc { kind, entry }))
    }

    #[must_use]
    pub fn get(&self, id: SubDocId) -> Option<&SubDoc> {
        self.slab.get(id.0)
    }

    /// Removes and returns a queued sub-document; each id resolves once.
    pub fn take(&mut self, id: SubDocId) -> Option<SubDoc> {
        if self.slab.contains(id.0) {
            Some(self.slab.remove(id.0))
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slab.is_empty()
    }
}

/// A sink wrapper that tracks open containers so a parser can close
/// everything it opened before propagating an error.
pub struct Emitter<'a> {
    sink: &'a mut dyn Sink,
    open: Vec<Container>,
}

impl<'a> Emitter<'a> {
    pub fn new(sink: &'a mut dyn Sink) -> Self {
        Self { sink, open: Vec::new() }
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    pub fn start_document(&mut self) -> Result<()> {
        self.sink.start_document()?;
        self.open.push(Container::Document);
        Ok(())
    }

    pub fn end_document(&mut self) -> Result<()> {
        self.sink.end_document()?;
        self.pop(Container::Document);
        Ok(())
    }

    pub fn metadata(&mut self, key: &str, value: &str) -> Result<()> {
        Ok(self.sink.metadata(key, value)?)
    }

    pub fn start_page(&mut self) -> Result<()> {
        self.sink.start_page()?;
        self.open.push(Container::Page);
        Ok(())
    }

    pub fn end_page(&mut self) -> Result<()> {
        self.sink.end_page()?;
        self.pop(Container::Page);
        Ok(())
    }

    pub fn open_section(&mut self, section: &Section) -> Result<()> {
        self.sink.open_section(section)?;
        self.open.push(Container::Section);
        Ok(())
    }

    pub fn close_section(&mut self) -> Result<()> {
        self.sink.close_section()?;
        self.pop(Container::Section);
        Ok(())
    }

    pub fn open_paragraph(&mut self, paragraph: &Paragraph) -> Result<()> {
        self.sink.open_paragraph(paragraph)?;
        self.open.push(Container::Paragraph);
        Ok(())
    }

    pub fn close_paragraph(&mut self) -> Result<()> {
        self.sink.close_paragraph()?;
        self.pop(Container::Paragraph);
        Ok(())
    }

    pub fn open_span(&mut self, font: &Font) -> Result<()> {
        self.sink.open_span(font)?;
        self.open.push(Container::Span);
        Ok(())
    }

    pub fn close_span(&mut self) -> Result<()> {
        self.sink.close_span()?;
        self.pop(Container::Span);
        Ok(())
    }

    pub fn open_link(&mut self, target: &str) -> Result<()> {
        self.sink.open_link(target)?;
        self.open.push(Container::Link);
        Ok(())
    }

    pub fn close_link(&mut self) -> Result<()> {
        self.sink.close_link()?;
        self.pop(Container::Link);
        Ok(())
    }

    pub fn open_footnote(&mut self) -> Result<()> {
        self.sink.open_footnote()?;
        self.open.push(Container::Footnote);
        Ok(())
    }

    pub fn close_footnote(&mut self) -> Result<()> {
        self.sink.close_footnote()?;
        self.pop(Container::Footnote);
        Ok(())
    }

    pub fn open_list_level(&mut self, level: &ListLevel) -> Result<()> {
        self.sink.open_list_level(level)?;
        self.open.push(Container::ListLevel);
        Ok(())
    }

    pub fn close_list_level(&mut self) -> Result<()> {
        self.sink.close_list_level()?;
        self.pop(Container::ListLevel);
        Ok(())
    }

    pub fn open_list_element(&mut self) -> Result<()> {
        self.sink.open_list_element()?;
        self.open.push(Container::ListElement);
        Ok(())
    }

    pub fn close_list_element(&mut self) -> Result<()> {
        self.sink.close_list_element()?;
        self.pop(Container::ListElement);
        Ok(())
    }

    pub fn open_table(&mut self, column_widths: &[f64]) -> Result<()> {
        self.sink.open_table(column_widths)?;
        self.open.push(Container::Table);
        Ok(())
    }

    pub fn close_table(&mut self) -> Result<()> {
        self.sink.close_table()?;
        self.pop(Container::Table);
        Ok(())
    }

    pub fn open_table_row(&mut self) -> Result<()> {
        self.sink.open_table_row()?;
        self.open.push(Container::TableRow);
        Ok(())
    }

    pub fn close_table_row(&mut self) -> Result<()> {
        self.sink.close_table_row()?;
        self.pop(Container::TableRow);
        Ok(())
    }

    pub fn open_table_cell(&mut self) -> Result<()> {
        self.sink.open_table_cell()?;
        self.open.push(Container::TableCell);
        Ok(())
    }

    pub fn close_table_cell(&mut self) -> Result<()> {
        self.sink.close_table_cell()?;
        self.pop(Container::TableCell);
        Ok(())
    }

    pub fn open_text_box(&mut self) -> Result<()> {
        self.sink.open_text_box()?;
        self.open.push(Container::TextBox);
        Ok(())
    }

    pub fn close_text_box(&mut self) -> Result<()> {
        self.sink.close_text_box()?;
        self.pop(Container::TextBox);
        Ok(())
    }

    pub fn start_group(&mut self) -> Result<()> {
        self.sink.start_group()?;
        self.open.push(Container::Group);
        Ok(())
    }

    pub fn end_group(&mut self) -> Result<()> {
        self.sink.end_group()?;
        self.pop(Container::Group);
        Ok(())
    }

    pub fn insert_char(&mut self, ch: char) -> Result<()> {
        Ok(self.sink.insert_char(ch)?)
    }

    pub fn insert_tab(&mut self) -> Result<()> {
        Ok(self.sink.insert_tab()?)
    }

    pub fn insert_break(&mut self, kind: Break) -> Result<()> {
        Ok(self.sink.insert_break(kind)?)
    }

    pub fn insert_field(&mut self, field: &Field) -> Result<()> {
        Ok(self.sink.insert_field(field)?)
    }

    pub fn draw(&mut self, graphic: &Graphic) -> Result<()> {
        Ok(self.sink.draw(graphic)?)
    }

    /// Closes every container still open, deepest first. Used on the error
    /// path so a failed parse still leaves the sink balanced.
    pub fn close_all(&mut self) -> Result<()> {
        while let Some(container) = self.open.pop() {
            match container {
                Container::Document => self.sink.end_document()?,
                Container::Page => self.sink.end_page()?,
                Container::Section => self.sink.close_section()?,
                Container::Paragraph => self.sink.close_paragraph()?,
                Container::Span => self.sink.close_span()?,
                Container::Link => self.sink.close_link()?,
                Container::Footnote => self.sink.close_footnote()?,
                Container::ListLevel => self.sink.close_list_level()?,
                Container::ListElement => self.sink.close_list_element()?,
                Container::Table => self.sink.close_table()?,
                Container::TableRow => self.sink.close_table_row()?,
                Container::TableCell => self.sink.close_table_cell()?,
                Container::TextBox => self.sink.close_text_box()?,
                Container::Group => self.sink.end_group()?,
            }
        }
        Ok(())
    }

    fn pop(&mut self, expected: Container) {
        let popped = self.open.pop();
        debug_assert_eq!(popped, Some(expected), "unbalanced emitter use");
    }
}

/// Constructs the parser registered for a probe tag.
pub fn parser_for(kind: FileKind, input: InputFile) -> Option<Box<dyn Parser>> {
    REGISTRY
        .iter()
        .find(|(registered, _)| *registered == kind)
        .map(|(_, factory)| factory(input))
}

type ParserFactory = fn(InputFile) -> Box<dyn Parser>;

fn make_simple_text(input: InputFile) -> Box<dyn Parser> {
    Box::new(crate::parsers::SimpleTextParser::new(input))
}

fn make_acta(input: InputFile) -> Box<dyn Parser> {
    Box::new(crate::parsers::ActaParser::new(input))
}

/// The static table of format constructors, keyed by probe tag.
pub static REGISTRY: &[(FileKind, ParserFactory)] = &[
    (FileKind::TeachText, make_simple_text),
    (FileKind::Text, make_simple_text),
    (FileKind::Acta, make_acta),
];

#[cfg(test)]
mod tests {
    use crate::event::{well_formed, Recorder};
    use crate::model::{Paragraph, Section};
    use super::*;

    #[test]
    fn close_all_balances_an_aborted_parse() {
        let mut recorder = Recorder::new();
        {
            let mut emitter = Emitter::new(&mut recorder);
            emitter.start_document().unwrap();
            emitter.start_page().unwrap();
            emitter.open_section(&Section::default()).unwrap();
            emitter.open_paragraph(&Paragraph::default()).unwrap();
            // simulate a zone error here
            emitter.close_all().unwrap();
            assert_eq!(emitter.depth(), 0);
        }
        assert!(well_formed(recorder.events()).is_ok());
    }

    #[test]
    fn sub_documents_resolve_once() {
        let mut queue = SubDocQueue::new();
        let id = queue.push(SubDocKind::Footnote, Entry::new("note", 0x100, 0x200));
        assert_eq!(queue.get(id).unwrap().entry.len(), 0x100);
        assert!(queue.take(id).is_some());
        assert!(queue.take(id).is_none());
    }

    #[test]
    fn entry_ranges_validate_against_the_stream() {
        let entry = Entry::new("zone", 0x10, 0x20);
        assert!(entry.valid(0x20));
        assert!(entry.valid(0x100));
        assert!(!entry.valid(0x1f));
        assert!(!Entry::new("bad", 0x20, 0x10).valid(0x100));
    }

    #[test]
    fn registry_finds_parsers_by_tag() {
        assert!(REGISTRY.iter().any(|(kind, _)| *kind == FileKind::Acta));
        assert!(REGISTRY.iter().any(|(kind, _)| *kind == FileKind::TeachText));
    }
}
