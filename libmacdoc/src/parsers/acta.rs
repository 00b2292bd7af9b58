//! Acta outline decoder.
//!
//! An Acta document is a flat run of topic records. Each topic carries its
//! outline depth, a content kind (text or picture), a font, then the
//! content zone; version 3 appends a character-style table and a small
//! trailer to every topic. The outline depths drive the list model.

use crate::event::{Graphic, Sink};
use crate::fonts::FontConverter;
use crate::input::InputFile;
use crate::model::{
    Font, FontFlags, List, ListId, ListLevel, NumberingType, Paragraph, Section, UnderlineStyle,
    MAX_LIST_LEVELS,
};
use crate::parser::{Emitter, Entry, ParseError, Parser, Result, SubDocId, SubDocKind, SubDocQueue};
use libcommon::{InputStream, Reader};
use libmactoolbox::quickdraw::pict::{Picture, PictureCheck};
use std::io::SeekFrom;

/// Bytes of a topic record before its content zone.
const TOPIC_HEADER_LEN: u64 = 18;

/// Bytes of one version 3 character-style entry.
const PLC_ENTRY_LEN: u64 = 20;

type Stream = InputStream<Box<dyn Reader>>;

#[derive(Clone, Copy, Debug)]
enum TopicKind {
    Text,
    Picture,
}

#[derive(Debug)]
struct TopicHeader {
    depth: usize,
    kind: TopicKind,
    font: Font,
}

#[derive(Debug)]
struct CharPlc {
    position: u32,
    font: Font,
}

pub struct ActaParser {
    input: InputFile,
    version: i32,
    list: List,
    fonts: FontConverter,
    rsrc_zones: Vec<Entry>,
    sub_docs: SubDocQueue,
    queued: Vec<SubDocId>,
}

impl ActaParser {
    #[must_use]
    pub fn new(input: InputFile) -> Self {
        let mut list = List::new(ListId(1));
        for depth in 1..=MAX_LIST_LEVELS {
            list.set_level(depth, ListLevel {
                numbering: NumberingType::Decimal,
                suffix: ".".to_string(),
                label_width: 18.0,
                label_indent: (depth as f64 - 1.0) * 18.0,
                ..ListLevel::default()
            });
        }
        Self {
            input,
            version: -1,
            list,
            fonts: FontConverter::new(),
            rsrc_zones: Vec::new(),
            sub_docs: SubDocQueue::new(),
            queued: Vec::new(),
        }
    }

    fn text_start(&self) -> u64 {
        if self.version >= 3 { 2 } else { 0 }
    }

    /// Reads a topic header. `None` when the bytes at the cursor are not a
    /// topic, with the cursor restored.
    fn read_topic_header(&self, stream: &mut Stream) -> Result<Option<TopicHeader>> {
        let pos = stream.tell();
        let needed = pos + TOPIC_HEADER_LEN + 4 + if self.version >= 3 { 4 } else { 0 };
        if !stream.check_pos(needed) {
            return Ok(None);
        }

        let depth = stream.read_i16()?;
        let kind = stream.read_i16()?;
        if depth <= 0 || !(1..=2).contains(&kind) {
            stream.seek(SeekFrom::Start(pos))?;
            return Ok(None);
        }
        let _flag = stream.read_u16()?; // bit 0x100 marks the current topic
        let font = Self::read_font(stream, false)?;
        // six counters and the hidden count follow; nothing downstream
        // consumes them
        stream.seek(SeekFrom::Start(pos + TOPIC_HEADER_LEN))?;

        let mut font = font;
        font.name = self.fonts.name(font.id).map(str::to_string);
        Ok(Some(TopicHeader {
            depth: (depth as usize).min(MAX_LIST_LEVELS),
            kind: if kind == 2 { TopicKind::Picture } else { TopicKind::Text },
            font,
        }))
    }

    /// Reads a 6-byte font record. The two style bytes swap order between
    /// the topic header and the version 3 character table.
    fn read_font(stream: &mut Stream, in_plc: bool) -> Result<Font> {
        let id = stream.read_i16()?;
        let first = stream.read_u8()?;
        let second = stream.read_u8()?;
        let style = if in_plc { first } else { second };
        let size = stream.read_i16()?;

        let mut font = Font::new(i32::from(id), f64::from(size));
        if style & 0x1 != 0 {
            font.flags |= FontFlags::BOLD;
        }
        if style & 0x2 != 0 {
            font.flags |= FontFlags::ITALIC;
        }
        if style & 0x4 != 0 {
            font.underline = UnderlineStyle::Single;
        }
        if style & 0x8 != 0 {
            font.flags |= FontFlags::EMBOSS;
        }
        if style & 0x10 != 0 {
            font.flags |= FontFlags::SHADOW;
        }
        Ok(font)
    }

    /// Resource-fork zones: print info, window position, header/footer
    /// properties and the option block. Recorded before emission so that
    /// later passes can consume them.
    fn create_zones(&mut self) {
        let fork = match self.input.resource_fork() {
            Some(fork) => fork,
            None => return,
        };
        let mut queued = Vec::new();
        for os_type in &[b"PSET", b"WSIZ", b"QHDR", b"QOPT", b"LABL"] {
            for item in fork.entries(*os_type) {
                let mut entry = Entry::new(
                    String::from_utf8_lossy(&os_type[..]).into_owned(),
                    0,
                    fork.load(item).map(|data| data.len() as u64).unwrap_or(0),
                );
                entry.kind = Some(item.os_type);
                entry.id = i32::from(item.id);
                // header/footer properties become deferred sub-documents,
                // resolved when the page opens
                if *os_type == b"QHDR" {
                    let kind = if item.id % 2 == 0 { SubDocKind::Header } else { SubDocKind::Footer };
                    queued.push(self.sub_docs.push(kind, entry.clone()));
                }
                self.rsrc_zones.push(entry);
            }
        }
        self.queued = queued;
    }

    fn send_document(&mut self, emitter: &mut Emitter<'_>) -> Result<()> {
        emitter.start_document()?;
        if !self.input.name().is_empty() {
            let title = self.input.name().to_string();
            emitter.metadata("title", &title)?;
        }
        emitter.start_page()?;
        self.send_header_footer();
        emitter.open_section(&Section::default())?;
        self.send_main_text(emitter)?;
        emitter.close_section()?;
        emitter.end_page()?;
        emitter.end_document()?;
        Ok(())
    }

    /// Resolves the queued header/footer sub-documents once the page is
    /// open. The property blocks hold no flowing text, so consuming them
    /// only marks the zones as parsed.
    fn send_header_footer(&mut self) {
        for id in std::mem::take(&mut self.queued) {
            if let Some(sub_doc) = self.sub_docs.take(id) {
                for zone in &mut self.rsrc_zones {
                    if zone.kind == sub_doc.entry.kind && zone.id == sub_doc.entry.id {
                        zone.parsed = true;
                    }
                }
            }
        }
    }

    fn send_main_text(&mut self, emitter: &mut Emitter<'_>) -> Result<()> {
        let mut stream = self.input.data_stream()?;
        stream.seek(SeekFrom::Start(self.text_start()))?;

        let mut open_depth = 0;
        while !stream.at_eof() {
            if !self.send_topic(&mut stream, emitter, &mut open_depth)? {
                break;
            }
        }
        while open_depth > 0 {
            emitter.close_list_element()?;
            emitter.close_list_level()?;
            open_depth -= 1;
        }

        // a single zero word terminates the topic run
        let pos = stream.tell();
        let terminator = stream.read_i16().unwrap_or(0);
        if terminator != 0 || (self.version < 3 && !stream.at_eof()) {
            stream.log().add_pos(pos);
            stream.log().add_note("Entries(Loose):###");
        }
        Ok(())
    }

    /// Opens and closes list levels until the cursor sits inside a fresh
    /// list element at `depth`.
    fn adjust_depth(&mut self, emitter: &mut Emitter<'_>, open_depth: &mut usize, depth: usize) -> Result<()> {
        while *open_depth > depth {
            emitter.close_list_element()?;
            emitter.close_list_level()?;
            *open_depth -= 1;
        }
        if *open_depth == depth && depth > 0 {
            emitter.close_list_element()?;
            emitter.open_list_element()?;
            self.list.next_value(depth);
            return Ok(());
        }
        while *open_depth < depth {
            let next = *open_depth + 1;
            let level = self.list.level(next).cloned().unwrap_or_default();
            emitter.open_list_level(&level)?;
            self.list.open_level(next);
            emitter.open_list_element()?;
            self.list.next_value(next);
            *open_depth = next;
        }
        Ok(())
    }

    fn send_topic(
        &mut self,
        stream: &mut Stream,
        emitter: &mut Emitter<'_>,
        open_depth: &mut usize,
    ) -> Result<bool> {
        let header = match self.read_topic_header(stream)? {
            Some(header) => header,
            None => return Ok(false),
        };

        self.adjust_depth(emitter, open_depth, header.depth)?;

        let mut paragraph = Paragraph::default();
        paragraph.list_level = header.depth as u8;
        paragraph.list_id = Some(self.list.id());

        let sent = match header.kind {
            TopicKind::Text => self.send_text(stream, emitter, &paragraph, &header.font)?,
            TopicKind::Picture => self.send_picture(stream, emitter, &paragraph)?,
        };
        if !sent {
            return Ok(false);
        }

        if self.version >= 3 {
            // a six-byte trailer of zeros follows every topic
            let pos = stream.tell();
            let size = u64::from(stream.read_u32()?);
            if !stream.check_pos(pos + 4 + size) {
                stream.seek(SeekFrom::Start(pos))?;
                return Ok(false);
            }
            stream.seek(SeekFrom::Start(pos + 4 + size))?;
        }

        Ok(true)
    }

    fn send_text(
        &mut self,
        stream: &mut Stream,
        emitter: &mut Emitter<'_>,
        paragraph: &Paragraph,
        topic_font: &Font,
    ) -> Result<bool> {
        let pos = stream.tell();
        let size = u64::from(stream.read_u32()?);
        let mut end = pos + 4 + size;
        if !stream.check_pos(end) {
            stream.seek(SeekFrom::Start(pos))?;
            return Ok(false);
        }

        let mut plcs: Vec<CharPlc> = Vec::new();
        if self.version >= 3 {
            stream.seek(SeekFrom::Start(end))?;
            let table_size = u64::from(stream.read_u32()?);
            let count = if table_size == 0 { 0 } else { u64::from(stream.read_u16()?) };
            if table_size != 0
                && (2 + count * PLC_ENTRY_LEN != table_size || !stream.check_pos(end + 4 + table_size))
            {
                stream.seek(SeekFrom::Start(pos))?;
                return Ok(false);
            }
            for _ in 0..count {
                let entry_pos = stream.tell();
                let position = stream.read_u32()?;
                let _height = stream.read_i16()?;
                let _baseline = stream.read_i16()?;
                let mut font = Self::read_font(stream, true)?;
                font.name = self.fonts.name(font.id).map(str::to_string);
                stream.seek(SeekFrom::Start(entry_pos + PLC_ENTRY_LEN))?;
                plcs.push(CharPlc { position, font });
            }
            plcs.sort_by_key(|plc| plc.position);
            end += 4 + table_size;
        }

        stream.seek(SeekFrom::Start(pos + 4))?;
        let text = stream.read_bytes(size as usize)?;

        let mut font = if plcs.is_empty() {
            topic_font.clone()
        } else {
            plcs[0].font.clone()
        };
        let mut next_plc = 0;
        let mut span_open = false;

        emitter.open_paragraph(paragraph)?;
        for (offset, &byte) in text.iter().enumerate() {
            while next_plc < plcs.len() && plcs[next_plc].position as usize <= offset {
                if span_open {
                    emitter.close_span()?;
                    span_open = false;
                }
                font = plcs[next_plc].font.clone();
                next_plc += 1;
            }
            match byte {
                b'\r' => {
                    if span_open {
                        emitter.close_span()?;
                        span_open = false;
                    }
                    emitter.close_paragraph()?;
                    emitter.open_paragraph(paragraph)?;
                },
                b'\t' => {
                    if !span_open {
                        emitter.open_span(&font)?;
                        span_open = true;
                    }
                    emitter.insert_tab()?;
                },
                byte => {
                    if !span_open {
                        emitter.open_span(&font)?;
                        span_open = true;
                    }
                    if let Some(ch) = self.fonts.unicode(font.id, byte) {
                        emitter.insert_char(ch)?;
                    }
                },
            }
        }
        if span_open {
            emitter.close_span()?;
        }
        emitter.close_paragraph()?;

        stream.seek(SeekFrom::Start(end))?;
        Ok(true)
    }

    fn send_picture(
        &mut self,
        stream: &mut Stream,
        emitter: &mut Emitter<'_>,
        paragraph: &Paragraph,
    ) -> Result<bool> {
        let pos = stream.tell();
        let size = u64::from(stream.read_u32()?);
        if !stream.check_pos(pos + 4 + size) {
            stream.seek(SeekFrom::Start(pos))?;
            return Ok(false);
        }

        let mut picture = stream.sub_stream(pos + 4, pos + 4 + size)?;
        match Picture::check(&mut picture, size) {
            PictureCheck::Ok { .. } | PictureCheck::OkEmpty { .. } => {
                picture.seek(SeekFrom::Start(0))?;
                if let Ok(decoded) = Picture::parse(&mut picture) {
                    picture.seek(SeekFrom::Start(0))?;
                    let data = picture.read_bytes(size as usize)?;
                    emitter.open_paragraph(paragraph)?;
                    emitter.draw(&Graphic::Picture { frame: decoded.frame, data })?;
                    emitter.close_paragraph()?;
                }
            },
            PictureCheck::Bad => {
                // an undecodable picture zone is skipped, not fatal
                stream.log().add_pos(pos);
                stream.log().add_note("Entries(Graphic):###");
            },
        }

        stream.seek(SeekFrom::Start(pos + 4 + size))?;
        Ok(true)
    }

    /// Structure-only walk of one topic, for the strict header check.
    fn skip_topic(&self, stream: &mut Stream) -> Result<bool> {
        let header = match self.read_topic_header(stream)? {
            Some(header) => header,
            None => return Ok(false),
        };

        // the content zone, then for version 3 the character table of a
        // text topic and the trailer
        let mut zones = 1;
        if self.version >= 3 {
            zones += match header.kind {
                TopicKind::Text => 2,
                TopicKind::Picture => 1,
            };
        }
        for _ in 0..zones {
            let pos = stream.tell();
            let size = u64::from(stream.read_u32()?);
            if !stream.check_pos(pos + 4 + size) {
                return Ok(false);
            }
            stream.seek(SeekFrom::Start(pos + 4 + size))?;
        }
        Ok(true)
    }
}

impl Parser for ActaParser {
    fn version(&self) -> i32 {
        self.version
    }

    fn check_header(&mut self, strict: bool) -> Result<bool> {
        let mut stream = self.input.data_stream()?;

        self.version = -1;
        for &(version, start) in &[(1_i32, 0_u64), (3, 2)] {
            if !stream.check_pos(start + TOPIC_HEADER_LEN + 4) {
                continue;
            }
            stream.seek(SeekFrom::Start(start))?;
            let depth = stream.read_i16().unwrap_or(-1);
            let kind = stream.read_i16().unwrap_or(-1);
            if depth >= 1 && (1..=2).contains(&kind) {
                self.version = version;
                break;
            }
        }
        if self.version < 0 {
            return Ok(false);
        }

        if strict {
            stream.seek(SeekFrom::Start(self.text_start()))?;
            let mut topics = 0;
            while !stream.at_eof() {
                if !self.skip_topic(&mut stream)? {
                    break;
                }
                topics += 1;
            }
            if topics == 0 {
                return Ok(false);
            }
            let terminator = stream.read_i16().unwrap_or(-1);
            if terminator != 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn parse(&mut self, sink: &mut dyn Sink) -> Result<()> {
        if !self.check_header(false)? {
            return Err(ParseError::FormatMismatch);
        }
        self.create_zones();

        let mut emitter = Emitter::new(sink);
        match self.send_document(&mut emitter) {
            Ok(()) => Ok(()),
            Err(error) => {
                emitter.close_all()?;
                Err(error)
            },
        }
    }
}
