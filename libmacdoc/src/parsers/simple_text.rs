//! SimpleText/TeachText decoder.
//!
//! The data fork is the text; the optional `styl` 128 resource carries the
//! style runs. A `styl`-less file is plain text in the system font.

use crate::event::{Break, Sink};
use crate::fonts::FontConverter;
use crate::input::InputFile;
use crate::model::{Font, FontFlags, Paragraph, Section, UnderlineStyle};
use crate::parser::{Emitter, Entry, ParseError, Parser, Result};
use libmactoolbox::quickdraw::Color;
use std::io::SeekFrom;

const STYL_RUN_SIZE: u64 = 20;

#[derive(Clone, Debug)]
struct StyleRun {
    start: u32,
    font: Font,
}

pub struct SimpleTextParser {
    input: InputFile,
    main: Option<Entry>,
    runs: Vec<StyleRun>,
    fonts: FontConverter,
}

impl SimpleTextParser {
    #[must_use]
    pub fn new(input: InputFile) -> Self {
        Self { input, main: None, runs: Vec::new(), fonts: FontConverter::new() }
    }

    fn create_zones(&mut self) -> Result<()> {
        let len = self.input.data().length();
        let mut main = Entry::new("text", 0, len);
        main.parsed = true;
        self.main = Some(main);

        // the style zone comes from the resource fork, when there is one
        if let Some(fork) = self.input.resource_fork() {
            if let Some(item) = fork.entry(b"styl", 128) {
                match fork.stream(item) {
                    Ok(mut stream) => {
                        if let Ok(mut runs) = Self::read_styles(&mut stream) {
                            for run in &mut runs {
                                run.font.name = self.fonts.name(run.font.id).map(str::to_string);
                            }
                            self.runs = runs;
                        }
                    },
                    Err(_) => {
                        // a corrupt style resource degrades to plain text
                    },
                }
            }
        }
        Ok(())
    }

    fn read_styles<T: std::io::Read + std::io::Seek>(
        stream: &mut libcommon::InputStream<T>,
    ) -> Result<Vec<StyleRun>> {
        let count = u64::from(stream.read_u16()?);
        if !stream.check_pos(2 + count * STYL_RUN_SIZE) {
            return Err(ParseError::InvalidStructure("style run count"));
        }

        let mut runs = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let start = stream.read_i32()?;
            let _line_height = stream.read_i16()?;
            let _ascent = stream.read_i16()?;
            let id = stream.read_i16()?;
            let face = stream.read_u8()?;
            stream.read_u8()?; // filler
            let size = stream.read_i16()?;
            let mut channel = [0; 3];
            for value in &mut channel {
                *value = (stream.read_u16()? >> 8) as u8;
            }

            let mut font = Font::new(i32::from(id), f64::from(size));
            if face & 0x1 != 0 {
                font.flags |= FontFlags::BOLD;
            }
            if face & 0x2 != 0 {
                font.flags |= FontFlags::ITALIC;
            }
            if face & 0x4 != 0 {
                font.underline = UnderlineStyle::Single;
            }
            if face & 0x8 != 0 {
                font.flags |= FontFlags::OUTLINE;
            }
            if face & 0x10 != 0 {
                font.flags |= FontFlags::SHADOW;
            }
            if face & 0x20 != 0 {
                font.letter_spacing = -1.0;
            }
            if face & 0x40 != 0 {
                font.letter_spacing = 1.0;
            }
            let color = Color::new(channel[0], channel[1], channel[2]);
            if !color.is_white() {
                font.color = Some(color);
            }

            if start < 0 {
                return Err(ParseError::InvalidStructure("style run offset"));
            }
            runs.push(StyleRun { start: start as u32, font });
        }
        runs.sort_by_key(|run| run.start);
        Ok(runs)
    }

    fn send_document(&mut self, emitter: &mut Emitter<'_>) -> Result<()> {
        emitter.start_document()?;
        if !self.input.name().is_empty() {
            let title = self.input.name().to_string();
            emitter.metadata("title", &title)?;
        }
        emitter.start_page()?;
        emitter.open_section(&Section::default())?;
        self.send_main_text(emitter)?;
        emitter.close_section()?;
        emitter.end_page()?;
        emitter.end_document()?;
        Ok(())
    }

    fn send_main_text(&mut self, emitter: &mut Emitter<'_>) -> Result<()> {
        let entry = self.main.clone().ok_or(ParseError::InvalidStructure("missing text zone"))?;
        let mut stream = self.input.data_stream()?;
        stream.seek(SeekFrom::Start(entry.begin))?;
        let text = stream.read_bytes(entry.len() as usize)?;

        let paragraph = Paragraph::default();
        let mut font = Font::default();
        let mut next_run = 0;
        let mut span_open = false;

        emitter.open_paragraph(&paragraph)?;
        for (offset, &byte) in text.iter().enumerate() {
            while next_run < self.runs.len() && self.runs[next_run].start as usize <= offset {
                if span_open {
                    emitter.close_span()?;
                    span_open = false;
                }
                font = self.runs[next_run].font.clone();
                next_run += 1;
            }

            match byte {
                b'\r' | b'\n' => {
                    if span_open {
                        emitter.close_span()?;
                        span_open = false;
                    }
                    emitter.close_paragraph()?;
                    emitter.open_paragraph(&paragraph)?;
                },
                0x0c => {
                    if span_open {
                        emitter.close_span()?;
                        span_open = false;
                    }
                    emitter.insert_break(Break::Page)?;
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
        Ok(())
    }
}

impl Parser for SimpleTextParser {
    fn version(&self) -> i32 {
        1
    }

    fn check_header(&mut self, strict: bool) -> Result<bool> {
        let len = self.input.data().length();
        if len == 0 {
            return Ok(false);
        }
        if strict {
            // text files hold no NUL bytes; checking the head is enough
            let mut stream = self.input.data_stream()?;
            let head = stream.read_bytes(len.min(512) as usize)?;
            if head.contains(&0) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn parse(&mut self, sink: &mut dyn Sink) -> Result<()> {
        if !self.check_header(false)? {
            return Err(ParseError::FormatMismatch);
        }
        self.create_zones()?;

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
