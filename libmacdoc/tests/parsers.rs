//! End-to-end parser runs over synthetic documents: probe, registry,
//! event emission and the grammar invariant.

use libcommon::Reader;
use libmacdoc::event::{well_formed, Event, Recorder};
use libmacdoc::model::FontFlags;
use libmacdoc::parser::{parser_for, Parser};
use libmacdoc::parsers::{ActaParser, SimpleTextParser};
use libmacdoc::probe::FileKind;
use libmacdoc::InputFile;
use libmactoolbox::files::FinderInfo;
use std::collections::BTreeMap;
use std::io::Cursor;

fn boxed(data: Vec<u8>) -> Box<dyn Reader> {
    Box::new(Cursor::new(data))
}

/// Builds a resource fork holding the given `(type, id, data)` triples.
fn build_fork(resources: &[(&[u8; 4], i16, Vec<u8>)]) -> Vec<u8> {
    let mut data_area = Vec::new();
    let mut offsets = Vec::new();
    for (_, _, data) in resources {
        offsets.push(data_area.len() as u32);
        data_area.extend_from_slice(&(data.len() as u32).to_be_bytes());
        data_area.extend_from_slice(data);
    }

    let mut kinds: BTreeMap<[u8; 4], Vec<(i16, u32)>> = BTreeMap::new();
    for (index, (os_type, id, _)) in resources.iter().enumerate() {
        kinds.entry(**os_type).or_default().push((*id, offsets[index]));
    }

    let num_types = kinds.len();
    let num_refs: usize = kinds.values().map(Vec::len).sum();
    let map_len = 30 + 8 * num_types + 12 * num_refs;

    let data_offset = 16u32;
    let map_offset = data_offset + data_area.len() as u32;

    let mut out = Vec::new();
    out.extend_from_slice(&data_offset.to_be_bytes());
    out.extend_from_slice(&map_offset.to_be_bytes());
    out.extend_from_slice(&(data_area.len() as u32).to_be_bytes());
    out.extend_from_slice(&(map_len as u32).to_be_bytes());
    out.extend_from_slice(&data_area);

    out.extend_from_slice(&[0; 24]);
    out.extend_from_slice(&28u16.to_be_bytes());
    out.extend_from_slice(&(map_len as u16).to_be_bytes());
    out.extend_from_slice(&((num_types as u16).wrapping_sub(1)).to_be_bytes());

    let mut ref_offset = 2 + 8 * num_types;
    for (os_type, refs) in &kinds {
        out.extend_from_slice(os_type);
        out.extend_from_slice(&((refs.len() as u16) - 1).to_be_bytes());
        out.extend_from_slice(&(ref_offset as u16).to_be_bytes());
        ref_offset += 12 * refs.len();
    }
    for refs in kinds.values() {
        for (id, offset) in refs {
            out.extend_from_slice(&id.to_be_bytes());
            out.extend_from_slice(&(-1i16).to_be_bytes());
            out.extend_from_slice(&offset.to_be_bytes());
            out.extend_from_slice(&[0; 4]);
        }
    }
    out
}

/// One `styl` run: offset, then the style record.
fn styl_run(start: u32, font_id: i16, face: u8, size: i16) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(start as i32).to_be_bytes());
    out.extend_from_slice(&14i16.to_be_bytes()); // line height
    out.extend_from_slice(&11i16.to_be_bytes()); // ascent
    out.extend_from_slice(&font_id.to_be_bytes());
    out.push(face);
    out.push(0);
    out.extend_from_slice(&size.to_be_bytes());
    out.extend_from_slice(&[0; 6]); // black
    out
}

#[test]
fn simple_text_with_styles() {
    let mut styl = 2u16.to_be_bytes().to_vec();
    styl.extend(styl_run(0, 3, 0, 12));
    styl.extend(styl_run(6, 22, 0x01, 14)); // bold from "World"

    let fork = build_fork(&[(b"styl", 128, styl)]);
    let input = InputFile::from_streams(
        "note",
        boxed(b"Hello\rWorld".to_vec()),
        Some(boxed(fork)),
        Some(FinderInfo::new(&*b"TEXT", &*b"ttxt")),
    )
    .unwrap();

    let mut input = input;
    let detections = input.detect();
    assert_eq!(detections[0].kind, FileKind::TeachText);

    let mut parser = parser_for(detections[0].kind, input).unwrap();
    assert!(parser.check_header(true).unwrap());

    let mut recorder = Recorder::new();
    parser.parse(&mut recorder).unwrap();

    well_formed(recorder.events()).unwrap();
    assert_eq!(recorder.text(), "Hello\nWorld\n");

    let spans: Vec<_> = recorder
        .events()
        .iter()
        .filter_map(|event| match event {
            Event::OpenSpan(font) => Some(font.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(spans.len(), 2);
    assert!(!spans[0].flags.contains(FontFlags::BOLD));
    assert!(spans[1].flags.contains(FontFlags::BOLD));
    assert_eq!(spans[1].size, 14.0);
    assert_eq!(spans[1].id, 22);
}

#[test]
fn simple_text_without_resources_is_plain() {
    let input = InputFile::from_streams("plain", boxed(b"just text".to_vec()), None, None).unwrap();
    let mut parser = SimpleTextParser::new(input);
    let mut recorder = Recorder::new();
    parser.parse(&mut recorder).unwrap();
    well_formed(recorder.events()).unwrap();
    assert_eq!(recorder.text(), "just text\n");
}

#[test]
fn simple_text_strict_check_rejects_binaries() {
    let input = InputFile::from_streams("binary", boxed(vec![0u8; 64]), None, None).unwrap();
    let mut parser = SimpleTextParser::new(input);
    assert!(!parser.check_header(true).unwrap());
}

fn acta_topic(depth: i16, kind: i16, text: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&depth.to_be_bytes());
    out.extend_from_slice(&kind.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // flags
    out.extend_from_slice(&3i16.to_be_bytes()); // font id
    out.push(0); // extra style byte
    out.push(0); // style
    out.extend_from_slice(&12i16.to_be_bytes()); // size
    out.extend_from_slice(&[0; 6]); // counters + hidden
    out.extend_from_slice(&(text.len() as u32).to_be_bytes());
    out.extend_from_slice(text);
    out
}

fn acta_classic(topics: &[(i16, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    for (depth, text) in topics {
        out.extend(acta_topic(*depth, 1, text));
    }
    out.extend_from_slice(&0u16.to_be_bytes());
    out
}

#[test]
fn acta_outline_becomes_nested_lists() {
    let data = acta_classic(&[
        (1, b"Top"),
        (2, b"Child\rMore"),
        (1, b"Next"),
    ]);
    let input = InputFile::from_streams("outline", boxed(data), None, None).unwrap();
    let mut parser = ActaParser::new(input);
    assert!(parser.check_header(true).unwrap());
    assert_eq!(parser.version(), 1);

    let mut recorder = Recorder::new();
    parser.parse(&mut recorder).unwrap();

    well_formed(recorder.events()).unwrap();
    assert_eq!(recorder.text(), "Top\nChild\nMore\nNext\n");

    let opened_levels = recorder
        .events()
        .iter()
        .filter(|event| matches!(event, Event::OpenListLevel(_)))
        .count();
    // level one opens once, level two once
    assert_eq!(opened_levels, 2);

    let list_paragraphs = recorder
        .events()
        .iter()
        .filter_map(|event| match event {
            Event::OpenParagraph(paragraph) => Some(paragraph.list_level),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(list_paragraphs, [1, 2, 2, 1]);
}

#[test]
fn acta_registry_round_trip() {
    let data = acta_classic(&[(1, b"Topic")]);
    let mut input = InputFile::from_streams(
        "outline",
        boxed(data),
        None,
        Some(FinderInfo::new(&*b"OTLN", &*b"ACTA")),
    )
    .unwrap();

    let detections = input.detect();
    assert_eq!(detections[0].kind, FileKind::Acta);
    assert_eq!(detections[0].label, "Acta");

    let mut parser = parser_for(detections[0].kind, input).unwrap();
    let mut recorder = Recorder::new();
    parser.parse(&mut recorder).unwrap();
    well_formed(recorder.events()).unwrap();
    assert_eq!(recorder.text(), "Topic\n");
}

#[test]
fn acta_truncated_topic_still_balances_the_sink() {
    // a topic that declares more text than the file holds
    let mut data = Vec::new();
    data.extend_from_slice(&1i16.to_be_bytes());
    data.extend_from_slice(&1i16.to_be_bytes());
    data.extend_from_slice(&[0; 14]);
    data.extend_from_slice(&100u32.to_be_bytes());
    data.extend_from_slice(b"short");
    // keep the header check alive: enough bytes for the first probe
    data.resize(40, 0);

    let input = InputFile::from_streams("broken", boxed(data), None, None).unwrap();
    let mut parser = ActaParser::new(input);
    let mut recorder = Recorder::new();
    // corrupt zones degrade: the parse ends cleanly with what was read
    parser.parse(&mut recorder).unwrap();
    well_formed(recorder.events()).unwrap();
}
