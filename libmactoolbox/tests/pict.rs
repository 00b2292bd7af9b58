//! End-to-end PICT decoding scenarios, including the version 1 to
//! version 2 rewrite.

use libcommon::InputStream;
use libmactoolbox::quickdraw::pict::{self, Argument, Picture, PictureCheck};
use libmactoolbox::quickdraw::Rect;
use std::io::Cursor;

fn stream(data: &[u8]) -> InputStream<Cursor<Vec<u8>>> {
    InputStream::new(Cursor::new(data.to_vec())).unwrap()
}

fn v1_picture(body: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&[0, 0]);
    data.extend_from_slice(&[0, 0, 0, 0, 0, 100, 0, 100]);
    data.extend_from_slice(&[0x11, 0x01]);
    data.extend_from_slice(body);
    data.push(0xff);
    let size = data.len() as u16;
    data[0..2].copy_from_slice(&size.to_be_bytes());
    data
}

#[test]
fn minimal_v1_picture_decodes_without_error() {
    // 00 0A, frame 100x100, version op, EndOfPicture
    let data: &[u8] = &[
        0x00, 0x0a,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x64, 0x00, 0x64,
        0x11, 0x01,
        0xff,
    ];

    let picture = Picture::parse(&mut stream(data)).unwrap();
    assert_eq!(picture.version, 1);
    assert_eq!(picture.frame, Rect { top: 0, left: 0, bottom: 100, right: 100 });
    assert_eq!(picture.ops.len(), 1);
    assert_eq!(picture.ops[0].name, "EndOfPicture");
    assert!(picture.ops[0].args.is_empty());

    assert_eq!(
        Picture::check(&mut stream(data), data.len() as u64),
        PictureCheck::OkEmpty { version: 1, sub_version: 1 },
    );
}

#[test]
fn bitmap_rows_unpack_to_row_bytes_times_height() {
    let mut body = Vec::new();
    body.push(0x98); // PackBitsRect
    body.extend_from_slice(&4u16.to_be_bytes()); // row bytes
    for _ in 0..3 {
        body.extend_from_slice(&[0, 0, 0, 0, 0, 3, 0, 32]); // bounds, src, dst
    }
    body.extend_from_slice(&[0, 0]); // mode
    for _ in 0..3 {
        // each row: one run of three 0xaa plus one literal
        body.extend_from_slice(&[4, 0xfe, 0xaa, 0x00, 0x42]);
    }
    let data = v1_picture(&body);

    let picture = Picture::parse(&mut stream(&data)).unwrap();
    match &picture.ops[0].args[0] {
        Argument::Bitmap(bitmap) => {
            assert_eq!(
                bitmap.data.len(),
                usize::from(bitmap.row_bytes) * bitmap.rect.height() as usize,
            );
            assert_eq!(bitmap.data, [0xaa, 0xaa, 0xaa, 0x42].repeat(3));
        },
        other => panic!("expected a bitmap, got {:?}", other),
    }
}

#[test]
fn transcoded_picture_decodes_to_the_same_ops() {
    let mut body = Vec::new();
    // pen size
    body.extend_from_slice(&[0x07, 0, 1, 0, 1]);
    // a dropped non-standard glyph-state op
    body.extend_from_slice(&[0x2e, 0, 1, 0, 2, 0, 3]);
    // a line
    body.extend_from_slice(&[0x20, 0, 0, 0, 0, 0, 50, 0, 60]);
    // text with an odd total length, forcing transcoder padding
    body.extend_from_slice(&[0x29, 7, 1, b'h']);
    // a dropped long comment variant
    body.extend_from_slice(&[0xa5, 0, 1, 0, 3, b'x', b'y', b'z']);
    // a rectangle
    body.extend_from_slice(&[0x30, 0, 0, 0, 0, 0, 9, 0, 9]);
    let data = v1_picture(&body);

    let original = Picture::parse(&mut stream(&data)).unwrap();
    let converted = pict::convert_to_pict2(&data).unwrap();
    let rewritten = Picture::parse(&mut stream(&converted)).unwrap();

    assert_eq!(rewritten.version, 2);
    assert_eq!(rewritten.frame, original.frame);

    let kept: Vec<_> = original
        .ops
        .iter()
        .filter(|op| op.id != 0x2e && op.id != 0xa5)
        .collect();
    assert_eq!(kept.len(), rewritten.ops.len());
    for (a, b) in kept.iter().zip(rewritten.ops.iter()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.args, b.args);
    }
}

#[test]
fn transcoder_tolerates_one_trailing_pad_byte() {
    let mut data = v1_picture(&[]);
    let recorded = data.len() as u16;
    data.push(0);
    data[0..2].copy_from_slice(&recorded.to_be_bytes());
    assert!(pict::convert_to_pict2(&data).is_ok());
}

#[test]
fn transcoder_rejects_truncated_pictures() {
    let mut data = v1_picture(&[]);
    data.pop();
    let recorded = data.len() as u16;
    data[0..2].copy_from_slice(&recorded.to_be_bytes());
    assert!(pict::convert_to_pict2(&data).is_err());
}

#[test]
fn check_rejects_non_pictures() {
    let data = [0u8; 32];
    assert_eq!(Picture::check(&mut stream(&data), 32), PictureCheck::Bad);
}
