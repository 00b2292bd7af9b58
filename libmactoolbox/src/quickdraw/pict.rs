//! The QuickDraw serialised picture format.
//!
//! PICT version 1 uses 8-bit opcode ids; version 2 begins with the version
//! opcode sequence `11 01 FF 02 FF 0C 00`, uses 16-bit ids and keeps every
//! opcode aligned to an even offset. Decoding is a pure interpretation of
//! a constant opcode table; each table entry names the opcode and lists the
//! types of its serialised arguments.

use libcommon::InputStream;
use std::io::{Cursor, Read, Seek, SeekFrom};
use super::{
    check_mode, Bitmap, Color, Error, Pattern, PixPattern, Pixmap, Point, Rect, Region, Result,
};

/// The closed set of argument encodings used by PICT opcodes.
///
/// Data is signed unless the name says otherwise. The bitmap family splits
/// by packing and by the presence of a trailing clip region; the `Direct`
/// variants are the version 2 pixmaps without a colour table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArgType {
    Byte,
    UByte,
    Int,
    UInt,
    UFixed,
    OldColor,
    RgbColor,
    Pattern,
    ColorPattern,
    Point,
    PointByte,
    PointUByte,
    Poly,
    Region,
    Rect,
    Text,
    LongText,
    Bits,
    BitsRegion,
    PackedBits,
    PackedBitsRegion,
    DirectBits,
    DirectBitsRegion,
    Quicktime,
}

/// One opcode of the PICT instruction set.
#[derive(Debug)]
pub struct OpDef {
    pub id: u16,
    pub name: &'static str,
    pub args: &'static [ArgType],
}

use ArgType as A;

const fn op(id: u16, name: &'static str, args: &'static [ArgType]) -> OpDef {
    OpDef { id, name, args }
}

/// Version 1 opcodes. `0x2c`, `0x2e` and `0xa5` are not standard but turn
/// up in pictures written by some applications.
pub static V1_OPCODES: &[OpDef] = &[
    op(0x00, "NOP", &[]),
    op(0x01, "ClipRgn", &[A::Region]),
    op(0x02, "BkPat", &[A::Pattern]),
    op(0x03, "TxFont", &[A::Int]),
    op(0x04, "TxFace", &[A::UByte]),
    op(0x05, "TxMode", &[A::Int]),
    op(0x06, "SpExtra", &[A::UFixed]),
    op(0x07, "PnSize", &[A::Point]),
    op(0x08, "PnMode", &[A::Int]),
    op(0x09, "PnPat", &[A::Pattern]),
    op(0x0a, "FillPat", &[A::Pattern]),
    op(0x0b, "OvSize", &[A::Point]),
    op(0x0c, "Origin", &[A::Point]),
    op(0x0d, "TxSize", &[A::Int]),
    op(0x0e, "FgColor", &[A::OldColor]),
    op(0x0f, "BkColor", &[A::OldColor]),
    op(0x10, "TxRatio", &[A::Point, A::Point]),
    op(0x11, "picVersion", &[A::UByte]),
    op(0x20, "Line", &[A::Point, A::Point]),
    op(0x21, "LineFrom", &[A::Point]),
    op(0x22, "ShortLine", &[A::Point, A::PointByte]),
    op(0x23, "ShortLineFrom", &[A::PointByte]),
    op(0x28, "LongText", &[A::Point, A::Text]),
    op(0x29, "DHText", &[A::UByte, A::Text]),
    op(0x2a, "DVText", &[A::UByte, A::Text]),
    op(0x2b, "DHDVText", &[A::PointUByte, A::Text]),
    op(0x2c, "FontName", &[A::Int, A::Int, A::Text]),
    op(0x2e, "GlyphState?", &[A::Int, A::Int, A::Int]),
    op(0x30, "frameRect", &[A::Rect]),
    op(0x31, "paintRect", &[A::Rect]),
    op(0x32, "eraseRect", &[A::Rect]),
    op(0x33, "invertRect", &[A::Rect]),
    op(0x34, "fillRect", &[A::Rect]),
    op(0x38, "frameSameRect", &[]),
    op(0x39, "paintSameRect", &[]),
    op(0x3a, "eraseSameRect", &[]),
    op(0x3b, "invertSameRect", &[]),
    op(0x3c, "fillSameRect", &[]),
    op(0x40, "frameRRect", &[A::Rect]),
    op(0x41, "paintRRect", &[A::Rect]),
    op(0x42, "eraseRRect", &[A::Rect]),
    op(0x43, "invertRRect", &[A::Rect]),
    op(0x44, "fillRRect", &[A::Rect]),
    op(0x48, "frameSameRRect", &[]),
    op(0x49, "paintSameRRect", &[]),
    op(0x4a, "eraseSameRRect", &[]),
    op(0x4b, "invertSameRRect", &[]),
    op(0x4c, "fillSameRRect", &[]),
    op(0x50, "frameOval", &[A::Rect]),
    op(0x51, "paintOval", &[A::Rect]),
    op(0x52, "eraseOval", &[A::Rect]),
    op(0x53, "invertOval", &[A::Rect]),
    op(0x54, "fillOval", &[A::Rect]),
    op(0x58, "frameSameOval", &[]),
    op(0x59, "paintSameOval", &[]),
    op(0x5a, "eraseSameOval", &[]),
    op(0x5b, "invertSameOval", &[]),
    op(0x5c, "fillSameOval", &[]),
    op(0x60, "frameArc", &[A::Rect, A::Int, A::Int]),
    op(0x61, "paintArc", &[A::Rect, A::Int, A::Int]),
    op(0x62, "eraseArc", &[A::Rect, A::Int, A::Int]),
    op(0x63, "invertArc", &[A::Rect, A::Int, A::Int]),
    op(0x64, "fillArc", &[A::Rect, A::Int, A::Int]),
    op(0x68, "frameSameArc", &[A::Int, A::Int]),
    op(0x69, "paintSameArc", &[A::Int, A::Int]),
    op(0x6a, "eraseSameArc", &[A::Int, A::Int]),
    op(0x6b, "invertSameArc", &[A::Int, A::Int]),
    op(0x6c, "fillSameArc", &[A::Int, A::Int]),
    op(0x70, "framePoly", &[A::Poly]),
    op(0x71, "paintPoly", &[A::Poly]),
    op(0x72, "erasePoly", &[A::Poly]),
    op(0x73, "invertPoly", &[A::Poly]),
    op(0x74, "fillPoly", &[A::Poly]),
    op(0x78, "frameSamePoly", &[]),
    op(0x79, "paintSamePoly", &[]),
    op(0x7a, "eraseSamePoly", &[]),
    op(0x7b, "invertSamePoly", &[]),
    op(0x7c, "fillSamePoly", &[]),
    op(0x80, "frameRgn", &[A::Region]),
    op(0x81, "paintRgn", &[A::Region]),
    op(0x82, "eraseRgn", &[A::Region]),
    op(0x83, "invertRgn", &[A::Region]),
    op(0x84, "fillRgn", &[A::Region]),
    op(0x88, "frameSameRgn", &[]),
    op(0x89, "paintSameRgn", &[]),
    op(0x8a, "eraseSameRgn", &[]),
    op(0x8b, "invertSameRgn", &[]),
    op(0x8c, "fillSameRgn", &[]),
    op(0x90, "BitsRect", &[A::Bits]),
    op(0x91, "BitsRgn", &[A::BitsRegion]),
    op(0x98, "PackBitsRect", &[A::PackedBits]),
    op(0x99, "PackBitsRgn", &[A::PackedBitsRegion]),
    op(0xa0, "ShortComment", &[A::Int]),
    op(0xa1, "LongComment", &[A::Int, A::LongText]),
    op(0xa5, "LongComment????", &[A::Int, A::LongText]),
    op(0xff, "EndOfPicture", &[]),
];

/// The opcodes version 2 adds or redefines on top of the version 1 set.
pub static V2_OPCODES: &[OpDef] = &[
    op(0x12, "BackCPat", &[A::ColorPattern]),
    op(0x13, "PenCPat", &[A::ColorPattern]),
    op(0x14, "FillCPat", &[A::ColorPattern]),
    op(0x15, "PnLocHFrac", &[A::Int]),
    op(0x16, "ChExtra", &[A::Int]),
    op(0x1a, "RGBFgColor", &[A::RgbColor]),
    op(0x1b, "RGBBkColor", &[A::RgbColor]),
    op(0x1c, "HiliteMode", &[]),
    op(0x1d, "HiliteColor", &[A::RgbColor]),
    op(0x1e, "DefHilite", &[]),
    op(0x1f, "OpColor", &[A::RgbColor]),
    op(0x2d, "LineJustify", &[A::Int, A::UFixed, A::UFixed]),
    op(0x2e, "GlyphState", &[A::Int, A::Byte, A::Byte, A::Byte, A::Byte]),
    op(0x9a, "DirectBitsRect", &[A::DirectBits]),
    op(0x9b, "DirectBitsRgn", &[A::DirectBitsRegion]),
    op(0x8200, "CompressedQuicktime", &[A::Quicktime]),
    op(0x8201, "UncompressedQuicktime", &[A::Quicktime]),
];

/// Finds the table entry for an opcode id. Version 2 redefinitions shadow
/// the version 1 entries.
#[must_use]
pub fn find_op(version: u8, id: u16) -> Option<&'static OpDef> {
    if version >= 2 {
        if let Some(def) = V2_OPCODES.iter().find(|def| def.id == id) {
            return Some(def);
        }
    }
    V1_OPCODES.iter().find(|def| def.id == id)
}

/// A decoded opcode argument.
#[derive(Clone, Debug, PartialEq)]
pub enum Argument {
    Int(i32),
    Color(Color),
    Pattern(Pattern),
    ColorPattern(PixPattern),
    Point(Point),
    Poly { frame: Rect, points: Vec<Point> },
    Rect(Rect),
    Region(Region),
    Text(Vec<u8>),
    Bitmap(Bitmap),
    Pixmap(Pixmap),
    Quicktime(u32),
}

/// One decoded opcode with its arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct Op {
    pub id: u16,
    pub name: &'static str,
    pub args: Vec<Argument>,
}

/// Outcome of the cheap PICT handshake check.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PictureCheck {
    Bad,
    Ok { version: u8, sub_version: i16 },
    OkEmpty { version: u8, sub_version: i16 },
}

/// A fully decoded picture.
#[derive(Clone, Debug, PartialEq)]
pub struct Picture {
    /// The recorded size field; unreliable and kept only for information.
    pub size: u16,
    pub frame: Rect,
    pub version: u8,
    pub ops: Vec<Op>,
}

impl Picture {
    /// Checks whether `size` bytes at the start of `input` look like a
    /// picture, without decoding the opcode stream.
    pub fn check<T: Read + Seek>(input: &mut InputStream<T>, size: u64) -> PictureCheck {
        match Self::check_inner(input, size) {
            Ok(result) => result,
            Err(_) => PictureCheck::Bad,
        }
    }

    fn check_inner<T: Read + Seek>(input: &mut InputStream<T>, size: u64) -> Result<PictureCheck> {
        let start = input.tell();
        if size < 0xd {
            return Ok(PictureCheck::Bad);
        }

        let read_size = u64::from(input.read_u16()?);
        let mut dim = [0_i16; 4];
        for value in &mut dim {
            *value = input.read_i16()?;
        }
        let last_flag = input.read_u16()?;

        let version;
        let sub_version;
        let mut empty;
        match last_flag {
            0x1101 => {
                if read_size != size && read_size + 1 != size {
                    return Ok(PictureCheck::Bad);
                }
                version = 1;
                sub_version = 1;
                empty = size == 0xd;
            },
            0x0011 => {
                if size < 40 || input.read_u16()? != 0x2ff || input.read_u16()? != 0xc00 {
                    return Ok(PictureCheck::Bad);
                }
                let subvers = -input.read_i16()?;
                if subvers == 1 {
                    empty = size == 42;
                } else if subvers == 2 {
                    empty = size == 40;
                } else if (-6..6).contains(&subvers) {
                    // 0, -1 and -4 have been seen here
                    empty = size == 0xd;
                } else {
                    return Ok(PictureCheck::Bad);
                }
                version = 2;
                sub_version = subvers;
            },
            _ => return Ok(PictureCheck::Bad),
        }

        if empty {
            input.seek(SeekFrom::Start(start + size - 1))?;
            if input.read_u8()? != 0xff {
                return Ok(PictureCheck::Bad);
            }
        }

        let width = i32::from(dim[3]) - i32::from(dim[1]);
        let height = i32::from(dim[2]) - i32::from(dim[0]);
        if !empty && (width < 0 || height < 0) {
            return Ok(PictureCheck::Bad);
        }
        if width <= 0 || height <= 0 {
            empty = true;
        }

        Ok(if empty {
            PictureCheck::OkEmpty { version, sub_version }
        } else {
            PictureCheck::Ok { version, sub_version }
        })
    }

    /// Decodes the whole opcode stream.
    ///
    /// The recorded size field is not trusted; decoding runs until
    /// `EndOfPicture`. A missing terminator is an error.
    pub fn parse<T: Read + Seek>(input: &mut InputStream<T>) -> Result<Self> {
        input.seek(SeekFrom::Start(0))?;
        let size = input.read_u16()?;
        let frame = Rect::read(input)?;

        let first = input.read_u16()?;
        let version = if first == 0x1101 {
            1
        } else if first == 0x0011 {
            if input.read_u16()? != 0x2ff {
                return Err(Error::NotPict);
            }
            Self::parse_v2_header(input)?;
            2
        } else {
            return Err(Error::NotPict);
        };

        let mut ops = Vec::new();
        loop {
            if version >= 2 && input.tell() % 2 == 1 {
                input.seek(SeekFrom::Current(1))?;
            }
            if input.at_eof() {
                return Err(Error::Invalid("missing EndOfPicture"));
            }
            let id = if version >= 2 {
                input.read_u16()?
            } else {
                u16::from(input.read_u8()?)
            };
            let def = find_op(version, id).ok_or(Error::UnknownOpcode { version, id })?;
            let mut args = Vec::with_capacity(def.args.len());
            for &ty in def.args {
                args.push(read_value(input, ty)?);
            }
            let done = id == 0xff;
            ops.push(Op { id, name: def.name, args });
            if done {
                break;
            }
        }

        Ok(Self { size, frame, version, ops })
    }

    fn parse_v2_header<T: Read + Seek>(input: &mut InputStream<T>) -> Result<()> {
        if input.read_u16()? != 0xc00 {
            return Err(Error::Invalid("missing header opcode"));
        }
        let version = -input.read_i16()?;
        let _sub_version = input.read_i16()?;
        match version {
            1 => {
                // fractional bounding box
                for _ in 0..4 {
                    input.read_i16()?;
                    input.read_u16()?;
                }
                input.read_u32()?; // reserved
            },
            2 => {
                // resolution then bounding box
                for _ in 0..2 {
                    input.read_u16()?;
                    input.read_u16()?;
                }
                for _ in 0..4 {
                    input.read_u16()?;
                }
                input.read_u32()?; // reserved
            },
            _ => return Err(Error::Invalid("header version")),
        }
        Ok(())
    }
}

/// Decodes one argument of the given type.
#[allow(clippy::too_many_lines)]
pub fn read_value<T: Read + Seek>(input: &mut InputStream<T>, ty: ArgType) -> Result<Argument> {
    Ok(match ty {
        A::Byte => Argument::Int(i32::from(input.read_i8()?)),
        A::UByte => Argument::Int(i32::from(input.read_u8()?)),
        A::Int => Argument::Int(i32::from(input.read_i16()?)),
        A::UInt => Argument::Int(i32::from(input.read_u16()?)),
        A::UFixed => Argument::Int(input.read_i32()?),
        A::OldColor => {
            // planar colour constants from the original QuickDraw
            let value = input.read_u32()?;
            Argument::Color(match value {
                30 => Color::WHITE,
                33 => Color::BLACK,
                69 => Color::new(255, 255, 0),
                137 => Color::new(255, 0, 255),
                205 => Color::new(255, 0, 0),
                273 => Color::new(0, 255, 255),
                341 => Color::new(0, 255, 0),
                409 => Color::new(0, 0, 255),
                _ => Color::grey(128),
            })
        },
        A::RgbColor => {
            let mut channel = [0; 3];
            for value in &mut channel {
                *value = (input.read_u16()? >> 8) as u8;
            }
            Argument::Color(Color::new(channel[0], channel[1], channel[2]))
        },
        A::Pattern => {
            let mut pattern = [0; 8];
            for byte in &mut pattern {
                *byte = input.read_u8()?;
            }
            Argument::Pattern(pattern)
        },
        A::ColorPattern => Argument::ColorPattern(PixPattern::read(input)?),
        A::Point => Argument::Point(Point::read(input)?),
        A::PointByte => {
            let x = i16::from(input.read_i8()?);
            let y = i16::from(input.read_i8()?);
            Argument::Point(Point { x, y })
        },
        A::PointUByte => {
            let x = i16::from(input.read_u8()?);
            let y = i16::from(input.read_u8()?);
            Argument::Point(Point { x, y })
        },
        A::Poly => {
            let size = input.read_u16()?;
            if size % 2 != 0 {
                return Err(Error::Invalid("polygon size"));
            }
            let words = i32::from(size / 2);
            if words < 5 {
                return Err(Error::Invalid("polygon size"));
            }
            let frame = Rect::read(input)?;
            let coords = words - 5;
            if coords % 2 != 0 {
                return Err(Error::Invalid("polygon point count"));
            }
            let mut points = Vec::with_capacity(coords as usize / 2);
            for _ in 0..coords / 2 {
                points.push(Point::read(input)?);
            }
            Argument::Poly { frame, points }
        },
        A::Rect => Argument::Rect(Rect::read(input)?),
        A::Region => Argument::Region(Region::read(input)?),
        A::Text => Argument::Text(input.read_pstr()?),
        A::LongText => {
            let len = input.read_i16()?;
            if len < 0 {
                return Err(Error::Invalid("long text length"));
            }
            Argument::Text(input.read_bytes(len as usize)?)
        },
        A::Bits | A::BitsRegion | A::PackedBits | A::PackedBitsRegion => {
            let packed = ty == A::PackedBits || ty == A::PackedBitsRegion;
            let has_region = ty == A::BitsRegion || ty == A::PackedBitsRegion;
            // the top bit of rowBytes distinguishes a pixmap from a bitmap
            let pos = input.tell();
            let is_pixmap = input.read_u16()? & 0x8000 != 0;
            input.seek(SeekFrom::Start(pos))?;
            if is_pixmap {
                Argument::Pixmap(Pixmap::read(input, packed, true, true, has_region)?)
            } else {
                Argument::Bitmap(Bitmap::read(input, packed, has_region)?)
            }
        },
        A::DirectBits | A::DirectBitsRegion => {
            let has_region = ty == A::DirectBitsRegion;
            Argument::Pixmap(Pixmap::read(input, false, false, true, has_region)?)
        },
        A::Quicktime => {
            let len = input.read_u32()?;
            let end = input.tell() + u64::from(len);
            if !input.check_pos(end) {
                return Err(Error::Invalid("quicktime payload"));
            }
            input.seek(SeekFrom::Start(end))?;
            Argument::Quicktime(len)
        },
    })
}

/// The serialised size of the next argument of type `ty`.
///
/// The length-less types (colour patterns and the bitmap family) cannot be
/// sized without parsing, so the cursor may move; callers rewind.
fn value_size<T: Read + Seek>(input: &mut InputStream<T>, ty: ArgType) -> Result<u64> {
    Ok(match ty {
        A::Byte | A::UByte => 1,
        A::Int | A::UInt | A::PointByte | A::PointUByte => 2,
        A::UFixed | A::OldColor | A::Point => 4,
        A::RgbColor => 6,
        A::Pattern | A::Rect => 8,
        A::Poly | A::Region => u64::from(input.read_u16()?),
        A::Text => 1 + u64::from(input.read_u8()?),
        A::LongText => 2 + u64::from(input.read_u16()?),
        A::ColorPattern => {
            let pos = input.tell();
            PixPattern::read(input)?;
            input.tell() - pos
        },
        A::Bits | A::BitsRegion | A::PackedBits | A::PackedBitsRegion
        | A::DirectBits | A::DirectBitsRegion => {
            let pos = input.tell();
            read_value(input, ty)?;
            input.tell() - pos
        },
        A::Quicktime => 4 + u64::from(input.read_u32()?),
    })
}

/// The total serialised size of an opcode's arguments, measured by the
/// two-pass approach: parse forward to find the end, then rewind.
pub fn compute_size<T: Read + Seek>(input: &mut InputStream<T>, def: &OpDef) -> Result<u64> {
    let start = input.tell();
    let mut total = 0;
    for &ty in def.args {
        input.seek(SeekFrom::Start(start + total))?;
        total += value_size(input, ty)?;
    }
    input.seek(SeekFrom::Start(start))?;
    Ok(total)
}

/// Rewrites a version 1 picture as a version 2 picture.
///
/// Argument extents come from the opcode table; every opcode is re-emitted
/// as a zero-padded 16-bit id with its raw argument bytes, padded to even
/// length. The non-standard codes `0x2e` and `0xa5` have no version 2
/// equivalent and are dropped. One byte of trailing padding after
/// `EndOfPicture` is tolerated.
pub fn convert_to_pict2(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 10 {
        return Err(Error::NotPict);
    }

    let mut input = InputStream::new(Cursor::new(data.to_vec())).map_err(libcommon::StreamError::from)?;
    let size = u64::from(input.read_u16()?);
    if size != data.len() as u64 && size + 1 != data.len() as u64 {
        return Err(Error::NotPict);
    }

    let mut out = Vec::with_capacity(data.len() * 2 + 50);
    let push_i16 = |out: &mut Vec<u8>, value: i16| out.extend_from_slice(&value.to_be_bytes());

    push_i16(&mut out, 0); // size, filled in at the end
    let mut dim = [0_i16; 4];
    for value in &mut dim {
        *value = input.read_i16()?;
        push_i16(&mut out, *value);
    }
    if input.read_u16()? != 0x1101 {
        return Err(Error::NotPict);
    }

    push_i16(&mut out, 0x0011);
    push_i16(&mut out, 0x02ff);
    push_i16(&mut out, 0x0c00);
    push_i16(&mut out, -1);
    push_i16(&mut out, -1);
    // the fixed-point frame swaps to left, top, right, bottom
    for index in 0..4_usize {
        let source = if index % 2 == 1 { index - 1 } else { index + 1 };
        push_i16(&mut out, dim[source]);
        push_i16(&mut out, 0);
    }
    push_i16(&mut out, 0);
    push_i16(&mut out, 0);

    let mut found_end = false;
    while !found_end && !input.at_eof() {
        let pos = input.tell();
        let id = u16::from(input.read_u8()?);
        let def = find_op(1, id).ok_or(Error::UnknownOpcode { version: 1, id })?;
        let arg_size = compute_size(&mut input, def)?;

        // normally unimplemented, so dropped rather than translated
        let skip = id == 0x2e || id == 0xa5;
        found_end = id == 0xff;

        if !skip {
            out.push(0);
            out.push(id as u8);
            input.seek(SeekFrom::Start(pos + 1))?;
            out.extend_from_slice(&input.read_bytes(arg_size as usize)?);
            if arg_size % 2 == 1 {
                out.push(0);
            }
        }
        input.seek(SeekFrom::Start(pos + 1 + arg_size))?;
    }

    let end_ok = found_end && (input.at_eof() || {
        input.seek(SeekFrom::Current(1))?;
        input.at_eof()
    });
    if !end_ok {
        return Err(Error::Invalid("EndOfPicture"));
    }

    let total = out.len() as u16;
    out[0..2].copy_from_slice(&total.to_be_bytes());
    Ok(out)
}

/// Names a transfer mode for trace output; passthrough validation lives in
/// [`check_mode`].
#[must_use]
pub fn mode_name(mode: i16) -> Option<&'static str> {
    check_mode(mode).ok()?;
    use super::TransferMode;
    num_traits::FromPrimitive::from_i16(mode).map(|mode: TransferMode| match mode {
        TransferMode::SrcCopy => "srcCopy",
        TransferMode::SrcOr => "srcOr",
        TransferMode::SrcXor => "srcXOr",
        TransferMode::SrcBic => "srcBic",
        TransferMode::NotSrcCopy => "notSrcCopy",
        TransferMode::NotSrcOr => "notSrcOr",
        TransferMode::NotSrcXor => "notSrcXOr",
        TransferMode::NotSrcBic => "notSrcBic",
        TransferMode::PatCopy => "patCopy",
        TransferMode::PatOr => "patOr",
        TransferMode::PatXor => "patXOr",
        TransferMode::PatBic => "patBic",
        TransferMode::NotPatCopy => "notPatCopy",
        TransferMode::NotPatOr => "notPatOr",
        TransferMode::NotPatXor => "notPatXOr",
        TransferMode::NotPatBic => "notPatBic",
        TransferMode::Blend => "blend",
        TransferMode::AddPin => "addPin",
        TransferMode::AddOver => "addOver",
        TransferMode::SubPin => "subPin",
        TransferMode::Transparent => "transparent",
        TransferMode::AdMax => "addMax",
        TransferMode::SubOver => "subOver",
        TransferMode::AdMin => "addMin",
        TransferMode::GrayishTextOr => "grayishTextOr",
        TransferMode::Hilite => "hilitetransfermode",
        TransferMode::DitherCopy => "ditherCopy",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(data: &[u8]) -> InputStream<Cursor<Vec<u8>>> {
        InputStream::new(Cursor::new(data.to_vec())).unwrap()
    }

    fn v1_picture(body: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&[0, 0]); // size, patched below
        data.extend_from_slice(&[0, 0, 0, 0, 0, 100, 0, 100]);
        data.extend_from_slice(&[0x11, 0x01]);
        data.extend_from_slice(body);
        data.push(0xff);
        let size = data.len() as u16;
        data[0..2].copy_from_slice(&size.to_be_bytes());
        data
    }

    #[test]
    fn empty_v1_picture() {
        // 13-byte picture: size, frame, version, EndOfPicture
        let data = v1_picture(&[]);
        assert_eq!(data.len(), 0xd);

        let check = Picture::check(&mut stream(&data), data.len() as u64);
        assert_eq!(check, PictureCheck::OkEmpty { version: 1, sub_version: 1 });

        let picture = Picture::parse(&mut stream(&data)).unwrap();
        assert_eq!(picture.version, 1);
        assert_eq!(picture.frame, Rect { top: 0, left: 0, bottom: 100, right: 100 });
        assert_eq!(picture.ops.len(), 1);
        assert_eq!(picture.ops[0].name, "EndOfPicture");
    }

    #[test]
    fn parse_stops_at_unknown_opcode() {
        let data = v1_picture(&[0x27]);
        assert!(matches!(
            Picture::parse(&mut stream(&data)),
            Err(Error::UnknownOpcode { version: 1, id: 0x27 })
        ));
    }

    #[test]
    fn missing_terminator_is_an_error() {
        let mut data = v1_picture(&[]);
        data.pop();
        assert!(Picture::parse(&mut stream(&data)).is_err());
    }

    #[test]
    fn simple_ops_decode() {
        let mut body = Vec::new();
        // Line (0,0) -> (10,20)
        body.extend_from_slice(&[0x20, 0, 0, 0, 0, 0, 10, 0, 20]);
        // frameRect
        body.extend_from_slice(&[0x30, 0, 1, 0, 2, 0, 30, 0, 40]);
        // DHText, offset 5, "ok"
        body.extend_from_slice(&[0x29, 5, 2, b'o', b'k']);
        let data = v1_picture(&body);

        let picture = Picture::parse(&mut stream(&data)).unwrap();
        assert_eq!(picture.ops.len(), 4);
        assert_eq!(picture.ops[0].args, vec![
            Argument::Point(Point { x: 0, y: 0 }),
            Argument::Point(Point { x: 10, y: 20 }),
        ]);
        assert_eq!(picture.ops[1].args, vec![
            Argument::Rect(Rect { top: 1, left: 2, bottom: 30, right: 40 }),
        ]);
        assert_eq!(picture.ops[2].args, vec![
            Argument::Int(5),
            Argument::Text(b"ok".to_vec()),
        ]);
    }

    #[test]
    fn compute_size_measures_then_rewinds() {
        // DHText arguments: UByte offset, then "hi"
        let mut input = stream(&[5, 2, b'h', b'i', 0xff]);
        let def = find_op(1, 0x29).unwrap();
        assert_eq!(compute_size(&mut input, def).unwrap(), 4);
        assert_eq!(input.tell(), 0);
    }

    #[test]
    fn old_color_constants() {
        let mut input = stream(&409u32.to_be_bytes());
        assert_eq!(read_value(&mut input, A::OldColor).unwrap(), Argument::Color(Color::new(0, 0, 255)));
    }
}
