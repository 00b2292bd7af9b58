//! Packed and direct bitmap/pixmap decoding for PICT opcodes.

use libcommon::InputStream;
use std::io::{Read, Seek, SeekFrom};
use super::{check_mode, Color, Error, Rect, Region, Result};

/// Decodes one PackBits-compressed row into `out`.
///
/// A signed count byte `n` introduces either `n + 1` literal bytes
/// (`n >= 0`) or `1 - n` repeats of the next byte (`n < 0`). For pixmaps
/// the repeated unit is `unit` bytes wide.
fn unpack_row(packed: &[u8], unit: usize, row_bytes: usize, out: &mut Vec<u8>) -> bool {
    debug_assert!((1..=4).contains(&unit));
    out.clear();
    let max = row_bytes + 24;
    let mut read_pos = 0;
    while read_pos < packed.len() {
        if read_pos + 2 > packed.len() {
            return false;
        }
        let count = packed[read_pos] as i8;
        read_pos += 1;
        if count < 0 {
            let repeats = 1 - isize::from(count) as usize;
            if read_pos + unit > packed.len() || out.len() + unit * repeats >= max {
                return false;
            }
            let value = &packed[read_pos..read_pos + unit];
            read_pos += unit;
            for _ in 0..repeats {
                if out.len() + unit >= max {
                    break;
                }
                out.extend_from_slice(value);
            }
            continue;
        }
        let literals = 1 + count as usize;
        if read_pos + unit * literals > packed.len() || out.len() + unit * literals >= max {
            return false;
        }
        for _ in 0..literals {
            if out.len() + unit >= max {
                break;
            }
            out.extend_from_slice(&packed[read_pos..read_pos + unit]);
            read_pos += unit;
        }
    }
    out.len() >= row_bytes
}

/// Reads one row's worth of packed bytes: a 1- or 2-byte length then that
/// many bytes.
fn read_packed_row<T: Read + Seek>(
    input: &mut InputStream<T>,
    row_bytes: usize,
) -> Result<Vec<u8>> {
    // The 1-byte limit is probably 251 per Pict 2.0; collected files put it
    // between 246 and 254
    let count = if row_bytes > 250 {
        usize::from(input.read_u16()?)
    } else {
        usize::from(input.read_u8()?)
    };
    if count > 2 * row_bytes {
        return Err(Error::Invalid("packed row size"));
    }
    Ok(input.read_bytes(count)?)
}

/// A one-bit QuickDraw bitmap.
#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap {
    pub row_bytes: u16,
    pub rect: Rect,
    pub src: Rect,
    pub dst: Rect,
    pub mode: i16,
    pub region: Option<Region>,
    /// Unpacked rows; always exactly `row_bytes × height` bytes.
    pub data: Vec<u8>,
}

impl Bitmap {
    pub fn read<T: Read + Seek>(
        input: &mut InputStream<T>,
        packed: bool,
        has_region: bool,
    ) -> Result<Self> {
        let row_bytes = input.read_u16()? & 0x3fff;
        if !packed && row_bytes > 8 {
            return Err(Error::Invalid("bitmap row bytes"));
        }

        let mut rects = [Rect::default(); 3];
        for rect in &mut rects {
            *rect = Rect::read(input)?;
            if rect.is_empty() {
                return Err(Error::Invalid("bitmap rectangle"));
            }
        }
        let [rect, src, dst] = rects;

        if !packed && i32::from(row_bytes) * 8 < rect.width() {
            return Err(Error::Invalid("bitmap row bytes too short"));
        }

        let mode = check_mode(input.read_i16()?)?;

        let region = if has_region {
            Some(Region::read(input)?)
        } else {
            None
        };

        let height = rect.height() as usize;
        let width = usize::from(row_bytes);
        let mut data = Vec::with_capacity(height * width);
        let mut row = Vec::new();
        for _ in 0..height {
            if packed {
                let packed_row = read_packed_row(input, width)?;
                if !unpack_row(&packed_row, 1, width, &mut row) {
                    return Err(Error::Invalid("packed bitmap row"));
                }
                data.extend_from_slice(&row[..width]);
            } else {
                data.extend_from_slice(&input.read_bytes(width)?);
            }
        }
        debug_assert_eq!(data.len(), height * width);

        Ok(Self { row_bytes, rect, src, dst, mode, region, data })
    }
}

/// A colour table attached to an indexed pixmap.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColorTable {
    pub flags: u16,
    pub colors: Vec<Color>,
}

impl ColorTable {
    pub fn read<T: Read + Seek>(input: &mut InputStream<T>) -> Result<Self> {
        let start = input.tell();
        input.seek(SeekFrom::Current(4))?; // seed, ignored
        let flags = input.read_u16()?;
        let count = i32::from(input.read_i16()?) + 1;
        if count < 0 {
            return Err(Error::Invalid("color table count"));
        }
        let mut colors = Vec::with_capacity(count as usize);
        for _ in 0..count {
            input.read_u16()?; // index, ignored
            let mut channel = [0; 3];
            for value in &mut channel {
                *value = input.read_u8()?;
                input.read_u8()?;
            }
            colors.push(Color::new(channel[0], channel[1], channel[2]));
        }
        if input.tell() != start + 8 + 8 * count as u64 {
            return Err(Error::Invalid("color table size"));
        }
        Ok(Self { flags, colors })
    }
}

/// Decoded pixmap contents: colour-table indices for depths up to 8, direct
/// colours otherwise.
#[derive(Clone, Debug, PartialEq)]
pub enum PixelData {
    Indexed(Vec<u16>),
    Direct(Vec<Color>),
}

/// A colour QuickDraw pixmap.
#[derive(Clone, Debug, PartialEq)]
pub struct Pixmap {
    pub row_bytes: u16,
    pub rect: Rect,
    pub pack_type: i16,
    pub pixel_size: i16,
    pub comp_count: i16,
    pub comp_size: i16,
    pub color_table: Option<ColorTable>,
    pub src: Option<Rect>,
    pub dst: Option<Rect>,
    pub mode: i16,
    pub region: Option<Region>,
    pub pixels: PixelData,
    /// Set when pixel indices exceeded the colour table and the table was
    /// extended with a greyscale ramp. Kept for compatibility with
    /// pathological files; see the pixpat foreground/background convention.
    pub ramp_extended: bool,
}

impl Pixmap {
    pub fn read<T: Read + Seek>(
        input: &mut InputStream<T>,
        packed_op: bool,
        has_color_table: bool,
        has_rects_mode: bool,
        has_region: bool,
    ) -> Result<Self> {
        if !has_color_table {
            // base address, meaningless in a file
            input.seek(SeekFrom::Current(4))?;
        }

        let row_bytes = input.read_u16()? & 0x3fff;
        let rect = Rect::read(input)?;
        if rect.is_empty() {
            return Err(Error::Invalid("pixmap bound rectangle"));
        }
        let _version = input.read_i16()?;
        let pack_type = input.read_i16()?;
        let _pack_size = input.read_i32()?;
        for _ in 0..2 {
            input.read_i16()?; // resolution, 16.16
            input.read_i16()?;
        }
        let _pixel_type = input.read_i16()?;
        let pixel_size = input.read_i16()?;
        let comp_count = input.read_i16()?;
        let comp_size = input.read_i16()?;
        let _plane_bytes = input.read_i32()?;
        // colour table handle and reserved field
        input.seek(SeekFrom::Current(8))?;

        let mut color_table = if has_color_table {
            Some(ColorTable::read(input)?)
        } else {
            None
        };

        if !packed_op && i32::from(row_bytes) * 8 < rect.height() {
            return Err(Error::Invalid("pixmap row bytes too short"));
        }

        let (mut src, mut dst, mut mode) = (None, None, 0);
        if has_rects_mode {
            for slot in &mut [&mut src, &mut dst] {
                let rect = Rect::read(input)?;
                if rect.is_empty() {
                    return Err(Error::Invalid("pixmap src/dst rectangle"));
                }
                **slot = Some(rect);
            }
            mode = check_mode(input.read_i16()?)?;
        }

        let region = if has_region {
            Some(Region::read(input)?)
        } else {
            None
        };

        let packed = !(row_bytes < 8 || pack_type == 1);
        let (pixels, ramp_extended) = Self::read_pixel_data(
            input,
            row_bytes,
            rect,
            pack_type,
            pixel_size,
            comp_count,
            packed,
            &mut color_table,
        )?;

        Ok(Self {
            row_bytes,
            rect,
            pack_type,
            pixel_size,
            comp_count,
            comp_size,
            color_table,
            src,
            dst,
            mode,
            region,
            pixels,
            ramp_extended,
        })
    }

    #[allow(clippy::too_many_arguments, clippy::too_many_lines)]
    fn read_pixel_data<T: Read + Seek>(
        input: &mut InputStream<T>,
        row_bytes: u16,
        rect: Rect,
        pack_type: i16,
        pixel_size: i16,
        comp_count: i16,
        mut packed: bool,
        color_table: &mut Option<ColorTable>,
    ) -> Result<(PixelData, bool)> {
        let width = rect.width() as usize;
        let height = rect.height() as usize;
        let row_bytes = usize::from(row_bytes);

        let mut unit = 3_usize;
        let mut planes = 1_usize;
        let mut data_row_bytes = row_bytes;
        let num_colors = color_table.as_ref().map_or(0, |table| table.colors.len());

        let values_per_byte;
        match pixel_size {
            1 | 2 | 4 | 8 => {
                unit = 1;
                values_per_byte = 8 / pixel_size as usize;
                let needed = (width + values_per_byte - 1) / values_per_byte;
                if row_bytes < needed || row_bytes > needed + 10 {
                    return Err(Error::Invalid("indexed pixmap row bytes"));
                }
                if num_colors == 0 {
                    return Err(Error::Invalid("indexed pixmap without color table"));
                }
            },
            16 => {
                unit = 2;
                values_per_byte = 0;
            },
            32 => {
                values_per_byte = 0;
                if !packed {
                    unit = 4;
                } else if pack_type == 2 {
                    packed = false;
                } else {
                    if comp_count != 3 && comp_count != 4 {
                        return Err(Error::Invalid("pixmap component count"));
                    }
                    planes = comp_count as usize;
                    unit = 1;
                    if planes == 3 {
                        data_row_bytes = 3 * data_row_bytes / 4;
                    }
                }
            },
            _ => return Err(Error::Invalid("pixmap pixel size")),
        }

        let mut indices = Vec::new();
        let mut colors = Vec::new();
        if pixel_size <= 8 {
            indices.reserve(width * height);
        } else {
            colors.reserve(width * height);
        }

        let mut max_index = -1_i32;
        let mut values = Vec::with_capacity(row_bytes + 24);
        for _ in 0..height {
            if packed {
                let packed_row = read_packed_row(input, row_bytes)?;
                if !unpack_row(&packed_row, unit, data_row_bytes, &mut values) {
                    return Err(Error::Invalid("packed pixmap row"));
                }
            } else {
                values = input.read_bytes(row_bytes)?;
            }

            match pixel_size {
                1 | 2 | 4 | 8 => {
                    let max_value = (1_u16 << pixel_size) - 1;
                    let mut x = 0;
                    let mut read_pos = 0;
                    'row: while x < width {
                        let value = *values.get(read_pos).ok_or(Error::Invalid("pixmap row underflow"))?;
                        read_pos += 1;
                        for slot in (0..values_per_byte).rev() {
                            let index = (u16::from(value) >> (slot * pixel_size as usize)) & max_value;
                            max_index = max_index.max(i32::from(index));
                            indices.push(index);
                            x += 1;
                            if x >= width {
                                break 'row;
                            }
                        }
                    }
                },
                16 => {
                    for x in 0..width {
                        let hi = *values.get(2 * x).ok_or(Error::Invalid("pixmap row underflow"))?;
                        let lo = *values.get(2 * x + 1).ok_or(Error::Invalid("pixmap row underflow"))?;
                        let value = (u16::from(hi) << 8) | u16::from(lo);
                        colors.push(Color::new(
                            ((value >> 7) & 0xf8) as u8,
                            ((value >> 2) & 0xf8) as u8,
                            (value << 3) as u8,
                        ));
                    }
                },
                _ if planes == 1 => {
                    let mut read_pos = 0;
                    for _ in 0..width {
                        if unit == 4 {
                            read_pos += 1; // unused alpha byte
                        }
                        let slice = values.get(read_pos..read_pos + 3).ok_or(Error::Invalid("pixmap row underflow"))?;
                        colors.push(Color::new(slice[0], slice[1], slice[2]));
                        read_pos += 3;
                    }
                },
                _ => {
                    // planar: alpha plane (if present) then red, green, blue
                    let mut read_pos = if planes == 4 { width } else { 0 };
                    for _ in 0..width {
                        let r = *values.get(read_pos).ok_or(Error::Invalid("pixmap row underflow"))?;
                        let g = *values.get(read_pos + width).ok_or(Error::Invalid("pixmap row underflow"))?;
                        let b = *values.get(read_pos + 2 * width).ok_or(Error::Invalid("pixmap row underflow"))?;
                        colors.push(Color::new(r, g, b));
                        read_pos += 1;
                    }
                },
            }
        }

        // Out-of-range indices are not fatal: a pixpat stores only the
        // foreground and background colours and expects intermediate indices
        // to interpolate, so the table is extended with a greyscale ramp.
        let mut ramp_extended = false;
        if pixel_size <= 8 && max_index >= num_colors as i32 {
            let table = color_table.get_or_insert_with(ColorTable::default);
            let unset = (max_index - num_colors as i32 + 1) as usize;
            let step = if unset == 1 { 0 } else { 255 / (unset - 1) };
            for index in 0..unset {
                let value = (255 - index * step) as u8;
                table.colors.push(Color::grey(value));
            }
            ramp_extended = true;
        }

        let pixels = if pixel_size <= 8 {
            debug_assert_eq!(indices.len(), width * height);
            PixelData::Indexed(indices)
        } else {
            debug_assert_eq!(colors.len(), width * height);
            PixelData::Direct(colors)
        };
        Ok((pixels, ramp_extended))
    }
}

/// A colour fill pattern: the one-bit pattern plus either a flat colour or
/// a full pixmap.
#[derive(Clone, Debug, PartialEq)]
pub struct PixPattern {
    pub pattern: [u8; 8],
    pub color: Option<Color>,
    pub pixmap: Option<Pixmap>,
}

impl PixPattern {
    pub fn read<T: Read + Seek>(input: &mut InputStream<T>) -> Result<Self> {
        let kind = input.read_u16()?;
        if kind != 1 && kind != 2 {
            return Err(Error::Invalid("pixpat type"));
        }
        let mut pattern = [0; 8];
        for byte in &mut pattern {
            *byte = input.read_u8()?;
        }

        if kind == 2 {
            let mut channel = [0; 3];
            for value in &mut channel {
                *value = (input.read_u16()? & 0xff) as u8;
            }
            return Ok(Self {
                pattern,
                color: Some(Color::new(channel[0], channel[1], channel[2])),
                pixmap: None,
            });
        }

        let pixmap = Pixmap::read(input, false, true, false, false)?;
        Ok(Self { pattern, color: None, pixmap: Some(pixmap) })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use super::*;

    fn stream(data: &[u8]) -> InputStream<Cursor<Vec<u8>>> {
        InputStream::new(Cursor::new(data.to_vec())).unwrap()
    }

    #[test]
    fn unpack_run_and_literals() {
        let mut out = Vec::new();
        // 0xfe = -2: three copies of 0xaa; 0x02: three literals
        assert!(unpack_row(&[0xfe, 0xaa, 0x02, 0x01, 0x02, 0x03], 1, 6, &mut out));
        assert_eq!(out, [0xaa, 0xaa, 0xaa, 0x01, 0x02, 0x03]);
    }

    #[test]
    fn unpack_longest_run() {
        let mut out = Vec::new();
        // 0x81 = -127: 128 copies
        assert!(unpack_row(&[0x81, 0x55], 1, 128, &mut out));
        assert_eq!(out.len(), 128);
        assert!(out.iter().all(|&byte| byte == 0x55));
    }

    #[test]
    fn unpack_short_row_fails() {
        let mut out = Vec::new();
        assert!(!unpack_row(&[0x00, 0xaa], 1, 4, &mut out));
        assert!(!unpack_row(&[0x05, 0x01], 1, 4, &mut out));
    }

    #[test]
    fn bitmap_unpacked_byte_count() {
        // row_bytes 2, bounds 4x8, src/dst same, mode 0, 4 raw rows
        let mut data = vec![0, 2];
        for _ in 0..3 {
            data.extend_from_slice(&[0, 0, 0, 0, 0, 4, 0, 8]);
        }
        data.extend_from_slice(&[0, 0]);
        data.extend_from_slice(&[0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0]);
        data.extend_from_slice(&[0xff]); // trailing opcode byte, not bitmap data
        let bitmap = Bitmap::read(&mut stream(&data), false, false).unwrap();
        assert_eq!(bitmap.data.len(), usize::from(bitmap.row_bytes) * bitmap.rect.height() as usize);
        assert_eq!(bitmap.data[0], 0x12);
    }

    #[test]
    fn packed_bitmap_rows() {
        let mut data = vec![0, 10];
        for _ in 0..3 {
            data.extend_from_slice(&[0, 0, 0, 0, 0, 2, 0, 16]);
        }
        data.extend_from_slice(&[0, 0]);
        // two rows, each packed as a single 10-byte run
        for _ in 0..2 {
            data.extend_from_slice(&[2, 0xf7, 0xcc]);
        }
        let bitmap = Bitmap::read(&mut stream(&data), true, false).unwrap();
        assert_eq!(bitmap.data.len(), 20);
        assert!(bitmap.data.iter().all(|&byte| byte == 0xcc));
    }

    #[test]
    fn color_table_read() {
        let mut data = vec![0, 0, 0, 0]; // seed
        data.extend_from_slice(&[0, 0]); // flags
        data.extend_from_slice(&1i16.to_be_bytes()); // count - 1
        for (index, color) in [(0u16, 0xffu8), (1u16, 0x00u8)].iter() {
            data.extend_from_slice(&index.to_be_bytes());
            for _ in 0..3 {
                data.push(*color);
                data.push(0);
            }
        }
        let table = ColorTable::read(&mut stream(&data)).unwrap();
        assert_eq!(table.colors, [Color::WHITE, Color::BLACK]);
    }

    #[test]
    fn indexed_pixmap_with_ramp_fallback() {
        // 1bpp pixmap, 8 wide, 1 tall, row_bytes 1, empty color table forces
        // the greyscale ramp
        let mut data = Vec::new();
        data.extend_from_slice(&1u16.to_be_bytes()); // row_bytes
        data.extend_from_slice(&[0, 0, 0, 0, 0, 1, 0, 8]); // bounds
        data.extend_from_slice(&0i16.to_be_bytes()); // version
        data.extend_from_slice(&1i16.to_be_bytes()); // pack type 1: unpacked
        data.extend_from_slice(&0i32.to_be_bytes()); // pack size
        data.extend_from_slice(&[0; 8]); // resolution
        data.extend_from_slice(&0i16.to_be_bytes()); // pixel type
        data.extend_from_slice(&1i16.to_be_bytes()); // pixel size
        data.extend_from_slice(&1i16.to_be_bytes()); // comp count
        data.extend_from_slice(&1i16.to_be_bytes()); // comp size
        data.extend_from_slice(&0i32.to_be_bytes()); // plane bytes
        data.extend_from_slice(&[0; 8]); // handle + reserved
        // color table with a single white entry
        data.extend_from_slice(&[0, 0, 0, 0, 0, 0]);
        data.extend_from_slice(&0i16.to_be_bytes());
        data.extend_from_slice(&[0, 0, 0xff, 0, 0xff, 0, 0xff, 0]);
        // one raw row
        data.push(0b0101_0101);

        let pixmap = Pixmap::read(&mut stream(&data), false, true, false, false).unwrap();
        assert!(pixmap.ramp_extended);
        match &pixmap.pixels {
            PixelData::Indexed(indices) => {
                assert_eq!(indices.len(), 8);
                assert_eq!(indices[0], 0);
                assert_eq!(indices[1], 1);
            },
            PixelData::Direct(_) => panic!("expected indices"),
        }
        assert_eq!(pixmap.color_table.as_ref().unwrap().colors.len(), 2);
    }
}
