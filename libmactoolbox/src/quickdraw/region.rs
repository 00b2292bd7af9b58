use libcommon::InputStream;
use std::io::{Read, Seek};
use super::{Error, Point, Rect, Result};

/// A QuickDraw region: a bounding box plus a row-scan point list defining a
/// mask. Decoders keep the points only to seek past the structure and to
/// sanity-check it; the mask itself is never rasterised here.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Region {
    pub bounding_box: Rect,
    pub points: Vec<Point>,
}

impl Region {
    pub fn read<T: Read + Seek>(input: &mut InputStream<T>) -> Result<Self> {
        let start = input.tell();

        let size = input.read_u16()?;
        if size % 2 != 0 {
            return Err(Error::Invalid("region size"));
        }
        let mut words = i32::from(size / 2);
        if words < 5 {
            return Err(Error::Invalid("region size"));
        }

        let bounding_box = Rect::read(input)?;
        words -= 5;
        let mut points = Vec::new();
        if words == 0 {
            return Ok(Self { bounding_box, points });
        }

        if !input.check_pos(start + 10 + 2 * words as u64) {
            return Err(Error::Invalid("region extent"));
        }

        // Scan data is rows of inversion points:
        //   row, col, col, …, 0x7fff, row, col, …, 0x7fff
        while words > 0 {
            let row = input.read_i16()?;
            words -= 1;
            if row == 0x7fff {
                break;
            }
            if row < bounding_box.top || row > bounding_box.bottom {
                return Err(Error::Invalid("region row"));
            }
            let mut terminated = false;
            while words > 0 {
                let col = input.read_i16()?;
                words -= 1;
                if col == 0x7fff {
                    terminated = true;
                    break;
                }
                if col < bounding_box.left || col > bounding_box.right {
                    return Err(Error::Invalid("region column"));
                }
                points.push(Point { x: col, y: row });
            }
            if !terminated {
                return Err(Error::Invalid("region terminator"));
            }
        }
        if words != 0 {
            return Err(Error::Invalid("region trailing data"));
        }

        Ok(Self { bounding_box, points })
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
    fn rectangular_region() {
        let mut input = stream(&[0, 10, 0, 0, 0, 0, 0, 100, 0, 100]);
        let region = Region::read(&mut input).unwrap();
        assert_eq!(region.bounding_box, Rect { top: 0, left: 0, bottom: 100, right: 100 });
        assert!(region.points.is_empty());
        assert_eq!(input.tell(), 10);
    }

    #[test]
    fn scan_points_consume_exact_size() {
        // one row at 2 with inversion points at 3 and 5
        let mut data = vec![0, 20, 0, 0, 0, 0, 0, 10, 0, 10];
        for value in &[2i16, 3, 5, 0x7fff, 0x7fff] {
            data.extend_from_slice(&value.to_be_bytes());
        }
        let mut input = stream(&data);
        let region = Region::read(&mut input).unwrap();
        assert_eq!(region.points, [Point { x: 3, y: 2 }, Point { x: 5, y: 2 }]);
        assert_eq!(input.tell(), 20);
    }

    #[test]
    fn odd_size_is_invalid() {
        assert!(Region::read(&mut stream(&[0, 11, 0, 0, 0, 0, 0, 1, 0, 1, 0])).is_err());
    }

    #[test]
    fn out_of_box_points_are_invalid() {
        let mut data = vec![0, 18, 0, 0, 0, 0, 0, 10, 0, 10];
        for value in &[2i16, 30, 0x7fff, 0x7fff] {
            data.extend_from_slice(&value.to_be_bytes());
        }
        assert!(Region::read(&mut stream(&data)).is_err());
    }
}
