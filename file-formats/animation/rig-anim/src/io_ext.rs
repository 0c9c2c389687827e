//! Native-endian record helpers shared by the skeleton, clip and model decoders
//!
//! All three formats are written in host byte order with no padding between
//! fields, so every reader and writer here goes through `byteorder`'s
//! `NativeEndian`.

use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};
use glam::{Mat4, Quat, Vec3, Vec4};
use memchr::memchr;
use std::io::{self, BufRead, Read, Seek, SeekFrom, Write};

use crate::error::{AnimError, Result, magic_to_string};

/// Reading primitives in the on-disk layout
pub trait ReadExt: Read {
    fn read_u32_ne(&mut self) -> io::Result<u32> {
        self.read_u32::<NativeEndian>()
    }

    fn read_i32_ne(&mut self) -> io::Result<i32> {
        self.read_i32::<NativeEndian>()
    }

    fn read_f32_ne(&mut self) -> io::Result<f32> {
        self.read_f32::<NativeEndian>()
    }

    fn read_vec3(&mut self) -> io::Result<Vec3> {
        let mut v = [0.0f32; 3];
        self.read_f32_into::<NativeEndian>(&mut v)?;
        Ok(Vec3::from_array(v))
    }

    /// Reads a rotation stored as (w, x, y, z) into glam's (x, y, z, w) order
    fn read_quat_wxyz(&mut self) -> io::Result<Quat> {
        let mut q = [0.0f32; 4];
        self.read_f32_into::<NativeEndian>(&mut q)?;
        Ok(Quat::from_xyzw(q[1], q[2], q[3], q[0]))
    }

    /// Reads a 3x4 affine matrix (four columns of three rows) as a 4x4 matrix
    fn read_affine_3x4(&mut self) -> io::Result<Mat4> {
        let mut m = [0.0f32; 12];
        self.read_f32_into::<NativeEndian>(&mut m)?;
        Ok(Mat4::from_cols(
            Vec4::new(m[0], m[1], m[2], 0.0),
            Vec4::new(m[3], m[4], m[5], 0.0),
            Vec4::new(m[6], m[7], m[8], 0.0),
            Vec4::new(m[9], m[10], m[11], 1.0),
        ))
    }
}

impl<R: Read + ?Sized> ReadExt for R {}

/// Writing primitives in the on-disk layout
pub trait WriteExt: Write {
    fn write_u32_ne(&mut self, value: u32) -> io::Result<()> {
        self.write_u32::<NativeEndian>(value)
    }

    fn write_i32_ne(&mut self, value: i32) -> io::Result<()> {
        self.write_i32::<NativeEndian>(value)
    }

    fn write_f32_ne(&mut self, value: f32) -> io::Result<()> {
        self.write_f32::<NativeEndian>(value)
    }

    fn write_vec3(&mut self, v: Vec3) -> io::Result<()> {
        for c in v.to_array() {
            self.write_f32_ne(c)?;
        }
        Ok(())
    }

    fn write_quat_wxyz(&mut self, q: Quat) -> io::Result<()> {
        for c in [q.w, q.x, q.y, q.z] {
            self.write_f32_ne(c)?;
        }
        Ok(())
    }

    /// Writes the upper three rows of an affine matrix, column by column
    fn write_affine_3x4(&mut self, m: &Mat4) -> io::Result<()> {
        for column in [m.x_axis, m.y_axis, m.z_axis, m.w_axis] {
            self.write_vec3(column.truncate())?;
        }
        Ok(())
    }

    fn write_cstring(&mut self, s: &str) -> io::Result<()> {
        self.write_all(s.as_bytes())?;
        self.write_all(&[0])
    }
}

impl<W: Write + ?Sized> WriteExt for W {}

/// Reads a null-terminated string, failing with `TruncatedStream` if the
/// stream ends before the terminator
pub fn read_cstring<R: BufRead + ?Sized>(reader: &mut R, context: &str) -> Result<String> {
    let mut bytes = Vec::new();
    loop {
        let (found, used) = {
            let available = reader.fill_buf()?;
            if available.is_empty() {
                return Err(AnimError::TruncatedStream {
                    context: format!("{context} (missing string terminator)"),
                    needed: bytes.len() as u64 + 1,
                    available: bytes.len() as u64,
                });
            }
            match memchr(0, available) {
                Some(end) => {
                    bytes.extend_from_slice(&available[..end]);
                    (true, end + 1)
                }
                None => {
                    bytes.extend_from_slice(available);
                    (false, available.len())
                }
            }
        };
        reader.consume(used);
        if found {
            break;
        }
    }

    Ok(match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            log::warn!("{context}: string is not valid UTF-8, decoding lossily");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    })
}

/// Number of bytes between the current position and the end of the stream
pub fn remaining_bytes<S: Seek + ?Sized>(stream: &mut S) -> io::Result<u64> {
    let pos = stream.stream_position()?;
    let end = stream.seek(SeekFrom::End(0))?;
    stream.seek(SeekFrom::Start(pos))?;
    Ok(end.saturating_sub(pos))
}

/// Fails with `TruncatedStream` unless at least `needed` bytes remain
pub fn ensure_available<S: Seek + ?Sized>(
    stream: &mut S,
    needed: u64,
    context: impl FnOnce() -> String,
) -> Result<()> {
    let available = remaining_bytes(stream)?;
    if available < needed {
        return Err(AnimError::TruncatedStream {
            context: context(),
            needed,
            available,
        });
    }
    Ok(())
}

/// Reads the leading magic tag and checks it against the format's value
pub(crate) fn expect_magic<R: Read + ?Sized>(
    reader: &mut R,
    expected: u32,
    format: &'static str,
) -> Result<u32> {
    let magic = reader.read_u32_ne()?;
    if magic != expected {
        return Err(AnimError::MalformedHeader {
            format,
            expected: magic_to_string(expected),
            actual: magic_to_string(magic),
        });
    }
    Ok(magic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_quaternion_order_fixup() {
        let mut data = Vec::new();
        // w, x, y, z as stored on disk
        for c in [0.5f32, 0.1, 0.2, 0.3] {
            data.extend_from_slice(&c.to_ne_bytes());
        }

        let q = Cursor::new(data).read_quat_wxyz().unwrap();
        assert_eq!(q.w, 0.5);
        assert_eq!(q.x, 0.1);
        assert_eq!(q.y, 0.2);
        assert_eq!(q.z, 0.3);
    }

    #[test]
    fn test_affine_columns() {
        let mut data = Vec::new();
        for c in 1..=12 {
            data.extend_from_slice(&(c as f32).to_ne_bytes());
        }

        let m = Cursor::new(data).read_affine_3x4().unwrap();
        assert_eq!(m.x_axis, Vec4::new(1.0, 2.0, 3.0, 0.0));
        assert_eq!(m.w_axis, Vec4::new(10.0, 11.0, 12.0, 1.0));
    }

    #[test]
    fn test_read_cstrings() {
        let mut cursor = Cursor::new(b"hips\0\0spine".to_vec());
        assert_eq!(read_cstring(&mut cursor, "name").unwrap(), "hips");
        assert_eq!(read_cstring(&mut cursor, "name").unwrap(), "");

        let err = read_cstring(&mut cursor, "name").unwrap_err();
        assert!(matches!(err, AnimError::TruncatedStream { .. }));
    }

    #[test]
    fn test_ensure_available() {
        let mut cursor = Cursor::new(vec![0u8; 10]);
        cursor.set_position(4);
        assert!(ensure_available(&mut cursor, 6, || "tail".into()).is_ok());

        match ensure_available(&mut cursor, 7, || "tail".into()) {
            Err(AnimError::TruncatedStream {
                needed, available, ..
            }) => {
                assert_eq!(needed, 7);
                assert_eq!(available, 6);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(cursor.position(), 4);
    }
}
