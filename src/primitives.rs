//! Chunk framing and the handful of fixed-size primitives the format is
//! built out of. Everything on disk is little-endian; there is no padding
//! between fields anywhere in this crate.

use std::io::{Read, Write};

use crate::error::{CdbError, Result};

/// An offset into the file's single string table. `0xFFFF_FFFF` (`NPOS`)
/// marks "no string".
pub type StringRef = u32;

pub const STRING_REF_NPOS: StringRef = 0xFFFF_FFFF;

/// An object's database-wide identity. Zero is reserved and never assigned
/// to a real object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct DbId(pub u32);

impl DbId {
    pub const NONE: DbId = DbId(0);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for DbId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A content-addressed path key: `(file, ext, dir)` hashes, each truncated
/// to 32 bits. Decoded off the wire in `(file, ext, dir)` order, not the
/// `(dir, file, ext)` order the struct's field declaration order might
/// suggest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResourceId {
    pub dir: u32,
    pub file: u32,
    pub ext: u32,
}

impl ResourceId {
    pub fn read<R: Read>(r: &mut R) -> Result<Self> {
        let file = read_u32(r)?;
        let ext = read_u32(r)?;
        let dir = read_u32(r)?;
        Ok(ResourceId { dir, file, ext })
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        write_u32(w, self.file)?;
        write_u32(w, self.ext)?;
        write_u32(w, self.dir)?;
        Ok(())
    }
}

/// Stable string rendering of a `(dir, file, ext)` triple, shared by map-key
/// formatting in `reader` and external-id formatting in `manager`. The
/// original derives this through `GetFormatedResourceId`
/// (`examples/original_source/include/crc.h`), which is out of scope here for
/// the same reason the hash64 derivation is (see DESIGN.md) — this crate
/// uses a locally deterministic hex triple instead of reproducing that
/// external algorithm.
pub fn format_resource_id(id: &ResourceId) -> String {
    format!("{:08x}:{:08x}:{:08x}", id.dir, id.file, id.ext)
}

/// An 8-byte chunk header: a 4-byte ASCII signature plus a little-endian
/// payload size that does not include the header itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub sig: [u8; 4],
    pub size: u32,
}

impl ChunkHeader {
    pub const SIZE: u64 = 8;

    pub fn read<R: Read>(r: &mut R, offset: u64) -> Result<Self> {
        let mut sig = [0u8; 4];
        read_exact(r, &mut sig, offset)?;
        let size = read_u32(r)?;
        Ok(ChunkHeader { sig, size })
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(&self.sig)?;
        write_u32(w, self.size)?;
        Ok(())
    }

    pub fn sig_str(&self) -> &str {
        std::str::from_utf8(&self.sig).unwrap_or("????")
    }
}

macro_rules! leb_rw {
    ($read:ident, $write:ident, $ty:ty) => {
        pub fn $read<R: Read>(r: &mut R) -> Result<$ty> {
            let mut buf = [0u8; std::mem::size_of::<$ty>()];
            read_exact(r, &mut buf, 0)?;
            Ok(<$ty>::from_le_bytes(buf))
        }

        pub fn $write<W: Write>(w: &mut W, v: $ty) -> Result<()> {
            w.write_all(&v.to_le_bytes())?;
            Ok(())
        }
    };
}

leb_rw!(read_u8, write_u8, u8);
leb_rw!(read_u16, write_u16, u16);
leb_rw!(read_u32, write_u32, u32);
leb_rw!(read_u64, write_u64, u64);
leb_rw!(read_i8, write_i8, i8);
leb_rw!(read_i16, write_i16, i16);
leb_rw!(read_i32, write_i32, i32);
leb_rw!(read_i64, write_i64, i64);
leb_rw!(read_f32, write_f32, f32);
leb_rw!(read_f64, write_f64, f64);

/// Like `read_exact`, but a clean EOF before any byte is read returns
/// `Ok(false)` instead of an error — used to detect the end of the
/// component stream, which has no length prefix of its own.
pub fn try_read_exact<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..])? {
            0 if filled == 0 => return Ok(false),
            0 => {
                return Err(CdbError::ShortRead {
                    offset: 0,
                    wanted: buf.len() - filled,
                })
            }
            n => filled += n,
        }
    }
    Ok(true)
}

fn read_exact<R: Read>(r: &mut R, buf: &mut [u8], offset: u64) -> Result<()> {
    r.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            CdbError::ShortRead {
                offset,
                wanted: buf.len(),
            }
        } else {
            CdbError::Io(e)
        }
    })
}

/// Reads a length-prefixed, NUL-terminated string: a `u16` byte count that
/// includes the trailing NUL, followed by that many bytes.
pub fn read_string<R: Read>(r: &mut R) -> Result<String> {
    let len = read_u16(r)? as usize;
    if len == 0 {
        return Ok(String::new());
    }
    let mut buf = vec![0u8; len];
    read_exact(r, &mut buf, 0)?;
    buf.pop(); // trailing NUL
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Writes a string in the length-prefixed, NUL-terminated form `read_string`
/// expects, including the trailing NUL in both the byte count and the body.
pub fn write_string<W: Write>(w: &mut W, s: &str) -> Result<()> {
    let len = s.len() + 1;
    write_u16(w, len as u16)?;
    w.write_all(s.as_bytes())?;
    w.write_all(&[0u8])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn string_round_trip() {
        let mut buf = Vec::new();
        write_string(&mut buf, "BSLightingShaderMaterial").unwrap();
        let mut cur = Cursor::new(buf);
        assert_eq!(read_string(&mut cur).unwrap(), "BSLightingShaderMaterial");
    }

    #[test]
    fn empty_string_has_zero_length() {
        let mut buf = Vec::new();
        write_u16(&mut buf, 0).unwrap();
        let mut cur = Cursor::new(buf);
        assert_eq!(read_string(&mut cur).unwrap(), "");
    }

    #[test]
    fn resource_id_field_order_is_file_ext_dir() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 1).unwrap(); // file
        write_u32(&mut buf, 2).unwrap(); // ext
        write_u32(&mut buf, 3).unwrap(); // dir
        let mut cur = Cursor::new(buf);
        let id = ResourceId::read(&mut cur).unwrap();
        assert_eq!(id, ResourceId { file: 1, ext: 2, dir: 3 });
    }

    #[test]
    fn chunk_header_round_trip() {
        let header = ChunkHeader { sig: *b"OBJT", size: 42 };
        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();
        let mut cur = Cursor::new(buf);
        assert_eq!(ChunkHeader::read(&mut cur, 0).unwrap(), header);
    }
}
