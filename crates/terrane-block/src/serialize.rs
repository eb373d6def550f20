use std::fmt;

/// Oldest block body layout still readable.
pub const SER_FMT_VER_LOWEST: u8 = 1;
/// Layout written by this crate. Version 2 adds the node metadata section.
pub const SER_FMT_VER_HIGHEST: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerializationError {
    Truncated { at: usize, needed: usize },
    UnsupportedVersion(u8),
    InvalidUtf8 { at: usize },
    BadTag { at: usize, tag: u8 },
    BadPosition { at: usize, index: u16 },
    Empty,
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializationError::Truncated { at, needed } => {
                write!(f, "data truncated at byte {at} ({needed} more needed)")
            }
            SerializationError::UnsupportedVersion(v) => {
                write!(f, "unsupported serialization version {v}")
            }
            SerializationError::InvalidUtf8 { at } => write!(f, "invalid utf-8 string at byte {at}"),
            SerializationError::BadTag { at, tag } => write!(f, "unknown value tag {tag} at byte {at}"),
            SerializationError::BadPosition { at, index } => {
                write!(f, "metadata position {index} out of range at byte {at}")
            }
            SerializationError::Empty => write!(f, "empty blob"),
        }
    }
}

impl std::error::Error for SerializationError {}

pub(crate) fn put_u8(out: &mut Vec<u8>, v: u8) {
    out.push(v);
}

pub(crate) fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn put_i64(out: &mut Vec<u8>, v: i64) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Short string: u16 length prefix.
pub(crate) fn put_str16(out: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    let len = bytes.len().min(u16::MAX as usize);
    put_u16(out, len as u16);
    out.extend_from_slice(&bytes[..len]);
}

/// Long string: u32 length prefix.
pub(crate) fn put_str32(out: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    put_u32(out, bytes.len() as u32);
    out.extend_from_slice(bytes);
}

/// Cursor over a byte slice with bounds-checked reads.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], SerializationError> {
        if self.remaining() < n {
            return Err(SerializationError::Truncated {
                at: self.pos,
                needed: n - self.remaining(),
            });
        }
        let s = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    pub fn u8(&mut self) -> Result<u8, SerializationError> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16, SerializationError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u32(&mut self) -> Result<u32, SerializationError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn i64(&mut self) -> Result<i64, SerializationError> {
        let b = self.take(8)?;
        let mut a = [0u8; 8];
        a.copy_from_slice(b);
        Ok(i64::from_le_bytes(a))
    }

    fn string(&mut self, len: usize) -> Result<String, SerializationError> {
        let at = self.pos;
        let b = self.take(len)?;
        String::from_utf8(b.to_vec()).map_err(|_| SerializationError::InvalidUtf8 { at })
    }

    pub fn str16(&mut self) -> Result<String, SerializationError> {
        let len = self.u16()? as usize;
        self.string(len)
    }

    pub fn str32(&mut self) -> Result<String, SerializationError> {
        let len = self.u32()? as usize;
        self.string(len)
    }
}
