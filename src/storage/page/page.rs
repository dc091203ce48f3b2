use byteorder::{ByteOrder, LittleEndian};

use super::error::PageError;

/// Size in bytes of an integer field on a page
pub const INT_SIZE: usize = 4;

/// A block-sized in-memory byte buffer with typed accessors.
///
/// Integers are stored as 4-byte little-endian values. Byte arrays (and
/// therefore strings) are stored as a 4-byte length followed by the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    data: Vec<u8>,
}

impl Page {
    /// Create a zero-filled page of `block_size` bytes
    pub fn new(block_size: usize) -> Self {
        Self {
            data: vec![0; block_size],
        }
    }

    /// Wrap an existing buffer, e.g. a block read by a test straight from disk
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Number of bytes a string of at most `strlen` bytes occupies on a page
    pub fn max_length(strlen: usize) -> usize {
        INT_SIZE + strlen
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn get_int(&self, offset: usize) -> Result<i32, PageError> {
        let bytes = self.slice(offset, INT_SIZE)?;
        Ok(LittleEndian::read_i32(bytes))
    }

    pub fn set_int(&mut self, offset: usize, value: i32) -> Result<(), PageError> {
        let bytes = self.slice_mut(offset, INT_SIZE)?;
        LittleEndian::write_i32(bytes, value);
        Ok(())
    }

    pub fn get_bytes(&self, offset: usize) -> Result<&[u8], PageError> {
        let len = LittleEndian::read_u32(self.slice(offset, INT_SIZE)?) as usize;
        self.slice(offset + INT_SIZE, len)
    }

    pub fn set_bytes(&mut self, offset: usize, bytes: &[u8]) -> Result<(), PageError> {
        // Bounds are checked for the whole value before anything is written
        self.slice(offset, INT_SIZE + bytes.len())?;
        LittleEndian::write_u32(self.slice_mut(offset, INT_SIZE)?, bytes.len() as u32);
        self.slice_mut(offset + INT_SIZE, bytes.len())?
            .copy_from_slice(bytes);
        Ok(())
    }

    pub fn get_string(&self, offset: usize) -> Result<String, PageError> {
        let bytes = self.get_bytes(offset)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| PageError::InvalidUtf8)
    }

    pub fn set_string(&mut self, offset: usize, value: &str) -> Result<(), PageError> {
        self.set_bytes(offset, value.as_bytes())
    }

    /// Raw contents, used by the disk manager for whole-block I/O
    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    pub fn contents_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Zero the whole page
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    fn slice(&self, offset: usize, len: usize) -> Result<&[u8], PageError> {
        self.check(offset, len)?;
        Ok(&self.data[offset..offset + len])
    }

    fn slice_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8], PageError> {
        self.check(offset, len)?;
        Ok(&mut self.data[offset..offset + len])
    }

    fn check(&self, offset: usize, len: usize) -> Result<(), PageError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(PageError::OutOfBounds {
                offset,
                len,
                page_size: self.data.len(),
            }),
        }
    }
}
