use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("Access of {len} bytes at offset {offset} exceeds page size {page_size}")]
    OutOfBounds { offset: usize, len: usize, page_size: usize },
    #[error("Stored string is not valid UTF-8")]
    InvalidUtf8,
}
