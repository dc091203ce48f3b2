pub mod page;
pub mod error;

pub use page::{Page, INT_SIZE};
pub use error::PageError;
