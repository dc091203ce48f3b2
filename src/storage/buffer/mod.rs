pub mod error;
pub mod frame;
pub mod manager;
mod replacer;

pub use error::BufferPoolError;
pub use frame::{Frame, FramePtr};
pub use manager::BufferPoolManager;
