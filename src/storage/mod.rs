// AmberDB Storage Module
//
// Block I/O, in-memory pages and the buffer pool.

pub mod disk;
pub mod page;
pub mod buffer;
