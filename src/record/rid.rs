use std::fmt;

/// Identifies a record by block number and slot within the table file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rid {
    block_num: u64,
    slot: usize,
}

impl Rid {
    pub fn new(block_num: u64, slot: usize) -> Self {
        Self { block_num, slot }
    }

    pub fn block_number(&self) -> u64 {
        self.block_num
    }

    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.block_num, self.slot)
    }
}
