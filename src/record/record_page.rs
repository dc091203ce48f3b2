use std::sync::Arc;

use crate::common::types::BlockId;
use crate::record::error::{RecordError, Result};
use crate::record::layout::Layout;
use crate::record::schema::FieldType;
use crate::transaction::Transaction;

const EMPTY: i32 = 0;
const USED: i32 = 1;

/// A block of fixed-size record slots, accessed through a transaction.
///
/// Constructing a `RecordPage` pins its block; `close` releases that pin.
pub struct RecordPage {
    tx: Arc<Transaction>,
    block: BlockId,
    layout: Arc<Layout>,
}

impl RecordPage {
    pub fn new(tx: Arc<Transaction>, block: BlockId, layout: Arc<Layout>) -> Result<Self> {
        tx.pin(&block)?;
        Ok(Self { tx, block, layout })
    }

    pub fn block(&self) -> &BlockId {
        &self.block
    }

    pub fn get_int(&self, slot: usize, field: &str) -> Result<i32> {
        let pos = self.field_pos(slot, field)?;
        Ok(self.tx.get_int(&self.block, pos)?)
    }

    pub fn get_string(&self, slot: usize, field: &str) -> Result<String> {
        let pos = self.field_pos(slot, field)?;
        Ok(self.tx.get_string(&self.block, pos)?)
    }

    pub fn set_int(&self, slot: usize, field: &str, value: i32) -> Result<()> {
        let pos = self.field_pos(slot, field)?;
        Ok(self.tx.set_int(&self.block, pos, value, true)?)
    }

    /// Fails with `StringTooLong` when `value` exceeds the field's declared length
    pub fn set_string(&self, slot: usize, field: &str, value: &str) -> Result<()> {
        let pos = self.field_pos(slot, field)?;
        let max = self.layout.schema().length(field).unwrap_or(0);
        if value.len() > max {
            return Err(RecordError::StringTooLong {
                field: field.to_string(),
                len: value.len(),
                max,
            });
        }
        Ok(self.tx.set_string(&self.block, pos, value, true)?)
    }

    pub fn delete(&self, slot: usize) -> Result<()> {
        self.set_flag(slot, EMPTY)
    }

    /// Mark every slot EMPTY and zero its fields. Not logged: the block is
    /// new, so there is nothing to undo.
    pub fn format(&self) -> Result<()> {
        let mut slot = 0;
        while self.is_valid_slot(slot) {
            let base = self.offset(slot);
            self.tx.set_int(&self.block, base, EMPTY, false)?;
            let schema = self.layout.schema();
            for field in schema.fields() {
                let pos = base + self.layout.offset(field).unwrap_or(0);
                match schema.field_type(field) {
                    Some(FieldType::Varchar) => self.tx.set_string(&self.block, pos, "", false)?,
                    _ => self.tx.set_int(&self.block, pos, 0, false)?,
                }
            }
            slot += 1;
        }
        Ok(())
    }

    /// Next USED slot after `slot` (or from the start when `None`)
    pub fn next_after(&self, slot: Option<usize>) -> Result<Option<usize>> {
        self.search_after(slot, USED)
    }

    /// Claim the next EMPTY slot after `slot` and mark it USED
    pub fn insert_after(&self, slot: Option<usize>) -> Result<usize> {
        match self.search_after(slot, EMPTY)? {
            Some(found) => {
                self.set_flag(found, USED)?;
                Ok(found)
            }
            None => Err(RecordError::PageFull(self.block.clone())),
        }
    }

    /// Claim the first EMPTY slot in the block
    pub fn insert(&self) -> Result<usize> {
        self.insert_after(None)
    }

    pub fn close(&self) -> Result<()> {
        Ok(self.tx.unpin(&self.block)?)
    }

    /// Number of slots that fit in one block
    pub fn slots_per_block(&self) -> usize {
        self.tx.block_size() / self.layout.slot_size()
    }

    fn set_flag(&self, slot: usize, flag: i32) -> Result<()> {
        self.check_slot(slot)?;
        Ok(self.tx.set_int(&self.block, self.offset(slot), flag, true)?)
    }

    fn search_after(&self, slot: Option<usize>, flag: i32) -> Result<Option<usize>> {
        let mut candidate = slot.map_or(0, |s| s + 1);
        while self.is_valid_slot(candidate) {
            if self.tx.get_int(&self.block, self.offset(candidate))? == flag {
                return Ok(Some(candidate));
            }
            candidate += 1;
        }
        Ok(None)
    }

    fn field_pos(&self, slot: usize, field: &str) -> Result<usize> {
        self.check_slot(slot)?;
        let field_offset = self
            .layout
            .offset(field)
            .ok_or_else(|| RecordError::FieldNotFound(field.to_string()))?;
        Ok(self.offset(slot) + field_offset)
    }

    fn check_slot(&self, slot: usize) -> Result<()> {
        if !self.is_valid_slot(slot) {
            return Err(RecordError::InvalidSlot {
                slot,
                block_size: self.tx.block_size(),
            });
        }
        Ok(())
    }

    fn is_valid_slot(&self, slot: usize) -> bool {
        self.offset(slot + 1) <= self.tx.block_size()
    }

    fn offset(&self, slot: usize) -> usize {
        slot * self.layout.slot_size()
    }
}
