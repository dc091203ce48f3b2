// Table Scan Operator
//
// Walks every USED slot of a table file, block by block.

use std::sync::Arc;
use log::debug;

use crate::common::types::BlockId;
use crate::query::executor::expression::Constant;
use crate::query::executor::operators::{Scan, UpdateScan};
use crate::query::executor::result::{QueryError, QueryResult};
use crate::record::{FieldType, Layout, RecordError, RecordPage, Rid};
use crate::transaction::Transaction;

/// Updatable scan over the records of table `<name>.tbl`
pub struct TableScan {
    tx: Arc<Transaction>,
    layout: Arc<Layout>,
    file_name: String,
    record_page: Option<RecordPage>,
    current_slot: Option<usize>,
}

impl TableScan {
    pub fn new(tx: Arc<Transaction>, table_name: &str, layout: Arc<Layout>) -> QueryResult<Self> {
        let mut scan = Self {
            tx,
            layout,
            file_name: format!("{}.tbl", table_name),
            record_page: None,
            current_slot: None,
        };
        if scan.tx.size(&scan.file_name)? == 0 {
            scan.move_to_new_block()?;
        } else {
            scan.move_to_block(0)?;
        }
        Ok(scan)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    fn page(&self) -> QueryResult<&RecordPage> {
        self.record_page
            .as_ref()
            .ok_or(QueryError::RecordError(RecordError::NoCurrentRecord))
    }

    fn current(&self) -> QueryResult<(&RecordPage, usize)> {
        let page = self.page()?;
        let slot = self
            .current_slot
            .ok_or(QueryError::RecordError(RecordError::NoCurrentRecord))?;
        Ok((page, slot))
    }

    fn close_page(&mut self) -> QueryResult<()> {
        if let Some(page) = self.record_page.take() {
            page.close()?;
        }
        Ok(())
    }

    fn move_to_block(&mut self, block_num: u64) -> QueryResult<()> {
        self.close_page()?;
        let block = BlockId::new(self.file_name.clone(), block_num);
        self.record_page = Some(RecordPage::new(self.tx.clone(), block, self.layout.clone())?);
        self.current_slot = None;
        Ok(())
    }

    fn move_to_new_block(&mut self) -> QueryResult<()> {
        self.close_page()?;
        let block = self.tx.append(&self.file_name)?;
        debug!("Formatting new block {}", block);
        let page = RecordPage::new(self.tx.clone(), block, self.layout.clone())?;
        page.format()?;
        self.record_page = Some(page);
        self.current_slot = None;
        Ok(())
    }

    fn current_block_num(&self) -> QueryResult<u64> {
        Ok(self.page()?.block().number())
    }

    fn at_last_block(&self) -> QueryResult<bool> {
        Ok(self.current_block_num()? + 1 >= self.tx.size(&self.file_name)?)
    }

    fn field_type(&self, field: &str) -> QueryResult<FieldType> {
        self.layout
            .schema()
            .field_type(field)
            .ok_or_else(|| QueryError::ColumnNotFound(field.to_string()))
    }
}

impl Scan for TableScan {
    fn before_first(&mut self) -> QueryResult<()> {
        self.move_to_block(0)
    }

    fn next(&mut self) -> QueryResult<bool> {
        loop {
            let found = self.page()?.next_after(self.current_slot)?;
            if let Some(slot) = found {
                self.current_slot = Some(slot);
                return Ok(true);
            }
            if self.at_last_block()? {
                return Ok(false);
            }
            let next_block = self.current_block_num()? + 1;
            self.move_to_block(next_block)?;
        }
    }

    fn get_int(&self, field: &str) -> QueryResult<i32> {
        let (page, slot) = self.current()?;
        Ok(page.get_int(slot, field)?)
    }

    fn get_string(&self, field: &str) -> QueryResult<String> {
        let (page, slot) = self.current()?;
        Ok(page.get_string(slot, field)?)
    }

    fn get_val(&self, field: &str) -> QueryResult<Constant> {
        match self.field_type(field)? {
            FieldType::Integer => Ok(Constant::Int(self.get_int(field)?)),
            FieldType::Varchar => Ok(Constant::Str(self.get_string(field)?)),
        }
    }

    fn has_field(&self, field: &str) -> bool {
        self.layout.schema().has_field(field)
    }

    fn close(&mut self) -> QueryResult<()> {
        self.current_slot = None;
        self.close_page()
    }
}

impl UpdateScan for TableScan {
    fn set_int(&mut self, field: &str, value: i32) -> QueryResult<()> {
        let (page, slot) = self.current()?;
        Ok(page.set_int(slot, field, value)?)
    }

    fn set_string(&mut self, field: &str, value: &str) -> QueryResult<()> {
        let (page, slot) = self.current()?;
        Ok(page.set_string(slot, field, value)?)
    }

    fn set_val(&mut self, field: &str, value: &Constant) -> QueryResult<()> {
        match (self.field_type(field)?, value) {
            (FieldType::Integer, Constant::Int(v)) => self.set_int(field, *v),
            (FieldType::Varchar, Constant::Str(s)) => self.set_string(field, s),
            (expected, _) => Err(QueryError::TypeError(format!(
                "{} expects a {} value, got {}",
                field, expected, value
            ))),
        }
    }

    /// Claims the next free slot, moving on to later blocks when the current
    /// one is full and appending a fresh block after the last. A layout whose
    /// slot exceeds the block size is rejected before any block is added.
    fn insert(&mut self) -> QueryResult<()> {
        if self.layout.slot_size() > self.tx.block_size() {
            return Err(RecordError::SlotTooLarge {
                slot_size: self.layout.slot_size(),
                block_size: self.tx.block_size(),
            }
            .into());
        }
        loop {
            let claimed = self.page()?.insert_after(self.current_slot);
            match claimed {
                Ok(slot) => {
                    self.current_slot = Some(slot);
                    return Ok(());
                }
                Err(RecordError::PageFull(_)) => {
                    if self.at_last_block()? {
                        self.move_to_new_block()?;
                    } else {
                        let next_block = self.current_block_num()? + 1;
                        self.move_to_block(next_block)?;
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn delete(&mut self) -> QueryResult<()> {
        let (page, slot) = self.current()?;
        Ok(page.delete(slot)?)
    }

    fn rid(&self) -> QueryResult<Rid> {
        let (page, slot) = self.current()?;
        Ok(Rid::new(page.block().number(), slot))
    }

    fn move_to_rid(&mut self, rid: Rid) -> QueryResult<()> {
        self.move_to_block(rid.block_number())?;
        self.current_slot = Some(rid.slot());
        Ok(())
    }
}
