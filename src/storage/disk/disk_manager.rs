use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use log::{debug, info};
use parking_lot::Mutex;
use thiserror::Error;

use crate::common::types::BlockId;
use crate::storage::page::Page;

#[derive(Error, Debug)]
pub enum DiskManagerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Page of {actual} bytes does not match block size {expected}")]
    BlockSizeMismatch { expected: usize, actual: usize },
    #[error("Invalid block: {0}")]
    InvalidBlock(BlockId),
}

/// DiskManager is responsible for handling the actual disk I/O operations.
///
/// Every file in the data directory is a sequence of `block_size` blocks.
/// Access is always whole-block.
pub struct DiskManager {
    db_dir: PathBuf,
    block_size: usize,
    is_new: bool,
    open_files: Mutex<HashMap<String, File>>,
    blocks_read: AtomicU64,
    blocks_written: AtomicU64,
}

impl DiskManager {
    /// Open (creating if needed) the data directory `db_dir`
    pub fn new(db_dir: impl AsRef<Path>, block_size: usize) -> Result<Self, DiskManagerError> {
        let db_dir = db_dir.as_ref().to_path_buf();
        let is_new = !db_dir.exists();
        if is_new {
            fs::create_dir_all(&db_dir)?;
            info!("Created data directory {:?}", db_dir);
        }

        // Temporary tables from a previous run are never needed again
        for entry in fs::read_dir(&db_dir)? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with("temp") {
                debug!("Removing leftover temporary file {:?}", entry.path());
                fs::remove_file(entry.path())?;
            }
        }

        Ok(Self {
            db_dir,
            block_size,
            is_new,
            open_files: Mutex::new(HashMap::new()),
            blocks_read: AtomicU64::new(0),
            blocks_written: AtomicU64::new(0),
        })
    }

    /// Read a block from disk into `page`.
    /// Blocks past the end of the file read as zeros.
    pub fn read(&self, block: &BlockId, page: &mut Page) -> Result<(), DiskManagerError> {
        self.check_page(page)?;
        let offset = self.block_offset(block)?;

        let mut files = self.open_files.lock();
        let file = Self::get_file(&mut files, &self.db_dir, &block.file_name)?;

        let file_size = file.metadata()?.len();
        if offset >= file_size {
            page.clear();
        } else {
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(page.contents_mut())?;
        }

        self.blocks_read.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Write `page` to its block on disk
    pub fn write(&self, block: &BlockId, page: &Page) -> Result<(), DiskManagerError> {
        self.check_page(page)?;
        let offset = self.block_offset(block)?;

        let mut files = self.open_files.lock();
        let file = Self::get_file(&mut files, &self.db_dir, &block.file_name)?;

        file.seek(SeekFrom::Start(offset))?;
        file.write_all(page.contents())?;
        file.sync_data()?;

        self.blocks_written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Extend `file_name` by one zero-filled block and return its identity
    pub fn append(&self, file_name: &str) -> Result<BlockId, DiskManagerError> {
        let mut files = self.open_files.lock();
        let file = Self::get_file(&mut files, &self.db_dir, file_name)?;

        let new_block_num = file.metadata()?.len() / self.block_size as u64;
        let block = BlockId::new(file_name, new_block_num);

        file.seek(SeekFrom::Start(new_block_num * self.block_size as u64))?;
        file.write_all(&vec![0u8; self.block_size])?;
        file.sync_data()?;

        self.blocks_written.fetch_add(1, Ordering::Relaxed);
        Ok(block)
    }

    /// Number of blocks in `file_name`
    pub fn length(&self, file_name: &str) -> Result<u64, DiskManagerError> {
        let mut files = self.open_files.lock();
        let file = Self::get_file(&mut files, &self.db_dir, file_name)?;
        Ok(file.metadata()?.len() / self.block_size as u64)
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Whether the data directory was created by this instance
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn db_dir(&self) -> &Path {
        &self.db_dir
    }

    pub fn blocks_read(&self) -> u64 {
        self.blocks_read.load(Ordering::Relaxed)
    }

    pub fn blocks_written(&self) -> u64 {
        self.blocks_written.load(Ordering::Relaxed)
    }

    fn get_file<'a>(
        files: &'a mut HashMap<String, File>,
        db_dir: &Path,
        file_name: &str,
    ) -> Result<&'a mut File, DiskManagerError> {
        if !files.contains_key(file_name) {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(db_dir.join(file_name))?;
            files.insert(file_name.to_string(), file);
        }
        files
            .get_mut(file_name)
            .ok_or_else(|| DiskManagerError::InvalidBlock(BlockId::new(file_name, 0)))
    }

    fn block_offset(&self, block: &BlockId) -> Result<u64, DiskManagerError> {
        block
            .block_num
            .checked_mul(self.block_size as u64)
            .ok_or_else(|| DiskManagerError::InvalidBlock(block.clone()))
    }

    fn check_page(&self, page: &Page) -> Result<(), DiskManagerError> {
        if page.size() != self.block_size {
            return Err(DiskManagerError::BlockSizeMismatch {
                expected: self.block_size,
                actual: page.size(),
            });
        }
        Ok(())
    }
}
