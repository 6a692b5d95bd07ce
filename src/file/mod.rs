//! PE file abstraction over different data sources.
//!
//! A [`crate::file::File`] owns the raw bytes of an image, either memory-mapped from disk or
//! held in an owned buffer, together with the [`crate::image::ImageLayout`] parsed from
//! them. Loading validates the DOS and NT signatures and decodes the header structures
//! with `goblin`, so a `File` that exists always has structurally valid headers.
//!
//! # Key Components
//!
//! - [`crate::file::File`] - Loaded image plus its parsed layout
//! - [`crate::file::Backend`] - Trait for data sources (disk files, memory buffers)
//! - [`crate::file::parser::Parser`] - Cursor over a byte slice with bounded reads
//! - [`crate::file::io`] - Little-endian and string read helpers
//!
//! # Examples
//!
//! ## Loading from File
//!
//! ```rust,no_run
//! use pesym::File;
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("kernel32.dll"))?;
//! println!("Loaded PE file with {} bytes", file.len());
//! println!("Number of sections: {}", file.layout().sections().len());
//! # Ok::<(), pesym::Error>(())
//! ```
//!
//! ## Loading from Memory
//!
//! ```rust,no_run
//! use pesym::File;
//! use std::fs;
//!
//! let data = fs::read("kernel32.dll")?;
//! let file = File::from_mem(data)?;
//! println!("Image base: {:#x}", file.layout().optional_header().image_base);
//! # Ok::<(), pesym::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! Backends are `Send + Sync`; a loaded `File` can be shared across threads.

pub mod io;
pub mod parser;

mod memory;
mod physical;

pub use memory::Memory;
pub use physical::Physical;

use std::path::Path;

use crate::{image::ImageLayout, Error::Empty, Result};
use ouroboros::self_referencing;

/// Backend trait for file data sources.
///
/// All implementations must be thread-safe.
pub trait Backend: Send + Sync {
    /// Get a bounds-checked slice of the data.
    ///
    /// # Arguments
    /// * `offset` - Start offset
    /// * `len` - Number of bytes
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range does not fit.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// The complete data.
    fn data(&self) -> &[u8];

    /// Total length in bytes.
    fn len(&self) -> usize;
}

/// A loaded PE image.
///
/// Owns its backend and the [`crate::image::ImageLayout`] borrowed from it, so the layout
/// and every resolver handed out by it live exactly as long as the bytes.
#[self_referencing]
pub struct File {
    /// The underlying data source
    data: Box<dyn Backend>,
    /// Headers and section table parsed from `data`
    #[borrows(data)]
    #[covariant]
    layout: ImageLayout<'this>,
}

impl File {
    /// Loads a PE image from disk using memory-mapped I/O.
    ///
    /// # Arguments
    /// * `file` - Path to the image
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is empty, or does not carry valid DOS
    /// and NT headers.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;

        Self::load(input)
    }

    /// Loads a PE image from a memory buffer.
    ///
    /// # Arguments
    /// * `data` - The bytes of the image
    ///
    /// # Errors
    /// Returns an error if the buffer is empty or does not carry valid DOS and NT headers.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        let input = Memory::new(data);

        Self::load(input)
    }

    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        let data: Box<dyn Backend> = Box::new(data);
        File::try_new(data, |data| ImageLayout::parse(data.data()))
    }

    /// Returns the total size of the loaded file in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.borrow_data().len()
    }

    /// Returns `true` if the file has a length of zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The parsed headers and section table.
    #[must_use]
    pub fn layout(&self) -> &ImageLayout<'_> {
        self.borrow_layout()
    }

    /// The complete file contents.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.borrow_data().data()
    }

    /// A bounds-checked slice of the file contents.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range does not fit.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.borrow_data().data_slice(offset, len)
    }

    /// Translate an RVA into a file offset through the section table.
    ///
    /// # Errors
    /// Returns [`crate::Error::RvaNotMapped`] if no section covers `rva`.
    pub fn rva_to_offset(&self, rva: u32) -> Result<usize> {
        self.layout()
            .resolver()
            .to_file_offset(rva)
            .ok_or(crate::Error::RvaNotMapped(rva))
    }
}
