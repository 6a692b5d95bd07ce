//! Translation of relative virtual addresses into file offsets.
//!
//! RVAs stored inside a PE image describe the loaded memory layout, not the file. The
//! [`crate::image::AddressResolver`] maps them back onto the raw buffer using the section
//! table: the first section whose virtual range contains the RVA wins, and the file offset
//! is that section's `pointer_to_raw_data` plus the distance from its `virtual_address`.
//!
//! Lookups are total. [`crate::image::AddressResolver::find_section`] and
//! [`crate::image::AddressResolver::to_file_offset`] answer `None` for an RVA outside every
//! section; the `read_*_at_rva` helpers turn that into [`crate::Error::RvaNotMapped`] so the
//! caller can skip the record instead of dereferencing a sentinel.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pesym::File;
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("library.dll"))?;
//! let layout = file.layout();
//! let resolver = layout.resolver();
//!
//! match resolver.to_file_offset(0x1000) {
//!     Some(offset) => println!("RVA 0x1000 is at file offset {offset:#x}"),
//!     None => println!("RVA 0x1000 is not mapped"),
//! }
//! # Ok::<(), pesym::Error>(())
//! ```

use crate::{
    file::io::{read_cstr_at, read_le_at, PeIO},
    image::Section,
    Error::{OutOfBounds, RvaNotMapped},
    Result,
};

/// Maps RVAs onto the bytes of one image.
///
/// The resolver borrows both the buffer and the section table of an
/// [`crate::image::ImageLayout`], so it can never outlive the data it reads from.
#[derive(Debug, Clone, Copy)]
pub struct AddressResolver<'a> {
    data: &'a [u8],
    sections: &'a [Section],
}

impl<'a> AddressResolver<'a> {
    /// Create a resolver over `data` using `sections` for translation.
    #[must_use]
    pub fn new(data: &'a [u8], sections: &'a [Section]) -> Self {
        AddressResolver { data, sections }
    }

    /// The underlying file bytes.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Find the first section whose virtual range contains `rva`.
    #[must_use]
    pub fn find_section(&self, rva: u32) -> Option<&'a Section> {
        self.sections.iter().find(|section| section.contains_rva(rva))
    }

    /// Translate `rva` into a file offset.
    ///
    /// The returned offset is not checked against the buffer length; the read helpers
    /// below perform that check.
    #[must_use]
    pub fn to_file_offset(&self, rva: u32) -> Option<usize> {
        self.find_section(rva)?.rva_to_offset(rva)
    }

    fn offset_of(&self, rva: u32) -> Result<usize> {
        self.to_file_offset(rva).ok_or(RvaNotMapped(rva))
    }

    fn read_at_rva<T: PeIO>(&self, rva: u32) -> Result<T> {
        let mut offset = self.offset_of(rva)?;
        read_le_at(self.data, &mut offset)
    }

    /// Read a little-endian `u16` stored at `rva`.
    ///
    /// # Errors
    /// [`crate::Error::RvaNotMapped`] if no section covers `rva`, [`crate::Error::OutOfBounds`]
    /// if the translated offset points past the end of the file.
    pub fn read_u16_at_rva(&self, rva: u32) -> Result<u16> {
        self.read_at_rva(rva)
    }

    /// Read a little-endian `u32` stored at `rva`.
    ///
    /// # Errors
    /// [`crate::Error::RvaNotMapped`] if no section covers `rva`, [`crate::Error::OutOfBounds`]
    /// if the translated offset points past the end of the file.
    pub fn read_u32_at_rva(&self, rva: u32) -> Result<u32> {
        self.read_at_rva(rva)
    }

    /// Read the NUL-terminated byte string that starts at `rva`.
    ///
    /// The terminator is not required; the string ends at the end of the file at the latest.
    ///
    /// # Errors
    /// [`crate::Error::RvaNotMapped`] if no section covers `rva`, [`crate::Error::OutOfBounds`]
    /// if the translated offset points past the end of the file.
    pub fn read_cstr_at_rva(&self, rva: u32) -> Result<&'a [u8]> {
        read_cstr_at(self.data, self.offset_of(rva)?)
    }

    /// Borrow `len` bytes starting at `rva`.
    ///
    /// # Errors
    /// [`crate::Error::RvaNotMapped`] if no section covers `rva`, [`crate::Error::OutOfBounds`]
    /// if the range does not fit in the file.
    pub fn slice_at_rva(&self, rva: u32, len: usize) -> Result<&'a [u8]> {
        let offset = self.offset_of(rva)?;
        let Some(end) = offset.checked_add(len) else {
            return Err(OutOfBounds);
        };

        self.data.get(offset..end).ok_or(OutOfBounds)
    }
}
