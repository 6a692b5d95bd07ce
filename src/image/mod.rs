//! Validated view over the headers and section table of a PE image.
//!
//! [`crate::image::ImageLayout`] is the starting point for every symbol walk. It is built
//! from a borrowed byte buffer in one pass:
//!
//! 1. check for `MZ` at the start of the buffer
//! 2. follow `e_lfanew` and check for `PE\0\0`
//! 3. decode the DOS, COFF and optional headers with `goblin`
//! 4. decode `number_of_sections` section headers, located directly after the optional
//!    header as sized by `size_of_optional_header`
//!
//! Once constructed, the layout hands out an [`crate::image::AddressResolver`] that borrows
//! the same buffer, which the export and import walkers use for every dereference.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pesym::{image::DataDirectoryType, File};
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("library.dll"))?;
//! let layout = file.layout();
//!
//! for section in layout.sections() {
//!     println!("{:8} RVA {:#010x}", section.name, section.virtual_address);
//! }
//! if let Some(exports) = layout.directory(DataDirectoryType::ExportTable) {
//!     println!("export directory at {:#x}", exports.virtual_address);
//! }
//! # Ok::<(), pesym::Error>(())
//! ```

mod headers;
mod resolver;
mod section;

pub use headers::{
    DataDirectory, DataDirectoryType, DllCharacteristics, DosHeader, FileCharacteristics,
    FileHeader, OptionalHeader, DOS_HEADER_SIZE, DOS_SIGNATURE, FILE_HEADER_SIZE,
    MAX_DIRECTORY_ENTRIES, NT_SIGNATURE, OPTIONAL_HEADER_SIZE, PE32_MAGIC, PE32_PLUS_MAGIC,
};
pub use resolver::AddressResolver;
pub use section::{Section, SectionCharacteristics, SECTION_HEADER_SIZE, SECTION_NAME_LENGTH};

use goblin::pe::header::Header;

use crate::{
    file::io::read_le_at,
    Error::{BadDosSignature, BadNtSignature, GoblinErr},
    Result,
};

/// File offset of `e_lfanew` inside the DOS header.
const E_LFANEW_OFFSET: usize = 0x3C;

/// Parsed headers and section table of a PE32 image, borrowing the file's bytes.
#[derive(Debug, Clone)]
pub struct ImageLayout<'a> {
    data: &'a [u8],
    dos_header: DosHeader,
    file_header: FileHeader,
    optional_header: OptionalHeader,
    sections: Vec<Section>,
}

impl<'a> ImageLayout<'a> {
    /// Parse and validate the headers of the image contained in `data`.
    ///
    /// # Errors
    /// - [`crate::Error::BadDosSignature`] if the buffer does not start with `MZ`
    /// - [`crate::Error::BadNtSignature`] if `e_lfanew` does not point at `PE\0\0`
    /// - [`crate::Error::Malformed`] if `e_lfanew` points into the DOS header itself
    /// - [`crate::Error::OutOfBounds`] if the buffer ends before the NT signature
    /// - [`crate::Error::GoblinErr`] if `goblin` rejects the headers or the section table
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let mut offset = 0;
        let e_magic: u16 = read_le_at(data, &mut offset)?;
        if e_magic != DOS_SIGNATURE {
            return Err(BadDosSignature(e_magic));
        }

        offset = E_LFANEW_OFFSET;
        let e_lfanew: u32 = read_le_at(data, &mut offset)?;
        if (e_lfanew as usize) < DOS_HEADER_SIZE {
            return Err(malformed_error!(
                "e_lfanew {:#x} points into the DOS header",
                e_lfanew
            ));
        }

        offset = e_lfanew as usize;
        let signature: u32 = read_le_at(data, &mut offset)?;
        if signature != NT_SIGNATURE {
            return Err(BadNtSignature(signature));
        }

        let header = Header::parse(data).map_err(GoblinErr)?;
        let Some(optional) = header.optional_header.as_ref() else {
            return Err(malformed_error!("File does not have an OptionalHeader"));
        };

        let file_header = FileHeader::from(&header.coff_header);
        let optional_header = OptionalHeader::from(optional);

        let mut section_table = (e_lfanew as usize)
            .checked_add(4 + FILE_HEADER_SIZE)
            .and_then(|start| start.checked_add(usize::from(file_header.size_of_optional_header)))
            .ok_or(out_of_bounds_error!())?;
        let sections = header
            .coff_header
            .sections(data, &mut section_table)
            .map_err(GoblinErr)?
            .iter()
            .map(Section::try_from)
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "image: {} sections, {} data directories",
            sections.len(),
            optional_header.number_of_rva_and_sizes
        );

        Ok(ImageLayout {
            data,
            dos_header: header.dos_header,
            file_header,
            optional_header,
            sections,
        })
    }

    /// The complete file buffer this layout was parsed from.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// `IMAGE_DOS_HEADER`
    #[must_use]
    pub fn dos_header(&self) -> &DosHeader {
        &self.dos_header
    }

    /// `IMAGE_FILE_HEADER`
    #[must_use]
    pub fn file_header(&self) -> &FileHeader {
        &self.file_header
    }

    /// `IMAGE_OPTIONAL_HEADER`, decoded as PE32 or PE32+ according to its magic.
    #[must_use]
    pub fn optional_header(&self) -> &OptionalHeader {
        &self.optional_header
    }

    /// The section table in file order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Returns `true` if no data directory of this image can be used.
    ///
    /// That is the case when the optional header declares zero entries, and for every
    /// PE32+ image, whose tables are not walked.
    #[must_use]
    pub fn has_no_directories(&self) -> bool {
        self.optional_header.is_pe32_plus() || self.optional_header.number_of_rva_and_sizes == 0
    }

    /// Look up a data directory.
    ///
    /// Returns `None` if the image has no usable directories, the slot is beyond
    /// `number_of_rva_and_sizes` or its RVA is zero.
    #[must_use]
    pub fn directory(&self, kind: DataDirectoryType) -> Option<DataDirectory> {
        let index = kind.index();
        if self.has_no_directories()
            || index >= self.optional_header.number_of_rva_and_sizes as usize
        {
            return None;
        }

        let directory = self.optional_header.data_directories[index];
        (directory.virtual_address != 0).then_some(directory)
    }

    /// The DOS header plus stub, i.e. all bytes before the NT headers.
    #[must_use]
    pub fn dos_stub(&self) -> &'a [u8] {
        let end = (self.dos_header.pe_pointer as usize).min(self.data.len());
        &self.data[..end]
    }

    /// An address resolver over this image's buffer and section table.
    #[must_use]
    pub fn resolver(&self) -> AddressResolver<'_> {
        AddressResolver::new(self.data, &self.sections)
    }
}
