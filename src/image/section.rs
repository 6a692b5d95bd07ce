use bitflags::bitflags;
use goblin::pe::section_table::SectionTable;

use crate::{file::io::read_fixed_str, Error, Result};

/// Size of one `IMAGE_SECTION_HEADER` entry.
pub const SECTION_HEADER_SIZE: usize = 40;
/// Width of the (not necessarily NUL-terminated) section name field.
pub const SECTION_NAME_LENGTH: usize = 8;

bitflags! {
    /// The subset of `IMAGE_SCN_*` characteristics that is reported for a section.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SectionCharacteristics: u32 {
        /// `IMAGE_SCN_CNT_CODE`
        const CODE = 0x0000_0020;
        /// `IMAGE_SCN_CNT_INITIALIZED_DATA`
        const INITIALIZED_DATA = 0x0000_0040;
        /// `IMAGE_SCN_CNT_UNINITIALIZED_DATA`
        const UNINITIALIZED_DATA = 0x0000_0080;
        /// `IMAGE_SCN_LNK_INFO`
        const LINKER_INFO = 0x0000_0200;
        /// `IMAGE_SCN_MEM_DISCARDABLE`
        const MEM_DISCARDABLE = 0x0200_0000;
        /// `IMAGE_SCN_MEM_SHARED`
        const MEM_SHARED = 0x1000_0000;
        /// `IMAGE_SCN_MEM_EXECUTE`
        const MEM_EXECUTE = 0x2000_0000;
        /// `IMAGE_SCN_MEM_READ`
        const MEM_READ = 0x4000_0000;
        /// `IMAGE_SCN_MEM_WRITE`
        const MEM_WRITE = 0x8000_0000;
    }
}

/// One entry of the section table (`IMAGE_SECTION_HEADER`).
///
/// A section maps the virtual range `[virtual_address, virtual_address + virtual_size)` onto
/// the file range starting at `pointer_to_raw_data`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    /// Section name such as `.text`, with NUL padding removed
    pub name: String,
    /// Size of the section once loaded
    pub virtual_size: u32,
    /// RVA of the first byte of the section
    pub virtual_address: u32,
    /// Size of the initialized data on disk
    pub size_of_raw_data: u32,
    /// File offset of the section's data
    pub pointer_to_raw_data: u32,
    /// File offset of COFF relocations
    pub pointer_to_relocations: u32,
    /// File offset of COFF line numbers
    pub pointer_to_linenumbers: u32,
    /// Number of COFF relocations
    pub number_of_relocations: u16,
    /// Number of COFF line numbers
    pub number_of_linenumbers: u16,
    /// Raw `IMAGE_SCN_*` bits
    pub characteristics: u32,
}

impl TryFrom<&SectionTable> for Section {
    type Error = Error;

    fn try_from(table: &SectionTable) -> Result<Self> {
        Ok(Section {
            name: read_fixed_str(&table.name, 0, SECTION_NAME_LENGTH)?,
            virtual_size: table.virtual_size,
            virtual_address: table.virtual_address,
            size_of_raw_data: table.size_of_raw_data,
            pointer_to_raw_data: table.pointer_to_raw_data,
            pointer_to_relocations: table.pointer_to_relocations,
            pointer_to_linenumbers: table.pointer_to_linenumbers,
            number_of_relocations: table.number_of_relocations,
            number_of_linenumbers: table.number_of_linenumbers,
            characteristics: table.characteristics,
        })
    }
}

impl Section {
    /// Returns `true` if `rva` falls inside `[virtual_address, virtual_address + virtual_size)`.
    #[must_use]
    pub fn contains_rva(&self, rva: u32) -> bool {
        let start = u64::from(self.virtual_address);
        let end = start + u64::from(self.virtual_size);
        (start..end).contains(&u64::from(rva))
    }

    /// Translate an RVA inside this section to a file offset.
    ///
    /// Returns `None` if the RVA is not inside the section.
    #[must_use]
    pub fn rva_to_offset(&self, rva: u32) -> Option<usize> {
        if !self.contains_rva(rva) {
            return None;
        }

        let skew = (rva - self.virtual_address) as usize;
        (self.pointer_to_raw_data as usize).checked_add(skew)
    }

    /// Characteristics as typed flags; unknown bits are kept.
    #[must_use]
    pub fn flags(&self) -> SectionCharacteristics {
        SectionCharacteristics::from_bits_retain(self.characteristics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_section() -> Section {
        Section {
            name: ".text".to_string(),
            virtual_size: 0x200,
            virtual_address: 0x1000,
            pointer_to_raw_data: 0x400,
            size_of_raw_data: 0x200,
            characteristics: 0x6000_0020,
            ..Default::default()
        }
    }

    fn raw_table(name: &[u8; 8]) -> SectionTable {
        SectionTable {
            name: *name,
            virtual_size: 0x123,
            virtual_address: 0x2000,
            size_of_raw_data: 0x200,
            pointer_to_raw_data: 0x600,
            characteristics: 0x4000_0040,
            ..Default::default()
        }
    }

    #[test]
    fn from_section_table() {
        let section = Section::try_from(&raw_table(b".rdata\0\0")).unwrap();
        assert_eq!(section.name, ".rdata");
        assert_eq!(section.virtual_size, 0x123);
        assert_eq!(section.virtual_address, 0x2000);
        assert_eq!(section.pointer_to_raw_data, 0x600);
        assert_eq!(
            section.flags(),
            SectionCharacteristics::INITIALIZED_DATA | SectionCharacteristics::MEM_READ
        );
    }

    #[test]
    fn full_width_name() {
        let section = Section::try_from(&raw_table(b".textbss")).unwrap();
        assert_eq!(section.name, ".textbss");
    }

    #[test]
    fn range_is_half_open() {
        let section = text_section();
        assert!(section.contains_rva(0x1000));
        assert!(section.contains_rva(0x11FF));
        assert!(!section.contains_rva(0x1200));
        assert!(!section.contains_rva(0x0FFF));
    }

    #[test]
    fn offset_translation() {
        let section = text_section();
        assert_eq!(section.rva_to_offset(0x1000), Some(0x400));
        assert_eq!(section.rva_to_offset(0x1010), Some(0x410));
        assert_eq!(section.rva_to_offset(0x1200), None);
    }

    #[test]
    fn range_near_u32_max() {
        let section = Section {
            virtual_address: u32::MAX - 0x10,
            virtual_size: 0x100,
            ..Default::default()
        };
        assert!(section.contains_rva(u32::MAX));
        assert!(!section.contains_rva(0));
    }
}
