//! Header views over the structures decoded by `goblin`.
//!
//! `goblin` reads the DOS header, COFF file header and optional header. The types here
//! keep the fields this crate reports, with machine, subsystem and flag names attached.
//! PE32 and PE32+ optional headers are both decoded, but only PE32 images expose their
//! data directories.

use bitflags::bitflags;
use goblin::pe::{
    data_directories::DataDirectory as RawDataDirectory, header::CoffHeader,
    optional_header::OptionalHeader as RawOptionalHeader,
};
use strum::{Display, EnumCount, EnumIter};

/// `MZ`
pub const DOS_SIGNATURE: u16 = 0x5A4D;
/// `PE\0\0`
pub const NT_SIGNATURE: u32 = 0x0000_4550;
/// Optional header magic of a PE32 image.
pub const PE32_MAGIC: u16 = 0x010B;
/// Optional header magic of a PE32+ image.
pub const PE32_PLUS_MAGIC: u16 = 0x020B;
/// Number of data directory slots in the optional header.
pub const MAX_DIRECTORY_ENTRIES: usize = 16;
/// Size of `IMAGE_DOS_HEADER`.
pub const DOS_HEADER_SIZE: usize = 64;
/// Size of `IMAGE_FILE_HEADER`.
pub const FILE_HEADER_SIZE: usize = 20;
/// Size of the PE32 `IMAGE_OPTIONAL_HEADER`, including all sixteen directories.
pub const OPTIONAL_HEADER_SIZE: usize = 224;

/// `IMAGE_DOS_HEADER`, as decoded by `goblin`.
pub use goblin::pe::header::DosHeader;

bitflags! {
    /// The subset of `IMAGE_FILE_HEADER::Characteristics` that is reported.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FileCharacteristics: u16 {
        /// There are no relocations in this file
        const NO_RELOC = 0x0001;
        /// File is an executable image (not a OBJ or LIB)
        const EXE = 0x0002;
        /// File is a dynamic-link library, not a program
        const DLL = 0x2000;
    }
}

/// `IMAGE_FILE_HEADER`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHeader {
    /// Target machine id
    pub machine: u16,
    /// Number of entries in the section table
    pub number_of_sections: u16,
    /// Seconds since the Unix epoch at link time
    pub time_date_stamp: u32,
    /// File offset of the COFF symbol table
    pub pointer_to_symbol_table: u32,
    /// Number of COFF symbols
    pub number_of_symbols: u32,
    /// Size of the optional header; the section table follows it
    pub size_of_optional_header: u16,
    /// Raw characteristics bits
    pub characteristics: u16,
}

impl From<&CoffHeader> for FileHeader {
    fn from(coff: &CoffHeader) -> Self {
        FileHeader {
            machine: coff.machine,
            number_of_sections: coff.number_of_sections,
            time_date_stamp: coff.time_date_stamp,
            pointer_to_symbol_table: coff.pointer_to_symbol_table,
            number_of_symbols: coff.number_of_symbol_table,
            size_of_optional_header: coff.size_of_optional_header,
            characteristics: coff.characteristics,
        }
    }
}

impl FileHeader {
    /// Characteristics as typed flags; unknown bits are kept.
    #[must_use]
    pub fn flags(&self) -> FileCharacteristics {
        FileCharacteristics::from_bits_retain(self.characteristics)
    }

    /// Human readable machine architecture.
    #[must_use]
    pub fn machine_name(&self) -> &'static str {
        match self.machine {
            0x14D => "INTEL_I860",
            0x14C => "INTEL_I386",
            0x162 => "MIPS R3000",
            0x166 => "MIPS R4000",
            0x183 => "DEC_ALPHA_AXP",
            0x8664 => "WIN_64",
            _ => "UNKNOWN",
        }
    }
}

/// Indexes into the optional header's data directory array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount)]
#[allow(missing_docs)]
pub enum DataDirectoryType {
    #[strum(serialize = "export table")]
    ExportTable = 0,
    #[strum(serialize = "import table")]
    ImportTable = 1,
    #[strum(serialize = "resource table")]
    ResourceTable = 2,
    #[strum(serialize = "exception table")]
    ExceptionTable = 3,
    #[strum(serialize = "certificate table")]
    CertificateTable = 4,
    #[strum(serialize = "base relocation table")]
    BaseRelocationTable = 5,
    #[strum(serialize = "debug")]
    Debug = 6,
    #[strum(serialize = "architecture")]
    Architecture = 7,
    #[strum(serialize = "global ptr")]
    GlobalPtr = 8,
    #[strum(serialize = "TLS table")]
    TlsTable = 9,
    #[strum(serialize = "load config table")]
    LoadConfigTable = 10,
    #[strum(serialize = "bound import")]
    BoundImport = 11,
    #[strum(serialize = "import address table")]
    ImportAddressTable = 12,
    #[strum(serialize = "delay import descriptor")]
    DelayImportDescriptor = 13,
    #[strum(serialize = "CLR runtime header")]
    ClrRuntimeHeader = 14,
    #[strum(serialize = "reserved")]
    Reserved = 15,
}

impl DataDirectoryType {
    /// Position of this directory in the sixteen-entry array.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// `IMAGE_DATA_DIRECTORY`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataDirectory {
    /// RVA of the table
    pub virtual_address: u32,
    /// Size of the table in bytes
    pub size: u32,
}

impl From<RawDataDirectory> for DataDirectory {
    fn from(directory: RawDataDirectory) -> Self {
        DataDirectory {
            virtual_address: directory.virtual_address,
            size: directory.size,
        }
    }
}

impl DataDirectory {
    /// One past the last RVA covered by this directory, saturating on overflow.
    #[must_use]
    pub fn end(&self) -> u32 {
        self.virtual_address.saturating_add(self.size)
    }

    /// Returns `true` if `rva` lies in `[virtual_address, virtual_address + size)`.
    #[must_use]
    pub fn contains(&self, rva: u32) -> bool {
        rva >= self.virtual_address && rva < self.end()
    }
}

bitflags! {
    /// Legacy `DllCharacteristics` bits describing when the DLL entry point is called.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DllCharacteristics: u16 {
        #[allow(missing_docs)]
        const CALL_ON_LOAD = 0x0001;
        #[allow(missing_docs)]
        const CALL_ON_THREAD_TERM = 0x0002;
        #[allow(missing_docs)]
        const CALL_ON_THREAD_START = 0x0004;
        #[allow(missing_docs)]
        const CALL_ON_EXIT = 0x0008;
    }
}

/// `IMAGE_OPTIONAL_HEADER`
///
/// Address and size fields that PE32+ widens to 64 bits are held as `u64`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct OptionalHeader {
    pub magic: u16,
    pub major_linker_version: u8,
    pub minor_linker_version: u8,
    pub size_of_code: u64,
    pub size_of_initialized_data: u64,
    pub size_of_uninitialized_data: u64,
    pub address_of_entry_point: u64,
    pub base_of_code: u64,
    /// Zero for PE32+, which has no such field.
    pub base_of_data: u32,
    pub image_base: u64,
    pub section_alignment: u32,
    pub file_alignment: u32,
    pub major_operating_system_version: u16,
    pub minor_operating_system_version: u16,
    pub major_image_version: u16,
    pub minor_image_version: u16,
    pub major_subsystem_version: u16,
    pub minor_subsystem_version: u16,
    pub win32_version_value: u32,
    pub size_of_image: u32,
    pub size_of_headers: u32,
    pub checksum: u32,
    pub subsystem: u16,
    pub dll_characteristics: u16,
    pub size_of_stack_reserve: u64,
    pub size_of_stack_commit: u64,
    pub size_of_heap_reserve: u64,
    pub size_of_heap_commit: u64,
    pub loader_flags: u32,
    /// Number of directory entries declared by the header.
    pub number_of_rva_and_sizes: u32,
    /// Directory slots beyond `number_of_rva_and_sizes` are left zeroed.
    pub data_directories: [DataDirectory; MAX_DIRECTORY_ENTRIES],
}

impl From<&RawOptionalHeader> for OptionalHeader {
    fn from(raw: &RawOptionalHeader) -> Self {
        let standard = &raw.standard_fields;
        let windows = &raw.windows_fields;

        let mut data_directories = [DataDirectory::default(); MAX_DIRECTORY_ENTRIES];
        for (kind, directory) in raw.data_directories.dirs() {
            if let Some(slot) = data_directories.get_mut(kind as usize) {
                *slot = directory.into();
            }
        }

        OptionalHeader {
            magic: standard.magic,
            major_linker_version: standard.major_linker_version,
            minor_linker_version: standard.minor_linker_version,
            size_of_code: u64::from(standard.size_of_code),
            size_of_initialized_data: u64::from(standard.size_of_initialized_data),
            size_of_uninitialized_data: u64::from(standard.size_of_uninitialized_data),
            address_of_entry_point: u64::from(standard.address_of_entry_point),
            base_of_code: u64::from(standard.base_of_code),
            base_of_data: standard.base_of_data,
            image_base: u64::from(windows.image_base),
            section_alignment: windows.section_alignment,
            file_alignment: windows.file_alignment,
            major_operating_system_version: windows.major_operating_system_version,
            minor_operating_system_version: windows.minor_operating_system_version,
            major_image_version: windows.major_image_version,
            minor_image_version: windows.minor_image_version,
            major_subsystem_version: windows.major_subsystem_version,
            minor_subsystem_version: windows.minor_subsystem_version,
            win32_version_value: windows.win32_version_value,
            size_of_image: windows.size_of_image,
            size_of_headers: windows.size_of_headers,
            checksum: windows.check_sum,
            subsystem: windows.subsystem,
            dll_characteristics: windows.dll_characteristics,
            size_of_stack_reserve: u64::from(windows.size_of_stack_reserve),
            size_of_stack_commit: u64::from(windows.size_of_stack_commit),
            size_of_heap_reserve: u64::from(windows.size_of_heap_reserve),
            size_of_heap_commit: u64::from(windows.size_of_heap_commit),
            loader_flags: windows.loader_flags,
            number_of_rva_and_sizes: windows.number_of_rva_and_sizes,
            data_directories,
        }
    }
}

impl OptionalHeader {
    /// Returns `true` for a PE32+ (64-bit) optional header.
    #[must_use]
    pub fn is_pe32_plus(&self) -> bool {
        self.magic == PE32_PLUS_MAGIC
    }

    /// Human readable subsystem name.
    #[must_use]
    pub fn subsystem_name(&self) -> &'static str {
        match self.subsystem {
            1 => "NATIVE",
            2 => "WINDOWS_GUI",
            3 => "WINDOWS_CUI",
            5 => "OS2_CUI",
            7 => "POSIX_CUI",
            _ => "UNKNOWN",
        }
    }

    /// DLL characteristics as typed flags; unknown bits are kept.
    #[must_use]
    pub fn dll_flags(&self) -> DllCharacteristics {
        DllCharacteristics::from_bits_retain(self.dll_characteristics)
    }
}
