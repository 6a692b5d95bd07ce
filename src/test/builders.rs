use crate::image::{
    DataDirectoryType, DOS_HEADER_SIZE, FILE_HEADER_SIZE, MAX_DIRECTORY_ENTRIES,
    OPTIONAL_HEADER_SIZE, PE32_MAGIC, SECTION_HEADER_SIZE,
};

/// `ImageBase` written into every synthesised optional header.
pub const TEST_IMAGE_BASE: u32 = 0x1000_0000;

const E_LFANEW: u32 = 0x80;
const DOS_STUB_MESSAGE: &[u8] = b"This program cannot be run in DOS mode.\r\r\n$";

struct PlannedSection {
    name: String,
    virtual_address: u32,
    pointer_to_raw_data: u32,
    size: u32,
    characteristics: u32,
}

/// Builds a minimal, well-formed PE32 image in memory.
///
/// Sections are laid out exactly where the caller asks, and arbitrary content can be
/// placed at an RVA, which is translated through the declared sections at build time.
pub struct ImageBuilder {
    sections: Vec<PlannedSection>,
    directories: [(u32, u32); MAX_DIRECTORY_ENTRIES],
    rva_count: u32,
    magic: u16,
    writes: Vec<(u32, Vec<u8>)>,
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder {
    pub fn new() -> Self {
        ImageBuilder {
            sections: Vec::new(),
            directories: [(0, 0); MAX_DIRECTORY_ENTRIES],
            rva_count: MAX_DIRECTORY_ENTRIES as u32,
            magic: PE32_MAGIC,
            writes: Vec::new(),
        }
    }

    /// Add a readable data section of `size` bytes both in memory and on disk.
    pub fn section(self, name: &str, virtual_address: u32, raw_pointer: u32, size: u32) -> Self {
        self.section_with_flags(name, virtual_address, raw_pointer, size, 0x4000_0040)
    }

    pub fn section_with_flags(
        mut self,
        name: &str,
        virtual_address: u32,
        raw_pointer: u32,
        size: u32,
        characteristics: u32,
    ) -> Self {
        self.sections.push(PlannedSection {
            name: name.to_string(),
            virtual_address,
            pointer_to_raw_data: raw_pointer,
            size,
            characteristics,
        });
        self
    }

    pub fn directory(mut self, kind: DataDirectoryType, rva: u32, size: u32) -> Self {
        self.directories[kind.index()] = (rva, size);
        self
    }

    /// Override `NumberOfRvaAndSizes`.
    pub fn rva_count(mut self, count: u32) -> Self {
        self.rva_count = count;
        self
    }

    /// Override the optional header magic. The rest of the header keeps the PE32 layout.
    pub fn magic(mut self, magic: u16) -> Self {
        self.magic = magic;
        self
    }

    pub fn bytes_at(mut self, rva: u32, bytes: &[u8]) -> Self {
        self.writes.push((rva, bytes.to_vec()));
        self
    }

    pub fn u16_at(self, rva: u32, value: u16) -> Self {
        self.bytes_at(rva, &value.to_le_bytes())
    }

    pub fn u32_at(self, rva: u32, value: u32) -> Self {
        self.bytes_at(rva, &value.to_le_bytes())
    }

    pub fn u32s_at(self, rva: u32, values: &[u32]) -> Self {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.bytes_at(rva, &bytes)
    }

    /// Place `value` followed by a NUL terminator.
    pub fn cstr_at(self, rva: u32, value: &str) -> Self {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        self.bytes_at(rva, &bytes)
    }

    fn file_offset(&self, rva: u32) -> usize {
        let section = self
            .sections
            .iter()
            .find(|s| rva >= s.virtual_address && rva - s.virtual_address < s.size)
            .unwrap_or_else(|| panic!("test image writes to unmapped RVA {rva:#x}"));
        (section.pointer_to_raw_data + (rva - section.virtual_address)) as usize
    }

    pub fn build(self) -> Vec<u8> {
        let optional_start = E_LFANEW as usize + 4 + FILE_HEADER_SIZE;
        let table_start = optional_start + OPTIONAL_HEADER_SIZE;
        let headers_end = table_start + self.sections.len() * SECTION_HEADER_SIZE;

        let image_end = self
            .sections
            .iter()
            .map(|s| (s.pointer_to_raw_data + s.size) as usize)
            .max()
            .unwrap_or(0)
            .max(headers_end);
        let mut data = vec![0u8; image_end];

        // IMAGE_DOS_HEADER
        put_u16(&mut data, 0, 0x5A4D);
        put_u16(&mut data, 2, 0x90);
        put_u16(&mut data, 4, 3);
        put_u16(&mut data, 8, 4);
        put_u16(&mut data, 12, 0xFFFF);
        put_u16(&mut data, 16, 0xB8);
        put_u16(&mut data, 24, 0x40);
        put_u32(&mut data, 60, E_LFANEW);
        data[DOS_HEADER_SIZE + 14..DOS_HEADER_SIZE + 14 + DOS_STUB_MESSAGE.len()]
            .copy_from_slice(DOS_STUB_MESSAGE);

        // NT signature and IMAGE_FILE_HEADER
        let nt = E_LFANEW as usize;
        data[nt..nt + 4].copy_from_slice(b"PE\0\0");
        put_u16(&mut data, nt + 4, 0x014C);
        put_u16(&mut data, nt + 6, self.sections.len() as u16);
        put_u32(&mut data, nt + 8, 0x5F5E_1000);
        put_u16(&mut data, nt + 20, OPTIONAL_HEADER_SIZE as u16);
        put_u16(&mut data, nt + 22, 0x2102);

        // IMAGE_OPTIONAL_HEADER32
        let opt = optional_start;
        put_u16(&mut data, opt, self.magic);
        data[opt + 2] = 14;
        put_u32(&mut data, opt + 16, 0x1000);
        put_u32(&mut data, opt + 28, TEST_IMAGE_BASE);
        put_u32(&mut data, opt + 32, 0x1000);
        put_u32(&mut data, opt + 36, 0x200);
        put_u16(&mut data, opt + 40, 6);
        put_u16(&mut data, opt + 48, 6);
        put_u32(&mut data, opt + 60, headers_end as u32);
        put_u16(&mut data, opt + 68, 2);
        put_u16(&mut data, opt + 70, 0x0140);
        put_u32(&mut data, opt + 92, self.rva_count);
        for (i, (rva, size)) in self.directories.iter().enumerate() {
            put_u32(&mut data, opt + 96 + i * 8, *rva);
            put_u32(&mut data, opt + 100 + i * 8, *size);
        }

        // IMAGE_SECTION_HEADER[]
        for (i, section) in self.sections.iter().enumerate() {
            let at = table_start + i * SECTION_HEADER_SIZE;
            let name = section.name.as_bytes();
            data[at..at + name.len().min(8)].copy_from_slice(&name[..name.len().min(8)]);
            put_u32(&mut data, at + 8, section.size);
            put_u32(&mut data, at + 12, section.virtual_address);
            put_u32(&mut data, at + 16, section.size);
            put_u32(&mut data, at + 20, section.pointer_to_raw_data);
            put_u32(&mut data, at + 36, section.characteristics);
        }

        for (rva, bytes) in &self.writes {
            let offset = self.file_offset(*rva);
            data[offset..offset + bytes.len()].copy_from_slice(bytes);
        }

        data
    }
}

fn put_u16(data: &mut [u8], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
