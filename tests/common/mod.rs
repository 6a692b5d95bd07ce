//! A small synthetic DLL shared by the integration tests.
//!
//! Layout:
//! - `.edata` at RVA 0x3000 (file offset 0x400): export directory for `sample.dll`
//! - `.idata` at RVA 0x4000 (file offset 0x800): two import descriptors and a sentinel

#![allow(dead_code)]

pub const EXPORT_RVA: u32 = 0x3000;
pub const IMPORT_RVA: u32 = 0x4000;

const E_LFANEW: usize = 0x80;
const OPTIONAL_HEADER: usize = E_LFANEW + 4 + 20;
const SECTION_TABLE: usize = OPTIONAL_HEADER + 224;

struct Image {
    data: Vec<u8>,
    sections: Vec<(u32, u32, u32)>,
}

impl Image {
    fn new(size: usize) -> Self {
        Image {
            data: vec![0u8; size],
            sections: Vec::new(),
        }
    }

    fn put(&mut self, offset: usize, bytes: &[u8]) {
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn put_u16(&mut self, offset: usize, value: u16) {
        self.put(offset, &value.to_le_bytes());
    }

    fn put_u32(&mut self, offset: usize, value: u32) {
        self.put(offset, &value.to_le_bytes());
    }

    fn section(&mut self, name: &[u8], rva: u32, raw: u32, size: u32) {
        let at = SECTION_TABLE + self.sections.len() * 40;
        self.put(at, name);
        self.put_u32(at + 8, size);
        self.put_u32(at + 12, rva);
        self.put_u32(at + 16, size);
        self.put_u32(at + 20, raw);
        self.put_u32(at + 36, 0x4000_0040);
        self.sections.push((rva, raw, size));
        self.put_u16(E_LFANEW + 6, self.sections.len() as u16);
    }

    fn offset(&self, rva: u32) -> usize {
        let (va, raw, _) = self
            .sections
            .iter()
            .copied()
            .find(|(va, _, size)| rva >= *va && rva < va + size)
            .unwrap_or_else(|| panic!("unmapped RVA {rva:#x}"));
        (raw + (rva - va)) as usize
    }

    fn at(&mut self, rva: u32, bytes: &[u8]) {
        let offset = self.offset(rva);
        self.put(offset, bytes);
    }

    fn u32s(&mut self, rva: u32, values: &[u32]) {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.at(rva, &bytes);
    }

    fn u16s(&mut self, rva: u32, values: &[u16]) {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.at(rva, &bytes);
    }

    fn cstr(&mut self, rva: u32, value: &str) {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        self.at(rva, &bytes);
    }
}

/// DOS header, NT headers and an empty section table, with the given data directory
/// count.
fn headers(rva_count: u32) -> Image {
    let mut image = Image::new(0xC00);

    image.put(0, b"MZ");
    image.put_u32(60, E_LFANEW as u32);
    image.put(0x4E, b"This program cannot be run in DOS mode.\r\r\n$");

    image.put(E_LFANEW, b"PE\0\0");
    image.put_u16(E_LFANEW + 4, 0x014C);
    image.put_u32(E_LFANEW + 8, 0x5F5E_1000);
    image.put_u16(E_LFANEW + 20, 224);
    image.put_u16(E_LFANEW + 22, 0x2102);

    image.put_u16(OPTIONAL_HEADER, 0x010B);
    image.put_u32(OPTIONAL_HEADER + 16, 0x1000);
    image.put_u32(OPTIONAL_HEADER + 28, 0x1000_0000);
    image.put_u16(OPTIONAL_HEADER + 68, 2);
    image.put_u32(OPTIONAL_HEADER + 92, rva_count);

    image
}

/// A DLL exporting three functions (one of them forwarded) and importing from two
/// modules.
pub fn sample_dll() -> Vec<u8> {
    let mut image = headers(16);
    image.section(b".edata", EXPORT_RVA, 0x400, 0x400);
    image.section(b".idata", IMPORT_RVA, 0x800, 0x400);

    // Export directory, covering [0x3000, 0x3100)
    image.put_u32(OPTIONAL_HEADER + 96, EXPORT_RVA);
    image.put_u32(OPTIONAL_HEADER + 100, 0x100);
    image.u32s(
        EXPORT_RVA + 12,
        &[0x3100, 1, 3, 3, 0x3040, 0x3060, 0x3080],
    );
    image.u32s(0x3040, &[0x1000, 0x30C0, 0x1010]);
    image.u32s(0x3060, &[0x3110, 0x3130, 0x3140]);
    image.u16s(0x3080, &[0, 2, 1]);
    image.cstr(0x30C0, "KERNEL32.Sleep");
    image.cstr(0x3100, "sample.dll");
    image.cstr(0x3110, "?Foo@Widget@@QAEHXZ");
    image.cstr(0x3130, "_Bar@8");
    image.cstr(0x3140, "Nap");

    // Import descriptors
    image.put_u32(OPTIONAL_HEADER + 104, IMPORT_RVA);
    image.put_u32(OPTIONAL_HEADER + 108, 60);
    image.u32s(IMPORT_RVA, &[0x4080, 0, 0, 0x4100, 0x40C0]);
    image.u32s(IMPORT_RVA + 20, &[0, 0, 0, 0x4110, 0x40D0]);
    image.u32s(0x4080, &[0x4200, 0x8000_0010, 0]);
    image.u32s(0x40C0, &[0x4200, 0x8000_0010, 0]);
    image.u32s(0x40D0, &[0x4220, 0]);
    image.cstr(0x4100, "KERNEL32.dll");
    image.cstr(0x4110, "MSVCP.dll");
    image.u16s(0x4200, &[0x0123]);
    image.cstr(0x4202, "_Sleep@4");
    image.u16s(0x4220, &[7]);
    image.cstr(0x4222, "?length@Str@@QBEIXZ");

    image.data
}

/// Headers only, with no data directories: what a PE32+ image looks like through the
/// PE32 layout.
pub fn no_directories() -> Vec<u8> {
    let mut image = headers(0);
    image.section(b".text", 0x1000, 0x400, 0x200);
    image.data
}
