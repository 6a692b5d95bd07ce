use std::path::Path;

use pesym::{
    image::{DllCharacteristics, FileCharacteristics},
    File,
};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::{file_display_name, hexa, load_image},
    output::{print_banner, print_output},
};

#[derive(Debug, Serialize)]
pub struct FileHeaderInfo {
    pub machine: u16,
    pub machine_name: String,
    pub number_of_sections: u16,
    pub time_date_stamp: u32,
    pub pointer_to_symbol_table: u32,
    pub number_of_symbols: u32,
    pub size_of_optional_header: u16,
    pub characteristics: u16,
    pub characteristics_flags: String,
}

#[derive(Debug, Serialize)]
pub struct OptionalHeaderInfo {
    pub magic: u16,
    pub image_base: u64,
    pub size_of_code: u64,
    pub size_of_initialized_data: u64,
    pub size_of_uninitialized_data: u64,
    pub number_of_rva_and_sizes: u32,
    pub address_of_entry_point: u64,
    pub subsystem: u16,
    pub subsystem_name: String,
    pub dll_characteristics: u16,
    pub dll_characteristics_flags: String,
}

#[derive(Debug, Serialize)]
pub struct ImageInfo {
    pub file: String,
    pub size: usize,
    pub file_header: FileHeaderInfo,
    pub optional_header: OptionalHeaderInfo,
}

/// Space-separated names of the set file characteristics, `0` if none is set.
pub fn file_characteristics(flags: FileCharacteristics) -> String {
    let names: Vec<&str> = flags.iter_names().map(|(name, _)| name).collect();
    if names.is_empty() {
        "0".to_string()
    } else {
        names.join(" ")
    }
}

/// When the DLL entry point is called, as listed in the legacy characteristics bits.
pub fn dll_characteristics(flags: DllCharacteristics) -> String {
    let mut text = String::new();
    for (flag, label) in [
        (DllCharacteristics::CALL_ON_LOAD, "Call on load; "),
        (DllCharacteristics::CALL_ON_THREAD_TERM, "Call on thread term; "),
        (DllCharacteristics::CALL_ON_THREAD_START, "Call on thread start; "),
        (DllCharacteristics::CALL_ON_EXIT, "Call on exit; "),
    ] {
        if flags.contains(flag) {
            text.push_str(label);
        }
    }

    if text.is_empty() {
        text.push('0');
    }
    text
}

pub fn report(path: &Path, file: &File) -> ImageInfo {
    let layout = file.layout();
    let fh = layout.file_header();
    let oh = layout.optional_header();

    ImageInfo {
        file: file_display_name(path),
        size: file.len(),
        file_header: FileHeaderInfo {
            machine: fh.machine,
            machine_name: fh.machine_name().to_string(),
            number_of_sections: fh.number_of_sections,
            time_date_stamp: fh.time_date_stamp,
            pointer_to_symbol_table: fh.pointer_to_symbol_table,
            number_of_symbols: fh.number_of_symbols,
            size_of_optional_header: fh.size_of_optional_header,
            characteristics: fh.characteristics,
            characteristics_flags: file_characteristics(fh.flags()),
        },
        optional_header: OptionalHeaderInfo {
            magic: oh.magic,
            image_base: oh.image_base,
            size_of_code: oh.size_of_code,
            size_of_initialized_data: oh.size_of_initialized_data,
            size_of_uninitialized_data: oh.size_of_uninitialized_data,
            number_of_rva_and_sizes: oh.number_of_rva_and_sizes,
            address_of_entry_point: oh.address_of_entry_point,
            subsystem: oh.subsystem,
            subsystem_name: oh.subsystem_name().to_string(),
            dll_characteristics: oh.dll_characteristics,
            dll_characteristics_flags: dll_characteristics(oh.dll_flags()),
        },
    }
}

pub fn display(info: &ImageInfo) {
    println!();
    println!("PE: {}", info.file);
    println!("File size in bytes: {}", info.size);
    println!("File is a valid Windows Portable Executable!");

    print_banner("NT Headers");

    let fh = &info.file_header;
    println!("---- IMAGE_FILE_HEADER ----");
    println!("Machine architecture.....: {}", fh.machine_name);
    println!("Number of sections.......: {}", fh.number_of_sections);
    println!("Timestamp................: {}", hexa(u64::from(fh.time_date_stamp), 0));
    println!("Pointer to symbol table..: {}", fh.pointer_to_symbol_table);
    println!("Number of symbols........: {}", fh.number_of_symbols);
    println!("Optional header size.....: {}", fh.size_of_optional_header);
    println!("Image characteristics....: {}", fh.characteristics_flags);
    println!();

    let oh = &info.optional_header;
    println!("---- IMAGE_OPTIONAL_HEADER ----");
    println!("Magic....................: {}", hexa(u64::from(oh.magic), 0));
    println!("Image base...............: {}", hexa(oh.image_base, 8));
    println!("Code size................: {}", oh.size_of_code);
    println!("Initialized data size....: {}", oh.size_of_initialized_data);
    println!("Uninitialized data size..: {}", oh.size_of_uninitialized_data);
    println!("Number of RVAs and sizes.: {}", oh.number_of_rva_and_sizes);
    println!(
        "Address of entry point...: {}",
        hexa(oh.address_of_entry_point, 0)
    );
    println!("Subsystem................: {}", oh.subsystem_name);
    println!("DLL Characteristics......: {}", oh.dll_characteristics_flags);
}

pub fn run(path: &Path, opts: &GlobalOptions) -> anyhow::Result<()> {
    let file = load_image(path)?;
    let info = report(path, &file);

    print_output(&info, opts, display)
}
