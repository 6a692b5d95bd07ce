use std::path::Path;

use pesym::{image::SectionCharacteristics, File};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::{hexa, load_image},
    output::{print_banner, print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
pub struct SectionInfo {
    pub index: usize,
    pub name: String,
    pub virtual_address: u32,
    pub virtual_size: u32,
    pub pointer_to_raw_data: u32,
    pub size_of_raw_data: u32,
    pub characteristics: u32,
    pub flags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SectionsOutput {
    pub sections: Vec<SectionInfo>,
}

/// Names of the reported `IMAGE_SCN_*` bits, in table order.
pub fn section_flags(flags: SectionCharacteristics) -> Vec<String> {
    flags
        .iter_names()
        .map(|(name, _)| name.to_string())
        .collect()
}

/// The flag names joined with `|`, or `0` if none of them is set.
pub fn flag_string(flags: &[String]) -> String {
    if flags.is_empty() {
        "0".to_string()
    } else {
        flags.join(" | ")
    }
}

pub fn report(file: &File) -> SectionsOutput {
    let sections = file
        .layout()
        .sections()
        .iter()
        .enumerate()
        .map(|(index, section)| SectionInfo {
            index,
            name: section.name.clone(),
            virtual_address: section.virtual_address,
            virtual_size: section.virtual_size,
            pointer_to_raw_data: section.pointer_to_raw_data,
            size_of_raw_data: section.size_of_raw_data,
            characteristics: section.characteristics,
            flags: section_flags(section.flags()),
        })
        .collect();

    SectionsOutput { sections }
}

pub fn display(out: &SectionsOutput) {
    print_banner("IMAGE_SECTION_HEADERS");

    let mut tw = TabWriter::new(&[
        ("Number", Align::Left),
        ("Name", Align::Left),
        ("Flags", Align::Right),
        ("Flag strings", Align::Left),
    ]);
    for section in &out.sections {
        tw.row(vec![
            format!("Section {}:", section.index),
            section.name.clone(),
            hexa(u64::from(section.characteristics), 0),
            format!("( {} )", flag_string(&section.flags)),
        ]);
    }
    tw.print();

    println!("{} sections listed.", out.sections.len());
}

pub fn run(path: &Path, opts: &GlobalOptions) -> anyhow::Result<()> {
    let file = load_image(path)?;
    let out = report(&file);

    print_output(&out, opts, display)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_section_flags() {
        let flags = section_flags(SectionCharacteristics::from_bits_retain(0x6000_0020));
        assert_eq!(flags, vec!["CODE", "MEM_EXECUTE", "MEM_READ"]);
        assert_eq!(flag_string(&flags), "CODE | MEM_EXECUTE | MEM_READ");
    }

    #[test]
    fn unreported_bits_only() {
        let flags = section_flags(SectionCharacteristics::from_bits_retain(0x0010_0000));
        assert!(flags.is_empty());
        assert_eq!(flag_string(&flags), "0");
    }

    #[test]
    fn every_flag() {
        let flags = section_flags(SectionCharacteristics::all());
        assert_eq!(
            flag_string(&flags),
            "CODE | INITIALIZED_DATA | UNINITIALIZED_DATA | LINKER_INFO | MEM_DISCARDABLE | \
             MEM_SHARED | MEM_EXECUTE | MEM_READ | MEM_WRITE"
        );
    }
}
