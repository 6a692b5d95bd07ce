//! Export directory walker.
//!
//! The export directory (`IMAGE_EXPORT_DIRECTORY`) describes three parallel arrays:
//!
//! - `AddressOfFunctions`: one entry-point RVA per ordinal slot, zero for gaps
//! - `AddressOfNames`: one name RVA per named export, in no particular order
//! - `AddressOfNameOrdinals`: parallel to the names, the function slot each name refers to
//!
//! The name-ordinal entries are grouped by function slot once, in table order. Every
//! non-zero function slot then produces one [`ExportRecord`] per name in its group, so
//! aliases (several names for one slot) are all reported and unnamed slots produce
//! nothing. An entry point that lies inside the export directory's own range is a
//! forwarder: it points at a `Module.Symbol` string instead of code, and an additional
//! record with the [`ExportOrdinal::Forwarder`] marker is produced for it.
//!
//! Records are sorted by decoded name; the sort is stable so aliases keep their table
//! order.

use std::{collections::HashMap, fmt};

use crate::{
    image::{DataDirectoryType, ImageLayout},
    symbols::{decode_all, Diagnostic, WalkOptions},
    Parser, Result,
};

/// Size of `IMAGE_EXPORT_DIRECTORY`.
pub const EXPORT_DIRECTORY_SIZE: usize = 40;

/// `IMAGE_EXPORT_DIRECTORY`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportDirectory {
    /// Reserved, always zero
    pub characteristics: u32,
    /// Time the export data was created
    pub time_date_stamp: u32,
    /// Major version, user defined
    pub major_version: u16,
    /// Minor version, user defined
    pub minor_version: u16,
    /// RVA of the DLL's own name
    pub name: u32,
    /// Ordinal of the first function slot
    pub ordinal_base: u32,
    /// Entries in `AddressOfFunctions`
    pub number_of_functions: u32,
    /// Entries in `AddressOfNames` and `AddressOfNameOrdinals`
    pub number_of_names: u32,
    /// RVA of the entry-point array
    pub address_of_functions: u32,
    /// RVA of the name RVA array
    pub address_of_names: u32,
    /// RVA of the name-ordinal array
    pub address_of_name_ordinals: u32,
}

impl ExportDirectory {
    /// Parse the directory from the start of `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than
    /// [`EXPORT_DIRECTORY_SIZE`].
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut parser = Parser::new(data);
        Ok(ExportDirectory {
            characteristics: parser.read_le()?,
            time_date_stamp: parser.read_le()?,
            major_version: parser.read_le()?,
            minor_version: parser.read_le()?,
            name: parser.read_le()?,
            ordinal_base: parser.read_le()?,
            number_of_functions: parser.read_le()?,
            number_of_names: parser.read_le()?,
            address_of_functions: parser.read_le()?,
            address_of_names: parser.read_le()?,
            address_of_name_ordinals: parser.read_le()?,
        })
    }
}

/// Ordinal column of an export record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOrdinal {
    /// Ordinal, already adjusted by the directory's ordinal base
    Ordinal(u32),
    /// The record describes the forwarder string of a forwarded slot
    Forwarder,
}

impl fmt::Display for ExportOrdinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportOrdinal::Ordinal(ordinal) => write!(f, "{ordinal:#05X}"),
            ExportOrdinal::Forwarder => f.write_str("FWD"),
        }
    }
}

/// Where an export leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    /// Entry point RVA in this image
    Address(u32),
    /// `Module.Symbol` the loader redirects to
    Forwarder(String),
}

/// One exported name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRecord {
    /// Base-adjusted ordinal or the forwarder marker
    pub ordinal: ExportOrdinal,
    /// Raw name as stored in the image
    pub name: String,
    /// Decoded display name
    pub demangled: String,
    /// Entry point or forwarder
    pub target: ExportTarget,
}

/// Result of walking the export directory.
#[derive(Debug, Clone, Default)]
pub struct ExportTable {
    /// Name the DLL gives itself, if its RVA resolves
    pub dll_name: Option<String>,
    /// Name of the section containing the directory
    pub section: Option<String>,
    /// The raw directory header, if it could be read
    pub directory: Option<ExportDirectory>,
    /// Records sorted by decoded name
    pub records: Vec<ExportRecord>,
    /// Records that were referenced but could not be produced: unreadable names, and every
    /// name of a slot whose forwarder string is unreadable along with the forwarder itself
    pub skipped: usize,
    /// Set when the walk could not start
    pub diagnostic: Option<Diagnostic>,
}

impl ExportTable {
    fn failed(diagnostic: Diagnostic) -> Self {
        log::debug!("exports: {diagnostic}");
        ExportTable {
            diagnostic: Some(diagnostic),
            ..Default::default()
        }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no records were produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

struct PendingExport<'a> {
    ordinal: ExportOrdinal,
    name: &'a [u8],
    target: ExportTarget,
}

/// Walk the export directory of `layout`.
///
/// Never fails: see [`crate::symbols`] for how problems are reported.
#[must_use]
pub fn walk_exports(layout: &ImageLayout, options: &WalkOptions) -> ExportTable {
    if layout.has_no_directories() {
        return ExportTable::failed(Diagnostic::NoDataDirectories);
    }

    let kind = DataDirectoryType::ExportTable;
    let Some(range) = layout.directory(kind) else {
        return ExportTable::failed(Diagnostic::DirectoryAbsent(kind));
    };

    let rva = range.virtual_address;
    let resolver = layout.resolver();
    let Some(section) = resolver.find_section(rva) else {
        return ExportTable::failed(Diagnostic::DirectoryNotMapped {
            directory: kind,
            rva,
        });
    };

    let directory = match resolver
        .slice_at_rva(rva, EXPORT_DIRECTORY_SIZE)
        .and_then(ExportDirectory::parse)
    {
        Ok(directory) => directory,
        Err(_) => {
            return ExportTable::failed(Diagnostic::DirectoryTruncated {
                directory: kind,
                rva,
            })
        }
    };

    log::debug!(
        "exports: directory at {rva:#x} in {}, {} functions, {} names",
        section.name,
        directory.number_of_functions,
        directory.number_of_names
    );

    let mut table = ExportTable {
        dll_name: resolver
            .read_cstr_at_rva(directory.name)
            .ok()
            .map(|name| String::from_utf8_lossy(name).into_owned()),
        section: Some(section.name.clone()),
        directory: Some(directory),
        ..Default::default()
    };

    // function slot -> names in table order
    let mut names: HashMap<u32, Vec<Option<&[u8]>>> = HashMap::new();
    for i in 0..directory.number_of_names {
        let entry = i
            .checked_mul(2)
            .and_then(|delta| directory.address_of_name_ordinals.checked_add(delta))
            .zip(
                i.checked_mul(4)
                    .and_then(|delta| directory.address_of_names.checked_add(delta)),
            );
        let Some((ordinal_rva, name_rva)) = entry else {
            break;
        };

        let (Ok(slot), Ok(name_rva)) = (
            resolver.read_u16_at_rva(ordinal_rva),
            resolver.read_u32_at_rva(name_rva),
        ) else {
            log::warn!("exports: name table ends early at entry {i}");
            break;
        };

        names
            .entry(u32::from(slot))
            .or_default()
            .push(resolver.read_cstr_at_rva(name_rva).ok());
    }

    let mut pending = Vec::new();
    for slot in 0..directory.number_of_functions {
        let Some(entry_rva) = slot
            .checked_mul(4)
            .and_then(|delta| directory.address_of_functions.checked_add(delta))
        else {
            break;
        };
        let Ok(entry_point) = resolver.read_u32_at_rva(entry_rva) else {
            log::warn!("exports: function table ends early at slot {slot}");
            break;
        };
        if entry_point == 0 {
            continue;
        }
        let slot_names = names.get(&slot).map_or(&[][..], Vec::as_slice);

        let forwarder = if range.contains(entry_point) {
            match resolver.read_cstr_at_rva(entry_point) {
                Ok(forwarder) => Some(forwarder),
                Err(_) => {
                    log::warn!(
                        "exports: forwarder of slot {slot} at {entry_point:#x} is unreadable, dropping {} names",
                        slot_names.len()
                    );
                    table.skipped += slot_names.len() + 1;
                    continue;
                }
            }
        } else {
            None
        };
        let target = match forwarder {
            Some(forwarder) => {
                ExportTarget::Forwarder(String::from_utf8_lossy(forwarder).into_owned())
            }
            None => ExportTarget::Address(entry_point),
        };

        for name in slot_names {
            let Some(name) = *name else {
                log::warn!("exports: name of slot {slot} is not mapped");
                table.skipped += 1;
                continue;
            };
            pending.push(PendingExport {
                ordinal: ExportOrdinal::Ordinal(directory.ordinal_base.wrapping_add(slot)),
                name,
                target: target.clone(),
            });
        }

        if let Some(forwarder) = forwarder {
            pending.push(PendingExport {
                ordinal: ExportOrdinal::Forwarder,
                name: forwarder,
                target,
            });
        }
    }

    let raw: Vec<&[u8]> = pending.iter().map(|export| export.name).collect();
    let decoded = decode_all(&raw, options);

    table.records = pending
        .into_iter()
        .zip(decoded)
        .map(|(export, demangled)| ExportRecord {
            ordinal: export.ordinal,
            name: String::from_utf8_lossy(export.name).into_owned(),
            demangled,
            target: export.target,
        })
        .collect();
    table.records.sort_by(|a, b| a.demangled.cmp(&b.demangled));

    log::debug!("exports: {} records, {} skipped", table.len(), table.skipped);
    table
}
