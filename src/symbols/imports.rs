//! Import directory walker.
//!
//! The import directory is an array of `IMAGE_IMPORT_DESCRIPTOR` entries, one per
//! dependency, terminated by an entry whose five fields are all zero. There is no count.
//! Each descriptor points at two parallel thunk arrays, the import lookup table and the
//! import address table, each terminated by a zero thunk. The lookup table is preferred
//! because the address table is overwritten by the loader in bound images; if it is absent
//! the address table is used instead.
//!
//! A thunk with [`ORDINAL_FLAG`] set imports by ordinal and carries no name. Otherwise it
//! is the RVA of an `IMAGE_IMPORT_BY_NAME` entry: a `u16` hint followed by the
//! NUL-terminated name.

use std::fmt;

use crate::{
    file::io::{read_cstr_at, read_le_at},
    image::{AddressResolver, DataDirectoryType, ImageLayout},
    symbols::{decode_all, Diagnostic, WalkOptions},
    Error::RvaNotMapped,
    Parser, Result,
};

/// Size of `IMAGE_IMPORT_DESCRIPTOR`.
pub const IMPORT_DESCRIPTOR_SIZE: usize = 20;

/// `IMAGE_ORDINAL_FLAG32`
pub const ORDINAL_FLAG: u32 = 0x8000_0000;

const THUNK_SIZE: u32 = 4;

/// `IMAGE_IMPORT_DESCRIPTOR`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportDescriptor {
    /// RVA of the import lookup table (`OriginalFirstThunk`)
    pub original_first_thunk: u32,
    /// Zero unless the image is bound
    pub time_date_stamp: u32,
    /// Index of the first forwarder reference, `-1` if none
    pub forwarder_chain: u32,
    /// RVA of the dependency's name
    pub name: u32,
    /// RVA of the import address table (`FirstThunk`)
    pub first_thunk: u32,
}

impl ImportDescriptor {
    /// Parse a descriptor from the start of `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than
    /// [`IMPORT_DESCRIPTOR_SIZE`].
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut parser = Parser::new(data);
        Ok(ImportDescriptor {
            original_first_thunk: parser.read_le()?,
            time_date_stamp: parser.read_le()?,
            forwarder_chain: parser.read_le()?,
            name: parser.read_le()?,
            first_thunk: parser.read_le()?,
        })
    }

    /// Returns `true` for the all-zero terminator.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.original_first_thunk == 0
            && self.time_date_stamp == 0
            && self.forwarder_chain == 0
            && self.name == 0
            && self.first_thunk == 0
    }

    /// The thunk array to read names from: the lookup table, or the address table if there
    /// is none.
    #[must_use]
    pub fn thunk_table(&self) -> Option<u32> {
        [self.original_first_thunk, self.first_thunk]
            .into_iter()
            .find(|&rva| rva != 0)
    }
}

/// One 32-bit slot of a thunk array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thunk(pub u32);

impl Thunk {
    /// The zero thunk terminates an array.
    #[must_use]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the ordinal flag is set.
    #[must_use]
    pub fn is_ordinal(self) -> bool {
        self.0 & ORDINAL_FLAG != 0
    }

    /// The imported ordinal, if this is an ordinal thunk.
    #[must_use]
    pub fn ordinal(self) -> Option<u16> {
        self.is_ordinal().then_some((self.0 & 0xFFFF) as u16)
    }

    /// RVA of the `IMAGE_IMPORT_BY_NAME` entry, if this is a name thunk.
    #[must_use]
    pub fn name_rva(self) -> Option<u32> {
        (!self.is_ordinal() && !self.is_null()).then_some(self.0)
    }
}

/// How a symbol is imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportKind {
    /// By ordinal only; no name is available
    Ordinal(u16),
    /// By name
    Name {
        /// Index into the exporter's name table the linker suggests trying first
        hint: u16,
        /// Raw name
        name: String,
        /// Decoded display name
        demangled: String,
    },
}

/// One imported symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    /// Name of the module the symbol is imported from
    pub module: String,
    /// Ordinal or name
    pub kind: ImportKind,
}

/// Why a module's symbols were not listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Both the lookup table and the address table RVA are zero
    NoThunkTable,
    /// The thunk array's RVA is not inside any section
    ThunkTableNotMapped(u32),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoThunkTable => f.write_str("bad IAT"),
            SkipReason::ThunkTableNotMapped(rva) => write!(f, "can't find IAT at {rva:#010x}"),
        }
    }
}

/// One dependency and the symbols imported from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportModule {
    /// Name of the dependency, `???` if its RVA does not resolve
    pub name: String,
    /// The raw descriptor
    pub descriptor: ImportDescriptor,
    /// Symbols in thunk order
    pub records: Vec<ImportRecord>,
    /// Name thunks whose `IMAGE_IMPORT_BY_NAME` could not be read
    pub unresolved: usize,
    /// Set if the module's thunks were not walked at all
    pub skipped: Option<SkipReason>,
}

/// Result of walking the import directory.
#[derive(Debug, Clone, Default)]
pub struct ImportTable {
    /// Name of the section containing the descriptor array
    pub section: Option<String>,
    /// One entry per non-terminator descriptor
    pub modules: Vec<ImportModule>,
    /// Number of descriptors visited, skipped ones included
    pub module_count: usize,
    /// Number of symbols listed across all modules
    pub symbol_count: usize,
    /// Set when the walk could not start
    pub diagnostic: Option<Diagnostic>,
}

impl ImportTable {
    fn failed(diagnostic: Diagnostic) -> Self {
        log::debug!("imports: {diagnostic}");
        ImportTable {
            diagnostic: Some(diagnostic),
            ..Default::default()
        }
    }

    /// All records of all modules in walk order.
    pub fn records(&self) -> impl Iterator<Item = &ImportRecord> {
        self.modules.iter().flat_map(|module| module.records.iter())
    }
}

enum PendingImport<'a> {
    Ordinal(u16),
    Name { hint: u16, name: &'a [u8] },
}

/// Walk the import directory of `layout`.
///
/// Never fails: see [`crate::symbols`] for how problems are reported.
#[must_use]
pub fn walk_imports(layout: &ImageLayout, options: &WalkOptions) -> ImportTable {
    if layout.has_no_directories() {
        return ImportTable::failed(Diagnostic::NoDataDirectories);
    }

    let kind = DataDirectoryType::ImportTable;
    let Some(range) = layout.directory(kind) else {
        return ImportTable::failed(Diagnostic::DirectoryAbsent(kind));
    };

    let rva = range.virtual_address;
    let resolver = layout.resolver();
    let Some(section) = resolver.find_section(rva) else {
        return ImportTable::failed(Diagnostic::DirectoryNotMapped {
            directory: kind,
            rva,
        });
    };

    log::debug!("imports: descriptors at {rva:#x} in {}", section.name);

    let mut modules = Vec::new();
    let mut cursor = Some(rva);
    while let Some(descriptor_rva) = cursor {
        let descriptor = match resolver
            .slice_at_rva(descriptor_rva, IMPORT_DESCRIPTOR_SIZE)
            .and_then(ImportDescriptor::parse)
        {
            Ok(descriptor) => descriptor,
            Err(_) if modules.is_empty() => {
                return ImportTable::failed(Diagnostic::DirectoryTruncated {
                    directory: kind,
                    rva,
                });
            }
            Err(_) => {
                log::warn!("imports: descriptor array ends at {descriptor_rva:#x} without terminator");
                break;
            }
        };

        if descriptor.is_null() {
            break;
        }

        modules.push(walk_module(&resolver, descriptor, options));
        cursor = descriptor_rva.checked_add(IMPORT_DESCRIPTOR_SIZE as u32);
    }

    let symbol_count = modules.iter().map(|module| module.records.len()).sum();
    log::debug!(
        "imports: {} modules, {symbol_count} symbols",
        modules.len()
    );

    ImportTable {
        section: Some(section.name.clone()),
        module_count: modules.len(),
        symbol_count,
        modules,
        diagnostic: None,
    }
}

fn walk_module(
    resolver: &AddressResolver,
    descriptor: ImportDescriptor,
    options: &WalkOptions,
) -> ImportModule {
    let name = match resolver.read_cstr_at_rva(descriptor.name) {
        Ok(name) => String::from_utf8_lossy(name).into_owned(),
        Err(_) => {
            log::warn!("imports: module name at {:#x} is not mapped", descriptor.name);
            "???".to_string()
        }
    };

    let mut module = ImportModule {
        name,
        descriptor,
        records: Vec::new(),
        unresolved: 0,
        skipped: None,
    };

    let Some(start) = descriptor.thunk_table() else {
        log::warn!("imports: {} has no thunk table, skipping", module.name);
        module.skipped = Some(SkipReason::NoThunkTable);
        return module;
    };
    if resolver.find_section(start).is_none() {
        log::warn!("imports: thunk table of {} at {start:#x} is not mapped, skipping", module.name);
        module.skipped = Some(SkipReason::ThunkTableNotMapped(start));
        return module;
    }

    let mut pending = Vec::new();
    let mut cursor = Some(start);
    while let Some(thunk_rva) = cursor {
        let Ok(value) = resolver.read_u32_at_rva(thunk_rva) else {
            log::warn!("imports: thunk table of {} ends without terminator", module.name);
            break;
        };

        let thunk = Thunk(value);
        if thunk.is_null() {
            break;
        }

        if let Some(ordinal) = thunk.ordinal() {
            pending.push(PendingImport::Ordinal(ordinal));
        } else if let Some(name_rva) = thunk.name_rva() {
            match read_import_by_name(resolver, name_rva) {
                Ok((hint, name)) => pending.push(PendingImport::Name { hint, name }),
                Err(_) => {
                    log::warn!("imports: name of {} import at {name_rva:#x} is unreadable", module.name);
                    module.unresolved += 1;
                }
            }
        }

        cursor = thunk_rva.checked_add(THUNK_SIZE);
    }

    let raw: Vec<&[u8]> = pending
        .iter()
        .filter_map(|import| match import {
            PendingImport::Name { name, .. } => Some(*name),
            PendingImport::Ordinal(_) => None,
        })
        .collect();
    let mut decoded = decode_all(&raw, options).into_iter();

    module.records = pending
        .into_iter()
        .map(|import| {
            let kind = match import {
                PendingImport::Ordinal(ordinal) => ImportKind::Ordinal(ordinal),
                PendingImport::Name { hint, name } => ImportKind::Name {
                    hint,
                    name: String::from_utf8_lossy(name).into_owned(),
                    demangled: decoded.next().unwrap_or_default(),
                },
            };
            ImportRecord {
                module: module.name.clone(),
                kind,
            }
        })
        .collect();

    log::debug!("imports: {} -> {} symbols", module.name, module.records.len());
    module
}

/// Read the hint and name of an `IMAGE_IMPORT_BY_NAME` entry through one translation.
fn read_import_by_name<'a>(resolver: &AddressResolver<'a>, rva: u32) -> Result<(u16, &'a [u8])> {
    let data = resolver.data();
    let mut offset = resolver.to_file_offset(rva).ok_or(RvaNotMapped(rva))?;
    let hint = read_le_at::<u16>(data, &mut offset)?;
    let name = read_cstr_at(data, offset)?;
    Ok((hint, name))
}
