//! Export and import table walkers.
//!
//! Both walkers take a validated [`crate::image::ImageLayout`], dereference every RVA
//! through its [`crate::image::AddressResolver`], and decode each raw symbol name with
//! [`crate::demangle::demangle`].
//!
//! Walks never return an error. A structural problem that prevents a walk from starting
//! (no data directories, directory absent, directory not mapped by any section) yields an
//! empty table carrying a [`Diagnostic`]. Problems with individual records are logged at
//! `warn` level and the record is skipped.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pesym::{symbols::{walk_exports, walk_imports, WalkOptions}, File};
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("library.dll"))?;
//! let layout = file.layout();
//! let options = WalkOptions::default();
//!
//! let exports = walk_exports(layout, &options);
//! for export in &exports.records {
//!     println!("{:>6} {}", export.ordinal, export.demangled);
//! }
//!
//! let imports = walk_imports(layout, &options);
//! println!(
//!     "{} dependencies, {} symbols",
//!     imports.module_count, imports.symbol_count
//! );
//! # Ok::<(), pesym::Error>(())
//! ```

mod exports;
mod imports;

pub use exports::{
    walk_exports, ExportDirectory, ExportOrdinal, ExportRecord, ExportTable, ExportTarget,
    EXPORT_DIRECTORY_SIZE,
};
pub use imports::{
    walk_imports, ImportDescriptor, ImportKind, ImportModule, ImportRecord, ImportTable,
    SkipReason, Thunk, IMPORT_DESCRIPTOR_SIZE, ORDINAL_FLAG,
};

use std::fmt;

use rayon::prelude::*;

use crate::{demangle::demangle, image::DataDirectoryType};

/// Knobs shared by both walkers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    /// Decode names to their qualified base name only, without return type and calling
    /// convention.
    pub base_name_only: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        WalkOptions {
            base_name_only: true,
        }
    }
}

/// Why a walk produced no records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// `NumberOfRvaAndSizes` is zero, or the image is PE32+
    NoDataDirectories,
    /// The data directory slot is beyond the declared count or has a zero RVA
    DirectoryAbsent(DataDirectoryType),
    /// No section maps the directory's RVA
    DirectoryNotMapped {
        /// Which directory
        directory: DataDirectoryType,
        /// Its RVA
        rva: u32,
    },
    /// The directory is mapped, but its fixed-size header runs past the end of the file
    DirectoryTruncated {
        /// Which directory
        directory: DataDirectoryType,
        /// Its RVA
        rva: u32,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NoDataDirectories => {
                write!(f, "no data directories present (64-bit images are not supported)")
            }
            Diagnostic::DirectoryAbsent(directory) => write!(f, "no {directory} present"),
            Diagnostic::DirectoryNotMapped { directory, rva } => {
                write!(f, "{directory} at RVA {rva:#010x} is not inside any section")
            }
            Diagnostic::DirectoryTruncated { directory, rva } => {
                write!(f, "{directory} at RVA {rva:#010x} is truncated")
            }
        }
    }
}

/// Decode a batch of raw names, preserving order.
fn decode_all(raw: &[&[u8]], options: &WalkOptions) -> Vec<String> {
    raw.par_iter()
        .map(|name| demangle(name, options.base_name_only))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_decode_base_names() {
        assert!(WalkOptions::default().base_name_only);
    }

    #[test]
    fn diagnostic_messages() {
        assert_eq!(
            Diagnostic::DirectoryAbsent(DataDirectoryType::ExportTable).to_string(),
            "no export table present"
        );
        assert_eq!(
            Diagnostic::DirectoryNotMapped {
                directory: DataDirectoryType::ImportTable,
                rva: 0x4000
            }
            .to_string(),
            "import table at RVA 0x00004000 is not inside any section"
        );
        assert!(Diagnostic::NoDataDirectories
            .to_string()
            .contains("64-bit"));
    }

    #[test]
    fn batch_decoding_keeps_order() {
        let raw = vec![&b"_b@4"[..], b"?a@@YAHXZ", b"c"];
        let options = WalkOptions {
            base_name_only: false,
        };
        assert_eq!(
            decode_all(&raw, &options),
            vec!["b()", "int __cdecl a()", "c()"]
        );
    }
}
