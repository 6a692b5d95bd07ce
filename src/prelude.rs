//! # pesym Prelude
//!
//! The most commonly used types of the library in one import.
//!
//! ```rust,no_run
//! use pesym::prelude::*;
//!
//! let file = File::from_file("user32.dll".as_ref())?;
//! let imports = walk_imports(file.layout(), &WalkOptions::default());
//! println!("{} dependencies", imports.module_count);
//! # Ok::<(), pesym::Error>(())
//! ```

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all pesym operations
pub use crate::Error;

/// The result type used throughout pesym
pub use crate::Result;

// ================================================================================================
// Loading
// ================================================================================================

/// Loaded image and low-level cursor
pub use crate::{File, Parser};

/// Headers, sections and address translation
pub use crate::image::{
    AddressResolver, DataDirectory, DataDirectoryType, ImageLayout, Section,
    SectionCharacteristics,
};

// ================================================================================================
// Symbols
// ================================================================================================

/// Walkers and their options
pub use crate::symbols::{walk_exports, walk_imports, Diagnostic, WalkOptions};

/// Export records
pub use crate::symbols::{ExportOrdinal, ExportRecord, ExportTable, ExportTarget};

/// Import records
pub use crate::symbols::{ImportKind, ImportModule, ImportRecord, ImportTable, SkipReason};

/// Name decoding
pub use crate::demangle::demangle;
