// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # pesym
//!
//! Symbol table inspection for Windows PE32 images on any host.
//!
//! `pesym` reads the export and import directories of a DLL or EXE and renders every symbol
//! with a readable name. Names decorated by the Microsoft C and C++ toolchain are decoded
//! on a best-effort basis, without relying on the platform's own undecoration API.
//!
//! ## Features
//!
//! - **Bounded reads** - Every structure is read through length-checked accessors; no
//!   struct overlay on untrusted bytes
//! - **Total address translation** - RVAs outside every section are reported, never guessed
//! - **Degrading walks** - Damaged tables produce a diagnostic or skip a record instead of
//!   failing the whole listing
//! - **Name decoding** - C and C++ decorated names, constructors, destructors, calling
//!   conventions and return types
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pesym::prelude::*;
//!
//! let file = File::from_file("user32.dll".as_ref())?;
//! let exports = walk_exports(file.layout(), &WalkOptions::default());
//! for export in &exports.records {
//!     println!("{} {}", export.ordinal, export.demangled);
//! }
//! # Ok::<(), pesym::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`file`] - Data sources (memory-mapped or owned) and bounded read primitives
//! - [`image`] - DOS/NT headers, section table and RVA translation
//! - [`symbols`] - Export and import directory walkers
//! - [`demangle`] - Decorated-name decoder, independent of the PE structures
//! - [`Error`] and [`Result`] - Error handling for the loading layer
//!
//! Only PE32 images are supported. A PE32+ image is recognised by its optional header magic
//! and both walks report [`symbols::Diagnostic::NoDataDirectories`] for it.

#[macro_use]
pub(crate) mod error;

#[cfg(test)]
pub(crate) mod test;

pub mod demangle;
pub mod file;
pub mod image;
pub mod prelude;
pub mod symbols;

/// `pesym` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `pesym` Error type
///
/// Produced by loading and header validation. The symbol walks never return it.
///
/// # Examples
///
/// ```rust,no_run
/// use pesym::{Error, File};
///
/// match File::from_mem(std::fs::read("image.bin")?) {
///     Ok(file) => println!("{} sections", file.layout().sections().len()),
///     Err(Error::BadNtSignature(found)) => println!("not a PE image: {found:#010x}"),
///     Err(e) => println!("Error: {e}"),
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub use error::Error;

/// A loaded image and the cursor used to read it.
pub use file::{parser::Parser, File};

/// Parsed headers of a loaded image.
pub use image::ImageLayout;

/// Symbol walkers.
pub use symbols::{walk_exports, walk_imports, WalkOptions};

/// Decorated-name decoder.
pub use demangle::demangle;
