use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Errors are only produced by the host side of the crate: loading bytes, validating the
/// DOS/NT signatures and reading the fixed header structures. The export and import walks
/// never fail on damaged tables; they degrade into a [`crate::symbols::Diagnostic`] or skip the
/// affected record instead.
///
/// # Error Categories
///
/// ## File Parsing Errors
/// - [`Error::Malformed`] - Corrupted or invalid file structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond file boundaries
/// - [`Error::BadDosSignature`] / [`Error::BadNtSignature`] - Not a PE image
/// - [`Error::RvaNotMapped`] - An RVA is not covered by any section
/// - [`Error::Empty`] - Empty input provided
/// - [`Error::GoblinErr`] - Header decoding errors reported by `goblin`
///
/// ## I/O and External Errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::Error`] - Miscellaneous failures such as a failed memory mapping
///
/// # Examples
///
/// ```rust,no_run
/// use pesym::{Error, File};
/// use std::path::Path;
///
/// match File::from_file(Path::new("library.dll")) {
///     Ok(file) => println!("{} sections", file.layout().sections().len()),
///     Err(Error::BadDosSignature(found)) => eprintln!("not an MZ image: {found:#06x}"),
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The file is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// The DOS header does not start with `MZ`.
    #[error("Bad PE DOS signature! Expected 'MZ', got {0:#06x}")]
    BadDosSignature(u16),

    /// The NT headers do not start with `PE\0\0`.
    #[error("Bad PE NT signature! Expected 'PE', got {0:#010x}")]
    BadNtSignature(u32),

    /// The RVA is not contained in any section of the image.
    #[error("RVA {0:#x} is not covered by any section")]
    RvaNotMapped(u32),

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// Error from the goblin crate while decoding the PE headers or section table.
    #[error("{0}")]
    GoblinErr(#[from] goblin::error::Error),

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
