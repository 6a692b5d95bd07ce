//! Low-level byte order and safe reading utilities for PE parsing.
//!
//! Every structure in a PE image is little-endian and lives inside an untrusted buffer, so
//! nothing in this crate overlays structs on raw bytes. Instead all access goes through the
//! bounds-checked helpers below, which either return a fully decoded value or
//! [`crate::Error::OutOfBounds`].
//!
//! # Key Components
//!
//! - [`crate::file::io::PeIO`] - Trait describing how a primitive is built from its little-endian bytes
//! - [`crate::file::io::read_le`] - Read a value from the start of a buffer
//! - [`crate::file::io::read_le_at`] - Read a value at an offset and advance the offset
//! - [`crate::file::io::read_cstr_at`] - Read a NUL-terminated byte string without trusting the terminator
//! - [`crate::file::io::read_fixed_str`] - Read a fixed-width, optionally NUL-padded field
//!
//! # Examples
//!
//! ```rust,ignore
//! use pesym::file::io::{read_le_at, read_cstr_at};
//!
//! let data = [0x4D, 0x5A, 0x02, 0x00, b'h', b'i', 0x00];
//! let mut offset = 0;
//!
//! let magic: u16 = read_le_at(&data, &mut offset)?;  // offset: 0 -> 2
//! let value: u16 = read_le_at(&data, &mut offset)?;  // offset: 2 -> 4
//! assert_eq!(magic, 0x5A4D);
//! assert_eq!(value, 2);
//! assert_eq!(read_cstr_at(&data, offset)?, b"hi");
//! # Ok::<(), pesym::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! All functions in this module are pure and operate on borrowed data only; they can be
//! called concurrently from any number of threads.

use crate::{Error::OutOfBounds, Result};

/// Trait for primitives that can be decoded from their little-endian byte representation.
///
/// Each implementation names the fixed-size byte array it is built from (e.g. `[u8; 4]`
/// for `u32`). Only the widths that occur in 32-bit PE structures are provided.
pub trait PeIO: Sized {
    /// Byte array type this value is decoded from.
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Build the value from little-endian bytes
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

impl PeIO for u64 {
    type Bytes = [u8; 8];

    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        u64::from_le_bytes(bytes)
    }
}

impl PeIO for u32 {
    type Bytes = [u8; 4];

    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        u32::from_le_bytes(bytes)
    }
}

impl PeIO for u16 {
    type Bytes = [u8; 2];

    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        u16::from_le_bytes(bytes)
    }
}

impl PeIO for u8 {
    type Bytes = [u8; 1];

    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        u8::from_le_bytes(bytes)
    }
}

/// Safely reads a value of type `T` in little-endian byte order from the start of `data`.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_le<T: PeIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Safely reads a value of type `T` in little-endian byte order at `offset`.
///
/// On success the offset is advanced by the size of `T`; on failure it is left untouched.
///
/// # Arguments
///
/// * `data` - The byte buffer to read from
/// * `offset` - Mutable reference to the offset position (will be advanced after reading)
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes, including the case
/// where `offset` itself lies past the end of the buffer.
///
/// # Thread Safety
///
/// This function is thread-safe. Note that the offset parameter is modified, so each thread
/// should use its own offset variable.
pub fn read_le_at<T: PeIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;

    Ok(T::from_le_bytes(read))
}

/// Reads the byte string starting at `offset` up to (not including) the first NUL byte.
///
/// The terminator is never trusted to exist: when the buffer ends before a NUL is found,
/// the bytes up to the end of the buffer are returned.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if `offset` lies past the end of `data`.
pub fn read_cstr_at(data: &[u8], offset: usize) -> Result<&[u8]> {
    if offset > data.len() {
        return Err(OutOfBounds);
    }

    let tail = &data[offset..];
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    Ok(&tail[..end])
}

/// Reads a fixed-width text field, such as an 8-byte section name.
///
/// The field does not have to be NUL-terminated; any trailing NUL padding is stripped and
/// non-UTF-8 bytes are replaced.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if the field does not fit in `data`.
pub fn read_fixed_str(data: &[u8], offset: usize, width: usize) -> Result<String> {
    let Some(end) = offset.checked_add(width) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let field = &data[offset..end];
    let used = field.iter().position(|&b| b == 0).unwrap_or(width);
    Ok(String::from_utf8_lossy(&field[..used]).into_owned())
}
