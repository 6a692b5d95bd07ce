//! Cursor-based byte stream parser.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a bounds-checked cursor over
//! a borrowed byte slice. It is used for two very different inputs:
//!
//! - **Symbol directories** - sequential little-endian reads of the export directory and
//!   the import descriptors, over slices handed out by [`crate::image::AddressResolver`]
//! - **Mangled symbol names** - byte-wise scanning with
//!   [`crate::file::parser::Parser::peek_byte`], [`crate::file::parser::Parser::eat`] and
//!   [`crate::file::parser::Parser::read_until`] in [`crate::demangle`]
//!
//! In both cases the parser never reads past the end of its slice and never relies on an
//! implicit NUL terminator.
//!
//! # Examples
//!
//! ```rust
//! use pesym::Parser;
//!
//! let data = b"Bar@Widget@@QAEXXZ";
//! let mut parser = Parser::new(data);
//!
//! assert_eq!(parser.read_until(b'@'), b"Bar");
//! assert!(parser.eat(b'@'));
//! assert_eq!(parser.read_until(b'@'), b"Widget");
//! assert_eq!(parser.peek_byte_at(1)?, b'@');
//! # Ok::<(), pesym::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! [`crate::file::parser::Parser`] is [`Send`] and [`Sync`] since it only holds a shared
//! slice and a position. Each thread should still use its own parser instance.

use crate::{
    file::io::{read_le_at, PeIO},
    Result,
};

/// A cursor over a borrowed byte slice with bounds-checked reads.
///
/// All operations validate the requested range before touching the data. Operations that
/// fail leave the position untouched.
pub struct Parser<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying slice.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the underlying slice is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` while the cursor has not reached the end of the slice.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Number of bytes left between the cursor and the end of the slice.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Move the cursor to an absolute position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `pos` is not inside the slice.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos >= self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Move the cursor forward by one byte.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the cursor is already at the end.
    pub fn advance(&mut self) -> Result<()> {
        self.advance_by(1)
    }

    /// Move the cursor forward by `step` bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if this would move past the end of the slice.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        if step > self.remaining() {
            return Err(out_of_bounds_error!());
        }

        self.position += step;
        Ok(())
    }

    /// Current cursor position.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// The complete underlying slice, independent of the cursor.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Look at the byte under the cursor without consuming it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] at the end of the slice.
    pub fn peek_byte(&self) -> Result<u8> {
        self.peek_byte_at(0)
    }

    /// Look at the byte `ahead` positions past the cursor without consuming anything.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if that position is past the end of the slice.
    pub fn peek_byte_at(&self, ahead: usize) -> Result<u8> {
        match self.position.checked_add(ahead) {
            Some(idx) if idx < self.data.len() => Ok(self.data[idx]),
            _ => Err(out_of_bounds_error!()),
        }
    }

    /// Consume the byte under the cursor if it equals `expected`.
    ///
    /// Returns whether the byte was consumed; at the end of the slice this is `false`.
    pub fn eat(&mut self, expected: u8) -> bool {
        if self.peek_byte().ok() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Read a little-endian value and advance past it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if not enough bytes remain.
    pub fn read_le<T: PeIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read `length` raw bytes and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if not enough bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        if length > self.remaining() {
            return Err(out_of_bounds_error!());
        }

        let bytes = &self.data[self.position..self.position + length];
        self.position += length;
        Ok(bytes)
    }

    /// Read every byte up to the next `delimiter` or the end of the slice.
    ///
    /// The delimiter itself is not consumed, so the cursor is left either on the delimiter
    /// or at the end of the slice. Never fails; at the end of the slice this returns an
    /// empty slice.
    pub fn read_until(&mut self, delimiter: u8) -> &'a [u8] {
        let start = self.position.min(self.data.len());
        let tail = &self.data[start..];
        let len = tail
            .iter()
            .position(|&b| b == delimiter)
            .unwrap_or(tail.len());

        self.position = start + len;
        &tail[..len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_sequential_reads() {
        let data = [0x4D, 0x5A, 0x90, 0x00, 0x03, 0x00, 0x00, 0x00];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.read_le::<u16>().unwrap(), 0x5A4D);
        assert_eq!(parser.read_le::<u16>().unwrap(), 0x0090);
        assert_eq!(parser.read_le::<u32>().unwrap(), 3);
        assert!(!parser.has_more_data());
        assert!(matches!(parser.read_le::<u8>(), Err(Error::OutOfBounds)));
    }

    #[test]
    fn test_seek_and_advance() {
        let data = [0x00, 0x01, 0x02, 0x03];
        let mut parser = Parser::new(&data);

        parser.seek(2).unwrap();
        assert_eq!(parser.peek_byte().unwrap(), 0x02);
        assert!(parser.seek(4).is_err());

        parser.advance().unwrap();
        assert_eq!(parser.pos(), 3);
        assert!(parser.advance_by(2).is_err());
        assert_eq!(parser.pos(), 3);
        parser.advance().unwrap();
        assert!(parser.advance().is_err());
        assert_eq!(parser.remaining(), 0);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut parser = Parser::new(b"?0A");
        assert_eq!(parser.peek_byte().unwrap(), b'?');
        assert_eq!(parser.peek_byte_at(1).unwrap(), b'0');
        assert!(parser.peek_byte_at(3).is_err());
        assert!(parser.peek_byte_at(usize::MAX).is_err());
        assert_eq!(parser.pos(), 0);
    }

    #[test]
    fn test_eat() {
        let mut parser = Parser::new(b"@@x");
        assert!(parser.eat(b'@'));
        assert!(!parser.eat(b'x'));
        assert!(parser.eat(b'@'));
        assert!(parser.eat(b'x'));
        assert!(!parser.eat(b'x'));
    }

    #[test]
    fn test_read_until() {
        let mut parser = Parser::new(b"Foo@Bar");
        assert_eq!(parser.read_until(b'@'), b"Foo");
        assert_eq!(parser.peek_byte().unwrap(), b'@');
        // Sitting on the delimiter yields an empty segment
        assert_eq!(parser.read_until(b'@'), b"");
        parser.advance().unwrap();
        assert_eq!(parser.read_until(b'@'), b"Bar");
        assert!(!parser.has_more_data());
        assert_eq!(parser.read_until(b'@'), b"");
    }

    #[test]
    fn test_read_bytes() {
        let data = [0x01, 0x02, 0x03];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.read_bytes(2).unwrap(), &[0x01, 0x02]);
        assert!(parser.read_bytes(2).is_err());
        assert_eq!(parser.read_bytes(1).unwrap(), &[0x03]);
        assert_eq!(parser.read_bytes(0).unwrap(), &[] as &[u8]);
    }
}
