//! Bounded formatting of option values.
//!
//! Numbers are rendered into a small fixed buffer on the stack instead of a `String`, so the
//! worst-case cost is known up front and an oversized value is an error rather than an
//! allocation.

use crate::TranslationError;
use std::fmt::{self, Write as _};

/// Size of the scratch buffer, including room for the terminating NUL the value will be stored
/// with.
pub const SCRATCH_LEN: usize = 64;

struct SliceFmt<'a> {
    slice: &'a mut [u8],
    offset: usize,
}

impl<'a> SliceFmt<'a> {
    fn new(slice: &'a mut [u8]) -> Self {
        Self { slice, offset: 0 }
    }
}

impl fmt::Write for SliceFmt<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        if self.slice.len() - self.offset < bytes.len() {
            return Err(fmt::Error);
        }

        self.slice[self.offset..(self.offset + bytes.len())].copy_from_slice(bytes);
        self.offset += bytes.len();

        Ok(())
    }
}

/// Render `args` into `scratch`, returning the rendered text without a terminator.
pub fn render<'a>(
    scratch: &'a mut [u8; SCRATCH_LEN],
    args: fmt::Arguments<'_>,
) -> Result<&'a [u8], TranslationError> {
    let mut out = SliceFmt::new(&mut scratch[..SCRATCH_LEN - 1]);
    out.write_fmt(args)
        .map_err(|_| TranslationError::FormatOverflow)?;
    let len = out.offset;
    Ok(&scratch[..len])
}
