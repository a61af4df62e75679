use ptk_buffer::Cursor;

use crate::{Endian, error::CodecError};

/// Implemented by user-defined composite PDUs (nested types, tagged unions,
/// length-prefixed arrays) so they can appear as [`crate::Field::Custom`] /
/// [`crate::FieldMut::Custom`] entries in a `serialize`/`deserialize` call.
///
/// Arrays whose length is a function of an earlier field, optional fields
/// gated by a predicate over earlier fields, and tagged unions are all
/// expressed by hand inside `write`/`read`: call [`crate::serialize`] /
/// [`crate::deserialize`] recursively over the sub-fields the composite
/// decides are present.
pub trait Wire {
    /// Appends this value's encoding. Must write exactly [`Self::size`]
    /// bytes when `size` returns a fixed (non-zero-sentinel) answer.
    fn write(&self, cursor: &mut Vec<u8>, endian: Endian) -> Result<(), CodecError>;

    /// Reads this value from `cursor`, replacing `self` in place so the
    /// type can be used uninitialized-then-filled from a [`FieldMut`].
    fn read(&mut self, cursor: &mut Cursor<'_>, endian: Endian) -> Result<(), CodecError>;

    /// Encoded width of the fields currently present, in bytes. Used by
    /// [`crate::serialize`] to size-check before committing any bytes.
    fn size(&self) -> usize;
}
