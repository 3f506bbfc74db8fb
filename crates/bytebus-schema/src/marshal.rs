//! Cursor-based canonical encoding over fixed buffers.

use crate::error::{MarshalError, Result};

/// A scalar with a canonical big-endian wire form.
///
/// Implemented for the full scalar set carried on the bus:
/// `u8 i8 u16 i16 u32 i32 u64 i64 bool f32 f64`.
pub trait Scalar: Sized + Copy {
    fn write(self, writer: &mut Writer<'_>) -> Result<()>;
    fn read(reader: &mut Reader<'_>) -> Result<Self>;
}

/// Canonical encoder writing into a caller-provided buffer.
///
/// Never allocates; writes fail with [`MarshalError::BufferOverflow`] once
/// the buffer is full.
pub struct Writer<'a> {
    out: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    pub fn new(out: &'a mut [u8]) -> Self {
        Self { out, pos: 0 }
    }

    /// Bytes written so far.
    pub fn bytes_written(&self) -> usize {
        self.pos
    }

    /// Write one scalar in canonical form.
    pub fn write<T: Scalar>(&mut self, value: T) -> Result<()> {
        value.write(self)
    }

    /// Write a slice element-by-element, ascending index, no length prefix.
    pub fn write_array<T: Scalar>(&mut self, values: &[T]) -> Result<()> {
        for &value in values {
            self.write(value)?;
        }
        Ok(())
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.pos + bytes.len();
        if end > self.out.len() {
            return Err(MarshalError::BufferOverflow);
        }
        self.out[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }
}

/// Canonical decoder reading from a payload slice.
///
/// Reads fail with [`MarshalError::UnexpectedEnd`] on underflow; decoders
/// that require exact payloads check [`Reader::fully_consumed`] at the end.
pub struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// True once every input byte has been read.
    pub fn fully_consumed(&self) -> bool {
        self.pos == self.input.len()
    }

    /// Read one scalar in canonical form.
    pub fn read<T: Scalar>(&mut self) -> Result<T> {
        T::read(self)
    }

    /// Fill a slice element-by-element, ascending index.
    pub fn read_array<T: Scalar>(&mut self, values: &mut [T]) -> Result<()> {
        for value in values {
            *value = self.read()?;
        }
        Ok(())
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self.pos + count;
        if end > self.input.len() {
            return Err(MarshalError::UnexpectedEnd);
        }
        let bytes = &self.input[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }
}

macro_rules! impl_scalar_int {
    ($($ty:ty),*) => {
        $(
            impl Scalar for $ty {
                fn write(self, writer: &mut Writer<'_>) -> Result<()> {
                    writer.put(&self.to_be_bytes())
                }

                fn read(reader: &mut Reader<'_>) -> Result<Self> {
                    let bytes = reader.take(std::mem::size_of::<$ty>())?;
                    Ok(<$ty>::from_be_bytes(bytes.try_into().unwrap()))
                }
            }
        )*
    };
}

impl_scalar_int!(u8, i8, u16, i16, u32, i32, u64, i64);

impl Scalar for bool {
    fn write(self, writer: &mut Writer<'_>) -> Result<()> {
        writer.put(&[u8::from(self)])
    }

    fn read(reader: &mut Reader<'_>) -> Result<Self> {
        match reader.take(1)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(MarshalError::InvalidBool),
        }
    }
}

// Floats travel by bit pattern; a value round-trips bit-exactly, NaN
// payloads included.
impl Scalar for f32 {
    fn write(self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write(self.to_bits())
    }

    fn read(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(f32::from_bits(reader.read::<u32>()?))
    }
}

impl Scalar for f64 {
    fn write(self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write(self.to_bits())
    }

    fn read(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(f64::from_bits(reader.read::<u64>()?))
    }
}
