//! Bit access on register images
//!
//! The driver keeps in-memory copies of a few registers and edits them one
//! bit at a time before writing them back. Bit `n` lives in byte `n / 8` at
//! position `n % 8`, counted from the first byte of the image, which matches
//! the little-endian layout of the DW1000 register map.

use core::fmt;

#[cfg(feature = "defmt")]
use defmt::Format;

/// A bit position that does not exist in the addressed image
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct OutOfRange {
    /// The requested bit position
    pub bit: usize,
    /// Length of the image in bytes
    pub len: usize,
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "bit {} is outside of a {}-byte register image",
            self.bit, self.len
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for OutOfRange {}

#[inline(always)]
fn locate(len: usize, bit: usize) -> Result<(usize, u8), OutOfRange> {
    let index = bit / 8;
    if index >= len {
        return Err(OutOfRange { bit, len });
    }

    Ok((index, 1 << (bit % 8)))
}

/// Sets or clears a single bit of `image`
///
/// Fails without touching `image` if `bit` is not within `8 * image.len()`.
pub fn set_bit(image: &mut [u8], bit: usize, value: bool) -> Result<(), OutOfRange> {
    let (index, mask) = locate(image.len(), bit)?;

    if value {
        image[index] |= mask;
    } else {
        image[index] &= !mask;
    }

    Ok(())
}

/// Reads a single bit of `image`
pub fn get_bit(image: &[u8], bit: usize) -> Result<bool, OutOfRange> {
    let (index, mask) = locate(image.len(), bit)?;

    Ok(image[index] & mask != 0)
}

/// In-memory shadow of one `N`-byte register
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct RegisterImage<const N: usize>([u8; N]);

impl<const N: usize> RegisterImage<N> {
    /// Width of the register in bytes
    pub const LEN: usize = N;

    /// An all-zero image
    pub const fn new() -> Self {
        RegisterImage([0; N])
    }

    /// Wraps bytes that were read from the device
    pub const fn from_bytes(bytes: [u8; N]) -> Self {
        RegisterImage(bytes)
    }

    /// Sets or clears one bit
    pub fn set_bit(&mut self, bit: usize, value: bool) -> Result<(), OutOfRange> {
        set_bit(&mut self.0, bit, value)
    }

    /// Reads one bit
    pub fn get_bit(&self, bit: usize) -> Result<bool, OutOfRange> {
        get_bit(&self.0, bit)
    }

    /// Returns byte `index`
    pub fn byte(&self, index: usize) -> Result<u8, OutOfRange> {
        self.0
            .get(index)
            .copied()
            .ok_or_else(|| OutOfRange {
                bit: index.saturating_mul(8),
                len: N,
            })
    }

    /// Overwrites byte `index`
    pub fn set_byte(&mut self, index: usize, value: u8) -> Result<(), OutOfRange> {
        let byte = self
            .0
            .get_mut(index)
            .ok_or_else(|| OutOfRange {
                bit: index.saturating_mul(8),
                len: N,
            })?;
        *byte = value;

        Ok(())
    }

    /// ORs `value` into byte `index`, leaving bits that are already set alone
    pub fn merge_byte(&mut self, index: usize, value: u8) -> Result<(), OutOfRange> {
        let byte = self
            .0
            .get_mut(index)
            .ok_or_else(|| OutOfRange {
                bit: index.saturating_mul(8),
                len: N,
            })?;
        *byte |= value;

        Ok(())
    }

    /// Zeroes the whole image
    pub fn clear(&mut self) {
        self.0 = [0; N];
    }

    /// The raw image
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }

    /// The raw image, mutably
    pub fn as_bytes_mut(&mut self) -> &mut [u8; N] {
        &mut self.0
    }
}

impl<const N: usize> Default for RegisterImage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for RegisterImage<N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x")?;
        for byte in self.0.iter().rev() {
            write!(f, "{:02x}", byte)?;
        }

        Ok(())
    }
}

#[cfg(feature = "defmt")]
impl<const N: usize> defmt::Format for RegisterImage<N> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "0x");
        for byte in self.0.iter().rev() {
            defmt::write!(f, "{:02x}", byte);
        }
    }
}
