//! Time-related types based on the DW1000's system time

use core::ops::{Add, Sub};

#[cfg(feature = "defmt")]
use defmt::Format;

/// The maximum value of 40-bit system time stamps.
pub const TIME_MAX: u64 = 0xffffffffff;

/// Low bits of DX_TIME that the DW1000 ignores when scheduling a delayed
/// transmission or reception.
pub const DELAY_IGNORED_BITS: u32 = 9;

/// Represents an instant in time
///
/// You can get the current DW1000 system time by calling [`DW1000::sys_time`].
///
/// Internally uses the same 40-bit timestamps that the DW1000 uses.
///
/// [`DW1000::sys_time`]: ../hl/struct.DW1000.html#method.sys_time
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instant(u64);

impl Instant {
    /// Creates a new instance of `Instant`
    ///
    /// The given value must fit in a 40-bit timestamp, so:
    /// 0 <= `value` <= 2^40 - 1
    ///
    /// Returns `Some(...)`, if `value` is within the valid range, `None` if it
    /// isn't.
    ///
    /// # Example
    ///
    /// ``` rust
    /// use dw1000_ng::time::{
    ///     TIME_MAX,
    ///     Instant,
    /// };
    ///
    /// let valid_instant   = Instant::new(TIME_MAX);
    /// let invalid_instant = Instant::new(TIME_MAX + 1);
    ///
    /// assert!(valid_instant.is_some());
    /// assert!(invalid_instant.is_none());
    /// ```
    pub fn new(value: u64) -> Option<Self> {
        if value <= TIME_MAX {
            Some(Instant(value))
        } else {
            None
        }
    }

    /// Decodes the 5 little-endian bytes of a time stamp register
    pub fn from_le_bytes(bytes: [u8; 5]) -> Self {
        let mut value = 0;
        for (i, &b) in bytes.iter().enumerate() {
            value |= (b as u64) << (i * 8);
        }

        Instant(value)
    }

    /// Encodes the instant the way DX_TIME expects it
    pub fn to_le_bytes(&self) -> [u8; 5] {
        let mut bytes = [0; 5];
        bytes.copy_from_slice(&self.0.to_le_bytes()[..5]);

        bytes
    }

    /// Returns the raw 40-bit timestamp
    ///
    /// The returned value is guaranteed to be in the following range:
    /// 0 <= `value` <= 2^40 - 1
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Clears the bits the DW1000 ignores in DX_TIME
    ///
    /// The device only schedules on multiples of 512 time units (about 8 ns),
    /// so this is the instant it will actually act at.
    ///
    /// ``` rust
    /// use dw1000_ng::time::Instant;
    ///
    /// let instant = Instant::new(0x1_0000_01ff).unwrap();
    /// assert_eq!(instant.truncate_for_delay().value(), 0x1_0000_0000);
    /// ```
    pub fn truncate_for_delay(&self) -> Instant {
        Instant(self.0 & !((1 << DELAY_IGNORED_BITS) - 1))
    }

    /// Returns the amount of time passed between the two `Instant`s
    ///
    /// Assumes that `&self` represents a later time than the argument
    /// `earlier`. DW1000 timestamps wrap around after about 17 seconds, so
    /// comparing the numerical values doesn't tell anything about order.
    ///
    /// # Example
    ///
    /// ``` rust
    /// use dw1000_ng::time::{
    ///     TIME_MAX,
    ///     Instant,
    /// };
    ///
    /// let instant_1 = Instant::new(TIME_MAX - 50).unwrap();
    /// let instant_2 = Instant::new(TIME_MAX).unwrap();
    /// let instant_3 = Instant::new(49).unwrap();
    ///
    /// assert_eq!(instant_2.duration_since(instant_1).value(), 50);
    /// assert_eq!(instant_3.duration_since(instant_2).value(), 50);
    /// ```
    pub fn duration_since(&self, earlier: Instant) -> Duration {
        Duration(self.0.wrapping_sub(earlier.0) & TIME_MAX)
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Self::Output {
        // Both values are 40-bit, so the sum can't overflow a `u64`.
        Instant((self.0 + rhs.0) & TIME_MAX)
    }
}

impl Sub<Duration> for Instant {
    type Output = Instant;

    fn sub(self, rhs: Duration) -> Self::Output {
        Instant(self.0.wrapping_sub(rhs.0) & TIME_MAX)
    }
}

/// A duration between two instants in DW1000 system time
///
/// Internally uses the same 40-bit timestamps that the DW1000 uses.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Duration(u64);

impl Duration {
    /// Creates a new instance of `Duration`
    ///
    /// Returns `None` if `value` does not fit in 40 bits.
    ///
    /// ``` rust
    /// use dw1000_ng::time::{TIME_MAX, Duration};
    ///
    /// assert!(Duration::new(TIME_MAX).is_some());
    /// assert!(Duration::new(TIME_MAX + 1).is_none());
    /// ```
    pub fn new(value: u64) -> Option<Self> {
        if value <= TIME_MAX {
            Some(Duration(value))
        } else {
            None
        }
    }

    /// Creates an instance of `Duration` from a number of nanoseconds, rounding to the nearest
    ///
    /// One DW1000 time unit is 1/(128*499.2*10^6) seconds, so 1 nanosecond
    /// is 63.8976 time units.
    pub fn from_nanos(nanos: u32) -> Self {
        // At most 32 bits times a 20-bit factor, well within 40 bits after
        // the division.
        Duration((nanos as u64 * 638976 + 5000) / 10000)
    }

    /// Returns the raw 40-bit value
    pub fn value(&self) -> u64 {
        self.0
    }
}
