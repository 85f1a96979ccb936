//! Storage width of recorded samples.
//!
//! Samples are stored as microsecond offsets from the first recorded sample of
//! the session. A narrower type saves memory at the cost of a shorter capture
//! window: with `u16` an offset wraps after 65 535 µs, with `u8` after 255 µs.
//! Offsets that exceed the width are truncated, not detected.

/// Unsigned integer type used to store one sample offset.
pub trait SampleDepth: Copy + Default + Send + 'static {
    /// Largest offset in microseconds that is stored without truncation.
    const MAX_OFFSET: u32;

    /// Truncate an offset to this width.
    fn from_offset(offset: u32) -> Self;

    /// Widen back to a microsecond offset.
    fn offset(self) -> u32;
}

macro_rules! impl_sample_depth {
    ($($ty:ty),*) => {
        $(
            impl SampleDepth for $ty {
                const MAX_OFFSET: u32 = <$ty>::MAX as u32;

                fn from_offset(offset: u32) -> Self {
                    offset as Self
                }

                fn offset(self) -> u32 {
                    u32::from(self)
                }
            }
        )*
    };
}

impl_sample_depth!(u8, u16);

impl SampleDepth for u32 {
    const MAX_OFFSET: u32 = u32::MAX;

    fn from_offset(offset: u32) -> Self {
        offset
    }

    fn offset(self) -> u32 {
        self
    }
}
