use core::hash::BuildHasherDefault;
use core::hash::Hasher;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder used when a table is created without one.
        ///
        /// With the `foldhash` feature this is `foldhash::fast::RandomState`.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The hasher builder used when a table is created without one.
        ///
        /// Without `foldhash` but with `std` this is `std::hash::RandomState`.
        pub type DefaultHashBuilder = std::hash::RandomState;
    } else {
        /// The hasher builder used when a table is created without one.
        ///
        /// With neither `foldhash` nor `std`, keys hash to their own bit
        /// pattern.
        pub type DefaultHashBuilder = IdentityHashBuilder;
    }
}

/// Builds [`IdentityHasher`]s.
pub type IdentityHashBuilder = BuildHasherDefault<IdentityHasher>;

/// A hasher that uses the key's bit pattern as its hash.
///
/// A single integer write hashes to the integer's value, so `5u64` hashes to
/// `5`. Further writes, and arbitrary byte writes taken little-endian eight
/// bytes at a time, are folded into the state with a rotate and xor.
///
/// Only a good choice for keys whose values are already well distributed, or
/// when the bucket of every key must be predictable.
///
/// # Examples
///
/// ```rust
/// use core::hash::BuildHasher;
///
/// use probe_hash::IdentityHashBuilder;
///
/// let builder = IdentityHashBuilder::default();
/// assert_eq!(builder.hash_one(5u64), 5);
/// assert_eq!(builder.hash_one(9i32), 9);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityHasher {
    state: u64,
}

impl IdentityHasher {
    #[inline(always)]
    fn fold(&mut self, word: u64) {
        self.state = self.state.rotate_left(5) ^ word;
    }
}

impl Hasher for IdentityHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for chunk in bytes.chunks(8) {
            let mut word = [0u8; 8];
            word[..chunk.len()].copy_from_slice(chunk);
            self.fold(u64::from_le_bytes(word));
        }
    }

    #[inline]
    fn write_u8(&mut self, i: u8) {
        self.fold(i as u64);
    }

    #[inline]
    fn write_u16(&mut self, i: u16) {
        self.fold(i as u64);
    }

    #[inline]
    fn write_u32(&mut self, i: u32) {
        self.fold(i as u64);
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.fold(i);
    }

    #[inline]
    fn write_u128(&mut self, i: u128) {
        self.fold(i as u64);
        self.fold((i >> 64) as u64);
    }

    #[inline]
    fn write_usize(&mut self, i: usize) {
        self.fold(i as u64);
    }

    #[inline]
    fn write_i8(&mut self, i: i8) {
        self.write_u8(i as u8);
    }

    #[inline]
    fn write_i16(&mut self, i: i16) {
        self.write_u16(i as u16);
    }

    #[inline]
    fn write_i32(&mut self, i: i32) {
        self.write_u32(i as u32);
    }

    #[inline]
    fn write_i64(&mut self, i: i64) {
        self.write_u64(i as u64);
    }

    #[inline]
    fn write_i128(&mut self, i: i128) {
        self.write_u128(i as u128);
    }

    #[inline]
    fn write_isize(&mut self, i: isize) {
        self.write_usize(i as usize);
    }
}
