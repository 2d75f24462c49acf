use num_traits::{One, PrimInt};

/// Implemented by flag enums declared with [`define_bitmask_flags!`].
///
/// The enum discriminant is the bit index inside `Storage`.
pub trait FlagBitmask: Copy {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// Set of flags of one enum packed into a primitive integer.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    pub fn empty() -> Self {
        Self { bits: T::zero() }
    }

    pub fn from_flags<U: FlagBitmask<Storage = T>>(tags: &[U]) -> Self {
        let mut flags = Self::empty();
        for &tag in tags {
            flags.add(tag);
        }
        flags
    }

    pub fn with<U: FlagBitmask<Storage = T>>(mut self, tag: U) -> Self {
        self.add(tag);
        self
    }

    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits | tag.mask();
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits & !tag.mask();
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }

    pub fn has_any<U: FlagBitmask<Storage = T>>(&self, tags: &[U]) -> bool {
        let combined = tags.iter().fold(T::zero(), |acc, t| acc | t.mask());
        (self.bits & combined) != T::zero()
    }

    pub fn is_empty(&self) -> bool {
        self.bits == T::zero()
    }
}

/// Declare a bitmask-backed enum and implement [`FlagBitmask`] for it.
///
/// ```rust
/// hover_shared::define_bitmask_flags!(SurfaceKind, u8, {
///     Ice,
///     Mud,
/// });
/// ```
#[macro_export]
macro_rules! define_bitmask_flags {
    ($name:ident, $storage:ty, { $($(#[$meta:meta])* $variant:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($(#[$meta])* $variant),*
        }

        impl $crate::bitmask_flags::FlagBitmask for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}
