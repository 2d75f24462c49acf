//! Controller mode flags.
//!
//! Modes combine freely: `"PointToMove FixedCamera"` enables both behaviors.

use crate::{bitmask_flags::BitmaskFlags, define_bitmask_flags, error::ConfigError};

define_bitmask_flags!(ModeFlag, u8, {
    Default,
    PointToMove,
    FixedCamera,
    CameraBasedMovement,
});

#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct ModeFlags(BitmaskFlags<u8>);

impl ModeFlags {
    /// Parse a whitespace separated list of mode tokens.
    ///
    /// An empty or blank string yields `Default`. Unknown tokens are rejected.
    pub fn parse(tokens: &str) -> Result<Self, ConfigError> {
        let mut flags = BitmaskFlags::<u8>::empty();
        for token in tokens.split_whitespace() {
            let flag = match token {
                "Default" => ModeFlag::Default,
                "PointToMove" => ModeFlag::PointToMove,
                "FixedCamera" => ModeFlag::FixedCamera,
                "CameraBasedMovement" => ModeFlag::CameraBasedMovement,
                other => return Err(ConfigError::UnknownMode(other.to_owned())),
            };
            flags.add(flag);
        }
        if flags.is_empty() {
            flags.add(ModeFlag::Default);
        }
        log::info!("controller modes: {tokens:?} -> {:#06b}", flags.bits);
        Ok(Self(flags))
    }

    pub fn from_flags(flags: &[ModeFlag]) -> Self {
        Self(BitmaskFlags::from_flags(flags))
    }

    #[inline]
    pub fn contains(&self, flag: ModeFlag) -> bool {
        self.0.has(flag)
    }

    #[inline]
    pub fn point_to_move(&self) -> bool {
        self.contains(ModeFlag::PointToMove)
    }

    #[inline]
    pub fn fixed_camera(&self) -> bool {
        self.contains(ModeFlag::FixedCamera)
    }

    #[inline]
    pub fn camera_based(&self) -> bool {
        self.contains(ModeFlag::CameraBasedMovement)
    }
}
