//! # Block Heights and Epochs
//!
//! The escrow engine never reads ambient time. It asks an injected
//! [`HeightSource`] for the current height and buckets it into an
//! [`Epoch`] using an [`EpochSchedule`]. Receiver assignment is gated per
//! epoch: at most one successful `set-receiver` per account per bucket.
//!
//! ```text
//! height:  0 .. 9 | 10 .. 19 | 20 .. 29     (blocks_per_epoch = 10)
//! epoch:      0   |     1    |     2
//! ```

use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use crate::error::MofnError;

/// A block height. Monotonically non-decreasing over the life of a ledger.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockHeight(pub u64);

impl BlockHeight {
    /// Height zero, before anything has been mined.
    pub const GENESIS: BlockHeight = BlockHeight(0);

    /// The raw height.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// The height of the next block.
    pub fn next(&self) -> BlockHeight {
        BlockHeight(self.0.saturating_add(1))
    }
}

impl std::fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fixed-width bucket of consecutive block heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epoch(pub u64);

impl std::fmt::Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "epoch:{}", self.0)
    }
}

/// Maps heights to epochs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct EpochSchedule {
    blocks_per_epoch: NonZeroU64,
}

impl EpochSchedule {
    /// Epoch width used by the reference deployment.
    pub const DEFAULT_BLOCKS_PER_EPOCH: u64 = 10;

    /// Create a schedule. Rejects a width of zero.
    pub fn new(blocks_per_epoch: u64) -> Result<Self, MofnError> {
        NonZeroU64::new(blocks_per_epoch)
            .map(|blocks_per_epoch| Self { blocks_per_epoch })
            .ok_or(MofnError::InvalidSchedule)
    }

    /// Number of blocks in one epoch.
    pub fn blocks_per_epoch(&self) -> u64 {
        self.blocks_per_epoch.get()
    }

    /// The epoch containing `height`.
    pub fn epoch_of(&self, height: BlockHeight) -> Epoch {
        Epoch(height.0 / self.blocks_per_epoch.get())
    }

    /// First height of `epoch`.
    pub fn first_height(&self, epoch: Epoch) -> BlockHeight {
        BlockHeight(epoch.0.saturating_mul(self.blocks_per_epoch.get()))
    }
}

impl Default for EpochSchedule {
    fn default() -> Self {
        Self {
            blocks_per_epoch: NonZeroU64::new(Self::DEFAULT_BLOCKS_PER_EPOCH)
                .unwrap_or(NonZeroU64::MIN),
        }
    }
}

impl TryFrom<u64> for EpochSchedule {
    type Error = MofnError;

    fn try_from(v: u64) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl From<EpochSchedule> for u64 {
    fn from(s: EpochSchedule) -> Self {
        s.blocks_per_epoch.get()
    }
}

/// Source of the current block height.
pub trait HeightSource {
    /// The height at which the current operation executes.
    fn current_height(&self) -> BlockHeight;
}

/// A height source pinned to one value. Useful for tests and replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedHeight(pub BlockHeight);

impl HeightSource for FixedHeight {
    fn current_height(&self) -> BlockHeight {
        self.0
    }
}

impl<H: HeightSource + ?Sized> HeightSource for &H {
    fn current_height(&self) -> BlockHeight {
        (**self).current_height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_is_ten_blocks() {
        let s = EpochSchedule::default();
        assert_eq!(s.blocks_per_epoch(), 10);
        assert_eq!(s.epoch_of(BlockHeight(0)), Epoch(0));
        assert_eq!(s.epoch_of(BlockHeight(9)), Epoch(0));
        assert_eq!(s.epoch_of(BlockHeight(10)), Epoch(1));
        assert_eq!(s.epoch_of(BlockHeight(29)), Epoch(2));
    }

    #[test]
    fn zero_width_is_rejected() {
        assert!(matches!(
            EpochSchedule::new(0),
            Err(MofnError::InvalidSchedule)
        ));
    }

    #[test]
    fn first_height_is_bucket_start() {
        let s = EpochSchedule::new(7).unwrap();
        assert_eq!(s.first_height(Epoch(3)), BlockHeight(21));
        assert_eq!(s.epoch_of(s.first_height(Epoch(3))), Epoch(3));
    }

    #[test]
    fn schedule_serializes_as_width() {
        let s = EpochSchedule::new(25).unwrap();
        assert_eq!(serde_json::to_string(&s).unwrap(), "25");
        let back: EpochSchedule = serde_json::from_str("25").unwrap();
        assert_eq!(back, s);
        assert!(serde_json::from_str::<EpochSchedule>("0").is_err());
    }

    #[test]
    fn fixed_height_source() {
        let h = FixedHeight(BlockHeight(42));
        assert_eq!(h.current_height(), BlockHeight(42));
        assert_eq!((&h).current_height(), BlockHeight(42));
    }

    #[test]
    fn height_next_saturates() {
        assert_eq!(BlockHeight(1).next(), BlockHeight(2));
        assert_eq!(BlockHeight(u64::MAX).next(), BlockHeight(u64::MAX));
    }
}
