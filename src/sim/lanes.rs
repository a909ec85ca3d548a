//! Fixed road lanes

use serde::{Deserialize, Serialize};

use crate::consts::{LANE_COUNT, LANE_OFFSETS, PLAYER_START_LANE};

/// One of the four lateral traffic corridors, indexed outer-left to outer-right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Lane(u8);

impl Lane {
    pub const ALL: [Lane; LANE_COUNT] = [Lane(0), Lane(1), Lane(2), Lane(3)];

    pub fn new(index: usize) -> Option<Self> {
        (index < LANE_COUNT).then_some(Lane(index as u8))
    }

    /// Lane the player starts each run in
    pub fn start() -> Self {
        Lane(PLAYER_START_LANE as u8)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Lateral offset of the lane center
    #[inline]
    pub fn offset(self) -> f32 {
        LANE_OFFSETS[self.index()]
    }

    /// Neighbouring lane to the left, if any
    pub fn left(self) -> Option<Lane> {
        self.index().checked_sub(1).and_then(Lane::new)
    }

    /// Neighbouring lane to the right, if any
    pub fn right(self) -> Option<Lane> {
        Lane::new(self.index() + 1)
    }
}
