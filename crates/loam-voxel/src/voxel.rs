//! Voxel codes classified by their position in an ordered enumeration.
//!
//! Every class of voxel (water, decorative, cube, partially opaque, opaque) is
//! delimited by sentinel variants. A code's class is decided by comparing its
//! discriminant against the sentinels, so no lookup table is needed. Sentinels
//! themselves are never stored in a chunk.

use serde::{Deserialize, Serialize};

/// A voxel type, stored as 2 bytes in every chunk cell and persisted verbatim
/// in the high half of each codec record.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(u16)]
pub enum VoxelCode {
    /// Air.
    #[default]
    Empty = 0,
    /// Sentinel: lower bound of the water class.
    WaterLower,
    /// A full block of still water.
    Water,
    /// Sentinel: upper bound of the water class.
    WaterUpper,
    /// Tall grass billboard.
    TallGrass,
    /// Rose billboard.
    Roses,
    /// Sunflower billboard.
    Sunflower,
    /// Sentinel: every code above this is meshed as a cube.
    CubeLower,
    /// Transparent cube.
    Glass,
    /// Sentinel: lower bound of the partially opaque class.
    PartialOpaqueLower,
    /// Leaf block. Skylight falls straight through it without attenuation.
    Leaves,
    /// Sentinel: every code above this is opaque.
    OpaqueLower,
    /// Dirt.
    Dirt,
    /// Dirt with a grass top.
    GrassBlock,
    /// Stone.
    Stone,
    /// Sand.
    Sand,
    /// Tree trunk.
    Wood,
    /// Snow.
    Snow,
}

impl VoxelCode {
    /// Every code that may be stored in a chunk, in discriminant order.
    pub const REAL: [VoxelCode; 13] = [
        Self::Empty,
        Self::Water,
        Self::TallGrass,
        Self::Roses,
        Self::Sunflower,
        Self::Glass,
        Self::Leaves,
        Self::Dirt,
        Self::GrassBlock,
        Self::Stone,
        Self::Sand,
        Self::Wood,
        Self::Snow,
    ];

    /// Raw discriminant.
    #[inline]
    pub fn raw(self) -> u16 {
        self as u16
    }

    /// Returns `true` if this is one of the class-delimiting sentinels.
    pub fn is_sentinel(self) -> bool {
        matches!(
            self,
            Self::WaterLower
                | Self::WaterUpper
                | Self::CubeLower
                | Self::PartialOpaqueLower
                | Self::OpaqueLower
        )
    }

    /// Returns `true` for air.
    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }

    /// Water lies strictly between `WaterLower` and `WaterUpper`.
    #[inline]
    pub fn is_water(self) -> bool {
        self > Self::WaterLower && self < Self::WaterUpper
    }

    /// Decorative (billboard) voxels: non-empty, below `CubeLower`, not water.
    #[inline]
    pub fn is_non_cube(self) -> bool {
        !self.is_empty() && self < Self::CubeLower && !self.is_water() && !self.is_sentinel()
    }

    /// Cube voxels lie above `CubeLower`.
    #[inline]
    pub fn is_cube(self) -> bool {
        self > Self::CubeLower && !self.is_sentinel()
    }

    /// Partially opaque voxels lie strictly between `PartialOpaqueLower` and `OpaqueLower`.
    #[inline]
    pub fn is_partially_opaque(self) -> bool {
        self > Self::PartialOpaqueLower && self < Self::OpaqueLower
    }

    /// Opaque voxels lie above `OpaqueLower`.
    #[inline]
    pub fn is_opaque(self) -> bool {
        self > Self::OpaqueLower
    }
}

impl TryFrom<u16> for VoxelCode {
    type Error = u16;

    /// Converts a raw discriminant back into a code. Sentinels convert
    /// successfully; callers storing voxels must reject them separately.
    fn try_from(raw: u16) -> Result<Self, Self::Error> {
        const ALL: [VoxelCode; 18] = [
            VoxelCode::Empty,
            VoxelCode::WaterLower,
            VoxelCode::Water,
            VoxelCode::WaterUpper,
            VoxelCode::TallGrass,
            VoxelCode::Roses,
            VoxelCode::Sunflower,
            VoxelCode::CubeLower,
            VoxelCode::Glass,
            VoxelCode::PartialOpaqueLower,
            VoxelCode::Leaves,
            VoxelCode::OpaqueLower,
            VoxelCode::Dirt,
            VoxelCode::GrassBlock,
            VoxelCode::Stone,
            VoxelCode::Sand,
            VoxelCode::Wood,
            VoxelCode::Snow,
        ];
        ALL.get(raw as usize).copied().ok_or(raw)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
