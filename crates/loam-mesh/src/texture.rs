//! Texture array layers per voxel code and face.

use loam_voxel::VoxelCode;

use crate::face_direction::FaceDirection;

/// Layers of the block texture array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum TextureLayer {
    /// Dirt, also the underside of grass blocks.
    Dirt = 0,
    /// Grass block seen from above.
    GrassTop,
    /// Grass block seen from the four sides.
    GrassSide,
    Stone,
    Sand,
    /// Bark on the side of a trunk.
    WoodSide,
    /// Growth rings on the top and bottom of a trunk.
    WoodTop,
    Snow,
    Glass,
    /// Leaves, drawn with alpha cut-out.
    Leaves,
    /// Water surface.
    Water,
    /// Billboard sprite.
    TallGrass,
    /// Billboard sprite.
    Roses,
    /// Billboard sprite.
    Sunflower,
    /// Magenta placeholder for codes without art.
    Missing,
}

/// Returns the texture layer for `voxel` seen from `face`.
pub fn texture_layer(voxel: VoxelCode, face: FaceDirection) -> u32 {
    let layer = match voxel {
        VoxelCode::Dirt => TextureLayer::Dirt,
        VoxelCode::GrassBlock => match face {
            FaceDirection::PosY => TextureLayer::GrassTop,
            FaceDirection::NegY => TextureLayer::Dirt,
            _ => TextureLayer::GrassSide,
        },
        VoxelCode::Stone => TextureLayer::Stone,
        VoxelCode::Sand => TextureLayer::Sand,
        VoxelCode::Wood => match face {
            FaceDirection::PosY | FaceDirection::NegY => TextureLayer::WoodTop,
            _ => TextureLayer::WoodSide,
        },
        VoxelCode::Snow => TextureLayer::Snow,
        VoxelCode::Glass => TextureLayer::Glass,
        VoxelCode::Leaves => TextureLayer::Leaves,
        VoxelCode::Water => TextureLayer::Water,
        VoxelCode::TallGrass => TextureLayer::TallGrass,
        VoxelCode::Roses => TextureLayer::Roses,
        VoxelCode::Sunflower => TextureLayer::Sunflower,
        _ => TextureLayer::Missing,
    };
    layer as u32
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grass_block_faces_differ() {
        let top = texture_layer(VoxelCode::GrassBlock, FaceDirection::PosY);
        let side = texture_layer(VoxelCode::GrassBlock, FaceDirection::PosX);
        let bottom = texture_layer(VoxelCode::GrassBlock, FaceDirection::NegY);
        assert_eq!(top, TextureLayer::GrassTop as u32);
        assert_eq!(side, TextureLayer::GrassSide as u32);
        assert_eq!(bottom, texture_layer(VoxelCode::Dirt, FaceDirection::PosX));
    }

    #[test]
    fn test_every_real_code_has_art() {
        for code in VoxelCode::REAL.into_iter().filter(|c| !c.is_empty()) {
            for face in FaceDirection::ALL {
                assert_ne!(texture_layer(code, face), TextureLayer::Missing as u32, "{code:?}");
            }
        }
    }
}
