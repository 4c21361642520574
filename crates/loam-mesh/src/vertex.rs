//! Vertex formats produced by the mesh builder.
//!
//! Cube faces use [`PackedVertex`], a single `u32` per vertex:
//!
//! | Bits  | Field                       |
//! |-------|-----------------------------|
//! | 0–5   | x (chunk-local corner)      |
//! | 6–11  | y                           |
//! | 12–17 | z                           |
//! | 18–20 | face direction              |
//! | 21–22 | UV corner                   |
//! | 23–31 | texture layer               |
//!
//! Billboards and water need sub-voxel positions and use [`FreeVertex`].

use crate::face_direction::FaceDirection;

const POS_MASK: u32 = 0x3F;
const FACE_SHIFT: u32 = 18;
const UV_SHIFT: u32 = 21;
const LAYER_SHIFT: u32 = 23;

/// Largest corner coordinate a packed vertex can hold.
pub const MAX_PACKED_COORD: u32 = POS_MASK;
/// Largest texture layer a packed vertex can hold.
pub const MAX_PACKED_LAYER: u32 = 0x1FF;

/// A cube-face vertex packed into 32 bits.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PackedVertex(pub u32);

static_assertions::assert_eq_size!(PackedVertex, u32);

impl PackedVertex {
    /// Packs a vertex. Coordinates must be `<= 63`, the UV corner `< 4`, and
    /// the layer `<= 511`.
    pub fn new(pos: [u32; 3], face: FaceDirection, uv_corner: u32, layer: u32) -> Self {
        debug_assert!(pos.iter().all(|&p| p <= MAX_PACKED_COORD));
        debug_assert!(uv_corner < 4);
        debug_assert!(layer <= MAX_PACKED_LAYER);
        Self(
            (pos[0] & POS_MASK)
                | (pos[1] & POS_MASK) << 6
                | (pos[2] & POS_MASK) << 12
                | (face as u32 & 0x7) << FACE_SHIFT
                | (uv_corner & 0x3) << UV_SHIFT
                | (layer & MAX_PACKED_LAYER) << LAYER_SHIFT,
        )
    }

    /// Chunk-local corner position.
    pub fn position(self) -> [u32; 3] {
        [self.0 & POS_MASK, (self.0 >> 6) & POS_MASK, (self.0 >> 12) & POS_MASK]
    }

    /// Face direction, or `None` for a corrupt value.
    pub fn face(self) -> Option<FaceDirection> {
        FaceDirection::from_u8(((self.0 >> FACE_SHIFT) & 0x7) as u8)
    }

    /// UV corner index (0–3).
    pub fn uv_corner(self) -> u32 {
        (self.0 >> UV_SHIFT) & 0x3
    }

    /// Texture array layer.
    pub fn layer(self) -> u32 {
        self.0 >> LAYER_SHIFT
    }
}

/// A float vertex for geometry that does not sit on the voxel grid.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FreeVertex {
    /// Chunk-local position.
    pub position: [f32; 3],
    /// Texture coordinates.
    pub uv: [f32; 2],
    /// Texture array layer.
    pub layer: u32,
}

static_assertions::assert_eq_size!(FreeVertex, [u8; 24]);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_fields_land_in_their_bits() {
        let v = PackedVertex::new([63, 1, 32], FaceDirection::NegZ, 3, 511);
        assert_eq!(v.0 & 0x3F, 63);
        assert_eq!((v.0 >> 6) & 0x3F, 1);
        assert_eq!((v.0 >> 12) & 0x3F, 32);
        assert_eq!((v.0 >> 18) & 0x7, FaceDirection::NegZ as u32);
        assert_eq!((v.0 >> 21) & 0x3, 3);
        assert_eq!(v.0 >> 23, 511);
    }

    #[test]
    fn test_packed_accessors_decode() {
        let v = PackedVertex::new([5, 6, 7], FaceDirection::PosY, 2, 9);
        assert_eq!(v.position(), [5, 6, 7]);
        assert_eq!(v.face(), Some(FaceDirection::PosY));
        assert_eq!(v.uv_corner(), 2);
        assert_eq!(v.layer(), 9);
    }

    #[test]
    fn test_vertices_cast_to_bytes() {
        let verts = [PackedVertex(1), PackedVertex(2)];
        let bytes: &[u8] = bytemuck::cast_slice(&verts);
        assert_eq!(bytes.len(), 8);
        let free = [FreeVertex {
            position: [0.0; 3],
            uv: [0.0; 2],
            layer: 4,
        }];
        assert_eq!(bytemuck::cast_slice::<FreeVertex, u8>(&free).len(), 24);
    }
}
