//! Nearest-first chunk streaming order.

use loam_voxel::ChunkCoord;

/// Chunks inside the streaming cylinder around `center`, with their squared
/// distance to it.
///
/// The cylinder spans columns within `view_radius` chunks (Euclidean) and
/// `vertical_radius` chunks above and below.
pub fn wanted_chunks(
    center: ChunkCoord,
    view_radius: u32,
    vertical_radius: u32,
) -> impl Iterator<Item = (ChunkCoord, i64)> {
    let r = view_radius as i32;
    let vr = vertical_radius as i32;
    let r_sq = (r as i64) * (r as i64);
    (-r..=r).flat_map(move |dz| {
        (-r..=r).flat_map(move |dx| {
            let horizontal = (dx as i64).pow(2) + (dz as i64).pow(2);
            (-vr..=vr).filter_map(move |dy| {
                (horizontal <= r_sq).then(|| (center.offset(dx, dy, dz), horizontal + (dy as i64).pow(2)))
            })
        })
    })
}

/// The wanted chunks `skip` rejects nothing for, nearest first.
///
/// Ties on distance break on the coordinate so the order is total.
pub fn stream_order(
    center: ChunkCoord,
    view_radius: u32,
    vertical_radius: u32,
    mut skip: impl FnMut(ChunkCoord) -> bool,
) -> Vec<ChunkCoord> {
    let mut order: Vec<(i64, ChunkCoord)> = wanted_chunks(center, view_radius, vertical_radius)
        .filter(|&(coord, _)| !skip(coord))
        .map(|(coord, dist_sq)| (dist_sq, coord))
        .collect();
    order.sort_unstable();
    order.into_iter().map(|(_, coord)| coord).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
