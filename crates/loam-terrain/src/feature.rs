//! Feature placement: weighted sample elimination over candidate points.
//!
//! Candidates are scattered uniformly, then the most crowded ones are removed
//! one at a time until the target count remains. The survivors form a
//! Poisson-disk-like distribution without the rejection loop of dart throwing.

use glam::IVec3;
use loam_voxel::VoxelCode;

/// A single voxel contributed by a feature, in global coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FeatureVoxel {
    /// Global voxel position.
    pub pos: IVec3,
    /// Code to write.
    pub voxel: VoxelCode,
}

impl FeatureVoxel {
    /// Creates a feature voxel.
    pub fn new(pos: IVec3, voxel: VoxelCode) -> Self {
        Self { pos, voxel }
    }
}

/// Outcome of [`poisson_disk_elimination`], as indices into the input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Elimination {
    /// Indices of surviving points, ascending.
    pub kept: Vec<usize>,
    /// Indices of removed points, in removal order.
    pub eliminated: Vec<usize>,
}

/// Exponent of the distance falloff in the crowding weight.
const WEIGHT_ALPHA: i32 = 8;

/// Reduces `points` to `target` survivors by weighted sample elimination.
///
/// `area` is the size of the sampled domain; it sets the interaction radius
/// `2 * r_max` with `r_max = sqrt(area / (2 * sqrt(3) * target))`. Each
/// point's weight sums `(1 - d / (2 * r_max))^8` over its neighbors inside that
/// radius; the heaviest point is removed and its neighbors' weights reduced.
/// Ties go to the lower index.
pub fn poisson_disk_elimination(points: &[(f64, f64)], target: usize, area: f64) -> Elimination {
    let n = points.len();
    if target >= n {
        return Elimination {
            kept: (0..n).collect(),
            eliminated: Vec::new(),
        };
    }
    if target == 0 {
        return Elimination {
            kept: Vec::new(),
            eliminated: (0..n).collect(),
        };
    }

    let r_max = (area / (2.0 * 3f64.sqrt() * target as f64)).sqrt();
    let reach = 2.0 * r_max;
    let contribution = |i: usize, j: usize| -> f64 {
        let (ax, az) = points[i];
        let (bx, bz) = points[j];
        let d = ((ax - bx).powi(2) + (az - bz).powi(2)).sqrt();
        if d >= reach {
            0.0
        } else {
            (1.0 - d / reach).powi(WEIGHT_ALPHA)
        }
    };

    let neighbors: Vec<Vec<(usize, f64)>> = (0..n)
        .map(|i| {
            (0..n)
                .filter(|&j| j != i)
                .filter_map(|j| {
                    let w = contribution(i, j);
                    (w > 0.0).then_some((j, w))
                })
                .collect()
        })
        .collect();
    let mut weights: Vec<f64> = neighbors.iter().map(|ns| ns.iter().map(|(_, w)| w).sum()).collect();
    let mut alive = vec![true; n];
    let mut eliminated = Vec::with_capacity(n - target);

    while eliminated.len() < n - target {
        let mut heaviest: Option<usize> = None;
        for i in (0..n).filter(|&i| alive[i]) {
            if heaviest.is_none_or(|h| weights[i] > weights[h]) {
                heaviest = Some(i);
            }
        }
        let Some(victim) = heaviest else {
            break;
        };
        alive[victim] = false;
        eliminated.push(victim);
        for &(j, w) in &neighbors[victim] {
            weights[j] -= w;
        }
    }

    Elimination {
        kept: (0..n).filter(|&i| alive[i]).collect(),
        eliminated,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
