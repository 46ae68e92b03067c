use crate::executor::Executor;
use crate::mesh::MeshTopology;
use crate::Vec3;
use ::proptest::collection::vec;
use ::proptest::prelude::*;
use std::iter::repeat;

/// One of the available executors, with default settings.
pub fn executor() -> impl Strategy<Value = Executor> {
    prop_oneof![
        Just(Executor::serial()),
        Just(Executor::host_parallel()),
        Just(Executor::device())
    ]
}

pub fn vec3() -> impl Strategy<Value = Vec3> {
    // Keep values moderate, so that sums of many of them stay well-conditioned
    let range = -10.0..10.0;
    [range.clone(), range.clone(), range].prop_map(|[x, y, z]| Vec3::new(x, y, z))
}

/// A face flux, which is exactly zero with some probability.
pub fn face_flux() -> impl Strategy<Value = f64> {
    prop_oneof![1 => Just(0.0), 4 => -10.0..10.0]
}

/// A valid mesh topology with up to 8 cells, up to 12 internal faces and up to 6 boundary
/// faces split into two patches.
///
/// Cells need not be connected, and two cells may share more than one face.
pub fn mesh_topology() -> impl Strategy<Value = MeshTopology> {
    (1..=8usize)
        .prop_flat_map(|n_cells| {
            let max_internal = if n_cells > 1 { 12 } else { 0 };
            // The shift is never a multiple of n_cells, so owner and neighbour differ
            let internal_face =
                (0..n_cells, 1..n_cells.max(2)).prop_map(move |(own, shift)| (own, (own + shift) % n_cells));
            (
                Just(n_cells),
                vec(internal_face, 0..=max_internal),
                vec(0..n_cells, 1..=6),
                vec(0.1..10.0, n_cells),
            )
        })
        .prop_flat_map(|(n_cells, internal_faces, boundary_owners, cell_volumes)| {
            let weights = vec(0.0..=1.0, internal_faces.len());
            let split = 0..=boundary_owners.len();
            (
                Just(n_cells),
                Just(internal_faces),
                Just(boundary_owners),
                Just(cell_volumes),
                weights,
                split,
            )
        })
        .prop_map(
            |(n_cells, internal_faces, boundary_owners, cell_volumes, mut face_weights, split)| {
                let mut face_owner: Vec<usize> = internal_faces.iter().map(|&(own, _)| own).collect();
                let face_neighbour = internal_faces.iter().map(|&(_, nei)| nei).collect();
                face_owner.extend(&boundary_owners);
                face_weights.extend(repeat(1.0).take(boundary_owners.len()));
                MeshTopology {
                    n_cells,
                    face_owner,
                    face_neighbour,
                    boundary_offsets: vec![0, split, boundary_owners.len()],
                    cell_volumes,
                    face_weights,
                }
            },
        )
}
