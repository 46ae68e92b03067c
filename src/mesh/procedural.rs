//! Basic procedural mesh generation routines.
use crate::executor::Executor;
use crate::mesh::{MeshTopology, UnstructuredMesh};

/// Topology of the unit interval split into `n_cells` cells of equal length.
///
/// Internal face `i` separates cells `i` and `i + 1`. The boundary has two patches: patch 0 is
/// the left end (owned by cell 0), patch 1 the right end (owned by the last cell).
///
/// # Panics
///
/// Panics if `n_cells` is zero.
pub fn uniform_1d_topology(n_cells: usize) -> MeshTopology {
    assert!(n_cells > 0, "A 1D mesh must have at least one cell.");
    let n_internal = n_cells - 1;

    let mut face_owner: Vec<usize> = (0..n_internal).collect();
    face_owner.extend([0, n_cells - 1]);
    let face_neighbour = (1..n_cells).collect();

    let mut face_weights = vec![0.5; n_internal];
    face_weights.extend([1.0, 1.0]);

    MeshTopology {
        n_cells,
        face_owner,
        face_neighbour,
        boundary_offsets: vec![0, 1, 2],
        cell_volumes: vec![1.0 / n_cells as f64; n_cells],
        face_weights,
    }
}

/// Topology of a single unit cell with four boundary faces, one patch per face.
pub fn single_cell_topology() -> MeshTopology {
    MeshTopology {
        n_cells: 1,
        face_owner: vec![0; 4],
        face_neighbour: Vec::new(),
        boundary_offsets: vec![0, 1, 2, 3, 4],
        cell_volumes: vec![1.0],
        face_weights: vec![1.0; 4],
    }
}

/// The unit interval split into `n_cells` cells, see [`uniform_1d_topology`].
pub fn create_1d_uniform_mesh(exec: &Executor, n_cells: usize) -> UnstructuredMesh {
    UnstructuredMesh::try_from_topology(exec, uniform_1d_topology(n_cells))
        .expect("Generated 1D topology must be valid")
}

/// A single unit cell, see [`single_cell_topology`].
pub fn create_single_cell_mesh(exec: &Executor) -> UnstructuredMesh {
    UnstructuredMesh::try_from_topology(exec, single_cell_topology())
        .expect("Generated single cell topology must be valid")
}
