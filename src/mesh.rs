//! Cell-centred unstructured mesh topology.
//!
//! Faces are numbered so that all internal faces come first, followed by the boundary faces
//! grouped by patch. Every face has an owner cell. Internal faces additionally have a
//! neighbour cell, and the face normal (and hence the sign of a face flux) points from the
//! owner towards the neighbour.
use crate::executor::Executor;
use crate::vector::Vector;
use log::debug;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::ops::Range;

pub mod procedural;

/// Host-side description of a mesh, from which an [`UnstructuredMesh`] is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshTopology {
    pub n_cells: usize,
    /// Owner cell of every face, internal faces first.
    pub face_owner: Vec<usize>,
    /// Neighbour cell of every internal face.
    pub face_neighbour: Vec<usize>,
    /// Offsets of the boundary patches into the boundary faces, `n_patches + 1` entries.
    pub boundary_offsets: Vec<usize>,
    pub cell_volumes: Vec<f64>,
    /// Owner-side linear interpolation weight of every face.
    pub face_weights: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InvalidMeshErrorKind {
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    CellIndexOutOfBounds {
        face: usize,
        cell: usize,
    },
    NonPositiveVolume {
        cell: usize,
        volume: f64,
    },
    InvalidBoundaryOffsets,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvalidMeshError {
    kind: InvalidMeshErrorKind,
}

impl InvalidMeshError {
    pub fn kind(&self) -> &InvalidMeshErrorKind {
        &self.kind
    }
}

impl From<InvalidMeshErrorKind> for InvalidMeshError {
    fn from(kind: InvalidMeshErrorKind) -> Self {
        Self { kind }
    }
}

impl fmt::Display for InvalidMeshError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            InvalidMeshErrorKind::LengthMismatch { what, expected, actual } => {
                write!(f, "Invalid mesh: {what} has length {actual}, expected {expected}")
            }
            InvalidMeshErrorKind::CellIndexOutOfBounds { face, cell } => {
                write!(f, "Invalid mesh: face {face} references cell {cell}, which is out of bounds")
            }
            InvalidMeshErrorKind::NonPositiveVolume { cell, volume } => {
                write!(f, "Invalid mesh: cell {cell} has non-positive volume {volume}")
            }
            InvalidMeshErrorKind::InvalidBoundaryOffsets => {
                write!(
                    f,
                    "Invalid mesh: boundary offsets must start at 0, be non-decreasing \
                     and end at the number of boundary faces"
                )
            }
        }
    }
}

impl Error for InvalidMeshError {}

impl MeshTopology {
    pub fn n_internal_faces(&self) -> usize {
        self.face_neighbour.len()
    }

    pub fn n_faces(&self) -> usize {
        self.face_owner.len()
    }

    pub fn validate(&self) -> Result<(), InvalidMeshError> {
        use InvalidMeshErrorKind::*;
        let check_len = |what, expected, actual| {
            if expected == actual {
                Ok(())
            } else {
                Err(InvalidMeshError::from(LengthMismatch { what, expected, actual }))
            }
        };

        let n_faces = self.n_faces();
        let n_internal = self.n_internal_faces();
        if n_internal > n_faces {
            return Err(LengthMismatch {
                what: "face_neighbour",
                expected: n_faces,
                actual: n_internal,
            }
            .into());
        }
        check_len("cell_volumes", self.n_cells, self.cell_volumes.len())?;
        check_len("face_weights", n_faces, self.face_weights.len())?;

        let offsets = &self.boundary_offsets;
        let offsets_valid = offsets.first() == Some(&0)
            && offsets.last() == Some(&(n_faces - n_internal))
            && offsets.windows(2).all(|w| w[0] <= w[1]);
        if !offsets_valid {
            return Err(InvalidBoundaryOffsets.into());
        }

        let cells = self.face_owner.iter().enumerate().chain(self.face_neighbour.iter().enumerate());
        for (face, &cell) in cells {
            if cell >= self.n_cells {
                return Err(CellIndexOutOfBounds { face, cell }.into());
            }
        }

        if let Some((cell, &volume)) = self
            .cell_volumes
            .iter()
            .enumerate()
            .find(|(_, &v)| !(v > 0.0))
        {
            return Err(NonPositiveVolume { cell, volume }.into());
        }

        Ok(())
    }
}

/// The boundary faces of a mesh, grouped by patch.
#[derive(Debug, Clone)]
pub struct BoundaryMesh {
    face_cells: Vector<usize>,
    offsets: Vec<usize>,
}

impl BoundaryMesh {
    /// Owner cell of every boundary face.
    pub fn face_cells(&self) -> &Vector<usize> {
        &self.face_cells
    }

    /// Patch offsets into the boundary faces, `n_patches + 1` entries. Host resident.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn n_patches(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Range of boundary face indices belonging to `patch`.
    pub fn patch_range(&self, patch: usize) -> Range<usize> {
        self.offsets[patch]..self.offsets[patch + 1]
    }
}

/// Read-only mesh topology resident on an executor.
#[derive(Debug, Clone)]
pub struct UnstructuredMesh {
    exec: Executor,
    n_cells: usize,
    n_internal_faces: usize,
    n_boundary_faces: usize,
    face_owner: Vector<usize>,
    face_neighbour: Vector<usize>,
    cell_volumes: Vector<f64>,
    weights: Vector<f64>,
    boundary_mesh: BoundaryMesh,
}

impl UnstructuredMesh {
    pub fn try_from_topology(exec: &Executor, topology: MeshTopology) -> Result<Self, InvalidMeshError> {
        topology.validate()?;
        let n_internal_faces = topology.n_internal_faces();
        let n_boundary_faces = topology.n_faces() - n_internal_faces;
        debug!(
            "Constructing mesh on {}: {} cells, {} internal faces, {} boundary faces, {} patches",
            exec.name(),
            topology.n_cells,
            n_internal_faces,
            n_boundary_faces,
            topology.boundary_offsets.len() - 1
        );

        let host = Executor::serial();
        let boundary_mesh = BoundaryMesh {
            face_cells: Vector::from_slice(exec, &topology.face_owner[n_internal_faces..], &host),
            offsets: topology.boundary_offsets,
        };
        Ok(Self {
            exec: exec.clone(),
            n_cells: topology.n_cells,
            n_internal_faces,
            n_boundary_faces,
            face_owner: Vector::from_vec(exec, topology.face_owner),
            face_neighbour: Vector::from_vec(exec, topology.face_neighbour),
            cell_volumes: Vector::from_vec(exec, topology.cell_volumes),
            weights: Vector::from_vec(exec, topology.face_weights),
            boundary_mesh,
        })
    }

    pub fn exec(&self) -> &Executor {
        &self.exec
    }

    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    pub fn n_internal_faces(&self) -> usize {
        self.n_internal_faces
    }

    pub fn n_boundary_faces(&self) -> usize {
        self.n_boundary_faces
    }

    pub fn n_faces(&self) -> usize {
        self.n_internal_faces + self.n_boundary_faces
    }

    /// Owner cell of every face, internal faces first.
    pub fn face_owner(&self) -> &Vector<usize> {
        &self.face_owner
    }

    /// Neighbour cell of every internal face.
    pub fn face_neighbour(&self) -> &Vector<usize> {
        &self.face_neighbour
    }

    pub fn cell_volumes(&self) -> &Vector<f64> {
        &self.cell_volumes
    }

    /// Owner-side linear interpolation weight of every face.
    pub fn weights(&self) -> &Vector<f64> {
        &self.weights
    }

    pub fn boundary_mesh(&self) -> &BoundaryMesh {
        &self.boundary_mesh
    }
}
