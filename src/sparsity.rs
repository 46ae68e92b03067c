//! Compressed sparse row layout of the matrices assembled on a mesh.
use crate::executor::Executor;
use crate::mesh::UnstructuredMesh;
use crate::vector::Vector;
use itertools::Itertools;
use log::debug;
use nalgebra_sparse::pattern::SparsityPattern as CsrPattern;

/// The CSR layout of a cell-to-cell matrix, with precomputed entry offsets per face and cell.
///
/// Row `i` holds the diagonal column `i` and one column per cell sharing a face with cell `i`,
/// in ascending column order. All offsets are relative to the start of the row.
#[derive(Debug, Clone)]
pub struct SparsityPattern {
    exec: Executor,
    row_offsets: Vector<usize>,
    col_idxs: Vector<usize>,
    diag_offset: Vector<usize>,
    owner_offset: Vector<usize>,
    neighbour_offset: Vector<usize>,
}

impl SparsityPattern {
    pub fn from_mesh(mesh: &UnstructuredMesh) -> Self {
        let exec = mesh.exec();
        let n_cells = mesh.n_cells();
        let owner = mesh.face_owner().to_vec();
        let neighbour = mesh.face_neighbour().to_vec();

        let mut adjacency: Vec<Vec<usize>> = (0..n_cells).map(|cell| vec![cell]).collect();
        for (&own, &nei) in owner.iter().zip(&neighbour) {
            adjacency[own].push(nei);
            adjacency[nei].push(own);
        }
        let rows: Vec<Vec<usize>> = adjacency
            .into_iter()
            .map(|row| row.into_iter().sorted_unstable().dedup().collect())
            .collect();

        let column_position = |row: usize, col: usize| {
            rows[row]
                .binary_search(&col)
                .expect("Every adjacent cell has a column in its row")
        };

        let mut row_offsets = Vec::with_capacity(n_cells + 1);
        row_offsets.push(0);
        for row in &rows {
            row_offsets.push(row_offsets[row_offsets.len() - 1] + row.len());
        }
        let col_idxs = rows.iter().flatten().copied().collect_vec();
        let diag_offset = (0..n_cells).map(|cell| column_position(cell, cell)).collect_vec();
        let owner_offset = owner
            .iter()
            .zip(&neighbour)
            .map(|(&own, &nei)| column_position(own, nei))
            .collect_vec();
        let neighbour_offset = owner
            .iter()
            .zip(&neighbour)
            .map(|(&own, &nei)| column_position(nei, own))
            .collect_vec();

        debug!(
            "Built sparsity pattern with {} rows and {} non-zeros on {}",
            n_cells,
            col_idxs.len(),
            exec.name()
        );

        Self {
            exec: exec.clone(),
            row_offsets: Vector::from_vec(exec, row_offsets),
            col_idxs: Vector::from_vec(exec, col_idxs),
            diag_offset: Vector::from_vec(exec, diag_offset),
            owner_offset: Vector::from_vec(exec, owner_offset),
            neighbour_offset: Vector::from_vec(exec, neighbour_offset),
        }
    }

    pub fn exec(&self) -> &Executor {
        &self.exec
    }

    pub fn n_rows(&self) -> usize {
        self.row_offsets.len() - 1
    }

    pub fn nnz(&self) -> usize {
        self.col_idxs.len()
    }

    /// Start of every row in the value array, `n_rows + 1` entries.
    pub fn row_offsets(&self) -> &Vector<usize> {
        &self.row_offsets
    }

    pub fn col_idxs(&self) -> &Vector<usize> {
        &self.col_idxs
    }

    /// Offset of the diagonal entry within each row.
    pub fn diag_offset(&self) -> &Vector<usize> {
        &self.diag_offset
    }

    /// Per internal face, offset of the neighbour column within the owner row.
    pub fn owner_offset(&self) -> &Vector<usize> {
        &self.owner_offset
    }

    /// Per internal face, offset of the owner column within the neighbour row.
    pub fn neighbour_offset(&self) -> &Vector<usize> {
        &self.neighbour_offset
    }

    pub fn to_nalgebra_pattern(&self) -> CsrPattern {
        let n = self.n_rows();
        CsrPattern::try_from_offsets_and_indices(n, n, self.row_offsets.to_vec(), self.col_idxs.to_vec())
            .expect("Rows are sorted, unique and in bounds by construction")
    }
}
