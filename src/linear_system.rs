//! Executor-resident sparse linear systems `A x = b`.
use crate::executor::Executor;
use crate::sparsity::SparsityPattern;
use crate::vector::Vector;
use eyre::eyre;
use fvcore_traits::FieldValue;

/// A square matrix in compressed sparse row format.
#[derive(Debug, Clone)]
pub struct CsrMatrix<T: FieldValue> {
    values: Vector<T>,
    col_idxs: Vector<usize>,
    row_offs: Vector<usize>,
}

/// Mutable access to the values of a [`CsrMatrix`], with its read-only structure.
#[derive(Debug)]
pub struct CsrMatrixViewMut<'a, T> {
    pub values: &'a mut [T],
    pub col_idxs: &'a [usize],
    pub row_offs: &'a [usize],
}

impl<T: FieldValue> CsrMatrix<T> {
    /// A zero matrix with the structure of `sparsity`.
    pub fn zeros(sparsity: &SparsityPattern) -> Self {
        Self {
            values: Vector::new(sparsity.exec(), sparsity.nnz()),
            col_idxs: sparsity.col_idxs().clone(),
            row_offs: sparsity.row_offsets().clone(),
        }
    }

    pub fn exec(&self) -> &Executor {
        self.values.exec()
    }

    pub fn n_rows(&self) -> usize {
        self.row_offs.len() - 1
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &Vector<T> {
        &self.values
    }

    pub fn col_idxs(&self) -> &Vector<usize> {
        &self.col_idxs
    }

    pub fn row_offs(&self) -> &Vector<usize> {
        &self.row_offs
    }

    pub fn view_mut(&mut self) -> CsrMatrixViewMut<'_, T> {
        CsrMatrixViewMut {
            values: self.values.view_mut(),
            col_idxs: self.col_idxs.view(),
            row_offs: self.row_offs.view(),
        }
    }

    pub fn copy_to_executor(&self, exec: &Executor) -> Self {
        Self {
            values: self.values.copy_to_executor(exec),
            col_idxs: self.col_idxs.copy_to_executor(exec),
            row_offs: self.row_offs.copy_to_executor(exec),
        }
    }

    /// The matrix as a host-resident `nalgebra_sparse` matrix, e.g. for an external solver.
    pub fn to_nalgebra_csr(&self) -> eyre::Result<nalgebra_sparse::CsrMatrix<T>> {
        let n = self.n_rows();
        nalgebra_sparse::CsrMatrix::try_from_csr_data(
            n,
            n,
            self.row_offs.to_vec(),
            self.col_idxs.to_vec(),
            self.values.to_vec(),
        )
        // The format error is not Send, so it cannot be wrapped directly
        .map_err(|err| eyre!("Failed to convert matrix to nalgebra CSR format: {err}"))
    }
}

/// A sparse matrix together with its right-hand side.
#[derive(Debug, Clone)]
pub struct LinearSystem<T: FieldValue> {
    matrix: CsrMatrix<T>,
    rhs: Vector<T>,
}

impl<T: FieldValue> LinearSystem<T> {
    /// # Panics
    ///
    /// Panics if the right-hand side does not have one entry per row, or resides on another
    /// executor than the matrix.
    pub fn new(matrix: CsrMatrix<T>, rhs: Vector<T>) -> Self {
        assert_eq!(matrix.n_rows(), rhs.len(), "Right-hand side must have one entry per row");
        assert!(matrix.exec() == rhs.exec(), "Executors are not the same");
        Self { matrix, rhs }
    }

    pub fn exec(&self) -> &Executor {
        self.rhs.exec()
    }

    pub fn matrix(&self) -> &CsrMatrix<T> {
        &self.matrix
    }

    pub fn rhs(&self) -> &Vector<T> {
        &self.rhs
    }

    /// Mutable access to the matrix and the right-hand side at the same time.
    pub fn view_mut(&mut self) -> (CsrMatrixViewMut<'_, T>, &mut [T]) {
        (self.matrix.view_mut(), self.rhs.view_mut())
    }

    pub fn copy_to_executor(&self, exec: &Executor) -> Self {
        Self {
            matrix: self.matrix.copy_to_executor(exec),
            rhs: self.rhs.copy_to_executor(exec),
        }
    }

    pub fn copy_to_host(&self) -> Self {
        self.copy_to_executor(&Executor::serial())
    }
}

/// A zero system with the structure of `sparsity`, on the pattern's executor.
pub fn create_empty_linear_system<T: FieldValue>(sparsity: &SparsityPattern) -> LinearSystem<T> {
    LinearSystem::new(CsrMatrix::zeros(sparsity), Vector::new(sparsity.exec(), sparsity.n_rows()))
}
