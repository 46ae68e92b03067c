//! Cell-centred and face-centred fields with their boundary data.
use crate::mesh::UnstructuredMesh;
use crate::parallel::parallel_for_each_mut;
use crate::vector::{fill, Vector};
use fvcore_traits::FieldValue;
use log::debug;
use std::ops::Range;

/// Generalized (Robin-type) boundary values, one entry per boundary face.
///
/// A boundary face value is described by `value_fraction * ref_value` plus
/// `(1 - value_fraction)` times the value extrapolated with the gradient `ref_grad`. A fraction
/// of 1 is a fixed value, a fraction of 0 a fixed gradient.
#[derive(Debug, Clone)]
pub struct BoundaryData<T: FieldValue> {
    value: Vector<T>,
    ref_value: Vector<T>,
    value_fraction: Vector<f64>,
    ref_grad: Vector<T>,
    offsets: Vec<usize>,
}

/// Simultaneous mutable access to all arrays of a [`BoundaryData`].
#[derive(Debug)]
pub struct BoundaryDataViewMut<'a, T> {
    pub value: &'a mut [T],
    pub ref_value: &'a mut [T],
    pub value_fraction: &'a mut [f64],
    pub ref_grad: &'a mut [T],
}

impl<T: FieldValue> BoundaryData<T> {
    /// Zeroed boundary data on the mesh's executor, laid out by the mesh's patches.
    pub fn new(mesh: &UnstructuredMesh) -> Self {
        let exec = mesh.exec();
        let n = mesh.n_boundary_faces();
        Self {
            value: Vector::new(exec, n),
            ref_value: Vector::new(exec, n),
            value_fraction: Vector::new(exec, n),
            ref_grad: Vector::new(exec, n),
            offsets: mesh.boundary_mesh().offsets().to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn n_patches(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn patch_range(&self, patch: usize) -> Range<usize> {
        self.offsets[patch]..self.offsets[patch + 1]
    }

    pub fn value(&self) -> &Vector<T> {
        &self.value
    }

    pub fn ref_value(&self) -> &Vector<T> {
        &self.ref_value
    }

    pub fn value_fraction(&self) -> &Vector<f64> {
        &self.value_fraction
    }

    pub fn ref_grad(&self) -> &Vector<T> {
        &self.ref_grad
    }

    pub fn view_mut(&mut self) -> BoundaryDataViewMut<'_, T> {
        BoundaryDataViewMut {
            value: self.value.view_mut(),
            ref_value: self.ref_value.view_mut(),
            value_fraction: self.value_fraction.view_mut(),
            ref_grad: self.ref_grad.view_mut(),
        }
    }
}

/// How the boundary data of a patch is derived from the field.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryCondition<T> {
    /// The boundary value is fixed. Fraction 1, reference value and value equal to the given value.
    FixedValue(T),
    /// The boundary value equals the adjacent cell value. Fraction 0, zero reference gradient.
    ZeroGradient,
    /// The boundary data is set by the caller and left untouched.
    Calculated,
}

impl<T: FieldValue> BoundaryCondition<T> {
    /// Updates the boundary data of the faces in `range` from the cell values `internal`.
    pub fn correct_boundary_condition(
        &self,
        mesh: &UnstructuredMesh,
        range: Range<usize>,
        internal: &[T],
        data: BoundaryDataViewMut<'_, T>,
    ) {
        let exec = mesh.exec();
        let BoundaryDataViewMut {
            value,
            ref_value,
            value_fraction,
            ref_grad,
        } = data;
        let (value, ref_value) = (&mut value[range.clone()], &mut ref_value[range.clone()]);
        let (value_fraction, ref_grad) = (&mut value_fraction[range.clone()], &mut ref_grad[range.clone()]);

        match self {
            BoundaryCondition::FixedValue(fixed) => {
                let fixed = *fixed;
                parallel_for_each_mut(exec, value, |_, v| *v = fixed, "fixedValue::value");
                parallel_for_each_mut(exec, ref_value, |_, v| *v = fixed, "fixedValue::refValue");
                parallel_for_each_mut(exec, value_fraction, |_, f| *f = 1.0, "fixedValue::valueFraction");
                parallel_for_each_mut(exec, ref_grad, |_, g| *g = T::zero(), "fixedValue::refGrad");
            }
            BoundaryCondition::ZeroGradient => {
                let face_cells = &mesh.boundary_mesh().face_cells().view()[range];
                parallel_for_each_mut(exec, value, |i, v| *v = internal[face_cells[i]], "zeroGradient::value");
                parallel_for_each_mut(
                    exec,
                    ref_value,
                    |i, v| *v = internal[face_cells[i]],
                    "zeroGradient::refValue",
                );
                parallel_for_each_mut(exec, value_fraction, |_, f| *f = 0.0, "zeroGradient::valueFraction");
                parallel_for_each_mut(exec, ref_grad, |_, g| *g = T::zero(), "zeroGradient::refGrad");
            }
            BoundaryCondition::Calculated => {}
        }
    }
}

fn check_patch_count<T>(mesh: &UnstructuredMesh, boundary_conditions: &[BoundaryCondition<T>]) {
    assert_eq!(
        boundary_conditions.len(),
        mesh.boundary_mesh().n_patches(),
        "Expected one boundary condition per boundary patch"
    );
}

/// A field with one value per cell.
#[derive(Debug, Clone)]
pub struct VolumeField<'m, T: FieldValue> {
    name: String,
    mesh: &'m UnstructuredMesh,
    internal_vector: Vector<T>,
    boundary_data: BoundaryData<T>,
    boundary_conditions: Vec<BoundaryCondition<T>>,
}

impl<'m, T: FieldValue> VolumeField<'m, T> {
    /// A zero field with one boundary condition per patch.
    ///
    /// # Panics
    ///
    /// Panics if the number of boundary conditions does not match the number of patches.
    pub fn new(
        name: impl Into<String>,
        mesh: &'m UnstructuredMesh,
        boundary_conditions: Vec<BoundaryCondition<T>>,
    ) -> Self {
        check_patch_count(mesh, &boundary_conditions);
        let name = name.into();
        debug!("Creating volume field '{}' with {} cells", name, mesh.n_cells());
        Self {
            name,
            mesh,
            internal_vector: Vector::new(mesh.exec(), mesh.n_cells()),
            boundary_data: BoundaryData::new(mesh),
            boundary_conditions,
        }
    }

    /// A field with every cell set to `value` and corrected boundary conditions.
    pub fn uniform(
        name: impl Into<String>,
        mesh: &'m UnstructuredMesh,
        value: T,
        boundary_conditions: Vec<BoundaryCondition<T>>,
    ) -> Self {
        let mut field = Self::new(name, mesh, boundary_conditions);
        fill(&mut field.internal_vector, value);
        field.correct_boundary_conditions();
        field
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> &'m UnstructuredMesh {
        self.mesh
    }

    pub fn internal_vector(&self) -> &Vector<T> {
        &self.internal_vector
    }

    pub fn internal_vector_mut(&mut self) -> &mut Vector<T> {
        &mut self.internal_vector
    }

    pub fn boundary_data(&self) -> &BoundaryData<T> {
        &self.boundary_data
    }

    pub fn boundary_data_mut(&mut self) -> &mut BoundaryData<T> {
        &mut self.boundary_data
    }

    pub fn boundary_conditions(&self) -> &[BoundaryCondition<T>] {
        &self.boundary_conditions
    }

    /// Recomputes the boundary data of every patch from the current cell values.
    pub fn correct_boundary_conditions(&mut self) {
        for (patch, bc) in self.boundary_conditions.iter().enumerate() {
            let range = self.boundary_data.patch_range(patch);
            bc.correct_boundary_condition(
                self.mesh,
                range,
                self.internal_vector.view(),
                self.boundary_data.view_mut(),
            );
        }
    }
}

/// A field with one value per face, internal faces first.
///
/// The values of the boundary faces, stored after the internal ones, mirror the boundary data.
#[derive(Debug, Clone)]
pub struct SurfaceField<'m, T: FieldValue> {
    name: String,
    mesh: &'m UnstructuredMesh,
    internal_vector: Vector<T>,
    boundary_data: BoundaryData<T>,
    boundary_conditions: Vec<BoundaryCondition<T>>,
}

impl<'m, T: FieldValue> SurfaceField<'m, T> {
    /// A zero field with one boundary condition per patch.
    ///
    /// # Panics
    ///
    /// Panics if the number of boundary conditions does not match the number of patches.
    pub fn new(
        name: impl Into<String>,
        mesh: &'m UnstructuredMesh,
        boundary_conditions: Vec<BoundaryCondition<T>>,
    ) -> Self {
        check_patch_count(mesh, &boundary_conditions);
        let name = name.into();
        debug!("Creating surface field '{}' with {} faces", name, mesh.n_faces());
        Self {
            name,
            mesh,
            internal_vector: Vector::new(mesh.exec(), mesh.n_faces()),
            boundary_data: BoundaryData::new(mesh),
            boundary_conditions,
        }
    }

    /// A zero field whose boundary patches are all [`BoundaryCondition::Calculated`].
    pub fn calculated(name: impl Into<String>, mesh: &'m UnstructuredMesh) -> Self {
        let n_patches = mesh.boundary_mesh().n_patches();
        Self::new(name, mesh, vec![BoundaryCondition::Calculated; n_patches])
    }

    /// A calculated field holding the given face values.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not hold one entry per face, or resides on another executor.
    pub fn from_values(name: impl Into<String>, mesh: &'m UnstructuredMesh, values: &Vector<T>) -> Self {
        assert_eq!(values.len(), mesh.n_faces(), "Expected one value per face");
        let mut field = Self::calculated(name, mesh);
        field.internal_vector.assign(values);
        field.correct_boundary_conditions();
        field
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> &'m UnstructuredMesh {
        self.mesh
    }

    pub fn internal_vector(&self) -> &Vector<T> {
        &self.internal_vector
    }

    pub fn internal_vector_mut(&mut self) -> &mut Vector<T> {
        &mut self.internal_vector
    }

    pub fn boundary_data(&self) -> &BoundaryData<T> {
        &self.boundary_data
    }

    pub fn boundary_data_mut(&mut self) -> &mut BoundaryData<T> {
        &mut self.boundary_data
    }

    pub fn boundary_conditions(&self) -> &[BoundaryCondition<T>] {
        &self.boundary_conditions
    }

    /// Synchronizes the boundary data with the boundary face values.
    ///
    /// Fixed value patches overwrite their face values. All other patches take the boundary
    /// value from the current face values.
    pub fn correct_boundary_conditions(&mut self) {
        let exec = self.mesh.exec().clone();
        let n_internal = self.mesh.n_internal_faces();
        for (patch, bc) in self.boundary_conditions.iter().enumerate() {
            let range = self.boundary_data.patch_range(patch);
            let face_range = n_internal + range.start..n_internal + range.end;
            match bc {
                BoundaryCondition::FixedValue(_) => {
                    let faces = self.internal_vector.view_mut();
                    bc.correct_boundary_condition(self.mesh, range.clone(), &[], self.boundary_data.view_mut());
                    let boundary_values = &self.boundary_data.value().view()[range];
                    parallel_for_each_mut(
                        &exec,
                        &mut faces[face_range],
                        |i, v| *v = boundary_values[i],
                        "surfaceField::fixedValue",
                    );
                }
                BoundaryCondition::ZeroGradient | BoundaryCondition::Calculated => {
                    let faces = &self.internal_vector.view()[face_range];
                    let BoundaryDataViewMut { value, .. } = self.boundary_data.view_mut();
                    parallel_for_each_mut(&exec, &mut value[range], |i, v| *v = faces[i], "surfaceField::mirror");
                }
            }
        }
    }
}
