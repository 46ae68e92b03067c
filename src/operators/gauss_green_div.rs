//! Gauss-Green divergence of a transported quantity.
//!
//! The divergence of `phi` transported by the face flux `F` is discretized as
//! `1/V * sum_f F_f * phi_f` over the faces of each cell. Face fluxes are signed by the
//! owner-to-neighbour orientation, so each internal face adds to its owner and subtracts from
//! its neighbour.
//!
//! On the serial executor the kernels update their outputs with plain arithmetic. On the
//! parallel executors every update of a location shared between faces goes through an
//! [`AtomicScatter`].
use crate::executor::Executor;
use crate::field::{SurfaceField, VolumeField};
use crate::interpolation::{SurfaceInterpolation, UnknownSchemeError};
use crate::linear_system::{CsrMatrixViewMut, LinearSystem};
use crate::operators::{upwind_weight, Coeff};
use crate::parallel::{parallel_for, parallel_for_each_mut, AtomicScatter};
use crate::sparsity::SparsityPattern;
use crate::vector::Vector;
use fvcore_traits::FieldValue;
use log::{debug, trace};

/// Matrix contributions of an internal face.
struct FaceCoefficients<T> {
    /// Neighbour row, owner column.
    lower: T,
    /// Owner row, neighbour column.
    upper: T,
}

#[inline]
fn internal_face_coefficients<T: FieldValue>(flux: f64, scaling_own: f64, scaling_nei: f64) -> FaceCoefficients<T> {
    let weight = upwind_weight(flux);
    FaceCoefficients {
        lower: T::splat(-weight * flux * scaling_nei),
        upper: T::splat((1.0 - weight) * flux * scaling_own),
    }
}

/// Diagonal and right-hand side contributions of a boundary face.
#[inline]
fn boundary_face_coefficients<T: FieldValue>(
    flux: f64,
    scaling_own: f64,
    value_fraction: f64,
    ref_value: T,
) -> (T, T) {
    let diag = T::splat(flux * scaling_own * (1.0 - value_fraction));
    let rhs = ref_value * (flux * scaling_own * value_fraction);
    (diag, rhs)
}

/// Accumulates the divergence of the face values `phi_f` into `res`.
///
/// `res` holds one entry per cell. Every internal face adds `face_flux * phi_f` to its owner
/// and subtracts it from its neighbour, every boundary face adds it to its owner. Finally every
/// entry of `res` is multiplied by `operator_scaling / volume` of its cell, so `res` is
/// expected to be zero on entry.
#[allow(clippy::too_many_arguments)]
pub fn compute_div<T: FieldValue>(
    exec: &Executor,
    n_internal_faces: usize,
    n_boundary_faces: usize,
    neighbour: &[usize],
    owner: &[usize],
    face_cells: &[usize],
    face_flux: &[f64],
    phi_f: &[T],
    volumes: &[f64],
    res: &mut [T],
    operator_scaling: Coeff,
) {
    debug_assert_eq!(res.len(), volumes.len());
    debug_assert_eq!(face_flux.len(), n_internal_faces + n_boundary_faces);
    debug_assert_eq!(phi_f.len(), face_flux.len());
    let boundary_faces = n_internal_faces..n_internal_faces + n_boundary_faces;

    if exec.is_serial() {
        for i in 0..n_internal_faces {
            let flux = phi_f[i] * face_flux[i];
            res[owner[i]] += flux;
            res[neighbour[i]] -= flux;
        }

        for i in boundary_faces {
            let own = face_cells[i - n_internal_faces];
            res[own] += phi_f[i] * face_flux[i];
        }

        for (cell, r) in res.iter_mut().enumerate() {
            *r *= operator_scaling.get(cell) / volumes[cell];
        }
    } else {
        {
            let res = AtomicScatter::new(&mut *res);
            parallel_for(
                exec,
                0..n_internal_faces,
                |i| {
                    let flux = phi_f[i] * face_flux[i];
                    res.add(owner[i], flux);
                    res.sub(neighbour[i], flux);
                },
                "sumFluxesInternal",
            );

            parallel_for(
                exec,
                boundary_faces,
                |i| {
                    let own = face_cells[i - n_internal_faces];
                    res.add(own, phi_f[i] * face_flux[i]);
                },
                "sumFluxesBoundary",
            );
        }

        parallel_for_each_mut(
            exec,
            res,
            |cell, r| *r *= operator_scaling.get(cell) / volumes[cell],
            "normalizeFluxes",
        );
    }
}

/// Accumulates the explicit divergence of `phi`, transported by `face_flux`, into `div_phi`.
///
/// Internal face values come from `interpolation`, boundary face values are taken from the
/// boundary data of `phi` as they are.
pub fn compute_div_exp<T: FieldValue>(
    face_flux: &SurfaceField<f64>,
    phi: &VolumeField<T>,
    interpolation: &SurfaceInterpolation<T>,
    div_phi: &mut Vector<T>,
    operator_scaling: Coeff,
) {
    let mesh = phi.mesh();
    let exec = mesh.exec();
    debug_assert_eq!(div_phi.len(), mesh.n_cells(), "Expected one divergence value per cell");
    debug_assert!(div_phi.exec() == exec, "Executors are not the same");
    trace!("Explicit divergence of '{}' with {} interpolation", phi.name(), interpolation.scheme());

    let mut phi_f = interpolation.interpolate_new(face_flux, phi);
    let n_internal_faces = mesh.n_internal_faces();
    let boundary_values = phi.boundary_data().value().view();
    parallel_for_each_mut(
        exec,
        &mut phi_f.internal_vector_mut().view_mut()[n_internal_faces..],
        |j, value| *value = boundary_values[j],
        "copyBoundaryValues",
    );
    phi_f.correct_boundary_conditions();

    compute_div(
        exec,
        n_internal_faces,
        mesh.n_boundary_faces(),
        mesh.face_neighbour().view(),
        mesh.face_owner().view(),
        mesh.boundary_mesh().face_cells().view(),
        face_flux.internal_vector().view(),
        phi_f.internal_vector().view(),
        mesh.cell_volumes().view(),
        div_phi.view_mut(),
        operator_scaling,
    );
}

/// Adds the implicit upwind divergence of `phi`, transported by `face_flux`, to `ls`.
///
/// For an internal face with upwind weight `w`, the neighbour row receives `-w * flux` in the
/// owner column and the owner row receives `(1 - w) * flux` in the neighbour column, each
/// scaled by the coefficient of the receiving row. Each off-diagonal contribution is also
/// subtracted from the diagonal of the other cell of the face. Boundary faces contribute to
/// the diagonal and the right-hand side of their owner according to the boundary data of
/// `phi`.
pub fn compute_div_imp<T: FieldValue>(
    ls: &mut LinearSystem<T>,
    face_flux: &SurfaceField<f64>,
    phi: &VolumeField<T>,
    operator_scaling: Coeff,
    sparsity: &SparsityPattern,
) {
    let mesh = phi.mesh();
    let exec = mesh.exec();
    debug_assert!(ls.exec() == exec, "Executors are not the same");
    debug_assert_eq!(sparsity.n_rows(), mesh.n_cells());
    trace!("Implicit divergence of '{}'", phi.name());

    let n_internal_faces = mesh.n_internal_faces();
    let n_faces = mesh.n_faces();
    let flux = face_flux.internal_vector().view();
    let owner = mesh.face_owner().view();
    let neighbour = mesh.face_neighbour().view();
    let face_cells = mesh.boundary_mesh().face_cells().view();
    let diag_offs = sparsity.diag_offset().view();
    let own_offs = sparsity.owner_offset().view();
    let nei_offs = sparsity.neighbour_offset().view();
    let value_fraction = phi.boundary_data().value_fraction().view();
    let ref_value = phi.boundary_data().ref_value().view();

    let (matrix, rhs) = ls.view_mut();
    let CsrMatrixViewMut { values, row_offs, .. } = matrix;

    if exec.is_serial() {
        for face in 0..n_internal_faces {
            let (own, nei) = (owner[face], neighbour[face]);
            let coefficients: FaceCoefficients<T> =
                internal_face_coefficients(flux[face], operator_scaling.get(own), operator_scaling.get(nei));
            let (row_own, row_nei) = (row_offs[own], row_offs[nei]);

            values[row_nei + nei_offs[face]] += coefficients.lower;
            values[row_own + diag_offs[own]] -= coefficients.lower;
            values[row_own + own_offs[face]] += coefficients.upper;
            values[row_nei + diag_offs[nei]] -= coefficients.upper;
        }

        for face in n_internal_faces..n_faces {
            let j = face - n_internal_faces;
            let own = face_cells[j];
            let (diag, source) =
                boundary_face_coefficients(flux[face], operator_scaling.get(own), value_fraction[j], ref_value[j]);
            values[row_offs[own] + diag_offs[own]] += diag;
            rhs[own] -= source;
        }
    } else {
        let values = AtomicScatter::new(values);
        let rhs = AtomicScatter::new(rhs);

        parallel_for(
            exec,
            0..n_internal_faces,
            |face| {
                let (own, nei) = (owner[face], neighbour[face]);
                let coefficients: FaceCoefficients<T> =
                    internal_face_coefficients(flux[face], operator_scaling.get(own), operator_scaling.get(nei));
                let (row_own, row_nei) = (row_offs[own], row_offs[nei]);

                values.add(row_nei + nei_offs[face], coefficients.lower);
                values.sub(row_own + diag_offs[own], coefficients.lower);
                values.add(row_own + own_offs[face], coefficients.upper);
                values.sub(row_nei + diag_offs[nei], coefficients.upper);
            },
            "divImpInternal",
        );

        parallel_for(
            exec,
            n_internal_faces..n_faces,
            |face| {
                let j = face - n_internal_faces;
                let own = face_cells[j];
                let (diag, source) =
                    boundary_face_coefficients(flux[face], operator_scaling.get(own), value_fraction[j], ref_value[j]);
                values.add(row_offs[own] + diag_offs[own], diag);
                rhs.sub(own, source);
            },
            "divImpBoundary",
        );
    }
}

/// The Gauss-Green divergence operator with a fixed face interpolation scheme.
#[derive(Debug)]
pub struct GaussGreenDiv<T: FieldValue> {
    exec: Executor,
    surface_interpolation: SurfaceInterpolation<T>,
}

impl<T: FieldValue> GaussGreenDiv<T> {
    /// Creates the operator with the named interpolation scheme.
    ///
    /// # Panics
    ///
    /// Panics if the scheme is unknown. Use [`try_new`](Self::try_new) to handle this case.
    pub fn new(exec: &Executor, scheme: &str) -> Self {
        Self::try_new(exec, scheme).unwrap_or_else(|err| panic!("Failed to create divergence operator: {err}"))
    }

    pub fn try_new(exec: &Executor, scheme: &str) -> Result<Self, UnknownSchemeError> {
        Ok(Self::with_interpolation(exec, SurfaceInterpolation::from_scheme(exec, scheme)?))
    }

    pub fn with_interpolation(exec: &Executor, surface_interpolation: SurfaceInterpolation<T>) -> Self {
        debug!(
            "Creating Gauss-Green divergence with {} interpolation on {}",
            surface_interpolation.scheme(),
            exec.name()
        );
        Self {
            exec: exec.clone(),
            surface_interpolation,
        }
    }

    pub fn exec(&self) -> &Executor {
        &self.exec
    }

    pub fn surface_interpolation(&self) -> &SurfaceInterpolation<T> {
        &self.surface_interpolation
    }

    /// The explicit divergence of `phi` as a new vector with one entry per cell.
    pub fn div_exp(&self, face_flux: &SurfaceField<f64>, phi: &VolumeField<T>, operator_scaling: Coeff) -> Vector<T> {
        let mut div_phi = Vector::new(&self.exec, phi.mesh().n_cells());
        self.div_exp_into(face_flux, phi, &mut div_phi, operator_scaling);
        div_phi
    }

    /// Accumulates the explicit divergence of `phi` into `div_phi`, see [`compute_div_exp`].
    pub fn div_exp_into(
        &self,
        face_flux: &SurfaceField<f64>,
        phi: &VolumeField<T>,
        div_phi: &mut Vector<T>,
        operator_scaling: Coeff,
    ) {
        compute_div_exp(face_flux, phi, &self.surface_interpolation, div_phi, operator_scaling);
    }

    /// Adds the implicit divergence of `phi` to `ls`, see [`compute_div_imp`].
    pub fn div_imp(
        &self,
        ls: &mut LinearSystem<T>,
        face_flux: &SurfaceField<f64>,
        phi: &VolumeField<T>,
        operator_scaling: Coeff,
        sparsity: &SparsityPattern,
    ) {
        compute_div_imp(ls, face_flux, phi, operator_scaling, sparsity);
    }
}
