//! Interpolation of cell values to faces.
//!
//! Kernels fill the internal faces only. Boundary face values are owned by the boundary data
//! and written by the caller, e.g. through
//! [`SurfaceField::correct_boundary_conditions`].
use crate::executor::Executor;
use crate::field::{SurfaceField, VolumeField};
use crate::operators::upwind_weight;
use crate::parallel::parallel_for_each_mut;
use fvcore_traits::FieldValue;
use std::error::Error;
use std::fmt;
use std::fmt::Debug;

/// A scheme that computes internal face values from cell values.
pub trait SurfaceInterpolationKernel<T: FieldValue>: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Writes the interpolated value of every internal face of `dst`.
    fn interpolate(&self, exec: &Executor, face_flux: &SurfaceField<f64>, src: &VolumeField<T>, dst: &mut SurfaceField<T>);
}

/// Takes the value of the cell the flow comes from.
#[derive(Debug, Clone, Copy, Default)]
pub struct Upwind;

/// Distance-weighted average of the owner and neighbour values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Linear;

impl<T: FieldValue> SurfaceInterpolationKernel<T> for Upwind {
    fn name(&self) -> &'static str {
        "upwind"
    }

    fn interpolate(&self, exec: &Executor, face_flux: &SurfaceField<f64>, src: &VolumeField<T>, dst: &mut SurfaceField<T>) {
        let mesh = src.mesh();
        let n_internal = mesh.n_internal_faces();
        let owner = mesh.face_owner().view();
        let neighbour = mesh.face_neighbour().view();
        let flux = face_flux.internal_vector().view();
        let phi = src.internal_vector().view();
        let faces = &mut dst.internal_vector_mut().view_mut()[..n_internal];
        parallel_for_each_mut(
            exec,
            faces,
            |face, value| {
                *value = if upwind_weight(flux[face]) == 1.0 {
                    phi[owner[face]]
                } else {
                    phi[neighbour[face]]
                };
            },
            "upwind::interpolate",
        );
    }
}

impl<T: FieldValue> SurfaceInterpolationKernel<T> for Linear {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn interpolate(&self, exec: &Executor, _face_flux: &SurfaceField<f64>, src: &VolumeField<T>, dst: &mut SurfaceField<T>) {
        let mesh = src.mesh();
        let n_internal = mesh.n_internal_faces();
        let owner = mesh.face_owner().view();
        let neighbour = mesh.face_neighbour().view();
        let weights = mesh.weights().view();
        let phi = src.internal_vector().view();
        let faces = &mut dst.internal_vector_mut().view_mut()[..n_internal];
        parallel_for_each_mut(
            exec,
            faces,
            |face, value| {
                let w = weights[face];
                *value = phi[owner[face]] * w + phi[neighbour[face]] * (1.0 - w);
            },
            "linear::interpolate",
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSchemeError {
    scheme: String,
}

impl UnknownSchemeError {
    pub fn scheme(&self) -> &str {
        &self.scheme
    }
}

impl fmt::Display for UnknownSchemeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Unknown interpolation scheme '{}'. Available schemes: upwind, linear",
            self.scheme
        )
    }
}

impl Error for UnknownSchemeError {}

/// An interpolation kernel bound to an executor.
#[derive(Debug)]
pub struct SurfaceInterpolation<T: FieldValue> {
    exec: Executor,
    kernel: Box<dyn SurfaceInterpolationKernel<T>>,
}

impl<T: FieldValue> SurfaceInterpolation<T> {
    pub fn new(exec: &Executor, kernel: impl SurfaceInterpolationKernel<T> + 'static) -> Self {
        Self {
            exec: exec.clone(),
            kernel: Box::new(kernel),
        }
    }

    /// Selects a kernel by name, `"upwind"` or `"linear"`.
    pub fn from_scheme(exec: &Executor, scheme: &str) -> Result<Self, UnknownSchemeError> {
        match scheme {
            "upwind" => Ok(Self::new(exec, Upwind)),
            "linear" => Ok(Self::new(exec, Linear)),
            _ => Err(UnknownSchemeError {
                scheme: scheme.to_string(),
            }),
        }
    }

    pub fn exec(&self) -> &Executor {
        &self.exec
    }

    pub fn scheme(&self) -> &'static str {
        self.kernel.name()
    }

    /// Fills the internal faces of `dst`. Boundary faces are left untouched.
    pub fn interpolate(&self, face_flux: &SurfaceField<f64>, src: &VolumeField<T>, dst: &mut SurfaceField<T>) {
        debug_assert!(src.mesh().exec() == &self.exec, "Executors are not the same");
        self.kernel.interpolate(&self.exec, face_flux, src, dst);
    }

    /// A new calculated surface field named after `src`, with the internal faces filled.
    pub fn interpolate_new<'m>(&self, face_flux: &SurfaceField<f64>, src: &VolumeField<'m, T>) -> SurfaceField<'m, T> {
        let name = format!("interpolated_{}", src.name());
        let mut dst = SurfaceField::calculated(name, src.mesh());
        self.interpolate(face_flux, src, &mut dst);
        dst
    }
}
