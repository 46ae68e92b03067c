use fvcore::executor::Executor;
use fvcore::field::{BoundaryCondition, SurfaceField, VolumeField};
use fvcore::linear_system::create_empty_linear_system;
use fvcore::mesh::procedural::create_1d_uniform_mesh;
use fvcore::operators::{Coeff, GaussGreenDiv};
use fvcore::sparsity::SparsityPattern;
use fvcore::vector::Vector;
use nalgebra::{DMatrix, DVector};
use util::{all_available_executors, assert_approx_slice_eq};

/// Steady upwind advection on the unit interval with a fixed inlet value.
///
/// The implicit operator is assembled on the executor, solved on the host, and the explicit
/// divergence of the solution must then vanish.
#[test]
fn steady_advection_reproduces_inlet_value() {
    let inlet = 2.0;
    let n_cells = 8;
    for (name, exec) in all_available_executors() {
        let mesh = create_1d_uniform_mesh(&exec, n_cells);
        let n_internal = mesh.n_internal_faces();
        let mut fluxes = Vector::with_value(&exec, mesh.n_faces(), 1.0);
        fluxes.view_range_mut(n_internal..n_internal + 1).fill(-1.0);
        let flux = SurfaceField::from_values("flux", &mesh, &fluxes);
        let bcs = vec![BoundaryCondition::FixedValue(inlet), BoundaryCondition::ZeroGradient];
        let mut phi = VolumeField::new("phi", &mesh, bcs);
        phi.correct_boundary_conditions();

        let div = GaussGreenDiv::new(&exec, "upwind");
        let sparsity = SparsityPattern::from_mesh(&mesh);
        let mut ls = create_empty_linear_system(&sparsity);
        div.div_imp(&mut ls, &flux, &phi, Coeff::default(), &sparsity);
        exec.fence();

        let host = ls.copy_to_host();
        let a = DMatrix::from(&host.matrix().to_nalgebra_csr().unwrap());
        let b = DVector::from_vec(host.rhs().to_vec());
        let solution = a.lu().solve(&b).expect("Upwind advection matrix must be invertible");
        assert_approx_slice_eq!(solution.as_slice(), vec![inlet; n_cells], abstol = 1e-12);

        phi.internal_vector_mut()
            .assign(&Vector::from_slice(&exec, solution.as_slice(), &Executor::serial()));
        phi.correct_boundary_conditions();
        let residual = div.div_exp(&flux, &phi, Coeff::default());
        assert_approx_slice_eq!(residual.to_vec(), vec![0.0; n_cells], abstol = 1e-9);
        let outlet = phi.boundary_data().value().to_vec()[1];
        assert!((outlet - inlet).abs() <= 1e-12, "{name}: outlet value {outlet}");
    }
}
