use fvcore::executor::Executor;
use fvcore::field::{BoundaryCondition, SurfaceField, VolumeField};
use fvcore::linear_system::create_empty_linear_system;
use fvcore::mesh::procedural::{create_1d_uniform_mesh, single_cell_topology};
use fvcore::mesh::UnstructuredMesh;
use fvcore::operators::{upwind_weight, Coeff, GaussGreenDiv};
use fvcore::sparsity::SparsityPattern;
use fvcore::vector::{fill, Vector};
use fvcore::{one, FieldValue, Vec3};
use matrixcompare::assert_matrix_eq;
use nalgebra::DMatrix;
use paste::paste;
use util::{all_available_executors, assert_approx_slice_eq};

/// Outward unit flux through a single face of a single cell of volume `volume`.
fn check_single_cell_outflow<T: FieldValue>() {
    for (name, exec) in all_available_executors() {
        let volume = 4.0;
        let mut topology = single_cell_topology();
        topology.cell_volumes = vec![volume];
        let mesh = UnstructuredMesh::try_from_topology(&exec, topology).unwrap();

        let fluxes = Vector::from_vec(&exec, vec![1.0, 0.0, 0.0, 0.0]);
        let flux = SurfaceField::from_values("flux", &mesh, &fluxes);
        let phi = VolumeField::uniform("phi", &mesh, one::<T>(), vec![BoundaryCondition::FixedValue(one()); 4]);

        let div = GaussGreenDiv::new(&exec, "upwind");
        let result = div.div_exp(&flux, &phi, Coeff::default());
        assert_eq!(result.to_vec(), vec![T::splat(1.0 / volume)], "{name}");
    }
}

/// Unit flux and unit field on a uniform 1D mesh, with inflow on the left.
fn check_uniform_1d_flow_is_divergence_free<T: FieldValue>() {
    for (name, exec) in all_available_executors() {
        let mesh = create_1d_uniform_mesh(&exec, 10);
        let n_internal = mesh.n_internal_faces();
        let mut fluxes = Vector::with_value(&exec, mesh.n_faces(), 1.0);
        // Left boundary normal points against the flow
        fluxes.view_range_mut(n_internal..n_internal + 1).fill(-1.0);
        let flux = SurfaceField::from_values("flux", &mesh, &fluxes);
        let phi = VolumeField::uniform("phi", &mesh, one::<T>(), vec![BoundaryCondition::FixedValue(one()); 2]);

        let div = GaussGreenDiv::new(&exec, "upwind");
        let mut result = Vector::new(&exec, mesh.n_cells());
        div.div_exp_into(&flux, &phi, &mut result, Coeff::default());
        assert_approx_slice_eq!(result.to_vec(), vec![T::zero(); 10], abstol = 1e-12);
        if exec.is_serial() {
            assert_eq!(result.to_vec(), vec![T::zero(); 10], "{name}");
        }
    }
}

macro_rules! explicit_scenarios {
    ($t:ident) => {
        paste! {
            #[test]
            fn [<single_cell_outflow_ $t:snake>]() {
                check_single_cell_outflow::<$t>();
            }

            #[test]
            fn [<uniform_1d_flow_is_divergence_free_ $t:snake>]() {
                check_uniform_1d_flow_is_divergence_free::<$t>();
            }
        }
    };
}

explicit_scenarios!(f64);
explicit_scenarios!(Vec3);

#[test]
fn implicit_upwind_with_positive_flux() {
    for (name, exec) in all_available_executors() {
        let mesh = create_1d_uniform_mesh(&exec, 2);
        // Only the internal face carries a flux
        let fluxes = Vector::from_vec(&exec, vec![3.0, 0.0, 0.0]);
        let flux = SurfaceField::from_values("flux", &mesh, &fluxes);
        let phi = VolumeField::uniform("phi", &mesh, 2.0, vec![BoundaryCondition::ZeroGradient; 2]);
        let scaling = Vector::from_vec(&exec, vec![2.0, 5.0]);

        let sparsity = SparsityPattern::from_mesh(&mesh);
        let mut ls = create_empty_linear_system(&sparsity);
        let div = GaussGreenDiv::new(&exec, "upwind");
        div.div_imp(&mut ls, &flux, &phi, Coeff::per_cell(scaling.view()), &sparsity);

        let matrix = DMatrix::from(&ls.matrix().to_nalgebra_csr().unwrap());
        #[rustfmt::skip]
        let expected = DMatrix::from_row_slice(2, 2, &[
            15.0, 0.0,
            -15.0, 0.0,
        ]);
        assert_matrix_eq!(matrix, expected);
        assert_eq!(ls.rhs().to_vec(), vec![0.0, 0.0], "{name}");
    }
}

#[test]
fn implicit_upwind_with_negative_flux() {
    for (name, exec) in all_available_executors() {
        let mesh = create_1d_uniform_mesh(&exec, 2);
        let fluxes = Vector::from_vec(&exec, vec![-3.0, 0.0, 0.0]);
        let flux = SurfaceField::from_values("flux", &mesh, &fluxes);
        let phi = VolumeField::uniform("phi", &mesh, 2.0, vec![BoundaryCondition::ZeroGradient; 2]);
        let scaling = Vector::from_vec(&exec, vec![2.0, 5.0]);

        let sparsity = SparsityPattern::from_mesh(&mesh);
        let mut ls = create_empty_linear_system(&sparsity);
        let div = GaussGreenDiv::new(&exec, "upwind");
        div.div_imp(&mut ls, &flux, &phi, Coeff::per_cell(scaling.view()), &sparsity);

        // The owner row takes the value from the neighbour, scaled by the owner coefficient
        let matrix = DMatrix::from(&ls.matrix().to_nalgebra_csr().unwrap());
        #[rustfmt::skip]
        let expected = DMatrix::from_row_slice(2, 2, &[
            0.0, -6.0,
            0.0, 6.0,
        ]);
        assert_matrix_eq!(matrix, expected);
        assert_eq!(ls.rhs().to_vec(), vec![0.0, 0.0], "{name}");
    }
}

#[test]
fn zero_flux_takes_neighbour_branch_on_all_executors() {
    assert_eq!(upwind_weight(0.0), 0.0);

    let reference_exec = Executor::serial();
    let assemble = |exec: &Executor| {
        let mesh = create_1d_uniform_mesh(exec, 5);
        let fluxes = Vector::from_vec(exec, vec![0.0, 1.0, -0.0, -2.0, -1.0, 1.0]);
        let flux = SurfaceField::from_values("flux", &mesh, &fluxes);
        let mut phi = VolumeField::new(
            "phi",
            &mesh,
            vec![BoundaryCondition::FixedValue(1.0), BoundaryCondition::ZeroGradient],
        );
        phi.internal_vector_mut().assign(&Vector::from_vec(exec, vec![1.0, 2.0, 3.0, 4.0, 5.0]));
        phi.correct_boundary_conditions();

        let div = GaussGreenDiv::new(exec, "upwind");
        let interpolated = div.surface_interpolation().interpolate_new(&flux, &phi);
        let explicit = div.div_exp(&flux, &phi, Coeff::default());

        let sparsity = SparsityPattern::from_mesh(&mesh);
        let mut ls = create_empty_linear_system(&sparsity);
        div.div_imp(&mut ls, &flux, &phi, Coeff::default(), &sparsity);

        let bits = |values: Vec<f64>| values.into_iter().map(f64::to_bits).collect::<Vec<_>>();
        (
            interpolated.internal_vector().to_vec(),
            bits(explicit.to_vec()),
            bits(ls.matrix().values().to_vec()),
            bits(ls.rhs().to_vec()),
        )
    };

    let reference = assemble(&reference_exec);
    // Both zero fluxes take the value from the neighbour
    assert_eq!(reference.0[0], 2.0);
    assert_eq!(reference.0[2], 4.0);

    for (name, exec) in all_available_executors() {
        // Every matrix entry of a 1D mesh receives at most two contributions, and floating
        // point addition of two values is commutative, so the results are bitwise identical
        assert_eq!(assemble(&exec), reference, "{name}");
    }
}

#[test]
fn linear_interpolation_with_uniform_coefficient() {
    for (_, exec) in all_available_executors() {
        let mesh = create_1d_uniform_mesh(&exec, 3);
        let mut flux = SurfaceField::<f64>::calculated("flux", &mesh);
        fill(flux.internal_vector_mut(), 1.0);
        flux.correct_boundary_conditions();
        let phi = VolumeField::uniform("phi", &mesh, 1.0, vec![BoundaryCondition::ZeroGradient; 2]);

        let div = GaussGreenDiv::new(&exec, "linear");
        let result = div.div_exp(&flux, &phi, Coeff::uniform(0.5));
        // Both boundary fluxes point out of the domain, so only the left cell has a net outflow
        let expected = [3.0, 0.0, 0.0];
        assert_approx_slice_eq!(result.to_vec(), expected, abstol = 1e-12);
    }
}
