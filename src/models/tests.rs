//! Tests for estimators and the registry

use super::*;
use ndarray::{array, Array1, Array2};

/// y = 3 + 2·x0 − 0.5·x1 with a small deterministic wobble
fn linear_data(n: usize) -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((n, 2), |(i, j)| {
        if j == 0 {
            i as f64 * 0.1
        } else {
            ((i * 7) % 11) as f64
        }
    });
    let y = Array1::from_shape_fn(n, |i| {
        3.0 + 2.0 * x[[i, 0]] - 0.5 * x[[i, 1]] + ((i % 3) as f64 - 1.0) * 1e-3
    });
    (x, y)
}

#[test]
fn test_registry_resolves_every_table_id() {
    let registry = ModelRegistry::default();
    for spec in registry.available() {
        let model = registry.create(spec.id).unwrap();
        assert_eq!(model.kind(), spec.kind);
        assert_eq!(spec.kind.id(), spec.id);
    }
}

#[test]
fn test_every_kind_maps_to_its_own_row() {
    let kinds = [
        ModelKind::Linear,
        ModelKind::Ridge,
        ModelKind::Lasso,
        ModelKind::ElasticNet,
        ModelKind::RandomForest,
    ];
    for kind in kinds {
        assert_eq!(kind.spec().kind, kind);
    }
    assert_eq!(ModelKind::RandomForest.spec().id, "rf");
}

#[test]
fn test_registry_ids_case_insensitive() {
    let registry = ModelRegistry::default();
    assert_eq!(registry.resolve(" Ridge ").unwrap(), ModelKind::Ridge);
    assert_eq!(registry.resolve("RF").unwrap(), ModelKind::RandomForest);
}

#[test]
fn test_registry_unknown_model() {
    let err = ModelRegistry::default().create("foo").unwrap_err();
    assert_eq!(err.kind(), "InvalidModelError");
}

#[test]
fn test_hyperparameter_table() {
    assert_eq!(
        ModelKind::Ridge.params(),
        Hyperparameters::LeastSquares { alpha: 1.0 }
    );
    assert_eq!(
        ModelKind::Lasso.params(),
        Hyperparameters::ElasticNet { alpha: 0.001, l1_ratio: 1.0 }
    );
    assert_eq!(
        ModelKind::ElasticNet.params(),
        Hyperparameters::ElasticNet { alpha: 0.001, l1_ratio: 0.5 }
    );
    assert_eq!(
        ModelKind::RandomForest.params(),
        Hyperparameters::Forest { n_trees: 200 }
    );
    assert!(ModelKind::Linear.is_linear());
    assert!(!ModelKind::RandomForest.is_linear());
}

#[test]
fn test_ridge_instances_independent_and_deterministic() {
    let registry = ModelRegistry::default();
    let mut a = registry.create("ridge").unwrap();
    let mut b = registry.create("ridge").unwrap();
    assert!(a.linear_fit().is_none());

    let (x, y) = linear_data(40);
    a.fit(&x, &y).unwrap();
    assert!(b.linear_fit().is_none(), "fitting one instance must not touch the other");

    b.fit(&x, &y).unwrap();
    assert_eq!(a.linear_fit(), b.linear_fit());
}

#[test]
fn test_ols_recovers_coefficients() {
    let (x, y) = linear_data(60);
    let mut model = LeastSquares::ordinary();
    model.fit(&x, &y).unwrap();
    let fit = model.linear_fit().unwrap();

    assert!((fit.coefficients[0] - 2.0).abs() < 1e-2);
    assert!((fit.coefficients[1] + 0.5).abs() < 1e-3);
    assert!((fit.intercept - 3.0).abs() < 1e-2);
}

#[test]
fn test_ridge_shrinks_toward_zero() {
    let (x, y) = linear_data(30);
    let mut ols = LeastSquares::ordinary();
    let mut ridge = LeastSquares::ridge(50.0);
    ols.fit(&x, &y).unwrap();
    ridge.fit(&x, &y).unwrap();

    let norm = |m: &LeastSquares| m.linear_fit().unwrap().coefficients.mapv(|c| c * c).sum();
    assert!(norm(&ridge) < norm(&ols));
}

#[test]
fn test_ols_handles_constant_column() {
    let x = array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0], [4.0, 5.0]];
    let y = array![2.0, 4.0, 6.0, 8.0];
    let mut model = LeastSquares::ordinary();
    model.fit(&x, &y).unwrap();

    let pred = model.predict(&array![[5.0, 5.0]]).unwrap();
    assert!((pred[0] - 10.0).abs() < 1e-6);
    assert_eq!(model.linear_fit().unwrap().coefficients[1], 0.0);
}

#[test]
fn test_lasso_zeroes_irrelevant_feature() {
    let n = 80;
    let x = Array2::from_shape_fn((n, 2), |(i, j)| {
        if j == 0 {
            i as f64
        } else {
            ((i * 13) % 5) as f64 * 1e-3
        }
    });
    let y = Array1::from_shape_fn(n, |i| 1.0 + 0.5 * i as f64);

    let mut lasso = CoordinateDescent::lasso(0.001);
    lasso.fit(&x, &y).unwrap();
    let fit = lasso.linear_fit().unwrap();
    assert!((fit.coefficients[0] - 0.5).abs() < 1e-3);
    assert_eq!(fit.coefficients[1], 0.0);
    assert!(lasso.iterations() >= 1);
}

#[test]
fn test_elastic_net_close_to_ols_for_small_alpha() {
    let (x, y) = linear_data(50);
    let mut enet = CoordinateDescent::elastic_net(0.001, 0.5);
    enet.fit(&x, &y).unwrap();

    let pred = enet.predict(&x).unwrap();
    let mse = (&pred - &y).mapv(|r| r * r).mean().unwrap();
    assert!(mse < 1e-2, "mse = {}", mse);
}

#[test]
fn test_predict_before_fit_fails() {
    for spec in MODEL_TABLE.iter() {
        let model = spec.kind.build();
        let err = model.predict(&array![[1.0]]).unwrap_err();
        assert_eq!(err.kind(), "NotFittedError");
    }
}

#[test]
fn test_fit_rejects_mismatched_rows() {
    let mut model = ModelKind::Linear.build();
    let err = model.fit(&Array2::zeros((3, 1)), &Array1::zeros(2)).unwrap_err();
    assert_eq!(err.kind(), "DimensionMismatchError");
}

#[test]
fn test_seed_threads_into_forest() {
    let x = Array2::from_shape_fn((30, 1), |(i, _)| i as f64);
    let y = Array1::from_shape_fn(30, |i| ((i * 5) % 7) as f64);

    let mut a = ModelKind::RandomForest.build_seeded(3);
    let mut b = ModelRegistry::with_seed(3).create("rf").unwrap();
    a.fit(&x, &y).unwrap();
    b.fit(&x, &y).unwrap();
    assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    assert!(a.linear_fit().is_none());
}
