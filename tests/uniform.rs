//! Uniform merge semantics exercised through the public API.

use prism::registry::{InputKind, ShaderInputRegistry};
use prism::uniform::{get_merged, values_equal, UniformValues, ValueType};

fn init_logs() {
    let _ = env_logger::try_init();
}

#[test]
fn overlapping_array_runs_merge() {
    init_logs();
    let registry = ShaderInputRegistry::new();
    registry.add("uWeights", InputKind::Uniform, ValueType::Float, "");

    let base = registry
        .create_array_uniform("uWeights", 0, UniformValues::Float(vec![1.0, 2.0, 3.0, 4.0]))
        .unwrap();
    let patch = registry
        .create_array_uniform("uWeights", 2, UniformValues::Float(vec![30.0, 40.0, 50.0, 60.0]))
        .unwrap();

    let merged = get_merged(&base, &patch).unwrap();
    assert_eq!(merged.array_index(), 0);
    assert_eq!(merged.count(), 6);
    match merged.values() {
        UniformValues::Float(v) => assert_eq!(v, &[1.0, 2.0, 30.0, 40.0, 50.0, 60.0]),
        other => panic!("unexpected values {:?}", other),
    }
}

#[test]
fn covering_replacement_needs_no_merge() {
    init_logs();
    let registry = ShaderInputRegistry::new();
    registry.add("uWeights", InputKind::Uniform, ValueType::Float, "");

    let base = registry
        .create_array_uniform("uWeights", 1, UniformValues::Float(vec![1.0, 2.0]))
        .unwrap();
    let replacement = registry
        .create_array_uniform("uWeights", 0, UniformValues::Float(vec![9.0, 9.0, 9.0, 9.0]))
        .unwrap();

    assert!(get_merged(&base, &replacement).is_none());

    // merge_values_from falls back to the replacement itself.
    let mut merged = base.clone();
    merged.merge_values_from(&replacement);
    assert_eq!(merged, replacement);
}

#[test]
fn disjoint_runs_merge_with_zero_filled_holes() {
    init_logs();
    let registry = ShaderInputRegistry::new();
    registry.add("uWeights", InputKind::Uniform, ValueType::Float, "");

    let base = registry
        .create_array_uniform("uWeights", 0, UniformValues::Float(vec![1.0, 2.0]))
        .unwrap();
    let far = registry
        .create_array_uniform("uWeights", 5, UniformValues::Float(vec![9.0]))
        .unwrap();

    // Indices 2..5 come from neither run and come back zeroed, so the
    // base's elements survive a later rebind resend.
    let merged = get_merged(&base, &far).unwrap();
    assert_eq!(merged.array_index(), 0);
    assert_eq!(merged.count(), 6);
    match merged.values() {
        UniformValues::Float(v) => assert_eq!(v, &[1.0, 2.0, 0.0, 0.0, 0.0, 9.0]),
        other => panic!("unexpected values {:?}", other),
    }
}

#[test]
fn adjacent_runs_concatenate() {
    init_logs();
    let registry = ShaderInputRegistry::new();
    registry.add("uWeights", InputKind::Uniform, ValueType::Float, "");

    let base = registry
        .create_array_uniform("uWeights", 0, UniformValues::Float(vec![1.0, 2.0]))
        .unwrap();
    let next = registry
        .create_array_uniform("uWeights", 2, UniformValues::Float(vec![3.0]))
        .unwrap();

    let merged = get_merged(&base, &next).unwrap();
    assert_eq!(merged.array_index(), 0);
    match merged.values() {
        UniformValues::Float(v) => assert_eq!(v, &[1.0, 2.0, 3.0]),
        other => panic!("unexpected values {:?}", other),
    }
}

#[test]
fn uniforms_from_different_registries_never_match() {
    init_logs();
    let first = ShaderInputRegistry::new();
    first.add("uScale", InputKind::Uniform, ValueType::Float, "");
    let second = ShaderInputRegistry::new();
    second.add("uScale", InputKind::Uniform, ValueType::Float, "");

    let a = first
        .create_uniform("uScale", UniformValues::Float(vec![1.0]))
        .unwrap();
    let b = second
        .create_uniform("uScale", UniformValues::Float(vec![1.0]))
        .unwrap();

    assert!(!a.refers_to_same_input(&b));
    assert_ne!(a, b);
    assert!(get_merged(&a, &b).is_none());
}

#[test]
fn float_payloads_compare_approximately() {
    init_logs();
    let exact = UniformValues::Float(vec![1.0, 2.0]);
    let close = UniformValues::Float(vec![1.0 + 1e-7, 2.0]);
    let far = UniformValues::Float(vec![1.1, 2.0]);

    assert!(values_equal(&exact, &close));
    assert!(!values_equal(&exact, &far));
    // Different variants never compare equal.
    assert!(!values_equal(&exact, &UniformValues::Int(vec![1, 2])));
}
