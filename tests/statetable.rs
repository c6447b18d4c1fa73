//! State table semantics exercised through the public API: defaults,
//! set-tracking, and the merge rules traversal is built on.

use prism::math::Rect;
use prism::statetable::{
    BlendFunctionFactor, Capability, CompareFunction, CullFaceMode, StateTable, Value,
};

fn init_logs() {
    let _ = env_logger::try_init();
}

#[test]
fn new_tables_have_gl_defaults_and_nothing_set() {
    init_logs();
    let st = StateTable::new(640, 480);

    // Dither and multisampling are the only capabilities GL enables by
    // default.
    assert!(st.is_enabled(Capability::Dither));
    assert!(st.is_enabled(Capability::Multisample));
    assert!(!st.is_enabled(Capability::Blend));
    assert!(!st.is_enabled(Capability::DepthTest));
    assert_eq!(st.enabled_count(), 2);

    assert_eq!(st.set_capability_count(), 0);
    assert_eq!(st.set_value_count(), 0);

    assert_eq!(st.viewport(), Rect::new(0, 0, 640, 480));
    assert_eq!(st.scissor_box(), Rect::new(0, 0, 640, 480));
    assert_eq!(st.line_width(), 1.0);
    assert_eq!(st.clear_depth(), 1.0);
    assert_eq!(st.depth_function(), CompareFunction::Less);
    assert_eq!(st.cull_face_mode(), CullFaceMode::Back);
}

#[test]
fn setters_mark_entries_set() {
    init_logs();
    let mut st = StateTable::new(100, 100);
    st.set_line_width(2.5);
    st.enable(Capability::CullFace, true);

    assert!(st.is_value_set(Value::LineWidth));
    assert!(!st.is_value_set(Value::DepthFunction));
    assert!(st.is_capability_set(Capability::CullFace));
    assert!(!st.is_capability_set(Capability::Blend));
}

#[test]
fn reset_value_restores_the_default() {
    init_logs();
    let mut st = StateTable::new(64, 32);
    st.set_viewport(Rect::new(1, 2, 3, 4));
    assert!(st.is_value_set(Value::Viewport));

    st.reset_value(Value::Viewport);
    assert!(!st.is_value_set(Value::Viewport));
    assert_eq!(st.viewport(), Rect::new(0, 0, 64, 32));
}

#[test]
fn merge_copies_only_set_entries() {
    init_logs();
    let mut base = StateTable::new(100, 100);
    base.set_line_width(1.0);

    let mut node = StateTable::default();
    node.set_line_width(4.0);
    node.enable(Capability::Blend, true);

    base.merge_values_from(&node, &node);

    assert_eq!(base.line_width(), 4.0);
    assert!(base.is_value_set(Value::LineWidth));
    // Entries the node never touched stay as they were, and unset.
    assert_eq!(base.depth_function(), CompareFunction::Less);
    assert!(!base.is_value_set(Value::DepthFunction));

    assert!(base.is_enabled(Capability::Blend));
    assert!(base.is_capability_set(Capability::Blend));
}

#[test]
fn merge_is_idempotent() {
    init_logs();
    let mut node = StateTable::default();
    node.set_blend_functions(
        BlendFunctionFactor::SrcAlpha,
        BlendFunctionFactor::OneMinusSrcAlpha,
        BlendFunctionFactor::One,
        BlendFunctionFactor::Zero,
    );
    node.enable(Capability::Blend, true);

    let mut once = StateTable::new(100, 100);
    once.merge_values_from(&node, &node);
    let mut twice = once.clone();
    twice.merge_values_from(&node, &node);

    for &value in prism::statetable::Value::ALL.iter() {
        assert!(once.is_value_equal(&twice, value));
        assert_eq!(once.is_value_set(value), twice.is_value_set(value));
    }
    assert!(StateTable::are_capabilities_same(&once, &twice));
}

#[test]
fn non_clear_merge_skips_frame_values() {
    init_logs();
    let mut node = StateTable::default();
    node.set_line_width(3.0);
    node.set_clear_depth(0.5);
    node.set_scissor_box(Rect::new(5, 5, 10, 10));

    let mut base = StateTable::new(100, 100);
    base.merge_non_clear_values_from(&node, &node);

    assert_eq!(base.line_width(), 3.0);
    // Frame-scoped values never travel on the restore path.
    assert_eq!(base.clear_depth(), 1.0);
    assert!(!base.is_value_set(Value::ClearDepth));
    assert_eq!(base.scissor_box(), Rect::new(0, 0, 100, 100));
    assert!(!base.is_value_set(Value::ScissorBox));
}

#[test]
fn identical_capability_sets_merge_only_when_enforced() {
    init_logs();
    let mut base = StateTable::new(10, 10);

    // Dither is set but its value equals the default, so the capability
    // halves of the tables are identical and the merge is skipped.
    let mut node = StateTable::default();
    node.enable(Capability::Dither, true);
    base.merge_values_from(&node, &node);
    assert!(!base.is_capability_set(Capability::Dither));

    node.set_enforced(true);
    base.merge_values_from(&node, &node);
    assert!(base.is_capability_set(Capability::Dither));
}

#[test]
fn gl_enum_conversions_round_trip() {
    init_logs();
    use gl::types::GLenum;
    use prism::statetable::{BlendEquation, FrontFaceMode, StencilOperation};

    for &mode in &[CullFaceMode::Front, CullFaceMode::Back, CullFaceMode::FrontAndBack] {
        let raw: GLenum = mode.into();
        assert_eq!(CullFaceMode::from_gl(raw), Some(mode));
    }
    for &eq in &[
        BlendEquation::Add,
        BlendEquation::Subtract,
        BlendEquation::ReverseSubtract,
    ] {
        let raw: GLenum = eq.into();
        assert_eq!(BlendEquation::from_gl(raw), Some(eq));
    }
    let raw: GLenum = FrontFaceMode::Clockwise.into();
    assert_eq!(FrontFaceMode::from_gl(raw), Some(FrontFaceMode::Clockwise));
    let raw: GLenum = StencilOperation::Invert.into();
    assert_eq!(StencilOperation::from_gl(raw), Some(StencilOperation::Invert));

    assert_eq!(CullFaceMode::from_gl(0), None);
}
