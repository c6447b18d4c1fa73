//! A diffable model of the fixed-function OpenGL pipeline state.
//!
//! A `StateTable` stores a value for every capability and state value the
//! renderer manages, together with per-entry "set" tracking. A table with
//! nothing set describes the GL default state; a table with a few entries
//! set describes a partial override that can be merged onto another table.
//! The renderer keeps one table mirroring what the context currently holds
//! and diffs incoming tables against it, so redundant GL calls are elided.

use gl::types::GLenum;

use crate::math::{Rect, Vector2, Vector4};

/// Server-side capabilities toggled with `glEnable`/`glDisable`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Capability {
    Blend,
    ClipDistance0,
    ClipDistance1,
    ClipDistance2,
    ClipDistance3,
    ClipDistance4,
    ClipDistance5,
    ClipDistance6,
    ClipDistance7,
    CullFace,
    DebugOutputSynchronous,
    DepthTest,
    Dither,
    Multisample,
    PolygonOffsetFill,
    RasterizerDiscard,
    SampleAlphaToCoverage,
    SampleCoverage,
    SampleShading,
    ScissorTest,
    StencilTest,
}

pub const CAPABILITY_COUNT: usize = 21;
pub(crate) const CAPABILITY_MASK: u32 = (1 << CAPABILITY_COUNT as u32) - 1;

impl Capability {
    pub const ALL: [Capability; CAPABILITY_COUNT] = [
        Capability::Blend,
        Capability::ClipDistance0,
        Capability::ClipDistance1,
        Capability::ClipDistance2,
        Capability::ClipDistance3,
        Capability::ClipDistance4,
        Capability::ClipDistance5,
        Capability::ClipDistance6,
        Capability::ClipDistance7,
        Capability::CullFace,
        Capability::DebugOutputSynchronous,
        Capability::DepthTest,
        Capability::Dither,
        Capability::Multisample,
        Capability::PolygonOffsetFill,
        Capability::RasterizerDiscard,
        Capability::SampleAlphaToCoverage,
        Capability::SampleCoverage,
        Capability::SampleShading,
        Capability::ScissorTest,
        Capability::StencilTest,
    ];

    /// The clip distance capability for plane `index`, which must be below 8.
    #[inline]
    pub fn clip_distance(index: usize) -> Capability {
        debug_assert!(index < 8);
        Capability::ALL[Capability::ClipDistance0 as usize + index]
    }

    #[inline]
    pub(crate) fn bit(self) -> u32 {
        1 << (self as u32)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Blend => "Blend",
            Capability::ClipDistance0 => "ClipDistance0",
            Capability::ClipDistance1 => "ClipDistance1",
            Capability::ClipDistance2 => "ClipDistance2",
            Capability::ClipDistance3 => "ClipDistance3",
            Capability::ClipDistance4 => "ClipDistance4",
            Capability::ClipDistance5 => "ClipDistance5",
            Capability::ClipDistance6 => "ClipDistance6",
            Capability::ClipDistance7 => "ClipDistance7",
            Capability::CullFace => "CullFace",
            Capability::DebugOutputSynchronous => "DebugOutputSynchronous",
            Capability::DepthTest => "DepthTest",
            Capability::Dither => "Dither",
            Capability::Multisample => "Multisample",
            Capability::PolygonOffsetFill => "PolygonOffsetFill",
            Capability::RasterizerDiscard => "RasterizerDiscard",
            Capability::SampleAlphaToCoverage => "SampleAlphaToCoverage",
            Capability::SampleCoverage => "SampleCoverage",
            Capability::SampleShading => "SampleShading",
            Capability::ScissorTest => "ScissorTest",
            Capability::StencilTest => "StencilTest",
        }
    }
}

impl From<Capability> for GLenum {
    fn from(cap: Capability) -> Self {
        match cap {
            Capability::Blend => gl::BLEND,
            Capability::ClipDistance0 => gl::CLIP_DISTANCE0,
            Capability::ClipDistance1 => gl::CLIP_DISTANCE1,
            Capability::ClipDistance2 => gl::CLIP_DISTANCE2,
            Capability::ClipDistance3 => gl::CLIP_DISTANCE3,
            Capability::ClipDistance4 => gl::CLIP_DISTANCE4,
            Capability::ClipDistance5 => gl::CLIP_DISTANCE5,
            Capability::ClipDistance6 => gl::CLIP_DISTANCE6,
            Capability::ClipDistance7 => gl::CLIP_DISTANCE7,
            Capability::CullFace => gl::CULL_FACE,
            Capability::DebugOutputSynchronous => gl::DEBUG_OUTPUT_SYNCHRONOUS,
            Capability::DepthTest => gl::DEPTH_TEST,
            Capability::Dither => gl::DITHER,
            Capability::Multisample => gl::MULTISAMPLE,
            Capability::PolygonOffsetFill => gl::POLYGON_OFFSET_FILL,
            Capability::RasterizerDiscard => gl::RASTERIZER_DISCARD,
            Capability::SampleAlphaToCoverage => gl::SAMPLE_ALPHA_TO_COVERAGE,
            Capability::SampleCoverage => gl::SAMPLE_COVERAGE,
            Capability::SampleShading => gl::SAMPLE_SHADING,
            Capability::ScissorTest => gl::SCISSOR_TEST,
            Capability::StencilTest => gl::STENCIL_TEST,
        }
    }
}

/// State values applied with dedicated GL calls rather than enables.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Value {
    BlendColor,
    BlendEquations,
    BlendFunctions,
    ClearColor,
    ClearDepth,
    ClearStencil,
    ColorWriteMasks,
    CullFaceMode,
    FrontFaceMode,
    DefaultInnerTessellationLevel,
    DefaultOuterTessellationLevel,
    DepthFunction,
    DepthRange,
    DepthWriteMask,
    Hints,
    LineWidth,
    MinSampleShading,
    PolygonOffset,
    SampleCoverage,
    ScissorBox,
    StencilFunctions,
    StencilOperations,
    StencilWriteMasks,
    Viewport,
}

pub const VALUE_COUNT: usize = 24;
const VALUE_MASK: u32 = (1 << VALUE_COUNT as u32) - 1;

impl Value {
    pub const ALL: [Value; VALUE_COUNT] = [
        Value::BlendColor,
        Value::BlendEquations,
        Value::BlendFunctions,
        Value::ClearColor,
        Value::ClearDepth,
        Value::ClearStencil,
        Value::ColorWriteMasks,
        Value::CullFaceMode,
        Value::FrontFaceMode,
        Value::DefaultInnerTessellationLevel,
        Value::DefaultOuterTessellationLevel,
        Value::DepthFunction,
        Value::DepthRange,
        Value::DepthWriteMask,
        Value::Hints,
        Value::LineWidth,
        Value::MinSampleShading,
        Value::PolygonOffset,
        Value::SampleCoverage,
        Value::ScissorBox,
        Value::StencilFunctions,
        Value::StencilOperations,
        Value::StencilWriteMasks,
        Value::Viewport,
    ];

    #[inline]
    fn bit(self) -> u32 {
        1 << (self as u32)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Value::BlendColor => "BlendColor",
            Value::BlendEquations => "BlendEquations",
            Value::BlendFunctions => "BlendFunctions",
            Value::ClearColor => "ClearColor",
            Value::ClearDepth => "ClearDepth",
            Value::ClearStencil => "ClearStencil",
            Value::ColorWriteMasks => "ColorWriteMasks",
            Value::CullFaceMode => "CullFaceMode",
            Value::FrontFaceMode => "FrontFaceMode",
            Value::DefaultInnerTessellationLevel => "DefaultInnerTessellationLevel",
            Value::DefaultOuterTessellationLevel => "DefaultOuterTessellationLevel",
            Value::DepthFunction => "DepthFunction",
            Value::DepthRange => "DepthRange",
            Value::DepthWriteMask => "DepthWriteMask",
            Value::Hints => "Hints",
            Value::LineWidth => "LineWidth",
            Value::MinSampleShading => "MinSampleShading",
            Value::PolygonOffset => "PolygonOffset",
            Value::SampleCoverage => "SampleCoverage",
            Value::ScissorBox => "ScissorBox",
            Value::StencilFunctions => "StencilFunctions",
            Value::StencilOperations => "StencilOperations",
            Value::StencilWriteMasks => "StencilWriteMasks",
            Value::Viewport => "Viewport",
        }
    }
}

// Frame-scoped values that merge_non_clear_values_from never copies: clear
// values, write masks and the scissor box belong to whoever owns the frame,
// not to interior nodes restoring their parents' state.
const FRAME_VALUE_BITS: u32 = (1 << Value::ClearColor as u32)
    | (1 << Value::ClearDepth as u32)
    | (1 << Value::ClearStencil as u32)
    | (1 << Value::ColorWriteMasks as u32)
    | (1 << Value::StencilWriteMasks as u32)
    | (1 << Value::ScissorBox as u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlendEquation {
    Add,
    Max,
    Min,
    ReverseSubtract,
    Subtract,
}

impl BlendEquation {
    pub fn as_str(self) -> &'static str {
        match self {
            BlendEquation::Add => "Add",
            BlendEquation::Max => "Max",
            BlendEquation::Min => "Min",
            BlendEquation::ReverseSubtract => "ReverseSubtract",
            BlendEquation::Subtract => "Subtract",
        }
    }
}

impl From<BlendEquation> for GLenum {
    fn from(eq: BlendEquation) -> Self {
        match eq {
            BlendEquation::Add => gl::FUNC_ADD,
            BlendEquation::Max => gl::MAX,
            BlendEquation::Min => gl::MIN,
            BlendEquation::ReverseSubtract => gl::FUNC_REVERSE_SUBTRACT,
            BlendEquation::Subtract => gl::FUNC_SUBTRACT,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlendFunctionFactor {
    ConstantAlpha,
    ConstantColor,
    DstAlpha,
    DstColor,
    One,
    OneMinusConstantAlpha,
    OneMinusConstantColor,
    OneMinusDstAlpha,
    OneMinusDstColor,
    OneMinusSrcAlpha,
    OneMinusSrcColor,
    SrcAlpha,
    SrcAlphaSaturate,
    SrcColor,
    Zero,
}

impl BlendFunctionFactor {
    pub fn as_str(self) -> &'static str {
        match self {
            BlendFunctionFactor::ConstantAlpha => "ConstantAlpha",
            BlendFunctionFactor::ConstantColor => "ConstantColor",
            BlendFunctionFactor::DstAlpha => "DstAlpha",
            BlendFunctionFactor::DstColor => "DstColor",
            BlendFunctionFactor::One => "One",
            BlendFunctionFactor::OneMinusConstantAlpha => "OneMinusConstantAlpha",
            BlendFunctionFactor::OneMinusConstantColor => "OneMinusConstantColor",
            BlendFunctionFactor::OneMinusDstAlpha => "OneMinusDstAlpha",
            BlendFunctionFactor::OneMinusDstColor => "OneMinusDstColor",
            BlendFunctionFactor::OneMinusSrcAlpha => "OneMinusSrcAlpha",
            BlendFunctionFactor::OneMinusSrcColor => "OneMinusSrcColor",
            BlendFunctionFactor::SrcAlpha => "SrcAlpha",
            BlendFunctionFactor::SrcAlphaSaturate => "SrcAlphaSaturate",
            BlendFunctionFactor::SrcColor => "SrcColor",
            BlendFunctionFactor::Zero => "Zero",
        }
    }
}

impl From<BlendFunctionFactor> for GLenum {
    fn from(f: BlendFunctionFactor) -> Self {
        match f {
            BlendFunctionFactor::ConstantAlpha => gl::CONSTANT_ALPHA,
            BlendFunctionFactor::ConstantColor => gl::CONSTANT_COLOR,
            BlendFunctionFactor::DstAlpha => gl::DST_ALPHA,
            BlendFunctionFactor::DstColor => gl::DST_COLOR,
            BlendFunctionFactor::One => gl::ONE,
            BlendFunctionFactor::OneMinusConstantAlpha => gl::ONE_MINUS_CONSTANT_ALPHA,
            BlendFunctionFactor::OneMinusConstantColor => gl::ONE_MINUS_CONSTANT_COLOR,
            BlendFunctionFactor::OneMinusDstAlpha => gl::ONE_MINUS_DST_ALPHA,
            BlendFunctionFactor::OneMinusDstColor => gl::ONE_MINUS_DST_COLOR,
            BlendFunctionFactor::OneMinusSrcAlpha => gl::ONE_MINUS_SRC_ALPHA,
            BlendFunctionFactor::OneMinusSrcColor => gl::ONE_MINUS_SRC_COLOR,
            BlendFunctionFactor::SrcAlpha => gl::SRC_ALPHA,
            BlendFunctionFactor::SrcAlphaSaturate => gl::SRC_ALPHA_SATURATE,
            BlendFunctionFactor::SrcColor => gl::SRC_COLOR,
            BlendFunctionFactor::Zero => gl::ZERO,
        }
    }
}

impl BlendEquation {
    /// Reverse mapping used when mirroring state out of a live context.
    pub fn from_gl(value: GLenum) -> Option<Self> {
        match value {
            gl::FUNC_ADD => Some(BlendEquation::Add),
            gl::MAX => Some(BlendEquation::Max),
            gl::MIN => Some(BlendEquation::Min),
            gl::FUNC_REVERSE_SUBTRACT => Some(BlendEquation::ReverseSubtract),
            gl::FUNC_SUBTRACT => Some(BlendEquation::Subtract),
            _ => None,
        }
    }
}

impl BlendFunctionFactor {
    pub fn from_gl(value: GLenum) -> Option<Self> {
        match value {
            gl::CONSTANT_ALPHA => Some(BlendFunctionFactor::ConstantAlpha),
            gl::CONSTANT_COLOR => Some(BlendFunctionFactor::ConstantColor),
            gl::DST_ALPHA => Some(BlendFunctionFactor::DstAlpha),
            gl::DST_COLOR => Some(BlendFunctionFactor::DstColor),
            gl::ONE => Some(BlendFunctionFactor::One),
            gl::ONE_MINUS_CONSTANT_ALPHA => Some(BlendFunctionFactor::OneMinusConstantAlpha),
            gl::ONE_MINUS_CONSTANT_COLOR => Some(BlendFunctionFactor::OneMinusConstantColor),
            gl::ONE_MINUS_DST_ALPHA => Some(BlendFunctionFactor::OneMinusDstAlpha),
            gl::ONE_MINUS_DST_COLOR => Some(BlendFunctionFactor::OneMinusDstColor),
            gl::ONE_MINUS_SRC_ALPHA => Some(BlendFunctionFactor::OneMinusSrcAlpha),
            gl::ONE_MINUS_SRC_COLOR => Some(BlendFunctionFactor::OneMinusSrcColor),
            gl::SRC_ALPHA => Some(BlendFunctionFactor::SrcAlpha),
            gl::SRC_ALPHA_SATURATE => Some(BlendFunctionFactor::SrcAlphaSaturate),
            gl::SRC_COLOR => Some(BlendFunctionFactor::SrcColor),
            gl::ZERO => Some(BlendFunctionFactor::Zero),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CullFaceMode {
    Front,
    Back,
    FrontAndBack,
}

impl CullFaceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CullFaceMode::Front => "CullFront",
            CullFaceMode::Back => "CullBack",
            CullFaceMode::FrontAndBack => "CullFrontAndBack",
        }
    }
}

impl From<CullFaceMode> for GLenum {
    fn from(mode: CullFaceMode) -> Self {
        match mode {
            CullFaceMode::Front => gl::FRONT,
            CullFaceMode::Back => gl::BACK,
            CullFaceMode::FrontAndBack => gl::FRONT_AND_BACK,
        }
    }
}

impl CullFaceMode {
    pub fn from_gl(value: GLenum) -> Option<Self> {
        match value {
            gl::FRONT => Some(CullFaceMode::Front),
            gl::BACK => Some(CullFaceMode::Back),
            gl::FRONT_AND_BACK => Some(CullFaceMode::FrontAndBack),
            _ => None,
        }
    }
}

/// Comparison function shared by the depth and stencil tests.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    Always,
    Equal,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Never,
    NotEqual,
}

pub type DepthFunction = CompareFunction;
pub type StencilFunction = CompareFunction;

impl CompareFunction {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareFunction::Always => "Always",
            CompareFunction::Equal => "Equal",
            CompareFunction::Greater => "Greater",
            CompareFunction::GreaterOrEqual => "GreaterOrEqual",
            CompareFunction::Less => "Less",
            CompareFunction::LessOrEqual => "LessOrEqual",
            CompareFunction::Never => "Never",
            CompareFunction::NotEqual => "NotEqual",
        }
    }
}

impl From<CompareFunction> for GLenum {
    fn from(f: CompareFunction) -> Self {
        match f {
            CompareFunction::Always => gl::ALWAYS,
            CompareFunction::Equal => gl::EQUAL,
            CompareFunction::Greater => gl::GREATER,
            CompareFunction::GreaterOrEqual => gl::GEQUAL,
            CompareFunction::Less => gl::LESS,
            CompareFunction::LessOrEqual => gl::LEQUAL,
            CompareFunction::Never => gl::NEVER,
            CompareFunction::NotEqual => gl::NOTEQUAL,
        }
    }
}

impl CompareFunction {
    pub fn from_gl(value: GLenum) -> Option<Self> {
        match value {
            gl::ALWAYS => Some(CompareFunction::Always),
            gl::EQUAL => Some(CompareFunction::Equal),
            gl::GREATER => Some(CompareFunction::Greater),
            gl::GEQUAL => Some(CompareFunction::GreaterOrEqual),
            gl::LESS => Some(CompareFunction::Less),
            gl::LEQUAL => Some(CompareFunction::LessOrEqual),
            gl::NEVER => Some(CompareFunction::Never),
            gl::NOTEQUAL => Some(CompareFunction::NotEqual),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FrontFaceMode {
    Clockwise,
    CounterClockwise,
}

impl FrontFaceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FrontFaceMode::Clockwise => "Clockwise",
            FrontFaceMode::CounterClockwise => "CounterClockwise",
        }
    }
}

impl From<FrontFaceMode> for GLenum {
    fn from(mode: FrontFaceMode) -> Self {
        match mode {
            FrontFaceMode::Clockwise => gl::CW,
            FrontFaceMode::CounterClockwise => gl::CCW,
        }
    }
}

impl FrontFaceMode {
    pub fn from_gl(value: GLenum) -> Option<Self> {
        match value {
            gl::CW => Some(FrontFaceMode::Clockwise),
            gl::CCW => Some(FrontFaceMode::CounterClockwise),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HintMode {
    DontCare,
    Fastest,
    Nicest,
}

impl HintMode {
    pub fn as_str(self) -> &'static str {
        match self {
            HintMode::DontCare => "DontCare",
            HintMode::Fastest => "Fastest",
            HintMode::Nicest => "Nicest",
        }
    }
}

impl From<HintMode> for GLenum {
    fn from(mode: HintMode) -> Self {
        match mode {
            HintMode::DontCare => gl::DONT_CARE,
            HintMode::Fastest => gl::FASTEST,
            HintMode::Nicest => gl::NICEST,
        }
    }
}

impl HintMode {
    pub fn from_gl(value: GLenum) -> Option<Self> {
        match value {
            gl::DONT_CARE => Some(HintMode::DontCare),
            gl::FASTEST => Some(HintMode::Fastest),
            gl::NICEST => Some(HintMode::Nicest),
            _ => None,
        }
    }
}

/// Targets accepted by `set_hint`. Mipmap generation is the only hint the
/// renderer applies on every profile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HintTarget {
    GenerateMipmap,
}

impl HintTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            HintTarget::GenerateMipmap => "GenerateMipmap",
        }
    }
}

// Not generated for desktop core profiles, but accepted by every ES
// context and by compatibility contexts.
pub(crate) const GL_GENERATE_MIPMAP_HINT: GLenum = 0x8192;

impl From<HintTarget> for GLenum {
    fn from(target: HintTarget) -> Self {
        match target {
            HintTarget::GenerateMipmap => GL_GENERATE_MIPMAP_HINT,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StencilOperation {
    Decrement,
    DecrementAndWrap,
    Increment,
    IncrementAndWrap,
    Invert,
    Keep,
    Replace,
    Zero,
}

impl StencilOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            StencilOperation::Decrement => "Decrement",
            StencilOperation::DecrementAndWrap => "DecrementAndWrap",
            StencilOperation::Increment => "Increment",
            StencilOperation::IncrementAndWrap => "IncrementAndWrap",
            StencilOperation::Invert => "Invert",
            StencilOperation::Keep => "Keep",
            StencilOperation::Replace => "Replace",
            StencilOperation::Zero => "Zero",
        }
    }
}

impl From<StencilOperation> for GLenum {
    fn from(op: StencilOperation) -> Self {
        match op {
            StencilOperation::Decrement => gl::DECR,
            StencilOperation::DecrementAndWrap => gl::DECR_WRAP,
            StencilOperation::Increment => gl::INCR,
            StencilOperation::IncrementAndWrap => gl::INCR_WRAP,
            StencilOperation::Invert => gl::INVERT,
            StencilOperation::Keep => gl::KEEP,
            StencilOperation::Replace => gl::REPLACE,
            StencilOperation::Zero => gl::ZERO,
        }
    }
}

impl StencilOperation {
    pub fn from_gl(value: GLenum) -> Option<Self> {
        match value {
            gl::DECR => Some(StencilOperation::Decrement),
            gl::DECR_WRAP => Some(StencilOperation::DecrementAndWrap),
            gl::INCR => Some(StencilOperation::Increment),
            gl::INCR_WRAP => Some(StencilOperation::IncrementAndWrap),
            gl::INVERT => Some(StencilOperation::Invert),
            gl::KEEP => Some(StencilOperation::Keep),
            gl::REPLACE => Some(StencilOperation::Replace),
            gl::ZERO => Some(StencilOperation::Zero),
            _ => None,
        }
    }
}

/// Per-face stencil test configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StencilSide {
    pub function: StencilFunction,
    pub reference: i32,
    pub mask: u32,
}

impl Default for StencilSide {
    fn default() -> Self {
        StencilSide {
            function: CompareFunction::Always,
            reference: 0,
            mask: !0,
        }
    }
}

/// Per-face stencil write actions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StencilActions {
    pub stencil_fail: StencilOperation,
    pub depth_fail: StencilOperation,
    pub pass: StencilOperation,
}

impl Default for StencilActions {
    fn default() -> Self {
        StencilActions {
            stencil_fail: StencilOperation::Keep,
            depth_fail: StencilOperation::Keep,
            pass: StencilOperation::Keep,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Data {
    blend_color: Vector4<f32>,
    rgb_blend_equation: BlendEquation,
    alpha_blend_equation: BlendEquation,
    rgb_blend_src: BlendFunctionFactor,
    rgb_blend_dst: BlendFunctionFactor,
    alpha_blend_src: BlendFunctionFactor,
    alpha_blend_dst: BlendFunctionFactor,
    clear_color: Vector4<f32>,
    clear_depth: f32,
    clear_stencil: i32,
    color_write_masks: [bool; 4],
    cull_face_mode: CullFaceMode,
    front_face_mode: FrontFaceMode,
    default_inner_tess_levels: [f32; 2],
    default_outer_tess_levels: [f32; 4],
    depth_function: DepthFunction,
    depth_range: Vector2<f32>,
    depth_write_mask: bool,
    generate_mipmap_hint: HintMode,
    line_width: f32,
    min_sample_shading: f32,
    polygon_offset_factor: f32,
    polygon_offset_units: f32,
    sample_coverage_value: f32,
    sample_coverage_inverted: bool,
    scissor_box: Rect,
    front_stencil: StencilSide,
    back_stencil: StencilSide,
    front_stencil_actions: StencilActions,
    back_stencil_actions: StencilActions,
    front_stencil_write_mask: u32,
    back_stencil_write_mask: u32,
    viewport: Rect,
}

impl Data {
    fn defaults(width: i32, height: i32) -> Self {
        Data {
            blend_color: Vector4::new(0.0, 0.0, 0.0, 0.0),
            rgb_blend_equation: BlendEquation::Add,
            alpha_blend_equation: BlendEquation::Add,
            rgb_blend_src: BlendFunctionFactor::One,
            rgb_blend_dst: BlendFunctionFactor::Zero,
            alpha_blend_src: BlendFunctionFactor::One,
            alpha_blend_dst: BlendFunctionFactor::Zero,
            clear_color: Vector4::new(0.0, 0.0, 0.0, 0.0),
            clear_depth: 1.0,
            clear_stencil: 0,
            color_write_masks: [true; 4],
            cull_face_mode: CullFaceMode::Back,
            front_face_mode: FrontFaceMode::CounterClockwise,
            default_inner_tess_levels: [1.0; 2],
            default_outer_tess_levels: [1.0; 4],
            depth_function: CompareFunction::Less,
            depth_range: Vector2::new(0.0, 1.0),
            depth_write_mask: true,
            generate_mipmap_hint: HintMode::DontCare,
            line_width: 1.0,
            min_sample_shading: 0.0,
            polygon_offset_factor: 0.0,
            polygon_offset_units: 0.0,
            sample_coverage_value: 1.0,
            sample_coverage_inverted: false,
            scissor_box: Rect::new(0, 0, width, height),
            front_stencil: StencilSide::default(),
            back_stencil: StencilSide::default(),
            front_stencil_actions: StencilActions::default(),
            back_stencil_actions: StencilActions::default(),
            front_stencil_write_mask: !0,
            back_stencil_write_mask: !0,
            viewport: Rect::new(0, 0, width, height),
        }
    }
}

/// See the module documentation for the set-tracking model.
#[derive(Clone, Debug)]
pub struct StateTable {
    // Capability values and their is-set bits, one bit per Capability.
    capabilities: u32,
    capabilities_set: u32,
    // Is-set bits, one per Value; the values themselves live in `data`.
    values_set: u32,
    enforced: bool,
    default_width: i32,
    default_height: i32,
    data: Data,
}

impl Default for StateTable {
    fn default() -> Self {
        StateTable::new(0, 0)
    }
}

impl StateTable {
    /// A table holding GL defaults, with nothing marked set. `width` and
    /// `height` size the default viewport and scissor box.
    pub fn new(width: i32, height: i32) -> Self {
        StateTable {
            capabilities: Capability::Dither.bit() | Capability::Multisample.bit(),
            capabilities_set: 0,
            values_set: 0,
            enforced: false,
            default_width: width,
            default_height: height,
            data: Data::defaults(width, height),
        }
    }

    /// Restores every entry to its default and clears all set bits. The
    /// default viewport keeps the dimensions given at construction.
    pub fn reset(&mut self) {
        let (w, h) = (self.default_width, self.default_height);
        self.capabilities = Capability::Dither.bit() | Capability::Multisample.bit();
        self.capabilities_set = 0;
        self.values_set = 0;
        self.enforced = false;
        self.data = Data::defaults(w, h);
    }

    /// Becomes an exact copy of `other`, set bits included.
    pub fn copy_from(&mut self, other: &StateTable) {
        *self = other.clone();
    }

    // ------------------------------------------------------------------
    // Set tracking.
    // ------------------------------------------------------------------

    #[inline]
    pub fn is_capability_set(&self, cap: Capability) -> bool {
        self.capabilities_set & cap.bit() != 0
    }

    #[inline]
    pub fn is_value_set(&self, value: Value) -> bool {
        self.values_set & value.bit() != 0
    }

    #[inline]
    pub fn set_capability_count(&self) -> u32 {
        self.capabilities_set.count_ones()
    }

    #[inline]
    pub fn set_value_count(&self) -> u32 {
        self.values_set.count_ones()
    }

    /// Marks every capability and value as set without changing any of
    /// them. A renderer diffing against a fully-set table re-sends
    /// everything once.
    pub fn mark_all_set(&mut self) {
        self.capabilities_set = CAPABILITY_MASK;
        self.values_set = VALUE_MASK;
    }

    /// Clears all set bits while keeping the current values.
    pub fn reset_set_state(&mut self) {
        self.capabilities_set = 0;
        self.values_set = 0;
    }

    /// Restores `cap` to its default value and clears only its set bit.
    pub fn reset_capability(&mut self, cap: Capability) {
        let default_on = cap == Capability::Dither || cap == Capability::Multisample;
        if default_on {
            self.capabilities |= cap.bit();
        } else {
            self.capabilities &= !cap.bit();
        }
        self.capabilities_set &= !cap.bit();
    }

    /// Restores `value` to its default and clears only its set bit.
    pub fn reset_value(&mut self, value: Value) {
        let defaults = Data::defaults(self.default_width, self.default_height);
        let d = &mut self.data;
        match value {
            Value::BlendColor => d.blend_color = defaults.blend_color,
            Value::BlendEquations => {
                d.rgb_blend_equation = defaults.rgb_blend_equation;
                d.alpha_blend_equation = defaults.alpha_blend_equation;
            }
            Value::BlendFunctions => {
                d.rgb_blend_src = defaults.rgb_blend_src;
                d.rgb_blend_dst = defaults.rgb_blend_dst;
                d.alpha_blend_src = defaults.alpha_blend_src;
                d.alpha_blend_dst = defaults.alpha_blend_dst;
            }
            Value::ClearColor => d.clear_color = defaults.clear_color,
            Value::ClearDepth => d.clear_depth = defaults.clear_depth,
            Value::ClearStencil => d.clear_stencil = defaults.clear_stencil,
            Value::ColorWriteMasks => d.color_write_masks = defaults.color_write_masks,
            Value::CullFaceMode => d.cull_face_mode = defaults.cull_face_mode,
            Value::FrontFaceMode => d.front_face_mode = defaults.front_face_mode,
            Value::DefaultInnerTessellationLevel => {
                d.default_inner_tess_levels = defaults.default_inner_tess_levels
            }
            Value::DefaultOuterTessellationLevel => {
                d.default_outer_tess_levels = defaults.default_outer_tess_levels
            }
            Value::DepthFunction => d.depth_function = defaults.depth_function,
            Value::DepthRange => d.depth_range = defaults.depth_range,
            Value::DepthWriteMask => d.depth_write_mask = defaults.depth_write_mask,
            Value::Hints => d.generate_mipmap_hint = defaults.generate_mipmap_hint,
            Value::LineWidth => d.line_width = defaults.line_width,
            Value::MinSampleShading => d.min_sample_shading = defaults.min_sample_shading,
            Value::PolygonOffset => {
                d.polygon_offset_factor = defaults.polygon_offset_factor;
                d.polygon_offset_units = defaults.polygon_offset_units;
            }
            Value::SampleCoverage => {
                d.sample_coverage_value = defaults.sample_coverage_value;
                d.sample_coverage_inverted = defaults.sample_coverage_inverted;
            }
            Value::ScissorBox => d.scissor_box = defaults.scissor_box,
            Value::StencilFunctions => {
                d.front_stencil = defaults.front_stencil;
                d.back_stencil = defaults.back_stencil;
            }
            Value::StencilOperations => {
                d.front_stencil_actions = defaults.front_stencil_actions;
                d.back_stencil_actions = defaults.back_stencil_actions;
            }
            Value::StencilWriteMasks => {
                d.front_stencil_write_mask = defaults.front_stencil_write_mask;
                d.back_stencil_write_mask = defaults.back_stencil_write_mask;
            }
            Value::Viewport => d.viewport = defaults.viewport,
        }
        self.values_set &= !value.bit();
    }

    // ------------------------------------------------------------------
    // Capabilities.
    // ------------------------------------------------------------------

    pub fn enable(&mut self, cap: Capability, enabled: bool) {
        if enabled {
            self.capabilities |= cap.bit();
        } else {
            self.capabilities &= !cap.bit();
        }
        self.capabilities_set |= cap.bit();
    }

    #[inline]
    pub fn is_enabled(&self, cap: Capability) -> bool {
        self.capabilities & cap.bit() != 0
    }

    pub fn enabled_count(&self) -> u32 {
        self.capabilities.count_ones()
    }

    /// True when both tables hold identical capability values, set or not.
    pub fn are_capabilities_same(lhs: &StateTable, rhs: &StateTable) -> bool {
        lhs.capabilities == rhs.capabilities
    }

    // ------------------------------------------------------------------
    // Enforcement.
    // ------------------------------------------------------------------

    /// An enforced table makes `merge_*` treat capability merges as always
    /// necessary, and makes renderers re-issue state even when it matches
    /// their GL mirror.
    pub fn set_enforced(&mut self, enforced: bool) {
        self.enforced = enforced;
    }

    #[inline]
    pub fn is_enforced(&self) -> bool {
        self.enforced
    }

    // ------------------------------------------------------------------
    // Merging.
    // ------------------------------------------------------------------

    /// Copies into `self` every entry of `other` whose set bit is on in
    /// `state_to_test`, marking those entries set in `self`.
    pub fn merge_values_from(&mut self, other: &StateTable, state_to_test: &StateTable) {
        self.merge(other, state_to_test, VALUE_MASK);
    }

    /// Like [`merge_values_from`](Self::merge_values_from) but never copies
    /// frame-scoped values (clear color/depth/stencil, color and stencil
    /// write masks, scissor box). Used on the restore half of traversal so
    /// a node cannot leak frame setup into its parent.
    pub fn merge_non_clear_values_from(&mut self, other: &StateTable, state_to_test: &StateTable) {
        self.merge(other, state_to_test, VALUE_MASK & !FRAME_VALUE_BITS);
    }

    fn merge(&mut self, other: &StateTable, state_to_test: &StateTable, value_filter: u32) {
        let cap_mask = state_to_test.capabilities_set;
        if cap_mask != 0
            && (!StateTable::are_capabilities_same(self, other) || state_to_test.is_enforced())
        {
            self.capabilities = (self.capabilities & !cap_mask) | (other.capabilities & cap_mask);
            self.capabilities_set |= cap_mask;
        }

        let mask = state_to_test.values_set & value_filter;
        if mask == 0 {
            return;
        }
        for &value in Value::ALL.iter() {
            if mask & value.bit() != 0 {
                self.copy_value(other, value);
            }
        }
        self.values_set |= mask;
    }

    fn copy_value(&mut self, other: &StateTable, value: Value) {
        let s = &other.data;
        let d = &mut self.data;
        match value {
            Value::BlendColor => d.blend_color = s.blend_color,
            Value::BlendEquations => {
                d.rgb_blend_equation = s.rgb_blend_equation;
                d.alpha_blend_equation = s.alpha_blend_equation;
            }
            Value::BlendFunctions => {
                d.rgb_blend_src = s.rgb_blend_src;
                d.rgb_blend_dst = s.rgb_blend_dst;
                d.alpha_blend_src = s.alpha_blend_src;
                d.alpha_blend_dst = s.alpha_blend_dst;
            }
            Value::ClearColor => d.clear_color = s.clear_color,
            Value::ClearDepth => d.clear_depth = s.clear_depth,
            Value::ClearStencil => d.clear_stencil = s.clear_stencil,
            Value::ColorWriteMasks => d.color_write_masks = s.color_write_masks,
            Value::CullFaceMode => d.cull_face_mode = s.cull_face_mode,
            Value::FrontFaceMode => d.front_face_mode = s.front_face_mode,
            Value::DefaultInnerTessellationLevel => {
                d.default_inner_tess_levels = s.default_inner_tess_levels
            }
            Value::DefaultOuterTessellationLevel => {
                d.default_outer_tess_levels = s.default_outer_tess_levels
            }
            Value::DepthFunction => d.depth_function = s.depth_function,
            Value::DepthRange => d.depth_range = s.depth_range,
            Value::DepthWriteMask => d.depth_write_mask = s.depth_write_mask,
            Value::Hints => d.generate_mipmap_hint = s.generate_mipmap_hint,
            Value::LineWidth => d.line_width = s.line_width,
            Value::MinSampleShading => d.min_sample_shading = s.min_sample_shading,
            Value::PolygonOffset => {
                d.polygon_offset_factor = s.polygon_offset_factor;
                d.polygon_offset_units = s.polygon_offset_units;
            }
            Value::SampleCoverage => {
                d.sample_coverage_value = s.sample_coverage_value;
                d.sample_coverage_inverted = s.sample_coverage_inverted;
            }
            Value::ScissorBox => d.scissor_box = s.scissor_box,
            Value::StencilFunctions => {
                d.front_stencil = s.front_stencil;
                d.back_stencil = s.back_stencil;
            }
            Value::StencilOperations => {
                d.front_stencil_actions = s.front_stencil_actions;
                d.back_stencil_actions = s.back_stencil_actions;
            }
            Value::StencilWriteMasks => {
                d.front_stencil_write_mask = s.front_stencil_write_mask;
                d.back_stencil_write_mask = s.back_stencil_write_mask;
            }
            Value::Viewport => d.viewport = s.viewport,
        }
    }

    /// True when `self` and `other` hold the same value for `value`,
    /// ignoring set bits. Renderers use this to elide redundant GL calls.
    pub fn is_value_equal(&self, other: &StateTable, value: Value) -> bool {
        let a = &self.data;
        let b = &other.data;
        match value {
            Value::BlendColor => a.blend_color == b.blend_color,
            Value::BlendEquations => {
                a.rgb_blend_equation == b.rgb_blend_equation
                    && a.alpha_blend_equation == b.alpha_blend_equation
            }
            Value::BlendFunctions => {
                a.rgb_blend_src == b.rgb_blend_src
                    && a.rgb_blend_dst == b.rgb_blend_dst
                    && a.alpha_blend_src == b.alpha_blend_src
                    && a.alpha_blend_dst == b.alpha_blend_dst
            }
            Value::ClearColor => a.clear_color == b.clear_color,
            Value::ClearDepth => a.clear_depth == b.clear_depth,
            Value::ClearStencil => a.clear_stencil == b.clear_stencil,
            Value::ColorWriteMasks => a.color_write_masks == b.color_write_masks,
            Value::CullFaceMode => a.cull_face_mode == b.cull_face_mode,
            Value::FrontFaceMode => a.front_face_mode == b.front_face_mode,
            Value::DefaultInnerTessellationLevel => {
                a.default_inner_tess_levels == b.default_inner_tess_levels
            }
            Value::DefaultOuterTessellationLevel => {
                a.default_outer_tess_levels == b.default_outer_tess_levels
            }
            Value::DepthFunction => a.depth_function == b.depth_function,
            Value::DepthRange => a.depth_range == b.depth_range,
            Value::DepthWriteMask => a.depth_write_mask == b.depth_write_mask,
            Value::Hints => a.generate_mipmap_hint == b.generate_mipmap_hint,
            Value::LineWidth => a.line_width == b.line_width,
            Value::MinSampleShading => a.min_sample_shading == b.min_sample_shading,
            Value::PolygonOffset => {
                a.polygon_offset_factor == b.polygon_offset_factor
                    && a.polygon_offset_units == b.polygon_offset_units
            }
            Value::SampleCoverage => {
                a.sample_coverage_value == b.sample_coverage_value
                    && a.sample_coverage_inverted == b.sample_coverage_inverted
            }
            Value::ScissorBox => a.scissor_box == b.scissor_box,
            Value::StencilFunctions => {
                a.front_stencil == b.front_stencil && a.back_stencil == b.back_stencil
            }
            Value::StencilOperations => {
                a.front_stencil_actions == b.front_stencil_actions
                    && a.back_stencil_actions == b.back_stencil_actions
            }
            Value::StencilWriteMasks => {
                a.front_stencil_write_mask == b.front_stencil_write_mask
                    && a.back_stencil_write_mask == b.back_stencil_write_mask
            }
            Value::Viewport => a.viewport == b.viewport,
        }
    }

    // ------------------------------------------------------------------
    // Value setters and getters. Every setter marks the value set.
    // ------------------------------------------------------------------

    pub fn set_blend_color(&mut self, color: Vector4<f32>) {
        self.data.blend_color = color;
        self.values_set |= Value::BlendColor.bit();
    }

    pub fn blend_color(&self) -> Vector4<f32> {
        self.data.blend_color
    }

    pub fn set_blend_equations(&mut self, rgb: BlendEquation, alpha: BlendEquation) {
        self.data.rgb_blend_equation = rgb;
        self.data.alpha_blend_equation = alpha;
        self.values_set |= Value::BlendEquations.bit();
    }

    pub fn rgb_blend_equation(&self) -> BlendEquation {
        self.data.rgb_blend_equation
    }

    pub fn alpha_blend_equation(&self) -> BlendEquation {
        self.data.alpha_blend_equation
    }

    pub fn set_blend_functions(
        &mut self,
        rgb_src: BlendFunctionFactor,
        rgb_dst: BlendFunctionFactor,
        alpha_src: BlendFunctionFactor,
        alpha_dst: BlendFunctionFactor,
    ) {
        self.data.rgb_blend_src = rgb_src;
        self.data.rgb_blend_dst = rgb_dst;
        self.data.alpha_blend_src = alpha_src;
        self.data.alpha_blend_dst = alpha_dst;
        self.values_set |= Value::BlendFunctions.bit();
    }

    pub fn rgb_blend_functions(&self) -> (BlendFunctionFactor, BlendFunctionFactor) {
        (self.data.rgb_blend_src, self.data.rgb_blend_dst)
    }

    pub fn alpha_blend_functions(&self) -> (BlendFunctionFactor, BlendFunctionFactor) {
        (self.data.alpha_blend_src, self.data.alpha_blend_dst)
    }

    pub fn set_clear_color(&mut self, color: Vector4<f32>) {
        self.data.clear_color = color;
        self.values_set |= Value::ClearColor.bit();
    }

    pub fn clear_color(&self) -> Vector4<f32> {
        self.data.clear_color
    }

    pub fn set_clear_depth(&mut self, depth: f32) {
        self.data.clear_depth = depth;
        self.values_set |= Value::ClearDepth.bit();
    }

    pub fn clear_depth(&self) -> f32 {
        self.data.clear_depth
    }

    pub fn set_clear_stencil(&mut self, stencil: i32) {
        self.data.clear_stencil = stencil;
        self.values_set |= Value::ClearStencil.bit();
    }

    pub fn clear_stencil(&self) -> i32 {
        self.data.clear_stencil
    }

    pub fn set_color_write_masks(&mut self, red: bool, green: bool, blue: bool, alpha: bool) {
        self.data.color_write_masks = [red, green, blue, alpha];
        self.values_set |= Value::ColorWriteMasks.bit();
    }

    pub fn color_write_masks(&self) -> [bool; 4] {
        self.data.color_write_masks
    }

    pub fn set_cull_face_mode(&mut self, mode: CullFaceMode) {
        self.data.cull_face_mode = mode;
        self.values_set |= Value::CullFaceMode.bit();
    }

    pub fn cull_face_mode(&self) -> CullFaceMode {
        self.data.cull_face_mode
    }

    pub fn set_front_face_mode(&mut self, mode: FrontFaceMode) {
        self.data.front_face_mode = mode;
        self.values_set |= Value::FrontFaceMode.bit();
    }

    pub fn front_face_mode(&self) -> FrontFaceMode {
        self.data.front_face_mode
    }

    pub fn set_default_inner_tessellation_level(&mut self, levels: [f32; 2]) {
        self.data.default_inner_tess_levels = levels;
        self.values_set |= Value::DefaultInnerTessellationLevel.bit();
    }

    pub fn default_inner_tessellation_level(&self) -> [f32; 2] {
        self.data.default_inner_tess_levels
    }

    pub fn set_default_outer_tessellation_level(&mut self, levels: [f32; 4]) {
        self.data.default_outer_tess_levels = levels;
        self.values_set |= Value::DefaultOuterTessellationLevel.bit();
    }

    pub fn default_outer_tessellation_level(&self) -> [f32; 4] {
        self.data.default_outer_tess_levels
    }

    pub fn set_depth_function(&mut self, function: DepthFunction) {
        self.data.depth_function = function;
        self.values_set |= Value::DepthFunction.bit();
    }

    pub fn depth_function(&self) -> DepthFunction {
        self.data.depth_function
    }

    pub fn set_depth_range(&mut self, range: Vector2<f32>) {
        self.data.depth_range = range;
        self.values_set |= Value::DepthRange.bit();
    }

    pub fn depth_range(&self) -> Vector2<f32> {
        self.data.depth_range
    }

    pub fn set_depth_write_mask(&mut self, mask: bool) {
        self.data.depth_write_mask = mask;
        self.values_set |= Value::DepthWriteMask.bit();
    }

    pub fn depth_write_mask(&self) -> bool {
        self.data.depth_write_mask
    }

    pub fn set_hint(&mut self, target: HintTarget, mode: HintMode) {
        match target {
            HintTarget::GenerateMipmap => self.data.generate_mipmap_hint = mode,
        }
        self.values_set |= Value::Hints.bit();
    }

    pub fn hint(&self, target: HintTarget) -> HintMode {
        match target {
            HintTarget::GenerateMipmap => self.data.generate_mipmap_hint,
        }
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.data.line_width = width;
        self.values_set |= Value::LineWidth.bit();
    }

    pub fn line_width(&self) -> f32 {
        self.data.line_width
    }

    pub fn set_min_sample_shading(&mut self, fraction: f32) {
        self.data.min_sample_shading = fraction;
        self.values_set |= Value::MinSampleShading.bit();
    }

    pub fn min_sample_shading(&self) -> f32 {
        self.data.min_sample_shading
    }

    pub fn set_polygon_offset(&mut self, factor: f32, units: f32) {
        self.data.polygon_offset_factor = factor;
        self.data.polygon_offset_units = units;
        self.values_set |= Value::PolygonOffset.bit();
    }

    pub fn polygon_offset(&self) -> (f32, f32) {
        (
            self.data.polygon_offset_factor,
            self.data.polygon_offset_units,
        )
    }

    pub fn set_sample_coverage(&mut self, value: f32, inverted: bool) {
        self.data.sample_coverage_value = value;
        self.data.sample_coverage_inverted = inverted;
        self.values_set |= Value::SampleCoverage.bit();
    }

    pub fn sample_coverage(&self) -> (f32, bool) {
        (
            self.data.sample_coverage_value,
            self.data.sample_coverage_inverted,
        )
    }

    pub fn set_scissor_box(&mut self, rect: Rect) {
        self.data.scissor_box = rect;
        self.values_set |= Value::ScissorBox.bit();
    }

    pub fn scissor_box(&self) -> Rect {
        self.data.scissor_box
    }

    pub fn set_stencil_functions(&mut self, front: StencilSide, back: StencilSide) {
        self.data.front_stencil = front;
        self.data.back_stencil = back;
        self.values_set |= Value::StencilFunctions.bit();
    }

    pub fn stencil_functions(&self) -> (StencilSide, StencilSide) {
        (self.data.front_stencil, self.data.back_stencil)
    }

    pub fn set_stencil_operations(&mut self, front: StencilActions, back: StencilActions) {
        self.data.front_stencil_actions = front;
        self.data.back_stencil_actions = back;
        self.values_set |= Value::StencilOperations.bit();
    }

    pub fn stencil_operations(&self) -> (StencilActions, StencilActions) {
        (
            self.data.front_stencil_actions,
            self.data.back_stencil_actions,
        )
    }

    pub fn set_stencil_write_masks(&mut self, front: u32, back: u32) {
        self.data.front_stencil_write_mask = front;
        self.data.back_stencil_write_mask = back;
        self.values_set |= Value::StencilWriteMasks.bit();
    }

    pub fn stencil_write_masks(&self) -> (u32, u32) {
        (
            self.data.front_stencil_write_mask,
            self.data.back_stencil_write_mask,
        )
    }

    pub fn set_viewport(&mut self, rect: Rect) {
        self.data.viewport = rect;
        self.values_set |= Value::Viewport.bit();
    }

    pub fn viewport(&self) -> Rect {
        self.data.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_value_keeps_other_set_bits() {
        let mut st = StateTable::new(64, 64);
        st.set_line_width(2.0);
        st.set_clear_depth(0.5);
        st.reset_value(Value::LineWidth);

        assert!(!st.is_value_set(Value::LineWidth));
        assert_eq!(st.line_width(), 1.0);
        assert!(st.is_value_set(Value::ClearDepth));
        assert_eq!(st.clear_depth(), 0.5);
    }

    #[test]
    fn reset_capability_restores_defaults() {
        let mut st = StateTable::default();
        st.enable(Capability::Dither, false);
        st.enable(Capability::Blend, true);

        st.reset_capability(Capability::Dither);
        st.reset_capability(Capability::Blend);

        assert!(st.is_enabled(Capability::Dither));
        assert!(!st.is_enabled(Capability::Blend));
        assert!(!st.is_capability_set(Capability::Dither));
        assert!(!st.is_capability_set(Capability::Blend));
    }

    #[test]
    fn clip_distance_lookup() {
        assert_eq!(Capability::clip_distance(0), Capability::ClipDistance0);
        assert_eq!(Capability::clip_distance(7), Capability::ClipDistance7);
    }

    #[test]
    fn mark_all_set_counts() {
        let mut st = StateTable::default();
        assert_eq!(st.set_capability_count(), 0);
        assert_eq!(st.set_value_count(), 0);
        st.mark_all_set();
        assert_eq!(st.set_capability_count(), CAPABILITY_COUNT as u32);
        assert_eq!(st.set_value_count(), VALUE_COUNT as u32);
        st.reset_set_state();
        assert_eq!(st.set_capability_count(), 0);
    }
}
