//! Embedded GLSL shader compiler
//!
//! Shader bodies are ordinary Rust closures over typed wrapper values;
//! running one builds a symbolic expression tree, which is constant-folded,
//! compressed into a DAG, and emitted as GLSL 450 source.

/// Stage dispatch and translation entry point
pub mod compile;
/// Common-subexpression compression
pub mod dag;
/// Statement emission and source assembly
pub mod emit;
/// Constant-expression folding
pub mod fold;
/// Shader interface markers
pub mod io;
/// Symbolic IR definitions
pub mod ir;
/// Front-end scalar/vector/matrix wrappers
pub mod types;

pub use self::compile::{Error, Stage, translate};
pub use self::dag::{Dag, compress};
pub use self::emit::{OutputBinding, generate};
pub use self::io::{
    IoKind, LayoutInput, LayoutOutput, PushConstants, ShaderLayout, ShaderOutput, ShaderSlot,
    VertexIntrinsics,
};
pub use self::ir::{Atom, Comp, Node, Opcode};
pub use self::types::{F32, Mat3, Mat4, ScalarArg, ShaderType, Vec2, Vec3, Vec4, VectorType};
