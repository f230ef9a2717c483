use std::collections::BTreeSet;
use std::{error, fmt};

use crate::dag;
use crate::emit::{self, OutputBinding};
use crate::io::{ShaderLayout, ShaderOutput};
use crate::ir::{Atom, Node, Opcode};

/// Shader translation errors
#[derive(Debug, Clone)]
pub enum Error {
    UnknownOpcode(Opcode),
    UnknownType(Opcode),
    Malformed(&'static str),
    ComponentIndex(i32),
    DuplicateIntrinsic,
    DuplicateOutputBinding(i32),
    MissingOutputType(i32),
    PushConstantConflict { member: i32, offset: i32 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOpcode(op) => write!(f, "unsupported opcode `{op:?}` during emission"),
            Self::UnknownType(op) => write!(f, "could not map type `{op:?}`"),
            Self::Malformed(what) => write!(f, "malformed node: {what}"),
            Self::ComponentIndex(index) => write!(f, "component index `{index}` out of range"),
            Self::DuplicateIntrinsic => write!(f, "more than one vertex intrinsic output"),
            Self::DuplicateOutputBinding(binding) => {
                write!(f, "duplicate output binding `{binding}`")
            }
            Self::MissingOutputType(binding) => {
                write!(f, "no element type supplied for output binding `{binding}`")
            }
            Self::PushConstantConflict { member, offset } => write!(
                f,
                "conflicting push-constant member `{member}` at offset `{offset}`"
            ),
        }
    }
}

impl error::Error for Error {}

/// Shader stage selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
    Compute,
}

/// Translates a shader body into GLSL 450 source.
///
/// The body runs once over default-constructed arguments; operator
/// overloading on the wrapper types builds the expression tree rooted at
/// each output. The outputs are unified under a single root, compressed
/// into a DAG, and emitted. Translation is a pure function of the body and
/// stage: repeated calls yield byte-identical source.
///
/// ```
/// use glsl_embed::{LayoutInput, Stage, Vec2, Vec4, VertexIntrinsics, translate};
///
/// let source = translate(
///     Stage::Vertex,
///     |(position, vertex): &mut (LayoutInput<Vec2, 0>, VertexIntrinsics)| {
///         vertex.gl_position = Vec4::with_vec2(position.get(), 0.0, 1.0);
///     },
/// )
/// .unwrap();
/// assert!(source.starts_with("#version 450\n"));
/// ```
pub fn translate<A>(stage: Stage, body: impl FnOnce(&mut A)) -> Result<String, Error>
where
    A: ShaderLayout,
{
    let mut args = A::default();
    body(&mut args);

    let mut gathered = Vec::new();
    args.gather(&mut gathered);

    let mut position = None;
    let mut outputs = Vec::new();
    let mut bindings = Vec::new();
    let mut seen = BTreeSet::new();
    for output in gathered {
        match output {
            ShaderOutput::Layout { ty, binding, value } => {
                if !seen.insert(binding) {
                    return Err(Error::DuplicateOutputBinding(binding));
                }
                bindings.push(OutputBinding { ty, binding });
                outputs.push(Node::new(
                    Atom::Op(Opcode::LayoutOutput),
                    value.cexpr,
                    vec![Node::constant(Atom::Int(binding)), value],
                ));
            }
            ShaderOutput::Position(value) => {
                // The vertex intrinsic only exists in the Vertex stage
                if stage != Stage::Vertex {
                    continue;
                }
                if position.is_some() {
                    return Err(Error::DuplicateIntrinsic);
                }
                position = Some(Node::new(
                    Atom::Op(Opcode::GlPosition),
                    value.cexpr,
                    vec![value],
                ));
            }
        }
    }

    // gl_Position leads the unified output list; layout outputs follow in
    // argument order
    let mut children = Vec::with_capacity(outputs.len() + 1);
    children.extend(position);
    children.extend(outputs);

    let cexpr = children.iter().all(|c| c.cexpr);
    let unified = Node::new(Atom::Op(Opcode::None), cexpr, children);
    log::debug!("unified tree for {stage:?} shader:\n{unified}");

    let graph = dag::compress(&unified);
    log::debug!("compressed graph, {} nodes:\n{graph}", graph.len());

    emit::generate(&graph, &bindings)
}
