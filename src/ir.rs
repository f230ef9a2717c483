use std::fmt;

use num_enum::TryFromPrimitive;

/// Operations and annotations carried by IR nodes.
///
/// This is the closed set the whole pipeline recognizes: structural nodes,
/// primitive type tags, I/O markers, arithmetic, and the vertex intrinsic
/// sink. Anything else reaching the code generator is a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Opcode {
    /// Aggregate construction; children are `[type, count, values...]`
    /// (scalar forms omit the count)
    Construct,
    /// Component extraction; children are `[index, aggregate]`
    Component,

    Int32,
    Float32,
    Vec2,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
    /// Untyped sentinel; the root node that unifies all shader outputs
    None,

    /// Shader input slot; children are `[element type, binding]`
    LayoutInput,
    /// Shader output slot; children are `[binding, value]`
    LayoutOutput,
    /// Push-constant member; children are `[element type, member, offset]`
    PushConstants,

    Add,
    Sub,
    Mul,
    Div,

    /// Vertex position sink; single child is the Vec4-typed value
    GlPosition,
}

impl Opcode {
    /// GLSL spelling of a primitive type opcode.
    #[must_use]
    pub fn glsl_name(self) -> Option<&'static str> {
        match self {
            Self::Int32 => Some("int"),
            Self::Float32 => Some("float"),
            Self::Vec2 => Some("vec2"),
            Self::Vec3 => Some("vec3"),
            Self::Vec4 => Some("vec4"),
            Self::Mat3 => Some("mat3"),
            Self::Mat4 => Some("mat4"),
            _ => None,
        }
    }

    /// std140-style size in bytes, used for push-constant packing.
    ///
    /// Vec3 is packed as 12 bytes; hardware alignment caveats are out of
    /// scope here.
    #[must_use]
    pub fn gpu_size(self) -> Option<i32> {
        match self {
            Self::Float32 => Some(4),
            Self::Vec2 => Some(8),
            Self::Vec3 => Some(12),
            Self::Vec4 => Some(16),
            Self::Mat3 => Some(48),
            Self::Mat4 => Some(64),
            _ => None,
        }
    }

    /// Number of scalar components of a vector type opcode.
    #[must_use]
    pub fn vector_arity(self) -> Option<i32> {
        match self {
            Self::Vec2 => Some(2),
            Self::Vec3 => Some(3),
            Self::Vec4 => Some(4),
            _ => None,
        }
    }

    /// Element type of a vector type opcode.
    #[must_use]
    pub fn scalar_of(self) -> Option<Opcode> {
        match self {
            Self::Vec2 | Self::Vec3 | Self::Vec4 => Some(Self::Float32),
            _ => None,
        }
    }
}

/// Named vector component index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum Comp {
    X = 0,
    Y = 1,
    Z = 2,
    W = 3,
}

impl Comp {
    /// GLSL member-access suffix.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::X => ".x",
            Self::Y => ".y",
            Self::Z => ".z",
            Self::W => ".w",
        }
    }
}

/// The payload of a single IR node.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    /// 32-bit integer literal (also argument counts, bindings, indices)
    Int(i32),
    /// 32-bit float literal
    Float(f32),
    /// Operation or annotation
    Op(Opcode),
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(x) => write!(f, "{x}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Op(op) => write!(f, "{op:?}"),
        }
    }
}

/// A node of the symbolic expression tree.
///
/// Nodes are built by the front-end surface types and consumed tree-at-once
/// by the folder, the DAG compressor and the code generator; once handed
/// downstream a node is never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub atom: Atom,
    /// True iff the entire subtree denotes a compile-time constant
    pub cexpr: bool,
    pub children: Vec<Node>,
}

impl Node {
    #[must_use]
    pub fn new(atom: Atom, cexpr: bool, children: Vec<Node>) -> Self {
        Self {
            atom,
            cexpr,
            children,
        }
    }

    /// Constant leaf.
    #[must_use]
    pub fn constant(atom: Atom) -> Self {
        Self::new(atom, true, Vec::new())
    }

    /// Constant node with children.
    #[must_use]
    pub fn constant_with(atom: Atom, children: Vec<Node>) -> Self {
        Self::new(atom, true, children)
    }

    /// Runtime-valued leaf.
    #[must_use]
    pub fn variable(atom: Atom) -> Self {
        Self::new(atom, false, Vec::new())
    }

    /// Runtime-valued node with children.
    #[must_use]
    pub fn variable_with(atom: Atom, children: Vec<Node>) -> Self {
        Self::new(atom, false, children)
    }

    /// If the payload is an opcode, returns it.
    #[must_use]
    pub fn op(&self) -> Option<Opcode> {
        match self.atom {
            Atom::Op(op) => Some(op),
            _ => None,
        }
    }

    /// If the payload is an integer literal, returns it.
    #[must_use]
    pub fn as_int(&self) -> Option<i32> {
        match self.atom {
            Atom::Int(x) => Some(x),
            _ => None,
        }
    }

    /// If the payload is a float literal, returns it.
    #[must_use]
    pub fn as_float(&self) -> Option<f32> {
        match self.atom {
            Atom::Float(x) => Some(x),
            _ => None,
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        write!(
            f,
            "{:indent$}({}: {})",
            "",
            self.atom,
            if self.cexpr { "const" } else { "var" },
        )?;
        for child in &self.children {
            writeln!(f)?;
            child.fmt_indented(f, indent + 4)?;
        }
        Ok(())
    }
}

/// Indented tree dump, one node per line.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
