use std::ops;

use crate::fold;
use crate::ir::{Atom, Comp, Node, Opcode};

/// A front-end wrapper over a single IR node.
///
/// Wrapper values never compute numerically; every operation on them builds
/// symbolic nodes. Conversion to the node is cheap and implicit at the
/// seams (`into_node`), construction from a node is explicit.
pub trait ShaderType: Sized {
    /// Element type opcode of this wrapper
    const OPCODE: Opcode;

    fn from_node(node: Node) -> Self;
    fn node(&self) -> &Node;
    fn into_node(self) -> Node;
}

/// Wrappers with named scalar components.
pub trait VectorType: ShaderType {
    const ARITY: i32;
}

impl VectorType for Vec2 {
    const ARITY: i32 = 2;
}

impl VectorType for Vec3 {
    const ARITY: i32 = 3;
}

impl VectorType for Vec4 {
    const ARITY: i32 = 4;
}

/// A scalar argument to a constructor: either a raw float literal or an
/// already-built scalar expression.
pub trait ScalarArg {
    fn scalar_node(self) -> Node;
}

impl ScalarArg for f32 {
    fn scalar_node(self) -> Node {
        Node::constant(Atom::Float(self))
    }
}

impl ScalarArg for F32 {
    fn scalar_node(self) -> Node {
        self.into_node()
    }
}

macro_rules! shader_type {
    ($(#[$attr:meta])* $name:ident => $opcode:ident) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            node: Node,
        }

        impl ShaderType for $name {
            const OPCODE: Opcode = Opcode::$opcode;

            fn from_node(node: Node) -> Self {
                Self { node }
            }

            fn node(&self) -> &Node {
                &self.node
            }

            fn into_node(self) -> Node {
                self.node
            }
        }

        impl From<$name> for Node {
            fn from(value: $name) -> Node {
                value.node
            }
        }
    };
}

shader_type!(
    /// 32-bit float scalar
    F32 => Float32
);
shader_type!(
    /// Two-component float vector
    Vec2 => Vec2
);
shader_type!(
    /// Three-component float vector
    Vec3 => Vec3
);
shader_type!(
    /// Four-component float vector
    Vec4 => Vec4
);
shader_type!(
    /// 3x3 float matrix
    Mat3 => Mat3
);
shader_type!(
    /// 4x4 float matrix
    Mat4 => Mat4
);

/// Builds a `Construct` node; scalar forms pass `count: None`.
fn construct(ty: Opcode, count: Option<i32>, values: Vec<Node>) -> Node {
    let cexpr = values.iter().all(|v| v.cexpr);
    let mut children = Vec::with_capacity(values.len() + 2);
    children.push(Node::constant(Atom::Op(ty)));
    if let Some(count) = count {
        children.push(Node::constant(Atom::Int(count)));
    }
    children.extend(values);
    Node::new(Atom::Op(Opcode::Construct), cexpr, children)
}

impl F32 {
    #[must_use]
    pub fn new(x: f32) -> Self {
        Self::from_node(construct(Opcode::Float32, None, vec![x.scalar_node()]))
    }
}

impl From<f32> for F32 {
    fn from(x: f32) -> Self {
        Self::new(x)
    }
}

impl Default for F32 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Vec2 {
    #[must_use]
    pub fn new(x: impl ScalarArg, y: impl ScalarArg) -> Self {
        Self::from_node(construct(
            Opcode::Vec2,
            Some(2),
            vec![x.scalar_node(), y.scalar_node()],
        ))
    }
}

impl Default for Vec2 {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Vec3 {
    #[must_use]
    pub fn new(x: impl ScalarArg, y: impl ScalarArg, z: impl ScalarArg) -> Self {
        Self::from_node(construct(
            Opcode::Vec3,
            Some(3),
            vec![x.scalar_node(), y.scalar_node(), z.scalar_node()],
        ))
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

impl Vec4 {
    #[must_use]
    pub fn new(x: impl ScalarArg, y: impl ScalarArg, z: impl ScalarArg, w: impl ScalarArg) -> Self {
        Self::from_node(construct(
            Opcode::Vec4,
            Some(4),
            vec![
                x.scalar_node(),
                y.scalar_node(),
                z.scalar_node(),
                w.scalar_node(),
            ],
        ))
    }

    /// `vec4(v, z, w)` from a two-component vector.
    #[must_use]
    pub fn with_vec2(v: Vec2, z: impl ScalarArg, w: impl ScalarArg) -> Self {
        Self::from_node(construct(
            Opcode::Vec4,
            Some(3),
            vec![v.into_node(), z.scalar_node(), w.scalar_node()],
        ))
    }

    /// `vec4(v, w)` from a three-component vector.
    #[must_use]
    pub fn with_vec3(v: Vec3, w: impl ScalarArg) -> Self {
        Self::from_node(construct(
            Opcode::Vec4,
            Some(2),
            vec![v.into_node(), w.scalar_node()],
        ))
    }
}

impl Default for Vec4 {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

impl Mat3 {
    /// Diagonal constructor, `mat3(d)`.
    #[must_use]
    pub fn new(diagonal: impl ScalarArg) -> Self {
        Self::from_node(construct(Opcode::Mat3, Some(1), vec![diagonal.scalar_node()]))
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Mat4 {
    /// Diagonal constructor, `mat4(d)`.
    #[must_use]
    pub fn new(diagonal: impl ScalarArg) -> Self {
        Self::from_node(construct(Opcode::Mat4, Some(1), vec![diagonal.scalar_node()]))
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Reads component `index` of `aggregate`, folding constant redexes.
fn read_component(aggregate: &Node, index: i32) -> F32 {
    let node = Node::new(
        Atom::Op(Opcode::Component),
        aggregate.cexpr,
        vec![Node::constant(Atom::Int(index)), aggregate.clone()],
    );
    F32::from_node(fold::forced(node))
}

/// Replaces component `index` by rebuilding the whole aggregate: the new
/// value at `index`, every other slot read back from the previous
/// aggregate. The aggregate's identity changes.
fn rebuild_with_component(aggregate: &mut Node, ty: Opcode, arity: i32, index: i32, value: Node) {
    let previous = aggregate.clone();
    let value = fold::forced(value);
    let cexpr = previous.cexpr && value.cexpr;

    let mut children = Vec::with_capacity(arity as usize + 2);
    children.push(Node::constant(Atom::Op(ty)));
    children.push(Node::constant(Atom::Int(arity)));
    for i in 0..arity {
        if i == index {
            children.push(value.clone());
        } else {
            children.push(fold::forced(Node::new(
                Atom::Op(Opcode::Component),
                previous.cexpr,
                vec![Node::constant(Atom::Int(i)), previous.clone()],
            )));
        }
    }

    *aggregate = Node::new(Atom::Op(Opcode::Construct), cexpr, children);
}

macro_rules! vector_components {
    ($name:ident, $arity:expr, $(($comp:ident, $get:ident, $set:ident)),+) => {
        impl $name {
            /// Reads one component as a scalar.
            #[must_use]
            pub fn component(&self, c: Comp) -> F32 {
                assert!(
                    (c as i32) < $arity,
                    "component {c:?} out of range for {}",
                    stringify!($name),
                );
                read_component(&self.node, c as i32)
            }

            /// Replaces one component, rebuilding the aggregate.
            pub fn set_component(&mut self, c: Comp, value: impl Into<F32>) {
                assert!(
                    (c as i32) < $arity,
                    "component {c:?} out of range for {}",
                    stringify!($name),
                );
                rebuild_with_component(
                    &mut self.node,
                    <Self as ShaderType>::OPCODE,
                    $arity,
                    c as i32,
                    value.into().into_node(),
                );
            }

            $(
                #[must_use]
                pub fn $get(&self) -> F32 {
                    self.component(Comp::$comp)
                }

                pub fn $set(&mut self, value: impl Into<F32>) {
                    self.set_component(Comp::$comp, value);
                }
            )+
        }
    };
}

vector_components!(Vec2, 2, (X, x, set_x), (Y, y, set_y));
vector_components!(Vec3, 3, (X, x, set_x), (Y, y, set_y), (Z, z, set_z));
vector_components!(
    Vec4,
    4,
    (X, x, set_x),
    (Y, y, set_y),
    (Z, z, set_z),
    (W, w, set_w)
);

/// Builds a binary arithmetic node; constant iff both operands are.
pub(crate) fn binary_operation(a: Node, b: Node, op: Opcode) -> Node {
    let cexpr = a.cexpr && b.cexpr;
    Node::new(Atom::Op(op), cexpr, vec![a, b])
}

macro_rules! binop {
    ($trait:ident, $method:ident, $opcode:ident, $lhs:ty, $rhs:ty, $out:ty) => {
        impl ops::$trait<$rhs> for $lhs {
            type Output = $out;

            fn $method(self, rhs: $rhs) -> $out {
                <$out>::from_node(binary_operation(
                    self.into_node(),
                    rhs.into_node(),
                    Opcode::$opcode,
                ))
            }
        }

        impl ops::$trait<&$rhs> for $lhs {
            type Output = $out;

            fn $method(self, rhs: &$rhs) -> $out {
                <$out>::from_node(binary_operation(
                    self.into_node(),
                    rhs.node().clone(),
                    Opcode::$opcode,
                ))
            }
        }

        impl ops::$trait<$rhs> for &$lhs {
            type Output = $out;

            fn $method(self, rhs: $rhs) -> $out {
                <$out>::from_node(binary_operation(
                    self.node().clone(),
                    rhs.into_node(),
                    Opcode::$opcode,
                ))
            }
        }

        impl ops::$trait<&$rhs> for &$lhs {
            type Output = $out;

            fn $method(self, rhs: &$rhs) -> $out {
                <$out>::from_node(binary_operation(
                    self.node().clone(),
                    rhs.node().clone(),
                    Opcode::$opcode,
                ))
            }
        }
    };
}

binop!(Add, add, Add, F32, F32, F32);
binop!(Sub, sub, Sub, F32, F32, F32);
binop!(Mul, mul, Mul, F32, F32, F32);
binop!(Div, div, Div, F32, F32, F32);

binop!(Add, add, Add, Vec2, Vec2, Vec2);
binop!(Sub, sub, Sub, Vec2, Vec2, Vec2);
binop!(Mul, mul, Mul, Vec2, Vec2, Vec2);
binop!(Add, add, Add, Vec3, Vec3, Vec3);
binop!(Sub, sub, Sub, Vec3, Vec3, Vec3);
binop!(Mul, mul, Mul, Vec3, Vec3, Vec3);
binop!(Add, add, Add, Vec4, Vec4, Vec4);
binop!(Sub, sub, Sub, Vec4, Vec4, Vec4);
binop!(Mul, mul, Mul, Vec4, Vec4, Vec4);

binop!(Mul, mul, Mul, Mat3, Mat3, Mat3);
binop!(Mul, mul, Mul, Mat4, Mat4, Mat4);
binop!(Mul, mul, Mul, Mat3, Vec3, Vec3);
binop!(Mul, mul, Mul, Mat4, Vec4, Vec4);

// Scalar times vector only with the scalar on the left: code generation
// types a binary result after its right operand.
binop!(Mul, mul, Mul, F32, Vec2, Vec2);
binop!(Mul, mul, Mul, F32, Vec3, Vec3);
binop!(Mul, mul, Mul, F32, Vec4, Vec4);
