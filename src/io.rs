use std::marker::PhantomData;

use bitflags::bitflags;

use crate::ir::{Atom, Comp, Node, Opcode};
use crate::types::{F32, ShaderType, Vec4, VectorType};

bitflags! {
    /// Classification of a shader-interface marker.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IoKind: u8 {
        const INPUT = 1;
        const OUTPUT = 1 << 1;
        const LAYOUT = 1 << 2;
        const PUSH_CONSTANT = 1 << 3;
    }
}

/// One collected shader output.
#[derive(Debug, Clone)]
pub enum ShaderOutput {
    /// A layout-qualified output slot
    Layout {
        ty: Opcode,
        binding: i32,
        value: Node,
    },
    /// The vertex position intrinsic
    Position(Node),
}

/// A single shader-interface marker: input or output slot, intrinsic
/// block, or push-constant block.
pub trait ShaderSlot: Default {
    const KIND: IoKind;

    /// Contributes this slot's outputs, if any.
    fn gather(&self, _sink: &mut Vec<ShaderOutput>) {}
}

/// A complete shader argument list; implemented for single output markers
/// and for tuples of up to eight markers.
pub trait ShaderLayout: Default {
    fn gather(&self, sink: &mut Vec<ShaderOutput>);
}

fn gather_slot<T: ShaderSlot>(slot: &T, sink: &mut Vec<ShaderOutput>) {
    if T::KIND.contains(IoKind::OUTPUT) {
        slot.gather(sink);
    }
}

macro_rules! tuple_shader_layout {
    ($($name:ident),+) => {
        impl<$($name: ShaderSlot),+> ShaderLayout for ($($name,)+) {
            fn gather(&self, sink: &mut Vec<ShaderOutput>) {
                #[allow(non_snake_case)]
                let ($($name,)+) = self;
                $(gather_slot($name, sink);)+
            }
        }
    };
}

tuple_shader_layout!(A);
tuple_shader_layout!(A, B);
tuple_shader_layout!(A, B, C);
tuple_shader_layout!(A, B, C, D);
tuple_shader_layout!(A, B, C, D, E);
tuple_shader_layout!(A, B, C, D, E, F);
tuple_shader_layout!(A, B, C, D, E, F, G);
tuple_shader_layout!(A, B, C, D, E, F, G, H);

/// A layout-qualified shader input at binding `B`.
///
/// Zero-sized; reading it builds a fresh `LayoutInput` leaf each time.
#[derive(Debug, Clone)]
pub struct LayoutInput<T, const B: i32> {
    _marker: PhantomData<T>,
}

impl<T, const B: i32> Default for LayoutInput<T, B> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: ShaderType, const B: i32> LayoutInput<T, B> {
    pub const BINDING: i32 = B;

    fn leaf() -> Node {
        Node::variable_with(
            Atom::Op(Opcode::LayoutInput),
            vec![
                Node::constant(Atom::Op(T::OPCODE)),
                Node::constant(Atom::Int(B)),
            ],
        )
    }

    /// Reads the whole input value.
    #[must_use]
    pub fn get(&self) -> T {
        T::from_node(Self::leaf())
    }
}

impl<T: VectorType, const B: i32> LayoutInput<T, B> {
    /// Reads one component of the input.
    #[must_use]
    pub fn component(&self, c: Comp) -> F32 {
        assert!(
            (c as i32) < T::ARITY,
            "component {c:?} out of range for input binding {B}",
        );
        F32::from_node(Node::variable_with(
            Atom::Op(Opcode::Component),
            vec![Node::constant(Atom::Int(c as i32)), Self::leaf()],
        ))
    }

    #[must_use]
    pub fn x(&self) -> F32 {
        self.component(Comp::X)
    }

    #[must_use]
    pub fn y(&self) -> F32 {
        self.component(Comp::Y)
    }

    #[must_use]
    pub fn z(&self) -> F32 {
        self.component(Comp::Z)
    }

    #[must_use]
    pub fn w(&self) -> F32 {
        self.component(Comp::W)
    }
}

impl<T: ShaderType, const B: i32> ShaderSlot for LayoutInput<T, B> {
    const KIND: IoKind = IoKind::INPUT.union(IoKind::LAYOUT);
}

/// A layout-qualified shader output at binding `B`.
#[derive(Debug, Clone, Default)]
pub struct LayoutOutput<T, const B: i32> {
    value: T,
}

impl<T: ShaderType, const B: i32> LayoutOutput<T, B> {
    pub const BINDING: i32 = B;

    /// Assigns the output value.
    pub fn set(&mut self, value: T) {
        self.value = value;
    }

    #[must_use]
    pub fn get(&self) -> &T {
        &self.value
    }
}

impl<T: ShaderType + Default, const B: i32> ShaderSlot for LayoutOutput<T, B> {
    const KIND: IoKind = IoKind::OUTPUT.union(IoKind::LAYOUT);

    fn gather(&self, sink: &mut Vec<ShaderOutput>) {
        sink.push(ShaderOutput::Layout {
            ty: T::OPCODE,
            binding: B,
            value: self.value.node().clone(),
        });
    }
}

impl<T: ShaderType + Default, const B: i32> ShaderLayout for LayoutOutput<T, B> {
    fn gather(&self, sink: &mut Vec<ShaderOutput>) {
        gather_slot(self, sink);
    }
}

/// Predefined vertex-stage outputs.
#[derive(Debug, Clone, Default)]
pub struct VertexIntrinsics {
    pub gl_position: Vec4,
}

impl ShaderSlot for VertexIntrinsics {
    const KIND: IoKind = IoKind::OUTPUT;

    fn gather(&self, sink: &mut Vec<ShaderOutput>) {
        sink.push(ShaderOutput::Position(self.gl_position.node().clone()));
    }
}

impl ShaderLayout for VertexIntrinsics {
    fn gather(&self, sink: &mut Vec<ShaderOutput>) {
        gather_slot(self, sink);
    }
}

/// Member registration handle for the single push-constant block of a
/// shader.
///
/// Members receive sequential indices and a running byte offset advanced
/// by each element type's GPU size. Declare a block as a struct whose
/// `Default` impl registers every member in order:
///
/// ```
/// use glsl_embed::{IoKind, Mat4, PushConstants, ShaderSlot};
///
/// struct Mvp {
///     model: Mat4,
///     view: Mat4,
///     proj: Mat4,
/// }
///
/// impl Default for Mvp {
///     fn default() -> Self {
///         let mut pc = PushConstants::new();
///         Self {
///             model: pc.register(),
///             view: pc.register(),
///             proj: pc.register(),
///         }
///     }
/// }
///
/// impl ShaderSlot for Mvp {
///     const KIND: IoKind = IoKind::PUSH_CONSTANT;
/// }
/// ```
#[derive(Debug, Default)]
pub struct PushConstants {
    members: i32,
    offset: i32,
}

impl PushConstants {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the next member and returns its value handle.
    pub fn register<T: ShaderType>(&mut self) -> T {
        let size = T::OPCODE
            .gpu_size()
            .unwrap_or_else(|| panic!("push-constant member type {:?} has no GPU size", T::OPCODE));
        let node = Node::variable_with(
            Atom::Op(Opcode::PushConstants),
            vec![
                Node::constant(Atom::Op(T::OPCODE)),
                Node::constant(Atom::Int(self.members)),
                Node::constant(Atom::Int(self.offset)),
            ],
        );
        self.members += 1;
        self.offset += size;
        T::from_node(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Mat4, Vec2, Vec3};

    #[test]
    fn input_reads_build_layout_leaves() {
        let input = LayoutInput::<Vec2, 0>::default();
        let node = input.get().into_node();
        assert_eq!(node.op(), Some(Opcode::LayoutInput));
        assert!(!node.cexpr);
        assert_eq!(node.children[0].op(), Some(Opcode::Vec2));
        assert_eq!(node.children[1].as_int(), Some(0));
    }

    #[test]
    fn input_components_are_preexposed() {
        let input = LayoutInput::<Vec3, 1>::default();
        let node = input.y().into_node();
        assert_eq!(node.op(), Some(Opcode::Component));
        assert_eq!(node.children[0].as_int(), Some(1));
        assert_eq!(node.children[1].op(), Some(Opcode::LayoutInput));
    }

    #[test]
    fn gather_skips_non_outputs() {
        let args = <(
            LayoutInput<Vec2, 0>,
            VertexIntrinsics,
            LayoutOutput<Vec3, 0>,
        )>::default();
        let mut sink = Vec::new();
        args.gather(&mut sink);

        assert_eq!(sink.len(), 2);
        assert!(matches!(sink[0], ShaderOutput::Position(_)));
        assert!(matches!(
            sink[1],
            ShaderOutput::Layout {
                ty: Opcode::Vec3,
                binding: 0,
                ..
            }
        ));
    }

    #[test]
    fn push_constant_offsets_advance_by_gpu_size() {
        let mut pc = PushConstants::new();
        let model: Mat4 = pc.register();
        let view: Mat4 = pc.register();
        let proj: Mat4 = pc.register();

        for (mat, member, offset) in [(model, 0, 0), (view, 1, 64), (proj, 2, 128)] {
            let node = mat.into_node();
            assert_eq!(node.op(), Some(Opcode::PushConstants));
            assert_eq!(node.children[1].as_int(), Some(member));
            assert_eq!(node.children[2].as_int(), Some(offset));
        }
    }

    #[test]
    fn io_kind_masks() {
        assert!(<LayoutInput<Vec2, 0> as ShaderSlot>::KIND.contains(IoKind::LAYOUT));
        assert!(!<LayoutInput<Vec2, 0> as ShaderSlot>::KIND.contains(IoKind::OUTPUT));
        assert!(<VertexIntrinsics as ShaderSlot>::KIND.contains(IoKind::OUTPUT));
    }
}
