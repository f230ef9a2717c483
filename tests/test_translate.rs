use glsl_embed::{
    Error, F32, IoKind, LayoutInput, LayoutOutput, Mat4, PushConstants, ShaderSlot, Stage, Vec2,
    Vec3, Vec4, VertexIntrinsics, translate,
};

#[test]
fn pass_through_vertex_shader() {
    let source = translate(
        Stage::Vertex,
        |(position, color, vertex, out_color): &mut (
            LayoutInput<Vec2, 0>,
            LayoutInput<Vec3, 1>,
            VertexIntrinsics,
            LayoutOutput<Vec3, 0>,
        )| {
            vertex.gl_position = Vec4::with_vec2(position.get(), 0.0, 1.0);
            out_color.set(color.get());
        },
    )
    .unwrap();

    assert_eq!(
        source,
        "#version 450\n\
         layout (location = 0) in vec2 _lin0;\n\
         layout (location = 1) in vec3 _lin1;\n\
         layout (location = 0) out vec3 _lout0;\n\
         void main() {\n\
         \x20 vec2 _v0 = _lin0;\n\
         \x20 float _v1 = 0.0;\n\
         \x20 float _v2 = 1.0;\n\
         \x20 vec4 _v3 = vec4(_v0, _v1, _v2);\n\
         \x20 gl_Position = _v3;\n\
         \x20 vec3 _v4 = _lin1;\n\
         \x20 _lout0 = _v4;\n\
         }\n"
    );
}

#[test]
fn constant_rgba_fragment_shader() {
    let source = translate(Stage::Fragment, |fragment: &mut LayoutOutput<Vec4, 0>| {
        let mut color = Vec4::new(1.0, 0.0, 1.0, 1.0);
        color.set_x(0.5);
        fragment.set(color);
    })
    .unwrap();

    // The two constant 1.0 components compress to one shared temp
    assert_eq!(
        source,
        "#version 450\n\
         layout (location = 0) out vec4 _lout0;\n\
         void main() {\n\
         \x20 float _v0 = 0.5;\n\
         \x20 float _v1 = 0.0;\n\
         \x20 float _v2 = 1.0;\n\
         \x20 vec4 _v3 = vec4(_v0, _v1, _v2, _v2);\n\
         \x20 _lout0 = _v3;\n\
         }\n"
    );
}

struct Mvp {
    model: Mat4,
    view: Mat4,
    proj: Mat4,
}

impl Default for Mvp {
    fn default() -> Self {
        let mut pc = PushConstants::new();
        Self {
            model: pc.register(),
            view: pc.register(),
            proj: pc.register(),
        }
    }
}

impl ShaderSlot for Mvp {
    const KIND: IoKind = IoKind::PUSH_CONSTANT;
}

#[test]
fn mvp_vertex_pipeline() {
    let source = translate(
        Stage::Vertex,
        |(position, pc, vertex): &mut (LayoutInput<Vec3, 0>, Mvp, VertexIntrinsics)| {
            vertex.gl_position =
                &pc.proj * &pc.view * &pc.model * Vec4::with_vec3(position.get(), 1.0);
        },
    )
    .unwrap();

    assert_eq!(
        source,
        "#version 450\n\
         layout (location = 0) in vec3 _lin0;\n\
         layout (push_constant) uniform PushConstants {\n\
         \x20 mat4 m0;\n\
         \x20 mat4 m1;\n\
         \x20 mat4 m2;\n\
         } _pc;\n\
         void main() {\n\
         \x20 mat4 _v0 = _pc.m2;\n\
         \x20 mat4 _v1 = _pc.m1;\n\
         \x20 mat4 _v2 = _v0 * _v1;\n\
         \x20 mat4 _v3 = _pc.m0;\n\
         \x20 mat4 _v4 = _v2 * _v3;\n\
         \x20 vec3 _v5 = _lin0;\n\
         \x20 float _v6 = 1.0;\n\
         \x20 vec4 _v7 = vec4(_v5, _v6);\n\
         \x20 vec4 _v8 = _v4 * _v7;\n\
         \x20 gl_Position = _v8;\n\
         }\n"
    );
}

#[test]
fn shared_subexpression_emits_once() {
    let source = translate(
        Stage::Fragment,
        |(f, g, h, a, b): &mut (
            LayoutInput<F32, 0>,
            LayoutInput<F32, 1>,
            LayoutInput<F32, 2>,
            LayoutOutput<F32, 0>,
            LayoutOutput<F32, 1>,
        )| {
            let sum = f.get() + g.get();
            a.set(sum.clone());
            b.set(sum * h.get());
        },
    )
    .unwrap();

    assert_eq!(
        source,
        "#version 450\n\
         layout (location = 0) in float _lin0;\n\
         layout (location = 1) in float _lin1;\n\
         layout (location = 2) in float _lin2;\n\
         layout (location = 0) out float _lout0;\n\
         layout (location = 1) out float _lout1;\n\
         void main() {\n\
         \x20 float _v0 = _lin0;\n\
         \x20 float _v1 = _lin1;\n\
         \x20 float _v2 = _v0 + _v1;\n\
         \x20 _lout0 = _v2;\n\
         \x20 float _v3 = _lin2;\n\
         \x20 float _v4 = _v2 * _v3;\n\
         \x20 _lout1 = _v4;\n\
         }\n"
    );
    assert_eq!(source.matches(" + ").count(), 1);
}

#[test]
fn duplicate_vertex_intrinsic_fails() {
    let result = translate(
        Stage::Vertex,
        |(first, second): &mut (VertexIntrinsics, VertexIntrinsics)| {
            first.gl_position = Vec4::new(0.0, 0.0, 0.0, 1.0);
            second.gl_position = Vec4::new(0.0, 0.0, 0.0, 1.0);
        },
    );
    assert!(matches!(result, Err(Error::DuplicateIntrinsic)));
}

#[test]
fn duplicate_output_binding_fails() {
    let result = translate(
        Stage::Fragment,
        |_: &mut (LayoutOutput<Vec4, 0>, LayoutOutput<Vec3, 0>)| {},
    );
    assert!(matches!(result, Err(Error::DuplicateOutputBinding(0))));
}

#[test]
fn fragment_stage_ignores_vertex_intrinsic() {
    let source = translate(
        Stage::Fragment,
        |(vertex, fragment): &mut (VertexIntrinsics, LayoutOutput<Vec4, 0>)| {
            vertex.gl_position = Vec4::new(0.0, 0.0, 0.0, 1.0);
            fragment.set(Vec4::new(1.0, 0.0, 1.0, 1.0));
        },
    )
    .unwrap();

    assert!(!source.contains("gl_Position"));
    assert!(source.contains("_lout0 = "));
}

struct Params {
    scale: F32,
    #[allow(dead_code)]
    bias: Vec3,
    color: Vec4,
}

impl Default for Params {
    fn default() -> Self {
        let mut pc = PushConstants::new();
        Self {
            scale: pc.register(),
            bias: pc.register(),
            color: pc.register(),
        }
    }
}

impl ShaderSlot for Params {
    const KIND: IoKind = IoKind::PUSH_CONSTANT;
}

#[test]
fn unused_push_constant_member_becomes_padding() {
    // scale sits at offset 0, bias at 4, color at 16; the body never reads
    // bias, so the declared block pads the 4..16 byte range
    let source = translate(
        Stage::Fragment,
        |(pc, fragment): &mut (Params, LayoutOutput<Vec4, 0>)| {
            fragment.set(&pc.scale * &pc.color);
        },
    )
    .unwrap();

    assert_eq!(
        source,
        "#version 450\n\
         layout (location = 0) out vec4 _lout0;\n\
         layout (push_constant) uniform PushConstants {\n\
         \x20 float m0;\n\
         \x20 float _off4[3];\n\
         \x20 vec4 m2;\n\
         } _pc;\n\
         void main() {\n\
         \x20 float _v0 = _pc.m0;\n\
         \x20 vec4 _v1 = _pc.m2;\n\
         \x20 vec4 _v2 = _v0 * _v1;\n\
         \x20 _lout0 = _v2;\n\
         }\n"
    );
}

struct BlockA {
    scale: F32,
}

impl Default for BlockA {
    fn default() -> Self {
        let mut pc = PushConstants::new();
        Self {
            scale: pc.register(),
        }
    }
}

impl ShaderSlot for BlockA {
    const KIND: IoKind = IoKind::PUSH_CONSTANT;
}

struct BlockB {
    color: Vec4,
}

impl Default for BlockB {
    fn default() -> Self {
        let mut pc = PushConstants::new();
        Self {
            color: pc.register(),
        }
    }
}

impl ShaderSlot for BlockB {
    const KIND: IoKind = IoKind::PUSH_CONSTANT;
}

#[test]
fn conflicting_push_constant_blocks_fail() {
    // Two independently registered blocks both claim member 0 at offset 0
    let result = translate(
        Stage::Fragment,
        |(a, b, fragment): &mut (BlockA, BlockB, LayoutOutput<Vec4, 0>)| {
            fragment.set(&a.scale * &b.color);
        },
    );
    assert!(matches!(
        result,
        Err(Error::PushConstantConflict {
            member: 0,
            offset: 0
        })
    ));
}

#[test]
fn translation_is_deterministic() {
    let run = || {
        translate(
            Stage::Vertex,
            |(position, color, vertex, out_color): &mut (
                LayoutInput<Vec2, 0>,
                LayoutInput<Vec3, 1>,
                VertexIntrinsics,
                LayoutOutput<Vec3, 0>,
            )| {
                vertex.gl_position = Vec4::with_vec2(position.get(), 0.0, 1.0);
                out_color.set(color.get());
            },
        )
        .unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn input_components_round_trip_through_emission() {
    let source = translate(
        Stage::Fragment,
        |(uv, fragment): &mut (LayoutInput<Vec2, 0>, LayoutOutput<Vec4, 0>)| {
            fragment.set(Vec4::new(uv.x(), uv.y(), 0.0, 1.0));
        },
    )
    .unwrap();

    // Both component reads resolve against the one shared input temp
    assert!(source.contains("layout (location = 0) in vec2 _lin0;"));
    assert!(source.contains("float _v1 = _v0.x;"));
    assert!(source.contains("float _v2 = _v0.y;"));
}
