use glsl_embed::{
    F32, IoKind, LayoutInput, Mat4, PushConstants, ShaderSlot, Stage, Vec3, Vec4,
    VertexIntrinsics, translate,
};

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

fn main() {
    env_logger::init();

    let source = translate(
        Stage::Vertex,
        |(position, pc, vertex): &mut (LayoutInput<Vec3, 0>, Mvp, VertexIntrinsics)| {
            let mut projected =
                &pc.proj * &pc.view * &pc.model * Vec4::with_vec3(position.get(), 1.0);
            // Flip to Vulkan clip space and remap depth to [0, 1]
            projected.set_y(F32::new(0.0) - projected.y());
            projected.set_z((projected.z() + projected.w()) / F32::new(2.0));
            vertex.gl_position = projected;
        },
    )
    .expect("vertex shader");

    println!("mvp vertex source:\n{source}");
}
