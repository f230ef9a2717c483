use glsl_embed::{
    LayoutInput, LayoutOutput, Stage, Vec2, Vec3, Vec4, VertexIntrinsics, translate,
};

fn main() {
    env_logger::init();

    let vertex = translate(
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
    .expect("vertex shader");

    println!("vertex source:\n{vertex}");

    let fragment = translate(Stage::Fragment, |fragment: &mut LayoutOutput<Vec4, 0>| {
        let mut color = Vec4::new(1.0, 0.0, 1.0, 1.0);
        color.set_x(0.5);
        fragment.set(color);
    })
    .expect("fragment shader");

    println!("fragment source:\n{fragment}");
}
