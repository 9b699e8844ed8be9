use genesis_engine::components::Mesh;
use genesis_engine::math::Vec2;

/// Vertices and triangles of a filled circle centred on the origin.
///
/// Vertex 0 is the centre, followed by `resolution` rim vertices starting on
/// the +x axis and going counter-clockwise. Each triangle joins the centre to
/// two neighbouring rim vertices.
pub fn circle_fan(radius: f32, resolution: u16) -> (Vec<Vec2>, Vec<[u16; 3]>) {
    let resolution = resolution.max(3);
    let step = std::f32::consts::TAU / resolution as f32;

    let mut vertices = Vec::with_capacity(resolution as usize + 1);
    vertices.push(Vec2::zero());
    vertices.extend((0..resolution).map(|i| {
        let (s, c) = (i as f32 * step).sin_cos();
        Vec2::new(c * radius, s * radius)
    }));

    let triangles = (1..=resolution)
        .map(|i| [0, i, if i == resolution { 1 } else { i + 1 }])
        .collect();

    (vertices, triangles)
}

pub fn circle_mesh(radius: f32, resolution: u16) -> genesis_engine::Result<Mesh> {
    let (vertices, triangles) = circle_fan(radius, resolution);
    Mesh::from_2d(&vertices, &triangles, false)
}
