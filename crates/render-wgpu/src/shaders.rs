/// WGSL program for position/texture/packed-color quads.
///
/// Colors arrive packed as `0xAARRGGBB` in one `u32` and are unpacked
/// channel by channel, each normalized by 255.
pub const SKYBOX_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@group(1) @binding(0)
var face_texture: texture_2d<f32>;
@group(1) @binding(1)
var face_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) color: u32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let r = f32((vertex.color >> 16u) & 0xffu) / 255.0;
    let g = f32((vertex.color >> 8u) & 0xffu) / 255.0;
    let b = f32(vertex.color & 0xffu) / 255.0;
    let a = f32((vertex.color >> 24u) & 0xffu) / 255.0;

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(vertex.position, 1.0);
    out.uv = vertex.uv;
    out.color = vec4<f32>(r, g, b, a);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(face_texture, face_sampler, in.uv) * in.color;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_entry_points() {
        assert!(SKYBOX_SHADER.contains("fn vs_main"));
        assert!(SKYBOX_SHADER.contains("fn fs_main"));
    }

    #[test]
    fn unpacks_channels_in_rgb_order() {
        let r = SKYBOX_SHADER.find("(vertex.color >> 16u) & 0xffu").unwrap();
        let g = SKYBOX_SHADER.find("(vertex.color >> 8u) & 0xffu").unwrap();
        let b = SKYBOX_SHADER.find("vertex.color & 0xffu").unwrap();
        assert!(r < g && g < b);
        assert!(SKYBOX_SHADER.contains("vec4<f32>(r, g, b, a)"));
    }
}
