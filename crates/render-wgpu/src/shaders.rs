/// WGSL for every material pipeline.
///
/// Group 0 is the frame tier, group 1 the per-drawable object tier and
/// group 2 the material tier. All pipelines share `vs_main`; the material's
/// shading picks the fragment entry point. `fs_textured` is the only entry
/// point that reads bindings 1 and 2 of the material group.
pub const SCENE_SHADER: &str = r#"
struct FrameUniforms {
    view_proj: mat4x4<f32>,
    camera_position: vec3<f32>,
    time: f32,
};

struct ObjectUniforms {
    model: mat4x4<f32>,
    rotation_axis: vec3<f32>,
    rotation_speed: f32,
    time: f32,
};

struct MaterialUniforms {
    color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: FrameUniforms;

@group(1) @binding(0)
var<uniform> drawable: ObjectUniforms;

@group(2) @binding(0)
var<uniform> material_data: MaterialUniforms;

@group(2) @binding(1)
var material_texture: texture_2d<f32>;

@group(2) @binding(2)
var material_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

// Rodrigues rotation of v around unit axis k by angle.
fn spin(v: vec3<f32>, k: vec3<f32>, angle: f32) -> vec3<f32> {
    let c = cos(angle);
    let s = sin(angle);
    return v * c + cross(k, v) * s + k * dot(k, v) * (1.0 - c);
}

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let angle = drawable.rotation_speed * drawable.time;
    let local_pos = spin(vertex.position, drawable.rotation_axis, angle);
    let local_normal = spin(vertex.normal, drawable.rotation_axis, angle);

    let world_pos = drawable.model * vec4<f32>(local_pos, 1.0);
    // model is translation * scale, so its normal matrix is the inverse scale.
    let scale = vec3<f32>(
        length(drawable.model[0].xyz),
        length(drawable.model[1].xyz),
        length(drawable.model[2].xyz),
    );
    let world_normal = local_normal / scale;

    var out: VertexOutput;
    out.clip_position = frame.view_proj * world_pos;
    out.world_normal = normalize(world_normal);
    out.uv = vertex.uv;
    return out;
}

fn lambert(normal: vec3<f32>) -> f32 {
    let light_dir = normalize(vec3<f32>(0.3, 1.0, 0.5));
    let ambient = 0.3;
    let diffuse = max(dot(normalize(normal), light_dir), 0.0);
    return ambient + diffuse * 0.7;
}

@fragment
fn fs_flat(in: VertexOutput) -> @location(0) vec4<f32> {
    return material_data.color;
}

@fragment
fn fs_lambert(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = material_data.color;
    return vec4<f32>(color.rgb * lambert(in.world_normal), color.a);
}

@fragment
fn fs_textured(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(material_texture, material_sampler, in.uv);
    let color = texel * material_data.color;
    return vec4<f32>(color.rgb * lambert(in.world_normal), color.a);
}
"#;
