/// Uniform block and helpers shared by every pipeline.
pub const GLOBALS: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    inv_view_proj: mat4x4<f32>,
    // w = scene time in seconds
    camera_pos: vec4<f32>,
    camera_right: vec4<f32>,
    camera_up: vec4<f32>,
    fog_color: vec4<f32>,
    // x = near, y = far
    fog_range: vec4<f32>,
    sun_dir: vec4<f32>,
    sun_color: vec4<f32>,
    ambient: vec4<f32>,
    rim_pos: vec4<f32>,
    rim_color: vec4<f32>,
    // x = cos(outer), y = cos(inner)
    rim_cone: vec4<f32>,
    sky_horizon: vec4<f32>,
    sky_zenith: vec4<f32>,
    sky_sun: vec4<f32>,
    // rgb = albedo, w = roughness
    material: vec4<f32>,
    // rgb = tint, a = tint opacity
    lake: vec4<f32>,
    grass_root: vec4<f32>,
    grass_mid: vec4<f32>,
    grass_tip: vec4<f32>,
    // x = offset, y = darkness
    vignette: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

fn fog_factor(world_pos: vec3<f32>) -> f32 {
    let dist = distance(world_pos, globals.camera_pos.xyz);
    return clamp(
        (dist - globals.fog_range.x) / (globals.fog_range.y - globals.fog_range.x),
        0.0,
        1.0,
    );
}

fn apply_fog(color: vec3<f32>, world_pos: vec3<f32>) -> vec3<f32> {
    return mix(color, globals.fog_color.rgb, fog_factor(world_pos));
}

fn fullscreen_position(index: u32) -> vec2<f32> {
    let x = f32((index << 1u) & 2u);
    let y = f32(index & 2u);
    return vec2<f32>(x * 2.0 - 1.0, y * 2.0 - 1.0);
}

fn tonemap(x: vec3<f32>) -> vec3<f32> {
    return clamp((x * (2.51 * x + 0.03)) / (x * (2.43 * x + 0.59) + 0.14), vec3<f32>(0.0), vec3<f32>(1.0));
}
"#;

/// Gradient sky with a sun glow, drawn as a fullscreen triangle.
pub const SKY_SHADER: &str = r#"
struct SkyOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) ndc: vec2<f32>,
};

@vertex
fn vs_sky(@builtin(vertex_index) index: u32) -> SkyOutput {
    let p = fullscreen_position(index);
    var out: SkyOutput;
    out.clip_position = vec4<f32>(p, 0.0, 1.0);
    out.ndc = p;
    return out;
}

@fragment
fn fs_sky(in: SkyOutput) -> @location(0) vec4<f32> {
    let far_point = globals.inv_view_proj * vec4<f32>(in.ndc, 1.0, 1.0);
    let near_point = globals.inv_view_proj * vec4<f32>(in.ndc, 0.0, 1.0);
    let dir = normalize(far_point.xyz / far_point.w - near_point.xyz / near_point.w);

    let up = clamp(dir.y, 0.0, 1.0);
    var color = mix(globals.sky_horizon.rgb, globals.sky_zenith.rgb, sqrt(up));
    let sun = max(dot(dir, globals.sky_sun.xyz), 0.0);
    color += globals.sun_color.rgb * (pow(sun, 400.0) * 0.5 + pow(sun, 8.0) * 0.05);
    return vec4<f32>(color, 1.0);
}
"#;

/// Point stars in a spherical shell.
pub const STAR_SHADER: &str = r#"
struct StarInput {
    @location(0) position: vec3<f32>,
    @location(1) brightness: f32,
};

struct StarOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) brightness: f32,
};

@vertex
fn vs_star(star: StarInput) -> StarOutput {
    var out: StarOutput;
    out.clip_position = globals.view_proj * vec4<f32>(star.position, 1.0);
    out.brightness = star.brightness;
    return out;
}

@fragment
fn fs_star(in: StarOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(vec3<f32>(1.0), in.brightness * 0.8);
}
"#;

/// Lit ruin geometry with linear fog. Also draws the mirrored copy under
/// the lake.
pub const RUIN_SHADER: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
    @location(7) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) color: vec4<f32>,
};

@vertex
fn vs_ruin(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = globals.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;
    out.color = instance.color;
    return out;
}

@fragment
fn fs_ruin(in: VertexOutput) -> @location(0) vec4<f32> {
    let v = normalize(globals.camera_pos.xyz - in.world_pos);
    var n = normalize(in.world_normal);
    if (dot(n, v) < 0.0) {
        n = -n;
    }

    let l = normalize(globals.sun_dir.xyz);
    let diffuse = max(dot(n, l), 0.0) * globals.sun_color.rgb;

    let roughness = max(globals.material.w, 0.05);
    let shininess = max(2.0 / pow(roughness, 4.0) - 2.0, 1.0);
    let h = normalize(l + v);
    let specular = pow(max(dot(n, h), 0.0), shininess) * 0.25 * globals.sun_color.rgb;

    let to_rim = normalize(globals.rim_pos.xyz - in.world_pos);
    let spot_axis = normalize(-globals.rim_pos.xyz);
    let cone = smoothstep(globals.rim_cone.x, globals.rim_cone.y, dot(-to_rim, spot_axis));
    let rim = max(dot(n, to_rim), 0.0) * cone * globals.rim_color.rgb;

    let lit = in.color.rgb * (globals.ambient.rgb + diffuse + rim) + specular;
    return vec4<f32>(apply_fog(tonemap(lit), in.world_pos), in.color.a);
}
"#;

/// Translucent tint over the mirrored ruins; fades into fog at range.
pub const LAKE_SHADER: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct LakeOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
};

@vertex
fn vs_lake(vertex: VertexInput) -> LakeOutput {
    var out: LakeOutput;
    out.clip_position = globals.view_proj * vec4<f32>(vertex.position, 1.0);
    out.world_pos = vertex.position;
    return out;
}

@fragment
fn fs_lake(in: LakeOutput) -> @location(0) vec4<f32> {
    let v = normalize(globals.camera_pos.xyz - in.world_pos);
    // Grazing angles reflect more, so the tint thins out.
    let tint = globals.lake.a * (0.6 + 0.4 * abs(v.y));
    let fog = fog_factor(in.world_pos);
    let color = mix(globals.lake.rgb, globals.fog_color.rgb, fog);
    return vec4<f32>(color, mix(tint, 1.0, fog));
}
"#;

/// Instanced grass blades bent by two travelling sine waves.
pub const GRASS_SHADER: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
    @location(7) color: vec4<f32>,
};

struct GrassOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) height: f32,
};

@vertex
fn vs_grass(vertex: VertexInput, instance: InstanceInput) -> GrassOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    var pos = vertex.position;
    let rest = model * vec4<f32>(pos, 1.0);
    let v = vertex.uv.y;

    if (v > 0.1) {
        let t = globals.camera_pos.w;
        let wave_big = sin(t * 0.5 + rest.x * 0.05 + rest.z * 0.05);
        let wave_small = sin(t * 2.0 + rest.x * 0.5 + rest.z * 0.2);
        let lean = v * v;
        pos.x += (wave_big * 1.5 + wave_small * 0.5) * lean;
        pos.z += (wave_big * 0.5 + wave_small * 0.2) * lean;
    }

    let world_pos = model * vec4<f32>(pos, 1.0);
    var out: GrassOutput;
    out.clip_position = globals.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.height = v;
    return out;
}

@fragment
fn fs_grass(in: GrassOutput) -> @location(0) vec4<f32> {
    var color = mix(globals.grass_root.rgb, globals.grass_mid.rgb, in.height);
    color = mix(color, globals.grass_tip.rgb, smoothstep(0.7, 1.0, in.height));
    return vec4<f32>(apply_fog(color, in.world_pos), 1.0);
}
"#;

/// Soft camera-facing cloud puffs that drift slowly.
pub const CLOUD_SHADER: &str = r#"
struct PuffInput {
    @location(0) center: vec4<f32>,
    @location(1) color: vec4<f32>,
    @location(2) drift: vec4<f32>,
};

struct PuffOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) corner: vec2<f32>,
    @location(2) color: vec4<f32>,
};

@vertex
fn vs_cloud(@builtin(vertex_index) index: u32, puff: PuffInput) -> PuffOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let corner = corners[index];
    let t = globals.camera_pos.w;
    let sway = vec3<f32>(sin(t * puff.drift.x * 0.1 + puff.drift.y) * 4.0, 0.0, 0.0);
    let offset = (globals.camera_right.xyz * corner.x + globals.camera_up.xyz * corner.y) * puff.center.w;
    let world_pos = puff.center.xyz + sway + offset;

    var out: PuffOutput;
    out.clip_position = globals.view_proj * vec4<f32>(world_pos, 1.0);
    out.world_pos = world_pos;
    out.corner = corner;
    out.color = puff.color;
    return out;
}

@fragment
fn fs_cloud(in: PuffOutput) -> @location(0) vec4<f32> {
    let falloff = 1.0 - smoothstep(0.3, 1.0, length(in.corner));
    let fog = fog_factor(in.world_pos);
    let color = mix(in.color.rgb, globals.fog_color.rgb, fog);
    return vec4<f32>(color, falloff * in.color.a * (1.0 - 0.5 * fog));
}
"#;

/// Darkens the frame edges over everything already drawn.
pub const VIGNETTE_SHADER: &str = r#"
struct VignetteOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_vignette(@builtin(vertex_index) index: u32) -> VignetteOutput {
    let p = fullscreen_position(index);
    var out: VignetteOutput;
    out.clip_position = vec4<f32>(p, 0.0, 1.0);
    out.uv = p * 0.5 + vec2<f32>(0.5);
    return out;
}

@fragment
fn fs_vignette(in: VignetteOutput) -> @location(0) vec4<f32> {
    let d = length(in.uv - vec2<f32>(0.5)) * 1.41421356;
    let shade = globals.vignette.y * smoothstep(globals.vignette.x, 1.0, d);
    return vec4<f32>(0.0, 0.0, 0.0, shade);
}
"#;

/// Prefix `body` with the shared globals block.
pub fn with_globals(body: &str) -> String {
    format!("{GLOBALS}{body}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_shader_names_its_entry_points() {
        for (source, vs, fs) in [
            (SKY_SHADER, "vs_sky", "fs_sky"),
            (STAR_SHADER, "vs_star", "fs_star"),
            (RUIN_SHADER, "vs_ruin", "fs_ruin"),
            (LAKE_SHADER, "vs_lake", "fs_lake"),
            (GRASS_SHADER, "vs_grass", "fs_grass"),
            (CLOUD_SHADER, "vs_cloud", "fs_cloud"),
            (VIGNETTE_SHADER, "vs_vignette", "fs_vignette"),
        ] {
            assert!(source.contains(&format!("fn {vs}(")), "{vs} missing");
            assert!(source.contains(&format!("fn {fs}(")), "{fs} missing");
        }
    }

    #[test]
    fn grass_wind_matches_cpu_formula() {
        assert!(GRASS_SHADER.contains("sin(t * 0.5 + rest.x * 0.05 + rest.z * 0.05)"));
        assert!(GRASS_SHADER.contains("sin(t * 2.0 + rest.x * 0.5 + rest.z * 0.2)"));
        assert!(GRASS_SHADER.contains("if (v > 0.1)"));
    }

    #[test]
    fn globals_prefix_is_applied() {
        let src = with_globals(SKY_SHADER);
        assert!(src.starts_with(GLOBALS));
        assert!(src.contains("struct Globals"));
    }
}
