//! Shader programs and uniform values
//!
//! Compilation is explicit: `Graphics::create_shader` compiles and links,
//! returning the driver's error log on failure so the application can keep
//! running without the program. Uniforms are set by name; unknown names are
//! a no-op.

use crate::graphics::backend::ShaderId;

/// A compiled shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderProgram {
    pub(crate) id: ShaderId,
}

impl ShaderProgram {
    /// Driver-side id
    pub fn id(&self) -> ShaderId {
        self.id
    }
}

/// A uniform value, tagged by type
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// Signed integer
    Int(i32),
    /// Float
    Float(f32),
    /// 2-component vector
    Vec2([f32; 2]),
    /// 3-component vector
    Vec3([f32; 3]),
    /// 4-component vector
    Vec4([f32; 4]),
    /// 3x3 matrix, column major
    Mat3([f32; 9]),
    /// 4x4 matrix, column major
    Mat4([f32; 16]),
    /// Sampler bound to a texture unit
    Sampler(i32),
}

/// Color sourcing for the built-in program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColorSource {
    /// The uniform tint color
    Uniform,
    /// Per-vertex colors
    Vertex,
    /// Sampled from the bound texture
    Texture,
}

/// Vertex attribute locations shared by every program the runtime compiles.
/// User programs must use the same layout to draw meshes.
pub mod attrib {
    /// Position attribute location
    pub const POSITION: u32 = 0;
    /// Normal attribute location
    pub const NORMAL: u32 = 1;
    /// Color attribute location
    pub const COLOR: u32 = 2;
    /// Texture coordinate attribute location
    pub const TEXCOORD: u32 = 3;
}

/// Built-in vertex shader, GLSL ES 3.00 (accepted by native GL 3.3+ and
/// WebGL2). Point size is fed through a uniform because WebGL2 has no
/// driver-side point size.
pub const DEFAULT_VERTEX_SHADER: &str = r#"#version 300 es
precision highp float;

layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_normal;
layout(location = 2) in vec4 a_color;
layout(location = 3) in vec2 a_texcoord;

uniform mat4 u_modelview;
uniform mat4 u_projection;
uniform mat3 u_normal_matrix;
uniform float u_point_size;

out vec3 v_eye_pos;
out vec3 v_normal;
out vec4 v_color;
out vec2 v_texcoord;

void main() {
    vec4 eye = u_modelview * vec4(a_position, 1.0);
    v_eye_pos = eye.xyz;
    v_normal = u_normal_matrix * a_normal;
    v_color = a_color;
    v_texcoord = a_texcoord;
    gl_Position = u_projection * eye;
    gl_PointSize = u_point_size;
}
"#;

/// Built-in fragment shader with an eight-light uniform lighting block
pub const DEFAULT_FRAGMENT_SHADER: &str = r#"#version 300 es
precision highp float;

const int MAX_LIGHTS = 8;

uniform vec4 u_tint;
uniform int u_color_source;   // 0 = tint, 1 = vertex color, 2 = texture
uniform sampler2D u_tex0;
uniform bool u_lighting;
uniform int u_num_lights;
uniform vec4 u_light_pos[MAX_LIGHTS];      // w == 0 means directional
uniform vec3 u_light_diffuse[MAX_LIGHTS];
uniform vec3 u_light_ambient[MAX_LIGHTS];
uniform vec3 u_material_diffuse;
uniform vec3 u_material_ambient;
uniform vec3 u_material_specular;
uniform float u_material_shininess;

in vec3 v_eye_pos;
in vec3 v_normal;
in vec4 v_color;
in vec2 v_texcoord;

out vec4 frag_color;

void main() {
    vec4 base;
    if (u_color_source == 1) {
        base = v_color;
    } else if (u_color_source == 2) {
        base = texture(u_tex0, v_texcoord) * u_tint;
    } else {
        base = u_tint;
    }

    if (!u_lighting) {
        frag_color = base;
        return;
    }

    vec3 n = normalize(v_normal);
    vec3 view_dir = normalize(-v_eye_pos);
    vec3 lit = vec3(0.0);
    for (int i = 0; i < MAX_LIGHTS; ++i) {
        if (i >= u_num_lights) { break; }
        vec3 light_dir;
        if (u_light_pos[i].w == 0.0) {
            light_dir = normalize(u_light_pos[i].xyz);
        } else {
            light_dir = normalize(u_light_pos[i].xyz - v_eye_pos);
        }
        float diff = max(dot(n, light_dir), 0.0);
        vec3 half_dir = normalize(light_dir + view_dir);
        float spec = diff > 0.0
            ? pow(max(dot(n, half_dir), 0.0), u_material_shininess)
            : 0.0;
        lit += u_light_ambient[i] * u_material_ambient
             + u_light_diffuse[i] * (diff * u_material_diffuse
                                     + spec * u_material_specular);
    }
    frag_color = vec4(lit, 1.0) * base;
}
"#;
