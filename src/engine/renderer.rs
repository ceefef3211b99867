use wasm_bindgen::prelude::*;
use web_sys::{WebGlRenderingContext, WebGlProgram, WebGlBuffer, WebGlUniformLocation, HtmlCanvasElement, WebGlTexture, HtmlImageElement};
use nalgebra::{Matrix4, Vector3};
use crate::engine::mesh::{Mesh, VERTEX_STRIDE};
use crate::engine::texture::Pattern;
use wasm_bindgen::JsCast;

const VERTEX_SHADER: &str = r#"
    attribute vec3 aPosition;
    attribute vec3 aNormal;
    attribute vec2 aTexCoord;
    uniform mat4 uProjection;
    uniform mat4 uView;
    uniform mat4 uModel;
    uniform mat4 uNormalMatrix;
    varying vec3 vWorldPos;
    varying vec3 vNormal;
    varying vec2 vTexCoord;
    void main() {
        vec4 world = uModel * vec4(aPosition, 1.0);
        gl_Position = uProjection * uView * world;
        vWorldPos = world.xyz;
        vNormal = (uNormalMatrix * vec4(aNormal, 0.0)).xyz;
        vTexCoord = aTexCoord;
    }
"#;

const FRAGMENT_SHADER: &str = r#"
    precision mediump float;
    varying vec3 vWorldPos;
    varying vec3 vNormal;
    varying vec2 vTexCoord;
    uniform sampler2D uSampler;
    uniform int uUseTexture;
    uniform bool uUseColor;
    uniform vec3 uColor;
    uniform vec3 uAmbientColor;
    uniform vec3 uSunDirection;
    uniform vec3 uSunColor;
    uniform vec3 uHeadlightPos;
    uniform vec3 uHeadlightDir;

    void main() {
        vec3 base = vec3(1.0);
        if (uUseTexture == 1) {
            base = texture2D(uSampler, vTexCoord).rgb;
        }
        if (uUseColor) {
            base *= uColor;
        }

        vec3 normal = normalize(vNormal);
        float diffuse = max(dot(normal, normalize(-uSunDirection)), 0.0);
        vec3 light = uAmbientColor + uSunColor * diffuse;

        // Headlight cone
        vec3 toFrag = vWorldPos - uHeadlightPos;
        float dist = length(toFrag);
        float spot = dot(normalize(toFrag), normalize(uHeadlightDir));
        if (spot > 0.9) {
            float cone = smoothstep(0.9, 0.97, spot);
            float falloff = 1.0 / (1.0 + 0.02 * dist * dist);
            light += vec3(1.0, 0.95, 0.8) * cone * falloff * 2.0;
        }

        gl_FragColor = vec4(base * light, 1.0);
    }
"#;

/// Vertex and index buffers of one uploaded [`Mesh`].
pub struct GpuMesh {
    vertex_buffer: WebGlBuffer,
    index_buffer: WebGlBuffer,
    index_count: i32,
}

/// Surface look for one draw: tint, texture, or both.
#[derive(Clone, Copy)]
pub struct Material<'a> {
    pub color: Option<(f32, f32, f32)>,
    pub texture: Option<&'a WebGlTexture>,
}

pub struct Lighting {
    pub ambient: (f32, f32, f32),
    pub sun_direction: Vector3<f32>,
    pub sun_color: (f32, f32, f32),
    pub headlight_position: Vector3<f32>,
    pub headlight_direction: Vector3<f32>,
}

pub struct Renderer {
    pub gl: WebGlRenderingContext,
    program: WebGlProgram,
    projection_location: WebGlUniformLocation,
    view_location: WebGlUniformLocation,
    model_location: WebGlUniformLocation,
    normal_matrix_location: WebGlUniformLocation,
    sampler_location: WebGlUniformLocation,
    use_texture_location: WebGlUniformLocation,
    use_color_location: WebGlUniformLocation,
    color_location: WebGlUniformLocation,
    ambient_location: WebGlUniformLocation,
    sun_direction_location: WebGlUniformLocation,
    sun_color_location: WebGlUniformLocation,
    headlight_pos_location: WebGlUniformLocation,
    headlight_dir_location: WebGlUniformLocation,
}

impl Renderer {
    pub fn new(gl: WebGlRenderingContext) -> Result<Self, JsValue> {
        // Terrain meshes outgrow 16-bit indices
        gl.get_extension("OES_element_index_uint")?
            .ok_or("OES_element_index_uint is not supported")?;

        let program = create_program(&gl)?;
        gl.use_program(Some(&program));

        let uniform = |name: &str| -> Result<WebGlUniformLocation, JsValue> {
            gl.get_uniform_location(&program, name)
                .ok_or_else(|| JsValue::from_str(&format!("Failed to get {} location", name)))
        };

        let renderer = Renderer {
            projection_location: uniform("uProjection")?,
            view_location: uniform("uView")?,
            model_location: uniform("uModel")?,
            normal_matrix_location: uniform("uNormalMatrix")?,
            sampler_location: uniform("uSampler")?,
            use_texture_location: uniform("uUseTexture")?,
            use_color_location: uniform("uUseColor")?,
            color_location: uniform("uColor")?,
            ambient_location: uniform("uAmbientColor")?,
            sun_direction_location: uniform("uSunDirection")?,
            sun_color_location: uniform("uSunColor")?,
            headlight_pos_location: uniform("uHeadlightPos")?,
            headlight_dir_location: uniform("uHeadlightDir")?,
            program,
            gl,
        };

        renderer.gl.uniform1i(Some(&renderer.sampler_location), 0);
        Ok(renderer)
    }

    pub fn clear(&self, r: f32, g: f32, b: f32) {
        self.gl.clear_color(r, g, b, 1.0);
        self.gl.clear(WebGlRenderingContext::COLOR_BUFFER_BIT | WebGlRenderingContext::DEPTH_BUFFER_BIT);
    }

    pub fn enable_depth_test(&self) {
        self.gl.enable(WebGlRenderingContext::DEPTH_TEST);
    }

    pub fn resize(&self, width: i32, height: i32) {
        self.gl.viewport(0, 0, width, height);
    }

    pub fn canvas(&self) -> Option<HtmlCanvasElement> {
        self.gl.canvas()?.dyn_into::<HtmlCanvasElement>().ok()
    }

    pub fn set_lighting(&self, lighting: &Lighting) {
        let (ar, ag, ab) = lighting.ambient;
        let (sr, sg, sb) = lighting.sun_color;
        let sun = &lighting.sun_direction;
        let pos = &lighting.headlight_position;
        let dir = &lighting.headlight_direction;

        self.gl.uniform3f(Some(&self.ambient_location), ar, ag, ab);
        self.gl.uniform3f(Some(&self.sun_color_location), sr, sg, sb);
        self.gl.uniform3f(Some(&self.sun_direction_location), sun.x, sun.y, sun.z);
        self.gl.uniform3f(Some(&self.headlight_pos_location), pos.x, pos.y, pos.z);
        self.gl.uniform3f(Some(&self.headlight_dir_location), dir.x, dir.y, dir.z);
    }

    /// Copies the mesh into GPU buffers; the CPU copy can be dropped afterwards.
    pub fn upload_mesh(&self, mesh: &Mesh) -> Result<GpuMesh, JsValue> {
        let vertex_buffer = self.gl.create_buffer().ok_or("Failed to create vertex buffer")?;
        let index_buffer = self.gl.create_buffer().ok_or("Failed to create index buffer")?;

        self.gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(&vertex_buffer));
        unsafe {
            let vert_array = js_sys::Float32Array::view(&mesh.vertices);
            self.gl.buffer_data_with_array_buffer_view(
                WebGlRenderingContext::ARRAY_BUFFER,
                &vert_array,
                WebGlRenderingContext::STATIC_DRAW
            );
        }

        self.gl.bind_buffer(WebGlRenderingContext::ELEMENT_ARRAY_BUFFER, Some(&index_buffer));
        unsafe {
            let idx_array = js_sys::Uint32Array::view(&mesh.indices);
            self.gl.buffer_data_with_array_buffer_view(
                WebGlRenderingContext::ELEMENT_ARRAY_BUFFER,
                &idx_array,
                WebGlRenderingContext::STATIC_DRAW
            );
        }

        Ok(GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as i32,
        })
    }

    pub fn draw_indexed(&self, mesh: &GpuMesh, model: &Matrix4<f32>, view: &Matrix4<f32>, projection: &Matrix4<f32>, material: &Material) {
        match material.texture {
            Some(tex) => {
                self.gl.active_texture(WebGlRenderingContext::TEXTURE0);
                self.gl.bind_texture(WebGlRenderingContext::TEXTURE_2D, Some(tex));
                self.gl.uniform1i(Some(&self.use_texture_location), 1);
            }
            None => self.gl.uniform1i(Some(&self.use_texture_location), 0),
        }

        match material.color {
            Some((r, g, b)) => {
                self.gl.uniform1i(Some(&self.use_color_location), 1);
                self.gl.uniform3f(Some(&self.color_location), r, g, b);
            }
            None => self.gl.uniform1i(Some(&self.use_color_location), 0),
        }

        self.gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(&mesh.vertex_buffer));
        self.gl.bind_buffer(WebGlRenderingContext::ELEMENT_ARRAY_BUFFER, Some(&mesh.index_buffer));

        let stride = (VERTEX_STRIDE * 4) as i32;
        let pos_loc = self.gl.get_attrib_location(&self.program, "aPosition") as u32;
        let normal_loc = self.gl.get_attrib_location(&self.program, "aNormal") as u32;
        let tex_loc = self.gl.get_attrib_location(&self.program, "aTexCoord") as u32;

        self.gl.vertex_attrib_pointer_with_i32(pos_loc, 3, WebGlRenderingContext::FLOAT, false, stride, 0);
        self.gl.enable_vertex_attrib_array(pos_loc);

        self.gl.vertex_attrib_pointer_with_i32(normal_loc, 3, WebGlRenderingContext::FLOAT, false, stride, 12);
        self.gl.enable_vertex_attrib_array(normal_loc);

        self.gl.vertex_attrib_pointer_with_i32(tex_loc, 2, WebGlRenderingContext::FLOAT, false, stride, 24);
        self.gl.enable_vertex_attrib_array(tex_loc);

        let normal_matrix = model.try_inverse().map(|m| m.transpose()).unwrap_or(*model);
        self.gl.uniform_matrix4fv_with_f32_array(Some(&self.projection_location), false, projection.as_slice());
        self.gl.uniform_matrix4fv_with_f32_array(Some(&self.view_location), false, view.as_slice());
        self.gl.uniform_matrix4fv_with_f32_array(Some(&self.model_location), false, model.as_slice());
        self.gl.uniform_matrix4fv_with_f32_array(Some(&self.normal_matrix_location), false, normal_matrix.as_slice());

        self.gl.draw_elements_with_i32(
            WebGlRenderingContext::TRIANGLES,
            mesh.index_count,
            WebGlRenderingContext::UNSIGNED_INT,
            0
        );
    }

    /// Texture usable immediately as the tiled `fallback` pattern. If `url`
    /// loads, the image replaces the pattern.
    pub fn create_texture(&self, url: &str, fallback: &Pattern) -> Result<WebGlTexture, JsValue> {
        let texture = self.gl.create_texture().ok_or("Failed to create texture")?;
        self.gl.bind_texture(WebGlRenderingContext::TEXTURE_2D, Some(&texture));

        let level = 0;
        let internal_format = WebGlRenderingContext::RGBA as i32;
        let size = fallback.size as i32;
        let border = 0;
        let src_format = WebGlRenderingContext::RGBA;
        let src_type = WebGlRenderingContext::UNSIGNED_BYTE;
        self.gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
            WebGlRenderingContext::TEXTURE_2D, level, internal_format, size, size, border, src_format, src_type, Some(&fallback.pixels)
        )?;
        set_sampling(&self.gl, fallback.size, fallback.size);

        let img = HtmlImageElement::new()?;
        img.set_cross_origin(Some("anonymous"));

        let gl = self.gl.clone();
        let texture_clone = texture.clone();
        let img_clone = img.clone();
        let source = url.to_string();

        let onload = Closure::wrap(Box::new(move || {
            gl.bind_texture(WebGlRenderingContext::TEXTURE_2D, Some(&texture_clone));
            if let Err(e) = gl.tex_image_2d_with_u32_and_u32_and_image(
                WebGlRenderingContext::TEXTURE_2D, 0, WebGlRenderingContext::RGBA as i32, WebGlRenderingContext::RGBA, WebGlRenderingContext::UNSIGNED_BYTE, &img_clone
            ) {
                log::warn!("texture {} failed to upload: {:?}", source, e);
                return;
            }
            set_sampling(&gl, img_clone.width(), img_clone.height());
        }) as Box<dyn FnMut()>);

        let failed_source = url.to_string();
        let onerror = Closure::wrap(Box::new(move || {
            log::warn!("texture {} failed to load, keeping generated pattern", failed_source);
        }) as Box<dyn FnMut()>);

        img.set_onload(Some(onload.as_ref().unchecked_ref()));
        img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onload.forget();
        onerror.forget();

        img.set_src(url);

        Ok(texture)
    }
}

// Only power-of-two textures may repeat and mipmap in WebGL 1
fn set_sampling(gl: &WebGlRenderingContext, width: u32, height: u32) {
    if is_power_of_2(width) && is_power_of_2(height) {
        gl.tex_parameteri(WebGlRenderingContext::TEXTURE_2D, WebGlRenderingContext::TEXTURE_WRAP_S, WebGlRenderingContext::REPEAT as i32);
        gl.tex_parameteri(WebGlRenderingContext::TEXTURE_2D, WebGlRenderingContext::TEXTURE_WRAP_T, WebGlRenderingContext::REPEAT as i32);
        gl.generate_mipmap(WebGlRenderingContext::TEXTURE_2D);
    } else {
        log::warn!("texture of {}x{} is not power-of-two sized, tiling disabled", width, height);
        gl.tex_parameteri(WebGlRenderingContext::TEXTURE_2D, WebGlRenderingContext::TEXTURE_WRAP_S, WebGlRenderingContext::CLAMP_TO_EDGE as i32);
        gl.tex_parameteri(WebGlRenderingContext::TEXTURE_2D, WebGlRenderingContext::TEXTURE_WRAP_T, WebGlRenderingContext::CLAMP_TO_EDGE as i32);
        gl.tex_parameteri(WebGlRenderingContext::TEXTURE_2D, WebGlRenderingContext::TEXTURE_MIN_FILTER, WebGlRenderingContext::LINEAR as i32);
    }
}

fn is_power_of_2(value: u32) -> bool {
    value != 0 && (value & (value - 1)) == 0
}

fn create_program(gl: &WebGlRenderingContext) -> Result<WebGlProgram, JsValue> {
    let vert_shader = compile_shader(gl, WebGlRenderingContext::VERTEX_SHADER, VERTEX_SHADER)?;
    let frag_shader = compile_shader(gl, WebGlRenderingContext::FRAGMENT_SHADER, FRAGMENT_SHADER)?;

    let program = gl.create_program().ok_or("Unable to create program")?;
    gl.attach_shader(&program, &vert_shader);
    gl.attach_shader(&program, &frag_shader);
    gl.link_program(&program);

    if gl.get_program_parameter(&program, WebGlRenderingContext::LINK_STATUS).as_bool().unwrap_or(false) {
        Ok(program)
    } else {
        Err(JsValue::from_str(&gl.get_program_info_log(&program).unwrap_or_default()))
    }
}

fn compile_shader(gl: &WebGlRenderingContext, shader_type: u32, source: &str) -> Result<web_sys::WebGlShader, JsValue> {
    let shader = gl.create_shader(shader_type).ok_or("Unable to create shader")?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl.get_shader_parameter(&shader, WebGlRenderingContext::COMPILE_STATUS).as_bool().unwrap_or(false) {
        Ok(shader)
    } else {
        Err(JsValue::from_str(&gl.get_shader_info_log(&shader).unwrap_or_default()))
    }
}
