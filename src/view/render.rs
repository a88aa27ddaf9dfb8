use glam::Mat4;
use tracing::warn;
use wgpu::util::DeviceExt;

use crate::model::{Camera, MaterialDesc, MaterialRegistry, Scene, StyleUniform};
use crate::utils::Vertex;
use crate::view::GpuContext;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Stand-in for any shader that failed to load or validate: the classic
/// solid magenta, one module covering both stages.
pub const FALLBACK_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
}

@group(0) @binding(0) var<uniform> globals: Globals;

@vertex
fn vs_main(@location(0) pos: vec3<f32>, @location(1) normal: vec3<f32>, @location(2) uv: vec2<f32>) -> @builtin(position) vec4<f32> {
    return globals.view_proj * globals.model * vec4<f32>(pos, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.0, 1.0, 1.0);
}
"#;

/// Parse and validate WGSL on the CPU before handing it to the device, so a
/// broken shader degrades to the fallback instead of a device error.
fn check_shader_source(label: &str, source: &str, entry: &str) -> bool {
    if source.trim().is_empty() {
        warn!("shader {} is empty, using fallback", label);
        return false;
    }
    let module = match naga::front::wgsl::parse_str(source) {
        Ok(module) => module,
        Err(e) => {
            warn!("shader {} failed to parse, using fallback:\n{}", label, e.emit_to_string(source));
            return false;
        }
    };
    if !module.entry_points.iter().any(|ep| ep.name == entry) {
        warn!("shader {} has no `{}` entry point, using fallback", label, entry);
        return false;
    }
    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    if let Err(e) = validator.validate(&module) {
        warn!("shader {} failed validation, using fallback: {:?}", label, e);
        return false;
    }
    true
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalsUniform {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
}

/// Bind group layouts shared by every pipeline: group 0 carries per-object
/// globals, group 1 the per-material style uniform.
pub struct SharedLayouts {
    pub globals: wgpu::BindGroupLayout,
    pub style: wgpu::BindGroupLayout,
    pub pipeline: wgpu::PipelineLayout,
}

pub fn create_shared_layouts(device: &wgpu::Device) -> SharedLayouts {
    let uniform_entry = |binding, visibility| wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };

    let globals = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("globals_bind_group_layout"),
        entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
    });
    let style = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("style_bind_group_layout"),
        entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT)],
    });
    let pipeline = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pipeline_layout"),
        bind_group_layouts: &[&globals, &style],
        push_constant_ranges: &[],
    });

    SharedLayouts { globals, style, pipeline }
}

/// Per-object view/model uniform buffer and its bind group
pub struct ObjectGlobals {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl ObjectGlobals {
    pub fn new(device: &wgpu::Device, layouts: &SharedLayouts, label: &str) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(&GlobalsUniform {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                model: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layouts.globals,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: buffer.as_entire_binding() }],
        });
        Self { buffer, bind_group }
    }
}

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
    wgpu::VertexAttribute { offset: 0, shader_location: 0, format: wgpu::VertexFormat::Float32x3 },
    wgpu::VertexAttribute { offset: 12, shader_location: 1, format: wgpu::VertexFormat::Float32x3 },
    wgpu::VertexAttribute { offset: 24, shader_location: 2, format: wgpu::VertexFormat::Float32x2 },
];

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

struct PipelineParams<'a> {
    label: &'a str,
    polygon_mode: wgpu::PolygonMode,
    cull_mode: Option<wgpu::Face>,
    depth_write: bool,
    depth_compare: wgpu::CompareFunction,
}

fn create_surface_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    layouts: &SharedLayouts,
    vs_module: &wgpu::ShaderModule,
    fs_module: &wgpu::ShaderModule,
    params: PipelineParams,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(params.label),
        layout: Some(&layouts.pipeline),
        vertex: wgpu::VertexState {
            module: vs_module,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: fs_module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: params.cull_mode,
            polygon_mode: params.polygon_mode,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: params.depth_write,
            depth_compare: params.depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

/// GPU half of a material entry: its pipeline plus the uniform buffer the
/// entry's `StyleUniform` values are uploaded into.
pub struct GpuMaterial {
    pub pipeline: wgpu::RenderPipeline,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl GpuMaterial {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        layouts: &SharedLayouts,
        desc: &MaterialDesc,
        vs_src: &str,
        fs_src: &str,
    ) -> Self {
        let vs_ok = check_shader_source(&format!("{}.vertex", desc.name), vs_src, "vs_main");
        let fs_ok = check_shader_source(&format!("{}.fragment", desc.name), fs_src, "fs_main");
        // One broken stage drags both to the fallback so the stage interface
        // stays consistent
        let (vs_src, fs_src) = if vs_ok && fs_ok {
            (vs_src, fs_src)
        } else {
            (FALLBACK_SHADER, FALLBACK_SHADER)
        };

        let vs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{}_vertex", desc.name)),
            source: wgpu::ShaderSource::Wgsl(vs_src.into()),
        });
        let fs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{}_fragment", desc.name)),
            source: wgpu::ShaderSource::Wgsl(fs_src.into()),
        });

        let polygon_mode = if desc.wireframe
            && device.features().contains(wgpu::Features::POLYGON_MODE_LINE)
        {
            wgpu::PolygonMode::Line
        } else {
            wgpu::PolygonMode::Fill
        };

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{}_style", desc.name)),
            contents: bytemuck::bytes_of(&desc.uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{}_style", desc.name)),
            layout: &layouts.style,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: buffer.as_entire_binding() }],
        });

        let pipeline = create_surface_pipeline(
            device,
            format,
            layouts,
            &vs_module,
            &fs_module,
            PipelineParams {
                label: &format!("{}_pipeline", desc.name),
                polygon_mode,
                cull_mode: Some(wgpu::Face::Back),
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );

        Self { pipeline, buffer, bind_group }
    }
}

/// Sky dome pipeline and uniforms. Drawn first, from the inside, without
/// touching the depth buffer.
pub struct SkyResources {
    pub pipeline: wgpu::RenderPipeline,
    pub globals: ObjectGlobals,
    pub style_buffer: wgpu::Buffer,
    pub style_bind_group: wgpu::BindGroup,
    pub uniforms: StyleUniform,
}

impl SkyResources {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        layouts: &SharedLayouts,
        vs_src: &str,
        fs_src: &str,
        width: u32,
        height: u32,
    ) -> Self {
        let vs_ok = check_shader_source("skybox.vertex", vs_src, "vs_main");
        let fs_ok = check_shader_source("skybox.fragment", fs_src, "fs_main");
        let (vs_src, fs_src) = if vs_ok && fs_ok {
            (vs_src, fs_src)
        } else {
            (FALLBACK_SHADER, FALLBACK_SHADER)
        };

        let vs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("skybox_vertex"),
            source: wgpu::ShaderSource::Wgsl(vs_src.into()),
        });
        let fs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("skybox_fragment"),
            source: wgpu::ShaderSource::Wgsl(fs_src.into()),
        });

        let mut uniforms = StyleUniform::with_color([0.45, 0.65, 0.95, 1.0]);
        uniforms.resolution = [width as f32, height as f32];

        let style_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("skybox_style"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let style_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("skybox_style"),
            layout: &layouts.style,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: style_buffer.as_entire_binding() }],
        });

        let pipeline = create_surface_pipeline(
            device,
            format,
            layouts,
            &vs_module,
            &fs_module,
            PipelineParams {
                label: "skybox_pipeline",
                polygon_mode: wgpu::PolygonMode::Fill,
                cull_mode: None,
                depth_write: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
            },
        );

        Self {
            pipeline,
            globals: ObjectGlobals::new(device, layouts, "skybox_globals"),
            style_buffer,
            style_bind_group,
            uniforms,
        }
    }
}

pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

/// Consolidated render state: everything draw_frame needs besides the
/// scene and the registry
pub struct RenderState {
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
    pub depth_texture: wgpu::Texture,
    pub depth_view: wgpu::TextureView,
    pub sky: SkyResources,
    pub cube_globals: ObjectGlobals,
}

impl RenderState {
    pub fn new(
        gpu: &GpuContext,
        layouts: &SharedLayouts,
        sky_vs: &str,
        sky_fs: &str,
        width: u32,
        height: u32,
    ) -> Self {
        let (depth_texture, depth_view) = create_depth_texture(&gpu.device, width, height);
        Self {
            format: gpu.format,
            width,
            height,
            depth_texture,
            depth_view,
            sky: SkyResources::new(&gpu.device, gpu.format, layouts, sky_vs, sky_fs, width, height),
            cube_globals: ObjectGlobals::new(&gpu.device, layouts, "cube_globals"),
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        let (depth_texture, depth_view) = create_depth_texture(device, width, height);
        self.depth_texture = depth_texture;
        self.depth_view = depth_view;
        self.sky.uniforms.resolution = [width as f32, height as f32];
    }

    /// Push this frame's uniform values: per-object transforms, the sky
    /// clock, and the current material entry's style values
    pub fn upload_frame_uniforms(
        &mut self,
        queue: &wgpu::Queue,
        camera: &Camera,
        scene: &Scene,
        registry: &MaterialRegistry<GpuMaterial>,
        elapsed: f32,
    ) {
        let view_proj = camera.view_proj().to_cols_array_2d();

        let cube = GlobalsUniform {
            view_proj,
            model: scene.cube_transform().to_cols_array_2d(),
        };
        queue.write_buffer(&self.cube_globals.buffer, 0, bytemuck::bytes_of(&cube));

        let sky = GlobalsUniform {
            view_proj,
            model: Mat4::IDENTITY.to_cols_array_2d(),
        };
        queue.write_buffer(&self.sky.globals.buffer, 0, bytemuck::bytes_of(&sky));

        self.sky.uniforms.time = elapsed;
        queue.write_buffer(&self.sky.style_buffer, 0, bytemuck::bytes_of(&self.sky.uniforms));

        let entry = registry.current();
        queue.write_buffer(&entry.material.buffer, 0, bytemuck::bytes_of(&entry.uniforms));
    }

    pub fn draw_frame(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface: &wgpu::Surface,
        scene: &Scene,
        registry: &MaterialRegistry<GpuMaterial>,
    ) -> Result<(), wgpu::SurfaceError> {
        let frame = surface.get_current_texture()?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("encoder"),
        });

        {
            let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.02,
                            b: 0.05,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // Sky dome first, depth writes off
            rp.set_pipeline(&self.sky.pipeline);
            rp.set_bind_group(0, &self.sky.globals.bind_group, &[]);
            rp.set_bind_group(1, &self.sky.style_bind_group, &[]);
            rp.set_vertex_buffer(0, scene.sky.vertex_buffer.slice(..));
            rp.set_index_buffer(scene.sky.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            rp.draw_indexed(0..scene.sky.index_count, 0, 0..1);

            // Cube with whichever material is bound to it
            let entry = registry.entry(scene.cube_material.0);
            rp.set_pipeline(&entry.material.pipeline);
            rp.set_bind_group(0, &self.cube_globals.bind_group, &[]);
            rp.set_bind_group(1, &entry.material.bind_group, &[]);
            rp.set_vertex_buffer(0, scene.cube.vertex_buffer.slice(..));
            rp.set_index_buffer(scene.cube.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            rp.draw_indexed(0..scene.cube.index_count, 0, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_VS: &str = r#"
        @vertex
        fn vs_main(@location(0) pos: vec3<f32>) -> @builtin(position) vec4<f32> {
            return vec4<f32>(pos, 1.0);
        }
    "#;

    #[test]
    fn valid_source_passes_the_check() {
        assert!(check_shader_source("test", MINIMAL_VS, "vs_main"));
    }

    #[test]
    fn empty_source_falls_back() {
        assert!(!check_shader_source("test", "", "vs_main"));
        assert!(!check_shader_source("test", "   \n\t", "vs_main"));
    }

    #[test]
    fn unparseable_source_falls_back() {
        assert!(!check_shader_source("test", "void main() { gl_Position = vec4(0); }", "vs_main"));
    }

    #[test]
    fn missing_entry_point_falls_back() {
        assert!(!check_shader_source("test", MINIMAL_VS, "fs_main"));
    }

    #[test]
    fn fallback_shader_carries_both_entry_points() {
        assert!(check_shader_source("fallback", FALLBACK_SHADER, "vs_main"));
        assert!(check_shader_source("fallback", FALLBACK_SHADER, "fs_main"));
    }

    #[test]
    fn shipped_shaders_all_validate() {
        let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders");
        let mut checked = 0;
        for entry in std::fs::read_dir(root).expect("shaders directory") {
            let path = entry.expect("dir entry").path();
            let source = std::fs::read_to_string(&path).expect("shader text");
            let entry_point = if path.to_string_lossy().contains(".vertex.") {
                "vs_main"
            } else {
                "fs_main"
            };
            assert!(
                check_shader_source(&path.display().to_string(), &source, entry_point),
                "{} should validate",
                path.display()
            );
            checked += 1;
        }
        assert_eq!(checked, 14, "six styles plus the skybox, two stages each");
    }
}
