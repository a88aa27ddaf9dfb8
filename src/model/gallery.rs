/// The six styles of the material gallery, in selection order.
use super::material::{MaterialDesc, StyleUniform};

/// Shared hook for the animated styles: pass the frame clock and the
/// pointer-derived scalar straight through, no smoothing.
fn drive_animation(uniforms: &mut StyleUniform, elapsed: f32, aux_input: f32) {
    uniforms.time = elapsed;
    uniforms.aux_input = aux_input;
}

fn style(name: &'static str, vertex_path: &'static str, fragment_path: &'static str) -> MaterialDesc {
    MaterialDesc {
        name,
        vertex_path,
        fragment_path,
        uniforms: StyleUniform::with_color([1.0, 1.0, 1.0, 1.0]),
        update: None,
        wireframe: false,
    }
}

pub fn styles() -> Vec<MaterialDesc> {
    vec![
        MaterialDesc {
            uniforms: StyleUniform::with_color([0.0, 1.0, 0.0, 1.0]),
            ..style("flat", "shaders/flat.vertex.wgsl", "shaders/flat.fragment.wgsl")
        },
        MaterialDesc {
            uniforms: StyleUniform::with_color([0.9, 0.45, 0.15, 1.0]),
            ..style("phong", "shaders/phong.vertex.wgsl", "shaders/phong.fragment.wgsl")
        },
        MaterialDesc {
            uniforms: StyleUniform::with_color([0.35, 0.2, 0.8, 1.0]),
            update: Some(drive_animation),
            ..style("pattern", "shaders/pattern.vertex.wgsl", "shaders/pattern.fragment.wgsl")
        },
        MaterialDesc {
            uniforms: StyleUniform::with_color([0.1, 0.3, 0.7, 1.0]),
            update: Some(drive_animation),
            ..style("water", "shaders/water.vertex.wgsl", "shaders/water.fragment.wgsl")
        },
        MaterialDesc {
            uniforms: StyleUniform::with_color([0.2, 0.9, 0.9, 1.0]),
            update: Some(drive_animation),
            wireframe: true,
            ..style("rim", "shaders/rim.vertex.wgsl", "shaders/rim.fragment.wgsl")
        },
        MaterialDesc {
            uniforms: StyleUniform::with_color([0.85, 0.2, 0.2, 1.0]),
            ..style("toon", "shaders/toon.vertex.wgsl", "shaders/toon.fragment.wgsl")
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gallery_has_six_styles_in_order() {
        let names: Vec<_> = styles().iter().map(|d| d.name).collect();
        assert_eq!(names, ["flat", "phong", "pattern", "water", "rim", "toon"]);
    }

    #[test]
    fn every_style_names_its_two_shader_resources() {
        for desc in styles() {
            assert_eq!(desc.vertex_path, format!("shaders/{}.vertex.wgsl", desc.name));
            assert_eq!(desc.fragment_path, format!("shaders/{}.fragment.wgsl", desc.name));
        }
    }

    #[test]
    fn animated_styles_carry_an_update_hook() {
        for desc in styles() {
            let animated = matches!(desc.name, "pattern" | "water" | "rim");
            assert_eq!(desc.update.is_some(), animated, "style {}", desc.name);
        }
    }

    #[test]
    fn drive_animation_is_a_direct_passthrough() {
        let mut uniforms = StyleUniform::with_color([1.0; 4]);
        drive_animation(&mut uniforms, 3.25, 0.5);
        assert_eq!(uniforms.time, 3.25);
        assert_eq!(uniforms.aux_input, 0.5);
    }
}
