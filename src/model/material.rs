/// Material registry and per-frame update dispatch.
///
/// Each selectable visual style pairs a shader-backed material with an
/// optional per-frame update hook, so heterogeneous styles (static and
/// animated) are swappable through one interface without inspecting the
/// style at the call site. The GPU half is generic so selection and tick
/// semantics stay testable without a device.
use tracing::debug;

use crate::loader::ShaderSourceLoader;

/// Fixed uniform set shared by every style. Animated styles drive `time`
/// and `aux_input`; the rest is set once at creation (resolution is
/// refreshed on resize).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StyleUniform {
    pub color: [f32; 4],
    pub light_dir: [f32; 3],
    pub time: f32,
    pub resolution: [f32; 2],
    pub aux_input: f32,
    pub _pad: f32,
}

impl StyleUniform {
    pub fn with_color(color: [f32; 4]) -> Self {
        Self {
            color,
            light_dir: [0.4, 0.8, 0.6],
            time: 0.0,
            resolution: [1.0, 1.0],
            aux_input: 0.0,
            _pad: 0.0,
        }
    }
}

/// Per-frame update hook: `(uniforms, elapsed seconds, auxiliary input)`.
/// Must only touch the uniforms it is handed.
pub type UpdateFn = fn(&mut StyleUniform, f32, f32);

/// Static description of one gallery style: where its shader text lives
/// and how its entry starts out.
#[derive(Debug, Clone)]
pub struct MaterialDesc {
    pub name: &'static str,
    pub vertex_path: &'static str,
    pub fragment_path: &'static str,
    pub uniforms: StyleUniform,
    pub update: Option<UpdateFn>,
    pub wireframe: bool,
}

/// One selectable entry: uniform values plus the GPU-side material `M`.
pub struct MaterialEntry<M> {
    pub name: &'static str,
    pub uniforms: StyleUniform,
    pub update: Option<UpdateFn>,
    pub material: M,
}

/// Bound-material slot of a renderable surface. Written only by
/// `select_initial` and `advance`; read once per frame by the render pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BoundMaterial(pub usize);

/// Ordered, non-empty (once populated) sequence of material entries with a
/// cyclic current selection.
pub struct MaterialRegistry<M> {
    entries: Vec<MaterialEntry<M>>,
    current: usize,
}

impl<M> MaterialRegistry<M> {
    pub fn new() -> Self {
        Self { entries: Vec::new(), current: 0 }
    }

    /// Build one entry per descriptor, in order. Each entry performs two
    /// loads (vertex then fragment, suspend points on the single logical
    /// thread) before `build` turns the text into a material. A failed
    /// load produces empty text, not an aborted populate: later entries
    /// still load and the count always matches the descriptor count.
    pub async fn populate<L, B>(loader: &L, descs: &[MaterialDesc], mut build: B) -> Self
    where
        L: ShaderSourceLoader,
        B: FnMut(&MaterialDesc, &str, &str) -> M,
    {
        let mut registry = Self::new();
        for desc in descs {
            let vertex = loader.load(desc.vertex_path).await;
            let fragment = loader.load(desc.fragment_path).await;
            let material = build(desc, &vertex, &fragment);
            registry.push(MaterialEntry {
                name: desc.name,
                uniforms: desc.uniforms,
                update: desc.update,
                material,
            });
        }
        registry
    }

    pub fn push(&mut self, entry: MaterialEntry<M>) {
        debug!("registered material '{}' at index {}", entry.name, self.entries.len());
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &MaterialEntry<M> {
        &self.entries[self.current]
    }

    pub fn entry(&self, index: usize) -> &MaterialEntry<M> {
        &self.entries[index]
    }

    pub fn entries(&self) -> &[MaterialEntry<M>] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [MaterialEntry<M>] {
        &mut self.entries
    }

    /// Bind the first entry to the target surface. Precondition: populated.
    pub fn select_initial(&mut self, surface: &mut BoundMaterial) {
        debug_assert!(!self.entries.is_empty(), "select_initial on empty registry");
        self.current = 0;
        surface.0 = 0;
    }

    /// Cyclically advance the selection and rebind the target surface.
    /// One call per trigger, no debounce.
    pub fn advance(&mut self, surface: &mut BoundMaterial) {
        debug_assert!(!self.entries.is_empty(), "advance on empty registry");
        self.current = (self.current + 1) % self.entries.len();
        surface.0 = self.current;
        debug!("switched to material '{}'", self.entries[self.current].name);
    }

    /// Run the current entry's update hook, if it has one. Called once per
    /// frame, after any pending advance, before the frame is drawn.
    pub fn tick(&mut self, elapsed: f32, aux_input: f32) {
        let Some(entry) = self.entries.get_mut(self.current) else {
            return;
        };
        if let Some(update) = entry.update {
            update(&mut entry.uniforms, elapsed, aux_input);
        }
    }
}

impl<M> Default for MaterialRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::FsShaderLoader;

    fn drive(u: &mut StyleUniform, elapsed: f32, aux: f32) {
        u.time = elapsed;
        u.aux_input = aux;
    }

    fn registry(n: usize, animated: bool) -> MaterialRegistry<()> {
        let mut registry = MaterialRegistry::new();
        for i in 0..n {
            registry.push(MaterialEntry {
                name: "entry",
                uniforms: StyleUniform::with_color([i as f32, 0.0, 0.0, 1.0]),
                update: if animated { Some(drive as UpdateFn) } else { None },
                material: (),
            });
        }
        registry
    }

    #[test]
    fn select_initial_binds_first_entry() {
        let mut registry = registry(6, false);
        let mut surface = BoundMaterial(3);
        registry.select_initial(&mut surface);
        assert_eq!(surface, BoundMaterial(0));
        assert_eq!(registry.current_index(), 0);
    }

    #[test]
    fn advance_wraps_cyclically() {
        let mut registry = registry(6, false);
        let mut surface = BoundMaterial::default();
        registry.select_initial(&mut surface);
        for _ in 0..7 {
            registry.advance(&mut surface);
        }
        assert_eq!(registry.current_index(), 1, "7 mod 6");
        assert_eq!(surface, BoundMaterial(1));
    }

    #[test]
    fn advance_index_tracks_call_count_mod_len() {
        for len in 1..5 {
            let mut registry = registry(len, false);
            let mut surface = BoundMaterial::default();
            for k in 1..=10 {
                registry.advance(&mut surface);
                assert_eq!(registry.current_index(), k % len);
            }
        }
    }

    #[test]
    fn tick_without_update_leaves_uniforms_unchanged() {
        let mut registry = registry(2, false);
        let before = registry.current().uniforms;
        for _ in 0..5 {
            registry.tick(42.0, 0.7);
        }
        assert_eq!(registry.current().uniforms, before);
    }

    #[test]
    fn tick_passes_time_through_exactly() {
        let mut registry = registry(3, true);
        registry.tick(12.5, 0.3);
        assert_eq!(registry.current().uniforms.time, 12.5);
        assert_eq!(registry.current().uniforms.aux_input, 0.3);
    }

    #[test]
    fn tick_touches_only_the_current_entry() {
        let mut registry = registry(3, true);
        let untouched = registry.entry(1).uniforms;
        registry.tick(12.5, 0.3);
        assert_eq!(registry.entry(1).uniforms, untouched);
        assert_eq!(registry.entry(2).uniforms, untouched);
        assert_ne!(registry.entry(0).uniforms.time, untouched.time);
    }

    #[test]
    fn populate_is_degraded_not_aborted() {
        // Every load fails against this root, yet all entries come out in order.
        let loader = FsShaderLoader::new("/nonexistent/asset/root");
        let descs: Vec<MaterialDesc> = ["a", "b", "c"]
            .iter()
            .map(|&name| MaterialDesc {
                name,
                vertex_path: "missing.vertex.wgsl",
                fragment_path: "missing.fragment.wgsl",
                uniforms: StyleUniform::with_color([1.0, 1.0, 1.0, 1.0]),
                update: None,
                wireframe: false,
            })
            .collect();

        let registry = pollster::block_on(MaterialRegistry::populate(
            &loader,
            &descs,
            |_, vs, fs| {
                assert_eq!(vs, "");
                assert_eq!(fs, "");
            },
        ));

        assert_eq!(registry.len(), 3);
        let names: Vec<_> = registry.entries().iter().map(|e| e.name).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
