/// Shader source retrieval.
///
/// Loads never fail from the caller's point of view: a missing or unreadable
/// resource logs a diagnostic and yields empty text, and the view layer
/// substitutes a fallback shader for anything that is empty or does not
/// validate. Single attempt, no retry, no timeout.
use std::fs;
use std::path::PathBuf;

use tracing::{debug, error};

/// Seam between the material registry and wherever shader text comes from.
#[allow(async_fn_in_trait)]
pub trait ShaderSourceLoader {
    /// Retrieve the text payload for a resource path, or `""` on failure.
    async fn load(&self, path: &str) -> String;
}

/// Loads shader text from the filesystem, relative to an asset root.
pub struct FsShaderLoader {
    root: PathBuf,
}

impl FsShaderLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root taken from `SHADER_GALLERY_ASSETS`, defaulting to the working directory.
    pub fn from_env() -> Self {
        let root = std::env::var("SHADER_GALLERY_ASSETS").unwrap_or_else(|_| ".".to_string());
        Self::new(root)
    }
}

impl ShaderSourceLoader for FsShaderLoader {
    async fn load(&self, path: &str) -> String {
        let full = self.root.join(path);
        match fs::read_to_string(&full) {
            Ok(text) => {
                debug!("loaded shader {} ({} bytes)", path, text.len());
                text
            }
            Err(e) => {
                error!("error loading shader {}: {}", full.display(), e);
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_resource_yields_empty_text() {
        let loader = FsShaderLoader::new("/nonexistent/asset/root");
        let text = pollster::block_on(loader.load("shaders/flat.vertex.wgsl"));
        assert_eq!(text, "", "failed load must degrade to empty text");
    }

    #[test]
    fn existing_resource_yields_full_text() {
        let loader = FsShaderLoader::new(env!("CARGO_MANIFEST_DIR"));
        let text = pollster::block_on(loader.load("shaders/flat.vertex.wgsl"));
        assert!(text.contains("vs_main"), "should return the file contents");
    }
}
