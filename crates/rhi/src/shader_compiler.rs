//! GLSL to SPIR-V compilation through an external compiler.
//!
//! The engine never parses GLSL itself. [`GlslcCompiler`] pipes source text
//! into `glslc` and reads the SPIR-V binary back from its stdout.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::error::{RhiError, RhiResult};
use crate::shader::{ShaderStage, spirv_words};

pub trait ShaderCompiler {
    /// Compiles `source` for `stage`. `name` only labels diagnostics.
    fn compile(&self, source: &str, stage: ShaderStage, name: &str) -> RhiResult<Vec<u32>>;

    /// Compiles a `.vert`/`.frag` file, inferring the stage from its extension.
    fn compile_file(&self, path: &Path) -> RhiResult<Vec<u32>> {
        let stage = ShaderStage::from_source_path(path).ok_or_else(|| {
            RhiError::ShaderError(format!("cannot infer shader stage of {}", path.display()))
        })?;
        let source = std::fs::read_to_string(path).map_err(|source| RhiError::ShaderRead {
            path: path.to_path_buf(),
            source,
        })?;
        self.compile(&source, stage, &path.display().to_string())
    }
}

#[derive(Debug, Clone)]
pub struct GlslcCompiler {
    executable: PathBuf,
}

impl GlslcCompiler {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Uses `explicit` when given, else `$VULKAN_SDK/bin/glslc` when it
    /// exists, else plain `glslc` resolved through `PATH`.
    pub fn locate(explicit: Option<&Path>) -> Self {
        let sdk = std::env::var_os("VULKAN_SDK").map(PathBuf::from);
        let compiler = Self::new(resolve_executable(explicit, sdk.as_deref()));
        info!("Using shader compiler {}", compiler.executable.display());
        compiler
    }

    #[inline]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Compiles `source_path` to `output_path` unless the output is newer.
    /// Returns whether a compilation happened.
    pub fn compile_if_stale(&self, source_path: &Path, output_path: &Path) -> RhiResult<bool> {
        if !is_stale(source_path, output_path) {
            return Ok(false);
        }

        let words = self.compile_file(source_path)?;
        let bytes: &[u8] = bytemuck::cast_slice(&words);
        std::fs::write(output_path, bytes).map_err(|source| RhiError::ShaderRead {
            path: output_path.to_path_buf(),
            source,
        })?;
        info!(
            "Compiled {} -> {}",
            source_path.display(),
            output_path.display()
        );
        Ok(true)
    }
}

impl ShaderCompiler for GlslcCompiler {
    fn compile(&self, source: &str, stage: ShaderStage, name: &str) -> RhiResult<Vec<u32>> {
        let compile_error = |message: String| RhiError::ShaderCompileError {
            name: name.to_string(),
            message,
        };

        let mut child = Command::new(&self.executable)
            .arg(format!("-fshader-stage={}", stage.glslc_name()))
            .args(["-o", "-", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                compile_error(format!(
                    "failed to run {}: {}",
                    self.executable.display(),
                    e
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(source.as_bytes())
                .map_err(|e| compile_error(format!("failed to pipe source: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| compile_error(format!("compiler did not finish: {}", e)))?;

        if !output.status.success() {
            return Err(compile_error(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let words = spirv_words(&output.stdout)?;
        debug!("Compiled {} ({} words)", name, words.len());
        Ok(words)
    }
}

fn resolve_executable(explicit: Option<&Path>, vulkan_sdk: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    let binary = if cfg!(target_os = "windows") {
        "glslc.exe"
    } else {
        "glslc"
    };

    if let Some(sdk) = vulkan_sdk {
        let candidate = sdk.join(if cfg!(target_os = "windows") { "Bin" } else { "bin" }).join(binary);
        if candidate.exists() {
            return candidate;
        }
    }

    PathBuf::from(binary)
}

fn is_stale(source: &Path, output: &Path) -> bool {
    let modified = |path: &Path| std::fs::metadata(path).and_then(|m| m.modified()).ok();
    match (modified(source), modified(output)) {
        (Some(src), Some(out)) => src > out,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_compiler_wins() {
        let path = resolve_executable(Some(Path::new("/opt/glslc")), Some(Path::new("/sdk")));
        assert_eq!(path, PathBuf::from("/opt/glslc"));
    }

    #[test]
    fn test_missing_sdk_falls_back_to_path_lookup() {
        let path = resolve_executable(None, Some(Path::new("/definitely/not/an/sdk")));
        assert!(path.ends_with(if cfg!(target_os = "windows") {
            "glslc.exe"
        } else {
            "glslc"
        }));
        assert!(!path.starts_with("/definitely"));
    }

    #[test]
    fn test_missing_output_is_stale() {
        assert!(is_stale(
            Path::new("Cargo.toml"),
            Path::new("does-not-exist.spv")
        ));
    }

    #[test]
    fn test_missing_compiler_reports_compile_error() {
        let compiler = GlslcCompiler::new("lumen-no-such-compiler");
        let err = compiler
            .compile("void main() {}", ShaderStage::Fragment, "inline.frag")
            .unwrap_err();
        match err {
            RhiError::ShaderCompileError { name, .. } => assert_eq!(name, "inline.frag"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
