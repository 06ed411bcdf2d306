//! Engine configuration loaded from TOML.
//!
//! Every field has a default, so a partial file (or no file at all) is valid.
//!
//! ```toml
//! [window]
//! title = "lumen"
//! width = 1280
//! height = 720
//!
//! [shaders]
//! directory = "shaders"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::logging::DEFAULT_LOG_FILTER;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowSettings,
    pub renderer: RendererSettings,
    pub shaders: ShaderSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "lumen".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Enables the Khronos validation layer when it is installed.
    pub enable_validation: bool,
    /// Color the swap-chain image is cleared to, linear RGBA.
    pub clear_color: [f32; 4],
    /// Prefer FIFO presentation over mailbox.
    pub vsync: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            clear_color: [0.01, 0.01, 0.01, 1.0],
            vsync: false,
        }
    }
}

/// Where shader sources and binaries live, and how to compile them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderSettings {
    pub directory: PathBuf,
    /// Explicit path to `glslc`. When unset the compiler is looked up in the
    /// Vulkan SDK and then on `PATH`.
    pub compiler: Option<PathBuf>,
    /// Fragment template carrying the `#define TEXTURES_COUNT` line.
    pub texture_template: String,
    /// File the texture render system writes its generated fragment shader to.
    pub texture_generated: String,
}

impl Default for ShaderSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("shaders"),
            compiler: None,
            texture_template: "texture_shader.frag".to_string(),
            texture_generated: "texture_shader_generated.frag".to_string(),
        }
    }
}

impl ShaderSettings {
    /// Joins `name` onto the shader directory.
    pub fn resolve(&self, name: impl AsRef<Path>) -> PathBuf {
        self.directory.join(name)
    }

    pub fn texture_template_path(&self) -> PathBuf {
        self.resolve(&self.texture_template)
    }

    pub fn texture_generated_path(&self) -> PathBuf {
        self.resolve(&self.texture_generated)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl EngineConfig {
    /// Loads the config at `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&text).map_err(|message| Error::Config {
            path: path.to_path_buf(),
            message,
        })?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, String> {
        let config: Self = toml::from_str(text).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            ));
        }
        if self.shaders.texture_template == self.shaders.texture_generated {
            return Err("texture_generated must differ from texture_template".to_string());
        }
        Ok(())
    }
}
