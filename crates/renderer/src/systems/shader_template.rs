//! Text rewriting of the textured fragment shader.
//!
//! The template declares the texture array size with a single
//! `#define TEXTURES_COUNT <n>` line. Generating for a count replaces that
//! line, and while the count is non-zero also declares `TEXTURES` and the
//! sampler array right after it, so code guarded by `#ifdef TEXTURES`
//! compiles only when there is something to sample.

use std::path::Path;

use tracing::{debug, error};

use crate::error::{RenderError, RenderResult};

/// Prefix of the line carrying the texture count.
pub const TEXTURES_COUNT_PREFIX: &str = "#define TEXTURES_COUNT ";
pub const TEXTURES_DEFINE: &str = "#define TEXTURES";
pub const SAMPLER_ARRAY_DECLARATION: &str =
    "layout(set = 1, binding = 0) uniform sampler2D texSampler[TEXTURES_COUNT];";

/// A validated template: source lines plus the position of the count line.
#[derive(Debug, Clone)]
pub struct FragmentShaderTemplate {
    lines: Vec<String>,
    count_line: usize,
}

impl FragmentShaderTemplate {
    /// Fails unless exactly one line starts with [`TEXTURES_COUNT_PREFIX`]
    /// and nothing already declares what generation injects.
    pub fn parse(source: &str) -> RenderResult<Self> {
        let lines: Vec<String> = source.lines().map(str::to_string).collect();

        let mut count_lines = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.trim_start().starts_with(TEXTURES_COUNT_PREFIX))
            .map(|(index, _)| index);
        let count_line = count_lines.next().ok_or_else(|| {
            RenderError::ShaderTemplate(format!("no line starts with '{}'", TEXTURES_COUNT_PREFIX.trim_end()))
        })?;
        if let Some(duplicate) = count_lines.next() {
            return Err(RenderError::ShaderTemplate(format!(
                "'{}' appears on lines {} and {}",
                TEXTURES_COUNT_PREFIX.trim_end(),
                count_line + 1,
                duplicate + 1
            )));
        }

        if let Some(index) = lines
            .iter()
            .position(|line| is_injected_line(line.trim()))
        {
            return Err(RenderError::ShaderTemplate(format!(
                "line {} declares '{}' itself",
                index + 1,
                lines[index].trim()
            )));
        }

        Ok(Self { lines, count_line })
    }

    pub fn load(path: &Path) -> RenderResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| {
            error!("Failed to read fragment shader template {}: {}", path.display(), source);
            RenderError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::parse(&source)
    }

    /// Zero-based index of the count line.
    #[inline]
    pub fn count_line(&self) -> usize {
        self.count_line
    }
}

fn is_injected_line(line: &str) -> bool {
    line == TEXTURES_DEFINE || line == SAMPLER_ARRAY_DECLARATION
}

/// Rewrites a template in place for successive texture counts.
///
/// The injected lines are tracked per generator, so repeated generation
/// never declares them twice.
#[derive(Debug, Clone)]
pub struct FragmentShaderGenerator {
    lines: Vec<String>,
    count_line: usize,
    textures_declared: bool,
}

impl FragmentShaderGenerator {
    pub fn new(template: FragmentShaderTemplate) -> Self {
        Self {
            lines: template.lines,
            count_line: template.count_line,
            textures_declared: false,
        }
    }

    /// Shader source for `texture_count` textures.
    pub fn generate(&mut self, texture_count: u32) -> String {
        self.lines[self.count_line] = format!("{}{}", TEXTURES_COUNT_PREFIX, texture_count);

        match (texture_count > 0, self.textures_declared) {
            (true, false) => {
                self.lines.insert(self.count_line + 1, TEXTURES_DEFINE.to_string());
                self.lines
                    .insert(self.count_line + 2, SAMPLER_ARRAY_DECLARATION.to_string());
                self.textures_declared = true;
            }
            (false, true) => {
                self.lines.drain(self.count_line + 1..self.count_line + 3);
                self.textures_declared = false;
            }
            _ => {}
        }

        debug!(
            "Generated fragment shader for {} texture(s) (sampler array {})",
            texture_count,
            if self.textures_declared { "declared" } else { "omitted" }
        );

        let mut source = self.lines.join("\n");
        source.push('\n');
        source
    }

    #[inline]
    pub fn textures_declared(&self) -> bool {
        self.textures_declared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "#version 450\n#define TEXTURES_COUNT 0\n\nlayout(location = 0) out vec4 outColor;\n\nvoid main() {\n#ifdef TEXTURES\n    outColor = texture(texSampler[0], vec2(0.0));\n#endif\n}\n";

    fn generator() -> FragmentShaderGenerator {
        FragmentShaderGenerator::new(FragmentShaderTemplate::parse(TEMPLATE).unwrap())
    }

    fn occurrences(source: &str, line: &str) -> usize {
        source.lines().filter(|l| l.trim() == line).count()
    }

    #[test]
    fn test_parse_finds_count_line() {
        let template = FragmentShaderTemplate::parse(TEMPLATE).unwrap();
        assert_eq!(template.count_line(), 1);
    }

    #[test]
    fn test_parse_rejects_missing_count_line() {
        let err = FragmentShaderTemplate::parse("#version 450\nvoid main() {}\n").unwrap_err();
        assert!(matches!(err, RenderError::ShaderTemplate(_)));
    }

    #[test]
    fn test_parse_rejects_duplicate_count_line() {
        let source = "#define TEXTURES_COUNT 0\n#define TEXTURES_COUNT 1\n";
        let err = FragmentShaderTemplate::parse(source).unwrap_err();
        assert!(err.to_string().contains("lines 1 and 2"));
    }

    #[test]
    fn test_parse_rejects_predeclared_textures() {
        let source = "#define TEXTURES_COUNT 0\n#define TEXTURES\n";
        assert!(FragmentShaderTemplate::parse(source).is_err());
    }

    #[test]
    fn test_generate_injects_declarations_after_count_line() {
        let source = generator().generate(3);
        let lines: Vec<&str> = source.lines().collect();

        assert_eq!(lines[1], "#define TEXTURES_COUNT 3");
        assert_eq!(lines[2], TEXTURES_DEFINE);
        assert_eq!(lines[3], SAMPLER_ARRAY_DECLARATION);
    }

    #[test]
    fn test_generate_zero_omits_declarations() {
        let mut generator = generator();
        let source = generator.generate(0);

        assert!(source.contains("#define TEXTURES_COUNT 0\n"));
        assert_eq!(occurrences(&source, TEXTURES_DEFINE), 0);
        assert_eq!(occurrences(&source, SAMPLER_ARRAY_DECLARATION), 0);
        assert!(!generator.textures_declared());
    }

    #[test]
    fn test_repeated_generation_declares_once() {
        let mut generator = generator();
        generator.generate(3);
        let source = generator.generate(5);

        assert!(source.contains("#define TEXTURES_COUNT 5\n"));
        assert!(!source.contains("#define TEXTURES_COUNT 3"));
        assert_eq!(occurrences(&source, TEXTURES_DEFINE), 1);
        assert_eq!(occurrences(&source, SAMPLER_ARRAY_DECLARATION), 1);
    }

    #[test]
    fn test_returning_to_zero_removes_declarations() {
        let mut generator = generator();
        generator.generate(2);
        let source = generator.generate(0);

        assert_eq!(source, TEMPLATE);
        assert!(!generator.textures_declared());

        let again = generator.generate(1);
        assert_eq!(occurrences(&again, TEXTURES_DEFINE), 1);
    }

    #[test]
    fn test_untouched_lines_are_preserved() {
        let source = generator().generate(4);
        assert!(source.starts_with("#version 450\n"));
        assert!(source.contains("#ifdef TEXTURES\n"));
        assert!(source.ends_with("}\n"));
    }
}
