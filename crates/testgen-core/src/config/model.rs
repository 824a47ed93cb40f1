use crate::error::{Result, TestgenError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Widest integer type the limit macros support
pub const MAX_INTEGER_BITS: u32 = 64;

/// Toolchain and target description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Compiler command
    pub compiler: String,
    /// Optional runner for the compiled tests
    #[serde(default)]
    pub simulator: Option<String>,
    #[serde(default)]
    pub c_flags: Vec<String>,
    #[serde(default)]
    pub ld_flags: Vec<String>,
    /// Option sets each test is built with
    #[serde(default)]
    pub options: Vec<String>,
    /// Output root for generated tests
    pub testdir: PathBuf,
    #[serde(default)]
    pub compile_only: bool,
    pub size: SizeConfig,
    /// Per-test timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_parallels")]
    pub parallels: usize,
    #[serde(default)]
    pub color: bool,
    #[serde(default = "default_lang")]
    pub lang: String,
    /// Marker a passing test prints
    #[serde(default = "default_expect")]
    pub expect: String,
    /// Signed integer representation: 1 or 2's complement
    #[serde(default = "default_complement")]
    pub complement: u8,
    #[serde(default = "default_output_option")]
    pub output_option: String,
    #[serde(default = "default_option_separator")]
    pub option_separator: String,
    #[serde(default = "default_has_printf")]
    pub has_printf: bool,
    /// Searched for includes after every template directory
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,
}

/// Integer type widths in bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeConfig {
    pub char: u32,
    pub short: u32,
    pub int: u32,
    pub long: u32,
    #[serde(default)]
    pub long_long: Option<u32>,
    #[serde(default)]
    pub pointer: Option<u32>,
}

fn default_timeout() -> u64 {
    10
}

fn default_parallels() -> usize {
    1
}

fn default_lang() -> String {
    "c".to_string()
}

fn default_expect() -> String {
    "@OK@".to_string()
}

fn default_complement() -> u8 {
    2
}

fn default_output_option() -> String {
    "-o".to_string()
}

fn default_option_separator() -> String {
    " ".to_string()
}

fn default_has_printf() -> bool {
    true
}

fn invalid(field: &str, reason: impl Into<String>) -> TestgenError {
    TestgenError::ConfigInvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

impl Config {
    /// Read and validate a configuration file
    ///
    /// `.toml` files are parsed as TOML, anything else as JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TestgenError::ConfigParseError(format!("{}: {}", path.display(), e))
        })?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let config = if is_toml {
            Self::from_toml_str(&content)?
        } else {
            Self::from_json_str(&content)?
        };

        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.compiler.trim().is_empty() {
            return Err(invalid("compiler", "must not be empty"));
        }
        if self.testdir.as_os_str().is_empty() {
            return Err(invalid("testdir", "must not be empty"));
        }

        let sizes = [
            ("size.char", Some(self.size.char)),
            ("size.short", Some(self.size.short)),
            ("size.int", Some(self.size.int)),
            ("size.long", Some(self.size.long)),
            ("size.long_long", self.size.long_long),
        ];
        for (field, bits) in sizes {
            if let Some(bits) = bits {
                if bits == 0 || bits > MAX_INTEGER_BITS {
                    return Err(invalid(
                        field,
                        format!("must be between 1 and {} (got {})", MAX_INTEGER_BITS, bits),
                    ));
                }
            }
        }
        if self.size.pointer == Some(0) {
            return Err(invalid("size.pointer", "must not be zero"));
        }

        if !matches!(self.complement, 1 | 2) {
            return Err(invalid(
                "complement",
                format!("must be 1 or 2 (got {})", self.complement),
            ));
        }

        Ok(())
    }

    /// Check that the compiler, and the simulator if set, are on `PATH`
    pub fn verify_toolchain(&self) -> Result<()> {
        let tools = std::iter::once(&self.compiler).chain(self.simulator.as_ref());

        for tool in tools {
            let program = tool.split_whitespace().next().unwrap_or(tool);
            match which::which(program) {
                Ok(found) => log::debug!("{} resolved to {}", program, found.display()),
                Err(_) => {
                    return Err(TestgenError::ToolNotFound {
                        tool: program.to_string(),
                    })
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testgen_testkit::temp_dir_in_workspace;

    const FULL_JSON: &str = r##"
{
  "compiler":  "gcc",
  "simulator": "gdb",
  "c_flags":     [ "-g", "-Dunix" ],
  "ld_flags":    [ "-lm" ],
  "options":     [ "-O0", "-O2" ],
  "testdir":     "testsuite",
  "compile_only": true,

  "size": {
       "char": 8,
       "short": 16,
       "int": 32,
       "long": 64,
       "pointer" : 64
  },

  "timeout": 5,
  "parallels": 2,
  "color": true,

  "lang": "c++",
  "expect": "#OK#",
  "complement": 1,
  "option_separator": "--",
  "has_printf": false
}
"##;

    const MINIMAL_TOML: &str = r#"
compiler = "cc"
testdir = "out"

[size]
char = 8
short = 16
int = 32
long = 64
"#;

    #[test]
    fn test_parse_full_json() {
        let config = Config::from_json_str(FULL_JSON).unwrap();
        assert_eq!(config.compiler, "gcc");
        assert_eq!(config.simulator.as_deref(), Some("gdb"));
        assert_eq!(config.c_flags, vec!["-g", "-Dunix"]);
        assert_eq!(config.ld_flags, vec!["-lm"]);
        assert_eq!(config.options, vec!["-O0", "-O2"]);
        assert_eq!(config.testdir, PathBuf::from("testsuite"));
        assert!(config.compile_only);
        assert_eq!(config.size.int, 32);
        assert_eq!(config.size.pointer, Some(64));
        assert_eq!(config.size.long_long, None);
        assert_eq!(config.timeout, 5);
        assert_eq!(config.parallels, 2);
        assert!(config.color);
        assert_eq!(config.lang, "c++");
        assert_eq!(config.expect, "#OK#");
        assert_eq!(config.complement, 1);
        assert_eq!(config.option_separator, "--");
        assert!(!config.has_printf);
    }

    #[test]
    fn test_parse_minimal_toml_defaults() {
        let config = Config::from_toml_str(MINIMAL_TOML).unwrap();
        assert_eq!(config.simulator, None);
        assert!(config.options.is_empty());
        assert!(!config.compile_only);
        assert_eq!(config.timeout, 10);
        assert_eq!(config.parallels, 1);
        assert!(!config.color);
        assert_eq!(config.lang, "c");
        assert_eq!(config.expect, "@OK@");
        assert_eq!(config.complement, 2);
        assert_eq!(config.output_option, "-o");
        assert_eq!(config.option_separator, " ");
        assert!(config.has_printf);
        assert!(config.include_paths.is_empty());
    }

    #[test]
    fn test_missing_required_field() {
        let result = Config::from_json_str(r#"{ "compiler": "cc", "testdir": "out" }"#);
        assert!(matches!(result, Err(TestgenError::ConfigParseError(_))));
    }

    #[test]
    fn test_invalid_complement() {
        let toml = format!("complement = 3\n{}", MINIMAL_TOML);
        match Config::from_toml_str(&toml) {
            Err(TestgenError::ConfigInvalidValue { field, .. }) => assert_eq!(field, "complement"),
            other => panic!("Expected ConfigInvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_size() {
        let toml = MINIMAL_TOML.replace("int = 32", "int = 128");
        match Config::from_toml_str(&toml) {
            Err(TestgenError::ConfigInvalidValue { field, reason }) => {
                assert_eq!(field, "size.int");
                assert!(reason.contains("128"), "got: {}", reason);
            }
            other => panic!("Expected ConfigInvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_compiler() {
        let toml = MINIMAL_TOML.replace("\"cc\"", "\"  \"");
        assert!(matches!(
            Config::from_toml_str(&toml),
            Err(TestgenError::ConfigInvalidValue { .. })
        ));
    }

    #[test]
    fn test_from_file_picks_format_by_extension() {
        let temp = temp_dir_in_workspace();
        let toml_path = temp.path().join("testgen.toml");
        let json_path = temp.path().join("testgen.json");
        std::fs::write(&toml_path, MINIMAL_TOML).unwrap();
        std::fs::write(&json_path, FULL_JSON).unwrap();

        assert_eq!(Config::from_file(&toml_path).unwrap().compiler, "cc");
        assert_eq!(Config::from_file(&json_path).unwrap().compiler, "gcc");
    }

    #[test]
    fn test_from_file_missing() {
        let temp = temp_dir_in_workspace();
        let result = Config::from_file(temp.path().join("absent.json"));
        assert!(matches!(result, Err(TestgenError::ConfigParseError(_))));
    }

    #[test]
    fn test_verify_toolchain_missing_compiler() {
        let mut config = Config::from_toml_str(MINIMAL_TOML).unwrap();
        config.compiler = "testgen-no-such-compiler-xyz".to_string();
        match config.verify_toolchain() {
            Err(TestgenError::ToolNotFound { tool }) => {
                assert_eq!(tool, "testgen-no-such-compiler-xyz")
            }
            other => panic!("Expected ToolNotFound, got {:?}", other),
        }
    }
}
