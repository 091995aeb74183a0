use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Line-break sequence emitted by the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewlineStyle {
    #[default]
    Lf,
    Crlf,
}

impl NewlineStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            NewlineStyle::Lf => "\n",
            NewlineStyle::Crlf => "\r\n",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    pub newline: NewlineStyle,
    pub indent_width: usize,
    pub use_tabs: bool,
    pub use_single_quote: bool,
    pub base_indent: Option<String>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            newline: NewlineStyle::Lf,
            indent_width: 4,
            use_tabs: false,
            use_single_quote: false,
            base_indent: None,
        }
    }
}

impl WriterConfig {
    pub fn quote_char(&self) -> char {
        if self.use_single_quote { '\'' } else { '"' }
    }

    /// One indentation unit as text: a tab, or `indent_width` spaces.
    pub fn indent_unit(&self) -> String {
        if self.use_tabs {
            "\t".to_string()
        } else {
            " ".repeat(self.indent_width)
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<WriterConfig> {
    if let Some(path) = path {
        return read_config_file(path);
    }

    let default_path = PathBuf::from("code-writer.toml");
    if default_path.exists() {
        return read_config_file(&default_path);
    }

    Ok(WriterConfig::default())
}

fn read_config_file(path: &Path) -> Result<WriterConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read config file {}", path.display()))?;
    let mut config: WriterConfig =
        toml::from_str(&contents).with_context(|| format!("invalid config file {}", path.display()))?;

    // Guard against invalid zero widths so level derivation never divides by zero.
    if config.indent_width == 0 {
        config.indent_width = 4;
    }

    Ok(config)
}
