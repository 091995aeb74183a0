use crate::config::WriterConfig;
use crate::error::WriterError;
use crate::writer::{CodeWriter, IndentSpec};

/// Re-emits `input` under the configured newline style and indentation
/// unit. Each line's leading whitespace is measured and re-rendered
/// (tabs↔spaces, width changes, optional base offset); lines that fall
/// inside a multi-line string literal are passed through verbatim, which
/// the writer's own in-string rule guarantees stay unindented.
pub fn normalize_text(input: &str, config: &WriterConfig) -> Result<String, WriterError> {
    let base = match &config.base_indent {
        Some(raw) => {
            let spec = IndentSpec::parse(raw)?;
            let mut probe = CodeWriter::new(config.clone());
            probe.set_indentation_level(spec)?;
            probe.indentation_level()
        }
        None => 0.0,
    };

    let mut writer = CodeWriter::new(config.clone());
    for (index, line) in lines_of(input).into_iter().enumerate() {
        if index > 0 {
            writer.new_line();
        }
        if writer.is_in_string() {
            writer.write(line);
            continue;
        }
        let trimmed = line.trim_start_matches([' ', '\t']);
        if trimmed.is_empty() {
            continue;
        }
        let leading = &line[..line.len() - trimmed.len()];
        let level = base + writer.indentation_of(leading)?;
        writer.set_indentation_level(level)?;
        writer.write(trimmed);
    }

    if !writer.is_last_newline() {
        writer.new_line();
    }
    Ok(writer.render().to_string())
}

/// Lines split on `\r\n` or bare `\n`, with no trailing phantom line when
/// the input ends in a line break.
fn lines_of(input: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = Vec::new();
    let mut start = 0;
    let bytes = input.as_bytes();
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            b'\n' => {
                lines.push(&input[start..index]);
                index += 1;
                start = index;
            }
            b'\r' if bytes.get(index + 1) == Some(&b'\n') => {
                lines.push(&input[start..index]);
                index += 2;
                start = index;
            }
            _ => index += 1,
        }
    }
    if start < bytes.len() {
        lines.push(&input[start..]);
    }
    lines
}
