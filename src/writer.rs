use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::config::WriterConfig;
use crate::error::WriterError;

mod buffer;
mod escape;
mod indent;
mod scanner;

use buffer::FragmentBuffer;
use indent::IndentationController;
use scanner::{CommentKind, LexicalScanner};

pub use indent::IndentSpec;

/// Formatted-text emission engine: tracks lexical context (strings,
/// comments, regex literals) while writing so that indentation is only
/// applied to lines that are really code, and indentation changes can be
/// queued, scoped, or made conditional on block structure.
///
/// All text funnels through two primitives: the splitting text writer and
/// the newline committer. Infallible operations return `&mut Self` for
/// chaining; fallible ones return `Result<&mut Self, WriterError>`.
#[derive(Debug)]
pub struct CodeWriter {
    config: WriterConfig,
    quote_char: char,
    buffer: FragmentBuffer,
    scanner: LexicalScanner,
    indent: IndentationController,
    newline_on_next_write: bool,
    on_first_line_of_block: bool,
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new(WriterConfig::default())
    }
}

impl CodeWriter {
    pub fn new(config: WriterConfig) -> Self {
        let indent = IndentationController::new(config.indent_unit(), config.indent_width, config.use_tabs);
        let quote_char = config.quote_char();
        Self {
            config,
            quote_char,
            buffer: FragmentBuffer::new(),
            scanner: LexicalScanner::new(),
            indent,
            newline_on_next_write: false,
            on_first_line_of_block: true,
        }
    }

    pub fn options(&self) -> &WriterConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Indentation

    pub fn indentation_level(&self) -> f64 {
        self.indent.level()
    }

    /// Level a run of leading whitespace corresponds to under the
    /// configured indentation unit.
    pub fn indentation_of(&self, whitespace: &str) -> Result<f64, WriterError> {
        self.indent.level_of_whitespace(whitespace)
    }

    /// Sets the indentation level immediately.
    pub fn set_indentation_level(&mut self, spec: impl Into<IndentSpec>) -> Result<&mut Self, WriterError> {
        let spec = spec.into();
        self.indent.set_spec(&spec)?;
        Ok(self)
    }

    /// Queues an indentation level that takes effect at the next committed
    /// newline.
    pub fn queue_indentation_level(&mut self, spec: impl Into<IndentSpec>) -> Result<&mut Self, WriterError> {
        let spec = spec.into();
        self.indent.queue_spec(&spec)?;
        Ok(self)
    }

    /// Runs `action` at the given indentation level, restoring the full
    /// indentation state afterward even if the action panics.
    pub fn with_indentation_level(
        &mut self,
        spec: impl Into<IndentSpec>,
        action: impl FnOnce(&mut Self),
    ) -> Result<&mut Self, WriterError> {
        let spec = spec.into();
        let level = self.indent.resolve(&spec)?;
        Ok(self.with_reset_indentation(|writer| writer.indent.set_level_raw(level), action))
    }

    /// Writes within `action` with hanging indentation: one extra level,
    /// queued to start on the next line.
    pub fn hanging_indent(&mut self, action: impl FnOnce(&mut Self)) -> &mut Self {
        let level = self.indent.level() + 1.0;
        self.with_reset_indentation(|writer| writer.indent.queue_level(level), action)
    }

    /// Like [`Self::hanging_indent`], except the queued level is dropped
    /// when the first line turns out to open a brace block.
    pub fn hanging_indent_unless_block(&mut self, action: impl FnOnce(&mut Self)) -> &mut Self {
        let level = self.indent.level() + 1.0;
        self.with_reset_indentation(
            |writer| {
                writer.indent.queue_level(level);
                writer.indent.mark_queued_conditional();
            },
            action,
        )
    }

    fn with_reset_indentation(
        &mut self,
        prepare: impl FnOnce(&mut Self),
        action: impl FnOnce(&mut Self),
    ) -> &mut Self {
        let saved = self.indent.snapshot();
        prepare(self);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| action(&mut *self)));
        self.indent.restore(saved);
        if let Err(payload) = outcome {
            panic::resume_unwind(payload);
        }
        self
    }

    // ------------------------------------------------------------------
    // Blocks

    /// Writes a brace block: a separating space if needed, `{`, the body
    /// one level deeper, then `}` on its own line. An empty body still
    /// renders as `{` and `}` on separate lines.
    pub fn block(&mut self, action: impl FnOnce(&mut Self)) -> &mut Self {
        self.flush_pending_newline();
        if self.len() > 0 && !self.is_last_newline() {
            self.space_if_last_not();
        }
        self.inline_block(action);
        self.newline_on_next_write = true;
        self
    }

    /// Like [`Self::block`] without the separating space or trailing
    /// newline request.
    pub fn inline_block(&mut self, action: impl FnOnce(&mut Self)) -> &mut Self {
        self.flush_pending_newline();
        self.write("{");
        self.indent_block_internal(action);
        self.new_line_if_last_not();
        self.write("}");
        self
    }

    /// Indents everything written by `action` one level, without braces.
    pub fn indent_block(&mut self, action: impl FnOnce(&mut Self)) -> &mut Self {
        self.indent_block_internal(action);
        if !self.is_last_newline() {
            self.newline_on_next_write = true;
        }
        self
    }

    /// Writes `times` indentation units as plain text on the current line.
    pub fn indent(&mut self, times: usize) -> &mut Self {
        self.flush_pending_newline();
        let unit = self.indent.unit().repeat(times);
        self.write(&unit)
    }

    fn indent_block_internal(&mut self, action: impl FnOnce(&mut Self)) {
        if self.last_char().is_some() {
            self.new_line_if_last_not();
        }
        self.indent.increment();
        self.on_first_line_of_block = true;
        action(self);
        self.on_first_line_of_block = false;
        self.indent.decrement_clamped();
    }

    // ------------------------------------------------------------------
    // Writing

    /// Writes text, splitting on line breaks and indenting each new line
    /// that is not inside a string.
    pub fn write(&mut self, text: &str) -> &mut Self {
        self.flush_pending_newline();
        self.write_indenting_newlines(text);
        self
    }

    pub fn conditional_write(&mut self, condition: bool, text: &str) -> &mut Self {
        if condition {
            self.write(text);
        }
        self
    }

    /// Writes `text` on its own line: moves to a fresh line first if
    /// needed, then commits a newline after.
    pub fn write_line(&mut self, text: &str) -> &mut Self {
        self.flush_pending_newline();
        if self.last_char().is_some() {
            self.new_line_if_last_not();
        }
        self.write_indenting_newlines(text);
        self.new_line();
        self
    }

    pub fn conditional_write_line(&mut self, condition: bool, text: &str) -> &mut Self {
        if condition {
            self.write_line(text);
        }
        self
    }

    /// Commits exactly one newline. Consecutive calls produce consecutive
    /// blank lines verbatim.
    pub fn new_line(&mut self) -> &mut Self {
        self.newline_on_next_write = false;
        self.base_write_newline();
        self
    }

    pub fn new_line_if_last_not(&mut self) -> &mut Self {
        self.flush_pending_newline();
        if !self.is_last_newline() {
            self.new_line();
        }
        self
    }

    pub fn conditional_new_line(&mut self, condition: bool) -> &mut Self {
        if condition {
            self.new_line();
        }
        self
    }

    pub fn blank_line(&mut self) -> &mut Self {
        self.new_line_if_last_not().new_line()
    }

    pub fn blank_line_if_last_not(&mut self) -> &mut Self {
        if !self.is_last_blank_line() {
            self.blank_line();
        }
        self
    }

    pub fn conditional_blank_line(&mut self, condition: bool) -> &mut Self {
        if condition {
            self.blank_line();
        }
        self
    }

    /// Writes the configured quote character.
    pub fn quote(&mut self) -> &mut Self {
        self.flush_pending_newline();
        let text = self.quote_char.to_string();
        self.write_indenting_newlines(&text);
        self
    }

    /// Writes `text` surrounded by the configured quote character, with
    /// its interior escaped for that context.
    pub fn quote_text(&mut self, text: &str) -> &mut Self {
        self.flush_pending_newline();
        let quoted = format!(
            "{quote}{}{quote}",
            escape::escape_for_within_string(text, self.quote_char),
            quote = self.quote_char,
        );
        self.write_indenting_newlines(&quoted);
        self
    }

    pub fn space(&mut self) -> &mut Self {
        self.spaces(1)
    }

    pub fn spaces(&mut self, times: usize) -> &mut Self {
        self.flush_pending_newline();
        self.write_indenting_newlines(&" ".repeat(times));
        self
    }

    pub fn space_if_last_not(&mut self) -> &mut Self {
        self.flush_pending_newline();
        if !self.is_last_space() {
            self.write_indenting_newlines(" ");
        }
        self
    }

    pub fn tab(&mut self) -> &mut Self {
        self.tabs(1)
    }

    pub fn tabs(&mut self, times: usize) -> &mut Self {
        self.flush_pending_newline();
        self.write_indenting_newlines(&"\t".repeat(times));
        self
    }

    pub fn tab_if_last_not(&mut self) -> &mut Self {
        self.flush_pending_newline();
        if !self.is_last_tab() {
            self.write_indenting_newlines("\t");
        }
        self
    }

    /// Writes whatever closes the comment the writer is currently inside:
    /// a newline for a line comment, `*/` for a block comment.
    pub fn close_comment(&mut self) -> &mut Self {
        match self.scanner.comment_kind() {
            Some(CommentKind::Line) => {
                self.new_line();
            }
            Some(CommentKind::Block) => {
                if !self.is_last_newline() {
                    self.space_if_last_not();
                }
                self.write("*/");
            }
            None => {}
        }
        self
    }

    /// Inserts text at a character position. Except when inserting at the
    /// very end (an ordinary write), this bypasses the scanner and
    /// indentation machinery: the inserted text is spliced in verbatim.
    pub fn insert_at(&mut self, position: usize, text: &str) -> Result<&mut Self, WriterError> {
        let length = self.len();
        if position > length {
            return Err(WriterError::OutOfRange { position, length });
        }
        if position == length {
            return Ok(self.write(text));
        }
        self.buffer.insert(position, text);
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Queries

    /// Total characters written so far.
    pub fn len(&self) -> usize {
        self.buffer.char_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_in_string(&self) -> bool {
        self.scanner.is_in_string()
    }

    pub fn is_in_comment(&self) -> bool {
        self.scanner.is_in_comment()
    }

    pub fn is_in_regex(&self) -> bool {
        self.scanner.is_in_regex()
    }

    pub fn is_on_first_line_of_block(&self) -> bool {
        self.on_first_line_of_block
    }

    pub fn is_at_start_of_first_line_of_block(&self) -> bool {
        self.on_first_line_of_block && (self.is_last_newline() || self.last_char().is_none())
    }

    pub fn is_last_newline(&self) -> bool {
        matches!(self.last_char(), Some('\n' | '\r'))
    }

    pub fn is_last_blank_line(&self) -> bool {
        let mut newlines = 0;
        self.buffer
            .find_map_rev(|ch| match ch {
                '\n' => {
                    newlines += 1;
                    if newlines == 2 { Some(true) } else { None }
                }
                '\r' => None,
                _ => Some(false),
            })
            .unwrap_or(false)
    }

    pub fn is_last_space(&self) -> bool {
        self.last_char() == Some(' ')
    }

    pub fn is_last_tab(&self) -> bool {
        self.last_char() == Some('\t')
    }

    pub fn last_char(&self) -> Option<char> {
        self.buffer.last_char()
    }

    /// Character `offset` positions before the end (0 = last character).
    pub fn char_from_end(&self, offset: usize) -> Option<char> {
        self.buffer.char_from_end(offset)
    }

    pub fn ends_with(&self, text: &str) -> bool {
        self.buffer.ends_with(text)
    }

    /// The full output. Compacts internal storage; calling it repeatedly
    /// without intervening writes does no further work.
    pub fn render(&mut self) -> &str {
        self.buffer.render()
    }

    // ------------------------------------------------------------------
    // Engine

    fn flush_pending_newline(&mut self) {
        if self.newline_on_next_write {
            self.newline_on_next_write = false;
            self.base_write_newline();
        }
    }

    fn write_indenting_newlines(&mut self, text: &str) {
        if text.is_empty() {
            self.write_segment("");
            return;
        }
        let segments = split_on_newlines(text);
        for (index, segment) in segments.iter().enumerate() {
            if index > 0 {
                self.base_write_newline();
            }
            if !segment.is_empty() {
                self.write_segment(segment);
            }
        }
    }

    /// Writes one line-break-free segment: indentation first when at the
    /// start of a line outside a string, then the segment itself, scanned
    /// character by character with the buffer's tail as lookbehind.
    fn write_segment(&mut self, segment: &str) {
        if !self.scanner.is_in_string() {
            let at_line_start = matches!(self.buffer.last_char(), None | Some('\n' | '\r'));
            if at_line_start {
                let leading = self.indent.render();
                self.buffer.append(&leading);
            }
        }
        self.scan_text(segment);
        self.buffer.append(segment);
    }

    fn scan_text(&mut self, text: &str) {
        let mut past = self.buffer.last_char();
        let mut past_past = self.buffer.char_from_end(1);
        for ch in text.chars() {
            self.scanner.observe(ch, past, past_past);
            past_past = past;
            past = Some(ch);
        }
    }

    /// The single newline primitive: updates the scanner, appends the
    /// configured newline string, and consumes any queued indentation.
    fn base_write_newline(&mut self) {
        self.scanner.observe_newline(self.buffer.last_char());
        self.buffer.append(self.config.newline.as_str());
        self.on_first_line_of_block = false;
        if self.indent.has_queued() {
            let last_was_block = self.last_line_opened_block();
            self.indent.dequeue(last_was_block);
        }
    }

    /// Whether the line that just ended (a newline was committed) had an
    /// opening brace as its last character.
    fn last_line_opened_block(&self) -> bool {
        let mut found_newline = false;
        self.buffer
            .find_map_rev(|ch| match ch {
                '\n' => {
                    if found_newline {
                        Some(false)
                    } else {
                        found_newline = true;
                        None
                    }
                }
                '\r' => None,
                '{' => Some(true),
                _ => Some(false),
            })
            .unwrap_or(false)
    }
}

impl fmt::Display for CodeWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for fragment in self.buffer.fragments() {
            f.write_str(fragment)?;
        }
        Ok(())
    }
}

/// Splits on `\r\n` and bare `\n`, treating each as a single line-break
/// token, so embedded newline style never leaks into the output.
fn split_on_newlines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            b'\n' => {
                segments.push(&text[start..index]);
                index += 1;
                start = index;
            }
            b'\r' if bytes.get(index + 1) == Some(&b'\n') => {
                segments.push(&text[start..index]);
                index += 2;
                start = index;
            }
            _ => index += 1,
        }
    }
    segments.push(&text[start..]);
    segments
}
