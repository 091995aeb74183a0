use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Entry on the literal stack. The writer is "inside a string" iff the
/// stack is non-empty and its top is not `PlaceholderBrace`; a placeholder
/// on top means a `${ … }` hole inside a template literal, where ordinary
/// code rules apply until the matching `}` pops it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LiteralKind {
    DoubleQuote,
    SingleQuote,
    TemplateQuote,
    PlaceholderBrace,
}

impl LiteralKind {
    fn from_quote(ch: char) -> Option<Self> {
        match ch {
            '"' => Some(Self::DoubleQuote),
            '\'' => Some(Self::SingleQuote),
            '`' => Some(Self::TemplateQuote),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommentKind {
    Line,
    Block,
}

// Characters the rules below can react to. Everything else is inert, so
// the cascade is skipped for it.
static INTERESTING_CHARS: Lazy<HashSet<char>> = Lazy::new(|| {
    ['\\', '/', '\n', '\r', '*', '"', '\'', '`', '{', '}'].into_iter().collect()
});

/// Character-classification state machine deciding whether the writer is
/// currently inside a string, comment, or regex literal. Fed one character
/// at a time with the two previously committed characters as lookbehind,
/// which may come from the buffer when a write begins mid-line.
#[derive(Debug, Default)]
pub(crate) struct LexicalScanner {
    stack: Vec<LiteralKind>,
    comment: Option<CommentKind>,
    in_regex: bool,
}

impl LexicalScanner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_in_string(&self) -> bool {
        !matches!(self.stack.last(), None | Some(LiteralKind::PlaceholderBrace))
    }

    pub(crate) fn is_in_comment(&self) -> bool {
        self.comment.is_some()
    }

    pub(crate) fn comment_kind(&self) -> Option<CommentKind> {
        self.comment
    }

    pub(crate) fn is_in_regex(&self) -> bool {
        self.in_regex
    }

    pub(crate) fn observe(&mut self, current: char, past: Option<char>, past_past: Option<char>) {
        if !INTERESTING_CHARS.contains(&current) {
            return;
        }

        if self.in_regex {
            let ended = (past == Some('/') && past_past != Some('\\')) || past == Some('\n');
            if ended {
                self.in_regex = false;
            } else {
                return;
            }
        } else if !self.is_in_string()
            && !self.is_in_comment()
            && is_regex_start(current, past, past_past)
        {
            self.in_regex = true;
            return;
        }

        match self.comment {
            None if past == Some('/') && current == '/' => self.comment = Some(CommentKind::Line),
            None if past == Some('/') && current == '*' => self.comment = Some(CommentKind::Block),
            Some(CommentKind::Block) if past == Some('*') && current == '/' => self.comment = None,
            _ => {}
        }
        if self.is_in_comment() {
            return;
        }

        let top = self.stack.last().copied();
        if let Some(kind) = LiteralKind::from_quote(current) {
            if past == Some('\\') {
                return;
            }
            if top == Some(kind) {
                self.stack.pop();
            } else if matches!(top, None | Some(LiteralKind::PlaceholderBrace)) {
                self.stack.push(kind);
            }
        } else if current == '{'
            && past == Some('$')
            && past_past != Some('\\')
            && top == Some(LiteralKind::TemplateQuote)
        {
            self.stack.push(LiteralKind::PlaceholderBrace);
        } else if current == '}' && top == Some(LiteralKind::PlaceholderBrace) {
            self.stack.pop();
        }
    }

    /// Hook for a committed newline: line comments end, and a plain-quoted
    /// string that was left open is popped unless the line ended with a
    /// backslash continuation. Template literals span newlines freely.
    pub(crate) fn observe_newline(&mut self, last_char: Option<char>) {
        if self.comment == Some(CommentKind::Line) {
            self.comment = None;
        }
        if matches!(
            self.stack.last(),
            Some(LiteralKind::DoubleQuote | LiteralKind::SingleQuote)
        ) && last_char != Some('\\')
        {
            self.stack.pop();
        }
    }
}

fn is_regex_start(current: char, past: Option<char>, past_past: Option<char>) -> bool {
    past == Some('/')
        && current != '/'
        && current != '*'
        && past_past != Some('*')
        && past_past != Some('/')
}
