//! Formatted-text emission engine for code generators: a writer that
//! tracks lexical context (strings, comments, regex literals) so caller
//! snippets are never indented inside a quoted region, plus a
//! string-aware newline/indentation normalizer built on top of it.

pub mod config;
pub mod error;
pub mod normalize;
pub mod writer;
