//! Common utilities shared by the parser and the detector.

mod columns;
mod whole_word;

pub use columns::{utf16_column, utf16_len, LineIndex};
pub use whole_word::{find_whole_class, is_class_char};
