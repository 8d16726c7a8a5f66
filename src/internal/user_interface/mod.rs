pub mod colors;
pub use colors::StringColor;

pub mod print;
pub use print::ensure_newline;
pub use print::ensure_newline_from_len;
pub use print::term_width;
pub use print::wrap_blocks;
pub use print::wrap_text;
