mod string;

pub use string::{char_prefix, truncate_at_boundary, truncate_with_marker};
