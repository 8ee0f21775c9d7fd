//! Utility functions and helpers.

pub mod http;
pub mod text;
pub mod url;

pub use self::url::{canonicalize, resolve};
pub use text::{collapse_whitespace, strip_markup, truncate_chars};
