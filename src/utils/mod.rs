//! Utility modules for the site builder.

pub mod date;
pub mod fs;
pub mod html;
pub mod minify;
