pub mod cell;
pub mod glyph;
pub mod grid;
