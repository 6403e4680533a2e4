//! Small shared helpers: the text token parser and geometric predicates.

pub mod geometry;
pub mod parse;
