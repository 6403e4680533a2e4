//! # Core Module
//!
//! The building blocks of the library.
//!
//! - **Molecular Representation** ([`models`]) - Atoms, bonds, topologies, unit cells and frames
//! - **File I/O** ([`io`]) - Stream adapters, the format contract and the codecs
//! - **Selections** ([`selection`]) - Boolean expressions choosing atoms in a frame
//! - **Utilities** ([`utils`]) - Strict token parsing and small geometry helpers

pub mod io;
pub mod models;
pub mod selection;
pub mod utils;
