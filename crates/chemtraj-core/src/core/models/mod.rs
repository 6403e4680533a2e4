//! # Molecular Graph Model
//!
//! The in-memory representation every codec reads into and writes from.
//!
//! ## Overview
//!
//! A [`frame::Frame`] is one snapshot: an ordered sequence of atoms, their
//! positions (and optional velocities), a shared [`topology::Topology`], an
//! optional [`cell::UnitCell`] and a step index. Atoms are identified by their
//! index in the frame; bonds are unordered index pairs that must reference
//! atoms of the same frame, and a pair can only be bonded once.
//!
//! ## Key Components
//!
//! - [`atom`] - Atom name, type, mass, charge and property bag
//! - [`element`] - Static element table (symbols, numbers, natural masses)
//! - [`property`] - Typed, name-keyed metadata values
//! - [`topology`] - Bonds, bond orders and residues
//! - [`cell`] - Periodic boundary description
//! - [`frame`] - The snapshot tying everything together

pub mod atom;
pub mod cell;
pub mod element;
pub mod frame;
pub mod property;
pub mod topology;
