//! # chemtraj
//!
//! Reading and writing molecular structure and trajectory files through one
//! interface, whatever the layout on disk.
//!
//! ## Layout
//!
//! - **[`core`]: The Foundation.** The molecular graph (`Frame`, `Atom`,
//!   `Topology`), the strict token parser, the stream adapters and the codecs.
//!   Every codec implements the same [`Format`] contract: random access with
//!   `read_step`, sequential `read`, appending `write` and `nsteps`.
//!
//! - **[`trajectory`]: The Public API.** [`Trajectory`] picks a codec from the
//!   options, the extension or the file content and hands out frames.
//!
//! ```no_run
//! use chemtraj::{Mode, Trajectory};
//!
//! let mut trajectory = Trajectory::open("run.trr", Mode::Read)?;
//! let last = trajectory.nsteps()? - 1;
//! let frame = trajectory.read_step(last)?;
//! println!("{} atoms at step {}", frame.size(), frame.step());
//! # Ok::<(), chemtraj::Error>(())
//! ```

pub mod core;
pub mod trajectory;

pub use crate::core::io::diagnostics::{Diagnostics, Warning};
pub use crate::core::io::error::{Error, Result};
pub use crate::core::io::files::{Compression, Mode};
pub use crate::core::io::format::{Format, FormatMetadata};
pub use crate::core::io::options::{OpenOptions, TrajectoryConfig};
pub use crate::core::models::atom::Atom;
pub use crate::core::models::cell::UnitCell;
pub use crate::core::models::frame::Frame;
pub use crate::core::models::topology::{Bond, BondOrder, Topology};
pub use crate::core::selection::{Selection, SelectionError};
pub use crate::trajectory::Trajectory;
