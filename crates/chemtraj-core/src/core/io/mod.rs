//! Reading and writing trajectory files.
//!
//! Every codec implements the [`format::Format`] contract. Binary codecs work
//! directly on an [`files::xdr::XdrFile`]; line-oriented codecs implement
//! [`text::TextCodec`] and are driven by [`text::TextFormat`], which takes care
//! of compression and of locating frames. The [`registry`] picks the codec for
//! a path.

pub mod diagnostics;
pub mod error;
pub mod files;
pub mod format;
pub mod inchi;
pub mod options;
pub mod registry;
pub mod text;
pub mod trr;
pub mod xyz;
