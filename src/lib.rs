//! Reader/writer for Source-engine `VBSP` map files: the 64-lump container
//! format, the nested game-lump directory (including static props), entity
//! text, the `PAKFILE` ZIP bridge, the visibility tree, and the
//! Source-engine spatial types (`Vector`/`Angle`/`Matrix`) used throughout.
//!
//! Start with [`BspFile::read`] to parse a file and [`BspFile::write`] or
//! [`BspFile::save`] to serialize one back out. The lump-specific decoders
//! (entities, static props, vis tree, texture names) are exposed as methods
//! on [`BspFile`]; the lower-level per-lump types are also public for
//! callers who only need one piece.

mod atomic;
mod bspfile;
mod entities;
mod error;
mod game_lump;
mod header;
mod lump;
mod math;
mod packfile;
mod static_prop;
mod texture;
mod vis;

pub use bspfile::BspFile;
pub use entities::{Entity, Output, OutputSeparator, Vmf};
pub use error::{BspError, EntityParseError, ValidationError};
pub use game_lump::{GameLump, GameLumpFlags, GameLumpHeader, GameLumpId};
pub use header::{BspVersion, Header};
pub use lump::{Lump, LumpId};
pub use math::{Angle, Matrix, Vector};
pub use packfile::PackfileSession;
pub use static_prop::{SolidType, StaticProp, StaticPropFlags, StaticPropLump};
pub use texture::read_texture_table;
pub use vis::{NodeRef, Plane, TreeNode, VisLeaf, VisTree};
