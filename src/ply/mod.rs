//! Definitions used to model PLY files.

mod property;
mod ply_data_structure;
mod key_map;
mod default_element;

pub use self::property::*;
pub use self::ply_data_structure::*;
pub use self::key_map::*;
pub use self::default_element::*;
