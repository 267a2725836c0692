//! Core data structures representing a PLY file.
//!
//! This module defines [`Ply`], its [`Header`], and the type definitions needed to
//! describe element/property declarations. A [`Header`] is the per-file schema:
//! built once per parse and not modified afterwards.

use std::fmt::{ Display, Formatter };
use std::fmt;
use std::str::FromStr;

use serde::{ Deserialize, Serialize };

use super::PropertyType;
use super::KeyMap;
use super::PropertyAccess;
use crate::errors::{ DataError, PlyResult };

/// A whole PLY file held in memory with dynamically typed rows.
///
/// The generic parameter `E` is the element type used to store the payload data.
#[derive(Debug, Clone, PartialEq)]
pub struct Ply<E: PropertyAccess> {
    /// All header information found in a PLY file.
    pub header: Header,
    /// The payload found after the `end_header` line, grouped by element name
    /// in header order.
    ///
    /// ```rust,no_run
    /// # use plydiff::ply::{Ply, DefaultElement};
    /// # let ply = Ply::<DefaultElement>::new();
    /// let third_vertex_x = &ply.payload["vertex"][2]["x"];
    /// ```
    pub payload: Payload<E>,
}

impl<E: PropertyAccess> Default for Ply<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PropertyAccess> Ply<E> {
    /// Creates a new `Ply<E>`.
    pub fn new() -> Self {
        Ply::<E> {
            header: Header::new(),
            payload: Payload::new(),
        }
    }

    /// Sets every element's `count` to the number of rows in the payload.
    ///
    /// Elements declared in the header without payload get a count of zero.
    /// Payload entries without a header declaration are an error.
    pub fn make_consistent(&mut self) -> PlyResult<()> {
        for (name, rows) in &self.payload {
            match self.header.elements.get_mut(name) {
                Some(e) => e.count = rows.len() as u64,
                None => return Err(DataError::Inconsistent(
                    format!("payload element '{}' is not declared in the header", name)
                ).into()),
            }
        }
        for (name, e) in self.header.elements.iter_mut() {
            if !self.payload.contains_key(name) {
                e.count = 0;
            }
        }
        Ok(())
    }
}

/// Models the header of a PLY file.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Header {
    /// In which format is the payload encoded?
    pub encoding: Encoding,
    /// Which file format standard is used? Only "1.0" exists.
    pub version: Version,
    /// Arbitrary object metadata lines (`obj_info ...`) as found in the header.
    pub obj_infos: Vec<ObjInfo>,
    /// Ordered map of elements as they appear in the payload.
    pub elements: KeyMap<ElementDef>,
    /// File comments.
    pub comments: Vec<Comment>,
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}

impl Header {
    /// Constructs an empty `Header` using ASCII encoding and version 1.0.
    pub fn new() -> Self {
        Header {
            encoding: Encoding::Ascii,
            version: Version::V1_0,
            obj_infos: Vec::new(),
            elements: KeyMap::new(),
            comments: Vec::new(),
        }
    }
}

/// Alias to give object information an explicit type.
pub type ObjInfo = String;

/// Alias to give comments an explicit type.
pub type Comment = String;

/// Models a version number.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Version {
    /// Major version number.
    pub major: u16,
    /// Minor version number.
    pub minor: u8,
}

impl Version {
    /// The only version of the format in existence.
    pub const V1_0: Version = Version { major: 1, minor: 0 };
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Models possible encoding standards for the payload.
///
/// Serialized with its header spelling, e.g. `"binary_little_endian"`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// Numbers in their decimal representation, one row per line.
    Ascii,
    /// Raw values, most significant byte first.
    BinaryBigEndian,
    /// Raw values, least significant byte first.
    BinaryLittleEndian,
}

impl Encoding {
    /// Every supported encoding, in the order the harness visits them.
    pub const ALL: [Encoding; 3] = [
        Encoding::Ascii,
        Encoding::BinaryLittleEndian,
        Encoding::BinaryBigEndian,
    ];
}

impl Display for Encoding {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        f.write_str(
            match *self {
                Encoding::Ascii => "ascii",
                Encoding::BinaryBigEndian => "binary_big_endian",
                Encoding::BinaryLittleEndian => "binary_little_endian",
            }
        )
    }
}

impl FromStr for Encoding {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "ascii" => Ok(Encoding::Ascii),
            "binary_big_endian" => Ok(Encoding::BinaryBigEndian),
            "binary_little_endian" => Ok(Encoding::BinaryLittleEndian),
            _ => Err(()),
        }
    }
}

/// Models the definition of an element.
///
/// Elements are named, counted groups of rows sharing one property schema,
/// e.g. `vertex` with `x`, `y`, `z`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ElementDef {
    /// Name of the element, unique within a file.
    pub name: String,
    /// How many rows of this element the payload holds.
    pub count: u64,
    /// Properties in the order they appear within a row.
    pub properties: KeyMap<PropertyDef>,
}

impl ElementDef {
    /// Creates a new element definition with no properties and a count of zero.
    pub fn new(name: String) -> Self {
        ElementDef {
            name,
            count: 0,
            properties: KeyMap::new(),
        }
    }
}

/// Defines a property of an element.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PropertyDef {
    /// Name of property, unique within its element.
    pub name: String,
    /// Scalar or list type of the property.
    pub data_type: PropertyType,
}

impl PropertyDef {
    /// Creates a new property definition.
    pub fn new(name: String, data_type: PropertyType) -> Self {
        PropertyDef {
            name,
            data_type,
        }
    }
}

/// The part after `end_header`, contains the main data.
pub type Payload<E> = KeyMap<Vec<E>>;
