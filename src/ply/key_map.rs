//! Ordered map used for schemas and dynamic rows.
//!
//! Element and property order is significant in PLY, so every map in this
//! crate is an [`indexmap::IndexMap`] behind the [`KeyMap`] alias.

use indexmap::IndexMap;
use super::ElementDef;
use super::PropertyDef;

/// Alias to reduce coupling with map implementation
pub type KeyMap<V> = IndexMap<String, V>;

/// Stores a value under the key it carries itself.
pub trait Addable<V: Key> {
    /// Inserts `new_value` under `new_value.get_key()`.
    fn add(&mut self, new_value: V);
}

impl<V: Key> Addable<V> for KeyMap<V> {
    fn add(&mut self, value: V) {
        self.insert(value.get_key(), value);
    }
}

/// Something that knows the name it should be stored under.
pub trait Key {
    fn get_key(&self) -> String;
}

impl Key for ElementDef {
    fn get_key(&self) -> String {
        self.name.clone()
    }
}

impl Key for PropertyDef {
    fn get_key(&self) -> String {
        self.name.clone()
    }
}
