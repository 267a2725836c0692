//! Default row representation.
//!
//! [`DefaultElement`] is a map from property name to [`Property`], preserving
//! insertion order. It can hold a row of any element, which is what the
//! property codec needs for elements it does not understand.

use super::KeyMap;
use super::Property;
use super::PropertyAccess;

/// Ready to use data-structure for all kind of element definitions.
pub type DefaultElement = KeyMap<Property>;

macro_rules! scalar_getter {
    ($name:ident, $variant:ident, $t:ty) => {
        fn $name(&self, key: &str) -> Option<$t> {
            match self.get(key)? {
                Property::$variant(x) => Some(*x),
                _ => None,
            }
        }
    };
}

macro_rules! list_getter {
    ($name:ident, $variant:ident, $t:ty) => {
        fn $name(&self, key: &str) -> Option<&[$t]> {
            match self.get(key)? {
                Property::$variant(x) => Some(x.as_slice()),
                _ => None,
            }
        }
    };
}

impl PropertyAccess for DefaultElement {
    fn new() -> Self {
        DefaultElement::new()
    }
    fn set_property(&mut self, key: &str, property: Property) {
        self.insert(key.to_string(), property);
    }
    scalar_getter!(get_char, Char, i8);
    scalar_getter!(get_uchar, UChar, u8);
    scalar_getter!(get_short, Short, i16);
    scalar_getter!(get_ushort, UShort, u16);
    scalar_getter!(get_int, Int, i32);
    scalar_getter!(get_uint, UInt, u32);
    scalar_getter!(get_float, Float, f32);
    scalar_getter!(get_double, Double, f64);
    list_getter!(get_list_char, ListChar, i8);
    list_getter!(get_list_uchar, ListUChar, u8);
    list_getter!(get_list_short, ListShort, i16);
    list_getter!(get_list_ushort, ListUShort, u16);
    list_getter!(get_list_int, ListInt, i32);
    list_getter!(get_list_uint, ListUInt, u32);
    list_getter!(get_list_float, ListFloat, f32);
    list_getter!(get_list_double, ListDouble, f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn getters_match_only_their_variant() {
        let mut e = <DefaultElement as PropertyAccess>::new();
        e.set_property("x", Property::Float(1.5));
        e.set_property("idx", Property::ListInt(vec![0, 1, 2]));
        assert_eq!(e.get_float("x"), Some(1.5));
        assert_eq!(e.get_double("x"), None);
        assert_eq!(e.get_list_int("idx"), Some(&[0, 1, 2][..]));
        assert_eq!(e.get_list_uint("idx"), None);
        assert_eq!(e.get_float("missing"), None);
    }
}
