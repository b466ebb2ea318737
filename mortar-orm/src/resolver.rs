//! Column position to struct field resolution.

use std::collections::BTreeMap;

use crate::reflect::Field;
use crate::tag::Tag;

/// The field a column resolved to, with the field's parsed tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub field: usize,
    pub tag: Tag,
}

/// Maps column positions to field indexes.
///
/// A field matches a column when the column name equals the field's tag
/// column or, absent one, its snake_case name. Columns without a match are
/// left out. When several fields resolve to the same column the last one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    entries: BTreeMap<usize, Resolution>,
}

impl ColumnMap {
    pub fn resolve<S: AsRef<str>>(columns: &[S], fields: &[Field]) -> Self {
        let mut entries = BTreeMap::new();
        for (index, field) in fields.iter().enumerate() {
            let tag = Tag::parse(field.tag);
            let name = tag.column_name(field.name);
            for (position, column) in columns.iter().enumerate() {
                if column.as_ref() == name {
                    entries.insert(position, Resolution { field: index, tag: tag.clone() });
                }
            }
        }
        ColumnMap { entries }
    }

    pub fn get(&self, position: usize) -> Option<&Resolution> {
        self.entries.get(&position)
    }

    /// Entries in column order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Resolution)> {
        self.entries.iter().map(|(position, res)| (*position, res))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{Kind, Shape};

    fn field(name: &'static str, tag: &'static str) -> Field {
        Field { name, tag, shape: Shape::Scalar(Kind::String) }
    }

    #[test]
    fn resolves_regardless_of_column_order() {
        let fields = [field("a", ""), field("b", "")];
        let map = ColumnMap::resolve(&["b", "a"], &fields);
        assert_eq!(map.get(0).map(|r| r.field), Some(1));
        assert_eq!(map.get(1).map(|r| r.field), Some(0));
    }

    #[test]
    fn tag_overrides_field_name() {
        let fields = [field("number", "emp_no"), field("first_name", "")];
        let map = ColumnMap::resolve(&["emp_no", "first_name", "gender"], &fields);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(0).map(|r| r.field), Some(0));
        assert!(map.get(2).is_none());
    }

    #[test]
    fn last_matching_field_wins() {
        let fields = [field("name", ""), field("alias", "name")];
        let map = ColumnMap::resolve(&["name"], &fields);
        assert_eq!(map.get(0).map(|r| r.field), Some(1));
    }
}
