//! # Model Module
//!
//! Renders application values into SQL fragments. This is the mirror image
//! of the rows parser:
//!
//! - [`insert_values`]: `VALUES (v1, v2), (v3, v4)` from a struct, map or
//!   scalar, or a vector of any of them
//! - [`update_set`]: `SET c1 = v1, c2 = v2` from a struct or map
//! - [`create_table_body`]: the parenthesized column and constraint list of
//!   `CREATE TABLE` from a struct's field tags
//!
//! ## Example
//!
//! ```rust,ignore
//! let employees = vec![
//!     Employee { emp_no: 1001, first_name: "Taro".into() },
//!     Employee { emp_no: 1002, first_name: "Jiro".into() },
//! ];
//! let columns = ["emp_no".to_string(), "first_name".to_string()];
//! assert_eq!(
//!     insert_values(&employees, &columns)?,
//!     "VALUES (1001, 'Taro'), (1002, 'Jiro')",
//! );
//! ```

use crate::database::Drivers;
use crate::errors::{Error, Result};
use crate::reflect::{Reflect, Shape};
use crate::resolver::ColumnMap;
use crate::tag::Tag;
use crate::types::sql_type;
use crate::value::{LiteralOptions, Value, to_literal};

// ============================================================================
// INSERT
// ============================================================================

/// Renders the `VALUES` fragment of an insert for the target `columns`.
pub fn insert_values<T: Reflect>(model: &T, columns: &[String]) -> Result<String> {
    let tuples = match T::shape() {
        Shape::Slice => value_rows(model.elements(), columns)?,
        _ => value_rows(std::slice::from_ref(model), columns)?,
    };
    if tuples.is_empty() {
        return Err(Error::invalid_value(format!("{} holds no rows to insert", T::type_name())));
    }

    let tuples: Vec<String> = tuples.iter().map(|row| format!("({})", row.join(", "))).collect();
    Ok(format!("VALUES {}", tuples.join(", ")))
}

// One vector of literals per element, in column order.
fn value_rows<E: Reflect>(elems: &[E], columns: &[String]) -> Result<Vec<Vec<String>>> {
    match E::shape() {
        Shape::Struct => {
            let map = resolve_all::<E>(columns)?;
            elems.iter().map(|elem| struct_literals(elem, &map, columns.len())).collect()
        }
        Shape::Map => elems.iter().map(|elem| map_literals(elem, columns)).collect(),
        Shape::Scalar(_) => {
            if columns.len() != 1 {
                return Err(Error::invalid_syntax(format!(
                    "inserting {} needs exactly one column, got {}",
                    E::type_name(),
                    columns.len()
                )));
            }
            elems.iter().map(|elem| Ok(vec![literal(&elem.to_value()?, None)?])).collect()
        }
        Shape::Slice => Err(Error::invalid_type(format!("{} cannot be used as a model", E::type_name()))),
    }
}

// ============================================================================
// UPDATE
// ============================================================================

/// Renders the `SET` fragment of an update for the target `columns`.
pub fn update_set<T: Reflect>(model: &T, columns: &[String]) -> Result<String> {
    let literals = match T::shape() {
        Shape::Struct => struct_literals(model, &resolve_all::<T>(columns)?, columns.len())?,
        Shape::Map => map_literals(model, columns)?,
        _ => return Err(Error::invalid_type(format!("{} cannot be used as an update model", T::type_name()))),
    };

    let pairs: Vec<String> =
        columns.iter().zip(literals).map(|(column, literal)| format!("{column} = {literal}")).collect();
    Ok(format!("SET {}", pairs.join(", ")))
}

// ============================================================================
// CREATE TABLE
// ============================================================================

#[derive(Default)]
struct ConstraintGroup {
    name: String,
    columns: Vec<String>,
    reference: Option<String>,
}

// Groups keep first-seen order so the rendered SQL is stable.
fn add_to_group(groups: &mut Vec<ConstraintGroup>, name: Option<&str>, column: &str, reference: Option<&str>) {
    let Some(name) = name else { return };
    let idx = match groups.iter().position(|g| g.name == name) {
        Some(idx) => idx,
        None => {
            groups.push(ConstraintGroup { name: name.to_string(), ..Default::default() });
            groups.len() - 1
        }
    };
    let group = &mut groups[idx];
    group.columns.push(column.to_string());
    if group.reference.is_none() {
        group.reference = reference.map(str::to_string);
    }
}

/// Renders `(col type [NOT NULL] [DEFAULT x], ..., CONSTRAINT ...)` for a struct.
///
/// Constraints follow the columns: unique groups, then primary key groups,
/// then foreign key groups, each in the order their first field appears.
pub fn create_table_body<T: Reflect>(driver: Drivers) -> Result<String> {
    if T::shape() != Shape::Struct {
        return Err(Error::invalid_type(format!("{} cannot be used as a table model", T::type_name())));
    }

    let mut defs = Vec::new();
    let (mut unique, mut primary, mut foreign) = (Vec::new(), Vec::new(), Vec::new());

    for field in T::fields() {
        let tag = Tag::parse(field.tag);
        let name = tag.column_name(field.name);
        let typ = match (&tag.typ, field.shape) {
            (Some(typ), _) => typ.clone(),
            (None, Shape::Scalar(kind)) => sql_type(kind, driver).to_string(),
            (None, _) => {
                return Err(Error::invalid_type(format!(
                    "field {} of {} has no SQL type",
                    field.name,
                    T::type_name()
                )));
            }
        };

        let mut def = format!("{name} {typ}");
        if tag.not_null {
            def.push_str(" NOT NULL");
        }
        if let Some(default) = &tag.default {
            def.push_str(" DEFAULT ");
            def.push_str(default);
        }
        defs.push(def);

        add_to_group(&mut unique, tag.uc.as_deref(), &name, None);
        add_to_group(&mut primary, tag.pk.as_deref(), &name, None);
        add_to_group(&mut foreign, tag.fk.as_deref(), &name, tag.fk_ref.as_deref());
    }

    for group in unique {
        defs.push(format!("CONSTRAINT {} UNIQUE ({})", group.name, group.columns.join(", ")));
    }
    for group in primary {
        defs.push(format!("CONSTRAINT {} PRIMARY KEY ({})", group.name, group.columns.join(", ")));
    }
    for group in foreign {
        let reference = group.reference.ok_or_else(|| {
            Error::invalid_syntax(format!("foreign key {} has no reference", group.name))
        })?;
        defs.push(format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {reference}",
            group.name,
            group.columns.join(", ")
        ));
    }

    Ok(format!("({})", defs.join(", ")))
}

// ============================================================================
// Helpers
// ============================================================================

fn literal(value: &Value, layout: Option<&str>) -> Result<String> {
    to_literal(value, LiteralOptions { quote: true, time_format: layout })
}

fn resolve_all<E: Reflect>(columns: &[String]) -> Result<ColumnMap> {
    let map = ColumnMap::resolve(columns, &E::fields());
    match columns.iter().enumerate().find(|(position, _)| map.get(*position).is_none()) {
        Some((_, column)) => {
            Err(Error::invalid_syntax(format!("column {column} has no matching field in {}", E::type_name())))
        }
        None => Ok(map),
    }
}

fn struct_literals<E: Reflect>(elem: &E, map: &ColumnMap, width: usize) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(width);
    for (_, res) in map.iter() {
        out.push(literal(&elem.field_value(res.field)?, res.tag.layout())?);
    }
    Ok(out)
}

fn map_literals<E: Reflect>(elem: &E, columns: &[String]) -> Result<Vec<String>> {
    columns
        .iter()
        .map(|column| {
            let value = elem
                .map_value(column)
                .ok_or_else(|| Error::invalid_syntax(format!("column {column} is missing from the map")))??;
            literal(&value, None)
        })
        .collect()
}
