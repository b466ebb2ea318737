//! # Rows Module
//!
//! Walks a result cursor and fills a destination of any [`Shape`]:
//!
//! | Destination            | Rows read | Columns      |
//! |------------------------|-----------|--------------|
//! | scalar                 | first     | exactly one  |
//! | struct                 | first     | any, by name |
//! | `HashMap<String, V>`   | first     | all          |
//! | `Vec<scalar>`          | all       | exactly one  |
//! | `Vec<struct>`          | all       | any, by name |
//! | `Vec<HashMap<..>>`     | all       | all          |
//!
//! Empty and NULL cells leave the destination at its zero value. Running out
//! of rows is not an error: a scalar or struct destination is simply left
//! untouched when the result is empty.

use crate::errors::{Error, Result};
use crate::reflect::{Reflect, Shape};
use crate::resolver::ColumnMap;

// ============================================================================
// Cursor
// ============================================================================

/// A forward-only result cursor of raw cells.
pub trait Rows {
    fn columns(&self) -> &[String];

    /// Moves to the next row; `false` once the rows are exhausted.
    fn advance(&mut self) -> bool;

    /// Raw bytes of a cell in the current row; `None` for SQL NULL.
    fn scan(&self, index: usize) -> Result<Option<&[u8]>>;
}

/// An owned, in-memory result set.
///
/// The live connections convert driver rows into a `RowSet`; tests build
/// one directly:
///
/// ```rust,ignore
/// let rows = RowSet::new(["emp_no", "first_name"])
///     .row(["10001", "Taro"])
///     .row(["10002", "Jiro"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<Option<Vec<u8>>>>,
    cursor: Option<usize>,
}

impl RowSet {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RowSet { columns: columns.into_iter().map(Into::into).collect(), ..Default::default() }
    }

    /// Appends a row of non-NULL text cells.
    pub fn row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.push_row(cells.into_iter().map(|c| Some(c.as_ref().to_vec())).collect());
        self
    }

    pub fn push_row(&mut self, cells: Vec<Option<Vec<u8>>>) {
        self.rows.push(cells);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Rows for RowSet {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn advance(&mut self) -> bool {
        let next = self.cursor.map_or(0, |c| c + 1);
        self.cursor = Some(next.min(self.rows.len()));
        next < self.rows.len()
    }

    fn scan(&self, index: usize) -> Result<Option<&[u8]>> {
        let row = self
            .cursor
            .and_then(|c| self.rows.get(c))
            .ok_or_else(|| Error::invalid_value("scan called without a current row"))?;
        let cell = row
            .get(index)
            .ok_or_else(|| Error::invalid_value(format!("column index {index} out of range")))?;
        Ok(cell.as_deref())
    }
}

// ============================================================================
// Parser
// ============================================================================

/// Fills `dest` from `rows` according to the destination's shape.
pub fn parse_rows<R, T>(rows: &mut R, dest: &mut T) -> Result<()>
where
    R: Rows + ?Sized,
    T: Reflect,
{
    match T::shape() {
        Shape::Scalar(_) => {
            let has_row = rows.advance();
            single_column::<R, T>(rows, has_row)?;
            if has_row {
                *dest = scan_scalar(rows)?;
            }
            Ok(())
        }
        Shape::Struct => {
            let map = ColumnMap::resolve(rows.columns(), &T::fields());
            if rows.advance() {
                scan_struct(rows, &map, dest)?;
            }
            Ok(())
        }
        Shape::Map => {
            if rows.advance() {
                scan_map(rows, dest)?;
            }
            Ok(())
        }
        Shape::Slice => parse_slice(rows, dest),
    }
}

fn parse_slice<R, T>(rows: &mut R, dest: &mut T) -> Result<()>
where
    R: Rows + ?Sized,
    T: Reflect,
{
    *dest = T::default();
    match <T::Elem as Reflect>::shape() {
        Shape::Scalar(_) => {
            let mut has_row = rows.advance();
            single_column::<R, T>(rows, has_row)?;
            while has_row {
                dest.push_element(scan_scalar(rows)?)?;
                has_row = rows.advance();
            }
        }
        Shape::Struct => {
            let map = ColumnMap::resolve(rows.columns(), &<T::Elem as Reflect>::fields());
            while rows.advance() {
                let mut elem = <T::Elem as Default>::default();
                scan_struct(rows, &map, &mut elem)?;
                dest.push_element(elem)?;
            }
        }
        Shape::Map => {
            while rows.advance() {
                let mut elem = <T::Elem as Default>::default();
                scan_map(rows, &mut elem)?;
                dest.push_element(elem)?;
            }
        }
        Shape::Slice => {
            return Err(Error::invalid_type(format!("{} cannot be a query destination", T::type_name())));
        }
    }
    Ok(())
}

// A result without columns is only accepted when it also has no rows.
fn single_column<R: Rows + ?Sized, T: Reflect>(rows: &R, has_row: bool) -> Result<()> {
    match (rows.columns().len(), has_row) {
        (1, _) | (0, false) => Ok(()),
        (n, _) => Err(Error::invalid_syntax(format!(
            "{} needs exactly one column, the result has {n}",
            T::type_name()
        ))),
    }
}

fn present(cell: Option<&[u8]>) -> Option<&[u8]> {
    cell.filter(|raw| !raw.is_empty())
}

fn scan_scalar<R: Rows + ?Sized, E: Reflect>(rows: &R) -> Result<E> {
    match present(rows.scan(0)?) {
        Some(raw) => E::decode(raw, None),
        None => Ok(E::default()),
    }
}

fn scan_struct<R: Rows + ?Sized, E: Reflect>(rows: &R, map: &ColumnMap, elem: &mut E) -> Result<()> {
    for (position, res) in map.iter() {
        if let Some(raw) = present(rows.scan(position)?) {
            elem.set_field(res.field, raw, res.tag.layout())?;
        }
    }
    Ok(())
}

fn scan_map<R: Rows + ?Sized, E: Reflect>(rows: &R, elem: &mut E) -> Result<()> {
    for (position, column) in rows.columns().iter().enumerate() {
        elem.map_insert(column, rows.scan(position)?)?;
    }
    Ok(())
}
