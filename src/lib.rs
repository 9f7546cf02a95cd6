//! Translates CQL2-style filter expressions into SQL WHERE-clause fragments
//! for a PostGIS-backed feature store.
//!
//! ```rust
//! let sql = cql2_pgsql::translate_filter("crosses(geom, POINT(0 0))", 4326, 4326).unwrap();
//! assert_eq!(sql, r#"ST_Crosses("geom",'SRID=4326;POINT(0 0)'::geometry)"#);
//! ```

pub mod ast;
pub mod lex;
pub mod parser;
pub mod to_sql;
pub mod wkt;

#[cfg(test)]
mod tests;

use to_sql::{Printer, SqlContext};

/// Translates a filter expression into a SQL boolean fragment suitable for
/// direct inclusion after `WHERE`.
///
/// Geometry literals are tagged with `filter_srid`; when `target_srid`
/// differs, geometry expressions are wrapped in `ST_Transform`. Empty input
/// is a valid filter and yields an empty string.
pub fn translate_filter(
    source: &str,
    filter_srid: i32,
    target_srid: i32,
) -> Result<String, parser::Error> {
    let filter = parser::parse(source)?;
    let cx = SqlContext {
        filter_srid,
        target_srid,
    };
    Ok(Printer::new(&filter, cx).to_string())
}
