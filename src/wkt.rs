//! Well-known-text serialization for geometry literals.
//!
//! Formatting contract: the two ordinates of a coordinate are separated by a
//! single space, coordinates are joined by a comma with no following space,
//! and nested groups get one paren pair each, e.g.
//! `POLYGON((0 0,0 9,9 0,0 0),(1 1,1 8,8 1,1 1))`.

use std::fmt::{Formatter, Result};

use crate::ast::{Coord, GeomLiteral};

pub fn write_geometry(geom: &GeomLiteral, out: &mut Formatter) -> Result {
    match geom {
        GeomLiteral::Point(coord) => {
            write!(out, "POINT(")?;
            write_coord(coord, out)?;
            write!(out, ")")
        }
        GeomLiteral::LineString(coords) => {
            write!(out, "LINESTRING(")?;
            write_coord_list(coords, out)?;
            write!(out, ")")
        }
        GeomLiteral::Polygon(rings) => {
            write!(out, "POLYGON(")?;
            write_rings(rings, out)?;
            write!(out, ")")
        }
        GeomLiteral::MultiPoint(points) => {
            write!(out, "MULTIPOINT(")?;
            let mut first = true;
            for point in points {
                if first {
                    first = false;
                } else {
                    write!(out, ",")?;
                }
                write!(out, "(")?;
                write_coord(point, out)?;
                write!(out, ")")?;
            }
            write!(out, ")")
        }
        GeomLiteral::MultiLineString(lines) => {
            write!(out, "MULTILINESTRING(")?;
            write_rings(lines, out)?;
            write!(out, ")")
        }
        GeomLiteral::MultiPolygon(polygons) => {
            write!(out, "MULTIPOLYGON(")?;
            let mut first = true;
            for rings in polygons {
                if first {
                    first = false;
                } else {
                    write!(out, ",")?;
                }
                write!(out, "(")?;
                write_rings(rings, out)?;
                write!(out, ")")?;
            }
            write!(out, ")")
        }
        GeomLiteral::GeometryCollection(members) => {
            write!(out, "GEOMETRYCOLLECTION(")?;
            let mut first = true;
            for member in members {
                if first {
                    first = false;
                } else {
                    write!(out, ",")?;
                }
                write_geometry(member, out)?;
            }
            write!(out, ")")
        }
        // Envelopes have no WKT form; the translator renders them as
        //  ST_MakeEnvelope and the parser keeps them out of collections
        GeomLiteral::Envelope { .. } => Ok(()),
    }
}

fn write_coord(coord: &Coord, out: &mut Formatter) -> Result {
    write!(out, "{} {}", coord.x, coord.y)
}

fn write_coord_list(coords: &[Coord], out: &mut Formatter) -> Result {
    let mut first = true;
    for coord in coords {
        if first {
            first = false;
        } else {
            write!(out, ",")?;
        }
        write_coord(coord, out)?;
    }
    Ok(())
}

fn write_rings(rings: &[Vec<Coord>], out: &mut Formatter) -> Result {
    let mut first = true;
    for ring in rings {
        if first {
            first = false;
        } else {
            write!(out, ",")?;
        }
        write!(out, "(")?;
        write_coord_list(ring, out)?;
        write!(out, ")")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Wkt(GeomLiteral);
    impl std::fmt::Display for Wkt {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result {
            write_geometry(&self.0, f)
        }
    }

    fn coord(x: &str, y: &str) -> Coord {
        Coord {
            x: x.into(),
            y: y.into(),
        }
    }

    #[test]
    fn point() {
        let wkt = Wkt(GeomLiteral::Point(coord("0", "0")));
        assert_eq!(wkt.to_string(), "POINT(0 0)");
    }

    #[test]
    fn linestring_has_no_space_after_comma() {
        let wkt = Wkt(GeomLiteral::LineString(vec![
            coord("0", "0"),
            coord("1", "1"),
        ]));
        assert_eq!(wkt.to_string(), "LINESTRING(0 0,1 1)");
    }

    #[test]
    fn polygon_with_hole() {
        let wkt = Wkt(GeomLiteral::Polygon(vec![
            vec![coord("0", "0"), coord("0", "9"), coord("9", "0"), coord("0", "0")],
            vec![coord("1", "1"), coord("1", "8"), coord("8", "1"), coord("1", "1")],
        ]));
        assert_eq!(
            wkt.to_string(),
            "POLYGON((0 0,0 9,9 0,0 0),(1 1,1 8,8 1,1 1))"
        );
    }

    #[test]
    fn multipoint_wraps_each_point() {
        let wkt = Wkt(GeomLiteral::MultiPoint(vec![
            coord("0", "0"),
            coord("0", "9"),
        ]));
        assert_eq!(wkt.to_string(), "MULTIPOINT((0 0),(0 9))");
    }

    #[test]
    fn multilinestring() {
        let wkt = Wkt(GeomLiteral::MultiLineString(vec![
            vec![coord("0", "0"), coord("1", "1")],
            vec![coord("1", "1"), coord("2", "2")],
        ]));
        assert_eq!(wkt.to_string(), "MULTILINESTRING((0 0,1 1),(1 1,2 2))");
    }

    #[test]
    fn multipolygon() {
        let wkt = Wkt(GeomLiteral::MultiPolygon(vec![
            vec![vec![coord("1", "4"), coord("4", "1"), coord("1", "1"), coord("1", "4")]],
            vec![vec![coord("1", "9"), coord("4", "9"), coord("1", "6"), coord("1", "9")]],
        ]));
        assert_eq!(
            wkt.to_string(),
            "MULTIPOLYGON(((1 4,4 1,1 1,1 4)),((1 9,4 9,1 6,1 9)))"
        );
    }

    #[test]
    fn geometry_collection_nests_members() {
        let wkt = Wkt(GeomLiteral::GeometryCollection(vec![
            GeomLiteral::LineString(vec![coord("3", "3"), coord("5", "5")]),
            GeomLiteral::Point(coord("1", "5")),
        ]));
        assert_eq!(
            wkt.to_string(),
            "GEOMETRYCOLLECTION(LINESTRING(3 3,5 5),POINT(1 5))"
        );
    }
}
