//! End-to-end translation tests: filter text in, exact SQL fragment out.

use crate::translate_filter;

#[track_caller]
fn check(filter: &str, expected: &str) {
    match translate_filter(filter, 4326, 4326) {
        Ok(sql) => assert_eq!(sql, expected, "for filter: {filter}"),
        Err(e) => panic!("failed to translate '{filter}': {e}"),
    }
}

#[test]
fn predicates() {
    let cases = [
        ("", ""),
        (
            "1990-01-01 BETWEEN time_start AND time_end",
            r#"timestamp '1990-01-01' BETWEEN "time_start" AND "time_end""#,
        ),
        ("id > tt", r#""id" > "tt""#),
        ("id > 1", r#""id" > 1"#),
        ("id >= 1", r#""id" >= 1"#),
        ("id < 1", r#""id" < 1"#),
        ("id <= 1", r#""id" <= 1"#),
        ("id = 1", r#""id" = 1"#),
        ("id <> 1", r#""id" <> 1"#),
        ("id = -1.2345", r#""id" = -1.2345"#),
        ("id = id2", r#""id" = "id2""#),
        ("id = 'foo'", r#""id" = 'foo'"#),
        ("id LIKE 'foo'", r#""id" LIKE 'foo'"#),
        ("id ILIKE 'foo'", r#""id" ILIKE 'foo'"#),
        ("id ILIKE '%Ca%'", r#""id" ILIKE '%Ca%'"#),
        ("id NOT LIKE 'foo'", r#""id" NOT LIKE 'foo'"#),
        ("id BETWEEN 1 and 2", r#""id" BETWEEN 1 AND 2"#),
        ("id NOT BETWEEN 1 and 2", r#""id" NOT BETWEEN 1 AND 2"#),
        ("id IN (1,2,3)", r#""id" IN (1,2,3)"#),
        ("id NOT IN (1,2,3)", r#""id" NOT IN (1,2,3)"#),
        ("id IN ('a','b','c')", r#""id" IN ('a','b','c')"#),
        ("id IS NULL", r#""id" IS NULL"#),
        ("id IS NOT NULL", r#""id" IS NOT NULL"#),
        ("x > 1 AND x < 9", r#""x" > 1 AND "x" < 9"#),
        ("x = 1 OR x = 2", r#""x" = 1 OR "x" = 2"#),
        (
            "(x = 1 OR x = 2) AND y < 4",
            r#"("x" = 1 OR "x" = 2) AND "y" < 4"#,
        ),
        (
            "x = 1 OR (x = 2 AND y < 4)",
            r#""x" = 1 OR ("x" = 2 AND "y" < 4)"#,
        ),
        (
            "x = 1 AND y = 2 AND z = 3 OR a = 4",
            r#""x" = 1 AND "y" = 2 AND "z" = 3 OR "a" = 4"#,
        ),
        // Reference quirk: two spaces between NOT and a bare predicate
        ("NOT x IS NOT NULL", r#"NOT  "x" IS NOT NULL"#),
        ("NOT TRUE OR FALSE", "NOT TRUE OR FALSE"),
        ("NOT true OR false", "NOT true OR false"),
        (
            "x = 1 OR NOT (x = 2 AND y < 4)",
            r#""x" = 1 OR NOT ("x" = 2 AND "y" < 4)"#,
        ),
    ];
    for (filter, sql) in cases {
        check(filter, sql);
    }
}

#[test]
fn spatial_predicates() {
    let cases = [
        (
            "crosses(geom, POINT(0 0))",
            r#"ST_Crosses("geom",'SRID=4326;POINT(0 0)'::geometry)"#,
        ),
        (
            "Contains(geom, POINT(0 0))",
            r#"ST_Contains("geom",'SRID=4326;POINT(0 0)'::geometry)"#,
        ),
        (
            "DISJOINT(geom, POINT(0 0))",
            r#"ST_Disjoint("geom",'SRID=4326;POINT(0 0)'::geometry)"#,
        ),
        (
            "EQUALS(geom, POINT(0 0))",
            r#"ST_Equals("geom",'SRID=4326;POINT(0 0)'::geometry)"#,
        ),
        (
            "INTERSECTS(geom, POINT(0 0))",
            r#"ST_Intersects("geom",'SRID=4326;POINT(0 0)'::geometry)"#,
        ),
        (
            "OVERLAPS(geom, POINT(0 0))",
            r#"ST_Overlaps("geom",'SRID=4326;POINT(0 0)'::geometry)"#,
        ),
        (
            "TOUCHES(geom, POINT(0 0))",
            r#"ST_Touches("geom",'SRID=4326;POINT(0 0)'::geometry)"#,
        ),
        (
            "within(geom, POINT(0 0))",
            r#"ST_Within("geom",'SRID=4326;POINT(0 0)'::geometry)"#,
        ),
        (
            "Dwithin(geom, POINT(0 0), 100)",
            r#"ST_DWithin("geom",'SRID=4326;POINT(0 0)'::geometry,100)"#,
        ),
    ];
    for (filter, sql) in cases {
        check(filter, sql);
    }
}

#[test]
fn arithmetic() {
    let cases = [
        ("p > 1 + x", r#""p" > 1 + "x""#),
        ("p > 2 * 3 + x", r#""p" > 2 * 3 + "x""#),
        ("p > 2 * (3 + x)", r#""p" > 2 * (3 + "x")"#),
        ("p > (y + 5) / (3 - x)", r#""p" > ("y" + 5) / (3 - "x")"#),
        ("p = x % 10", r#""p" = "x" % 10"#),
        ("p = x ^ (i + 2)", r#""p" = "x" ^ ("i" + 2)"#),
        (
            "p BETWEEN x + 10 AND x * 2",
            r#""p" BETWEEN "x" + 10 AND "x" * 2"#,
        ),
        (
            "p BETWEEN 2 * (1 + 1000000) AND 900000",
            r#""p" BETWEEN 2 * (1 + 1000000) AND 900000"#,
        ),
        ("p = 'a' || x || 'b'", r#""p" = 'a' || "x" || 'b'"#),
        // Exponent notation passes through untouched, case included
        ("p > 1.0E+1", r#""p" > 1.0E+1"#),
        ("p > 1.0e+1", r#""p" > 1.0e+1"#),
    ];
    for (filter, sql) in cases {
        check(filter, sql);
    }
}

#[test]
fn geometry_literals() {
    let cases = [
        (
            "equals(geom, POINT(0 0))",
            r#"ST_Equals("geom",'SRID=4326;POINT(0 0)'::geometry)"#,
        ),
        (
            "equals(geom, LINESTRING(0 0, 1 1))",
            r#"ST_Equals("geom",'SRID=4326;LINESTRING(0 0,1 1)'::geometry)"#,
        ),
        (
            "equals(geom, POLYGON((0 0, 0 9, 9 0, 0 0)))",
            r#"ST_Equals("geom",'SRID=4326;POLYGON((0 0,0 9,9 0,0 0))'::geometry)"#,
        ),
        (
            "equals(geom, POLYGON((0 0, 0 9, 9 0, 0 0),(1 1, 1 8, 8 1, 1 1)))",
            r#"ST_Equals("geom",'SRID=4326;POLYGON((0 0,0 9,9 0,0 0),(1 1,1 8,8 1,1 1))'::geometry)"#,
        ),
        (
            "equals(geom, MULTIPOINT((0 0), (0 9)))",
            r#"ST_Equals("geom",'SRID=4326;MULTIPOINT((0 0),(0 9))'::geometry)"#,
        ),
        (
            "equals(geom, MULTILINESTRING((0 0, 1 1),(1 1, 2 2)))",
            r#"ST_Equals("geom",'SRID=4326;MULTILINESTRING((0 0,1 1),(1 1,2 2))'::geometry)"#,
        ),
        (
            "equals(geom, MULTIPOLYGON(((1 4, 4 1, 1 1, 1 4)), ((1 9, 4 9, 1 6, 1 9))))",
            r#"ST_Equals("geom",'SRID=4326;MULTIPOLYGON(((1 4,4 1,1 1,1 4)),((1 9,4 9,1 6,1 9)))'::geometry)"#,
        ),
        (
            "equals(geom, GEOMETRYCOLLECTION(POLYGON((1 4, 4 1, 1 1, 1 4)),LINESTRING (3 3, 5 5), POINT (1 5)))",
            r#"ST_Equals("geom",'SRID=4326;GEOMETRYCOLLECTION(POLYGON((1 4,4 1,1 1,1 4)),LINESTRING(3 3,5 5),POINT(1 5))'::geometry)"#,
        ),
        (
            "equals(geom, ENVELOPE(1,2,3,4))",
            r#"ST_Equals("geom",ST_MakeEnvelope(1,2,3,4,4326))"#,
        ),
    ];
    for (filter, sql) in cases {
        check(filter, sql);
    }
}

#[test]
fn geometries_with_srid_transform() {
    let cases = [
        (
            "equals(geom, POINT(0 0))",
            1111,
            2222,
            r#"ST_Equals("geom",ST_Transform('SRID=1111;POINT(0 0)'::geometry,2222))"#,
        ),
        (
            "equals(geom, ENVELOPE(1,2,3,4))",
            1111,
            2222,
            r#"ST_Equals("geom",ST_Transform(ST_MakeEnvelope(1,2,3,4,1111),2222))"#,
        ),
    ];
    for (filter, filter_srid, target_srid, sql) in cases {
        match translate_filter(filter, filter_srid, target_srid) {
            Ok(actual) => assert_eq!(actual, sql, "for filter: {filter}"),
            Err(e) => panic!("failed to translate '{filter}': {e}"),
        }
    }
}

#[test]
fn syntax_errors() {
    let invalid = [
        // no operator between terms
        "x y",
        // double equal
        "x == y",
        // constant glued to a property name
        "x > 10y",
        // invalid null check
        "NOT x IS > 3",
        // extra paren
        "equals(geom, ENVELOPE(1,2,3,4)))",
        // comma between ordinates
        "equals(geom, POINT(0,0))",
        // bad temporal value year
        "p > 200-01",
        // bad temporal value, no day
        "p > 2000-01",
        // time missing minutes and seconds
        "p > 2000-01-01T01",
        // IN list mixing strings and numbers
        "id IN (1,'a')",
        // unterminated string
        "id = 'foo",
    ];
    for filter in invalid {
        assert!(
            translate_filter(filter, 4326, 4326).is_err(),
            "expected a syntax error for: {filter}"
        );
    }
}
