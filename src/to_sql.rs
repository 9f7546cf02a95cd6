//! Renders a parsed filter to a PostGIS-flavored SQL WHERE fragment.
//!
//! Rendering is pure and total: every well-formed tree produces SQL, all
//! validation having happened in the parser. Literal lexemes pass through
//! byte-for-byte and `Paren` nodes re-emit exactly one paren pair, so the
//! output's grouping always matches the source's.

use std::fmt::{Display, Formatter, Result};

use crate::ast::{
    BooleanExpr, ComparisonPredicate, DistancePredicate, Filter, GeomExpression, GeomLiteral,
    InListValues, Predicate, ScalarExpr, ScalarValue, SpatialPredicate,
};
use crate::wkt;

/// The SRID pair threaded through geometry rendering: literals are tagged
/// with `filter_srid` and re-projected to `target_srid` when the two differ.
#[derive(Debug, Clone, Copy)]
pub struct SqlContext {
    pub filter_srid: i32,
    pub target_srid: i32,
}

pub struct Printer<'a> {
    filter: &'a Filter,
    cx: SqlContext,
}

impl<'a> Printer<'a> {
    pub fn new(filter: &'a Filter, cx: SqlContext) -> Self {
        Self { filter, cx }
    }
}

impl Display for Printer<'_> {
    fn fmt(&self, f: &mut Formatter) -> Result {
        self.filter.to_sql(f, &self.cx)
    }
}

pub trait ToSql {
    fn to_sql(&self, out: &mut Formatter, cx: &SqlContext) -> Result;
}

impl ToSql for Filter {
    fn to_sql(&self, out: &mut Formatter, cx: &SqlContext) -> Result {
        match self {
            Filter::Empty => Ok(()),
            Filter::Expr(expr) => expr.to_sql(out, cx),
        }
    }
}

impl ToSql for BooleanExpr {
    fn to_sql(&self, out: &mut Formatter, cx: &SqlContext) -> Result {
        match self {
            BooleanExpr::And(l, r) => {
                l.to_sql(out, cx)?;
                write!(out, " AND ")?;
                r.to_sql(out, cx)
            }
            BooleanExpr::Or(l, r) => {
                l.to_sql(out, cx)?;
                write!(out, " OR ")?;
                r.to_sql(out, cx)
            }
            BooleanExpr::Not(operand) => {
                write!(out, "NOT ")?;
                // A second space before bare predicates, reproducing the
                //  reference output exactly: `NOT  "x" IS NOT NULL` but
                //  `NOT TRUE` and `NOT (...)`
                if matches!(operand.as_ref(), BooleanExpr::Predicate(_)) {
                    write!(out, " ")?;
                }
                operand.to_sql(out, cx)
            }
            BooleanExpr::Paren(inner) => {
                write!(out, "(")?;
                inner.to_sql(out, cx)?;
                write!(out, ")")
            }
            BooleanExpr::Predicate(p) => p.to_sql(out, cx),
            BooleanExpr::BoolLiteral(text) => write!(out, "{text}"),
        }
    }
}

impl ToSql for Predicate {
    fn to_sql(&self, out: &mut Formatter, cx: &SqlContext) -> Result {
        match self {
            Predicate::Comparison(c) => c.to_sql(out, cx),
            Predicate::Spatial(s) => s.to_sql(out, cx),
            Predicate::Distance(d) => d.to_sql(out, cx),
        }
    }
}

impl ToSql for ComparisonPredicate {
    fn to_sql(&self, out: &mut Formatter, cx: &SqlContext) -> Result {
        match self {
            ComparisonPredicate::Binary { left, op, right } => {
                left.to_sql(out, cx)?;
                write!(out, " {} ", op.symbol())?;
                right.to_sql(out, cx)
            }
            ComparisonPredicate::Like {
                property,
                negated,
                case_insensitive,
                pattern,
            } => {
                write_identifier(property, out)?;
                if *negated {
                    write!(out, " NOT")?;
                }
                if *case_insensitive {
                    write!(out, " ILIKE ")?;
                } else {
                    write!(out, " LIKE ")?;
                }
                write!(out, "{pattern}")
            }
            ComparisonPredicate::Between {
                value,
                negated,
                low,
                high,
            } => {
                value.to_sql(out, cx)?;
                if *negated {
                    write!(out, " NOT")?;
                }
                write!(out, " BETWEEN ")?;
                low.to_sql(out, cx)?;
                write!(out, " AND ")?;
                high.to_sql(out, cx)
            }
            ComparisonPredicate::InList {
                property,
                negated,
                values,
            } => {
                write_identifier(property, out)?;
                if *negated {
                    write!(out, " NOT")?;
                }
                write!(out, " IN (")?;
                let items = match values {
                    InListValues::Strings(items) => items,
                    InListValues::Numbers(items) => items,
                };
                let mut first = true;
                for item in items {
                    if first {
                        first = false;
                    } else {
                        write!(out, ",")?;
                    }
                    write!(out, "{item}")?;
                }
                write!(out, ")")
            }
            ComparisonPredicate::IsNull { property, negated } => {
                write_identifier(property, out)?;
                write!(out, " IS ")?;
                if *negated {
                    write!(out, "NOT ")?;
                }
                write!(out, "NULL")
            }
        }
    }
}

impl ToSql for ScalarExpr {
    fn to_sql(&self, out: &mut Formatter, cx: &SqlContext) -> Result {
        match self {
            ScalarExpr::Value(v) => v.to_sql(out, cx),
            ScalarExpr::Paren(inner) => {
                write!(out, "(")?;
                inner.to_sql(out, cx)?;
                write!(out, ")")
            }
            ScalarExpr::BinaryOp { left, op, right } => {
                left.to_sql(out, cx)?;
                write!(out, " {} ", op.symbol())?;
                right.to_sql(out, cx)
            }
        }
    }
}

impl ToSql for ScalarValue {
    fn to_sql(&self, out: &mut Formatter, _: &SqlContext) -> Result {
        match self {
            ScalarValue::Property(name) => write_identifier(name, out),
            ScalarValue::String(lexeme)
            | ScalarValue::Number(lexeme)
            | ScalarValue::Bool(lexeme) => write!(out, "{lexeme}"),
            ScalarValue::Temporal(lexeme) => write!(out, "timestamp '{lexeme}'"),
        }
    }
}

impl ToSql for SpatialPredicate {
    fn to_sql(&self, out: &mut Formatter, cx: &SqlContext) -> Result {
        write!(out, "{}(", self.function.sql_name())?;
        self.left.to_sql(out, cx)?;
        write!(out, ",")?;
        self.right.to_sql(out, cx)?;
        write!(out, ")")
    }
}

impl ToSql for DistancePredicate {
    fn to_sql(&self, out: &mut Formatter, cx: &SqlContext) -> Result {
        write!(out, "ST_DWithin(")?;
        self.left.to_sql(out, cx)?;
        write!(out, ",")?;
        self.right.to_sql(out, cx)?;
        write!(out, ",{})", self.distance)
    }
}

impl ToSql for GeomExpression {
    fn to_sql(&self, out: &mut Formatter, cx: &SqlContext) -> Result {
        match self {
            GeomExpression::Property(name) => write_identifier(name, out),
            GeomExpression::Literal(geom) => {
                let reproject = cx.filter_srid != cx.target_srid;
                if reproject {
                    write!(out, "ST_Transform(")?;
                }
                match geom {
                    GeomLiteral::Envelope {
                        minx,
                        miny,
                        maxx,
                        maxy,
                    } => {
                        write!(
                            out,
                            "ST_MakeEnvelope({minx},{miny},{maxx},{maxy},{})",
                            cx.filter_srid
                        )?;
                    }
                    wkt_geom => {
                        write!(out, "'SRID={};", cx.filter_srid)?;
                        wkt::write_geometry(wkt_geom, out)?;
                        write!(out, "'::geometry")?;
                    }
                }
                if reproject {
                    write!(out, ",{})", cx.target_srid)?;
                }
                Ok(())
            }
        }
    }
}

/// Property names go inside double quotes untouched; rejecting embedded
/// quotes is the caller's schema layer's job.
fn write_identifier(name: &str, out: &mut Formatter) -> Result {
    write!(out, "\"{name}\"")
}
