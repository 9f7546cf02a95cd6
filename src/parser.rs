//! Recursive-descent parser for CQL2 filter expressions.
//!
//! Boolean operators are parsed with binding powers (OR lowest, then AND,
//! then prefix NOT); all arithmetic operators share a single flat
//! left-associative level, so grouping only ever comes from explicit
//! parentheses, which are preserved as `Paren` nodes and re-emitted verbatim.

use crate::ast::{
    ArithmeticOp, BooleanExpr, ComparisonOp, ComparisonPredicate, Coord, DistancePredicate,
    Filter, GeomExpression, GeomLiteral, InListValues, Predicate, ScalarExpr, ScalarValue,
    SpatialFn, SpatialPredicate,
};
use crate::lex::{Error as LexerError, Lexer, Token, TokenType};

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Lexical(LexerError),
    UnexpectedToken {
        position: usize,
        expected: &'static str,
        found: String,
    },
    UnexpectedEof {
        expected: &'static str,
    },
    TrailingInput {
        position: usize,
        found: String,
    },
    /// An IN list mixing string and numeric literals.
    MixedInList {
        position: usize,
    },
}

impl From<LexerError> for Error {
    fn from(value: LexerError) -> Self {
        Self::Lexical(value)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexical(l) => write!(f, "Lexical error: {l}"),
            Self::UnexpectedToken {
                position,
                expected,
                found,
            } => write!(f, "Expected {expected} at {position}, got '{found}'"),
            Self::UnexpectedEof { expected } => {
                write!(f, "Unexpected end of input, expected {expected}")
            }
            Self::TrailingInput { position, found } => {
                write!(f, "Unexpected input '{found}' at {position} after a complete filter")
            }
            Self::MixedInList { position } => {
                write!(f, "IN list at {position} mixes string and numeric values")
            }
        }
    }
}

impl std::error::Error for Error {}

pub fn parse(source: &str) -> Result<Filter, Error> {
    let mut parser = Parser {
        lexer: Lexer::new(source),
    };

    // Empty (or all-whitespace) input is a valid filter
    if parser.peek()?.is_none() {
        return Ok(Filter::Empty);
    }

    let root = parser.boolean_expression(0)?;

    // Make sure we've completely parsed the input
    if let Some(tok) = parser.peek()? {
        return Err(Error::TrailingInput {
            position: tok.start(),
            found: parser.owned(&tok),
        });
    }
    Ok(Filter::Expr(root))
}

// NOTE infix_binding specifies the "binding power" of the boolean operators:
//  higher binding power binds more tightly, and the slight left/right
//  asymmetry keeps equal operators left-associative.
fn infix_binding(ty: TokenType) -> Option<(u8, u8)> {
    match ty {
        TokenType::And => Some((20, 21)),
        TokenType::Or => Some((10, 11)),
        _ => None,
    }
}

// Prefix NOT binds tighter than AND/OR but looser than an atom, so
//  `NOT a AND b` parses as `(NOT a) AND b`.
const NOT_BINDING_POWER: u8 = 30;

// All arithmetic operators share one level; the grammar defines no
//  mathematical precedence between them.
const ARITHMETIC_BINDING: (u8, u8) = (50, 51);

impl TryFrom<TokenType> for ComparisonOp {
    type Error = ();
    fn try_from(ty: TokenType) -> Result<Self, ()> {
        match ty {
            TokenType::LT => Ok(ComparisonOp::Lt),
            TokenType::Equals => Ok(ComparisonOp::Eq),
            TokenType::GT => Ok(ComparisonOp::Gt),
            TokenType::NotEquals => Ok(ComparisonOp::Ne),
            TokenType::GTE => Ok(ComparisonOp::Ge),
            TokenType::LTE => Ok(ComparisonOp::Le),
            _ => Err(()),
        }
    }
}

impl TryFrom<TokenType> for ArithmeticOp {
    type Error = ();
    fn try_from(ty: TokenType) -> Result<Self, ()> {
        match ty {
            TokenType::Plus => Ok(ArithmeticOp::Add),
            TokenType::Minus => Ok(ArithmeticOp::Sub),
            TokenType::Asterisk => Ok(ArithmeticOp::Mul),
            TokenType::ForwardSlash => Ok(ArithmeticOp::Div),
            TokenType::Percent => Ok(ArithmeticOp::Mod),
            TokenType::Caret => Ok(ArithmeticOp::Exp),
            TokenType::Concat => Ok(ArithmeticOp::Concat),
            _ => Err(()),
        }
    }
}

fn comparison(pred: ComparisonPredicate) -> BooleanExpr {
    BooleanExpr::Predicate(Box::new(Predicate::Comparison(pred)))
}

struct Parser<'input> {
    lexer: Lexer<'input>,
}

impl<'input> Parser<'input> {
    fn next(&mut self) -> Result<Option<Token>, Error> {
        Ok(self.lexer.next_token()?)
    }

    fn peek(&self) -> Result<Option<Token>, Error> {
        Ok(self.lexer.peek_token()?)
    }

    fn text(&self, tok: &Token) -> &'input str {
        self.lexer.source_of(tok)
    }

    fn owned(&self, tok: &Token) -> String {
        self.text(tok).to_string()
    }

    fn unexpected(&self, tok: &Token, expected: &'static str) -> Error {
        Error::UnexpectedToken {
            position: tok.start(),
            expected,
            found: self.owned(tok),
        }
    }

    fn expect(&mut self, ty: TokenType, expected: &'static str) -> Result<Token, Error> {
        match self.next()? {
            Some(tok) if tok.ty == ty => Ok(tok),
            Some(tok) => Err(self.unexpected(&tok, expected)),
            None => Err(Error::UnexpectedEof { expected }),
        }
    }

    fn boolean_expression(&mut self, min_binding_power: u8) -> Result<BooleanExpr, Error> {
        let mut lhs = self.boolean_atom()?;

        loop {
            let Some(op_tok) = self.peek()? else { break };
            let Some((l_pow, r_pow)) = infix_binding(op_tok.ty) else {
                break;
            };
            if l_pow < min_binding_power {
                break;
            }
            _ = self.next()?;

            let rhs = self.boolean_expression(r_pow)?;
            lhs = match op_tok.ty {
                TokenType::And => BooleanExpr::And(Box::new(lhs), Box::new(rhs)),
                _ => BooleanExpr::Or(Box::new(lhs), Box::new(rhs)),
            };
        }
        Ok(lhs)
    }

    fn boolean_atom(&mut self) -> Result<BooleanExpr, Error> {
        let tok = self.peek()?.ok_or(Error::UnexpectedEof {
            expected: "a filter expression",
        })?;

        match tok.ty {
            TokenType::Not => {
                _ = self.next()?;
                let operand = self.boolean_expression(NOT_BINDING_POWER)?;
                Ok(BooleanExpr::Not(Box::new(operand)))
            }
            TokenType::ParenLeft => self.paren_or_predicate(),
            TokenType::Spatial => {
                _ = self.next()?;
                self.spatial_predicate(tok)
            }
            TokenType::Dwithin => {
                _ = self.next()?;
                self.distance_predicate()
            }
            _ => self.predicate(),
        }
    }

    /// An open paren may group a boolean expression or a scalar
    ///  subexpression; try the boolean reading first and rewind (the lexer is
    ///  just a cursor, so a clone is a checkpoint) if it fails or turns out
    ///  to be the left side of a comparison, like `(y + 5) / (3 - x) > p`.
    fn paren_or_predicate(&mut self) -> Result<BooleanExpr, Error> {
        let checkpoint = self.lexer.clone();

        if let Ok(expr) = self.paren_boolean() {
            let continues_scalar = matches!(
                self.peek()?,
                Some(tok) if ComparisonOp::try_from(tok.ty).is_ok()
                    || ArithmeticOp::try_from(tok.ty).is_ok()
            );
            if !continues_scalar {
                return Ok(expr);
            }
        }

        self.lexer = checkpoint;
        self.predicate()
    }

    fn paren_boolean(&mut self) -> Result<BooleanExpr, Error> {
        _ = self.next()?; // consume '('
        let inner = self.boolean_expression(0)?;
        self.expect(TokenType::ParenRight, "`)`")?;
        Ok(BooleanExpr::Paren(Box::new(inner)))
    }

    /// Everything that starts with a scalar expression: binary comparison,
    ///  [NOT] BETWEEN/LIKE/ILIKE/IN, IS [NOT] NULL, or a bare boolean
    ///  literal standing as its own term.
    fn predicate(&mut self) -> Result<BooleanExpr, Error> {
        let value = self.scalar_expression(0)?;

        if let Some(tok) = self.peek()? {
            if let Ok(op) = ComparisonOp::try_from(tok.ty) {
                _ = self.next()?;
                let right = self.scalar_expression(0)?;
                return Ok(comparison(ComparisonPredicate::Binary {
                    left: value,
                    op,
                    right,
                }));
            }

            match tok.ty {
                TokenType::Between => return self.between_predicate(value, false),
                TokenType::Like => return self.like_predicate(tok, value, false, false),
                TokenType::Ilike => return self.like_predicate(tok, value, false, true),
                TokenType::In => return self.in_predicate(tok, value, false),
                TokenType::Is => return self.null_predicate(tok, value),
                TokenType::Not => {
                    _ = self.next()?;
                    let next = self.peek()?.ok_or(Error::UnexpectedEof {
                        expected: "BETWEEN, LIKE, ILIKE, or IN",
                    })?;
                    return match next.ty {
                        TokenType::Between => self.between_predicate(value, true),
                        TokenType::Like => self.like_predicate(next, value, true, false),
                        TokenType::Ilike => self.like_predicate(next, value, true, true),
                        TokenType::In => self.in_predicate(next, value, true),
                        _ => Err(self.unexpected(&next, "BETWEEN, LIKE, ILIKE, or IN")),
                    };
                }
                _ => {}
            }
        }

        if let ScalarExpr::Value(ScalarValue::Bool(text)) = value {
            return Ok(BooleanExpr::BoolLiteral(text));
        }
        match self.peek()? {
            Some(tok) => Err(self.unexpected(&tok, "a comparison operator")),
            None => Err(Error::UnexpectedEof {
                expected: "a comparison operator",
            }),
        }
    }

    fn between_predicate(&mut self, value: ScalarExpr, negated: bool) -> Result<BooleanExpr, Error> {
        _ = self.next()?; // BETWEEN
        let low = self.scalar_expression(0)?;
        self.expect(TokenType::And, "AND")?;
        let high = self.scalar_expression(0)?;
        Ok(comparison(ComparisonPredicate::Between {
            value,
            negated,
            low,
            high,
        }))
    }

    fn like_predicate(
        &mut self,
        keyword: Token,
        value: ScalarExpr,
        negated: bool,
        case_insensitive: bool,
    ) -> Result<BooleanExpr, Error> {
        _ = self.next()?; // LIKE / ILIKE
        let property = self.property_name(value, &keyword)?;
        let pattern = self.expect(TokenType::String, "a quoted pattern")?;
        Ok(comparison(ComparisonPredicate::Like {
            property,
            negated,
            case_insensitive,
            pattern: self.owned(&pattern),
        }))
    }

    fn null_predicate(&mut self, keyword: Token, value: ScalarExpr) -> Result<BooleanExpr, Error> {
        _ = self.next()?; // IS
        let negated = self.lexer.consume(TokenType::Not)?;
        self.expect(TokenType::Null, "NULL")?;
        let property = self.property_name(value, &keyword)?;
        Ok(comparison(ComparisonPredicate::IsNull { property, negated }))
    }

    fn in_predicate(
        &mut self,
        keyword: Token,
        value: ScalarExpr,
        negated: bool,
    ) -> Result<BooleanExpr, Error> {
        _ = self.next()?; // IN
        let property = self.property_name(value, &keyword)?;
        self.expect(TokenType::ParenLeft, "`(`")?;

        // The first element decides whether this is a string or a numeric
        //  list; every later element must match it
        let first = self.next()?.ok_or(Error::UnexpectedEof {
            expected: "a string or numeric literal",
        })?;
        let want = match first.ty {
            TokenType::String => TokenType::String,
            TokenType::Number => TokenType::Number,
            _ => return Err(self.unexpected(&first, "a string or numeric literal")),
        };
        let mut items = vec![self.owned(&first)];

        loop {
            let tok = self.next()?.ok_or(Error::UnexpectedEof {
                expected: "`,` or `)`",
            })?;
            match tok.ty {
                TokenType::ParenRight => break,
                TokenType::Comma => {
                    let item = self.next()?.ok_or(Error::UnexpectedEof {
                        expected: "a string or numeric literal",
                    })?;
                    if item.ty == want {
                        items.push(self.owned(&item));
                    } else if matches!(item.ty, TokenType::String | TokenType::Number) {
                        return Err(Error::MixedInList {
                            position: item.start(),
                        });
                    } else {
                        return Err(self.unexpected(&item, "a string or numeric literal"));
                    }
                }
                _ => return Err(self.unexpected(&tok, "`,` or `)`")),
            }
        }

        let values = if want == TokenType::String {
            InListValues::Strings(items)
        } else {
            InListValues::Numbers(items)
        };
        Ok(comparison(ComparisonPredicate::InList {
            property,
            negated,
            values,
        }))
    }

    /// LIKE, IN and IS NULL apply to a bare property, not a general scalar.
    fn property_name(&self, value: ScalarExpr, at: &Token) -> Result<String, Error> {
        match value {
            ScalarExpr::Value(ScalarValue::Property(name)) => Ok(name),
            _ => Err(Error::UnexpectedToken {
                position: at.start(),
                expected: "a property name on the left side",
                found: self.owned(at),
            }),
        }
    }

    fn scalar_expression(&mut self, min_binding_power: u8) -> Result<ScalarExpr, Error> {
        let mut lhs = self.scalar_atom()?;

        loop {
            let Some(op_tok) = self.peek()? else { break };
            let Ok(op) = ArithmeticOp::try_from(op_tok.ty) else {
                break;
            };
            let (l_pow, r_pow) = ARITHMETIC_BINDING;
            if l_pow < min_binding_power {
                break;
            }
            _ = self.next()?;

            let rhs = self.scalar_expression(r_pow)?;
            lhs = ScalarExpr::BinaryOp {
                left: Box::new(lhs),
                op,
                right: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn scalar_atom(&mut self) -> Result<ScalarExpr, Error> {
        let tok = self.peek()?.ok_or(Error::UnexpectedEof {
            expected: "a value",
        })?;

        let value = match tok.ty {
            TokenType::ParenLeft => {
                _ = self.next()?;
                let inner = self.scalar_expression(0)?;
                self.expect(TokenType::ParenRight, "`)`")?;
                return Ok(ScalarExpr::Paren(Box::new(inner)));
            }
            TokenType::Identifier => ScalarValue::Property(self.owned(&tok)),
            TokenType::Number => ScalarValue::Number(self.owned(&tok)),
            TokenType::String => ScalarValue::String(self.owned(&tok)),
            TokenType::Bool => ScalarValue::Bool(self.owned(&tok)),
            TokenType::Temporal => ScalarValue::Temporal(self.owned(&tok)),
            _ => return Err(self.unexpected(&tok, "a value")),
        };
        _ = self.next()?;
        Ok(ScalarExpr::Value(value))
    }

    fn spatial_predicate(&mut self, keyword: Token) -> Result<BooleanExpr, Error> {
        let function = SpatialFn::from_keyword(self.text(&keyword).as_bytes())
            .ok_or_else(|| self.unexpected(&keyword, "a spatial function"))?;
        self.expect(TokenType::ParenLeft, "`(`")?;
        let left = self.geom_expression()?;
        self.expect(TokenType::Comma, "`,`")?;
        let right = self.geom_expression()?;
        self.expect(TokenType::ParenRight, "`)`")?;
        Ok(BooleanExpr::Predicate(Box::new(Predicate::Spatial(
            SpatialPredicate {
                function,
                left,
                right,
            },
        ))))
    }

    fn distance_predicate(&mut self) -> Result<BooleanExpr, Error> {
        self.expect(TokenType::ParenLeft, "`(`")?;
        let left = self.geom_expression()?;
        self.expect(TokenType::Comma, "`,`")?;
        let right = self.geom_expression()?;
        self.expect(TokenType::Comma, "`,`")?;
        let distance = self.expect(TokenType::Number, "a distance")?;
        self.expect(TokenType::ParenRight, "`)`")?;
        Ok(BooleanExpr::Predicate(Box::new(Predicate::Distance(
            DistancePredicate {
                left,
                right,
                distance: self.owned(&distance),
            },
        ))))
    }

    fn geom_expression(&mut self) -> Result<GeomExpression, Error> {
        let tok = self.peek()?.ok_or(Error::UnexpectedEof {
            expected: "a property name or geometry literal",
        })?;

        match tok.ty {
            TokenType::Identifier => {
                _ = self.next()?;
                Ok(GeomExpression::Property(self.owned(&tok)))
            }
            ty if is_geometry_keyword(ty) => Ok(GeomExpression::Literal(self.geom_literal()?)),
            _ => Err(self.unexpected(&tok, "a property name or geometry literal")),
        }
    }

    fn geom_literal(&mut self) -> Result<GeomLiteral, Error> {
        let keyword = self.next()?.ok_or(Error::UnexpectedEof {
            expected: "a geometry literal",
        })?;

        match keyword.ty {
            TokenType::Point => {
                self.expect(TokenType::ParenLeft, "`(`")?;
                let coord = self.coordinate()?;
                self.expect(TokenType::ParenRight, "`)`")?;
                Ok(GeomLiteral::Point(coord))
            }
            TokenType::Linestring => {
                self.expect(TokenType::ParenLeft, "`(`")?;
                let coords = self.coordinate_list()?;
                self.expect(TokenType::ParenRight, "`)`")?;
                Ok(GeomLiteral::LineString(coords))
            }
            TokenType::Polygon => {
                self.expect(TokenType::ParenLeft, "`(`")?;
                let rings = self.ring_list()?;
                self.expect(TokenType::ParenRight, "`)`")?;
                Ok(GeomLiteral::Polygon(rings))
            }
            TokenType::MultiPoint => {
                self.expect(TokenType::ParenLeft, "`(`")?;
                let mut points = Vec::new();
                loop {
                    self.expect(TokenType::ParenLeft, "`(`")?;
                    points.push(self.coordinate()?);
                    self.expect(TokenType::ParenRight, "`)`")?;
                    if !self.lexer.consume(TokenType::Comma)? {
                        break;
                    }
                }
                self.expect(TokenType::ParenRight, "`)`")?;
                Ok(GeomLiteral::MultiPoint(points))
            }
            TokenType::MultiLinestring => {
                self.expect(TokenType::ParenLeft, "`(`")?;
                let lines = self.ring_list()?;
                self.expect(TokenType::ParenRight, "`)`")?;
                Ok(GeomLiteral::MultiLineString(lines))
            }
            TokenType::MultiPolygon => {
                self.expect(TokenType::ParenLeft, "`(`")?;
                let mut polygons = Vec::new();
                loop {
                    self.expect(TokenType::ParenLeft, "`(`")?;
                    polygons.push(self.ring_list()?);
                    self.expect(TokenType::ParenRight, "`)`")?;
                    if !self.lexer.consume(TokenType::Comma)? {
                        break;
                    }
                }
                self.expect(TokenType::ParenRight, "`)`")?;
                Ok(GeomLiteral::MultiPolygon(polygons))
            }
            TokenType::GeometryCollection => {
                self.expect(TokenType::ParenLeft, "`(`")?;
                let mut members = Vec::new();
                loop {
                    let tok = self.peek()?.ok_or(Error::UnexpectedEof {
                        expected: "a geometry literal",
                    })?;
                    // An envelope has no WKT form, so it cannot be a
                    //  collection member
                    if !is_geometry_keyword(tok.ty) || tok.ty == TokenType::Envelope {
                        return Err(self.unexpected(&tok, "a WKT geometry literal"));
                    }
                    members.push(self.geom_literal()?);
                    if !self.lexer.consume(TokenType::Comma)? {
                        break;
                    }
                }
                self.expect(TokenType::ParenRight, "`)`")?;
                Ok(GeomLiteral::GeometryCollection(members))
            }
            TokenType::Envelope => {
                self.expect(TokenType::ParenLeft, "`(`")?;
                let minx = self.number_lexeme()?;
                self.expect(TokenType::Comma, "`,`")?;
                let miny = self.number_lexeme()?;
                self.expect(TokenType::Comma, "`,`")?;
                let maxx = self.number_lexeme()?;
                self.expect(TokenType::Comma, "`,`")?;
                let maxy = self.number_lexeme()?;
                self.expect(TokenType::ParenRight, "`)`")?;
                Ok(GeomLiteral::Envelope {
                    minx,
                    miny,
                    maxx,
                    maxy,
                })
            }
            _ => Err(self.unexpected(&keyword, "a geometry literal")),
        }
    }

    fn number_lexeme(&mut self) -> Result<String, Error> {
        let tok = self.expect(TokenType::Number, "a number")?;
        Ok(self.owned(&tok))
    }

    /// Two whitespace-separated ordinates; `POINT(0,0)` is a syntax error.
    fn coordinate(&mut self) -> Result<Coord, Error> {
        let x = self.expect(TokenType::Number, "an ordinate")?;
        let y = self.expect(TokenType::Number, "an ordinate")?;
        Ok(Coord {
            x: self.owned(&x),
            y: self.owned(&y),
        })
    }

    fn coordinate_list(&mut self) -> Result<Vec<Coord>, Error> {
        let mut coords = Vec::new();
        loop {
            coords.push(self.coordinate()?);
            if !self.lexer.consume(TokenType::Comma)? {
                break;
            }
        }
        Ok(coords)
    }

    /// Comma-separated parenthesized coordinate lists, shared by POLYGON
    ///  rings and MULTILINESTRING members.
    fn ring_list(&mut self) -> Result<Vec<Vec<Coord>>, Error> {
        let mut rings = Vec::new();
        loop {
            self.expect(TokenType::ParenLeft, "`(`")?;
            rings.push(self.coordinate_list()?);
            self.expect(TokenType::ParenRight, "`)`")?;
            if !self.lexer.consume(TokenType::Comma)? {
                break;
            }
        }
        Ok(rings)
    }
}

fn is_geometry_keyword(ty: TokenType) -> bool {
    matches!(
        ty,
        TokenType::Point
            | TokenType::Linestring
            | TokenType::Polygon
            | TokenType::MultiPoint
            | TokenType::MultiLinestring
            | TokenType::MultiPolygon
            | TokenType::GeometryCollection
            | TokenType::Envelope
    )
}
