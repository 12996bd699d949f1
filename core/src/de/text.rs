use crate::{
    de::piq::{from_piq_as, ParseConfig},
    error::*,
    schema::SchemaIndex,
    value::{
        object::Object,
        piq::{Literal, Loc, Piq},
    },
};
use pest::{
    error::LineColLocation,
    iterators::{Pair, Pairs},
    Parser,
};
use pest_derive::Parser;

pub fn from_str<S>(schema: &S, type_name: &str, content: &str) -> Result<Object>
where
    S: SchemaIndex + ?Sized,
{
    from_str_as(schema, type_name, content, Default::default())
}

pub fn from_str_as<S>(
    schema: &S,
    type_name: &str,
    content: &str,
    config: ParseConfig,
) -> Result<Object>
where
    S: SchemaIndex + ?Sized,
{
    let value = piq_from_str(content)?;
    from_piq_as(schema, type_name, value, config)
}

#[derive(Parser)]
#[grammar = "de/text.grammar.pest"]
struct TextParser;

/// Reads one Piq item from text. Every node carries its line and column.
pub fn piq_from_str(content: &str) -> Result<Piq> {
    let mut pairs = TextParser::parse(Rule::main, content).map_err(|error| {
        let (line, column) = match error.line_col {
            LineColLocation::Pos(pos) => pos,
            LineColLocation::Span(start, _) => start,
        };
        Error::Syntax {
            loc: Some(Loc::new(line, column)),
            message: error.variant.message().into_owned(),
        }
    })?;
    let main = next(&mut pairs, None)?;
    parse(next(&mut main.into_inner(), None)?)
}

fn next<'i>(pairs: &mut Pairs<'i, Rule>, loc: Option<Loc>) -> Result<Pair<'i, Rule>> {
    pairs.next().ok_or_else(|| Error::Syntax {
        loc,
        message: "unexpected end of tokens".to_owned(),
    })
}

fn parse(ast: Pair<Rule>) -> Result<Piq> {
    let loc = Some(Loc::from(ast.line_col()));
    let scalar = |value: Literal| -> Result<Piq> { Ok(Piq::Scalar { value, loc }) };
    match ast.as_rule() {
        Rule::list => Ok(Piq::Seq {
            items: ast.into_inner().map(parse).collect::<Result<_>>()?,
            loc,
        }),
        Rule::label => {
            let name = next(&mut ast.into_inner(), loc)?;
            Ok(Piq::Label {
                name: label_name(&name),
                loc,
            })
        }
        Rule::labeled => {
            let mut pairs = ast.into_inner();
            let name = label_name(&next(&mut pairs, loc)?);
            let value = parse(next(&mut pairs, loc)?)?;
            Ok(Piq::Labeled {
                name,
                loc,
                value: Box::new(value),
            })
        }
        Rule::splice => {
            let mut pairs = ast.into_inner();
            let name = label_name(&next(&mut pairs, loc)?);
            let items = parse(next(&mut pairs, loc)?)?;
            Ok(Piq::splice(name, items)?.with_loc(loc))
        }
        Rule::bool => scalar(Literal::Bool(ast.as_str() == "true")),
        Rule::int => parse_int(ast.as_str())
            .map(Literal::Int)
            .ok_or_else(|| Error::Syntax {
                loc,
                message: format!("invalid int constant: {}", ast.as_str()),
            })
            .and_then(scalar),
        Rule::float => match ast.as_str().parse() {
            Ok(value) => scalar(Literal::Float(value)),
            Err(_) => Err(Error::Syntax {
                loc,
                message: format!("invalid float constant: {}", ast.as_str()),
            }),
        },
        Rule::string => {
            let inner = next(&mut ast.into_inner(), loc)?;
            scalar(Literal::Text(unescape(inner.as_str(), loc)?))
        }
        Rule::word => scalar(Literal::Text(ast.as_str().to_owned())),
        rule => Err(Error::Syntax {
            loc,
            message: format!("unexpected {:?}", rule),
        }),
    }
}

fn label_name(pair: &Pair<Rule>) -> String {
    pair.as_str().trim_start_matches('.').to_owned()
}

fn parse_int(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, text),
    };
    let value = match digits.strip_prefix("0x") {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { value.checked_neg()? } else { value })
}

fn unescape(text: &str, loc: Option<Loc>) -> Result<String> {
    let invalid = |what: &str| Error::Syntax {
        loc,
        message: format!("invalid escape sequence: {}", what),
    };
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') => result.push('\0'),
            Some(c @ ('"' | '\\' | '\'')) => result.push(c),
            Some('u') => {
                let rest = chars.as_str();
                let code = rest
                    .strip_prefix('{')
                    .and_then(|rest| rest.split_once('}'))
                    .map(|(code, _)| code)
                    .ok_or_else(|| invalid("\\u"))?;
                let c = u32::from_str_radix(code, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| invalid(code))?;
                result.push(c);
                chars = rest[code.len() + 2..].chars();
            }
            Some(c) => return Err(invalid(&c.to_string())),
            None => return Err(invalid("\\")),
        }
    }
    Ok(result)
}
