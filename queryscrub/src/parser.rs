//! Permissive document parser: accepts unquoted keys, single- or
//! double-quoted strings, and trailing commas, the loose syntax found in the
//! server's log format. Always returns the same ordered [`Value`] used
//! throughout the rest of the crate.

use crate::value::Value;
use indexmap::IndexMap;
use nom::{
	branch::alt,
	bytes::complete::tag,
	character::complete::{alpha1, alphanumeric1, char, digit1, multispace0},
	combinator::{all_consuming, map, opt, recognize, value as nom_value},
	error::ParseError,
	multi::{many0, many0_count, separated_list0},
	sequence::{delimited, pair, separated_pair, terminated},
	IResult, Parser,
};

#[derive(Debug, thiserror::Error)]
#[error("failed to parse document: {0}")]
pub struct DocumentParseError(String);

pub fn parse_document(input: &str) -> Result<Value, DocumentParseError> {
	all_consuming(ws(parse_value))(input.trim())
		.map(|(_, v)| v)
		.map_err(|e: nom::Err<nom::error::Error<&str>>| DocumentParseError(e.to_string()))
}

fn ws<'a, F, O, E: ParseError<&'a str>>(inner: F) -> impl Parser<&'a str, O, E>
where
	F: Parser<&'a str, O, E>,
{
	delimited(multispace0, inner, multispace0)
}

fn parse_value(s: &str) -> IResult<&str, Value> {
	alt((
		map(parse_doc, Value::Doc),
		map(parse_array, Value::Array),
		map(parse_string, Value::Str),
		parse_number,
		nom_value(Value::Bool(true), tag("true")),
		nom_value(Value::Bool(false), tag("false")),
		nom_value(Value::Null, tag("null")),
	))(s)
}

fn parse_number(s: &str) -> IResult<&str, Value> {
	let (rest, text) = recognize(pair(
		opt(char('-')),
		pair(
			digit1,
			opt(pair(char('.'), digit1)),
		),
	))(s)?;
	if text.contains('.') {
		let f: f64 = text.parse().map_err(|_| {
			nom::Err::Error(nom::error::Error::new(s, nom::error::ErrorKind::Float))
		})?;
		Ok((rest, Value::Float(f)))
	} else {
		let i: i64 = text.parse().map_err(|_| {
			nom::Err::Error(nom::error::Error::new(s, nom::error::ErrorKind::Digit))
		})?;
		Ok((rest, Value::Int(i)))
	}
}

fn ident(s: &str) -> IResult<&str, &str> {
	recognize(pair(
		alt((alpha1, tag("_"), tag("$"))),
		many0_count(alt((alphanumeric1, tag("_"), tag("."), tag("$")))),
	))(s)
}

fn quoted(quote: char) -> impl Fn(&str) -> IResult<&str, String> {
	move |s: &str| {
		delimited(
			char(quote),
			map(many0(string_char(quote)), |chars| chars.into_iter().collect()),
			char(quote),
		)(s)
	}
}

fn string_char(quote: char) -> impl Fn(&str) -> IResult<&str, char> {
	move |s: &str| {
		if let Some(rest) = s.strip_prefix('\\') {
			let mut chars = rest.char_indices();
			match chars.next() {
				Some((_, escaped)) => {
					let next_idx = chars.next().map(|(i, _)| i).unwrap_or(rest.len());
					let resolved = match escaped {
						'n' => '\n',
						't' => '\t',
						'r' => '\r',
						other => other,
					};
					Ok((&rest[next_idx..], resolved))
				}
				None => Err(nom::Err::Error(nom::error::Error::new(
					s,
					nom::error::ErrorKind::Escaped,
				))),
			}
		} else {
			let mut chars = s.char_indices();
			match chars.next() {
				Some((_, c)) if c != quote => {
					let next_idx = chars.next().map(|(i, _)| i).unwrap_or(s.len());
					Ok((&s[next_idx..], c))
				}
				_ => Err(nom::Err::Error(nom::error::Error::new(
					s,
					nom::error::ErrorKind::Char,
				))),
			}
		}
	}
}

fn parse_string(s: &str) -> IResult<&str, String> {
	alt((quoted('"'), quoted('\'')))(s)
}

fn key(s: &str) -> IResult<&str, String> {
	alt((
		map(ident, |s: &str| s.to_string()),
		parse_string,
	))(s)
}

fn member(s: &str) -> IResult<&str, (String, Value)> {
	separated_pair(ws(key), char(':'), ws(parse_value))(s)
}

fn parse_doc(s: &str) -> IResult<&str, IndexMap<String, Value>> {
	delimited(
		ws(char('{')),
		map(
			terminated(
				separated_list0(ws(char(',')), member),
				opt(ws(char(','))),
			),
			|pairs| pairs.into_iter().collect(),
		),
		ws(char('}')),
	)(s)
}

fn parse_array(s: &str) -> IResult<&str, Vec<Value>> {
	delimited(
		ws(char('[')),
		map(
			terminated(
				separated_list0(ws(char(',')), parse_value),
				opt(ws(char(','))),
			),
			|items| items,
		),
		ws(char(']')),
	)(s)
}
