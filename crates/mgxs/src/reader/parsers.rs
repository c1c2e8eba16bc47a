// nom parser combinators
use nom::branch::alt;
use nom::bytes::complete::{tag, take_until, take_while, take_while1};
use nom::character::complete::{char, multispace0, multispace1};
use nom::combinator::{map, opt};
use nom::multi::{many0, separated_list0};
use nom::number::complete::double;
use nom::sequence::{delimited, preceded, separated_pair, terminated};
use nom::IResult;

use crate::document::Element;

/// Whole document, with an optional declaration before the root element
pub(crate) fn document(i: &str) -> IResult<&str, Element> {
    let (i, _) = opt(declaration)(i)?;
    terminated(element, multispace0)(i)
}

/// Any number of whitespace separated floats, including `nan` and `inf`
///
/// Values must be separated, so `1.02.0` stops after the first value and
/// leaves the rest unparsed.
pub(crate) fn vector_of_f64(i: &str) -> IResult<&str, Vec<f64>> {
    separated_list0(multispace1, double)(i.trim())
}

/// The `<?xml ... ?>` declaration, contents are ignored
fn declaration(i: &str) -> IResult<&str, &str> {
    delimited(
        preceded(multispace0, tag("<?xml")),
        take_until("?>"),
        tag("?>"),
    )(i)
}

/// Element with its attributes and any nested children
fn element(i: &str) -> IResult<&str, Element> {
    let (i, name) = preceded(multispace0, preceded(char('<'), identifier))(i)?;
    let (i, attributes) = many0(attribute)(i)?;
    let (i, _) = multispace0(i)?;
    let (i, children) = alt((map(tag("/>"), |_| Vec::new()), |i| content(i, name)))(i)?;
    Ok((
        i,
        Element::from_parts(name.to_string(), attributes, children),
    ))
}

/// Children of an element up to and including its closing tag
fn content<'a>(i: &'a str, name: &str) -> IResult<&'a str, Vec<Element>> {
    let (i, _) = char('>')(i)?;
    let (i, children) = many0(element)(i)?;
    let (i, _) = preceded(multispace0, tag("</"))(i)?;
    let (i, _) = terminated(tag(name), preceded(multispace0, char('>')))(i)?;
    Ok((i, children))
}

/// A `key="value"` pair with the value unescaped
fn attribute(i: &str) -> IResult<&str, (String, String)> {
    let (i, (key, value)) = preceded(
        multispace1,
        separated_pair(
            identifier,
            delimited(multispace0, char('='), multispace0),
            quoted,
        ),
    )(i)?;
    Ok((i, (key.to_string(), unescape(value))))
}

/// Value in either single or double quotes
fn quoted(i: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
    ))(i)
}

/// Tag or attribute name
fn identifier(i: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '.'))(i)
}

/// Replace entity and character references, unknown ones are kept as-is
pub(crate) fn unescape(value: &str) -> String {
    let mut s = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find('&') {
        s.push_str(&rest[..start]);
        rest = &rest[start..];

        let Some(end) = rest.find(';') else {
            break;
        };

        let replacement = match &rest[1..end] {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            reference => character_reference(reference),
        };

        match replacement {
            Some(c) => {
                s.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                s.push('&');
                rest = &rest[1..];
            }
        }
    }

    s.push_str(rest);
    s
}

/// Numeric references such as `#10` or `#x0A`
fn character_reference(reference: &str) -> Option<char> {
    let code = match reference.strip_prefix("#x") {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => reference.strip_prefix('#')?.parse().ok()?,
    };
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_elements() {
        let text = "<?xml version='1.0' encoding='utf-8'?>\n<a x=\"1\" y='two'>\n  <b/>\n  <c z = \"3\" >\n    <d/>\n  </c>\n</a>\n";
        let (rest, root) = document(text).unwrap();
        assert!(rest.is_empty());
        assert_eq!(root.tag(), "a");
        assert_eq!(root.attribute("y"), Some("two"));
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.children()[1].attribute("z"), Some("3"));
        assert_eq!(root.children()[1].children()[0].tag(), "d");
    }

    #[test]
    fn mismatched_closing_tag() {
        assert!(document("<a><b/></c>").is_err());
        assert!(document("<a x=\"1\">").is_err());
    }

    #[test]
    fn escaped_values() {
        assert_eq!(unescape("a &amp; b &lt;c&gt; &quot;&apos;"), "a & b <c> \"'");
        assert_eq!(unescape("line&#10;break&#x9;tab"), "line\nbreak\ttab");
        assert_eq!(unescape("R&D; 5 & 6"), "R&D; 5 & 6");
    }

    #[test]
    fn float_lists() {
        let (_, values) = vector_of_f64(" 0.5 1e-05  2e+16 nan").unwrap();
        assert_eq!(values[..3], [0.5, 1e-5, 2e16]);
        assert!(values[3].is_nan());

        let (rest, values) = vector_of_f64("").unwrap();
        assert!(rest.is_empty() && values.is_empty());

        let (rest, values) = vector_of_f64("1.02.0").unwrap();
        assert_eq!(values, [1.02]);
        assert_eq!(rest, ".0");
    }
}
