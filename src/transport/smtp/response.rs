//! SMTP replies: a three digit code and one or more lines of text

use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use nom::{
    branch::alt,
    bytes::streaming::{tag, take_until},
    character::streaming::one_of,
    combinator::{complete, map},
    multi::many0,
    sequence::{preceded, terminated, tuple},
    IResult,
};

use crate::transport::smtp::{error, Error};

/// The first digit of a reply code
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Severity {
    /// 2yz
    PositiveCompletion = 2,
    /// 3yz
    PositiveIntermediate = 3,
    /// 4yz
    TransientNegativeCompletion = 4,
    /// 5yz
    PermanentNegativeCompletion = 5,
}

/// A three digit reply code
///
/// ```
/// use mailer::transport::smtp::response::{Code, Severity};
///
/// let code: Code = "354".parse().unwrap();
/// assert_eq!(code.severity(), Severity::PositiveIntermediate);
/// assert_eq!(u16::from(code), 354);
/// ```
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
pub struct Code(u16);

impl Code {
    pub fn severity(self) -> Severity {
        match self.0 / 100 {
            2 => Severity::PositiveCompletion,
            3 => Severity::PositiveIntermediate,
            4 => Severity::TransientNegativeCompletion,
            _ => Severity::PermanentNegativeCompletion,
        }
    }

    /// Tells if the reply is positive
    pub fn is_positive(self) -> bool {
        matches!(
            self.severity(),
            Severity::PositiveCompletion | Severity::PositiveIntermediate
        )
    }
}

impl Display for Code {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Code> for u16 {
    fn from(code: Code) -> Self {
        code.0
    }
}

impl FromStr for Code {
    type Err = Error;

    fn from_str(s: &str) -> Result<Code, Error> {
        match complete(parse_code)(s) {
            Ok(("", code)) => Ok(code),
            _ => Err(error::response(format!("invalid reply code {s:?}"))),
        }
    }
}

/// A server reply
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Response {
    code: Code,
    message: Vec<String>,
}

impl FromStr for Response {
    type Err = Error;

    fn from_str(s: &str) -> Result<Response, Error> {
        parse_response(s)
            .map(|(_, r)| r)
            .map_err(|e| error::response(e.to_string()))
    }
}

impl Response {
    pub fn new(code: Code, message: Vec<String>) -> Response {
        Response { code, message }
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn is_positive(&self) -> bool {
        self.code.is_positive()
    }

    pub fn has_code(&self, code: u16) -> bool {
        self.code.0 == code
    }

    /// The first word of the first line, the server name in a greeting or
    /// an EHLO reply
    pub fn first_word(&self) -> Option<&str> {
        self.first_line()
            .and_then(|line| line.split_whitespace().next())
    }

    pub fn first_line(&self) -> Option<&str> {
        self.message.first().map(String::as_str)
    }

    /// The text lines, without codes and separators
    pub fn message(&self) -> impl Iterator<Item = &str> {
        self.message.iter().map(String::as_str)
    }

    /// The text of all lines, joined with newlines
    pub fn text(&self) -> String {
        self.message.join("\n")
    }
}

fn parse_code(i: &str) -> IResult<&str, Code> {
    map(
        tuple((one_of("2345"), one_of("0123456789"), one_of("0123456789"))),
        |(a, b, c)| {
            let digit = |d: char| d.to_digit(10).unwrap_or_default() as u16;
            Code(digit(a) * 100 + digit(b) * 10 + digit(c))
        },
    )(i)
}

/// Parses a complete reply. Returns `Err(nom::Err::Incomplete(_))` while
/// the final line has not been received.
pub(crate) fn parse_response(i: &str) -> IResult<&str, Response> {
    let (i, lines) = many0(tuple((
        parse_code,
        preceded(tag("-"), take_until("\r\n")),
        tag("\r\n"),
    )))(i)?;
    let (i, last_code) = parse_code(i)?;
    let (i, last_line) = alt((
        terminated(preceded(tag(" "), take_until("\r\n")), tag("\r\n")),
        map(tag("\r\n"), |_| ""),
    ))(i)?;

    if lines.iter().any(|&(code, _, _)| code != last_code) {
        return Err(nom::Err::Failure(nom::error::Error::new(
            i,
            nom::error::ErrorKind::Verify,
        )));
    }

    let mut message: Vec<String> = lines.into_iter().map(|(_, text, _)| text.into()).collect();
    message.push(last_line.into());

    Ok((
        i,
        Response {
            code: last_code,
            message,
        },
    ))
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn code_severity() {
        assert_eq!(Code(250).severity(), Severity::PositiveCompletion);
        assert_eq!(Code(334).severity(), Severity::PositiveIntermediate);
        assert_eq!(Code(421).severity(), Severity::TransientNegativeCompletion);
        assert_eq!(Code(554).severity(), Severity::PermanentNegativeCompletion);
        assert!(Code(354).is_positive());
        assert!(!Code(450).is_positive());
    }

    #[test]
    fn code_from_str() {
        assert_eq!("221".parse::<Code>().unwrap(), Code(221));
        assert!("621".parse::<Code>().is_err());
        assert!("22".parse::<Code>().is_err());
        assert!("2210".parse::<Code>().is_err());
    }

    #[test]
    fn parse_multiline() {
        let raw = "250-smtp.example.com Hello\r\n250-8BITMIME\r\n250-AUTH PLAIN LOGIN\r\n250 STARTTLS\r\n";
        let response: Response = raw.parse().unwrap();

        assert_eq!(response.code(), Code(250));
        assert_eq!(
            response.message().collect::<Vec<_>>(),
            vec![
                "smtp.example.com Hello",
                "8BITMIME",
                "AUTH PLAIN LOGIN",
                "STARTTLS"
            ]
        );
        assert_eq!(response.first_word(), Some("smtp.example.com"));
    }

    #[test]
    fn parse_single_line() {
        let response: Response = "354 End data with <CR><LF>.<CR><LF>\r\n".parse().unwrap();
        assert!(response.has_code(354));
        assert_eq!(response.text(), "End data with <CR><LF>.<CR><LF>");

        let response: Response = "250\r\n".parse().unwrap();
        assert!(response.has_code(250));
        assert_eq!(response.first_line(), Some(""));
    }

    #[test]
    fn parse_incomplete_and_invalid() {
        assert!(matches!(
            parse_response("250-first\r\n250 last"),
            Err(nom::Err::Incomplete(_))
        ));
        assert!(matches!(
            parse_response("250-first\r\n"),
            Err(nom::Err::Incomplete(_))
        ));
        assert!("250-a\r\n251 b\r\n".parse::<Response>().is_err());
        assert!("hello\r\n".parse::<Response>().is_err());
    }

    #[test]
    fn leftover_input_is_returned() {
        let (rest, response) = parse_response("235 ok\r\n250 next\r\n").unwrap();
        assert!(response.has_code(235));
        assert_eq!(rest, "250 next\r\n");
    }
}
