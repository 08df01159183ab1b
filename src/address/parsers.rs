//! Mailbox parsers for the subset of [RFC2822] found in `From`, `Sender`,
//! `To`, `Cc` and `Bcc` header values.
//!
//! Encoded words produced by the header codec are plain atoms in this
//! grammar, so display names are accepted without being decoded.
//!
//! [RFC2822]: https://datatracker.ietf.org/doc/html/rfc2822

use chumsky::{error::Cheap, prelude::*};

pub(super) type Parsed = (Option<String>, (String, String));

// WSP            =  SP / HTAB
fn wsp() -> impl Parser<char, char, Error = Cheap<char>> {
    filter(|c: &char| *c == ' ' || *c == '\t')
}

// UTF8-non-ascii  =   UTF8-2 / UTF8-3 / UTF8-4
fn utf8_non_ascii() -> impl Parser<char, char, Error = Cheap<char>> {
    filter(|c: &char| !c.is_ascii())
}

// FWS             =       ([*WSP CRLF] 1*WSP) /   ; Folding white space
//                         obs-FWS
fn fws() -> impl Parser<char, Option<char>, Error = Cheap<char>> {
    wsp().or_not().then_ignore(wsp().ignored().repeated())
}

// atext           =       ALPHA / DIGIT / ; Any character except controls,
//                         "!" / "#" /     ;  SP, and specials.
//                         ...
fn atext() -> impl Parser<char, char, Error = Cheap<char>> {
    choice((
        filter(|c: &char| c.is_ascii_alphanumeric()),
        one_of("!#$%&'*+-/=?^_`{|}~"),
        utf8_non_ascii(),
    ))
}

// atom            =       [CFWS] 1*atext [CFWS]
fn atom() -> impl Parser<char, Vec<char>, Error = Cheap<char>> {
    fws().chain(atext().repeated().at_least(1))
}

// dot-atom-text   =       1*atext *("." 1*atext)
fn dot_atom() -> impl Parser<char, Vec<char>, Error = Cheap<char>> {
    fws().chain::<char, Vec<char>, _>(
        atext().repeated().at_least(1).chain::<char, Vec<char>, _>(
            just('.')
                .chain(atext().repeated().at_least(1))
                .repeated()
                .flatten(),
        ),
    )
}

// qtext           =       NO-WS-CTL /     ; Non white space controls
//                         %d33 /          ; The rest of the US-ASCII
//                         %d35-91 /       ;  characters not including "\"
//                         %d93-126        ;  or the quote character
fn qtext() -> impl Parser<char, char, Error = Cheap<char>> {
    filter(|c: &char| {
        matches!(u32::from(*c), 1..=8 | 11 | 12 | 14..=31 | 33 | 35..=91 | 93..=127)
    })
}

// quoted-pair     =       ("\" text) / obs-qp
fn quoted_pair() -> impl Parser<char, char, Error = Cheap<char>> {
    just('\\').ignore_then(filter(|c: &char| *c != '\r' && *c != '\n'))
}

// quoted-string   =       [CFWS]
//                         DQUOTE *([FWS] qcontent) [FWS] DQUOTE
//                         [CFWS]
fn quoted_string() -> impl Parser<char, Vec<char>, Error = Cheap<char>> {
    let qcontent = choice((qtext(), quoted_pair(), utf8_non_ascii()));
    just('"')
        .ignore_then(fws().chain(qcontent).repeated().flatten())
        .then_ignore(wsp().repeated())
        .then_ignore(just('"'))
}

// word            =       atom / quoted-string
fn word() -> impl Parser<char, Vec<char>, Error = Cheap<char>> {
    choice((fws().ignore_then(quoted_string()), atom()))
}

// phrase          =       1*word / obs-phrase
// obs-phrase      =       word *(word / "." / CFWS)
fn phrase() -> impl Parser<char, Vec<char>, Error = Cheap<char>> {
    word().chain::<char, Vec<char>, _>(
        choice((word(), just('.').repeated().exactly(1)))
            .repeated()
            .flatten(),
    )
}

// addr-spec       =       local-part "@" domain
// local-part      =       dot-atom / quoted-string / obs-local-part
// domain          =       dot-atom / domain-literal / obs-domain
fn addr_spec() -> impl Parser<char, (String, String), Error = Cheap<char>> {
    let domain_literal = just('[')
        .chain(filter(|c: &char| !matches!(*c, '[' | ']' | '\\' | ' ')).repeated())
        .chain(just(']'));

    choice((dot_atom(), quoted_string()))
        .collect()
        .then_ignore(just('@'))
        .then(choice((dot_atom(), domain_literal)).collect())
}

// angle-addr      =       [CFWS] "<" addr-spec ">" [CFWS] / obs-angle-addr
fn angle_addr() -> impl Parser<char, (String, String), Error = Cheap<char>> {
    addr_spec().delimited_by(just('<'), just('>')).padded()
}

// name-addr       =       [display-name] angle-addr
fn name_addr() -> impl Parser<char, Parsed, Error = Cheap<char>> {
    phrase()
        .collect::<String>()
        .or_not()
        .then(angle_addr())
        .map(|(name, addr)| (name.map(|name| name.trim().to_owned()), addr))
}

// mailbox         =       name-addr / addr-spec
fn any_mailbox() -> impl Parser<char, Parsed, Error = Cheap<char>> {
    choice((name_addr(), addr_spec().map(|addr| (None, addr))))
}

pub(super) fn mailbox() -> impl Parser<char, Parsed, Error = Cheap<char>> {
    any_mailbox().padded().then_ignore(end())
}

// mailbox-list    =       (mailbox *("," mailbox)) / obs-mbox-list
pub(super) fn mailbox_list() -> impl Parser<char, Vec<Parsed>, Error = Cheap<char>> {
    any_mailbox()
        .padded()
        .separated_by(just(','))
        .at_least(1)
        .then_ignore(end())
}
