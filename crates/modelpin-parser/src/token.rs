//! Token-level grammar shared by the directive parsers.
//!
//! Directives are flat delimited text, so the outer structure is handled by
//! splitting with span tracking ([`split`], [`rsplit_once`]) and the atomic
//! tokens (dimensions, indices, booleans, datatypes) are recognized with
//! small winnow parsers that must consume the whole token.

use winnow::{
    Parser as _,
    ascii::digit1,
    combinator::{alt, opt},
    error::ModalResult,
};

use modelpin_core::tensor::DataType;

use crate::span::{Span, Spanned};

/// A piece of directive text together with its position in the raw directive.
pub(crate) type Piece<'a> = Spanned<&'a str>;

/// Wraps the whole directive text as a piece starting at offset 0.
pub(crate) fn whole(text: &str) -> Piece<'_> {
    Spanned::new(text, Span::new(0..text.len()))
}

/// Splits `piece` on `sep`, keeping empty pieces (same as [`str::split`]).
pub(crate) fn split(piece: Piece<'_>, sep: char) -> Vec<Piece<'_>> {
    let base = piece.span().start();
    let text = piece.into_inner();
    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(sep) {
        pieces.push(Spanned::new(&text[start..idx], Span::new(base + start..base + idx)));
        start = idx + sep.len_utf8();
    }
    pieces.push(Spanned::new(&text[start..], Span::new(base + start..base + text.len())));
    pieces
}

/// Splits `piece` on the last `sep`.
pub(crate) fn rsplit_once(piece: Piece<'_>, sep: char) -> Option<(Piece<'_>, Piece<'_>)> {
    let base = piece.span().start();
    let text = piece.into_inner();
    let idx = text.rfind(sep)?;
    let tail_start = idx + sep.len_utf8();
    Some((
        Spanned::new(&text[..idx], Span::new(base..base + idx)),
        Spanned::new(&text[tail_start..], Span::new(base + tail_start..base + text.len())),
    ))
}

/// Splits `piece` on the first `sep`.
pub(crate) fn split_once(piece: Piece<'_>, sep: char) -> Option<(Piece<'_>, Piece<'_>)> {
    let base = piece.span().start();
    let text = piece.into_inner();
    let idx = text.find(sep)?;
    let tail_start = idx + sep.len_utf8();
    Some((
        Spanned::new(&text[..idx], Span::new(base..base + idx)),
        Spanned::new(&text[tail_start..], Span::new(base + tail_start..base + text.len())),
    ))
}

/// Trims surrounding whitespace, narrowing the span to match.
pub(crate) fn trim(piece: Piece<'_>) -> Piece<'_> {
    let base = piece.span().start();
    let text = piece.into_inner();
    let leading = text.len() - text.trim_start().len();
    let trimmed = text.trim();
    Spanned::new(
        trimmed,
        Span::new(base + leading..base + leading + trimmed.len()),
    )
}

// =============================================================================
// Atomic parsers
// =============================================================================

/// `-?[0-9]+`
fn signed_digits<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (opt('-'), digit1).take().parse_next(input)
}

/// `[0-9]+`
fn digits<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    digit1.parse_next(input)
}

/// `true` or `false`
fn boolean(input: &mut &str) -> ModalResult<bool> {
    alt(("true".value(true), "false".value(false))).parse_next(input)
}

/// `FP32`, `FP16` or `UINT8`
fn datatype(input: &mut &str) -> ModalResult<DataType> {
    alt((
        "FP32".value(DataType::Float),
        "FP16".value(DataType::Float16),
        "UINT8".value(DataType::Uint8),
    ))
    .parse_next(input)
}

/// Returns `true` if the whole token is an optionally negative digit string.
pub(crate) fn is_signed_integer(token: &str) -> bool {
    signed_digits.parse(token).is_ok()
}

/// Returns `true` if the whole token is a non-empty ASCII digit string.
pub(crate) fn is_digits(token: &str) -> bool {
    digits.parse(token).is_ok()
}

/// Parses a whole token as `true`/`false`.
pub(crate) fn parse_boolean(token: &str) -> Option<bool> {
    boolean.parse(token).ok()
}

/// Parses a whole token as a directive datatype.
pub(crate) fn parse_datatype(token: &str) -> Option<DataType> {
    datatype.parse(token).ok()
}
