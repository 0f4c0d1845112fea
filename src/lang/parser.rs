
use im_rc::Vector;
use thiserror::Error;

use crate::common::*;
use crate::kernel::subst::TermExt;
use crate::kernel::term::{Decl, Module, Term, TermData};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("no parse")]
    NoParse,
    #[error("expected end of input")]
    ExpectedEof,
}

/// Lexical scope at the parse point, innermost binder last. An
/// identifier found here becomes a variable; anything else a reference.
type Scope = Vector<Symbol>;

/// Every parser takes the remaining input and returns the rest plus a
/// result, or nothing; alternatives are tried in order and backtrack by
/// re-reading from the original slice. Parsers consume leading layout
/// but never trailing layout, so adjacency (no whitespace before an
/// application opener) stays observable.
type Parsed<'a, T> = Option<(&'a str, T)>;

/// Skip whitespace and the four comment forms.
fn skip(mut input: &str) -> &str {
    loop {
        let trimmed = input.trim_start_matches([' ', '\t', '\r', '\n']);
        if let Some(rest) = trimmed.strip_prefix("//").or_else(|| trimmed.strip_prefix("--")) {
            input = match rest.find('\n') {
                Some(at) => &rest[at + 1..],
                None => ""
            };
        } else if let Some(rest) = trimmed.strip_prefix("/*") {
            input = match rest.find("*/") {
                Some(at) => &rest[at + 2..],
                None => ""
            };
        } else if let Some(rest) = trimmed.strip_prefix("{-") {
            input = match rest.find("-}") {
                Some(at) => &rest[at + 2..],
                None => ""
            };
        } else {
            return trimmed;
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// A name at the very start of the input, no layout skipped.
fn take_name(input: &str) -> Parsed<'_, Symbol> {
    let end = input.find(|c| !is_name_char(c)).unwrap_or(input.len());
    if end == 0 { None } else { Some((&input[end..], Symbol::from(&input[..end]))) }
}

fn name(input: &str) -> Parsed<'_, Symbol> {
    take_name(skip(input))
}

/// Literal token after layout.
fn token<'a>(input: &'a str, pattern: &str) -> Option<&'a str> {
    skip(input).strip_prefix(pattern)
}

fn opener(input: &str) -> Parsed<'_, Mode> {
    if let Some(rest) = input.strip_prefix('(') { Some((rest, Mode::Free)) }
    else if let Some(rest) = input.strip_prefix('<') { Some((rest, Mode::Erased)) }
    else { None }
}

fn closer(mode: Mode) -> &'static str {
    match mode {
        Mode::Free => ")",
        Mode::Erased => ">"
    }
}

/// Dependent function type: `[self] ( name : domain ) -> body`, with
/// `<...>` for the erased form. The self name binds in the domain; self
/// and argument bind in the body.
fn all<'a>(input: &'a str, scope: &Scope) -> Parsed<'a, Term> {
    let input = skip(input);
    let (rest, self_name) = match take_name(input) {
        Some((rest, sym)) => (rest, sym),
        None => (input, Symbol::default())
    };
    let (rest, mode) = opener(rest)?;
    let (rest, bind_name) = match name(rest) {
        Some((rest, sym)) => (rest, sym),
        None => (rest, Symbol::default())
    };
    let rest = token(rest, ":")?;
    let mut domain_scope = scope.clone();
    domain_scope.push_back(self_name);
    let (rest, domain) = term(rest, &domain_scope)?;
    let rest = token(rest, closer(mode))?;
    let rest = token(rest, "->")?;
    let mut body_scope = domain_scope;
    body_scope.push_back(bind_name);
    let (rest, body) = term(rest, &body_scope)?;
    Some((rest, TermData::pi(mode, self_name, bind_name, domain, body)))
}

/// Lambda: `( name ) => body` or `< name > => body`; the arrow is
/// optional. A closer immediately followed by an application opener is
/// rejected so that `(f)(x)` reads as an application of a grouped term.
fn lam<'a>(input: &'a str, scope: &Scope) -> Parsed<'a, Term> {
    let input = skip(input);
    let (rest, mode) = opener(input)?;
    let (rest, bind_name) = match name(rest) {
        Some((rest, sym)) => (rest, sym),
        None => (rest, Symbol::default())
    };
    let rest = token(rest, closer(mode))?;
    if rest.starts_with(['(', '<', '|']) { return None }
    let rest = match token(rest, "=>") {
        Some(rest) => rest,
        None => rest
    };
    let mut body_scope = scope.clone();
    body_scope.push_back(bind_name);
    let (rest, body) = term(rest, &body_scope)?;
    Some((rest, TermData::lambda(mode, bind_name, body)))
}

/// `let name = expr [;] body`
fn let_bind<'a>(input: &'a str, scope: &Scope) -> Parsed<'a, Term> {
    let (rest, keyword) = name(input)?;
    if keyword.as_ref() != "let" { return None }
    let (rest, bind_name) = name(rest)?;
    let rest = token(rest, "=")?;
    let (rest, expr) = term(rest, scope)?;
    let rest = token(rest, ";").unwrap_or(rest);
    let mut body_scope = scope.clone();
    body_scope.push_back(bind_name);
    let (rest, body) = term(rest, &body_scope)?;
    Some((rest, TermData::let_bind(bind_name, expr, body)))
}

fn group<'a>(input: &'a str, scope: &Scope) -> Parsed<'a, Term> {
    let rest = token(input, "(")?;
    let (rest, inner) = term(rest, scope)?;
    let rest = token(rest, ")")?;
    Some((rest, inner))
}

fn var<'a>(input: &'a str, scope: &Scope) -> Parsed<'a, Term> {
    let (rest, sym) = name(input)?;
    if sym.as_ref() == "Type" { return Some((rest, TermData::star())) }
    let term = match scope.iter().rev().position(|bound| *bound == sym) {
        Some(index) => TermData::bound(index.into()),
        None => TermData::free(sym)
    };
    Some((rest, term))
}

fn atom<'a>(input: &'a str, scope: &Scope) -> Parsed<'a, Term> {
    all(input, scope)
        .or_else(|| lam(input, scope))
        .or_else(|| let_bind(input, scope))
        .or_else(|| group(input, scope))
        .or_else(|| var(input, scope))
}

/// A full term: an atom, a chain of adjacent applications, an optional
/// non-dependent arrow, an optional annotation.
fn term<'a>(input: &'a str, scope: &Scope) -> Parsed<'a, Term> {
    let (mut rest, mut result) = atom(input, scope)?;

    // Applications bind only when the opener touches the function term;
    // `f (x)` is not an application.
    loop {
        if let Some(after) = rest.strip_prefix('(') {
            let (after, arg) = term(after, scope)?;
            let after = token(after, ")")?;
            result = TermData::apply(Mode::Free, result, arg);
            rest = after;
        } else if let Some(after) = rest.strip_prefix('<') {
            let (after, arg) = term(after, scope)?;
            let after = token(after, ">")?;
            result = TermData::apply(Mode::Erased, result, arg);
            rest = after;
        } else if let Some(after) = rest.strip_prefix('|') {
            let (after, arg) = term(after, scope)?;
            let after = token(after, ";")?;
            result = TermData::apply(Mode::Free, result, arg);
            rest = after;
        } else {
            break;
        }
    }

    // Non-dependent arrow: the domain moves under an implicit self
    // binder it cannot reference, hence the shift.
    if let Some(after) = token(rest, "->") {
        let mut body_scope = scope.clone();
        body_scope.push_back(Symbol::default());
        body_scope.push_back(Symbol::default());
        let (after, body) = term(after, &body_scope)?;
        let domain = result.shift(1, 0);
        result = TermData::pi(Mode::Free, Symbol::default(), Symbol::default(), domain, body);
        rest = after;
    }

    if let Some(after) = token(rest, "::") {
        let (after, anno) = term(after, scope)?;
        result = TermData::annotate(false, anno, result);
        rest = after;
    }

    Some((rest, result))
}

/// `name : type body`
fn definition(input: &str) -> Parsed<'_, Decl> {
    let (rest, decl_name) = name(input)?;
    let rest = token(rest, ":")?;
    let scope = Scope::new();
    let (rest, ty) = term(rest, &scope)?;
    let (rest, body) = term(rest, &scope)?;
    Some((rest, Decl::new(decl_name, ty, body)))
}

/// Parse a whole module: definitions until the input runs out. Residue
/// that is not a definition is an error.
pub fn parse_module(input: &str) -> Result<Module, ParseError> {
    let mut module = Module::new();
    let mut rest = input;
    loop {
        if skip(rest).is_empty() { return Ok(module) }
        match definition(rest) {
            Some((after, decl)) => {
                module.insert(decl);
                rest = after;
            }
            None => return Err(ParseError::ExpectedEof)
        }
    }
}

/// Parse a single closed term spanning the whole input.
pub fn parse_term(input: &str) -> Result<Term, ParseError> {
    match term(input, &Scope::new()) {
        None => Err(ParseError::NoParse),
        Some((rest, result)) => {
            if skip(rest).is_empty() { Ok(result) } else { Err(ParseError::ExpectedEof) }
        }
    }
}
