
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use im_rc::Vector;

use crate::common::*;
use crate::kernel::hash::{self, Hash};

pub type Term = Rc<TermData>;

/// Core terms. Every node carries the content hash of its structure;
/// the smart constructors below are the only way nodes are built, so a
/// stored hash always matches the canonical composition for its tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermData {
    Bound {
        hash: Hash,
        index: Index
    },
    Free {
        hash: Hash,
        name: Symbol
    },
    Star {
        hash: Hash
    },
    Pi {
        hash: Hash,
        mode: Mode,
        self_name: Symbol,
        name: Symbol,
        domain: Term,
        body: Term
    },
    Lambda {
        hash: Hash,
        mode: Mode,
        name: Symbol,
        body: Term
    },
    Apply {
        hash: Hash,
        mode: Mode,
        fun: Term,
        arg: Term
    },
    Let {
        hash: Hash,
        name: Symbol,
        let_body: Term,
        body: Term
    },
    Annotate {
        hash: Hash,
        checked: bool,
        anno: Term,
        body: Term
    },
}

const TAG_BOUND: Hash = 1;
const TAG_FREE: Hash = 2;
const TAG_STAR: Hash = 3;
const TAG_PI: Hash = 4;
const TAG_LAMBDA: Hash = 5;
const TAG_APPLY: Hash = 6;
const TAG_LET: Hash = 7;
const TAG_ANNOTATE: Hash = 8;

impl TermData {
    pub fn bound(index: Index) -> Term {
        let hash = hash::combine(TAG_BOUND, *index as Hash);
        Rc::new(TermData::Bound { hash, index })
    }

    pub fn free(name: Symbol) -> Term {
        let hash = hash::combine(TAG_FREE, hash::hash_str(name.as_ref()));
        Rc::new(TermData::Free { hash, name })
    }

    pub fn star() -> Term {
        let hash = hash::combine(TAG_STAR, 0);
        Rc::new(TermData::Star { hash })
    }

    pub fn pi(mode: Mode, self_name: Symbol, name: Symbol, domain: Term, body: Term) -> Term {
        let hash = hash::combine(hash::combine(TAG_PI, domain.hash()), body.hash());
        Rc::new(TermData::Pi { hash, mode, self_name, name, domain, body })
    }

    pub fn lambda(mode: Mode, name: Symbol, body: Term) -> Term {
        let hash = hash::combine(TAG_LAMBDA, body.hash());
        Rc::new(TermData::Lambda { hash, mode, name, body })
    }

    pub fn apply(mode: Mode, fun: Term, arg: Term) -> Term {
        let hash = hash::combine(hash::combine(TAG_APPLY, fun.hash()), arg.hash());
        Rc::new(TermData::Apply { hash, mode, fun, arg })
    }

    pub fn let_bind(name: Symbol, let_body: Term, body: Term) -> Term {
        let hash = hash::combine(hash::combine(TAG_LET, let_body.hash()), body.hash());
        Rc::new(TermData::Let { hash, name, let_body, body })
    }

    pub fn annotate(checked: bool, anno: Term, body: Term) -> Term {
        let hash = hash::combine(hash::combine(TAG_ANNOTATE, anno.hash()), body.hash());
        Rc::new(TermData::Annotate { hash, checked, anno, body })
    }

    pub fn hash(&self) -> Hash {
        match self {
            TermData::Bound { hash, .. }
            | TermData::Free { hash, .. }
            | TermData::Star { hash }
            | TermData::Pi { hash, .. }
            | TermData::Lambda { hash, .. }
            | TermData::Apply { hash, .. }
            | TermData::Let { hash, .. }
            | TermData::Annotate { hash, .. } => *hash
        }
    }

    fn is_apply(&self) -> bool { matches!(self, TermData::Apply { .. }) }

    /// Whether the term needs parentheses when it appears as the head or
    /// operand of a tighter form.
    fn ambiguous(&self) -> bool {
        match self {
            TermData::Pi { .. }
            | TermData::Lambda { .. }
            | TermData::Let { .. }
            | TermData::Annotate { .. } => true,
            TermData::Apply { .. } => true,
            TermData::Bound { .. }
            | TermData::Free { .. }
            | TermData::Star { .. } => false,
        }
    }

    pub fn to_string_with_context(&self, mut ctx: Vector<Symbol>) -> String {
        match self {
            TermData::Bound { index, .. } => {
                if **index < ctx.len() {
                    let level = index.to_level(ctx.len());
                    if let Some(name) = ctx.get(*level) {
                        if !name.as_ref().is_empty() { return name.to_string() }
                    }
                }
                index.to_string()
            }
            TermData::Free { name, .. } => name.to_string(),
            TermData::Star { .. } => "Type".to_string(),
            TermData::Pi { mode, self_name, name, domain, body, .. } => {
                let (open, close) = match mode {
                    Mode::Erased => ('<', '>'),
                    Mode::Free => ('(', ')')
                };
                let mut domain_ctx = ctx.clone();
                domain_ctx.push_back(*self_name);
                let domain = domain.to_string_with_context(domain_ctx);
                ctx.push_back(*self_name);
                ctx.push_back(*name);
                let body = body.to_string_with_context(ctx);
                format!("{}{}{} : {}{} -> {}", self_name, open, name, domain, close, body)
            }
            TermData::Lambda { mode, name, body, .. } => {
                let (open, close) = match mode {
                    Mode::Erased => ('<', '>'),
                    Mode::Free => ('(', ')')
                };
                ctx.push_back(*name);
                let body = body.to_string_with_context(ctx);
                format!("{}{}{} => {}", open, name, close, body)
            }
            TermData::Apply { mode, fun, arg, .. } => {
                let (open, close) = match mode {
                    Mode::Erased => ('<', '>'),
                    Mode::Free => ('(', ')')
                };
                let fun_str = fun.to_string_with_context(ctx.clone());
                let arg = arg.to_string_with_context(ctx);
                if fun.is_apply() || !fun.ambiguous() {
                    format!("{}{}{}{}", fun_str, open, arg, close)
                } else {
                    format!("({}){}{}{}", fun_str, open, arg, close)
                }
            }
            TermData::Let { name, let_body, body, .. } => {
                let let_body = let_body.to_string_with_context(ctx.clone());
                ctx.push_back(*name);
                let body = body.to_string_with_context(ctx);
                format!("let {} = {}; {}", name, let_body, body)
            }
            TermData::Annotate { anno, body, .. } => {
                let anno_str = anno.to_string_with_context(ctx.clone());
                let body_str = body.to_string_with_context(ctx);
                if body.ambiguous() {
                    format!("({}) :: {}", body_str, anno_str)
                } else {
                    format!("{} :: {}", body_str, anno_str)
                }
            }
        }
    }
}

impl fmt::Display for TermData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_with_context(Vector::new()))
    }
}

/// A named definition: declared type and body, with the content hash of
/// the pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub name: Symbol,
    pub hash: Hash,
    pub ty: Term,
    pub body: Term
}

impl Decl {
    pub fn new(name: Symbol, ty: Term, body: Term) -> Decl {
        let hash = hash::combine(ty.hash(), body.hash());
        Decl { name, hash, ty, body }
    }
}

impl fmt::Display for Decl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}\n  {}", self.name, self.ty, self.body)
    }
}

/// A checked unit: named definitions in insertion order, with a name
/// index for reference resolution. Insertion order only matters for
/// textual round-tripping; equality of modules is content equality.
#[derive(Debug, Default, PartialEq)]
pub struct Module {
    decls: Vec<Decl>,
    index: AHashMap<Symbol, usize>,
}

impl Module {
    pub fn new() -> Module {
        Module { decls: Vec::new(), index: AHashMap::new() }
    }

    /// Insert a definition. A duplicate name replaces the earlier body
    /// in place, keeping its position in the order.
    pub fn insert(&mut self, decl: Decl) {
        match self.index.get(&decl.name) {
            Some(at) => self.decls[*at] = decl,
            None => {
                self.index.insert(decl.name, self.decls.len());
                self.decls.push(decl);
            }
        }
    }

    pub fn lookup(&self, name: Symbol) -> Option<&Decl> {
        self.index.get(&name).map(|at| &self.decls[*at])
    }

    pub fn decls(&self) -> impl Iterator<Item = &Decl> {
        self.decls.iter()
    }

    pub fn len(&self) -> usize { self.decls.len() }

    pub fn is_empty(&self) -> bool { self.decls.is_empty() }

    /// Aggregate content hash: the fold of definition hashes in
    /// insertion order.
    pub fn hash(&self) -> Hash {
        self.decls.iter().fold(0, |acc, decl| hash::combine(acc, decl.hash))
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (at, decl) in self.decls.iter().enumerate() {
            if at > 0 { writeln!(f)?; }
            writeln!(f, "{}", decl)?;
        }
        Ok(())
    }
}
