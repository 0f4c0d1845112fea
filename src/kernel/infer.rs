
use std::fmt::Write;

use colored::Colorize;
use im_rc::Vector;
use thiserror::Error;

use crate::common::*;
use crate::kernel::conversion::equal;
use crate::kernel::reduction::reduce;
use crate::kernel::subst::TermExt;
use crate::kernel::term::{Decl, Module, Term, TermData};

#[derive(Debug, Error)]
pub enum TypeError {
    #[error("Erasure mismatch")]
    ErasureMismatch,
    #[error("Lambda has a non-function type")]
    LambdaNonFunction,
    #[error("Unexpected type:\n- expected: {expected}\n- inferred: {inferred}\n- term:     {term}\n- context:  {context}")]
    UnexpectedType {
        expected: String,
        inferred: String,
        term: String,
        context: String
    },
    #[error("Unbound variable")]
    UnboundVariable,
    #[error("Undefined Reference")]
    UndefinedReference,
    #[error("Non-function application")]
    NonFunctionApplication,
    #[error("Can't infer type")]
    CantInfer,
}

/// Typing context: the type of each bound variable, scoped at its
/// binding point, and the binder name hints used for printing. The
/// innermost binding sits last.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub types: Vector<Term>,
    pub names: Vector<Symbol>,
}

impl Context {
    pub fn new() -> Context {
        Context::default()
    }

    fn bind(&self, name: Symbol, ty: Term) -> Context {
        let mut result = self.clone();
        result.types.push_back(ty);
        result.names.push_back(name);
        result
    }

    fn render(&self) -> String {
        let mut out = String::from("[");
        for (at, (name, ty)) in self.names.iter().zip(self.types.iter()).enumerate() {
            if at > 0 { out.push_str(", "); }
            let scope: Vector<Symbol> = self.names.iter().take(at).cloned().collect();
            let _ = write!(out, "{} : {}", name, ty.to_string_with_context(scope));
        }
        out.push(']');
        out
    }
}

fn unexpected(ctx: &Context, expected: &Term, inferred: &Term, term: &Term) -> TypeError {
    TypeError::UnexpectedType {
        expected: expected.to_string_with_context(ctx.names.clone()),
        inferred: inferred.to_string_with_context(ctx.names.clone()),
        term: term.to_string_with_context(ctx.names.clone()),
        context: ctx.render()
    }
}

/// Check `term` against `expected` (up to conversion). Lambdas are
/// checked directly against a function type — this is where the self
/// binder of the expected type gets instantiated with the lambda itself;
/// everything else changes direction through `infer`.
pub fn check(module: &Module, ctx: &Context, expected: &Term, term: &Term) -> Result<(), TypeError> {
    log::trace!("{} {} {} {}", "check".bright_blue(), term, ":?".bright_blue(), expected);
    let expected_whnf = reduce(module, expected);
    match (term.as_ref(), expected_whnf.as_ref()) {
        (TermData::Lambda { mode, name, body, .. },
            TermData::Pi { mode: type_mode, domain, body: type_body, .. }) =>
        {
            if mode != type_mode { return Err(TypeError::ErasureMismatch) }
            // The argument's type is the Pi domain with the self binder
            // replaced by the lambda being checked.
            let arg_type = domain.subst(term, 0);
            let body_expected = type_body.subst(&term.shift(1, 0), 1);
            let ctx = ctx.bind(*name, arg_type);
            check(module, &ctx, &body_expected, body)
        }
        (TermData::Lambda { .. }, _) => Err(TypeError::LambdaNonFunction),
        _ => {
            let inferred = infer(module, ctx, term)?;
            if equal(module, &expected_whnf, &inferred) { Ok(()) }
            else { Err(unexpected(ctx, &expected_whnf, &inferred, term)) }
        }
    }
}

/// Infer the type of `term`.
pub fn infer(module: &Module, ctx: &Context, term: &Term) -> Result<Term, TypeError> {
    match term.as_ref() {
        TermData::Bound { index, .. } => {
            if **index < ctx.types.len() {
                let level = index.to_level(ctx.types.len());
                let ty = ctx.types.get(*level).expect("context lookup within length");
                Ok(ty.shift(**index + 1, 0))
            } else {
                Err(TypeError::UnboundVariable)
            }
        }
        TermData::Free { name, .. } => {
            match module.lookup(*name) {
                Some(decl) => Ok(decl.ty.clone()),
                None => Err(TypeError::UndefinedReference)
            }
        }
        TermData::Star { .. } => Ok(TermData::star()),
        TermData::Pi { self_name, name, domain, body, .. } => {
            // The self binder sees the whole function type, trusted to
            // be a type so its own inference does not recurse forever.
            let self_type = TermData::annotate(true, TermData::star(), term.clone());
            let ctx = ctx.bind(*self_name, self_type);
            infer(module, &ctx, domain)?;
            let ctx = ctx.bind(*name, domain.clone());
            check(module, &ctx, &TermData::star(), body)?;
            Ok(TermData::star())
        }
        TermData::Lambda { .. } => Err(TypeError::CantInfer),
        TermData::Apply { mode, fun, arg, .. } => {
            let fun_type = reduce(module, &infer(module, ctx, fun)?);
            match fun_type.as_ref() {
                TermData::Pi { mode: type_mode, domain, body, .. } => {
                    if mode != type_mode { return Err(TypeError::ErasureMismatch) }
                    check(module, ctx, &domain.subst(fun, 0), arg)?;
                    let body = body.subst(&fun.shift(1, 0), 1);
                    Ok(body.subst(arg, 0))
                }
                _ => Err(TypeError::NonFunctionApplication)
            }
        }
        TermData::Let { name, let_body, body, .. } => {
            let let_type = infer(module, ctx, let_body)?;
            let ctx = ctx.bind(*name, let_type);
            let body_type = infer(module, &ctx, body)?;
            Ok(body_type.subst(let_body, 0))
        }
        TermData::Annotate { checked: true, anno, .. } => Ok(anno.clone()),
        TermData::Annotate { checked: false, anno, body, .. } => {
            check(module, ctx, anno, body)?;
            Ok(anno.clone())
        }
    }
}

/// Check one definition's body against its declared type.
pub fn check_decl(module: &Module, decl: &Decl) -> Result<(), TypeError> {
    check(module, &Context::new(), &decl.ty, &decl.body)
}

/// Check every definition independently, collecting the failures.
pub fn check_all(module: &Module) -> Vec<(Symbol, TypeError)> {
    let mut failures = Vec::new();
    for decl in module.decls() {
        if let Err(error) = check_decl(module, decl) {
            failures.push((decl.name, error));
        }
    }
    failures
}
