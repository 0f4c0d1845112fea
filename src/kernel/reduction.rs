
use std::rc::Rc;

use colored::Colorize;

use crate::common::*;
use crate::kernel::subst::ERASED;
use crate::kernel::term::{Module, Term, TermData};
use crate::kernel::value::{eval, quote, Env, Value, ValueData};

/// Drive a value to weak-head form: unfold references through the
/// module, β-reduce relevant applications, drop erased arguments, enter
/// erased lambdas with the `<erased>` sentinel, unfold lets and
/// annotations. Subterms the head does not force are left untouched.
pub fn whnf(module: &Module, value: Value) -> Value {
    let mut value = value;
    loop {
        let next = match value.as_ref() {
            ValueData::Reference { name } => {
                match module.lookup(*name) {
                    None => return value,
                    Some(decl) => match decl.body.as_ref() {
                        // A definition aliasing another reference is
                        // chased by name, not unfolded.
                        TermData::Free { name: other, .. } => ValueData::reference(*other),
                        _ => eval(&Env::new(), &decl.body)
                    }
                }
            }
            ValueData::Apply { mode: Mode::Erased, fun, .. } => fun.clone(),
            ValueData::Apply { mode: Mode::Free, fun, arg } => {
                let fun = whnf(module, fun.clone());
                match fun.as_ref() {
                    ValueData::Lambda { body, .. } => body.apply(&[arg.clone()]),
                    _ => {
                        return Rc::new(ValueData::Apply {
                            mode: Mode::Free,
                            fun,
                            arg: arg.clone()
                        })
                    }
                }
            }
            ValueData::Lambda { mode: Mode::Erased, body, .. } => {
                body.apply(&[ValueData::reference(Symbol::from(ERASED))])
            }
            ValueData::Let { let_body, body, .. } => body.apply(&[let_body.clone()]),
            ValueData::Annotate { body, .. } => body.clone(),
            _ => return value
        };
        value = next;
    }
}

/// Weak-head reduction of a term under a module: convert to the
/// higher-order image, reduce the head, and read back.
pub fn reduce(module: &Module, term: &Term) -> Term {
    let value = eval(&Env::new(), term);
    let value = whnf(module, value);
    let result = quote(&value, 0.into());
    log::trace!("{} {} {} {}", "reduce".bright_blue(), term, "~>".bright_blue(), result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::subst::TermExt;
    use crate::kernel::term::Decl;

    fn var(index: usize) -> Term { TermData::bound(index.into()) }

    fn lam(name: &str, body: Term) -> Term {
        TermData::lambda(Mode::Free, Symbol::from(name), body)
    }

    fn app(fun: Term, arg: Term) -> Term {
        TermData::apply(Mode::Free, fun, arg)
    }

    #[test]
    fn beta_reduces_relevant_application() {
        let id = lam("x", var(0));
        let term = app(id, TermData::star());
        assert_eq!(reduce(&Module::new(), &term), TermData::star());
    }

    #[test]
    fn beta_matches_substitution() {
        // reduce((x) => b)(a)  ==  reduce(b[x := a])
        let module = Module::new();
        let body = app(var(0), var(0));
        let arg = lam("y", var(0));
        let redex = app(lam("x", body.clone()), arg.clone());
        assert_eq!(reduce(&module, &redex), reduce(&module, &body.subst(&arg, 0)));
    }

    #[test]
    fn erased_application_discards_argument() {
        let module = Module::new();
        let fun = lam("x", var(0));
        let term = TermData::apply(Mode::Erased, fun.clone(), TermData::star());
        assert_eq!(reduce(&module, &term), reduce(&module, &fun));
    }

    #[test]
    fn erased_lambda_reduces_into_its_body() {
        let term = TermData::lambda(Mode::Erased, Symbol::from("t"), var(0));
        let result = reduce(&Module::new(), &term);
        assert_eq!(result, TermData::free(Symbol::from(ERASED)));
    }

    #[test]
    fn let_unfolds() {
        let term = TermData::let_bind(Symbol::from("y"), TermData::star(), var(0));
        assert_eq!(reduce(&Module::new(), &term), TermData::star());
    }

    #[test]
    fn annotation_is_transparent() {
        let term = TermData::annotate(false, var(9), TermData::star());
        assert_eq!(reduce(&Module::new(), &term), TermData::star());
    }

    #[test]
    fn references_unfold_through_the_module() {
        let mut module = Module::new();
        let id = lam("x", var(0));
        module.insert(Decl::new(Symbol::from("id"), TermData::star(), id));
        module.insert(Decl::new(
            Symbol::from("id2"),
            TermData::star(),
            TermData::free(Symbol::from("id")),
        ));
        let term = app(TermData::free(Symbol::from("id2")), TermData::star());
        assert_eq!(reduce(&module, &term), TermData::star());
    }

    #[test]
    fn unknown_reference_is_stuck() {
        let term = TermData::free(Symbol::from("mystery"));
        assert_eq!(reduce(&Module::new(), &term), term);
    }

    #[test]
    fn arguments_stay_unreduced_in_head_normal_forms() {
        // f(((x) => x)(Type)) with f stuck: the argument redex survives.
        let inner = app(lam("x", var(0)), TermData::star());
        let term = app(TermData::free(Symbol::from("f")), inner.clone());
        assert_eq!(reduce(&Module::new(), &term), term);
    }

    #[test]
    fn reduction_goes_under_no_binder() {
        // (x) => ((y) => y)(x) is already weak-head normal.
        let inner = app(lam("y", var(0)), var(0));
        let term = lam("x", inner);
        assert_eq!(reduce(&Module::new(), &term), term);
    }
}
