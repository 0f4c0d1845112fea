
use crate::common::*;
use crate::kernel::term::{Term, TermData};

/// Sentinel standing in for the parameter of an erased lambda during
/// reduction and erasure; not expressible in source syntax.
pub const ERASED: &str = "<erased>";

pub trait TermExt {
    /// Increment every variable with index `>= cutoff` by `inc`,
    /// rebuilding hashes on the way out.
    fn shift(&self, inc: usize, cutoff: usize) -> Term;

    /// Replace the variable at `depth` with `value` (which must be valid
    /// under `depth` binders) and decrement the variables above it.
    /// Crossing a binder of size k shifts `value` by k and raises the
    /// depth by k.
    fn subst(&self, value: &Term, depth: usize) -> Term;

    /// The computational content: erased lambdas vanish into their
    /// bodies, erased applications keep only the function, annotations
    /// strip to the annotated term.
    fn erase(&self) -> Term;
}

impl TermExt for Term {
    fn shift(&self, inc: usize, cutoff: usize) -> Term {
        if inc == 0 { return self.clone() }
        match self.as_ref() {
            TermData::Bound { index, .. } => {
                let index = if **index < cutoff { *index } else { *index + inc };
                TermData::bound(index)
            }
            TermData::Free { .. }
            | TermData::Star { .. } => self.clone(),
            TermData::Pi { mode, self_name, name, domain, body, .. } => {
                let domain = domain.shift(inc, cutoff + 1);
                let body = body.shift(inc, cutoff + 2);
                TermData::pi(*mode, *self_name, *name, domain, body)
            }
            TermData::Lambda { mode, name, body, .. } => {
                let body = body.shift(inc, cutoff + 1);
                TermData::lambda(*mode, *name, body)
            }
            TermData::Apply { mode, fun, arg, .. } => {
                let fun = fun.shift(inc, cutoff);
                let arg = arg.shift(inc, cutoff);
                TermData::apply(*mode, fun, arg)
            }
            TermData::Let { name, let_body, body, .. } => {
                let let_body = let_body.shift(inc, cutoff);
                let body = body.shift(inc, cutoff + 1);
                TermData::let_bind(*name, let_body, body)
            }
            TermData::Annotate { checked, anno, body, .. } => {
                let anno = anno.shift(inc, cutoff);
                let body = body.shift(inc, cutoff);
                TermData::annotate(*checked, anno, body)
            }
        }
    }

    fn subst(&self, value: &Term, depth: usize) -> Term {
        match self.as_ref() {
            TermData::Bound { index, .. } => {
                if **index == depth { value.clone() }
                else if **index > depth { TermData::bound(*index - 1) }
                else { self.clone() }
            }
            TermData::Free { .. }
            | TermData::Star { .. } => self.clone(),
            TermData::Pi { mode, self_name, name, domain, body, .. } => {
                let domain = domain.subst(&value.shift(1, 0), depth + 1);
                let body = body.subst(&value.shift(2, 0), depth + 2);
                TermData::pi(*mode, *self_name, *name, domain, body)
            }
            TermData::Lambda { mode, name, body, .. } => {
                let body = body.subst(&value.shift(1, 0), depth + 1);
                TermData::lambda(*mode, *name, body)
            }
            TermData::Apply { mode, fun, arg, .. } => {
                let fun = fun.subst(value, depth);
                let arg = arg.subst(value, depth);
                TermData::apply(*mode, fun, arg)
            }
            TermData::Let { name, let_body, body, .. } => {
                let let_body = let_body.subst(value, depth);
                let body = body.subst(&value.shift(1, 0), depth + 1);
                TermData::let_bind(*name, let_body, body)
            }
            TermData::Annotate { checked, anno, body, .. } => {
                let anno = anno.subst(value, depth);
                let body = body.subst(value, depth);
                TermData::annotate(*checked, anno, body)
            }
        }
    }

    fn erase(&self) -> Term {
        match self.as_ref() {
            TermData::Bound { .. }
            | TermData::Free { .. }
            | TermData::Star { .. } => self.clone(),
            TermData::Pi { mode, self_name, name, domain, body, .. } => {
                TermData::pi(*mode, *self_name, *name, domain.erase(), body.erase())
            }
            TermData::Lambda { mode: Mode::Erased, body, .. } => {
                body.subst(&TermData::free(Symbol::from(ERASED)), 0).erase()
            }
            TermData::Lambda { mode, name, body, .. } => {
                TermData::lambda(*mode, *name, body.erase())
            }
            TermData::Apply { mode: Mode::Erased, fun, .. } => fun.erase(),
            TermData::Apply { mode, fun, arg, .. } => {
                TermData::apply(*mode, fun.erase(), arg.erase())
            }
            TermData::Let { name, let_body, body, .. } => {
                TermData::let_bind(*name, let_body.erase(), body.erase())
            }
            TermData::Annotate { body, .. } => body.erase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(index: usize) -> Term { TermData::bound(index.into()) }

    fn lam(body: Term) -> Term {
        TermData::lambda(Mode::Free, Symbol::from("x"), body)
    }

    #[test]
    fn shift_respects_cutoff() {
        // (x) => x 1  — the 1 escapes the lambda, the 0 does not.
        let term = lam(TermData::apply(Mode::Free, var(0), var(1)));
        let shifted = term.shift(2, 0);
        let expected = lam(TermData::apply(Mode::Free, var(0), var(3)));
        assert_eq!(shifted, expected);
    }

    #[test]
    fn shift_rebuilds_hashes() {
        let term = var(0);
        let shifted = term.shift(3, 0);
        assert_eq!(shifted.hash(), var(3).hash());
    }

    #[test]
    fn subst_shifts_under_binders() {
        // Substituting v for the outer variable inside a lambda must
        // bump v past the lambda's own binder.
        let body = lam(var(1));
        let result = body.subst(&var(4), 0);
        assert_eq!(result, lam(var(5)));
    }

    #[test]
    fn subst_decrements_above_depth() {
        let term = TermData::apply(Mode::Free, var(0), var(1));
        let result = term.subst(&TermData::star(), 0);
        assert_eq!(result, TermData::apply(Mode::Free, TermData::star(), var(0)));
    }

    #[test]
    fn subst_crosses_pi_with_two_binders() {
        // s(n : 0) -> 2 with the target at depth 0: the domain sees the
        // binder once (self), the body twice (self + argument).
        let pi = TermData::pi(
            Mode::Free,
            Symbol::from("s"),
            Symbol::from("n"),
            var(1),
            var(2),
        );
        let result = pi.subst(&TermData::star(), 0);
        let expected = TermData::pi(
            Mode::Free,
            Symbol::from("s"),
            Symbol::from("n"),
            TermData::star(),
            TermData::star(),
        );
        assert_eq!(result, expected);
    }

    #[test]
    fn subst_descends_into_let_body() {
        // let y = 0; 1  — replacing the outer variable rewrites both the
        // bound expression and the body, each at its own depth.
        let term = TermData::let_bind(Symbol::from("y"), var(0), var(1));
        let result = term.subst(&TermData::star(), 0);
        let expected = TermData::let_bind(Symbol::from("y"), TermData::star(), TermData::star());
        assert_eq!(result, expected);
    }

    #[test]
    fn erase_drops_erased_forms() {
        // <t> => (x) => t(x)  erases to  (x) => <erased>(x)
        let body = lam(TermData::apply(Mode::Free, var(1), var(0)));
        let term = TermData::lambda(Mode::Erased, Symbol::from("t"), body);
        let erased = term.erase();
        let sentinel = TermData::free(Symbol::from(ERASED));
        let expected = lam(TermData::apply(Mode::Free, sentinel, var(0)));
        assert_eq!(erased, expected);
    }

    #[test]
    fn erase_keeps_let_body() {
        let term = TermData::let_bind(
            Symbol::from("y"),
            TermData::annotate(false, TermData::star(), var(3)),
            var(0),
        );
        let erased = term.erase();
        assert_eq!(erased, TermData::let_bind(Symbol::from("y"), var(3), var(0)));
    }
}
