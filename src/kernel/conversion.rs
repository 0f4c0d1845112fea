
use colored::Colorize;

use crate::kernel::reduction::reduce;
use crate::kernel::subst::TermExt;
use crate::kernel::term::{Module, Term, TermData};
use crate::kernel::unionfind::UnionFind;

/// Fresh reference marker standing in for a bound variable while two
/// binder bodies are compared; the depth makes markers from different
/// binders distinct, and `%` is not a name character so markers cannot
/// collide with source references.
fn marker(depth: usize) -> Term {
    TermData::free(format!("%{}", depth).as_str().into())
}

/// Decide βα-equivalence of two terms under a module.
///
/// The worklist carries pairs still to be proved equal together with the
/// binder depth reached. Each step reduces both sides to weak head form,
/// tests congruence modulo the accumulated equivalence relation, records
/// the reductions and the (coinductively assumed) verdict, and on
/// congruence failure expands one constructor layer into child pairs.
pub fn equal(module: &Module, a: &Term, b: &Term) -> bool {
    let mut eq = UnionFind::new();
    let mut work: Vec<(Term, Term, usize)> = vec![(a.clone(), b.clone(), 0)];

    while let Some((x, y, depth)) = work.pop() {
        let xw = reduce(module, &x);
        let yw = reduce(module, &y);
        let verdict = congruent(&mut eq, &xw, &yw);
        // Memoize both reductions and the head verdict, so recurring
        // subterms and the bodies of recursive references short-circuit.
        eq.equate(x.hash(), xw.hash());
        eq.equate(y.hash(), yw.hash());
        eq.equate(xw.hash(), yw.hash());
        if verdict { continue }

        log::trace!("{} {} {} {}", "compare".bright_blue(), xw, "=?".bright_blue(), yw);
        match (xw.as_ref(), yw.as_ref()) {
            (TermData::Pi { domain: d1, body: b1, .. },
                TermData::Pi { domain: d2, body: b2, .. }) =>
            {
                let self_marker = marker(depth);
                let arg_marker = marker(depth + 1);
                let d1 = d1.subst(&self_marker, 0);
                let d2 = d2.subst(&self_marker, 0);
                let b1 = b1.subst(&self_marker, 1).subst(&arg_marker, 0);
                let b2 = b2.subst(&self_marker, 1).subst(&arg_marker, 0);
                work.push((d1, d2, depth + 1));
                work.push((b1, b2, depth + 2));
            }
            (TermData::Lambda { body: b1, .. },
                TermData::Lambda { body: b2, .. }) =>
            {
                let arg_marker = marker(depth);
                let b1 = b1.subst(&arg_marker, 0);
                let b2 = b2.subst(&arg_marker, 0);
                work.push((b1, b2, depth + 1));
            }
            (TermData::Apply { fun: f1, arg: a1, .. },
                TermData::Apply { fun: f2, arg: a2, .. }) =>
            {
                work.push((f1.clone(), f2.clone(), depth));
                work.push((a1.clone(), a2.clone(), depth));
            }
            (TermData::Let { let_body: x1, body: b1, .. },
                TermData::Let { let_body: x2, body: b2, .. }) =>
            {
                let arg_marker = marker(depth);
                work.push((x1.clone(), x2.clone(), depth));
                work.push((b1.subst(&arg_marker, 0), b2.subst(&arg_marker, 0), depth + 1));
            }
            (TermData::Annotate { body: b1, .. },
                TermData::Annotate { body: b2, .. }) =>
            {
                work.push((b1.clone(), b2.clone(), depth));
            }
            _ => return false
        }
    }
    true
}

/// Structural equality on the outermost layers, short-circuited by the
/// equivalence relation. Names, relevance markers, and annotation flags
/// are ignored; annotations compare by their inner term only.
fn congruent(eq: &mut UnionFind, a: &Term, b: &Term) -> bool {
    if eq.is_equivalent(a.hash(), b.hash()) { return true }
    match (a.as_ref(), b.as_ref()) {
        (TermData::Bound { index: i1, .. }, TermData::Bound { index: i2, .. }) => i1 == i2,
        (TermData::Free { name: n1, .. }, TermData::Free { name: n2, .. }) => n1 == n2,
        (TermData::Star { .. }, TermData::Star { .. }) => true,
        (TermData::Pi { domain: d1, body: b1, .. },
            TermData::Pi { domain: d2, body: b2, .. }) =>
        {
            congruent(eq, d1, d2) && congruent(eq, b1, b2)
        }
        (TermData::Lambda { body: b1, .. }, TermData::Lambda { body: b2, .. }) => {
            congruent(eq, b1, b2)
        }
        (TermData::Apply { fun: f1, arg: a1, .. },
            TermData::Apply { fun: f2, arg: a2, .. }) =>
        {
            congruent(eq, f1, f2) && congruent(eq, a1, a2)
        }
        (TermData::Let { let_body: x1, body: b1, .. },
            TermData::Let { let_body: x2, body: b2, .. }) =>
        {
            congruent(eq, x1, x2) && congruent(eq, b1, b2)
        }
        (TermData::Annotate { body: b1, .. }, TermData::Annotate { body: b2, .. }) => {
            congruent(eq, b1, b2)
        }
        _ => false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::*;
    use crate::kernel::term::Decl;

    fn var(index: usize) -> Term { TermData::bound(index.into()) }

    fn lam(name: &str, body: Term) -> Term {
        TermData::lambda(Mode::Free, Symbol::from(name), body)
    }

    fn app(fun: Term, arg: Term) -> Term {
        TermData::apply(Mode::Free, fun, arg)
    }

    #[test]
    fn alpha_renaming_is_invisible() {
        let module = Module::new();
        let a = lam("x", lam("y", app(var(1), var(0))));
        let b = lam("f", lam("a", app(var(1), var(0))));
        assert!(equal(&module, &a, &b));
    }

    #[test]
    fn beta_redex_equals_its_contractum() {
        let module = Module::new();
        let redex = app(lam("x", app(var(0), var(0))), lam("y", var(0)));
        let contractum = app(lam("y", var(0)), lam("y", var(0)));
        assert!(equal(&module, &redex, &contractum));
    }

    #[test]
    fn let_equals_its_unfolding() {
        let module = Module::new();
        let expr = lam("y", var(0));
        let body = app(var(0), TermData::star());
        let let_term = TermData::let_bind(Symbol::from("x"), expr.clone(), body.clone());
        let unfolded = body.subst(&expr, 0);
        assert!(equal(&module, &let_term, &unfolded));
    }

    #[test]
    fn annotation_is_transparent() {
        let module = Module::new();
        let term = lam("x", var(0));
        let annotated = TermData::annotate(false, TermData::star(), term.clone());
        assert!(equal(&module, &annotated, &term));
    }

    #[test]
    fn distinct_heads_differ() {
        let module = Module::new();
        assert!(!equal(&module, &TermData::star(), &lam("x", var(0))));
        assert!(!equal(&module, &var(0), &var(1)));
        assert!(!equal(
            &module,
            &TermData::free(Symbol::from("a")),
            &TermData::free(Symbol::from("b"))
        ));
    }

    #[test]
    fn bodies_are_compared_under_markers() {
        let module = Module::new();
        // (x) => x  vs  (x) => Type
        let a = lam("x", var(0));
        let b = lam("x", TermData::star());
        assert!(!equal(&module, &a, &b));
    }

    #[test]
    fn pi_compares_domain_and_body() {
        let module = Module::new();
        let a = TermData::pi(Mode::Free, Symbol::from("s"), Symbol::from("n"),
            TermData::star(), var(0));
        let b = TermData::pi(Mode::Erased, Symbol::default(), Symbol::default(),
            TermData::star(), var(0));
        // Same structure, different names and modes: equal.
        assert!(equal(&module, &a, &b));
        let c = TermData::pi(Mode::Free, Symbol::from("s"), Symbol::from("n"),
            TermData::star(), var(1));
        assert!(!equal(&module, &a, &c));
    }

    #[test]
    fn references_unfold_when_needed() {
        let mut module = Module::new();
        let two = lam("f", lam("x", app(var(1), app(var(1), var(0)))));
        module.insert(Decl::new(Symbol::from("two"), TermData::star(), two.clone()));
        let reference = TermData::free(Symbol::from("two"));
        assert!(equal(&module, &reference, &two));

        // two(f)(x) against the literal expansion f(f(x)) under binders.
        let expanded = lam("f", lam("x",
            app(app(reference, var(1)), var(0))));
        let literal = lam("f", lam("x", app(var(1), app(var(1), var(0)))));
        assert!(equal(&module, &expanded, &literal));
    }

    #[test]
    fn memoized_subterms_short_circuit() {
        let module = Module::new();
        // A pair of identical large-ish bodies duplicated across an
        // application: the second comparison hits the memo table.
        let big = lam("f", lam("x", app(var(1), app(var(1), app(var(1), var(0))))));
        let a = app(big.clone(), big.clone());
        let b = app(big.clone(), big);
        assert!(equal(&module, &a, &b));
    }
}
