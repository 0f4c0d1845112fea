
use std::rc::Rc;

use im_rc::Vector;

use crate::common::*;
use crate::kernel::term::{Term, TermData};

pub type Value = Rc<ValueData>;

pub type Env = Vector<Value>;

/// Higher-order image of a term: binder bodies become closures over the
/// environment they were built in, variables become direct references to
/// their binder's parameter. `eval` performs no reduction — it is a
/// structural conversion, and `quote` is its inverse.
#[derive(Debug, Clone)]
pub enum ValueData {
    /// A binder parameter introduced while quoting, counted from the
    /// outside in.
    Variable {
        level: Level
    },
    /// A variable free at the evaluation root; its index counts binders
    /// beyond the root and is re-based by the quote depth.
    Bound {
        index: Index
    },
    Reference {
        name: Symbol
    },
    Star,
    Pi {
        mode: Mode,
        self_name: Symbol,
        name: Symbol,
        domain: Closure,
        body: Closure
    },
    Lambda {
        mode: Mode,
        name: Symbol,
        body: Closure
    },
    Apply {
        mode: Mode,
        fun: Value,
        arg: Value
    },
    Let {
        name: Symbol,
        let_body: Value,
        body: Closure
    },
    Annotate {
        checked: bool,
        anno: Value,
        body: Value
    },
}

impl ValueData {
    pub fn var(level: Level) -> Value {
        Rc::new(ValueData::Variable { level })
    }

    pub fn reference(name: Symbol) -> Value {
        Rc::new(ValueData::Reference { name })
    }
}

/// A suspended binder body: the term together with the environment of
/// everything bound outside it. Applying supplies the binder's own
/// parameters (one for Lambda and Let, self + argument for a Pi body).
#[derive(Debug, Clone)]
pub struct Closure {
    env: Env,
    term: Term
}

impl Closure {
    pub fn new(env: Env, term: Term) -> Closure {
        Closure { env, term }
    }

    pub fn apply(&self, args: &[Value]) -> Value {
        let mut env = self.env.clone();
        for arg in args {
            env.push_back(arg.clone());
        }
        eval(&env, &self.term)
    }
}

/// Convert a term into its higher-order image under `env` (innermost
/// binding last). Variables beyond the environment survive as `Bound`
/// residues.
pub fn eval(env: &Env, term: &Term) -> Value {
    match term.as_ref() {
        TermData::Bound { index, .. } => {
            if **index < env.len() {
                let level = index.to_level(env.len());
                env.get(*level).cloned().expect("environment lookup within length")
            } else {
                Rc::new(ValueData::Bound { index: *index - env.len() })
            }
        }
        TermData::Free { name, .. } => ValueData::reference(*name),
        TermData::Star { .. } => Rc::new(ValueData::Star),
        TermData::Pi { mode, self_name, name, domain, body, .. } => {
            let domain = Closure::new(env.clone(), domain.clone());
            let body = Closure::new(env.clone(), body.clone());
            Rc::new(ValueData::Pi { mode: *mode, self_name: *self_name, name: *name, domain, body })
        }
        TermData::Lambda { mode, name, body, .. } => {
            let body = Closure::new(env.clone(), body.clone());
            Rc::new(ValueData::Lambda { mode: *mode, name: *name, body })
        }
        TermData::Apply { mode, fun, arg, .. } => {
            let fun = eval(env, fun);
            let arg = eval(env, arg);
            Rc::new(ValueData::Apply { mode: *mode, fun, arg })
        }
        TermData::Let { name, let_body, body, .. } => {
            let let_body = eval(env, let_body);
            let body = Closure::new(env.clone(), body.clone());
            Rc::new(ValueData::Let { name: *name, let_body, body })
        }
        TermData::Annotate { checked, anno, body, .. } => {
            let anno = eval(env, anno);
            let body = eval(env, body);
            Rc::new(ValueData::Annotate { checked: *checked, anno, body })
        }
    }
}

/// Read a value back into an indexed term, issuing a fresh parameter at
/// the current depth for each binder and rebuilding hashes on the way
/// out.
pub fn quote(value: &Value, depth: Level) -> Term {
    match value.as_ref() {
        ValueData::Variable { level } => TermData::bound(level.to_index(*depth)),
        ValueData::Bound { index } => TermData::bound(*index + *depth),
        ValueData::Reference { name } => TermData::free(*name),
        ValueData::Star => TermData::star(),
        ValueData::Pi { mode, self_name, name, domain, body } => {
            let domain = domain.apply(&[ValueData::var(depth)]);
            let domain = quote(&domain, depth + 1);
            let body = body.apply(&[ValueData::var(depth), ValueData::var(depth + 1)]);
            let body = quote(&body, depth + 2);
            TermData::pi(*mode, *self_name, *name, domain, body)
        }
        ValueData::Lambda { mode, name, body } => {
            let body = body.apply(&[ValueData::var(depth)]);
            let body = quote(&body, depth + 1);
            TermData::lambda(*mode, *name, body)
        }
        ValueData::Apply { mode, fun, arg } => {
            let fun = quote(fun, depth);
            let arg = quote(arg, depth);
            TermData::apply(*mode, fun, arg)
        }
        ValueData::Let { name, let_body, body } => {
            let let_body = quote(let_body, depth);
            let body = body.apply(&[ValueData::var(depth)]);
            let body = quote(&body, depth + 1);
            TermData::let_bind(*name, let_body, body)
        }
        ValueData::Annotate { checked, anno, body } => {
            let anno = quote(anno, depth);
            let body = quote(body, depth);
            TermData::annotate(*checked, anno, body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(index: usize) -> Term { TermData::bound(index.into()) }

    fn roundtrip(term: &Term) -> Term {
        quote(&eval(&Env::new(), term), 0.into())
    }

    #[test]
    fn quote_inverts_eval_on_closed_terms() {
        let id = TermData::lambda(Mode::Free, Symbol::from("x"), var(0));
        assert_eq!(roundtrip(&id), id);

        let church_two = TermData::lambda(
            Mode::Free,
            Symbol::from("f"),
            TermData::lambda(
                Mode::Free,
                Symbol::from("x"),
                TermData::apply(
                    Mode::Free,
                    var(1),
                    TermData::apply(Mode::Free, var(1), var(0)),
                ),
            ),
        );
        assert_eq!(roundtrip(&church_two), church_two);
    }

    #[test]
    fn quote_inverts_eval_on_open_terms() {
        // (x) => 3  — the free variable keeps pointing three binders
        // beyond the lambda.
        let open = TermData::lambda(Mode::Free, Symbol::from("x"), var(3));
        assert_eq!(roundtrip(&open), open);
        assert_eq!(roundtrip(&var(7)), var(7));
    }

    #[test]
    fn quote_inverts_eval_on_pi_scopes() {
        // s(n : s) -> n with the self binder referenced in the domain.
        let pi = TermData::pi(
            Mode::Free,
            Symbol::from("s"),
            Symbol::from("n"),
            var(0),
            var(0),
        );
        assert_eq!(roundtrip(&pi), pi);
    }

    #[test]
    fn roundtrip_preserves_hashes() {
        let term = TermData::let_bind(
            Symbol::from("y"),
            TermData::star(),
            TermData::annotate(true, var(2), var(0)),
        );
        assert_eq!(roundtrip(&term).hash(), term.hash());
    }
}
