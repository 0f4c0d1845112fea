
use std::ops;

use derive_more::{From, AsRef, Deref, Display};
use internment::Intern;

/// An interned identifier. Cheap to copy and compare; the empty symbol
/// stands for an absent name hint.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Display)]
pub struct Symbol(Intern<String>);

impl From<&str> for Symbol {
    fn from(s: &str) -> Self { Symbol(Intern::from_ref(s)) }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &'static str { self.0.as_ref() }
}

impl ops::Deref for Symbol {
    type Target = String;
    fn deref(&self) -> &Self::Target { self.0.deref() }
}

impl Default for Symbol {
    fn default() -> Self { Self::from("") }
}

/// Relevance of a binder or application: erased arguments exist at the
/// type level only and are dropped by reduction.
#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
pub enum Mode {
    Erased,
    Free
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, From, AsRef, Deref, Display)]
pub struct Index(usize);

impl ops::Add<usize> for Index {
    type Output = Self;

    fn add(self, rhs: usize) -> Self::Output {
        (*self + rhs).into()
    }
}

impl ops::Sub<usize> for Index {
    type Output = Self;

    fn sub(self, rhs: usize) -> Self::Output {
        (*self - rhs).into()
    }
}

impl Index {
    pub fn to_level(self, env: usize) -> Level {
        (env - *self - 1).into()
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, From, AsRef, Deref, Display)]
pub struct Level(usize);

impl ops::Add<usize> for Level {
    type Output = Self;

    fn add(self, rhs: usize) -> Self::Output {
        (*self + rhs).into()
    }
}

impl Level {
    pub fn to_index(self, env: usize) -> Index {
        (env - *self - 1).into()
    }
}
