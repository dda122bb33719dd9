use smallvec::SmallVec;

use crate::{Item, Term};

/// One step down a binary term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize))]
pub enum Side {
    /// Into the left operand.
    Left,
    /// Into the right operand.
    Right,
}

/// A position in a term, as the steps taken from the root.
pub type Path = SmallVec<[Side; 8]>;

/// A cursor at one position of a term.
///
/// A [`Replacer`] never edits its term. [`apply`](Replacer::apply)
/// builds a new root instead, sharing every sub-term off the path.
#[derive(Clone)]
pub struct Replacer<T> {
    root: Term<T>,
    path: Path,
}

impl<T: Item> Replacer<T> {
    /// The term this cursor points into.
    pub fn root(&self) -> &Term<T> {
        &self.root
    }

    /// Where this cursor points, from the root.
    pub fn path(&self) -> &[Side] {
        &self.path
    }

    pub(crate) fn into_path(self) -> Path {
        self.path
    }

    /// The sub-term at this position.
    pub fn subterm(&self) -> &Term<T> {
        let mut at = &self.root;
        for side in &self.path {
            at = step(at, *side).unwrap_or_else(|| panic!("no sub-term at {:?}", self.path));
        }
        at
    }

    /// Replace the sub-term at this position by `f(sub-term)` and return
    /// the new root, or [`None`] if `f` returns [`None`].
    ///
    /// ```
    /// use conneq::*;
    ///
    /// let (_, _, c) = from_connector(|_: &u32, _: &u32| {});
    /// let t = c.leaf([1]) * (c.leaf([2]) + c.leaf([3]));
    ///
    /// let inner = replacers(&t).find(|r| r.subterm().is_add()).unwrap();
    /// assert_eq!(inner.path(), [Side::Right]);
    ///
    /// let swapped = inner.apply(|sub| Rule::Swap.apply(sub, &c)).unwrap();
    /// assert_eq!(swapped.to_string(), "C(1) * (C(3) + C(2))");
    /// assert_eq!(inner.apply(|_| None), None);
    /// ```
    pub fn apply(&self, f: impl FnOnce(&Term<T>) -> Option<Term<T>>) -> Option<Term<T>> {
        let mut spine: SmallVec<[&Term<T>; 8]> = SmallVec::new();
        let mut at = &self.root;
        for side in &self.path {
            spine.push(at);
            at = step(at, *side)?;
        }

        let mut out = f(at)?;
        for (parent, side) in spine.iter().rev().zip(self.path.iter().rev()) {
            let op = parent.op()?;
            out = match side {
                Side::Left => Term::combine(out, op, parent.right()?.clone()),
                Side::Right => Term::combine(parent.left()?.clone(), op, out),
            };
        }
        Some(out)
    }
}

fn step<T>(term: &Term<T>, side: Side) -> Option<&Term<T>> {
    match side {
        Side::Left => term.left(),
        Side::Right => term.right(),
    }
}

/// Iterator over every position of a term, see [`replacers`].
pub struct Replacers<T> {
    root: Term<T>,
    stack: Vec<(Term<T>, Path)>,
}

/// Every position of `term` in pre-order: the root, then the positions
/// in its left operand, then those in its right operand.
///
/// The iterator is lazy and works off an explicit stack, so deep terms
/// do not grow the call stack.
///
/// ```
/// use conneq::*;
///
/// let (_, _, c) = from_connector(|_: &u32, _: &u32| {});
/// let t = (c.leaf([1]) + c.leaf([2])) * c.leaf([3]);
/// let subs: Vec<String> = replacers(&t).map(|r| r.subterm().to_string()).collect();
/// assert_eq!(subs, ["(C(1) + C(2)) * C(3)", "C(1) + C(2)", "C(1)", "C(2)", "C(3)"]);
/// ```
pub fn replacers<T: Item>(term: &Term<T>) -> Replacers<T> {
    Replacers {
        root: term.clone(),
        stack: vec![(term.clone(), Path::new())],
    }
}

impl<T: Item> Iterator for Replacers<T> {
    type Item = Replacer<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let (at, path) = self.stack.pop()?;
        if let (Some(left), Some(right)) = (at.left(), at.right()) {
            let mut right_path = path.clone();
            right_path.push(Side::Right);
            self.stack.push((right.clone(), right_path));
            let mut left_path = path.clone();
            left_path.push(Side::Left);
            self.stack.push((left.clone(), left_path));
        }
        Some(Replacer {
            root: self.root.clone(),
            path,
        })
    }
}
