use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

use log::*;

use crate::{analysis, Algebra, Item, Op, Term, TermKind};

/// A meaning-preserving local rewrite.
///
/// Each [`Rule`] reshapes a term without changing its sources, sinks or
/// connections, so the result is always `==` to the input. Placed back
/// inside a larger term it usually keeps that term's meaning too;
/// [`EquationGraph::neighbor_nodes`](crate::EquationGraph::neighbor_nodes)
/// checks the whole term and drops the rewrites that do not.
/// The set of rules is fixed; [`Rule::ALL`] lists them in the order the
/// [`EquationGraph`](crate::EquationGraph) tries them.
///
/// A rule that does not match, or whose result would be written exactly
/// like its input, is not applicable and [`apply`](Rule::apply) returns
/// [`None`].
///
/// # Example
/// ```
/// use conneq::*;
///
/// let (_, _, c) = from_connector(|_: &u32, _: &u32| {});
/// let t = c.leaf([1]) * c.leaf([3]) + c.leaf([2]) * c.leaf([3]);
///
/// let out = Rule::SourceOut.apply(&t, &c).unwrap();
/// assert_eq!(out.to_string(), "(C(1) * I + C(2) * I) * C(3)");
/// assert_eq!(out, t);
///
/// assert_eq!(Rule::SinkOut.apply(&t, &c), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize))]
pub enum Rule {
    /// `A * I → A` and `I * A → A`, through nested products.
    IdentityOff,
    /// `C(a, b, c) → C(a) + C(b) + C(c)`
    RemoveAdder,
    /// `C(a) + C(b) → C(a, b)`
    AddAdder,
    /// `A + B → B + A`
    Swap,
    /// `(A ∘ B) ∘ C → A ∘ (B ∘ C)` for `+` and `*`.
    SwapHead,
    /// `A ∘ (B ∘ C) → (A ∘ B) ∘ C` for `+` and `*`.
    SwapTail,
    /// `H * X + H * Y → H * (I * X + I * Y)`
    SinkOut,
    /// `X * T + Y * T → (X * I + Y * I) * T`
    SourceOut,
}

impl Rule {
    /// Every rule, in application order.
    pub const ALL: [Rule; 8] = [
        Rule::IdentityOff,
        Rule::RemoveAdder,
        Rule::AddAdder,
        Rule::Swap,
        Rule::SwapHead,
        Rule::SwapTail,
        Rule::SinkOut,
        Rule::SourceOut,
    ];

    /// Returns the name of the rule.
    pub fn name(self) -> &'static str {
        match self {
            Rule::IdentityOff => "identity_off",
            Rule::RemoveAdder => "remove_adder",
            Rule::AddAdder => "add_adder",
            Rule::Swap => "swap",
            Rule::SwapHead => "swap_head",
            Rule::SwapTail => "swap_tail",
            Rule::SinkOut => "sink_out",
            Rule::SourceOut => "source_out",
        }
    }

    /// Apply this rule at the root of `term`.
    ///
    /// `algebra` supplies the `I` and `O` the rules compare against and
    /// introduce; it must be the algebra `term` was built with.
    pub fn apply<T: Item>(self, term: &Term<T>, algebra: &Algebra<T>) -> Option<Term<T>> {
        let out = match self {
            Rule::IdentityOff => identity_off(term, &algebra.identity()),
            Rule::RemoveAdder => remove_adder(term, algebra),
            Rule::AddAdder => add_adder(term, algebra),
            Rule::Swap => swap(term),
            Rule::SwapHead => swap_head(term),
            Rule::SwapTail => swap_tail(term),
            Rule::SinkOut => sink_out(term, algebra),
            Rule::SourceOut => source_out(term, algebra),
        }?;

        if out.same_shape(term) {
            return None;
        }
        if out != *term {
            warn!("{} changed the meaning of {}, dropping {}", self, term, out);
            return None;
        }
        trace!("{}: {} => {}", self, term, out);
        Some(out)
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn arrow<T: Item>(left: Term<T>, right: Term<T>) -> Term<T> {
    Term::combine(left, Op::Arrow, right)
}

fn add<T: Item>(left: Term<T>, right: Term<T>) -> Term<T> {
    Term::combine(left, Op::Add, right)
}

fn identity_off<T: Item>(term: &Term<T>, i: &Term<T>) -> Option<Term<T>> {
    let out = strip_identity(term, i);
    if out.ptr_eq(term) {
        None
    } else {
        Some(out)
    }
}

// Returns `term` itself when nothing was stripped. A product is never
// collapsed into `O`: inside another product, `O` keeps the loose `I`
// ends a product that merely equals `O` would drop.
fn strip_identity<T: Item>(term: &Term<T>, i: &Term<T>) -> Term<T> {
    match term.kind() {
        TermKind::Binary {
            left,
            op: Op::Arrow,
            right,
        } => {
            let rest = if left == i {
                Some(right)
            } else if right == i {
                Some(left)
            } else {
                None
            };
            if let Some(rest) = rest {
                let out = strip_identity(rest, i);
                return if out.is_zero() { term.clone() } else { out };
            }
            let (l, r) = (strip_identity(left, i), strip_identity(right, i));
            if l.ptr_eq(left) && r.ptr_eq(right) {
                term.clone()
            } else {
                arrow(l, r)
            }
        }
        _ => term.clone(),
    }
}

fn remove_adder<T: Item>(term: &Term<T>, algebra: &Algebra<T>) -> Option<Term<T>> {
    let items = term.items()?;
    if items.len() < 2 {
        return None;
    }
    let mut singles = items.iter().map(|item| algebra.leaf([item.clone()]));
    let first = singles.next()?;
    Some(singles.fold(first, add))
}

fn add_adder<T: Item>(term: &Term<T>, algebra: &Algebra<T>) -> Option<Term<T>> {
    if !term.is_add() {
        return None;
    }
    let left = term.left()?.items()?;
    let right = term.right()?.items()?;
    let merged: BTreeSet<_> = left.union(right).cloned().collect();
    Some(algebra.leaf(merged))
}

fn swap<T: Item>(term: &Term<T>) -> Option<Term<T>> {
    match term.kind() {
        TermKind::Binary {
            left,
            op: Op::Add,
            right,
        } => Some(add(right.clone(), left.clone())),
        _ => None,
    }
}

fn associative<T: Item>(term: &Term<T>) -> Option<(Op, &Term<T>, &Term<T>)> {
    match term.kind() {
        TermKind::Binary { left, op, right } if *op != Op::Discard => Some((*op, left, right)),
        _ => None,
    }
}

fn swap_head<T: Item>(term: &Term<T>) -> Option<Term<T>> {
    let (op, ab, c) = associative(term)?;
    if ab.op() != Some(op) {
        return None;
    }
    let (a, b) = (ab.left()?, ab.right()?);
    let bc = Term::combine(b.clone(), op, c.clone());
    Some(Term::combine(a.clone(), op, bc))
}

fn swap_tail<T: Item>(term: &Term<T>) -> Option<Term<T>> {
    let (op, a, bc) = associative(term)?;
    if bc.op() != Some(op) {
        return None;
    }
    let (b, c) = (bc.left()?, bc.right()?);
    let ab = Term::combine(a.clone(), op, b.clone());
    Some(Term::combine(ab, op, c.clone()))
}

fn summands<T: Item>(term: &Term<T>) -> Option<(&Term<T>, &Term<T>)> {
    match term.kind() {
        TermKind::Binary {
            left,
            op: Op::Add,
            right,
        } => Some((left, right)),
        _ => None,
    }
}

/// Shared heads and tails must not be `I` or `O`: composing with those
/// skips the substitution the factored form relies on.
fn is_constant<T: Item>(term: &Term<T>, algebra: &Algebra<T>) -> bool {
    *term == algebra.identity() || *term == algebra.zero()
}

fn sink_out<T: Item>(term: &Term<T>, algebra: &Algebra<T>) -> Option<Term<T>> {
    let (x, y) = summands(term)?;
    let (hx, hy) = (analysis::head(x)?, analysis::head(y)?);
    if hx != hy || is_constant(hx, algebra) {
        return None;
    }

    let i = algebra.identity();
    let rest = |t: &Term<T>| match t.kind() {
        TermKind::Binary {
            op: Op::Arrow,
            right,
            ..
        } if *right == i => None,
        TermKind::Binary {
            op: Op::Arrow,
            right,
            ..
        } => Some(arrow(i.clone(), right.clone())),
        _ => Some(i.clone()),
    };

    Some(arrow(hx.clone(), add(rest(x)?, rest(y)?)))
}

fn source_out<T: Item>(term: &Term<T>, algebra: &Algebra<T>) -> Option<Term<T>> {
    let (x, y) = summands(term)?;
    let (tx, ty) = (analysis::tail(x)?, analysis::tail(y)?);
    if tx != ty || is_constant(tx, algebra) {
        return None;
    }

    let i = algebra.identity();
    let front = |t: &Term<T>| match t.kind() {
        TermKind::Binary {
            left,
            op: Op::Arrow,
            ..
        } if *left == i => None,
        TermKind::Binary {
            left,
            op: Op::Arrow,
            ..
        } => Some(arrow(left.clone(), i.clone())),
        _ => Some(i.clone()),
    };

    Some(arrow(add(front(x)?, front(y)?), tx.clone()))
}
