use std::collections::BTreeSet;
use std::fmt::{self, Debug, Display, Formatter};
use std::ops::{Add, Mul, Sub};
use std::rc::Rc;

use symbolic_expressions::Sexp;

use crate::{util::pretty_print, Connection, Connector, Endpoint, Error, Item, Result};

/// The operator of a binary [`Term`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize))]
pub enum Op {
    /// Union, written `+`.
    Add,
    /// Set difference, written `-`.
    Discard,
    /// Composition, written `*`.
    Arrow,
}

impl Op {
    /// The symbol used when printing.
    pub fn symbol(self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Discard => "-",
            Op::Arrow => "*",
        }
    }

    pub(crate) fn from_symbol(s: &str) -> Option<Op> {
        match s {
            "+" => Some(Op::Add),
            "-" => Some(Op::Discard),
            "*" => Some(Op::Arrow),
            _ => None,
        }
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// The shape of a [`Term`].
pub enum TermKind<T> {
    /// The identity `I`.
    Identity,
    /// The terminator `O`.
    Zero,
    /// A set of endpoints, printed `C(a, b)`.
    Leaf(BTreeSet<Endpoint<T>>),
    /// Two terms joined by an operator.
    Binary {
        /// Left operand.
        left: Term<T>,
        /// The operator.
        op: Op,
        /// Right operand.
        right: Term<T>,
    },
}

struct Node<T> {
    kind: TermKind<T>,
    connector: Connector<T>,
    sources: BTreeSet<Endpoint<T>>,
    sinks: BTreeSet<Endpoint<T>>,
    connections: BTreeSet<Connection<T>>,
    text: Rc<str>,
}

/** An immutable equation term.

A [`Term`] remembers how it was written (its [`TermKind`]) and what it
means: two boundary sets, the [`sources`](Term::sources) and the
[`sinks`](Term::sinks), plus the set of deferred
[`connections`](Term::connections). The meaning is computed once, when the
term is built, and never changes.

Terms are cheap to clone: sub-terms are shared, never copied.

# Equality

Two terms are equal when they share a connector and their sources,
sinks and connections are equal. How the terms are written does not
matter, so `C(1) + C(2) == C(1, 2)`.

Because of this, [`Term`] implements neither [`Hash`] nor [`Ord`]:
the printed text is the natural key for both, and two equal terms can
print differently. Use [`EquationGraph::get_cached`] to intern terms by
structure.

[`EquationGraph::get_cached`]: crate::EquationGraph::get_cached

# Costs

Every term stores its own printed text and its own boundary and
connection sets, so building a chain of `n` operators stores `O(n²)`
characters and endpoints in total. Printing to an s-expression,
[`pretty`](Term::pretty), and dropping the last handle to a term recurse
once per level of nesting. Terms are meant to be a few dozen operators
deep, not thousands.

# Example
```
use conneq::*;
use std::{cell::RefCell, rc::Rc};

let wired = Rc::new(RefCell::new(vec![]));
let log = wired.clone();
let (i, _o, c) = from_connector(move |a: &u32, b: &u32| log.borrow_mut().push((*a, *b)));

let t = c.leaf([1, 2]) * c.leaf([3, 4]);
assert_eq!(t.to_string(), "C(1, 2) * C(3, 4)");
assert_eq!(&t * &i, t);

// nothing is wired until the term is evaluated
assert!(wired.borrow().is_empty());
t.evaluate();
assert_eq!(*wired.borrow(), vec![(1, 3), (1, 4), (2, 3), (2, 4)]);
```
*/
pub struct Term<T> {
    node: Rc<Node<T>>,
}

impl<T> Clone for Term<T> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<T: Item> Term<T> {
    pub(crate) fn identity(connector: Connector<T>) -> Self {
        let boundary: BTreeSet<_> = [Endpoint::Identity].into_iter().collect();
        Self::from_parts(
            TermKind::Identity,
            connector,
            boundary.clone(),
            boundary,
            BTreeSet::new(),
        )
    }

    pub(crate) fn zero(connector: Connector<T>) -> Self {
        Self::from_parts(
            TermKind::Zero,
            connector,
            BTreeSet::new(),
            BTreeSet::new(),
            BTreeSet::new(),
        )
    }

    pub(crate) fn leaf(connector: Connector<T>, items: BTreeSet<Endpoint<T>>) -> Self {
        let boundary: BTreeSet<Endpoint<T>> = items
            .iter()
            .filter(|e| !matches!(e, Endpoint::Zero))
            .cloned()
            .collect();
        Self::from_parts(
            TermKind::Leaf(items),
            connector,
            boundary.clone(),
            boundary,
            BTreeSet::new(),
        )
    }

    /// Build `left op right`, checking that both sides share a connector.
    pub fn binary(left: &Term<T>, op: Op, right: &Term<T>) -> Result<Self> {
        if left.connector() != right.connector() {
            return Err(Error::ConnectorMismatch {
                left: left.text().to_owned(),
                right: right.text().to_owned(),
            });
        }
        Ok(Self::combine(left.clone(), op, right.clone()))
    }

    /// `self + other`, or an error if the connectors differ.
    pub fn try_add(&self, other: &Term<T>) -> Result<Self> {
        Self::binary(self, Op::Add, other)
    }

    /// `self - other`, or an error if the connectors differ.
    pub fn try_sub(&self, other: &Term<T>) -> Result<Self> {
        Self::binary(self, Op::Discard, other)
    }

    /// `self * other`, or an error if the connectors differ.
    pub fn try_mul(&self, other: &Term<T>) -> Result<Self> {
        Self::binary(self, Op::Arrow, other)
    }

    /// Combine two terms that are known to share a connector.
    pub(crate) fn combine(left: Term<T>, op: Op, right: Term<T>) -> Self {
        debug_assert!(left.connector() == right.connector());
        let (a, b) = (&*left.node, &*right.node);
        let connector = a.connector.clone();

        let (sinks, sources, connections) = match op {
            Op::Add => (
                a.sinks.union(&b.sinks).cloned().collect(),
                a.sources.union(&b.sources).cloned().collect(),
                a.connections.union(&b.connections).cloned().collect(),
            ),
            Op::Discard => (
                a.sinks.difference(&b.sinks).cloned().collect(),
                a.sources.difference(&b.sources).cloned().collect(),
                a.connections.difference(&b.connections).cloned().collect(),
            ),
            Op::Arrow => compose(a, b),
        };

        Self::from_parts(
            TermKind::Binary { left, op, right },
            connector,
            sources,
            sinks,
            connections,
        )
    }

    fn from_parts(
        kind: TermKind<T>,
        connector: Connector<T>,
        sources: BTreeSet<Endpoint<T>>,
        sinks: BTreeSet<Endpoint<T>>,
        connections: BTreeSet<Connection<T>>,
    ) -> Self {
        let text: Rc<str> = render(&kind).into();
        Self {
            node: Rc::new(Node {
                kind,
                connector,
                sources,
                sinks,
                connections,
                text,
            }),
        }
    }
}

/// `(sinks, sources, connections)` of `a * b`.
#[allow(clippy::type_complexity)]
fn compose<T: Item>(
    a: &Node<T>,
    b: &Node<T>,
) -> (
    BTreeSet<Endpoint<T>>,
    BTreeSet<Endpoint<T>>,
    BTreeSet<Connection<T>>,
) {
    match (&a.kind, &b.kind) {
        (TermKind::Identity, _) => (b.sinks.clone(), b.sources.clone(), b.connections.clone()),
        (TermKind::Zero, _) => (BTreeSet::new(), b.sources.clone(), b.connections.clone()),
        (_, TermKind::Identity) => (a.sinks.clone(), a.sources.clone(), a.connections.clone()),
        (_, TermKind::Zero) => (a.sinks.clone(), BTreeSet::new(), a.connections.clone()),
        _ => {
            let mut connections: BTreeSet<_> =
                a.connections.union(&b.connections).cloned().collect();
            for source in a.sources.iter().filter_map(Endpoint::item) {
                for sink in b.sinks.iter().filter_map(Endpoint::item) {
                    connections.insert(Connection::new(
                        a.connector.clone(),
                        source.clone(),
                        sink.clone(),
                    ));
                }
            }
            let sinks = substitute(&a.sinks, &b.sinks);
            let sources = substitute(&b.sources, &a.sources);
            (sinks, sources, connections)
        }
    }
}

/// Copy `side`, replacing `I` by `through` and dropping `O`.
fn substitute<T: Item>(
    side: &BTreeSet<Endpoint<T>>,
    through: &BTreeSet<Endpoint<T>>,
) -> BTreeSet<Endpoint<T>> {
    let mut out = BTreeSet::new();
    for endpoint in side {
        match endpoint {
            Endpoint::Identity => out.extend(through.iter().cloned()),
            Endpoint::Zero => {}
            Endpoint::Item(_) => {
                out.insert(endpoint.clone());
            }
        }
    }
    out
}

fn render<T: Item>(kind: &TermKind<T>) -> String {
    match kind {
        TermKind::Identity => "I".into(),
        TermKind::Zero => "O".into(),
        TermKind::Leaf(items) => {
            let items: Vec<String> = items.iter().map(|i| i.to_string()).collect();
            format!("C({})", items.join(", "))
        }
        TermKind::Binary { left, op, right } => {
            let wrap = |t: &Term<T>| {
                if t.needs_parens() {
                    format!("({})", t.text())
                } else {
                    t.text().to_owned()
                }
            };
            format!("{} {} {}", wrap(left), op, wrap(right))
        }
    }
}

impl<T> Term<T> {
    /// How this term was written.
    pub fn kind(&self) -> &TermKind<T> {
        &self.node.kind
    }

    /// The connector every connection of this term will call.
    pub fn connector(&self) -> &Connector<T> {
        &self.node.connector
    }

    /// Endpoints left open on the right, consumed by a following `*`.
    pub fn sources(&self) -> &BTreeSet<Endpoint<T>> {
        &self.node.sources
    }

    /// Endpoints left open on the left, fed by a preceding `*`.
    pub fn sinks(&self) -> &BTreeSet<Endpoint<T>> {
        &self.node.sinks
    }

    /// The deferred connections, in evaluation order.
    pub fn connections(&self) -> &BTreeSet<Connection<T>> {
        &self.node.connections
    }

    /// The printed form, see [`Display`].
    pub fn text(&self) -> &str {
        &self.node.text
    }

    pub(crate) fn shared_text(&self) -> Rc<str> {
        Rc::clone(&self.node.text)
    }

    /// Returns true for `I`.
    pub fn is_identity(&self) -> bool {
        matches!(self.node.kind, TermKind::Identity)
    }

    /// Returns true for `O`.
    pub fn is_zero(&self) -> bool {
        matches!(self.node.kind, TermKind::Zero)
    }

    /// Returns true for `I`, `O` and leaf-sets.
    pub fn is_terminal(&self) -> bool {
        !matches!(self.node.kind, TermKind::Binary { .. })
    }

    /// Returns true for `a + b`.
    pub fn is_add(&self) -> bool {
        self.op() == Some(Op::Add)
    }

    /// Returns true for `a - b`.
    pub fn is_discard(&self) -> bool {
        self.op() == Some(Op::Discard)
    }

    /// Returns true for `a * b`.
    pub fn is_arrow(&self) -> bool {
        self.op() == Some(Op::Arrow)
    }

    /// The operator of a binary term.
    pub fn op(&self) -> Option<Op> {
        match &self.node.kind {
            TermKind::Binary { op, .. } => Some(*op),
            _ => None,
        }
    }

    /// The left operand of a binary term.
    pub fn left(&self) -> Option<&Term<T>> {
        match &self.node.kind {
            TermKind::Binary { left, .. } => Some(left),
            _ => None,
        }
    }

    /// The right operand of a binary term.
    pub fn right(&self) -> Option<&Term<T>> {
        match &self.node.kind {
            TermKind::Binary { right, .. } => Some(right),
            _ => None,
        }
    }

    /// The items of a leaf-set.
    pub fn items(&self) -> Option<&BTreeSet<Endpoint<T>>> {
        match &self.node.kind {
            TermKind::Leaf(items) => Some(items),
            _ => None,
        }
    }

    /// Make every deferred connection, in ascending
    /// `(connector, source, sink)` order.
    ///
    /// A panicking connector is not caught.
    pub fn evaluate(&self) {
        for connection in &self.node.connections {
            connection.evaluate();
        }
    }

    /// Same object, not just equal.
    pub(crate) fn ptr_eq(&self, other: &Term<T>) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// Address of the shared node, stable for the lifetime of the term.
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.node) as usize
    }

    /// Written exactly alike: same tree, same operators, same leaf
    /// items.
    pub(crate) fn same_shape(&self, other: &Term<T>) -> bool
    where
        T: Item,
    {
        let mut todo = vec![(self, other)];
        while let Some((a, b)) = todo.pop() {
            if a.ptr_eq(b) {
                continue;
            }
            match (a.kind(), b.kind()) {
                (TermKind::Identity, TermKind::Identity) | (TermKind::Zero, TermKind::Zero) => {}
                (TermKind::Leaf(x), TermKind::Leaf(y)) if x == y => {}
                (
                    TermKind::Binary { left, op, right },
                    TermKind::Binary {
                        left: l,
                        op: o,
                        right: r,
                    },
                ) if op == o => {
                    todo.push((right, r));
                    todo.push((left, l));
                }
                _ => return false,
            }
        }
        true
    }

    pub(crate) fn needs_parens(&self) -> bool {
        matches!(self.op(), Some(Op::Add | Op::Discard))
    }
}

impl<T: Item> Term<T> {
    /// The exact tree as an s-expression, e.g. `(* (+ (C 1) (C 2)) (C 3))`.
    ///
    /// Unlike the infix form this keeps the grouping of `*` chains.
    pub fn to_sexp(&self) -> Sexp {
        match &self.node.kind {
            TermKind::Identity => Sexp::String("I".into()),
            TermKind::Zero => Sexp::String("O".into()),
            TermKind::Leaf(items) => {
                let mut list = vec![Sexp::String("C".into())];
                list.extend(items.iter().map(|i| Sexp::String(i.to_string())));
                Sexp::List(list)
            }
            TermKind::Binary { left, op, right } => Sexp::List(vec![
                Sexp::String(op.symbol().into()),
                left.to_sexp(),
                right.to_sexp(),
            ]),
        }
    }

    /// Pretty print the s-expression form with a maximum line length.
    pub fn pretty(&self, width: usize) -> String {
        let mut buf = String::new();
        pretty_print(&mut buf, &self.to_sexp(), width, 1).unwrap();
        buf
    }
}

impl<T: Item> PartialEq for Term<T> {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (&*self.node, &*other.node);
        Rc::ptr_eq(&self.node, &other.node)
            || (a.connector == b.connector
                && a.sinks == b.sinks
                && a.sources == b.sources
                && a.connections == b.connections)
    }
}

impl<T: Item> Eq for Term<T> {}

impl<T> Display for Term<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl<T> Debug for Term<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

macro_rules! impl_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<T: Item> $trait<&Term<T>> for &Term<T> {
            type Output = Term<T>;
            fn $method(self, rhs: &Term<T>) -> Term<T> {
                Term::binary(self, $op, rhs).unwrap_or_else(|e| panic!("{}", e))
            }
        }

        impl<T: Item> $trait<Term<T>> for Term<T> {
            type Output = Term<T>;
            fn $method(self, rhs: Term<T>) -> Term<T> {
                (&self).$method(&rhs)
            }
        }

        impl<T: Item> $trait<&Term<T>> for Term<T> {
            type Output = Term<T>;
            fn $method(self, rhs: &Term<T>) -> Term<T> {
                (&self).$method(rhs)
            }
        }

        impl<T: Item> $trait<Term<T>> for &Term<T> {
            type Output = Term<T>;
            fn $method(self, rhs: Term<T>) -> Term<T> {
                self.$method(&rhs)
            }
        }
    };
}

impl_op!(Add, add, Op::Add);
impl_op!(Sub, sub, Op::Discard);
impl_op!(Mul, mul, Op::Arrow);
