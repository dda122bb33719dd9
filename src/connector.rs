use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Anything that can be wired by a [`Connector`].
///
/// Items are opaque to the algebra: they are only cloned, compared,
/// hashed and printed. Every type with those capabilities is an
/// [`Item`].
pub trait Item: Clone + Ord + Hash + Debug + Display + 'static {}

impl<T> Item for T where T: Clone + Ord + Hash + Debug + Display + 'static {}

/// An element of a term's boundary (its sources or sinks).
///
/// Besides plain items, a boundary may hold the [`Identity`](Endpoint::Identity)
/// endpoint, which composition replaces by the other operand's boundary.
/// A [`Zero`](Endpoint::Zero) endpoint may be written inside a leaf-set,
/// but it contributes nothing to any boundary.
///
/// Endpoints order items first, then `I`, then `O`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Endpoint<T> {
    /// A caller supplied item.
    Item(T),
    /// The identity endpoint, printed `I`.
    Identity,
    /// The zero endpoint, printed `O`.
    Zero,
}

impl<T> Endpoint<T> {
    /// Returns the wrapped item, if this is not `I` or `O`.
    pub fn item(&self) -> Option<&T> {
        match self {
            Endpoint::Item(t) => Some(t),
            Endpoint::Identity | Endpoint::Zero => None,
        }
    }
}

impl<T> From<T> for Endpoint<T> {
    fn from(t: T) -> Self {
        Endpoint::Item(t)
    }
}

impl<T: Display> Display for Endpoint<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Item(t) => Display::fmt(t, f),
            Endpoint::Identity => f.write_str("I"),
            Endpoint::Zero => f.write_str("O"),
        }
    }
}

impl<T: Display> Debug for Endpoint<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// The caller supplied wiring callback.
///
/// A [`Connector`] is a shared handle: cloning it keeps the identity,
/// and two connectors compare equal only if they are clones of the same
/// handle. Ordering and hashing use that identity too, so connections
/// of different connectors never interleave when sorted.
pub struct Connector<T> {
    callback: Rc<dyn Fn(&T, &T)>,
}

impl<T> Connector<T> {
    /// Wrap a callback invoked as `callback(source, sink)`.
    pub fn new(callback: impl Fn(&T, &T) + 'static) -> Self {
        Self {
            callback: Rc::new(callback),
        }
    }

    /// Invoke the callback right away.
    pub fn connect(&self, source: &T, sink: &T) {
        (self.callback)(source, sink)
    }

    fn addr(&self) -> usize {
        Rc::as_ptr(&self.callback) as *const () as usize
    }
}

impl<T> Clone for Connector<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<T> PartialEq for Connector<T> {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl<T> Eq for Connector<T> {}

impl<T> PartialOrd for Connector<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Connector<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.addr().cmp(&other.addr())
    }
}

impl<T> Hash for Connector<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state)
    }
}

impl<T> Debug for Connector<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Connector({:#x})", self.addr())
    }
}

/// A connector call that has been recorded but not made yet.
///
/// Terms accumulate these while they are combined; nothing is wired
/// until [`Term::evaluate`](crate::Term::evaluate) runs them in order.
/// Field order is the sort order: connector, then source, then sink.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Connection<T> {
    connector: Connector<T>,
    source: T,
    sink: T,
}

impl<T> Connection<T> {
    pub(crate) fn new(connector: Connector<T>, source: T, sink: T) -> Self {
        Self {
            connector,
            source,
            sink,
        }
    }

    /// The connector that will make this connection.
    pub fn connector(&self) -> &Connector<T> {
        &self.connector
    }

    /// The endpoint handed to the connector first.
    pub fn source(&self) -> &T {
        &self.source
    }

    /// The endpoint handed to the connector second.
    pub fn sink(&self) -> &T {
        &self.sink
    }

    /// Make the connection: calls the connector with `(source, sink)`.
    pub fn evaluate(&self) {
        self.connector.connect(&self.source, &self.sink)
    }
}

impl<T: Display> Debug for Connection<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "F({},{})", self.source, self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn connector_identity() {
        let a = Connector::<u32>::new(|_, _| {});
        let b = Connector::<u32>::new(|_, _| {});
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn connection_order_and_evaluation() {
        let log = Rc::new(RefCell::new(vec![]));
        let sink = log.clone();
        let c = Connector::new(move |a: &u32, b: &u32| sink.borrow_mut().push((*a, *b)));

        let mut conns = vec![
            Connection::new(c.clone(), 2, 1),
            Connection::new(c.clone(), 1, 4),
            Connection::new(c.clone(), 1, 3),
        ];
        conns.sort();
        conns.iter().for_each(Connection::evaluate);

        assert_eq!(*log.borrow(), vec![(1, 3), (1, 4), (2, 1)]);
    }

    #[test]
    fn endpoints_sort_items_first() {
        let mut eps = vec![Endpoint::Zero, Endpoint::Identity, Endpoint::Item(2), 1.into()];
        eps.sort();
        let printed: Vec<String> = eps.iter().map(|e| e.to_string()).collect();
        assert_eq!(printed, ["1", "2", "I", "O"]);
    }
}
