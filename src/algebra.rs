use std::collections::BTreeSet;
use std::str::FromStr;

use symbolic_expressions::Sexp;

use crate::{Connector, Endpoint, Error, Item, Op, Result, Term};

/// Get the identity, the zero and a leaf-set constructor for a connector.
///
/// Every term built from the returned values shares `connector`, so they
/// can be freely combined with `+`, `-` and `*`.
///
/// ```
/// use conneq::*;
///
/// let (i, o, c) = from_connector(|a: &u32, b: &u32| println!("{} -> {}", a, b));
/// assert_eq!(i.to_string(), "I");
/// assert_eq!(o.to_string(), "O");
/// assert_eq!(c.leaf([1, 2]), c.leaf([1]) + c.leaf([2]));
/// assert_eq!(&i * &i, i);
/// assert_eq!(&o * &i * &o, o);
/// ```
pub fn from_connector<T: Item>(
    connector: impl Fn(&T, &T) + 'static,
) -> (Term<T>, Term<T>, Algebra<T>) {
    let algebra = Algebra::new(Connector::new(connector));
    (algebra.identity(), algebra.zero(), algebra)
}

/// The constants and the leaf constructor bound to one [`Connector`].
///
/// The identity and zero are built once, so every `I` and `O` of an
/// algebra is the same object.
#[derive(Clone)]
pub struct Algebra<T> {
    connector: Connector<T>,
    identity: Term<T>,
    zero: Term<T>,
}

impl<T: Item> Algebra<T> {
    /// Create an algebra around `connector`.
    pub fn new(connector: Connector<T>) -> Self {
        Self {
            identity: Term::identity(connector.clone()),
            zero: Term::zero(connector.clone()),
            connector,
        }
    }

    /// The connector shared by all terms of this algebra.
    pub fn connector(&self) -> &Connector<T> {
        &self.connector
    }

    /// `I`
    pub fn identity(&self) -> Term<T> {
        self.identity.clone()
    }

    /// `O`
    pub fn zero(&self) -> Term<T> {
        self.zero.clone()
    }

    /// A leaf-set of items. Order and repetition do not matter.
    ///
    /// Items may also be [`Endpoint`]s, which lets `I` and `O` be placed
    /// inside a leaf-set.
    pub fn leaf<I, E>(&self, items: I) -> Term<T>
    where
        I: IntoIterator<Item = E>,
        E: Into<Endpoint<T>>,
    {
        let items: BTreeSet<Endpoint<T>> = items.into_iter().map(Into::into).collect();
        Term::leaf(self.connector.clone(), items)
    }

    /// Read a term from the s-expression form printed by
    /// [`Term::to_sexp`].
    ///
    /// ```
    /// use conneq::*;
    ///
    /// let (i, _, c) = from_connector(|_: &u32, _: &u32| {});
    /// let t = c.parse("(* (+ (C 1 2) I) (C 3))").unwrap();
    /// assert_eq!(t, (c.leaf([1, 2]) + i) * c.leaf([3]));
    /// assert_eq!(t.to_string(), "(C(1, 2) + I) * C(3)");
    /// assert!(c.parse("(% (C 1) (C 2))").is_err());
    /// ```
    pub fn parse(&self, s: &str) -> Result<Term<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let sexp = symbolic_expressions::parser::parse_str(s.trim())
            .map_err(|e| Error::Parse(e.to_string()))?;
        self.from_sexp(&sexp)
    }

    fn from_sexp(&self, sexp: &Sexp) -> Result<Term<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match sexp {
            Sexp::Empty => Err(Error::Parse("found empty s-expression".into())),
            Sexp::String(s) if s == "I" => Ok(self.identity()),
            Sexp::String(s) if s == "O" => Ok(self.zero()),
            Sexp::String(s) => Err(Error::Parse(format!(
                "expected `I`, `O` or a list, found `{}`",
                s
            ))),
            Sexp::List(list) => match list.as_slice() {
                [] => Err(Error::Parse("found empty s-expression".into())),
                [Sexp::String(head), items @ ..] if head == "C" => {
                    let items = items
                        .iter()
                        .map(|item| parse_endpoint(item))
                        .collect::<Result<BTreeSet<_>>>()?;
                    Ok(Term::leaf(self.connector.clone(), items))
                }
                [Sexp::String(head), left, right] => {
                    let op = Op::from_symbol(head)
                        .ok_or_else(|| Error::Parse(format!("unknown operator `{}`", head)))?;
                    let left = self.from_sexp(left)?;
                    let right = self.from_sexp(right)?;
                    Ok(Term::combine(left, op, right))
                }
                _ => Err(Error::Parse(format!("cannot read `{}`", sexp))),
            },
        }
    }
}

fn parse_endpoint<T>(sexp: &Sexp) -> Result<Endpoint<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match sexp {
        Sexp::String(s) if s == "I" => Ok(Endpoint::Identity),
        Sexp::String(s) if s == "O" => Ok(Endpoint::Zero),
        Sexp::String(s) => s
            .parse()
            .map(Endpoint::Item)
            .map_err(|e| Error::Parse(format!("bad item `{}`: {}", s, e))),
        _ => Err(Error::Parse(format!("expected an item, found `{}`", sexp))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_shared() {
        let (i, o, c) = from_connector(|_: &u32, _: &u32| {});
        assert!(i.ptr_eq(&c.identity()));
        assert!(o.ptr_eq(&c.zero()));
        assert_eq!(c.leaf([1]).connector(), c.connector());
    }

    #[test]
    fn parse_round_trips_structure() {
        let (i, o, c) = from_connector(|_: &u32, _: &u32| {});
        let t = c.leaf([1]) * (c.leaf([2]) + &o * c.leaf([3])) * c.leaf([4]) - &i;
        let back = c.parse(&t.to_sexp().to_string()).unwrap();
        assert_eq!(back.to_sexp().to_string(), t.to_sexp().to_string());
        assert_eq!(back, t);
    }

    #[test]
    fn parse_leaf_endpoints() {
        let (_, _, c) = from_connector(|_: &u32, _: &u32| {});
        let t = c.parse("(C 2 I O)").unwrap();
        assert_eq!(t.to_string(), "C(2, I, O)");
        assert_eq!(t, c.leaf([Endpoint::Item(2), Endpoint::Identity]));
    }

    #[test]
    fn parse_errors() {
        let (_, _, c) = from_connector(|_: &u32, _: &u32| {});
        assert!(matches!(c.parse("x"), Err(Error::Parse(_))));
        assert!(matches!(c.parse("(C 1 x)"), Err(Error::Parse(_))));
        assert!(matches!(c.parse("(+ (C 1))"), Err(Error::Parse(_))));
        assert!(matches!(c.parse("()"), Err(Error::Parse(_))));
    }
}
