/*!
Structural views of a [`Term`].

These walk the tree as written. None of them look at the boundary sets,
except [`subterms`], which uses term equality to collapse duplicates.
*/

use crate::{util::HashSet, Error, Item, Op, Result, Term, TermKind};

/// The first factor of a product.
///
/// A terminal is its own head; a product `H * R` has head `H`.
/// Sums and discards have no head.
pub fn head<T>(term: &Term<T>) -> Option<&Term<T>> {
    match term.kind() {
        TermKind::Binary {
            left,
            op: Op::Arrow,
            ..
        } => Some(left),
        TermKind::Binary { .. } => None,
        _ => Some(term),
    }
}

/// The last factor of a product, the mirror image of [`head`].
pub fn tail<T>(term: &Term<T>) -> Option<&Term<T>> {
    match term.kind() {
        TermKind::Binary {
            right,
            op: Op::Arrow,
            ..
        } => Some(right),
        TermKind::Binary { .. } => None,
        _ => Some(term),
    }
}

enum Visit<'a, T> {
    Enter(&'a Term<T>),
    Exit(&'a Term<T>),
}

/// Every distinct sub-term of `term`, the root included, sorted by its
/// printed form.
///
/// Sub-terms that print the same and are `==` are reported once.
///
/// ```
/// use conneq::*;
///
/// let (_, o, c) = from_connector(|_: &u32, _: &u32| {});
/// let t = c.leaf([1]) * c.leaf([2]) * c.leaf([3]) * o;
/// let all: Vec<String> = analysis::subterms(&t)
///     .unwrap()
///     .iter()
///     .map(|t| t.to_string())
///     .collect();
/// assert_eq!(
///     all,
///     [
///         "C(1)",
///         "C(1) * C(2)",
///         "C(1) * C(2) * C(3)",
///         "C(1) * C(2) * C(3) * O",
///         "C(2)",
///         "C(3)",
///         "O",
///     ]
/// );
/// ```
pub fn subterms<T: Item>(term: &Term<T>) -> Result<Vec<Term<T>>> {
    let mut active = HashSet::default();
    let mut done = HashSet::default();
    let mut found = vec![];

    let mut stack = vec![Visit::Enter(term)];
    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(t) => {
                if active.contains(&t.addr()) {
                    return Err(Error::Cycle(t.to_string()));
                }
                if !done.insert(t.addr()) {
                    continue;
                }
                active.insert(t.addr());
                stack.push(Visit::Exit(t));
                if let TermKind::Binary { left, right, .. } = t.kind() {
                    stack.push(Visit::Enter(right));
                    stack.push(Visit::Enter(left));
                }
            }
            Visit::Exit(t) => {
                active.remove(&t.addr());
                found.push(t.clone());
            }
        }
    }

    found.sort_by(|a, b| a.text().cmp(b.text()));
    let mut distinct: Vec<Term<T>> = Vec::with_capacity(found.len());
    for t in found {
        let seen = distinct
            .iter()
            .rev()
            .take_while(|d| d.text() == t.text())
            .any(|d| *d == t);
        if !seen {
            distinct.push(t);
        }
    }
    Ok(distinct)
}

/// The summands of the top-level `+` tree, left to right.
///
/// A term that is not a sum is its own only summand.
pub fn topmost_sums<T>(term: &Term<T>) -> Vec<Term<T>> {
    let mut out = vec![];
    let mut stack = vec![term];
    while let Some(t) = stack.pop() {
        match t.kind() {
            TermKind::Binary {
                left,
                op: Op::Add,
                right,
            } => {
                stack.push(right);
                stack.push(left);
            }
            _ => out.push(t.clone()),
        }
    }
    out
}

/// Every suffix of a product chain, longest first.
///
/// ```
/// use conneq::*;
///
/// let (_, o, c) = from_connector(|_: &u32, _: &u32| {});
/// let t = c.leaf([1]) * (c.leaf([2]) + c.leaf([3])) * (o + c.leaf([4]));
/// let tails: Vec<String> = analysis::tail_products(&t)
///     .iter()
///     .map(|t| t.to_string())
///     .collect();
/// assert_eq!(
///     tails,
///     [
///         "C(1) * (C(2) + C(3)) * (O + C(4))",
///         "(C(2) + C(3)) * (O + C(4))",
///         "O + C(4)",
///     ]
/// );
/// ```
pub fn tail_products<T: Item>(term: &Term<T>) -> Vec<Term<T>> {
    match term.kind() {
        TermKind::Binary {
            left,
            op: Op::Arrow,
            right,
        } => {
            let rights = tail_products(right);
            if rights.is_empty() {
                return rights;
            }
            let mut out: Vec<Term<T>> = tail_products(left)
                .into_iter()
                .map(|l| Term::combine(l, Op::Arrow, right.clone()))
                .collect();
            out.extend(rights);
            out
        }
        TermKind::Binary {
            op: Op::Discard, ..
        } => vec![],
        _ => vec![term.clone()],
    }
}

/// [`tail_products`] of each of the [`topmost_sums`].
pub fn topmost_tail_products<T: Item>(term: &Term<T>) -> Vec<Term<T>> {
    topmost_sums(term)
        .iter()
        .flat_map(tail_products)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::from_connector;

    fn strings(terms: &[Term<u32>]) -> Vec<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn heads_and_tails() {
        let (i, o, c) = from_connector(|_: &u32, _: &u32| {});
        let p = c.leaf([1]) * c.leaf([2]) * c.leaf([3]);
        assert_eq!(head(&p).unwrap().to_string(), "C(1) * C(2)");
        assert_eq!(tail(&p).unwrap().to_string(), "C(3)");
        assert!(head(&i).unwrap().is_identity());
        assert!(tail(&o).unwrap().is_zero());
        assert!(head(&(c.leaf([1]) + c.leaf([2]))).is_none());
        assert!(tail(&(c.leaf([1]) - c.leaf([2]))).is_none());
    }

    #[test]
    fn shared_subterms_are_reported_once() {
        let (_, _, c) = from_connector(|_: &u32, _: &u32| {});
        let a = c.leaf([1]) * c.leaf([2]);
        let t = &a + &a;
        assert_eq!(
            strings(&subterms(&t).unwrap()),
            ["C(1)", "C(1) * C(2)", "C(1) * C(2) + C(1) * C(2)", "C(2)"]
        );
    }

    #[test]
    fn equal_text_is_not_enough() {
        let (_, _, c) = from_connector(|_: &String, _: &String| {});
        let joined = c.leaf(["a, b".to_string()]);
        let split = c.leaf(["a".to_string(), "b".to_string()]);
        assert_eq!(joined.text(), split.text());
        assert_eq!(subterms(&(&joined + &split)).unwrap().len(), 3);
        assert_eq!(subterms(&(&split + &split.clone())).unwrap().len(), 2);
    }

    #[test]
    fn sums_and_products() {
        let (_, o, c) = from_connector(|_: &u32, _: &u32| {});
        let t = c.leaf([1]) * c.leaf([2])
            + c.leaf([1]) * c.leaf([3]) * (&o + c.leaf([4]))
            + c.leaf([5]);
        assert_eq!(
            strings(&topmost_sums(&t)),
            ["C(1) * C(2)", "C(1) * C(3) * (O + C(4))", "C(5)"]
        );
        assert_eq!(
            strings(&topmost_tail_products(&t)),
            [
                "C(1) * C(2)",
                "C(2)",
                "C(1) * C(3) * (O + C(4))",
                "C(3) * (O + C(4))",
                "O + C(4)",
                "C(5)",
            ]
        );
        assert!(tail_products(&(c.leaf([1]) - c.leaf([2]))).is_empty());
        assert!(tail_products(&(c.leaf([1]) * (c.leaf([1]) - c.leaf([2])))).is_empty());
    }
}
