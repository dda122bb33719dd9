use std::collections::BTreeSet;
use std::fmt::{self, Debug, Formatter};

use log::*;

use crate::{
    replace::Path,
    util::{common_prefix_len, HashMap},
    Algebra, Endpoint, Error, Id, Item, Op, Result, Rule, Term, TermKind,
};

/// The structure of a term with its operands already interned.
///
/// Terms are interned by how they are written, not by their printed
/// form: two different terms can print the same way.
#[derive(Clone, PartialEq, Eq, Hash)]
enum NodeKey<T> {
    Identity,
    Zero,
    Leaf(BTreeSet<Endpoint<T>>),
    Binary(Id, Op, Id),
}

/// A term one rewrite away from another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbor {
    /// The rewritten term.
    pub id: Id,
    /// The rule that was applied.
    pub rule: Rule,
    /// Where in the original term the rule was applied.
    pub position: Path,
}

/** The implicit graph the search walks.

Nodes are terms, interned into an arena so that every structurally
identical term gets the same [`Id`]. Edges are the rewrites of the
active [`Rule`]s at every position of a term; they are discovered on
demand by [`neighbor_nodes`](EquationGraph::neighbor_nodes).

The arena only grows. Use a fresh graph, or [`clear`](EquationGraph::clear)
this one, for each independent search.

# Example
```
use conneq::*;

let (_, _, c) = from_connector(|_: &u32, _: &u32| {});
let mut graph = EquationGraph::new(c.clone());

let a = graph.get_cached(&(c.leaf([1]) + c.leaf([2]))).unwrap();
let b = graph.get_cached(&(c.leaf([1]) + c.leaf([2]))).unwrap();
assert_eq!(a, b);
assert_eq!(graph.len(), 3);

let next: Vec<String> = graph
    .neighbor_nodes(a)
    .iter()
    .map(|n| format!("{}: {}", n.rule, graph.term(n.id)))
    .collect();
assert_eq!(next, ["add_adder: C(1, 2)", "swap: C(2) + C(1)"]);
```
*/
pub struct EquationGraph<T> {
    algebra: Algebra<T>,
    rules: Vec<Rule>,
    nodes: Vec<Term<T>>,
    memo: HashMap<NodeKey<T>, Id>,
}

impl<T: Item> EquationGraph<T> {
    /// An empty graph over `algebra` using every rule in [`Rule::ALL`].
    pub fn new(algebra: Algebra<T>) -> Self {
        Self {
            algebra,
            rules: Rule::ALL.to_vec(),
            nodes: vec![],
            memo: HashMap::default(),
        }
    }

    /// Replace the active rules. Rules are tried in the given order.
    pub fn with_rules(self, rules: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
            ..self
        }
    }

    /// The algebra terms of this graph are built with.
    pub fn algebra(&self) -> &Algebra<T> {
        &self.algebra
    }

    /// The active rules.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of interned terms.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Forget every interned term. Previously returned [`Id`]s become
    /// invalid.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.memo.clear();
    }

    /// The term interned as `id`.
    ///
    /// # Panics
    /// Panics if `id` was not returned by this graph.
    pub fn term(&self, id: Id) -> &Term<T> {
        &self.nodes[usize::from(id)]
    }

    /// Intern `term` and all of its sub-terms.
    ///
    /// Interning the same structure twice returns the same [`Id`],
    /// even when the two terms are different objects.
    pub fn get_cached(&mut self, term: &Term<T>) -> Result<Id> {
        if term.connector() != self.algebra.connector() {
            return Err(Error::ConnectorMismatch {
                left: term.to_string(),
                right: format!("the graph over {:?}", self.algebra.connector()),
            });
        }
        Ok(self.intern(term))
    }

    fn intern(&mut self, term: &Term<T>) -> Id {
        let mut ids: HashMap<usize, Id> = HashMap::default();
        let mut todo = vec![term];
        while let Some(t) = todo.pop() {
            if ids.contains_key(&t.addr()) {
                continue;
            }
            let key = match t.kind() {
                TermKind::Identity => NodeKey::Identity,
                TermKind::Zero => NodeKey::Zero,
                TermKind::Leaf(items) => NodeKey::Leaf(items.clone()),
                TermKind::Binary { left, op, right } => {
                    match (ids.get(&left.addr()), ids.get(&right.addr())) {
                        (Some(&l), Some(&r)) => NodeKey::Binary(l, *op, r),
                        _ => {
                            todo.push(t);
                            todo.push(right);
                            todo.push(left);
                            continue;
                        }
                    }
                }
            };
            let id = self.add(key, t);
            ids.insert(t.addr(), id);
        }
        ids[&term.addr()]
    }

    fn add(&mut self, key: NodeKey<T>, term: &Term<T>) -> Id {
        if let Some(&id) = self.memo.get(&key) {
            return id;
        }
        let id = Id::from(self.nodes.len());
        trace!("interned {} as {}", term, id);
        self.nodes.push(term.clone());
        self.memo.insert(key, id);
        id
    }

    /// Every term one rewrite away from the term interned as `id`.
    ///
    /// Rules are tried in order and, for each rule, every position in
    /// pre-order. The same neighbour may be reported more than once.
    ///
    /// Every neighbour is `==` to the term at `id`. A rewrite that keeps
    /// the meaning of a sub-term can still change the meaning of the
    /// whole, because `*` treats `I` and `O` apart from terms that merely
    /// equal them; such rewrites are dropped here.
    pub fn neighbor_nodes(&mut self, id: Id) -> Vec<Neighbor> {
        let term = self.term(id).clone();
        let mut rewrites = vec![];
        for &rule in &self.rules {
            for replacer in crate::replacers(&term) {
                let next = match replacer.apply(|sub| rule.apply(sub, &self.algebra)) {
                    Some(next) => next,
                    None => continue,
                };
                if next != term {
                    warn!(
                        "{} at {:?} changed the meaning of {}, dropping {}",
                        rule,
                        replacer.path(),
                        term,
                        next
                    );
                    continue;
                }
                rewrites.push((rule, replacer.into_path(), next));
            }
        }
        trace!("{} has {} rewrites", term, rewrites.len());

        rewrites
            .into_iter()
            .map(|(rule, position, next)| Neighbor {
                id: self.intern(&next),
                rule,
                position,
            })
            .collect()
    }
}

impl<T: Item> Debug for EquationGraph<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("EquationGraph")
            .field("rules", &self.rules)
            .field("nodes", &self.nodes)
            .finish()
    }
}

/// How far apart two printed terms are.
///
/// The longer length minus the length of the common prefix, both in
/// characters. [`None`] prints as the empty string, so
/// `dist_between(Some(t), None)` is the length of `t`.
///
/// ```
/// use conneq::*;
///
/// let (_, _, c) = from_connector(|_: &u32, _: &u32| {});
/// let (a, b) = (c.leaf([1]) + c.leaf([2]), c.leaf([1, 2]));
/// assert_eq!(dist_between(Some(&a), None), "C(1) + C(2)".len());
/// assert_eq!(dist_between(Some(&a), Some(&b)), 11 - 3);
/// assert_eq!(dist_between(Some(&b), Some(&b)), 0);
/// ```
pub fn dist_between<T>(x: Option<&Term<T>>, y: Option<&Term<T>>) -> usize {
    let x = x.map_or("", |t| t.text());
    let y = y.map_or("", |t| t.text());
    x.chars().count().max(y.chars().count()) - common_prefix_len(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::from_connector;

    #[test]
    fn interning_is_structural() {
        crate::init_logger();
        let (i, o, c) = from_connector(|_: &u32, _: &u32| {});
        let mut g = EquationGraph::new(c.clone());

        let a = g.get_cached(&(c.leaf([1]) * c.leaf([2]) + &i)).unwrap();
        assert_eq!(g.len(), 5);
        let b = g.get_cached(&(c.leaf([2, 1]) - &o)).unwrap();
        assert_ne!(a, b);
        assert_eq!(g.len(), 8);
        assert_eq!(g.get_cached(&(c.leaf([1]) * c.leaf([2]) + &i)).unwrap(), a);
        assert_eq!(g.len(), 8);

        // equal, but written differently
        let left = (c.leaf([1]) * c.leaf([2])) * c.leaf([3]);
        let right = c.leaf([1]) * (c.leaf([2]) * c.leaf([3]));
        assert_eq!(left, right);
        assert_ne!(g.get_cached(&left).unwrap(), g.get_cached(&right).unwrap());

        g.clear();
        assert!(g.is_empty());
    }

    #[test]
    fn equal_text_never_merges() {
        let (_, _, c) = from_connector(|_: &String, _: &String| {});
        let mut g = EquationGraph::new(c.clone());
        let joined = c.leaf(["a, b".to_string()]);
        let split = c.leaf(["a".to_string(), "b".to_string()]);
        assert_eq!(joined.text(), split.text());
        assert_ne!(joined, split);

        let (x, y) = (g.get_cached(&joined).unwrap(), g.get_cached(&split).unwrap());
        assert_ne!(x, y);
        assert_eq!(g.term(x), &joined);
        assert_eq!(g.term(y), &split);
    }

    #[test]
    fn foreign_terms_are_rejected() {
        let (_, _, c) = from_connector(|_: &u32, _: &u32| {});
        let (_, _, other) = from_connector(|_: &u32, _: &u32| {});
        let mut g = EquationGraph::new(c);
        assert!(matches!(
            g.get_cached(&other.leaf([1])),
            Err(Error::ConnectorMismatch { .. })
        ));
        assert!(g.is_empty());
    }

    #[test]
    fn neighbours_follow_rule_then_position_order() {
        let (_, _, c) = from_connector(|_: &u32, _: &u32| {});
        let mut g = EquationGraph::new(c.clone());
        let start = g.get_cached(&(c.leaf([1, 2]) + c.leaf([3]))).unwrap();

        let found: Vec<(Rule, Vec<crate::Side>, String)> = g
            .neighbor_nodes(start)
            .into_iter()
            .map(|n| (n.rule, n.position.to_vec(), g.term(n.id).to_string()))
            .collect();

        use crate::Side::*;
        assert_eq!(
            found,
            vec![
                (Rule::RemoveAdder, vec![Left], "(C(1) + C(2)) + C(3)".to_string()),
                (Rule::AddAdder, vec![], "C(1, 2, 3)".to_string()),
                (Rule::Swap, vec![], "C(3) + C(1, 2)".to_string()),
            ]
        );
        for n in g.neighbor_nodes(start) {
            assert_eq!(g.term(n.id), g.term(start));
        }
    }

    #[test]
    fn neighbours_keep_meaning() {
        crate::init_logger();
        let (i, o, c) = from_connector(|_: &u32, _: &u32| {});
        let with_i = |n: u32| c.leaf([Endpoint::Item(n), Endpoint::Identity]);
        let starts = [
            (c.leaf([1]) + &i) * (&i * &o),
            (&i * &o) * with_i(2),
            c.leaf([1]) * (&i * &o) + c.leaf([1]) * c.leaf([2]),
            (c.leaf([1]) - &i) * (&o + &i * &o),
            &i * &i * &o,
            (with_i(1) + &o) * (&i * &i),
            c.leaf([1, 2]) * (c.leaf([3]) + &i) * c.leaf([4]),
            c.leaf([1]) * &i + c.leaf([2]) * &i,
            (&o * c.leaf([3]) + c.leaf([2])) * (&i * with_i(4)),
        ];

        for start in &starts {
            let mut g = EquationGraph::new(c.clone());
            let root = g.get_cached(start).unwrap();
            let mut seen = crate::util::HashSet::default();
            let mut todo = std::collections::VecDeque::from([root]);
            while let Some(id) = todo.pop_front() {
                if seen.len() >= 40 {
                    break;
                }
                if !seen.insert(id) {
                    continue;
                }
                for n in g.neighbor_nodes(id) {
                    assert_eq!(
                        g.term(n.id),
                        start,
                        "{} at {:?} took {} to {}",
                        n.rule,
                        n.position,
                        g.term(id),
                        g.term(n.id)
                    );
                    todo.push_back(n.id);
                }
            }
        }

        // identity_off may not turn `I * O` into `O` inside a product
        let mut g = EquationGraph::new(c.clone());
        let root = g.get_cached(&starts[0]).unwrap();
        let next: Vec<String> = g
            .neighbor_nodes(root)
            .iter()
            .map(|n| g.term(n.id).to_string())
            .collect();
        assert!(!next.contains(&"(C(1) + I) * O".to_string()), "{:?}", next);
    }

    #[test]
    fn restricted_rules() {
        let (_, _, c) = from_connector(|_: &u32, _: &u32| {});
        let mut g = EquationGraph::new(c.clone()).with_rules([Rule::Swap]);
        assert_eq!(g.rules(), [Rule::Swap]);
        let start = g.get_cached(&(c.leaf([1]) + c.leaf([2]))).unwrap();
        let next = g.neighbor_nodes(start);
        assert_eq!(next.len(), 1);
        assert_eq!(g.neighbor_nodes(next[0].id)[0].id, start);
    }

    #[test]
    fn distance() {
        let (_, _, c) = from_connector(|_: &u32, _: &u32| {});
        let t = c.leaf([1]) * c.leaf([2]);
        assert_eq!(dist_between::<u32>(None, None), 0);
        assert_eq!(dist_between(None, Some(&t)), 11);
        assert_eq!(dist_between(Some(&t), Some(&c.leaf([1]))), 7);
    }
}
