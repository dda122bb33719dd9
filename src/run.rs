use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::rc::Rc;

use log::*;

use crate::{
    dist_between,
    util::{HashSet, IndexMap, Instant},
    EquationGraph, Id, Item, Result, Rule, Term,
};

/** A bounded best-first search over an [`EquationGraph`].

A [`Search`] starts from one term and repeatedly expands the most
promising term it has seen but not expanded yet, where "promising"
means closest to a goal by [`dist_between`]:

- [`simplify`](Search::simplify) looks for the term with the shortest
  printed form, the distance to nothing;
- [`route`](Search::route) looks for a way to rewrite one term into
  another, steering by the distance to the target's printed form.

Every expansion is an iteration. The search stops when the
[iteration limit](Search::with_iter_limit) is hit, when there is nothing
left to expand, or, when routing, as soon as the target has been found.
None of these are errors: the [`Route`] records why the search stopped.

The search is deterministic. Ties between equally close terms are broken
by their printed form and then by their [`Id`], so the same start term,
rules and limit always produce the same [`Route`].

# Example
```
use conneq::*;

let (_, _, c) = from_connector(|_: &u32, _: &u32| {});
let mut graph = EquationGraph::new(c.clone());

let t = c.leaf([1]) + c.leaf([2]);
let route = Search::new(&mut graph).with_iter_limit(300).simplify(&t).unwrap();

assert_eq!(route.best.to_string(), "C(1, 2)");
assert_eq!(route.rules, [Rule::AddAdder]);
assert_eq!(route.stop_reason, StopReason::Exhausted);
```
*/
pub struct Search<'a, T> {
    graph: &'a mut EquationGraph<T>,
    iter_limit: usize,
}

/// Why a [`Search`] stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize))]
pub enum StopReason {
    /// Every reachable term was expanded.
    Exhausted,
    /// The iteration limit was hit. The data is the iteration limit.
    IterationLimit(usize),
    /// The target of a route was found.
    Reached,
}

/// The outcome of a [`Search`].
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Route<T> {
    /// The closest term found. For a route that reached its target,
    /// this prints exactly like the target.
    pub best: Term<T>,
    /// The distance of [`best`](Route::best) to the goal.
    pub distance: usize,
    /// The terms from the start term to [`best`](Route::best), both
    /// included. Each one is a single rewrite of the one before.
    pub path: Vec<Term<T>>,
    /// `rules[i]` rewrote `path[i]` into `path[i + 1]`.
    pub rules: Vec<Rule>,
    /// Why the search stopped.
    pub stop_reason: StopReason,
    /// The number of terms expanded.
    pub iterations: usize,
    /// The number of interned terms when the search stopped.
    pub graph_size: usize,
    /// Seconds spent searching.
    pub total_time: f64,
}

impl<T> Route<T> {
    /// Prints some information about the search.
    pub fn print_report(&self) {
        println!("Search report");
        println!("=============");
        println!("  Stop reason: {:?}", self.stop_reason);
        println!("  Iterations: {}", self.iterations);
        println!("  Graph size: {} terms", self.graph_size);
        println!("  Best: {} (distance {})", self.best, self.distance);
        println!("  Steps: {}", self.rules.len());
        println!("  Total time: {}", self.total_time);
    }
}

impl<'a, T: Item> Search<'a, T> {
    /// Create a search over `graph` with default parameters.
    pub fn new(graph: &'a mut EquationGraph<T>) -> Self {
        Self {
            graph,
            iter_limit: 100,
        }
    }

    /// Sets the iteration limit. Default: 100
    pub fn with_iter_limit(self, iter_limit: usize) -> Self {
        Self { iter_limit, ..self }
    }

    /// Look for the term equal to `term` with the shortest printed form.
    pub fn simplify(self, term: &Term<T>) -> Result<Route<T>> {
        self.run(term, None)
    }

    /// Look for a sequence of rewrites turning `from` into a term that
    /// prints like `to`.
    pub fn route(self, from: &Term<T>, to: &Term<T>) -> Result<Route<T>> {
        self.run(from, Some(to))
    }

    fn run(self, start: &Term<T>, target: Option<&Term<T>>) -> Result<Route<T>> {
        let start_time = Instant::now();
        let graph = self.graph;
        let dist = |t: &Term<T>| dist_between(Some(t), target);

        match target {
            Some(target) => info!("Routing {} to {}", start, target),
            None => info!("Simplifying {}", start),
        }

        let root = graph.get_cached(start)?;
        let mut frontier: BinaryHeap<Reverse<(usize, Rc<str>, Id)>> = BinaryHeap::new();
        let mut closed: HashSet<Id> = HashSet::default();
        let mut parents: IndexMap<Id, (Id, Rule)> = IndexMap::default();

        let mut best = (dist(start), root);
        frontier.push(Reverse((best.0, graph.term(root).shared_text(), root)));

        let mut iterations = 0;
        let stop_reason = loop {
            if target.is_some() && best.0 == 0 {
                break StopReason::Reached;
            }
            if iterations >= self.iter_limit {
                break StopReason::IterationLimit(self.iter_limit);
            }
            let id = match frontier.pop() {
                Some(Reverse((_, _, id))) => id,
                None => break StopReason::Exhausted,
            };
            if !closed.insert(id) {
                continue;
            }
            iterations += 1;

            let neighbors = graph.neighbor_nodes(id);
            let n_neighbors = neighbors.len();
            let mut n_new = 0;
            for neighbor in neighbors {
                if neighbor.id == root || parents.contains_key(&neighbor.id) {
                    continue;
                }
                parents.insert(neighbor.id, (id, neighbor.rule));

                let term = graph.term(neighbor.id);
                let d = dist(term);
                if d < best.0 {
                    best = (d, neighbor.id);
                }
                frontier.push(Reverse((d, term.shared_text(), neighbor.id)));
                n_new += 1;
            }
            debug!(
                "Iteration {}: expanded {}, {} neighbours, {} new, best distance {}",
                iterations,
                graph.term(id),
                n_neighbors,
                n_new,
                best.0
            );
        };
        info!("Stopping: {:?}", stop_reason);

        let mut ids = vec![best.1];
        let mut rules = vec![];
        let mut at = best.1;
        while let Some(&(parent, rule)) = parents.get(&at) {
            ids.push(parent);
            rules.push(rule);
            at = parent;
        }
        ids.reverse();
        rules.reverse();

        let total_time = start_time.elapsed().as_secs_f64();
        info!(
            "Best: {} (distance {}) after {} iterations in {}s",
            graph.term(best.1),
            best.0,
            iterations,
            total_time
        );

        Ok(Route {
            best: graph.term(best.1).clone(),
            distance: best.0,
            path: ids.into_iter().map(|id| graph.term(id).clone()).collect(),
            rules,
            stop_reason,
            iterations,
            graph_size: graph.len(),
            total_time,
        })
    }
}

/// Look for the shortest term equal to `term`, expanding at most
/// `max_iterations` terms.
///
/// This is [`Search::simplify`] with an iteration limit.
pub fn simplify<T: Item>(
    term: &Term<T>,
    max_iterations: usize,
    graph: &mut EquationGraph<T>,
) -> Result<Route<T>> {
    Search::new(graph)
        .with_iter_limit(max_iterations)
        .simplify(term)
}

/// Look for a way to rewrite `a` into `b`, expanding at most
/// `max_iterations` terms.
///
/// This is [`Search::route`] with an iteration limit.
///
/// ```
/// use conneq::*;
///
/// let (_, _, c) = from_connector(|_: &u32, _: &u32| {});
/// let mut graph = EquationGraph::new(c.clone());
///
/// let a = c.leaf([1]) + c.leaf([2]);
/// let b = c.leaf([2]) + c.leaf([1]);
/// let route = get_route(&a, &b, 10, &mut graph).unwrap();
/// assert_eq!(route.best.to_string(), b.to_string());
/// assert_eq!(route.rules, [Rule::Swap]);
/// assert_eq!(route.stop_reason, StopReason::Reached);
/// ```
pub fn get_route<T: Item>(
    a: &Term<T>,
    b: &Term<T>,
    max_iterations: usize,
    graph: &mut EquationGraph<T>,
) -> Result<Route<T>> {
    Search::new(graph).with_iter_limit(max_iterations).route(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{from_connector, Algebra};

    fn setup() -> (Algebra<u32>, EquationGraph<u32>) {
        crate::init_logger();
        let (_, _, c) = from_connector(|_: &u32, _: &u32| {});
        let graph = EquationGraph::new(c.clone());
        (c, graph)
    }

    fn texts(route: &Route<u32>) -> Vec<String> {
        route.path.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn merge_two_leaves() {
        let (c, mut graph) = setup();
        let t = c.leaf([1]) + c.leaf([2]);
        let route = simplify(&t, 300, &mut graph).unwrap();
        assert_eq!(route.best.to_string(), "C(1, 2)");
        assert_eq!(texts(&route), ["C(1) + C(2)", "C(1, 2)"]);
        assert_eq!(route.distance, 7);
        assert_eq!(route.stop_reason, StopReason::Exhausted);
        assert!(route.iterations <= 300);
        assert_eq!(route.graph_size, graph.len());
    }

    #[test]
    fn factor_a_shared_tail() {
        let (c, mut graph) = setup();
        let t = c.leaf([1]) * c.leaf([3]) + c.leaf([2]) * c.leaf([3]);
        let route = simplify(&t, 100, &mut graph).unwrap();

        assert_eq!(route.best.to_string(), "C(1, 2) * C(3)");
        assert_eq!(route.best, t);
        assert_eq!(route.path.first(), Some(&t));
        assert_eq!(route.path.last(), Some(&route.best));
        assert_eq!(route.rules.len() + 1, route.path.len());
        for pair in route.path.windows(2) {
            assert_eq!(pair[0], pair[1]);
        }
        assert!(route.rules.contains(&Rule::SourceOut));
    }

    #[test]
    fn iteration_limit() {
        let (c, mut graph) = setup();
        let t = c.leaf([1]) * c.leaf([3]) + c.leaf([2]) * c.leaf([3]);
        let route = simplify(&t, 1, &mut graph).unwrap();
        assert_eq!(route.iterations, 1);
        assert_eq!(route.stop_reason, StopReason::IterationLimit(1));
        assert_eq!(route.best, t);

        let mut graph = EquationGraph::new(c.clone());
        let route = simplify(&t, 0, &mut graph).unwrap();
        assert_eq!(route.iterations, 0);
        assert_eq!(texts(&route), [t.to_string()]);
        assert!(route.rules.is_empty());
    }

    #[test]
    fn route_to_itself() {
        let (c, mut graph) = setup();
        let t = c.leaf([1]) * c.leaf([2]);
        let route = get_route(&t, &t, 10, &mut graph).unwrap();
        assert_eq!(route.stop_reason, StopReason::Reached);
        assert_eq!(route.iterations, 0);
        assert_eq!(route.path.len(), 1);
    }

    #[test]
    fn route_through_several_rules() {
        let (c, mut graph) = setup();
        let a = c.leaf([1, 2]) * c.leaf([3]);
        let b = (c.leaf([2]) + c.leaf([1])) * c.leaf([3]);
        let route = get_route(&a, &b, 100, &mut graph).unwrap();
        assert_eq!(route.best.to_string(), b.to_string());
        assert_eq!(route.stop_reason, StopReason::Reached);
        assert_eq!(route.distance, 0);
        assert_eq!(route.rules, [Rule::RemoveAdder, Rule::Swap]);
        assert_eq!(
            texts(&route),
            ["C(1, 2) * C(3)", "(C(1) + C(2)) * C(3)", "(C(2) + C(1)) * C(3)"]
        );
    }

    #[test]
    fn searches_are_deterministic() {
        let (c, _) = setup();
        let t = c.leaf([1, 2]) * (c.leaf([3]) + c.leaf([4])) + c.leaf([5]) * c.leaf([3, 4]);
        let run = || {
            let mut graph = EquationGraph::new(c.clone());
            let route = simplify(&t, 50, &mut graph).unwrap();
            (
                route.best.to_sexp().to_string(),
                route
                    .path
                    .iter()
                    .map(|t| t.to_sexp().to_string())
                    .collect::<Vec<_>>(),
                route.rules,
                route.iterations,
                route.graph_size,
            )
        };
        assert_eq!(run(), run());
    }
}
