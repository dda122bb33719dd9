#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
/*!

`conneq` builds *connection equations*: symbolic descriptions of how the
outputs of some items are wired into the inputs of others, evaluated
only when asked.

A caller supplies a connector, a callback taking a source and a sink.
[`from_connector`] turns it into an [`Algebra`] and two constants, the
identity `I` and the terminator `O`. Leaf-sets of items are then
combined with `+` (union), `-` (difference) and `*` (composition: every
source on the left is wired to every sink on the right). A [`Term`]
records the connections it stands for; [`Term::evaluate`] makes them.

Many terms mean the same thing. An [`EquationGraph`] connects each term
to the terms one [`Rule`] away, and a [`Search`] walks that graph to
[`simplify`] a term, or to find a route from one term to another with
[`get_route`].

## Logging

Many parts of `conneq` dump useful logging info using the [`log`](https://docs.rs/log/) crate.
The easiest way to see this info is to use the [`env_logger`](https://docs.rs/env_logger/)
crate in your binary or test.
The simplest way to enable `env_logger` is to put the following line near the top of your `main`:
`env_logger::init();`.
Then, set the environment variable `RUST_LOG=conneq=info`, or use `debug` or `trace` instead of info
for more logging.

*/
#![doc = "## Simple Example\n```"]
#![doc = include_str!("../tests/simple.rs")]
#![doc = "\n```"]

mod algebra;
pub mod analysis;
mod connector;
mod error;
mod graph;
mod replace;
mod rewrite;
mod run;
mod term;
mod util;

/// A key to identify an interned [`Term`] within an
/// [`EquationGraph`].
#[derive(Clone, Copy, Default, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-1", serde(transparent))]
pub struct Id(u32);

impl From<usize> for Id {
    fn from(n: usize) -> Id {
        Id(n as u32)
    }
}

impl From<Id> for usize {
    fn from(id: Id) -> usize {
        id.0 as usize
    }
}

impl std::fmt::Debug for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub use {
    algebra::{from_connector, Algebra},
    connector::{Connection, Connector, Endpoint, Item},
    error::{Error, Result},
    graph::{dist_between, EquationGraph, Neighbor},
    replace::{replacers, Path, Replacer, Replacers, Side},
    rewrite::Rule,
    run::*,
    term::{Op, Term, TermKind},
};

#[cfg(test)]
fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
