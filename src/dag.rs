use std::collections::BTreeMap;
use std::fmt;

use crate::ir::{Atom, Node};

/// The compressed form of an expression tree.
///
/// Two parallel sequences indexed by node id: the payload atom and the
/// child-id list. Id 0 is always the root. After [`compress`] no two ids
/// refer to structurally identical subtrees.
#[derive(Debug, Clone, Default)]
pub struct Dag {
    atoms: Vec<Atom>,
    refs: Vec<Vec<usize>>,
}

impl Dag {
    pub const ROOT: usize = 0;

    #[must_use]
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    #[must_use]
    pub fn atom(&self, id: usize) -> &Atom {
        &self.atoms[id]
    }

    #[must_use]
    pub fn refs(&self, id: usize) -> &[usize] {
        &self.refs[id]
    }

    fn flatten(&mut self, gt: &Node) -> usize {
        let id = self.atoms.len();
        self.atoms.push(gt.atom.clone());
        self.refs.push(Vec::new());

        let refs = gt.children.iter().map(|c| self.flatten(c)).collect();
        self.refs[id] = refs;
        id
    }

    /// Node count of the subtree rooted at `id`, counting shared nodes once
    /// per reference.
    fn subtree_size(&self, id: usize) -> usize {
        1 + self.refs[id]
            .iter()
            .map(|&c| self.subtree_size(c))
            .sum::<usize>()
    }

    /// Structural equality of the subtrees rooted at `a` and `b`.
    fn subtree_equal(&self, a: usize, b: usize) -> bool {
        if self.atoms[a] != self.atoms[b] || self.refs[a].len() != self.refs[b].len() {
            return false;
        }
        self.refs[a]
            .iter()
            .zip(&self.refs[b])
            .all(|(&ca, &cb)| self.subtree_equal(ca, cb))
    }

    /// Rebuilds the graph keeping only nodes reachable from the root,
    /// assigning fresh depth-first ids.
    fn compact(&self) -> Self {
        let mut out = Self::default();
        let mut filled = BTreeMap::new();
        self.readdress(Self::ROOT, &mut out, &mut filled);
        out
    }

    fn readdress(&self, id: usize, out: &mut Self, filled: &mut BTreeMap<usize, usize>) -> usize {
        if let Some(&new_id) = filled.get(&id) {
            return new_id;
        }

        let new_id = out.atoms.len();
        out.atoms.push(self.atoms[id].clone());
        out.refs.push(Vec::new());
        filled.insert(id, new_id);

        let refs = self.refs[id]
            .iter()
            .map(|&c| self.readdress(c, out, filled))
            .collect();
        out.refs[new_id] = refs;
        new_id
    }
}

/// Id-annotated depth-first listing, one node per line.
impl fmt::Display for Dag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(Self::ROOT, 0usize)];
        while let Some((id, indent)) = stack.pop() {
            write!(f, "{id:>3}: {:indent$}[{} | ", "", self.atoms[id])?;
            if self.refs[id].is_empty() {
                writeln!(f, "X]")?;
            } else {
                let refs: Vec<String> = self.refs[id].iter().map(usize::to_string).collect();
                writeln!(f, "{}]", refs.join(", "))?;
            }
            for &child in self.refs[id].iter().rev() {
                stack.push((child, indent + 4));
            }
        }
        Ok(())
    }
}

/// Transforms a duplicated tree into a DAG by iteratively coalescing
/// structurally identical subtrees.
///
/// Each pass coalesces the equivalence class whose representative has the
/// largest subtree (smallest id on ties), garbage-collects, and repeats
/// until no equal pair remains.
#[must_use]
pub fn compress(gt: &Node) -> Dag {
    let mut graph = Dag::default();
    graph.flatten(gt);

    loop {
        let sizes: Vec<usize> = (0..graph.len()).map(|i| graph.subtree_size(i)).collect();

        // Map each duplicate id to the canonical id it equals
        let mut equals: BTreeMap<usize, usize> = BTreeMap::new();
        let mut max_size = 0;
        let mut max_canonical = 0;
        for i in 0..graph.len() {
            if equals.contains_key(&i) {
                continue;
            }
            for j in i + 1..graph.len() {
                if graph.subtree_equal(i, j) {
                    equals.insert(j, i);
                    if sizes[i] > max_size {
                        max_size = sizes[i];
                        max_canonical = i;
                    }
                }
            }
        }

        if equals.is_empty() {
            break;
        }

        for refs in &mut graph.refs {
            for r in refs {
                if equals.get(r) == Some(&max_canonical) {
                    *r = max_canonical;
                }
            }
        }

        let before = graph.len();
        graph = graph.compact();
        log::trace!(
            "compression pass: coalesced into {max_canonical}, {before} -> {} nodes",
            graph.len(),
        );
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Opcode;

    fn leaf(x: i32) -> Node {
        Node::variable_with(
            Atom::Op(Opcode::LayoutInput),
            vec![
                Node::constant(Atom::Op(Opcode::Float32)),
                Node::constant(Atom::Int(x)),
            ],
        )
    }

    fn binary(op: Opcode, a: Node, b: Node) -> Node {
        Node::variable_with(Atom::Op(op), vec![a, b])
    }

    /// The DAG subtree at `id`, substituted back into a tree, must match
    /// the input node structurally.
    fn matches(dag: &Dag, id: usize, gt: &Node) -> bool {
        dag.atom(id) == &gt.atom
            && dag.refs(id).len() == gt.children.len()
            && dag
                .refs(id)
                .iter()
                .zip(&gt.children)
                .all(|(&c, child)| matches(dag, c, child))
    }

    #[test]
    fn shared_subexpression_is_coalesced() {
        // a = f + g; b = (f + g) * h
        let sum = binary(Opcode::Add, leaf(0), leaf(1));
        let product = binary(Opcode::Mul, sum.clone(), leaf(2));
        let root = Node::variable_with(Atom::Op(Opcode::None), vec![sum.clone(), product]);

        let dag = compress(&root);

        // Both references to f + g resolve to the same id
        let sum_id = dag.refs(Dag::ROOT)[0];
        let product_id = dag.refs(Dag::ROOT)[1];
        assert_eq!(dag.refs(product_id)[0], sum_id);

        // Unfolding reproduces the input tree
        assert!(matches(&dag, Dag::ROOT, &root));
    }

    #[test]
    fn compression_is_maximal() {
        let sum = binary(Opcode::Add, leaf(0), leaf(1));
        let product = binary(Opcode::Mul, sum.clone(), leaf(2));
        let root = Node::variable_with(Atom::Op(Opcode::None), vec![sum, product]);

        let dag = compress(&root);
        for i in 0..dag.len() {
            for j in i + 1..dag.len() {
                assert!(!dag.subtree_equal(i, j), "ids {i} and {j} are equal");
            }
        }
    }

    #[test]
    fn equal_leaves_are_shared() {
        let root = Node::variable_with(
            Atom::Op(Opcode::None),
            vec![binary(Opcode::Add, leaf(0), leaf(1))],
        );
        let dag = compress(&root);
        assert!(matches(&dag, Dag::ROOT, &root));
        // Eight flattened nodes; the two Float32 type tags coalesce
        assert_eq!(dag.len(), 7);
    }
}
