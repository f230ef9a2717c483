use std::{error, fmt};

use crate::ir::{Atom, Node, Opcode};

/// Constant folder errors
#[derive(Debug, Clone)]
pub enum Error {
    Malformed(&'static str),
    Unsupported(Opcode),
    NonCanonicalArity(Opcode),
    NotVector,
    NotLiteral,
    Index(i32),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(what) => write!(f, "malformed node: {what}"),
            Self::Unsupported(op) => write!(f, "unsupported constant form `{op:?}`"),
            Self::NonCanonicalArity(op) => {
                write!(f, "constant `{op:?}` constructor with non-canonical arity")
            }
            Self::NotVector => write!(f, "aggregate does not fold to a vector constructor"),
            Self::NotLiteral => write!(f, "vector component is not a literal scalar"),
            Self::Index(i) => write!(f, "component index `{i}` out of range"),
        }
    }
}

impl error::Error for Error {}

/// Normalizes a node with respect to constant `Construct`/`Component`
/// redexes.
///
/// Non-constant nodes and literals pass through unchanged. A constant
/// scalar constructor collapses to its value child; a constant vector
/// constructor of canonical arity folds each value child; a constant
/// component access extracts the addressed scalar from the fully folded
/// aggregate.
pub fn fold(gt: Node) -> Result<Node, Error> {
    if !gt.cexpr {
        return Ok(gt);
    }

    match gt.op() {
        Some(Opcode::Construct) => fold_construct(gt),
        Some(Opcode::Component) => fold_component(gt),
        _ => Ok(gt),
    }
}

/// Folds where the caller has no way to report failure (operator sugar in
/// the surface types). A failure here is a programming error in the shader
/// body.
pub(crate) fn forced(gt: Node) -> Node {
    match fold(gt) {
        Ok(folded) => folded,
        Err(err) => panic!("constant fold failed: {err}"),
    }
}

fn fold_construct(gt: Node) -> Result<Node, Error> {
    let ty = gt
        .children
        .first()
        .and_then(Node::op)
        .ok_or(Error::Malformed("constructor missing type tag"))?;

    match ty {
        Opcode::Float32 | Opcode::Int32 => {
            let value = gt
                .children
                .into_iter()
                .nth(1)
                .ok_or(Error::Malformed("scalar constructor missing value"))?;
            fold(value)
        }
        Opcode::Vec2 | Opcode::Vec3 | Opcode::Vec4 => {
            let arity = ty.vector_arity().unwrap_or(0);
            let count = gt
                .children
                .get(1)
                .and_then(Node::as_int)
                .ok_or(Error::Malformed("vector constructor missing count"))?;
            if count != arity || gt.children.len() != arity as usize + 2 {
                return Err(Error::NonCanonicalArity(ty));
            }

            let mut children = Vec::with_capacity(gt.children.len());
            children.push(Node::constant(Atom::Op(ty)));
            children.push(Node::constant(Atom::Int(arity)));
            for value in gt.children.into_iter().skip(2) {
                children.push(fold(value)?);
            }
            Ok(Node::constant_with(Atom::Op(Opcode::Construct), children))
        }
        other => Err(Error::Unsupported(other)),
    }
}

fn fold_component(gt: Node) -> Result<Node, Error> {
    let index = gt
        .children
        .first()
        .and_then(Node::as_int)
        .ok_or(Error::Malformed("component access missing index"))?;
    let aggregate = gt
        .children
        .into_iter()
        .nth(1)
        .ok_or(Error::Malformed("component access missing aggregate"))?;

    let values = fold_vector(aggregate)?;
    let atom = values
        .into_iter()
        .nth(index as usize)
        .ok_or(Error::Index(index))?;
    Ok(Node::constant(atom))
}

/// Forces a constant aggregate into its literal scalar components.
fn fold_vector(aggregate: Node) -> Result<Vec<Atom>, Error> {
    let folded = fold(aggregate)?;
    if folded.op() != Some(Opcode::Construct) {
        return Err(Error::NotVector);
    }

    let ty = folded
        .children
        .first()
        .and_then(Node::op)
        .ok_or(Error::Malformed("constructor missing type tag"))?;
    if ty.vector_arity().is_none() {
        return Err(Error::Unsupported(ty));
    }

    folded
        .children
        .into_iter()
        .skip(2)
        .map(|value| match fold(value)?.atom {
            atom @ (Atom::Int(_) | Atom::Float(_)) => Ok(atom),
            Atom::Op(_) => Err(Error::NotLiteral),
        })
        .collect()
}
