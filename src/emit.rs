use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::compile::Error;
use crate::dag::Dag;
use crate::ir::{Atom, Comp, Opcode};

const LAYOUT_INPUT_PREFIX: &str = "_lin";
const LAYOUT_OUTPUT_PREFIX: &str = "_lout";
const TEMPORARY_PREFIX: &str = "_v";
const PUSH_CONSTANT_INSTANCE: &str = "_pc";

/// Element-type metadata for one used output binding.
///
/// The IR only carries the binding index for outputs; the element type
/// comes from the caller.
#[derive(Debug, Clone, Copy)]
pub struct OutputBinding {
    pub ty: Opcode,
    pub binding: i32,
}

/// One emitted line: a typed temporary declaration, or an untyped
/// assignment to a builtin or output name.
#[derive(Debug, Clone)]
pub struct Statement {
    ty: &'static str,
    loc: String,
    rhs: String,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ty.is_empty() {
            write!(f, "{} = {};", self.loc, self.rhs)
        } else {
            write!(f, "{} {} = {};", self.ty, self.loc, self.rhs)
        }
    }
}

/// The translated form of one DAG id: its statement type and identifier.
#[derive(Debug, Clone)]
struct Slot {
    ty: Opcode,
    name: String,
}

/// Memoizing DAG-to-statement translator.
///
/// Each id is translated at most once; later references resolve to the
/// cached identifier. The temporary counter spans the whole emission.
struct Emitter<'a> {
    dag: &'a Dag,
    statements: Vec<Statement>,
    memo: HashMap<usize, Slot>,
    generator: i32,
}

impl<'a> Emitter<'a> {
    fn new(dag: &'a Dag) -> Self {
        Self {
            dag,
            statements: Vec::new(),
            memo: HashMap::new(),
            generator: 0,
        }
    }

    fn fresh(&mut self, ty: Opcode, rhs: String) -> Result<Slot, Error> {
        let ty_name = ty.glsl_name().ok_or(Error::UnknownType(ty))?;
        let name = format!("{TEMPORARY_PREFIX}{}", self.generator);
        self.generator += 1;
        self.statements.push(Statement {
            ty: ty_name,
            loc: name.clone(),
            rhs,
        });
        Ok(Slot { ty, name })
    }

    fn assign_builtin(&mut self, loc: String, rhs: String) -> Slot {
        let slot = Slot {
            ty: Opcode::None,
            name: loc.clone(),
        };
        self.statements.push(Statement { ty: "", loc, rhs });
        slot
    }

    fn child(&self, id: usize, index: usize) -> Result<usize, Error> {
        self.dag
            .refs(id)
            .get(index)
            .copied()
            .ok_or(Error::Malformed("missing child node"))
    }

    fn int_atom(&self, id: usize) -> Result<i32, Error> {
        match *self.dag.atom(id) {
            Atom::Int(x) => Ok(x),
            _ => Err(Error::Malformed("expected integer operand")),
        }
    }

    fn op_atom(&self, id: usize) -> Result<Opcode, Error> {
        match *self.dag.atom(id) {
            Atom::Op(op) => Ok(op),
            _ => Err(Error::Malformed("expected opcode operand")),
        }
    }

    fn emit(&mut self, id: usize) -> Result<Slot, Error> {
        if let Some(slot) = self.memo.get(&id) {
            return Ok(slot.clone());
        }

        let slot = match *self.dag.atom(id) {
            Atom::Int(x) => self.fresh(Opcode::Int32, x.to_string())?,
            Atom::Float(x) => self.fresh(Opcode::Float32, format!("{x:?}"))?,
            Atom::Op(op) => self.emit_op(id, op)?,
        };
        self.memo.insert(id, slot.clone());
        Ok(slot)
    }

    fn emit_op(&mut self, id: usize, op: Opcode) -> Result<Slot, Error> {
        let dag = self.dag;
        match op {
            Opcode::None => {
                for &output in dag.refs(id) {
                    self.emit(output)?;
                }
                Ok(Slot {
                    ty: Opcode::None,
                    name: String::new(),
                })
            }
            Opcode::LayoutInput => {
                let ty = self.op_atom(self.child(id, 0)?)?;
                let binding = self.int_atom(self.child(id, 1)?)?;
                self.fresh(ty, format!("{LAYOUT_INPUT_PREFIX}{binding}"))
            }
            Opcode::PushConstants => {
                let ty = self.op_atom(self.child(id, 0)?)?;
                let member = self.int_atom(self.child(id, 1)?)?;
                self.fresh(ty, format!("{PUSH_CONSTANT_INSTANCE}.m{member}"))
            }
            Opcode::LayoutOutput => {
                let binding = self.int_atom(self.child(id, 0)?)?;
                let value = self.emit(self.child(id, 1)?)?;
                Ok(self.assign_builtin(format!("{LAYOUT_OUTPUT_PREFIX}{binding}"), value.name))
            }
            Opcode::GlPosition => {
                let value = self.emit(self.child(id, 0)?)?;
                Ok(self.assign_builtin("gl_Position".to_owned(), value.name))
            }
            Opcode::Construct => {
                let ty = self.op_atom(self.child(id, 0)?)?;
                if matches!(ty, Opcode::Float32 | Opcode::Int32) {
                    if dag.refs(id).len() != 2 {
                        return Err(Error::Malformed("scalar constructor arity"));
                    }
                    let value = self.emit(self.child(id, 1)?)?;
                    self.fresh(ty, value.name)
                } else {
                    let count = self.int_atom(self.child(id, 1)?)? as usize;
                    let refs = dag.refs(id);
                    if refs.len() != count + 2 {
                        return Err(Error::Malformed("constructor arity"));
                    }
                    let ty_name = ty.glsl_name().ok_or(Error::UnknownType(ty))?;
                    let mut args = Vec::with_capacity(count);
                    for &value in &refs[2..] {
                        args.push(self.emit(value)?.name);
                    }
                    self.fresh(ty, format!("{ty_name}({})", args.join(", ")))
                }
            }
            Opcode::Component => {
                let index = self.int_atom(self.child(id, 0)?)?;
                let comp = u8::try_from(index)
                    .ok()
                    .and_then(|i| Comp::try_from(i).ok())
                    .ok_or(Error::ComponentIndex(index))?;
                let aggregate = self.emit(self.child(id, 1)?)?;
                let scalar = aggregate
                    .ty
                    .scalar_of()
                    .ok_or(Error::UnknownType(aggregate.ty))?;
                self.fresh(scalar, format!("{}{}", aggregate.name, comp.suffix()))
            }
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => {
                let operator = match op {
                    Opcode::Add => "+",
                    Opcode::Sub => "-",
                    Opcode::Mul => "*",
                    _ => "/",
                };
                let lhs = self.emit(self.child(id, 0)?)?;
                let rhs = self.emit(self.child(id, 1)?)?;
                // The result type follows the right operand
                self.fresh(rhs.ty, format!("{} {operator} {}", lhs.name, rhs.name))
            }
            other => Err(Error::UnknownOpcode(other)),
        }
    }
}

/// Interface usage collected from the DAG.
#[derive(Debug, Default)]
struct Interface {
    /// Distinct (binding, element type) input slots
    inputs: BTreeSet<(i32, Opcode)>,
    /// Distinct output bindings
    outputs: BTreeSet<i32>,
    /// Push-constant members keyed by byte offset
    push_members: BTreeMap<i32, (i32, Opcode)>,
}

fn collect_interface(dag: &Dag) -> Result<Interface, Error> {
    let mut interface = Interface::default();
    let mut member_types: BTreeMap<i32, Opcode> = BTreeMap::new();

    for id in 0..dag.len() {
        let Atom::Op(op) = *dag.atom(id) else {
            continue;
        };
        let atom_at = |index: usize| -> Result<&Atom, Error> {
            dag.refs(id)
                .get(index)
                .map(|&c| dag.atom(c))
                .ok_or(Error::Malformed("missing child node"))
        };
        match op {
            Opcode::LayoutInput => {
                let (Atom::Op(ty), Atom::Int(binding)) = (atom_at(0)?, atom_at(1)?) else {
                    return Err(Error::Malformed("layout input operands"));
                };
                interface.inputs.insert((*binding, *ty));
            }
            Opcode::LayoutOutput => {
                let Atom::Int(binding) = atom_at(0)? else {
                    return Err(Error::Malformed("layout output binding"));
                };
                interface.outputs.insert(*binding);
            }
            Opcode::PushConstants => {
                let (Atom::Op(ty), Atom::Int(member), Atom::Int(offset)) =
                    (atom_at(0)?, atom_at(1)?, atom_at(2)?)
                else {
                    return Err(Error::Malformed("push constant operands"));
                };
                let (ty, member, offset) = (*ty, *member, *offset);
                if *member_types.entry(member).or_insert(ty) != ty {
                    return Err(Error::PushConstantConflict { member, offset });
                }
                if *interface.push_members.entry(offset).or_insert((member, ty)) != (member, ty) {
                    return Err(Error::PushConstantConflict { member, offset });
                }
            }
            _ => {}
        }
    }

    Ok(interface)
}

/// Assembles the full shader source: version header, interface
/// declarations, then the translated body.
pub fn generate(dag: &Dag, outputs: &[OutputBinding]) -> Result<String, Error> {
    if dag.is_empty() || *dag.atom(Dag::ROOT) != Atom::Op(Opcode::None) {
        return Err(Error::Malformed("root is not the output sentinel"));
    }

    let meta: BTreeMap<i32, Opcode> = outputs.iter().map(|o| (o.binding, o.ty)).collect();
    let interface = collect_interface(dag)?;

    let mut code = String::from("#version 450\n");
    for &(binding, ty) in &interface.inputs {
        let ty_name = ty.glsl_name().ok_or(Error::UnknownType(ty))?;
        code.push_str(&format!(
            "layout (location = {binding}) in {ty_name} {LAYOUT_INPUT_PREFIX}{binding};\n"
        ));
    }
    for &binding in &interface.outputs {
        let ty = *meta
            .get(&binding)
            .ok_or(Error::MissingOutputType(binding))?;
        let ty_name = ty.glsl_name().ok_or(Error::UnknownType(ty))?;
        code.push_str(&format!(
            "layout (location = {binding}) out {ty_name} {LAYOUT_OUTPUT_PREFIX}{binding};\n"
        ));
    }
    if !interface.push_members.is_empty() {
        code.push_str("layout (push_constant) uniform PushConstants {\n");
        let mut running = 0;
        for (&offset, &(member, ty)) in &interface.push_members {
            if offset < running {
                return Err(Error::PushConstantConflict { member, offset });
            }
            if offset > running {
                let gap = offset - running;
                code.push_str(&format!("  float _off{running}[{}];\n", gap / 4));
            }
            let ty_name = ty.glsl_name().ok_or(Error::UnknownType(ty))?;
            code.push_str(&format!("  {ty_name} m{member};\n"));
            running = offset + ty.gpu_size().ok_or(Error::UnknownType(ty))?;
        }
        code.push_str(&format!("}} {PUSH_CONSTANT_INSTANCE};\n"));
    }

    code.push_str("void main() {\n");
    let mut emitter = Emitter::new(dag);
    emitter.emit(Dag::ROOT)?;
    for statement in &emitter.statements {
        code.push_str(&format!("  {statement}\n"));
    }
    code.push_str("}\n");

    Ok(code)
}
