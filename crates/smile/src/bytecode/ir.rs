//! The intermediate block representation the compiler emits into before
//! final address resolution.
//!
//! Rather than computing branch offsets while emitting (which would require
//! knowing a forward jump's length before its target is compiled), the
//! compiler appends [`IrOp`] pseudo-instructions to an arena-backed
//! doubly-linked list, with forward branches referring to a not-yet-placed
//! [`Label`]. Once a function body is fully compiled, [`Block::flatten`]
//! walks the list once to assign each instruction a final address, resolves
//! every label reference to a relative delta, and emits a
//! [`crate::bytecode::ByteCodeSegment`]. This mirrors the two-phase
//! emit-then-patch approach `compile_if.c`/`compile_or.c` use in the
//! original compiler (emit a placeholder branch, remember where, patch the
//! delta once the target is known) generalized to a full block list instead
//! of single backpatched offsets.

use crate::bytecode::{ByteCodeSegment, Instruction, Opcode, UnionOperand};

/// A not-yet-placed branch target. Assigned by [`Block::new_label`] and bound
/// to a concrete position by [`Block::place_label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(usize);

/// One node in the pseudo-instruction list.
#[derive(Debug, Clone)]
enum IrOp {
    Real(Instruction),
    /// A `Jmp`/`Bt`/`Bf` whose delta is not yet known.
    Branch { opcode: Opcode, target: Label },
    /// Marks the position `target` resolves to; contributes no instruction
    /// of its own.
    LabelHere(Label),
}

/// The doubly-linked (in the sense of: append-ordered, patchable) list of
/// pseudo-instructions compiled for a single function body or top-level
/// program, prior to address resolution.
#[derive(Debug, Default)]
pub struct Block {
    ops: Vec<IrOp>,
    next_label: usize,
}

impl Block {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a new label, to be bound later with [`Self::place_label`].
    pub fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    /// Appends a plain instruction with no branch target.
    pub fn emit(&mut self, opcode: Opcode, operand: UnionOperand) {
        self.ops.push(IrOp::Real(Instruction::new(opcode, operand)));
    }

    /// Appends a branch (`Jmp`/`Bt`/`Bf`/`Catch`) to `target`, whose final
    /// address may not be known yet. `Catch`'s "branch" is its handler
    /// address rather than an unconditional jump, but it resolves to a
    /// `BranchDelta` operand the same way.
    pub fn emit_branch(&mut self, opcode: Opcode, target: Label) {
        debug_assert!(matches!(opcode, Opcode::Jmp | Opcode::Bt | Opcode::Bf | Opcode::Catch));
        self.ops.push(IrOp::Branch { opcode, target });
    }

    /// Binds `label` to the current end of the instruction list — the next
    /// real instruction emitted becomes the label's target.
    pub fn place_label(&mut self, label: Label) {
        self.ops.push(IrOp::LabelHere(label));
    }

    /// Flattens the pseudo-instruction list into a final, address-resolved
    /// [`ByteCodeSegment`], replacing every [`IrOp::Branch`] with a concrete
    /// relative delta (target instruction index minus the index of the
    /// instruction following the branch, i.e. `D` such that `A + 1 + D == T`)
    /// and dropping [`IrOp::LabelHere`] markers entirely.
    #[must_use]
    pub fn flatten(self) -> ByteCodeSegment {
        // Pass 1: compute the final instruction index each label resolves to.
        let mut label_addresses = vec![0usize; self.next_label];
        let mut addr = 0usize;
        for op in &self.ops {
            match op {
                IrOp::Real(_) | IrOp::Branch { .. } => addr += 1,
                IrOp::LabelHere(Label(id)) => label_addresses[*id] = addr,
            }
        }

        // Pass 2: emit real instructions, resolving branch deltas relative to
        // the instruction following the branch (the address the interpreter
        // has already advanced `pc` past by the time it applies the delta).
        let mut instructions = Vec::with_capacity(addr);
        for op in self.ops {
            match op {
                IrOp::Real(instr) => instructions.push(instr),
                IrOp::Branch { opcode, target: Label(id) } => {
                    let from = instructions.len() as i64;
                    let to = label_addresses[id] as i64;
                    let delta = i32::try_from(to - (from + 1)).expect("branch delta fits i32");
                    instructions.push(Instruction::new(opcode, UnionOperand::BranchDelta(delta)));
                }
                IrOp::LabelHere(_) => {}
            }
        }
        ByteCodeSegment { instructions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_branch_resolves_to_positive_delta_past_skipped_instructions() {
        let mut block = Block::new();
        let end = block.new_label();
        block.emit_branch(Opcode::Bf, end);
        block.emit(Opcode::LdInt, UnionOperand::Int(1));
        block.place_label(end);
        block.emit(Opcode::Pop, UnionOperand::None);

        let code = block.flatten();
        assert_eq!(code.instructions.len(), 3);
        match code.instructions[0].operand {
            UnionOperand::BranchDelta(delta) => assert_eq!(delta, 1),
            other => panic!("expected BranchDelta, got {other:?}"),
        }
    }

    #[test]
    fn backward_branch_resolves_to_negative_delta() {
        let mut block = Block::new();
        let top = block.new_label();
        block.place_label(top);
        block.emit(Opcode::Nop, UnionOperand::None);
        block.emit_branch(Opcode::Jmp, top);

        let code = block.flatten();
        match code.instructions[1].operand {
            UnionOperand::BranchDelta(delta) => assert_eq!(delta, -2),
            other => panic!("expected BranchDelta, got {other:?}"),
        }
    }
}
