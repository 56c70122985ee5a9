//! Structural checks on a function's branch-target graph.
//!
//! The blocks of a function form a tree rooted at `Main`: every block
//! other than `Main` is the target of at most one branch or loop
//! instruction, targets carry the tag the referencing instruction
//! demands, and no walk along targets ever revisits a block. The stack
//! and initialization checks in [`validate`](super::validate) rely on
//! this shape and must run after it.

use ingot_core::{BlockId, ValidateError};
use log::trace;
use rustc_hash::FxHashMap;

use crate::instr::{BlockTag, Function, Instr};
use crate::module::Module;
use crate::pass::FunctionPass;

/// [`FunctionPass`] wrapper around [`check_function`].
#[derive(Debug, Default)]
pub struct ControlFlowPass;

impl FunctionPass for ControlFlowPass {
    type Error = ValidateError;

    fn visit_function(&mut self, _module: &Module, function: &Function) -> Result<(), ValidateError> {
        check_function(function)
    }
}

/// Check target ranges, tags, the single-parent rule and acyclicity.
pub fn check_function(function: &Function) -> Result<(), ValidateError> {
    trace!(
        "control-flow check for '{}' ({} blocks)",
        function.name(),
        function.block_count()
    );

    // The entry is the one and only Main block.
    for block in function.blocks() {
        let is_main = block.tag() == BlockTag::Main;
        if is_main != block.id().is_entry() {
            return Err(ValidateError::TagMismatch {
                block: block.id(),
                expected: if is_main { "ifelse or loop" } else { "main" },
            });
        }
    }

    let mut parents: FxHashMap<BlockId, BlockId> = FxHashMap::default();
    for block in function.blocks() {
        for (idx, instr) in block.instrs().iter().enumerate() {
            for &(target, expected_tag) in targets_of(instr).iter().flatten() {
                let Some(target_block) = function.block(target) else {
                    return Err(ValidateError::IndexOutOfRange {
                        block: block.id(),
                        instr: idx,
                        what: "block",
                    });
                };
                if target_block.tag() != expected_tag {
                    return Err(ValidateError::TagMismatch {
                        block: target,
                        expected: expected_tag.name(),
                    });
                }
                if let Some(&parent) = parents.get(&target) {
                    return Err(ValidateError::MultipleParents {
                        block: target,
                        parent,
                        other_parent: block.id(),
                    });
                }
                parents.insert(target, block.id());
            }
        }
    }

    check_acyclic(function)
}

/// The blocks an instruction transfers into, with the tag each must carry.
fn targets_of(instr: &Instr) -> [Option<(BlockId, BlockTag)>; 2] {
    match *instr {
        Instr::If { then_block } => [Some((then_block, BlockTag::IfElse)), None],
        Instr::IfElse {
            then_block,
            else_block,
        } => [
            Some((then_block, BlockTag::IfElse)),
            Some((else_block, BlockTag::IfElse)),
        ],
        Instr::Loop(body) => [Some((body, BlockTag::Loop)), None],
        _ => [None, None],
    }
}

/// Depth-first walk over every block; a gray child is a cycle.
fn check_acyclic(function: &Function) -> Result<(), ValidateError> {
    const WHITE: u8 = 0;
    const GRAY: u8 = 1;
    const BLACK: u8 = 2;

    let children: Vec<Vec<usize>> = function
        .blocks()
        .map(|block| {
            block
                .instrs()
                .iter()
                .flat_map(|i| targets_of(i).into_iter().flatten())
                .map(|(id, _)| id.index() as usize)
                .collect()
        })
        .collect();

    let mut color = vec![WHITE; children.len()];
    for root in 0..children.len() {
        if color[root] != WHITE {
            continue;
        }
        // (block index, next child to expand)
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        color[root] = GRAY;
        while let Some((node, next)) = stack.pop() {
            if next < children[node].len() {
                let child = children[node][next];
                stack.push((node, next + 1));
                match color[child] {
                    GRAY => {
                        return Err(ValidateError::BlockCycle {
                            block: BlockId::new(child as u32),
                        });
                    }
                    WHITE => {
                        color[child] = GRAY;
                        stack.push((child, 0));
                    }
                    _ => {}
                }
            } else {
                color[node] = BLACK;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FunctionBuilder;
    use ingot_core::IngotError;

    fn void_builder(module: &mut Module) -> FunctionBuilder {
        let sig = module.func_type(vec![], vec![]);
        FunctionBuilder::new("f", sig, module).unwrap()
    }

    #[test]
    fn if_target_must_carry_if_else_tag() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let mut b = void_builder(&mut module);

        let body = b.new_block(vec![], BlockTag::Loop);
        b.ld_int(1, i32t);
        b.if_(body);

        let err = b.finish(&mut module).unwrap_err();
        assert!(matches!(
            err,
            IngotError::Validate(ValidateError::TagMismatch { expected: "ifelse", .. })
        ));
    }

    #[test]
    fn target_out_of_range() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let mut b = void_builder(&mut module);

        b.ld_int(1, i32t);
        b.if_(BlockId::new(9));

        let err = b.finish(&mut module).unwrap_err();
        assert!(matches!(
            err,
            IngotError::Validate(ValidateError::IndexOutOfRange { what: "block", .. })
        ));
    }

    #[test]
    fn block_may_have_only_one_parent() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let mut b = void_builder(&mut module);

        let shared = b.new_block(vec![], BlockTag::IfElse);
        let other = b.new_block(vec![], BlockTag::IfElse);
        b.switch_block(shared).unwrap();
        b.ret();
        b.switch_block(other).unwrap();
        b.ld_int(1, i32t);
        b.if_(shared);
        b.switch_block(BlockId::entry()).unwrap();
        b.ld_int(1, i32t);
        b.if_else(shared, other);

        let err = b.finish(&mut module).unwrap_err();
        assert!(matches!(
            err,
            IngotError::Validate(ValidateError::MultipleParents { .. })
        ));
    }

    #[test]
    fn detached_target_ring_is_a_cycle() {
        let mut module = Module::new();
        let mut b = void_builder(&mut module);

        let a = b.new_block(vec![], BlockTag::Loop);
        let c = b.new_block(vec![], BlockTag::Loop);
        b.switch_block(a).unwrap();
        b.loop_(c);
        b.switch_block(c).unwrap();
        b.loop_(a);
        b.switch_block(BlockId::entry()).unwrap();
        b.ret();

        let err = b.finish(&mut module).unwrap_err();
        assert!(matches!(
            err,
            IngotError::Validate(ValidateError::BlockCycle { .. })
        ));
    }

    #[test]
    fn straight_line_structure_passes() {
        let mut module = Module::new();
        let i32t = module.int32t();
        let mut b = void_builder(&mut module);

        let then = b.new_block(vec![], BlockTag::IfElse);
        b.switch_block(then).unwrap();
        b.ret();
        b.switch_block(BlockId::entry()).unwrap();
        b.ld_int(1, i32t);
        b.if_(then);

        b.finish(&mut module).unwrap();
    }
}
