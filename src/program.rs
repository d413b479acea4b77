use crate::{Error, Result};
use std::fmt;

/// One of the eight instruction characters. Everything else in a source
/// text is a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Increment,
    Decrement,
    Left,
    Right,
    LoopStart,
    LoopEnd,
    Output,
    Input,
}

impl Op {
    pub fn from_char(ch: char) -> Option<Self> {
        Some(match ch {
            '+' => Op::Increment,
            '-' => Op::Decrement,
            '<' => Op::Left,
            '>' => Op::Right,
            '[' => Op::LoopStart,
            ']' => Op::LoopEnd,
            '.' => Op::Output,
            ',' => Op::Input,
            _ => return None,
        })
    }

    pub fn as_char(self) -> char {
        match self {
            Op::Increment => '+',
            Op::Decrement => '-',
            Op::Left => '<',
            Op::Right => '>',
            Op::LoopStart => '[',
            Op::LoopEnd => ']',
            Op::Output => '.',
            Op::Input => ',',
        }
    }
}

/// Immutable instruction sequence executed by one processor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    ops: Vec<Op>,
}

impl Program {
    /// Keeps only the instruction characters of `source`.
    pub fn parse(source: &str) -> Self {
        source.chars().filter_map(Op::from_char).collect()
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Op> {
        self.ops.get(index).copied()
    }
}

impl FromIterator<Op> for Program {
    fn from_iter<T: IntoIterator<Item = Op>>(iter: T) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.ops
            .iter()
            .try_for_each(|op| write!(f, "{}", op.as_char()))
    }
}

/// Deals the instructions of `source` out to `processors` subprograms in
/// round-robin order. Comment characters do not advance the slot.
pub fn partition(source: &str, processors: usize) -> Result<Vec<Program>> {
    if processors == 0 {
        return Err(Error::InvalidConfiguration(
            "processor count must be at least 1".into(),
        ));
    }
    let mut parts = vec![Vec::new(); processors];
    let mut slot = 0;
    for op in source.chars().filter_map(Op::from_char) {
        parts[slot].push(op);
        slot = (slot + 1) % processors;
    }
    Ok(parts.into_iter().map(|ops| Program { ops }).collect())
}

/// Precomputed bracket partners for a program.
///
/// Brackets without a partner map to `None`; callers fault when such a
/// bracket is executed rather than at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpTable {
    targets: Vec<Option<usize>>,
}

impl JumpTable {
    pub fn build(program: &Program) -> Self {
        let mut targets = vec![None; program.len()];
        let mut open = Vec::new();
        for (index, op) in program.ops().iter().enumerate() {
            match op {
                Op::LoopStart => open.push(index),
                Op::LoopEnd => {
                    if let Some(start) = open.pop() {
                        targets[start] = Some(index);
                        targets[index] = Some(start);
                    }
                }
                _ => {}
            }
        }
        Self { targets }
    }

    pub fn partner(&self, index: usize) -> Option<usize> {
        self.targets.get(index).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_strips_comments() {
        let program = Program::parse("a+b-c <x> [y] .z, \n");
        assert_eq!(program.to_string(), "+-<>[].,");
        assert_eq!(program.len(), 8);
    }

    #[test]
    fn partition_deals_round_robin() {
        let parts = partition("+>+.<.", 2).unwrap();
        assert_eq!(parts[0].to_string(), "++<");
        assert_eq!(parts[1].to_string(), ">..");
    }

    #[test]
    fn partition_skips_comments_without_advancing_slot() {
        let parts = partition("+ hello - world >", 3).unwrap();
        assert_eq!(parts[0].to_string(), "+");
        assert_eq!(parts[1].to_string(), "-");
        assert_eq!(parts[2].to_string(), ">");
    }

    #[test]
    fn partition_lengths_differ_by_at_most_one() {
        let parts = partition("++++++++++", 4).unwrap();
        let lens: Vec<usize> = parts.iter().map(Program::len).collect();
        assert_eq!(lens, vec![3, 3, 2, 2]);
    }

    #[test]
    fn partition_rejects_zero_processors() {
        assert!(matches!(
            partition("+", 0),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn more_processors_than_instructions_leaves_empty_programs() {
        let parts = partition("+-", 4).unwrap();
        assert_eq!(parts.len(), 4);
        assert!(parts[2].is_empty());
        assert!(parts[3].is_empty());
    }

    #[test]
    fn jump_table_pairs_nested_brackets() {
        let table = JumpTable::build(&Program::parse("[[]-]"));
        assert_eq!(table.partner(0), Some(4));
        assert_eq!(table.partner(4), Some(0));
        assert_eq!(table.partner(1), Some(2));
        assert_eq!(table.partner(2), Some(1));
        assert_eq!(table.partner(3), None);
    }

    #[test]
    fn jump_table_leaves_unmatched_brackets_empty() {
        let table = JumpTable::build(&Program::parse("[[]"));
        assert_eq!(table.partner(0), None);
        assert_eq!(table.partner(1), Some(2));

        let table = JumpTable::build(&Program::parse("[]]"));
        assert_eq!(table.partner(2), None);
    }
}
