//! Read-only dump of machine state, mainly for `mbf-run --dump-state`.

use crate::processor::Processor;
use crate::scheduler::MachineConfig;
use crate::tape::CellValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorSnapshot {
    pub id: usize,
    pub program: String,
    pub instruction_pointer: usize,
    pub data_pointer: usize,
    pub finished: bool,
    #[serde(default)]
    pub tape: Vec<CellValue>,
}

impl ProcessorSnapshot {
    pub fn capture(processor: &Processor) -> Self {
        Self {
            id: processor.id(),
            program: processor.program().to_string(),
            instruction_pointer: processor.instruction_pointer(),
            data_pointer: processor.data_pointer(),
            finished: processor.is_finished(),
            tape: processor.tape().cells().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub config: MachineConfig,
    pub ticks: u64,
    pub processors: Vec<ProcessorSnapshot>,
}
