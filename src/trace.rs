//! Snapshot of the machine state taken after each step.

use std::fmt;

use itertools::Itertools;

use crate::emulator::Flags;
use crate::instruction::REGISTER_COUNT;

/// Machine state after an instruction was processed.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    /// Index of the processed instruction.
    pub pc: usize,

    /// Source text of the processed instruction.
    pub text: String,

    /// False if the condition of the instruction did not hold.
    pub executed: bool,

    pub registers: [u32; REGISTER_COUNT],
    pub flags: Flags,

    /// Memory words in address order.
    pub memory: Vec<u32>,
}

/// Renders the trace as
///
/// ```text
/// MOV R0, #5
/// Register array:
/// R0 =0x5 R1=0x0 R2=0x0 R3=0x0 R4=0x0 R5=0x0
/// R6=0x0 R7=0x0 R8=0x0 R9=0x0 R10=0x0 R11=0x0
/// NZCV: 0000
/// ___,___,___,___,___
/// ```
impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let register = |index: usize| format!("R{}=0x{:X}", index, self.registers[index]);

        writeln!(f, "{}", self.text)?;
        writeln!(f, "Register array:")?;
        writeln!(f, "R0 =0x{:X} {}", self.registers[0], (1..6).map(register).join(" "))?;
        writeln!(f, "{}", (6..REGISTER_COUNT).map(register).join(" "))?;
        writeln!(f, "NZCV: {}", self.flags)?;

        let memory = self.memory
            .iter()
            .map(|&word| match word {
                0 => "___".to_string(),
                word => format!("0x{:X}", word),
            })
            .join(",");

        write!(f, "{}", memory)
    }
}
