//! [Emulator] for executing decoded [programs](crate::symbolic::Program).

use std::fmt;

use slog::{debug, o, trace, Discard, Logger};

use crate::error::{MemoryError, MemoryErrorKind};
use crate::event::{Event, EventDispatcher, EventListener};
use crate::instruction::{Condition, Instruction, OpCode, Register, REGISTER_COUNT};
use crate::operand::Operand;
use crate::symbolic::{LabelTable, Program};
use crate::trace::Trace;

/// Byte address of the first memory word.
pub const MEMORY_BASE: u32 = 0x100;

/// Number of memory words.
pub const MEMORY_SLOTS: usize = 5;

/// Size of a memory word in bytes.
pub const WORD_SIZE: u32 = 4;

/// Contains the execution environment of the processor.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// The Program Counter stores the index of the next instruction to be executed.
    pub pc: usize,

    /// Array containing values for all the twelve work registers.
    pub r: [u32; REGISTER_COUNT],

    /// The condition flags.
    pub flags: Flags,
}

/// The N, Z, C and V condition flags.
///
/// Updated by `CMP` and by instructions with the `S` suffix, read by every instruction with a
/// condition code suffix.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Flags {
    pub negative: bool,
    pub zero: bool,
    pub carry: bool,
    pub overflow: bool,
}

impl Flags {
    fn set_nz(&mut self, result: u32) {
        self.negative = result >> 31 == 1;
        self.zero = result == 0;
    }

    fn set_add(&mut self, a: u32, b: u32, result: u32) {
        self.set_nz(result);
        self.carry = (a as u64 + b as u64) >> 32 != 0;
        self.overflow = ((a ^ result) & (b ^ result)) >> 31 == 1;
    }

    fn set_sub(&mut self, a: u32, b: u32, result: u32) {
        self.set_nz(result);
        self.carry = a >= b;
        self.overflow = ((a ^ b) & (a ^ result)) >> 31 == 1;
    }

    /// Evaluates a condition against the flags. A missing condition always holds and an
    /// unknown one never does.
    pub fn holds(&self, condition: Option<&Condition>) -> bool {
        let condition = match condition {
            None => return true,
            Some(condition) => condition,
        };

        match condition {
            Condition::Equal => self.zero,
            Condition::NotEqual => !self.zero,
            Condition::Greater => !self.zero && self.negative == self.overflow,
            Condition::GreaterOrEqual => self.negative == self.overflow,
            Condition::Less => self.negative != self.overflow,
            Condition::LessOrEqual => self.zero || self.negative != self.overflow,
            Condition::Other(_) => false,
        }
    }

    /// Flags packed as `0bNZCV`.
    pub fn as_bits(&self) -> u8 {
        let mut bits = 0;

        if self.negative {
            bits |= 1 << 3;
        }

        if self.zero {
            bits |= 1 << 2;
        }

        if self.carry {
            bits |= 1 << 1;
        }

        if self.overflow {
            bits |= 1 << 0;
        }

        bits
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04b}", self.as_bits())
    }
}

/// Trait for implementing the data memory of the processor.
pub trait Memory {
    /// Error type returned by all methods of this trait.
    type Error;

    /// Fetch the data word at the specified byte address.
    fn get_data(&self, addr: u32) -> Result<u32, Self::Error>;

    /// Overwrite the data word at the specified byte address.
    fn set_data(&mut self, addr: u32, data: u32) -> Result<(), Self::Error>;

    /// All data words in address order.
    fn words(&self) -> Vec<u32>;

    /// Sets every word to zero.
    fn clear(&mut self);
}

/// A window of consecutive words starting at a base byte address.
///
/// An address is valid if it is at or above the base, a whole number of words away from it and
/// inside the window.
#[derive(Debug, Clone)]
pub struct WordMemory {
    base: u32,
    words: Vec<u32>,
}

impl WordMemory {
    pub fn new(base: u32, slots: usize) -> WordMemory {
        WordMemory {
            base,
            words: vec![0; slots],
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    /// Byte address of the word in `slot`.
    pub fn address_of(&self, slot: usize) -> u32 {
        self.base + slot as u32 * WORD_SIZE
    }

    /// Converts a byte address into the index of a word.
    pub fn slot_index(&self, address: u32) -> Result<usize, MemoryError> {
        let error = |kind| MemoryError { address, kind };

        if address < self.base {
            return Err(error(MemoryErrorKind::BelowBase));
        }

        let offset = address - self.base;

        if offset % WORD_SIZE != 0 {
            return Err(error(MemoryErrorKind::Unaligned));
        }

        let slot = (offset / WORD_SIZE) as usize;

        if slot >= self.words.len() {
            return Err(error(MemoryErrorKind::OutOfRange));
        }

        Ok(slot)
    }
}

impl Default for WordMemory {
    fn default() -> WordMemory {
        WordMemory::new(MEMORY_BASE, MEMORY_SLOTS)
    }
}

impl Memory for WordMemory {
    type Error = MemoryError;

    fn get_data(&self, addr: u32) -> Result<u32, MemoryError> {
        self.slot_index(addr).map(|slot| self.words[slot])
    }

    fn set_data(&mut self, addr: u32, data: u32) -> Result<(), MemoryError> {
        let slot = self.slot_index(addr)?;
        self.words[slot] = data;
        Ok(())
    }

    fn words(&self) -> Vec<u32> {
        self.words.clone()
    }

    fn clear(&mut self) {
        for word in &mut self.words {
            *word = 0;
        }
    }
}

/// Utility struct for implementing methods in the context of emulating a single instruction.
struct InstructionEmulationContext<'e, M> {
    context: &'e mut Context,
    memory: &'e mut M,
    labels: &'e LabelTable,
    events: &'e mut EventDispatcher,
    logger: &'e Logger,

    /// The instruction that we are currently emulating.
    instruction: &'e Instruction,
}

impl<'e, M> InstructionEmulationContext<'e, M>
    where M: Memory,
          M::Error: fmt::Display,
{
    /// Parses the operand at `index`. A missing operand reads like an empty token.
    fn operand(&self, index: usize) -> Operand {
        Operand::parse(self.instruction.operand(index).unwrap_or(""))
    }

    /// Resolves the operand at `index` into a value.
    fn value(&self, index: usize) -> u32 {
        match self.operand(index) {
            Operand::Register(register) => self.context.r[register.index()],
            Operand::Immediate(value) | Operand::Literal(value) => value,
            Operand::Memory(Some(register)) => self.load(register).unwrap_or(0),
            Operand::Memory(None) => 0,
        }
    }

    /// Reads the memory word addressed by the content of `register`.
    fn load(&self, register: Register) -> Option<u32> {
        let address = self.context.r[register.index()];

        match self.memory.get_data(address) {
            Ok(data) => Some(data),
            Err(error) => {
                debug!(self.logger, "memory read ignored";
                    "instruction" => &self.instruction.text,
                    "error" => %error);
                None
            }
        }
    }

    fn store(&mut self, register: Register, data: u32) {
        let address = self.context.r[register.index()];

        match self.memory.set_data(address, data) {
            Ok(()) => self.events.dispatch(Event::MemoryChange { address, data }),
            Err(error) => {
                debug!(self.logger, "memory write ignored";
                    "instruction" => &self.instruction.text,
                    "error" => %error);
            }
        }
    }

    fn set_register(&mut self, register: Register, data: u32) {
        self.context.r[register.index()] = data;
        self.events.dispatch(Event::RegisterChange { register, data });
    }

    /// Writes the first operand if it is a register.
    fn set_destination(&mut self, data: u32) {
        match self.operand(0).register() {
            Some(register) => self.set_register(register, data),
            None => {
                debug!(self.logger, "destination is not a register, result dropped";
                    "instruction" => &self.instruction.text);
            }
        }
    }

    fn update_flags<F>(&mut self, update: F)
    where
        F: FnOnce(&mut Flags),
    {
        update(&mut self.context.flags);
        let flags = self.context.flags;
        self.events.dispatch(Event::FlagsChange { flags });
    }

    /// Computes the result of a data processing instruction and writes it to the destination.
    fn data_processing(&mut self) {
        let instruction = self.instruction;
        let a = self.value(1);
        let b = self.value(2);

        let result = match instruction.opcode {
            OpCode::Move => a,
            OpCode::MoveNot => !a,
            OpCode::Add => a.wrapping_add(b),
            OpCode::Subtract => a.wrapping_sub(b),
            OpCode::And => a & b,
            OpCode::Or => a | b,
            OpCode::Xor => a ^ b,
            OpCode::ShiftLeft => a.checked_shl(b).unwrap_or(0),
            OpCode::ShiftRight => a.checked_shr(b).unwrap_or(0),
            _ => return,
        };

        if instruction.set_flags {
            self.update_flags(|flags| match instruction.opcode {
                OpCode::Add => flags.set_add(a, b, result),
                OpCode::Subtract => flags.set_sub(a, b, result),
                _ => flags.set_nz(result),
            });
        }

        self.set_destination(result);
    }

    /// Execute the instruction. Does not touch the program counter.
    fn emulate(&mut self) {
        match self.instruction.opcode {
            OpCode::Compare => {
                let a = self.value(0);
                let b = self.value(1);
                self.update_flags(|f| f.set_sub(a, b, a.wrapping_sub(b)));
            },

            OpCode::Load => {
                let destination = self.operand(0).register();
                let data = self.operand(1).address_register().and_then(|r| self.load(r));

                if let (Some(destination), Some(data)) = (destination, data) {
                    self.set_register(destination, data);
                }
            },

            OpCode::Store => {
                let source = self.operand(0).register();
                let address = self.operand(1).address_register();

                if let (Some(source), Some(address)) = (source, address) {
                    let data = self.context.r[source.index()];
                    self.store(address, data);
                }
            },

            OpCode::Branch | OpCode::Unrecognized(_) => (),

            _ => self.data_processing(),
        }
    }

    /// Looks up the branch target.
    ///
    /// # Returns
    /// The index of the target instruction, or `None` if the label is not defined.
    fn branch_destination(&mut self) -> Option<usize> {
        let label = self.instruction.branch_target.as_ref()?;

        match self.labels.get(label) {
            Some(to) => {
                self.events.dispatch(Event::Branch {
                    from: self.context.pc,
                    to,
                    label: label.clone(),
                });

                Some(to)
            },
            None => {
                debug!(self.logger, "branch target not defined, falling through"; "label" => label);
                None
            },
        }
    }

    fn snapshot(&self, executed: bool) -> Trace {
        Trace {
            pc: self.context.pc,
            text: self.instruction.text.clone(),
            executed,
            registers: self.context.r,
            flags: self.context.flags,
            memory: self.memory.words(),
        }
    }

    fn publish(&mut self, trace: &Trace) {
        if !self.events.is_empty() {
            self.events.dispatch(Event::Step(trace.clone()));
        }
    }
}

/// The emulator contains the decoded program, the machine state and the registered event
/// listeners.
pub struct Emulator<Mem = WordMemory> {
    /// The program being executed.
    pub program: Program,

    /// The data memory of the emulated machine. Implements [Memory].
    pub memory: Mem,

    /// The execution context, which includes the registers and flags of the CPU.
    pub context: Context,

    dispatcher: EventDispatcher,
    logger: Logger,
}

impl Emulator<WordMemory> {
    /// Create a new emulator with the default memory window.
    pub fn load(program: Program) -> Emulator<WordMemory> {
        Emulator::new(program, WordMemory::default())
    }
}

impl<Mem> Emulator<Mem>
    where Mem: Memory,
          Mem::Error: fmt::Display,
{
    /// Create a new emulator.
    ///
    /// # Parameters
    /// - `program`: The decoded program.
    /// - `memory`: A [Memory](Memory) object for the data words.
    pub fn new(program: Program, memory: Mem) -> Emulator<Mem> {
        Emulator::with_logger(program, memory, None)
    }

    pub fn with_logger<L>(program: Program, memory: Mem, logger: L) -> Emulator<Mem>
    where
        L: Into<Option<Logger>>,
    {
        let mut emulator = Emulator {
            program,
            memory,
            context: Context::default(),
            dispatcher: EventDispatcher::new(),
            logger: Logger::root(Discard, o!()),
        };

        emulator.set_logger(logger);
        emulator
    }

    pub fn set_logger<L>(&mut self, logger: L)
    where
        L: Into<Option<Logger>>,
    {
        self.logger = logger
            .into()
            .unwrap_or(Logger::root(Discard, o!()))
            .new(o!("stage" => "execute"));
    }

    pub fn add_listener<L: EventListener + 'static>(&mut self, listener: L) {
        self.dispatcher.add_listener(listener);
    }

    /// True once the program counter has left the program.
    pub fn halted(&self) -> bool {
        self.context.pc >= self.program.len()
    }

    /// The instruction pointed to by the Program Counter.
    pub fn current_instruction(&self) -> Option<&Instruction> {
        self.program.get(self.context.pc)
    }

    /// Executes the instruction pointed to by the Program Counter and moves the counter to
    /// the next instruction or to the branch target.
    ///
    /// # Returns
    /// The machine state after the instruction, or `None` if the machine has halted.
    pub fn step(&mut self) -> Option<Trace> {
        let pc = self.context.pc;

        let Emulator { program, memory, context, dispatcher, logger } = self;
        let instruction = program.get(pc)?;
        let executed = context.flags.holds(instruction.condition.as_ref());

        trace!(logger, "step";
            "pc" => pc,
            "opcode" => %instruction.opcode,
            "executed" => executed);

        let mut ctx = InstructionEmulationContext {
            context,
            memory,
            labels: &program.labels,
            events: dispatcher,
            logger,
            instruction,
        };

        if instruction.opcode == OpCode::Branch {
            let trace = ctx.snapshot(executed);
            ctx.publish(&trace);

            let next = match executed {
                true => ctx.branch_destination(),
                false => None,
            };

            ctx.context.pc = next.unwrap_or(pc + 1);
            return Some(trace);
        }

        if executed {
            ctx.emulate();
        } else {
            debug!(ctx.logger, "condition does not hold, skipped"; "pc" => pc);
        }

        let trace = ctx.snapshot(executed);
        ctx.publish(&trace);
        ctx.context.pc = pc + 1;

        Some(trace)
    }

    /// Executes the program until the Program Counter leaves it. Does not return if the
    /// program loops forever.
    ///
    /// # Returns
    /// The number of executed steps.
    pub fn run(&mut self) -> usize {
        let mut steps = 0;

        while self.step().is_some() {
            steps += 1;
        }

        steps
    }

    /// Like [run](Emulator::run) but stops after `max_steps` steps.
    pub fn run_for(&mut self, max_steps: usize) -> usize {
        let mut steps = 0;

        while steps < max_steps && self.step().is_some() {
            steps += 1;
        }

        steps
    }

    /// Clears the registers, flags and memory and moves back to the first instruction.
    pub fn reset(&mut self) {
        self.context = Context::default();
        self.memory.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Rc;

    macro_rules! assert_register {
        ($emulator:expr, $register:expr, $value:expr) => {{
            let value: u32 = $value;
            assert_eq!($emulator.context.r[$register], value, "Register {} != {:#X}", $register, value);
        }};
    }

    fn run(source: &str) -> Emulator {
        let mut emulator = Emulator::load(Program::parse(source));
        emulator.run();
        emulator
    }

    fn flags(bits: u8) -> Flags {
        Flags {
            negative: bits & 0b1000 != 0,
            zero: bits & 0b0100 != 0,
            carry: bits & 0b0010 != 0,
            overflow: bits & 0b0001 != 0,
        }
    }

    #[test]
    fn test_move_wraps_immediate() {
        let emulator = run("MOV R3, #4294967301\nMOV R11, #0xFFFFFFFF\nMOV r4, R3");

        assert_register!(emulator, 3, 5);
        assert_register!(emulator, 11, 0xFFFF_FFFF);
        assert_register!(emulator, 4, 5);
        assert_eq!(emulator.context.flags, Flags::default());
    }

    #[test]
    fn test_move_not() {
        let emulator = run("MVN R0, #0\nMVNS R1, #0xFFFFFFFF");

        assert_register!(emulator, 0, 0xFFFF_FFFF);
        assert_register!(emulator, 1, 0);
        assert_eq!(emulator.context.flags, flags(0b0100));
    }

    #[test]
    fn test_add_overflow_flags() {
        let emulator = run("MOV R0, #0x7FFFFFFF\nADDS R1, R0, #1");

        assert_register!(emulator, 1, 0x8000_0000);
        assert_eq!(emulator.context.flags, flags(0b1001));
    }

    #[test]
    fn test_add_carry_flags() {
        let emulator = run("MOV R0, #0xFFFFFFFF\nMOV R1, #1\nADDS R2, R0, R1");

        assert_register!(emulator, 2, 0);
        assert_eq!(emulator.context.flags, flags(0b0110));
    }

    #[test]
    fn test_add_without_suffix_keeps_flags() {
        let emulator = run("MOV R0, #0xFFFFFFFF\nADD R1, R0, #1");

        assert_register!(emulator, 1, 0);
        assert_eq!(emulator.context.flags, Flags::default());
    }

    #[test]
    fn test_sub_flags() {
        let emulator = run("MOV R0, #1\nSUBS R1, R0, #2");
        assert_register!(emulator, 1, 0xFFFF_FFFF);
        assert_eq!(emulator.context.flags, flags(0b1000));

        let emulator = run("MOV R0, #0x80000000\nSUBS R1, R0, #1");
        assert_register!(emulator, 1, 0x7FFF_FFFF);
        assert_eq!(emulator.context.flags, flags(0b0011));

        let emulator = run("MOV R0, #9\nSUBS R1, R0, #9");
        assert_eq!(emulator.context.flags, flags(0b0110));
    }

    #[test]
    fn test_compare_keeps_registers() {
        let emulator = run("MOV R0, #7\nMOV R1, #9\nCMP R0, R1");

        assert_register!(emulator, 0, 7);
        assert_register!(emulator, 1, 9);
        assert_eq!(emulator.context.flags, flags(0b1000));

        let emulator = run("MOV R0, #7\nMOV R1, #9\nCMPS R1, R0");
        assert_register!(emulator, 0, 7);
        assert_register!(emulator, 1, 9);
        assert_eq!(emulator.context.flags, flags(0b0010));
    }

    #[test]
    fn test_logic() {
        let emulator = run("MOV R0, #0xC\nAND R1, R0, #0xA\nORR R2, R0, #3\nEOR R3, R0, #0xF\nANDS R4, R0, #3");

        assert_register!(emulator, 1, 0x8);
        assert_register!(emulator, 2, 0xF);
        assert_register!(emulator, 3, 0x3);
        assert_register!(emulator, 4, 0);
        assert_eq!(emulator.context.flags, flags(0b0100));
    }

    #[test]
    fn test_logic_keeps_carry_and_overflow() {
        let emulator = run("MOV R0, #0x7FFFFFFF\nADDS R1, R0, R0\nORRS R2, R1, #0");

        assert_eq!(emulator.context.flags, flags(0b1001));
    }

    #[test]
    fn test_shifts() {
        let emulator = run("MOV R0, #1\nMOV R5, #3\nLSL R1, R0, #4\nLSR R2, R1, 2\nLSL R3, R0, R5\nLSLS R4, R0, #32\nLSR R6, R1, #0x21");

        assert_register!(emulator, 1, 0x10);
        assert_register!(emulator, 2, 0x4);
        assert_register!(emulator, 3, 0x8);
        assert_register!(emulator, 4, 0);
        assert_register!(emulator, 6, 0);
        assert_eq!(emulator.context.flags, flags(0b0100));
    }

    #[test]
    fn test_memory_round_trip() {
        let emulator = run("MOV R1, #0x100\nMOV R0, #42\nSTR R0, [R1]\nLDR R2, [R1]\nMOV R3, #0x110\nSTR R0, [ R3 ]");

        assert_register!(emulator, 2, 42);
        assert_eq!(emulator.memory.words(), vec![42, 0, 0, 0, 42]);
    }

    #[test]
    fn test_memory_operand_in_data_processing() {
        let emulator = run("MOV R1, #0x104\nMOV R0, #5\nSTR R0, [R1]\nADD R2, R0, [R1]\nMOV R3, [R0]");

        assert_register!(emulator, 2, 10);
        assert_register!(emulator, 3, 0);
    }

    #[test]
    fn test_invalid_address_is_ignored() {
        for address in &["#0x102", "#0xFC", "#0x114", "#0"] {
            let source = format!("MOV R1, {}\nMOV R0, #1\nMOV R3, #7\nSTR R0, [R1]\nLDR R3, [R1]", address);
            let emulator = run(&source);

            assert_register!(emulator, 3, 7);
            assert_eq!(emulator.memory.words(), vec![0; MEMORY_SLOTS]);
        }
    }

    #[test]
    fn test_load_store_need_memory_operand() {
        let emulator = run("MOV R1, #0x100\nMOV R0, #3\nSTR R0, R1\nSTR #3, [R1]\nLDR R2, R1");

        assert_register!(emulator, 2, 0);
        assert_eq!(emulator.memory.words(), vec![0; MEMORY_SLOTS]);
    }

    #[test]
    fn test_conditional_skip() {
        let mut emulator = Emulator::load(Program::parse("MOV R0, #1\nCMP R0, #2\nMOVEQ R0, #9\nADDSNE R1, R0, #1"));

        emulator.step();
        emulator.step();
        let flags_before = emulator.context.flags;

        let trace = emulator.step().expect("program ended early");
        assert!(!trace.executed);
        assert_eq!(trace.pc, 2);
        assert_eq!(emulator.context.pc, 3);
        assert_register!(emulator, 0, 1);
        assert_eq!(emulator.context.flags, flags_before);

        let trace = emulator.step().expect("program ended early");
        assert!(trace.executed);
        assert_register!(emulator, 1, 2);
        assert!(emulator.halted());
    }

    #[test]
    fn test_unknown_condition_never_holds() {
        let emulator = run("MOVXY R0, #1\nMOVSS R1, #1");

        assert_register!(emulator, 0, 0);
        assert_register!(emulator, 1, 0);
    }

    #[test]
    fn test_condition_table() {
        use crate::instruction::Condition::*;

        let cases = vec![
            (Equal, 0b0100, true),
            (Equal, 0b0000, false),
            (NotEqual, 0b0000, true),
            (Greater, 0b0000, true),
            (Greater, 0b1001, true),
            (Greater, 0b0100, false),
            (Greater, 0b1000, false),
            (GreaterOrEqual, 0b0100, true),
            (GreaterOrEqual, 0b0001, false),
            (Less, 0b1000, true),
            (Less, 0b1001, false),
            (LessOrEqual, 0b0100, true),
            (LessOrEqual, 0b0001, true),
            (LessOrEqual, 0b0000, false),
            (Other("AL".into()), 0b0000, false),
        ];

        for (condition, bits, expected) in cases {
            assert_eq!(flags(bits).holds(Some(&condition)), expected, "{} with {:04b}", condition, bits);
        }

        assert!(flags(0).holds(None));
    }

    #[test]
    fn test_branch_loop() {
        let mut emulator = Emulator::load(Program::parse("MOV R0, #3\nloop SUBS R0, R0, #1\nBEQNE loop\nMOV R1, #1"));
        let steps = emulator.run();

        assert_eq!(steps, 8);
        assert_register!(emulator, 0, 0);
        assert_register!(emulator, 1, 1);
    }

    #[test]
    fn test_plain_branch_always_taken() {
        let mut emulator = Emulator::load(Program::parse("BEQ skip\nMOV R0, #1\nskip\nMOV R1, #2"));
        let steps = emulator.run();

        assert_eq!(steps, 3);
        assert_register!(emulator, 0, 0);
        assert_register!(emulator, 1, 2);
    }

    #[test]
    fn test_branch_not_taken() {
        let mut emulator = Emulator::load(Program::parse("MOV R0, #1\nCMP R0, #0\nBEQEQ end\nMOV R1, #5\nend"));

        emulator.run_for(2);
        let trace = emulator.step().expect("program ended early");
        assert!(!trace.executed);
        assert_eq!(emulator.context.pc, 3);

        emulator.run();
        assert_register!(emulator, 1, 5);
    }

    #[test]
    fn test_branch_to_undefined_label_falls_through() {
        let emulator = run("BEQ nowhere\nMOV R0, #1");

        assert_register!(emulator, 0, 1);
    }

    #[test]
    fn test_unrecognized_is_noop() {
        let mut emulator = Emulator::load(Program::parse("label FOO R0, #1\nMOV R1, #1"));

        let trace = emulator.step().expect("program ended early");
        assert_eq!(trace.text, "label FOO R0, #1");
        assert_eq!(emulator.context.r, [0; REGISTER_COUNT]);
        assert_eq!(emulator.context.pc, 1);
    }

    #[test]
    fn test_run_for_stops_infinite_loop() {
        let mut emulator = Emulator::load(Program::parse("spin BEQ spin"));

        assert_eq!(emulator.run_for(10), 10);
        assert!(!emulator.halted());
        assert_eq!(emulator.context.pc, 0);
    }

    #[test]
    fn test_reset() {
        let mut emulator = run("MOV R0, #1\nMOV R1, #0x100\nSTR R0, [R1]\nCMP R0, #1");
        emulator.reset();

        assert_eq!(emulator.context.r, [0; REGISTER_COUNT]);
        assert_eq!(emulator.context.flags, Flags::default());
        assert_eq!(emulator.memory.words(), vec![0; MEMORY_SLOTS]);
        assert_eq!(emulator.context.pc, 0);
        assert_eq!(emulator.run(), 4);
    }

    #[test]
    fn test_appending_resumes_execution() {
        let mut emulator = Emulator::load(Program::default());
        assert!(emulator.step().is_none());

        emulator.program.push_line("MOV R0, #2");
        assert_eq!(emulator.run(), 1);

        emulator.program.push_line("ADD R0, R0, R0");
        assert_eq!(emulator.run(), 1);
        assert_register!(emulator, 0, 4);
    }

    #[test]
    fn test_events() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();

        let mut emulator = Emulator::load(Program::parse("top MOV R1, #0x100\nSTR R1, [R1]\nCMP R1, #0\nBEQNE next\nnext"));
        emulator.add_listener(move |event: &Event| sink.borrow_mut().push(event.clone()));
        emulator.run();

        let events = events.borrow();
        let steps = events.iter().filter(|e| if let Event::Step(_) = e { true } else { false }).count();
        assert_eq!(steps, 5);

        assert!(events.iter().any(|e| match e {
            Event::RegisterChange { register: Register::R1, data: 0x100 } => true,
            _ => false,
        }));
        assert!(events.iter().any(|e| match e {
            Event::MemoryChange { address: 0x100, data: 0x100 } => true,
            _ => false,
        }));
        assert!(events.iter().any(|e| match e {
            Event::Branch { from: 3, to: 4, label } => label == "next",
            _ => false,
        }));
    }

    #[test]
    fn test_word_memory_addresses() {
        let memory = WordMemory::default();

        assert_eq!(memory.base(), MEMORY_BASE);
        assert_eq!(WordMemory::new(0x200, 2).address_of(1), 0x204);
        assert_eq!(memory.slot_index(0x100), Ok(0));
        assert_eq!(memory.slot_index(0x110), Ok(4));
        assert_eq!(memory.address_of(2), 0x108);
        assert_eq!(memory.slot_index(0xFC).map_err(|e| e.kind), Err(MemoryErrorKind::BelowBase));
        assert_eq!(memory.slot_index(0x101).map_err(|e| e.kind), Err(MemoryErrorKind::Unaligned));
        assert_eq!(memory.slot_index(0x114).map_err(|e| e.kind), Err(MemoryErrorKind::OutOfRange));
    }

    #[test]
    fn test_flags_display() {
        assert_eq!(flags(0b0110).to_string(), "0110");
        assert_eq!(flags(0b1001).as_bits(), 0b1001);
    }
}
