//! A crate for decoding and tracing programs written for a small load/store register
//! instruction set with ARM-like mnemonics.
//!
//! Currently this crate provides the functionality to:
//! - Decode text programs into [instructions](instruction::Instruction), with labels,
//!   condition code suffixes and the `S` set-flags marker.
//! - Execute programs against twelve 32-bit registers, the N, Z, C and V flags and a five word
//!   memory window at address `0x100`.
//! - Inspect the machine state after every executed instruction as a [Trace](trace::Trace).
//!
//! Supported mnemonics are `MOV`, `MVN`, `ADD`, `SUB`, `AND`, `ORR`, `EOR`, `LSL`, `LSR`, `LDR`,
//! `STR`, `CMP` and `BEQ`. Malformed input is never rejected: unknown opcodes do nothing,
//! unparseable operands read as zero and invalid memory accesses are ignored.
//!
//! # Example
//! ```
//! use tracesim::{
//!     symbolic::Program,
//!     emulator::Emulator,
//! };
//!
//! let source = r#"
//!     ; count R0 down to zero
//!             MOV   R0, #3
//!     loop    SUBS  R0, R0, #1
//!             BEQNE loop
//!             MOV   R1, #0x100
//!             STR   R0, [R1]
//! "#;
//!
//! // Decode the source into a program.
//! let program = Program::parse(source);
//!
//! // Load the program into an emulator with the default memory window.
//! let mut emulator = Emulator::load(program);
//!
//! // Execute the program, rendering the machine state after every step.
//! while let Some(trace) = emulator.step() {
//!     println!("{}", trace);
//! }
//!
//! assert_eq!(emulator.context.r[0], 0);
//! assert!(emulator.context.flags.zero);
//! ```
//!
//! # Executables
//!
//! ## `tracesimrun`
//!
//! Executes a source file and prints the machine state after every instruction.
//!
//! ```text
//! $ tracesimrun program.s
//! MOV R0, #5
//! Register array:
//! R0 =0x5 R1=0x0 R2=0x0 R3=0x0 R4=0x0 R5=0x0
//! R6=0x0 R7=0x0 R8=0x0 R9=0x0 R10=0x0 R11=0x0
//! NZCV: 0000
//! ___,___,___,___,___
//! ```
//!
//! ## `tracesimrepl`
//!
//! A Read-Execute-Print-Loop environment. Every line typed is decoded, appended to the program
//! and executed. Commands starting with a dot inspect the machine state.
//!
//! ```text
//! 0> MOV R0, #7
//! MOV R0, #7
//! Register array:
//! R0 =0x7 R1=0x0 R2=0x0 R3=0x0 R4=0x0 R5=0x0
//! R6=0x0 R7=0x0 R8=0x0 R9=0x0 R10=0x0 R11=0x0
//! NZCV: 0000
//! ___,___,___,___,___
//! 1> .reg r0
//! Register R0 = 0x7
//! ```
pub mod emulator;
pub mod error;
pub mod event;
pub mod instruction;
pub mod operand;
pub mod symbolic;
pub mod trace;
