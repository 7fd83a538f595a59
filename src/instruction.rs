//! types for representing instructions and their parts

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;

/// Number of general purpose registers.
pub const REGISTER_COUNT: usize = 12;

/// Base mnemonics of the instruction set.
///
/// [Unrecognized](OpCode::Unrecognized) holds the verbatim opcode token of a line whose
/// mnemonic is not in [OpCode::TABLE]. Such instructions do nothing besides advancing the
/// program counter.
#[derive(Clone, Debug, PartialEq)]
pub enum OpCode {
    /// Copies the second operand into a register. (`MOV`)
    Move,

    /// Copies the bitwise complement of the second operand into a register. (`MVN`)
    MoveNot,

    /// Adds two operands. (`ADD`)
    Add,

    /// Subtracts the third operand from the second. (`SUB`)
    Subtract,

    /// Bitwise and. (`AND`)
    And,

    /// Bitwise or. (`ORR`)
    Or,

    /// Bitwise exclusive or. (`EOR`)
    Xor,

    /// Logical shift left. (`LSL`)
    ShiftLeft,

    /// Logical shift right. (`LSR`)
    ShiftRight,

    /// Loads a memory word into a register. (`LDR`)
    Load,

    /// Stores a register into a memory word. (`STR`)
    Store,

    /// Subtracts and updates the flags, discarding the result. (`CMP`)
    Compare,

    /// Branches to a label. The condition comes from the suffix of the opcode token like for
    /// every other instruction, so a bare `BEQ` always branches. (`BEQ`)
    Branch,

    /// An opcode token that did not match any mnemonic.
    Unrecognized(String),
}

impl OpCode {
    /// Mnemonics in the order they are tested against an opcode token.
    pub const TABLE: [(&'static str, OpCode); 13] = [
        ("MOV", OpCode::Move),
        ("MVN", OpCode::MoveNot),
        ("ADD", OpCode::Add),
        ("SUB", OpCode::Subtract),
        ("AND", OpCode::And),
        ("ORR", OpCode::Or),
        ("EOR", OpCode::Xor),
        ("LSL", OpCode::ShiftLeft),
        ("LSR", OpCode::ShiftRight),
        ("LDR", OpCode::Load),
        ("STR", OpCode::Store),
        ("CMP", OpCode::Compare),
        ("BEQ", OpCode::Branch),
    ];

    /// Finds the first mnemonic that is a prefix of the upper-cased `token`.
    ///
    /// # Returns
    /// The matched opcode and the rest of the upper-cased token after the mnemonic.
    pub fn match_prefix(token: &str) -> Option<(OpCode, String)> {
        let upper = token.to_uppercase();

        OpCode::TABLE
            .iter()
            .find(|(mnemonic, _)| upper.starts_with(mnemonic))
            .map(|(mnemonic, opcode)| (opcode.clone(), upper[mnemonic.len()..].to_string()))
    }

    pub fn mnemonic(&self) -> &str {
        match self {
            OpCode::Move => "MOV",
            OpCode::MoveNot => "MVN",
            OpCode::Add => "ADD",
            OpCode::Subtract => "SUB",
            OpCode::And => "AND",
            OpCode::Or => "ORR",
            OpCode::Xor => "EOR",
            OpCode::ShiftLeft => "LSL",
            OpCode::ShiftRight => "LSR",
            OpCode::Load => "LDR",
            OpCode::Store => "STR",
            OpCode::Compare => "CMP",
            OpCode::Branch => "BEQ",
            OpCode::Unrecognized(token) => token,
        }
    }

    pub fn is_recognized(&self) -> bool {
        match self {
            OpCode::Unrecognized(_) => false,
            _ => true,
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Condition code suffix selecting conditional execution.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// `Z`
    Equal,

    /// `!Z`
    NotEqual,

    /// `!Z && N == V`
    Greater,

    /// `N == V`
    GreaterOrEqual,

    /// `N != V`
    Less,

    /// `Z || N != V`
    LessOrEqual,

    /// Suffix text that is not a known condition code. Never holds.
    Other(String),
}

impl Condition {
    /// Interprets the remainder of an opcode token. Unknown suffixes are kept as
    /// [Condition::Other] instead of being rejected.
    pub fn from_suffix(suffix: &str) -> Condition {
        match suffix.to_uppercase().as_ref() {
            "EQ" => Condition::Equal,
            "NE" => Condition::NotEqual,
            "GT" => Condition::Greater,
            "GE" => Condition::GreaterOrEqual,
            "LT" => Condition::Less,
            "LE" => Condition::LessOrEqual,
            _ => Condition::Other(suffix.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        match self {
            Condition::Other(_) => false,
            _ => true,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Condition::Equal => write!(f, "EQ"),
            Condition::NotEqual => write!(f, "NE"),
            Condition::Greater => write!(f, "GT"),
            Condition::GreaterOrEqual => write!(f, "GE"),
            Condition::Less => write!(f, "LT"),
            Condition::LessOrEqual => write!(f, "LE"),
            Condition::Other(suffix) => write!(f, "{}", suffix),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Register {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    R8,
    R9,
    R10,
    R11,
}

impl Register {
    /// All registers in index order.
    pub const ALL: [Register; REGISTER_COUNT] = [
        Register::R0,
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::R5,
        Register::R6,
        Register::R7,
        Register::R8,
        Register::R9,
        Register::R10,
        Register::R11,
    ];

    pub fn from_index(index: usize) -> Option<Register> {
        Register::ALL.get(index).copied()
    }

    pub fn index(&self) -> usize {
        match self {
            Register::R0 => 0,
            Register::R1 => 1,
            Register::R2 => 2,
            Register::R3 => 3,
            Register::R4 => 4,
            Register::R5 => 5,
            Register::R6 => 6,
            Register::R7 => 7,
            Register::R8 => 8,
            Register::R9 => 9,
            Register::R10 => 10,
            Register::R11 => 11,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "R{}", self.index())
    }
}

impl FromStr for Register {
    type Err = ();

    /// Strict parse of a whole register name (`R0`-`R11`, case insensitive).
    fn from_str(input: &str) -> Result<Register, ()> {
        let digits = input
            .strip_prefix('R')
            .or_else(|| input.strip_prefix('r'))
            .ok_or(())?;

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(());
        }

        digits
            .parse::<usize>()
            .ok()
            .and_then(Register::from_index)
            .ok_or(())
    }
}

/// A decoded source line.
///
/// The opcode and condition are fixed at decode time. The operands are kept as raw tokens and
/// resolved against the machine state every time the instruction is executed.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    /// The trimmed source line.
    pub text: String,
    pub opcode: OpCode,
    /// `None` means the instruction always executes.
    pub condition: Option<Condition>,
    pub set_flags: bool,
    pub operands: Vec<String>,
    /// Label defined by the first token of the line.
    pub label: Option<String>,
    /// Label name taken from the first operand of a `BEQ` instruction.
    pub branch_target: Option<String>,
}

impl Instruction {
    /// An instruction which only carries a label and does nothing when executed.
    pub fn label_only(text: &str, label: String) -> Instruction {
        Instruction {
            text: text.to_string(),
            opcode: OpCode::Unrecognized(String::new()),
            condition: None,
            set_flags: false,
            operands: Vec::new(),
            label: Some(label),
            branch_target: None,
        }
    }

    pub fn operand(&self, index: usize) -> Option<&str> {
        self.operands.get(index).map(String::as_str)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "{}: ", label)?;
        }

        write!(f, "{}", self.opcode)?;

        if self.set_flags {
            write!(f, "S")?;
        }

        if let Some(condition) = &self.condition {
            write!(f, "{}", condition)?;
        }

        if !self.operands.is_empty() {
            write!(f, " {}", self.operands.iter().join(", "))?;
        }

        Ok(())
    }
}
