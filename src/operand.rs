//! Operand tokens and their interpretation.
//!
//! Operands are stored in the [Instruction](crate::instruction::Instruction) as raw tokens and
//! parsed into an [Operand] every time they are needed, since the values of registers and
//! memory words change during execution.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::tag,
    character::complete::{digit0, digit1, hex_digit0, multispace0, one_of},
    combinator::{map, map_opt, opt},
    sequence::{pair, preceded},
};

use crate::instruction::Register;

/// A parsed operand token.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Operand {
    /// `R0`-`R11`, case insensitive.
    Register(Register),

    /// `#<literal>`, hexadecimal with a `0x` or `0X` prefix and decimal otherwise.
    Immediate(u32),

    /// `[<register>]`. Holds `None` if the bracket does not contain a register, in which case
    /// the operand never refers to a valid memory word.
    Memory(Option<Register>),

    /// Anything else, read as a hexadecimal (`0x` prefix) or decimal number. Unparseable
    /// tokens read as zero.
    Literal(u32),
}

impl Operand {
    /// Interprets a token. Never fails: the forms are tried in the order register, immediate,
    /// memory and the literal fallback catches everything else.
    pub fn parse(token: &str) -> Operand {
        let token = token.trim();

        if let Ok((_, register)) = register(token) {
            return Operand::Register(register);
        }

        if let Some(literal) = token.strip_prefix('#') {
            return Operand::Immediate(parse_or_zero(immediate_literal, literal));
        }

        if token.len() >= 3 && token.starts_with('[') && token.ends_with(']') {
            let inner = token[1..token.len() - 1].trim();
            return Operand::Memory(register(inner).ok().map(|(_, register)| register));
        }

        Operand::Literal(parse_or_zero(bare_literal, token))
    }

    /// Returns the register if this is a plain register operand.
    pub fn register(&self) -> Option<Register> {
        match self {
            Operand::Register(register) => Some(*register),
            _ => None,
        }
    }

    /// Returns the address register of a memory operand.
    pub fn address_register(&self) -> Option<Register> {
        match self {
            Operand::Memory(register) => *register,
            _ => None,
        }
    }
}

fn parse_or_zero<F>(parser: F, input: &str) -> u32
where
    F: Fn(&str) -> IResult<&str, u32>,
{
    parser(input).map(|(_, value)| value).unwrap_or(0)
}

/// `R` followed by a register number. Characters after the number are ignored.
pub fn register(input: &str) -> IResult<&str, Register> {
    map_opt(
        preceded(one_of("Rr"), digit1),
        |digits: &str| digits.parse::<usize>().ok().and_then(Register::from_index),
    )(input)
}

fn hexadecimal(input: &str) -> IResult<&str, u32> {
    map(hex_digit0, |digits: &str| {
        digits
            .chars()
            .filter_map(|c| c.to_digit(16))
            .fold(0u32, |acc, digit| (acc << 4) | digit)
    })(input)
}

/// Decimal number with an optional sign, wrapping modulo 2^32. An empty digit sequence reads
/// as zero.
fn decimal(input: &str) -> IResult<&str, u32> {
    map(
        preceded(multispace0, pair(opt(one_of("+-")), digit0)),
        |(sign, digits): (Option<char>, &str)| {
            let value = digits
                .chars()
                .filter_map(|c| c.to_digit(10))
                .fold(0u32, |acc, digit| acc.wrapping_mul(10).wrapping_add(digit));

            match sign {
                Some('-') => value.wrapping_neg(),
                _ => value,
            }
        },
    )(input)
}

fn immediate_literal(input: &str) -> IResult<&str, u32> {
    alt((
        preceded(alt((tag("0x"), tag("0X"))), hexadecimal),
        decimal,
    ))(input)
}

fn bare_literal(input: &str) -> IResult<&str, u32> {
    alt((
        preceded(tag("0x"), hexadecimal),
        decimal,
    ))(input)
}
