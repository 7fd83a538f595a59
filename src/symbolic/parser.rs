//! Decoder turning source lines into [Instructions](Instruction).

use edit_distance::edit_distance;
use slog::{debug, o, trace, warn, Discard, Logger};

use crate::instruction::{Condition, Instruction, OpCode};
use super::program::{Definition, Program};
use super::token::{is_comment, tokenize, truncate};

/// Maximum number of operands kept per instruction.
pub const MAX_OPERANDS: usize = 6;

/// Maximum length of a source line in bytes. Longer lines are truncated.
pub const MAX_LINE_LEN: usize = 255;

/// Stateless line decoder. Holds only the logger used for advisory diagnostics.
pub struct Parser {
    logger: Logger,
}

impl Default for Parser {
    fn default() -> Parser {
        Parser::new()
    }
}

impl Parser {
    pub fn new() -> Parser {
        Parser {
            logger: Logger::root(Discard, o!()),
        }
    }

    pub fn with_logger<L>(mut self, logger: L) -> Parser
    where
        L: Into<Option<Logger>>,
    {
        if let Some(logger) = logger.into() {
            self.logger = logger.new(o!("stage" => "decode"));
        }

        self
    }

    /// Decodes `line` and appends the result to `program`. Labels are recorded in the program's
    /// label table with the index the new instruction will have.
    ///
    /// # Returns
    /// The index of the appended instruction, or `None` if the line is a comment or the
    /// program has no room left.
    pub fn decode_line(&self, line: &str, program: &mut Program) -> Option<usize> {
        let text = truncate(line, MAX_LINE_LEN).trim();

        if is_comment(text) {
            return None;
        }

        let index = program.len();

        if program.is_full() {
            warn!(self.logger, "program is full, line dropped"; "line" => text);
            return None;
        }

        let tokens = tokenize(text);

        if tokens.is_empty() {
            return None;
        }

        let instruction = self.decode_tokens(text, &tokens, index, program);

        trace!(self.logger, "decoded line";
            "index" => index,
            "instruction" => %instruction);

        program.instructions.push(instruction);

        Some(index)
    }

    fn decode_tokens(
        &self,
        text: &str,
        tokens: &[String],
        index: usize,
        program: &mut Program,
    ) -> Instruction {
        let mut rest = tokens;
        let mut label = None;

        if OpCode::match_prefix(&tokens[0]).is_none() {
            let name = tokens[0].strip_suffix(':').unwrap_or(&tokens[0]).to_string();
            self.define_label(&name, index, program);

            rest = &tokens[1..];

            if rest.is_empty() {
                return Instruction::label_only(text, name);
            }

            label = Some(name);
        }

        let opcode_token = &rest[0];
        let mut operands: Vec<String> = rest[1..].to_vec();

        if operands.len() > MAX_OPERANDS {
            warn!(self.logger, "too many operands, extra operands dropped";
                "line" => text,
                "count" => operands.len());
            operands.truncate(MAX_OPERANDS);
        }

        let (opcode, mut suffix) = match OpCode::match_prefix(opcode_token) {
            Some(matched) => matched,
            None => {
                self.warn_unrecognized(text, opcode_token);

                return Instruction {
                    text: text.to_string(),
                    opcode: OpCode::Unrecognized(opcode_token.clone()),
                    condition: None,
                    set_flags: false,
                    operands,
                    label,
                    branch_target: None,
                };
            }
        };

        let set_flags = suffix.starts_with('S');

        if set_flags {
            suffix.remove(0);
        }

        let condition = if suffix.is_empty() {
            None
        } else {
            let condition = Condition::from_suffix(&suffix);

            if !condition.is_known() {
                warn!(self.logger, "unknown condition code, instruction will never execute";
                    "line" => text,
                    "condition" => &suffix);
            }

            Some(condition)
        };

        let branch_target = match opcode {
            OpCode::Branch => operands.first().cloned(),
            _ => None,
        };

        Instruction {
            text: text.to_string(),
            opcode,
            condition,
            set_flags,
            operands,
            label,
            branch_target,
        }
    }

    fn define_label(&self, name: &str, index: usize, program: &mut Program) {
        match program.labels.define(name, index) {
            Definition::New => {
                debug!(self.logger, "label defined"; "label" => name, "index" => index);
            }
            Definition::Duplicate { existing } => {
                warn!(self.logger, "label already defined, keeping the first definition";
                    "label" => name,
                    "index" => existing);
            }
            Definition::Full => {
                warn!(self.logger, "label table is full, label ignored"; "label" => name);
            }
        }
    }

    fn warn_unrecognized(&self, text: &str, token: &str) {
        let upper = token.to_uppercase();

        let suggestion = OpCode::TABLE
            .iter()
            .map(|(mnemonic, _)| (edit_distance(&upper, mnemonic), *mnemonic))
            .min()
            .filter(|(distance, _)| *distance <= 2)
            .map(|(_, mnemonic)| mnemonic)
            .unwrap_or("-");

        warn!(self.logger, "unrecognized opcode, instruction does nothing";
            "line" => text,
            "opcode" => token,
            "suggestion" => suggestion);
    }
}
