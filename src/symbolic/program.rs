use std::collections::HashMap;

use slog::Logger;

use crate::instruction::Instruction;
use super::parser::Parser;

/// Maximum number of instructions in a program and of source lines read.
pub const MAX_PROGRAM_LINES: usize = 500;

/// Maximum number of label definitions recorded.
pub const MAX_LABELS: usize = 500;

/// Mapping from label names to program indices.
#[derive(Debug, Default, Clone)]
pub struct LabelTable {
    inner: HashMap<String, usize>,
    defined: usize,
}

/// Result of [LabelTable::define].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Definition {
    /// The label now points to the given index.
    New,
    /// The name was already defined. The earlier definition is kept.
    Duplicate { existing: usize },
    /// The table has no room for more definitions.
    Full,
}

impl LabelTable {
    pub fn new() -> LabelTable {
        LabelTable::default()
    }

    /// Records a label pointing at `index`. The first definition of a name wins.
    pub fn define(&mut self, name: &str, index: usize) -> Definition {
        if self.defined >= MAX_LABELS {
            return Definition::Full;
        }

        self.defined += 1;

        if let Some(existing) = self.inner.get(name) {
            return Definition::Duplicate { existing: *existing };
        }

        self.inner.insert(name.to_string(), index);

        Definition::New
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.inner.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Labels ordered by the index they point to.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        let mut entries: Vec<_> = self.inner
            .iter()
            .map(|(name, index)| (name.as_str(), *index))
            .collect();

        entries.sort_by_key(|(name, index)| (*index, *name));
        entries.into_iter()
    }
}

/// Decoded instructions and the labels that point into them.
#[derive(Debug, Default, Clone)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    pub labels: LabelTable,
}

impl Program {
    /// Decodes every line of `source`. Decoding never fails, lines that cannot be understood
    /// become instructions that do nothing.
    pub fn parse(source: &str) -> Program {
        Program::parse_with_logger(source, None)
    }

    pub fn parse_with_logger<L>(source: &str, logger: L) -> Program
    where
        L: Into<Option<Logger>>,
    {
        Program::from_lines(source.lines(), logger)
    }

    /// Decodes at most [MAX_PROGRAM_LINES] lines.
    pub fn from_lines<I, S, L>(lines: I, logger: L) -> Program
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        L: Into<Option<Logger>>,
    {
        let parser = Parser::new().with_logger(logger);
        let mut program = Program::default();

        for line in lines.into_iter().take(MAX_PROGRAM_LINES) {
            parser.decode_line(line.as_ref(), &mut program);
        }

        program
    }

    /// Decodes a single line and appends it to the program.
    ///
    /// # Returns
    /// The index of the new instruction, or `None` if the line was a comment or the program is
    /// full.
    pub fn push_line(&mut self, line: &str) -> Option<usize> {
        Parser::new().decode_line(line, self)
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.instructions.len() >= MAX_PROGRAM_LINES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_first_definition_wins() {
        let mut labels = LabelTable::new();

        assert_eq!(labels.define("loop", 1), Definition::New);
        assert_eq!(labels.define("loop", 4), Definition::Duplicate { existing: 1 });
        assert_eq!(labels.get("loop"), Some(1));
        assert_eq!(labels.get("LOOP"), None);
    }

    #[test]
    fn test_label_capacity() {
        let mut labels = LabelTable::new();

        for i in 0..MAX_LABELS {
            labels.define(&format!("l{}", i), i);
        }

        assert_eq!(labels.define("extra", 0), Definition::Full);
        assert_eq!(labels.get("extra"), None);
    }

    #[test]
    fn test_program_line_cap() {
        let source = "MOV R0, #1\n".repeat(MAX_PROGRAM_LINES + 10);
        let program = Program::parse(&source);

        assert_eq!(program.len(), MAX_PROGRAM_LINES);
        assert!(program.is_full());
    }

    #[test]
    fn test_comments_are_skipped() {
        let program = Program::parse("; header\n\n# note\nMOV R0, #1\n   \nADD R0, R0, #1\n");

        assert_eq!(program.len(), 2);
        assert_eq!(program.get(1).map(|i| i.text.as_str()), Some("ADD R0, R0, #1"));
    }

    #[test]
    fn test_labels_iter_ordered() {
        let program = Program::parse("start MOV R0, #1\nloop:\nSUB R0, R0, #1\nend\n");
        let labels: Vec<_> = program.labels.iter().collect();

        assert_eq!(labels, vec![("start", 0), ("loop", 1), ("end", 3)]);
        assert_eq!(program.labels.len(), 3);
        assert!(!program.labels.is_empty());
        assert!(Program::parse("MOV R0, #1").labels.is_empty());
    }
}
