use tracesim::{
    emulator::{Emulator, Memory},
    symbolic::Program,
};

#[test]
fn test_invalid_addresses_are_ignored() {
    let mut emulator = Emulator::load(Program::parse(include_str!("memory.s")));

    let last = std::iter::from_fn(|| emulator.step())
        .last()
        .expect("program produced no steps");

    assert_eq!(emulator.memory.words(), vec![0, 0, 0, 0xFF, 0]);
    assert_eq!(emulator.context.r[5], 0);
    assert_eq!(emulator.context.r[6], 0xFF);
    assert!(last.to_string().ends_with("\n___,___,___,0xFF,___"));
}

#[test]
fn test_reset_clears_memory() {
    let mut emulator = Emulator::load(Program::parse(include_str!("memory.s")));
    emulator.run();

    emulator.reset();

    assert_eq!(emulator.memory.words(), vec![0; 5]);
    assert_eq!(emulator.context.r, [0; 12]);
    assert_eq!(emulator.context.pc, 0);
}
