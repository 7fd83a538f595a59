//! Event handling.
//!
//! This library exposes an event-based interface for reacting
//! to the state changes of the emulator in real-time. [EventListeners](EventListener)
//! can be registered on the [Emulator](crate::emulator::Emulator) with the
//! [add_listener](crate::emulator::Emulator::add_listener) method.
//!
//! A blanket implementation of [EventListener] for all `Fn(&Event)` is provided.

use crate::emulator::Flags;
use crate::instruction::Register;
use crate::trace::Trace;

/// Represents an event that occurred while executing a program.
#[derive(Debug, Clone)]
pub enum Event {
    /// An instruction was processed. Sent once per step, also for instructions whose condition
    /// did not hold.
    Step(Trace),

    /// The program modified a memory location.
    MemoryChange {
        /// The byte address of the changed memory word.
        address: u32,

        /// New value of the memory word.
        data: u32,
    },

    /// The program modified a register.
    RegisterChange {
        /// The register which was modified.
        register: Register,

        /// The new value of the register.
        data: u32,
    },

    /// The program updated the condition flags.
    FlagsChange {
        flags: Flags,
    },

    /// A branch was taken.
    Branch {
        /// Index of the branch instruction.
        from: usize,

        /// Index the execution continues from.
        to: usize,

        label: String,
    },
}

/// Trait for consuming events.
pub trait EventListener {
    /// Called whenever a new event has been created.
    fn event(&mut self, event: &Event);
}

impl<F> EventListener for F where F: Fn(&Event) {
    fn event(&mut self, event: &Event) {
        self(event)
    }
}

#[derive(Default)]
pub(crate) struct EventDispatcher {
    listeners: Vec<Box<dyn EventListener>>,
}

impl EventDispatcher {
    pub fn new() -> EventDispatcher {
        EventDispatcher {
            listeners: Vec::new(),
        }
    }

    pub fn add_listener<L: EventListener + 'static>(&mut self, listener: L) {
        self.listeners.push(Box::new(listener) as Box<dyn EventListener>)
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn dispatch(&mut self, event: Event) {
        for listener in &mut self.listeners {
            listener.event(&event);
        }
    }
}
