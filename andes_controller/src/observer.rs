//! Reporting hooks for non-fatal conditions.
//!
//! Nothing in this crate writes to a global logger directly. Builders and encoders are handed
//! an [`Observer`] instead, [`LogObserver`] being the one used when none is given.

use crate::sequencer::Issue;

/// Something worth reporting that does not stop the current operation
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Event {
    /// A state was built from fewer bits than there are pins, remaining pins were zeroed
    ShortBitSequence { given: usize, expected: usize },
    /// A structural problem found while compiling, the compile call will fail
    Issue(Issue),
    /// A program compiled successfully
    Compiled { modes: usize, words: usize },
    /// A command was turned into bytes
    Encoded {
        module: u32,
        header: u32,
        bytes: usize,
    },
}

pub trait Observer {
    fn notify(&self, event: Event);
}

/// Forwards events to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn notify(&self, event: Event) {
        match event {
            Event::ShortBitSequence { given, expected } => log::warn!(
                "There are less bits than expected in a state ({}/{}), will fill MSBs with 0s",
                given,
                expected
            ),
            Event::Issue(issue) => log::error!("{}", issue),
            Event::Compiled { modes, words } => {
                log::debug!("Compiled {} modes into {} memory lines", modes, words)
            }
            Event::Encoded {
                module,
                header,
                bytes,
            } => log::trace!(
                "Encoded instruction {:08X} for module {} ({} bytes)",
                header,
                module,
                bytes
            ),
        }
    }
}

/// Drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn notify(&self, _event: Event) {}
}

impl<O: Observer + ?Sized> Observer for &O {
    fn notify(&self, event: Event) {
        (**self).notify(event)
    }
}
