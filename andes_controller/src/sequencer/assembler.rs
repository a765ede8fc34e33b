use super::{CompiledProgram, Issue, Mode, Word, MEMORY_CAPACITY};
use crate::{
    error::{Error, Result},
    observer::{Event, LogObserver, Observer},
};
use std::collections::HashMap;

/// Collects modes and compiles them into a sequencer memory image
#[derive(Debug, Default)]
pub struct ProgramAssembler<O: Observer = LogObserver> {
    modes: Vec<Mode>,
    observer: O,
}

impl ProgramAssembler {
    pub fn new() -> Self {
        ProgramAssembler::with_observer(LogObserver)
    }
}

impl<O: Observer> ProgramAssembler<O> {
    pub fn with_observer(observer: O) -> Self {
        ProgramAssembler {
            modes: Vec::new(),
            observer,
        }
    }

    pub fn add_mode(&mut self, mode: Mode) -> Result<()> {
        if self.mode(mode.name()).is_some() {
            return Err(Error::DuplicateModeName(mode.name().to_string()));
        }
        self.modes.push(mode);
        Ok(())
    }

    /// Names in registration order
    pub fn mode_names(&self) -> impl Iterator<Item = &str> {
        self.modes.iter().map(Mode::name)
    }

    pub fn mode(&self, name: &str) -> Option<&Mode> {
        self.modes.iter().find(|m| m.name() == name)
    }

    /// Modes are laid out in registration order, each one taking a header line plus a line per
    /// state. Returns the address of every mode and the total number of lines.
    fn assign_addresses(&self) -> (HashMap<String, usize>, usize) {
        let mut addresses = HashMap::with_capacity(self.modes.len());
        let mut offset = 0;
        for mode in &self.modes {
            addresses.insert(mode.name().to_string(), offset);
            offset += 1 + mode.states().len();
        }
        (addresses, offset)
    }

    /// Checks every reference between modes and returns all problems found
    fn validate(&self) -> Vec<Issue> {
        let mut issues = Vec::new();
        for mode in &self.modes {
            if let Some(next) = mode.next_mode() {
                if self.mode(next).is_none() {
                    issues.push(Issue::UnknownNextMode {
                        mode: mode.name().to_string(),
                        next: next.to_string(),
                    });
                }
            }
            if let Some(parent_name) = mode.parent_mode() {
                match self.mode(parent_name) {
                    None => issues.push(Issue::UnknownParentMode {
                        mode: mode.name().to_string(),
                        parent: parent_name.to_string(),
                    }),
                    Some(parent) => {
                        if let Some(grandparent) = parent.parent_mode() {
                            issues.push(Issue::DoubleNesting {
                                mode: mode.name().to_string(),
                                parent: parent_name.to_string(),
                                grandparent: grandparent.to_string(),
                            });
                        }
                    }
                }
            }
        }
        issues
    }

    pub fn compile(&self) -> Result<CompiledProgram> {
        let (offsets, total) = self.assign_addresses();

        let issues = self.validate();
        if !issues.is_empty() {
            for issue in &issues {
                self.observer.notify(Event::Issue(issue.clone()));
            }
            return Err(Error::Compile(issues));
        }

        let overflow = || Error::MemoryOverflow {
            actual: total,
            capacity: MEMORY_CAPACITY,
        };
        let addresses = offsets
            .into_iter()
            .map(|(name, offset)| u16::try_from(offset).map(|a| (name, a)).map_err(|_| overflow()))
            .collect::<Result<HashMap<_, _>>>()?;

        let mut words = Vec::with_capacity(total);
        for mode in &self.modes {
            words.push(Word::Header(mode.header(&addresses)?));
            words.extend(mode.states().iter().copied().map(Word::State));
        }

        if words.len() > MEMORY_CAPACITY {
            return Err(Error::MemoryOverflow {
                actual: words.len(),
                capacity: MEMORY_CAPACITY,
            });
        }

        self.observer.notify(Event::Compiled {
            modes: self.modes.len(),
            words: words.len(),
        });
        Ok(CompiledProgram::new(words, addresses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        observer::NullObserver,
        sequencer::{Nesting, TimingState},
    };
    use claims::*;
    use std::cell::RefCell;

    fn mode_with_states(
        name: &str,
        loops: u32,
        next: Option<&str>,
        nesting: Option<Nesting>,
        states: u32,
    ) -> Mode {
        let mut mode = Mode::new(name, loops, next, nesting).unwrap();
        mode.add_states((1..=states).map(|t| TimingState::new(t as u64, t).unwrap()))
            .unwrap();
        mode
    }

    #[test]
    fn two_mode_scenario() {
        let mut asm = ProgramAssembler::with_observer(NullObserver);
        asm.add_mode(mode_with_states("M1", 3, Some("M2"), None, 2)).unwrap();
        asm.add_mode(mode_with_states("M2", 0, None, None, 1)).unwrap();
        let program = asm.compile().unwrap();

        assert_ok_eq!(program.address_of("M1"), 0);
        assert_ok_eq!(program.address_of("M2"), 3);
        assert_eq!(program.len(), 5);
        let tags: Vec<_> = program.words().iter().map(Word::is_header).collect();
        assert_eq!(tags, vec![true, false, false, true, false]);
    }

    #[test]
    fn duplicate_mode_name() {
        let mut asm = ProgramAssembler::with_observer(NullObserver);
        asm.add_mode(mode_with_states("a", 1, None, None, 0)).unwrap();
        assert_matches!(
            asm.add_mode(mode_with_states("a", 2, None, None, 0)),
            Err(Error::DuplicateModeName(n)) if n == "a"
        );
        assert_eq!(asm.mode_names().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn all_issues_reported_at_once() {
        let mut asm = ProgramAssembler::with_observer(NullObserver);
        let nested = |name: &str, parent: &str| {
            mode_with_states(name, 1, Some("outer"), Some(Nesting::new(parent, 2)), 1)
        };
        asm.add_mode(mode_with_states("outer", 1, Some("missing"), None, 1))
            .unwrap();
        asm.add_mode(nested("middle", "outer")).unwrap();
        asm.add_mode(nested("inner", "middle")).unwrap();
        asm.add_mode(mode_with_states(
            "orphan",
            1,
            None,
            Some(Nesting::new("nobody", 1)),
            1,
        ))
        .unwrap();

        match asm.compile() {
            Err(Error::Compile(issues)) => assert_eq!(
                issues,
                vec![
                    Issue::UnknownNextMode {
                        mode: "outer".to_string(),
                        next: "missing".to_string()
                    },
                    Issue::DoubleNesting {
                        mode: "inner".to_string(),
                        parent: "middle".to_string(),
                        grandparent: "outer".to_string()
                    },
                    Issue::UnknownParentMode {
                        mode: "orphan".to_string(),
                        parent: "nobody".to_string()
                    },
                ]
            ),
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn issues_go_to_observer() {
        #[derive(Default)]
        struct Recorder(RefCell<Vec<Event>>);
        impl Observer for Recorder {
            fn notify(&self, event: Event) {
                self.0.borrow_mut().push(event);
            }
        }

        let recorder = Recorder::default();
        let mut asm = ProgramAssembler::with_observer(&recorder);
        asm.add_mode(mode_with_states("a", 1, Some("b"), None, 1)).unwrap();
        assert_err!(asm.compile());
        assert_eq!(
            recorder.0.borrow().as_slice(),
            &[Event::Issue(Issue::UnknownNextMode {
                mode: "a".to_string(),
                next: "b".to_string()
            })]
        );

        asm.add_mode(mode_with_states("b", 0, None, None, 2)).unwrap();
        assert_ok!(asm.compile());
        assert_eq!(
            recorder.0.borrow().last(),
            Some(&Event::Compiled { modes: 2, words: 5 })
        );
    }

    #[test]
    fn capacity_boundary() {
        // 1 + 1022 lines
        let mut asm = ProgramAssembler::with_observer(NullObserver);
        asm.add_mode(mode_with_states("big", 0, None, None, 1022)).unwrap();
        assert_eq!(assert_ok!(asm.compile()).len(), MEMORY_CAPACITY);

        asm.add_mode(mode_with_states("tail", 0, None, None, 0)).unwrap();
        assert_matches!(
            asm.compile(),
            Err(Error::MemoryOverflow {
                actual: 1024,
                capacity: 1023
            })
        );
    }

    #[test]
    fn addresses_follow_registration_order() {
        let sizes = [3u32, 0, 7, 1, 12];
        let mut asm = ProgramAssembler::with_observer(NullObserver);
        for (i, size) in sizes.iter().enumerate() {
            asm.add_mode(mode_with_states(&format!("m{}", i), 1, None, None, *size))
                .unwrap();
        }
        let program = asm.compile().unwrap();
        for i in 1..sizes.len() {
            let prev = program.address_of(&format!("m{}", i - 1)).unwrap();
            let cur = program.address_of(&format!("m{}", i)).unwrap();
            assert_eq!(cur, prev + 1 + sizes[i - 1] as u16);
        }
    }
}
