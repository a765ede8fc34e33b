use super::{tag_of, MAX_HOLD_TIME, MAX_PINS, STATE_TAG};
use crate::{
    error::{Error, Result},
    labels::PinLabels,
    observer::{Event, Observer},
};

/// Pin values held by the sequencer for `hold_time` ticks
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub struct TimingState {
    pins: u64,
    hold_time: u32,
}

impl TimingState {
    pub fn new(pins: u64, hold_time: u32) -> Result<Self> {
        if hold_time > MAX_HOLD_TIME {
            return Err(Error::InvalidHoldTime(hold_time));
        }
        Ok(TimingState { pins, hold_time })
    }

    /// Builds a state from named pin values, pins that are not named stay low
    pub fn from_named_bits<I, S>(labels: &PinLabels, named_bits: I, hold_time: u32) -> Result<Self>
    where
        I: IntoIterator<Item = (S, bool)>,
        S: AsRef<str>,
    {
        let mut pins = 0u64;
        for (name, value) in named_bits {
            let bit = 1u64 << labels.address_of(name.as_ref())?;
            if value {
                pins |= bit;
            } else {
                pins &= !bit;
            }
        }
        TimingState::new(pins, hold_time)
    }

    /// Builds a state where `bits[i]` is the value of pin `i`.
    ///
    /// Less than [`MAX_PINS`] bits is allowed, the missing pins are low and the observer is told.
    pub fn from_bit_sequence<O: Observer>(
        bits: &[bool],
        hold_time: u32,
        observer: &O,
    ) -> Result<Self> {
        if bits.len() > MAX_PINS {
            return Err(Error::TooManyBits(bits.len()));
        }
        if bits.len() < MAX_PINS {
            observer.notify(Event::ShortBitSequence {
                given: bits.len(),
                expected: MAX_PINS,
            });
        }
        let pins = bits
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, b)| acc | (u64::from(*b) << i));
        TimingState::new(pins, hold_time)
    }

    /// Builds one state per hold time, column `i` of every named row gives the pins of state `i`
    pub fn from_named_bits_table<I, S, V>(
        labels: &PinLabels,
        named_bits: I,
        hold_times: &[u32],
    ) -> Result<Vec<Self>>
    where
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: AsRef<[bool]>,
    {
        let expected = hold_times.len();
        let mut pins = vec![0u64; expected];
        for (name, values) in named_bits {
            let name = name.as_ref();
            let values = values.as_ref();
            if values.len() != expected {
                return Err(Error::LengthMismatch {
                    name: name.to_string(),
                    len: values.len(),
                    expected,
                });
            }
            let bit = 1u64 << labels.address_of(name)?;
            for (p, v) in pins.iter_mut().zip(values) {
                if *v {
                    *p |= bit;
                } else {
                    *p &= !bit;
                }
            }
        }
        pins.into_iter()
            .zip(hold_times)
            .map(|(p, t)| TimingState::new(p, *t))
            .collect()
    }

    pub fn pins(&self) -> u64 {
        self.pins
    }

    pub fn hold_time(&self) -> u32 {
        self.hold_time
    }

    pub fn get_pin(&self, address: u8) -> bool {
        (address as usize) < MAX_PINS && (self.pins >> address) & 1 == 1
    }

    pub fn encode(&self) -> u128 {
        ((self.pins as u128) << 24) | self.hold_time as u128
    }

    pub fn decode(word: u128) -> Result<Self> {
        if word >> 96 != 0 || tag_of(word) != STATE_TAG {
            return Err(Error::InvalidWord(word));
        }
        Ok(TimingState {
            pins: (word >> 24) as u64,
            hold_time: (word as u32) & MAX_HOLD_TIME,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NullObserver;
    use claims::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<Event>>);

    impl Observer for Recorder {
        fn notify(&self, event: Event) {
            self.0.borrow_mut().push(event);
        }
    }

    fn ab_labels() -> PinLabels {
        PinLabels::new([("A", 0), ("B", 1)]).unwrap()
    }

    #[test]
    fn named_bits_scenario() {
        let state = TimingState::from_named_bits(&ab_labels(), [("A", true)], 10).unwrap();
        assert_eq!(state.pins(), 0b01);
        assert_eq!(state.hold_time(), 10);
        assert_eq!(state.encode(), (0b01 << 24) | 10);

        let decoded = assert_ok!(TimingState::decode(state.encode()));
        assert!(decoded.get_pin(0));
        assert!(!decoded.get_pin(1));
        assert_eq!(decoded, state);
    }

    #[test]
    fn named_bits_unknown_name() {
        assert_matches!(
            TimingState::from_named_bits(&ab_labels(), [("C", true)], 1),
            Err(Error::UnknownName(_))
        );
    }

    #[test]
    fn hold_time_limits() {
        assert_ok!(TimingState::new(0, MAX_HOLD_TIME));
        assert_matches!(
            TimingState::new(0, MAX_HOLD_TIME + 1),
            Err(Error::InvalidHoldTime(0x100_0000))
        );
        assert_matches!(
            TimingState::from_named_bits(&ab_labels(), [("A", false)], 1 << 24),
            Err(Error::InvalidHoldTime(_))
        );
    }

    #[test]
    fn bit_sequence_is_positional() {
        let bits = [true, true, true, true, false, false, false, false];
        let state = TimingState::from_bit_sequence(&bits, 22, &NullObserver).unwrap();
        assert_eq!(state.pins(), 0x0F);
        assert_eq!(state.encode(), (0x0F << 24) | 22);
    }

    #[test]
    fn short_bit_sequence_is_reported() {
        let recorder = Recorder::default();
        assert_ok!(TimingState::from_bit_sequence(&[true; 8], 1, &recorder));
        assert_eq!(
            recorder.0.borrow().as_slice(),
            &[Event::ShortBitSequence {
                given: 8,
                expected: 64
            }]
        );

        let recorder = Recorder::default();
        let full = assert_ok!(TimingState::from_bit_sequence(&[true; 64], 1, &recorder));
        assert!(recorder.0.borrow().is_empty());
        assert_eq!(full.pins(), u64::MAX);
    }

    #[test]
    fn too_many_bits() {
        assert_matches!(
            TimingState::from_bit_sequence(&[false; 65], 1, &NullObserver),
            Err(Error::TooManyBits(65))
        );
    }

    #[test]
    fn table_builds_one_state_per_column() {
        let states = TimingState::from_named_bits_table(
            &ab_labels(),
            [("A", [true, false, true]), ("B", [false, true, true])],
            &[5, 6, 7],
        )
        .unwrap();
        let pins: Vec<_> = states.iter().map(|s| s.pins()).collect();
        let times: Vec<_> = states.iter().map(|s| s.hold_time()).collect();
        assert_eq!(pins, vec![0b01, 0b10, 0b11]);
        assert_eq!(times, vec![5, 6, 7]);
    }

    #[test]
    fn table_rejects_ragged_columns() {
        let res = TimingState::from_named_bits_table(
            &ab_labels(),
            vec![("A", vec![true, false]), ("B", vec![true])],
            &[1, 2],
        );
        assert_matches!(
            res,
            Err(Error::LengthMismatch { len: 1, expected: 2, .. })
        );
    }

    #[test]
    fn round_trip_extremes() {
        for (pins, hold) in [(0, 0), (u64::MAX, MAX_HOLD_TIME), (1 << 63, 1), (0xDEAD_BEEF, 0xABCDEF)] {
            let state = TimingState::new(pins, hold).unwrap();
            let word = state.encode();
            assert_eq!(tag_of(word), STATE_TAG);
            assert_ok_eq!(TimingState::decode(word), state);
        }
    }

    #[test]
    fn decode_rejects_headers() {
        assert_matches!(TimingState::decode(0x80 << 88), Err(Error::InvalidWord(_)));
    }
}
