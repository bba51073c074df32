use anyhow::Result;
pub use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::collections::VecDeque;
use std::time::Duration;

/// Where terminal input comes from, so the UI loop can be driven in tests
pub trait EventSource {
    /// Wait up to `timeout` for input
    fn poll(&mut self, timeout: Duration) -> Result<bool>;

    /// Read the next event
    fn read(&mut self) -> Result<Event>;
}

/// Real terminal input through crossterm
pub struct KeyboardEventSource;

impl EventSource for KeyboardEventSource {
    fn poll(&mut self, timeout: Duration) -> Result<bool> {
        Ok(crossterm::event::poll(timeout)?)
    }

    fn read(&mut self) -> Result<Event> {
        Ok(crossterm::event::read()?)
    }
}

/// Scripted input for tests. Once the script runs out it answers with `q`.
pub struct SimulatedEventSource {
    pub(crate) events: VecDeque<Event>,
}

impl SimulatedEventSource {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events: events.into(),
        }
    }

    /// A pressed key with no modifiers
    pub fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    pub fn char_key(c: char) -> Event {
        Self::key(KeyCode::Char(c))
    }

    /// One key press per character of `keys`
    pub fn typed(keys: &str) -> Vec<Event> {
        keys.chars().map(Self::char_key).collect()
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl EventSource for SimulatedEventSource {
    fn poll(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(true)
    }

    fn read(&mut self) -> Result<Event> {
        Ok(self
            .events
            .pop_front()
            .unwrap_or_else(|| Self::char_key('q')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_is_replayed_then_quits() {
        let mut source = SimulatedEventSource::new(SimulatedEventSource::typed("l+"));
        assert_eq!(source.remaining(), 2);

        assert!(source.poll(Duration::from_millis(0)).unwrap());
        assert_eq!(source.read().unwrap(), SimulatedEventSource::char_key('l'));
        assert_eq!(source.read().unwrap(), SimulatedEventSource::char_key('+'));
        assert_eq!(source.remaining(), 0);

        assert!(source.poll(Duration::from_millis(0)).unwrap());
        match source.read().unwrap() {
            Event::Key(key) => {
                assert_eq!(key.code, KeyCode::Char('q'));
                assert_eq!(key.kind, KeyEventKind::Press);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
