//! Event types and the bounded queue that decouples input sampling and the
//! action worker from the main loop. Producers push concurrently; the loop
//! drains everything once per tick.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::action::ActionOutcome;

/// Default queue capacity; enough for several detents of backlog without
/// letting a stalled render accumulate stale input forever.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Physical push buttons on the front panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Back,
    Confirm,
}

impl Button {
    pub fn label(self) -> &'static str {
        match self {
            Button::Back => "back",
            Button::Confirm => "confirm",
        }
    }
}

/// Decoded physical input. One full encoder detent produces one rotate event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    RotateCw,
    RotateCcw,
    ButtonDown(Button),
    ButtonUp(Button),
    LongPress { button: Button, held: Duration },
    /// Back+Confirm held together past the quit threshold.
    QuitRequested,
}

/// Everything the main loop consumes. Action completions travel through the
/// same queue as input so the loop stays the only mutator of UI state.
#[derive(Debug)]
pub enum Event {
    Input(InputEvent),
    ActionDone(ActionOutcome),
}

impl Event {
    /// Input may be shed under overflow pressure; action results may not —
    /// the executor guarantees exactly-once delivery.
    fn droppable(&self) -> bool {
        matches!(self, Event::Input(_))
    }
}

struct QueueInner {
    events: VecDeque<Event>,
    dropped: u64,
}

/// Bounded multi-producer single-consumer FIFO. On overflow the oldest
/// droppable event is shed and counted; `ActionDone` entries instead let the
/// queue grow past capacity so a result is never lost.
pub struct EventQueue {
    capacity: usize,
    inner: Mutex<QueueInner>,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(QueueInner {
                events: VecDeque::with_capacity(capacity),
                dropped: 0,
            }),
        }
    }

    /// Push one event. Never blocks beyond the mutex; overflow is handled by
    /// shedding the oldest droppable entry, preserving arrival order among
    /// the survivors.
    pub fn push(&self, event: Event) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.events.len() >= self.capacity {
            if let Some(idx) = inner.events.iter().position(Event::droppable) {
                inner.events.remove(idx);
                inner.dropped += 1;
            } else if event.droppable() {
                // Queue full of undroppable results; shed the newcomer.
                inner.dropped += 1;
                return;
            }
        }
        inner.events.push_back(event);
    }

    /// Atomically remove and return everything queued so far, oldest first.
    pub fn drain_all(&self) -> Vec<Event> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.events.drain(..).collect()
    }

    /// Total events shed to overflow since startup.
    pub fn dropped(&self) -> u64 {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).dropped
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .events
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionRequest, ActionResult};

    fn rotate() -> Event {
        Event::Input(InputEvent::RotateCw)
    }

    fn down(button: Button) -> Event {
        Event::Input(InputEvent::ButtonDown(button))
    }

    fn done() -> Event {
        Event::ActionDone(ActionOutcome {
            request: ActionRequest::ShowIp,
            result: ActionResult::Success {
                text: "192.168.1.2".into(),
            },
        })
    }

    #[test]
    fn drains_in_arrival_order() {
        let queue = EventQueue::new(8);
        queue.push(rotate());
        queue.push(down(Button::Back));
        queue.push(down(Button::Confirm));
        let events = queue.drain_all();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], Event::Input(InputEvent::RotateCw)));
        assert!(matches!(
            events[1],
            Event::Input(InputEvent::ButtonDown(Button::Back))
        ));
        assert!(matches!(
            events[2],
            Event::Input(InputEvent::ButtonDown(Button::Confirm))
        ));
        assert!(queue.is_empty());
    }

    #[test]
    fn overflow_drops_oldest() {
        // Reference run from the queue contract: capacity 4, push A..F,
        // draining yields [C, D, E, F].
        let queue = EventQueue::new(4);
        let buttons = [
            Button::Back,    // A
            Button::Confirm, // B
            Button::Back,    // C
            Button::Confirm, // D
            Button::Back,    // E
            Button::Confirm, // F
        ];
        for (i, b) in buttons.into_iter().enumerate() {
            if i % 2 == 0 {
                queue.push(down(b));
            } else {
                queue.push(Event::Input(InputEvent::ButtonUp(b)));
            }
        }
        assert_eq!(queue.dropped(), 2);
        let events = queue.drain_all();
        assert_eq!(events.len(), 4);
        assert!(matches!(
            events[0],
            Event::Input(InputEvent::ButtonDown(Button::Back)) // C
        ));
        assert!(matches!(
            events[3],
            Event::Input(InputEvent::ButtonUp(Button::Confirm)) // F
        ));
    }

    #[test]
    fn action_results_survive_overflow() {
        let queue = EventQueue::new(2);
        queue.push(done());
        queue.push(rotate());
        queue.push(rotate());
        queue.push(rotate());
        let events = queue.drain_all();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, Event::ActionDone(_))),
            "result must not be shed under input pressure"
        );
    }

    #[test]
    fn result_pushed_into_full_queue_is_kept() {
        let queue = EventQueue::new(2);
        queue.push(rotate());
        queue.push(rotate());
        queue.push(done());
        let events = queue.drain_all();
        assert_eq!(events.len(), 2);
        assert!(matches!(events.last(), Some(Event::ActionDone(_))));
    }
}
