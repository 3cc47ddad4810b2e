//! Thread-safe inbound queue
//!
//! Other nodes push into a mailbox from their own tasks while the owner
//! drains it from its scheduling loop. The queue is unbounded and FIFO.

use std::collections::VecDeque;

use parking_lot::Mutex;
use resq_core::Message;

#[derive(Debug, Default)]
pub struct Mailbox {
    queue: Mutex<VecDeque<Message>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message; never rejects
    pub fn push(&self, message: Message) {
        self.queue.lock().push_back(message);
    }

    /// Remove up to `max` messages from the front
    pub fn drain_batch(&self, max: usize) -> Vec<Message> {
        let mut queue = self.queue.lock();
        let n = max.min(queue.len());
        queue.drain(..n).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Copy of the messages still waiting
    pub fn snapshot(&self) -> Vec<Message> {
        self.queue.lock().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fifo_batches() {
        let mailbox = Mailbox::new();
        for i in 0..7 {
            mailbox.push(Message::new("A", "B", format!("m{i}")));
        }
        let first = mailbox.drain_batch(5);
        assert_eq!(first.len(), 5);
        assert_eq!(first[0].text, "m0");
        assert_eq!(first[4].text, "m4");
        assert_eq!(mailbox.len(), 2);

        let rest = mailbox.drain_batch(5);
        assert_eq!(rest.iter().map(|m| m.text.as_str()).collect::<Vec<_>>(), ["m5", "m6"]);
        assert!(mailbox.is_empty());
        assert!(mailbox.drain_batch(5).is_empty());
    }

    #[test]
    fn test_snapshot_does_not_consume() {
        let mailbox = Mailbox::new();
        mailbox.push(Message::new("A", "B", "x"));
        assert_eq!(mailbox.snapshot().len(), 1);
        assert_eq!(mailbox.len(), 1);
    }

    #[test]
    fn test_concurrent_push() {
        let mailbox = Arc::new(Mailbox::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let mailbox = Arc::clone(&mailbox);
                thread::spawn(move || {
                    for i in 0..100 {
                        mailbox.push(Message::new("A", "B", format!("{t}-{i}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(mailbox.len(), 800);
    }
}
