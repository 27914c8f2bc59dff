//! Palette selection notifications.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use image::RgbaImage;

use super::template::PieceTemplate;

/// Receives the template chosen in the palette.
pub trait SelectionObserver {
    fn on_template_selected(&mut self, template: Rc<PieceTemplate>, preview: Option<Rc<RgbaImage>>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// Synchronous one-to-many notifier. Subscribers are held weakly, so a
/// dropped observer simply stops receiving events. Nothing is queued: with no
/// live subscribers a selection is dropped.
#[derive(Default)]
pub struct SelectionBridge {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Weak<RefCell<dyn SelectionObserver>>)>,
}

impl SelectionBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<O: SelectionObserver + 'static>(&mut self, observer: &Rc<RefCell<O>>) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        let observer: Rc<RefCell<dyn SelectionObserver>> = observer.clone();
        self.subscribers.push((id, Rc::downgrade(&observer)));
        id
    }

    #[cfg(test)]
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }

    /// Number of subscribers still alive.
    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.iter().filter(|(_, w)| w.strong_count() > 0).count()
    }

    /// Notify every live subscriber in subscription order. Returns how many
    /// were notified.
    pub fn publish(&mut self, template: &Rc<PieceTemplate>, preview: Option<&Rc<RgbaImage>>) -> usize {
        self.subscribers.retain(|(_, w)| w.strong_count() > 0);
        let mut notified = 0;
        for (id, weak) in &self.subscribers {
            let Some(observer) = weak.upgrade() else { continue };
            match observer.try_borrow_mut() {
                Ok(mut observer) => {
                    observer.on_template_selected(template.clone(), preview.cloned());
                    notified += 1;
                }
                Err(_) => log::warn!("Selection subscriber {id:?} is busy; skipped"),
            }
        }
        if notified == 0 {
            log::debug!("Selection of '{}' dropped: no subscribers", template.name);
        }
        notified
    }
}
