use parking_lot::{Condvar, Mutex};

/// One-shot gate that holds every runner until all of them are ready.
///
/// The open flag is sticky, so a runner that reaches `wait` after `open` goes
/// straight through instead of missing the wakeup.
#[derive(Default)]
pub struct StartGate {
    open: Mutex<bool>,
    opened: Condvar,
}

impl StartGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wait(&self) {
        let mut open = self.open.lock();
        while !*open {
            self.opened.wait(&mut open);
        }
    }

    pub fn open(&self) {
        *self.open.lock() = true;
        self.opened.notify_all();
    }

    pub fn is_open(&self) -> bool {
        *self.open.lock()
    }
}
