use tokio::sync::watch;

/// Receives coarse percentage updates
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: u8);
}

/// Slice of the overall 0..=100 range reserved for one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressBand {
    start: u8,
    end: u8,
}

impl ProgressBand {
    pub const FULL: ProgressBand = ProgressBand { start: 0, end: 100 };

    pub const fn new(start: u8, end: u8) -> Self {
        let end = if end > 100 { 100 } else { end };
        let start = if start > end { end } else { start };
        Self { start, end }
    }

    pub fn start(&self) -> u8 {
        self.start
    }

    pub fn end(&self) -> u8 {
        self.end
    }

    /// Map `done` of `total` steps into this band
    pub fn at(&self, done: usize, total: usize) -> u8 {
        if total == 0 || done >= total {
            return self.end;
        }
        let span = (self.end - self.start) as usize;
        self.start + (span * done / total) as u8
    }
}

/// Percentage of one scan invocation, observable through a watch channel.
///
/// Updates never move backwards; `reset` returns to 0 once the scan ends.
#[derive(Debug)]
pub struct ScanProgress {
    sender: watch::Sender<u8>,
}

impl ScanProgress {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Self { sender }
    }

    pub fn subscribe(&self) -> watch::Receiver<u8> {
        self.sender.subscribe()
    }

    pub fn current(&self) -> u8 {
        *self.sender.borrow()
    }

    pub fn reset(&self) {
        self.sender.send_replace(0);
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ScanProgress {
    fn report(&self, percent: u8) {
        let percent = percent.min(100);
        self.sender.send_if_modified(|current| {
            if percent > *current {
                *current = percent;
                true
            } else {
                false
            }
        });
    }
}
