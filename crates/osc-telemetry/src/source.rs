use crate::{DeviceEvent, DeviceRequest, SourceError};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use std::time::Duration;

/// The SDK side of the bridge: a polling loop that delivers callbacks serially.
pub trait EventSource {
    /// Pump events for one polling iteration of length `window`.
    ///
    /// Returns `Ok(false)` once no further events will ever arrive.
    fn run(
        &mut self,
        window: Duration,
        on_event: &mut dyn FnMut(DeviceEvent),
    ) -> Result<bool, SourceError>;

    /// Forward a request raised while handling events back to the device.
    fn apply(&mut self, request: DeviceRequest) -> Result<(), SourceError>;
}

/// Replays newline-delimited JSON events on their recorded timeline.
///
/// Each call to [`EventSource::run`] delivers the events whose timestamps fall in the
/// next `window`-wide slice, starting from the first event's timestamp. Outside
/// real-time playback, empty stretches of the recording cost a single iteration.
/// Blank lines and lines starting with `#` are skipped.
pub struct ReplaySource<R> {
    lines: Lines<R>,
    line_no: usize,
    pending: Option<DeviceEvent>,
    window_end_us: Option<u64>,
    realtime: bool,
    exhausted: bool,
    applied: Vec<DeviceRequest>,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            pending: None,
            window_end_us: None,
            realtime: false,
            exhausted: false,
            applied: Vec::new(),
        }
    }

    /// Sleep for each polling window so playback approximates the recording.
    pub fn realtime(mut self, on: bool) -> Self {
        self.realtime = on;
        self
    }

    /// Requests forwarded so far.
    pub fn applied(&self) -> &[DeviceRequest] {
        &self.applied
    }

    fn next_event(&mut self) -> Result<Option<DeviceEvent>, SourceError> {
        for line in self.lines.by_ref() {
            self.line_no += 1;
            let line = line?;
            let t = line.trim();
            if t.is_empty() || t.starts_with('#') {
                continue;
            }
            let event = serde_json::from_str(t).map_err(|e| SourceError::Parse {
                line: self.line_no,
                message: e.to_string(),
            })?;
            return Ok(Some(event));
        }
        Ok(None)
    }
}

impl<R: BufRead> EventSource for ReplaySource<R> {
    fn run(
        &mut self,
        window: Duration,
        on_event: &mut dyn FnMut(DeviceEvent),
    ) -> Result<bool, SourceError> {
        if self.exhausted {
            return Ok(false);
        }
        if self.realtime {
            std::thread::sleep(window);
        }
        let window_us = (window.as_micros() as u64).max(1);
        loop {
            let event = match self.pending.take() {
                Some(ev) => ev,
                None => match self.next_event()? {
                    Some(ev) => ev,
                    None => {
                        self.exhausted = true;
                        return Ok(false);
                    }
                },
            };
            let end = *self
                .window_end_us
                .get_or_insert(event.timestamp_us.saturating_add(window_us));
            // A saturated window end admits everything that remains.
            if event.timestamp_us >= end && end < u64::MAX {
                let next = if self.realtime {
                    end.saturating_add(window_us)
                } else {
                    // Skip straight to the window holding the pending event.
                    let skipped = (event.timestamp_us - end) / window_us + 1;
                    end.saturating_add(skipped.saturating_mul(window_us))
                };
                self.pending = Some(event);
                self.window_end_us = Some(next);
                return Ok(true);
            }
            on_event(event);
        }
    }

    fn apply(&mut self, request: DeviceRequest) -> Result<(), SourceError> {
        match request {
            DeviceRequest::StreamEmg(handle) => {
                tracing::info!(%handle, "EMG streaming enabled");
            }
        }
        self.applied.push(request);
        Ok(())
    }
}
