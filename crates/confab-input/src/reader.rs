#![forbid(unsafe_code)]

//! Polling event reader.
//!
//! [`EventReader`] owns the raw input descriptor (already in raw mode,
//! courtesy of the terminal-session layer) and turns its byte stream into
//! [`Event`] values, one per [`EventReader::next_event`] call. Each call
//! blocks for at most one poll timeout, which lets a single-threaded event
//! loop interleave input with periodic UI refresh without a timer thread.
//!
//! Two wake-up paths besides input bytes:
//! - an optional notify descriptor: background work writes a byte to it to
//!   wake the poll; it is drained fully and reported as [`Event::Notify`]
//!   without consuming any pending input bytes
//! - SIGWINCH, delivered through a dedicated signal thread and a coalescing
//!   channel, reported as [`Event::Resize`]
//!
//! The poll timeout doubles as the Escape disambiguator: a lone `ESC` still
//! buffered when the poll comes back empty is the Escape key, not the start
//! of a sequence. The window is a policy knob ([`with_timeout`]) — under a
//! slow pipe a sequence split around it can still be misread as Escape plus
//! text, which is inherent to the protocol.
//!
//! [`with_timeout`]: EventReader::with_timeout

use std::fs::File;
use std::io::{self, Read};
use std::os::fd::AsFd;
use std::sync::mpsc;
use std::time::Duration;

use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use signal_hook::consts::signal::SIGWINCH;
use signal_hook::iterator::Signals;

use confab_core::event::{Event, Key};

use crate::buffer::InputBuffer;
use crate::decode::{Step, decode};
use crate::paste::PasteAccumulator;

/// Default poll window, also the Escape disambiguation window.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(100);

// Resize notifications are produced via SIGWINCH on Unix.
//
// A dedicated signal thread avoids unsafe `sigaction` calls in-tree
// (unsafe is forbidden) while still delivering low-latency resize events.
#[derive(Debug)]
struct ResizeSignalGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl ResizeSignalGuard {
    fn new(tx: mpsc::SyncSender<()>) -> io::Result<Self> {
        let mut signals = Signals::new([SIGWINCH]).map_err(io::Error::other)?;
        let handle = signals.handle();
        let thread = std::thread::spawn(move || {
            for _ in signals.forever() {
                // Coalesce storms: one pending notification is enough, the
                // consumer queries the authoritative size itself.
                let _ = tx.try_send(());
            }
        });

        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

impl Drop for ResizeSignalGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// What the poll round produced.
enum Wait {
    /// The input descriptor has bytes (or hit EOF).
    Input,
    /// The notify descriptor is readable.
    Notify,
    /// The notify descriptor's writer is gone; stop watching it.
    NotifyClosed,
    /// Nothing within the window (or EINTR).
    Timeout,
}

/// Outcome of one decode step over buffered bytes.
enum Decoded {
    Event(Event),
    /// Garbage was consumed; nothing to report this call.
    Quiet,
    /// The paste start marker was consumed.
    PasteStarted,
    /// Not enough bytes buffered to classify anything.
    NeedMore,
}

/// Turns a raw terminal byte stream into input events.
pub struct EventReader {
    input: File,
    /// Wake-up descriptor written to by background tasks.
    notify: Option<File>,
    buf: InputBuffer,
    paste: PasteAccumulator,
    timeout: Duration,
    /// Resize notifications (SIGWINCH) are delivered through this channel.
    resize_rx: Option<mpsc::Receiver<()>>,
    /// Owns the SIGWINCH handler thread (kept alive by this field).
    _resize_guard: Option<ResizeSignalGuard>,
}

impl EventReader {
    /// Create a reader over an input descriptor. The descriptor is expected
    /// to already be in raw/non-canonical mode.
    #[must_use]
    pub fn new(input: File) -> Self {
        Self {
            input,
            notify: None,
            buf: InputBuffer::new(),
            paste: PasteAccumulator::new(),
            timeout: DEFAULT_POLL_TIMEOUT,
            resize_rx: None,
            _resize_guard: None,
        }
    }

    /// Watch `notify` alongside the input descriptor; a write to it wakes
    /// the poll and surfaces as [`Event::Notify`].
    #[must_use]
    pub fn with_notify(mut self, notify: File) -> Self {
        self.notify = Some(notify);
        self
    }

    /// Override the poll window (and with it the Escape disambiguation
    /// window).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Install the SIGWINCH handler so terminal resizes surface as
    /// [`Event::Resize`].
    pub fn with_resize_events(mut self) -> io::Result<Self> {
        let (tx, rx) = mpsc::sync_channel(1);
        let guard = ResizeSignalGuard::new(tx)?;
        self.resize_rx = Some(rx);
        self._resize_guard = Some(guard);
        Ok(self)
    }

    /// Produce the next event, blocking for at most one poll timeout.
    ///
    /// `Ok(None)` means "nothing yet": a quiet poll, an incomplete sequence
    /// still in flight, or swallowed garbage. Errors other than
    /// would-block/EINTR are fatal to the stream.
    pub fn next_event(&mut self) -> io::Result<Option<Event>> {
        if let Some(rx) = &self.resize_rx
            && rx.try_recv().is_ok()
        {
            return Ok(Some(Event::Resize));
        }

        if self.paste.is_active() {
            return self.pump_paste();
        }

        match self.step_buffered() {
            Decoded::Event(ev) => Ok(Some(ev)),
            Decoded::Quiet => Ok(None),
            Decoded::PasteStarted => self.pump_paste(),
            Decoded::NeedMore => {
                self.buf.compact();
                match self.wait_ready()? {
                    Wait::Notify => {
                        self.drain_notify()?;
                        Ok(Some(Event::Notify))
                    }
                    Wait::NotifyClosed => {
                        self.notify = None;
                        self.quiesce()
                    }
                    Wait::Timeout => self.quiesce(),
                    Wait::Input => {
                        if self.refill()? == 0 {
                            return self.quiesce();
                        }
                        match self.step_buffered() {
                            Decoded::Event(ev) => Ok(Some(ev)),
                            Decoded::Quiet => Ok(None),
                            Decoded::PasteStarted => self.pump_paste(),
                            Decoded::NeedMore => Ok(None),
                        }
                    }
                }
            }
        }
    }

    /// Run one decode step over the buffered bytes.
    fn step_buffered(&mut self) -> Decoded {
        if self.buf.is_empty() {
            return Decoded::NeedMore;
        }
        match decode(self.buf.unread()) {
            Step::Emit(ev, n) => {
                self.buf.consume(n);
                Decoded::Event(ev)
            }
            Step::Skip(n) => {
                self.buf.consume(n);
                Decoded::Quiet
            }
            Step::PasteBegin(n) => {
                self.buf.consume(n);
                self.paste.begin();
                Decoded::PasteStarted
            }
            Step::Pending => Decoded::NeedMore,
        }
    }

    /// One paste-accumulation round: scan buffered bytes, then at most one
    /// poll + read.
    fn pump_paste(&mut self) -> io::Result<Option<Event>> {
        if let Some(payload) = self.feed_paste() {
            return Ok(Some(Event::Paste(payload)));
        }
        self.buf.compact();
        match self.wait_ready()? {
            Wait::Notify => {
                self.drain_notify()?;
                Ok(Some(Event::Notify))
            }
            Wait::NotifyClosed => {
                self.notify = None;
                Ok(None)
            }
            Wait::Timeout => Ok(None),
            Wait::Input => {
                if self.refill()? == 0 {
                    // EOF mid-paste: the buffered tail can no longer grow
                    // into the end marker, so it is payload.
                    let tail = self.buf.unread().to_vec();
                    self.paste.push_all(&tail);
                    self.buf.consume(tail.len());
                    return Ok(self.paste.finish().map(Event::Paste));
                }
                Ok(self.feed_paste().map(Event::Paste))
            }
        }
    }

    fn feed_paste(&mut self) -> Option<Vec<u8>> {
        let (consumed, done) = self.paste.feed(self.buf.unread());
        self.buf.consume(consumed);
        done
    }

    /// Quiet poll: nothing new arrived. A single buffered `ESC` byte means
    /// the user pressed bare Escape rather than starting a sequence.
    fn quiesce(&mut self) -> io::Result<Option<Event>> {
        if self.buf.unread() == [0x1b] {
            self.buf.consume(1);
            return Ok(Some(Event::Key(Key::Escape)));
        }
        Ok(None)
    }

    /// Read once into the buffer. Would-block and EINTR count as zero bytes.
    fn refill(&mut self) -> io::Result<usize> {
        match self.buf.fill_from(&mut self.input) {
            Ok(n) => Ok(n),
            Err(e) if matches!(
                e.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
            ) =>
            {
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    /// `poll(2)` over the input and (if configured) notify descriptors.
    ///
    /// The notify descriptor wins ties: reporting it never consumes input
    /// bytes, they stay queued for the next call.
    fn wait_ready(&mut self) -> io::Result<Wait> {
        let timeout_ms: u16 = self.timeout.as_millis().try_into().unwrap_or(u16::MAX);
        let timeout = PollTimeout::from(timeout_ms);

        let Some(notify) = &self.notify else {
            let mut fds = [PollFd::new(self.input.as_fd(), PollFlags::POLLIN)];
            return match poll(&mut fds, timeout) {
                Ok(0) => Ok(Wait::Timeout),
                Ok(_) => Ok(Wait::Input),
                Err(nix::errno::Errno::EINTR) => Ok(Wait::Timeout),
                Err(e) => Err(io::Error::other(e)),
            };
        };

        let mut fds = [
            PollFd::new(self.input.as_fd(), PollFlags::POLLIN),
            PollFd::new(notify.as_fd(), PollFlags::POLLIN),
        ];
        let ready = match poll(&mut fds, timeout) {
            Ok(n) => n,
            Err(nix::errno::Errno::EINTR) => return Ok(Wait::Timeout),
            Err(e) => return Err(io::Error::other(e)),
        };
        if ready == 0 {
            return Ok(Wait::Timeout);
        }
        let notify_revents = fds[1].revents().unwrap_or(PollFlags::empty());
        if notify_revents.contains(PollFlags::POLLIN) {
            return Ok(Wait::Notify);
        }
        if notify_revents
            .intersects(PollFlags::POLLHUP | PollFlags::POLLERR | PollFlags::POLLNVAL)
        {
            return Ok(Wait::NotifyClosed);
        }
        Ok(Wait::Input)
    }

    /// Drain the notify descriptor without ever blocking on it.
    fn drain_notify(&mut self) -> io::Result<()> {
        let Some(notify) = &mut self.notify else {
            return Ok(());
        };
        let mut scratch = [0u8; 64];
        loop {
            let ready = {
                let mut fds = [PollFd::new(notify.as_fd(), PollFlags::POLLIN)];
                match poll(&mut fds, PollTimeout::ZERO) {
                    Ok(n) => n > 0,
                    Err(nix::errno::Errno::EINTR) => continue,
                    Err(e) => return Err(io::Error::other(e)),
                }
            };
            if !ready {
                break;
            }
            match notify.read(&mut scratch) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
                {
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confab_core::event::MouseEvent;
    use std::io::Write;

    /// Create a (reader_file, writer_stream) pair using Unix sockets.
    fn pipe_pair() -> (File, std::os::unix::net::UnixStream) {
        use std::os::unix::net::UnixStream;
        let (a, b) = UnixStream::pair().unwrap();
        let reader: File = std::os::fd::OwnedFd::from(a).into();
        (reader, b)
    }

    fn fast_reader(input: File) -> EventReader {
        EventReader::new(input).with_timeout(Duration::from_millis(25))
    }

    #[test]
    fn ascii_keys_in_order() {
        let (reader, mut writer) = pipe_pair();
        let mut src = fast_reader(reader);
        writer.write_all(b"hi").unwrap();
        assert_eq!(
            src.next_event().unwrap(),
            Some(Event::Key(Key::Char('h')))
        );
        assert_eq!(
            src.next_event().unwrap(),
            Some(Event::Key(Key::Char('i')))
        );
    }

    #[test]
    fn arrow_and_ctrl_keys() {
        let (reader, mut writer) = pipe_pair();
        let mut src = fast_reader(reader);
        writer.write_all(b"\x1b[A\x03").unwrap();
        assert_eq!(src.next_event().unwrap(), Some(Event::Key(Key::Up)));
        assert_eq!(src.next_event().unwrap(), Some(Event::Key(Key::CtrlC)));
    }

    #[test]
    fn utf8_across_fragments() {
        let (reader, mut writer) = pipe_pair();
        let mut src = fast_reader(reader);
        let beta = "β".as_bytes();
        writer.write_all(&beta[..1]).unwrap();
        // First half only: not decodable yet.
        assert_eq!(src.next_event().unwrap(), None);
        writer.write_all(&beta[1..]).unwrap();
        assert_eq!(
            src.next_event().unwrap(),
            Some(Event::Key(Key::Char('β')))
        );
    }

    #[test]
    fn sequence_split_across_reads_is_retried_whole() {
        let (reader, mut writer) = pipe_pair();
        let mut src = fast_reader(reader);
        writer.write_all(b"\x1b[").unwrap();
        assert_eq!(src.next_event().unwrap(), None);
        writer.write_all(b"1;5D").unwrap();
        assert_eq!(src.next_event().unwrap(), Some(Event::Key(Key::CtrlLeft)));
    }

    #[test]
    fn lone_escape_resolved_by_timeout() {
        let (reader, mut writer) = pipe_pair();
        let mut src = fast_reader(reader);
        writer.write_all(b"\x1b").unwrap();
        // First call reads the byte but cannot classify it yet.
        assert_eq!(src.next_event().unwrap(), None);
        // Second call times out with a single buffered ESC: bare Escape.
        assert_eq!(src.next_event().unwrap(), Some(Event::Key(Key::Escape)));
    }

    #[test]
    fn escape_prefix_replays_trailing_byte() {
        let (reader, mut writer) = pipe_pair();
        let mut src = fast_reader(reader);
        writer.write_all(b"\x1bq").unwrap();
        assert_eq!(src.next_event().unwrap(), Some(Event::Key(Key::Escape)));
        assert_eq!(
            src.next_event().unwrap(),
            Some(Event::Key(Key::Char('q')))
        );
    }

    #[test]
    fn mouse_report_through_reader() {
        let (reader, mut writer) = pipe_pair();
        let mut src = fast_reader(reader);
        writer.write_all(b"\x1b[<64;10;5M").unwrap();
        assert_eq!(
            src.next_event().unwrap(),
            Some(Event::Mouse(MouseEvent::ScrollUp))
        );
    }

    #[test]
    fn bracketed_paste_single_read() {
        let (reader, mut writer) = pipe_pair();
        let mut src = fast_reader(reader);
        writer.write_all(b"\x1b[200~hello world\x1b[201~").unwrap();
        assert_eq!(
            src.next_event().unwrap(),
            Some(Event::Paste(b"hello world".to_vec()))
        );
    }

    #[test]
    fn bracketed_paste_fragmented() {
        let (reader, mut writer) = pipe_pair();
        let mut src = fast_reader(reader);
        writer.write_all(b"\x1b[200~par").unwrap();
        assert_eq!(src.next_event().unwrap(), None);
        writer.write_all(b"tial\x1b[20").unwrap();
        assert_eq!(src.next_event().unwrap(), None);
        writer.write_all(b"1~x").unwrap();
        assert_eq!(
            src.next_event().unwrap(),
            Some(Event::Paste(b"partial".to_vec()))
        );
        // The byte after the paste is still delivered.
        assert_eq!(
            src.next_event().unwrap(),
            Some(Event::Key(Key::Char('x')))
        );
    }

    #[test]
    fn paste_flushed_on_eof() {
        let (reader, mut writer) = pipe_pair();
        let mut src = fast_reader(reader);
        writer.write_all(b"\x1b[200~oops").unwrap();
        drop(writer);
        assert_eq!(
            src.next_event().unwrap(),
            Some(Event::Paste(b"oops".to_vec()))
        );
        assert_eq!(src.next_event().unwrap(), None);
    }

    #[test]
    fn eof_with_empty_buffer_is_quiet() {
        let (reader, writer) = pipe_pair();
        let mut src = fast_reader(reader);
        drop(writer);
        assert_eq!(src.next_event().unwrap(), None);
    }

    #[test]
    fn notify_wakes_the_poll() {
        let (reader, _input_writer) = pipe_pair();
        let (notify_reader, mut notify_writer) = pipe_pair();
        let mut src = fast_reader(reader).with_notify(notify_reader);
        notify_writer.write_all(b"!").unwrap();
        assert_eq!(src.next_event().unwrap(), Some(Event::Notify));
        // Fully drained: the next call is a quiet timeout.
        assert_eq!(src.next_event().unwrap(), None);
    }

    #[test]
    fn notify_never_displaces_input_bytes() {
        let (reader, mut input_writer) = pipe_pair();
        let (notify_reader, mut notify_writer) = pipe_pair();
        let mut src = fast_reader(reader).with_notify(notify_reader);
        input_writer.write_all(b"k").unwrap();
        notify_writer.write_all(b"!").unwrap();
        // Both kinds of events arrive; no input byte is lost.
        let first = src.next_event().unwrap().unwrap();
        let second = src.next_event().unwrap().unwrap();
        let mut got = vec![first, second];
        got.sort_by_key(|e| matches!(e, Event::Notify));
        assert_eq!(
            got,
            vec![Event::Key(Key::Char('k')), Event::Notify]
        );
    }

    #[test]
    fn garbage_is_skipped_quietly() {
        let (reader, mut writer) = pipe_pair();
        let mut src = fast_reader(reader);
        writer.write_all(&[0xff]).unwrap();
        writer.write_all(b"a").unwrap();
        // The invalid byte costs one quiet call, then input resumes.
        assert_eq!(src.next_event().unwrap(), None);
        assert_eq!(
            src.next_event().unwrap(),
            Some(Event::Key(Key::Char('a')))
        );
    }
}
