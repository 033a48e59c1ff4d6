//! In-process stand-in for the Dante test libraries.
//!
//! Builds its replies out of raw `libc` allocations shaped exactly like the
//! native buffers, so the full marshaling path runs in tests without the
//! DLLs. String fields inside record blocks point into an intern arena owned
//! by the driver (the marshaler copies but never frees them); top-level
//! elements, nested label/group arrays and the outer buffers are caller-owned
//! and handed to [`NativeDriver::release`] like the real thing.

use std::collections::HashMap;
use std::ffi::{c_char, c_void, CString};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use dantelink_core::domain::channel::DBU_RAW_UNSET;
use dantelink_core::{DanteError, Result};
use tracing::trace;

use crate::native::driver::{NativeDriver, RawReply, RawSession};
use crate::native::records::{RawRxChannel, RawSdpDescriptor, RawSdpGroup, RawTxChannel, RawTxLabel};

const BAD_COMMAND: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FakeMode {
    Routing,
    Browsing,
}

#[derive(Debug, Clone)]
struct RxState {
    id: u16,
    name: String,
    dbu_raw: i16,
    sub: String,
    status: u8,
}

#[derive(Debug, Clone)]
struct TxState {
    id: u16,
    name: String,
    labels: Vec<String>,
}

#[derive(Debug)]
struct FakeSessionState {
    rx: Vec<RxState>,
    tx: Vec<TxState>,
}

impl FakeSessionState {
    fn seeded() -> Self {
        let rx = (1u16..=4)
            .map(|id| RxState {
                id,
                name: format!("{id:02}"),
                // channel 1 has never carried signal
                dbu_raw: if id == 1 { DBU_RAW_UNSET } else { -20 },
                sub: if id == 2 {
                    "02@FOH-CONSOLE".to_string()
                } else {
                    String::new()
                },
                status: if id == 2 { 0x02 } else { 0x00 },
            })
            .collect();
        let tx = (1u16..=4)
            .map(|id| TxState {
                id,
                name: format!("{id:02}"),
                labels: Vec::new(),
            })
            .collect();
        Self { rx, tx }
    }
}

/// Stand-in driver; one instance models one DLL.
pub struct FakeDriver {
    mode: FakeMode,
    wrapper_name: String,
    sessions: Mutex<HashMap<u64, FakeSessionState>>,
    arena: Mutex<Vec<CString>>,
    next_id: AtomicU64,
    opens: AtomicUsize,
    steps: AtomicUsize,
    closes: AtomicUsize,
}

impl FakeDriver {
    pub fn routing() -> Self {
        Self::new(FakeMode::Routing, "DanteRoutingWrapper")
    }

    pub fn browsing() -> Self {
        Self::new(FakeMode::Browsing, "DanteBrowsingWrapper")
    }

    fn new(mode: FakeMode, wrapper_name: &str) -> Self {
        Self {
            mode,
            wrapper_name: wrapper_name.to_string(),
            sessions: Mutex::new(HashMap::new()),
            arena: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            opens: AtomicUsize::new(0),
            steps: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn steps(&self) -> usize {
        self.steps.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn live_sessions(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// Hand out a stable pointer to an interned copy of `text`. `CString`
    /// heap buffers do not move when the arena vector grows.
    fn intern(&self, text: &str) -> *const c_char {
        let mut arena = self.arena.lock().unwrap();
        let owned = CString::new(text).unwrap_or_default();
        let ptr = owned.as_ptr();
        arena.push(owned);
        ptr
    }

    fn session_id(session: RawSession) -> u64 {
        // SAFETY: handles produced by open point at a u64 id block.
        unsafe { *(session as *const u64) }
    }

    fn respond(&self, id: u64, line: &str) -> Result<RawReply> {
        let mut sessions = self.sessions.lock().unwrap();
        let state = sessions.get_mut(&id).ok_or(DanteError::NotInitialized)?;
        trace!(line, "fake command");
        match self.mode {
            FakeMode::Routing => self.respond_routing(state, line),
            FakeMode::Browsing => self.respond_browsing(line),
        }
    }

    fn respond_routing(&self, state: &mut FakeSessionState, line: &str) -> Result<RawReply> {
        let line = line.trim();
        match line {
            "r" => {
                let blocks = state
                    .rx
                    .iter()
                    .map(|channel| self.rx_block(channel))
                    .collect();
                return Ok(reply(blocks));
            }
            "t" => {
                let blocks = state
                    .tx
                    .iter()
                    .map(|channel| self.tx_block(channel))
                    .collect();
                return Ok(reply(blocks));
            }
            "l" => {
                let blocks = state
                    .tx
                    .iter()
                    .map(|channel| self.label_block(channel))
                    .collect();
                return Ok(reply(blocks));
            }
            _ => {}
        }
        if line.is_empty() {
            return Err(DanteError::OperationFailed(BAD_COMMAND));
        }
        let (verb, rest) = line.split_at(1);
        let (index, name) = parse_indexed(rest).ok_or(DanteError::OperationFailed(BAD_COMMAND))?;
        match verb {
            "r" => {
                let channel = state
                    .rx
                    .iter_mut()
                    .find(|channel| channel.id == index)
                    .ok_or(DanteError::OperationFailed(BAD_COMMAND))?;
                channel.name = name;
                Ok(RawReply::empty())
            }
            "s" => {
                let channel = state
                    .tx
                    .iter_mut()
                    .find(|channel| channel.id == index)
                    .ok_or(DanteError::OperationFailed(BAD_COMMAND))?;
                channel.name = name;
                Ok(RawReply::empty())
            }
            "l" if rest.trim_end().ends_with('+') => {
                let channel = state
                    .tx
                    .iter_mut()
                    .find(|channel| channel.id == index)
                    .ok_or(DanteError::OperationFailed(BAD_COMMAND))?;
                channel.labels.push(name);
                Ok(RawReply::empty())
            }
            _ => Err(DanteError::OperationFailed(BAD_COMMAND)),
        }
    }

    fn respond_browsing(&self, line: &str) -> Result<RawReply> {
        match line.trim() {
            "r d" => Ok(reply(vec![
                caller_string("DESKTOP-VSC"),
                caller_string("AVIO-INPUT"),
            ])),
            "p" => Ok(reply(vec![self.sdp_block()])),
            _ => Err(DanteError::OperationFailed(BAD_COMMAND)),
        }
    }

    fn rx_block(&self, channel: &RxState) -> *mut c_void {
        let block = alloc::<RawRxChannel>();
        // SAFETY: freshly allocated, correctly sized block.
        unsafe {
            (*block).id = channel.id;
            (*block).stale = 0;
            (*block).name = self.intern(&channel.name);
            (*block).format = self.intern("48k");
            (*block).latency = self.intern("1 msec");
            (*block).muted = 0;
            (*block).dbu = channel.dbu_raw;
            (*block).subscription = self.intern(&channel.sub);
            (*block).status = channel.status;
            (*block).flow = std::ptr::null();
        }
        block as *mut c_void
    }

    fn tx_block(&self, channel: &TxState) -> *mut c_void {
        let block = alloc::<RawTxChannel>();
        // SAFETY: freshly allocated, correctly sized block.
        unsafe {
            (*block).id = channel.id;
            (*block).stale = 0;
            (*block).name = self.intern(&channel.name);
            (*block).format = self.intern("48k");
            (*block).enabled = 1;
            (*block).muted = 0;
            (*block).dbu = -18;
        }
        block as *mut c_void
    }

    fn label_block(&self, channel: &TxState) -> *mut c_void {
        let aliases: Vec<*mut c_void> = channel
            .labels
            .iter()
            .map(|alias| caller_string(alias))
            .collect();
        let block = alloc::<RawTxLabel>();
        // SAFETY: freshly allocated, correctly sized block.
        unsafe {
            (*block).id = channel.id;
            (*block).is_empty = i32::from(channel.labels.is_empty());
            (*block).name = self.intern(&channel.name);
            (*block).label_count = aliases.len() as i32;
            (*block).labels = if aliases.is_empty() {
                std::ptr::null_mut()
            } else {
                caller_array(&aliases)
            };
        }
        block as *mut c_void
    }

    fn sdp_block(&self) -> *mut c_void {
        let group = alloc::<RawSdpGroup>();
        // SAFETY: freshly allocated, correctly sized blocks.
        unsafe {
            (*group).address = self.intern("239.69.10.10");
            (*group).port = 5004;
            (*group).id = self.intern("1");
            let block = alloc::<RawSdpDescriptor>();
            (*block).username = self.intern("dante");
            (*block).session_name = self.intern("DESKTOP-VSC : 2");
            (*block).session_id = 0x5f3e_0001;
            (*block).originator_address = self.intern("192.168.1.40");
            (*block).is_dante = 1;
            (*block).media_clock_offset = 0;
            (*block).stream_payload_type = 97;
            (*block).groups_count = 1;
            (*block).groups = caller_array(&[group as *mut c_void]);
            (*block).gmid = self.intern("00-1D-C1-FF-FE-00-00-01");
            (*block).sub_domain = self.intern("_default");
            (*block).stream_sample_rate = 48_000;
            (*block).stream_encoding = 16;
            (*block).stream_num_chans = 2;
            (*block).stream_dir = 3;
            block as *mut c_void
        }
    }
}

impl NativeDriver for FakeDriver {
    fn open(&self, argv: &[&str]) -> Result<RawSession> {
        if argv.first() != Some(&self.wrapper_name.as_str()) || argv.len() < 2 {
            return Err(DanteError::OperationFailed(1));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .lock()
            .unwrap()
            .insert(id, FakeSessionState::seeded());
        self.opens.fetch_add(1, Ordering::SeqCst);
        // SAFETY: allocating and initialising the handle id block.
        unsafe {
            let block = libc::malloc(std::mem::size_of::<u64>()) as *mut u64;
            *block = id;
            Ok(block as RawSession)
        }
    }

    unsafe fn step(&self, session: RawSession) -> Result<()> {
        let id = Self::session_id(session);
        if !self.sessions.lock().unwrap().contains_key(&id) {
            return Err(DanteError::NotInitialized);
        }
        self.steps.fetch_add(1, Ordering::SeqCst);
        // the real step paces the poll loop
        std::thread::sleep(Duration::from_millis(1));
        Ok(())
    }

    unsafe fn process_line(&self, session: RawSession, line: &str) -> Result<RawReply> {
        self.respond(Self::session_id(session), line)
    }

    unsafe fn close(&self, session: RawSession) {
        let id = Self::session_id(session);
        self.sessions.lock().unwrap().remove(&id);
        self.closes.fetch_add(1, Ordering::SeqCst);
        libc::free(session);
    }

    fn run_once(&self, argv: &[&str], line: &str) -> Result<RawReply> {
        let session = self.open(argv)?;
        // SAFETY: session was just opened and is not shared.
        let outcome = unsafe { self.process_line(session, line) };
        // SAFETY: closes the handle opened above, exactly once.
        unsafe { self.close(session) };
        outcome
    }

    unsafe fn release(&self, block: *mut c_void) {
        libc::free(block);
    }
}

fn alloc<T>() -> *mut T {
    // SAFETY: size comes from the type being allocated.
    unsafe { libc::malloc(std::mem::size_of::<T>()) as *mut T }
}

fn caller_string(text: &str) -> *mut c_void {
    let source = CString::new(text).unwrap_or_default();
    let bytes = source.as_bytes_with_nul();
    // SAFETY: copy fits the fresh allocation exactly.
    unsafe {
        let block = libc::malloc(bytes.len());
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), block as *mut u8, bytes.len());
        block
    }
}

fn caller_array(blocks: &[*mut c_void]) -> *mut *mut c_void {
    // SAFETY: the allocation holds exactly `blocks.len()` pointers.
    unsafe {
        let array =
            libc::malloc(blocks.len() * std::mem::size_of::<*mut c_void>()) as *mut *mut c_void;
        for (index, block) in blocks.iter().enumerate() {
            *array.add(index) = *block;
        }
        array
    }
}

fn reply(blocks: Vec<*mut c_void>) -> RawReply {
    if blocks.is_empty() {
        return RawReply::empty();
    }
    let count = blocks.len() as i32;
    RawReply {
        array: caller_array(&blocks),
        count,
    }
}

/// Parse `<n> "<name>"` with an optional trailing marker after the quote.
fn parse_indexed(rest: &str) -> Option<(u16, String)> {
    let open = rest.find('"')?;
    let index: u16 = rest[..open].trim().parse().ok()?;
    let tail = &rest[open + 1..];
    let close = tail.find('"')?;
    Some((index, tail[..close].to_string()))
}
