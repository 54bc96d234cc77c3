//! Thread-safe dispatch: the last-value "recv pool", the append-only "keep pool", and a registry
//! of wait-conditions signalled as packets arrive.
//!
//! A single [`Mutex`] guards all of it; a single [`Condvar`], broadcast on every dispatched
//! packet, wakes every waiter, each of which re-checks its own predicate (per design notes —
//! simpler than a per-waiter condvar, and cheap enough at MAVLink's message rates).

use std::collections::{HashMap, HashSet};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use log::debug;

use crate::codec::frame::Packet;
use crate::protocol::{Content, Value};

type WaitId = u64;

struct WaitCond {
    name: String,
    predicate: Content,
    matched: Option<Packet>,
}

/// State guarded by [`Dispatch`]'s mutex. `pub(crate)` so [`Dispatch::wait_until`] callers
/// elsewhere in the crate can inspect it directly from inside the lock, the same way `wait_for`
/// inspects `waits`/`closed`.
#[derive(Default)]
pub(crate) struct DispatchState {
    pub(crate) recv_pool: HashMap<String, Packet>,
    pub(crate) keep_pool: HashMap<String, Vec<Packet>>,
    keep_all: HashSet<String>,
    param_type_cache: HashMap<String, Value>,
    waits: HashMap<WaitId, WaitCond>,
    next_wait_id: WaitId,
    pub(crate) closed: bool,
}

/// The shared dispatch state for a single [`crate::connection::Connection`].
pub struct Dispatch {
    state: Mutex<DispatchState>,
    condvar: Condvar,
}

impl Dispatch {
    /// An empty dispatch engine.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DispatchState::default()),
            condvar: Condvar::new(),
        }
    }

    /// Applies an incoming packet: updates the recv pool, the keep pool (if enabled for this
    /// name), the parameter-type cache, and signals any matching wait-conditions.
    pub fn dispatch(&self, packet: Packet) {
        let mut state = self.state.lock().unwrap();
        let name = packet.message.name().to_string();

        if name == "PARAM_VALUE" {
            if let (Some(id), Some(ty)) = (packet.content.get("param_id"), packet.content.get("param_type")) {
                if let Some(id) = id.as_str() {
                    state.param_type_cache.insert(id.to_string(), ty.clone());
                }
            }
        }

        if state.keep_all.contains(&name) {
            state.keep_pool.entry(name.clone()).or_default().push(packet.clone());
        }

        for cond in state.waits.values_mut() {
            if cond.name == name && cond.matched.is_none() && packet.content.matches(&cond.predicate) {
                cond.matched = Some(packet.clone());
            }
        }

        debug!("dispatched {name}");
        state.recv_pool.insert(name, packet);
        self.condvar.notify_all();
    }

    /// Wakes every waiter with a closed-connection signal; no further packets will be dispatched.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        self.condvar.notify_all();
    }

    /// The most recently dispatched packet for `name`, if any.
    pub fn recv(&self, name: &str) -> Option<Packet> {
        self.state.lock().unwrap().recv_pool.get(name).cloned()
    }

    /// Clears the last recorded packet for `name` (used before a request/response round trip so
    /// a stale value can't be mistaken for a fresh reply).
    pub fn clear_recv(&self, name: &str) {
        self.state.lock().unwrap().recv_pool.remove(name);
    }

    /// Enables or disables keep-pool accumulation for `name`. Disabling clears its history.
    pub fn set_keep_all(&self, name: &str, enabled: bool) {
        let mut state = self.state.lock().unwrap();
        if enabled {
            state.keep_all.insert(name.to_string());
        } else {
            state.keep_all.remove(name);
            state.keep_pool.remove(name);
        }
    }

    /// Snapshot of the keep pool for `name`.
    pub fn keep_pool(&self, name: &str) -> Vec<Packet> {
        self.state.lock().unwrap().keep_pool.get(name).cloned().unwrap_or_default()
    }

    /// The cached `param_type` for a previously seen parameter, if any.
    pub fn cached_param_type(&self, param_id: &str) -> Option<Value> {
        self.state.lock().unwrap().param_type_cache.get(param_id).cloned()
    }

    /// Blocks until a packet named `name` matching `predicate` arrives, or `timeout` elapses.
    ///
    /// Returns `None` on timeout or if the connection closes while waiting.
    pub fn wait_for(&self, name: &str, predicate: Content, timeout: Duration) -> Option<Packet> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return None;
        }

        let id = state.next_wait_id;
        state.next_wait_id += 1;
        state.waits.insert(
            id,
            WaitCond {
                name: name.to_string(),
                predicate,
                matched: None,
            },
        );

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(cond) = state.waits.get(&id) {
                if cond.matched.is_some() {
                    break;
                }
            }
            if state.closed {
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let (guard, timed_out) = self.condvar.wait_timeout(state, deadline - now).unwrap();
            state = guard;
            if timed_out.timed_out() && state.waits.get(&id).map(|c| c.matched.is_none()).unwrap_or(true) {
                break;
            }
        }

        state.waits.remove(&id).and_then(|c| c.matched)
    }

    /// Blocks while `check` returns `None`, re-evaluating it every time a packet is dispatched,
    /// until it returns `Some`, `timeout` elapses, or the connection closes.
    ///
    /// Unlike [`Dispatch::wait_for`] this isn't tied to a single message name/predicate — it's
    /// the general form used by callers (e.g. "collect every `PARAM_VALUE` until the full list
    /// has arrived") that need to watch more than one packet's worth of dispatch state while
    /// still observing `closed` the same way every other wait does.
    pub fn wait_until<T>(&self, timeout: Duration, mut check: impl FnMut(&DispatchState) -> Option<T>) -> Option<T> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return None;
        }

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(value) = check(&state) {
                return Some(value);
            }
            if state.closed {
                return None;
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, _) = self.condvar.wait_timeout(state, deadline - now).unwrap();
            state = guard;
        }
    }
}

impl Default for Dispatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Message, MessageField};
    use std::sync::Arc;
    use std::thread;

    fn command_ack() -> Arc<Message> {
        Arc::new(Message::new(
            77,
            "COMMAND_ACK".to_string(),
            String::new(),
            vec![
                MessageField::new(
                    "command".to_string(),
                    String::new(),
                    crate::protocol::MavType::parse("uint16_t").unwrap(),
                    None,
                    false,
                    None,
                    None,
                    false,
                ),
                MessageField::new(
                    "result".to_string(),
                    String::new(),
                    crate::protocol::MavType::parse("uint8_t").unwrap(),
                    None,
                    false,
                    None,
                    None,
                    false,
                ),
            ],
            vec![],
        ))
    }

    fn ack(command: u64, result: u64) -> Packet {
        let mut content = Content::new();
        content.insert("command", Value::UInt(command));
        content.insert("result", Value::UInt(result));
        Packet {
            message: command_ack(),
            content,
        }
    }

    #[test]
    fn wait_only_resolves_on_matching_predicate() {
        let dispatch = Arc::new(Dispatch::new());
        let waiter = {
            let dispatch = dispatch.clone();
            thread::spawn(move || {
                let mut predicate = Content::new();
                predicate.insert("command", Value::UInt(181));
                dispatch.wait_for("COMMAND_ACK", predicate, Duration::from_secs(2))
            })
        };

        thread::sleep(Duration::from_millis(20));
        dispatch.dispatch(ack(176, 0));
        thread::sleep(Duration::from_millis(20));
        dispatch.dispatch(ack(181, 0));

        let matched = waiter.join().unwrap().expect("should have matched the second ack");
        assert_eq!(matched.content.get("command"), Some(&Value::UInt(181)));
    }

    #[test]
    fn wait_times_out_without_a_match() {
        let dispatch = Dispatch::new();
        let mut predicate = Content::new();
        predicate.insert("command", Value::UInt(181));
        let result = dispatch.wait_for("COMMAND_ACK", predicate, Duration::from_millis(30));
        assert!(result.is_none());
    }

    #[test]
    fn keep_pool_only_accumulates_when_enabled() {
        let dispatch = Dispatch::new();
        dispatch.dispatch(ack(1, 0));
        assert!(dispatch.keep_pool("COMMAND_ACK").is_empty());

        dispatch.set_keep_all("COMMAND_ACK", true);
        dispatch.dispatch(ack(2, 0));
        dispatch.dispatch(ack(3, 0));
        assert_eq!(dispatch.keep_pool("COMMAND_ACK").len(), 2);

        dispatch.set_keep_all("COMMAND_ACK", false);
        assert!(dispatch.keep_pool("COMMAND_ACK").is_empty());
    }

    #[test]
    fn wait_until_resolves_once_the_check_is_satisfied() {
        let dispatch = Arc::new(Dispatch::new());
        dispatch.set_keep_all("COMMAND_ACK", true);

        let waiter = {
            let dispatch = dispatch.clone();
            thread::spawn(move || {
                dispatch.wait_until(Duration::from_secs(2), |state| {
                    let seen = state.keep_pool.get("COMMAND_ACK")?;
                    if seen.len() >= 2 {
                        Some(seen.len())
                    } else {
                        None
                    }
                })
            })
        };

        thread::sleep(Duration::from_millis(20));
        dispatch.dispatch(ack(1, 0));
        thread::sleep(Duration::from_millis(20));
        dispatch.dispatch(ack(2, 0));

        assert_eq!(waiter.join().unwrap(), Some(2));
    }

    #[test]
    fn wait_until_returns_none_immediately_once_closed() {
        let dispatch = Dispatch::new();
        dispatch.close();
        let result = dispatch.wait_until(Duration::from_secs(2), |_| -> Option<()> { None });
        assert!(result.is_none());
    }

    #[test]
    fn recv_pool_holds_last_value_and_can_be_cleared() {
        let dispatch = Dispatch::new();
        dispatch.dispatch(ack(1, 0));
        dispatch.dispatch(ack(2, 0));
        assert_eq!(dispatch.recv("COMMAND_ACK").unwrap().content.get("command"), Some(&Value::UInt(2)));
        dispatch.clear_recv("COMMAND_ACK");
        assert!(dispatch.recv("COMMAND_ACK").is_none());
    }
}
