//! The request/response surface: [`Connection`] owns a transport and a background reader
//! thread, and exposes the blocking operations callers actually want (send-and-wait, parameter
//! get/set, command dispatch) on top of the [`crate::dispatch::Dispatch`] engine.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use log::info;

use crate::codec::frame;
use crate::codec::header::Version;
use crate::dispatch::Dispatch;
use crate::error::Error;
use crate::protocol::{Content, Schema, Value};
use crate::transport::Transport;

const MAV_RESULT_ACCEPTED: i64 = 0;

/// Builder-style configuration for a [`Connection`].
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    system_id: u8,
    component_id: u8,
    version: Version,
    wait_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            system_id: 1,
            component_id: 1,
            version: Version::V2,
            wait_timeout: Duration::from_secs(10),
        }
    }
}

impl ConnectionConfig {
    /// Starts from the default configuration (sysid/compid 1/1, MAVLink v2, 10s wait timeout).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the outgoing system id.
    pub fn system_id(mut self, system_id: u8) -> Self {
        self.system_id = system_id;
        self
    }

    /// Sets the outgoing component id.
    pub fn component_id(mut self, component_id: u8) -> Self {
        self.component_id = component_id;
        self
    }

    /// Sets the wire version used for outgoing frames.
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Sets the default timeout for waits (`send_and_wait` and its derivatives).
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }
}

/// A live MAVLink connection: a background reader thread feeding a [`Dispatch`] engine, and a
/// writer half any caller thread may use.
pub struct Connection {
    schema: Schema,
    config: ConnectionConfig,
    dispatch: Arc<Dispatch>,
    writer: std::sync::Mutex<Box<dyn Transport>>,
    seq: std::sync::atomic::AtomicU8,
    reader: Option<JoinHandle<()>>,
}

impl Connection {
    /// Spawns the reader thread and returns a ready-to-use connection.
    ///
    /// `transport` must support being split into an owned reader/writer pair; callers hand in
    /// two independent handles onto the same underlying stream (e.g. a cloned file descriptor).
    pub fn open<T>(reader_transport: T, writer_transport: T, schema: Schema, config: ConnectionConfig) -> Self
    where
        T: Transport + 'static,
    {
        let dispatch = Arc::new(Dispatch::new());
        let reader = {
            let dispatch = dispatch.clone();
            let schema = schema.clone();
            std::thread::spawn(move || Self::reader_loop(reader_transport, schema, dispatch))
        };

        Self {
            schema,
            config,
            dispatch,
            writer: std::sync::Mutex::new(Box::new(writer_transport)),
            seq: std::sync::atomic::AtomicU8::new(0),
            reader: Some(reader),
        }
    }

    fn reader_loop<T: Transport>(transport: T, schema: Schema, dispatch: Arc<Dispatch>) {
        info!("reader thread started");
        let mut framer = crate::framer::Framer::new(transport, schema);
        loop {
            match framer.next_packet() {
                Ok(packet) => dispatch.dispatch(packet),
                Err(_) => break,
            }
        }
        dispatch.close();
        info!("reader thread stopped");
    }

    /// Encodes and writes a message, using the connection's configured wire version, sysid, and
    /// compid.
    pub fn send(&self, name: &str, content: &Content) -> Result<(), Error> {
        let message = self
            .schema
            .message_by_name(name)
            .ok_or_else(|| Error::Encode(crate::error::EncodeError::UnknownField(name.to_string())))?;
        let seq = self.seq.fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        let bytes = match self.config.version {
            Version::V1 => frame::encode_v1(
                &self.schema,
                message,
                seq,
                self.config.system_id,
                self.config.component_id,
                content,
            )?,
            Version::V2 => frame::encode_v2(
                &self.schema,
                message,
                seq,
                self.config.system_id,
                self.config.component_id,
                content,
            )?,
        };

        let mut writer = self.writer.lock().unwrap();
        writer.write_all(&bytes).map_err(crate::error::TransportError::Io)?;
        writer.flush().map_err(crate::error::TransportError::Io)?;
        Ok(())
    }

    /// Sends `out_name`, then waits for the next `in_name` packet matching `predicate`.
    ///
    /// The recv pool for `in_name` is cleared before sending so a stale value already in the
    /// pool cannot be mistaken for the reply.
    pub fn send_and_wait(
        &self,
        out_name: &str,
        out_content: &Content,
        in_name: &str,
        predicate: Content,
    ) -> Result<Content, Error> {
        self.dispatch.clear_recv(in_name);
        self.send(out_name, out_content)?;
        self.dispatch
            .wait_for(in_name, predicate, self.config.wait_timeout)
            .map(|packet| packet.content)
            .ok_or_else(|| Error::Timeout(in_name.to_string()))
    }

    /// Fetches a single parameter's current value.
    pub fn param_value(&self, name: &str) -> Result<Value, Error> {
        let mut request = Content::new();
        request.insert("param_id", Value::Text(name.to_string()));
        request.insert("param_index", Value::Int(-1));

        let mut predicate = Content::new();
        predicate.insert("param_id", Value::Text(name.to_string()));

        self.dispatch.clear_recv("PARAM_VALUE");
        self.send("PARAM_REQUEST_READ", &request)?;
        self.dispatch
            .wait_for("PARAM_VALUE", predicate, self.config.wait_timeout)
            .and_then(|packet| packet.content.get("param_value").cloned())
            .ok_or_else(|| Error::FailedToGetParam(name.to_string()))
    }

    /// Writes a parameter and waits for the device to confirm with a matching `PARAM_VALUE`.
    ///
    /// The confirmed value may differ slightly from `value` (firmware rounding); that is not
    /// checked here.
    pub fn set_param(&self, name: &str, value: Value) -> Result<Value, Error> {
        let param_type = match self.dispatch.cached_param_type(name) {
            Some(t) => t,
            None => {
                self.param_value(name)?;
                self.dispatch
                    .cached_param_type(name)
                    .ok_or_else(|| Error::FailedToSetParam(name.to_string()))?
            }
        };

        let mut request = Content::new();
        request.insert("param_id", Value::Text(name.to_string()));
        request.insert("param_value", value);
        request.insert("param_type", param_type);

        let mut predicate = Content::new();
        predicate.insert("param_id", Value::Text(name.to_string()));

        self.dispatch.clear_recv("PARAM_VALUE");
        self.send("PARAM_SET", &request)?;
        self.dispatch
            .wait_for("PARAM_VALUE", predicate, self.config.wait_timeout)
            .and_then(|packet| packet.content.get("param_value").cloned())
            .ok_or_else(|| Error::FailedToSetParam(name.to_string()))
    }

    /// Requests the full parameter list and waits for it to arrive in full.
    pub fn request_params(&self) -> Result<std::collections::HashMap<String, Value>, Error> {
        self.dispatch.set_keep_all("PARAM_VALUE", true);
        let result = self.request_params_inner();
        self.dispatch.set_keep_all("PARAM_VALUE", false);
        result
    }

    fn request_params_inner(&self) -> Result<std::collections::HashMap<String, Value>, Error> {
        self.send("PARAM_REQUEST_LIST", &Content::new())?;

        let seen = self
            .dispatch
            .wait_until(self.config.wait_timeout, |state| {
                let seen = state.keep_pool.get("PARAM_VALUE")?;
                let count = seen.first()?.content.get("param_count").and_then(Value::as_u64)?;
                let distinct = seen
                    .iter()
                    .filter_map(|p| p.content.get("param_id").and_then(Value::as_str))
                    .collect::<std::collections::HashSet<_>>()
                    .len() as u64;
                (distinct >= count).then(|| seen.clone())
            })
            .ok_or_else(|| Error::Timeout("PARAM_REQUEST_LIST".to_string()))?;

        let mut params = std::collections::HashMap::new();
        for packet in seen {
            if let (Some(id), Some(value)) = (
                packet.content.get("param_id").and_then(Value::as_str),
                packet.content.get("param_value"),
            ) {
                params.insert(id.to_string(), value.clone());
            }
        }
        Ok(params)
    }

    /// Sends a `COMMAND_LONG` and waits for its `COMMAND_ACK`, raising [`Error::CommandError`]
    /// unless the result is `MAV_RESULT_ACCEPTED`.
    pub fn command_long(&self, command: u32, params: &[f32]) -> Result<(), Error> {
        let mut padded = [0.0f32; 7];
        for (slot, value) in padded.iter_mut().zip(params.iter()) {
            *slot = *value;
        }

        let mut request = Content::new();
        request.insert("command", Value::UInt(command as u64));
        request.insert("confirmation", Value::UInt(0));
        for (i, value) in padded.iter().enumerate() {
            request.insert(format!("param{}", i + 1), Value::Float(*value as f64));
        }

        let mut predicate = Content::new();
        predicate.insert("command", Value::UInt(command as u64));

        self.dispatch.clear_recv("COMMAND_ACK");
        self.send("COMMAND_LONG", &request)?;
        let ack = self
            .dispatch
            .wait_for("COMMAND_ACK", predicate, self.config.wait_timeout)
            .ok_or_else(|| Error::Timeout("COMMAND_ACK".to_string()))?;

        let result = ack.content.get("result").and_then(Value::as_i64).unwrap_or(-1);
        if result == MAV_RESULT_ACCEPTED {
            Ok(())
        } else {
            Err(Error::CommandError { command, result })
        }
    }

    /// Requests a streaming interval change for `message_id` (`MAV_CMD_SET_MESSAGE_INTERVAL`).
    pub fn set_message_interval(&self, message_id: u32, interval_us: f32) -> Result<(), Error> {
        const MAV_CMD_SET_MESSAGE_INTERVAL: u32 = 511;
        self.command_long(MAV_CMD_SET_MESSAGE_INTERVAL, &[message_id as f32, interval_us])
    }

    /// Requests the current streaming interval for `message_id` (`MAV_CMD_GET_MESSAGE_INTERVAL`),
    /// via `COMMAND_ACK` followed by a `MESSAGE_INTERVAL` reply.
    pub fn message_interval(&self, message_id: u32) -> Result<Content, Error> {
        const MAV_CMD_GET_MESSAGE_INTERVAL: u32 = 510;

        let mut predicate = Content::new();
        predicate.insert("message_id", Value::UInt(message_id as u64));
        self.dispatch.clear_recv("MESSAGE_INTERVAL");
        self.command_long(MAV_CMD_GET_MESSAGE_INTERVAL, &[message_id as f32])?;
        self.dispatch
            .wait_for("MESSAGE_INTERVAL", predicate, self.config.wait_timeout)
            .map(|packet| packet.content)
            .ok_or_else(|| Error::Timeout("MESSAGE_INTERVAL".to_string()))
    }

    /// Closes the writer half and waits for the reader thread to observe end-of-stream.
    pub fn close(mut self) -> Result<(), Error> {
        self.writer.lock().unwrap().close().map_err(crate::error::TransportError::Io)?;
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let _ = self.writer.lock().unwrap().close();
    }
}
