use crate::command::{Command, Group, Header};
use crate::error::{Result, WTError};
use crate::response::ResponseDecoder;
use crate::settings::{ProtocolSettings, UsbSettings};
use crate::state::{ConfigurationState, LinkState, NumericFormat, TransitionCondition};
use crate::transport::{Received, Transport, UsbTransport};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

/// Transport plus the state it has confirmed. Only reachable through the
/// facade's lock, so one command/response exchange never interleaves with
/// another.
struct Session<T> {
    transport: T,
    state: ConfigurationState,
    link: LinkState,
}

impl<T: Transport> Session<T> {
    fn write(&mut self, program: &str, terminator: &[u8]) -> Result<()> {
        debug!(command = program, "GPIB write");
        let mut message = Vec::with_capacity(program.len() + terminator.len());
        message.extend_from_slice(program.as_bytes());
        message.extend_from_slice(terminator);
        self.transport.send(&message)
    }

    fn exchange(&mut self, program: &str, terminator: &[u8], capacity: usize) -> Result<Received> {
        self.write(program, terminator)?;
        let received = self.transport.receive(capacity)?;
        debug!(command = program, received = received.data.len(), "GPIB response");
        Ok(received)
    }

    /// Sends a setting and, only once it is on the wire, records it.
    fn apply<F>(&mut self, program: &str, terminator: &[u8], update: F) -> Result<()>
    where
        F: FnOnce(&mut ConfigurationState),
    {
        self.write(program, terminator)?;
        update(&mut self.state);
        Ok(())
    }
}

/// A Yokogawa WT3000 power analyzer.
///
/// All operations take `&self` and serialize on an internal lock held for one
/// complete command/response exchange.
pub struct WT3000<T: Transport = UsbTransport> {
    session: Mutex<Session<T>>,
    settings: ProtocolSettings,
}

impl WT3000<UsbTransport> {
    /// Finds the first attached WT3000 and claims its command interface.
    pub fn open() -> Result<Self> {
        Self::open_with(UsbSettings::default(), ProtocolSettings::default())
    }

    pub fn open_with(usb: UsbSettings, protocol: ProtocolSettings) -> Result<Self> {
        let transport = UsbTransport::open(usb)?;
        Ok(Self::with_settings(transport, protocol))
    }
}

impl<T: Transport> WT3000<T> {
    pub fn new(transport: T) -> Self {
        Self::with_settings(transport, ProtocolSettings::default())
    }

    pub fn with_settings(transport: T, settings: ProtocolSettings) -> Self {
        Self {
            session: Mutex::new(Session {
                transport,
                state: ConfigurationState::default(),
                link: LinkState::Disconnected,
            }),
            settings,
        }
    }

    fn session(&self) -> MutexGuard<'_, Session<T>> {
        // A panic mid-exchange leaves nothing half-written in the state.
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn terminator(&self) -> &[u8] {
        &self.settings.terminator
    }

    pub fn settings(&self) -> &ProtocolSettings {
        &self.settings
    }

    /// Snapshot of the configuration confirmed sent so far.
    pub fn configuration(&self) -> ConfigurationState {
        self.session().state.clone()
    }

    pub fn link_state(&self) -> LinkState {
        self.session().link
    }

    /// Prepares the instrument for remote operation: clears status, then
    /// enables remote mode. Every call retransmits both commands.
    pub fn connect(&self) -> Result<()> {
        let clear = Command::common(Group::ClearStatus).build()?;
        let remote = Command::switch(Header::Remote, true)?.build()?;

        let mut session = self.session();
        session.write(&clear, self.terminator())?;
        session.apply(&remote, self.terminator(), |state| state.set_remote(true))?;
        if session.link == LinkState::Disconnected {
            session.link = LinkState::Connected;
        }
        info!("WT3000 connected in remote mode");
        Ok(())
    }

    /// Queries the instrument model (`*IDN?`).
    pub fn identify(&self) -> Result<String> {
        self.query_text(&Command::query(Group::Identify, None))
    }

    /// Clears the standard event register, extended event register, and error queue.
    pub fn clear_status(&self) -> Result<()> {
        let program = Command::common(Group::ClearStatus).build()?;
        self.session().write(&program, self.terminator())
    }

    pub fn set_remote(&self, on: bool) -> Result<()> {
        self.set_switch(Header::Remote, on, |state| state.set_remote(on))
    }

    /// Sets the commands that will operate as overlap commands.
    pub fn set_overlap(&self, on: bool) -> Result<()> {
        self.set_switch(Header::Overlap, on, |state| state.set_overlap(on))
    }

    /// Sets whether to return the response to a query using full spelling.
    pub fn set_verbose(&self, on: bool) -> Result<()> {
        self.set_switch(Header::Verbose, on, |state| state.set_verbose(on))
    }

    /// Sets whether to add a header to the response to a query.
    pub fn set_header(&self, on: bool) -> Result<()> {
        self.set_switch(Header::ResponseHeader, on, |state| state.set_header(on))
    }

    pub fn set_extended_event_status_enable(&self, on: bool) -> Result<()> {
        self.set_switch(Header::ExtendedEventStatusEnable, on, |state| {
            state.set_extended_event_status_enable(on)
        })
    }

    pub fn set_status_filter(&self, number: u8, condition: TransitionCondition) -> Result<()> {
        let program = Command::set(Header::Filter(number), condition.token()).build()?;
        self.session().apply(&program, self.terminator(), |state| {
            state.set_status_filter(number, condition)
        })
    }

    /// Like [`set_status_filter`](Self::set_status_filter), taking the condition
    /// as a RISE/FALL/BOTH/NEVER token. Anything else is rejected before
    /// transmission.
    pub fn set_status_filter_named(&self, number: u8, condition: &str) -> Result<()> {
        let condition = condition.parse::<TransitionCondition>()?;
        self.set_status_filter(number, condition)
    }

    pub fn set_numeric_format(&self, format: NumericFormat) -> Result<()> {
        let program = Command::set(Header::Format, format.token()).build()?;
        let mut session = self.session();
        session.apply(&program, self.terminator(), |state| state.set_numeric_format(Some(format)))?;
        if session.link == LinkState::Connected {
            session.link = LinkState::Configured;
        }
        Ok(())
    }

    /// Transmits `format` verbatim as the `:NUMeric:FORMat` argument. The name
    /// itself is not checked; the recorded format is the one the text names,
    /// if any. An empty `format` is still a [`WTError::MalformedCommand`],
    /// since a setting needs an argument, and nothing is sent.
    pub fn set_numeric_format_unchecked(&self, format: &str) -> Result<()> {
        let program = Command::set(Header::Format, format).build()?;
        let recognised = NumericFormat::from_mnemonic(format);
        if recognised.is_none() {
            warn!("Unrecognised numeric format {:?}; responses will be decoded as ASCII", format);
        }
        let mut session = self.session();
        session.apply(&program, self.terminator(), |state| state.set_numeric_format(recognised))?;
        if session.link == LinkState::Connected {
            session.link = LinkState::Configured;
        }
        Ok(())
    }

    /// Queries the type of the input element installed in slot `number`.
    pub fn input_module(&self, number: u8) -> Result<String> {
        self.query_text(&Command::query(Group::Input, Some(Header::Module(number))))
    }

    /// Queries numeric data (measurement results) into `buffer`, returning the
    /// number of bytes received. The bytes are not interpreted.
    ///
    /// If the instrument had more data than `buffer` holds, the bytes that fit
    /// are written and [`WTError::Truncated`] is returned.
    pub fn numeric_values(&self, buffer: &mut [u8]) -> Result<usize> {
        let program = Command::query(Group::Numeric, Some(Header::Value)).build()?;
        let received = self
            .session()
            .exchange(&program, self.terminator(), buffer.len())?;
        copy_bounded(received, buffer)
    }

    /// Queries numeric data and decodes it under the current numeric format.
    pub fn fetch_numeric_values(&self) -> Result<Vec<f32>> {
        let program = Command::query(Group::Numeric, Some(Header::Value)).build()?;
        let mut buffer = vec![0u8; self.settings.numeric_capacity];

        let (length, state) = {
            let mut session = self.session();
            let received = session.exchange(&program, self.terminator(), buffer.len())?;
            (copy_bounded(received, &mut buffer)?, session.state.clone())
        };

        ResponseDecoder::new(self.terminator(), &state).numeric(&buffer[..length])
    }

    /// Convenience form of [`fetch_numeric_values`](Self::fetch_numeric_values):
    /// any failure is logged and yields an empty vector.
    pub fn numeric_values_as_floats(&self) -> Vec<f32> {
        match self.fetch_numeric_values() {
            Ok(values) => values,
            Err(e) => {
                error!("Failed to fetch numeric values: {}", e);
                Vec::new()
            }
        }
    }

    fn set_switch<F>(&self, header: Header, on: bool, update: F) -> Result<()>
    where
        F: FnOnce(&mut ConfigurationState),
    {
        let program = Command::switch(header, on)?.build()?;
        self.session().apply(&program, self.terminator(), update)
    }

    fn query_text(&self, command: &Command) -> Result<String> {
        let program = command.build()?;
        let capacity = self.settings.text_capacity;
        let mut session = self.session();
        let received = session.exchange(&program, self.terminator(), capacity)?;
        if received.truncated || received.data.len() > capacity {
            return Err(WTError::Truncated {
                capacity,
                received: received.data.len().min(capacity),
            });
        }
        Ok(ResponseDecoder::new(self.terminator(), &session.state).text(&received.data))
    }
}

/// Copies a response into the caller's buffer, surfacing truncation.
fn copy_bounded(received: Received, buffer: &mut [u8]) -> Result<usize> {
    let length = received.data.len().min(buffer.len());
    buffer[..length].copy_from_slice(&received.data[..length]);
    if received.truncated || received.data.len() > buffer.len() {
        return Err(WTError::Truncated {
            capacity: buffer.len(),
            received: length,
        });
    }
    Ok(length)
}
