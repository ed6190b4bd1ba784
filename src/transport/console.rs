// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

//! Line oriented access to OpenOCD's interactive (telnet) console

use std::time::Duration;

use log::debug;

use crate::config::{Endpoint, SessionConfig};
use crate::debug::{DTMCS_LENGTH, DmAddress, IR_DTMCS, IR_IDCODE};
use crate::error::DebugError;
use crate::transport::{Connection, Stream, Transport, parse_hex};

/// The console's prompt, which terminates every response
const PROMPT: &[u8] = b"> ";

pub struct ConsoleSession
{
	endpoint: Endpoint,
	io_timeout: Option<Duration>,
	connection: Option<Connection>,
	tap_name: String,
}

impl ConsoleSession
{
	pub fn new(config: &SessionConfig) -> Self
	{
		Self {
			endpoint: config.endpoint_or(Endpoint::CONSOLE_PORT),
			io_timeout: config.io_timeout,
			connection: None,
			tap_name: config.tap_name.clone(),
		}
	}

	/// Run the console protocol over an already open stream instead of connecting to the
	/// configured endpoint
	pub fn from_stream(stream: Box<dyn Stream>, config: &SessionConfig) -> Self
	{
		let mut session = Self::new(config);
		session.connection = Some(Connection::from_stream(stream));
		session
	}

	pub fn tap_name(&self) -> &str
	{
		&self.tap_name
	}

	pub fn set_tap_name(&mut self, tap_name: &str)
	{
		self.tap_name = tap_name.into();
	}

	fn connection(&mut self) -> Result<&mut Connection, DebugError>
	{
		self.connection.as_mut().ok_or(DebugError::NotConnected)
	}

	fn send_line(&mut self, command: &str) -> Result<(), DebugError>
	{
		debug!("Executing command: '{}'", command);
		let connection = self.connection()?;
		connection.send(format!("{}\n", command).as_bytes())?;
		// The console echoes the command line back before answering it
		connection.read_until(b"\n", true)?;
		Ok(())
	}

	fn read_response(&mut self) -> Result<String, DebugError>
	{
		let data = self.connection()?.read_until(PROMPT, true)?;
		Ok(String::from_utf8_lossy(&data).replace('\r', ""))
	}

	/// Run a command, returning its output with line structure intact
	pub fn execute_lines(&mut self, command: &str) -> Result<String, DebugError>
	{
		self.send_line(command)?;
		self.read_response()
	}

	/// Run a command, returning its output flattened onto a single line
	pub fn execute(&mut self, command: &str) -> Result<String, DebugError>
	{
		Ok(self.execute_lines(command)?.replace('\n', ""))
	}

	fn scan_register(&mut self, instruction: u8, value: u32) -> Result<String, DebugError>
	{
		let tap = self.tap_name.clone();
		self.execute(&format!("irscan {} {:#x}", tap, instruction))?;
		self.execute(&format!("drscan {} {} {:#x}", tap, DTMCS_LENGTH, value))
	}
}

impl Transport for ConsoleSession
{
	fn is_live(&self) -> bool
	{
		true
	}

	fn connect(&mut self) -> Result<(), DebugError>
	{
		if self.connection.is_none() {
			debug!("Connecting to debug adapter console at {}", self.endpoint);
			self.connection = Some(Connection::open(&self.endpoint, self.io_timeout)?);
		}
		// Swallow the welcome banner so the first command sees only its own output
		self.read_response()?;
		Ok(())
	}

	fn disconnect(&mut self) -> Result<(), DebugError>
	{
		let result = match self.connection.as_mut() {
			Some(connection) => connection.send(b"exit\n"),
			None => Ok(()),
		};
		self.connection = None;
		result
	}

	fn write_raw(&mut self, address: DmAddress, data: u32) -> Result<(), DebugError>
	{
		let response = self.execute(&format!("riscv dmi_write {:#x} {:#x}", address, data))?;
		if response.contains("Failed") {
			crate::log_and_return!(DebugError::AdapterFailure(response));
		}
		Ok(())
	}

	fn read_raw(&mut self, address: DmAddress) -> Result<u32, DebugError>
	{
		let response = self.execute(&format!("riscv dmi_read {:#x}", address))?;
		if response.contains("Failed") {
			crate::log_and_return!(DebugError::AdapterFailure(response));
		}
		parse_hex(&response)
	}

	fn write_dtmcs(&mut self, value: u32) -> Result<(), DebugError>
	{
		self.scan_register(IR_DTMCS, value).map(|_| ())
	}

	fn read_dtmcs(&mut self) -> Result<u32, DebugError>
	{
		let response = self.scan_register(IR_DTMCS, 0)?;
		parse_hex(&response)
	}

	fn read_idcode(&mut self) -> Result<u32, DebugError>
	{
		let response = self.scan_register(IR_IDCODE, 0)?;
		parse_hex(&response)
	}

	fn reset_tap(&mut self) -> Result<(), DebugError>
	{
		self.execute("pathmove RESET IDLE").map(|_| ())
	}
}
