// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

//! Framed access to OpenOCD's Tcl RPC server

use std::time::Duration;

use log::debug;

use crate::config::{Endpoint, SessionConfig};
use crate::debug::{DTMCS_LENGTH, DmAddress, IR_DTMCS, IR_IDCODE};
use crate::error::DebugError;
use crate::transport::{Connection, Stream, Transport, parse_hex};

/// Terminates both commands and their replies on the Tcl server
pub const END_OF_MESSAGE: u8 = 0x1a;

pub struct TclSession
{
	endpoint: Endpoint,
	io_timeout: Option<Duration>,
	connection: Option<Connection>,
	tap_name: String,
}

impl TclSession
{
	pub fn new(config: &SessionConfig) -> Self
	{
		Self {
			endpoint: config.endpoint_or(Endpoint::TCL_PORT),
			io_timeout: config.io_timeout,
			connection: None,
			tap_name: config.tap_name.clone(),
		}
	}

	/// Run the Tcl protocol over an already open stream instead of connecting to the
	/// configured endpoint
	pub fn from_stream(stream: Box<dyn Stream>, config: &SessionConfig) -> Self
	{
		let mut session = Self::new(config);
		session.connection = Some(Connection::from_stream(stream));
		session
	}

	pub fn set_tap_name(&mut self, tap_name: &str)
	{
		self.tap_name = tap_name.into();
	}

	/// Send a raw Tcl command and return its (right-trimmed) result
	pub fn send(&mut self, command: &str) -> Result<String, DebugError>
	{
		debug!("Executing command: '{}'", command);
		let connection = self.connection.as_mut().ok_or(DebugError::NotConnected)?;
		let mut message = command.as_bytes().to_vec();
		message.push(END_OF_MESSAGE);
		connection.send(&message)?;
		let reply = connection.read_until(&[END_OF_MESSAGE], false)?;
		Ok(String::from_utf8_lossy(&reply).trim_end().to_string())
	}

	/// Run a command under `capture` so that what it would have logged comes back as the
	/// result instead
	pub fn capture(&mut self, command: &str) -> Result<String, DebugError>
	{
		let reply = self.send(&format!("capture \"{}\"", escape(command)))?;
		Ok(unwrap_braces(&reply).to_string())
	}

	fn scan_register(&mut self, instruction: u8, value: u32) -> Result<String, DebugError>
	{
		let tap = self.tap_name.clone();
		self.send(&format!("irscan {} {:#x}", tap, instruction))?;
		self.capture(&format!("drscan {} {} {:#x}", tap, DTMCS_LENGTH, value))
	}
}

/// Quote the characters that would otherwise be interpreted inside a double-quoted Tcl word
fn escape(command: &str) -> String
{
	let mut escaped = String::with_capacity(command.len());
	for character in command.chars() {
		if matches!(character, '"' | '\\' | '[' | ']' | '$') {
			escaped.push('\\');
		}
		escaped.push(character);
	}
	escaped
}

/// A captured result that is itself a Tcl list comes back wrapped in braces
fn unwrap_braces(reply: &str) -> &str
{
	let reply = reply.trim();
	reply
		.strip_prefix('{')
		.and_then(|inner| inner.strip_suffix('}'))
		.map(str::trim)
		.unwrap_or(reply)
}

impl Transport for TclSession
{
	fn is_live(&self) -> bool
	{
		true
	}

	fn connect(&mut self) -> Result<(), DebugError>
	{
		if self.connection.is_none() {
			debug!("Connecting to debug adapter Tcl server at {}", self.endpoint);
			self.connection = Some(Connection::open(&self.endpoint, self.io_timeout)?);
		}
		Ok(())
	}

	fn disconnect(&mut self) -> Result<(), DebugError>
	{
		// The server drops the connection on `exit` without replying
		let result = match self.connection.as_mut() {
			Some(connection) => connection.send(b"exit\x1a"),
			None => Ok(()),
		};
		self.connection = None;
		result
	}

	fn write_raw(&mut self, address: DmAddress, data: u32) -> Result<(), DebugError>
	{
		let response = self.capture(&format!("riscv dmi_write {:#x} {:#x}", address, data))?;
		if response.contains("Failed") {
			crate::log_and_return!(DebugError::AdapterFailure(response));
		}
		Ok(())
	}

	fn read_raw(&mut self, address: DmAddress) -> Result<u32, DebugError>
	{
		let response = self.capture(&format!("riscv dmi_read {:#x}", address))?;
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
		self.send("pathmove RESET IDLE").map(|_| ())
	}
}

#[cfg(test)]
mod tests
{
	use super::{escape, unwrap_braces};

	#[test]
	fn capture_wrapping()
	{
		assert_eq!(escape("riscv dmi_read 0x11"), "riscv dmi_read 0x11");
		assert_eq!(escape("echo \"[x]\""), "echo \\\"\\[x\\]\\\"");
		assert_eq!(unwrap_braces("{0x00000382}\n"), "0x00000382");
		assert_eq!(unwrap_braces("0x00000382"), "0x00000382");
	}
}
