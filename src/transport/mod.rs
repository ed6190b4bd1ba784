// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use log::trace;

use crate::config::Endpoint;
use crate::debug::DmAddress;
use crate::error::DebugError;

pub mod console;
pub mod svf;
pub mod tcl;

pub use self::console::ConsoleSession;
pub use self::svf::VectorEmitter;
pub use self::tcl::TclSession;

/// Outcome of asking a transport to check a register against an expected value
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Check
{
	/// The value was read back and matched under the mask
	Passed,
	/// The value was read back and did not match; this is what was actually read
	Failed(u32),
	/// The check was recorded to be performed later (when the vectors are replayed)
	Deferred,
}

/// Types implementing this trait provide raw access to a RISC-V Debug Transport Module -
/// the DMI bus behind it, the `dtmcs` register and the TAP it sits on. Everything above
/// this (abstract commands, hart control, the program buffer) is built once on top.
pub trait Transport
{
	/// Whether values can be read back from the target right now. Offline transports can
	/// only record expectations.
	fn is_live(&self) -> bool;

	// Connection lifecycle
	fn connect(&mut self) -> Result<(), DebugError>;
	fn disconnect(&mut self) -> Result<(), DebugError>;

	// DMI bus access
	fn write_raw(&mut self, address: DmAddress, data: u32) -> Result<(), DebugError>;
	fn read_raw(&mut self, address: DmAddress) -> Result<u32, DebugError>;

	/// Compare the register at `address` against `expected`, considering only the bits set in
	/// `mask`
	fn expect_raw(&mut self, address: DmAddress, expected: u32, mask: u32) -> Result<Check, DebugError>
	{
		let actual = self.read_raw(address)?;
		if actual & mask == expected & mask {
			Ok(Check::Passed)
		} else {
			Ok(Check::Failed(actual))
		}
	}

	// DTM and TAP control
	fn write_dtmcs(&mut self, value: u32) -> Result<(), DebugError>;
	fn read_dtmcs(&mut self) -> Result<u32, DebugError>;
	fn read_idcode(&mut self) -> Result<u32, DebugError>;

	fn expect_idcode(&mut self, expected: u32) -> Result<Check, DebugError>
	{
		let actual = self.read_idcode()?;
		if actual == expected {
			Ok(Check::Passed)
		} else {
			Ok(Check::Failed(actual))
		}
	}

	/// Walk the TAP through Test-Logic-Reset and park it in Run-Test/Idle
	fn reset_tap(&mut self) -> Result<(), DebugError>;

	/// Let the target run for `cycles` TCK cycles in Run-Test/Idle
	fn idle(&mut self, _cycles: u32) -> Result<(), DebugError>
	{
		Ok(())
	}

	/// Attach a human readable note to the transaction stream
	fn annotate(&mut self, note: &str)
	{
		log::debug!("{}", note);
	}
}

/// A byte stream that a live transport can run its wire protocol over
pub trait Stream: Read + Write {}

impl<T: Read + Write> Stream for T {}

/// An open byte stream to a live debug adapter
pub(crate) struct Connection
{
	reader: BufReader<Box<dyn Stream>>,
}

impl Connection
{
	pub(crate) fn open(endpoint: &Endpoint, io_timeout: Option<Duration>) -> Result<Self, DebugError>
	{
		let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
			.map_err(|error| DebugError::io(&format!("connect to {}", endpoint), error))?;
		stream
			.set_read_timeout(io_timeout)
			.map_err(|error| DebugError::io("configure the socket", error))?;
		// Commands are tiny and strictly request/response, don't let Nagle hold them back
		stream
			.set_nodelay(true)
			.map_err(|error| DebugError::io("configure the socket", error))?;
		Ok(Self::from_stream(Box::new(stream)))
	}

	pub(crate) fn from_stream(stream: Box<dyn Stream>) -> Self
	{
		Self {
			reader: BufReader::new(stream),
		}
	}

	pub(crate) fn send(&mut self, data: &[u8]) -> Result<(), DebugError>
	{
		trace!("-> {:?}", String::from_utf8_lossy(data));
		let stream = self.reader.get_mut();
		stream
			.write_all(data)
			.and_then(|_| stream.flush())
			.map_err(|error| DebugError::io("send a command", error))
	}

	fn next_byte(&mut self) -> Result<u8, DebugError>
	{
		let buffer = self
			.reader
			.fill_buf()
			.map_err(|error| DebugError::io("read a response", error))?;
		let byte = match buffer.first() {
			Some(&byte) => byte,
			None => {
				return Err(DebugError::io(
					"read a response",
					std::io::Error::new(ErrorKind::UnexpectedEof, "connection closed by the adapter"),
				));
			},
		};
		self.reader.consume(1);
		Ok(byte)
	}

	/// Read until `marker` has been seen, returning everything before it. With `telnet` set,
	/// Telnet option negotiation sequences are dropped from the data.
	pub(crate) fn read_until(&mut self, marker: &[u8], telnet: bool) -> Result<Vec<u8>, DebugError>
	{
		let mut data = Vec::new();
		loop {
			let byte = self.next_byte()?;
			if telnet && byte == TELNET_IAC {
				self.skip_telnet_command()?;
				continue;
			}
			data.push(byte);
			if data.ends_with(marker) {
				data.truncate(data.len() - marker.len());
				trace!("<- {:?}", String::from_utf8_lossy(&data));
				return Ok(data);
			}
		}
	}

	fn skip_telnet_command(&mut self) -> Result<(), DebugError>
	{
		match self.next_byte()? {
			// WILL, WONT, DO and DONT carry a single option byte
			251..=254 => {
				self.next_byte()?;
			},
			// Subnegotiation runs until IAC SE
			TELNET_SB => {
				let mut previous = 0;
				loop {
					let byte = self.next_byte()?;
					if previous == TELNET_IAC && byte == TELNET_SE {
						break;
					}
					previous = byte;
				}
			},
			_ => (),
		}
		Ok(())
	}
}

const TELNET_IAC: u8 = 255;
const TELNET_SB: u8 = 250;
const TELNET_SE: u8 = 240;

/// Parse a hexadecimal value as printed by the debug adapter, with or without a `0x` prefix
pub(crate) fn parse_hex(text: &str) -> Result<u32, DebugError>
{
	let text = text.trim();
	let digits = text
		.strip_prefix("0x")
		.or_else(|| text.strip_prefix("0X"))
		.unwrap_or(text);
	u32::from_str_radix(digits, 16)
		.map_err(|_| DebugError::ProtocolAssertion(format!("expected a hexadecimal value, got '{}'", text)))
}
