// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

use crate::debug::TransferWidth;

/// Where a live debug adapter can be reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint
{
	pub host: String,
	pub port: u16,
}

impl Endpoint
{
	/// OpenOCD's telnet console
	pub const CONSOLE_PORT: u16 = 4444;
	/// OpenOCD's Tcl RPC server
	pub const TCL_PORT: u16 = 6666;

	pub fn local(port: u16) -> Self
	{
		Self {
			host: "127.0.0.1".into(),
			port,
		}
	}
}

impl Display for Endpoint
{
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result
	{
		write!(f, "{}:{}", self.host, self.port)
	}
}

/// Knobs for a debug session. Anything left at its default is either negotiated with the
/// target (XLEN, program buffer size) or is a sensible value for an OpenOCD setup.
#[derive(Debug, Clone)]
pub struct SessionConfig
{
	/// Live adapter to talk to; `None` picks the transport's default port on localhost
	pub endpoint: Option<Endpoint>,
	/// File the vector emitter writes its artifact to when the session is closed
	pub vector_output: Option<PathBuf>,
	/// Transfer width to use instead of the interrogated XLEN
	pub width: Option<TransferWidth>,
	/// Tap to direct raw `irscan`/`drscan` commands at when interrogation has not named one
	pub tap_name: String,
	/// How long to wait between reads of `abstractcs` while an abstract command is busy
	pub poll_interval: Duration,
	/// How long an abstract command may stay busy before giving up on it
	pub busy_timeout: Duration,
	/// Read timeout for live adapter sockets
	pub io_timeout: Option<Duration>,
	/// Program buffer size in words, when known ahead of time
	pub progbuf_capacity: Option<usize>,
	/// Run-Test/Idle cycles emitted after executing the program buffer in vectors
	pub settle_cycles: u32,
}

impl Default for SessionConfig
{
	fn default() -> Self
	{
		Self {
			endpoint: None,
			vector_output: None,
			width: None,
			tap_name: "riscv.cpu".into(),
			poll_interval: Duration::from_millis(50),
			busy_timeout: Duration::from_secs(2),
			io_timeout: Some(Duration::from_secs(5)),
			progbuf_capacity: None,
			settle_cycles: 10,
		}
	}
}

/// Implemented by whatever collects the user's choices (e.g. the CLI's argument struct) so
/// a [`SessionConfig`] can be built from it
pub trait SessionParams
{
	fn host(&self) -> Option<&str>;
	fn port(&self) -> Option<u16>;
	fn vector_output(&self) -> Option<PathBuf>;
	fn width(&self) -> Option<TransferWidth>;
	fn tap_name(&self) -> Option<&str>;
	fn busy_timeout(&self) -> Option<Duration>;
	fn progbuf_capacity(&self) -> Option<usize>;
}

impl SessionConfig
{
	pub fn from_params<Params>(params: &Params, default_port: u16) -> Self
	where
		Params: SessionParams,
	{
		let mut config = Self::default();
		if params.host().is_some() || params.port().is_some() {
			let mut endpoint = Endpoint::local(default_port);
			if let Some(host) = params.host() {
				endpoint.host = host.into();
			}
			if let Some(port) = params.port() {
				endpoint.port = port;
			}
			config.endpoint = Some(endpoint);
		}
		config.vector_output = params.vector_output();
		config.width = params.width();
		if let Some(tap_name) = params.tap_name() {
			config.tap_name = tap_name.into();
		}
		if let Some(timeout) = params.busy_timeout() {
			config.busy_timeout = timeout;
		}
		config.progbuf_capacity = params.progbuf_capacity();
		config
	}

	/// The endpoint to use for a live transport whose well-known port is `default_port`
	pub fn endpoint_or(&self, default_port: u16) -> Endpoint
	{
		self.endpoint.clone().unwrap_or_else(|| Endpoint::local(default_port))
	}
}
