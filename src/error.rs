// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

//! Module for error handling code.

use std::time::Duration;

use thiserror::Error;

use crate::debug::CommandError;

#[derive(Debug, Error)]
pub enum DebugError
{
	#[error("Debug adapter connection failed when attempting to {operation}")]
	Transport
	{
		#[source]
		source: std::io::Error,

		/// The operation that was being performed on the connection (e.g. `"send a command"`).
		operation: String,
	},

	#[error("Debug adapter reported a failure: {0}")]
	AdapterFailure(String),

	#[error("Debug adapter connection is not open")]
	NotConnected,

	#[error("Protocol assertion failed: {0}")]
	ProtocolAssertion(String),

	#[error("Abstract command failed with error '{0}'")]
	Command(CommandError),

	#[error("Abstract command was still busy after {0:?}")]
	BusyTimeout(Duration),

	#[error("Value {value:#x} does not fit in {width} bits")]
	ValueOutOfRange
	{
		value: u128,
		width: u32,
	},

	#[error("Register '{0}' is not known by either its canonical or ABI name")]
	Resolution(String),

	#[error("Transfer width of {0} bits is not one of 32, 64 or 128")]
	InvalidWidth(u32),

	#[error("Program of {len} instructions does not fit in the {capacity} word program buffer")]
	ProgramTooLarge
	{
		len: usize,
		capacity: usize,
	},

	#[error("The active transport cannot {0}")]
	Unsupported(&'static str),
}

impl DebugError
{
	pub(crate) fn io(operation: &str, source: std::io::Error) -> Self
	{
		Self::Transport {
			source,
			operation: operation.into(),
		}
	}

	/// The abstract command error carried by this error, if that is what it is.
	pub fn command_error(&self) -> Option<CommandError>
	{
		match self {
			Self::Command(error) => Some(*error),
			_ => None,
		}
	}
}

#[macro_export]
macro_rules! log_and_return
{
	($err:expr) => {
		let err = $err;
		log::error!("{}", err);
		return Err(err);
	}
}
