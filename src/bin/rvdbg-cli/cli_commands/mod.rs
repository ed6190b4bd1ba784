// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

use std::path::PathBuf;
use std::time::Duration;

use clap::Subcommand;
use color_eyre::eyre::Result;
use rvdbg::Session;
use rvdbg::config::SessionParams;
use rvdbg::debug::TransferWidth;
use rvdbg::transport::Transport;

use crate::cli_commands::debug_module::{DtmResetArguments, ExecArguments, IdcodeArguments};
use crate::cli_commands::hart::ResetArguments;
use crate::cli_commands::register::{DumpArguments, ExpectArguments, ReadArguments, WriteArguments};
use crate::{CliArguments, CompletionArguments};

pub mod debug_module;
pub mod hart;
pub mod register;

#[derive(Subcommand)]
pub enum ToplevelCommands
{
	/// Print the run state of the hart
	Status,
	/// Halt the hart
	Halt,
	/// Resume the hart
	Resume,
	/// Execute a single instruction on a halted hart
	Step,
	/// Reset the hart
	Reset(ResetArguments),
	/// Read a register by name
	Read(ReadArguments),
	/// Write a register by name
	Write(WriteArguments),
	/// Check a register holds a value (recorded as a comparison in SVF output)
	Expect(ExpectArguments),
	/// Read every register in a group
	Dump(DumpArguments),
	/// Load instructions into the program buffer and execute them
	Exec(ExecArguments),
	/// Report the first fault found in the DTM, debug module or abstract command state
	Diagnose,
	/// Reset the debug module
	DmReset,
	/// Clear a sticky DMI error, or reset the DTM entirely
	DtmReset(DtmResetArguments),
	/// Read or check the tap's IDCODE
	Idcode(IdcodeArguments),
	/// Generate completions data for the shell
	Complete(CompletionArguments),
}

impl ToplevelCommands
{
	pub fn run<T: Transport>(&self, session: &mut Session<T>) -> Result<()>
	{
		match self {
			ToplevelCommands::Status => hart::status_command(session),
			ToplevelCommands::Halt => Ok(session.halt()?),
			ToplevelCommands::Resume => Ok(session.resume()?),
			ToplevelCommands::Step => Ok(session.step()?),
			ToplevelCommands::Reset(reset_args) => hart::reset_command(session, reset_args),
			ToplevelCommands::Read(read_args) => register::read_command(session, read_args),
			ToplevelCommands::Write(write_args) => register::write_command(session, write_args),
			ToplevelCommands::Expect(expect_args) => register::expect_command(session, expect_args),
			ToplevelCommands::Dump(dump_args) => register::dump_command(session, dump_args),
			ToplevelCommands::Exec(exec_args) => debug_module::exec_command(session, exec_args),
			ToplevelCommands::Diagnose => debug_module::diagnose_command(session),
			ToplevelCommands::DmReset => Ok(session.reset_dm()?),
			ToplevelCommands::DtmReset(reset_args) => debug_module::dtm_reset_command(session, reset_args),
			ToplevelCommands::Idcode(idcode_args) => debug_module::idcode_command(session, idcode_args),
			// Handled before any session is opened
			ToplevelCommands::Complete(_) => Ok(()),
		}
	}
}

impl SessionParams for CliArguments
{
	fn host(&self) -> Option<&str>
	{
		self.host.as_deref()
	}

	fn port(&self) -> Option<u16>
	{
		self.port
	}

	fn vector_output(&self) -> Option<PathBuf>
	{
		self.output.clone()
	}

	fn width(&self) -> Option<TransferWidth>
	{
		self.width
	}

	fn tap_name(&self) -> Option<&str>
	{
		self.tap.as_deref()
	}

	fn busy_timeout(&self) -> Option<Duration>
	{
		self.busy_timeout
	}

	fn progbuf_capacity(&self) -> Option<usize>
	{
		self.progbuf_capacity
	}
}

pub fn parse_width(value: &str) -> Result<TransferWidth, String>
{
	let bits = value.parse::<u32>().map_err(|error| error.to_string())?;
	TransferWidth::try_from(bits).map_err(|error| error.to_string())
}

pub fn parse_millis(value: &str) -> Result<Duration, String>
{
	value
		.parse::<u64>()
		.map(Duration::from_millis)
		.map_err(|error| error.to_string())
}

/// Parse a value given either in hex (with a `0x` prefix) or in decimal
pub fn parse_value(value: &str) -> Result<u128, String>
{
	let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
		Some(digits) => u128::from_str_radix(&digits.replace('_', ""), 16),
		None => value.replace('_', "").parse::<u128>(),
	};
	parsed.map_err(|error| format!("'{}' is not a valid value: {}", value, error))
}

pub fn parse_word(value: &str) -> Result<u32, String>
{
	let value = parse_value(value)?;
	u32::try_from(value).map_err(|_| format!("{:#x} does not fit in a 32-bit instruction word", value))
}
