// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

use clap::Args;
use color_eyre::eyre::Result;
use log::{info, warn};
use rvdbg::Session;
use rvdbg::transport::Transport;

use crate::cli_commands::parse_word;

#[derive(Args)]
pub struct ExecArguments
{
	#[arg(required = true, value_parser = parse_word)]
	/// Instruction words to run, in hex (0x prefixed) or decimal
	instructions: Vec<u32>,
	#[arg(long = "discover", default_value_t = false)]
	/// Ask the debug module for its program buffer size before loading
	discover: bool,
}

#[derive(Args)]
pub struct DtmResetArguments
{
	#[arg(long = "hard", default_value_t = false)]
	/// Reset the DTM entirely rather than only clearing the sticky DMI error
	hard: bool,
}

#[derive(Args)]
pub struct IdcodeArguments
{
	#[arg(long = "expect", value_parser = parse_word)]
	/// IDCODE the tap must report
	expect: Option<u32>,
}

pub fn exec_command<T: Transport>(session: &mut Session<T>, exec_args: &ExecArguments) -> Result<()>
{
	if exec_args.discover {
		let capacity = session.discover_progbuf_size()?;
		info!("Program buffer holds {} words", capacity);
	}
	session.load_program(&exec_args.instructions)?;
	session.execute_program()?;
	Ok(())
}

pub fn diagnose_command<T: Transport>(session: &mut Session<T>) -> Result<()>
{
	match session.diagnose()? {
		Some(fault) => warn!("{}", fault),
		None => info!("No faults found"),
	}
	Ok(())
}

pub fn dtm_reset_command<T: Transport>(session: &mut Session<T>, reset_args: &DtmResetArguments) -> Result<()>
{
	if reset_args.hard {
		session.hard_reset_dtm()?;
	} else {
		session.reset_sticky_error()?;
	}
	Ok(())
}

pub fn idcode_command<T: Transport>(session: &mut Session<T>, idcode_args: &IdcodeArguments) -> Result<()>
{
	match idcode_args.expect {
		Some(expected) => session.expect_idcode(expected)?,
		None => println!("{:#010x}", session.read_idcode()?),
	}
	Ok(())
}
