// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

use clap::Args;
use color_eyre::eyre::Result;
use owo_colors::OwoColorize;
use rvdbg::Session;
use rvdbg::transport::Transport;

#[derive(Args)]
pub struct ResetArguments
{
	#[arg(long = "halt", default_value_t = false)]
	/// Halt the hart as it comes out of reset
	halt: bool,
}

fn flag(value: bool) -> String
{
	if value { "yes".green().to_string() } else { "no".red().to_string() }
}

pub fn status_command<T: Transport>(session: &mut Session<T>) -> Result<()>
{
	let status = session.hart_status()?;
	println!("Core status:");
	println!("  Running:    {}", flag(status.running));
	println!("  Halted:     {}", flag(status.halted));
	println!("  Resume ack: {}", flag(status.resume_ack));
	println!("  Have reset: {}", flag(status.have_reset));
	Ok(())
}

pub fn reset_command<T: Transport>(session: &mut Session<T>, reset_args: &ResetArguments) -> Result<()>
{
	if reset_args.halt {
		session.set_halt_on_reset()?;
	}
	let result = session.reset_hart();
	// Don't leave halt-on-reset armed for whoever resets the hart next
	if reset_args.halt {
		session.clear_halt_on_reset()?;
	}
	Ok(result?)
}
