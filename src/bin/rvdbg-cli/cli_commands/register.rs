// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

use clap::Args;
use color_eyre::eyre::{Context, Result};
use log::info;
use rvdbg::Session;
use rvdbg::registers::RegisterGroup;
use rvdbg::transport::Transport;
use serde::Serialize;

use crate::cli_commands::parse_value;

#[derive(Args)]
pub struct ReadArguments
{
	/// Register to read, by architectural or ABI name
	register: String,
}

#[derive(Args)]
pub struct WriteArguments
{
	/// Register to write, by architectural or ABI name
	register: String,
	#[arg(value_parser = parse_value)]
	/// Value to write, in hex (0x prefixed) or decimal
	value: u128,
}

#[derive(Args)]
pub struct ExpectArguments
{
	/// Register to check, by architectural or ABI name
	register: String,
	#[arg(value_parser = parse_value)]
	/// Value the register must hold, in hex (0x prefixed) or decimal
	value: u128,
}

#[derive(Args)]
pub struct DumpArguments
{
	#[arg(long = "float", default_value_t = false)]
	/// Dump the floating point registers instead of the integer ones
	float: bool,
	#[arg(long = "json", default_value_t = false)]
	/// Print the dump as JSON
	json: bool,
}

#[derive(Serialize)]
struct DumpEntry
{
	register: &'static str,
	value: Option<String>,
}

pub fn read_command<T: Transport>(session: &mut Session<T>, read_args: &ReadArguments) -> Result<()>
{
	let value = session
		.read_register(&read_args.register, None)
		.wrap_err_with(|| format!("reading {}", read_args.register))?;
	println!("{} = {:#x}", read_args.register, value);
	Ok(())
}

pub fn write_command<T: Transport>(session: &mut Session<T>, write_args: &WriteArguments) -> Result<()>
{
	session
		.write_register(&write_args.register, write_args.value, None)
		.wrap_err_with(|| format!("writing {}", write_args.register))?;
	info!("Wrote {:#x} to {}", write_args.value, write_args.register);
	Ok(())
}

pub fn expect_command<T: Transport>(session: &mut Session<T>, expect_args: &ExpectArguments) -> Result<()>
{
	session
		.expect_register(&expect_args.register, expect_args.value, None)
		.wrap_err_with(|| format!("checking {}", expect_args.register))?;
	Ok(())
}

pub fn dump_command<T: Transport>(session: &mut Session<T>, dump_args: &DumpArguments) -> Result<()>
{
	let group = if dump_args.float { RegisterGroup::Float } else { RegisterGroup::Integer };
	let dump = session.dump_registers(group, None)?;

	if dump_args.json {
		let entries: Vec<DumpEntry> = dump
			.into_iter()
			.map(|(register, value)| DumpEntry {
				register,
				value: value.map(|value| format!("{:#x}", value)),
			})
			.collect();
		println!("{}", serde_json::to_string_pretty(&entries)?);
		return Ok(());
	}

	let digits = (session.width().bits() / 4) as usize;
	for (register, value) in dump {
		match value {
			Some(value) => println!("{:>4}: {:#0width$x}", register, value, width = digits + 2),
			None => println!("{:>4}: unavailable", register),
		}
	}
	Ok(())
}
