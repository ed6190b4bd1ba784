// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

//! The Access Register abstract command: moving register values between a halted hart and
//! the `dataN` message registers, and waiting for the debug module to finish doing so.

use std::thread::sleep;
use std::time::Instant;

use log::{debug, trace, warn};

use crate::debug::{
	ABSTRACTCS, Abstractcs, AccessRegisterCommand, COMMAND, CommandError, DATA0, DmAddress, TransferWidth, fits_in,
};
use crate::error::DebugError;
use crate::registers::{self, RegisterGroup, RegisterRef};
use crate::session::Session;
use crate::transport::Transport;

/// Bits of a register value that are actually backed by the register
fn value_mask(bits: u32) -> u128
{
	if bits >= 128 { u128::MAX } else { (1u128 << bits) - 1 }
}

fn data_register(slot: usize) -> DmAddress
{
	DATA0 + slot as DmAddress
}

impl<T: Transport> Session<T>
{
	/// Resolve `name` and work out how many bits of it a transfer of `width` carries
	fn locate(&self, name: &str, width: Option<TransferWidth>) -> Result<(RegisterRef, TransferWidth, u32), DebugError>
	{
		let register = registers::resolve(name)?;
		let width = width.unwrap_or(self.width);
		let bits = register
			.width_override
			.map_or(width.bits(), |bits| bits.min(width.bits()));
		Ok((register, width, bits))
	}

	/// Write `value` into the hart register `name`. `width` selects the transfer size,
	/// defaulting to the session's.
	pub fn write_register(&mut self, name: &str, value: u128, width: Option<TransferWidth>) -> Result<(), DebugError>
	{
		let (register, width, bits) = self.locate(name, width)?;
		if !fits_in(value, bits) {
			crate::log_and_return!(DebugError::ValueOutOfRange { value, width: bits });
		}
		debug!("Writing {:#x} to {} ({} bit transfer)", value, register.name, width);

		for slot in 0..width.slots() {
			self.write_dmi(data_register(slot), (value >> (32 * slot)) as u32)?;
		}
		let command = AccessRegisterCommand::access_register(register.regno, width, true);
		self.write_dmi(COMMAND, command.0)?;
		self.wait_for_command()
	}

	/// Read the hart register `name`. Needs a transport that can read the target.
	pub fn read_register(&mut self, name: &str, width: Option<TransferWidth>) -> Result<u128, DebugError>
	{
		let (register, width, bits) = self.locate(name, width)?;
		if !self.transport().is_live() {
			return Err(DebugError::Unsupported("read hart registers back while generating vectors"));
		}
		self.fetch_register(&register, width)?;

		let mut value = 0u128;
		for slot in 0..width.slots() {
			value |= (self.read_dmi(data_register(slot))? as u128) << (32 * slot);
		}
		let value = value & value_mask(bits);
		debug!("Read {:#x} from {} ({} bit transfer)", value, register.name, width);
		Ok(value)
	}

	/// Assert that the hart register `name` holds `expected`. On offline transports this
	/// records the comparison against each message register.
	pub fn expect_register(&mut self, name: &str, expected: u128, width: Option<TransferWidth>)
	-> Result<(), DebugError>
	{
		let (register, width, bits) = self.locate(name, width)?;
		if !fits_in(expected, bits) {
			crate::log_and_return!(DebugError::ValueOutOfRange { value: expected, width: bits });
		}
		self.fetch_register(&register, width)?;

		let mask = value_mask(bits);
		let failure = format!("{} does not hold {:#x}", register.name, expected);
		for slot in 0..width.slots() {
			let shift = 32 * slot;
			self.expect_dmi(
				data_register(slot),
				(expected >> shift) as u32,
				(mask >> shift) as u32,
				&failure,
			)?;
		}
		Ok(())
	}

	/// Copy a register into the message registers
	fn fetch_register(&mut self, register: &RegisterRef, width: TransferWidth) -> Result<(), DebugError>
	{
		let command = AccessRegisterCommand::access_register(register.regno, width, false);
		self.write_dmi(COMMAND, command.0)?;
		self.wait_for_command()
	}

	/// Wait for the abstract command in flight to finish and report how it went. Offline
	/// transports cannot poll, so they let the target settle and then assert that the
	/// command completed without error.
	pub fn wait_for_command(&mut self) -> Result<(), DebugError>
	{
		if !self.transport().is_live() {
			let settle_cycles = self.config.settle_cycles;
			self.transport_mut().idle(settle_cycles)?;
			return self.expect_dmi(
				ABSTRACTCS,
				0,
				Abstractcs::BUSY_MASK | Abstractcs::CMDERR_MASK,
				"abstract command did not complete cleanly",
			);
		}

		let abstractcs = self.poll_abstractcs()?;
		match CommandError::from_abstractcs(abstractcs) {
			CommandError::None => Ok(()),
			error => Err(DebugError::Command(error)),
		}
	}

	/// Read `abstractcs` until the busy bit clears or the configured timeout runs out
	fn poll_abstractcs(&mut self) -> Result<Abstractcs, DebugError>
	{
		let started = Instant::now();
		loop {
			let abstractcs = Abstractcs(self.read_dmi(ABSTRACTCS)?);
			if !abstractcs.busy() {
				return Ok(abstractcs);
			}
			if started.elapsed() >= self.config.busy_timeout {
				crate::log_and_return!(DebugError::BusyTimeout(self.config.busy_timeout));
			}
			trace!("Abstract command busy, retrying in {:?}", self.config.poll_interval);
			sleep(self.config.poll_interval);
		}
	}

	/// Acknowledge a latched abstract command error so the next command can be issued
	pub fn clear_command_error(&mut self) -> Result<(), DebugError>
	{
		self.write_dmi(ABSTRACTCS, Abstractcs::CMDERR_MASK)?;
		if !self.transport().is_live() {
			return self.expect_dmi(ABSTRACTCS, 0, Abstractcs::CMDERR_MASK, "abstract command error did not clear");
		}

		let error = CommandError::from_abstractcs(self.poll_abstractcs()?);
		if error != CommandError::None {
			crate::log_and_return!(DebugError::ProtocolAssertion(format!(
				"abstract command error '{}' is still set after clearing it",
				error
			)));
		}
		Ok(())
	}

	/// Read every register in `group`. The first register to raise an exception is taken to
	/// mark the end of what the hart implements: the error is cleared and that register and
	/// the rest of the group are reported without a value.
	pub fn dump_registers(&mut self, group: RegisterGroup, width: Option<TransferWidth>)
	-> Result<Vec<(&'static str, Option<u128>)>, DebugError>
	{
		let mut dump = Vec::with_capacity(group.members().len());
		let mut implemented = true;
		for &name in group.members() {
			if !implemented {
				dump.push((name, None));
				continue;
			}
			match self.read_register(name, width) {
				Ok(value) => dump.push((name, Some(value))),
				Err(error) if error.command_error() == Some(CommandError::Exception) => {
					warn!("{} is not implemented, skipping the rest of the {} registers", name, group);
					self.clear_command_error()?;
					implemented = false;
					dump.push((name, None));
				},
				Err(error) => return Err(error),
			}
		}
		Ok(dump)
	}

	/// Ask the debug module how large its program buffer is, and hold later program loads to
	/// that size
	pub fn discover_progbuf_size(&mut self) -> Result<usize, DebugError>
	{
		let abstractcs = Abstractcs(self.read_dmi(ABSTRACTCS)?);
		let capacity = abstractcs.progbufsize() as usize;
		debug!(
			"Program buffer holds {} words, {} data registers available",
			capacity,
			abstractcs.datacount()
		);
		self.progbuf_capacity = Some(capacity);
		Ok(capacity)
	}
}
