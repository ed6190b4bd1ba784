// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

//! Raw DMI access and the DTM/Debug Module housekeeping built directly on it

use log::{debug, info, trace};

use crate::debug::{ABSTRACTCS, Abstractcs, CommandError, DMCONTROL, DebugFault, DmAddress, Dmcontrol, Dtmcs};
use crate::error::DebugError;
use crate::session::Session;
use crate::transport::{Check, Transport};

impl<T: Transport> Session<T>
{
	pub fn write_dmi(&mut self, address: DmAddress, data: u32) -> Result<(), DebugError>
	{
		trace!("DMI write {:#04x} <- {:#010x}", address, data);
		self.transport_mut().write_raw(address, data)
	}

	pub fn read_dmi(&mut self, address: DmAddress) -> Result<u32, DebugError>
	{
		let data = self.transport_mut().read_raw(address)?;
		trace!("DMI read {:#04x} -> {:#010x}", address, data);
		Ok(data)
	}

	/// Assert that the bits of the register at `address` selected by `mask` hold `expected`.
	/// Offline transports record the assertion instead of checking it, which also counts
	/// as success here.
	pub fn expect_dmi(&mut self, address: DmAddress, expected: u32, mask: u32, failure: &str) -> Result<(), DebugError>
	{
		match self.transport_mut().expect_raw(address, expected, mask)? {
			Check::Passed | Check::Deferred => Ok(()),
			Check::Failed(actual) => {
				crate::log_and_return!(DebugError::ProtocolAssertion(format!(
					"{}: register {:#04x} read {:#010x}, expected {:#010x} under mask {:#010x}",
					failure, address, actual, expected, mask
				)));
			},
		}
	}

	/// Clear a sticky error in the DTM's DMI status by pulsing `dtmcs.dmireset`
	pub fn reset_sticky_error(&mut self) -> Result<(), DebugError>
	{
		let mut control = Dtmcs(0);
		control.set_dmireset(true);
		self.transport_mut().write_dtmcs(control.0)?;
		self.check_dmi_status("DMI status still reports an error after dmireset")
	}

	/// Reset the DTM entirely via `dtmcs.dtmhardreset`, abandoning any DMI access in flight
	pub fn hard_reset_dtm(&mut self) -> Result<(), DebugError>
	{
		let mut control = Dtmcs(0);
		control.set_dtmhardreset(true);
		self.transport_mut().write_dtmcs(control.0)?;
		self.check_dmi_status("DMI status still reports an error after dtmhardreset")
	}

	fn check_dmi_status(&mut self, failure: &str) -> Result<(), DebugError>
	{
		if !self.transport().is_live() {
			return Ok(());
		}
		let status = Dtmcs(self.transport_mut().read_dtmcs()?);
		if status.dmistat() != 0 {
			crate::log_and_return!(DebugError::ProtocolAssertion(format!(
				"{} ({})",
				failure,
				DebugFault::DmiStatus(status.dmistat())
			)));
		}
		Ok(())
	}

	pub fn activate_dm(&mut self) -> Result<(), DebugError>
	{
		debug!("Activating the debug module");
		self.write_dmi(DMCONTROL, Dmcontrol::active().0)?;
		self.expect_dmi(DMCONTROL, 1, 1, "debug module failed to activate")
	}

	pub fn deactivate_dm(&mut self) -> Result<(), DebugError>
	{
		debug!("Deactivating the debug module");
		self.write_dmi(DMCONTROL, 0)?;
		self.expect_dmi(DMCONTROL, 0, 1, "debug module failed to deactivate")
	}

	/// Put the whole debug module back into its reset state by toggling `dmactive`
	pub fn reset_dm(&mut self) -> Result<(), DebugError>
	{
		self.deactivate_dm()?;
		self.activate_dm()
	}

	pub fn reset_tap(&mut self) -> Result<(), DebugError>
	{
		self.transport_mut().reset_tap()
	}

	pub fn read_idcode(&mut self) -> Result<u32, DebugError>
	{
		let idcode = self.transport_mut().read_idcode()?;
		info!("IDCODE: {:#010x}", idcode);
		Ok(idcode)
	}

	pub fn expect_idcode(&mut self, expected: u32) -> Result<(), DebugError>
	{
		match self.transport_mut().expect_idcode(expected)? {
			Check::Passed | Check::Deferred => Ok(()),
			Check::Failed(actual) => {
				crate::log_and_return!(DebugError::ProtocolAssertion(format!(
					"IDCODE {:#010x} does not match the expected {:#010x}",
					actual, expected
				)));
			},
		}
	}

	/// Look through the DTM, the debug module and the abstract command state for the first
	/// thing that is wrong, if anything
	pub fn diagnose(&mut self) -> Result<Option<DebugFault>, DebugError>
	{
		let status = Dtmcs(self.transport_mut().read_dtmcs()?);
		if (1..=3).contains(&status.errinfo()) {
			return Ok(Some(DebugFault::Dtm(status.errinfo())));
		}
		if status.dmistat() != 0 {
			return Ok(Some(DebugFault::DmiStatus(status.dmistat())));
		}

		let control = Dmcontrol(self.read_dmi(DMCONTROL)?);
		if !control.dmactive() {
			return Ok(Some(DebugFault::InactiveDebugModule));
		}

		// cmderr only means something once the command has finished
		let abstractcs = Abstractcs(self.read_dmi(ABSTRACTCS)?);
		let error = CommandError::from_abstractcs(abstractcs);
		if !abstractcs.busy() && error != CommandError::None {
			return Ok(Some(DebugFault::Command(error)));
		}
		Ok(None)
	}
}
