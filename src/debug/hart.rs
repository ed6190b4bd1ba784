// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

//! Run control of the selected hart. Nothing about the hart's state is tracked here: each
//! operation asks the debug module for the acknowledgement it expects.

use log::{debug, info};

use crate::debug::{DMCONTROL, DMSTATUS, Dmcontrol, Dmstatus, HartStatus};
use crate::error::DebugError;
use crate::session::Session;
use crate::transport::Transport;

/// `dcsr.step`
const DCSR_STEP: u32 = 1 << 2;

impl<T: Transport> Session<T>
{
	pub fn halt(&mut self) -> Result<(), DebugError>
	{
		info!("Halting hart");
		let mut control = Dmcontrol::active();
		control.set_haltreq(true);
		self.write_dmi(DMCONTROL, control.0)?;
		self.expect_dmi(DMSTATUS, Dmstatus::HALTED_MASK, Dmstatus::HALTED_MASK, "hart failed to halt")?;
		self.write_dmi(DMCONTROL, Dmcontrol::active().0)
	}

	pub fn resume(&mut self) -> Result<(), DebugError>
	{
		info!("Resuming hart");
		self.request_resume()?;
		self.expect_dmi(
			DMSTATUS,
			Dmstatus::RESUMEACK_MASK,
			Dmstatus::RESUMEACK_MASK,
			"hart failed to resume",
		)
	}

	fn request_resume(&mut self) -> Result<(), DebugError>
	{
		let mut control = Dmcontrol::active();
		control.set_resumereq(true);
		self.write_dmi(DMCONTROL, control.0)
	}

	/// Execute a single instruction on a halted hart, leaving `dcsr.step` clear afterwards
	pub fn step(&mut self) -> Result<(), DebugError>
	{
		info!("Stepping hart");
		let mut dcsr = if self.transport().is_live() {
			self.read_register("DCSR", None)? as u32
		} else {
			self.dcsr_shadow
		};
		if dcsr & DCSR_STEP == 0 {
			dcsr |= DCSR_STEP;
			self.write_register("DCSR", dcsr as u128, None)?;
		}

		self.request_resume()?;

		dcsr &= !DCSR_STEP;
		self.write_register("DCSR", dcsr as u128, None)?;
		self.dcsr_shadow = dcsr;
		Ok(())
	}

	/// Reset the harts through `ndmreset` and acknowledge the reset once it has been seen
	pub fn reset_hart(&mut self) -> Result<(), DebugError>
	{
		info!("Resetting hart");
		let mut control = Dmcontrol::active();
		control.set_ndmreset(true);
		self.write_dmi(DMCONTROL, control.0)?;
		self.write_dmi(DMCONTROL, Dmcontrol::active().0)?;
		self.expect_dmi(
			DMSTATUS,
			Dmstatus::HAVERESET_MASK,
			Dmstatus::HAVERESET_MASK,
			"hart failed to reset",
		)?;

		let mut acknowledge = Dmcontrol::active();
		acknowledge.set_ackhavereset(true);
		self.write_dmi(DMCONTROL, acknowledge.0)?;
		// The hart no longer holds whatever dcsr we last wrote
		self.dcsr_shadow = 0;
		Ok(())
	}

	/// Have the hart halt as soon as it comes out of its next reset
	pub fn set_halt_on_reset(&mut self) -> Result<(), DebugError>
	{
		debug!("Setting halt-on-reset");
		let mut control = Dmcontrol::active();
		control.set_setresethaltreq(true);
		self.write_dmi(DMCONTROL, control.0)
	}

	pub fn clear_halt_on_reset(&mut self) -> Result<(), DebugError>
	{
		debug!("Clearing halt-on-reset");
		let mut control = Dmcontrol::active();
		control.set_clrresethaltreq(true);
		self.write_dmi(DMCONTROL, control.0)
	}

	pub fn hart_status(&mut self) -> Result<HartStatus, DebugError>
	{
		let status = Dmstatus(self.read_dmi(DMSTATUS)?);
		Ok(HartStatus::from(status))
	}
}

#[cfg(test)]
mod tests
{
	use crate::debug::{Dmcontrol, Dmstatus};

	#[test]
	fn control_words()
	{
		let mut control = Dmcontrol::active();
		control.set_haltreq(true);
		assert_eq!(control.0, 0x8000_0001);

		let mut control = Dmcontrol::active();
		control.set_resumereq(true);
		assert_eq!(control.0, 0x4000_0001);

		let mut control = Dmcontrol::active();
		control.set_ackhavereset(true);
		assert_eq!(control.0, 0x1000_0001);

		let mut control = Dmcontrol::active();
		control.set_setresethaltreq(true);
		assert_eq!(control.0, 0x9);

		let mut control = Dmcontrol::active();
		control.set_clrresethaltreq(true);
		assert_eq!(control.0, 0x5);
	}

	#[test]
	fn status_masks()
	{
		let status = Dmstatus(Dmstatus::HALTED_MASK | Dmstatus::HAVERESET_MASK);
		assert!(status.allhalted() && status.anyhalted());
		assert!(status.allhavereset() && status.anyhavereset());
		assert!(!status.anyresumeack());
	}
}
