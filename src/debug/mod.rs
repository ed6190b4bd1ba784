// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

//! Debug Module register definitions and the protocol engines built on them.
//!
//! Register layouts follow the RISC-V External Debug Support specification v0.13.2.
//! The engines themselves are implemented as `impl` blocks on [`crate::session::Session`]
//! spread across the submodules: DMI access, abstract commands, hart control, the program
//! buffer and scan chain interrogation.

use std::fmt::{self, Display, Formatter};

use bitfield::bitfield;
use serde::Serialize;

use crate::error::DebugError;

pub mod abstract_command;
pub mod dmi;
pub mod hart;
pub mod interrogate;
pub mod progbuf;

pub use interrogate::{TapInfo, parse_scan_chain, parse_xlen};

/// A 7-bit address of a register visible on the DMI bus
pub type DmAddress = u8;

/// `data0` - first of the abstract command message registers
pub const DATA0: DmAddress = 0x04;
/// `dmcontrol`
pub const DMCONTROL: DmAddress = 0x10;
/// `dmstatus`
pub const DMSTATUS: DmAddress = 0x11;
/// `abstractcs`
pub const ABSTRACTCS: DmAddress = 0x16;
/// `command`
pub const COMMAND: DmAddress = 0x17;
/// `progbuf0` - the program buffer is mapped from here upwards
pub const PROGBUF0: DmAddress = 0x20;

/// JTAG instruction selecting the IDCODE register
pub const IR_IDCODE: u8 = 0x01;
/// JTAG instruction selecting the DTM control and status register
pub const IR_DTMCS: u8 = 0x10;
/// JTAG instruction selecting the DMI access register
pub const IR_DMI: u8 = 0x11;

/// Length of the DTM's instruction register
pub const IR_LENGTH: u32 = 5;
/// Length of the `dtmcs` data register
pub const DTMCS_LENGTH: u32 = 32;
/// Length of the `dmi` data register: 7 address bits, 32 data bits, 2 op bits
pub const DMI_LENGTH: u32 = 41;

bitfield! {
	/// `dtmcs` register, selected by IR 0x10
	#[derive(Copy, Clone)]
	pub struct Dtmcs(u32);
	impl Debug;

	pub errinfo, _: 20, 18;
	pub dtmhardreset, set_dtmhardreset: 17;
	pub dmireset, set_dmireset: 16;
	pub idle, _: 14, 12;
	pub dmistat, _: 11, 10;
	pub abits, _: 9, 4;
	pub version, _: 3, 0;
}

bitfield! {
	/// `dmcontrol` register, located at address 0x10
	#[derive(Copy, Clone)]
	pub struct Dmcontrol(u32);
	impl Debug;

	pub haltreq, set_haltreq: 31;
	pub resumereq, set_resumereq: 30;
	pub hartreset, set_hartreset: 29;
	pub ackhavereset, set_ackhavereset: 28;
	pub hasel, set_hasel: 26;
	pub hartsello, set_hartsello: 25, 16;
	pub hartselhi, set_hartselhi: 15, 6;
	pub setresethaltreq, set_setresethaltreq: 3;
	pub clrresethaltreq, set_clrresethaltreq: 2;
	pub ndmreset, set_ndmreset: 1;
	pub dmactive, set_dmactive: 0;
}

impl Dmcontrol
{
	/// A `dmcontrol` value that keeps the debug module active and requests nothing else
	pub fn active() -> Self
	{
		let mut control = Dmcontrol(0);
		control.set_dmactive(true);
		control
	}
}

bitfield! {
	/// Readonly `dmstatus` register.
	///
	/// Located at address 0x11
	#[derive(Copy, Clone)]
	pub struct Dmstatus(u32);
	impl Debug;

	pub impebreak, _: 22;
	pub allhavereset, _: 19;
	pub anyhavereset, _: 18;
	pub allresumeack, _: 17;
	pub anyresumeack, _: 16;
	pub allnonexistent, _: 15;
	pub anynonexistent, _: 14;
	pub allunavail, _: 13;
	pub anyunavail, _: 12;
	pub allrunning, _: 11;
	pub anyrunning, _: 10;
	pub allhalted, _: 9;
	pub anyhalted, _: 8;
	pub authenticated, _: 7;
	pub authbusy, _: 6;
	pub hasresethaltreq, _: 5;
	pub confstrptrvalid, _: 4;
	pub version, _: 3, 0;
}

impl Dmstatus
{
	/// `anyhalted` and `allhalted`
	pub const HALTED_MASK: u32 = 0x3 << 8;
	/// `anyresumeack` and `allresumeack`
	pub const RESUMEACK_MASK: u32 = 0x3 << 16;
	/// `anyhavereset` and `allhavereset`
	pub const HAVERESET_MASK: u32 = 0x3 << 18;
}

bitfield! {
	#[derive(Copy, Clone)]
	pub struct Abstractcs(u32);
	impl Debug;

	pub progbufsize, _: 28, 24;
	pub busy, _: 12;
	pub cmderr, set_cmderr: 10, 8;
	pub datacount, _: 3, 0;
}

impl Abstractcs
{
	pub const BUSY_MASK: u32 = 1 << 12;
	pub const CMDERR_MASK: u32 = 0x7 << 8;
}

bitfield! {
	/// Abstract command word written to `command` (0x17). With `cmdtype` 0 this is the
	/// "Access Register" command; `postexec` additionally runs the program buffer.
	#[derive(Copy, Clone, PartialEq, Eq)]
	pub struct AccessRegisterCommand(u32);
	impl Debug;

	pub cmdtype, set_cmdtype: 31, 24;
	pub aarsize, set_aarsize: 22, 20;
	pub aarpostincrement, set_aarpostincrement: 19;
	pub postexec, set_postexec: 18;
	pub transfer, set_transfer: 17;
	pub write, set_write: 16;
	pub regno, set_regno: 15, 0;
}

impl AccessRegisterCommand
{
	/// Build the command word that moves a register of `width` between the hart and the
	/// message registers
	pub fn access_register(regno: u16, width: TransferWidth, write: bool) -> Self
	{
		let mut command = AccessRegisterCommand(0);
		command.set_transfer(true);
		command.set_aarsize(width.aarsize());
		command.set_write(write);
		command.set_regno(regno as u32);
		command
	}

	/// Build the command word that only executes the program buffer
	pub fn execute_progbuf() -> Self
	{
		let mut command = AccessRegisterCommand(0);
		command.set_postexec(true);
		command
	}
}

/// Number of bits moved by one abstract register access
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TransferWidth
{
	W32,
	W64,
	W128,
}

impl TransferWidth
{
	pub fn bits(self) -> u32
	{
		match self {
			TransferWidth::W32 => 32,
			TransferWidth::W64 => 64,
			TransferWidth::W128 => 128,
		}
	}

	/// How many 32-bit `dataN` registers a value of this width spans
	pub fn slots(self) -> usize
	{
		(self.bits() / 32) as usize
	}

	/// The `aarsize` encoding, log2 of the width in bytes
	pub fn aarsize(self) -> u32
	{
		(self.bits() / 8).trailing_zeros()
	}

	/// Whether `value` can be represented in this many bits
	pub fn fits(self, value: u128) -> bool
	{
		fits_in(value, self.bits())
	}
}

impl TryFrom<u32> for TransferWidth
{
	type Error = DebugError;

	fn try_from(bits: u32) -> Result<Self, Self::Error>
	{
		match bits {
			32 => Ok(TransferWidth::W32),
			64 => Ok(TransferWidth::W64),
			128 => Ok(TransferWidth::W128),
			_ => Err(DebugError::InvalidWidth(bits)),
		}
	}
}

impl Display for TransferWidth
{
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result
	{
		write!(f, "{}", self.bits())
	}
}

pub(crate) fn fits_in(value: u128, bits: u32) -> bool
{
	bits >= 128 || value >> bits == 0
}

/// Abstract command error, decoded from `abstractcs.cmderr`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum CommandError
{
	None,
	Busy,
	NotSupported,
	Exception,
	HaltResume,
	Bus,
	Reserved,
	Other,
}

impl CommandError
{
	pub fn from_abstractcs(abstractcs: Abstractcs) -> Self
	{
		match abstractcs.cmderr() {
			0 => CommandError::None,
			1 => CommandError::Busy,
			2 => CommandError::NotSupported,
			3 => CommandError::Exception,
			4 => CommandError::HaltResume,
			5 => CommandError::Bus,
			6 => CommandError::Reserved,
			_ => CommandError::Other,
		}
	}
}

impl Display for CommandError
{
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result
	{
		let name = match self {
			CommandError::None => "none",
			CommandError::Busy => "busy",
			CommandError::NotSupported => "not supported",
			CommandError::Exception => "exception",
			CommandError::HaltResume => "halt/resume",
			CommandError::Bus => "bus",
			CommandError::Reserved => "reserved",
			CommandError::Other => "other",
		};
		f.write_str(name)
	}
}

/// Snapshot of the selected hart's state as reported by `dmstatus`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct HartStatus
{
	pub running: bool,
	pub halted: bool,
	pub resume_ack: bool,
	pub have_reset: bool,
}

impl From<Dmstatus> for HartStatus
{
	fn from(status: Dmstatus) -> Self
	{
		Self {
			running: status.anyrunning(),
			halted: status.anyhalted(),
			resume_ack: status.anyresumeack(),
			have_reset: status.anyhavereset(),
		}
	}
}

/// A fault reported by one of the layers between us and the hart
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DebugFault
{
	/// `dtmcs.errinfo` reported an error
	Dtm(u32),
	/// `dtmcs.dmistat` is non-zero - a sticky DMI error needs clearing
	DmiStatus(u32),
	/// `dmcontrol.dmactive` reads back as 0
	InactiveDebugModule,
	/// An abstract command error is latched in `abstractcs`
	Command(CommandError),
}

impl Display for DebugFault
{
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result
	{
		match self {
			DebugFault::Dtm(errinfo) => {
				let name = match errinfo {
					0 => "not implemented",
					1 => "dmi error",
					2 => "communication error",
					3 => "device error",
					_ => "unknown",
				};
				write!(f, "DTM error: {}", name)
			},
			DebugFault::DmiStatus(op) => {
				let name = match op {
					0 => "success",
					1 => "reserved",
					2 => "failed",
					_ => "busy",
				};
				write!(f, "DMI status error: {}", name)
			},
			DebugFault::InactiveDebugModule => write!(f, "DMControl error: debug module is not active"),
			DebugFault::Command(error) => write!(f, "Abstract command error: {}", error),
		}
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn access_register_words()
	{
		// transfer | aarsize=3 | write | x8
		let command = AccessRegisterCommand::access_register(0x1008, TransferWidth::W64, true);
		assert_eq!(command.0, 0x0033_1008);
		let command = AccessRegisterCommand::access_register(0x07b0, TransferWidth::W32, false);
		assert_eq!(command.0, 0x0022_07b0);
		let command = AccessRegisterCommand::access_register(0x1001, TransferWidth::W128, false);
		assert_eq!(command.0, 0x0042_1001);
		assert_eq!(AccessRegisterCommand::execute_progbuf().0, 0x0004_0000);
	}

	#[test]
	fn width_geometry()
	{
		assert_eq!(TransferWidth::W32.slots(), 1);
		assert_eq!(TransferWidth::W64.slots(), 2);
		assert_eq!(TransferWidth::W128.slots(), 4);
		assert!(TransferWidth::W32.fits(0xffff_ffff));
		assert!(!TransferWidth::W32.fits(0x1_0000_0000));
		assert!(TransferWidth::W128.fits(u128::MAX));
		assert!(matches!(TransferWidth::try_from(16), Err(DebugError::InvalidWidth(16))));
	}

	#[test]
	fn command_errors_decode()
	{
		let mut abstractcs = Abstractcs(0);
		assert_eq!(CommandError::from_abstractcs(abstractcs), CommandError::None);
		abstractcs.set_cmderr(3);
		assert_eq!(CommandError::from_abstractcs(abstractcs), CommandError::Exception);
		abstractcs.set_cmderr(7);
		assert_eq!(CommandError::from_abstractcs(abstractcs), CommandError::Other);
	}
}
