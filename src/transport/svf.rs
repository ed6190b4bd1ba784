// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

//! Offline transport that records every access as Serial Vector Format scans instead of
//! performing it, producing a script a tester or simulation testbench can replay.

use std::path::PathBuf;

use log::{debug, info};
use ::svf::{Command, Pattern, RunClock, RunTestForm, State};

use crate::config::SessionConfig;
use crate::debug::{DMI_LENGTH, DTMCS_LENGTH, DmAddress, IR_DMI, IR_DTMCS, IR_IDCODE, IR_LENGTH};
use crate::error::DebugError;
use crate::transport::{Check, Transport};

/// DMI `op` values for requests
const DMI_OP_NOP: u64 = 0;
const DMI_OP_READ: u64 = 1;
const DMI_OP_WRITE: u64 = 2;

pub struct VectorEmitter
{
	lines: Vec<String>,
	/// The instruction currently held in the DTM's instruction register. IDCODE is what a
	/// TAP selects coming out of reset.
	current_ir: u8,
	output: Option<PathBuf>,
}

impl VectorEmitter
{
	pub fn new(config: &SessionConfig) -> Self
	{
		Self {
			lines: Vec::new(),
			current_ir: IR_IDCODE,
			output: config.vector_output.clone(),
		}
	}

	/// An emitter that only keeps the artifact in memory
	pub fn in_memory() -> Self
	{
		Self::new(&SessionConfig::default())
	}

	/// The vectors emitted so far, one directive per line
	pub fn artifact(&self) -> String
	{
		let mut artifact = self.lines.join("\n");
		if !artifact.is_empty() {
			artifact.push('\n');
		}
		artifact
	}

	pub fn comment(&mut self, text: &str)
	{
		self.lines.push(format!("// {}", text));
	}

	fn push(&mut self, command: Command)
	{
		self.lines.push(command.to_string());
	}

	fn select_instruction(&mut self, instruction: u8)
	{
		if self.current_ir != instruction {
			self.push(Command::SIR(Pattern {
				length: IR_LENGTH,
				tdi: Some(vec![instruction]),
				tdo: None,
				mask: None,
				smask: None,
			}));
			self.current_ir = instruction;
		}
	}

	fn shift_data(&mut self, length: u32, tdi: u64, expect: Option<(u64, u64)>)
	{
		let (tdo, mask) = match expect {
			Some((tdo, mask)) => (Some(to_scan_bytes(tdo, length)), Some(to_scan_bytes(mask, length))),
			None => (None, None),
		};
		self.push(Command::SDR(Pattern {
			length,
			tdi: Some(to_scan_bytes(tdi, length)),
			tdo,
			mask,
			smask: None,
		}));
	}
}

/// Pack the low `length` bits of `value` least significant byte first, as SVF patterns are held
fn to_scan_bytes(value: u64, length: u32) -> Vec<u8>
{
	let bytes = length.div_ceil(8) as usize;
	value.to_le_bytes()[..bytes].to_vec()
}

fn dmi_request(address: DmAddress, data: u32, op: u64) -> u64
{
	((address as u64) << 34) | ((data as u64) << 2) | op
}

impl Transport for VectorEmitter
{
	fn is_live(&self) -> bool
	{
		false
	}

	fn connect(&mut self) -> Result<(), DebugError>
	{
		debug!("Starting a new vector artifact");
		Ok(())
	}

	fn disconnect(&mut self) -> Result<(), DebugError>
	{
		if let Some(path) = &self.output {
			std::fs::write(path, self.artifact())
				.map_err(|error| DebugError::io(&format!("write vectors to {}", path.display()), error))?;
			info!("Wrote {} vector directives to {}", self.lines.len(), path.display());
		}
		Ok(())
	}

	fn write_raw(&mut self, address: DmAddress, data: u32) -> Result<(), DebugError>
	{
		self.select_instruction(IR_DMI);
		self.shift_data(DMI_LENGTH, dmi_request(address, data, DMI_OP_WRITE), None);
		Ok(())
	}

	fn read_raw(&mut self, _address: DmAddress) -> Result<u32, DebugError>
	{
		Err(DebugError::Unsupported("read DMI registers back while generating vectors"))
	}

	fn expect_raw(&mut self, address: DmAddress, expected: u32, mask: u32) -> Result<Check, DebugError>
	{
		self.select_instruction(IR_DMI);
		self.shift_data(DMI_LENGTH, dmi_request(address, 0, DMI_OP_READ), None);
		// The result is captured by the next scan; its op field must report success
		let tdo = (expected as u64) << 2;
		let mask = ((mask as u64) << 2) | 0x3;
		self.shift_data(DMI_LENGTH, dmi_request(0, 0, DMI_OP_NOP), Some((tdo, mask)));
		Ok(Check::Deferred)
	}

	fn write_dtmcs(&mut self, value: u32) -> Result<(), DebugError>
	{
		self.select_instruction(IR_DTMCS);
		self.shift_data(DTMCS_LENGTH, value as u64, None);
		Ok(())
	}

	fn read_dtmcs(&mut self) -> Result<u32, DebugError>
	{
		Err(DebugError::Unsupported("read dtmcs back while generating vectors"))
	}

	fn read_idcode(&mut self) -> Result<u32, DebugError>
	{
		Err(DebugError::Unsupported("read IDCODE back while generating vectors"))
	}

	fn expect_idcode(&mut self, expected: u32) -> Result<Check, DebugError>
	{
		self.select_instruction(IR_IDCODE);
		self.shift_data(32, 0, Some((expected as u64, 0xffff_ffff)));
		Ok(Check::Deferred)
	}

	fn reset_tap(&mut self) -> Result<(), DebugError>
	{
		self.push(Command::State {
			path: None,
			end: State::RESET,
		});
		self.push(Command::State {
			path: None,
			end: State::IDLE,
		});
		self.current_ir = IR_IDCODE;
		Ok(())
	}

	fn idle(&mut self, cycles: u32) -> Result<(), DebugError>
	{
		self.push(Command::RunTest {
			run_state: None,
			form: RunTestForm::Clocked {
				run_count: cycles,
				run_clk: RunClock::TCK,
				time: None,
			},
			end_state: None,
		});
		Ok(())
	}

	fn annotate(&mut self, note: &str)
	{
		self.comment(note);
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn dmi_write_scan()
	{
		let mut emitter = VectorEmitter::in_memory();
		emitter.write_raw(0x10, 0x8000_0001).ok();
		emitter.write_raw(0x10, 0x1).ok();
		// Only the first access needs to select the DMI register
		assert_eq!(emitter.artifact(), "SIR 5 TDI (11);\nSDR 41 TDI (4200000006);\nSDR 41 TDI (4000000006);\n");
	}

	#[test]
	fn dmi_expect_scan()
	{
		let mut emitter = VectorEmitter::in_memory();
		assert_eq!(emitter.expect_raw(0x11, 0x300, 0x300).ok(), Some(Check::Deferred));
		assert_eq!(emitter.artifact(), "SIR 5 TDI (11);\nSDR 41 TDI (4400000001);\nSDR 41 TDI (00) TDO (0C00) MASK (0C03);\n");
	}

	#[test]
	fn live_reads_are_refused()
	{
		let mut emitter = VectorEmitter::in_memory();
		assert!(matches!(emitter.read_raw(0x11), Err(DebugError::Unsupported(_))));
		assert!(emitter.artifact().is_empty());
	}
}
