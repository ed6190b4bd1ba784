// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

use log::{debug, trace};

use crate::debug::{AccessRegisterCommand, COMMAND, DmAddress, PROGBUF0};
use crate::error::DebugError;
use crate::session::Session;
use crate::transport::Transport;

/// The largest program buffer `abstractcs.progbufsize` can describe
pub const PROGBUF_MAX_WORDS: usize = 16;

impl<T: Transport> Session<T>
{
	/// Write `program` into the program buffer, one instruction per word starting at
	/// `progbuf0`. The program is checked against the buffer's size when it is known, and
	/// never runs past the architectural maximum.
	pub fn load_program(&mut self, program: &[u32]) -> Result<(), DebugError>
	{
		let capacity = self
			.progbuf_capacity
			.map_or(PROGBUF_MAX_WORDS, |capacity| capacity.min(PROGBUF_MAX_WORDS));
		if program.len() > capacity {
			crate::log_and_return!(DebugError::ProgramTooLarge {
				len: program.len(),
				capacity,
			});
		}

		debug!("Loading {} instructions into the program buffer", program.len());
		for (offset, &instruction) in program.iter().enumerate() {
			trace!("progbuf{} <- {:#010x}", offset, instruction);
			self.write_dmi(PROGBUF0 + offset as DmAddress, instruction)?;
		}
		Ok(())
	}

	/// Run whatever is in the program buffer
	pub fn execute_program(&mut self) -> Result<(), DebugError>
	{
		debug!("Executing the program buffer");
		self.write_dmi(COMMAND, AccessRegisterCommand::execute_progbuf().0)?;
		if self.transport().is_live() {
			self.wait_for_command()
		} else {
			let settle_cycles = self.config.settle_cycles;
			self.transport_mut().idle(settle_cycles)
		}
	}
}
