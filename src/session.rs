// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

use log::debug;

use crate::config::SessionConfig;
use crate::debug::{TapInfo, TransferWidth};
use crate::error::DebugError;
use crate::transport::Transport;

/// A connection to one hart's debug module through a [`Transport`], plus everything that has
/// been negotiated about the target so far.
///
/// The protocol engines (DMI access, abstract commands, hart control, the program buffer) are
/// all methods on this type, implemented once for every transport.
pub struct Session<T: Transport>
{
	transport: T,
	pub(crate) config: SessionConfig,
	pub(crate) tap: Option<TapInfo>,
	pub(crate) xlen: Option<u32>,
	pub(crate) width: TransferWidth,
	pub(crate) progbuf_capacity: Option<usize>,
	/// Last value written to `dcsr`, for transports that cannot read it back
	pub(crate) dcsr_shadow: u32,
}

impl<T: Transport> Session<T>
{
	/// Connect `transport` and wrap it in a session
	pub fn open(mut transport: T, config: SessionConfig) -> Result<Self, DebugError>
	{
		transport.connect()?;
		let width = config.width.unwrap_or(TransferWidth::W64);
		debug!("Session opened with a {} bit transfer width", width);
		Ok(Self {
			transport,
			progbuf_capacity: config.progbuf_capacity,
			config,
			tap: None,
			xlen: None,
			width,
			dcsr_shadow: 0,
		})
	}

	/// Disconnect from the target, handing back the transport (e.g. to collect what an
	/// offline transport recorded)
	pub fn close(mut self) -> Result<T, DebugError>
	{
		self.transport.disconnect()?;
		Ok(self.transport)
	}

	pub fn transport(&self) -> &T
	{
		&self.transport
	}

	pub fn transport_mut(&mut self) -> &mut T
	{
		&mut self.transport
	}

	pub fn config(&self) -> &SessionConfig
	{
		&self.config
	}

	/// The tap found by interrogation, if the session has been interrogated
	pub fn tap(&self) -> Option<&TapInfo>
	{
		self.tap.as_ref()
	}

	pub fn xlen(&self) -> Option<u32>
	{
		self.xlen
	}

	/// Width used by register accesses that don't specify one
	pub fn width(&self) -> TransferWidth
	{
		self.width
	}

	pub fn set_width(&mut self, width: TransferWidth)
	{
		self.width = width;
	}

	pub fn progbuf_capacity(&self) -> Option<usize>
	{
		self.progbuf_capacity
	}

	/// Record XLEN as reported by the target, adopting it as the default transfer width
	/// unless one was configured explicitly
	pub(crate) fn negotiate_xlen(&mut self, xlen: u32) -> Result<(), DebugError>
	{
		self.xlen = Some(xlen);
		if self.config.width.is_none() {
			self.width = TransferWidth::try_from(xlen)?;
			debug!("Using XLEN of {} bits as the transfer width", xlen);
		}
		Ok(())
	}
}
