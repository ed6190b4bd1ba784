// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

//! Discovery of the debug tap and the hart's XLEN from OpenOCD's console output

use std::sync::LazyLock;

use log::{info, warn};
use regex::Regex;
use serde::Serialize;

use crate::error::DebugError;
use crate::session::Session;
use crate::transport::ConsoleSession;

/// A row of `scan_chain` output: `<index> <tap name> <enabled> <idcode> ...`
static TAP_ROW: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\d\s+(\S+)\s+(?:\S+\s+(0x[0-9a-fA-F]+))?").expect("tap row pattern is valid")
});
static HART_XLEN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"hart\.xlen\s+(\d+)").expect("xlen pattern is valid"));

/// The tap the debug transport module sits behind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TapInfo
{
	pub name: String,
	pub idcode: Option<u32>,
}

/// Pick the debug tap out of a `scan_chain` listing. The first two lines are the table
/// header; when the chain holds more than one tap the first is used.
pub fn parse_scan_chain(listing: &str) -> Result<TapInfo, DebugError>
{
	let taps: Vec<&str> = listing
		.lines()
		.skip(2)
		.filter(|line| !line.trim().is_empty())
		.collect();
	let first = match taps.first() {
		Some(&first) => first,
		None => {
			crate::log_and_return!(DebugError::ProtocolAssertion(format!(
				"scan chain listing names no taps:\n{}",
				listing
			)));
		},
	};
	if taps.len() > 1 {
		warn!("Found {} taps on the scan chain, selecting tap #0\n{}", taps.len(), listing);
	}

	let captures = match TAP_ROW.captures(first) {
		Some(captures) => captures,
		None => {
			crate::log_and_return!(DebugError::ProtocolAssertion(format!(
				"could not find a tap name in '{}'",
				first
			)));
		},
	};
	let idcode = captures
		.get(2)
		.and_then(|idcode| u32::from_str_radix(idcode.as_str().trim_start_matches("0x"), 16).ok());
	Ok(TapInfo {
		name: captures[1].to_string(),
		idcode,
	})
}

/// Find the hart's XLEN in `riscv info` output
pub fn parse_xlen(info: &str) -> Result<u32, DebugError>
{
	let xlen = HART_XLEN
		.captures(info)
		.and_then(|captures| captures[1].parse::<u32>().ok());
	match xlen {
		Some(xlen) => Ok(xlen),
		None => {
			crate::log_and_return!(DebugError::ProtocolAssertion(format!(
				"'riscv info' did not report hart.xlen:\n{}",
				info
			)));
		},
	}
}

impl Session<ConsoleSession>
{
	/// Ask the adapter which tap to talk to and how wide the hart's registers are, and adopt
	/// both for the rest of the session
	pub fn interrogate(&mut self) -> Result<(), DebugError>
	{
		let listing = self.transport_mut().execute_lines("scan_chain")?;
		let tap = parse_scan_chain(&listing)?;
		info!("DM tap name: {}", tap.name);
		self.transport_mut().set_tap_name(&tap.name);
		self.tap = Some(tap);

		let details = self.transport_mut().execute_lines("riscv info")?;
		let xlen = parse_xlen(&details)?;
		info!("XLEN: {}", xlen);
		self.negotiate_xlen(xlen)
	}
}
