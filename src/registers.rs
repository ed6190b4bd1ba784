// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

//! Symbolic register names and the abstract command register numbers they map to.
//!
//! Names are case-sensitive. Canonical names are the upper-case architectural names
//! (`X8`, `F10`, `MSTATUS`, ...), ABI names (`s0`, `fp`, `fa0`, ...) and the lower-case
//! index form (`x8`, `f10`) are accepted as aliases wherever a register is named.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt::{self, Display, Formatter};
use std::sync::OnceLock;

use thiserror::Error;

use crate::error::DebugError;

/// A register resolved out of the catalog
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RegisterRef
{
	/// Canonical name of the register
	pub name: &'static str,
	/// Abstract command register number
	pub regno: u16,
	/// Bit width when the register is narrower (or wider) than XLEN
	pub width_override: Option<u32>,
}

/// Register groups that can be enumerated as a whole
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RegisterGroup
{
	Integer,
	Float,
}

impl RegisterGroup
{
	/// Canonical names of the group's members in register number order
	pub fn members(self) -> &'static [&'static str]
	{
		match self {
			RegisterGroup::Integer => &GPR_NAMES,
			RegisterGroup::Float => &FPR_NAMES,
		}
	}
}

impl Display for RegisterGroup
{
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result
	{
		match self {
			RegisterGroup::Integer => f.write_str("integer"),
			RegisterGroup::Float => f.write_str("floating point"),
		}
	}
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError
{
	#[error("Register '{0}' is defined more than once")]
	DuplicateCanonical(&'static str),
	#[error("Alias '{alias}' names a register that does not exist ('{target}')")]
	DanglingAlias
	{
		alias: &'static str,
		target: &'static str,
	},
	#[error("Alias '{alias}' of '{target}' is the canonical name of another register")]
	AliasCollision
	{
		alias: &'static str,
		target: &'static str,
	},
	#[error("Alias '{alias}' is claimed by both '{first}' and '{second}'")]
	AmbiguousAlias
	{
		alias: &'static str,
		first: &'static str,
		second: &'static str,
	},
}

/// Two-way lookup between register names, aliases and register numbers
#[derive(Debug)]
pub struct RegisterCatalog
{
	canonical: BTreeMap<&'static str, RegisterRef>,
	alias_to_canonical: BTreeMap<&'static str, &'static str>,
	canonical_to_aliases: BTreeMap<&'static str, Vec<&'static str>>,
}

impl RegisterCatalog
{
	/// Build a catalog, checking that every alias points at exactly one known register and
	/// that no alias shadows the canonical name of another register
	pub fn new(
		registers: &[(&'static str, u16)],
		aliases: &[(&'static str, &'static str)],
		widths: &[(&'static str, u32)],
	) -> Result<Self, CatalogError>
	{
		let mut canonical = BTreeMap::new();
		for &(name, regno) in registers {
			let register = RegisterRef {
				name,
				regno,
				width_override: None,
			};
			if canonical.insert(name, register).is_some() {
				return Err(CatalogError::DuplicateCanonical(name));
			}
		}
		for &(name, width) in widths {
			if let Some(register) = canonical.get_mut(name) {
				register.width_override = Some(width);
			}
		}

		let mut alias_to_canonical = BTreeMap::new();
		let mut canonical_to_aliases: BTreeMap<_, Vec<_>> = BTreeMap::new();
		for &(target, alias) in aliases {
			if !canonical.contains_key(target) {
				return Err(CatalogError::DanglingAlias {
					alias,
					target,
				});
			}
			if canonical.contains_key(alias) && alias != target {
				return Err(CatalogError::AliasCollision {
					alias,
					target,
				});
			}
			match alias_to_canonical.entry(alias) {
				Entry::Occupied(entry) => {
					return Err(CatalogError::AmbiguousAlias {
						alias,
						first: *entry.get(),
						second: target,
					});
				},
				Entry::Vacant(entry) => {
					entry.insert(target);
				},
			}
			canonical_to_aliases.entry(target).or_default().push(alias);
		}

		Ok(Self {
			canonical,
			alias_to_canonical,
			canonical_to_aliases,
		})
	}

	/// The catalog of architectural and probe registers this tool knows about
	pub fn standard() -> &'static Self
	{
		static CATALOG: OnceLock<RegisterCatalog> = OnceLock::new();
		CATALOG.get_or_init(|| {
			let mut registers = CSR_REGISTERS.to_vec();
			registers.extend(PROBE_REGISTERS.iter().copied());
			registers.extend(GPR_NAMES.iter().zip(0x1000..).map(|(&name, regno)| (name, regno)));
			registers.extend(FPR_NAMES.iter().zip(0x1020..).map(|(&name, regno)| (name, regno)));

			let mut aliases = ABI_ALIASES.to_vec();
			aliases.extend(GPR_NAMES.iter().zip(GPR_INDEX_NAMES.iter()).map(|(&name, &alias)| (name, alias)));
			aliases.extend(FPR_NAMES.iter().zip(FPR_INDEX_NAMES.iter()).map(|(&name, &alias)| (name, alias)));

			Self::new(&registers, &aliases, &NONSTANDARD_WIDTHS).expect("built-in register tables are inconsistent")
		})
	}

	/// Look a register up by its canonical name first, then as an alias
	pub fn resolve(&self, name: &str) -> Result<RegisterRef, DebugError>
	{
		if let Some(register) = self.canonical.get(name) {
			return Ok(*register);
		}
		self.alias_to_canonical
			.get(name)
			.and_then(|canonical| self.canonical.get(canonical))
			.copied()
			.ok_or_else(|| DebugError::Resolution(name.into()))
	}

	/// The canonical name an alias stands for
	pub fn canonical_name(&self, alias: &str) -> Option<&'static str>
	{
		self.alias_to_canonical.get(alias).copied()
	}

	/// Every alias of a canonical register, ABI names first
	pub fn aliases(&self, canonical: &str) -> &[&'static str]
	{
		self.canonical_to_aliases
			.get(canonical)
			.map(Vec::as_slice)
			.unwrap_or_default()
	}

	/// Iterate over every canonical register in name order
	pub fn iter(&self) -> impl Iterator<Item = &RegisterRef>
	{
		self.canonical.values()
	}
}

/// Shorthand for resolving against the standard catalog
pub fn resolve(name: &str) -> Result<RegisterRef, DebugError>
{
	RegisterCatalog::standard().resolve(name)
}

const GPR_NAMES: [&str; 32] = [
	"X0", "X1", "X2", "X3", "X4", "X5", "X6", "X7", "X8", "X9", "X10", "X11", "X12", "X13", "X14", "X15", "X16", "X17",
	"X18", "X19", "X20", "X21", "X22", "X23", "X24", "X25", "X26", "X27", "X28", "X29", "X30", "X31",
];

const GPR_INDEX_NAMES: [&str; 32] = [
	"x0", "x1", "x2", "x3", "x4", "x5", "x6", "x7", "x8", "x9", "x10", "x11", "x12", "x13", "x14", "x15", "x16", "x17",
	"x18", "x19", "x20", "x21", "x22", "x23", "x24", "x25", "x26", "x27", "x28", "x29", "x30", "x31",
];

const FPR_NAMES: [&str; 32] = [
	"F0", "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12", "F13", "F14", "F15", "F16", "F17",
	"F18", "F19", "F20", "F21", "F22", "F23", "F24", "F25", "F26", "F27", "F28", "F29", "F30", "F31",
];

const FPR_INDEX_NAMES: [&str; 32] = [
	"f0", "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9", "f10", "f11", "f12", "f13", "f14", "f15", "f16", "f17",
	"f18", "f19", "f20", "f21", "f22", "f23", "f24", "f25", "f26", "f27", "f28", "f29", "f30", "f31",
];

/// (canonical, alias)
const ABI_ALIASES: [(&str, &str); 65] = [
	("X0", "zero"),
	("X1", "ra"),
	("X2", "sp"),
	("X3", "gp"),
	("X4", "tp"),
	("X5", "t0"),
	("X6", "t1"),
	("X7", "t2"),
	("X8", "s0"),
	("X8", "fp"),
	("X9", "s1"),
	("X10", "a0"),
	("X11", "a1"),
	("X12", "a2"),
	("X13", "a3"),
	("X14", "a4"),
	("X15", "a5"),
	("X16", "a6"),
	("X17", "a7"),
	("X18", "s2"),
	("X19", "s3"),
	("X20", "s4"),
	("X21", "s5"),
	("X22", "s6"),
	("X23", "s7"),
	("X24", "s8"),
	("X25", "s9"),
	("X26", "s10"),
	("X27", "s11"),
	("X28", "t3"),
	("X29", "t4"),
	("X30", "t5"),
	("X31", "t6"),
	("F0", "ft0"),
	("F1", "ft1"),
	("F2", "ft2"),
	("F3", "ft3"),
	("F4", "ft4"),
	("F5", "ft5"),
	("F6", "ft6"),
	("F7", "ft7"),
	("F8", "fs0"),
	("F9", "fs1"),
	("F10", "fa0"),
	("F11", "fa1"),
	("F12", "fa2"),
	("F13", "fa3"),
	("F14", "fa4"),
	("F15", "fa5"),
	("F16", "fa6"),
	("F17", "fa7"),
	("F18", "fs2"),
	("F19", "fs3"),
	("F20", "fs4"),
	("F21", "fs5"),
	("F22", "fs6"),
	("F23", "fs7"),
	("F24", "fs8"),
	("F25", "fs9"),
	("F26", "fs10"),
	("F27", "fs11"),
	("F28", "ft8"),
	("F29", "ft9"),
	("F30", "ft10"),
	("F31", "ft11"),
];

/// Internal signals exposed through the debug module for inspecting the memory stage
const PROBE_REGISTERS: [(&str, u16); 8] = [
	("TRAPM", 0xc000),
	("PCM", 0xc001),
	("INSTRM", 0xc002),
	("MEMRWM", 0xc003),
	("INSTRVALIDM", 0xc004),
	("WRITEDATAM", 0xc005),
	("IEUADRM", 0xc006),
	("READDATAM", 0xc007),
];

const NONSTANDARD_WIDTHS: [(&str, u32); 5] = [
	("TRAPM", 1),
	("INSTRM", 32),
	("MEMRWM", 2),
	("INSTRVALIDM", 1),
	("READDATAM", 64),
];

const CSR_REGISTERS: [(&str, u16); 130] = [
	("FFLAGS", 0x0001),
	("FRM", 0x0002),
	("FCSR", 0x0003),
	("SSTATUS", 0x0100),
	("SIE", 0x0104),
	("STVEC", 0x0105),
	("SCOUNTEREN", 0x0106),
	("SENVCFG", 0x010a),
	("SSCRATCH", 0x0140),
	("SEPC", 0x0141),
	("SCAUSE", 0x0142),
	("STVAL", 0x0143),
	("SIP", 0x0144),
	("STIMECMP", 0x014d),
	("STIMECMPH", 0x015d),
	("SATP", 0x0180),
	("MSTATUS", 0x0300),
	("MISA", 0x0301),
	("MEDELEG", 0x0302),
	("MIDELEG", 0x0303),
	("MIE", 0x0304),
	("MTVEC", 0x0305),
	("MCOUNTEREN", 0x0306),
	("MENVCFG", 0x030a),
	("MSTATUSH", 0x0310),
	("MENVCFGH", 0x031a),
	("MCOUNTINHIBIT", 0x0320),
	("MHPMEVENTBASE", 0x0320),
	("MSCRATCH", 0x0340),
	("MEPC", 0x0341),
	("MCAUSE", 0x0342),
	("MTVAL", 0x0343),
	("MIP", 0x0344),
	("PMPCFG0", 0x03a0),
	("PMPCFG1", 0x03a1),
	("PMPCFG2", 0x03a2),
	("PMPCFG3", 0x03a3),
	("PMPCFG4", 0x03a4),
	("PMPCFG5", 0x03a5),
	("PMPCFG6", 0x03a6),
	("PMPCFG7", 0x03a7),
	("PMPCFG8", 0x03a8),
	("PMPCFG9", 0x03a9),
	("PMPCFGA", 0x03aa),
	("PMPCFGB", 0x03ab),
	("PMPCFGC", 0x03ac),
	("PMPCFGD", 0x03ad),
	("PMPCFGE", 0x03ae),
	("PMPCFGF", 0x03af),
	("PMPADDR0", 0x03b0),
	("PMPADDR1", 0x03b1),
	("PMPADDR2", 0x03b2),
	("PMPADDR3", 0x03b3),
	("PMPADDR4", 0x03b4),
	("PMPADDR5", 0x03b5),
	("PMPADDR6", 0x03b6),
	("PMPADDR7", 0x03b7),
	("PMPADDR8", 0x03b8),
	("PMPADDR9", 0x03b9),
	("PMPADDRA", 0x03ba),
	("PMPADDRB", 0x03bb),
	("PMPADDRC", 0x03bc),
	("PMPADDRD", 0x03bd),
	("PMPADDRE", 0x03be),
	("PMPADDRF", 0x03bf),
	("PMPADDR10", 0x03c0),
	("PMPADDR11", 0x03c1),
	("PMPADDR12", 0x03c2),
	("PMPADDR13", 0x03c3),
	("PMPADDR14", 0x03c4),
	("PMPADDR15", 0x03c5),
	("PMPADDR16", 0x03c6),
	("PMPADDR17", 0x03c7),
	("PMPADDR18", 0x03c8),
	("PMPADDR19", 0x03c9),
	("PMPADDR1A", 0x03ca),
	("PMPADDR1B", 0x03cb),
	("PMPADDR1C", 0x03cc),
	("PMPADDR1D", 0x03cd),
	("PMPADDR1E", 0x03ce),
	("PMPADDR1F", 0x03cf),
	("PMPADDR20", 0x03d0),
	("PMPADDR21", 0x03d1),
	("PMPADDR22", 0x03d2),
	("PMPADDR23", 0x03d3),
	("PMPADDR24", 0x03d4),
	("PMPADDR25", 0x03d5),
	("PMPADDR26", 0x03d6),
	("PMPADDR27", 0x03d7),
	("PMPADDR28", 0x03d8),
	("PMPADDR29", 0x03d9),
	("PMPADDR2A", 0x03da),
	("PMPADDR2B", 0x03db),
	("PMPADDR2C", 0x03dc),
	("PMPADDR2D", 0x03dd),
	("PMPADDR2E", 0x03de),
	("PMPADDR2F", 0x03df),
	("PMPADDR30", 0x03e0),
	("PMPADDR31", 0x03e1),
	("PMPADDR32", 0x03e2),
	("PMPADDR33", 0x03e3),
	("PMPADDR34", 0x03e4),
	("PMPADDR35", 0x03e5),
	("PMPADDR36", 0x03e6),
	("PMPADDR37", 0x03e7),
	("PMPADDR38", 0x03e8),
	("PMPADDR39", 0x03e9),
	("PMPADDR3A", 0x03ea),
	("PMPADDR3B", 0x03eb),
	("PMPADDR3C", 0x03ec),
	("PMPADDR3D", 0x03ed),
	("PMPADDR3E", 0x03ee),
	("PMPADDR3F", 0x03ef),
	("TSELECT", 0x07a0),
	("TDATA1", 0x07a1),
	("TDATA2", 0x07a2),
	("TDATA3", 0x07a3),
	("DCSR", 0x07b0),
	("DPC", 0x07b1),
	("MHPMCOUNTERBASE", 0x0b00),
	("MHPMCOUNTERHBASE", 0x0b80),
	("HPMCOUNTERBASE", 0x0c00),
	("TIME", 0x0c01),
	("HPMCOUNTERHBASE", 0x0c80),
	("TIMEH", 0x0c81),
	("MVENDORID", 0x0f11),
	("MARCHID", 0x0f12),
	("MIMPID", 0x0f13),
	("MHARTID", 0x0f14),
	("MCONFIGPTR", 0x0f15),
];
