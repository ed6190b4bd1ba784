// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read, Write};
use std::rc::Rc;
use std::time::Duration;

use rvdbg::DebugError;
use rvdbg::config::SessionConfig;
use rvdbg::debug::{ABSTRACTCS, COMMAND, DATA0, DMCONTROL, DMSTATUS, DmAddress, PROGBUF0, TransferWidth};
use rvdbg::transport::Transport;

/// A single-hart debug module that answers DMI accesses the way real hardware would, and
/// records everything that was done to it
pub struct SimulatedDebugModule
{
    pub connected: bool,
    pub dmactive: bool,
    pub halted: bool,
    pub resume_ack: bool,
    pub have_reset: bool,
    pub halt_on_reset: bool,
    /// The hart ignores halt requests
    pub ignore_halt: bool,

    pub cmderr: u32,
    /// How many `abstractcs` reads report busy after each command
    pub busy_reads: u32,
    busy_remaining: u32,
    /// Every command stays busy forever
    pub stuck_busy: bool,

    pub data: [u32; 4],
    pub progbuf: [u32; 16],
    pub progbufsize: u32,
    pub registers: HashMap<u16, u128>,
    /// Register numbers that raise an exception when accessed
    pub unimplemented: HashSet<u16>,

    pub dmistat: u32,
    pub idcode: u32,

    pub writes: Vec<(DmAddress, u32)>,
    pub reads: Vec<DmAddress>,
    pub register_writes: Vec<(u16, u128)>,
    pub programs_run: usize,
    pub dtmcs_writes: Vec<u32>,
    pub tap_resets: usize,
}

impl SimulatedDebugModule
{
    pub fn new() -> Self
    {
        Self {
            connected: false,
            dmactive: false,
            halted: false,
            resume_ack: false,
            have_reset: false,
            halt_on_reset: false,
            ignore_halt: false,
            cmderr: 0,
            busy_reads: 0,
            busy_remaining: 0,
            stuck_busy: false,
            data: [0; 4],
            progbuf: [0; 16],
            progbufsize: 16,
            registers: HashMap::new(),
            unimplemented: HashSet::new(),
            dmistat: 0,
            idcode: 0x1002_ac05,
            writes: Vec::new(),
            reads: Vec::new(),
            register_writes: Vec::new(),
            programs_run: 0,
            dtmcs_writes: Vec::new(),
            tap_resets: 0,
        }
    }

    /// Writes made to one DMI register, in order
    pub fn writes_to(&self, address: DmAddress) -> Vec<u32>
    {
        self.writes
            .iter()
            .filter(|(target, _)| *target == address)
            .map(|(_, data)| *data)
            .collect()
    }

    pub fn reads_of(&self, address: DmAddress) -> usize
    {
        self.reads.iter().filter(|&&target| target == address).count()
    }

    fn execute(&mut self, command: u32)
    {
        if self.busy_remaining > 0 || self.stuck_busy {
            // A command issued while busy is dropped and latches cmderr
            self.cmderr = 1;
            return;
        }
        if self.cmderr != 0 {
            return;
        }
        self.busy_remaining = self.busy_reads;

        if command & (1 << 17) != 0 {
            let regno = (command & 0xffff) as u16;
            let bits = 8u32 << ((command >> 20) & 0x7);
            let slots = (bits / 32) as usize;
            if self.unimplemented.contains(&regno) {
                self.cmderr = 3;
                return;
            }
            if command & (1 << 16) != 0 {
                let mut value = 0u128;
                for slot in 0..slots {
                    value |= (self.data[slot] as u128) << (32 * slot);
                }
                self.registers.insert(regno, value);
                self.register_writes.push((regno, value));
            } else {
                let value = self.registers.get(&regno).copied().unwrap_or(0);
                for slot in 0..slots {
                    self.data[slot] = (value >> (32 * slot)) as u32;
                }
            }
        }
        if command & (1 << 18) != 0 {
            self.programs_run += 1;
        }
    }

    fn dmstatus(&self) -> u32
    {
        let mut status = 0x82; // authenticated, version 0.13
        status |= if self.halted { 0x300 } else { 0xc00 };
        if self.resume_ack {
            status |= 0x3_0000;
        }
        if self.have_reset {
            status |= 0xc_0000;
        }
        status
    }
}

impl Transport for SimulatedDebugModule
{
    fn is_live(&self) -> bool
    {
        true
    }

    fn connect(&mut self) -> Result<(), DebugError>
    {
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), DebugError>
    {
        self.connected = false;
        Ok(())
    }

    fn write_raw(&mut self, address: DmAddress, data: u32) -> Result<(), DebugError>
    {
        if !self.connected {
            return Err(DebugError::NotConnected);
        }
        self.writes.push((address, data));
        match address {
            DMCONTROL => {
                self.dmactive = data & 0x1 != 0;
                if data & (1 << 3) != 0 {
                    self.halt_on_reset = true;
                }
                if data & (1 << 2) != 0 {
                    self.halt_on_reset = false;
                }
                if data & (1 << 1) != 0 {
                    self.have_reset = true;
                    self.halted = self.halt_on_reset;
                    self.resume_ack = false;
                }
                if data & (1 << 28) != 0 {
                    self.have_reset = false;
                }
                if data & (1 << 31) != 0 && !self.ignore_halt {
                    self.halted = true;
                    self.resume_ack = false;
                }
                if data & (1 << 30) != 0 {
                    self.halted = false;
                    self.resume_ack = true;
                }
            },
            ABSTRACTCS => self.cmderr &= !((data >> 8) & 0x7),
            COMMAND => self.execute(data),
            address if (DATA0..DATA0 + 4).contains(&address) => self.data[(address - DATA0) as usize] = data,
            address if (PROGBUF0..PROGBUF0 + 16).contains(&address) => {
                self.progbuf[(address - PROGBUF0) as usize] = data
            },
            _ => (),
        }
        Ok(())
    }

    fn read_raw(&mut self, address: DmAddress) -> Result<u32, DebugError>
    {
        if !self.connected {
            return Err(DebugError::NotConnected);
        }
        self.reads.push(address);
        let value = match address {
            DMCONTROL => self.dmactive as u32,
            DMSTATUS => self.dmstatus(),
            ABSTRACTCS => {
                let mut abstractcs = (self.progbufsize << 24) | (self.cmderr << 8) | 0x4;
                if self.stuck_busy {
                    abstractcs |= 1 << 12;
                } else if self.busy_remaining > 0 {
                    self.busy_remaining -= 1;
                    abstractcs |= 1 << 12;
                }
                abstractcs
            },
            address if (DATA0..DATA0 + 4).contains(&address) => self.data[(address - DATA0) as usize],
            address if (PROGBUF0..PROGBUF0 + 16).contains(&address) => self.progbuf[(address - PROGBUF0) as usize],
            _ => 0,
        };
        Ok(value)
    }

    fn write_dtmcs(&mut self, value: u32) -> Result<(), DebugError>
    {
        self.dtmcs_writes.push(value);
        if value & (0x3 << 16) != 0 {
            self.dmistat = 0;
        }
        Ok(())
    }

    fn read_dtmcs(&mut self) -> Result<u32, DebugError>
    {
        // abits = 7, version 0.13
        Ok((self.dmistat << 10) | (7 << 4) | 0x1)
    }

    fn read_idcode(&mut self) -> Result<u32, DebugError>
    {
        Ok(self.idcode)
    }

    fn reset_tap(&mut self) -> Result<(), DebugError>
    {
        self.tap_resets += 1;
        Ok(())
    }
}

/// Session settings that keep polling tests fast
pub fn test_config() -> SessionConfig
{
    SessionConfig {
        width: Some(TransferWidth::W64),
        poll_interval: Duration::from_millis(1),
        busy_timeout: Duration::from_millis(50),
        ..SessionConfig::default()
    }
}

/// An in-memory stream that plays back a scripted adapter and keeps what was sent to it
pub struct ScriptedStream
{
    replies: Cursor<Vec<u8>>,
    sent: Rc<RefCell<Vec<u8>>>,
}

impl ScriptedStream
{
    pub fn new(replies: &[u8]) -> (Self, Rc<RefCell<Vec<u8>>>)
    {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let stream = Self {
            replies: Cursor::new(replies.to_vec()),
            sent: sent.clone(),
        };
        (stream, sent)
    }
}

impl Read for ScriptedStream
{
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize>
    {
        self.replies.read(buf)
    }
}

impl Write for ScriptedStream
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize>
    {
        self.sent.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()>
    {
        Ok(())
    }
}
