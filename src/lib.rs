// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

//! Drive a RISC-V hart through its External Debug Support interface: DMI access, abstract
//! register commands, run control and the program buffer, over OpenOCD's console, OpenOCD's
//! Tcl server, or into an SVF vector file.

pub mod config;
pub mod debug;
pub mod error;
pub mod registers;
pub mod session;
pub mod transport;

pub use config::SessionConfig;
pub use error::DebugError;
pub use session::Session;
