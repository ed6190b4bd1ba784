// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

mod cli_commands;

use std::io::stdout;
use std::path::PathBuf;
use std::time::Duration;

use clap::builder::styling::Styles;
use clap::{Args, CommandFactory, Parser, ValueEnum, crate_description, crate_version};
use clap_complete::{Shell, generate};
use color_eyre::config::HookBuilder;
use color_eyre::eyre::{EyreHandler, InstallError, Result};
use log::{info, warn};
use owo_colors::OwoColorize;
use rvdbg::config::{Endpoint, SessionConfig};
use rvdbg::debug::TransferWidth;
use rvdbg::transport::{ConsoleSession, TclSession, Transport, VectorEmitter};
use rvdbg::Session;

use crate::cli_commands::ToplevelCommands;

#[derive(Parser)]
#[command(
	version,
	about = format!("{} v{}", crate_description!(), crate_version!()),
	styles(style()),
	disable_colored_help(false),
	arg_required_else_help(true)
)]
struct CliArguments
{
	#[arg(global = true, short = 't', long = "transport", value_enum, default_value_t = TransportKind::Console)]
	/// How to reach the debug module
	transport: TransportKind,
	#[arg(global = true, long = "host")]
	/// Host the debug adapter is running on
	host: Option<String>,
	#[arg(global = true, short = 'p', long = "port")]
	/// Port of the debug adapter's console or Tcl server
	port: Option<u16>,
	#[arg(global = true, short = 'o', long = "output")]
	/// File to write SVF vectors to (stdout when not given)
	output: Option<PathBuf>,
	#[arg(global = true, short = 'w', long = "width", value_parser = cli_commands::parse_width)]
	/// Register transfer width in bits (32, 64 or 128) instead of the target's XLEN
	width: Option<TransferWidth>,
	#[arg(global = true, long = "tap")]
	/// Tap to direct raw scans at when it cannot be discovered
	tap: Option<String>,
	#[arg(global = true, long = "busy-timeout", value_parser = cli_commands::parse_millis)]
	/// How long in milliseconds an abstract command may stay busy
	busy_timeout: Option<Duration>,
	#[arg(global = true, long = "progbuf-capacity")]
	/// Program buffer size in words, when it should not be discovered
	progbuf_capacity: Option<usize>,

	#[command(subcommand)]
	pub subcommand: ToplevelCommands,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum TransportKind
{
	/// OpenOCD's telnet console
	Console,
	/// OpenOCD's Tcl RPC server
	Tcl,
	/// Generate SVF vectors instead of talking to a target
	Svf,
}

#[derive(Args)]
struct CompletionArguments
{
	shell: Shell,
}

type EyreHookFunc = Box<dyn Fn(&(dyn std::error::Error + 'static)) -> Box<dyn EyreHandler> + Send + Sync + 'static>;
type PanicHookFunc = Box<dyn Fn(&std::panic::PanicHookInfo<'_>) + Send + Sync + 'static>;

struct RvdbgHook
{
	inner_hook: EyreHookFunc,
}

struct RvdbgPanic
{
	inner_hook: PanicHookFunc,
}

struct RvdbgHandler
{
	inner_handler: Box<dyn EyreHandler>,
}

impl RvdbgHook
{
	fn build_handler(&self, error: &(dyn std::error::Error + 'static)) -> RvdbgHandler
	{
		RvdbgHandler {
			inner_handler: (*self.inner_hook)(error),
		}
	}

	pub fn install(self) -> Result<(), InstallError>
	{
		color_eyre::eyre::set_hook(self.into_eyre_hook())
	}

	pub fn into_eyre_hook(self) -> EyreHookFunc
	{
		Box::new(move |err| Box::new(self.build_handler(err)))
	}
}

impl RvdbgPanic
{
	pub fn install(self)
	{
		std::panic::set_hook(self.into_panic_hook());
	}

	pub fn into_panic_hook(self) -> PanicHookFunc
	{
		Box::new(move |panic_info| {
			eprintln!("------------[ ✂ cut here ✂ ]------------");
			eprintln!("Unhandled crash in rvdbg-cli v{}", crate_version!());
			eprintln!();
			(*self.inner_hook)(panic_info);
			eprintln!();
			eprintln!("{}", "Please include all lines down to this one from the cut here".yellow());
			eprintln!("{}", "marker when reporting this issue.".yellow());
		})
	}
}

impl EyreHandler for RvdbgHandler
{
	fn debug(&self, error: &(dyn std::error::Error + 'static), fmt: &mut core::fmt::Formatter<'_>)
	-> core::fmt::Result
	{
		write!(fmt, "rvdbg-cli v{} failed", crate_version!())?;
		self.inner_handler.debug(error, fmt)
	}

	fn track_caller(&mut self, location: &'static std::panic::Location<'static>)
	{
		self.inner_handler.track_caller(location);
	}
}

fn install_error_handler() -> Result<()>
{
	// Split the default handler into a panic hook and an error hook, and wrap each in ours
	let (panic_hook, eyre_hook) = HookBuilder::default().try_into_hooks()?;

	RvdbgPanic {
		inner_hook: panic_hook.into_panic_hook(),
	}
	.install();

	RvdbgHook {
		inner_hook: eyre_hook.into_eyre_hook(),
	}
	.install()?;
	Ok(())
}

/// Clap v3 style (approximate)
/// See https://stackoverflow.com/a/75343828
fn style() -> clap::builder::Styles
{
	Styles::styled()
		.usage(
			anstyle::Style::new()
				.fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow)))
				.bold(),
		)
		.header(
			anstyle::Style::new()
				.bold()
				.fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
		)
		.literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
}

/// Run the requested command over an open session and close it again, even if the command
/// failed
fn run_and_close<T: Transport>(mut session: Session<T>, cli_args: &CliArguments) -> Result<T>
{
	let result = cli_args.subcommand.run(&mut session);
	let transport = session.close()?;
	result.map(|_| transport)
}

fn main() -> Result<()>
{
	install_error_handler()?;
	env_logger::Builder::new()
		.filter_level(log::LevelFilter::Info)
		.parse_default_env()
		.init();

	let cli_args = CliArguments::parse();

	if let ToplevelCommands::Complete(comp_args) = &cli_args.subcommand {
		let mut cmd = CliArguments::command();
		generate(comp_args.shell, &mut cmd, "rvdbg-cli", &mut stdout());
		return Ok(());
	}

	match cli_args.transport {
		TransportKind::Console => {
			let config = SessionConfig::from_params(&cli_args, Endpoint::CONSOLE_PORT);
			let mut session = Session::open(ConsoleSession::new(&config), config)?;
			session.interrogate()?;
			session.activate_dm()?;
			run_and_close(session, &cli_args)?;
		},
		TransportKind::Tcl => {
			let config = SessionConfig::from_params(&cli_args, Endpoint::TCL_PORT);
			let mut session = Session::open(TclSession::new(&config), config)?;
			session.activate_dm()?;
			run_and_close(session, &cli_args)?;
		},
		TransportKind::Svf => {
			let config = SessionConfig::from_params(&cli_args, Endpoint::CONSOLE_PORT);
			if config.width.is_none() {
				warn!("No transfer width given for SVF output, assuming {}", TransferWidth::W64);
			}
			let mut session = Session::open(VectorEmitter::new(&config), config)?;
			session.reset_tap()?;
			session.activate_dm()?;
			let emitter = run_and_close(session, &cli_args)?;
			match &cli_args.output {
				Some(path) => info!("Vectors written to {}", path.display()),
				None => print!("{}", emitter.artifact()),
			}
		},
	}
	Ok(())
}
