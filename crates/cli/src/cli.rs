use std::path::PathBuf;

use anvil_runbase::Settings;
use clap::Parser;

/// Environment variable overriding the log filter.
pub const LOG_ENV: &str = "ANVIL_LOG";

#[derive(Parser, Debug)]
#[command(name = "anvil")]
#[command(about = "Configures and runs build components")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Component tokens: `name:` selects a component, `attr=value` configures it, a bare word invokes an operation
	pub tokens: Vec<String>,

	/// Base directory (defaults to the working directory)
	#[arg(long, short = 'C', value_name = "DIR")]
	pub base_dir: Option<PathBuf>,

	/// Default component, taking precedence over `anvil.default.component`
	#[arg(long, short = 'c', value_name = "NAME")]
	pub component: Option<String>,

	/// Property override, applied above every other property source
	#[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_define)]
	pub defines: Vec<(String, String)>,

	/// Continue when a component fails to initialize
	#[arg(long, short)]
	pub force: bool,

	/// Log activation order, initializer contributions and effective configuration
	#[arg(long)]
	pub inspect: bool,

	/// Run clean actions before the first operation
	#[arg(long)]
	pub clean: bool,

	/// Show null assignments and informational logs
	#[arg(long, short)]
	pub verbose: bool,

	/// Debug logging
	#[arg(long)]
	pub debug: bool,

	/// Print the documentation of a component and exit
	#[arg(long, value_name = "COMPONENT")]
	pub doc: Option<String>,

	/// List the components discovered for the base directory and exit
	#[arg(long)]
	pub components: bool,
}

impl Cli {
	pub fn settings(&self) -> Settings {
		Settings {
			force_mode: self.force,
			inspect: self.inspect,
			verbose: self.verbose,
			clean: self.clean,
		}
	}

	/// Log filter used when [`LOG_ENV`] is unset.
	pub fn log_filter(&self) -> &'static str {
		if self.debug {
			"debug"
		} else if self.verbose || self.inspect {
			"info"
		} else {
			"warn"
		}
	}
}

fn parse_define(raw: &str) -> Result<(String, String), String> {
	match raw.split_once('=') {
		Some((key, _)) if key.trim().is_empty() => Err(format!("missing property name in '{raw}'")),
		Some((key, value)) => Ok((key.trim().to_string(), value.to_string())),
		None => Err(format!("expected KEY=VALUE, got '{raw}'")),
	}
}
