//! The `anvil` binary.
//!
//! Parses component tokens, opens the runbase of the base directory, activates
//! the components the tokens involve and invokes the requested operations.

mod cli;
mod components;
mod doc;
mod scanner;

use std::process::ExitCode;
use std::sync::Arc;

use anvil_invocation::CmdLineParser;
use anvil_registry::Catalog;
use anvil_runbase::{PropertySources, Runbase, RunbaseError, Session};
use anyhow::Context;
use clap::Parser;
use cli::{Cli, LOG_ENV};
use scanner::MarkerScanner;

fn main() -> ExitCode {
	let cli = Cli::parse();
	setup_tracing(cli.log_filter());

	match run(&cli) {
		Ok(()) => ExitCode::SUCCESS,
		Err(error) => {
			eprintln!("error: {error:#}");
			if let Some(hint) = hint(&error) {
				eprintln!("hint: {hint}");
			}
			ExitCode::FAILURE
		}
	}
}

fn setup_tracing(default_filter: &str) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}

fn hint(error: &anyhow::Error) -> Option<&'static str> {
	let error = error.downcast_ref::<RunbaseError>()?;
	error.is_lifecycle().then_some("rerun with --force to continue past components that fail to initialize")
}

fn run(cli: &Cli) -> anyhow::Result<()> {
	let catalog = Catalog::from_inventory()?;
	let scanner = MarkerScanner::new(&catalog);
	let mut sources = PropertySources::from_process();
	sources.overrides.extend(cli.defines.iter().cloned());

	let session = Arc::new(
		Session::new(catalog)
			.with_scanner(scanner)
			.with_settings(cli.settings())
			.with_sources(sources)
			.with_default_component(cli.component.clone()),
	);
	let base_dir = match &cli.base_dir {
		Some(dir) => dir.clone(),
		None => std::env::current_dir().context("cannot read the working directory")?,
	};
	let runbase = session.open(&base_dir)?;
	tracing::debug!(base = %runbase.base_dir().display(), "opened base directory");

	if cli.components {
		print!("{}", doc::discovered(&runbase).render());
		return Ok(());
	}
	if let Some(name) = &cli.doc {
		let key = session.catalog().find(name)?;
		print!("{}", doc::describe(&runbase.describe_with_defaults(key)?));
		return Ok(());
	}

	let log = CmdLineParser::new(session.catalog(), session.descriptions())
		.with_default(runbase.discovery().default_component())
		.parse(&cli.tokens)?;
	runbase.init(&log)?;
	register_clean_actions(&runbase);
	runbase.run(&log)?;
	Ok(())
}

/// Removes the output directory of the runbase.
fn register_clean_actions(runbase: &Runbase) {
	let output = components::output_dir(runbase.base_dir());
	runbase.register_clean_action("output", move || {
		if output.exists() {
			std::fs::remove_dir_all(&output).with_context(|| format!("cannot remove {}", output.display()))?;
		}
		Ok(())
	});
}
