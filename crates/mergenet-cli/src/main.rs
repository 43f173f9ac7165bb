// SPDX-License-Identifier: GPL-3.0

mod commands;
mod config;
mod style;

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;

#[derive(Parser)]
#[command(author, version, about, styles=style::help_styles())]
pub struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
#[command(subcommand_required = true)]
enum Commands {
	/// Launch a merge network.
	#[clap(alias = "u")]
	Up(commands::up::UpCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
	env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
	let cli = Cli::parse();
	match cli.command {
		Commands::Up(cmd) => cmd.execute().await,
	}
}

#[test]
fn verify_cli() {
	// https://docs.rs/clap/latest/clap/_derive/_tutorial/chapter_4/index.html
	use clap::CommandFactory;
	Cli::command().debug_assert()
}
