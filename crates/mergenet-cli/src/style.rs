// SPDX-License-Identifier: GPL-3.0

use clap::builder::{
	Styles,
	styling::{AnsiColor, Color, Style as HelpStyle},
};
pub(crate) use console::style;
use console::{Emoji, Style, StyledObject};

const BAR: Emoji<'static, 'static> = Emoji("│", "|");

/// Colours of the `--help` output.
pub(crate) fn help_styles() -> Styles {
	let blue = HelpStyle::new().bold().fg_color(Some(Color::Ansi(AnsiColor::BrightBlue)));
	Styles::styled()
		.usage(blue)
		.header(blue)
		.literal(HelpStyle::new().fg_color(Some(Color::Ansi(AnsiColor::BrightCyan))))
		.error(HelpStyle::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Red))))
}

/// The vertical bar prefixing lines printed below a cliclack prompt.
pub(crate) fn bar() -> StyledObject<Emoji<'static, 'static>> {
	Style::new().blue().dim().apply_to(BAR)
}

/// Formats an URL with bold and underlined style.
pub(crate) fn format_url(url: &str) -> String {
	format!("{}", style(url).bold().underlined())
}
