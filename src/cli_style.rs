//! Shared look of the command line tools.

use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;

fn colored(color: AnsiColor) -> Style {
    Style::new().fg_color(Some(Color::Ansi(color)))
}

pub fn get_styles() -> Styles {
    Styles::styled()
        .usage(colored(AnsiColor::Magenta).bold().underline())
        .header(colored(AnsiColor::Magenta).bold().underline())
        .literal(colored(AnsiColor::Yellow).bold())
        .placeholder(colored(AnsiColor::BrightBlack))
        .valid(colored(AnsiColor::Green).bold())
        .invalid(colored(AnsiColor::Red).bold())
        .error(colored(AnsiColor::Red).bold())
}
