//! Terminal commands standing in for systray clicks.

use progress_core::Msg;

pub(crate) const HELP: &str = "commands: open | close | cancel <code> | show <code> | quit";

/// Maps one input line to a core message. `None` for unknown input.
pub(crate) fn parse_command(line: &str) -> Option<Msg> {
    let mut words = line.split_whitespace();
    let verb = words.next()?.to_ascii_lowercase();
    let arg = words.next().map(str::to_string);
    if words.next().is_some() {
        return None;
    }

    match (verb.as_str(), arg) {
        ("open", None) => Some(Msg::MenuToggled { open: true }),
        ("close", None) => Some(Msg::MenuToggled { open: false }),
        ("cancel", Some(code)) => Some(Msg::CancelClicked { code }),
        ("show", Some(code)) => Some(Msg::JobSelected { code }),
        ("quit" | "exit", None) => Some(Msg::Teardown),
        _ => None,
    }
}
