//! Draws the launcher's dialog on a terminal and maps typed answers onto its
//! controls.

use std::io::{self, Write};

use launcher_core::{ButtonRole, DialogElement};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const KEY_PROCEED: &str = "y";
const KEY_LINK: &str = "l";

pub fn render(element: &DialogElement, out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "== {} ==", element.title())?;
    if !element.description().is_empty() {
        writeln!(out, "{}", element.description())?;
    }
    if let Some(link) = element.link() {
        writeln!(out, "  [{KEY_LINK}] {}", link.label())?;
    }
    for button in element.buttons() {
        let key = match button.role() {
            ButtonRole::Proceed => KEY_PROCEED,
            ButtonRole::Link => KEY_LINK,
            ButtonRole::Decline => "n",
        };
        writeln!(out, "  [{key}] {}", button.label())?;
    }
    write!(out, "> ")?;
    out.flush()
}

/// Anything unrecognized declines.
pub fn parse_choice(input: &str) -> ButtonRole {
    match input.trim().to_ascii_lowercase().as_str() {
        KEY_PROCEED | "yes" => ButtonRole::Proceed,
        KEY_LINK | "link" => ButtonRole::Link,
        _ => ButtonRole::Decline,
    }
}

/// Renders the dialog and reads one answer. `None` means input closed.
pub async fn prompt<R>(
    element: &DialogElement,
    out: &mut impl Write,
    input: &mut R,
) -> io::Result<Option<ButtonRole>>
where
    R: AsyncBufRead + Unpin,
{
    render(element, out)?;
    let mut line = String::new();
    if input.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    Ok(Some(parse_choice(&line)))
}

/// Presses the chosen control, or dismisses the dialog when there is no
/// answer or the dialog lacks that control.
pub fn apply(element: &DialogElement, choice: Option<ButtonRole>) {
    let pressed = choice.is_some_and(|role| element.press(role));
    if !pressed {
        element.dismiss();
    }
}

#[cfg(test)]
#[path = "tests/terminal_tests.rs"]
mod tests;
