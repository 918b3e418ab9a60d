//! Output formatting for suggestion results

use crate::query::suggestions_json;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print one suggestion per line with the completed prefix highlighted
pub fn print_suggestions(prefix: &str, suggestions: &[String], color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);
    write_suggestions(&mut stdout, prefix, suggestions)
}

/// Print suggestions as a JSON array (for editor integrations)
pub fn print_suggestions_json(suggestions: &[String]) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", suggestions_json(suggestions))
}

pub fn write_suggestions<W: WriteColor>(
    out: &mut W,
    prefix: &str,
    suggestions: &[String],
) -> io::Result<()> {
    // Suggestions are folded, so the typed prefix covers the same chars
    let prefix_chars = prefix.chars().count();

    for word in suggestions {
        let split = word
            .char_indices()
            .nth(prefix_chars)
            .map(|(i, _)| i)
            .unwrap_or(word.len());

        if split > 0 {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
            write!(out, "{}", &word[..split])?;
            out.reset()?;
        }
        writeln!(out, "{}", &word[split..])?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::Buffer;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_plain_output() {
        let mut buf = Buffer::no_color();
        write_suggestions(&mut buf, "SE", &words(&["search", "series"])).unwrap();
        assert_eq!(String::from_utf8(buf.into_inner()).unwrap(), "search\nseries\n");
    }

    #[test]
    fn test_prefix_highlighted() {
        let mut buf = Buffer::ansi();
        write_suggestions(&mut buf, "caf", &words(&["café"])).unwrap();
        let text = String::from_utf8(buf.into_inner()).unwrap();
        assert!(text.contains("caf"));
        assert!(text.contains('\x1b'));
        assert!(text.ends_with("é\n"));
    }

    #[test]
    fn test_empty_prefix() {
        let mut buf = Buffer::no_color();
        write_suggestions(&mut buf, "", &words(&["apple"])).unwrap();
        assert_eq!(String::from_utf8(buf.into_inner()).unwrap(), "apple\n");
    }
}
