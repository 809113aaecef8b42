//! Terminal rendering of parse errors

use super::{Anchor, ParseError, SourceContext};
use colored::Colorize;
use std::fmt::{self, Write};

pub(super) fn render(error: &ParseError) -> String {
    Report(error).to_string()
}

struct Report<'a>(&'a ParseError);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let error = self.0;
        writeln!(f, "{}: {}", "error".red().bold(), error.message().bold())?;

        let mut gutter = gutter_for(error.location());
        match error.anchor() {
            Anchor::None => {}
            Anchor::Token(ctx) | Anchor::Rule(ctx) | Anchor::Argument(ctx) => {
                snippet(f, ctx, &gutter)?;
            }
            Anchor::Duplicate { first, second, .. } => {
                gutter = gutter.max_with(first);
                snippet(f, second, &gutter)?;
                writeln!(f, "{}: first occurrence", "note".cyan().bold())?;
                snippet(f, first, &gutter)?;
            }
            Anchor::Missing { object: None } => {}
            Anchor::Missing {
                object: Some(bounds),
            } => match &bounds.close {
                Some(close) => {
                    gutter = gutter.max_with(close);
                    writeln!(f, "{}: in the block opened here", "note".cyan().bold())?;
                    snippet(f, &bounds.open, &gutter)?;
                    writeln!(f, "{}: and closed here", "note".cyan().bold())?;
                    snippet(f, close, &gutter)?;
                }
                None => {
                    writeln!(f, "{}{} {}", gutter.pad, "-->".blue().bold(), bounds.open.file)?;
                }
            },
        }

        if let Some(hint) = error.hint() {
            writeln!(f, "{} {} {}", gutter.pad, "=".blue().bold(), format!("hint: {hint}").yellow())?;
        }

        traceback(f, "include traceback (inclusion chain):", error.traceback())?;
        if let Anchor::Duplicate { first_traceback, .. } = error.anchor() {
            traceback(f, "include traceback of the first occurrence:", first_traceback)?;
        }
        Ok(())
    }
}

/// Left margin wide enough for the line numbers of every snippet
struct Gutter {
    pad: String,
}

impl Gutter {
    fn new(digits: usize) -> Self {
        Self {
            pad: " ".repeat(digits + 1),
        }
    }

    fn max_with(self, ctx: &SourceContext) -> Self {
        let digits = digits(ctx.line_number);
        if digits + 1 > self.pad.len() {
            Gutter::new(digits)
        } else {
            self
        }
    }
}

fn digits(n: usize) -> usize {
    n.to_string().len()
}

fn gutter_for(ctx: Option<&SourceContext>) -> Gutter {
    Gutter::new(ctx.map(|ctx| digits(ctx.line_number)).unwrap_or(1))
}

fn snippet(f: &mut impl Write, ctx: &SourceContext, gutter: &Gutter) -> fmt::Result {
    let pad = &gutter.pad;
    let bar = "|".blue().bold();
    let number = format!("{:>width$}", ctx.line_number, width = pad.len() - 1);

    writeln!(f, "{pad}{} {ctx}", "-->".blue().bold())?;
    writeln!(f, "{pad} {bar}")?;
    writeln!(f, " {} {bar} {}", number.blue().bold(), ctx.line)?;

    // Keep tabs so the carets line up under the source text
    let indent: String = ctx
        .line
        .chars()
        .take(ctx.column - 1)
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();
    let remaining = ctx.line.chars().count().saturating_sub(ctx.column - 1);
    let carets = "^".repeat(ctx.width.min(remaining).max(1));
    writeln!(f, "{pad} {bar} {indent}{}", carets.cyan().bold())
}

fn traceback(f: &mut impl Write, title: &str, frames: &[SourceContext]) -> fmt::Result {
    if frames.is_empty() {
        return Ok(());
    }
    writeln!(f, "{}", title.bold())?;

    let places: Vec<String> = frames
        .iter()
        .map(|ctx| format!("{}:{}", ctx.file, ctx.line_number))
        .collect();
    let width = places.iter().map(|p| p.chars().count()).max().unwrap_or(0);

    for (place, ctx) in places.iter().zip(frames) {
        writeln!(f, "  → {:<width$}   {}", place, ctx.line.trim(), width = width)?;
    }
    Ok(())
}
