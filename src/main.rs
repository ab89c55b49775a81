//! `glint` command line interface.
//!
//! Highlights a file to ANSI-styled terminal output, one line per parse
//! call with a flush between lines, so multi-line constructs (comments,
//! unterminated quotes) carry over exactly as they would under any other
//! chunking.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use tracing_subscriber::EnvFilter;

use glint::config::{validation_schema, GlintConfig, HighlightMode};
use glint::highlight::{CssLexer, LinkRules, SimpleLexer, Token, TokenKind};
use glint::schema::SchemaValidator;

#[derive(Parser, Debug)]
#[command(name = "glint", version, about = "Stream-highlight CSS-like text to the terminal")]
struct Args {
    /// File to highlight.
    file: PathBuf,

    /// Use the quote-delimiting lexer instead of the CSS one.
    #[arg(long)]
    simple: bool,

    /// Turn comment substrings into links: "pattern -> template", with
    /// %s in the template replaced by the matched text.
    #[arg(long = "match-links", value_name = "RULE")]
    match_links: Option<String>,

    /// JSON config file, schema-validated before use.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let mode = if args.simple {
        HighlightMode::Simple
    } else {
        config.mode
    };

    let link_rules = args
        .match_links
        .as_deref()
        .or(config.highlight.match_links.first().map(String::as_str))
        .and_then(LinkRules::from_declaration);
    if config.highlight.match_links.len() > 1 && args.match_links.is_none() {
        tracing::warn!("only the first configured link rule is applied");
    }

    let content = fs::read_to_string(&args.file)
        .with_context(|| format!("cannot read {}", args.file.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        HighlightMode::Css => {
            let mut lexer = CssLexer::new();
            if let Some(rules) = link_rules {
                lexer.set_link_rules(Some(rules));
            }
            for line in content.lines() {
                let mut tokens = Vec::new();
                lexer.parse(line, &mut tokens);
                lexer.flush(&mut tokens)?;
                render_line(&mut out, &tokens)?;
            }
        }
        HighlightMode::Simple => {
            let mut lexer = SimpleLexer::new();
            for line in content.lines() {
                let mut tokens = Vec::new();
                lexer.parse(line, &mut tokens);
                lexer.flush(&mut tokens)?;
                render_line(&mut out, &tokens)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<GlintConfig> {
    let Some(path) = path else {
        return Ok(GlintConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("cannot read config {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).context("config is not valid JSON")?;
    if let Err(err) = SchemaValidator::new(validation_schema())?.validate(&value) {
        bail!("config {}: {err}", path.display());
    }
    serde_json::from_value(value).context("config did not deserialize")
}

fn render_line(out: &mut impl Write, tokens: &[Token]) -> Result<()> {
    for token in tokens {
        let color = color_for(token.kind);
        if token.links.is_empty() {
            write_span(out, color, &token.text, false)?;
        } else {
            for segment in &token.links {
                write_span(out, color, &segment.text, segment.href.is_some())?;
            }
        }
    }
    queue!(out, Print("\n"))?;
    Ok(())
}

fn write_span(out: &mut impl Write, color: Option<Color>, text: &str, linked: bool) -> Result<()> {
    if let Some(color) = color {
        queue!(out, SetForegroundColor(color))?;
    }
    if linked {
        queue!(out, SetAttribute(Attribute::Underlined))?;
    }
    queue!(out, Print(text))?;
    if linked {
        queue!(out, SetAttribute(Attribute::NoUnderline))?;
    }
    if color.is_some() {
        queue!(out, ResetColor)?;
    }
    Ok(())
}

fn color_for(kind: TokenKind) -> Option<Color> {
    match kind {
        TokenKind::Text => None,
        TokenKind::Quoted => Some(Color::Green),
        TokenKind::Selector => Some(Color::Yellow),
        TokenKind::SelectorClass => Some(Color::Cyan),
        TokenKind::SelectorId => Some(Color::Red),
        TokenKind::SelectorPseudo => Some(Color::Magenta),
        TokenKind::SelectorAttribute => Some(Color::Blue),
        TokenKind::Comment => Some(Color::DarkGrey),
        TokenKind::Property => Some(Color::Cyan),
        TokenKind::Value => Some(Color::Green),
        TokenKind::Important => Some(Color::Red),
        TokenKind::AtRule => Some(Color::Magenta),
        TokenKind::AtValue => Some(Color::Yellow),
        TokenKind::Function => Some(Color::Blue),
        TokenKind::Punctuation => Some(Color::DarkYellow),
    }
}
