//! Lightweight comment markup: `**bold**`, `*italic*`, `` `code` ``,
//! `@mentions` and `• ` / `- ` bullets.

use std::collections::HashMap;
use std::sync::LazyLock;

use colored::Colorize;
use regex::{Captures, Regex};

static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\w+(?:[ \t]+\w+)*)").unwrap());
static MENTION_DISPLAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+(?: \p{Lu}\w*)*").unwrap());
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.+?)\*").unwrap());
static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`(.+?)`").unwrap());
static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*[•-][ \t]+(.*)$").unwrap());

fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// People mentioned in `content`, matched case-insensitively against
/// `known_names`. The longest matching name wins, so "@Sarah Johnson" picks
/// "Sarah Johnson" over "Sarah". Returned once each, first mention first,
/// spelled as in `known_names`.
pub fn extract_mentions<S: AsRef<str>>(content: &str, known_names: &[S]) -> Vec<String> {
    let known: HashMap<String, &str> = known_names
        .iter()
        .map(|name| (normalize(name.as_ref()), name.as_ref().trim()))
        .filter(|(key, _)| !key.is_empty())
        .collect();

    let mut mentions: Vec<String> = Vec::new();
    for caps in MENTION.captures_iter(content) {
        let words: Vec<&str> = caps[1].split_whitespace().collect();
        let found = (1..=words.len())
            .rev()
            .find_map(|n| known.get(&words[..n].join(" ").to_lowercase()));

        if let Some(name) = found {
            if !mentions.iter().any(|m| m == name) {
                mentions.push((*name).to_string());
            }
        }
    }
    mentions
}

/// Style markup for a terminal. Markers are removed; colour follows the
/// `colored` override and `NO_COLOR`.
pub fn render_terminal(content: &str) -> String {
    let text = BULLET.replace_all(content, "  • $1");
    let text = CODE.replace_all(&text, |caps: &Captures| caps[1].cyan().to_string());
    let text = BOLD.replace_all(&text, |caps: &Captures| caps[1].bold().to_string());
    let text = ITALIC.replace_all(&text, |caps: &Captures| caps[1].italic().to_string());
    MENTION_DISPLAY
        .replace_all(&text, |caps: &Captures| caps[0].blue().bold().to_string())
        .into_owned()
}
