//! Line editor support: slash command completion, argument hints and feed
//! positions for `/like`.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use crate::commands::COMMANDS;

const LIKE_PREFIX: &str = "/like ";

/// Shares the number of rendered feed entries with the page, so `/like`
/// only completes positions that exist.
#[derive(Clone)]
pub struct FeedHelper {
    feed_len: Arc<AtomicUsize>,
}

impl FeedHelper {
    pub fn new(feed_len: Arc<AtomicUsize>) -> Self {
        Self { feed_len }
    }

    fn feed_len(&self) -> usize {
        self.feed_len.load(Ordering::Relaxed)
    }
}

/// Command names (with a trailing space when they take arguments) matching
/// the typed prefix.
fn command_candidates(prefix: &str) -> Vec<String> {
    COMMANDS
        .iter()
        .filter(|(name, _)| name.starts_with(prefix))
        .map(|(name, args)| {
            if args.is_empty() {
                name.to_string()
            } else {
                format!("{name} ")
            }
        })
        .collect()
}

/// Feed positions `1..=feed_len` starting with `typed`.
fn like_positions(typed: &str, feed_len: usize) -> Vec<String> {
    (1..=feed_len)
        .map(|n| n.to_string())
        .filter(|n| n.starts_with(typed))
        .collect()
}

/// Grey text shown after the cursor: the rest of a unique command name, or
/// the argument synopsis once the name is complete.
fn command_hint(line: &str) -> Option<String> {
    if !line.starts_with('/') {
        return None;
    }
    if let Some(name) = line.strip_suffix(' ') {
        return COMMANDS
            .iter()
            .find(|(cmd, args)| *cmd == name && !args.is_empty())
            .map(|(_, args)| args.to_string());
    }
    if line.contains(' ') {
        return None;
    }
    let mut matches = COMMANDS.iter().filter(|(name, _)| name.starts_with(line));
    let (name, args) = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    let rest = &name[line.len()..];
    match (rest.is_empty(), args.is_empty()) {
        (true, true) => None,
        (true, false) => Some(format!(" {args}")),
        (false, _) => Some(rest.to_string()),
    }
}

impl Helper for FeedHelper {}

impl Completer for FeedHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        let (start, words) = if let Some(typed) = line.strip_prefix(LIKE_PREFIX) {
            let typed = typed.trim_start();
            (line.len() - typed.len(), like_positions(typed, self.feed_len()))
        } else if line.starts_with('/') && !line.contains(' ') {
            (0, command_candidates(line))
        } else {
            (0, Vec::new())
        };
        let pairs = words
            .into_iter()
            .map(|word| Pair {
                display: word.trim_end().to_string(),
                replacement: word,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Highlighter for FeedHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if !line.starts_with('/') {
            return Borrowed(line);
        }
        match line.split_once(' ') {
            Some((name, rest)) => Owned(format!("{} {}", name.bright_cyan(), rest)),
            None => Owned(line.bright_cyan().to_string()),
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, line: &str, _pos: usize, _forced: bool) -> bool {
        line.starts_with('/')
    }
}

impl Hinter for FeedHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        command_hint(line)
    }
}

impl Validator for FeedHelper {}
