//! CLI command implementations.

pub mod account;
pub mod questions;
pub mod watch;

use std::fmt::Write as _;

use askhive_client::Snapshot;
use askhive_types::Question;
use chrono::{DateTime, Utc};

/// Render questions most urgent first, one line each.
pub fn render(snapshot: &Snapshot, now: DateTime<Utc>) -> String {
    if snapshot.is_empty() {
        return "No questions yet.\n".to_string();
    }

    let mut out = String::new();
    for question in snapshot.prioritized() {
        let _ = writeln!(out, "{}", render_line(question, now));
    }
    out
}

fn render_line(question: &Question, now: DateTime<Utc>) -> String {
    let answers = match question.answers.len() {
        1 => "1 answer".to_string(),
        n => format!("{n} answers"),
    };
    format!(
        "{:<6} {:<9} {}  ({}, {})",
        format!("#{}", question.id),
        question.status.as_str(),
        question.message,
        answers,
        format_age(question.created_at, now),
    )
}

/// Format a timestamp relative to `now`.
fn format_age(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (now - at).num_seconds().max(0);

    if diff < 60 {
        "just now".to_string()
    } else if diff < 3600 {
        format!("{} minutes ago", diff / 60)
    } else if diff < 86400 {
        format!("{} hours ago", diff / 3600)
    } else {
        format!("{} days ago", diff / 86400)
    }
}
