//! Natural-language activity summary.
//!
//! # Responsibility
//! - Tokenize completed items' text and rank recurring keywords.
//! - Tally priorities/categories and assemble one templated sentence.
//!
//! # Invariants
//! - Pure over the completed-item snapshot.
//! - Keyword ties break by first-encountered order (stable sort).
//! - Zero completed items returns [`NO_ACTIVITY_MESSAGE`] verbatim.

use crate::model::event::{Event, EventCategory};
use crate::model::task::{Priority, Task};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Fixed response for windows without any completed item.
pub const NO_ACTIVITY_MESSAGE: &str = "No completed tasks or events in this period.";

const TOP_KEYWORDS: usize = 3;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{Alphabetic}\p{N}]+").expect("valid token regex"));

/// Tokens too generic to tell the user anything about their activity.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "get", "go", "had",
    "has", "have", "i", "in", "is", "it", "its", "me", "my", "new", "of", "on", "or", "our",
    "out", "so", "that", "the", "their", "them", "then", "this", "to", "up", "was", "we", "were",
    "will", "with", "you", "your",
];

/// Builds the activity summary sentence for the completed items of a window.
pub fn activity_summary(completed_tasks: &[Task], completed_events: &[Event]) -> String {
    let total = completed_tasks.len() + completed_events.len();
    if total == 0 {
        return NO_ACTIVITY_MESSAGE.to_string();
    }

    let keywords = top_keywords(completed_tasks, completed_events);
    let top_priority = most_common_priority(completed_tasks);
    let top_category = most_common_category(completed_events);

    let mut sentence = format!("You completed {} {}", total, pluralize(total, "item"));

    let mut kind_parts = Vec::new();
    if !completed_tasks.is_empty() {
        let mut part = format!(
            "{} {}",
            completed_tasks.len(),
            pluralize(completed_tasks.len(), "task")
        );
        if let Some(priority) = top_priority {
            part.push_str(&format!(" (mostly {} priority)", priority_label(priority)));
        }
        kind_parts.push(part);
    }
    if !completed_events.is_empty() {
        let mut part = format!(
            "{} {}",
            completed_events.len(),
            pluralize(completed_events.len(), "event")
        );
        if let Some(category) = top_category {
            part.push_str(&format!(" (mostly {})", category.label()));
        }
        kind_parts.push(part);
    }
    if !kind_parts.is_empty() {
        sentence.push_str(": ");
        sentence.push_str(&kind_parts.join(" and "));
    }
    sentence.push('.');

    if !keywords.is_empty() {
        sentence.push_str(&format!(" Recurring themes: {}.", keywords.join(", ")));
    }

    sentence
}

/// Top non-stopword tokens across titles and notes, most frequent first.
///
/// First-encountered order wins frequency ties.
pub fn top_keywords(tasks: &[Task], events: &[Event]) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    let mut absorb = |text: &str| {
        for token in TOKEN_RE.find_iter(&text.to_lowercase()) {
            let word = token.as_str();
            if STOP_WORDS.contains(&word) {
                continue;
            }
            match counts.get_mut(word) {
                Some(count) => *count += 1,
                None => {
                    counts.insert(word.to_string(), 1);
                    order.push(word.to_string());
                }
            }
        }
    };

    for task in tasks {
        absorb(&task.title);
        if let Some(description) = &task.description {
            absorb(description);
        }
    }
    for event in events {
        absorb(&event.title);
        if let Some(notes) = &event.notes {
            absorb(notes);
        }
    }

    // `order` already reflects first encounter; a stable sort by count
    // keeps that order among ties.
    let mut ranked = order;
    ranked.sort_by_key(|word| std::cmp::Reverse(counts.get(word).copied().unwrap_or(0)));
    ranked.truncate(TOP_KEYWORDS);
    ranked
}

fn most_common_priority(tasks: &[Task]) -> Option<Priority> {
    if tasks.is_empty() {
        return None;
    }
    let mut best = None;
    let mut best_count = 0usize;
    for candidate in [Priority::High, Priority::Medium, Priority::Low] {
        let count = tasks
            .iter()
            .filter(|task| task.priority == candidate)
            .count();
        if count > best_count {
            best = Some(candidate);
            best_count = count;
        }
    }
    best
}

fn most_common_category(events: &[Event]) -> Option<EventCategory> {
    if events.is_empty() {
        return None;
    }
    let mut best = None;
    let mut best_count = 0usize;
    for candidate in [
        EventCategory::Work,
        EventCategory::Personal,
        EventCategory::Social,
        EventCategory::Health,
        EventCategory::Other,
    ] {
        let count = events
            .iter()
            .filter(|event| event.category == candidate)
            .count();
        if count > best_count {
            best = Some(candidate);
            best_count = count;
        }
    }
    best
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "high",
        Priority::Medium => "medium",
        Priority::Low => "low",
    }
}

fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        noun.to_string()
    } else {
        format!("{noun}s")
    }
}
