use std::backtrace::{Backtrace, BacktraceStatus};
use std::sync::OnceLock;

use regex::Regex;

use crate::representation::StackFrame;

/// Convert a captured backtrace into stack frames, innermost first
///
/// Returns an empty list when the backtrace was not captured (for example
/// `RUST_BACKTRACE` unset).
pub fn frames_from_backtrace(backtrace: &Backtrace) -> Vec<StackFrame> {
    if backtrace.status() != BacktraceStatus::Captured {
        return Vec::new();
    }
    parse_backtrace(&backtrace.to_string())
}

/// Parse the textual form of a `std::backtrace::Backtrace`
///
/// ```text
///    0: pets::store::load
///              at ./src/store.rs:42:9
///    1: main
/// ```
pub fn parse_backtrace(text: &str) -> Vec<StackFrame> {
    fn symbol_re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"^\s*\d+:\s+(.+?)\s*$").expect("must be valid regex"))
    }

    fn location_re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"^\s*at\s+(.+?):(\d+)(?::\d+)?\s*$").expect("must be valid regex"))
    }

    let mut frames: Vec<StackFrame> = Vec::new();

    for line in text.lines() {
        if let Some(captures) = location_re().captures(line) {
            // Only the first location belongs to the frame; inlined callers follow
            if let Some(frame) = frames.last_mut()
                && frame.file_name.is_none()
            {
                frame.file_name = Some(captures[1].to_owned());
                frame.line_number = captures[2].parse().ok();
            }
            continue;
        }

        if let Some(captures) = symbol_re().captures(line) {
            frames.push(split_symbol(&captures[1]));
        }
    }

    frames
}

fn split_symbol(symbol: &str) -> StackFrame {
    // Drop the trailing hash that unmangled legacy symbols carry
    let symbol = match symbol.rsplit_once("::h") {
        Some((head, hash)) if hash.len() == 16 && hash.chars().all(|c| c.is_ascii_hexdigit()) => head,
        _ => symbol,
    };

    match symbol.rsplit_once("::") {
        Some((declaring, method)) => StackFrame {
            declaring_type: Some(declaring.to_owned()),
            method_name: method.to_owned(),
            file_name: None,
            line_number: None,
        },
        None => StackFrame {
            declaring_type: None,
            method_name: symbol.to_owned(),
            file_name: None,
            line_number: None,
        },
    }
}
