//! Panics as reportable errors

use marlog_core::{Frame, Thrown};
use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::Location;

/// Type identifier given to every panic
pub const PANIC_TYPE: &str = "panic";

// Runtime frames that say nothing about the application.
const SKIPPED_PREFIXES: &[&str] = &[
    "std::",
    "core::",
    "alloc::",
    "<alloc::",
    "<core::",
    "<std::",
    "rust_begin_unwind",
    "__rust",
    "__libc",
    "_start",
    "backtrace::",
];

/// The message carried by a panic payload
pub fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

/// Build the reportable error for a panic
///
/// The stack is captured here, so call this from the panic hook itself.
pub fn thrown_from_panic(payload: &(dyn Any + Send), location: Option<&Location<'_>>) -> Thrown {
    let mut thrown = Thrown::new(PANIC_TYPE, payload_message(payload))
        .with_frames(parse_backtrace(&Backtrace::force_capture().to_string()));
    if let Some(location) = location {
        thrown = thrown.at(location.file(), location.line());
    }
    thrown
}

/// Parse the text form of a std backtrace into frames
///
/// ```text
///    3: shop::checkout::pay
///              at ./src/checkout.rs:42:9
/// ```
///
/// Runtime frames are dropped; `a::b::c` becomes class `a::b`, call type
/// `::`, function `c`.
pub fn parse_backtrace(text: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();
    let mut keep_last = false;

    for line in text.lines().map(str::trim) {
        if let Some(location) = line.strip_prefix("at ") {
            if keep_last {
                if let Some(frame) = frames.last_mut() {
                    if frame.file.is_none() {
                        let (file, line) = split_location(location);
                        frame.file = Some(file);
                        frame.line = line;
                    }
                }
            }
            continue;
        }

        let Some((index, symbol)) = line.split_once(": ") else {
            continue;
        };
        if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        keep_last = !SKIPPED_PREFIXES.iter().any(|p| symbol.starts_with(p));
        if keep_last {
            frames.push(frame_for_symbol(symbol));
        }
    }

    frames
}

fn frame_for_symbol(symbol: &str) -> Frame {
    match symbol.rsplit_once("::") {
        Some((class, function)) if !class.is_empty() => {
            Frame::new(function).in_class(class, "::")
        }
        _ => Frame::new(symbol),
    }
}

// `path/to/file.rs:42:9` → (`path/to/file.rs`, Some(42))
fn split_location(location: &str) -> (String, Option<u32>) {
    let mut parts = location.rsplitn(3, ':');
    let col = parts.next();
    let line = parts.next();
    match (parts.next(), line, col) {
        (Some(file), Some(line), Some(_)) => (file.to_string(), line.parse().ok()),
        _ => (location.to_string(), None),
    }
}
