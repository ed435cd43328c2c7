//! Developer-friendly multi-line formatter

use super::Formatter;
use crate::record::LogRecord;
use crate::value::Context;
use std::fmt::Write as _;

/// Frames printed per record
const MAX_FRAMES: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct HumanFormatter {
    show_memory: bool,
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self { show_memory: true }
    }

    /// Skip the process memory line (keeps output byte-stable)
    pub fn without_memory(mut self) -> Self {
        self.show_memory = false;
        self
    }
}

impl Formatter for HumanFormatter {
    fn format(&self, r: &LogRecord) -> String {
        let mut lines = vec![
            format!(
                "[{}] {}.{} ({}) {}",
                r.ts(),
                r.level,
                r.channel,
                r.env,
                r.message
            ),
            format!(
                "app={} pid={} request_id={}",
                r.app, r.pid, r.request_id
            ),
        ];

        if r.file.is_some() || r.line.is_some() {
            lines.push(format!(
                "at {}:{}",
                r.file.as_deref().unwrap_or("-"),
                r.line.map_or_else(|| "-".to_string(), |l| l.to_string())
            ));
        }
        if let Some(etype) = &r.etype {
            lines.push(format!("exception: {} (code {})", etype, r.ecode.unwrap_or(0)));
        }
        if !r.request.is_empty() {
            let req = &r.request;
            lines.push(format!(
                "http {} {} host={} ip={} ua={}",
                req.method.as_deref().unwrap_or("-"),
                req.uri.as_deref().unwrap_or("-"),
                req.host.as_deref().unwrap_or("-"),
                req.ip.as_deref().unwrap_or("-"),
                req.user_agent.as_deref().unwrap_or("-"),
            ));
        }

        if !r.context.is_empty() {
            lines.push(format!("context: {}", pretty(&r.context)));
        }
        if !r.extra.is_empty() {
            lines.push(format!("extra: {}", pretty(&r.extra)));
        }

        if self.show_memory {
            if let Some((used, peak)) = process_memory_mb() {
                lines.push(format!("mem_used={:.2}MB mem_peak={:.2}MB", used, peak));
            }
        }

        if !r.trace.is_empty() {
            let mut trace = String::from("trace:");
            for (i, t) in r.trace.iter().take(MAX_FRAMES).enumerate() {
                let _ = write!(
                    trace,
                    "\n  #{} {}:{} {}{}{}",
                    i,
                    t.file.as_deref().unwrap_or("-"),
                    t.line.map_or_else(|| "-".to_string(), |l| l.to_string()),
                    t.class.as_deref().unwrap_or(""),
                    t.call_type.as_deref().unwrap_or(""),
                    t.function.as_deref().unwrap_or(""),
                );
            }
            lines.push(trace);
        }

        let mut out = lines.join("\n");
        out.push_str("\n\n");
        out
    }
}

fn pretty(map: &Context) -> String {
    serde_json::to_string_pretty(map).unwrap_or_else(|e| format!("<unencodable: {}>", e))
}

/// Resident and peak resident memory of this process, in MiB
#[cfg(target_os = "linux")]
fn process_memory_mb() -> Option<(f64, f64)> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let field = |name: &str| -> Option<f64> {
        let line = status.lines().find(|l| l.starts_with(name))?;
        let kib: f64 = line.split_whitespace().nth(1)?.parse().ok()?;
        Some(kib / 1024.0)
    };
    Some((field("VmRSS:")?, field("VmHWM:")?))
}

#[cfg(not(target_os = "linux"))]
fn process_memory_mb() -> Option<(f64, f64)> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::sample_record;

    #[test]
    fn test_header_and_metadata_lines() {
        let out = HumanFormatter::new().without_memory().format(&sample_record());
        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some("[2024-05-01T12:30:00+00:00] error.app (production) checkout failed")
        );
        assert_eq!(lines.next(), Some("app=shop pid=4242 request_id=req-1"));
        assert!(out.contains("at src/cart.rs:88"));
        assert!(out.contains("exception: CartError (code 3)"));
        assert!(out.contains("http POST /cart/checkout host=- ip=- ua=-"));
    }

    #[test]
    fn test_trace_capped_at_five_frames() {
        let out = HumanFormatter::new().without_memory().format(&sample_record());
        assert!(out.contains("#4 src/cart.rs:4 frame_4"));
        assert!(!out.contains("#5 "));
    }

    #[test]
    fn test_terminated_by_blank_line() {
        let out = HumanFormatter::new().format(&sample_record());
        assert!(out.ends_with("\n\n"));
        assert!(!out.ends_with("\n\n\n"));
    }

    #[test]
    fn test_optional_sections_omitted() {
        let mut record = sample_record();
        record.file = None;
        record.line = None;
        record.etype = None;
        record.trace.clear();
        record.context.clear();
        record.request = Default::default();

        let out = HumanFormatter::new().without_memory().format(&record);
        assert!(!out.contains("\nat "));
        assert!(!out.contains("exception:"));
        assert!(!out.contains("http "));
        assert!(!out.contains("context:"));
        assert!(!out.contains("trace:"));
    }
}
