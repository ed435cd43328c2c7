//! Convenience macros
//!
//! `ctx!` builds a `Context` inline; `diagnostic!` emits one of the crate's
//! own structured tracing events with the canonical `component`/`op`/`event`
//! fields.

/// Build a `Context` from `key => value` pairs
///
/// # Example
///
/// ```
/// use marlog_core::{ctx, Value};
///
/// let context = ctx! { "user_id" => 42, "_origin" => "system" };
/// assert_eq!(context["user_id"], Value::Int(42));
/// ```
#[macro_export]
macro_rules! ctx {
    () => {
        $crate::Context::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::Context::new();
        $(
            map.insert(::std::string::String::from($key), $crate::Value::from($value));
        )+
        map
    }};
}

/// Emit an internal diagnostic event
///
/// # Example
///
/// ```
/// # use marlog_core::diagnostic;
/// diagnostic!(warn, "append", "sink_write_failed", path = "/tmp/x.log");
/// ```
#[macro_export]
macro_rules! diagnostic {
    ($lvl:ident, $op:expr, $event:expr) => {
        $crate::__tracing::$lvl!(
            component = module_path!(),
            op = $op,
            event = $event,
        );
    };
    ($lvl:ident, $op:expr, $event:expr, $($field:tt)*) => {
        $crate::__tracing::$lvl!(
            component = module_path!(),
            op = $op,
            event = $event,
            $($field)*
        );
    };
}
