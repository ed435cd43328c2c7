//! Demo command
//!
//! Usage: marlog demo [--log-path DIR] [--env ENV]
//!
//! Boots an error handler with an ignore list, a custom handler, a fallback
//! and a self-reporting error, then reports one error of each kind.

use anyhow::Result;
use clap::Args;
use marlog_core::{ctx, Context, Exception, Level, Logger, SelfReportPolicy, SelfReporting, Thrown};
use marlog_engine::ErrorHandler;
use serde_json::{json, Map, Value as JsonValue};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct DemoArgs {
    /// Directory for log files
    #[arg(long, default_value = "storage/logs")]
    pub log_path: PathBuf,

    /// Deployment environment
    #[arg(long, default_value = "development")]
    pub env: String,

    /// Record format (json or human)
    #[arg(long, default_value = "json")]
    pub format: String,
}

/// A declined payment that logs itself
///
/// Not a `RuntimeError`: a matching custom handler would claim it before
/// its own `report` is consulted.
#[derive(Debug)]
pub struct PaymentDeclined {
    pub txn_id: String,
    pub amount: f64,
    pub reason: String,
}

impl fmt::Display for PaymentDeclined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payment declined: {}", self.reason)
    }
}

impl Exception for PaymentDeclined {
    fn type_chain(&self) -> Vec<&str> {
        vec!["PaymentDeclined", "DomainError"]
    }

    fn self_reporting(&self) -> Option<&dyn SelfReporting> {
        Some(self)
    }
}

impl SelfReporting for PaymentDeclined {
    fn report(&self, logger: &Logger) -> bool {
        logger.warning(
            "payment_declined",
            ctx! {
                "_origin" => "system",
                "txn_id" => self.txn_id.as_str(),
                "amount" => self.amount,
                "reason" => self.reason.as_str(),
            },
        );
        true
    }

    fn context(&self) -> Context {
        ctx! {
            "txn_id" => self.txn_id.as_str(),
            "amount" => self.amount,
            "reason" => self.reason.as_str(),
        }
    }

    fn level(&self) -> Option<Level> {
        Some(Level::Warning)
    }
}

fn demo_options(args: &DemoArgs) -> Map<String, JsonValue> {
    let mut options = Map::new();
    options.insert("app_name".to_string(), json!("myapp"));
    options.insert("env".to_string(), json!(args.env));
    options.insert(
        "log_path".to_string(),
        json!(args.log_path.to_string_lossy()),
    );
    options.insert("max_log_bytes".to_string(), json!("10MB"));
    options.insert("log_format".to_string(), json!(args.format));
    options.insert(
        "sensitive_keys".to_string(),
        json!(["password", "token", "authorization"]),
    );
    options
}

/// Execute demo command
pub fn execute(args: DemoArgs) -> Result<()> {
    let handler = ErrorHandler::builder(demo_options(&args))
        .policy(SelfReportPolicy::Dispatch)
        .reporter(|r| {
            r.dont_report(["InvalidArgument"]);
            r.reportable("RuntimeError", |e, logger| {
                logger.critical(
                    "RuntimeError handled by custom reportable",
                    ctx! {
                        "_origin" => "system",
                        "message" => e.to_string(),
                        "file" => e.file(),
                        "line" => e.line(),
                    },
                );
            });
            r.fallback(|e, logger| {
                logger.alert(
                    "Unhandled exception reached fallback",
                    ctx! {
                        "_origin" => "system",
                        "type" => e.type_name(),
                        "message" => e.to_string(),
                    },
                );
            });
        })
        .build();
    handler.register();

    let logger = handler.logger();
    logger.info("User clicked button", ctx! { "user_id" => 42 });
    logger.error(
        "cache_miss",
        ctx! { "_origin" => "system", "key" => "users:42", "token" => "s3cret" },
    );

    let declined = PaymentDeclined {
        txn_id: "TXN-1234".to_string(),
        amount: 199.99,
        reason: "insufficient_funds".to_string(),
    };
    let cases: [(&str, &dyn Exception); 4] = [
        ("self-reporting", &declined),
        ("ignored", &Thrown::new("InvalidArgument", "Bad input")),
        (
            "custom handler",
            &Thrown::new("RuntimeError", "Something went bang").at(file!(), line!()),
        ),
        (
            "fallback",
            &Thrown::new("LogicError", "Unhandled type will hit fallback"),
        ),
    ];

    for (label, e) in cases {
        let handled = handler.report(e);
        println!("{:<15} {:<16} handled={}", label, e.type_name(), handled);
    }

    println!("Done. Check logs in {}", handler.settings().log_path().display());
    Ok(())
}
