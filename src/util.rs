use tracing::warn;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `log_level` is a filter directive such as
/// `info` or `skyroute=debug`; `RUST_LOG` can add more.
pub fn setup_logging(log_level: &str) {
    let (level_directive, fallback_used): (Directive, bool) = match log_level.parse() {
        Ok(directive) => (directive, false),
        Err(_) => (LevelFilter::INFO.into(), true),
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level_directive);
    for directive in ["tokio=info", "runtime=info", "tower_http=debug"] {
        if let Ok(directive) = directive.parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }

    let installed = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true) // Show thread IDs
                .with_thread_names(true) // Show thread names
                .with_target(true) // Show module path
                .with_file(true) // Show file name
                .with_line_number(true) // Show line numbers
                .pretty(),
        )
        .with(filter)
        .try_init();

    if let Err(e) = installed {
        eprintln!("Logging already initialized: {}", e);
    }
    if fallback_used {
        warn!("Invalid log level '{}', using info", log_level);
    }
}
