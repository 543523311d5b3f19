use std::path::Path;

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*, registry, Layer};

/// Install the global logger: console output filtered by `RUST_LOG` (`info` by
/// default) and, when `file_path` is given, a copy of the logs in that file
/// together with a panic hook pointing at it.
///
/// Does nothing if a global subscriber is already configured.
pub fn install(file_path: Option<&Path>) {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter());

    let file = file_path.map(|path| {
        let writer = tracing_appender::rolling::never(
            path.parent().unwrap_or_else(|| Path::new(".")),
            path.file_name().unwrap_or_else(|| "experiment.log".as_ref()),
        );

        fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(env_filter())
    });

    if registry().with(console).with(file).try_init().is_ok() {
        if let Some(path) = file_path {
            update_panic_hook(path);
        }
    }
}

fn env_filter() -> EnvFilter {
    // The wgpu crates are logging too much at `info`.
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,wgpu=warn"))
}

fn update_panic_hook(file_path: &Path) {
    let hook = std::panic::take_hook();
    let file_path = file_path.display().to_string();

    std::panic::set_hook(Box::new(move |info| {
        log::error!("PANIC => {info}");
        eprintln!(
            "=== PANIC ===\nA fatal error happened, you can check the experiment logs here => \
             '{file_path}'\n============="
        );
        hook(info);
    }));
}
