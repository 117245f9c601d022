use env_logger::Target;
use log::LevelFilter;

/// Initialise logging to stderr so stdout stays clean for results.
///
/// `RUST_LOG` wins when set; otherwise `-v` raises the level from info to debug
/// and `-vv` to trace.
pub fn init(verbosity: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(Target::Stderr);

    if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(level_for(verbosity));
    }

    // A second init (tests) is harmless.
    let _ = builder.try_init();
}

fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
