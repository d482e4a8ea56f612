use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ttksim=info,tower_http=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    std::process::exit(ttksim::cli::run_with_args(std::env::args_os()));
}
