use geomet_screen::cli;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("geomet_screen=info".parse().expect("static directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = cli::parse_args(std::env::args().skip(1)).and_then(cli::run);
    if let Err(err) = result {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}
