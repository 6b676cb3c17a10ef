use std::io::Write;

use clap::Parser;
use fixturegen::{run, Args, Error};
use log::LevelFilter;

fn init_logging() {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| {
            let ts = buf.timestamp_micros();
            let style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "{}: {style}{}{style:#}: {}",
                ts,
                record.level(),
                record.args()
            )
        })
        .init();
}

fn parse_args() -> Result<Args, Error> {
    Args::try_parse().map_err(|e| {
        // --help and --version are not failures
        if !e.use_stderr() {
            e.exit();
        }
        Error::Usage(e)
    })
}

fn main() {
    init_logging();
    if let Err(e) = parse_args().and_then(|args| run(&args)) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
