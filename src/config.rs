//! CLI configuration (SPEC_FULL.md §2). `clap`'s derive API validates
//! `--port`'s numeric range for us; the only hand-rolled fallback is `0`,
//! which `u16` parsing accepts but the server treats as "unset".

use std::path::PathBuf;

use clap::Parser;

const DEFAULT_PORT: u16 = 8081;

#[derive(Debug, Parser)]
#[command(name = "sehttpd", about = "Single-threaded static file server")]
pub struct Config {
    /// Listen port. Falls back to 8081 if 0.
    #[arg(short = 'p', long = "port", default_value_t = DEFAULT_PORT)]
    pub listen_port: u16,

    /// Web root directory.
    #[arg(short = 'r', long = "root", default_value = "./www")]
    pub web_root: PathBuf,
}

impl Config {
    pub fn parse_args() -> Self {
        let mut cfg = Config::parse();
        if cfg.listen_port == 0 {
            cfg.listen_port = DEFAULT_PORT;
        }
        cfg
    }
}
