use std::io::Write;

use env_logger::{Builder, Env};
use log::info;

/// Level comes from `RUST_LOG`, `info` when unset.
pub fn setup_logger() {
  Builder::from_env(Env::default().default_filter_or("info"))
    .format(|buf, record| {
      writeln!(
        buf,
        "[{}] {} [{}] {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        record.level(),
        record.target(),
        record.args()
      )
    })
    .init();

  info!("Logger initialized");
}
