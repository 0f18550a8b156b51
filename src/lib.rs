pub mod admin_stats;
pub mod api_server;
pub mod config;
pub mod env_manager;
pub mod error;
pub mod google;
pub mod guest_lookup;
pub mod hero_images;
pub mod notify;
pub mod roster;
pub mod rsvp;
pub mod store;

/// Timestamped `env_logger` setup shared by the binaries. `RUST_LOG` overrides the level.
pub fn init_logger() {
    use env_logger::Env;

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            use chrono::Local;
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

// Re-export commonly used types
pub use config::Settings;
pub use error::{RsvpError, RsvpResult};
pub use guest_lookup::{lookup, MatchCandidate};
pub use roster::Guest;
