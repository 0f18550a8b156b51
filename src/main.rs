use anyhow::Result;
use log::{info, warn};
use wedding_rsvp::{api_server, env_manager, init_logger, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();
    env_manager::load_env_file();

    info!("Starting wedding RSVP API server");
    env_manager::print_env_status();
    if !env_manager::check_env_vars() {
        warn!("Some required environment variables are missing; RSVP saving will be unavailable");
    }

    let settings = Settings::from_env()?;
    api_server::start_api_server(settings).await
}
