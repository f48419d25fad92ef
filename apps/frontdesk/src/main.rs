//! # Barberia Front Desk Entry Point
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Read `BARBERIA_*` configuration
//! 3. Open the database and load (or seed) the shop snapshot
//! 4. Pull the remote snapshot when sync is on
//! 5. Sweep appointment reminders until Ctrl+C

#[tokio::main]
async fn main() {
    // The actual setup is in lib.rs for better testability
    if let Err(e) = barberia_frontdesk::run().await {
        tracing::error!(error = %e, "Front desk failed to start");
        std::process::exit(1);
    }
}
