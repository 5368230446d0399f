pub const STARTUP: &str = "Starting Matrix long-connection sync...";

pub const SHUTDOWN: &str = "Shutting down...";

pub fn login_success(user: &str) -> String {
    format!("Logged in as {user}")
}

pub fn sync_loop_fail(err: &str) -> String {
    format!("Sync loop failed: {err}")
}

pub fn shutdown_fail(err: &str) -> String {
    format!("Unable to listen for shutdown signal: {err}")
}
