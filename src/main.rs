//! Panel Backend - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() -> std::io::Result<()> {
    panel_backend::run().await
}
