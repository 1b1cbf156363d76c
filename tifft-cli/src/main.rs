use anyhow::Result;
use tifft_cli::app;

#[tokio::main]
async fn main() -> Result<()> {
    app::run().await
}
