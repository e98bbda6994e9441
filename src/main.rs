use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    shelly_scanner::cli::run().await
}
