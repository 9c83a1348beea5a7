use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    webpilot_cli::run().await
}
