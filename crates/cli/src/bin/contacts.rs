use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    contact_cli::main_entry().await
}
