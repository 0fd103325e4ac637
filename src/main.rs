use sqlstress::run_main;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    run_main().await?;
    Ok(())
}
