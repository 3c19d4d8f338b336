use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // Reads BINGO_ENDPOINT, BINGO_ACCESS_KEY_ID and BINGO_SECRET_ACCESS_KEY.
    let client = stratus::bingocloud::connect().await?;

    for region in client.regions() {
        println!("{}\t{}\t{}", region.id(), region.name(), region.endpoint());
    }

    Ok(())
}
