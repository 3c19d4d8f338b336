//! BingoCloud service support with convenience APIs.

pub use stratus_bingocloud::*;

/// Connect to BingoCloud with the default context and credentials from the
/// `BINGO_*` environment variables.
///
/// # Example
///
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> stratus::Result<()> {
/// let client = stratus::bingocloud::connect().await?;
/// for region in client.regions() {
///     println!("{}", region.id());
/// }
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "default-context")]
pub async fn connect() -> crate::Result<Client> {
    let ctx = crate::default_context()?;
    let config = Config::new().from_env(&ctx);
    Client::new(config, ctx).await
}
