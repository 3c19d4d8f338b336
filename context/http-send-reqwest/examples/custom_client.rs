use std::time::Duration;

use anyhow::Result;
use bytes::Bytes;
use reqwest::Client;
use stratus_core::Context;
use stratus_http_send_reqwest::ReqwestHttpSend;

#[tokio::main]
async fn main() -> Result<()> {
    // Cloud query APIs can take a while to answer; give requests a generous
    // timeout but keep connection establishment short.
    let client = Client::builder()
        .timeout(Duration::from_secs(300))
        .connect_timeout(Duration::from_secs(5))
        .user_agent("stratus-example/1.0")
        .build()?;

    let ctx = Context::default().with_http_send(ReqwestHttpSend::new(client));

    let req = http::Request::builder()
        .method("GET")
        .uri("https://httpbin.org/get")
        .body(Bytes::new())?;

    match ctx.http_send(req).await {
        Ok(resp) => {
            println!("Response status: {}", resp.status());
            if let Ok(text) = String::from_utf8(resp.body().to_vec()) {
                println!("{text}");
            }
        }
        Err(e) => eprintln!("Request failed: {e}"),
    }

    Ok(())
}
