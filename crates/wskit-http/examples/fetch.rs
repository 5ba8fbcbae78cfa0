//! Fetches a URL with GET, then echoes a JSON body with POST.
//!
//! ```sh
//! cargo run -p wskit-http --example fetch -- https://httpbin.org
//! ```

use wskit_http::{Client, HttpConfig};
use wskit_log::{info, warn, LogConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    wskit_log::init(LogConfig::from_env())?;

    let base = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://httpbin.org".to_string());
    let client = Client::with_config(HttpConfig::from_env())?;

    let response = client.url(format!("{base}/get")).get().await?;
    info!(status = response.status(), "GET finished");
    match response.json() {
        Ok(json) => println!("{json:#}"),
        Err(e) => {
            warn!(error = %e, "body is not JSON");
            println!("{}", response.text()?);
        }
    }

    let response = client
        .url(format!("{base}/post"))
        .json_body(&serde_json::json!({ "planet": "World" }))?
        .post()
        .await?;
    info!(status = response.status(), "POST finished");
    println!("{}", response.text()?);

    Ok(())
}
