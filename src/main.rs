use sheetforge::app;
use sheetforge::client::OpenAiClient;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let api_key = env::var("OPENAI_API_KEY")
        .map_err(|_| "OPENAI_API_KEY must be set")?;

    let mut client = OpenAiClient::new(api_key);
    if let Ok(model) = env::var("OPENAI_MODEL") {
        client = client.with_model(model);
    }

    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    app::run(client, port).await
}
