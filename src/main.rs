use dnsr::dns::{self, client::Client};
use dnsr::settings::Settings;

use env_logger::Env;

use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = Settings::load()?;
    log::debug!("Settings loaded:\n{:?}", settings);

    let question = settings.question()?;
    let mut query = dns::Message::query(rand::random(), question);
    query.header.recursion_desired = settings.query.recursion_desired;

    let client = Client::new(settings.server(), settings.timeout(), settings.max_message_len);
    log::info!(
        "Asking {server} for {name} {class} {rtype}",
        server = client.server(),
        name = settings.query.name,
        class = settings.query.class,
        rtype = settings.query.record_type
    );

    let response = client.send(query).await?;
    print!("{}", response);

    Ok(())
}
