use super::session::Session;
use ballotbox::address::Address;

/// Record the caller's vote and persist the registry.
pub async fn execute(
    config_path: Option<String>,
    at: Option<u64>,
    topic_id: u64,
    option: String,
    caller: Option<Address>,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(config_path, at)?;
    let caller = session.caller(caller)?;

    session.service.vote(&caller, topic_id, &option).await?;
    session.persist().await?;

    println!("Vote recorded: {} voted \"{}\" on topic {}", caller, option, topic_id);
    Ok(())
}
