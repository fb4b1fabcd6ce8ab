use super::session::Session;
use ballotbox::address::Address;

/// Finalize a topic and print the weighted tally per option.
pub async fn execute(
    config_path: Option<String>,
    at: Option<u64>,
    topic_id: u64,
    caller: Option<Address>,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(config_path, at)?;
    let caller = session.caller(caller)?;

    let tallies = session.service.finalize_votes(&caller, topic_id).await?;
    session.persist().await?;

    let details = session.service.get_topic_details(topic_id).await?;
    println!("Topic {} finalized: {}", topic_id, details.description);
    for (option, tally) in details.options.iter().zip(&tallies) {
        println!("  {}: {}", option, tally);
    }
    Ok(())
}
