use super::session::{format_time, Session};
use ballotbox::address::Address;
use ballotbox::CreateTopic;

/// Voting period used when neither `--duration` nor `--end-time` is given.
pub const DEFAULT_DURATION: &str = "7d";

pub struct Args {
    pub description: String,
    pub options: Vec<String>,
    pub token: Address,
    pub duration: Option<String>,
    pub end_time: Option<u64>,
    pub caller: Option<Address>,
}

/// Create a topic and print its id, description and end time.
pub async fn execute(
    config_path: Option<String>,
    at: Option<u64>,
    args: Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(config_path, at)?;
    let caller = session.caller(args.caller)?;

    let end_time = match args.end_time {
        Some(end_time) => end_time,
        None => {
            let now = session.now().await?;
            let duration = args.duration.as_deref().unwrap_or(DEFAULT_DURATION);
            end_time_after(now, duration)?
        }
    };

    let topic_id = session
        .service
        .create_topic(
            &caller,
            CreateTopic {
                description: args.description,
                end_time,
                options: args.options,
                token: args.token,
            },
        )
        .await?;
    session.persist().await?;

    let details = session.service.get_topic_details(topic_id).await?;
    println!("Topic created successfully!");
    println!("Topic ID: {}", topic_id);
    println!("Description: {}", details.description);
    println!("End Time: {}", format_time(details.end_time));
    Ok(())
}

/// `now` plus a human-readable duration such as "7d" or "90m".
pub fn end_time_after(now: u64, duration: &str) -> Result<u64, Box<dyn std::error::Error>> {
    let duration = humantime::parse_duration(duration)
        .map_err(|e| format!("Invalid duration '{}': {}", duration, e))?;

    now.checked_add(duration.as_secs())
        .ok_or_else(|| "End time overflows".into())
}
