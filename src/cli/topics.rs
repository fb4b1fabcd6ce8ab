//! Read-only commands: `topics`, `show`, `votes`.

use super::session::{format_time, Session};
use ballotbox::address::Address;
use ballotbox::registry::{Topic, TopicState};
use serde::Serialize;

/// JSON view of one topic.
#[derive(Debug, Serialize)]
pub struct TopicReport {
    pub id: u64,
    pub description: String,
    pub end_time: u64,
    pub state: TopicState,
    pub token: Address,
    pub options: Vec<OptionReport>,
    pub voters: usize,
}

#[derive(Debug, Serialize)]
pub struct OptionReport {
    pub label: String,
    pub votes: u128,
}

impl TopicReport {
    pub fn new(topic: &Topic, now: u64) -> Self {
        Self {
            id: topic.id,
            description: topic.description.clone(),
            end_time: topic.end_time,
            state: topic.state_at(now),
            token: topic.token,
            options: topic
                .options
                .iter()
                .zip(&topic.vote_counts)
                .map(|(label, votes)| OptionReport {
                    label: label.clone(),
                    votes: *votes,
                })
                .collect(),
            voters: topic.voter_count(),
        }
    }

    /// Text rendering. Options are numbered from 1.
    pub fn render(&self) -> String {
        let mut out = format!(
            "Topic {}:\n  Description: {}\n  End Time: {}\n  State: {}\n  Voters: {}\n  Options:\n",
            self.id,
            self.description,
            format_time(self.end_time),
            self.state,
            self.voters
        );
        for (i, option) in self.options.iter().enumerate() {
            if self.state == TopicState::Finalized {
                out.push_str(&format!("    {}: {} ({} votes)\n", i + 1, option.label, option.votes));
            } else {
                out.push_str(&format!("    {}: {}\n", i + 1, option.label));
            }
        }
        out
    }
}

/// List every topic.
pub async fn list(
    config_path: Option<String>,
    at: Option<u64>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(config_path, at)?;
    let now = session.now().await?;
    let snapshot = session.service.snapshot().await;

    let reports: Vec<TopicReport> = snapshot
        .topics
        .iter()
        .map(|topic| TopicReport::new(topic, now))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    println!("Total Topics: {}", reports.len());
    for report in &reports {
        println!();
        print!("{}", report.render());
    }
    Ok(())
}

/// Show a single topic.
pub async fn show(
    config_path: Option<String>,
    at: Option<u64>,
    topic_id: u64,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(config_path, at)?;
    let now = session.now().await?;
    let snapshot = session.service.snapshot().await;

    let topic = usize::try_from(topic_id)
        .ok()
        .and_then(|i| snapshot.topics.get(i))
        .ok_or(ballotbox::RegistryError::UnknownTopic(topic_id))?;
    let report = TopicReport::new(topic, now);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render());
    }
    Ok(())
}

/// Print the tally for one option.
pub async fn votes(
    config_path: Option<String>,
    at: Option<u64>,
    topic_id: u64,
    option: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(config_path, at)?;
    let votes = session.service.get_votes(topic_id, &option).await?;
    println!("{}", votes);
    Ok(())
}
