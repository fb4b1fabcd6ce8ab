//! Property-based tests for the voting registry
//!
//! Tests for:
//! - Topic ids: dense and sequential under any creation sequence
//! - Voting: once per voter, never at or after the deadline
//! - Finalization: tallies equal summed weights, second call changes nothing
//! - Atomicity: rejected calls leave state and event log untouched

use super::*;
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};

const NOW: u64 = 1_700_000_000;

fn owner() -> Address {
    Address::from_bytes([0u8; 20])
}

fn voter(id: u8) -> Address {
    let mut bytes = [0xaa; 20];
    bytes[19] = id;
    Address::from_bytes(bytes)
}

fn options(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("Option{}", i)).collect()
}

fn request(end_time: u64, option_count: usize) -> CreateTopic {
    CreateTopic {
        description: "Best Meme of 2024".to_string(),
        end_time,
        options: options(option_count),
        token: Address::from_bytes([0xee; 20]),
    }
}

proptest! {
    /// Property: Topic ids are dense
    /// n successful creations yield ids 0..n in order
    #[test]
    fn topic_ids_are_dense(
        durations in prop::collection::vec(1u64..1_000_000, 1..30),
    ) {
        let mut registry = VotingRegistry::new(owner(), RegistryPolicy::default());

        for (expected, duration) in durations.iter().enumerate() {
            let id = registry.create_topic(&owner(), NOW, request(NOW + duration, 2)).unwrap();
            prop_assert_eq!(id, expected as u64);
        }

        prop_assert_eq!(registry.get_topic_count(), durations.len() as u64);
    }

    /// Property: Details round-trip
    /// get_topic_details returns exactly what create_topic was given, with zero counts
    #[test]
    fn details_match_creation(
        description in ".{0,64}",
        duration in 1u64..10_000_000,
        labels in prop::collection::btree_set("[A-Za-z0-9$!]{1,12}", 1..8),
    ) {
        let mut registry = VotingRegistry::new(owner(), RegistryPolicy::default());
        let labels: Vec<String> = labels.into_iter().collect();
        let id = registry.create_topic(&owner(), NOW, CreateTopic {
            description: description.clone(),
            end_time: NOW + duration,
            options: labels.clone(),
            token: Address::from_bytes([0xee; 20]),
        }).unwrap();

        let details = registry.get_topic_details(id).unwrap();
        prop_assert_eq!(details.description, description);
        prop_assert_eq!(details.end_time, NOW + duration);
        prop_assert_eq!(details.vote_counts, vec![0u128; labels.len()]);
        prop_assert_eq!(details.options, labels);
    }

    /// Property: One vote per voter
    /// A second vote from the same voter is always AlreadyVoted while voting is open
    #[test]
    fn second_vote_always_rejected(
        id in any::<u8>(),
        first in 0usize..3,
        second in 0usize..3,
        offset in 0u64..3600,
    ) {
        let mut registry = VotingRegistry::new(owner(), RegistryPolicy::default());
        registry.create_topic(&owner(), NOW, request(NOW + 3600, 3)).unwrap();
        let labels = options(3);

        registry.vote(&voter(id), NOW, 0, &labels[first], None).unwrap();
        let result = registry.vote(&voter(id), NOW + offset, 0, &labels[second], None);

        prop_assert_eq!(result, Err(RegistryError::AlreadyVoted { topic_id: 0, voter: voter(id) }));
        prop_assert_eq!(registry.topic(0).unwrap().voters[&voter(id)].option_index, first);
    }

    /// Property: Deadline is absolute
    /// Any vote at or after end_time is VotingEnded, whatever the option says
    #[test]
    fn late_votes_always_rejected(
        id in any::<u8>(),
        option in ".{0,16}",
        late_by in 0u64..1_000_000,
    ) {
        let end = NOW + 3600;
        let mut registry = VotingRegistry::new(owner(), RegistryPolicy::default());
        registry.create_topic(&owner(), NOW, request(end, 2)).unwrap();

        let result = registry.vote(&voter(id), end + late_by, 0, &option, None);

        prop_assert_eq!(result, Err(RegistryError::VotingEnded { topic_id: 0, end_time: end }));
        prop_assert!(!registry.has_voted(0, &voter(id)).unwrap());
    }

    /// Property: Tallies equal summed balances
    /// Each option's final count is the sum of its voters' balances
    #[test]
    fn tallies_sum_voter_balances(
        ballots in prop::collection::btree_map(any::<u8>(), (0usize..3, any::<u64>()), 0..40),
    ) {
        let end = NOW + 3600;
        let mut registry = VotingRegistry::new(owner(), RegistryPolicy::default());
        registry.create_topic(&owner(), NOW, request(end, 3)).unwrap();
        let labels = options(3);

        let mut balances = HashMap::new();
        let mut expected = vec![0u128; 3];
        for (id, (choice, balance)) in &ballots {
            registry.vote(&voter(*id), NOW, 0, &labels[*choice], None).unwrap();
            balances.insert(voter(*id), *balance as u128);
            expected[*choice] += *balance as u128;
        }

        // Votes alone never move the tallies
        for label in &labels {
            prop_assert_eq!(registry.get_votes(0, label).unwrap(), 0);
        }

        let tallies = registry.finalize_votes(&owner(), end, 0, &balances).unwrap();
        prop_assert_eq!(&tallies, &expected);
        for (index, label) in labels.iter().enumerate() {
            prop_assert_eq!(registry.get_votes(0, label).unwrap(), expected[index]);
        }
    }

    /// Property: Vote-time snapshots drive the tally under BalanceAtVote
    #[test]
    fn snapshot_tallies_ignore_later_balances(
        ballots in prop::collection::btree_map(any::<u8>(), (0usize..2, any::<u32>(), any::<u32>()), 1..20),
    ) {
        let end = NOW + 60;
        let policy = RegistryPolicy { weighting: WeightPolicy::BalanceAtVote, ..Default::default() };
        let mut registry = VotingRegistry::new(owner(), policy);
        registry.create_topic(&owner(), NOW, request(end, 2)).unwrap();
        let labels = options(2);

        let mut later = HashMap::new();
        let mut expected = vec![0u128; 2];
        for (id, (choice, at_vote, at_final)) in &ballots {
            registry.vote(&voter(*id), NOW, 0, &labels[*choice], Some(*at_vote as u128)).unwrap();
            later.insert(voter(*id), *at_final as u128);
            expected[*choice] += *at_vote as u128;
        }

        let tallies = registry.finalize_votes(&owner(), end, 0, &later).unwrap();
        prop_assert_eq!(tallies, expected);
    }

    /// Property: Finalize is once-only
    /// The second call fails and leaves counts and events unchanged
    #[test]
    fn finalize_twice_is_rejected(
        ballots in prop::collection::btree_map(any::<u8>(), (0usize..2, any::<u64>()), 0..20),
        extra in 0u64..1_000_000,
    ) {
        let end = NOW + 60;
        let mut registry = VotingRegistry::new(owner(), RegistryPolicy::default());
        let log = EventLog::new();
        registry.subscribe(log.clone());
        registry.create_topic(&owner(), NOW, request(end, 2)).unwrap();
        let labels = options(2);

        let mut balances = HashMap::new();
        for (id, (choice, balance)) in &ballots {
            registry.vote(&voter(*id), NOW, 0, &labels[*choice], None).unwrap();
            balances.insert(voter(*id), *balance as u128);
        }
        registry.finalize_votes(&owner(), end, 0, &balances).unwrap();
        let counts = registry.get_topic_details(0).unwrap().vote_counts;
        let events = log.len();

        let doubled: HashMap<_, _> = balances.iter().map(|(k, v)| (*k, v.saturating_mul(2))).collect();
        let result = registry.finalize_votes(&owner(), end + extra, 0, &doubled);

        prop_assert_eq!(result, Err(RegistryError::AlreadyFinalized(0)));
        prop_assert_eq!(registry.get_topic_details(0).unwrap().vote_counts, counts);
        prop_assert_eq!(log.len(), events);
    }

    /// Property: Rejected calls are side-effect free
    /// A failing vote never changes the snapshot or emits an event
    #[test]
    fn rejected_votes_leave_state_untouched(
        id in any::<u8>(),
        topic_id in 1u64..10,
        option in "[a-z]{1,8}",
    ) {
        let mut registry = VotingRegistry::new(owner(), RegistryPolicy::default());
        let log = EventLog::new();
        registry.subscribe(log.clone());
        registry.create_topic(&owner(), NOW, request(NOW + 60, 2)).unwrap();
        let before = registry.snapshot();
        let events = log.len();

        // Unknown topic, unknown option (labels are capitalised), late vote
        prop_assert!(registry.vote(&voter(id), NOW, topic_id, "Option1", None).is_err());
        prop_assert!(registry.vote(&voter(id), NOW, 0, &option, None).is_err());
        prop_assert!(registry.vote(&voter(id), NOW + 60, 0, "Option1", None).is_err());

        prop_assert_eq!(registry.snapshot(), before);
        prop_assert_eq!(log.len(), events);
    }
}

#[test]
fn voter_map_is_ordered() {
    let mut registry = VotingRegistry::new(owner(), RegistryPolicy::default());
    registry
        .create_topic(&owner(), NOW, request(NOW + 60, 2))
        .unwrap();
    for id in [9u8, 3, 7] {
        registry.vote(&voter(id), NOW, 0, "Option1", None).unwrap();
    }

    let expected: Vec<Address> = BTreeMap::from([(voter(3), ()), (voter(7), ()), (voter(9), ())])
        .into_keys()
        .collect();
    assert_eq!(registry.voters(0).unwrap(), expected);
}
