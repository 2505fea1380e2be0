//! Placeholder resolution: synchronous answers for every cache state.

mod support;

use std::sync::Arc;
use std::time::{Duration, Instant};

use rankstats::domain::format::{format_abbreviated, format_grouped};
use rankstats::domain::{MemberId, Placeholder, Target};
use rankstats::runtime::{GroupStatsCache, PlaceholderCache};
use rankstats::testkit::config;
use rankstats::testkit::wait::eventually;

use support::directory::{vip_in_memory, vip_scripted};

fn caches<D>(directory: Arc<D>) -> (GroupStatsCache, PlaceholderCache)
where
    D: rankstats::port::Directory + 'static,
{
    let stats = GroupStatsCache::new(directory.clone(), &config::stats());
    let placeholders = PlaceholderCache::new(directory, stats.clone(), &config::placeholders());
    (stats, placeholders)
}

#[test]
fn formatting_examples() {
    assert_eq!(format_grouped(999.0), "999");
    assert_eq!(format_abbreviated(1_500.0), "1.5K");
    assert_eq!(format_abbreviated(2_300_000.0), "2.3M");
    assert_eq!(format_abbreviated(4_000_000_000.0), "4.0B");
    assert_eq!(format_grouped(4_000_000_000.0), "4,000,000,000");
}

#[tokio::test]
async fn vip_scenario_formatted_below_thousand() {
    let (stats, placeholders) = caches(vip_in_memory());
    stats.refresh_group("vip").await.unwrap();
    let subject = MemberId::new("dave");

    let formatted = placeholders.resolve_identifier(Some(&subject), "totalmoney_vip_formatted");
    assert_eq!(formatted.as_deref(), Some("400"));

    let canonical = placeholders.resolve_identifier(Some(&subject), "totalBalance_formatted::vip");
    assert_eq!(canonical.as_deref(), Some("400"));
}

#[tokio::test]
async fn first_lookup_is_pending_then_resolves() {
    let directory = vip_scripted();
    directory.hold();
    let (_stats, placeholders) = caches(directory.clone());
    let count = Placeholder::MemberCount(Target::Group("vip".into()));

    assert_eq!(placeholders.resolve(None, &count), "...");
    // Still pending: no value yet, sentinel again.
    assert_eq!(placeholders.resolve(None, &count), "...");

    directory.release();
    let p = placeholders.clone();
    let key = count.clone();
    assert!(eventually(Duration::from_secs(2), || p.peek(None, &key).is_some()).await);
    assert_eq!(placeholders.resolve(None, &count), "3");
    assert_eq!(directory.members_of_calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn resolve_never_blocks_from_plain_threads() {
    let directory = vip_scripted();
    directory.hold();
    let (_stats, placeholders) = caches(directory.clone());

    let worker = {
        let placeholders = placeholders.clone();
        std::thread::spawn(move || {
            let alice = MemberId::new("alice");
            let identifiers = [
                "memberCount::vip",
                "totalBalance::vip",
                "totalBalance_commas::vip",
                "totalBalance_formatted",
                "primaryGroup",
            ];
            let started = Instant::now();
            let values: Vec<String> = identifiers
                .iter()
                .map(|id| placeholders.resolve_identifier(Some(&alice), id).unwrap())
                .collect();
            (started.elapsed(), values)
        })
    };

    let (elapsed, values) = worker.join().unwrap();
    assert!(elapsed < Duration::from_millis(500), "resolve took {elapsed:?}");
    assert_eq!(values[0], "...");
    assert_eq!(values[4], "vip");

    directory.release();
}

#[tokio::test]
async fn own_group_placeholders_follow_subject() {
    let (stats, placeholders) = caches(vip_in_memory());
    stats.refresh_group("vip").await.unwrap();
    stats.refresh_group("default").await.unwrap();

    let alice = MemberId::new("alice");
    let dave = MemberId::new("dave");

    assert_eq!(
        placeholders.resolve_identifier(Some(&alice), "groupsize").as_deref(),
        Some("3")
    );
    assert_eq!(
        placeholders.resolve_identifier(Some(&dave), "groupsize").as_deref(),
        Some("2")
    );
    assert_eq!(
        placeholders.resolve_identifier(Some(&dave), "totalmoney_commas").as_deref(),
        Some("59.5")
    );
    assert_eq!(
        placeholders.resolve_identifier(Some(&dave), "playergroup").as_deref(),
        Some("default")
    );
}

#[tokio::test]
async fn unknown_subject_renders_zero_without_stats() {
    let directory = vip_scripted();
    let (stats, placeholders) = caches(directory.clone());
    let stranger = MemberId::new("stranger");

    assert_eq!(
        placeholders.resolve_identifier(Some(&stranger), "totalmoney").as_deref(),
        Some("0")
    );
    assert_eq!(
        placeholders.resolve_identifier(None, "memberCount").as_deref(),
        Some("0")
    );
    assert!(stats.is_empty());
    assert_eq!(directory.members_of_calls(), 0);
}

#[tokio::test]
async fn group_named_like_a_suffix_is_unambiguous() {
    let directory = rankstats::adapter::InMemoryDirectory::new();
    directory.upsert_member("x", &["formatted"], 2_000.0);
    let (stats, placeholders) = caches(Arc::new(directory));
    stats.refresh_group("formatted").await.unwrap();

    assert_eq!(
        placeholders
            .resolve_identifier(None, "totalBalance_formatted::formatted")
            .as_deref(),
        Some("2.0K")
    );
    assert_eq!(
        placeholders
            .resolve_identifier(None, "totalBalance::formatted")
            .as_deref(),
        Some("2000.0")
    );
}

#[tokio::test]
async fn failed_computation_leaves_no_entry_and_retries() {
    let directory = vip_scripted();
    directory.set_unavailable(true);
    let (stats, placeholders) = caches(directory.clone());
    let total = Placeholder::TotalBalance(Target::Group("vip".into()));

    assert_eq!(placeholders.resolve(None, &total), "...");
    let s = stats.clone();
    assert!(eventually(Duration::from_secs(2), || !s.is_fetching("vip")).await);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(placeholders.peek(None, &total).is_none());

    directory.set_unavailable(false);
    placeholders.resolve(None, &total);
    let p = placeholders.clone();
    let key = total.clone();
    assert!(eventually(Duration::from_secs(2), || p.peek(None, &key).is_some()).await);
    assert_eq!(placeholders.resolve(None, &total), "400.0");
    assert_eq!(directory.members_of_calls(), 2);
}
