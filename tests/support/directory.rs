use std::sync::Arc;

use rankstats::adapter::InMemoryDirectory;
use rankstats::testkit::ScriptedDirectory;

/// Group "vip" with balances {100.0, 250.5, 49.5}, plus one "default" member.
pub fn vip_scripted() -> Arc<ScriptedDirectory> {
    Arc::new(
        ScriptedDirectory::new()
            .with_member("alice", &["vip"], 100.0)
            .with_member("bob", &["vip"], 250.5)
            .with_member("carol", &["vip", "default"], 49.5)
            .with_member("dave", &["default"], 10.0),
    )
}

/// Same population as [`vip_scripted`] behind the in-memory adapter.
pub fn vip_in_memory() -> Arc<InMemoryDirectory> {
    let directory = InMemoryDirectory::new();
    directory.upsert_member("alice", &["vip"], 100.0);
    directory.upsert_member("bob", &["vip"], 250.5);
    directory.upsert_member("carol", &["vip", "default"], 49.5);
    directory.upsert_member("dave", &["default"], 10.0);
    Arc::new(directory)
}
