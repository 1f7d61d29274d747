use crate::memory::{AddressRange, MemoryFlags};
use crate::project::{Project, Settings, TraceConfig};
use crate::session::TraceManager;
use crate::trace::Trace;
use std::sync::Arc;

fn trace_with_regions(name: &str, count: u64) -> Arc<Trace> {
    let trace = Arc::new(Trace::new(name));
    let mut tx = trace.start_transaction("Populate");

    for i in 0..count {
        let base = 0x10000 * (i + 1);

        tx.create_region(
            &format!("Memory[/bin/{} {:#x}]", name, base),
            AddressRange::new(base, base + 0xffff).unwrap(),
            0,
            MemoryFlags::READ,
        )
        .unwrap();
    }

    tx.commit().unwrap();
    trace
}

#[test]
fn activation_drives_the_view() {
    let mut manager = TraceManager::new(&Settings::default());
    let echo = manager.open_trace(trace_with_regions("echo", 2));
    let ls = manager.open_trace(trace_with_regions("ls", 3));

    assert!(manager.regions().rows().is_empty());

    assert!(manager.activate("echo", 0));
    assert_eq!(manager.regions().rows().len(), 2);
    assert_eq!(manager.current_trace().unwrap().id(), echo.id());

    assert!(manager.activate("ls", 0));
    assert_eq!(manager.regions().rows().len(), 3);
    assert_eq!(manager.current_trace().unwrap().id(), ls.id());

    manager.activate_snap(-1);
    assert_eq!(manager.current_snap(), Some(-1));
    assert!(manager.regions().rows().is_empty());

    assert!(!manager.activate("cat", 0));
    assert_eq!(manager.current_trace().unwrap().id(), ls.id());
}

#[test]
fn deactivation_and_close() {
    let mut manager = TraceManager::new(&Settings::default());
    manager.open_trace(trace_with_regions("echo", 2));
    manager.open_trace(trace_with_regions("ls", 1));

    manager.activate("echo", 0);
    manager.deactivate();
    assert!(manager.regions().rows().is_empty());
    assert!(manager.current_trace().is_none());

    manager.activate("echo", 0);
    manager.close_trace("ls");
    assert_eq!(manager.regions().rows().len(), 2);

    assert!(manager.close_trace("echo").is_some());
    assert!(manager.regions().rows().is_empty());
    assert!(manager.current_trace().is_none());
    assert!(manager.close_trace("echo").is_none());
}

#[test]
fn reopening_keeps_the_first_trace() {
    let mut manager = TraceManager::new(&Settings::default());
    let first = manager.open_trace(trace_with_regions("echo", 1));
    let second = manager.open_trace(trace_with_regions("echo", 2));

    assert_eq!(first.id(), second.id());
    assert_eq!(manager.iter_traces().count(), 1);
}

#[test]
fn project_traces_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracemap.json");
    let mut project = Project::new();

    project.add_trace("echo", TraceConfig::new("echo.db", 0));
    project.write(&path).unwrap();

    let project = Project::read(&path).unwrap();
    let mut manager = TraceManager::new(project.settings());
    let trace = manager.open_from_project(&project, "echo").unwrap();

    trace
        .transaction("Create", |tx| {
            tx.create_region(
                "Memory[/bin/echo 0x55550000]",
                AddressRange::new(0x55550000, 0x5555ffff).unwrap(),
                0,
                MemoryFlags::READ,
            )
        })
        .unwrap();
    manager.save_trace(&project, "echo").unwrap();

    let mut fresh = TraceManager::new(project.settings());
    let reloaded = fresh.open_from_project(&project, "echo").unwrap();

    assert_eq!(reloaded.query(0).len(), 1);
    assert!(fresh.open_from_project(&project, "ls").is_err());
}
