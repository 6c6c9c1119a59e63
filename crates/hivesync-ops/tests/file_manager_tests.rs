//! Facade behavior: preconditions, validation, planning and concurrency.

mod common;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Barrier;

use hivesync_core::{
    ErrorKind, FileConfig, FileError, NetworkStatus, OperationRequest, PermissionLevel,
    VersionSelector,
};
use hivesync_ops::{FileManager, HandleState};

use common::{Hook, RecordingBuilder, add_label, finish, scenario_tree, wait_started};

fn manager_with(
    config: FileConfig,
    builder: &Arc<RecordingBuilder>,
    status: &Arc<NetworkStatus>,
) -> FileManager {
    FileManager::new(config, builder.clone(), status.clone()).unwrap()
}

fn online_manager(root: &std::path::Path, builder: &Arc<RecordingBuilder>) -> FileManager {
    manager_with(
        FileConfig::new(root),
        builder,
        &Arc::new(NetworkStatus::online()),
    )
}

#[tokio::test]
async fn test_no_session_rejects_every_request() {
    let (temp, root) = scenario_tree();
    let builder = Arc::new(RecordingBuilder::new());
    let status = Arc::new(NetworkStatus::online());
    status.set_session(false);
    let manager = manager_with(FileConfig::new(temp.path()), &builder, &status);

    let results = [
        manager.add(&root).map(|_| ()),
        manager.update(root.join("b")).map(|_| ()),
        manager.move_to(root.join("b"), root.join("e")).map(|_| ()),
        manager.delete(&root).map(|_| ()),
        manager.recover(root.join("b"), VersionSelector::Previous(1)).map(|_| ()),
        manager.share(&root, "bob", PermissionLevel::Read).map(|_| ()),
    ];

    for result in results {
        assert!(matches!(result, Err(FileError::NoSession)));
    }
    assert_eq!(manager.registry().in_flight_count(), 0);
    assert!(builder.requests().is_empty());
}

#[tokio::test]
async fn test_precondition_order_and_list_exemption() {
    let (temp, root) = scenario_tree();
    let builder = Arc::new(RecordingBuilder::new());
    let status = Arc::new(NetworkStatus::online());
    let manager = manager_with(FileConfig::new(temp.path()), &builder, &status);

    status.set_peer_connected(false);
    assert_eq!(
        manager.add(&root).unwrap_err().kind(),
        ErrorKind::NoPeerConnection
    );

    // Listing only needs the network, not a session or peer.
    status.set_session(false);
    let list = manager.list_files().unwrap();
    finish(&list).await;

    status.set_reachable(false);
    assert_eq!(manager.list_files().unwrap_err().kind(), ErrorKind::NoNetwork);
}

#[tokio::test]
async fn test_single_file_and_empty_dir_use_builder_directly() {
    let (temp, root) = scenario_tree();
    let empty = temp.path().join("empty");
    fs::create_dir(&empty).unwrap();

    let builder = Arc::new(RecordingBuilder::new());
    let manager = online_manager(temp.path(), &builder);

    let file = manager.add(root.join("b")).unwrap();
    let dir = manager.delete(&empty).unwrap();
    assert_eq!(file.progress().total, 1);
    assert_eq!(dir.progress().total, 1);

    finish(&file).await;
    finish(&dir).await;
    assert_eq!(
        builder.requests(),
        vec![
            OperationRequest::add(root.join("b")),
            OperationRequest::delete(&empty),
        ]
    );
}

#[tokio::test]
async fn test_add_directory_builds_one_leaf_per_path() {
    let (temp, root) = scenario_tree();
    let builder = Arc::new(RecordingBuilder::new());
    let manager = online_manager(temp.path(), &builder);

    let handle = manager.add(&root).unwrap();
    assert_eq!(handle.progress().total, 4);
    assert_eq!(finish(&handle).await, HandleState::Completed(()));

    let built: Vec<PathBuf> = builder
        .requests()
        .iter()
        .filter_map(|request| request.path().map(PathBuf::from))
        .collect();
    assert_eq!(
        built,
        vec![root.clone(), root.join("b"), root.join("c"), root.join("c/d")]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_disjoint_subtrees_run_concurrently() {
    let temp = tempfile::TempDir::new().unwrap();
    let left = temp.path().join("left.txt");
    let right = temp.path().join("right.txt");
    fs::write(&left, "l").unwrap();
    fs::write(&right, "r").unwrap();

    // Each leaf blocks until the other one is running too.
    let barrier = Arc::new(Barrier::new(2));
    let builder = Arc::new(RecordingBuilder::new());
    builder.hook(&left, Hook::Barrier(Arc::clone(&barrier)));
    builder.hook(&right, Hook::Barrier(barrier));
    let manager = online_manager(temp.path(), &builder);

    let first = manager.add(&left).unwrap();
    let second = manager.add(&right).unwrap();
    assert_eq!(first.state(), HandleState::Running);
    assert_eq!(second.state(), HandleState::Running);

    assert_eq!(finish(&first).await, HandleState::Completed(()));
    assert_eq!(finish(&second).await, HandleState::Completed(()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_list_completes_while_add_is_running() {
    let (temp, root) = scenario_tree();
    let builder = Arc::new(RecordingBuilder::with_files(vec![PathBuf::from("docs/a.txt")]));
    let gate = builder.gate(&root);
    let manager = online_manager(temp.path(), &builder);

    let add = manager.add(&root).unwrap();
    wait_started(&builder.log, &add_label(&root)).await;

    let list = manager.list_files().unwrap();
    let files = tokio::time::timeout(common::TIMEOUT, list.result())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(files, vec![PathBuf::from("docs/a.txt")]);
    assert_eq!(add.state(), HandleState::Running);

    gate.notify_one();
    assert_eq!(finish(&add).await, HandleState::Completed(()));
}

#[tokio::test]
async fn test_local_validation_errors() {
    let (temp, root) = scenario_tree();
    let builder = Arc::new(RecordingBuilder::new());
    let manager = online_manager(temp.path(), &builder);

    let kind = |result: Result<hivesync_ops::OperationHandle, FileError>| {
        result.map(|_| ()).unwrap_err().kind()
    };

    assert_eq!(kind(manager.update(&root)), ErrorKind::InvalidArgument);
    assert_eq!(
        kind(manager.move_to(&root, &root)),
        ErrorKind::InvalidArgument
    );
    assert_eq!(
        kind(manager.move_to(&root, root.join("c/moved"))),
        ErrorKind::InvalidArgument
    );
    assert_eq!(
        kind(manager.recover(root.join("b"), VersionSelector::Previous(0))),
        ErrorKind::InvalidArgument
    );
    assert_eq!(
        kind(manager.share(root.join("c"), "  ", PermissionLevel::Write)),
        ErrorKind::InvalidArgument
    );

    assert!(builder.requests().is_empty());
    assert_eq!(manager.registry().in_flight_count(), 0);
}

#[tokio::test]
async fn test_share_requires_folder_below_root() {
    let (temp, root) = scenario_tree();
    let outside = tempfile::TempDir::new().unwrap();
    let builder = Arc::new(RecordingBuilder::new());
    let manager = online_manager(temp.path(), &builder);

    let invalid = [
        manager.share(temp.path(), "bob", PermissionLevel::Read),
        manager.share(root.join("b"), "bob", PermissionLevel::Read),
        manager.share(root.join("missing"), "bob", PermissionLevel::Read),
        manager.share(outside.path(), "bob", PermissionLevel::Read),
    ];
    for result in invalid {
        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidLocation);
    }

    let handle = manager.share(&root, "bob", PermissionLevel::Write).unwrap();
    assert_eq!(finish(&handle).await, HandleState::Completed(()));
    assert!(matches!(
        builder.requests().as_slice(),
        [OperationRequest::Share { grant, .. }] if grant.grantee == "bob"
    ));
}

#[tokio::test]
async fn test_share_resolves_parent_components() {
    let (temp, root) = scenario_tree();
    let outside = tempfile::TempDir::new().unwrap();
    let builder = Arc::new(RecordingBuilder::new());
    let manager = online_manager(temp.path(), &builder);

    // <root>/a/../.. climbs out of the managed root into a sibling directory.
    let escaping = root
        .join("..")
        .join("..")
        .join(outside.path().file_name().unwrap());
    assert!(escaping.is_dir());
    assert_eq!(
        manager
            .share(&escaping, "bob", PermissionLevel::Write)
            .unwrap_err()
            .kind(),
        ErrorKind::InvalidLocation
    );
    assert_eq!(
        manager
            .share(root.join(".."), "bob", PermissionLevel::Write)
            .unwrap_err()
            .kind(),
        ErrorKind::InvalidLocation
    );

    // Staying inside the root through `..` is fine.
    let handle = manager
        .share(root.join("c").join(".."), "bob", PermissionLevel::Read)
        .unwrap();
    finish(&handle).await;
    assert_eq!(builder.requests().len(), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn test_share_rejects_symlink_leaving_root() {
    let (temp, root) = scenario_tree();
    let outside = tempfile::TempDir::new().unwrap();
    let link = root.join("elsewhere");
    std::os::unix::fs::symlink(outside.path(), &link).unwrap();

    let builder = Arc::new(RecordingBuilder::new());
    let manager = online_manager(temp.path(), &builder);

    let err = manager
        .share(&link, "bob", PermissionLevel::Read)
        .unwrap_err();
    assert!(matches!(err, FileError::InvalidLocation { path } if path == link));
    assert!(builder.requests().is_empty());
}

#[tokio::test]
async fn test_move_and_recover_are_single_requests() {
    let (temp, root) = scenario_tree();
    let builder = Arc::new(RecordingBuilder::new());
    let manager = online_manager(temp.path(), &builder);

    let moved = manager.move_to(&root, temp.path().join("z")).unwrap();
    let recovered = manager
        .recover(root.join("b"), VersionSelector::Index(3))
        .unwrap();
    assert_eq!(moved.progress().total, 1);
    assert_eq!(recovered.progress().total, 1);

    finish(&moved).await;
    finish(&recovered).await;
    assert_eq!(builder.requests().len(), 2);
    assert_eq!(manager.config().root, temp.path());
}
