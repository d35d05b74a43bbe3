use std::fs;
use std::path::Path;

use stormworks_assets::{AssetStore, Error, IngestOptions, Ingestor};
use stormworks_decode::DecodeError;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn part_xml(name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<definition name="{name}" category="1" type="0" mass="2" value="10" mesh_data_name="meshes/{name}.mesh">
    <surfaces>
        <surface orientation="0" shape="1" trans_type="0"/>
    </surfaces>
    <voxels>
        <voxel flags="1"><position x="0" y="0" z="0"/></voxel>
    </voxels>
</definition>"#
    )
}

/// A one-triangle mesh with a single sub-mesh.
fn mesh_bytes() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"mesh");
    out.extend_from_slice(&[0x07, 0x00, 0x01, 0x00]);

    out.extend_from_slice(&3u16.to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    for position in [[1.0f32, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]] {
        for c in position {
            out.extend_from_slice(&c.to_le_bytes());
        }
        out.extend_from_slice(&[255, 255, 255, 255]);
        for c in [0.0f32, 0.0, 1.0] {
            out.extend_from_slice(&c.to_le_bytes());
        }
    }

    out.extend_from_slice(&3u32.to_le_bytes());
    for index in [0u16, 1, 2] {
        out.extend_from_slice(&index.to_le_bytes());
    }

    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&3u32.to_le_bytes());
    out.extend_from_slice(&[0; 2]);
    out.extend_from_slice(&0u16.to_le_bytes());
    for c in [1.0f32, 1.0, 1.0, 0.0, 0.0, 0.0] {
        out.extend_from_slice(&c.to_le_bytes());
    }
    out.extend_from_slice(&[0; 2]);
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(b"id");
    out.extend_from_slice(&[0; 14]);
    out
}

fn write(path: &Path, contents: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[tokio::test]
async fn corrupt_file_does_not_affect_siblings() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.xml");
    let b = dir.path().join("b.xml");
    let c = dir.path().join("c.xml");
    write(&a, part_xml("alpha"));
    write(&b, "<definition name=\"broken\"><surfaces></definition>");
    write(&c, part_xml("gamma"));

    let store = AssetStore::new();
    let reader = store.reader();
    let report = Ingestor::new(store).ingest(&[&a, &b, &c]).await.unwrap();

    let mut names: Vec<_> = reader.parts().iter().map(|p| p.name.clone()).collect();
    names.sort();
    assert_eq!(names, ["alpha", "gamma"]);

    assert_eq!(report.parts, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, b);
    assert!(matches!(
        report.failures[0].error,
        Error::Decode {
            source: DecodeError::MalformedXml { .. },
            ..
        }
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn directory_tree_is_walked_recursively() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("my_mod");
    write(
        &root.join("mod.xml"),
        r#"<mod name="Jets" author="someone" desc="Jet parts"/>"#,
    );
    write(&root.join("definitions/engine.xml"), part_xml("engine"));
    write(&root.join("definitions/deep/wing.xml"), part_xml("wing"));
    write(&root.join("meshes/engine.mesh"), mesh_bytes());
    write(&root.join("meshes/parts/wing.mesh"), mesh_bytes());
    write(&root.join("README.md"), "not an asset");
    write(&root.join("meshes/thumb.png"), [0u8; 4]);

    let store = AssetStore::new();
    let reader = store.reader();
    let ingestor = Ingestor::new(store)
        .with_options(IngestOptions::default().with_max_concurrent_reads(2));
    let report = ingestor.ingest(&[&root]).await.unwrap();

    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.parts, 2);
    assert_eq!(report.meshes, 2);
    assert_eq!(report.mods, 1);
    assert_eq!(report.committed(), 5);
    assert_eq!(report.skipped.len(), 2);

    assert_eq!(reader.mesh_keys(), ["meshes/engine.mesh", "meshes/parts/wing.mesh"]);
    assert_eq!(reader.mod_info().unwrap().description, "Jet parts");

    let mesh = reader.resolve_mesh("meshes/engine.mesh").unwrap();
    assert_eq!(mesh.triangles.len(), 1);
    assert_eq!(mesh.vertices[0].position, [-1.0, 0.0, 0.0]);
    assert!(reader.resolve_mesh("parts/wing.mesh").is_some());
}

#[tokio::test]
async fn mesh_keys_are_relative_to_common_root() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let meshes = dir.path().join("mod/meshes");
    let definitions = dir.path().join("mod/definitions");
    write(&meshes.join("hull.mesh"), mesh_bytes());
    write(&definitions.join("hull.xml"), part_xml("hull"));

    let store = AssetStore::new();
    let reader = store.reader();
    Ingestor::new(store)
        .ingest(&[&meshes, &definitions])
        .await
        .unwrap();

    assert_eq!(reader.mesh_keys(), ["meshes/hull.mesh"]);
    let part = &reader.parts()[0];
    assert!(reader.resolve_mesh(&part.mesh_data_name).is_some());
}

#[tokio::test]
async fn new_ingestion_replaces_previous_batch() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    write(&first.join("old.xml"), part_xml("old"));
    write(&first.join("old.mesh"), mesh_bytes());
    write(&first.join("mod.xml"), r#"<mod name="Kept"/>"#);
    write(&second.join("new.xml"), part_xml("new"));

    let store = AssetStore::new();
    let reader = store.reader();
    let ingestor = Ingestor::new(store);

    let first_report = ingestor.ingest(&[&first]).await.unwrap();
    assert_eq!(first_report.committed(), 3);

    let second_report = ingestor.ingest(&[&second]).await.unwrap();
    assert!(second_report.batch > first_report.batch);

    let parts = reader.parts();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].name, "new");
    assert!(reader.mesh_keys().is_empty());
    assert_eq!(reader.mod_info().unwrap().name, "Kept");
}

#[tokio::test]
async fn superseded_batch_results_are_discarded() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    for i in 0..4 {
        write(&first.join(format!("old{i}.xml")), part_xml(&format!("old{i}")));
    }
    write(&second.join("new.xml"), part_xml("new"));

    let store = AssetStore::new();
    let reader = store.reader();
    let ingestor = Ingestor::new(store);

    let (first_paths, second_paths) = ([&first], [&second]);
    let (a, b) = tokio::join!(
        ingestor.ingest(&first_paths),
        ingestor.ingest(&second_paths)
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    // Both batches start before either commits, so only the later one lands.
    let (winner, loser) = if a.batch > b.batch { (a, b) } else { (b, a) };
    assert_eq!(reader.current_batch(), winner.batch);
    assert_eq!(loser.committed(), 0);
    assert!(loser.discarded > 0);
    assert!(loser.failures.is_empty());
    assert_eq!(winner.discarded, 0);
    assert!(winner.parts > 0);
    assert_eq!(reader.parts().len(), winner.parts);
}

#[tokio::test]
async fn missing_paths_and_voxel_diagnostics_are_reported() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let part = dir.path().join("bad_voxel.xml");
    write(
        &part,
        r#"<definition name="p"><voxels>
            <voxel flags="1"/>
            <voxel flags="oops"/>
        </voxels></definition>"#,
    );
    let missing = dir.path().join("does_not_exist");

    let store = AssetStore::new();
    let reader = store.reader();
    let report = Ingestor::new(store).ingest(&[&part, &missing]).await.unwrap();

    assert_eq!(report.parts, 1);
    assert_eq!(reader.parts()[0].voxels.len(), 2);

    assert_eq!(report.voxel_diagnostics.len(), 1);
    assert_eq!(report.voxel_diagnostics[0].path, part);
    assert_eq!(report.voxel_diagnostics[0].diagnostic.index, 1);

    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0].error, Error::Io { ref path, .. } if *path == missing));
}

#[cfg(unix)]
#[tokio::test]
async fn symlinks_follow_option() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("mod");
    let outside = dir.path().join("outside");
    write(&root.join("a.xml"), part_xml("a"));
    write(&outside.join("b.xml"), part_xml("b"));
    std::os::unix::fs::symlink(&outside, root.join("linked")).unwrap();
    std::os::unix::fs::symlink(&root, root.join("loop")).unwrap();

    let store = AssetStore::new();
    let reader = store.reader();
    let ingestor = Ingestor::new(store);

    let report = ingestor.ingest(&[&root]).await.unwrap();
    assert_eq!(report.parts, 2);
    assert!(report.failures.is_empty(), "{:?}", report.failures);

    let ingestor = ingestor.with_options(IngestOptions::default().with_follow_symlinks(false));
    let report = ingestor.ingest(&[&root]).await.unwrap();
    assert_eq!(report.parts, 1);
    assert_eq!(reader.parts()[0].name, "a");
}
