use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use reelsmith_assets::{AssetResolver, Fetcher, JobWorkspace, LocalObjectStore, ObjectStore};
use reelsmith_common::{AssetConfig, ReelError, UsageMetrics};
use reelsmith_timeline::{AudioClip, AudioKind, Resolution, Timeline, VideoClip};

fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.resize(4096, 0);
    bytes
}

fn resolver(store_root: &std::path::Path) -> AssetResolver {
    let store: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(store_root, None));
    let fetcher = Fetcher::new(&AssetConfig::default(), Arc::new(UsageMetrics::new()))
        .unwrap()
        .with_store(Some(store));
    AssetResolver::new(fetcher)
}

#[tokio::test]
async fn corrupt_and_missing_assets_drop_only_their_clips() {
    let dir = tempfile::tempdir().unwrap();
    let media = dir.path().join("media");
    let store = dir.path().join("store");
    std::fs::create_dir_all(&media).unwrap();
    std::fs::create_dir_all(&store).unwrap();

    std::fs::write(media.join("good.png"), png_bytes()).unwrap();
    std::fs::write(media.join("tiny.png"), b"\x89PNG").unwrap();
    std::fs::write(store.join("keyed.png"), png_bytes()).unwrap();
    std::fs::write(media.join("n.mp3"), b"ID3-narration").unwrap();

    let mut timeline = Timeline::new(Resolution::FULL_HD, 24, 12.0);
    let video = &mut timeline.tracks.video;
    video.push(VideoClip::new("v0", media.join("good.png").to_string_lossy(), 0.0, 3.0));
    video.push(VideoClip::new("v1", media.join("tiny.png").to_string_lossy(), 3.0, 3.0));
    video.push(VideoClip::new("v2", "/objects/keyed.png", 6.0, 3.0));
    video.push(VideoClip::new("v3", "relative/nowhere.png", 9.0, 3.0));
    timeline.tracks.audio.push(AudioClip::new(
        "a0",
        media.join("n.mp3").to_string_lossy(),
        AudioKind::Narration,
        0.0,
        3.0,
    ));
    timeline.tracks.audio.push(AudioClip::new(
        "a1",
        media.join("missing.mp3").to_string_lossy(),
        AudioKind::Narration,
        3.0,
        3.0,
    ));

    let workspace = JobWorkspace::with_id(dir.path().join("jobs"), "job-a").unwrap();
    let calls = AtomicUsize::new(0);
    let resolver = resolver(&store);
    let resolved = resolver
        .resolve(&timeline, &workspace, &|done: usize, total: usize| {
            assert!(done <= total);
            calls.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();

    let video_ids: Vec<&str> = resolved.video.iter().map(|v| v.clip.id.as_str()).collect();
    assert_eq!(video_ids, vec!["v0", "v2"]);
    assert_eq!(resolved.audio.len(), 1);
    assert_eq!(resolved.failures.len(), 3);
    assert!(resolved
        .failures
        .iter()
        .any(|f| f.clip_id == "v1" && matches!(f.error, ReelError::CorruptAsset { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 6);
    assert!(resolved.path_for("v0").unwrap().starts_with(workspace.root()));
    assert_eq!(resolver.fetcher().metrics().snapshot().assets_rejected, 1);

    assert!(workspace.cleanup());
    assert!(!workspace.root().exists());
}

#[tokio::test]
async fn no_surviving_video_is_no_renderable_content() {
    let dir = tempfile::tempdir().unwrap();
    let mut timeline = Timeline::new(Resolution::FULL_HD, 24, 2.0);
    timeline
        .tracks
        .video
        .push(VideoClip::new("v0", "/definitely/missing.png", 0.0, 2.0));

    let workspace = JobWorkspace::create(dir.path()).unwrap();
    let err = resolver(dir.path())
        .resolve(&timeline, &workspace, &|_: usize, _: usize| {})
        .await
        .unwrap_err();
    assert!(matches!(err, ReelError::NoRenderableContent));
}
