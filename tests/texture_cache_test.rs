use flow_model::{
    data_structures::texture::{PixelBuffer, SamplerSettings, WrapMode},
    error::{DecodeError, ResourceLoadError, UploadError},
    resources::texture::TextureCache,
};

use crate::common::test_utils::{MemoryDecoder, RecordingUploader, init_logging};

mod common;

#[test]
fn same_key_is_decoded_and_uploaded_once() {
    init_logging();
    let decoder = MemoryDecoder::with_keys(&["brick.png"]);
    let (uploader, log) = RecordingUploader::new();
    let mut cache = TextureCache::new(uploader, SamplerSettings::default());

    let first = cache.acquire("brick.png", &decoder).unwrap();
    let second = cache.acquire("brick.png", &decoder).unwrap();
    let third = cache.acquire("brick.png", &decoder).unwrap();

    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(decoder.calls("brick.png"), 1);
    assert_eq!(log.borrow().uploads.len(), 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("brick.png"), Some(first));
}

#[test]
fn distinct_keys_get_distinct_handles_in_load_order() {
    let decoder = MemoryDecoder::with_keys(&["a.png", "b.png", "c.png"]);
    let (uploader, _log) = RecordingUploader::new();
    let mut cache = TextureCache::new(uploader, SamplerSettings::default());

    let a = cache.acquire("a.png", &decoder).unwrap();
    let c = cache.acquire("c.png", &decoder).unwrap();
    let b = cache.acquire("b.png", &decoder).unwrap();
    cache.acquire("a.png", &decoder).unwrap();

    assert_ne!(a, b);
    assert_ne!(b, c);
    assert_ne!(a, c);
    let keys: Vec<_> = cache.handles().map(|(key, _)| key).collect();
    assert_eq!(keys, ["a.png", "c.png", "b.png"]);
}

#[test]
fn get_does_not_load() {
    let decoder = MemoryDecoder::with_keys(&["a.png"]);
    let (uploader, log) = RecordingUploader::new();
    let cache = TextureCache::new(uploader, SamplerSettings::default());

    assert_eq!(cache.get("a.png"), None);
    assert!(!cache.contains("a.png"));
    assert_eq!(decoder.total_calls(), 0);
    assert!(log.borrow().uploads.is_empty());
}

#[test]
fn decode_failure_leaves_no_entry() {
    let mut decoder = MemoryDecoder::with_keys(&["ok.png"]);
    decoder.fail_on("bad.png");
    let (uploader, log) = RecordingUploader::new();
    let mut cache = TextureCache::new(uploader, SamplerSettings::default());

    cache.acquire("ok.png", &decoder).unwrap();
    let err = cache.acquire("bad.png", &decoder).unwrap_err();

    assert!(matches!(
        err,
        ResourceLoadError::Decode { ref key, source: DecodeError::Io { .. } } if key == "bad.png"
    ));
    assert!(!cache.contains("bad.png"));
    assert_eq!(cache.len(), 1);
    assert_eq!(log.borrow().uploaded_keys(), ["ok.png"]);
}

#[test]
fn missing_image_is_reported_as_not_found() {
    let decoder = MemoryDecoder::new();
    let (uploader, _log) = RecordingUploader::new();
    let mut cache = TextureCache::new(uploader, SamplerSettings::default());

    let err = cache.acquire("nowhere.png", &decoder).unwrap_err();
    assert!(matches!(
        err,
        ResourceLoadError::Decode { source: DecodeError::NotFound(_), .. }
    ));
}

#[test]
fn upload_failures_are_reported_per_key() {
    let mut decoder = MemoryDecoder::with_keys(&["huge.png"]);
    decoder.insert("empty.png", PixelBuffer::new(0, 4, vec![]));
    decoder.insert("short.png", PixelBuffer::new(2, 2, vec![0; 5]));
    let (uploader, log) = RecordingUploader::new();
    let mut cache = TextureCache::new(uploader.reject("huge.png"), SamplerSettings::default());

    let empty = cache.acquire("empty.png", &decoder).unwrap_err();
    assert!(matches!(
        empty,
        ResourceLoadError::Upload { source: UploadError::InvalidDimensions { width: 0, height: 4, .. }, .. }
    ));

    let short = cache.acquire("short.png", &decoder).unwrap_err();
    assert!(matches!(
        short,
        ResourceLoadError::Upload { source: UploadError::SizeMismatch { expected: 16, actual: 5, .. }, .. }
    ));

    let huge = cache.acquire("huge.png", &decoder).unwrap_err();
    assert!(matches!(
        huge,
        ResourceLoadError::Upload { source: UploadError::Device { .. }, .. }
    ));

    assert!(cache.is_empty());
    assert!(log.borrow().uploads.is_empty());
}

#[test]
fn sampler_settings_reach_the_uploader() {
    let decoder = MemoryDecoder::with_keys(&["a.png"]);
    let (uploader, log) = RecordingUploader::new();
    let mut cache = TextureCache::new(uploader, SamplerSettings::new(WrapMode::Clamp));

    cache.acquire("a.png", &decoder).unwrap();
    assert_eq!(log.borrow().samplers, [SamplerSettings::new(WrapMode::Clamp)]);
    assert_eq!(cache.sampler().wrap, WrapMode::Clamp);
}

#[test]
fn dropping_the_cache_releases_every_handle_once() {
    let decoder = MemoryDecoder::with_keys(&["a.png", "b.png"]);
    let (uploader, log) = RecordingUploader::new();
    let (a, b) = {
        let mut cache = TextureCache::new(uploader, SamplerSettings::default());
        let a = cache.acquire("a.png", &decoder).unwrap();
        let b = cache.acquire("b.png", &decoder).unwrap();
        cache.acquire("a.png", &decoder).unwrap();
        assert!(log.borrow().releases.is_empty());
        (a, b)
    };

    let log = log.borrow();
    assert_eq!(log.releases.len(), 2);
    assert!(log.released_once(a));
    assert!(log.released_once(b));
    assert_eq!(log.live(), 0);
}

#[test]
fn clear_releases_and_allows_reloading() {
    let decoder = MemoryDecoder::with_keys(&["a.png"]);
    let (uploader, log) = RecordingUploader::new();
    let mut cache = TextureCache::new(uploader, SamplerSettings::default());

    let before = cache.acquire("a.png", &decoder).unwrap();
    cache.clear();
    assert!(cache.is_empty());
    assert!(log.borrow().released_once(before));

    let after = cache.acquire("a.png", &decoder).unwrap();
    assert_ne!(before, after);
    assert_eq!(decoder.calls("a.png"), 2);

    drop(cache);
    let log = log.borrow();
    assert!(log.released_once(after));
    assert_eq!(log.live(), 0);
}
