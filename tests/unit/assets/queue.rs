use std::io::Cursor;

use super::*;

fn png_source(rgba: [u8; 4]) -> ImageSource {
    let img = image::RgbaImage::from_raw(2, 2, rgba.repeat(4)).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    ImageSource::from_image_bytes(&buf).unwrap()
}

#[test]
fn request_is_deduplicated_while_in_flight() {
    let cache = ImageCache::new();
    let mut queue = DecodeQueue::new();
    let src = png_source([1, 2, 3, 255]);

    assert!(queue.request(&src, &cache));
    assert!(!queue.request(&src, &cache));
    assert_eq!(queue.pending(), 1);
}

#[test]
fn wait_populates_cache_and_reports_keys() {
    let mut cache = ImageCache::new();
    let mut queue = DecodeQueue::new();
    let a = png_source([255, 0, 0, 255]);
    let b = png_source([0, 255, 0, 255]);

    queue.request(&a, &cache);
    queue.request(&b, &cache);
    let mut done = queue.wait(&mut cache);
    done.sort_by_key(|k| k.as_u64());

    let mut expected = vec![ImageKey::of(&a), ImageKey::of(&b)];
    expected.sort_by_key(|k| k.as_u64());
    assert_eq!(done, expected);
    assert_eq!(queue.pending(), 0);
    assert_eq!(cache.resolve(&a).unwrap().width, 2);

    // Already cached: nothing new to start.
    assert!(!queue.request(&a, &cache));
}

#[test]
fn failed_decode_leaves_image_absent() {
    let mut cache = ImageCache::new();
    let mut queue = DecodeQueue::new();
    let bad = ImageSource::from_uri("data:image/png;base64,AAAA");

    assert!(queue.request(&bad, &cache));
    assert!(queue.wait(&mut cache).is_empty());
    assert!(cache.resolve(&bad).is_none());
    assert_eq!(queue.pending(), 0);
}

#[test]
fn drain_without_requests_is_empty() {
    let mut cache = ImageCache::new();
    let mut queue = DecodeQueue::new();
    assert!(queue.drain(&mut cache).is_empty());
}

#[test]
fn zero_decode_threads_is_rejected() {
    assert!(matches!(
        DecodeQueue::with_threads(0),
        Err(ThumbError::Validation(_))
    ));
}

#[test]
fn many_images_share_a_bounded_pool() {
    let mut cache = ImageCache::new();
    let mut queue = DecodeQueue::with_threads(2).unwrap();
    let sources: Vec<ImageSource> = (0..16u8).map(|i| png_source([i, 0, 0, 255])).collect();

    for src in &sources {
        assert!(queue.request(src, &cache));
    }
    assert_eq!(queue.pending(), 16);
    assert_eq!(queue.pool.as_ref().map(rayon::ThreadPool::current_num_threads), Some(2));

    assert_eq!(queue.wait(&mut cache).len(), 16);
    assert!(sources.iter().all(|s| cache.resolve(s).is_some()));
}
