use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cowwy::{
    BackgroundRemover, Error, ImageSource, NoProgress, Pipeline, PipelineParams, ResultCache,
    Result, remove_background_file, remove_background_to_png,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

/// Keeps every pixel and counts how often it ran.
#[derive(Default)]
struct CountingRemover {
    calls: AtomicUsize,
}

impl CountingRemover {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BackgroundRemover for CountingRemover {
    fn name(&self) -> &str {
        "counting"
    }

    fn remove(&self, image: &DynamicImage) -> Result<DynamicImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(DynamicImage::ImageRgba8(image.to_rgba8()))
    }
}

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }));
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

fn pipeline_with(params: PipelineParams) -> (Pipeline, Arc<CountingRemover>) {
    let remover = Arc::new(CountingRemover::default());
    let pipeline = Pipeline::new(params, remover.clone(), Arc::new(ResultCache::new())).unwrap();
    (pipeline, remover)
}

#[test]
fn large_jpeg_is_bounded_and_offered_as_png() {
    let (pipeline, remover) = pipeline_with(PipelineParams::default());
    let upload = ImageSource::upload("wide.jpg", encode(3000, 1500, ImageFormat::Jpeg));

    let fixed = pipeline.fix_image(&upload, &mut NoProgress).unwrap();

    let processed = &fixed.result.processed;
    assert_eq!((processed.width(), processed.height()), (2000, 1000));
    assert!(processed.color().has_alpha());
    assert_eq!(
        (fixed.result.original.width(), fixed.result.original.height()),
        (3000, 1500)
    );

    assert_eq!(fixed.download.file_name, "fixed.png");
    assert_eq!(fixed.download.mime_type, "image/png");
    let decoded = image::load_from_memory_with_format(&fixed.download.bytes, ImageFormat::Png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (2000, 1000));
    assert_eq!(remover.calls(), 1);
}

#[test]
fn identical_bytes_hit_the_cache() {
    let (pipeline, remover) = pipeline_with(PipelineParams::default());
    let bytes = encode(64, 48, ImageFormat::Png);

    let first = pipeline
        .fix_image(&ImageSource::upload("a.png", bytes.clone()), &mut NoProgress)
        .unwrap();
    let second = pipeline
        .fix_image(&ImageSource::upload("renamed.png", bytes), &mut NoProgress)
        .unwrap();

    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert!(Arc::ptr_eq(&first.result, &second.result));
    assert_eq!(first.download.bytes, second.download.bytes);
    assert_eq!(remover.calls(), 1);

    let stats = pipeline.cache().stats();
    assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
}

#[test]
fn oversized_upload_never_reaches_the_remover() {
    let (pipeline, remover) = pipeline_with(PipelineParams::default());
    let bytes = vec![0u8; 10 * 1024 * 1024 + 1];

    let err = pipeline
        .fix_image(&ImageSource::upload("huge.png", bytes), &mut NoProgress)
        .unwrap_err();

    assert!(matches!(err, Error::OversizedInput { .. }));
    assert_eq!(
        err.user_message(),
        "The uploaded file is too large. Please upload an image smaller than 10.0MB."
    );
    assert_eq!(remover.calls(), 0);
    assert!(pipeline.cache().is_empty());
}

#[test]
fn corrupt_bytes_are_not_cached() {
    let (pipeline, remover) = pipeline_with(PipelineParams::default());
    let mut bytes = encode(32, 32, ImageFormat::Png);
    bytes.truncate(bytes.len() / 3);

    for _ in 0..2 {
        let err = pipeline
            .fix_image(&ImageSource::upload("broken.png", bytes.clone()), &mut NoProgress)
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    assert!(pipeline.cache().is_empty());
    // Both attempts decoded from scratch
    assert_eq!(pipeline.cache().stats().misses, 2);
    assert_eq!(remover.calls(), 0);
}

#[test]
fn default_image_is_used_when_present() {
    let dir = tempfile::tempdir().unwrap();
    let cow = dir.path().join("cow.jpg");
    std::fs::write(&cow, encode(40, 20, ImageFormat::Jpeg)).unwrap();

    let params = PipelineParams {
        default_images: vec![dir.path().join("missing.jpg"), cow.clone()],
        ..Default::default()
    };
    let (pipeline, _) = pipeline_with(params);

    let source = pipeline.default_source().unwrap();
    assert!(matches!(&source, ImageSource::DefaultPath(path) if *path == cow));
    let fixed = pipeline.fix_image(&source, &mut NoProgress).unwrap();
    assert_eq!(fixed.result.processed.width(), 40);
}

#[test]
fn missing_default_image_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let (pipeline, remover) = pipeline_with(PipelineParams::default());

    let err = pipeline
        .fix_image(&ImageSource::DefaultPath(dir.path().join("cow.jpg")), &mut NoProgress)
        .unwrap_err();

    assert!(matches!(err, Error::MissingDefaultImage { .. }));
    assert_eq!(remover.calls(), 0);
}

#[test]
fn api_writes_png_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.png");
    let output = dir.path().join("out").join("fixed.png");
    std::fs::write(&input, encode(120, 80, ImageFormat::Png)).unwrap();

    let remover = Arc::new(CountingRemover::default());
    let fixed =
        remove_background_file(&input, &output, remover.clone(), &PipelineParams::default()).unwrap();

    assert_eq!(std::fs::read(&output).unwrap(), fixed.download.bytes);
    assert_eq!(remover.calls(), 1);
}

#[test]
fn api_in_memory_respects_max_dimension() {
    let params = PipelineParams {
        max_dimension: 30,
        ..Default::default()
    };
    let fixed = remove_background_to_png(
        encode(90, 60, ImageFormat::Png),
        Arc::new(CountingRemover::default()),
        &params,
    )
    .unwrap();

    let decoded = image::load_from_memory(&fixed.download.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (30, 20));
}
