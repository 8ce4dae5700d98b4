//! Comprehensive error handling and edge case testing
//!
//! This module tests error conditions, edge cases, and boundary conditions
//! that could occur during capture and mask editing operations.

use async_trait::async_trait;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgba, RgbaImage};
use imgly_bgedit::{
    error::{BgEditError, Result},
    CaptureConfig, CaptureProcessor, EditScript, EditSession, EditorConfig, EditorHandle,
    FileImageStore, ImageKey, ImageStore, MemoryImageStore, PrecomputedMaskProvider,
    SegmentationProvider, StrokePoint, ThresholdConfig, UploadLimits,
};
use std::{io::Cursor, sync::Arc};
use tempfile::TempDir;

fn png_upload(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([90, 160, 30, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn opaque_session(width: u32, height: u32) -> Result<EditSession> {
    let image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    let alpha = GrayImage::from_pixel(width, height, Luma([255]));
    EditSession::new(
        image,
        &alpha,
        EditorConfig::builder().brush_radius(4).build()?,
    )
}

fn processor_with(
    provider: Arc<dyn SegmentationProvider>,
    store: Arc<dyn ImageStore>,
) -> Result<CaptureProcessor> {
    CaptureProcessor::new(provider, store, CaptureConfig::default())
}

/// Provider whose backend is never ready
struct OfflineProvider;

#[async_trait]
impl SegmentationProvider for OfflineProvider {
    fn name(&self) -> &str {
        "offline"
    }

    async fn segment(&self, _image: &DynamicImage) -> Result<GrayImage> {
        Err(BgEditError::processing("inference backend crashed"))
    }
}

#[tokio::test]
async fn test_session_without_stored_image() {
    let store = MemoryImageStore::new();
    let result = EditSession::load(&store, EditorConfig::default()).await;
    assert!(matches!(result, Err(BgEditError::MissingInput(_))));

    let temp_dir = TempDir::new().unwrap();
    let store = FileImageStore::new(temp_dir.path().join("never-written"));
    let result = EditSession::load(&store, EditorConfig::default()).await;
    match result {
        Err(BgEditError::MissingInput(message)) => assert!(message.contains("processed_image")),
        other => panic!("expected MissingInput, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_session_with_corrupt_stored_image() -> Result<()> {
    let store = MemoryImageStore::new();
    store
        .put(ImageKey::ProcessedImage, b"not an image".to_vec())
        .await?;

    let result = EditSession::load(&store, EditorConfig::default()).await;
    assert!(matches!(result, Err(BgEditError::Decode(_))));
    Ok(())
}

#[tokio::test]
async fn test_session_with_corrupt_original_fails() -> Result<()> {
    let store = MemoryImageStore::new();
    store.put(ImageKey::ProcessedImage, png_upload(4, 4)).await?;
    store
        .put(ImageKey::OriginalImage, vec![0xFF, 0xD8, 0xFF, 0x00])
        .await?;

    let result = EditSession::load(&store, EditorConfig::default()).await;
    assert!(matches!(result, Err(BgEditError::Decode(_))));
    Ok(())
}

#[tokio::test]
async fn test_capture_rejects_unrecognized_upload() -> Result<()> {
    let store = Arc::new(MemoryImageStore::new());
    let provider = Arc::new(PrecomputedMaskProvider::new(GrayImage::new(4, 4)));
    let processor = processor_with(provider, store.clone())?;

    let result = processor.capture(b"plain text, not pixels").await;
    assert!(matches!(result, Err(BgEditError::UnsupportedFormat(_))));
    assert!(store.get(ImageKey::ProcessedImage).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_capture_rejects_truncated_png() -> Result<()> {
    let mut upload = png_upload(8, 8);
    upload.truncate(24);

    let provider = Arc::new(PrecomputedMaskProvider::new(GrayImage::new(8, 8)));
    let processor = processor_with(provider, Arc::new(MemoryImageStore::new()))?;

    let result = processor.capture(&upload).await;
    assert!(matches!(result, Err(BgEditError::Decode(_))));
    Ok(())
}

#[tokio::test]
async fn test_capture_rejects_oversized_upload() -> Result<()> {
    let upload = png_upload(8, 8);
    let config = CaptureConfig {
        limits: UploadLimits { max_bytes: 16 },
        ..CaptureConfig::default()
    };
    let provider = Arc::new(PrecomputedMaskProvider::new(GrayImage::new(8, 8)));
    let processor = CaptureProcessor::new(provider, Arc::new(MemoryImageStore::new()), config)?;

    match processor.capture(&upload).await {
        Err(BgEditError::InputTooLarge { size, limit }) => {
            assert_eq!(size, upload.len());
            assert_eq!(limit, 16);
        },
        other => panic!("expected InputTooLarge, got {:?}", other.map(|r| r.persisted)),
    }
    Ok(())
}

#[tokio::test]
async fn test_capture_provider_failures() -> Result<()> {
    let store: Arc<dyn ImageStore> = Arc::new(MemoryImageStore::new());

    let processor = processor_with(Arc::new(OfflineProvider), store.clone())?;
    match processor.capture(&png_upload(4, 4)).await {
        Err(BgEditError::ModelUnavailable(message)) => {
            assert!(message.contains("offline"));
            assert!(message.contains("inference backend crashed"));
        },
        other => panic!("expected ModelUnavailable, got {:?}", other.map(|r| r.persisted)),
    }

    let empty = Arc::new(PrecomputedMaskProvider::new(GrayImage::new(0, 0)));
    let result = processor_with(empty, store.clone())?
        .capture(&png_upload(4, 4))
        .await;
    assert!(matches!(result, Err(BgEditError::ModelUnavailable(_))));

    assert!(store.get(ImageKey::ProcessedImage).await?.is_none());
    Ok(())
}

#[test]
fn test_missing_mask_file_is_model_unavailable() {
    let temp_dir = TempDir::new().unwrap();
    let result = PrecomputedMaskProvider::from_file(temp_dir.path().join("mask.png"));
    assert!(matches!(result, Err(BgEditError::ModelUnavailable(_))));
}

#[tokio::test]
async fn test_mismatched_provider_mask_is_resized() -> Result<()> {
    let provider = Arc::new(PrecomputedMaskProvider::new(GrayImage::from_pixel(
        2,
        2,
        Luma([255]),
    )));
    let result = processor_with(provider, Arc::new(MemoryImageStore::new()))?
        .capture(&png_upload(6, 6))
        .await?;

    assert_eq!(result.mask.dimensions(), (6, 6));
    assert!(result.mask.pixels().all(|p| p.0[0] == 255));
    Ok(())
}

#[tokio::test]
async fn test_storage_failures_do_not_fail_capture() -> Result<()> {
    let provider = Arc::new(PrecomputedMaskProvider::new(GrayImage::from_pixel(
        8,
        8,
        Luma([255]),
    )));

    // Quota too small for the processed PNG
    let quota_store = Arc::new(MemoryImageStore::with_quota(8));
    let result = processor_with(provider.clone(), quota_store.clone())?
        .capture(&png_upload(8, 8))
        .await?;
    assert!(!result.persisted);
    assert_eq!(result.processed_image.dimensions(), (8, 8));
    assert_eq!(quota_store.used_bytes()?, 0);

    // Store directory path runs through a regular file
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("blocker");
    std::fs::write(&blocker, b"file")?;
    let file_store = Arc::new(FileImageStore::new(blocker.join("store")));
    let result = processor_with(provider, file_store)?
        .capture(&png_upload(8, 8))
        .await?;
    assert!(!result.persisted);

    Ok(())
}

#[tokio::test]
async fn test_storage_error_reports_key() -> Result<()> {
    let store = MemoryImageStore::with_quota(4);
    match store.put(ImageKey::OriginalImage, vec![0; 5]).await {
        Err(BgEditError::Storage(message)) => assert!(message.contains("original_image")),
        other => panic!("expected Storage error, got {:?}", other),
    }

    // Replacing a key only counts its new size against the quota
    store.put(ImageKey::OriginalImage, vec![0; 4]).await?;
    store.put(ImageKey::OriginalImage, vec![1; 4]).await?;
    assert_eq!(store.used_bytes()?, 4);
    Ok(())
}

#[test]
fn test_handle_before_initialization() {
    let handle = EditorHandle::new();
    assert!(!handle.is_initialized());

    assert!(matches!(
        handle.pointer_down(StrokePoint::new(1.0, 1.0)),
        Err(BgEditError::NotInitialized(_))
    ));
    assert!(matches!(handle.undo(), Err(BgEditError::NotInitialized(_))));
    assert!(matches!(handle.export_png(), Err(BgEditError::NotInitialized(_))));
    assert!(matches!(handle.frame(), Err(BgEditError::NotInitialized(_))));
}

#[tokio::test]
async fn test_handle_initialize_failure_leaves_it_uninitialized() {
    let handle = EditorHandle::new();
    let result = handle
        .initialize(&MemoryImageStore::new(), EditorConfig::default())
        .await;

    assert!(matches!(result, Err(BgEditError::MissingInput(_))));
    assert!(!handle.is_initialized());
}

#[test]
fn test_undo_redo_rejected_mid_stroke() -> Result<()> {
    let mut session = opaque_session(16, 16)?;
    session.on_pointer_down(StrokePoint::new(8.0, 8.0))?;

    assert!(!session.can_undo());
    assert!(matches!(session.undo(), Err(BgEditError::StrokeInProgress(_))));
    assert!(matches!(session.redo(), Err(BgEditError::StrokeInProgress(_))));
    assert!(session.is_stroking());

    assert!(session.on_pointer_up());
    assert!(session.can_undo());
    assert!(session.undo()?);
    Ok(())
}

#[test]
fn test_redundant_pointer_events_are_ignored() -> Result<()> {
    let mut session = opaque_session(16, 16)?;

    // Hover and stray releases leave everything untouched
    session.on_pointer_move(StrokePoint::new(3.0, 3.0))?;
    assert!(!session.on_pointer_up());
    assert!(!session.on_pointer_leave());
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.mask().alpha_at(3, 3), Some(255));

    session.on_pointer_down(StrokePoint::new(3.0, 3.0))?;
    session.on_pointer_down(StrokePoint::new(12.0, 12.0))?;
    session.on_pointer_up();
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.mask().alpha_at(12, 12), Some(255));
    Ok(())
}

#[test]
fn test_strokes_outside_canvas_are_clipped() -> Result<()> {
    let mut session = opaque_session(10, 10)?;

    session.on_pointer_down(StrokePoint::new(-40.0, -40.0))?;
    session.on_pointer_move(StrokePoint::new(-20.0, 500.0))?;
    session.on_pointer_up();
    assert!(session.mask().as_image().pixels().all(|p| p.0[0] == 255));

    // Entering from outside still paints the part inside the grid
    session.on_pointer_down(StrokePoint::new(-5.0, 5.0))?;
    session.on_pointer_move(StrokePoint::new(2.0, 5.0))?;
    session.on_pointer_up();
    assert_eq!(session.mask().alpha_at(0, 5), Some(0));
    assert_eq!(session.mask().alpha_at(9, 5), Some(255));
    Ok(())
}

#[test]
fn test_non_finite_points_are_ignored() -> Result<()> {
    let mut session = opaque_session(10, 10)?;

    session.on_pointer_down(StrokePoint::new(f32::NAN, 2.0))?;
    session.on_pointer_move(StrokePoint::new(5.0, f32::INFINITY))?;
    session.on_pointer_up();

    assert!(session.mask().as_image().pixels().all(|p| p.0[0] == 255));
    assert_eq!(session.history().len(), 2);
    Ok(())
}

#[test]
fn test_invalid_settings_keep_previous_values() -> Result<()> {
    let mut session = opaque_session(8, 8)?;

    for radius in [0, 101, u32::MAX] {
        let error = session.set_brush_radius(radius).unwrap_err();
        assert!(matches!(error, BgEditError::InvalidConfig(_)));
        assert_eq!(session.config().brush_radius, 4);
    }

    session.set_brush_radius(100)?;
    assert_eq!(session.config().brush_radius, 100);
    session.set_brush_radius(1)?;
    assert_eq!(session.config().brush_radius, 1);

    let error = imgly_bgedit::BackgroundSpec::color("#12345").unwrap_err();
    assert!(error.to_string().contains("#12345"));
    Ok(())
}

#[test]
fn test_config_boundaries() {
    assert!(EditorConfig::builder().history_capacity(0).build().is_err());
    assert!(EditorConfig::builder().history_capacity(1).build().is_ok());
    assert!(EditorConfig::builder().thresholds(100, 100).build().is_err());
    assert!(EditorConfig::builder().thresholds(0, 255).build().is_ok());

    let error = ThresholdConfig::new(200, 50).unwrap_err();
    assert!(matches!(error, BgEditError::InvalidConfig(_)));

    let error = EditorConfig::builder().brush_radius(0).build().unwrap_err();
    let message = error.to_string();
    assert!(message.contains("brush radius"));
    assert!(message.contains("1-100"));
}

#[test]
fn test_dimension_mismatch_on_new_session() {
    let image = RgbaImage::new(8, 8);
    let alpha = GrayImage::new(8, 4);
    let result = EditSession::new(image, &alpha, EditorConfig::default());
    assert!(matches!(result, Err(BgEditError::Processing(_))));
}

#[test]
fn test_script_errors() -> Result<()> {
    let result = EditScript::from_json(r#"[{"command": "explode"}]"#);
    assert!(matches!(result, Err(BgEditError::InvalidConfig(_))));

    let result = EditScript::from_json("not json");
    assert!(matches!(result, Err(BgEditError::InvalidConfig(_))));

    let temp_dir = TempDir::new().unwrap();
    let result = EditScript::from_file(temp_dir.path().join("missing.json"));
    assert!(matches!(result, Err(BgEditError::Io(_))));

    // Commands before the failing one stay applied
    let mut session = opaque_session(8, 8)?;
    let script = EditScript::from_json(
        r##"[
            {"command": "stroke", "points": [{"x": 1.0, "y": 1.0}]},
            {"command": "set_brush_radius", "radius": 0},
            {"command": "undo"}
        ]"##,
    )?;
    assert!(matches!(
        script.replay(&mut session),
        Err(BgEditError::InvalidConfig(_))
    ));
    assert_eq!(session.history().len(), 2);
    assert!(session.can_undo());
    Ok(())
}

#[test]
fn test_error_messages_and_recoverability() {
    let error = BgEditError::InputTooLarge { size: 10, limit: 4 };
    assert_eq!(error.to_string(), "Input too large: 10 bytes (limit: 4 bytes)");
    assert!(!error.is_recoverable());

    let error = BgEditError::missing_input("nothing uploaded");
    assert_eq!(error.to_string(), "No image to edit: nothing uploaded");

    assert!(BgEditError::storage("quota").is_recoverable());
    assert!(BgEditError::stroke_in_progress("busy").is_recoverable());
    assert!(!BgEditError::decode("bad").is_recoverable());
}
