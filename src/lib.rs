#![doc = r#"
COWWY: strip the background from a photo and save the cut-out as PNG.

This crate provides the upload → validate → resize → remove → cache pipeline
behind the Cowwy background remover window, and can be embedded in your own
Rust applications. Segmentation is delegated to a [`BackgroundRemover`]
implementation; the bundled one runs a U2-Net ONNX model through ONNX Runtime.

Requirements
------------
- A U2-Net model exported to ONNX (`u2net.onnx`), by default at
  `models/u2net.onnx`, for the `onnx` feature.
- Rust 2024 edition toolchain.

Add dependency
--------------
```toml
[dependencies]
cowwy = { version = "0.1", features = ["onnx"] }
```

Quick start: remove a background file-to-file
---------------------------------------------
```rust,no_run
use std::path::Path;
use std::sync::Arc;
use cowwy::{remove_background_file, PipelineParams, U2NetRemover};

fn main() -> cowwy::Result<()> {
    let params = PipelineParams::default();
    let remover = Arc::new(U2NetRemover::load(&params.model_path)?);

    let fixed = remove_background_file(
        Path::new("cow.jpg"),
        Path::new("fixed.png"),
        remover,
        &params,
    )?;
    println!("done in {:.2?}", fixed.elapsed);
    Ok(())
}
```

Long-lived pipeline with a shared cache
---------------------------------------
```rust,no_run
use std::sync::Arc;
use cowwy::{ImageSource, NoProgress, Pipeline, PipelineParams, ResultCache, U2NetRemover};

fn main() -> cowwy::Result<()> {
    let params = PipelineParams::default();
    let remover = Arc::new(U2NetRemover::load(&params.model_path)?);
    let pipeline = Pipeline::new(params, remover, Arc::new(ResultCache::new()))?;

    let bytes = std::fs::read("cow.jpg")?;
    let first = pipeline.fix_image(&ImageSource::upload("cow.jpg", bytes.clone()), &mut NoProgress)?;
    // Same bytes: served from the cache, the model is not run again
    let again = pipeline.fix_image(&ImageSource::upload("copy.jpg", bytes), &mut NoProgress)?;
    assert!(again.from_cache);
    assert_eq!(first.download.bytes, again.download.bytes);
    Ok(())
}
```

Custom removers
---------------
Anything implementing [`BackgroundRemover`] can be injected, which is how the
tests run the pipeline without a model:

```rust
use cowwy::{BackgroundRemover, Result};
use image::DynamicImage;

struct Opaque;

impl BackgroundRemover for Opaque {
    fn name(&self) -> &str {
        "opaque"
    }

    fn remove(&self, image: &DynamicImage) -> Result<DynamicImage> {
        Ok(DynamicImage::ImageRgba8(image.to_rgba8()))
    }
}
```

Error handling
--------------
All public functions return `cowwy::Result<T>`. `Display` on [`Error`] carries
the technical detail meant for logs; [`Error::user_message`] gives the text to
show an end user.

```rust
use cowwy::Error;

let err = Error::OversizedInput { size: 10 * 1024 * 1024 + 1, max: 10 * 1024 * 1024 };
assert_eq!(
    err.user_message(),
    "The uploaded file is too large. Please upload an image smaller than 10.0MB."
);
```

Feature flags
-------------
- `onnx`: the ONNX Runtime backed [`U2NetRemover`].
- `gui`: the eframe window (`cowwyUI` binary); implies `onnx`.
- `full`: everything.

Useful modules
--------------
- [`api`]: one-call entry points.
- [`core`]: upload guard, decoder, resizer, result cache, and the `Pipeline`.
- [`remover`]: the `BackgroundRemover` trait, mask helpers, U2-Net backend.
- [`io`]: input resolution and the PNG writer.
- [`types`]: `ImageSource`, `ProcessingResult`, `FixedImage`, `Stage`.
- [`error`]: crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod remover;
pub mod types;

// GUI module (only available with gui feature)
#[cfg(feature = "gui")]
pub mod gui;

// Curated public API surface
// Types
pub use core::params::PipelineParams;
pub use error::{Error, Result};
pub use types::{
    DownloadArtifact, FixedImage, ImageSource, NoProgress, ProcessingResult, ProgressSink, Stage,
};

// Pipeline pieces
pub use core::processing::cache::{CacheKey, CacheStats, ResultCache};
pub use core::processing::pipeline::Pipeline;
pub use core::processing::resize::{calculate_resize_dimensions, resize_to_bound, resize_within_bound};

// Removers
pub use remover::BackgroundRemover;
#[cfg(feature = "onnx")]
pub use remover::U2NetRemover;

// High-level API re-exports
pub use api::{remove_background_file, remove_background_to_png};
