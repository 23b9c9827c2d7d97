//! Startup preload of every marker icon.
//!
//! The [`Preloader`] runs once and always finishes with a complete
//! [`IconCache`]. It moves through three phases:
//!
//! 1. [`PreloadPhase::Base`]: load the background and direction images. A
//!    background that fails to load or compose is replaced by a blank
//!    placeholder; a direction image that fails is replaced by the
//!    background.
//! 2. [`PreloadPhase::Icons`]: for every category and status color, load the
//!    category icon and compose it over the background in that color. All
//!    pairs run concurrently. A pair whose icon fails to load or compose gets
//!    the background alone instead.
//! 3. [`PreloadPhase::Complete`]: the cache is handed to the caller.
//!
//! Individual failures are logged and never surface to the caller.
//!
//! # Example
//!
//! ```no_run
//! use marker_icons::{
//!     AssetLoader, AssetManifest, ColorKey, Compositor, CompositorOptions, IconCategory, Palette,
//!     Preloader,
//! };
//!
//! # async fn run() -> Result<(), marker_icons::LoadError> {
//! let pixel_ratio = 2.0;
//! let loader = AssetLoader::new(pixel_ratio)?;
//! let compositor = Compositor::new(CompositorOptions {
//!     pixel_ratio,
//!     ..Default::default()
//! });
//! let manifest = AssetManifest::from_dir("resources/images");
//! let cache = Preloader::new(loader, manifest)
//!     .with_palette(Palette::light())
//!     .with_compositor(compositor)
//!     .run()
//!     .await;
//!
//! assert!(cache.get(IconCategory::Car, ColorKey::Error).is_some());
//! # Ok(())
//! # }
//! ```

use std::time::Instant;

use futures_util::future::{join, join_all};
use palette::Srgb;
use thiserror::Error;

use crate::bitmap::{Bitmap, SizePx};
use crate::cache::{ComposedIcon, IconCache, IconCacheBuilder, IconKey};
use crate::compositor::Compositor;
use crate::error::{CompositionError, LoadError};
use crate::loader::ImageLoader;
use crate::manifest::AssetManifest;
use crate::theme::{Color, Palette, to_rgba};

/// Default logical side length of the placeholder background.
pub const DEFAULT_PLACEHOLDER_SIZE: u32 = 32;

// ============================================================================
// Placeholder
// ============================================================================

/// The blank bitmap substituted for a background that cannot be used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placeholder {
    /// Logical side length.
    pub size: u32,
    pub fill: Color,
}

impl Default for Placeholder {
    fn default() -> Self {
        Self {
            size: DEFAULT_PLACEHOLDER_SIZE,
            fill: Srgb::new(255, 255, 255),
        }
    }
}

impl Placeholder {
    /// Renders the placeholder at `scale`.
    pub fn bitmap(&self, scale: f32) -> Bitmap {
        Bitmap::solid(SizePx::square(self.size.max(1)), scale, to_rgba(self.fill))
    }
}

// ============================================================================
// Preloader
// ============================================================================

/// Where a preload currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloadPhase {
    Base,
    Icons,
    Complete,
}

/// Why an asset could not be used.
#[derive(Debug, Error)]
enum AssetFailure {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Composition(#[from] CompositionError),
}

/// Base bitmaps produced by the first phase.
struct BaseImages {
    /// Background every marker is composed over. Always composable unless
    /// the compositor options themselves are unusable.
    source: Bitmap,
    /// The background alone at output size.
    background: Bitmap,
    direction: Bitmap,
}

/// Builds an [`IconCache`] from an asset manifest.
pub struct Preloader<L> {
    loader: L,
    manifest: AssetManifest,
    palette: Palette,
    compositor: Compositor,
    placeholder: Placeholder,
}

impl<L: ImageLoader> Preloader<L> {
    /// Creates a preloader with the default palette, compositor options,
    /// and placeholder.
    pub fn new(loader: L, manifest: AssetManifest) -> Self {
        Self {
            loader,
            manifest,
            palette: Palette::default(),
            compositor: Compositor::default(),
            placeholder: Placeholder::default(),
        }
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_compositor(mut self, compositor: Compositor) -> Self {
        self.compositor = compositor;
        self
    }

    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Runs the preload to completion.
    ///
    /// The returned cache has an entry for every key in [`IconKey::all`].
    pub async fn run(&self) -> IconCache {
        let started = Instant::now();

        log_phase(PreloadPhase::Base);
        let base = self.prepare_base().await;

        log_phase(PreloadPhase::Icons);
        let pairs = join_all(IconKey::all().map(|key| self.prepare_pair(key, &base))).await;

        let mut builder = IconCacheBuilder::new(base.background, base.direction);
        for (key, icon) in pairs {
            if !builder.insert(key, icon) {
                tracing::warn!(target: "marker_icons::preload", %key, "duplicate icon key ignored");
            }
        }
        let cache = builder.build();

        log_phase(PreloadPhase::Complete);
        tracing::info!(
            target: "marker_icons::preload",
            entries = cache.len(),
            degraded = cache.degraded_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "marker icons ready"
        );
        cache
    }

    async fn prepare_base(&self) -> BaseImages {
        let (background, direction) = join(
            self.loader.load_image(&self.manifest.background),
            self.loader.load_image(&self.manifest.direction),
        )
        .await;

        let mut source = background.unwrap_or_else(|error| {
            tracing::warn!(
                target: "marker_icons::preload",
                source = %self.manifest.background,
                %error,
                "failed to load background, using placeholder"
            );
            self.placeholder_source()
        });

        let background = match self.compositor.prepare_icon(&source, None, None) {
            Ok(composed) => composed,
            Err(error) => {
                tracing::warn!(
                    target: "marker_icons::preload",
                    %error,
                    "background cannot be composed, using placeholder"
                );
                source = self.placeholder_source();
                self.placeholder_marker()
            }
        };

        let direction = direction
            .map_err(AssetFailure::from)
            .and_then(|arrow| {
                self.compositor
                    .prepare_icon(&arrow, None, None)
                    .map_err(AssetFailure::from)
            })
            .unwrap_or_else(|error| {
                tracing::warn!(
                    target: "marker_icons::preload",
                    source = %self.manifest.direction,
                    %error,
                    "direction image unavailable, using background"
                );
                background.clone()
            });

        BaseImages {
            source,
            background,
            direction,
        }
    }

    async fn prepare_pair(&self, key: IconKey, base: &BaseImages) -> (IconKey, ComposedIcon) {
        let tint = self.palette.resolve(key.color);

        let icon = match self.compose_pair(key, &base.source, tint).await {
            Ok(bitmap) => ComposedIcon::full(bitmap, tint),
            Err(error) => {
                tracing::warn!(
                    target: "marker_icons::preload",
                    %key,
                    %error,
                    "icon unavailable, using background only"
                );
                // Falls back to the base background, which is already at
                // output size or the raw placeholder.
                let bitmap = self
                    .compositor
                    .prepare_icon(&base.source, None, Some(tint))
                    .unwrap_or_else(|_| base.background.clone());
                ComposedIcon::degraded(bitmap, tint)
            }
        };
        (key, icon)
    }

    async fn compose_pair(
        &self,
        key: IconKey,
        background: &Bitmap,
        tint: Color,
    ) -> Result<Bitmap, AssetFailure> {
        let source = self
            .manifest
            .icon(key.category)
            .ok_or_else(|| LoadError::MissingAsset(key.category.to_string()))?;
        let icon = self.loader.load_image(source).await?;
        Ok(self.compositor.prepare_icon(background, Some(&icon), Some(tint))?)
    }

    fn placeholder_source(&self) -> Bitmap {
        self.placeholder.bitmap(self.compositor.pixel_ratio())
    }

    /// The placeholder at output size. Falls back to the raw placeholder if
    /// even that cannot be composed.
    fn placeholder_marker(&self) -> Bitmap {
        let placeholder = self.placeholder_source();
        self.compositor
            .prepare_icon(&placeholder, None, None)
            .unwrap_or(placeholder)
    }
}

fn log_phase(phase: PreloadPhase) {
    tracing::debug!(target: "marker_icons::preload", ?phase, "preload phase");
}
