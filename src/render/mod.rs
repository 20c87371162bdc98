//! QR render geometry.
//!
//! A [`BitMatrix`] plus a module style and a finder style becomes a flat list of
//! [`Shape`]s in absolute pixel coordinates. Drawing them is left to a surface:
//! [`svg`] and [`raster`] are provided.

pub mod finders;
pub mod liquid;
pub mod modules;
pub mod raster;
pub mod styles;
pub mod svg;

pub use finders::{render_finder, render_finders};
pub use modules::{CellFrame, Neighborhood, in_finder_region, render_modules};
pub use styles::{
    FinderCorner, FinderStyle, ModuleShape, ModuleStyle, centripetal, finder_style,
    finder_style_names, module_style, module_style_names, rotate90, rotate270,
};

use thiserror::Error;
use tracing::debug;

use crate::config;
use crate::encode::{EncodeError, Encoder};
use crate::models::{BitMatrix, EcLevel, Shape};

/// Side of a version 1 symbol; the three finders need this much room
pub const MIN_MATRIX_SIZE: usize = 21;

/// Why nothing was rendered
#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    /// Nothing to encode
    #[error("content is empty")]
    EmptyContent,
    /// Module size is negative or not a number
    #[error("invalid module size: {0}")]
    InvalidDimensions(f32),
    /// The encoder produced something that is not a QR matrix
    #[error("encoded matrix is {width}x{height}, expected a square of at least {}", MIN_MATRIX_SIZE)]
    InvalidMatrix {
        /// Modules per row
        width: usize,
        /// Modules per column
        height: usize,
    },
    /// The encoder rejected the content
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Everything needed to turn content into shapes
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Module style name
    pub module_style: String,
    /// Finder style name
    pub finder_style: String,
    /// Error correction level handed to the encoder
    pub ec_level: EcLevel,
    /// Side of one module in pixels
    pub module_size_px: f32,
    /// Blank margin in modules
    pub quiet_zone: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            module_style: styles::DEFAULT_MODULE_STYLE.to_owned(),
            finder_style: styles::DEFAULT_FINDER_STYLE.to_owned(),
            ec_level: EcLevel::default(),
            module_size_px: 1.0,
            quiet_zone: config::quiet_zone(),
        }
    }
}

/// A rendered QR symbol
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    /// Matrix side in modules, without the quiet zone
    pub matrix_size: usize,
    /// Quiet zone in modules
    pub quiet_zone: u32,
    /// Side of one module in pixels
    pub module_size_px: f32,
    /// Finder shapes first, then data modules
    pub shapes: Vec<Shape>,
}

impl Symbol {
    /// Total side in modules including the quiet zone
    pub fn size_modules(&self) -> usize {
        self.matrix_size + 2 * self.quiet_zone as usize
    }

    /// Total side in pixels including the quiet zone
    pub fn size_px(&self) -> f32 {
        self.size_modules() as f32 * self.module_size_px
    }
}

/// Whether a preview draws light modules on a dark page
pub fn light_modules(dark_mode: bool, white_on_black: bool) -> bool {
    dark_mode && white_on_black
}

/// Compose finders and data modules for an already encoded matrix.
///
/// The matrix must be square and at least [`MIN_MATRIX_SIZE`] modules wide;
/// smaller input places finders outside the symbol. [`render`] checks this.
pub fn render_symbol(matrix: &BitMatrix, options: &RenderOptions) -> Symbol {
    let module_size_px = modules::sanitize_size(options.module_size_px);
    let matrix_size = matrix.width().max(matrix.height());

    let mut shapes = render_finders(
        finder_style(&options.finder_style),
        module_size_px,
        options.quiet_zone,
        matrix_size,
    );
    shapes.extend(render_modules(
        matrix,
        module_style(&options.module_style),
        module_size_px,
        options.quiet_zone,
    ));

    Symbol {
        matrix_size,
        quiet_zone: options.quiet_zone,
        module_size_px,
        shapes,
    }
}

/// Encode `content` and render it
pub fn render(
    content: &str,
    options: &RenderOptions,
    encoder: &dyn Encoder,
) -> Result<Symbol, RenderError> {
    if content.is_empty() {
        return Err(RenderError::EmptyContent);
    }
    if !options.module_size_px.is_finite() || options.module_size_px < 0.0 {
        return Err(RenderError::InvalidDimensions(options.module_size_px));
    }

    let matrix = encoder.encode(content, options.ec_level)?;
    let (width, height) = (matrix.width(), matrix.height());
    if width != height || width < MIN_MATRIX_SIZE {
        return Err(RenderError::InvalidMatrix { width, height });
    }
    let symbol = render_symbol(&matrix, options);
    debug!(
        matrix_size = symbol.matrix_size,
        shapes = symbol.shapes.len(),
        module_style = %options.module_style,
        finder_style = %options.finder_style,
        "rendered QR symbol"
    );
    Ok(symbol)
}
