//! Error types for mixing-matrix construction and map I/O.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while building a mixing matrix or a constraint vector.
///
/// Every variant carries the offending value together with the set of values
/// that would have been accepted.
#[derive(Debug, Error)]
pub enum SpectralError {
    /// A requested constraint name has no matching column.
    #[error("{name} not in component_names={available:?}")]
    ComponentNotFound { name: String, available: Vec<String> },

    /// An empirical build where no requested component has a template.
    #[error(
        "no valid components in file_templates for empirical F \
         (requested {requested:?}, templates available for {available:?})"
    )]
    NoValidComponents {
        requested: Vec<String>,
        available: Vec<String>,
    },

    /// The construction-mode discriminator is neither `theory` nor `empirical`.
    #[error("source must be 'theory' or 'empirical', got '{value}'")]
    UnknownSource { value: String },

    /// A frequency tag that does not carry a numeric GHz value.
    #[error("frequency tag '{tag}' is not a number of GHz")]
    InvalidFrequency { tag: String },

    /// A filename template that cannot be rendered.
    #[error("cannot render template '{template}': {reason}")]
    Template { template: String, reason: String },

    /// The column list used for alignment does not match the width of F.
    #[error("{} column names {columns:?} for a mixing matrix with {ncols} columns", .columns.len())]
    ColumnMismatch { columns: Vec<String>, ncols: usize },

    /// A map file exists but could not be loaded.
    #[error("failed to read map {}", .path.display())]
    MapRead {
        path: PathBuf,
        #[source]
        source: MapError,
    },
}

/// Failures raised while reading, writing or regridding HEALPix maps.
#[derive(Debug, Error)]
pub enum MapError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The file is not a well-formed FITS file.
    #[error("malformed FITS: {0}")]
    Format(String),

    /// Well-formed FITS that does not hold a supported HEALPix map.
    #[error("unsupported HEALPix layout: {0}")]
    Unsupported(String),

    /// `nside` is zero, not a power of two, or above 2^29.
    #[error("invalid nside {0}: must be a power of two between 1 and 2^29")]
    InvalidNside(u32),

    /// Pixel count inconsistent with `nside`.
    #[error("got {len} pixels but nside {nside} needs {expected}")]
    LengthMismatch {
        nside: u32,
        len: usize,
        expected: usize,
    },
}
