//! Empirical mixing matrix from sky maps on disk.
//!
//! Each entry `F[i, j]` is the mean of the finite pixels of component `j`'s
//! map at frequency `i`, restricted to the mask when one is given. Maps are
//! located by rendering the component's [`FileTemplate`] under `base_dir`.
//!
//! A map file that does not exist contributes 0.0 (partial downloads are
//! expected). A file that exists but cannot be read is an error.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use nalgebra::DVector;
use tracing::{debug, info};

use super::SpectralVector;
use crate::component::{default_components_order, normalize_order};
use crate::error::{MapError, SpectralError};
use crate::healpix::{read_map, HealpixMap};
use crate::template::FileTemplate;

/// Parameters for the empirical build.
#[derive(Debug, Clone, PartialEq)]
pub struct EmpiricalConfig {
    /// Directory the rendered templates are relative to.
    pub base_dir: PathBuf,
    /// Filename template per component. A `None` entry marks a component as
    /// known but unavailable.
    pub file_templates: BTreeMap<String, Option<FileTemplate>>,
    /// Frequency tags substituted into `{frequency}`, in row order.
    pub frequencies: Vec<String>,
    /// Realisation index substituted into `{realisation}`. Default 0.
    pub realisation: u32,
    /// Optional mask map; pixels with mask value `> 0` are used.
    pub mask_path: Option<PathBuf>,
    /// Desired column order. None or empty = `["cmb", "tsz", "sync"]`.
    pub components_order: Option<Vec<String>>,
}

impl EmpiricalConfig {
    pub fn new<P, S>(base_dir: P, frequencies: &[S]) -> Self
    where
        P: Into<PathBuf>,
        S: AsRef<str>,
    {
        Self {
            base_dir: base_dir.into(),
            file_templates: BTreeMap::new(),
            frequencies: frequencies.iter().map(|f| f.as_ref().to_string()).collect(),
            realisation: 0,
            mask_path: None,
            components_order: None,
        }
    }

    /// Add (or replace) the template of one component.
    pub fn with_template(mut self, component: &str, template: impl Into<FileTemplate>) -> Self {
        self.file_templates
            .insert(component.to_string(), Some(template.into()));
        self
    }

    pub fn with_mask(mut self, mask_path: impl Into<PathBuf>) -> Self {
        self.mask_path = Some(mask_path.into());
        self
    }

    pub fn with_realisation(mut self, realisation: u32) -> Self {
        self.realisation = realisation;
        self
    }

    pub fn with_components_order<S: AsRef<str>>(mut self, order: &[S]) -> Self {
        self.components_order = Some(order.iter().map(|c| c.as_ref().to_string()).collect());
        self
    }

    fn template(&self, component: &str) -> Option<&FileTemplate> {
        self.file_templates.get(component).and_then(Option::as_ref)
    }
}

/// Mask thresholded at the resolution of each data map, computed on demand.
struct MaskCache {
    mask: HealpixMap,
    by_nside: HashMap<u32, Vec<bool>>,
}

impl MaskCache {
    fn include(&mut self, nside: u32) -> Result<&[bool], MapError> {
        if !self.by_nside.contains_key(&nside) {
            let include = self.mask.ud_grade(nside)?.threshold();
            debug!(
                "Mask regridded to nside {}: {} of {} pixels included",
                nside,
                include.iter().filter(|&&b| b).count(),
                include.len()
            );
            self.by_nside.insert(nside, include);
        }
        Ok(self.by_nside[&nside].as_slice())
    }
}

fn map_read_error(path: &Path) -> impl FnOnce(MapError) -> SpectralError + '_ {
    move |source| SpectralError::MapRead {
        path: path.to_path_buf(),
        source,
    }
}

/// Masked mean of one map file; 0.0 when no pixel survives.
fn map_mean(path: &Path, mask: Option<&mut MaskCache>) -> Result<f64, SpectralError> {
    let map = read_map(path).map_err(map_read_error(path))?;
    let mean = match mask {
        Some(cache) => {
            let include = cache.include(map.nside()).map_err(map_read_error(path))?;
            map.masked_mean(Some(include))
        }
        None => map.masked_mean(None),
    }
    .map_err(map_read_error(path))?;
    Ok(mean.unwrap_or(0.0))
}

/// Replace NaN and ±inf with 0.0.
fn sanitize(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

pub(super) fn build(config: &EmpiricalConfig) -> Result<SpectralVector, SpectralError> {
    // An empty order means the default here, unlike the theory build
    let wanted = match &config.components_order {
        Some(order) if !order.is_empty() => normalize_order(order),
        _ => default_components_order(),
    };
    let columns: Vec<String> = wanted
        .iter()
        .filter(|c| config.template(c).is_some())
        .cloned()
        .collect();
    if columns.is_empty() {
        return Err(SpectralError::NoValidComponents {
            requested: wanted,
            available: config
                .file_templates
                .iter()
                .filter(|(_, t)| t.is_some())
                .map(|(c, _)| c.clone())
                .collect(),
        });
    }

    let mut mask = match config.mask_path.as_deref() {
        Some(p) if !p.as_os_str().is_empty() => {
            let map = read_map(p).map_err(map_read_error(p))?;
            Some(MaskCache {
                mask: map,
                by_nside: HashMap::new(),
            })
        }
        _ => None,
    };

    let mut vectors = Vec::with_capacity(columns.len());
    for comp in &columns {
        let Some(template) = config.template(comp) else {
            continue;
        };
        let mut v = DVector::zeros(config.frequencies.len());
        for (i, freq) in config.frequencies.iter().enumerate() {
            let path = config
                .base_dir
                .join(template.render(freq, config.realisation)?);
            if path.exists() {
                v[i] = sanitize(map_mean(&path, mask.as_mut())?);
            } else {
                debug!("Missing map {}, using 0.0", path.display());
            }
        }
        vectors.push(v);
    }

    let sv = SpectralVector::from_columns(columns, vectors, config.frequencies.clone());
    info!(
        "Built empirical F from {}: {} frequencies x {} components {:?}",
        config.base_dir.display(),
        sv.nfreq(),
        sv.ncomp(),
        sv.columns
    );
    debug!("F_empirical: {}", sv.matrix);
    Ok(sv)
}
