//! Closed-form spectral responses in thermodynamic CMB units.
//!
//! With `x = hν / (k T_CMB)`:
//!
//! ```text
//! cmb  : 1
//! tsz  : x (eˣ + 1) / (eˣ − 1) − 4
//! sync : (ν / ν0)^β_s / g(ν),    g(ν) = x² eˣ / (eˣ − 1)²
//! ```
//!
//! `g(ν)` converts antenna to thermodynamic temperature, so the synchrotron
//! power law (defined in antenna temperature) is expressed in K_CMB like the
//! other two. No normalization is applied.

use nalgebra::DVector;
use tracing::{debug, info};

use super::SpectralVector;
use crate::component::{default_components_order, normalize_order, Component};
use crate::error::SpectralError;
use crate::frequency::{default_frequencies, Frequency};

/// Planck constant (J s).
pub const H_PLANCK: f64 = 6.62607015e-34;
/// Boltzmann constant (J / K).
pub const K_BOLTZMANN: f64 = 1.380649e-23;
/// CMB monopole temperature (K).
pub const T_CMB: f64 = 2.7255;

/// Parameters for the theoretical build.
#[derive(Debug, Clone, PartialEq)]
pub struct TheoryConfig {
    /// Synchrotron spectral index. Default -3.1.
    pub beta_s: f64,
    /// Synchrotron reference frequency in Hz. Default 30 GHz.
    pub nu0_hz: f64,
    /// Frequency tags (GHz). None = the nine Planck channels.
    pub frequencies: Option<Vec<String>>,
    /// Desired column order. None = `["cmb", "tsz", "sync"]`.
    ///
    /// Names outside the model are dropped silently, so one order can be
    /// shared with empirical builds that know more components.
    pub components_order: Option<Vec<String>>,
}

impl Default for TheoryConfig {
    fn default() -> Self {
        Self {
            beta_s: -3.1,
            nu0_hz: 30e9,
            frequencies: None,
            components_order: None,
        }
    }
}

/// Dimensionless frequency `hν / (k T_CMB)`.
pub fn dimensionless_frequency(nu_hz: f64) -> f64 {
    H_PLANCK * nu_hz / (K_BOLTZMANN * T_CMB)
}

/// Antenna-to-thermodynamic conversion `g = x² eˣ / (eˣ − 1)²`.
pub fn thermodynamic_conversion(x: f64) -> f64 {
    let ex = x.exp();
    x * x * ex / ((ex - 1.0) * (ex - 1.0))
}

/// Thermal SZ spectral shape `x (eˣ + 1)/(eˣ − 1) − 4`.
pub fn tsz_response(x: f64) -> f64 {
    let ex = x.exp();
    x * (ex + 1.0) / (ex - 1.0) - 4.0
}

/// Synchrotron power law converted to K_CMB.
pub fn sync_response(nu_hz: f64, nu0_hz: f64, beta_s: f64) -> f64 {
    (nu_hz / nu0_hz).powf(beta_s) / thermodynamic_conversion(dimensionless_frequency(nu_hz))
}

impl Component {
    /// Raw response of this component at each frequency.
    pub fn response(&self, frequencies: &[Frequency], beta_s: f64, nu0_hz: f64) -> DVector<f64> {
        DVector::from_iterator(
            frequencies.len(),
            frequencies.iter().map(|f| {
                let nu = f.hz();
                match self {
                    Component::Cmb => 1.0,
                    Component::Tsz => tsz_response(dimensionless_frequency(nu)),
                    Component::Sync => sync_response(nu, nu0_hz, beta_s),
                }
            }),
        )
    }
}

pub(super) fn build(config: &TheoryConfig) -> Result<SpectralVector, SpectralError> {
    let tags = config
        .frequencies
        .clone()
        .unwrap_or_else(default_frequencies);
    let frequencies = Frequency::parse_all(&tags)?;

    let columns: Vec<String> = match &config.components_order {
        None => default_components_order(),
        Some(order) => {
            let wanted = normalize_order(order);
            let (kept, dropped): (Vec<String>, Vec<String>) = wanted
                .into_iter()
                .partition(|c| Component::from_name(c).is_some());
            if !dropped.is_empty() {
                debug!("Theory model ignores components {:?}", dropped);
            }
            kept
        }
    };

    let vectors: Vec<DVector<f64>> = columns
        .iter()
        .filter_map(|c| Component::from_name(c))
        .map(|c| c.response(&frequencies, config.beta_s, config.nu0_hz))
        .collect();

    let sv = SpectralVector::from_columns(columns, vectors, tags);
    info!(
        "Built theoretical F: {} frequencies x {} components {:?}",
        sv.nfreq(),
        sv.ncomp(),
        sv.columns
    );
    debug!("F_theory: {}", sv.matrix);
    Ok(sv)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(order: &[&str]) -> TheoryConfig {
        TheoryConfig {
            components_order: Some(order.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn default_build_is_nine_by_three() {
        let sv = SpectralVector::build_f_theory(&TheoryConfig::default()).unwrap();
        assert_eq!(sv.matrix.shape(), (9, 3));
        assert_eq!(sv.columns, vec!["cmb", "tsz", "sync"]);
        assert_eq!(sv.frequencies, default_frequencies());
        assert!(sv.matrix.iter().all(|v| v.is_finite()));
        assert!(sv.matrix.column(0).iter().all(|&v| v == 1.0));
    }

    #[test]
    fn caller_order_is_kept() {
        let config = cfg(&["sync", "cmb"]);
        let sv = SpectralVector::build_f_theory(&config).unwrap();
        assert_eq!(sv.columns, vec!["sync", "cmb"]);

        let freqs = Frequency::parse_all(&default_frequencies()).unwrap();
        for (i, f) in freqs.iter().enumerate() {
            let expected = sync_response(f.hz(), 30e9, -3.1);
            assert!((sv.matrix[(i, 0)] - expected).abs() <= 1e-12 * expected.abs());
            assert_eq!(sv.matrix[(i, 1)], 1.0);
        }
        assert_eq!(sv.reference_vectors.names(), sv.columns);
    }

    #[test]
    fn unknown_components_are_dropped() {
        let sv = SpectralVector::build_f_theory(&cfg(&["noise", "TSZ", "dust"])).unwrap();
        assert_eq!(sv.columns, vec!["tsz"]);
        assert_eq!(sv.matrix.shape(), (9, 1));
    }

    #[test]
    fn no_supported_components_gives_empty_matrix() {
        let sv = SpectralVector::build_f_theory(&cfg(&["dust"])).unwrap();
        assert_eq!(sv.matrix.shape(), (9, 0));
        assert!(sv.columns.is_empty());

        let sv = SpectralVector::build_f_theory(&cfg(&[])).unwrap();
        assert_eq!(sv.matrix.shape(), (9, 0));
    }

    #[test]
    fn tsz_changes_sign_near_217ghz() {
        // The tSZ null sits at ~217 GHz: decrement below, increment above
        let config = TheoryConfig {
            frequencies: Some(vec!["143".into(), "217".into(), "353".into()]),
            components_order: Some(vec!["tsz".into()]),
            ..Default::default()
        };
        let sv = SpectralVector::build_f_theory(&config).unwrap();
        let tsz = sv.matrix.column(0);
        assert!(tsz[0] < -0.5);
        assert!(tsz[1].abs() < 0.05);
        assert!(tsz[2] > 1.0);
    }

    #[test]
    fn sync_is_unity_scaled_at_reference_frequency() {
        // At nu0 the power law is 1, leaving only 1/g(nu0)
        let x = dimensionless_frequency(30e9);
        let g = thermodynamic_conversion(x);
        assert!((sync_response(30e9, 30e9, -3.1) - 1.0 / g).abs() < 1e-12);
        // g -> 1 in the Rayleigh-Jeans limit
        assert!((thermodynamic_conversion(1e-4) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn custom_frequencies_and_parameters() {
        let config = TheoryConfig {
            beta_s: -2.7,
            nu0_hz: 23e9,
            frequencies: Some(vec!["23".into(), "46".into()]),
            components_order: Some(vec!["sync".into()]),
        };
        let sv = SpectralVector::build_f_theory(&config).unwrap();
        assert_eq!(sv.frequencies, vec!["23", "46"]);
        let ratio = sv.matrix[(1, 0)] / sv.matrix[(0, 0)];
        let g_ratio = thermodynamic_conversion(dimensionless_frequency(23e9))
            / thermodynamic_conversion(dimensionless_frequency(46e9));
        assert!((ratio - 2f64.powf(-2.7) * g_ratio).abs() < 1e-12);
    }

    #[test]
    fn bad_frequency_tag_is_an_error() {
        let config = TheoryConfig {
            frequencies: Some(vec!["030".into(), "LFI".into()]),
            ..Default::default()
        };
        assert!(matches!(
            SpectralVector::build_f_theory(&config),
            Err(SpectralError::InvalidFrequency { tag }) if tag == "LFI"
        ));
    }
}
