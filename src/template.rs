//! Filename templates with `{frequency}` and `{realisation}` placeholders.
//!
//! Placeholders follow the brace syntax used by the map archive layouts:
//! `{frequency}` is replaced by the channel tag verbatim, `{realisation}` by
//! the realisation index, optionally zero padded with a width spec such as
//! `{realisation:04d}` or `{realisation:05}`. `{frequency}` takes an optional
//! padded width with an alignment and fill character, as in `{frequency:>5}`
//! or `{frequency:_<4s}`. `{{` and `}}` are literal braces.

use std::fmt;

use crate::error::SpectralError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTemplate(String);

impl FileTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute the placeholders for one channel and realisation.
    pub fn render(&self, frequency: &str, realisation: u32) -> Result<String, SpectralError> {
        let fail = |reason: String| SpectralError::Template {
            template: self.0.clone(),
            reason,
        };

        let mut out = String::with_capacity(self.0.len() + 8);
        let mut chars = self.0.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '}' => return Err(fail("single '}' encountered".into())),
                '{' => {
                    let mut field = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => field.push(ch),
                            None => return Err(fail("unclosed '{'".into())),
                        }
                    }
                    let (name, spec) = field.split_once(':').unwrap_or((field.as_str(), ""));
                    match name {
                        "frequency" => out.push_str(&format_text(frequency, spec).ok_or_else(
                            || fail(format!("unsupported format spec '{spec}' for frequency")),
                        )?),
                        "realisation" => out.push_str(&format_index(realisation, spec).ok_or_else(
                            || fail(format!("unsupported format spec '{spec}' for realisation")),
                        )?),
                        other => return Err(fail(format!("unknown placeholder '{other}'"))),
                    }
                }
                _ => out.push(c),
            }
        }
        Ok(out)
    }
}

/// Pad a tag to `[[fill]align][width][s]`, left-aligned with spaces by default.
fn format_text(value: &str, spec: &str) -> Option<String> {
    let spec = spec.strip_suffix('s').unwrap_or(spec);
    let mut chars = spec.chars();
    let (fill, align, width) = match (chars.next(), chars.next()) {
        (Some(f), Some(a @ ('<' | '>' | '^'))) => (f, a, &spec[f.len_utf8() + 1..]),
        (Some(a @ ('<' | '>' | '^')), _) => (' ', a, &spec[1..]),
        _ => (' ', '<', spec),
    };
    if width.is_empty() {
        return Some(value.to_string());
    }
    if width.starts_with('0') {
        return None;
    }
    let width: usize = width.parse().ok()?;
    let pad = width.saturating_sub(value.chars().count());
    let (left, right) = match align {
        '>' => (pad, 0),
        '^' => (pad / 2, pad - pad / 2),
        _ => (0, pad),
    };
    let run = |n: usize| std::iter::repeat(fill).take(n).collect::<String>();
    Some(format!("{}{}{}", run(left), value, run(right)))
}

/// Format an index with an empty spec, `d`, or a zero-padded width (`04d`, `05`).
fn format_index(value: u32, spec: &str) -> Option<String> {
    let digits = spec.strip_suffix('d').unwrap_or(spec);
    if digits.is_empty() {
        return Some(value.to_string());
    }
    let width = digits.strip_prefix('0').unwrap_or(digits);
    let width: usize = width.parse().ok()?;
    Some(if digits.starts_with('0') {
        format!("{value:0width$}")
    } else {
        format!("{value:>width$}")
    })
}

impl From<&str> for FileTemplate {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FileTemplate {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for FileTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_placeholders() {
        let t = FileTemplate::new("sync/sync_f{frequency}_r{realisation}.fits");
        assert_eq!(t.render("030", 7).unwrap(), "sync/sync_f030_r7.fits");

        let t = FileTemplate::new("cmb_r{realisation:04d}_{frequency}GHz.fits");
        assert_eq!(t.render("143", 12).unwrap(), "cmb_r0012_143GHz.fits");

        let t = FileTemplate::new("noise_{frequency}_{realisation:05}.fits");
        assert_eq!(t.render("353", 3).unwrap(), "noise_353_00003.fits");
    }

    #[test]
    fn templates_without_realisation() {
        let t = FileTemplate::new("tsz_{frequency}.fits");
        assert_eq!(t.render("100", 99).unwrap(), "tsz_100.fits");
        let t = FileTemplate::new("fixed.fits");
        assert_eq!(t.render("100", 0).unwrap(), "fixed.fits");
    }

    #[test]
    fn padded_frequency() {
        let render = |t: &str, f: &str| FileTemplate::new(t).render(f, 0).unwrap();
        assert_eq!(render("m_{frequency:s}.fits", "030"), "m_030.fits");
        assert_eq!(render("m_{frequency:>5}.fits", "30"), "m_   30.fits");
        assert_eq!(render("m_{frequency:<4}.fits", "30"), "m_30  .fits");
        assert_eq!(render("m_{frequency:4}.fits", "30"), "m_30  .fits");
        assert_eq!(render("m_{frequency:_^6s}.fits", "30"), "m___30__.fits");
        assert_eq!(render("m_{frequency:0>3}.fits", "30"), "m_030.fits");
        // width shorter than the tag never truncates
        assert_eq!(render("m_{frequency:>2}.fits", "1000"), "m_1000.fits");
    }

    #[test]
    fn escaped_braces() {
        let t = FileTemplate::new("{{raw}}_{frequency}");
        assert_eq!(t.render("217", 0).unwrap(), "{raw}_217");
    }

    #[test]
    fn rejects_bad_templates() {
        for bad in [
            "map_{lmax}.fits",
            "map_{frequency",
            "map_}.fits",
            "r{realisation:x}",
            "f{frequency:.2f}",
            "f{frequency:>x}",
        ] {
            assert!(
                matches!(
                    FileTemplate::new(bad).render("030", 0),
                    Err(SpectralError::Template { .. })
                ),
                "{bad}"
            );
        }
    }
}
