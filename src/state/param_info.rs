// src/state/param_info.rs
//
// Parameter metadata for UI display and validation.

use std::fmt;

/// Unique identifier for a parameter within a node type.
pub type ParamId = u32;

/// Display curve for parameter UI.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DisplayCurve {
    /// Linear mapping
    #[default]
    Linear,
    /// Logarithmic (good for frequency)
    Logarithmic,
    /// Symmetric around zero (good for pan)
    Symmetric,
}

/// Unit type for parameter display.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParamUnit {
    #[default]
    None,
    /// Hertz (frequency)
    Hz,
    /// Linear gain multiplier
    Gain,
    /// Pan (-1 to +1)
    Pan,
    /// Index into a fixed list of choices
    Choice,
}

impl fmt::Display for ParamUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamUnit::None | ParamUnit::Pan | ParamUnit::Choice => Ok(()),
            ParamUnit::Hz => write!(f, "Hz"),
            ParamUnit::Gain => write!(f, "x"),
        }
    }
}

/// Metadata describing a parameter.
///
/// Used by the UI to:
/// - Display appropriate controls (knobs, sliders, selectors)
/// - Validate input ranges
/// - Format values for display
#[derive(Debug, Clone)]
pub struct ParamInfo {
    /// Unique ID within the node type
    pub id: ParamId,

    /// Human-readable name
    pub name: String,

    /// Minimum value
    pub min: f32,

    /// Maximum value
    pub max: f32,

    /// Default value
    pub default: f32,

    /// Unit for display
    pub unit: ParamUnit,

    /// Display curve for UI mapping
    pub curve: DisplayCurve,

    /// Step size for discrete parameters (0 = continuous)
    pub step: f32,

    /// Whether `clamp` should leave out-of-range values alone so the
    /// node can report them at recalculation time.
    pub validated_on_recalc: bool,
}

impl ParamInfo {
    pub fn new(id: ParamId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            min: 0.0,
            max: 1.0,
            default: 0.0,
            unit: ParamUnit::None,
            curve: DisplayCurve::Linear,
            step: 0.0,
            validated_on_recalc: false,
        }
    }

    pub fn range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn default(mut self, value: f32) -> Self {
        self.default = value;
        self
    }

    pub fn unit(mut self, unit: ParamUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn curve(mut self, curve: DisplayCurve) -> Self {
        self.curve = curve;
        self
    }

    pub fn step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    pub fn validated_on_recalc(mut self) -> Self {
        self.validated_on_recalc = true;
        self
    }

    /// Clamp a value to the valid range, snapping discrete parameters.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if self.validated_on_recalc {
            return value;
        }
        let value = if value.is_nan() { self.default } else { value };
        let value = value.clamp(self.min, self.max);
        if self.step > 0.0 {
            self.min + ((value - self.min) / self.step).round() * self.step
        } else {
            value
        }
    }

    /// Format a value for display.
    pub fn format(&self, value: f32) -> String {
        let precision = if self.step > 0.0 { 0 } else { 2 };
        if self.unit == ParamUnit::None || self.unit == ParamUnit::Choice {
            format!("{:.prec$}", value, prec = precision)
        } else {
            format!("{:.prec$} {}", value, self.unit, prec = precision)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_snaps_discrete_values() {
        let info = ParamInfo::new(0, "Waveform").range(0.0, 2.0).step(1.0);
        assert_eq!(info.clamp(1.4), 1.0);
        assert_eq!(info.clamp(7.0), 2.0);
        assert_eq!(info.clamp(-3.0), 0.0);
    }

    #[test]
    fn clamp_replaces_nan_with_default() {
        let info = ParamInfo::new(0, "Pan").range(-1.0, 1.0).default(0.0);
        assert_eq!(info.clamp(f32::NAN), 0.0);
    }

    #[test]
    fn recalc_validated_params_pass_through() {
        let info = ParamInfo::new(0, "Frequency")
            .range(1.0, 20_000.0)
            .validated_on_recalc();
        assert_eq!(info.clamp(-5.0), -5.0);
    }

    #[test]
    fn format_appends_unit() {
        let info = ParamInfo::new(0, "Frequency").unit(ParamUnit::Hz);
        assert_eq!(info.format(440.0), "440.00 Hz");
    }
}
