use crate::context::ParameterValue;

/// Filtering and wrap parameters an upload of a given size should end up with.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FilterDecision {
    /// `Some` when the wrap mode has to be overridden regardless of what was set before.
    pub wrap_s: Option<ParameterValue>,
    pub wrap_t: Option<ParameterValue>,
    /// Applied only if the user never set a min filter.
    pub min_filter: ParameterValue,
    pub generate_mipmap: bool,
}

/// Mipmap and filtering rules derived from image dimensions.
///
/// Non-power-of-two images can't be mipmapped or repeated on GLES2-class hardware, so they
/// get clamped wrapping and a plain linear min filter.
#[derive(Debug, Copy, Clone, Default)]
pub struct MipmapPolicy;

impl MipmapPolicy {
    pub fn decide(width: u32, height: u32) -> FilterDecision {
        if Self::allows_mipmaps(width, height) {
            FilterDecision {
                wrap_s: None,
                wrap_t: None,
                min_filter: ParameterValue::LinearMipmapLinear,
                generate_mipmap: true,
            }
        } else {
            FilterDecision {
                wrap_s: Some(ParameterValue::ClampToEdge),
                wrap_t: Some(ParameterValue::ClampToEdge),
                min_filter: ParameterValue::Linear,
                generate_mipmap: false,
            }
        }
    }

    pub fn allows_mipmaps(width: u32, height: u32) -> bool {
        is_power_of_two(i64::from(width)) && is_power_of_two(i64::from(height))
    }
}

/// `false` for zero and negative values.
pub const fn is_power_of_two(value: i64) -> bool {
    value > 0 && value & (value - 1) == 0
}
