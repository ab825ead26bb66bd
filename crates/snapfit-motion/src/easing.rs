//! Easing curves.
//!
//! The catalogue understands two naming schemes: the `easeInOutCubic`
//! style and GSAP's `power2.inOut` style, where `power1` through `power4`
//! are quad through quint. A bare `powerN` is the out variant.

use std::fmt;
use std::str::FromStr;

use crate::error::MotionError;

/// Maps linear progress in `[0, 1]` to eased progress.
#[derive(Debug, Clone, Copy, Default)]
pub enum Easing {
    /// Identity.
    #[default]
    Linear,
    /// `t^2`.
    QuadIn,
    /// Decelerating quad.
    QuadOut,
    /// Quad in the first half, mirrored in the second.
    QuadInOut,
    /// `t^3`.
    CubicIn,
    /// Decelerating cubic.
    CubicOut,
    /// Cubic in the first half, mirrored in the second.
    CubicInOut,
    /// `t^4`.
    QuartIn,
    /// Decelerating quart.
    QuartOut,
    /// Quart in the first half, mirrored in the second.
    QuartInOut,
    /// `t^5`.
    QuintIn,
    /// Decelerating quint.
    QuintOut,
    /// Quint in the first half, mirrored in the second.
    QuintInOut,
    /// Caller-supplied curve. Should map 0 to 0 and 1 to 1.
    Custom(fn(f64) -> f64),
}

#[derive(Clone, Copy)]
enum Shape {
    In,
    Out,
    InOut,
}

fn power_curve(t: f64, power: i32, shape: Shape) -> f64 {
    match shape {
        Shape::In => t.powi(power),
        Shape::Out => 1.0 - (1.0 - t).powi(power),
        Shape::InOut => {
            if t < 0.5 {
                2f64.powi(power - 1) * t.powi(power)
            } else {
                1.0 - (-2.0 * t + 2.0).powi(power) / 2.0
            }
        }
    }
}

impl Easing {
    /// Eased value of `t`, clamped to `[0, 1]` first.
    pub fn apply(&self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::Linear => t,
            Easing::Custom(f) => f(t),
            other => match other.power() {
                Some((power, shape)) => power_curve(t, power, shape),
                None => t,
            },
        }
    }

    fn power(&self) -> Option<(i32, Shape)> {
        use Easing::*;
        Some(match self {
            QuadIn => (2, Shape::In),
            QuadOut => (2, Shape::Out),
            QuadInOut => (2, Shape::InOut),
            CubicIn => (3, Shape::In),
            CubicOut => (3, Shape::Out),
            CubicInOut => (3, Shape::InOut),
            QuartIn => (4, Shape::In),
            QuartOut => (4, Shape::Out),
            QuartInOut => (4, Shape::InOut),
            QuintIn => (5, Shape::In),
            QuintOut => (5, Shape::Out),
            QuintInOut => (5, Shape::InOut),
            Linear | Custom(_) => return None,
        })
    }

    /// Look up a named curve.
    pub fn from_name(name: &str) -> Option<Easing> {
        use Easing::*;
        let table: [(i32, [Easing; 3]); 4] = [
            (2, [QuadIn, QuadOut, QuadInOut]),
            (3, [CubicIn, CubicOut, CubicInOut]),
            (4, [QuartIn, QuartOut, QuartInOut]),
            (5, [QuintIn, QuintOut, QuintInOut]),
        ];
        let name = name.trim();
        if matches!(name, "linear" | "none" | "power0" | "power0.in" | "power0.out" | "power0.inOut") {
            return Some(Linear);
        }

        if let Some(rest) = name.strip_prefix("power") {
            let (level, variant) = rest.split_once('.').unwrap_or((rest, "out"));
            let level: i32 = level.parse().ok()?;
            let power = level.checked_add(1)?;
            let (_, curves) = table.iter().find(|(p, _)| *p == power)?;
            return match variant {
                "in" => Some(curves[0]),
                "out" => Some(curves[1]),
                "inOut" => Some(curves[2]),
                _ => None,
            };
        }

        let (variant, family) = if let Some(f) = name.strip_prefix("easeInOut") {
            (2, f)
        } else if let Some(f) = name.strip_prefix("easeIn") {
            (0, f)
        } else if let Some(f) = name.strip_prefix("easeOut") {
            (1, f)
        } else {
            return None;
        };
        let power = match family {
            "Quad" => 2,
            "Cubic" => 3,
            "Quart" => 4,
            "Quint" => 5,
            _ => return None,
        };
        table
            .iter()
            .find(|(p, _)| *p == power)
            .map(|(_, curves)| curves[variant])
    }

    /// Canonical GSAP-style name, `None` for custom curves.
    pub fn name(&self) -> Option<&'static str> {
        use Easing::*;
        Some(match self {
            Linear => "linear",
            QuadIn => "power1.in",
            QuadOut => "power1.out",
            QuadInOut => "power1.inOut",
            CubicIn => "power2.in",
            CubicOut => "power2.out",
            CubicInOut => "power2.inOut",
            QuartIn => "power3.in",
            QuartOut => "power3.out",
            QuartInOut => "power3.inOut",
            QuintIn => "power4.in",
            QuintOut => "power4.out",
            QuintInOut => "power4.inOut",
            Custom(_) => return None,
        })
    }
}

/// Custom curves never compare equal.
impl PartialEq for Easing {
    fn eq(&self, other: &Self) -> bool {
        match (self.name(), other.name()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl FromStr for Easing {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Easing::from_name(s).ok_or_else(|| MotionError::UnknownEasing(s.to_string()))
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name().unwrap_or("custom"))
    }
}
