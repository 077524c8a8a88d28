//! CSS transform formatting
//!
//! Effects describe what they want as a `Transform`; only the platform layer
//! turns it into a style string.

use glam::Vec2;

use crate::sim::{CloneTransform, TiltPose};

/// A 2D/3D element transform, applied in the order the fields are listed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// CSS perspective distance (px), 0 for none
    pub perspective: f32,
    pub translate: Vec2,
    /// Degrees
    pub rotate_x: f32,
    /// Degrees
    pub rotate_y: f32,
    /// Radians, in-plane
    pub rotate: f32,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        perspective: 0.0,
        translate: Vec2::ZERO,
        rotate_x: 0.0,
        rotate_y: 0.0,
        rotate: 0.0,
        scale: 1.0,
    };

    /// Magnetic pose `(x, y, scale)`
    pub fn magnetic(pose: glam::Vec3) -> Self {
        Self {
            translate: Vec2::new(pose.x, pose.y),
            scale: pose.z,
            ..Self::IDENTITY
        }
    }

    pub fn translate(offset: Vec2) -> Self {
        Self {
            translate: offset,
            ..Self::IDENTITY
        }
    }

    pub fn tilt(pose: &TiltPose, perspective: f32) -> Self {
        Self {
            perspective,
            rotate_x: pose.rotate_x,
            rotate_y: pose.rotate_y,
            scale: pose.scale,
            ..Self::IDENTITY
        }
    }

    pub fn clone_pose(t: &CloneTransform) -> Self {
        Self {
            translate: Vec2::new(t.dx, t.dy),
            rotate: t.angle,
            ..Self::IDENTITY
        }
    }

    pub fn to_css(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(5);
        if self.perspective > 0.0 {
            parts.push(format!("perspective({:.0}px)", self.perspective));
        }
        if self.translate != Vec2::ZERO {
            parts.push(format!(
                "translate3d({:.2}px, {:.2}px, 0)",
                self.translate.x, self.translate.y
            ));
        }
        if self.rotate_x != 0.0 {
            parts.push(format!("rotateX({:.3}deg)", self.rotate_x));
        }
        if self.rotate_y != 0.0 {
            parts.push(format!("rotateY({:.3}deg)", self.rotate_y));
        }
        if self.rotate != 0.0 {
            parts.push(format!("rotate({:.4}rad)", self.rotate));
        }
        if self.scale != 1.0 {
            parts.push(format!("scale({:.4})", self.scale));
        }
        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join(" ")
        }
    }
}

/// `37.5%`
pub fn percent(value: f32) -> String {
    format!("{:.2}%", value)
}

/// Custom properties the page's glare layer reads
pub fn glare_properties(pose: &TiltPose) -> [(&'static str, String); 3] {
    [
        ("--fx-glare-x", percent(pose.glare_x)),
        ("--fx-glare-y", percent(pose.glare_y)),
        ("--fx-glare-opacity", format!("{:.3}", pose.glare_opacity)),
    ]
}

/// Offsets (px) of one shake cycle
const SHAKE_STEPS: [(f32, f32, f32); 5] = [
    (0.0, 0.0, 0.0),
    (-4.0, 2.0, -0.5),
    (4.0, -2.0, 0.5),
    (-2.0, -3.0, -0.3),
    (2.0, 3.0, 0.3),
];

/// Stylesheet that shakes the page body while the root carries `class`
pub fn shake_stylesheet(class: &str, cycle_ms: u32) -> String {
    let last = SHAKE_STEPS.len() - 1;
    let frames: Vec<String> = SHAKE_STEPS
        .iter()
        .enumerate()
        .map(|(i, (x, y, deg))| {
            format!(
                "{:.0}% {{ transform: translate({x}px, {y}px) rotate({deg}deg); }}",
                i as f32 / last as f32 * 100.0
            )
        })
        .collect();
    format!(
        "@keyframes {class} {{ {} }}\nhtml.{class} body {{ animation: {class} {cycle_ms}ms linear infinite; }}",
        frames.join(" ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_identity_is_none() {
        assert_eq!(Transform::IDENTITY.to_css(), "none");
        assert_eq!(Transform::magnetic(Vec3::new(0.0, 0.0, 1.0)).to_css(), "none");
    }

    #[test]
    fn test_magnetic_css() {
        let css = Transform::magnetic(Vec3::new(8.75, -2.0, 1.025)).to_css();
        assert_eq!(css, "translate3d(8.75px, -2.00px, 0) scale(1.0250)");
    }

    #[test]
    fn test_tilt_css_order() {
        let pose = TiltPose {
            rotate_x: 5.0,
            rotate_y: -3.0,
            scale: 1.02,
            ..TiltPose::NEUTRAL
        };
        let css = Transform::tilt(&pose, 1000.0).to_css();
        assert_eq!(
            css,
            "perspective(1000px) rotateX(5.000deg) rotateY(-3.000deg) scale(1.0200)"
        );
    }

    #[test]
    fn test_clone_css() {
        let t = CloneTransform {
            dx: 10.0,
            dy: 250.5,
            angle: 0.25,
        };
        assert_eq!(
            Transform::clone_pose(&t).to_css(),
            "translate3d(10.00px, 250.50px, 0) rotate(0.2500rad)"
        );
    }

    #[test]
    fn test_glare_properties() {
        let props = glare_properties(&TiltPose::NEUTRAL);
        assert_eq!(props[0], ("--fx-glare-x", "50.00%".to_string()));
        assert_eq!(props[2].1, "0.000");
    }

    #[test]
    fn test_shake_stylesheet_targets_root_class() {
        let css = shake_stylesheet("fx-shake", 80);
        assert!(css.starts_with("@keyframes fx-shake {"));
        assert!(css.contains("0% { transform: translate(0px, 0px) rotate(0deg); }"));
        assert!(css.contains("100% { transform: translate(2px, 3px) rotate(0.3deg); }"));
        assert!(css.contains("html.fx-shake body { animation: fx-shake 80ms linear infinite; }"));
    }
}
