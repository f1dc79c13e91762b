//! Resize handles and the directional flags they decompose into.

use crate::geometry::PercentBox;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    Nw,
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
}

/// Which edges a handle drags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HandleDirs {
    pub north: bool,
    pub south: bool,
    pub east: bool,
    pub west: bool,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Handle::Nw,
        Handle::N,
        Handle::Ne,
        Handle::E,
        Handle::Se,
        Handle::S,
        Handle::Sw,
        Handle::W,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nw => "nw",
            Self::N => "n",
            Self::Ne => "ne",
            Self::E => "e",
            Self::Se => "se",
            Self::S => "s",
            Self::Sw => "sw",
            Self::W => "w",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.as_str() == s)
    }

    pub fn dirs(self) -> HandleDirs {
        let s = self.as_str();
        HandleDirs {
            north: s.contains('n'),
            south: s.contains('s'),
            east: s.contains('e'),
            west: s.contains('w'),
        }
    }

    /// CSS cursor name, e.g. `"nw-resize"`.
    pub fn cursor_name(self) -> &'static str {
        match self {
            Self::Nw => "nw-resize",
            Self::N => "n-resize",
            Self::Ne => "ne-resize",
            Self::E => "e-resize",
            Self::Se => "se-resize",
            Self::S => "s-resize",
            Self::Sw => "sw-resize",
            Self::W => "w-resize",
        }
    }

    /// Handle position in the box's unrotated local frame, as fractions of width/height from the
    /// top-left corner.
    pub fn unit_position(self) -> (f64, f64) {
        let d = self.dirs();
        let fx = if d.west {
            0.0
        } else if d.east {
            1.0
        } else {
            0.5
        };
        let fy = if d.north {
            0.0
        } else if d.south {
            1.0
        } else {
            0.5
        };
        (fx, fy)
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anchor-preserving resize of `start` by a percent-space pointer delta `(dx, dy)`.
///
/// The edge opposite each dragged edge stays fixed. Extents are floored at `min_extent`; when the
/// floor kicks in the box keeps hugging the fixed edge.
pub fn resize_box(start: PercentBox, handle: Handle, dx: f64, dy: f64, min_extent: f64) -> PercentBox {
    let d = handle.dirs();
    let mut out = start;

    if d.east {
        let width = (start.width + dx).max(min_extent);
        out.width = width;
        out.x = start.left() + width / 2.0;
    } else if d.west {
        let width = (start.width - dx).max(min_extent);
        out.width = width;
        out.x = start.right() - width / 2.0;
    }

    if d.south {
        let height = (start.height + dy).max(min_extent);
        out.height = height;
        out.y = start.top() + height / 2.0;
    } else if d.north {
        let height = (start.height - dy).max(min_extent);
        out.height = height;
        out.y = start.bottom() - height / 2.0;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn dirs_decompose_names() {
        assert_eq!(
            Handle::Ne.dirs(),
            HandleDirs {
                north: true,
                east: true,
                ..HandleDirs::default()
            }
        );
        assert_eq!(
            Handle::W.dirs(),
            HandleDirs {
                west: true,
                ..HandleDirs::default()
            }
        );
        assert_eq!(Handle::parse("sw"), Some(Handle::Sw));
        assert_eq!(Handle::parse("x"), None);
        assert_eq!(Handle::Se.cursor_name(), "se-resize");
    }

    #[test]
    fn east_drag_keeps_west_edge() {
        let start = PercentBox::new(50.0, 50.0, 20.0, 10.0);
        let out = resize_box(start, Handle::E, 6.0, 3.0, 1.0);
        assert!(close(out.width, 26.0));
        assert!(close(out.x, 53.0));
        assert!(close(out.left(), start.left()));
        assert_eq!(out.height, start.height);
        assert_eq!(out.y, start.y);
    }

    #[test]
    fn west_drag_keeps_east_edge() {
        let start = PercentBox::new(50.0, 50.0, 20.0, 10.0);
        let out = resize_box(start, Handle::W, 4.0, 0.0, 1.0);
        assert!(close(out.width, 16.0));
        assert!(close(out.x, 52.0));
        assert!(close(out.right(), start.right()));
    }

    #[test]
    fn corner_drag_keeps_opposite_corner() {
        let start = PercentBox::new(30.0, 40.0, 10.0, 10.0);
        let out = resize_box(start, Handle::Nw, -5.0, -2.0, 1.0);
        assert!(close(out.right(), start.right()));
        assert!(close(out.bottom(), start.bottom()));
        assert!(close(out.width, 15.0));
        assert!(close(out.height, 12.0));
    }

    #[test]
    fn extent_floor_holds_anchor() {
        let start = PercentBox::new(50.0, 50.0, 10.0, 10.0);
        let out = resize_box(start, Handle::E, -40.0, 0.0, 1.0);
        assert_eq!(out.width, 1.0);
        assert!(close(out.left(), start.left()));

        let out = resize_box(start, Handle::N, 0.0, 99.0, 1.0);
        assert_eq!(out.height, 1.0);
        assert!(close(out.bottom(), start.bottom()));
    }
}
