//! CSS-like color strings as stored on layers and the canvas background.
//!
//! The data model keeps colors as raw strings so that whatever the editing widgets produce is passed
//! through untouched. Parsing only happens at raster time.

/// Background sentinel meaning "preserve alpha".
pub const TRANSPARENT: &str = "transparent";

/// Straight-alpha color with normalized 0..1 channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorDef {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl ColorDef {
    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn transparent() -> Self {
        Self::rgba(0.0, 0.0, 0.0, 0.0)
    }

    pub fn is_transparent(self) -> bool {
        self.a <= 0.0
    }

    /// Straight (non-premultiplied) RGBA8.
    pub fn to_rgba8(self) -> [u8; 4] {
        fn to_u8(x: f64) -> u8 {
            (x.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        [to_u8(self.r), to_u8(self.g), to_u8(self.b), to_u8(self.a)]
    }

    /// Same color with its alpha multiplied by `factor`.
    pub fn with_alpha_mul(self, factor: f64) -> Self {
        Self {
            a: (self.a * factor).clamp(0.0, 1.0),
            ..self
        }
    }
}

/// Parse a color string. Returns `None` for anything unrecognized.
pub fn parse_color(s: &str) -> Option<ColorDef> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let lower = s.to_ascii_lowercase();

    if let Some(hex) = lower.strip_prefix('#') {
        return parse_hex(hex).ok();
    }
    if let Some(args) = functional_args(&lower, "rgba").or_else(|| functional_args(&lower, "rgb")) {
        return parse_rgb_args(args);
    }

    match lower.as_str() {
        TRANSPARENT => Some(ColorDef::transparent()),
        "white" => Some(ColorDef::rgba(1.0, 1.0, 1.0, 1.0)),
        "black" => Some(ColorDef::rgba(0.0, 0.0, 0.0, 1.0)),
        "red" => Some(ColorDef::rgba(1.0, 0.0, 0.0, 1.0)),
        "green" => Some(ColorDef::rgba(0.0, 128.0 / 255.0, 0.0, 1.0)),
        "blue" => Some(ColorDef::rgba(0.0, 0.0, 1.0, 1.0)),
        _ => None,
    }
}

/// Like [`parse_color`], but logs and falls back to fully transparent.
pub fn parse_color_or_transparent(s: &str) -> ColorDef {
    parse_color(s).unwrap_or_else(|| {
        tracing::warn!(color = s, "unrecognized color, rendering as transparent");
        ColorDef::transparent()
    })
}

fn functional_args<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    s.strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn parse_rgb_args(args: &str) -> Option<ColorDef> {
    let parts: Vec<&str> = args
        .split([',', ' ', '/'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }

    fn channel(p: &str) -> Option<f64> {
        match p.strip_suffix('%') {
            Some(pct) => pct.parse::<f64>().ok().map(|v| v / 100.0),
            None => p.parse::<f64>().ok().map(|v| v / 255.0),
        }
    }
    fn alpha(p: &str) -> Option<f64> {
        match p.strip_suffix('%') {
            Some(pct) => pct.parse::<f64>().ok().map(|v| v / 100.0),
            None => p.parse::<f64>().ok(),
        }
    }

    let r = channel(parts[0])?;
    let g = channel(parts[1])?;
    let b = channel(parts[2])?;
    let a = match parts.get(3) {
        Some(p) => alpha(p)?,
        None => 1.0,
    };
    Some(ColorDef::rgba(
        r.clamp(0.0, 1.0),
        g.clamp(0.0, 1.0),
        b.clamp(0.0, 1.0),
        a.clamp(0.0, 1.0),
    ))
}

fn parse_hex(s: &str) -> Result<ColorDef, String> {
    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }
    fn hex_nibble(c: &str) -> Result<u8, String> {
        let v = u8::from_str_radix(c, 16).map_err(|_| format!("invalid hex digit \"{c}\""))?;
        Ok(v * 17)
    }

    if !s.is_ascii() {
        return Err("hex color must be ascii".to_owned());
    }

    let (r, g, b, a) = match s.len() {
        3 | 4 => {
            let r = hex_nibble(&s[0..1])?;
            let g = hex_nibble(&s[1..2])?;
            let b = hex_nibble(&s[2..3])?;
            let a = if s.len() == 4 {
                hex_nibble(&s[3..4])?
            } else {
                255
            };
            (r, g, b, a)
        }
        6 | 8 => {
            let r = hex_byte(&s[0..2])?;
            let g = hex_byte(&s[2..4])?;
            let b = hex_byte(&s[4..6])?;
            let a = if s.len() == 8 {
                hex_byte(&s[6..8])?
            } else {
                255
            };
            (r, g, b, a)
        }
        _ => {
            return Err("hex color must be #RGB, #RGBA, #RRGGBB or #RRGGBBAA".to_owned());
        }
    };

    Ok(ColorDef::rgba(
        f64::from(r) / 255.0,
        f64::from(g) / 255.0,
        f64::from(b) / 255.0,
        f64::from(a) / 255.0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(
            parse_color("#ff0000").unwrap(),
            ColorDef::rgba(1.0, 0.0, 0.0, 1.0)
        );
        assert_eq!(parse_color("#FFF").unwrap().to_rgba8(), [255, 255, 255, 255]);

        let c = parse_color("#0000ff80").unwrap();
        assert!((c.b - 1.0).abs() < 1e-9);
        assert!((c.a - (128.0 / 255.0)).abs() < 1e-9);

        assert!(parse_color("#12345").is_none());
        assert!(parse_color("#zzzzzz").is_none());
    }

    #[test]
    fn parses_functional_rgb() {
        let c = parse_color("rgba(0,0,0,0.5)").unwrap();
        assert_eq!(c.to_rgba8(), [0, 0, 0, 128]);

        let c = parse_color("rgb(249, 115, 22)").unwrap();
        assert_eq!(c.to_rgba8(), [249, 115, 22, 255]);

        assert!(parse_color("rgba(1,2)").is_none());
    }

    #[test]
    fn transparent_keyword_and_fallback() {
        assert!(parse_color("transparent").unwrap().is_transparent());
        assert!(parse_color("Transparent").unwrap().is_transparent());
        assert!(parse_color_or_transparent("not-a-color").is_transparent());
        assert!(parse_color("").is_none());
    }
}
