//! CPU rasterization of the banner texture.

use font8x8::legacy::BASIC_LEGACY;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::config::BannerConfig;
use crate::config::banner::{
    BORDER_INSET, BORDER_WIDTH, CANVAS_HEIGHT, CANVAS_WIDTH, HEADLINE_Y, LOGO_SIZE, LOGO_X, RULE_X, RULE_Y,
    SUBTITLE_Y, TEXT_CENTER_X, TITLE_Y,
};

const GLYPH_SIZE: u32 = 8;

/// Composes the banner: background, gold frame, optional logo, three lines
/// of text and two ornamental rules.
pub(crate) fn rasterize_banner(config: &BannerConfig, logo: Option<&RgbaImage>) -> RgbaImage {
    let palette = &config.palette;
    let mut canvas = RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, rgba_from_hex(palette.background));

    let border = rgba_from_hex(palette.border);
    let half = BORDER_WIDTH / 2;
    stroke_rect(
        &mut canvas,
        BORDER_INSET - half,
        BORDER_INSET - half,
        CANVAS_WIDTH - 2 * (BORDER_INSET - half),
        CANVAS_HEIGHT - 2 * (BORDER_INSET - half),
        BORDER_WIDTH,
        border,
    );

    if let Some(logo) = logo {
        let scaled = imageops::resize(logo, LOGO_SIZE, LOGO_SIZE, FilterType::Triangle);
        let y = (CANVAS_HEIGHT - LOGO_SIZE) / 2;
        imageops::overlay(&mut canvas, &scaled, i64::from(LOGO_X), i64::from(y));
    }

    let max_width = RULE_X.1 - RULE_X.0;
    draw_text_centered(&mut canvas, &config.title, TEXT_CENTER_X, TITLE_Y, 2, max_width, rgba_from_hex(palette.title));
    for y in RULE_Y {
        fill_rect(&mut canvas, RULE_X.0, y, RULE_X.1 - RULE_X.0, 1, border);
    }
    draw_text_centered(
        &mut canvas,
        &config.headline,
        TEXT_CENTER_X,
        HEADLINE_Y,
        3,
        max_width,
        rgba_from_hex(palette.headline),
    );
    draw_text_centered(
        &mut canvas,
        &config.subtitle,
        TEXT_CENTER_X,
        SUBTITLE_Y,
        2,
        max_width,
        rgba_from_hex(palette.subtitle),
    );

    canvas
}

#[must_use]
pub(crate) fn rgba_from_hex(hex: u32) -> Rgba<u8> {
    let [_, r, g, b] = hex.to_be_bytes();
    Rgba([r, g, b, 255])
}

/// Fills a rectangle, clipped to the image.
fn fill_rect(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    let x_end = (x + w).min(img.width());
    let y_end = (y + h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, color);
        }
    }
}

fn stroke_rect(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, line: u32, color: Rgba<u8>) {
    fill_rect(img, x, y, w, line, color);
    fill_rect(img, x, y + h.saturating_sub(line), w, line, color);
    fill_rect(img, x, y, line, h, color);
    fill_rect(img, x + w.saturating_sub(line), y, line, h, color);
}

/// Draws `text` centered on `center_x` with its baseline at `baseline_y`,
/// at the largest integer scale up to `max_scale` that fits `max_width`.
fn draw_text_centered(
    img: &mut RgbaImage,
    text: &str,
    center_x: u32,
    baseline_y: u32,
    max_scale: u32,
    max_width: u32,
    color: Rgba<u8>,
) {
    let chars: Vec<char> = text.chars().map(fold_diacritic).collect();
    if chars.is_empty() {
        return;
    }
    let advance = GLYPH_SIZE as usize * chars.len();
    let scale = (1..=max_scale.max(1))
        .rev()
        .find(|&s| advance * s as usize <= max_width as usize)
        .unwrap_or(1);

    let width = (advance * scale as usize) as i64;
    let left = i64::from(center_x) - width / 2;
    let top = i64::from(baseline_y) - i64::from((GLYPH_SIZE - 1) * scale);

    for (i, &ch) in chars.iter().enumerate() {
        let x0 = left + (i as i64) * i64::from(GLYPH_SIZE * scale);
        draw_glyph(img, glyph_for_char(ch), x0, top, scale, color);
    }
}

fn draw_glyph(img: &mut RgbaImage, glyph: [u8; 8], x0: i64, y0: i64, scale: u32, color: Rgba<u8>) {
    let (w, h) = (i64::from(img.width()), i64::from(img.height()));
    for (row, bits) in glyph.iter().enumerate() {
        for col in 0..GLYPH_SIZE {
            if bits & (1 << col) == 0 {
                continue;
            }
            for sy in 0..scale {
                for sx in 0..scale {
                    let px = x0 + i64::from(col * scale + sx);
                    let py = y0 + (row as i64) * i64::from(scale) + i64::from(sy);
                    if (0..w).contains(&px) && (0..h).contains(&py) {
                        img.put_pixel(px as u32, py as u32, color);
                    }
                }
            }
        }
    }
}

fn glyph_for_char(ch: char) -> [u8; 8] {
    let index = ch as usize;
    if index < BASIC_LEGACY.len() {
        BASIC_LEGACY[index]
    } else {
        BASIC_LEGACY[b'?' as usize]
    }
}

/// Maps accented Latin letters (including the Vietnamese set) to their base
/// letter, since the bitmap font only covers ASCII.
fn fold_diacritic(ch: char) -> char {
    const FOLDS: &[(&str, char)] = &[
        ("àáảãạăằắẳẵặâầấẩẫậ", 'a'),
        ("ÀÁẢÃẠĂẰẮẲẴẶÂẦẤẨẪẬ", 'A'),
        ("èéẻẽẹêềếểễệ", 'e'),
        ("ÈÉẺẼẸÊỀẾỂỄỆ", 'E'),
        ("ìíỉĩị", 'i'),
        ("ÌÍỈĨỊ", 'I'),
        ("òóỏõọôồốổỗộơờớởỡợ", 'o'),
        ("ÒÓỎÕỌÔỒỐỔỖỘƠỜỚỞỠỢ", 'O'),
        ("ùúủũụưừứửữự", 'u'),
        ("ÙÚỦŨỤƯỪỨỬỮỰ", 'U'),
        ("ỳýỷỹỵ", 'y'),
        ("ỲÝỶỸỴ", 'Y'),
        ("đ", 'd'),
        ("Đ", 'D'),
    ];

    if ch.is_ascii() {
        return ch;
    }
    FOLDS
        .iter()
        .find(|(group, _)| group.contains(ch))
        .map_or(ch, |&(_, base)| base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_vietnamese_letters() {
        let folded: String = "TRƯỜNG ĐẠI HỌC".chars().map(fold_diacritic).collect();
        assert_eq!(folded, "TRUONG DAI HOC");
    }

    #[test]
    fn canvas_has_frame_and_background() {
        let config = BannerConfig {
            logo_path: None,
            ..BannerConfig::default()
        };
        let img = rasterize_banner(&config, None);
        assert_eq!(img.dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
        assert_eq!(*img.get_pixel(0, 0), rgba_from_hex(0x5A0000));
        assert_eq!(*img.get_pixel(BORDER_INSET, CANVAS_HEIGHT / 2), rgba_from_hex(0xC9A227));
        assert_eq!(*img.get_pixel(RULE_X.0 + 1, RULE_Y[0]), rgba_from_hex(0xC9A227));
    }

    #[test]
    fn logo_is_composited_on_the_left() {
        let config = BannerConfig::default();
        let logo = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));
        let img = rasterize_banner(&config, Some(&logo));
        let center = *img.get_pixel(LOGO_X + LOGO_SIZE / 2, CANVAS_HEIGHT / 2);
        assert_eq!(center, Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn text_pixels_use_the_headline_color() {
        let config = BannerConfig::default();
        let img = rasterize_banner(&config, None);
        let headline = rgba_from_hex(config.palette.headline);
        let band_top = HEADLINE_Y - 7 * 3;
        let found = (band_top..=HEADLINE_Y)
            .any(|y| (RULE_X.0..RULE_X.1).any(|x| *img.get_pixel(x, y) == headline));
        assert!(found);
    }
}
