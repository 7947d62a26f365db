//! CAPTCHA service
//!
//! Challenges are stateless. The answer never leaves the server in clear: the
//! client receives a PNG of the text plus a token
//! `<expires>.<nonce>.<signature>` whose signature covers the expected answer.
//! Submitting the token with the right answer before expiry succeeds once;
//! the nonce is then remembered until the token would have expired anyway.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use base64::Engine;
use chrono::Duration;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use rand::Rng;

use crate::app::game_config::{CAPTCHA_ALPHABET, CAPTCHA_LENGTH};
use crate::auth::TokenSigner;
use crate::domain::ports::Clock;
use crate::error::AppError;

const IMAGE_WIDTH: u32 = 320;
const IMAGE_HEIGHT: u32 = 100;
const GLYPH_SCALE: u32 = 8;
const GLYPH_ADVANCE: u32 = 56;
const TEXT_LEFT: u32 = 30;
const TEXT_TOP: i32 = 22;
const NOISE_LINES: usize = 6;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const GRAY: Rgb<u8> = Rgb([128, 128, 128]);
const LIGHT_GRAY: Rgb<u8> = Rgb([211, 211, 211]);

/// A freshly generated challenge
#[derive(Debug, Clone)]
pub struct Captcha {
    /// Base64-encoded PNG
    pub image_png_base64: String,
    pub token: String,
}

pub struct CaptchaService<C>
where
    C: Clock,
{
    signer: TokenSigner,
    ttl: Duration,
    clock: Arc<C>,
    used_nonces: Mutex<HashMap<String, i64>>,
}

impl<C> CaptchaService<C>
where
    C: Clock,
{
    pub fn new(signer: TokenSigner, ttl: Duration, clock: Arc<C>) -> Self {
        Self {
            signer,
            ttl,
            clock,
            used_nonces: Mutex::new(HashMap::new()),
        }
    }

    fn payload(expires: i64, nonce: &str, answer: &str) -> String {
        format!("captcha:{}.{}.{}", expires, nonce, answer.to_uppercase())
    }

    /// Generate a new challenge
    pub fn generate(&self) -> Result<Captcha, AppError> {
        self.issue(&random_text())
    }

    fn issue(&self, answer: &str) -> Result<Captcha, AppError> {
        let image_png_base64 = render_png_base64(answer)?;

        let expires = (self.clock.now() + self.ttl).timestamp();
        let nonce = {
            let bytes: [u8; 16] = rand::thread_rng().gen();
            hex::encode(bytes)
        };
        let signature = self.signer.sign(&Self::payload(expires, &nonce, answer));

        tracing::trace!(%nonce, "CAPTCHA generated");

        Ok(Captcha {
            image_png_base64,
            token: format!("{}.{}.{}", expires, nonce, signature),
        })
    }

    /// Check an answer against a token. A token verifies at most once.
    pub fn verify(&self, token: Option<&str>, answer: Option<&str>) -> bool {
        let (Some(token), Some(answer)) = (token, answer) else {
            return false;
        };
        let answer = answer.trim();
        if answer.is_empty() {
            return false;
        }

        let mut parts = token.splitn(3, '.');
        let (Some(expires), Some(nonce), Some(signature)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        let Ok(expires) = expires.parse::<i64>() else {
            return false;
        };

        let now = self.clock.now().timestamp();
        if expires <= now {
            return false;
        }

        if !self
            .signer
            .verify(&Self::payload(expires, nonce, answer), signature)
        {
            return false;
        }

        let Ok(mut used) = self.used_nonces.lock() else {
            return false;
        };
        used.retain(|_, exp| *exp > now);
        used.insert(nonce.to_string(), expires).is_none()
    }
}

fn random_text() -> String {
    let alphabet = CAPTCHA_ALPHABET.as_bytes();
    let mut rng = rand::thread_rng();
    (0..CAPTCHA_LENGTH)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

fn render_png_base64(text: &str) -> Result<String, AppError> {
    let image = render(text);
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut bytes, ImageFormat::Png)
        .map_err(|e| AppError::Internal(format!("CAPTCHA encoding failed: {}", e)))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes.into_inner()))
}

fn render(text: &str) -> RgbImage {
    let mut rng = rand::thread_rng();
    let mut image = RgbImage::from_pixel(IMAGE_WIDTH, IMAGE_HEIGHT, WHITE);

    for (i, c) in text.chars().enumerate() {
        let x = TEXT_LEFT + i as u32 * GLYPH_ADVANCE;
        let y = (TEXT_TOP + rng.gen_range(-6..=6)).max(0) as u32;
        // Shadow first so the main stroke sits on top
        draw_glyph(&mut image, c, x + 2, y + 2, GRAY);
        draw_glyph(&mut image, c, x, y, BLACK);
    }

    for _ in 0..NOISE_LINES {
        let from = (
            rng.gen_range(0..IMAGE_WIDTH as i32),
            rng.gen_range(0..IMAGE_HEIGHT as i32),
        );
        let to = (
            rng.gen_range(0..IMAGE_WIDTH as i32),
            rng.gen_range(0..IMAGE_HEIGHT as i32),
        );
        draw_line(&mut image, from, to, LIGHT_GRAY);
    }

    image
}

fn draw_glyph(image: &mut RgbImage, c: char, left: u32, top: u32, color: Rgb<u8>) {
    let Some(rows) = glyph(c) else {
        return;
    };

    for (row, bits) in rows.iter().enumerate() {
        for col in 0..5u32 {
            if bits & (0x10 >> col) == 0 {
                continue;
            }
            for dy in 0..GLYPH_SCALE {
                for dx in 0..GLYPH_SCALE {
                    let x = left + col * GLYPH_SCALE + dx;
                    let y = top + row as u32 * GLYPH_SCALE + dy;
                    if x < image.width() && y < image.height() {
                        image.put_pixel(x, y, color);
                    }
                }
            }
        }
    }
}

fn draw_line(image: &mut RgbImage, from: (i32, i32), to: (i32, i32), color: Rgb<u8>) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let steps = dx.abs().max(dy.abs()).max(1);

    for step in 0..=steps {
        let x = from.0 + dx * step / steps;
        let y = from.1 + dy * step / steps;
        if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
            image.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// 5x7 bitmap rows, most significant of the low five bits is the left column
fn glyph(c: char) -> Option<[u8; 7]> {
    let rows = match c {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        _ => return None,
    };
    Some(rows)
}
