//! Login password encoding for newer GS1200 firmware.
//!
//! From V2.00(xxxx.1) on, the web UI no longer posts the password as typed.
//! Each byte is shifted down by the password length and interleaved with random
//! alphanumeric padding, with one more padding character at the end.

use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;

const PADDING: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

static FIRMWARE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^V(\d+\.\d+)\([A-Z]+\.(\d+)\)[A-Z]\d$").expect("firmware pattern is valid")
});

/// Encode `password` the way the switch's login page does.
///
/// Returns `None` when a character cannot be shifted by the password length,
/// which only happens for passwords the web UI would reject anyway.
pub fn obfuscate(password: &str) -> Option<String> {
    obfuscate_with(password, &mut rand::thread_rng())
}

pub fn obfuscate_with<R: Rng + ?Sized>(password: &str, rng: &mut R) -> Option<String> {
    let bytes = password.as_bytes();
    let shift = u32::try_from(bytes.len()).ok()?;
    let mut out = String::with_capacity(bytes.len() * 2 + 1);

    for &b in bytes {
        out.push(pad(rng));
        out.push(u32::from(b).checked_sub(shift).and_then(char::from_u32)?);
    }
    out.push(pad(rng));
    Some(out)
}

fn pad<R: Rng + ?Sized>(rng: &mut R) -> char {
    char::from(*PADDING.choose(rng).unwrap_or(&b'0'))
}

/// Whether the firmware version string belongs to a release that expects an
/// obfuscated login password. Unrecognised version strings are assumed to be
/// newer firmware.
pub fn firmware_requires_obfuscation(firmware: &str) -> bool {
    let Some(caps) = FIRMWARE_VERSION.captures(firmware.trim()) else {
        return true;
    };
    let version: f64 = caps[1].parse().unwrap_or(0.0);
    let revision: u32 = caps[2].parse().unwrap_or(0);
    version >= 2.0 && revision >= 1
}
